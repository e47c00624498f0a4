//! Export an attribute bundle to a Babylon scene document.
//!
//! Run with: cargo run -- bundle.json scene.babylon --binary

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bex_core::{Catalog, ExportOptions, Exporter, SceneBundle};

/// Colon-separated (platform path list) schema directories.
const SCHEMA_PATH_VAR: &str = "BEX_SCHEMA_PATH";

struct Args {
    bundle: PathBuf,
    output: PathBuf,
    schema_dirs: Vec<PathBuf>,
    options: ExportOptions,
}

fn print_usage() {
    println!("Usage: bex_export <bundle.json> <output.babylon> [options]");
    println!("\nOptions:");
    println!("  --binary          Write mesh arrays to companion binary files");
    println!("  --extension <ext> Binary file extension (default: babylonbinarymeshdata)");
    println!("  --schema <dir>    Load schema templates from <dir> (repeatable)");
    println!("  --compact         Write the scene without indentation");
    println!("\nSchema directories can also be listed in {}.", SCHEMA_PATH_VAR);
}

fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut positional = Vec::new();
    let mut schema_dirs = Vec::new();
    let mut options = ExportOptions::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--binary" => options.binary = true,
            "--compact" => options.pretty = false,
            "--schema" => {
                let dir = iter.next().context("--schema needs a directory")?;
                schema_dirs.push(PathBuf::from(dir));
            }
            "--extension" => {
                let ext = iter.next().context("--extension needs a value")?;
                options.binary_extension = ext.trim_start_matches('.').to_string();
            }
            flag if flag.starts_with("--") => bail!("Unknown option '{}'", flag),
            path => positional.push(PathBuf::from(path)),
        }
    }

    let [bundle, output]: [PathBuf; 2] = match positional.try_into() {
        Ok(paths) => paths,
        Err(_) => return Ok(None),
    };

    Ok(Some(Args {
        bundle,
        output,
        schema_dirs,
        options,
    }))
}

fn load_catalog(flag_dirs: &[PathBuf]) -> Result<Catalog> {
    let mut dirs = flag_dirs.to_vec();
    if let Some(paths) = env::var_os(SCHEMA_PATH_VAR) {
        dirs.extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
    }

    if dirs.is_empty() {
        log::debug!("Using built-in schemas");
        return Catalog::builtin().context("Failed to load built-in schemas");
    }

    Catalog::load_all(&dirs).with_context(|| format!("Failed to load schemas from {:?}", dirs))
}

fn run(args: Args) -> Result<()> {
    let catalog = Arc::new(load_catalog(&args.schema_dirs)?);
    println!("Loaded {} schema kinds", catalog.len());

    let bundle = SceneBundle::load(&args.bundle)
        .with_context(|| format!("Failed to read bundle {}", args.bundle.display()))?;
    println!("Loading bundle: {} ({} objects)", args.bundle.display(), bundle.objects.len());

    let exporter = Exporter::new(catalog, args.options);
    let summary = exporter
        .export(&bundle, &args.output)
        .with_context(|| format!("Failed to export {}", args.output.display()))?;

    println!("\n=== Scene: {} ===", summary.scene_path.display());
    println!("Meshes: {}", summary.mesh_count);
    println!("Cameras: {}", summary.camera_count);
    println!("Lights: {}", summary.light_count);
    println!("Materials: {}", summary.material_count);
    if !summary.binary_files.is_empty() {
        println!("\n--- Binary files ---");
        for path in &summary.binary_files {
            println!("  {}", path.display());
        }
    }
    println!("\nBytes written: {}", summary.bytes_written);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(args) = parse_args(&args)? else {
        print_usage();
        return Ok(());
    };

    run(args)
}
