//! One export run: bundles in, scene document and companion binaries out.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::binary::{binary_file_name, BinaryError, BinaryGeometry, BinarySerializer, DEFAULT_EXTENSION};
use crate::bundle::{BundleError, SceneBundle};
use crate::object::TypedObject;
use crate::scene::{Collection, Scene, SceneError};
use crate::schema::Catalog;

/// Errors that can occur during an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Binary(#[from] BinaryError),

    #[error("Meshes share the id '{0}' and would overwrite one binary file")]
    DuplicateMeshId(String),

    #[error("Mesh id '{0}' cannot name a binary file next to the scene")]
    InvalidMeshId(String),

    #[error("IO error writing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for export runs.
pub type ExportResult<T> = Result<T, ExportError>;

/// Export settings.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Move mesh arrays into companion binary files
    pub binary: bool,
    pub binary_extension: String,
    /// Pretty-print the scene document
    pub pretty: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            binary: false,
            binary_extension: DEFAULT_EXTENSION.to_string(),
            pretty: true,
        }
    }
}

/// What an export run wrote.
#[derive(Clone, Debug, Default)]
pub struct ExportSummary {
    pub scene_path: PathBuf,
    pub binary_files: Vec<PathBuf>,
    pub mesh_count: usize,
    pub camera_count: usize,
    pub light_count: usize,
    pub material_count: usize,
    pub bytes_written: u64,
}

/// A mesh's binary buffer, waiting to be written.
struct PendingBinary {
    file_name: String,
    geometry: BinaryGeometry,
}

/// Builds scenes from bundles and writes them out.
pub struct Exporter {
    catalog: Arc<Catalog>,
    options: ExportOptions,
    serializer: BinarySerializer,
}

impl Exporter {
    pub fn new(catalog: Arc<Catalog>, options: ExportOptions) -> Self {
        let serializer = BinarySerializer::default().with_extension(options.binary_extension.clone());
        Self {
            catalog,
            options,
            serializer,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Build the scene document for `bundle`.
    ///
    /// With binary output enabled the meshes reference their companion
    /// files, but the buffers themselves are dropped; use [`Exporter::export`]
    /// to write them.
    pub fn build(&self, bundle: &SceneBundle) -> ExportResult<Scene> {
        let (scene, _) = self.assemble(bundle)?;
        Ok(scene)
    }

    /// Build the scene for `bundle` and write it to `path`.
    ///
    /// Binary files go next to the scene document, which is written last.
    pub fn export<P: AsRef<Path>>(&self, bundle: &SceneBundle, path: P) -> ExportResult<ExportSummary> {
        let path = path.as_ref();
        let (mut scene, binaries) = self.assemble(bundle)?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut summary = ExportSummary {
            scene_path: path.to_path_buf(),
            mesh_count: scene.count(Collection::Meshes),
            camera_count: scene.count(Collection::Cameras),
            light_count: scene.count(Collection::Lights),
            material_count: scene.count(Collection::Materials) + scene.count(Collection::MultiMaterials),
            ..Default::default()
        };

        for pending in &binaries {
            let binary_path = dir.join(&pending.file_name);
            write_binary(&binary_path, &pending.geometry.buffer)?;
            log::debug!(
                "Wrote {} bytes to {}",
                pending.geometry.buffer.len(),
                binary_path.display()
            );
            summary.bytes_written += pending.geometry.buffer.len() as u64;
            summary.binary_files.push(binary_path);
        }

        // The loader looks the active camera up by id.
        let root = scene.as_object_mut();
        if root.contains("activeCamera") {
            root.promote("activeCamera", "activeCameraID")
                .map_err(SceneError::from)?;
        }
        scene.dump_with(path, self.options.pretty)?;

        let metadata = fs::metadata(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        summary.bytes_written += metadata.len();

        log::info!(
            "Exported {} meshes, {} cameras, {} lights, {} materials to {} ({} binary files, {} bytes)",
            summary.mesh_count,
            summary.camera_count,
            summary.light_count,
            summary.material_count,
            path.display(),
            summary.binary_files.len(),
            summary.bytes_written
        );
        Ok(summary)
    }

    fn assemble(&self, bundle: &SceneBundle) -> ExportResult<(Scene, Vec<PendingBinary>)> {
        let mut scene = Scene::new(self.catalog.clone())?;
        let mut binaries = Vec::new();
        let mut file_names = HashSet::new();

        for source in &bundle.objects {
            for mut object in source.populate(&self.catalog)? {
                if object.kind() == "mesh" {
                    if let Some(pending) = self.serialize_mesh(&mut object)? {
                        if !file_names.insert(pending.file_name.clone()) {
                            return Err(ExportError::DuplicateMeshId(
                                object.identifier().unwrap_or_default().to_string(),
                            ));
                        }
                        binaries.push(pending);
                    }
                }
                scene.add(object)?;
            }
        }

        check_references(&scene);
        Ok((scene, binaries))
    }

    fn serialize_mesh(&self, mesh: &mut TypedObject) -> ExportResult<Option<PendingBinary>> {
        if !mesh.contains("positions") {
            if !mesh.contains("geometryId") {
                log::warn!(
                    "Mesh '{}' has no geometry",
                    mesh.identifier().unwrap_or("<unnamed>")
                );
            }
            return Ok(None);
        }
        if !self.options.binary {
            return Ok(None);
        }

        let id = mesh.identifier().unwrap_or_default().to_string();
        if !is_plain_file_stem(&id) {
            return Err(ExportError::InvalidMeshId(id));
        }

        let geometry = self.serializer.serialize(mesh, &self.catalog)?;
        Ok(Some(PendingBinary {
            file_name: binary_file_name(&id, &self.options.binary_extension),
            geometry,
        }))
    }
}

/// Binary files must land in the scene's own directory.
fn is_plain_file_stem(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

fn write_binary(path: &Path, buffer: &[u8]) -> ExportResult<()> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(buffer).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Warn about ids that point at nothing in the scene.
fn check_references(scene: &Scene) {
    for mesh in scene.objects(Collection::Meshes) {
        let Ok(material_id) = mesh.get_text("materialId") else {
            continue;
        };
        if material_id.is_empty() {
            continue;
        }
        if scene.find(Collection::Materials, material_id).is_none()
            && scene.find(Collection::MultiMaterials, material_id).is_none()
        {
            log::warn!(
                "Mesh '{}' uses unknown material '{}'",
                mesh.identifier().unwrap_or("<unnamed>"),
                material_id
            );
        }
    }

    for shadow in scene.objects(Collection::ShadowGenerators) {
        if let Ok(light_id) = shadow.get_text("lightId") {
            if scene.find(Collection::Lights, light_id).is_none() {
                log::warn!("Shadow generator refers to unknown light '{}'", light_id);
            }
        }
    }
}
