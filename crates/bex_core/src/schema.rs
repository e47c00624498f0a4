//! Schema registry.
//!
//! Templates are JSON documents, one per kind: the file `mesh.json` defines
//! the kind `mesh`. Each top-level attribute's default value fixes both the
//! initial value and the kind every later assignment must match.
//!
//! A [`Catalog`] is built once and never mutated afterwards; share it with
//! `Arc<Catalog>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::object::TypedObject;
use crate::value::{Attributes, Value};

/// Errors that can occur while loading or using schemas.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error reading schema '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed schema '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid template for '{kind}': {message}")]
    InvalidTemplate { kind: String, message: String },

    #[error("Kind '{0}' is defined more than once")]
    DuplicateKind(String),

    #[error("Unknown kind: {0}")]
    UnknownKind(String),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Default values and required kinds for one object kind.
pub type Template = Attributes;

/// Templates compiled into the crate.
const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    ("_binaryInfo", include_str!("../schema/_binaryInfo.json")),
    ("animation", include_str!("../schema/animation.json")),
    ("animationKey", include_str!("../schema/animationKey.json")),
    ("box", include_str!("../schema/box.json")),
    ("camera", include_str!("../schema/camera.json")),
    ("light", include_str!("../schema/light.json")),
    ("material", include_str!("../schema/material.json")),
    ("mesh", include_str!("../schema/mesh.json")),
    ("multiMaterial", include_str!("../schema/multiMaterial.json")),
    ("scene", include_str!("../schema/scene.json")),
    ("shadowGenerator", include_str!("../schema/shadowGenerator.json")),
    ("sphere", include_str!("../schema/sphere.json")),
    ("subMesh", include_str!("../schema/subMesh.json")),
    ("texture", include_str!("../schema/texture.json")),
    ("vertexData", include_str!("../schema/vertexData.json")),
];

/// The set of templates, keyed by kind name.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    templates: BTreeMap<String, Template>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file of a directory.
    pub fn load<P: AsRef<Path>>(dir: P) -> SchemaResult<Self> {
        let mut catalog = Self::new();
        catalog.load_dir(dir.as_ref())?;
        Ok(catalog)
    }

    /// Load several directories into one catalog.
    ///
    /// A kind defined in more than one file is rejected.
    pub fn load_all<I, P>(dirs: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut catalog = Self::new();
        for dir in dirs {
            catalog.load_dir(dir.as_ref())?;
        }
        Ok(catalog)
    }

    /// The templates shipped with this crate.
    pub fn builtin() -> SchemaResult<Self> {
        let mut catalog = Self::new();
        for (kind, content) in BUILTIN_SCHEMAS {
            let origin = PathBuf::from(format!("<builtin>/{}.json", kind));
            let template = parse_template(kind, content, &origin)?;
            catalog.insert(*kind, template)?;
        }
        Ok(catalog)
    }

    fn load_dir(&mut self, dir: &Path) -> SchemaResult<()> {
        let io_err = |source| SchemaError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        // Directory iteration order is platform dependent.
        files.sort();

        for path in &files {
            let Some(kind) = path.file_stem().and_then(|s| s.to_str()) else {
                log::warn!("Skipping schema with non UTF-8 name: {}", path.display());
                continue;
            };

            let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
                path: path.clone(),
                source,
            })?;
            let template = parse_template(kind, &content, path)?;
            self.insert(kind, template)?;
            log::debug!("Loaded schema '{}' from {}", kind, path.display());
        }

        log::info!("Loaded {} schema templates from {}", files.len(), dir.display());
        Ok(())
    }

    /// Register a template under `kind`.
    ///
    /// Templates are validated once here: null defaults are rejected because
    /// they would fix the attribute's kind to null.
    pub fn insert(&mut self, kind: impl Into<String>, template: Template) -> SchemaResult<()> {
        let kind = kind.into();
        if self.templates.contains_key(&kind) {
            return Err(SchemaError::DuplicateKind(kind));
        }
        if let Some((key, _)) = template.iter().find(|(_, v)| matches!(v, Value::Null)) {
            return Err(SchemaError::InvalidTemplate {
                message: format!("attribute '{}' has a null default", key),
                kind,
            });
        }
        self.templates.insert(kind, template);
        Ok(())
    }

    /// Create a fresh object of `kind`, seeded with the template defaults.
    pub fn instantiate(&self, kind: &str) -> SchemaResult<TypedObject> {
        self.templates
            .get(kind)
            .map(|template| TypedObject::from_template(kind, template))
            .ok_or_else(|| SchemaError::UnknownKind(kind.to_string()))
    }

    pub fn template(&self, kind: &str) -> Option<&Template> {
        self.templates.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.templates.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Parse one template document.
pub fn parse_template(kind: &str, content: &str, origin: &Path) -> SchemaResult<Template> {
    let json: JsonValue = serde_json::from_str(content).map_err(|source| SchemaError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    match Value::from_json(&json) {
        Value::Map(attributes) => Ok(attributes),
        other => Err(SchemaError::InvalidTemplate {
            kind: kind.to_string(),
            message: format!("expected an object at the top level, found {}", other.kind()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::value::ValueKind;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bex_schema_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn bundled_schema_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("schema")
    }

    #[test]
    fn test_load_directory() {
        let dir = scratch_dir("load");
        fs::write(dir.join("mesh.json"), r#"{"id": "", "positions": [], "indices": []}"#).unwrap();
        fs::write(dir.join("notes.txt"), "not a schema").unwrap();

        let catalog = Catalog::load(&dir).unwrap();

        assert_eq!(catalog.kinds().collect::<Vec<_>>(), vec!["mesh"]);
        let mesh = catalog.instantiate("mesh").unwrap();
        assert_eq!(mesh.keys().collect::<Vec<_>>(), vec!["id", "indices", "positions"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_instance_keys_match_template() {
        let catalog = Catalog::builtin().unwrap();
        for kind in catalog.kinds() {
            let object = catalog.instantiate(kind).unwrap();
            let template = catalog.template(kind).unwrap();
            assert!(object.keys().eq(template.keys().map(String::as_str)), "{}", kind);
        }
    }

    #[test]
    fn test_instances_are_independent() {
        let catalog = Catalog::builtin().unwrap();
        let mut a = catalog.instantiate("mesh").unwrap();
        let b = catalog.instantiate("mesh").unwrap();

        a.sequence_mut("positions").unwrap().push(Value::from(1.0));

        assert!(b.get("positions").unwrap().is_empty_sequence());
        assert!(catalog.template("mesh").unwrap()["positions"].is_empty_sequence());
    }

    #[test]
    fn test_builtin_matches_bundled_files() {
        let builtin = Catalog::builtin().unwrap();
        let loaded = Catalog::load(bundled_schema_dir()).unwrap();

        assert!(builtin.kinds().eq(loaded.kinds()));
        for kind in builtin.kinds() {
            assert_eq!(builtin.template(kind), loaded.template(kind));
        }
    }

    #[test]
    fn test_scene_attribute_kinds() {
        let catalog = Catalog::builtin().unwrap();
        let scene = catalog.instantiate("scene").unwrap();

        assert_eq!(scene.get("activeCamera").unwrap().kind(), ValueKind::Text);
        assert_eq!(scene.get("meshes").unwrap().kind(), ValueKind::Sequence);
        assert_eq!(scene.get("geometries").unwrap().kind(), ValueKind::Object);
    }

    #[test]
    fn test_unknown_kind() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            catalog.instantiate("teapot"),
            Err(SchemaError::UnknownKind(kind)) if kind == "teapot"
        ));
    }

    #[test]
    fn test_missing_directory() {
        let missing = std::env::temp_dir().join("bex_schema_does_not_exist");
        assert!(matches!(Catalog::load(&missing), Err(SchemaError::Io { .. })));
    }

    #[test]
    fn test_malformed_file() {
        let dir = scratch_dir("malformed");
        fs::write(dir.join("light.json"), "{ \"name\": ").unwrap();

        assert!(matches!(Catalog::load(&dir), Err(SchemaError::Parse { .. })));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_top_level_must_be_object() {
        let err = parse_template("light", "[1, 2]", Path::new("light.json")).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_null_default_rejected() {
        let dir = scratch_dir("null");
        fs::write(dir.join("camera.json"), r#"{"name": "", "parentId": null}"#).unwrap();

        assert!(matches!(
            Catalog::load(&dir),
            Err(SchemaError::InvalidTemplate { .. })
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_duplicate_kind_across_directories() {
        let first = scratch_dir("dup_a");
        let second = scratch_dir("dup_b");
        fs::write(first.join("mesh.json"), r#"{"id": ""}"#).unwrap();
        fs::write(second.join("mesh.json"), r#"{"name": ""}"#).unwrap();

        let err = Catalog::load_all([&first, &second]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateKind(kind) if kind == "mesh"));

        fs::remove_dir_all(&first).unwrap();
        fs::remove_dir_all(&second).unwrap();
    }
}
