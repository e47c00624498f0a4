//! The scene container.
//!
//! A [`Scene`] is the root typed object of kind `scene`. Objects added to it
//! are routed by kind into the matching collection of the scene document.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::object::{ObjectError, TypedObject};
use crate::schema::{Catalog, SchemaError};
use crate::value::{Value, ValueKind};

/// Errors that can occur while building or writing a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error("No scene collection accepts objects of kind '{0}'")]
    UnroutableKind(String),

    #[error("IO error writing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error writing '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// The scene collections objects are routed into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Cameras,
    Lights,
    Meshes,
    Materials,
    MultiMaterials,
    ShadowGenerators,
    /// `geometries.boxes`
    Boxes,
    /// `geometries.spheres`
    Spheres,
    /// `geometries.vertexData`
    VertexData,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Cameras,
        Collection::Lights,
        Collection::Meshes,
        Collection::Materials,
        Collection::MultiMaterials,
        Collection::ShadowGenerators,
        Collection::Boxes,
        Collection::Spheres,
        Collection::VertexData,
    ];

    /// The collection objects of `kind` belong to.
    pub fn for_kind(kind: &str) -> Option<Self> {
        match kind {
            "camera" => Some(Collection::Cameras),
            "light" => Some(Collection::Lights),
            "mesh" => Some(Collection::Meshes),
            "material" => Some(Collection::Materials),
            "multiMaterial" => Some(Collection::MultiMaterials),
            "shadowGenerator" => Some(Collection::ShadowGenerators),
            "box" => Some(Collection::Boxes),
            "sphere" => Some(Collection::Spheres),
            "vertexData" => Some(Collection::VertexData),
            _ => None,
        }
    }

    /// Attribute name of the collection in the scene (or in `geometries`).
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Cameras => "cameras",
            Collection::Lights => "lights",
            Collection::Meshes => "meshes",
            Collection::Materials => "materials",
            Collection::MultiMaterials => "multiMaterials",
            Collection::ShadowGenerators => "shadowGenerators",
            Collection::Boxes => "boxes",
            Collection::Spheres => "spheres",
            Collection::VertexData => "vertexData",
        }
    }

    /// True for collections nested under the scene's `geometries` object.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            Collection::Boxes | Collection::Spheres | Collection::VertexData
        )
    }
}

/// The root of an exported scene.
#[derive(Clone, Debug)]
pub struct Scene {
    catalog: Arc<Catalog>,
    root: TypedObject,
}

impl Scene {
    /// Create an empty scene from the catalog's `scene` template.
    pub fn new(catalog: Arc<Catalog>) -> SceneResult<Self> {
        let root = catalog.instantiate("scene")?;
        Ok(Self { catalog, root })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Create a new object of `kind` from this scene's catalog.
    pub fn new_object(&self, kind: &str) -> SceneResult<TypedObject> {
        Ok(self.catalog.instantiate(kind)?)
    }

    /// Add an object to the collection matching its kind.
    ///
    /// Adding a camera makes it the active camera. Kinds without a
    /// collection fail with [`SceneError::UnroutableKind`].
    pub fn add(&mut self, object: TypedObject) -> SceneResult<Collection> {
        let collection = Collection::for_kind(object.kind())
            .ok_or_else(|| SceneError::UnroutableKind(object.kind().to_string()))?;

        let camera_name = match collection {
            Collection::Cameras => {
                // Checked up front so a failed add leaves the scene unchanged.
                self.root.get_text("activeCamera")?;
                Some(object.get_text("name")?.to_string())
            }
            _ => None,
        };

        log::debug!(
            "Adding {} '{}' to {}",
            object.kind(),
            object.identifier().unwrap_or("<unnamed>"),
            collection.key()
        );
        self.collection_mut(collection)?.push(Value::from(object));

        if let Some(name) = camera_name {
            self.root.set("activeCamera", name)?;
        }

        Ok(collection)
    }

    /// Name of the most recently added camera.
    pub fn active_camera(&self) -> Option<&str> {
        self.root
            .get_text("activeCamera")
            .ok()
            .filter(|name| !name.is_empty())
    }

    /// Objects stored in `collection`, in insertion order.
    pub fn objects(&self, collection: Collection) -> impl Iterator<Item = &TypedObject> {
        self.collection(collection)
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_object)
    }

    /// Number of objects in `collection`.
    pub fn count(&self, collection: Collection) -> usize {
        self.collection(collection).map_or(0, <[Value]>::len)
    }

    /// Find an object by identifier in `collection`.
    pub fn find(&self, collection: Collection, id: &str) -> Option<&TypedObject> {
        self.objects(collection)
            .find(|object| object.identifier() == Some(id))
    }

    /// The scene's own attributes.
    pub fn as_object(&self) -> &TypedObject {
        &self.root
    }

    /// Mutable access to the scene's own attributes (type-checked).
    pub fn as_object_mut(&mut self) -> &mut TypedObject {
        &mut self.root
    }

    /// Serialize the scene into a JSON document.
    pub fn to_json(&self) -> SceneResult<JsonValue> {
        Ok(self.root.to_json()?)
    }

    /// Write the scene as pretty-printed JSON.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> SceneResult<()> {
        self.dump_with(path, true)
    }

    /// Write the scene as JSON, pretty-printed or compact.
    pub fn dump_with<P: AsRef<Path>>(&self, path: P, pretty: bool) -> SceneResult<()> {
        let path = path.as_ref();
        // Serialize first so that a refused structure leaves no partial file.
        let json = self.to_json()?;

        let io_err = |source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        let written = if pretty {
            serde_json::to_writer_pretty(&mut writer, &json)
        } else {
            serde_json::to_writer(&mut writer, &json)
        };
        written.map_err(|source| SceneError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_err)?;

        log::info!("Wrote scene to {}", path.display());
        Ok(())
    }

    fn collection(&self, collection: Collection) -> Option<&[Value]> {
        let holder = if collection.is_geometry() {
            self.root.get("geometries").ok()?.as_map()?.get(collection.key())?
        } else {
            self.root.get(collection.key()).ok()?
        };
        holder.as_sequence()
    }

    fn collection_mut(&mut self, collection: Collection) -> SceneResult<&mut Vec<Value>> {
        if !collection.is_geometry() {
            return Ok(self.root.sequence_mut(collection.key())?);
        }

        let geometries = self.root.map_mut("geometries")?;
        match geometries.get_mut(collection.key()) {
            Some(Value::Sequence(items)) => Ok(items),
            Some(other) => Err(ObjectError::TypeMismatch {
                kind: "scene.geometries".to_string(),
                key: collection.key().to_string(),
                expected: ValueKind::Sequence,
                found: other.kind(),
            }
            .into()),
            None => Err(ObjectError::UnknownKey {
                kind: "scene.geometries".to_string(),
                key: collection.key().to_string(),
            }
            .into()),
        }
    }
}
