//! BEX Core - Scene export to Babylon-style web scene documents.
//!
//! This crate provides:
//!
//! - **Schema-typed objects**: `Catalog`, `TypedObject`, `Value`
//! - **Scene assembly**: `Scene` routes objects into their collections
//! - **Geometry**: submesh partitioning and binary attribute serialization
//! - **Export**: attribute bundles from the authoring tool in, files out
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bex_core::{Catalog, ExportOptions, Exporter, SceneBundle};
//!
//! let catalog = Arc::new(Catalog::builtin()?);
//! let bundle = SceneBundle::load("bundle.json")?;
//! let exporter = Exporter::new(catalog, ExportOptions::default());
//! let summary = exporter.export(&bundle, "scene.babylon")?;
//! println!("Wrote {} meshes", summary.mesh_count);
//! ```

pub mod binary;
pub mod bundle;
pub mod constants;
pub mod export;
pub mod object;
pub mod scene;
pub mod schema;
pub mod submesh;
pub mod value;

// Re-export commonly used types
pub use binary::{BinaryAttribute, BinaryGeometry, BinarySerializer};
pub use bundle::{SceneBundle, SourceObject};
pub use export::{ExportOptions, ExportSummary, Exporter};
pub use object::TypedObject;
pub use scene::{Collection, Scene};
pub use schema::Catalog;
pub use submesh::SubMesh;
pub use value::{Value, ValueKind};
