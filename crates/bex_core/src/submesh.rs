//! Submesh partitioning.
//!
//! All submeshes of a mesh share one vertex buffer and differ only in the
//! index range they draw and the material (an index into the mesh's
//! multi-material) they draw it with.

use thiserror::Error;

use crate::object::{ObjectError, TypedObject};
use crate::schema::{Catalog, SchemaError};

/// Errors that can occur while computing submeshes.
#[derive(Error, Debug)]
pub enum SubMeshError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error("Position array length {0} is not a multiple of 3")]
    PositionsNotTriplets(usize),

    #[error("Index range {start}..{end} is invalid for {index_count} indices")]
    InvalidRange {
        start: u32,
        end: u32,
        index_count: usize,
    },

    #[error("Submesh field '{field}' must be a non-negative integer, got {value}")]
    InvalidField { field: &'static str, value: f64 },
}

/// Result type for submesh operations.
pub type SubMeshResult<T> = Result<T, SubMeshError>;

/// A contiguous index range of one mesh drawn with one material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubMesh {
    pub material_index: u32,
    pub vertices_start: u32,
    pub vertices_count: u32,
    pub index_start: u32,
    pub index_count: u32,
}

/// Index range `[index_start, index_end)` drawn with `material_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialBoundary {
    pub material_index: u32,
    pub index_start: u32,
    pub index_end: u32,
}

impl MaterialBoundary {
    pub fn new(material_index: u32, index_start: u32, index_end: u32) -> Self {
        Self {
            material_index,
            index_start,
            index_end,
        }
    }
}

const FIELDS: [&str; 5] = [
    "materialIndex",
    "verticesStart",
    "verticesCount",
    "indexStart",
    "indexCount",
];

impl SubMesh {
    /// A submesh drawing the whole buffer with material 0.
    pub fn whole(vertices_count: u32, index_count: u32) -> Self {
        Self {
            vertices_count,
            index_count,
            ..Default::default()
        }
    }

    /// Fields in the order of the binary submesh record.
    pub fn packed(&self) -> [u32; 5] {
        [
            self.material_index,
            self.vertices_start,
            self.index_count,
            self.index_start,
            self.vertices_count,
        ]
    }

    /// Build a `subMesh` object.
    pub fn to_object(&self, catalog: &Catalog) -> SubMeshResult<TypedObject> {
        let mut object = catalog.instantiate("subMesh")?;
        let values = [
            self.material_index,
            self.vertices_start,
            self.vertices_count,
            self.index_start,
            self.index_count,
        ];
        for (field, value) in FIELDS.iter().zip(values) {
            object.set(field, value)?;
        }
        Ok(object)
    }

    /// Read a `subMesh` object back.
    pub fn from_object(object: &TypedObject) -> SubMeshResult<Self> {
        let mut values = [0u32; 5];
        for (field, slot) in FIELDS.iter().zip(values.iter_mut()) {
            let value = object.get_number(field)?;
            if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
                return Err(SubMeshError::InvalidField { field: *field, value });
            }
            *slot = value as u32;
        }

        let [material_index, vertices_start, vertices_count, index_start, index_count] = values;
        Ok(Self {
            material_index,
            vertices_start,
            vertices_count,
            index_start,
            index_count,
        })
    }
}

/// Compute one submesh per material boundary.
///
/// Every submesh spans the whole vertex buffer (`positions.len() / 3`
/// vertices). Without boundaries a single submesh with material 0 covers
/// all indices.
pub fn partition(
    positions: &[f32],
    indices: &[u32],
    boundaries: &[MaterialBoundary],
) -> SubMeshResult<Vec<SubMesh>> {
    if positions.len() % 3 != 0 {
        return Err(SubMeshError::PositionsNotTriplets(positions.len()));
    }
    let vertices_count = (positions.len() / 3) as u32;

    if boundaries.is_empty() {
        return Ok(vec![SubMesh::whole(vertices_count, indices.len() as u32)]);
    }

    boundaries
        .iter()
        .map(|b| {
            if b.index_start > b.index_end || b.index_end as usize > indices.len() {
                return Err(SubMeshError::InvalidRange {
                    start: b.index_start,
                    end: b.index_end,
                    index_count: indices.len(),
                });
            }
            Ok(SubMesh {
                material_index: b.material_index,
                vertices_start: 0,
                vertices_count,
                index_start: b.index_start,
                index_count: b.index_end - b.index_start,
            })
        })
        .collect()
}

/// Group per-triangle material ids into boundaries.
///
/// Each run of consecutive triangles sharing a material becomes one
/// boundary, so triangles are expected to be sorted by material upstream.
pub fn boundaries_from_face_materials(face_materials: &[u32]) -> Vec<MaterialBoundary> {
    let mut boundaries: Vec<MaterialBoundary> = Vec::new();

    for (face, &material) in face_materials.iter().enumerate() {
        let start = face as u32 * 3;
        match boundaries.last_mut() {
            Some(last) if last.material_index == material => last.index_end = start + 3,
            _ => boundaries.push(MaterialBoundary::new(material, start, start + 3)),
        }
    }

    boundaries
}
