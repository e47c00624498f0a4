//! Binary attribute serialization.
//!
//! Large mesh arrays are moved out of the text document into a companion
//! binary file. The file has no header: it is the plain concatenation of
//! little-endian 4-byte values, attribute after attribute, followed by the
//! submesh records. Where each array lives is described in the mesh's
//! `_binaryInfo` attribute, and `delayLoadingFile` names the file.
//!
//! # Example
//!
//! ```ignore
//! use bex_core::binary::BinarySerializer;
//!
//! let geometry = BinarySerializer::canonical().serialize(&mut mesh, &catalog)?;
//! std::fs::write(mesh.get_text("delayLoadingFile")?, &geometry.buffer)?;
//! ```

use std::collections::BTreeMap;

use bex_math::Aabb;
use thiserror::Error;

use crate::constants;
use crate::object::{ObjectError, TypedObject};
use crate::schema::{Catalog, SchemaError};
use crate::submesh::{SubMesh, SubMeshError};
use crate::value::{Attributes, Value, ValueKind};

/// Default extension of companion binary files.
pub const DEFAULT_EXTENSION: &str = "babylonbinarymeshdata";

/// Descriptor name of the submesh record block.
pub const SUBMESH_BLOCK: &str = "subMeshes";

/// Number of integers in one packed submesh record.
pub const SUBMESH_STRIDE: u32 = 5;

/// Mesh key holding the descriptors, and the schema kind templating it.
pub const BINARY_INFO_KEY: &str = "_binaryInfo";

/// Mesh key naming the companion binary file.
pub const DELAY_LOADING_KEY: &str = "delayLoadingFile";

const DESCRIPTOR_SUFFIX: &str = "AttrDesc";

/// Errors that can occur during binary serialization.
#[derive(Error, Debug)]
pub enum BinaryError {
    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    SubMesh(#[from] SubMeshError),

    #[error("Element {index} of '{attribute}' is not a number")]
    NonNumeric { attribute: String, index: usize },

    #[error("Element {index} of '{attribute}' is not a 32-bit integer: {value}")]
    NonIntegral {
        attribute: String,
        index: usize,
        value: f64,
    },

    #[error("'{attribute}' has {count} elements, not a multiple of stride {stride}")]
    Stride {
        attribute: String,
        count: usize,
        stride: u32,
    },

    #[error("Descriptor '{attribute}' has a missing or invalid '{field}'")]
    MalformedDescriptor {
        attribute: String,
        field: &'static str,
    },

    #[error("Descriptor '{attribute}' covers bytes {offset}..{end} of a {len} byte buffer")]
    OutOfBounds {
        attribute: String,
        offset: usize,
        end: usize,
        len: usize,
    },
}

/// Result type for binary serialization.
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Element type of a binary array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryDataType {
    Int,
    Float,
}

impl BinaryDataType {
    /// The `dataType` code written to the document.
    pub fn code(&self) -> u32 {
        match self {
            BinaryDataType::Int => constants::BINARY_DATA_INT,
            BinaryDataType::Float => constants::BINARY_DATA_FLOAT,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            constants::BINARY_DATA_INT => Some(BinaryDataType::Int),
            constants::BINARY_DATA_FLOAT => Some(BinaryDataType::Float),
            _ => None,
        }
    }
}

/// A mesh attribute that can be moved into the binary buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryAttribute {
    pub name: &'static str,
    /// Components per element
    pub stride: u32,
    pub data_type: BinaryDataType,
}

impl BinaryAttribute {
    pub const POSITIONS: Self = Self::new("positions", 3, BinaryDataType::Float);
    pub const NORMALS: Self = Self::new("normals", 3, BinaryDataType::Float);
    pub const UVS: Self = Self::new("uvs", 2, BinaryDataType::Float);
    pub const COLORS: Self = Self::new("colors", 4, BinaryDataType::Float);
    pub const INDICES: Self = Self::new("indices", 1, BinaryDataType::Int);

    pub const fn new(name: &'static str, stride: u32, data_type: BinaryDataType) -> Self {
        Self {
            name,
            stride,
            data_type,
        }
    }
}

/// Positions, normals, uvs, indices.
pub const CANONICAL_ORDER: [BinaryAttribute; 4] = [
    BinaryAttribute::POSITIONS,
    BinaryAttribute::NORMALS,
    BinaryAttribute::UVS,
    BinaryAttribute::INDICES,
];

/// Canonical order plus vertex colors.
pub const FULL_ORDER: [BinaryAttribute; 5] = [
    BinaryAttribute::POSITIONS,
    BinaryAttribute::NORMALS,
    BinaryAttribute::UVS,
    BinaryAttribute::COLORS,
    BinaryAttribute::INDICES,
];

/// Where one attribute lives inside the binary buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryDescriptor {
    /// Scalar count for arrays, record count for the submesh block
    pub count: usize,
    pub stride: u32,
    /// Byte offset in the buffer
    pub offset: usize,
    pub data_type: BinaryDataType,
    records: bool,
}

impl BinaryDescriptor {
    /// Number of 4-byte values described.
    pub fn scalar_count(&self) -> usize {
        if self.records {
            self.count * self.stride as usize
        } else {
            self.count
        }
    }

    /// Number of bytes described.
    pub fn byte_len(&self) -> usize {
        self.scalar_count() * 4
    }

    /// The descriptor as written into `_binaryInfo`.
    pub fn to_value(&self) -> Value {
        let mut map = Attributes::new();
        map.insert("count".to_string(), Value::from(self.count));
        map.insert("stride".to_string(), Value::from(self.stride));
        map.insert("offset".to_string(), Value::from(self.offset));
        map.insert("dataType".to_string(), Value::from(self.data_type.code()));
        Value::Map(map)
    }

    /// Read back a descriptor written by [`BinaryDescriptor::to_value`].
    ///
    /// `attribute` is the array name without the `AttrDesc` suffix; the
    /// submesh block counts records rather than values.
    pub fn from_value(attribute: &str, value: &Value) -> BinaryResult<Self> {
        let fields = value.as_map().ok_or_else(|| BinaryError::MalformedDescriptor {
            attribute: attribute.to_string(),
            field: "self",
        })?;
        let field = |name: &'static str| -> BinaryResult<u32> {
            fields
                .get(name)
                .and_then(Value::as_number)
                .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
                .map(|n| n as u32)
                .ok_or_else(|| BinaryError::MalformedDescriptor {
                    attribute: attribute.to_string(),
                    field: name,
                })
        };

        let data_type = BinaryDataType::from_code(field("dataType")?).ok_or_else(|| {
            BinaryError::MalformedDescriptor {
                attribute: attribute.to_string(),
                field: "dataType",
            }
        })?;
        Ok(Self {
            count: field("count")? as usize,
            stride: field("stride")?,
            offset: field("offset")? as usize,
            data_type,
            records: attribute == SUBMESH_BLOCK,
        })
    }
}

/// Parse every `<name>AttrDesc` entry of a mesh's `_binaryInfo` value.
pub fn descriptors_from_info(info: &Value) -> BinaryResult<BTreeMap<String, BinaryDescriptor>> {
    let entries = match info {
        Value::Map(map) => map,
        Value::Object(object) => object.attributes(),
        other => {
            return Err(ObjectError::TypeMismatch {
                kind: BINARY_INFO_KEY.to_string(),
                key: BINARY_INFO_KEY.to_string(),
                expected: ValueKind::Object,
                found: other.kind(),
            }
            .into())
        }
    };

    let mut descriptors = BTreeMap::new();
    for (key, value) in entries {
        if let Some(name) = key.strip_suffix(DESCRIPTOR_SUFFIX) {
            descriptors.insert(name.to_string(), BinaryDescriptor::from_value(name, value)?);
        }
    }
    Ok(descriptors)
}

/// The output of one serialization: bytes plus their layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinaryGeometry {
    pub buffer: Vec<u8>,
    pub descriptors: BTreeMap<String, BinaryDescriptor>,
}

impl BinaryGeometry {
    /// Total number of bytes covered by the descriptors.
    pub fn described_len(&self) -> usize {
        self.descriptors.values().map(BinaryDescriptor::byte_len).sum()
    }

    fn push_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn push_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }
}

/// A decoded binary array.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedArray {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl DecodedArray {
    pub fn len(&self) -> usize {
        match self {
            DecodedArray::Int(values) => values.len(),
            DecodedArray::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File name of a mesh's companion binary file.
pub fn binary_file_name(mesh_id: &str, extension: &str) -> String {
    format!("{}.binary.{}", mesh_id, extension)
}

/// Moves mesh arrays into a binary buffer, in a fixed attribute order.
#[derive(Clone, Debug)]
pub struct BinarySerializer {
    order: Vec<BinaryAttribute>,
    extension: String,
}

impl Default for BinarySerializer {
    fn default() -> Self {
        Self::new(FULL_ORDER.to_vec())
    }
}

impl BinarySerializer {
    /// Serializer for the given attribute order.
    pub fn new(order: Vec<BinaryAttribute>) -> Self {
        Self {
            order,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Serializer for [`CANONICAL_ORDER`].
    pub fn canonical() -> Self {
        Self::new(CANONICAL_ORDER.to_vec())
    }

    /// Use a different extension for the companion file name.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn order(&self) -> &[BinaryAttribute] {
        &self.order
    }

    /// Move the mesh's arrays into a binary buffer.
    ///
    /// For each attribute in order, non-empty arrays are encoded and
    /// removed from the mesh. The mesh's submeshes follow as packed
    /// records. The mesh then carries `_binaryInfo` and `delayLoadingFile`,
    /// whether or not its template declares them. The file name is derived
    /// from the mesh identifier as is, even when that is empty.
    /// On error the mesh is left untouched.
    pub fn serialize(&self, mesh: &mut TypedObject, catalog: &Catalog) -> BinaryResult<BinaryGeometry> {
        let mesh_id = mesh.identifier().unwrap_or_default().to_string();

        let mut geometry = BinaryGeometry::default();
        let mut consumed = Vec::new();
        let mut bounds: Option<Aabb> = None;

        for attribute in &self.order {
            let Some(items) = array_attribute(mesh, attribute.name)? else {
                log::debug!("'{}' has no '{}' attribute", mesh_id, attribute.name);
                continue;
            };
            if items.is_empty() {
                log::debug!("Skipping empty '{}' of '{}'", attribute.name, mesh_id);
                continue;
            }
            if items.len() % attribute.stride as usize != 0 {
                return Err(BinaryError::Stride {
                    attribute: attribute.name.to_string(),
                    count: items.len(),
                    stride: attribute.stride,
                });
            }

            let offset = geometry.buffer.len();
            match attribute.data_type {
                BinaryDataType::Float => {
                    let floats = floats(attribute.name, items)?;
                    if attribute.name == BinaryAttribute::POSITIONS.name {
                        bounds = Some(Aabb::from_flat_positions(&floats));
                    }
                    floats.into_iter().for_each(|v| geometry.push_f32(v));
                }
                BinaryDataType::Int => {
                    for value in ints(attribute.name, items)? {
                        geometry.push_i32(value);
                    }
                }
            }

            geometry.descriptors.insert(
                attribute.name.to_string(),
                BinaryDescriptor {
                    count: items.len(),
                    stride: attribute.stride,
                    offset,
                    data_type: attribute.data_type,
                    records: false,
                },
            );
            consumed.push(attribute.name);
        }

        let submeshes = self.submeshes(mesh, &geometry)?;
        if let Some(submeshes) = &submeshes {
            let offset = geometry.buffer.len();
            for submesh in submeshes {
                for (i, field) in submesh.packed().into_iter().enumerate() {
                    let value = i32::try_from(field).map_err(|_| BinaryError::NonIntegral {
                        attribute: SUBMESH_BLOCK.to_string(),
                        index: i,
                        value: f64::from(field),
                    })?;
                    geometry.push_i32(value);
                }
            }
            geometry.descriptors.insert(
                SUBMESH_BLOCK.to_string(),
                BinaryDescriptor {
                    count: submeshes.len(),
                    stride: SUBMESH_STRIDE,
                    offset,
                    data_type: BinaryDataType::Int,
                    records: true,
                },
            );
        }

        let binary_info = self.binary_info(&geometry, catalog)?;

        // Work on a copy so that a failure leaves the mesh untouched.
        let file_name = binary_file_name(&mesh_id, &self.extension);
        let mut updated = mesh.clone();
        if let Some(bounds) = bounds.filter(|b| !b.is_empty()) {
            if updated.contains("boundingBoxMinimum") && updated.contains("boundingBoxMaximum") {
                updated.set("boundingBoxMinimum", bounds.min())?;
                updated.set("boundingBoxMaximum", bounds.max())?;
            }
        }
        for name in consumed {
            updated.retract(name)?;
        }
        if submeshes.is_some() {
            updated.retract(SUBMESH_BLOCK)?;
        }
        updated.attach_reserved(BINARY_INFO_KEY, binary_info);
        updated.attach_reserved(DELAY_LOADING_KEY, file_name);
        *mesh = updated;

        log::debug!(
            "Serialized '{}': {} bytes in {} blocks",
            mesh_id,
            geometry.buffer.len(),
            geometry.descriptors.len()
        );
        Ok(geometry)
    }

    /// Submeshes to pack: the mesh's own, or one covering everything.
    fn submeshes(
        &self,
        mesh: &TypedObject,
        geometry: &BinaryGeometry,
    ) -> BinaryResult<Option<Vec<SubMesh>>> {
        let Some(items) = array_attribute(mesh, SUBMESH_BLOCK)? else {
            return Ok(None);
        };

        let mut submeshes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| ObjectError::TypeMismatch {
                kind: mesh.kind().to_string(),
                key: format!("{}[{}]", SUBMESH_BLOCK, index),
                expected: ValueKind::Object,
                found: item.kind(),
            })?;
            submeshes.push(SubMesh::from_object(object)?);
        }

        if submeshes.is_empty() && !geometry.descriptors.is_empty() {
            let count = |name: &str| geometry.descriptors.get(name).map_or(0, |d| d.count);
            submeshes.push(SubMesh::whole(
                (count(BinaryAttribute::POSITIONS.name) / 3) as u32,
                count(BinaryAttribute::INDICES.name) as u32,
            ));
        }

        Ok((!submeshes.is_empty()).then_some(submeshes))
    }

    /// Build the `_binaryInfo` value for the written descriptors.
    ///
    /// A plain map unless the catalog templates `_binaryInfo`; template
    /// entries without a written descriptor are dropped.
    fn binary_info(&self, geometry: &BinaryGeometry, catalog: &Catalog) -> BinaryResult<Value> {
        let entries = geometry
            .descriptors
            .iter()
            .map(|(name, descriptor)| (format!("{}{}", name, DESCRIPTOR_SUFFIX), descriptor.to_value()));

        if !catalog.contains(BINARY_INFO_KEY) {
            return Ok(Value::Map(entries.collect()));
        }

        let mut info = catalog.instantiate(BINARY_INFO_KEY)?;
        let mut written = Vec::new();
        for (key, value) in entries {
            if info.contains(&key) {
                info.set(&key, value)?;
            } else {
                info.attach_reserved(&key, value);
            }
            written.push(key);
        }

        let unused: Vec<String> = info
            .keys()
            .filter(|key| !written.iter().any(|w| w == key))
            .map(str::to_string)
            .collect();
        for key in unused {
            info.retract(&key)?;
        }

        Ok(Value::from(info))
    }
}

/// Decode a buffer back into arrays, one per descriptor.
pub fn decode(
    buffer: &[u8],
    descriptors: &BTreeMap<String, BinaryDescriptor>,
) -> BinaryResult<BTreeMap<String, DecodedArray>> {
    let mut arrays = BTreeMap::new();

    for (name, descriptor) in descriptors {
        let end = descriptor.offset + descriptor.byte_len();
        let bytes = buffer
            .get(descriptor.offset..end)
            .ok_or_else(|| BinaryError::OutOfBounds {
                attribute: name.clone(),
                offset: descriptor.offset,
                end,
                len: buffer.len(),
            })?;

        let words = bytes.chunks_exact(4).map(|w| [w[0], w[1], w[2], w[3]]);
        let array = match descriptor.data_type {
            BinaryDataType::Float => DecodedArray::Float(words.map(f32::from_le_bytes).collect()),
            BinaryDataType::Int => DecodedArray::Int(words.map(i32::from_le_bytes).collect()),
        };
        arrays.insert(name.clone(), array);
    }

    Ok(arrays)
}

/// The sequence stored under `name`, or `None` if the object lacks the key.
fn array_attribute<'a>(object: &'a TypedObject, name: &str) -> BinaryResult<Option<&'a [Value]>> {
    if !object.contains(name) {
        return Ok(None);
    }
    let value = object.get(name)?;
    match value.as_sequence() {
        Some(items) => Ok(Some(items)),
        None => Err(ObjectError::TypeMismatch {
            kind: object.kind().to_string(),
            key: name.to_string(),
            expected: ValueKind::Sequence,
            found: value.kind(),
        }
        .into()),
    }
}

fn floats(attribute: &str, items: &[Value]) -> BinaryResult<Vec<f32>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_number()
                .map(|n| n as f32)
                .ok_or_else(|| BinaryError::NonNumeric {
                    attribute: attribute.to_string(),
                    index,
                })
        })
        .collect()
}

fn ints(attribute: &str, items: &[Value]) -> BinaryResult<Vec<i32>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let value = item.as_number().ok_or_else(|| BinaryError::NonNumeric {
                attribute: attribute.to_string(),
                index,
            })?;
            if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
                return Err(BinaryError::NonIntegral {
                    attribute: attribute.to_string(),
                    index,
                    value,
                });
            }
            Ok(value as i32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

    /// A catalog holding only `mesh = {id: "", positions: [], indices: []}`.
    fn minimal_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let mut minimal = Attributes::new();
        minimal.insert("id".to_string(), Value::from(""));
        minimal.insert("positions".to_string(), Value::Sequence(vec![]));
        minimal.insert("indices".to_string(), Value::Sequence(vec![]));
        catalog.insert("mesh", minimal).unwrap();
        catalog
    }

    fn triangle(catalog: &Catalog, kind: &str) -> TypedObject {
        let mut mesh = catalog.instantiate(kind).unwrap();
        mesh.set("id", "tri").unwrap();
        mesh.set("positions", TRIANGLE.to_vec()).unwrap();
        mesh.set("indices", vec![0u32, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn test_minimal_layout() {
        let catalog = minimal_catalog();
        let mut mesh = triangle(&catalog, "mesh");

        let geometry = BinarySerializer::canonical().serialize(&mut mesh, &catalog).unwrap();

        assert_eq!(geometry.buffer.len(), 48);
        assert_eq!(geometry.descriptors.len(), 2);

        let positions = geometry.descriptors["positions"];
        assert_eq!(
            (positions.count, positions.stride, positions.offset, positions.data_type),
            (9, 3, 0, BinaryDataType::Float)
        );
        let indices = geometry.descriptors["indices"];
        assert_eq!(
            (indices.count, indices.stride, indices.offset, indices.data_type),
            (3, 1, 36, BinaryDataType::Int)
        );

        assert_eq!(&geometry.buffer[12..16], &1.0f32.to_le_bytes());
        assert_eq!(&geometry.buffer[40..44], &1i32.to_le_bytes());
    }

    #[test]
    fn test_minimal_template_with_empty_id() {
        let catalog = minimal_catalog();
        let mut mesh = catalog.instantiate("mesh").unwrap();

        assert!(mesh.set("positions", "bad").is_err());
        assert!(mesh.get("positions").unwrap().is_empty_sequence());

        mesh.set("positions", TRIANGLE.to_vec()).unwrap();
        mesh.set("indices", vec![0u32, 1, 2]).unwrap();
        let geometry = BinarySerializer::canonical().serialize(&mut mesh, &catalog).unwrap();

        assert_eq!(geometry.buffer.len(), 48);
        let positions = geometry.descriptors["positions"];
        assert_eq!(
            (positions.count, positions.stride, positions.offset, positions.data_type),
            (9, 3, 0, BinaryDataType::Float)
        );
        let indices = geometry.descriptors["indices"];
        assert_eq!(
            (indices.count, indices.stride, indices.offset, indices.data_type),
            (3, 1, 36, BinaryDataType::Int)
        );

        assert_eq!(mesh.get_text("id").unwrap(), "");
        assert_eq!(
            mesh.get_text(DELAY_LOADING_KEY).unwrap(),
            ".binary.babylonbinarymeshdata"
        );
        let info = mesh.get(BINARY_INFO_KEY).unwrap().as_map().unwrap();
        assert_eq!(info.len(), 2);
        assert!(info.contains_key("positionsAttrDesc"));
        assert!(info.contains_key("indicesAttrDesc"));
    }

    #[test]
    fn test_arrays_leave_text_document() {
        let catalog = minimal_catalog();
        let mut mesh = triangle(&catalog, "mesh");

        BinarySerializer::canonical().serialize(&mut mesh, &catalog).unwrap();

        assert!(!mesh.contains("positions"));
        assert!(!mesh.contains("indices"));
        assert_eq!(
            mesh.get_text("delayLoadingFile").unwrap(),
            "tri.binary.babylonbinarymeshdata"
        );

        let json = mesh.to_json().unwrap();
        let info = &json["_binaryInfo"];
        assert_eq!(info["positionsAttrDesc"]["count"], 9);
        assert_eq!(info["indicesAttrDesc"]["offset"], 36);
        assert_eq!(info["indicesAttrDesc"]["dataType"], 0);
        assert!(info.get("normalsAttrDesc").is_none());
    }

    #[test]
    fn test_full_mesh_with_submeshes() {
        let catalog = Catalog::builtin().unwrap();
        let mut mesh = triangle(&catalog, "mesh");
        mesh.set("normals", vec![0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
            .unwrap();
        mesh.set("uvs", vec![0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();

        let geometry = BinarySerializer::canonical()
            .with_extension("bin")
            .serialize(&mut mesh, &catalog)
            .unwrap();

        // positions, normals, uvs, indices, one submesh record
        assert_eq!(geometry.buffer.len(), (9 + 9 + 6 + 3 + 5) * 4);
        assert_eq!(geometry.described_len(), geometry.buffer.len());

        let submeshes = geometry.descriptors[SUBMESH_BLOCK];
        assert_eq!((submeshes.count, submeshes.stride, submeshes.offset), (1, 5, 108));

        let decoded = decode(&geometry.buffer, &geometry.descriptors).unwrap();
        assert_eq!(decoded["positions"], DecodedArray::Float(TRIANGLE.to_vec()));
        assert_eq!(decoded["indices"], DecodedArray::Int(vec![0, 1, 2]));
        assert_eq!(decoded[SUBMESH_BLOCK], DecodedArray::Int(vec![0, 0, 3, 0, 3]));

        assert!(!mesh.contains("subMeshes"));
        assert_eq!(mesh.get_text("delayLoadingFile").unwrap(), "tri.binary.bin");
        let max = mesh.get("boundingBoxMaximum").unwrap().as_sequence().unwrap();
        assert_eq!(max, Value::numbers([1.0, 1.0, 0.0]).as_sequence().unwrap());
        // colors were never set and stay behind as an empty array
        assert!(mesh.get("colors").unwrap().is_empty_sequence());
    }

    #[test]
    fn test_explicit_submeshes_are_packed() {
        let catalog = Catalog::builtin().unwrap();
        let mut mesh = triangle(&catalog, "mesh");
        let submesh = SubMesh {
            material_index: 2,
            vertices_start: 0,
            vertices_count: 3,
            index_start: 0,
            index_count: 3,
        };
        mesh.sequence_mut("subMeshes")
            .unwrap()
            .push(Value::from(submesh.to_object(&catalog).unwrap()));

        let geometry = BinarySerializer::default().serialize(&mut mesh, &catalog).unwrap();
        let decoded = decode(&geometry.buffer, &geometry.descriptors).unwrap();

        assert_eq!(decoded[SUBMESH_BLOCK], DecodedArray::Int(vec![2, 0, 3, 0, 3]));
    }

    #[test]
    fn test_deterministic() {
        let catalog = Catalog::builtin().unwrap();
        let mut a = triangle(&catalog, "mesh");
        let mut b = triangle(&catalog, "mesh");

        let serializer = BinarySerializer::default();
        let first = serializer.serialize(&mut a, &catalog).unwrap();
        let second = serializer.serialize(&mut b, &catalog).unwrap();

        assert_eq!(first, second);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bad_index_leaves_mesh_untouched() {
        let catalog = Catalog::builtin().unwrap();
        let mut mesh = triangle(&catalog, "mesh");
        mesh.set("indices", Value::numbers([0.0, 1.5, 2.0])).unwrap();
        let before = mesh.clone();

        let err = BinarySerializer::default().serialize(&mut mesh, &catalog).unwrap_err();

        assert!(matches!(err, BinaryError::NonIntegral { index: 1, .. }));
        assert_eq!(mesh, before);
    }

    #[test]
    fn test_stride_mismatch() {
        let catalog = Catalog::builtin().unwrap();
        let mut mesh = triangle(&catalog, "mesh");
        mesh.set("uvs", vec![0.0f32, 1.0, 0.5]).unwrap();

        assert!(matches!(
            BinarySerializer::default().serialize(&mut mesh, &catalog),
            Err(BinaryError::Stride { stride: 2, .. })
        ));
    }

    #[test]
    fn test_attribute_outside_binary_info_template() {
        let mut catalog = Catalog::builtin().unwrap();
        let mut skinned = Attributes::new();
        skinned.insert("id".to_string(), Value::from("arm"));
        skinned.insert("positions".to_string(), Value::from(TRIANGLE.to_vec()));
        skinned.insert("matricesWeights".to_string(), Value::from(vec![1.0f32, 0.0, 0.0, 0.0]));
        catalog.insert("skinnedMesh", skinned).unwrap();
        let mut mesh = catalog.instantiate("skinnedMesh").unwrap();

        let serializer = BinarySerializer::new(vec![
            BinaryAttribute::POSITIONS,
            BinaryAttribute::new("matricesWeights", 4, BinaryDataType::Float),
        ]);
        serializer.serialize(&mut mesh, &catalog).unwrap();

        let json = mesh.to_json().unwrap();
        assert_eq!(json["_binaryInfo"]["matricesWeightsAttrDesc"]["offset"], 36);
        assert_eq!(json["_binaryInfo"]["positionsAttrDesc"]["count"], 9);
        assert!(json["_binaryInfo"].get("normalsAttrDesc").is_none());
        assert!(!mesh.contains("matricesWeights"));
    }

    #[test]
    fn test_descriptors_read_back_from_document() {
        let catalog = Catalog::builtin().unwrap();
        let mut mesh = triangle(&catalog, "mesh");
        mesh.set("uvs", vec![0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
        let geometry = BinarySerializer::default().serialize(&mut mesh, &catalog).unwrap();

        let json = mesh.to_json().unwrap();
        let info = Value::from_json(&json[BINARY_INFO_KEY]);
        let descriptors = descriptors_from_info(&info).unwrap();

        assert_eq!(descriptors, geometry.descriptors);
        let decoded = decode(&geometry.buffer, &descriptors).unwrap();
        assert_eq!(decoded[SUBMESH_BLOCK], DecodedArray::Int(vec![0, 0, 3, 0, 3]));
    }

    #[test]
    fn test_malformed_descriptor() {
        let mut fields = Attributes::new();
        fields.insert("count".to_string(), Value::from(3u32));
        fields.insert("stride".to_string(), Value::from(1u32));
        fields.insert("offset".to_string(), Value::from(0u32));
        fields.insert("dataType".to_string(), Value::from(7u32));

        assert!(matches!(
            BinaryDescriptor::from_value("indices", &Value::Map(fields.clone())),
            Err(BinaryError::MalformedDescriptor { field: "dataType", .. })
        ));

        fields.insert("dataType".to_string(), Value::from(0u32));
        fields.remove("offset");
        assert!(matches!(
            BinaryDescriptor::from_value("indices", &Value::Map(fields)),
            Err(BinaryError::MalformedDescriptor { field: "offset", .. })
        ));
    }

    #[test]
    fn test_decode_out_of_bounds() {
        let mut descriptors = BTreeMap::new();
        descriptors.insert(
            "positions".to_string(),
            BinaryDescriptor {
                count: 3,
                stride: 3,
                offset: 4,
                data_type: BinaryDataType::Float,
                records: false,
            },
        );

        assert!(matches!(
            decode(&[0u8; 12], &descriptors),
            Err(BinaryError::OutOfBounds { end: 16, .. })
        ));
    }
}
