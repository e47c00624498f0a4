//! Attribute bundles handed over by the authoring tool.
//!
//! The exporter never queries the authoring tool itself. A collaborator
//! evaluates every source object into one of the fixed-shape bundles below
//! (transforms, flat float arrays, index lists, scalar and string shader
//! parameters) and each bundle populates the typed objects that represent
//! it in the scene document.
//!
//! Bundles deserialize from JSON, so the hand-over can be a file:
//!
//! ```json
//! { "objects": [
//!     { "type": "camera", "name": "cam1", "transform": { "translation": [0, 2, 10] } },
//!     { "type": "mesh", "name": "tri", "positions": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,2] }
//! ] }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use bex_math::{Aabb, Transform, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::constants;
use crate::object::{ObjectError, ObjectResult, TypedObject};
use crate::schema::{Catalog, SchemaError};
use crate::submesh::{boundaries_from_face_materials, partition, SubMeshError};
use crate::value::Value;

/// Errors that can occur while populating objects from bundles.
#[derive(Error, Debug)]
pub enum BundleError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    SubMesh(#[from] SubMeshError),

    #[error("IO error reading bundle '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bundle '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{object}': invalid {parameter} {value}")]
    InvalidParameter {
        object: String,
        parameter: &'static str,
        value: f32,
    },

    #[error("'{object}': {faces} face materials for {triangles} triangles")]
    FaceMaterialCount {
        object: String,
        faces: usize,
        triangles: usize,
    },

    #[error("Animation '{animation}' key at frame {frame} has {found} values, expected {expected}")]
    KeyLength {
        animation: String,
        frame: f32,
        expected: usize,
        found: usize,
    },
}

/// Result type for bundle population.
pub type BundleResult<T> = Result<T, BundleError>;

fn default_one() -> f32 {
    1.0
}

fn default_white() -> Vec3 {
    Vec3::ONE
}

fn default_true() -> bool {
    true
}

/// Everything one export run receives from the authoring tool.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneBundle {
    #[serde(default)]
    pub objects: Vec<SourceObject>,
}

impl SceneBundle {
    /// Read a bundle from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> BundleResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| BundleError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a bundle from JSON text.
    pub fn from_json_str(content: &str) -> BundleResult<Self> {
        serde_json::from_str(content).map_err(|source| BundleError::Json {
            path: PathBuf::from("<string>"),
            source,
        })
    }
}

/// One evaluated source object.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceObject {
    Camera(CameraBundle),
    Light(LightBundle),
    Mesh(MeshBundle),
    Material(MaterialBundle),
    MultiMaterial(MultiMaterialBundle),
    Shadow(ShadowBundle),
}

impl SourceObject {
    pub fn name(&self) -> &str {
        match self {
            SourceObject::Camera(b) => &b.name,
            SourceObject::Light(b) => &b.name,
            SourceObject::Mesh(b) => &b.name,
            SourceObject::Material(b) => &b.name,
            SourceObject::MultiMaterial(b) => &b.name,
            SourceObject::Shadow(b) => &b.light_id,
        }
    }

    /// Build the typed objects representing this source object.
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<Vec<TypedObject>> {
        match self {
            SourceObject::Camera(b) => Ok(vec![b.populate(catalog)?]),
            SourceObject::Light(b) => Ok(vec![b.populate(catalog)?]),
            SourceObject::Mesh(b) => b.populate(catalog),
            SourceObject::Material(b) => Ok(vec![b.populate(catalog)?]),
            SourceObject::MultiMaterial(b) => Ok(vec![b.populate(catalog)?]),
            SourceObject::Shadow(b) => Ok(vec![b.populate(catalog)?]),
        }
    }
}

/// A perspective camera.
#[derive(Clone, Debug, Deserialize)]
pub struct CameraBundle {
    pub name: String,

    #[serde(default)]
    pub transform: Transform,

    /// Look-at point; one unit down the camera's -Z axis when absent
    #[serde(default)]
    pub target: Option<Vec3>,

    /// Horizontal film aperture (same unit as `focal`)
    #[serde(default = "default_aperture")]
    pub aperture: f32,

    /// Focal length
    #[serde(default = "default_focal")]
    pub focal: f32,

    #[serde(default)]
    pub min_z: Option<f32>,

    #[serde(default)]
    pub max_z: Option<f32>,

    #[serde(default)]
    pub animations: Vec<AnimationBundle>,
}

fn default_aperture() -> f32 {
    41.4214
}

fn default_focal() -> f32 {
    50.0
}

impl CameraBundle {
    /// Field of view in radians: `2 * atan((aperture / 2) / focal)`.
    pub fn fov(&self) -> f32 {
        2.0 * ((self.aperture / 2.0) / self.focal).atan()
    }

    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        if self.focal <= 0.0 {
            return Err(self.invalid("focal length", self.focal));
        }
        if self.aperture <= 0.0 {
            return Err(self.invalid("aperture", self.aperture));
        }

        let mut camera = catalog.instantiate("camera")?;
        set_identity(&mut camera, &self.name)?;
        camera.set("position", self.transform.translation)?;
        let target = self.target.unwrap_or_else(|| self.transform.forward_target());
        camera.set("target", target)?;
        camera.set("fov", self.fov())?;
        if let Some(min_z) = self.min_z {
            camera.set("minZ", min_z)?;
        }
        if let Some(max_z) = self.max_z {
            camera.set("maxZ", max_z)?;
        }
        set_animations(&mut camera, &self.animations, catalog)?;
        Ok(camera)
    }

    fn invalid(&self, parameter: &'static str, value: f32) -> BundleError {
        BundleError::InvalidParameter {
            object: self.name.clone(),
            parameter,
            value,
        }
    }
}

/// Light types understood by the scene document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightType {
    #[default]
    Point,
    Directional,
    Spot,
    Hemispheric,
}

impl LightType {
    pub fn code(&self) -> u32 {
        match self {
            LightType::Point => constants::LIGHT_TYPE_POINT,
            LightType::Directional => constants::LIGHT_TYPE_DIRECTIONAL,
            LightType::Spot => constants::LIGHT_TYPE_SPOT,
            LightType::Hemispheric => constants::LIGHT_TYPE_HEMISPHERIC,
        }
    }
}

/// A light source.
#[derive(Clone, Debug, Deserialize)]
pub struct LightBundle {
    pub name: String,

    #[serde(default)]
    pub light_type: LightType,

    #[serde(default)]
    pub position: Vec3,

    #[serde(default = "default_direction")]
    pub direction: Vec3,

    #[serde(default = "default_white")]
    pub diffuse: Vec3,

    #[serde(default = "default_white")]
    pub specular: Vec3,

    #[serde(default = "default_one")]
    pub intensity: f32,

    /// Distance beyond which the light has no effect
    #[serde(default)]
    pub range: Option<f32>,

    /// Spot cone angle in radians
    #[serde(default)]
    pub angle: Option<f32>,

    /// Spot falloff exponent
    #[serde(default)]
    pub exponent: Option<f32>,

    /// Hemispheric ground color
    #[serde(default)]
    pub ground_color: Option<Vec3>,

    #[serde(default)]
    pub animations: Vec<AnimationBundle>,
}

fn default_direction() -> Vec3 {
    Vec3::NEG_Y
}

impl LightBundle {
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        if self.intensity < 0.0 {
            return Err(BundleError::InvalidParameter {
                object: self.name.clone(),
                parameter: "intensity",
                value: self.intensity,
            });
        }

        let mut light = catalog.instantiate("light")?;
        set_identity(&mut light, &self.name)?;
        light.set("type", self.light_type.code())?;
        light.set("position", self.position)?;
        light.set("direction", self.direction)?;
        light.set("diffuse", self.diffuse)?;
        light.set("specular", self.specular)?;
        light.set("intensity", self.intensity)?;
        if let Some(range) = self.range {
            light.set("range", range)?;
        }
        if let Some(angle) = self.angle {
            light.set("angle", angle)?;
        }
        if let Some(exponent) = self.exponent {
            light.set("exponent", exponent)?;
        }
        if let Some(ground_color) = self.ground_color {
            light.set("groundColor", ground_color)?;
        }
        set_animations(&mut light, &self.animations, catalog)?;
        Ok(light)
    }
}

/// Polygon geometry, already triangulated upstream.
#[derive(Clone, Debug, Deserialize)]
pub struct MeshBundle {
    pub name: String,

    #[serde(default)]
    pub transform: Transform,

    /// Flat `[x, y, z, ...]` vertex positions
    #[serde(default)]
    pub positions: Vec<f32>,

    #[serde(default)]
    pub normals: Vec<f32>,

    /// Flat `[u, v, ...]` coordinates
    #[serde(default)]
    pub uvs: Vec<f32>,

    /// Flat `[r, g, b, a, ...]` vertex colors
    #[serde(default)]
    pub colors: Vec<f32>,

    /// Triangle vertex indices
    #[serde(default)]
    pub indices: Vec<u32>,

    /// Material index per triangle, sorted into runs
    #[serde(default)]
    pub face_materials: Vec<u32>,

    #[serde(default)]
    pub material_id: Option<String>,

    /// Export a box primitive sized from the bounding box instead of the polygons
    #[serde(default)]
    pub as_bounding_box: bool,

    #[serde(default)]
    pub receive_shadows: bool,

    #[serde(default)]
    pub animations: Vec<AnimationBundle>,
}

/// Mesh arrays that are dropped from the document when empty.
const OPTIONAL_ARRAYS: [&str; 6] = ["positions", "normals", "uvs", "colors", "indices", "subMeshes"];

impl MeshBundle {
    /// Build the mesh object, preceded by its box geometry when exported
    /// as a bounding box.
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<Vec<TypedObject>> {
        let mut mesh = catalog.instantiate("mesh")?;
        set_identity(&mut mesh, &self.name)?;
        mesh.set("position", self.transform.translation)?;
        mesh.set("rotation", self.transform.rotation)?;
        mesh.set("scaling", self.transform.scale)?;
        mesh.set("receiveShadows", self.receive_shadows)?;
        if let Some(material_id) = &self.material_id {
            mesh.set("materialId", material_id.as_str())?;
        }
        set_animations(&mut mesh, &self.animations, catalog)?;

        let bounds = Aabb::from_flat_positions(&self.positions);
        let mut objects = Vec::with_capacity(2);

        if self.as_bounding_box {
            let mut cube = catalog.instantiate("box")?;
            cube.set("id", self.name.as_str())?;
            cube.set("size", bounds.extent().max_element())?;
            mesh.set("geometryId", self.name.as_str())?;
            objects.push(cube);
        } else {
            self.set_geometry(&mut mesh, catalog)?;
            if !bounds.is_empty() {
                mesh.set("boundingBoxMinimum", bounds.min())?;
                mesh.set("boundingBoxMaximum", bounds.max())?;
            }
        }

        retract_empty(&mut mesh, &OPTIONAL_ARRAYS)?;
        objects.push(mesh);
        Ok(objects)
    }

    fn set_geometry(&self, mesh: &mut TypedObject, catalog: &Catalog) -> BundleResult<()> {
        if self.positions.is_empty() {
            return Ok(());
        }

        let triangles = self.indices.len() / 3;
        if !self.face_materials.is_empty() && self.face_materials.len() != triangles {
            return Err(BundleError::FaceMaterialCount {
                object: self.name.clone(),
                faces: self.face_materials.len(),
                triangles,
            });
        }

        let boundaries = boundaries_from_face_materials(&self.face_materials);
        let submeshes = partition(&self.positions, &self.indices, &boundaries)?;
        let submeshes = submeshes
            .iter()
            .map(|s| s.to_object(catalog).map(Value::from))
            .collect::<Result<Vec<_>, _>>()?;

        mesh.set("positions", self.positions.as_slice())?;
        mesh.set("normals", self.normals.as_slice())?;
        mesh.set("uvs", self.uvs.as_slice())?;
        mesh.set("colors", self.colors.as_slice())?;
        mesh.set("indices", self.indices.as_slice())?;
        mesh.set("subMeshes", submeshes)?;
        Ok(())
    }
}

/// A standard material.
#[derive(Clone, Debug, Deserialize)]
pub struct MaterialBundle {
    pub name: String,

    #[serde(default = "default_white")]
    pub ambient: Vec3,

    #[serde(default = "default_white")]
    pub diffuse: Vec3,

    #[serde(default = "default_white")]
    pub specular: Vec3,

    #[serde(default)]
    pub emissive: Vec3,

    #[serde(default = "default_specular_power")]
    pub specular_power: f32,

    #[serde(default = "default_one")]
    pub alpha: f32,

    #[serde(default = "default_true")]
    pub back_face_culling: bool,

    #[serde(default)]
    pub wireframe: bool,

    #[serde(default)]
    pub diffuse_texture: Option<TextureBundle>,
}

fn default_specular_power() -> f32 {
    64.0
}

impl MaterialBundle {
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(BundleError::InvalidParameter {
                object: self.name.clone(),
                parameter: "alpha",
                value: self.alpha,
            });
        }

        let mut material = catalog.instantiate("material")?;
        set_identity(&mut material, &self.name)?;
        material.set("ambient", self.ambient)?;
        material.set("diffuse", self.diffuse)?;
        material.set("specular", self.specular)?;
        material.set("emissive", self.emissive)?;
        material.set("specularPower", self.specular_power)?;
        material.set("alpha", self.alpha)?;
        material.set("backFaceCulling", self.back_face_culling)?;
        material.set("wireframe", self.wireframe)?;

        match &self.diffuse_texture {
            Some(texture) => material.set("diffuseTexture", texture.populate(catalog)?)?,
            None => {
                material.retract("diffuseTexture")?;
            }
        }
        Ok(material)
    }
}

/// An image texture referenced by file name.
#[derive(Clone, Debug, Deserialize)]
pub struct TextureBundle {
    /// Image file name, relative to the scene document
    pub name: String,

    #[serde(default = "default_one")]
    pub level: f32,

    #[serde(default)]
    pub has_alpha: bool,

    #[serde(default = "default_one")]
    pub u_scale: f32,

    #[serde(default = "default_one")]
    pub v_scale: f32,

    #[serde(default)]
    pub u_offset: f32,

    #[serde(default)]
    pub v_offset: f32,
}

impl TextureBundle {
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        let mut texture = catalog.instantiate("texture")?;
        texture.set("name", self.name.as_str())?;
        texture.set("level", self.level)?;
        texture.set("hasAlpha", self.has_alpha)?;
        texture.set("uScale", self.u_scale)?;
        texture.set("vScale", self.v_scale)?;
        texture.set("uOffset", self.u_offset)?;
        texture.set("vOffset", self.v_offset)?;
        Ok(texture)
    }
}

/// A list of materials addressed by submesh material index.
#[derive(Clone, Debug, Deserialize)]
pub struct MultiMaterialBundle {
    pub name: String,

    /// Material ids, in submesh material index order
    #[serde(default)]
    pub materials: Vec<String>,
}

impl MultiMaterialBundle {
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        let mut multi = catalog.instantiate("multiMaterial")?;
        set_identity(&mut multi, &self.name)?;
        let materials: Vec<Value> = self.materials.iter().map(|id| Value::from(id.as_str())).collect();
        multi.set("materials", materials)?;
        Ok(multi)
    }
}

/// A shadow map cast by one light.
#[derive(Clone, Debug, Deserialize)]
pub struct ShadowBundle {
    pub light_id: String,

    #[serde(default = "default_map_size")]
    pub map_size: u32,

    #[serde(default)]
    pub use_variance_shadow_map: bool,

    /// Ids of the meshes casting shadows
    #[serde(default)]
    pub render_list: Vec<String>,
}

fn default_map_size() -> u32 {
    1024
}

impl ShadowBundle {
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        if !self.map_size.is_power_of_two() {
            return Err(BundleError::InvalidParameter {
                object: self.light_id.clone(),
                parameter: "shadow map size",
                value: self.map_size as f32,
            });
        }

        let mut shadow = catalog.instantiate("shadowGenerator")?;
        shadow.set("lightId", self.light_id.as_str())?;
        shadow.set("mapSize", self.map_size)?;
        shadow.set("useVarianceShadowMap", self.use_variance_shadow_map)?;
        let render_list: Vec<Value> = self.render_list.iter().map(|id| Value::from(id.as_str())).collect();
        shadow.set("renderList", render_list)?;
        Ok(shadow)
    }
}

/// Value type of an animated property.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationDataType {
    #[default]
    Float,
    Vector3,
    Quaternion,
    Matrix,
}

impl AnimationDataType {
    pub fn code(&self) -> u32 {
        match self {
            AnimationDataType::Float => constants::ANIMATION_TYPE_FLOAT,
            AnimationDataType::Vector3 => constants::ANIMATION_TYPE_VECTOR3,
            AnimationDataType::Quaternion => constants::ANIMATION_TYPE_QUATERNION,
            AnimationDataType::Matrix => constants::ANIMATION_TYPE_MATRIX,
        }
    }

    /// Number of values in one key.
    pub fn components(&self) -> usize {
        match self {
            AnimationDataType::Float => 1,
            AnimationDataType::Vector3 => 3,
            AnimationDataType::Quaternion => 4,
            AnimationDataType::Matrix => 16,
        }
    }
}

/// What an animation does after its last key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopBehavior {
    Relative,
    #[default]
    Cycle,
    Constant,
}

impl LoopBehavior {
    pub fn code(&self) -> u32 {
        match self {
            LoopBehavior::Relative => constants::ANIMATION_LOOP_RELATIVE,
            LoopBehavior::Cycle => constants::ANIMATION_LOOP_CYCLE,
            LoopBehavior::Constant => constants::ANIMATION_LOOP_CONSTANT,
        }
    }
}

/// One sampled key.
#[derive(Clone, Debug, Deserialize)]
pub struct KeyFrame {
    pub frame: f32,
    pub values: Vec<f32>,
}

/// A property animation, sampled upstream. Keys are exported as given.
#[derive(Clone, Debug, Deserialize)]
pub struct AnimationBundle {
    pub name: String,

    /// Animated property path, e.g. `position` or `rotation.y`
    pub property: String,

    #[serde(default)]
    pub data_type: AnimationDataType,

    #[serde(default = "default_fps")]
    pub frames_per_second: u32,

    #[serde(default)]
    pub loop_behavior: LoopBehavior,

    #[serde(default)]
    pub keys: Vec<KeyFrame>,
}

fn default_fps() -> u32 {
    30
}

impl AnimationBundle {
    pub fn populate(&self, catalog: &Catalog) -> BundleResult<TypedObject> {
        let expected = self.data_type.components();
        let mut keys = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            if key.values.len() != expected {
                return Err(BundleError::KeyLength {
                    animation: self.name.clone(),
                    frame: key.frame,
                    expected,
                    found: key.values.len(),
                });
            }
            let mut object = catalog.instantiate("animationKey")?;
            object.set("frame", key.frame)?;
            object.set("values", key.values.as_slice())?;
            keys.push(Value::from(object));
        }

        let mut animation = catalog.instantiate("animation")?;
        animation.set("name", self.name.as_str())?;
        animation.set("property", self.property.as_str())?;
        animation.set("dataType", self.data_type.code())?;
        animation.set("framePerSecond", self.frames_per_second)?;
        animation.set("loopBehavior", self.loop_behavior.code())?;
        animation.set("keys", keys)?;
        Ok(animation)
    }
}

/// Objects are identified by their source name.
fn set_identity(object: &mut TypedObject, name: &str) -> ObjectResult<()> {
    object.set("name", name)?;
    object.set("id", name)
}

fn set_animations(
    object: &mut TypedObject,
    animations: &[AnimationBundle],
    catalog: &Catalog,
) -> BundleResult<()> {
    if animations.is_empty() {
        return Ok(());
    }

    let mut values = Vec::with_capacity(animations.len());
    for animation in animations {
        values.push(Value::from(animation.populate(catalog)?));
    }
    object.set("animations", values)?;

    // Play the full sampled range on load.
    let last_frame = animations
        .iter()
        .flat_map(|a| a.keys.iter().map(|k| k.frame))
        .fold(0.0f32, f32::max);
    object.set("autoAnimate", true)?;
    object.set("autoAnimateTo", last_frame)?;
    object.set("autoAnimateLoop", true)?;
    Ok(())
}

fn retract_empty(object: &mut TypedObject, keys: &[&str]) -> ObjectResult<()> {
    for key in keys {
        if object.contains(key) && object.get(key)?.is_empty_sequence() {
            object.retract(key)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_parse_scene_bundle() {
        let bundle = SceneBundle::from_json_str(
            r#"{ "objects": [
                { "type": "camera", "name": "cam1", "transform": { "translation": [0, 2, 10] } },
                { "type": "light", "name": "sun", "light_type": "directional", "intensity": 0.7 },
                { "type": "mesh", "name": "tri", "positions": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,2] },
                { "type": "shadow", "light_id": "sun", "render_list": ["tri"] }
            ] }"#,
        )
        .unwrap();

        assert_eq!(bundle.objects.len(), 4);
        assert!(matches!(&bundle.objects[1], SourceObject::Light(l) if l.light_type == LightType::Directional));
        assert_eq!(bundle.objects[3].name(), "sun");
    }

    #[test]
    fn test_camera_fov_and_target() {
        let camera = CameraBundle {
            name: "cam".to_string(),
            transform: Transform::from_translation(Vec3::new(0.0, 0.0, 10.0)),
            target: None,
            aperture: 36.0,
            focal: 18.0,
            min_z: Some(0.5),
            max_z: None,
            animations: Vec::new(),
        };

        let object = camera.populate(&catalog()).unwrap();

        let fov = object.get_number("fov").unwrap();
        assert!((fov - std::f64::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(object.get_text("name").unwrap(), "cam");
        assert_eq!(object.get_text("id").unwrap(), "cam");
        assert_eq!(object.get_number("minZ").unwrap(), 0.5);
        assert_eq!(object.get("target").unwrap(), &Value::from(Vec3::new(0.0, 0.0, 9.0)));
    }

    #[test]
    fn test_camera_rejects_zero_focal() {
        let mut camera: CameraBundle = serde_json::from_str(r#"{"name": "cam"}"#).unwrap();
        camera.focal = 0.0;

        assert!(matches!(
            camera.populate(&catalog()),
            Err(BundleError::InvalidParameter { parameter: "focal length", .. })
        ));
    }

    #[test]
    fn test_light_type_codes() {
        let light: LightBundle =
            serde_json::from_str(r#"{"name": "spot", "light_type": "spot", "angle": 0.5}"#).unwrap();
        let object = light.populate(&catalog()).unwrap();

        assert_eq!(object.get_number("type").unwrap(), f64::from(constants::LIGHT_TYPE_SPOT));
        assert_eq!(object.get_number("angle").unwrap(), 0.5);
        assert_eq!(object.get("direction").unwrap(), &Value::from(Vec3::NEG_Y));
    }

    #[test]
    fn test_mesh_with_two_materials() {
        let mesh: MeshBundle = serde_json::from_str(
            r#"{
                "name": "quad",
                "positions": [0,0,0, 1,0,0, 1,1,0, 0,1,0],
                "indices": [0,1,2, 0,2,3],
                "face_materials": [0, 1],
                "material_id": "quadMulti"
            }"#,
        )
        .unwrap();

        let objects = mesh.populate(&catalog()).unwrap();
        assert_eq!(objects.len(), 1);
        let object = &objects[0];

        assert_eq!(object.get_text("materialId").unwrap(), "quadMulti");
        let submeshes = object.get("subMeshes").unwrap().as_sequence().unwrap();
        assert_eq!(submeshes.len(), 2);
        let second = submeshes[1].as_object().unwrap();
        assert_eq!(second.get_number("indexStart").unwrap(), 3.0);
        assert_eq!(second.get_number("materialIndex").unwrap(), 1.0);
        assert_eq!(second.get_number("verticesCount").unwrap(), 4.0);

        // Arrays that were not provided are dropped from the document.
        assert!(!object.contains("uvs"));
        assert!(!object.contains("colors"));
        assert_eq!(object.get("boundingBoxMaximum").unwrap(), &Value::from(Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_face_material_count_mismatch() {
        let mesh: MeshBundle = serde_json::from_str(
            r#"{"name": "tri", "positions": [0,0,0, 1,0,0, 0,1,0], "indices": [0,1,2], "face_materials": [0, 1]}"#,
        )
        .unwrap();

        assert!(matches!(
            mesh.populate(&catalog()),
            Err(BundleError::FaceMaterialCount { faces: 2, triangles: 1, .. })
        ));
    }

    #[test]
    fn test_mesh_as_bounding_box() {
        let mesh: MeshBundle = serde_json::from_str(
            r#"{"name": "rock", "positions": [0,0,0, 2,1,0, 0,3,1], "indices": [0,1,2], "as_bounding_box": true}"#,
        )
        .unwrap();

        let objects = mesh.populate(&catalog()).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind(), "box");
        assert_eq!(objects[0].get_number("size").unwrap(), 3.0);
        assert_eq!(objects[1].get_text("geometryId").unwrap(), "rock");
        assert!(!objects[1].contains("positions"));
    }

    #[test]
    fn test_material_without_texture() {
        let material: MaterialBundle = serde_json::from_str(r#"{"name": "clay"}"#).unwrap();
        let object = material.populate(&catalog()).unwrap();

        assert!(!object.contains("diffuseTexture"));
        assert_eq!(object.get_number("specularPower").unwrap(), 64.0);
        assert_eq!(object.get("backFaceCulling").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_material_with_texture() {
        let material: MaterialBundle = serde_json::from_str(
            r#"{"name": "brick", "diffuse_texture": {"name": "brick.png", "u_scale": 4}}"#,
        )
        .unwrap();
        let object = material.populate(&catalog()).unwrap();

        let texture = object.get("diffuseTexture").unwrap().as_object().unwrap();
        assert_eq!(texture.kind(), "texture");
        assert_eq!(texture.get_text("name").unwrap(), "brick.png");
        assert_eq!(texture.get_number("uScale").unwrap(), 4.0);
    }

    #[test]
    fn test_animation_keys() {
        let light: LightBundle = serde_json::from_str(
            r#"{
                "name": "lamp",
                "animations": [{
                    "name": "dim",
                    "property": "intensity",
                    "keys": [{"frame": 0, "values": [1.0]}, {"frame": 48, "values": [0.2]}]
                }]
            }"#,
        )
        .unwrap();

        let object = light.populate(&catalog()).unwrap();
        let json = object.to_json().unwrap();

        assert_eq!(json["animations"][0]["loopBehavior"], constants::ANIMATION_LOOP_CYCLE);
        assert_eq!(json["animations"][0]["keys"][1]["frame"], 48);
        assert_eq!(json["autoAnimateTo"], 48);
        assert_eq!(json["autoAnimate"], true);
    }

    #[test]
    fn test_animation_key_length_checked() {
        let animation: AnimationBundle = serde_json::from_str(
            r#"{"name": "move", "property": "position", "data_type": "vector3",
                "keys": [{"frame": 0, "values": [1.0, 2.0]}]}"#,
        )
        .unwrap();

        assert!(matches!(
            animation.populate(&catalog()),
            Err(BundleError::KeyLength { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_shadow_map_size() {
        let shadow: ShadowBundle =
            serde_json::from_str(r#"{"light_id": "sun", "map_size": 1000}"#).unwrap();
        assert!(shadow.populate(&catalog()).is_err());

        let shadow: ShadowBundle =
            serde_json::from_str(r#"{"light_id": "sun", "render_list": ["a", "b"]}"#).unwrap();
        let object = shadow.populate(&catalog()).unwrap();
        assert_eq!(object.get("renderList").unwrap().as_sequence().unwrap().len(), 2);
    }
}
