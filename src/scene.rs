use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::spline::{NurbSpline, Order};

/// Runtime representation of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: Vec<PointLight>,
}

impl Scene {
    /// Parses the scene XML produced by the authoring tools.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let mut objects = Vec::new();

        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let mut object = SceneObject::default();
            object.name = required_text(&node, "name")?;
            object.object_type = optional_text(&node, "type").unwrap_or_else(|| "mesh".to_string());
            object.mesh = optional_text(&node, "mesh");
            object.color = parse_color(optional_text(&node, "color"), object.color)?;
            object.position = parse_vec3(optional_text(&node, "position"), object.position)?;
            object.rotation = parse_vec3(optional_text(&node, "rotation"), object.rotation)?;
            object.scale = parse_vec3(optional_text(&node, "scale"), object.scale)?;
            object.shininess = parse_f32(optional_text(&node, "shininess"), object.shininess)?;
            object.radius = parse_f32(optional_text(&node, "radius"), object.radius)?;
            object.texture = optional_text(&node, "texture");
            object.normal_map = optional_text(&node, "normal-map");
            object.spin = parse_vec3(optional_text(&node, "spin"), object.spin)?;
            object.path = parse_points(optional_text(&node, "path"))?;
            object.path_speed = parse_f32(optional_text(&node, "path-speed"), object.path_speed)?;
            objects.push(object);
        }

        let lights = objects
            .iter()
            .filter(|obj| obj.object_type == "light")
            .map(|obj| PointLight {
                position: obj.position,
                color: obj.color,
                radius: obj.radius,
            })
            .collect();

        Ok(Self { objects, lights })
    }
}

/// Scene object as described by the authoring tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees, applied Z then Y then X.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// Specular exponent of the object's material.
    #[serde(default = "default_shininess")]
    pub shininess: f32,
    /// Falloff radius when the object is a light.
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<String>,
    /// Rotation applied per animation step, degrees per axis.
    #[serde(default)]
    pub spin: Vec3,
    /// Control points of an optional motion path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Vec3>,
    /// Path parameter advance per animation step.
    #[serde(default = "default_path_speed")]
    pub path_speed: f32,
    /// Current path parameter; runtime state, not scene data.
    #[serde(skip)]
    pub path_u: f32,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_type: String::new(),
            mesh: None,
            color: default_color(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: default_scale(),
            shininess: default_shininess(),
            radius: default_radius(),
            texture: None,
            normal_map: None,
            spin: Vec3::ZERO,
            path: Vec::new(),
            path_speed: default_path_speed(),
            path_u: 0.0,
        }
    }
}

impl SceneObject {
    /// Object-to-world matrix from position, euler rotation and scale.
    pub fn model_matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        let rotation = Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_x(self.rotation.x.to_radians());
        let scale = Mat4::from_scale(self.scale);
        translation * rotation * scale
    }

    /// Advances the object's animation by one step: spin accumulates into the
    /// rotation, and path objects move along their spline.
    pub fn advance(&mut self) {
        if self.spin != Vec3::ZERO {
            self.rotation += self.spin;
        }
        let Some(order) = Order::for_points(self.path.len()) else {
            return;
        };
        let spline = NurbSpline::new(order, self.path.clone());
        let limit = spline.eval_limit();
        let u = self.path_u.min(limit * (1.0 - 1e-4));
        self.position = spline.evaluate_at(u);
        self.path_u = (self.path_u + self.path_speed).rem_euclid(limit);
    }
}

/// Point light extracted from the scene object list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    /// Distance beyond which the light contributes nothing.
    pub radius: f32,
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_shininess() -> f32 {
    50.0
}

fn default_radius() -> f32 {
    15.0
}

fn default_path_speed() -> f32 {
    0.05
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let z = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let r = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    let g = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    let b = numbers
        .next()
        .ok_or_else(|| anyhow!("color is missing components"))?;
    Ok(Vec3::new(r / 255.0, g / 255.0, b / 255.0))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

/// Parses a comma-separated list of 3D points, e.g. `1 0 0, 0 1 0`.
fn parse_points(value: Option<String>) -> Result<Vec<Vec3>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| parse_vec3(Some(chunk.to_string()), Vec3::ZERO))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <object>
            <name>Camera</name>
            <type>camera</type>
            <position>0 0 5</position>
        </object>
        <object>
            <name>Lamp</name>
            <type>light</type>
            <radius>30</radius>
            <position>0 5 0</position>
            <color>255 128 0</color>
        </object>
        <object>
            <name>Crate</name>
            <mesh>models/crate.obj</mesh>
            <texture>textures/crate.png</texture>
            <normal-map>textures/crate_norm.png</normal-map>
            <shininess>5</shininess>
            <spin>0 -0.5 0</spin>
        </object>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_objects_and_lights() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.objects.len(), 3);
        let camera = scene.objects.iter().find(|o| o.name == "Camera").unwrap();
        assert_eq!(camera.object_type, "camera");
        assert_eq!(scene.lights.len(), 1);
        let light = scene.lights[0];
        assert_eq!(light.position, Vec3::new(0.0, 5.0, 0.0));
        assert!((light.radius - 30.0).abs() < f32::EPSILON);
        assert_eq!(light.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
    }

    #[test]
    fn mesh_objects_carry_material_settings() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let crate_obj = scene.objects.iter().find(|o| o.name == "Crate").unwrap();
        assert_eq!(crate_obj.object_type, "mesh");
        assert_eq!(crate_obj.mesh.as_deref(), Some("models/crate.obj"));
        assert_eq!(crate_obj.texture.as_deref(), Some("textures/crate.png"));
        assert_eq!(
            crate_obj.normal_map.as_deref(),
            Some("textures/crate_norm.png")
        );
        assert!((crate_obj.shininess - 5.0).abs() < f32::EPSILON);
        assert_eq!(crate_obj.spin, Vec3::new(0.0, -0.5, 0.0));
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><type>mesh</type></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn model_matrix_applies_translation_last() {
        let object = SceneObject {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            ..SceneObject::default()
        };
        let m = object.model_matrix();
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn spin_accumulates_per_step() {
        let mut object = SceneObject {
            spin: Vec3::new(0.0, -0.5, 0.0),
            ..SceneObject::default()
        };
        object.advance();
        object.advance();
        assert!((object.rotation.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn path_objects_follow_control_points() {
        let mut object = SceneObject {
            path: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)],
            path_speed: 0.5,
            ..SceneObject::default()
        };
        object.advance();
        assert!((object.position - Vec3::ZERO).length() < 1e-5);
        object.advance();
        assert!((object.position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn path_parses_comma_separated_points() {
        let xml = r#"<scene><object><name>Mover</name>
            <path>1 0 0, 0 1 0, -1 0 0</path></object></scene>"#;
        let scene = Scene::from_xml(xml).unwrap();
        assert_eq!(scene.objects[0].path.len(), 3);
        assert_eq!(scene.objects[0].path[2], Vec3::new(-1.0, 0.0, 0.0));
    }
}
