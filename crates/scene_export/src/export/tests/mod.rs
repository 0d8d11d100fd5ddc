//! Scenario tests for the export core
//!
//! Shared fixtures live here; each submodule covers one area end to end
//! against a [`RecordingRenderer`].

mod node_tree;

use super::{export_tree, ExportContext, ExportResult, ExportState};
use crate::foundation::math::{Transform, Vec3};
use crate::plugin::{AttrPlugin, AttrValue, HookRegistry, SchemaRegistry};
use crate::renderer::{RecordingRenderer, RendererCall};
use crate::scene::{
    InputSocket, LightData, MaterialEntity, MeshData, Node, NodeTree, ObjectKind, Scene, SceneObject,
    TrackId, TransformTrack,
};

pub const RED: TrackId = TrackId::new(0x1);
pub const WOOD: TrackId = TrackId::new(0x2);
pub const CUBE: TrackId = TrackId::new(0x10);
pub const PANEL: TrackId = TrackId::new(0x11);
pub const LAMP: TrackId = TrackId::new(0x12);
pub const CUBE_DATA: TrackId = TrackId::new(0x20);
pub const PANEL_DATA: TrackId = TrackId::new(0x21);

/// Registries, state and renderer for exporting single trees
pub struct Harness {
    pub schemas: SchemaRegistry,
    pub hooks: HookRegistry,
    pub state: ExportState,
    pub renderer: RecordingRenderer,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            schemas: SchemaRegistry::with_builtin(),
            hooks: HookRegistry::with_builtin(),
            state: ExportState::new(true),
            renderer: RecordingRenderer::new(),
        }
    }

    /// Export one tree in a fresh pass
    pub fn export(&mut self, scene: &Scene, owner: TrackId, tree: &NodeTree) -> ExportResult<AttrPlugin> {
        self.state.begin_pass(scene.frame());
        let mut ctx = ExportContext::new(&self.schemas, &self.hooks, scene, &mut self.state, &mut self.renderer);
        export_tree(&mut ctx, owner, tree)
    }

    pub fn attribute(&self, plugin: &str, attr: &str) -> Option<&AttrValue> {
        self.renderer.plugin(plugin).and_then(|p| p.attribute(attr))
    }
}

pub fn color(r: f32, g: f32, b: f32) -> AttrValue {
    AttrValue::Color(Vec3::new(r, g, b))
}

pub fn plugin(name: &str) -> AttrValue {
    AttrValue::Plugin(AttrPlugin::new(name))
}

fn diffuse_node(tint: AttrValue) -> Node {
    Node::plugin("Diffuse", "BRDFDiffuse")
        .with_input(InputSocket::new("Color", "color").with_value(tint))
        .with_input(InputSocket::new("Color Texture", "color_tex"))
}

fn material_node() -> Node {
    Node::plugin("Material", "MtlSingleBRDF").with_input(InputSocket::new("BRDF", "brdf"))
}

/// Diffuse BRDF wrapped in a single-BRDF material
pub fn diffuse_material(tint: AttrValue) -> NodeTree {
    let mut tree = NodeTree::new("Red");
    let brdf = tree.add_node(diffuse_node(tint)).unwrap();
    let mtl = tree.add_node(material_node()).unwrap();
    let out = tree.add_node(Node::output("Material Output", "Material")).unwrap();
    tree.link(brdf, "Output", mtl, "BRDF").unwrap();
    tree.link(mtl, "Output", out, "Material").unwrap();
    tree.set_output(out).unwrap();
    tree
}

/// Bitmap texture feeding a diffuse material
pub fn bitmap_material(file: &str) -> NodeTree {
    let mut tree = NodeTree::new("Wood");
    let mut bitmap = Node::plugin("Bitmap", "TexBitmap").with_input(InputSocket::new("Mapping", "uvwgen"));
    if !file.is_empty() {
        bitmap = bitmap.with_property("file", file);
    }
    let bitmap = tree.add_node(bitmap).unwrap();
    let brdf = tree.add_node(diffuse_node(color(1.0, 1.0, 1.0))).unwrap();
    let mtl = tree.add_node(material_node()).unwrap();
    let out = tree.add_node(Node::output("Material Output", "Material")).unwrap();
    tree.link(bitmap, "Output", brdf, "Color Texture").unwrap();
    tree.link(brdf, "Output", mtl, "BRDF").unwrap();
    tree.link(mtl, "Output", out, "Material").unwrap();
    tree.set_output(out).unwrap();
    tree
}

/// Omni light tree
pub fn omni_light(intensity: f32) -> NodeTree {
    let mut tree = NodeTree::new("Lamp");
    let light = tree
        .add_node(Node::plugin("Light", "LightOmni").with_input(InputSocket::new("Intensity", "intensity").with_value(intensity)))
        .unwrap();
    let out = tree.add_node(Node::output("Light Output", "Light")).unwrap();
    tree.link(light, "Output", out, "Light").unwrap();
    tree.set_output(out).unwrap();
    tree
}

pub fn moving(from: f32, to: f32) -> TransformTrack {
    TransformTrack::default()
        .with_key(1.0, Transform::from_position(Vec3::new(from, 0.0, 0.0)))
        .with_key(3.0, Transform::from_position(Vec3::new(to, 0.0, 0.0)))
}

/// Two materials, a single-slot cube, a two-slot panel and a lamp
pub fn sample_scene() -> Scene {
    let mut scene = Scene::new();
    scene
        .add_material(MaterialEntity::new(RED, "Red", diffuse_material(color(0.8, 0.1, 0.1))))
        .unwrap();
    scene
        .add_material(MaterialEntity::new(WOOD, "Wood", bitmap_material("wood.png")))
        .unwrap();

    let cube = SceneObject::new(
        CUBE,
        "Cube",
        ObjectKind::Mesh(MeshData::new(CUBE_DATA).with_attribute("dynamic_geometry", true)),
    )
    .with_transform(moving(0.0, 2.0))
    .with_material(RED);
    let panel = SceneObject::new(PANEL, "Panel", ObjectKind::Mesh(MeshData::new(PANEL_DATA)))
        .with_material(RED)
        .with_material(WOOD);
    let lamp = SceneObject::new(LAMP, "Lamp", ObjectKind::Light(LightData::new(TrackId::new(0x22), omni_light(5.0))))
        .with_transform(TransformTrack::fixed(Transform::from_position(Vec3::new(0.0, 4.0, 0.0))));

    scene.add_object(cube).unwrap();
    scene.add_object(panel).unwrap();
    scene.add_object(lamp).unwrap();
    scene
}

/// Names upserted right after the renderer time was set to `time`
pub fn updates_at(renderer: &RecordingRenderer, time: f64) -> Vec<&str> {
    renderer
        .calls()
        .iter()
        .skip_while(|call| **call != RendererCall::SetTime(time))
        .skip(1)
        .map_while(|call| match call {
            RendererCall::CreateOrUpdate(name) => Some(name.as_str()),
            _ => None,
        })
        .collect()
}
