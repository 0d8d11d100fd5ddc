//! Scene export demo application
//!
//! Builds a small scene, runs a full export, an incremental update and an
//! animated export against the in-memory renderer, and logs what was sent.
//!
//! Usage: `export_demo [config.toml|config.ron]`

use scene_export::foundation::logging;
use scene_export::foundation::math::{Vec3, Vec4};
use scene_export::prelude::*;
use thiserror::Error;

const RED: TrackId = TrackId::new(0x1);
const CHECKER: TrackId = TrackId::new(0x2);
const CUBE: TrackId = TrackId::new(0x10);
const FLOOR: TrackId = TrackId::new(0x11);
const KEY_LIGHT: TrackId = TrackId::new(0x12);

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] scene_export::core::ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

struct DemoApp {
    scene: Scene,
    session: ExportSession,
    renderer: RecordingRenderer,
}

impl DemoApp {
    fn new(config: ExportConfig) -> Result<Self, DemoError> {
        log::info!("Building demo scene...");
        Ok(Self {
            scene: build_scene()?,
            session: ExportSession::new(config),
            renderer: RecordingRenderer::new(),
        })
    }

    fn run(&mut self) -> Result<(), DemoError> {
        log::info!("Running full export...");
        let report = self.session.export_full(&self.scene, &mut self.renderer)?;
        for failure in &report.failed_trees {
            log::warn!("Tree {} failed: {}", failure.tree, failure.error);
        }
        self.log_plugins();

        log::info!("Moving the cube and recoloring the red material...");
        self.renderer.clear_calls();
        self.scene.set_frame(2.0);
        self.session.tag_update(CUBE, UpdateTarget::Object, UpdateFlags::DATA);
        self.session
            .notify_node_changed(RED, UpdateTarget::Material, "BRDFDiffuse", "color");
        let report = self.session.export_partial(&self.scene, &mut self.renderer)?;
        log::info!("Updated {:?}, deleted {:?}", self.renderer.updated(), report.deleted);

        log::info!("Running animation export...");
        self.renderer.clear_calls();
        let report = self.session.export_animation(&self.scene, &mut self.renderer)?;
        log::info!(
            "Sent {} samples, committed frames {:?}",
            report.samples,
            self.renderer.committed_frames()
        );
        Ok(())
    }

    fn log_plugins(&self) {
        log::info!("Renderer holds {} plugins", self.renderer.len());
        for name in self.renderer.plugin_names() {
            if let Some(plugin) = self.renderer.plugin(name) {
                log::debug!("  {name} [{}] {} attributes", plugin.plugin_type, plugin.attributes.len());
            }
        }
    }
}

fn build_scene() -> Result<Scene, SceneError> {
    let mut scene = Scene::new();

    // Red diffuse material
    let mut red = NodeTree::new("Red");
    let brdf = red.add_node(
        Node::plugin("Diffuse", "BRDFDiffuse")
            .with_input(InputSocket::new("Color", "color").with_value(AttrValue::Color(Vec3::new(0.8, 0.1, 0.1)))),
    )?;
    let mtl = red.add_node(Node::plugin("Material", "MtlSingleBRDF").with_input(InputSocket::new("BRDF", "brdf")))?;
    let out = red.add_node(Node::output("Material Output", "Material"))?;
    red.link(brdf, "Output", mtl, "BRDF")?;
    red.link(mtl, "Output", out, "Material")?;
    red.set_output(out)?;
    scene.add_material(MaterialEntity::new(RED, "Red", red))?;

    // Checkered floor material
    let mut floor = NodeTree::new("Checker");
    let checker = floor.add_node(
        Node::plugin("Checker", "TexChecker")
            .with_input(InputSocket::new("Black", "black_color").with_value(AttrValue::AColor(Vec4::new(0.1, 0.1, 0.1, 1.0)))),
    )?;
    let brdf = floor.add_node(
        Node::plugin("Diffuse", "BRDFDiffuse").with_input(InputSocket::new("Color Texture", "color_tex")),
    )?;
    let mtl = floor.add_node(Node::plugin("Material", "MtlSingleBRDF").with_input(InputSocket::new("BRDF", "brdf")))?;
    let out = floor.add_node(Node::output("Material Output", "Material"))?;
    floor.link(checker, "Output", brdf, "Color Texture")?;
    floor.link(brdf, "Output", mtl, "BRDF")?;
    floor.link(mtl, "Output", out, "Material")?;
    floor.set_output(out)?;
    scene.add_material(MaterialEntity::new(CHECKER, "Checker", floor))?;

    // Key light
    let mut light = NodeTree::new("Key");
    let rect = light.add_node(
        Node::plugin("Light", "LightRectangle")
            .with_input(InputSocket::new("Intensity", "intensity").with_value(30.0_f32))
            .with_input(InputSocket::new("Width", "u_size").with_value(2.0_f32)),
    )?;
    let out = light.add_node(Node::output("Light Output", "Light"))?;
    light.link(rect, "Output", out, "Light")?;
    light.set_output(out)?;

    let cube = SceneObject::new(CUBE, "Cube", ObjectKind::Mesh(MeshData::new(TrackId::new(0x20))))
        .with_transform(
            TransformTrack::default()
                .with_key(1.0, Transform::from_position(Vec3::new(0.0, 0.0, 0.0)))
                .with_key(3.0, Transform::from_position(Vec3::new(4.0, 0.0, 0.0))),
        )
        .with_material(RED)
        .with_mb_samples(4);
    let floor = SceneObject::new(FLOOR, "Floor", ObjectKind::Mesh(MeshData::new(TrackId::new(0x21))))
        .with_material(CHECKER);
    let key = SceneObject::new(KEY_LIGHT, "Key Light", ObjectKind::Light(LightData::new(TrackId::new(0x22), light)))
        .with_transform(TransformTrack::fixed(Transform::from_position(Vec3::new(0.0, 5.0, 2.0))));

    scene.add_object(cube)?;
    scene.add_object(floor)?;
    scene.add_object(key)?;
    scene.set_setting("SettingsOutput", "img_width", 1280_i64);
    scene.set_setting("SettingsOutput", "img_height", 720_i64);
    Ok(scene)
}

fn load_config() -> Result<ExportConfig, DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ExportConfig::load_from_file(&path)?,
        None => ExportConfig::new()
            .with_animation(AnimationSettings::new(1, 3))
            .with_motion_blur(MotionBlurSettings::new(0.5, 0.0, 2)),
    };
    config.validate()?;
    Ok(config)
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    logging::init_with_level(&config.exporter.log_level);
    log::info!("Starting scene export demo");

    let result = DemoApp::new(config).and_then(|mut app| app.run());
    if let Err(e) = result {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
    log::info!("Demo finished");
}
