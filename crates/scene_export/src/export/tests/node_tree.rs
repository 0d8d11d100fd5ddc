//! Node-tree traversal: link resolution, literals, hooks and cycles

use super::*;
use crate::export::ExportError;
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::scene::OutputSocket;

const OWNER: TrackId = TrackId::new(0x1);

fn single(node: Node) -> NodeTree {
    let mut tree = NodeTree::new("Test");
    let key = tree.add_node(node).unwrap();
    let out = tree.add_node(Node::output("Out", "Out")).unwrap();
    tree.link(key, "Output", out, "Out").unwrap();
    tree.set_output(out).unwrap();
    tree
}

#[test]
fn test_material_tree_exports_post_order() {
    let scene = Scene::new();
    let tree = diffuse_material(color(0.8, 0.1, 0.1));
    let mut harness = Harness::new();

    let root = harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(root, AttrPlugin::new("NT1@Material"));
    assert_eq!(harness.renderer.updated(), vec!["NT1@Diffuse", "NT1@Material"]);
    assert_eq!(harness.attribute("NT1@Material", "brdf"), Some(&plugin("NT1@Diffuse")));
    assert_eq!(harness.attribute("NT1@Diffuse", "color"), Some(&color(0.8, 0.1, 0.1)));
    assert_eq!(
        harness.state.objects.owned_plugins(OWNER),
        vec!["NT1@Diffuse", "NT1@Material"]
    );
}

#[test]
fn test_export_is_deterministic() {
    let scene = Scene::new();
    let tree = bitmap_material("wood.png");

    let mut first = Harness::new();
    let mut second = Harness::new();
    first.export(&scene, OWNER, &tree).unwrap();
    second.export(&scene, OWNER, &tree).unwrap();
    // a second pass on the same state is identical too
    second.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(first.renderer.plugin_names(), second.renderer.plugin_names());
    for name in first.renderer.plugin_names() {
        assert_eq!(first.renderer.plugin(name), second.renderer.plugin(name), "{name}");
    }
}

#[test]
fn test_literal_values_round_trip() {
    let scene = Scene::new();
    let transform = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
    let mut tree = NodeTree::new("Literals");
    let uvw = tree
        .add_node(
            Node::plugin("Mapping", "UVWGenChannel")
                .with_input(InputSocket::new("Channel", "uvw_channel").with_value(3_i64))
                .with_input(InputSocket::new("Transform", "uvw_transform").with_value(transform)),
        )
        .unwrap();
    let checker = tree
        .add_node(
            Node::plugin("Checker", "TexChecker")
                .with_input(InputSocket::new("White", "white_color").with_value(AttrValue::AColor(Vec4::new(0.9, 0.8, 0.7, 0.5))))
                .with_input(InputSocket::new("Mapping", "uvwgen")),
        )
        .unwrap();
    let brdf = tree
        .add_node(
            Node::plugin("Diffuse", "BRDFDiffuse")
                .with_input(InputSocket::new("Color", "color").with_value(color(0.1, 0.2, 0.3)))
                .with_input(InputSocket::new("Roughness", "roughness").with_value(0.25_f32))
                .with_input(InputSocket::new("Color Texture", "color_tex").with_value(AttrPlugin::empty()))
                .with_input(InputSocket::new("Transparency", "transparency").with_value(color(0.0, 0.0, 0.0))),
        )
        .unwrap();
    let out = tree.add_node(Node::output("Out", "BRDF")).unwrap();
    tree.link(uvw, "Output", checker, "Mapping").unwrap();
    tree.link(checker, "Output", brdf, "Transparency").unwrap();
    tree.link(brdf, "Output", out, "BRDF").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(harness.attribute("NT1@Mapping", "uvw_channel"), Some(&AttrValue::Int(3)));
    assert_eq!(harness.attribute("NT1@Mapping", "uvw_transform"), Some(&AttrValue::Matrix(transform)));
    assert_eq!(
        harness.attribute("NT1@Checker", "white_color"),
        Some(&AttrValue::AColor(Vec4::new(0.9, 0.8, 0.7, 0.5)))
    );
    assert_eq!(harness.attribute("NT1@Diffuse", "color"), Some(&color(0.1, 0.2, 0.3)));
    assert_eq!(harness.attribute("NT1@Diffuse", "roughness"), Some(&AttrValue::Float(0.25)));
    assert_eq!(
        harness.attribute("NT1@Diffuse", "color_tex"),
        Some(&AttrValue::Plugin(AttrPlugin::empty()))
    );
    // linked socket wins over its literal
    assert_eq!(harness.attribute("NT1@Diffuse", "transparency"), Some(&plugin("NT1@Checker")));
    // linked uvwgen is kept, no default generator is created
    assert_eq!(harness.attribute("NT1@Checker", "uvwgen"), Some(&plugin("NT1@Mapping")));
    assert!(!harness.renderer.contains("DefaultUVWGenChannel"));
}

#[test]
fn test_unlinked_socket_without_literal_gets_schema_default() {
    let scene = Scene::new();
    let tree = single(
        Node::plugin("Diffuse", "BRDFDiffuse").with_input(InputSocket::new("Roughness", "roughness")),
    );
    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();
    assert_eq!(harness.attribute("NT1@Diffuse", "roughness"), Some(&AttrValue::Float(0.0)));
}

#[test]
fn test_cycle_is_rejected() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Loop");
    let a = tree
        .add_node(Node::plugin("A", "TexChecker").with_input(InputSocket::new("White", "white_color")))
        .unwrap();
    let b = tree
        .add_node(Node::plugin("B", "TexChecker").with_input(InputSocket::new("White", "white_color")))
        .unwrap();
    let out = tree.add_node(Node::output("Out", "Texture")).unwrap();
    tree.link(a, "Output", b, "White").unwrap();
    tree.link(b, "Output", a, "White").unwrap();
    tree.link(a, "Output", out, "Texture").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    let err = harness.export(&scene, OWNER, &tree).unwrap_err();

    assert_eq!(
        err,
        ExportError::SceneGraphCycle {
            owner: OWNER,
            chain: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        }
    );
    assert!(err.is_tree_local());
    assert!(harness.renderer.is_empty());
}

#[test]
fn test_shared_upstream_node_is_exported_once() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Shared");
    let checker = tree.add_node(Node::plugin("Checker", "TexChecker")).unwrap();
    let brdf = tree
        .add_node(
            Node::plugin("Diffuse", "BRDFDiffuse")
                .with_input(InputSocket::new("Color Texture", "color_tex"))
                .with_input(InputSocket::new("Transparency", "transparency")),
        )
        .unwrap();
    let out = tree.add_node(Node::output("Out", "BRDF")).unwrap();
    tree.link(checker, "Output", brdf, "Color Texture").unwrap();
    tree.link(checker, "Output", brdf, "Transparency").unwrap();
    tree.link(brdf, "Output", out, "BRDF").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    let checker_sends = harness.renderer.updated().iter().filter(|n| **n == "NT1@Checker").count();
    assert_eq!(checker_sends, 1);
    assert_eq!(harness.attribute("NT1@Checker", "uvwgen"), Some(&plugin("DefaultUVWGenChannel")));
}

#[test]
fn test_reroute_resolves_to_upstream_plugin() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Reroute");
    let checker = tree.add_node(Node::plugin("Checker", "TexChecker")).unwrap();
    let reroute = tree.add_node(Node::reroute("Reroute")).unwrap();
    let brdf = tree
        .add_node(Node::plugin("Diffuse", "BRDFDiffuse").with_input(InputSocket::new("Color Texture", "color_tex")))
        .unwrap();
    let out = tree.add_node(Node::output("Out", "BRDF")).unwrap();
    tree.link(checker, "Output", reroute, "Input").unwrap();
    tree.link(reroute, "Output", brdf, "Color Texture").unwrap();
    tree.link(brdf, "Output", out, "BRDF").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(harness.attribute("NT1@Diffuse", "color_tex"), Some(&plugin("NT1@Checker")));
    assert!(!harness.renderer.contains("NT1@Reroute"));
}

#[test]
fn test_named_output_is_referenced() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Outputs");
    let checker = tree
        .add_node(Node::plugin("Checker", "TexChecker").with_output(OutputSocket::with_attr("Alpha", "out_alpha")))
        .unwrap();
    let brdf = tree
        .add_node(Node::plugin("Diffuse", "BRDFDiffuse").with_input(InputSocket::new("Color Texture", "color_tex")))
        .unwrap();
    let out = tree.add_node(Node::output("Out", "BRDF")).unwrap();
    tree.link(checker, "Alpha", brdf, "Color Texture").unwrap();
    tree.link(brdf, "Output", out, "BRDF").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(
        harness.attribute("NT1@Diffuse", "color_tex"),
        Some(&AttrValue::Plugin(AttrPlugin::new("NT1@Checker").with_output("out_alpha")))
    );
}

#[test]
fn test_multi_input_socket_becomes_list() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Multi");
    let first = tree.add_node(Node::plugin("First", "TexChecker")).unwrap();
    let second = tree.add_node(Node::plugin("Second", "TexChecker")).unwrap();
    let layered = tree
        .add_node(
            Node::plugin("Layers", "TexLayered")
                .with_input(InputSocket::new("Blend", "blend_modes").multi()),
        )
        .unwrap();
    let out = tree.add_node(Node::output("Out", "Texture")).unwrap();
    tree.link(first, "Output", layered, "Blend").unwrap();
    tree.link(second, "Output", layered, "Blend").unwrap();
    tree.link(layered, "Output", out, "Texture").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(
        harness.attribute("NT1@Layers", "blend_modes"),
        Some(&AttrValue::List(vec![plugin("NT1@First"), plugin("NT1@Second")]))
    );
}

#[test]
fn test_layered_wraps_unlinked_layers_in_virtual_plugins() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Layered");
    let checker = tree.add_node(Node::plugin("Checker", "TexChecker")).unwrap();
    let layered = tree
        .add_node(
            Node::plugin("Layers", "TexLayered")
                .with_input(InputSocket::new("Layer 1", "textures").with_value(AttrValue::AColor(Vec4::new(1.0, 0.0, 0.0, 1.0))))
                .with_input(InputSocket::new("Layer 2", "textures"))
                .with_input(InputSocket::new("Layer 3", "textures")),
        )
        .unwrap();
    let out = tree.add_node(Node::output("Out", "Texture")).unwrap();
    tree.link(checker, "Output", layered, "Layer 2").unwrap();
    tree.link(layered, "Output", out, "Texture").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(
        harness.attribute("NT1@Layers", "textures"),
        Some(&AttrValue::List(vec![
            plugin("NT1@Layers#TexAColor:0"),
            plugin("NT1@Checker"),
            plugin("NT1@Layers#TexAColor:2"),
        ]))
    );
    assert_eq!(
        harness.attribute("NT1@Layers#TexAColor:0", "texture"),
        Some(&AttrValue::AColor(Vec4::new(1.0, 0.0, 0.0, 1.0)))
    );
    assert_eq!(harness.state.objects.owner_of("NT1@Layers#TexAColor:2"), Some(OWNER));
}

#[test]
fn test_bitmap_synthesizes_buffer_and_default_uvwgen() {
    let scene = Scene::new();
    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &bitmap_material("wood.png")).unwrap();

    assert_eq!(
        harness.attribute("NT1@Bitmap#BitmapBuffer", "file"),
        Some(&AttrValue::String("wood.png".to_string()))
    );
    assert_eq!(harness.attribute("NT1@Bitmap", "bitmap"), Some(&plugin("NT1@Bitmap#BitmapBuffer")));
    assert_eq!(harness.attribute("NT1@Bitmap", "uvwgen"), Some(&plugin("DefaultUVWGenChannel")));
    // defaults belong to the scene, not to the tree
    assert_eq!(harness.state.objects.owner_of("DefaultUVWGenChannel"), Some(TrackId::SCENE));
}

#[test]
fn test_bitmap_without_file_is_hook_failure() {
    let scene = Scene::new();
    let mut harness = Harness::new();
    let err = harness.export(&scene, OWNER, &bitmap_material("")).unwrap_err();
    assert!(matches!(err, ExportError::HookFailure { ref node, .. } if node == "Bitmap"));
}

#[test]
fn test_skipped_type_in_socket_is_ignored() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Skipped");
    let wrapper = tree.add_node(Node::plugin("Wrapper", "TexAColor")).unwrap();
    let brdf = tree
        .add_node(Node::plugin("Diffuse", "BRDFDiffuse").with_input(InputSocket::new("Color Texture", "color_tex")))
        .unwrap();
    let out = tree.add_node(Node::output("Out", "BRDF")).unwrap();
    tree.link(wrapper, "Output", brdf, "Color Texture").unwrap();
    tree.link(brdf, "Output", out, "BRDF").unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert!(harness.renderer.contains("NT1@Diffuse"));
    assert!(harness.attribute("NT1@Diffuse", "color_tex").is_none());
    assert!(!harness.renderer.contains("NT1@Wrapper"));
}

#[test]
fn test_unlinked_output_is_invalid_link() {
    let scene = Scene::new();
    let mut tree = NodeTree::new("Empty");
    let out = tree.add_node(Node::output("Out", "Material")).unwrap();
    tree.set_output(out).unwrap();

    let mut harness = Harness::new();
    let err = harness.export(&scene, OWNER, &tree).unwrap_err();
    assert!(matches!(err, ExportError::InvalidLink { ref socket, .. } if socket == "Material"));
}

#[test]
fn test_vray_material_is_clamped() {
    let scene = Scene::new();
    let tree = single(
        Node::plugin("VRay", "BRDFVRayMtl")
            .with_input(InputSocket::new("Glossiness", "reflect_glossiness").with_value(1.5_f32))
            .with_input(InputSocket::new("Fresnel", "fresnel").with_value(false)),
    );
    let mut harness = Harness::new();
    harness.export(&scene, OWNER, &tree).unwrap();

    assert_eq!(harness.attribute("NT1@VRay", "reflect_glossiness"), Some(&AttrValue::Float(1.0)));
    assert!(harness.attribute("NT1@VRay", "fresnel_ior").is_none());
}

#[test]
fn test_light_takes_transform_from_owner() {
    let mut scene = sample_scene();
    scene.set_frame(2.0);
    let tree = omni_light(5.0);
    let mut harness = Harness::new();
    harness.export(&scene, LAMP, &tree).unwrap();

    let lamp = scene.object(LAMP).unwrap();
    assert_eq!(
        harness.attribute("NT12@Light", "transform"),
        Some(&AttrValue::Matrix(lamp.transform.matrix_at(2.0)))
    );
    assert_eq!(harness.attribute("NT12@Light", "intensity"), Some(&AttrValue::Float(5.0)));
    assert_eq!(harness.attribute("NT12@Light", "enabled"), Some(&AttrValue::Bool(true)));
}

#[test]
fn test_light_without_owner_object_fails() {
    let scene = Scene::new();
    let mut harness = Harness::new();
    let err = harness.export(&scene, OWNER, &omni_light(1.0)).unwrap_err();
    assert!(matches!(err, ExportError::HookFailure { .. }));
}
