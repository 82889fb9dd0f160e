//! Per-kind lowering of shading nodes into texture and transform fragments.
//!
//! [`export_texture`] and [`export_transform`] dispatch on the kind of the node
//! feeding a slot. Kinds without a handler report an error and degrade to a
//! fallback; translation never aborts the export.

pub mod input_nodes;
pub mod texture_nodes;
pub mod transform_nodes;

use crate::{
    diagnostics::Level,
    error::ExportError,
    graph::{NodeKind, ShaderGraph, ShaderNode, SlotInput},
};

use super::{
    context::ExportContext,
    ir::IrNode,
    registry::{EntityKey, EntityKind},
};

/// `texture type="constant" value="0"`, emitted wherever translation fails.
pub fn fallback_texture() -> IrNode {
    IrNode::new("texture").with("type", "constant").with("value", 0)
}

/// Registry key of a graph node. Copies spliced in from a group share the key
/// of their template node.
pub fn node_key(node: &ShaderNode) -> EntityKey {
    EntityKey::new(node.source.clone(), EntityKind::ShaderNode)
}

fn report_unsupported(ctx: &mut ExportContext, graph: &ShaderGraph, node: &ShaderNode) {
    ctx.diag.report(
        Level::Error,
        ExportError::UnsupportedNodeKind {
            graph: graph.name().to_string(),
            node: node.name.clone(),
            kind: node.kind.type_name().to_string(),
        },
    );
}

/// Lowers whatever feeds `input` into one texture element.
///
/// Unlinked slots become constants scaled by `exposure`. Linked texture, value,
/// RGB and normal-map nodes are translated once per node through the registry.
pub fn export_texture(
    ctx: &mut ExportContext,
    graph: &ShaderGraph,
    input: SlotInput<'_>,
    exposure: Option<f64>,
) -> IrNode {
    let Some(link) = input.link else {
        return input_nodes::export_literal(ctx, input.value, exposure);
    };
    let Some(node) = graph.linked_node(link) else {
        ctx.diag
            .error(format!("graph '{}' links to a node that no longer exists", graph.name()));
        return fallback_texture();
    };
    if !ctx.enter(graph.name(), link.node, &node.name) {
        return fallback_texture();
    }

    let texture = match &node.kind {
        NodeKind::TexImage { .. } | NodeKind::TexEnvironment { .. } => {
            ctx.export_entity(node_key(node), &node.name, |ctx| {
                texture_nodes::export_image_texture(ctx, node, exposure)
            })
        }
        NodeKind::Value => ctx.export_entity(node_key(node), &node.name, |ctx| {
            input_nodes::export_value_node(ctx, node, exposure)
        }),
        NodeKind::Rgb => ctx.export_entity(node_key(node), &node.name, |ctx| {
            input_nodes::export_rgb_node(ctx, node, exposure)
        }),
        // Strength is not applied.
        NodeKind::NormalMap => ctx.export_entity(node_key(node), &node.name, |ctx| {
            export_texture(ctx, graph, node.input("Color"), exposure)
        }),
        _ => {
            report_unsupported(ctx, graph, node);
            fallback_texture()
        }
    };

    ctx.leave(link.node);
    texture
}

/// Lowers the coordinate chain feeding `input` into scale/rotate/translate
/// elements, upstream transforms first.
pub fn export_transform(ctx: &mut ExportContext, graph: &ShaderGraph, input: SlotInput<'_>) -> Vec<IrNode> {
    let Some(link) = input.link else {
        return Vec::new();
    };
    let Some(node) = graph.linked_node(link) else {
        return Vec::new();
    };
    if !ctx.enter(graph.name(), link.node, &node.name) {
        return Vec::new();
    }

    let transforms = match &node.kind {
        NodeKind::TexCoord => Vec::new(),
        NodeKind::Mapping { vector_type } => {
            transform_nodes::export_mapping(ctx, graph, node, vector_type)
        }
        NodeKind::VectorRotate {
            rotation_type,
            invert,
        } => transform_nodes::export_vector_rotate(ctx, graph, node, rotation_type, *invert),
        NodeKind::TexImage { .. } | NodeKind::TexEnvironment { .. } => {
            export_transform(ctx, graph, node.input("Vector"))
        }
        _ => {
            report_unsupported(ctx, graph, node);
            Vec::new()
        }
    };

    ctx.leave(link.node);
    transforms
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;
    use crate::graph::{Literal, ShaderNode};

    #[test]
    fn unknown_kind_degrades_to_fallback() {
        let scene = test_scene(vec![]);
        let mut ctx = ExportContext::new(&scene, &NullImageStore, &NullMeshStore);
        let mut g = ShaderGraph::new("Mat");
        let noise = g.add_node(
            ShaderNode::new("Noise", NodeKind::Other("TexNoise".into())).with_output("Color", "RGBA", None),
        );
        let diffuse = g.add_node(
            ShaderNode::new("Diffuse", NodeKind::BsdfDiffuse).with_input("Color", "RGBA", None),
        );
        g.connect(noise, "Color", diffuse, "Color");

        let tex = export_texture(&mut ctx, &g, g.node(diffuse).unwrap().input("Color"), None);
        assert_eq!(tex.dump(0), fallback_texture().dump(0));
        assert!(ctx.diag.any_error(|e| matches!(
            e,
            ExportError::UnsupportedNodeKind { kind, .. } if kind == "TexNoise"
        )));
    }

    #[test]
    fn shared_node_is_translated_once() {
        let scene = test_scene(vec![]);
        let mut ctx = ExportContext::new(&scene, &NullImageStore, &NullMeshStore);
        let mut g = ShaderGraph::new("Mat");
        let value = g.add_node(
            ShaderNode::new("Value", NodeKind::Value).with_output("Value", "VALUE", Some(Literal::Scalar(0.5))),
        );
        let principled = g.add_node(
            ShaderNode::new("Principled", NodeKind::BsdfPrincipled)
                .with_input("Roughness", "VALUE", None)
                .with_input("Metallic", "VALUE", None),
        );
        g.connect(value, "Value", principled, "Roughness");
        g.connect(value, "Value", principled, "Metallic");

        let node = g.node(principled).unwrap();
        let first = export_texture(&mut ctx, &g, node.input("Roughness"), None);
        let second = export_texture(&mut ctx, &g, node.input("Metallic"), None);
        assert_eq!(first.tag, "texture");
        assert_eq!(second.dump(0), r#"<ref id="Value"/>"#);
    }

    #[test]
    fn cycles_are_reported_not_followed() {
        let scene = test_scene(vec![]);
        let mut ctx = ExportContext::new(&scene, &NullImageStore, &NullMeshStore);
        let mut g = ShaderGraph::new("Mat");
        let a = g.add_node(
            ShaderNode::new("A", NodeKind::NormalMap)
                .with_input("Color", "RGBA", None)
                .with_output("Normal", "VECTOR", None),
        );
        let b = g.add_node(
            ShaderNode::new("B", NodeKind::NormalMap)
                .with_input("Color", "RGBA", None)
                .with_output("Normal", "VECTOR", None),
        );
        g.connect(a, "Normal", b, "Color");
        g.connect(b, "Normal", a, "Color");

        let tex = export_texture(&mut ctx, &g, g.node(a).unwrap().input("Color"), None);
        assert_eq!(tex.dump(0), r#"<texture type="constant" value="0"/>"#);
        assert!(ctx.diag.any_error(|e| matches!(e, ExportError::CyclicGraph { .. })));
    }
}
