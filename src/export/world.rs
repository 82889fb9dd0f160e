//! World lowering into an environment light.

use crate::{
    diagnostics::Level,
    dsl::WorldDSL,
    graph::{NodeKind, OutputTarget, ShaderGraph, SlotInput},
    utils::{Mat4, fmt_flat_array, fmt_flat_matrix},
};

use super::{
    context::ExportContext,
    ir::IrNode,
    material::{emission_scale, prepare_graph},
    node_compiler::{export_texture, export_transform},
};

/// Turns the host's Z-up world into the renderer's Y-up environment frame.
pub const ENVIRONMENT_MAP_TRANSFORM: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn envmap(ctx: &mut ExportContext, graph: &ShaderGraph, color: SlotInput<'_>, exposure: Option<f64>) -> IrNode {
    let mut light = IrNode::new("light").with("type", "envmap");
    light.add_child(export_texture(ctx, graph, color, exposure));

    let mut transform = IrNode::new("transform");
    transform.add_children(export_transform(ctx, graph, color));
    transform.add_child(IrNode::new("matrix").with("value", fmt_flat_matrix(&ENVIRONMENT_MAP_TRANSFORM)));
    light.add_child(transform);
    light
}

fn export_world_surface(ctx: &mut ExportContext, graph: &ShaderGraph, surface: SlotInput<'_>) -> Vec<IrNode> {
    let Some(link) = surface.link else {
        return Vec::new();
    };
    let Some(node) = graph.linked_node(link) else {
        ctx.diag
            .error(format!("World {} has no valid node", graph.name()));
        return Vec::new();
    };

    match node.kind {
        NodeKind::Emission | NodeKind::Background => {
            let color = node.input("Color");
            match emission_scale(ctx, color, node.input("Strength")) {
                Some(scale) => vec![envmap(ctx, graph, color, Some(scale))],
                None => Vec::new(),
            }
        }
        _ => vec![envmap(ctx, graph, surface, None)],
    }
}

/// Lowers the world background. A world without a node tree becomes a constant
/// environment light when its color is not black.
pub fn export_world(ctx: &mut ExportContext, world: &WorldDSL) -> Vec<IrNode> {
    let Some(tree_id) = world.node_tree.as_deref() else {
        if world.color.iter().any(|c| *c > 0.0) {
            let mut light = IrNode::new("light").with("type", "envmap");
            light.add_child(
                IrNode::new("texture")
                    .with("type", "constant")
                    .with("value", fmt_flat_array(&world.color)),
            );
            return vec![light];
        }
        return Vec::new();
    };

    let graph = match prepare_graph(ctx, &world.name, tree_id) {
        Ok(graph) => graph,
        Err(err) => {
            ctx.diag.report(Level::Error, err);
            return Vec::new();
        }
    };

    let output = graph.iter().map(|(_, n)| n).find(|n| {
        matches!(
            n.kind,
            NodeKind::Output {
                target: OutputTarget::World,
                active: true,
            }
        )
    });
    match output {
        Some(output) => export_world_surface(ctx, &graph, output.input("Surface")),
        None => Vec::new(),
    }
}
