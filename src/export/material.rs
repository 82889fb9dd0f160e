//! Material lowering: from a material's active output to bsdf/emission elements.

use crate::{
    diagnostics::Level,
    dsl::MaterialDSL,
    error::ExportError,
    graph::{NodeKind, OutputTarget, ShaderGraph, ShaderNode, SlotInput, normalize},
};

use super::{
    context::ExportContext,
    ir::IrNode,
    node_compiler::export_texture,
};

/// Principled channels that are translated, as (target name, socket).
const PRINCIPLED_CHANNELS: [(&str, &str); 4] = [
    ("baseColor", "Base Color"),
    ("roughness", "Roughness"),
    ("metallic", "Metallic"),
    ("specular", "Specular"),
];

/// Grey diffuse used when a material cannot be lowered.
pub fn default_bsdf() -> Vec<IrNode> {
    let mut node = IrNode::new("bsdf").with("type", "diffuse");
    node.add_child(
        IrNode::new("texture")
            .with("name", "albedo")
            .with("type", "constant")
            .with("value", 0.8),
    );
    vec![node]
}

/// Builds the node tree `tree_id` and runs every normalization pass on it.
pub(crate) fn prepare_graph(
    ctx: &mut ExportContext,
    name: &str,
    tree_id: &str,
) -> Result<ShaderGraph, ExportError> {
    let tree = ctx
        .scene
        .node_tree(tree_id)
        .ok_or_else(|| ExportError::MissingNodeTree(tree_id.to_string()))?;
    let mut graph = ShaderGraph::from_tree(name, tree, &mut ctx.diag);
    let report = normalize(&mut graph, &ctx.scene.node_trees, &mut ctx.diag)?;
    ctx.diag.debug(format!("normalized '{name}': {report:?}"));
    ctx.begin_graph();
    Ok(graph)
}

/// Scale applied to an emitted color, or `None` when nothing would be emitted:
/// an unlinked black (or missing) color, or a zero strength. A linked strength
/// is reported and treated as 1.
pub(crate) fn emission_scale(
    ctx: &mut ExportContext,
    color: SlotInput<'_>,
    strength: SlotInput<'_>,
) -> Option<f64> {
    if !color.is_linked() && color.value.is_none_or(|v| v.is_black()) {
        return None;
    }
    let mut scale = 1.0;
    if strength.is_linked() {
        ctx.diag
            .report(Level::Error, ExportError::NonConstantEmissionStrength);
    } else if let Some(v) = strength.value.and_then(|v| v.as_scalar()) {
        scale = v;
    }
    (scale != 0.0).then_some(scale)
}

fn export_emission(
    ctx: &mut ExportContext,
    graph: &ShaderGraph,
    color: SlotInput<'_>,
    strength: SlotInput<'_>,
) -> Vec<IrNode> {
    let Some(scale) = emission_scale(ctx, color, strength) else {
        return Vec::new();
    };
    let mut emission = IrNode::new("emission").with("type", "lambertian");
    let texture = export_texture(ctx, graph, color, Some(scale));
    emission.add_child_named(texture, "emission");
    vec![emission]
}

fn export_glass(ctx: &mut ExportContext, graph: &ShaderGraph, node: &ShaderNode, distribution: &str, reflective: bool) -> IrNode {
    let rough = distribution != "SHARP";
    let mut bsdf = IrNode::new("bsdf").with("type", if rough { "roughdielectric" } else { "dielectric" });
    bsdf.add_child_named(export_texture(ctx, graph, node.input("IOR"), None), "ior");
    bsdf.add_child_named(export_texture(ctx, graph, node.input("Color"), None), "transmittance");
    if reflective {
        bsdf.add_child_named(export_texture(ctx, graph, node.input("Color"), None), "reflectance");
    } else {
        bsdf.add_child(constant_named("reflectance", 0));
    }
    if rough {
        bsdf.add_child_named(export_texture(ctx, graph, node.input("Roughness"), None), "roughness");
    }
    bsdf
}

fn constant_named(name: &str, value: i64) -> IrNode {
    IrNode::new("texture")
        .with("name", name)
        .with("type", "constant")
        .with("value", value)
}

/// Lowers whatever feeds a surface slot. An unlinked surface is black and
/// produces nothing.
pub fn export_bsdf(ctx: &mut ExportContext, graph: &ShaderGraph, surface: SlotInput<'_>) -> Vec<IrNode> {
    let Some(link) = surface.link else {
        return Vec::new();
    };
    let Some(node) = graph.linked_node(link) else {
        ctx.diag
            .error(format!("Material {} has no valid bsdf", graph.name()));
        return Vec::new();
    };

    let mut result = match &node.kind {
        NodeKind::BsdfDiffuse => {
            let mut bsdf = IrNode::new("bsdf").with("type", "diffuse");
            bsdf.add_child_named(export_texture(ctx, graph, node.input("Color"), None), "albedo");
            vec![bsdf]
        }
        NodeKind::BsdfGlass { distribution } => vec![export_glass(ctx, graph, node, distribution, true)],
        NodeKind::BsdfRefraction { distribution } => {
            vec![export_glass(ctx, graph, node, distribution, false)]
        }
        NodeKind::BsdfTransparent => {
            let mut bsdf = IrNode::new("bsdf").with("type", "dielectric");
            bsdf.add_child(constant_named("ior", 1));
            bsdf.add_child(constant_named("reflectance", 0));
            bsdf.add_child_named(export_texture(ctx, graph, node.input("Color"), None), "transmittance");
            vec![bsdf]
        }
        NodeKind::BsdfGlossy => {
            let mut bsdf = IrNode::new("bsdf").with("type", "principled");
            bsdf.add_child_named(export_texture(ctx, graph, node.input("Color"), None), "baseColor");
            bsdf.add_child_named(export_texture(ctx, graph, node.input("Roughness"), None), "roughness");
            bsdf.add_child(constant_named("metallic", 1));
            bsdf.add_child(constant_named("specular", 1));
            vec![bsdf]
        }
        NodeKind::BsdfPrincipled => {
            let mut bsdf = IrNode::new("bsdf").with("type", "principled");
            for (target, socket) in PRINCIPLED_CHANNELS {
                bsdf.add_child_named(export_texture(ctx, graph, node.input(socket), None), target);
            }
            let mut result = vec![bsdf];
            result.extend(export_emission(
                ctx,
                graph,
                node.input("Emission"),
                node.input("Emission Strength"),
            ));
            result
        }
        NodeKind::Emission | NodeKind::Background => {
            export_emission(ctx, graph, node.input("Color"), node.input("Strength"))
        }
        _ => {
            let mut emission = IrNode::new("emission").with("type", "lambertian");
            emission.add_child_named(export_texture(ctx, graph, surface, None), "emission");
            vec![emission]
        }
    };

    let normal = node.input("Normal");
    if normal.is_linked() {
        result.push(named(export_texture(ctx, graph, normal, None), "normal"));
    }
    let alpha = node.input("Alpha");
    let translucent = alpha.value.and_then(|v| v.as_scalar()).is_some_and(|a| a != 1.0);
    if alpha.is_linked() || translucent {
        result.push(named(export_texture(ctx, graph, alpha, None), "alpha"));
    }
    result
}

fn named(mut node: IrNode, name: &str) -> IrNode {
    node.set_name(name);
    node
}

/// The active output whose target is a material, world or light.
fn active_surface_output(graph: &ShaderGraph) -> Option<&ShaderNode> {
    graph.iter().map(|(_, n)| n).find(|n| {
        matches!(
            n.kind,
            NodeKind::Output {
                target: OutputTarget::Material | OutputTarget::World | OutputTarget::Light,
                active: true,
            }
        )
    })
}

/// Lowers one material. Only a missing node tree is an error; the caller then
/// substitutes [`default_bsdf`].
pub fn export_material(ctx: &mut ExportContext, material: &MaterialDSL) -> Result<Vec<IrNode>, ExportError> {
    if !material.use_nodes {
        return Ok(default_bsdf());
    }
    let Some(tree_id) = material.node_tree.as_deref() else {
        return Err(ExportError::MissingNodeTree(material.name.clone()));
    };

    let graph = prepare_graph(ctx, &material.name, tree_id)?;
    match active_surface_output(&graph) {
        Some(output) => Ok(export_bsdf(ctx, &graph, output.input("Surface"))),
        None => {
            ctx.diag.report(
                Level::Warning,
                ExportError::MissingActiveOutput(material.name.clone()),
            );
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::node_compiler::test_utils::*;
    use crate::graph::Literal;

    fn dump_all(nodes: &[IrNode]) -> String {
        nodes.iter().map(|n| n.dump(0)).collect::<Vec<_>>().join("\n")
    }

    fn surface_graph(surface: ShaderNode) -> (ShaderGraph, crate::graph::NodeId) {
        let mut g = ShaderGraph::new("Mat");
        let bsdf = g.add_node(surface.with_output("BSDF", "SHADER", None));
        let out = g.add_node(
            ShaderNode::new(
                "Material Output",
                NodeKind::Output {
                    target: OutputTarget::Material,
                    active: true,
                },
            )
            .with_input("Surface", "SHADER", None),
        );
        g.connect(bsdf, "BSDF", out, "Surface");
        (g, out)
    }

    fn lower(surface: ShaderNode) -> (String, crate::diagnostics::Diagnostics) {
        let (g, out) = surface_graph(surface);
        lower_graph(&g, out)
    }

    fn lower_graph(g: &ShaderGraph, out: crate::graph::NodeId) -> (String, crate::diagnostics::Diagnostics) {
        let scene = test_scene(vec![]);
        let mut ctx = ExportContext::new(&scene, &NullImageStore, &NullMeshStore);
        let nodes = export_bsdf(&mut ctx, g, g.node(out).unwrap().input("Surface"));
        (dump_all(&nodes), ctx.diag)
    }

    fn emission_node(strength: Option<Literal>) -> ShaderNode {
        ShaderNode::new("Emission", NodeKind::Emission)
            .with_input("Color", "RGBA", Some(Literal::Vector(vec![1.0, 0.5, 0.0, 1.0])))
            .with_input("Strength", "VALUE", strength)
    }

    #[test]
    fn diffuse_with_literal_color() {
        let (xml, diag) = lower(
            ShaderNode::new("Diffuse BSDF", NodeKind::BsdfDiffuse)
                .with_input("Color", "RGBA", Some(Literal::Vector(vec![0.8, 0.8, 0.8, 1.0]))),
        );
        assert_eq!(
            xml,
            "<bsdf type=\"diffuse\">\n  <texture name=\"albedo\" type=\"constant\" value=\"0.8,0.8,0.8\"/>\n</bsdf>"
        );
        assert!(diag.is_empty());
    }

    #[test]
    fn principled_emission_is_scaled_by_strength() {
        let (xml, _) = lower(
            ShaderNode::new("Principled BSDF", NodeKind::BsdfPrincipled)
                .with_input("Base Color", "RGBA", Some(Literal::Vector(vec![0.5, 0.5, 0.5, 1.0])))
                .with_input("Roughness", "VALUE", Some(Literal::Scalar(0.5)))
                .with_input("Metallic", "VALUE", Some(Literal::Scalar(0.0)))
                .with_input("Specular", "VALUE", Some(Literal::Scalar(0.5)))
                .with_input("Emission", "RGBA", Some(Literal::Vector(vec![2.0, 0.0, 0.0, 1.0])))
                .with_input("Emission Strength", "VALUE", Some(Literal::Scalar(3.0)))
                .with_input("Alpha", "VALUE", Some(Literal::Scalar(1.0))),
        );
        assert!(xml.starts_with("<bsdf type=\"principled\">"));
        assert!(xml.ends_with(
            "<emission type=\"lambertian\">\n  <texture name=\"emission\" type=\"constant\" value=\"6,0,0\"/>\n</emission>"
        ));
        assert!(!xml.contains("name=\"alpha\""));
    }

    #[test]
    fn black_emission_is_dropped() {
        let (xml, _) = lower(
            ShaderNode::new("Principled BSDF", NodeKind::BsdfPrincipled)
                .with_input("Emission", "RGBA", Some(Literal::Vector(vec![0.0, 0.0, 0.0, 1.0])))
                .with_input("Emission Strength", "VALUE", Some(Literal::Scalar(10.0))),
        );
        assert!(!xml.contains("<emission"));
    }

    #[test]
    fn refraction_forces_zero_reflectance() {
        let (xml, _) = lower(
            ShaderNode::new(
                "Refraction BSDF",
                NodeKind::BsdfRefraction {
                    distribution: "SHARP".to_string(),
                },
            )
            .with_input("Color", "RGBA", Some(Literal::Vector(vec![1.0, 1.0, 1.0, 1.0])))
            .with_input("IOR", "VALUE", Some(Literal::Scalar(1.45))),
        );
        assert_eq!(
            xml,
            "<bsdf type=\"dielectric\">\n\
             \x20 <texture name=\"ior\" type=\"constant\" value=\"1.45\"/>\n\
             \x20 <texture name=\"transmittance\" type=\"constant\" value=\"1,1,1\"/>\n\
             \x20 <texture name=\"reflectance\" type=\"constant\" value=\"0\"/>\n\
             </bsdf>"
        );
    }

    #[test]
    fn rough_glass_adds_roughness() {
        let (xml, _) = lower(
            ShaderNode::new(
                "Glass BSDF",
                NodeKind::BsdfGlass {
                    distribution: "GGX".to_string(),
                },
            )
            .with_input("Color", "RGBA", Some(Literal::Vector(vec![1.0, 1.0, 1.0, 1.0])))
            .with_input("Roughness", "VALUE", Some(Literal::Scalar(0.1)))
            .with_input("IOR", "VALUE", Some(Literal::Scalar(1.5))),
        );
        assert!(xml.starts_with("<bsdf type=\"roughdielectric\">"));
        assert!(xml.contains("<texture name=\"reflectance\" type=\"constant\" value=\"1,1,1\"/>"));
        assert!(xml.contains("<texture name=\"roughness\" type=\"constant\" value=\"0.1\"/>"));
    }

    #[test]
    fn translucent_alpha_is_appended() {
        let (xml, _) = lower(
            ShaderNode::new("Principled BSDF", NodeKind::BsdfPrincipled)
                .with_input("Alpha", "VALUE", Some(Literal::Scalar(0.25))),
        );
        assert!(xml.ends_with("<texture name=\"alpha\" type=\"constant\" value=\"0.25\"/>"));
    }

    #[test]
    fn unknown_surface_is_wrapped_as_emission() {
        let (xml, diag) = lower(ShaderNode::new("Toon", NodeKind::Other("BsdfToon".into())));
        assert_eq!(
            xml,
            "<emission type=\"lambertian\">\n  <texture name=\"emission\" type=\"constant\" value=\"0\"/>\n</emission>"
        );
        assert!(diag.any_error(|e| matches!(e, ExportError::UnsupportedNodeKind { .. })));
    }

    #[test]
    fn transparent_is_a_unit_ior_dielectric() {
        let (xml, _) = lower(
            ShaderNode::new("Transparent BSDF", NodeKind::BsdfTransparent)
                .with_input("Color", "RGBA", Some(Literal::Vector(vec![0.9, 0.9, 0.9, 1.0]))),
        );
        assert_eq!(
            xml,
            "<bsdf type=\"dielectric\">\n\
             \x20 <texture name=\"ior\" type=\"constant\" value=\"1\"/>\n\
             \x20 <texture name=\"reflectance\" type=\"constant\" value=\"0\"/>\n\
             \x20 <texture name=\"transmittance\" type=\"constant\" value=\"0.9,0.9,0.9\"/>\n\
             </bsdf>"
        );
    }

    #[test]
    fn glossy_is_fully_metallic_principled() {
        let (xml, _) = lower(
            ShaderNode::new("Glossy BSDF", NodeKind::BsdfGlossy)
                .with_input("Color", "RGBA", Some(Literal::Vector(vec![0.7, 0.7, 0.7, 1.0])))
                .with_input("Roughness", "VALUE", Some(Literal::Scalar(0.2))),
        );
        assert_eq!(
            xml,
            "<bsdf type=\"principled\">\n\
             \x20 <texture name=\"baseColor\" type=\"constant\" value=\"0.7,0.7,0.7\"/>\n\
             \x20 <texture name=\"roughness\" type=\"constant\" value=\"0.2\"/>\n\
             \x20 <texture name=\"metallic\" type=\"constant\" value=\"1\"/>\n\
             \x20 <texture name=\"specular\" type=\"constant\" value=\"1\"/>\n\
             </bsdf>"
        );
    }

    #[test]
    fn emission_surface_is_scaled_light() {
        let (xml, diag) = lower(emission_node(Some(Literal::Scalar(2.0))));
        assert_eq!(
            xml,
            "<emission type=\"lambertian\">\n  <texture name=\"emission\" type=\"constant\" value=\"2,1,0\"/>\n</emission>"
        );
        assert!(diag.is_empty());
    }

    #[test]
    fn linked_emission_strength_is_reported_and_ignored() {
        let mut g = ShaderGraph::new("Mat");
        let value = g.add_node(
            ShaderNode::new("Value", NodeKind::Value).with_output("Value", "VALUE", Some(Literal::Scalar(4.0))),
        );
        let emission = g.add_node(emission_node(None).with_output("BSDF", "SHADER", None));
        let out = g.add_node(
            ShaderNode::new(
                "Material Output",
                NodeKind::Output {
                    target: OutputTarget::Material,
                    active: true,
                },
            )
            .with_input("Surface", "SHADER", None),
        );
        g.connect(value, "Value", emission, "Strength");
        g.connect(emission, "BSDF", out, "Surface");

        let (xml, diag) = lower_graph(&g, out);
        assert!(xml.contains("<texture name=\"emission\" type=\"constant\" value=\"1,0.5,0\"/>"));
        assert!(diag.any_error(|e| matches!(e, ExportError::NonConstantEmissionStrength)));
    }

    #[test]
    fn linked_normal_is_appended() {
        let mut g = ShaderGraph::new("Mat");
        let rgb = g.add_node(ShaderNode::new("RGB", NodeKind::Rgb).with_output(
            "Color",
            "RGBA",
            Some(Literal::Vector(vec![0.5, 0.5, 1.0, 1.0])),
        ));
        let diffuse = g.add_node(
            ShaderNode::new("Diffuse BSDF", NodeKind::BsdfDiffuse)
                .with_input("Color", "RGBA", Some(Literal::Vector(vec![0.8, 0.8, 0.8, 1.0])))
                .with_input("Normal", "VECTOR", None)
                .with_output("BSDF", "SHADER", None),
        );
        let out = g.add_node(
            ShaderNode::new(
                "Material Output",
                NodeKind::Output {
                    target: OutputTarget::Material,
                    active: true,
                },
            )
            .with_input("Surface", "SHADER", None),
        );
        g.connect(rgb, "Color", diffuse, "Normal");
        g.connect(diffuse, "BSDF", out, "Surface");

        let (xml, _) = lower_graph(&g, out);
        assert_eq!(
            xml,
            "<bsdf type=\"diffuse\">\n  <texture name=\"albedo\" type=\"constant\" value=\"0.8,0.8,0.8\"/>\n</bsdf>\n\
             <texture name=\"normal\" type=\"constant\" value=\"0.5,0.5,1\"/>"
        );
    }

    #[test]
    fn material_without_nodes_uses_default() {
        let scene = test_scene(vec![]);
        let mut ctx = ExportContext::new(&scene, &NullImageStore, &NullMeshStore);
        let material = MaterialDSL {
            id: "m".to_string(),
            name: "Plain".to_string(),
            use_nodes: false,
            node_tree: None,
        };
        let nodes = export_material(&mut ctx, &material).unwrap();
        assert_eq!(dump_all(&nodes), dump_all(&default_bsdf()));

        let missing = MaterialDSL {
            use_nodes: true,
            node_tree: Some("gone".to_string()),
            ..material
        };
        assert!(export_material(&mut ctx, &missing).unwrap_err().is_fatal_for_material());
    }
}
