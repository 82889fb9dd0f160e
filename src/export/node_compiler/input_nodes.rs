//! Constant textures: unlinked slot literals and Value/RGB nodes.

use crate::{
    export::{context::ExportContext, ir::IrNode},
    graph::{Literal, ShaderNode},
    utils::{fmt_flat_array, fmt_float},
};

use super::fallback_texture;

/// A missing or zero exposure leaves values unscaled.
fn exposure_factor(exposure: Option<f64>) -> f64 {
    match exposure {
        Some(e) if e != 0.0 => e,
        _ => 1.0,
    }
}

fn constant(value: impl Into<crate::export::ir::AttrValue>) -> IrNode {
    IrNode::new("texture").with("type", "constant").with("value", value)
}

/// Constant texture from a slot literal. Vectors keep their first three components.
pub fn export_literal(ctx: &mut ExportContext, value: Option<&Literal>, exposure: Option<f64>) -> IrNode {
    let factor = exposure_factor(exposure);
    match value {
        None => fallback_texture(),
        Some(Literal::Scalar(v)) => constant(fmt_float(v * factor)),
        Some(Literal::Vector(v)) => {
            let scaled: Vec<f64> = v.iter().take(3).map(|c| c * factor).collect();
            constant(fmt_flat_array(&scaled))
        }
        Some(Literal::Text(text)) => {
            ctx.diag
                .warn(format!("text value '{text}' cannot be used as a texture"));
            fallback_texture()
        }
    }
}

/// Value node: its stored output value as a float constant.
pub fn export_value_node(ctx: &mut ExportContext, node: &ShaderNode, exposure: Option<f64>) -> IrNode {
    let value = node.outputs.first().and_then(|o| o.value.as_ref()).and_then(|v| match v {
        Literal::Scalar(s) => Some(*s),
        Literal::Vector(items) => items.first().copied(),
        Literal::Text(_) => None,
    });
    match value {
        Some(v) => constant(v * exposure_factor(exposure)),
        None => {
            ctx.diag
                .warn(format!("value node '{}' has no stored value", node.name));
            fallback_texture()
        }
    }
}

/// RGB node: its stored color (alpha dropped).
pub fn export_rgb_node(ctx: &mut ExportContext, node: &ShaderNode, exposure: Option<f64>) -> IrNode {
    let Some(color) = node.outputs.first().and_then(|o| o.value.as_ref()).and_then(Literal::as_vec3) else {
        ctx.diag
            .warn(format!("RGB node '{}' has no stored color", node.name));
        return fallback_texture();
    };
    let factor = exposure_factor(exposure);
    constant(fmt_flat_array(&color.map(|c| c * factor)))
}
