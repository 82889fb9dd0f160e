//! Mapping and vector-rotate nodes as scale/rotate/translate primitives.
//!
//! Angles arrive in radians and are written in degrees. Identity primitives are
//! never emitted.

use crate::{
    diagnostics::Level,
    error::ExportError,
    export::{context::ExportContext, ir::IrNode},
    graph::{RotationType, ShaderGraph, ShaderNode, SlotInput, VectorType},
    utils::fmt_flat_array,
};

use super::export_transform;

const AXES: [&str; 3] = ["1,0,0", "0,1,0", "0,0,1"];

/// Constant vector of a transform input. Linked inputs are reported and their
/// literal (if any) is used anyway.
fn extract_vector(ctx: &mut ExportContext, input: SlotInput<'_>) -> [f64; 3] {
    if input.is_linked() {
        ctx.diag
            .report(Level::Error, ExportError::NonConstantTransform);
    }
    input.value.and_then(|v| v.as_vec3()).unwrap_or([0.0; 3])
}

fn degrees(v: [f64; 3]) -> [f64; 3] {
    v.map(f64::to_degrees)
}

fn negate(v: [f64; 3]) -> [f64; 3] {
    v.map(|c| -c)
}

pub fn scale(v: [f64; 3]) -> Vec<IrNode> {
    if v.iter().any(|c| *c != 1.0) {
        vec![IrNode::new("scale").with("value", fmt_flat_array(&v))]
    } else {
        Vec::new()
    }
}

/// One `rotate` per non-zero axis, X then Y then Z.
pub fn rotate(degrees: [f64; 3]) -> Vec<IrNode> {
    degrees
        .iter()
        .zip(AXES)
        .filter(|(angle, _)| **angle != 0.0)
        .map(|(angle, axis)| IrNode::new("rotate").with("axis", axis).with("angle", *angle))
        .collect()
}

pub fn translate(v: [f64; 3]) -> Vec<IrNode> {
    if v.iter().any(|c| *c != 0.0) {
        vec![IrNode::new("translate").with("value", fmt_flat_array(&v))]
    } else {
        Vec::new()
    }
}

fn inverse_scale(ctx: &mut ExportContext, graph: &ShaderGraph, v: [f64; 3]) -> Vec<IrNode> {
    if v.contains(&0.0) {
        ctx.diag
            .report(Level::Warning, ExportError::DegenerateScale(graph.name().to_string()));
        return Vec::new();
    }
    scale(v.map(|c| 1.0 / c))
}

pub fn export_mapping(
    ctx: &mut ExportContext,
    graph: &ShaderGraph,
    node: &ShaderNode,
    vector_type: &VectorType,
) -> Vec<IrNode> {
    let sca = extract_vector(ctx, node.input("Scale"));
    let rot = degrees(extract_vector(ctx, node.input("Rotation")));
    let loc = extract_vector(ctx, node.input("Location"));

    let mut transforms = export_transform(ctx, graph, node.input("Vector"));
    match vector_type {
        VectorType::Point => {
            transforms.extend(scale(sca));
            transforms.extend(rotate(rot));
            transforms.extend(translate(loc));
        }
        VectorType::Texture => {
            transforms.extend(translate(negate(loc)));
            transforms.extend(rotate(negate(rot)).into_iter().rev());
            transforms.extend(inverse_scale(ctx, graph, sca));
        }
        VectorType::Normal => {
            transforms.extend(inverse_scale(ctx, graph, sca));
            transforms.extend(rotate(rot));
        }
        VectorType::Vector => {
            transforms.extend(scale(sca));
            transforms.extend(rotate(rot));
        }
        VectorType::Unsupported(other) => ctx.diag.report(
            Level::Error,
            ExportError::UnsupportedVectorType {
                graph: graph.name().to_string(),
                vector_type: other.clone(),
            },
        ),
    }
    transforms
}

/// Rotation about `Center`: translate(-center), rotate, translate(center).
///
/// Single-axis modes without an angle, or with a zero angle, keep only the
/// upstream chain.
pub fn export_vector_rotate(
    ctx: &mut ExportContext,
    graph: &ShaderGraph,
    node: &ShaderNode,
    rotation_type: &RotationType,
    invert: bool,
) -> Vec<IrNode> {
    let center = extract_vector(ctx, node.input("Center"));
    let mut transforms = export_transform(ctx, graph, node.input("Vector"));

    let rotation: Vec<IrNode> = match rotation_type {
        RotationType::EulerXyz => {
            let rot = degrees(extract_vector(ctx, node.input("Rotation")));
            if invert {
                rotate(negate(rot)).into_iter().rev().collect()
            } else {
                rotate(rot)
            }
        }
        RotationType::Unsupported(other) => {
            ctx.diag.report(
                Level::Error,
                ExportError::UnsupportedRotationType {
                    graph: graph.name().to_string(),
                    rotation_type: other.clone(),
                },
            );
            return transforms;
        }
        single_axis => {
            let Some(angle) = node.input("Angle").value.and_then(|v| v.as_scalar()) else {
                return transforms;
            };
            let angle = if invert { -angle.to_degrees() } else { angle.to_degrees() };
            if angle == 0.0 {
                return transforms;
            }
            let axis = match single_axis {
                RotationType::XAxis => AXES[0].to_string(),
                RotationType::YAxis => AXES[1].to_string(),
                RotationType::ZAxis => AXES[2].to_string(),
                _ => fmt_flat_array(&extract_vector(ctx, node.input("Axis"))),
            };
            vec![IrNode::new("rotate").with("axis", axis).with("angle", angle)]
        }
    };

    transforms.extend(translate(negate(center)));
    transforms.extend(rotation);
    transforms.extend(translate(center));
    transforms
}
