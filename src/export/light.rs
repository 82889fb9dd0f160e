//! Punctual, directional and emitting-shape lights.

use crate::{
    diagnostics::Level,
    dsl::LightDSL,
    error::ExportError,
    utils::{Mat4, fmt_flat_array, fmt_flat_matrix, mat4_column3, mat4_translation},
};

use super::{context::ExportContext, ir::IrNode};

/// Smallest radius a point light may have before it is exported as a true point.
const MIN_POINT_RADIUS: f64 = 1e-3;

fn scaled_color(light: &LightDSL, factor: f64) -> [f64; 3] {
    light.color.map(|c| factor * light.energy * c)
}

/// Sphere shape of radius `shadow_soft_size`; returns the radiance normalization.
fn export_point_light(instance: &mut IrNode, light: &LightDSL, matrix: &Mat4) -> f64 {
    let radius = light.shadow_soft_size.max(MIN_POINT_RADIUS);
    let [x, y, z] = mat4_translation(matrix);

    instance.add_child(IrNode::new("shape").with("type", "sphere"));
    let transform = instance.add_child(IrNode::new("transform"));
    transform.add_child(IrNode::new("scale").with("value", radius));
    transform.add_child(IrNode::new("translate").with("x", x).with("y", y).with("z", z));

    1.0 / (4.0 * (3.14159 * radius).powi(2))
}

/// Rectangle spanned by the scaled light axes; returns the radiance normalization.
/// Host transforms are similarities, so the spanning vectors stay orthogonal and
/// their lengths give the area.
fn export_area_light(ctx: &mut ExportContext, instance: &mut IrNode, light: &LightDSL, matrix: &Mat4) -> f64 {
    let scale_x = light.size;
    let scale_y = match light.shape.as_str() {
        "SQUARE" | "DISK" => light.size,
        "RECTANGLE" | "ELLIPSE" => light.size_y,
        other => {
            ctx.diag
                .report(Level::Warning, ExportError::UnsupportedLightShape(other.to_string()));
            light.size
        }
    };

    let mut m = *matrix;
    let mut lensqr_x = 0.0;
    let mut lensqr_y = 0.0;
    for row in m.iter_mut().take(3) {
        row[0] *= scale_x / 2.0;
        row[1] *= scale_y / 2.0;
        row[2] *= -1.0;
        lensqr_x += row[0] * row[0];
        lensqr_y += row[1] * row[1];
    }

    instance.add_child(IrNode::new("shape").with("type", "rectangle"));
    instance
        .add_child(IrNode::new("transform"))
        .add_child(IrNode::new("matrix").with("value", fmt_flat_matrix(&m)));

    1.0 / (16.0 * (lensqr_x * lensqr_y).sqrt())
}

/// Lowers one light object placed by `matrix`.
pub fn export_light(ctx: &mut ExportContext, light: &LightDSL, matrix: &Mat4) -> Vec<IrNode> {
    if light.is_portal {
        ctx.diag.warn("Light portals are not supported");
        return Vec::new();
    }

    if light.light_type == "POINT" && light.shadow_soft_size < MIN_POINT_RADIUS {
        return vec![
            IrNode::new("light")
                .with("type", "point")
                .with("position", fmt_flat_array(&mat4_translation(matrix)))
                .with("power", fmt_flat_array(&scaled_color(light, 1.0))),
        ];
    }
    if light.light_type == "SUN" {
        return vec![
            IrNode::new("light")
                .with("type", "directional")
                .with("direction", fmt_flat_array(&mat4_column3(matrix, 2)))
                .with("intensity", fmt_flat_array(&scaled_color(light, 1.0))),
        ];
    }

    let mut instance = IrNode::new("instance");
    let normalization = match light.light_type.as_str() {
        "POINT" => export_point_light(&mut instance, light, matrix),
        "AREA" => export_area_light(ctx, &mut instance, light, matrix),
        other => {
            ctx.diag
                .report(Level::Warning, ExportError::UnsupportedLightType(other.to_string()));
            return Vec::new();
        }
    };

    instance.add_child(IrNode::new("emission").with("type", "lambertian")).add_child(
        IrNode::new("texture")
            .with("name", "emission")
            .with("type", "constant")
            .with("value", fmt_flat_array(&scaled_color(light, normalization))),
    );

    if ctx.settings.enable_area_lights {
        let mut area = IrNode::new("light").with("type", "area");
        area.add_child(instance);
        vec![area]
    } else {
        vec![instance]
    }
}
