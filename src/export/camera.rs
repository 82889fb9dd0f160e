use crate::{
    dsl::CameraDSL,
    utils::{Mat4, fmt_flat_matrix, mat4_column3, vec3_length},
};

use super::{context::ExportContext, ir::IrNode};

/// Drops the scale of `matrix` and flips the local Y and Z axes, so the camera
/// looks down -Z with Y up.
pub fn orient_camera(matrix: &Mat4) -> Mat4 {
    let mut oriented = *matrix;
    for (c, sign) in [(0, 1.0), (1, -1.0), (2, -1.0)] {
        let axis = mat4_column3(matrix, c);
        let len = vec3_length(axis);
        let factor = if len > 0.0 { sign / len } else { sign };
        for (r, v) in axis.iter().enumerate() {
            // `+ 0.0` folds -0 into 0.
            oriented[r][c] = v * factor + 0.0;
        }
    }
    oriented[3] = [0.0, 0.0, 0.0, 1.0];
    oriented
}

fn scaled_resolution(size: u32, percentage: u32) -> i64 {
    (f64::from(size) * f64::from(percentage) * 0.01) as i64
}

/// Perspective camera with the horizontal field of view taken from the sensor.
pub fn export_camera(ctx: &mut ExportContext, camera: Option<&CameraDSL>) -> Vec<IrNode> {
    let Some(camera) = camera else {
        ctx.diag.error("Your scene needs a camera!");
        return Vec::new();
    };

    let [width, height] = camera.resolution;
    let fov = (2.0 * (camera.sensor_width / (2.0 * camera.lens)).atan()).to_degrees();

    let mut node = IrNode::new("camera").with("type", "perspective");
    node.add_child(
        IrNode::new("integer")
            .with("name", "width")
            .with("value", scaled_resolution(width, camera.resolution_percentage)),
    );
    node.add_child(
        IrNode::new("integer")
            .with("name", "height")
            .with("value", scaled_resolution(height, camera.resolution_percentage)),
    );
    node.add_child(IrNode::new("float").with("name", "fov").with("value", fov));
    node.add_child(
        IrNode::new("string")
            .with("name", "fovAxis")
            .with("value", if width > height { "x" } else { "y" }),
    );
    node.add_child(IrNode::new("transform")).add_child(
        IrNode::new("matrix").with("value", fmt_flat_matrix(&orient_camera(&camera.matrix_world))),
    );
    vec![node]
}
