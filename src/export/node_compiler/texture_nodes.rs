use crate::{
    diagnostics::Level,
    error::ExportError,
    export::{
        context::ExportContext,
        ir::IrNode,
        registry::{EntityKey, EntityKind},
    },
    graph::{NodeKind, ShaderNode},
};

use super::fallback_texture;

/// Whether a color space name means "no sRGB decoding".
fn is_linear_colorspace(name: &str) -> Option<bool> {
    match name {
        "Linear" | "Non-Color" | "Raw" => Some(true),
        "sRGB" => Some(false),
        _ => None,
    }
}

/// Image and environment texture nodes. The image itself is exported once per
/// image, so two nodes sampling the same file share one texture element.
pub fn export_image_texture(ctx: &mut ExportContext, node: &ShaderNode, exposure: Option<f64>) -> IrNode {
    let (image_id, clamp, nearest) = match &node.kind {
        NodeKind::TexImage {
            image,
            extension,
            interpolation,
        } => (
            image.as_deref(),
            extension == "EXTEND" || extension == "CLIP",
            interpolation == "Closest",
        ),
        NodeKind::TexEnvironment {
            image,
            interpolation,
        } => (image.as_deref(), true, interpolation == "Closest"),
        _ => return fallback_texture(),
    };

    let scene = ctx.scene;
    let Some(image) = image_id.and_then(|id| scene.image(id)) else {
        ctx.diag.error(format!("Image node {} has no image", node.name));
        return fallback_texture();
    };

    ctx.export_entity(
        EntityKey::new(image.id.clone(), EntityKind::Image),
        &node.name,
        |ctx| {
            let filename = match ctx.images.resolve(image, &mut ctx.diag) {
                Ok(path) => path,
                Err(err) => {
                    ctx.diag.report(Level::Error, err);
                    return fallback_texture();
                }
            };

            let mut texture = IrNode::new("texture")
                .with("type", "image")
                .with("filename", filename);
            if let Some(e) = exposure.filter(|e| *e != 1.0) {
                texture.set("exposure", e);
            }
            if clamp {
                texture.set("border", "clamp");
            }
            if nearest {
                texture.set("filter", "nearest");
            }
            match is_linear_colorspace(&image.colorspace) {
                Some(true) => texture.set("linear", true),
                Some(false) => {}
                None => ctx.diag.report(
                    Level::Error,
                    ExportError::UnsupportedColorSpace(image.colorspace.clone()),
                ),
            }
            texture
        },
    )
}
