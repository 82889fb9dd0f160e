//! Mesh instances and light objects.

use crate::{
    diagnostics::Level,
    dsl::{ExportSettings, MeshDSL, ObjectDSL, ObjectType},
    utils::fmt_flat_matrix,
};

use super::{
    context::ExportContext,
    ir::IrNode,
    light::export_light,
    material::{default_bsdf, export_material},
    registry::{EntityKey, EntityKind},
};

/// One `shape type="mesh"` per material part, shared between objects using the
/// same mesh.
pub fn export_shapes(ctx: &mut ExportContext, mesh: &MeshDSL) -> Vec<IrNode> {
    ctx.export_entity(
        EntityKey::new(mesh.name.clone(), EntityKind::Mesh),
        &mesh.name,
        |ctx| {
            ctx.meshes
                .parts(mesh)
                .into_iter()
                .map(|filename| IrNode::new("shape").with("type", "mesh").with("filename", filename))
                .collect::<Vec<_>>()
        },
    )
}

/// The bsdf for material slot `slot` of `object`.
fn export_slot_material(ctx: &mut ExportContext, object: &ObjectDSL, slot: usize) -> Vec<IrNode> {
    if !ctx.settings.export_materials {
        return default_bsdf();
    }
    let Some(entry) = object.material_slots.get(slot) else {
        return default_bsdf();
    };
    let scene = ctx.scene;
    let Some(material) = entry.as_deref().and_then(|id| scene.material(id)) else {
        let mesh = object.mesh.as_ref().map_or(object.name.as_str(), |m| m.name.as_str());
        ctx.diag.warn(format!(
            "Obsolete material slot {slot} with instance {mesh}. Maybe missing a material?"
        ));
        return default_bsdf();
    };

    ctx.export_entity(
        EntityKey::new(material.id.clone(), EntityKind::Material),
        &material.name,
        |ctx| match export_material(ctx, material) {
            Ok(nodes) => nodes,
            Err(err) => {
                ctx.diag.error(format!("failed to export material {}", material.name));
                ctx.diag.report(Level::Error, err);
                default_bsdf()
            }
        },
    )
}

fn export_instance(ctx: &mut ExportContext, object: &ObjectDSL, shape: IrNode, slot: usize) -> IrNode {
    let mut instance = IrNode::new("instance");
    instance.add_children(export_slot_material(ctx, object, slot));
    instance.add_child(shape);
    instance
        .add_child(IrNode::new("transform"))
        .add_child(IrNode::new("matrix").with("value", fmt_flat_matrix(&object.matrix_world)));
    instance
}

fn is_exported(settings: &ExportSettings, object: &ObjectDSL) -> bool {
    if settings.use_selection {
        object.selected
    } else {
        object.visible
    }
}

/// Every exported object, in document order.
pub fn export_objects(ctx: &mut ExportContext) -> Vec<IrNode> {
    let mut result = Vec::new();
    let scene = ctx.scene;
    let settings = ctx.settings;

    for object in scene.objects.iter().filter(|o| is_exported(settings, o)) {
        match object.object_type {
            ObjectType::Mesh => {
                let shapes = match &object.mesh {
                    Some(mesh) => export_shapes(ctx, mesh),
                    None => Vec::new(),
                };
                if shapes.is_empty() {
                    ctx.diag.warn(format!(
                        "Entity {} has no material or shape and will be ignored",
                        object.name
                    ));
                }
                for (slot, shape) in shapes.into_iter().enumerate() {
                    let instance = export_instance(ctx, object, shape, slot);
                    result.push(instance);
                }
            }
            ObjectType::Light if ctx.settings.export_lights => match &object.light {
                Some(light) => result.extend(export_light(ctx, light, &object.matrix_world)),
                None => ctx
                    .diag
                    .warn(format!("Light object {} carries no light data", object.name)),
            },
            _ => {}
        }
    }
    result
}
