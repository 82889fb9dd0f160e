use std::collections::HashSet;

use crate::{
    assets::{ImageStore, MeshStore},
    diagnostics::{Diagnostics, Level},
    dsl::{ExportSettings, SceneDSL},
    error::ExportError,
    graph::NodeId,
    naming::NameArena,
};

use super::registry::{EntityKey, Exportable, ExportRegistry};

/// Ids the document uses for its own elements; entity ids never collide with them.
pub const RESERVED_IDS: [&str; 2] = ["scene", "noisy"];

/// State shared by every translator during one export run.
pub struct ExportContext<'a> {
    pub scene: &'a SceneDSL,
    pub settings: &'a ExportSettings,
    pub images: &'a dyn ImageStore,
    pub meshes: &'a dyn MeshStore,
    pub registry: ExportRegistry,
    pub names: NameArena,
    pub diag: Diagnostics,
    visiting: HashSet<NodeId>,
}

impl<'a> ExportContext<'a> {
    pub fn new(scene: &'a SceneDSL, images: &'a dyn ImageStore, meshes: &'a dyn MeshStore) -> Self {
        let mut names = NameArena::new();
        for id in RESERVED_IDS {
            names.reserve(id);
        }
        Self {
            scene,
            settings: &scene.settings,
            images,
            meshes,
            registry: ExportRegistry::new(),
            names,
            diag: Diagnostics::new(),
            visiting: HashSet::new(),
        }
    }

    /// Runs `translate` the first time `key` is seen; afterwards returns `ref`
    /// elements to that first result.
    pub fn export_entity<T: Exportable>(
        &mut self,
        key: EntityKey,
        display_name: &str,
        translate: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if let Some(refs) = self.registry.references(&key, &mut self.names) {
            self.diag
                .debug(format!("reusing {:?} '{}'", key.kind, key.identity));
            return T::from_refs(refs);
        }
        let mut result = translate(self);
        self.registry.store(key, display_name, &mut result);
        result
    }

    /// Marks `node` as being translated. Returns false (and reports a cycle) if it
    /// already is.
    pub(crate) fn enter(&mut self, graph: &str, node: NodeId, name: &str) -> bool {
        if self.visiting.insert(node) {
            return true;
        }
        self.diag.report(
            Level::Error,
            ExportError::CyclicGraph {
                graph: graph.to_string(),
                node: name.to_string(),
            },
        );
        false
    }

    pub(crate) fn leave(&mut self, node: NodeId) {
        self.visiting.remove(&node);
    }

    /// Clears per-graph translation state.
    pub(crate) fn begin_graph(&mut self) {
        self.visiting.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::export::{ir::IrNode, node_compiler::test_utils::*, registry::EntityKind};

    #[test]
    fn translator_runs_once_per_entity() {
        let scene = test_scene(vec![]);
        let mut ctx = ExportContext::new(&scene, &NullImageStore, &NullMeshStore);
        let calls = Cell::new(0usize);
        let lookup = |ctx: &mut ExportContext| {
            ctx.export_entity(EntityKey::new("Red", EntityKind::Material), "Red", |_| {
                calls.set(calls.get() + 1);
                vec![IrNode::new("bsdf").with("type", "diffuse")]
            })
        };

        let first = lookup(&mut ctx);
        let second = lookup(&mut ctx);
        assert_eq!(calls.get(), 1);
        assert_eq!(first[0].tag, "bsdf");
        assert_eq!(second[0].dump(0), r#"<ref id="Red"/>"#);
    }
}
