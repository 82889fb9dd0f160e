use std::collections::{HashMap, HashSet};

use crate::{
    diagnostics::{Diagnostics, Level},
    dsl::NodeTreeDSL,
    error::ExportError,
};

use super::{
    kind::NodeKind,
    model::{InputSlot, NodeId, ShaderGraph},
};

/// Nesting limit for group inlining; also stops self-referencing groups.
pub const MAX_GROUP_DEPTH: usize = 8;

fn tree_by_id<'a>(trees: &'a [NodeTreeDSL], id: &str) -> Option<&'a NodeTreeDSL> {
    trees.iter().find(|t| t.id == id)
}

impl ShaderGraph {
    /// Expands every group node into the graph by splicing in its sub-graph.
    ///
    /// The sub-graph is inlined recursively first (`max_depth` levels), renamed to
    /// avoid the parent's names and copied in. Consumers of the group's group-input
    /// node are rewired to whatever fed the group's own inputs; consumers of the
    /// group's outputs are rewired to what feeds the active group output. A group
    /// without an active output leaves its consumers unlinked.
    ///
    /// Returns the number of expanded groups. A group whose tree is missing aborts
    /// with [`ExportError::MissingNodeTree`].
    pub fn inline_node_groups(
        &mut self,
        trees: &[NodeTreeDSL],
        max_depth: usize,
        diag: &mut Diagnostics,
    ) -> Result<usize, ExportError> {
        let mut expanded = 0;

        for group_id in self.ids() {
            let Some(group) = self.node(group_id) else {
                continue;
            };
            let NodeKind::Group { tree } = &group.kind else {
                continue;
            };

            if max_depth == 0 {
                diag.report(
                    Level::Warning,
                    ExportError::GroupNestingTooDeep {
                        node: group.name.clone(),
                    },
                );
                continue;
            }

            let tree_id = tree.clone().unwrap_or_default();
            let sub_tree = tree_by_id(trees, &tree_id)
                .ok_or_else(|| ExportError::MissingNodeTree(format!("{tree_id} (group '{}')", group.name)))?;
            let group_inputs: Vec<InputSlot> = group.inputs.clone();
            let group_outputs: Vec<String> = group.outputs.iter().map(|s| s.id.clone()).collect();

            let mut sub = ShaderGraph::from_tree(self.name(), sub_tree, diag);
            sub.inline_node_groups(trees, max_depth - 1, diag)?;
            let mut used: HashSet<String> = self.iter().map(|(_, n)| n.name.clone()).collect();
            sub.avoid_names(&mut used);

            // 1) Splice sub-graph nodes. Inactive group outputs are dropped, the
            // active one is kept as an anchor for retargeting the group's outputs.
            let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
            let mut input_nodes: Vec<NodeId> = Vec::new();
            let mut output_node: Option<NodeId> = None;
            for sub_id in sub.ids() {
                let Some(node) = sub.take(sub_id) else {
                    continue;
                };
                let role = match node.kind {
                    NodeKind::GroupOutput { active: false } => continue,
                    NodeKind::GroupOutput { active: true } if output_node.is_some() => continue,
                    NodeKind::GroupOutput { active: true } => Some(true),
                    NodeKind::GroupInput => Some(false),
                    _ => None,
                };
                let new_id = self.add_node(node);
                remap.insert(sub_id, new_id);
                match role {
                    Some(true) => output_node = Some(new_id),
                    Some(false) => input_nodes.push(new_id),
                    None => {}
                }
            }

            // 2) Rewrite the spliced nodes' links into parent ids.
            let spliced: Vec<NodeId> = remap.values().copied().collect();
            for id in spliced {
                let Some(node) = self.node_mut(id) else {
                    continue;
                };
                for slot in &mut node.inputs {
                    let Some(link) = slot.link.as_mut() else {
                        continue;
                    };
                    match remap.get(&link.node) {
                        Some(new_node) => link.node = *new_node,
                        None => slot.link = None,
                    }
                }
            }

            // 3) Group-input consumers read what feeds the group from outside.
            for input in &group_inputs {
                for gi in &input_nodes {
                    match &input.link {
                        Some(link) => {
                            self.replace_link(*gi, &input.id, Some(link.clone()));
                        }
                        None => {
                            self.replace_link_with_value(*gi, &input.id, input.value.clone());
                        }
                    }
                }
            }
            for gi in input_nodes {
                self.unlink_consumers(gi);
                self.delete_node_or_warn(gi, diag);
            }

            // 4) Group-output consumers read what feeds the active group output.
            for output in &group_outputs {
                match output_node.and_then(|id| self.node(id)) {
                    Some(anchor) => {
                        let slot = anchor.input(output);
                        let link = slot.link.cloned();
                        let value = slot.value.cloned();
                        match link {
                            Some(link) => self.replace_link(group_id, output, Some(link)),
                            None => self.replace_link_with_value(group_id, output, value),
                        };
                    }
                    None => {
                        self.replace_link(group_id, output, None);
                    }
                }
            }

            if let Some(anchor) = output_node {
                self.delete_node_or_warn(anchor, diag);
            }
            self.delete_node_or_warn(group_id, diag);
            expanded += 1;
        }

        Ok(expanded)
    }
}
