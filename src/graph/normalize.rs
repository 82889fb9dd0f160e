//! Structural rewrite passes run on a graph before translation.
//!
//! Each pass mutates the graph in place and assumes the invariants left by the
//! previous one, so [`normalize`] runs them in a fixed order: inline groups, then
//! reroutes, muted nodes and layout nodes.

use std::collections::{HashMap, HashSet};

use crate::{
    diagnostics::{Diagnostics, Level},
    dsl::NodeTreeDSL,
    error::ExportError,
    naming::{find_unique_name, sanitize_label},
};

use super::{
    group_inline::MAX_GROUP_DEPTH,
    kind::NodeKind,
    model::{Link, Literal, NodeId, ShaderGraph},
};

/// Counts of what each pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub inlined_groups: usize,
    pub removed_reroutes: usize,
    pub removed_muted: usize,
    pub removed_layout: usize,
}

/// Runs every pass in order. Fails only when a group references a node tree
/// that does not exist.
pub fn normalize(
    graph: &mut ShaderGraph,
    trees: &[NodeTreeDSL],
    diag: &mut Diagnostics,
) -> Result<NormalizeReport, ExportError> {
    let inlined_groups = graph.inline_node_groups(trees, MAX_GROUP_DEPTH, diag)?;
    let removed_reroutes = graph.remove_reroute_nodes(diag);
    let removed_muted = graph.remove_muted_nodes(diag);
    let removed_layout = graph.remove_layout_nodes(diag);
    Ok(NormalizeReport {
        inlined_groups,
        removed_reroutes,
        removed_muted,
        removed_layout,
    })
}

impl ShaderGraph {
    /// Removes `id` if nothing links to it any more.
    ///
    /// Fails with [`ExportError::DanglingReference`] (and leaves the graph untouched)
    /// while some input slot still reads one of its outputs.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), ExportError> {
        let Some(target) = self.node(id) else {
            return Ok(());
        };

        for (_, other) in self.iter() {
            for slot in &other.inputs {
                if let Some(link) = &slot.link {
                    if link.node == id {
                        return Err(ExportError::DanglingReference {
                            node: target.name.clone(),
                            consumer: other.name.clone(),
                            slot: slot.id.clone(),
                            output: link.output.clone(),
                        });
                    }
                }
            }
        }

        self.take(id);
        Ok(())
    }

    /// `delete_node`, reporting a failure as a warning.
    pub(crate) fn delete_node_or_warn(&mut self, id: NodeId, diag: &mut Diagnostics) -> bool {
        match self.delete_node(id) {
            Ok(()) => true,
            Err(err) => {
                diag.report(Level::Warning, err);
                false
            }
        }
    }

    /// Points every slot reading `(node, output)` at `new_link`; `None` unlinks them.
    /// Returns how many slots were rewritten.
    pub fn replace_link(&mut self, node: NodeId, output: &str, new_link: Option<Link>) -> usize {
        let mut rewritten = 0;
        for (_, n) in self.iter_mut() {
            for slot in &mut n.inputs {
                let matches = slot
                    .link
                    .as_ref()
                    .is_some_and(|l| l.node == node && l.output == output);
                if matches {
                    slot.link = new_link.clone();
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    /// Like `replace_link`, but the consumers are unlinked and receive `value`.
    pub fn replace_link_with_value(
        &mut self,
        node: NodeId,
        output: &str,
        value: Option<Literal>,
    ) -> usize {
        let mut rewritten = 0;
        for (_, n) in self.iter_mut() {
            for slot in &mut n.inputs {
                let matches = slot
                    .link
                    .as_ref()
                    .is_some_and(|l| l.node == node && l.output == output);
                if matches {
                    slot.link = None;
                    slot.value = value.clone();
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    /// Unlinks every slot reading any output of `node`.
    pub(crate) fn unlink_consumers(&mut self, node: NodeId) {
        for (_, n) in self.iter_mut() {
            for slot in &mut n.inputs {
                if slot.link.as_ref().is_some_and(|l| l.node == node) {
                    slot.link = None;
                }
            }
        }
    }

    /// Applies a bulk renaming. Links address nodes by id, so they stay valid.
    pub fn apply_renaming(&mut self, renaming: &HashMap<NodeId, String>) {
        for (id, node) in self.iter_mut() {
            if let Some(new_name) = renaming.get(&id) {
                node.name = new_name.clone();
            }
        }
    }

    /// Renames every node to its sanitized label (or current name when unlabeled),
    /// suffixing collisions.
    pub fn use_labels_as_names(&mut self) {
        let mut used = HashSet::new();
        let renaming: HashMap<NodeId, String> = self
            .iter()
            .map(|(id, n)| {
                let wanted = match n.label.as_deref() {
                    Some(label) => sanitize_label(label, &n.name),
                    None => n.name.clone(),
                };
                (id, find_unique_name(&mut used, &wanted))
            })
            .collect();
        self.apply_renaming(&renaming);
    }

    /// Renames nodes so none collides with `used`; the new names are added to `used`.
    pub fn avoid_names(&mut self, used: &mut HashSet<String>) {
        let renaming: HashMap<NodeId, String> = self
            .iter()
            .map(|(id, n)| (id, find_unique_name(used, &n.name)))
            .collect();
        self.apply_renaming(&renaming);
    }

    /// Bypasses reroute nodes: consumers read whatever fed the reroute.
    pub fn remove_reroute_nodes(&mut self, diag: &mut Diagnostics) -> usize {
        let mut removed = 0;
        for id in self.ids() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.kind != NodeKind::Reroute {
                continue;
            }
            if node.inputs.len() != 1 || node.outputs.len() != 1 {
                diag.warn(format!(
                    "reroute '{}' has {} inputs and {} outputs, expected one of each",
                    node.name,
                    node.inputs.len(),
                    node.outputs.len()
                ));
            }

            let upstream = node.inputs.first().and_then(|s| s.link.clone());
            let outputs: Vec<String> = node.outputs.iter().map(|s| s.id.clone()).collect();
            for output in &outputs {
                self.replace_link(id, output, upstream.clone());
            }
            if self.delete_node_or_warn(id, diag) {
                removed += 1;
            }
        }
        removed
    }

    /// Replaces muted nodes by pass-through: each output forwards the first linked
    /// input of the same socket type, or leaves its consumers unlinked.
    pub fn remove_muted_nodes(&mut self, diag: &mut Diagnostics) -> usize {
        let mut removed = 0;
        for id in self.ids() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if !node.muted {
                continue;
            }

            let forwards: Vec<(String, Option<Link>)> = node
                .outputs
                .iter()
                .map(|out| {
                    let through = node
                        .inputs
                        .iter()
                        .find(|inp| inp.socket_type == out.socket_type && inp.link.is_some())
                        .and_then(|inp| inp.link.clone());
                    (out.id.clone(), through)
                })
                .collect();
            diag.debug(format!("bypassing muted node '{}'", node.name));

            for (output, through) in forwards {
                self.replace_link(id, &output, through);
            }
            if self.delete_node_or_warn(id, diag) {
                removed += 1;
            }
        }
        removed
    }

    /// Drops frame/comment nodes. They have no outputs, so deletion cannot dangle.
    pub fn remove_layout_nodes(&mut self, diag: &mut Diagnostics) -> usize {
        let mut removed = 0;
        for id in self.ids() {
            let is_layout = self.node(id).is_some_and(|n| n.kind == NodeKind::Frame);
            if is_layout && self.delete_node_or_warn(id, diag) {
                removed += 1;
            }
        }
        removed
    }
}
