//! In-memory shading graph.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; the human readable
//! `name` is only a uniqueness/display concern, so renaming never touches links.

use std::collections::HashMap;

use crate::{
    diagnostics::{Diagnostics, Level},
    dsl::{NodeTreeDSL, Socket},
    error::ExportError,
    naming::find_unique_name,
};

use super::kind::NodeKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Constant occupying an input slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Scalar(f64),
    Vector(Vec<f64>),
    Text(String),
}

impl Literal {
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::Number(n) => n.as_f64().map(Literal::Scalar),
            serde_json::Value::Bool(b) => Some(Literal::Scalar(if *b { 1.0 } else { 0.0 })),
            serde_json::Value::String(s) => Some(Literal::Text(s.clone())),
            serde_json::Value::Array(items) => {
                let values: Option<Vec<f64>> = items.iter().map(|x| x.as_f64()).collect();
                values.map(Literal::Vector)
            }
            _ => None,
        }
    }

    /// Zero scalar, or a vector whose first three components are zero.
    pub fn is_black(&self) -> bool {
        match self {
            Literal::Scalar(v) => *v == 0.0,
            Literal::Vector(v) => v.iter().take(3).all(|c| *c == 0.0),
            Literal::Text(_) => false,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Literal::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Broadcasts scalars; vectors are padded with zeros.
    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            Literal::Scalar(v) => Some([*v, *v, *v]),
            Literal::Vector(v) => Some([
                v.first().copied().unwrap_or(0.0),
                v.get(1).copied().unwrap_or(0.0),
                v.get(2).copied().unwrap_or(0.0),
            ]),
            Literal::Text(_) => None,
        }
    }
}

/// Upstream `(node, output)` feeding an input slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    pub node: NodeId,
    pub output: String,
}

impl Link {
    pub fn new(node: NodeId, output: impl Into<String>) -> Self {
        Self {
            node,
            output: output.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputSlot {
    pub id: String,
    pub socket_type: String,
    pub value: Option<Literal>,
    pub link: Option<Link>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputSlot {
    pub id: String,
    pub socket_type: String,
    pub value: Option<Literal>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShaderNode {
    pub name: String,
    pub label: Option<String>,
    /// Identity of the node in the tree that defined it. Copies spliced in by
    /// group inlining keep the identity of their template node.
    pub source: String,
    pub kind: NodeKind,
    pub muted: bool,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
}

/// Borrowed view of one input slot: its literal and/or link.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlotInput<'a> {
    pub value: Option<&'a Literal>,
    pub link: Option<&'a Link>,
}

impl<'a> SlotInput<'a> {
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }
}

impl ShaderNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            name,
            label: None,
            kind,
            muted: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// The `{value, link}` accessor. A slot the node does not have reads as default.
    pub fn input(&self, id: &str) -> SlotInput<'_> {
        match self.input_slot(id) {
            Some(slot) => SlotInput {
                value: slot.value.as_ref(),
                link: slot.link.as_ref(),
            },
            None => SlotInput::default(),
        }
    }

    pub fn input_slot(&self, id: &str) -> Option<&InputSlot> {
        self.inputs.iter().find(|s| s.id == id)
    }

    pub fn input_slot_mut(&mut self, id: &str) -> Option<&mut InputSlot> {
        self.inputs.iter_mut().find(|s| s.id == id)
    }

    pub fn output_slot(&self, id: &str) -> Option<&OutputSlot> {
        self.outputs.iter().find(|s| s.id == id)
    }

    pub fn with_input(mut self, id: &str, socket_type: &str, value: Option<Literal>) -> Self {
        self.inputs.push(InputSlot {
            id: id.to_string(),
            socket_type: socket_type.to_string(),
            value,
            link: None,
        });
        self
    }

    pub fn with_output(mut self, id: &str, socket_type: &str, value: Option<Literal>) -> Self {
        self.outputs.push(OutputSlot {
            id: id.to_string(),
            socket_type: socket_type.to_string(),
            value,
        });
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderGraph {
    name: String,
    nodes: Vec<Option<ShaderNode>>,
}

fn socket_literal(socket: &Socket) -> Option<Literal> {
    socket.value.as_ref().and_then(Literal::from_json)
}

fn socket_type(socket: &Socket) -> String {
    socket.socket_type.clone().unwrap_or_else(|| "VALUE".to_string())
}

impl ShaderGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Builds a graph from a node tree, capturing every input's link and literal.
    ///
    /// Slots with more than one incoming link are reported as
    /// [`ExportError::MultiInputUnsupported`] and left unlinked.
    pub fn from_tree(name: &str, tree: &NodeTreeDSL, diag: &mut Diagnostics) -> Self {
        let mut graph = ShaderGraph::new(name);

        let mut used = std::collections::HashSet::new();
        let mut id_by_name: HashMap<&str, NodeId> = HashMap::new();
        for (index, n) in tree.nodes.iter().enumerate() {
            let unique = find_unique_name(&mut used, &n.id);
            if unique != n.id {
                diag.warn(format!(
                    "node tree '{}' contains duplicate node id '{}', renamed to '{unique}'",
                    tree.id, n.id
                ));
            }
            id_by_name.entry(n.id.as_str()).or_insert(NodeId(index));

            let mut node = ShaderNode::new(unique, NodeKind::parse(&n.node_type, &n.params));
            node.label = n.label.clone().filter(|l| !l.trim().is_empty());
            node.source = format!("{}/{}", tree.id, n.id);
            node.muted = n.muted;
            node.outputs = n
                .outputs
                .iter()
                .map(|s| OutputSlot {
                    id: s.id.clone(),
                    socket_type: socket_type(s),
                    value: socket_literal(s),
                })
                .collect();
            node.inputs = n
                .inputs
                .iter()
                .map(|s| InputSlot {
                    id: s.id.clone(),
                    socket_type: socket_type(s),
                    value: socket_literal(s),
                    link: None,
                })
                .collect();
            graph.nodes.push(Some(node));
        }

        for (index, n) in tree.nodes.iter().enumerate() {
            for (slot_index, socket) in n.inputs.iter().enumerate() {
                let link = match socket.links.as_slice() {
                    [] => continue,
                    [single] => single,
                    _ => {
                        diag.report(
                            Level::Warning,
                            ExportError::MultiInputUnsupported {
                                node: n.id.clone(),
                                slot: socket.id.clone(),
                            },
                        );
                        continue;
                    }
                };
                let Some(&from) = id_by_name.get(link.node_id.as_str()) else {
                    diag.warn(format!(
                        "node tree '{}': link into '{}'.'{}' refers to missing node '{}'",
                        tree.id, n.id, socket.id, link.node_id
                    ));
                    continue;
                };
                if let Some(node) = graph.nodes[index].as_mut() {
                    node.inputs[slot_index].link = Some(Link::new(from, link.port_id.clone()));
                }
            }
        }

        graph
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, node: ShaderNode) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&ShaderNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ShaderNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Looks a node up by its current name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ShaderNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i), n)))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut ShaderNode)> {
        self.nodes
            .iter_mut()
            .enumerate()
            .filter_map(|(i, n)| n.as_mut().map(|n| (NodeId(i), n)))
    }

    /// Snapshot of live ids, for passes that mutate while walking.
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn linked_node(&self, link: &Link) -> Option<&ShaderNode> {
        self.node(link.node)
    }

    /// Removes the node unconditionally; see `delete_node` for the checked variant.
    pub(crate) fn take(&mut self, id: NodeId) -> Option<ShaderNode> {
        self.nodes.get_mut(id.0).and_then(Option::take)
    }

    /// The active material/world/light output node, if any.
    pub fn active_output(&self) -> Option<NodeId> {
        self.iter()
            .find(|(_, n)| n.kind.is_active_output())
            .map(|(id, _)| id)
    }

    /// Connects `to.slot` to `from.output`, replacing any existing link.
    pub fn connect(&mut self, from: NodeId, output: &str, to: NodeId, slot: &str) {
        if let Some(input) = self.node_mut(to).and_then(|n| n.input_slot_mut(slot)) {
            input.link = Some(Link::new(from, output));
        }
    }

    /// Sorted node names; handy for comparing graph shapes.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.iter().map(|(_, n)| n.name.clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Endpoint, Node};

    fn socket(id: &str, value: Option<serde_json::Value>, links: Vec<(&str, &str)>) -> Socket {
        Socket {
            id: id.to_string(),
            socket_type: Some("RGBA".to_string()),
            value,
            links: links
                .into_iter()
                .map(|(n, p)| Endpoint {
                    node_id: n.to_string(),
                    port_id: p.to_string(),
                })
                .collect(),
        }
    }

    fn dsl_node(id: &str, ty: &str, inputs: Vec<Socket>) -> Node {
        Node {
            id: id.to_string(),
            label: None,
            node_type: ty.to_string(),
            muted: false,
            params: HashMap::new(),
            inputs,
            outputs: vec![socket("Color", None, vec![])],
        }
    }

    #[test]
    fn captures_links_and_literals() {
        let tree = NodeTreeDSL {
            id: "mat".to_string(),
            nodes: vec![
                dsl_node("rgb", "RGB", vec![]),
                dsl_node(
                    "diffuse",
                    "BsdfDiffuse",
                    vec![
                        socket("Color", Some(serde_json::json!([0.8, 0.8, 0.8, 1.0])), vec![("rgb", "Color")]),
                        socket("Roughness", Some(serde_json::json!(0.5)), vec![]),
                    ],
                ),
            ],
        };
        let mut diag = Diagnostics::new();
        let graph = ShaderGraph::from_tree("mat", &tree, &mut diag);
        assert!(diag.is_empty());

        let diffuse = graph.node(graph.find("diffuse").unwrap()).unwrap();
        let color = diffuse.input("Color");
        assert_eq!(color.link, Some(&Link::new(graph.find("rgb").unwrap(), "Color")));
        assert_eq!(color.value, Some(&Literal::Vector(vec![0.8, 0.8, 0.8, 1.0])));
        assert_eq!(diffuse.input("Roughness").value, Some(&Literal::Scalar(0.5)));
        assert!(diffuse.input("Missing").value.is_none());
        assert_eq!(diffuse.source, "mat/diffuse");
    }

    #[test]
    fn multi_input_slots_stay_unlinked() {
        let tree = NodeTreeDSL {
            id: "mat".to_string(),
            nodes: vec![
                dsl_node("a", "RGB", vec![]),
                dsl_node("b", "RGB", vec![]),
                dsl_node(
                    "diffuse",
                    "BsdfDiffuse",
                    vec![socket("Color", None, vec![("a", "Color"), ("b", "Color")])],
                ),
            ],
        };
        let mut diag = Diagnostics::new();
        let graph = ShaderGraph::from_tree("mat", &tree, &mut diag);
        let diffuse = graph.node(graph.find("diffuse").unwrap()).unwrap();
        assert!(!diffuse.input("Color").is_linked());
        assert!(diag.any_error(|e| matches!(e, ExportError::MultiInputUnsupported { .. })));
    }

    #[test]
    fn literal_black_check() {
        assert!(Literal::Vector(vec![0.0, 0.0, 0.0, 1.0]).is_black());
        assert!(!Literal::Vector(vec![0.0, 0.1, 0.0]).is_black());
        assert!(Literal::Scalar(0.0).is_black());
        assert_eq!(Literal::Scalar(2.0).as_vec3(), Some([2.0, 2.0, 2.0]));
    }
}
