//! Attributed element tree produced by translation, and its text serialization.

use std::fmt;

use crate::utils::fmt_float;

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(v) => f.write_str(&fmt_float(*v)),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

/// Index of the registry entry an element was exported under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Anchor(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub struct IrNode {
    pub tag: String,
    attributes: Vec<(String, AttrValue)>,
    pub children: Vec<IrNode>,
    pub(crate) anchor: Option<Anchor>,
}

fn attr_rank(key: &str) -> usize {
    match key {
        "name" => 0,
        "id" => 1,
        _ => 2,
    }
}

fn escape_attr(value: &str) -> String {
    if !value.contains(['&', '"', '<']) {
        return value.to_string();
    }
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

impl IrNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            anchor: None,
        }
    }

    /// Builder form of [`IrNode::set`].
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets an attribute, keeping its original position if it already exists.
    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> &[(String, AttrValue)] {
        &self.attributes
    }

    pub fn set_name(&mut self, name: &str) {
        self.set("name", name);
    }

    /// Appends a child and returns it for further building.
    pub fn add_child(&mut self, child: IrNode) -> &mut IrNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn add_child_named(&mut self, mut child: IrNode, name: &str) -> &mut IrNode {
        child.set_name(name);
        self.add_child(child)
    }

    pub fn add_children(&mut self, children: impl IntoIterator<Item = IrNode>) -> &mut Self {
        self.children.extend(children);
        self
    }

    pub fn find_child(&self, tag: &str) -> Option<&IrNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub(crate) fn visit_mut(&mut self, f: &mut impl FnMut(&mut IrNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// Renders the element at `indent` levels (two spaces each). `name` and `id`
    /// come first; other attributes keep insertion order.
    pub fn dump(&self, indent: usize) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, indent);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        out.push_str(&pad);
        out.push('<');
        out.push_str(&self.tag);

        let mut attrs: Vec<&(String, AttrValue)> = self.attributes.iter().collect();
        attrs.sort_by_key(|(k, _)| attr_rank(k));
        for (key, value) in attrs {
            out.push_str(&format!(" {key}=\"{}\"", escape_attr(&value.to_string())));
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            child.dump_into(out, indent + 1);
            out.push('\n');
        }
        out.push_str(&pad);
        out.push_str(&format!("</{}>", self.tag));
    }
}

/// Top-level sequence of elements with no wrapping element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IrDocument {
    pub children: Vec<IrNode>,
}

impl IrDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child(&mut self, child: IrNode) -> &mut IrNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn add_children(&mut self, children: impl IntoIterator<Item = IrNode>) {
        self.children.extend(children);
    }

    pub(crate) fn visit_mut(&mut self, f: &mut impl FnMut(&mut IrNode)) {
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            out.push_str(&child.dump(0));
            out.push('\n');
        }
        out
    }
}
