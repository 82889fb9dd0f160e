//! At-most-once translation of shared source entities.
//!
//! The first request for an entity gets the real elements; every later request
//! gets `ref` elements pointing at them by id. Ids are minted lazily on the first
//! reference and stamped onto the real elements by [`ExportRegistry::resolve_ids`]
//! once the document is assembled.

use std::collections::HashMap;

use crate::naming::NameArena;

use super::ir::{Anchor, AttrValue, IrDocument, IrNode};

/// Structural kind of a source entity; same-named entities of different kinds
/// never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Material,
    World,
    Mesh,
    Image,
    ShaderNode,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub identity: String,
    pub kind: EntityKind,
}

impl EntityKey {
    pub fn new(identity: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            identity: identity.into(),
            kind,
        }
    }
}

/// Translation results the registry can cache: one element or a list.
pub trait Exportable: Sized {
    fn nodes_mut(&mut self) -> Vec<&mut IrNode>;
    fn from_refs(refs: Vec<IrNode>) -> Self;
}

impl Exportable for IrNode {
    fn nodes_mut(&mut self) -> Vec<&mut IrNode> {
        vec![self]
    }

    fn from_refs(refs: Vec<IrNode>) -> Self {
        refs.into_iter().next().unwrap_or_else(|| IrNode::new("ref"))
    }
}

impl Exportable for Vec<IrNode> {
    fn nodes_mut(&mut self) -> Vec<&mut IrNode> {
        self.iter_mut().collect()
    }

    fn from_refs(refs: Vec<IrNode>) -> Self {
        refs
    }
}

/// One real element handed out by the registry.
#[derive(Clone, Debug)]
struct Canonical {
    name: Option<String>,
    id: Option<String>,
}

#[derive(Clone, Debug)]
struct Entry {
    display_name: String,
    elements: Vec<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ExportRegistry {
    entries: HashMap<EntityKey, Entry>,
    canonical: Vec<Canonical>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `ref` elements for an entity exported earlier, or `None` on first sight.
    /// Mints the element ids from the entity's display name when needed.
    pub fn references(&mut self, key: &EntityKey, names: &mut NameArena) -> Option<Vec<IrNode>> {
        let entry = self.entries.get(key)?;
        let mut refs = Vec::with_capacity(entry.elements.len());
        for &index in &entry.elements {
            let canonical = &mut self.canonical[index];
            let id = canonical
                .id
                .get_or_insert_with(|| names.unique(&entry.display_name))
                .clone();
            let mut node = IrNode::new("ref");
            if let Some(name) = &canonical.name {
                node.set("name", name.as_str());
            }
            node.set("id", id);
            refs.push(node);
        }
        Some(refs)
    }

    /// Records the result of the first translation of `key`. Elements already
    /// anchored (exported under another key) share that entry's id.
    pub fn store<T: Exportable>(&mut self, key: EntityKey, display_name: &str, result: &mut T) {
        let mut elements = Vec::new();
        for node in result.nodes_mut() {
            let index = match node.anchor {
                Some(Anchor(index)) => index,
                None => {
                    let id = match node.get("id") {
                        Some(AttrValue::Str(id)) => Some(id.clone()),
                        Some(other) => Some(other.to_string()),
                        None => None,
                    };
                    let name = node.get("name").map(|n| n.to_string());
                    self.canonical.push(Canonical { name, id });
                    let index = self.canonical.len() - 1;
                    node.anchor = Some(Anchor(index));
                    index
                }
            };
            elements.push(index);
        }
        self.entries.insert(
            key,
            Entry {
                display_name: display_name.to_string(),
                elements,
            },
        );
    }

    /// Stamps minted ids onto the real elements that were referenced. Elements
    /// that already carry an id keep it.
    pub fn resolve_ids(&self, document: &mut IrDocument) {
        document.visit_mut(&mut |node: &mut IrNode| {
            let Some(Anchor(index)) = node.anchor else {
                return;
            };
            if node.has("id") {
                return;
            }
            if let Some(id) = self.canonical.get(index).and_then(|c| c.id.as_ref()) {
                node.set("id", id.as_str());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture() -> IrNode {
        IrNode::new("texture").with("type", "image").with("filename", "textures/wood.png")
    }

    #[test]
    fn second_request_gets_reference() {
        let mut registry = ExportRegistry::new();
        let mut names = NameArena::new();
        let key = EntityKey::new("mat/Image Texture", EntityKind::ShaderNode);

        assert!(registry.references(&key, &mut names).is_none());
        let mut first = texture();
        registry.store(key.clone(), "Image Texture", &mut first);

        let refs = registry.references(&key, &mut names).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].dump(0), r#"<ref id="Image Texture"/>"#);

        // A later reference reuses the id instead of minting a new one.
        let again = registry.references(&key, &mut names).unwrap();
        assert_eq!(again, refs);

        let mut doc = IrDocument::new();
        doc.add_child(first);
        registry.resolve_ids(&mut doc);
        assert_eq!(doc.children[0].get("id"), Some(&AttrValue::Str("Image Texture".into())));
    }

    #[test]
    fn kinds_disambiguate_same_identity() {
        let mut registry = ExportRegistry::new();
        let mut names = NameArena::new();
        let mut mat = vec![IrNode::new("bsdf")];
        registry.store(EntityKey::new("Wood", EntityKind::Material), "Wood", &mut mat);
        assert!(registry
            .references(&EntityKey::new("Wood", EntityKind::Mesh), &mut names)
            .is_none());
    }

    #[test]
    fn lists_reference_each_element() {
        let mut registry = ExportRegistry::new();
        let mut names = NameArena::new();
        let key = EntityKey::new("Lamp", EntityKind::Material);
        let mut result = vec![
            IrNode::new("bsdf").with("type", "principled"),
            IrNode::new("emission").with("type", "lambertian"),
        ];
        registry.store(key.clone(), "Lamp", &mut result);

        let refs = registry.references(&key, &mut names).unwrap();
        let ids: Vec<String> = refs.iter().map(|r| r.get("id").unwrap().to_string()).collect();
        assert_eq!(ids, vec!["Lamp", "Lamp.000"]);
    }

    #[test]
    fn referenced_name_is_carried_over() {
        let mut registry = ExportRegistry::new();
        let mut names = NameArena::new();
        let key = EntityKey::new("n", EntityKind::ShaderNode);
        let mut named = texture().with("name", "albedo");
        registry.store(key.clone(), "Tex", &mut named);
        let refs = registry.references(&key, &mut names).unwrap();
        assert_eq!(refs[0].dump(0), r#"<ref name="albedo" id="Tex"/>"#);
    }

    #[test]
    fn unreferenced_elements_get_no_id() {
        let mut registry = ExportRegistry::new();
        let mut first = texture();
        registry.store(EntityKey::new("x", EntityKind::Image), "x", &mut first);
        let mut doc = IrDocument::new();
        doc.add_child(first);
        registry.resolve_ids(&mut doc);
        assert!(!doc.children[0].has("id"));
    }
}
