//! Unique name minting scoped to one export run.

use std::collections::HashSet;

/// Returns `name` if unused, otherwise the first free `name.NNN` (starting at `.000`).
/// The returned name is recorded in `used`.
pub fn find_unique_name(used: &mut HashSet<String>, name: &str) -> String {
    let mut unique = name.to_string();
    let mut index = 0u32;
    while used.contains(&unique) {
        unique = format!("{name}.{index:03}");
        index += 1;
    }
    used.insert(unique.clone());
    unique
}

/// Replace anything outside `[a-zA-Z0-9_\- ]` with `_`.
pub fn sanitize_id(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == ' ' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Trims a user label and replaces control characters with spaces. Empty
/// results fall back to `fallback`.
pub fn sanitize_label(label: &str, fallback: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Set of ids already handed out during one export.
#[derive(Clone, Debug, Default)]
pub struct NameArena {
    used: HashSet<String>,
}

impl NameArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a sanitized, collision-suffixed id.
    pub fn unique(&mut self, name: &str) -> String {
        find_unique_name(&mut self.used, &sanitize_id(name))
    }

    /// Marks a name as taken without minting.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }
}
