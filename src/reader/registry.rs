//! Page element registry

use std::collections::HashMap;

use crate::model::PageId;

/// Opaque handle to a mounted page element, issued by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

/// Lookup table from page identifier to its on-screen element
///
/// The registry does not own elements. It is filled as pages mount and
/// cleared when a session is torn down.
#[derive(Debug, Default)]
pub struct PageElementRegistry {
    elements: HashMap<PageId, ElementHandle>,
}

impl PageElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a handle, or remove the entry when `element` is `None`
    ///
    /// Returns whether the mapping changed.
    pub fn register(&mut self, id: PageId, element: Option<ElementHandle>) -> bool {
        match element {
            Some(handle) => self.elements.insert(id, handle) != Some(handle),
            None => self.elements.remove(&id).is_some(),
        }
    }

    pub fn get(&self, id: &PageId) -> Option<ElementHandle> {
        self.elements.get(id).copied()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All entries, ordered by identifier
    pub fn snapshot(&self) -> Vec<(PageId, ElementHandle)> {
        let mut entries: Vec<_> = self.elements.iter().map(|(id, h)| (*id, *h)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}
