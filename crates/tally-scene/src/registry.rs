//! Ordered element -> instance collection.
//!
//! The registry is deliberately dumb: it appends, scans linearly and filters.
//! Keeping one instance per element is the bootstrap's job.

use tally_dom::ElementId;

/// One registered instance.
#[derive(Debug, Clone)]
pub struct RegistryEntry<T> {
    /// The element's `id` attribute, or its insertion index when it has none.
    pub id: String,
    pub element: ElementId,
    pub instance: T,
}

#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<RegistryEntry<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. No uniqueness check is made.
    pub fn insert(&mut self, id: Option<String>, element: ElementId, instance: T) {
        let id = id.unwrap_or_else(|| self.entries.len().to_string());
        self.entries.push(RegistryEntry {
            id,
            element,
            instance,
        });
    }

    /// First entry registered for `element`.
    pub fn find_by_element(&self, element: ElementId) -> Option<&RegistryEntry<T>> {
        self.entries.iter().find(|e| e.element == element)
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.find_by_element(element).is_some()
    }

    /// Remove every entry for `element`; returns how many were removed.
    pub fn remove(&mut self, element: ElementId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.element != element);
        before - self.entries.len()
    }

    /// Keep only entries whose element satisfies `is_attached`; returns how
    /// many were dropped.
    pub fn prune_detached(&mut self, mut is_attached: impl FnMut(ElementId) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| is_attached(e.element));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry<T>> {
        self.entries.iter()
    }
}
