//! Shared, single-threaded document handle.
//!
//! A [`Document`] is cheap to clone; every clone refers to the same page. The
//! parsed tree is immutable after load. Everything a behaviour may change at
//! runtime is tracked per element:
//!
//! - text content overrides (`set_text`)
//! - checked state of boolean controls (`set_checked`, `toggle`)
//! - attachment (`detach` removes an element and its subtree from queries)
//! - change listeners (`add_change_listener`, `dispatch_change`)

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use tracing::{trace, warn};

use crate::events::{ChangeEvent, ChangeListener, ListenerId};

/// Unique identifier of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

impl DocumentId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of an element. Two handles compare equal only when they name the
/// same node of the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    document: DocumentId,
    node: NodeId,
}

impl ElementId {
    /// The document this element belongs to.
    pub fn document(&self) -> DocumentId {
        self.document
    }
}

#[derive(Default)]
struct ElementState {
    text: Option<String>,
    checked: Option<bool>,
    detached: bool,
    listeners: Vec<(ListenerId, ChangeListener)>,
}

struct DocumentInner {
    id: DocumentId,
    html: Html,
    states: HashMap<NodeId, ElementState>,
}

impl DocumentInner {
    fn element(&self, element: ElementId) -> Option<ElementRef<'_>> {
        if element.document != self.id {
            return None;
        }
        ElementRef::wrap(self.html.tree.get(element.node)?)
    }

    fn is_detached(&self, node: NodeId) -> bool {
        self.states.get(&node).map_or(false, |s| s.detached)
    }

    fn handle(&self, node: NodeId) -> ElementId {
        ElementId {
            document: self.id,
            node,
        }
    }

    fn state_mut(&mut self, element: ElementId) -> Option<&mut ElementState> {
        self.element(element)?;
        Some(self.states.entry(element.node).or_default())
    }
}

/// Handle to a parsed page.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("id", &self.id()).finish()
    }
}

impl Document {
    /// Parse a full HTML document.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let id = DocumentId::next();
        trace!(document = id.0, errors = html.errors.len(), "parsed document");
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                id,
                html,
                states: HashMap::new(),
            })),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.inner.borrow().id
    }

    /// Returns true if `element` was created by this document, attached or not.
    pub fn owns(&self, element: ElementId) -> bool {
        self.inner.borrow().element(element).is_some()
    }

    /// Returns true if `element` belongs to this document and is still attached.
    pub fn contains(&self, element: ElementId) -> bool {
        let inner = self.inner.borrow();
        inner.element(element).is_some() && !inner.is_detached(element.node)
    }

    /// First attached element matching `selector`, in document order.
    ///
    /// An invalid selector matches nothing.
    pub fn query_selector(&self, selector: &str) -> Option<ElementId> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// All attached elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(selector = %selector, error = ?err, "invalid selector");
                return Vec::new();
            }
        };
        let inner = self.inner.borrow();
        inner
            .html
            .select(&parsed)
            .map(|el| el.id())
            .filter(|node| !inner.is_detached(*node))
            .map(|node| inner.handle(node))
            .collect()
    }

    pub fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .element(element)?
            .value()
            .attr(name)
            .map(str::to_string)
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        let inner = self.inner.borrow();
        inner
            .element(element)
            .map_or(false, |el| el.value().classes().any(|c| c == class))
    }

    /// Current text content: the last value written with [`Document::set_text`],
    /// or the text parsed from markup.
    pub fn text(&self, element: ElementId) -> Option<String> {
        let inner = self.inner.borrow();
        let el = inner.element(element)?;
        if let Some(text) = inner.states.get(&element.node).and_then(|s| s.text.clone()) {
            return Some(text);
        }
        Some(el.text().collect())
    }

    /// Replace the text content of `element`. Detached elements still accept
    /// writes; they are just not reachable from queries.
    pub fn set_text(&self, element: ElementId, text: impl Into<String>) {
        let mut inner = self.inner.borrow_mut();
        if let Some(state) = inner.state_mut(element) {
            state.text = Some(text.into());
        }
    }

    /// Checked state; defaults to the presence of the `checked` attribute.
    pub fn is_checked(&self, element: ElementId) -> bool {
        let inner = self.inner.borrow();
        let Some(el) = inner.element(element) else {
            return false;
        };
        inner
            .states
            .get(&element.node)
            .and_then(|s| s.checked)
            .unwrap_or_else(|| el.value().attr("checked").is_some())
    }

    /// Set the checked state without notifying listeners.
    pub fn set_checked(&self, element: ElementId, checked: bool) {
        let mut inner = self.inner.borrow_mut();
        if let Some(state) = inner.state_mut(element) {
            state.checked = Some(checked);
        }
    }

    /// Flip the checked state and dispatch a change event, the way a user
    /// click on a checkbox does. Returns the new state.
    pub fn toggle(&self, element: ElementId) -> bool {
        let checked = !self.is_checked(element);
        self.set_checked(element, checked);
        self.dispatch_change(element);
        checked
    }

    /// Invoke every change listener attached to `element`.
    ///
    /// Listeners run after the document borrow is released, so they may read
    /// and write the document (including detaching themselves).
    pub fn dispatch_change(&self, element: ElementId) {
        let listeners: Vec<ChangeListener> = {
            let inner = self.inner.borrow();
            match inner.states.get(&element.node) {
                Some(state) if inner.element(element).is_some() => {
                    state.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
                }
                _ => Vec::new(),
            }
        };
        let event = ChangeEvent {
            target: element,
            checked: self.is_checked(element),
        };
        trace!(listeners = listeners.len(), checked = event.checked, "dispatching change");
        for listener in listeners {
            listener(&event);
        }
    }

    /// Attach a change listener. Returns `None` when `element` is not part of
    /// this document.
    pub fn add_change_listener(
        &self,
        element: ElementId,
        listener: impl Fn(&ChangeEvent) + 'static,
    ) -> Option<ListenerId> {
        let mut inner = self.inner.borrow_mut();
        let state = inner.state_mut(element)?;
        let id = ListenerId::next();
        state.listeners.push((id, Rc::new(listener)));
        Some(id)
    }

    /// Detach a listener by id. Unknown ids are ignored; returns whether a
    /// listener was removed.
    pub fn remove_change_listener(&self, element: ElementId, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(state) = inner.state_mut(element) else {
            return false;
        };
        let before = state.listeners.len();
        state.listeners.retain(|(lid, _)| *lid != id);
        before != state.listeners.len()
    }

    pub fn listener_count(&self, element: ElementId) -> usize {
        self.inner
            .borrow()
            .states
            .get(&element.node)
            .map_or(0, |s| s.listeners.len())
    }

    /// Remove `element` and its subtree from the page. Handles stay valid but
    /// [`Document::contains`] and selector queries no longer see them.
    pub fn detach(&self, element: ElementId) {
        let mut inner = self.inner.borrow_mut();
        let nodes: Vec<NodeId> = match inner.element(element) {
            Some(el) => el.descendants().map(|n| n.id()).collect(),
            None => return,
        };
        for node in nodes {
            inner.states.entry(node).or_default().detached = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const PAGE: &str = r#"
        <html><body>
          <input type="checkbox" id="plan" checked>
          <input type="checkbox" id="other">
          <section id="box">
            <span id="price" class="price big" data-role="count">19</span>
          </section>
        </body></html>
    "#;

    #[test]
    fn query_and_attributes() {
        let doc = Document::parse(PAGE);
        let price = doc.query_selector("#price").expect("price element");
        assert_eq!(doc.attribute(price, "data-role").as_deref(), Some("count"));
        assert!(doc.has_class(price, "big"));
        assert!(!doc.has_class(price, "small"));
        assert_eq!(doc.text(price).as_deref(), Some("19"));
        assert_eq!(doc.query_selector_all("input").len(), 2);
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let doc = Document::parse(PAGE);
        assert!(doc.query_selector("[[").is_none());
        assert!(doc.query_selector("#missing").is_none());
    }

    #[test]
    fn checked_defaults_to_attribute() {
        let doc = Document::parse(PAGE);
        let plan = doc.query_selector("#plan").unwrap();
        let other = doc.query_selector("#other").unwrap();
        assert!(doc.is_checked(plan));
        assert!(!doc.is_checked(other));

        doc.set_checked(plan, false);
        assert!(!doc.is_checked(plan));
    }

    #[test]
    fn set_text_overrides_markup() {
        let doc = Document::parse(PAGE);
        let price = doc.query_selector("#price").unwrap();
        doc.set_text(price, "42");
        assert_eq!(doc.text(price).as_deref(), Some("42"));
    }

    #[test]
    fn toggle_dispatches_to_listeners() {
        let doc = Document::parse(PAGE);
        let other = doc.query_selector("#other").unwrap();
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        let id = doc
            .add_change_listener(other, move |event| sink.set(Some(event.checked)))
            .unwrap();

        assert!(doc.toggle(other));
        assert_eq!(seen.get(), Some(true));

        assert!(doc.remove_change_listener(other, id));
        assert!(!doc.remove_change_listener(other, id));
        seen.set(None);
        doc.toggle(other);
        assert_eq!(seen.get(), None);
    }

    #[test]
    fn listener_may_touch_document() {
        let doc = Document::parse(PAGE);
        let other = doc.query_selector("#other").unwrap();
        let price = doc.query_selector("#price").unwrap();
        let handle = doc.clone();
        doc.add_change_listener(other, move |_| handle.set_text(price, "changed"))
            .unwrap();
        doc.toggle(other);
        assert_eq!(doc.text(price).as_deref(), Some("changed"));
    }

    #[test]
    fn detach_hides_subtree() {
        let doc = Document::parse(PAGE);
        let section = doc.query_selector("#box").unwrap();
        let price = doc.query_selector("#price").unwrap();
        doc.detach(section);

        assert!(doc.owns(price));
        assert!(!doc.contains(price));
        assert!(doc.query_selector("#price").is_none());
        doc.set_text(price, "still writable");
        assert_eq!(doc.text(price).as_deref(), Some("still writable"));
    }

    #[test]
    fn handles_are_scoped_to_their_document() {
        let a = Document::parse(PAGE);
        let b = Document::parse(PAGE);
        let price_a = a.query_selector("#price").unwrap();
        let price_b = b.query_selector("#price").unwrap();
        assert_ne!(price_a, price_b);
        assert!(!b.owns(price_a));
        assert!(!b.contains(price_a));
        assert!(b.text(price_a).is_none());
        assert!(b.add_change_listener(price_a, |_| {}).is_none());
    }
}
