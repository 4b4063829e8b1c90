//! Toggle-count behaviour.
//!
//! A [`ToggleCount`] binds a display element to a boolean control. When the
//! control becomes checked the display counts `min -> max`; when it becomes
//! unchecked it counts `max -> min`. Values are written once per frame as
//! `floor(progress * (to - from) + from)`.
//!
//! # Lifecycle
//!
//! ```text
//! new()  ── control resolved? ── no ──> Err(MissingTarget), nothing registered
//!             │ yes
//!             ▼
//! init(): register ─> checked? write max ─> attach change listener
//!             ▼
//! Idle <──── run finished ──── Animating(direction)
//!   └──── change event / count_up / count_down ────┘
//!             ▼
//! destroy(): detach listener ─> unregister
//! ```
//!
//! A change that arrives mid-animation starts a fresh run from the bound, not
//! from the value on screen. The previous run notices on its next frame that
//! its token was superseded and stops without writing.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tally_config::{ConfigurationError, Target, ToggleCountOptions};
use tally_dom::{ChangeEvent, ElementId, ListenerId};
use tracing::{debug, trace};

use crate::animation::{CountRun, Direction, RunSlot};
use crate::bootstrap::{self, AutoInitReport};
use crate::page::Page;
use crate::registry::{Registry, RegistryEntry};

thread_local! {
    static COLLECTION: RefCell<Registry<ToggleCount>> = RefCell::new(Registry::new());
}

/// Run `f` against the toggle-count registry of the current (UI) thread.
///
/// `f` must not call back into the registry.
pub fn with_collection<R>(f: impl FnOnce(&mut Registry<ToggleCount>) -> R) -> R {
    COLLECTION.with(|collection| f(&mut collection.borrow_mut()))
}

/// Snapshot of every registered instance, in registration order.
pub fn registered() -> Vec<ToggleCount> {
    with_collection(|c| c.iter().map(|e| e.instance.clone()).collect())
}

/// Animation state of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    Idle,
    Animating(Direction),
}

#[derive(Debug)]
struct Inner {
    page: Page,
    element: ElementId,
    control: ElementId,
    min: i64,
    max: i64,
    duration_ms: u64,
    checked: Cell<bool>,
    listener: Cell<Option<ListenerId>>,
    state: Cell<CounterState>,
    runs: RunSlot,
}

/// Handle to a live counter. Clones share the same instance.
#[derive(Debug, Clone)]
pub struct ToggleCount {
    inner: Rc<Inner>,
}

impl PartialEq for ToggleCount {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ToggleCount {}

impl ToggleCount {
    /// Bind a counter to `element`.
    ///
    /// Options come from the element's binding attribute, with `options`
    /// overriding it key by key. A selector target is looked up once, here.
    ///
    /// # Errors
    /// * [`ConfigurationError::MalformedOptions`] if the binding attribute is not valid JSON
    /// * [`ConfigurationError::MissingTarget`] if no control could be resolved;
    ///   the element is then left untouched and unregistered
    pub fn new(
        page: &Page,
        element: ElementId,
        options: Option<ToggleCountOptions>,
    ) -> Result<Self, ConfigurationError> {
        let document = page.document();
        let settings = page.settings();

        let data = match document.attribute(element, &settings.attribute) {
            Some(raw) => ToggleCountOptions::from_json(&raw)?,
            None => ToggleCountOptions::default(),
        };
        let merged = match options {
            Some(overrides) => data.merge(overrides),
            None => data,
        };
        let resolved = merged.resolve(settings.default_duration_ms);

        let control = resolved
            .target
            .as_ref()
            .and_then(|target| resolve_target(page, target))
            .ok_or(ConfigurationError::MissingTarget)?;

        let instance = Self {
            inner: Rc::new(Inner {
                page: page.clone(),
                element,
                control,
                min: resolved.min,
                max: resolved.max,
                duration_ms: resolved.duration_ms,
                checked: Cell::new(document.is_checked(control)),
                listener: Cell::new(None),
                state: Cell::new(CounterState::Idle),
                runs: RunSlot::new(),
            }),
        };
        instance.init();
        Ok(instance)
    }

    fn init(&self) {
        let inner = &self.inner;
        let document = inner.page.document();

        let id = document
            .attribute(inner.element, "id")
            .filter(|id| !id.is_empty());
        with_collection(|c| c.insert(id, inner.element, self.clone()));

        if inner.checked.get() {
            document.set_text(inner.element, inner.max.to_string());
        }

        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let listener = document.add_change_listener(inner.control, move |event| {
            if let Some(inner) = weak.upgrade() {
                ToggleCount { inner }.on_control_change(event);
            }
        });
        inner.listener.set(listener);

        debug!(
            min = inner.min,
            max = inner.max,
            duration_ms = inner.duration_ms,
            checked = inner.checked.get(),
            "toggle count registered"
        );
    }

    /// Follows the control's reported state rather than flipping `checked`,
    /// so the two cannot drift apart.
    fn on_control_change(&self, event: &ChangeEvent) {
        self.inner.checked.set(event.checked);
        if event.checked {
            self.count_up();
        } else {
            self.count_down();
        }
    }

    /// Count `min -> max`, whatever the control's state.
    pub fn count_up(&self) {
        self.animate(Direction::Up);
    }

    /// Count `max -> min`, whatever the control's state.
    pub fn count_down(&self) {
        self.animate(Direction::Down);
    }

    fn animate(&self, direction: Direction) {
        let inner = &self.inner;
        let (from, to) = match direction {
            Direction::Up => (inner.min, inner.max),
            Direction::Down => (inner.max, inner.min),
        };
        let run = CountRun::new(from, to, inner.duration_ms, inner.runs.issue());
        inner.state.set(CounterState::Animating(direction));
        trace!(generation = run.token().generation(), from, to, "count run started");
        self.request_step(run);
    }

    fn request_step(&self, run: CountRun) {
        let this = self.clone();
        self.inner
            .page
            .frames()
            .request_frame(move |timestamp| this.step(run, timestamp));
    }

    fn step(&self, mut run: CountRun, timestamp: f64) {
        if !run.is_current() {
            trace!(generation = run.token().generation(), "count run superseded");
            return;
        }

        let frame = run.advance(timestamp);
        self.inner
            .page
            .document()
            .set_text(self.inner.element, frame.value.to_string());

        if frame.finished {
            self.inner.state.set(CounterState::Idle);
            trace!(value = frame.value, "count run finished");
        } else {
            self.request_step(run);
        }
    }

    /// Detach the change listener and unregister. Safe to call more than once.
    ///
    /// A run already in flight keeps going until it finishes.
    pub fn destroy(&self) {
        if let Some(listener) = self.inner.listener.take() {
            self.inner
                .page
                .document()
                .remove_change_listener(self.inner.control, listener);
        }
        let removed = with_collection(|c| c.remove(self.inner.element));
        debug!(removed, "toggle count destroyed");
    }

    /// Registered instance for `target` (an element or a selector).
    pub fn get_instance(page: &Page, target: impl Into<Target>) -> Option<Self> {
        let element = resolve_target(page, &target.into())?;
        with_collection(|c| c.find_by_element(element).map(|e| e.instance.clone()))
    }

    /// Registry entry for `target`, including its id.
    pub fn get_entry(page: &Page, target: impl Into<Target>) -> Option<RegistryEntry<Self>> {
        let element = resolve_target(page, &target.into())?;
        with_collection(|c| c.find_by_element(element).cloned())
    }

    /// See [`bootstrap::auto_init`].
    pub fn auto_init(page: &Page) -> AutoInitReport {
        bootstrap::auto_init(page)
    }

    pub fn element(&self) -> ElementId {
        self.inner.element
    }

    pub fn control(&self) -> ElementId {
        self.inner.control
    }

    pub fn min(&self) -> i64 {
        self.inner.min
    }

    pub fn max(&self) -> i64 {
        self.inner.max
    }

    pub fn duration_ms(&self) -> u64 {
        self.inner.duration_ms
    }

    /// Control state as of the last observed change.
    pub fn is_checked(&self) -> bool {
        self.inner.checked.get()
    }

    pub fn state(&self) -> CounterState {
        self.inner.state.get()
    }

    pub fn is_registered(&self) -> bool {
        with_collection(|c| {
            c.find_by_element(self.inner.element)
                .map_or(false, |e| e.instance == *self)
        })
    }

    /// Text currently shown by the display element.
    pub fn displayed(&self) -> Option<String> {
        self.inner.page.document().text(self.inner.element)
    }
}

fn resolve_target(page: &Page, target: &Target) -> Option<ElementId> {
    let document = page.document();
    match target {
        Target::Element(element) => document.owns(*element).then_some(*element),
        Target::Selector(selector) => document.query_selector(selector),
    }
}
