//! Page-load initialisation.

use tally_config::ConfigurationError;
use tally_dom::ElementId;
use tracing::{debug, warn};

use crate::page::Page;
use crate::toggle_count::{ToggleCount, with_collection};

/// Outcome of one [`auto_init`] pass.
#[derive(Debug, Default)]
pub struct AutoInitReport {
    /// Registry entries dropped because their element left the document.
    pub pruned: usize,
    /// Instances constructed by this pass.
    pub created: Vec<ToggleCount>,
    /// Elements whose construction failed, with the reason.
    pub failures: Vec<(ElementId, ConfigurationError)>,
}

/// Bring the registry in line with `page`.
///
/// Entries for elements of this page that are no longer attached are pruned
/// (entries belonging to other documents are left alone). Then every element
/// carrying the binding attribute, without the opt-out class, and not already
/// registered gets a new instance. One element failing does not stop the scan.
pub fn auto_init(page: &Page) -> AutoInitReport {
    let document = page.document();
    let settings = page.settings();

    let pruned = with_collection(|c| {
        c.prune_detached(|element| !document.owns(element) || document.contains(element))
    });

    let mut report = AutoInitReport {
        pruned,
        ..Default::default()
    };

    let selector = format!("[{}]", settings.attribute);
    for element in document.query_selector_all(&selector) {
        if document.has_class(element, &settings.prevent_init_class) {
            continue;
        }
        if with_collection(|c| c.contains(element)) {
            continue;
        }
        match ToggleCount::new(page, element, None) {
            Ok(instance) => report.created.push(instance),
            Err(err) => {
                warn!(
                    id = %document.attribute(element, "id").unwrap_or_default(),
                    error = %err,
                    "toggle count failed to initialise"
                );
                report.failures.push((element, err));
            }
        }
    }

    debug!(
        pruned = report.pruned,
        created = report.created.len(),
        failed = report.failures.len(),
        "toggle count auto init"
    );
    report
}
