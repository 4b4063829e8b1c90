use std::rc::Rc;

use tally_config::{TallyConfig, ToggleCountSettings};
use tally_dom::Document;

use crate::animation::FrameLoop;

/// Everything a counter needs from its host: the document it binds to, the
/// frame loop that drives its animations, and the binding settings.
#[derive(Debug, Clone)]
pub struct Page {
    document: Document,
    frames: FrameLoop,
    settings: Rc<ToggleCountSettings>,
}

impl Page {
    pub fn new(document: Document, frames: FrameLoop, settings: ToggleCountSettings) -> Self {
        Self {
            document,
            frames,
            settings: Rc::new(settings),
        }
    }

    /// A page with its own frame loop and the binding settings from `config`.
    pub fn from_config(document: Document, config: &TallyConfig) -> Self {
        Self::new(document, FrameLoop::new(), config.toggle_count.clone())
    }

    /// Parse `markup` into a page with default settings.
    pub fn parse(markup: &str) -> Self {
        Self::new(
            Document::parse(markup),
            FrameLoop::new(),
            ToggleCountSettings::default(),
        )
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn frames(&self) -> &FrameLoop {
        &self.frames
    }

    pub fn settings(&self) -> &ToggleCountSettings {
        &self.settings
    }
}
