//! Toggle-driven counters for tally pages.
//!
//! A counter owns a display element and listens to a boolean control. Each
//! time the control changes, the display counts from one bound to the other,
//! one frame at a time.
//!
//! # Architecture
//!
//! ```text
//! Page (document + frame loop + settings)
//!   ├── auto_init: prune detached entries, construct missing counters
//!   └── ToggleCount instances
//!         ├── change listener on the bound control
//!         └── CountRun per animation, stepped by the FrameLoop
//!
//! Registry (thread-local): element -> instance
//! ```

pub mod animation;
pub mod bootstrap;
pub mod page;
pub mod registry;
pub mod toggle_count;

pub use animation::{CountFrame, CountRun, Direction, FrameLoop, RunSlot, RunToken};
pub use bootstrap::{AutoInitReport, auto_init};
pub use page::Page;
pub use registry::{Registry, RegistryEntry};
pub use toggle_count::{CounterState, ToggleCount, registered, with_collection};

pub use tally_config::{ConfigurationError, Target, ToggleCountOptions};
