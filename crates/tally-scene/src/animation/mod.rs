//! Frame scheduling and count interpolation.
//!
//! - **FrameLoop**: one-shot frame callbacks, run in request order on each tick
//! - **CountRun**: one animation from a start bound to an end bound
//! - **RunSlot / RunToken**: newest run wins; older runs stop on their next frame

pub mod frame;
pub mod run;

pub use frame::FrameLoop;
pub use run::{CountFrame, CountRun, Direction, RunSlot, RunToken, interpolate, progress};
