//! Host-driven frame loop.
//!
//! Callbacks are one-shot, like a browser's animation-frame requests: a
//! callback that wants another frame requests it again. Callbacks requested
//! while a tick is running are deferred to the next tick.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{trace, warn};

type FrameCallback = Box<dyn FnOnce(f64)>;

#[derive(Default)]
struct FrameQueue {
    pending: Vec<FrameCallback>,
    last_timestamp: Option<f64>,
    ticks: u64,
}

/// Shared frame scheduler. Clones refer to the same queue.
#[derive(Clone, Default)]
pub struct FrameLoop {
    queue: Rc<RefCell<FrameQueue>>,
}

impl std::fmt::Debug for FrameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("FrameLoop")
            .field("pending", &queue.pending.len())
            .field("ticks", &queue.ticks)
            .field("last_timestamp", &queue.last_timestamp)
            .finish()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `callback` for the next tick.
    pub fn request_frame(&self, callback: impl FnOnce(f64) + 'static) {
        self.queue.borrow_mut().pending.push(Box::new(callback));
    }

    /// Run every callback pending at the start of this tick with `timestamp`.
    ///
    /// Timestamps never go backwards: a value older than the previous tick is
    /// raised to it. Returns the number of callbacks run.
    pub fn tick(&self, timestamp: f64) -> usize {
        let (callbacks, timestamp) = {
            let mut queue = self.queue.borrow_mut();
            let timestamp = match queue.last_timestamp {
                Some(last) if timestamp < last => {
                    warn!(timestamp, last, "frame timestamp went backwards");
                    last
                }
                _ => timestamp,
            };
            queue.last_timestamp = Some(timestamp);
            queue.ticks += 1;
            (std::mem::take(&mut queue.pending), timestamp)
        };

        let count = callbacks.len();
        for callback in callbacks {
            callback(timestamp);
        }
        trace!(timestamp, callbacks = count, "frame tick");
        count
    }

    /// Number of callbacks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Total ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.queue.borrow().ticks
    }

    /// Tick at `start`, `start + interval`, ... until nothing is pending or
    /// `max_ticks` ticks have run. Returns the last timestamp used, or `None`
    /// if the loop was already idle.
    pub fn run_until_idle(&self, start: f64, interval_ms: f64, max_ticks: usize) -> Option<f64> {
        self.run_until_idle_with(start, interval_ms, max_ticks, |_| {})
    }

    /// [`run_until_idle`](Self::run_until_idle), calling `after_tick` with
    /// each timestamp once that tick's callbacks have run.
    pub fn run_until_idle_with(
        &self,
        start: f64,
        interval_ms: f64,
        max_ticks: usize,
        mut after_tick: impl FnMut(f64),
    ) -> Option<f64> {
        let mut timestamp = start;
        let mut last = None;
        for _ in 0..max_ticks {
            if self.is_idle() {
                return last;
            }
            self.tick(timestamp);
            after_tick(timestamp);
            last = Some(timestamp);
            timestamp += interval_ms;
        }
        if !self.is_idle() {
            warn!(max_ticks, pending = self.pending(), "frame loop still busy after tick budget");
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn callbacks_run_once_with_timestamp() {
        let frames = FrameLoop::new();
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        frames.request_frame(move |t| sink.set(Some(t)));

        assert_eq!(frames.pending(), 1);
        assert_eq!(frames.tick(16.0), 1);
        assert_eq!(seen.get(), Some(16.0));
        assert_eq!(frames.tick(32.0), 0);
        assert!(frames.is_idle());
    }

    #[test]
    fn requests_made_during_tick_wait_for_next_tick() {
        let frames = FrameLoop::new();
        let count = Rc::new(Cell::new(0));

        let handle = frames.clone();
        let counter = Rc::clone(&count);
        frames.request_frame(move |_| {
            counter.set(counter.get() + 1);
            let counter = Rc::clone(&counter);
            handle.request_frame(move |_| counter.set(counter.get() + 1));
        });

        frames.tick(0.0);
        assert_eq!(count.get(), 1);
        assert_eq!(frames.pending(), 1);
        frames.tick(16.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn run_until_idle_with_reports_each_tick() {
        let frames = FrameLoop::new();
        let remaining = Rc::new(Cell::new(3));

        fn countdown(frames: FrameLoop, remaining: Rc<Cell<u32>>) {
            let next = frames.clone();
            frames.request_frame(move |_| {
                remaining.set(remaining.get() - 1);
                if remaining.get() > 0 {
                    countdown(next, remaining);
                }
            });
        }
        countdown(frames.clone(), Rc::clone(&remaining));

        let mut seen = Vec::new();
        let last = frames.run_until_idle_with(100.0, 16.0, 10, |t| seen.push(t));
        assert_eq!(seen, vec![100.0, 116.0, 132.0]);
        assert_eq!(last, Some(132.0));
        assert_eq!(remaining.get(), 0);
        assert!(frames.is_idle());
    }

    #[test]
    fn timestamps_do_not_go_backwards() {
        let frames = FrameLoop::new();
        frames.tick(100.0);
        let seen = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&seen);
        frames.request_frame(move |t| sink.set(t));
        frames.tick(50.0);
        assert_eq!(seen.get(), 100.0);
    }

    #[test]
    fn run_until_idle_respects_budget() {
        let frames = FrameLoop::new();
        assert_eq!(frames.run_until_idle(0.0, 16.0, 10), None);

        fn forever(frames: FrameLoop) {
            let next = frames.clone();
            frames.request_frame(move |_| forever(next));
        }
        forever(frames.clone());

        assert_eq!(frames.run_until_idle(0.0, 10.0, 5), Some(40.0));
        assert_eq!(frames.ticks(), 5);
        assert!(!frames.is_idle());
    }
}
