//! Execution Queue
//!
//! Deferred destruction: callers schedule a callback to run N frames hence,
//! and [`DeletionQueue::flush`] drains everything whose countdown has
//! elapsed. This is how transient resources are destroyed exactly
//! `last_user_frame + max_frame_lifetime` frames after their last use (spec
//! §3/§5) without blocking the frame that stopped referencing them, and how
//! [`crate::readback::BufferSync`]-style per-frame post-commands get
//! threaded into the render graph's submit step.

/// A callback scheduled to run once its countdown reaches zero.
struct Scheduled<F> {
    remaining_frames: u32,
    callback: F,
}

/// A queue of deferred callbacks, counted down once per [`DeletionQueue::tick`].
///
/// Generic over the callback type so the same structure backs both GPU
/// object destruction (`FnOnce()`) and post-render hooks that need a
/// borrowed context (see [`crate::graph::graph::RenderGraph::submit`]).
pub struct DeletionQueue<F> {
    scheduled: Vec<Scheduled<F>>,
}

impl<F> Default for DeletionQueue<F> {
    fn default() -> Self {
        Self {
            scheduled: Vec::new(),
        }
    }
}

impl<F> DeletionQueue<F> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `callback` to run after `frames_hence` more [`tick`](Self::tick)
    /// calls. `frames_hence = 0` means "run on the very next flush".
    pub fn schedule(&mut self, frames_hence: u32, callback: F) {
        self.scheduled.push(Scheduled {
            remaining_frames: frames_hence,
            callback,
        });
    }

    /// Advances every pending callback's countdown by one frame.
    pub fn tick(&mut self) {
        for entry in &mut self.scheduled {
            entry.remaining_frames = entry.remaining_frames.saturating_sub(1);
        }
    }

    /// Number of callbacks still pending.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }
}

impl<F: FnOnce()> DeletionQueue<F> {
    /// Runs and removes every callback whose countdown has reached zero.
    /// Does not tick; call [`tick`](Self::tick) once per frame and `flush`
    /// whenever the drained callbacks should actually execute.
    pub fn flush(&mut self) {
        let mut i = 0;
        while i < self.scheduled.len() {
            if self.scheduled[i].remaining_frames == 0 {
                let entry = self.scheduled.swap_remove(i);
                (entry.callback)();
            } else {
                i += 1;
            }
        }
    }

    /// Ticks and flushes in one step — the common per-frame call.
    pub fn tick_and_flush(&mut self) {
        self.tick();
        self.flush();
    }
}

impl<T> DeletionQueue<Box<dyn FnOnce(&mut T)>> {
    /// Runs and removes every callback whose countdown has reached zero,
    /// passing `arg` through to each — the shape
    /// [`crate::graph::graph::RenderGraph::reset`] uses to destroy transient
    /// resources out of a borrowed [`crate::cache::ResourceCache`].
    pub fn flush_with(&mut self, arg: &mut T) {
        let mut i = 0;
        while i < self.scheduled.len() {
            if self.scheduled[i].remaining_frames == 0 {
                let entry = self.scheduled.swap_remove(i);
                (entry.callback)(arg);
            } else {
                i += 1;
            }
        }
    }

    /// Ticks and flushes in one step — the common per-frame call.
    pub fn tick_and_flush_with(&mut self, arg: &mut T) {
        self.tick();
        self.flush_with(arg);
    }
}

#[cfg(test)]
mod tests {
    use super::DeletionQueue;
    use std::cell::RefCell;

    #[test]
    fn callback_runs_after_exact_countdown() {
        let log = RefCell::new(Vec::new());
        let mut q: DeletionQueue<Box<dyn FnOnce()>> = DeletionQueue::new();
        q.schedule(2, Box::new(|| {}));

        // frame 0: scheduled with 2 remaining
        q.tick_and_flush(); // -> 1 remaining, not flushed
        assert_eq!(q.pending(), 1);
        q.tick_and_flush(); // -> 0 remaining, flushed
        assert_eq!(q.pending(), 0);
        drop(log);
    }

    #[test]
    fn zero_frames_hence_flushes_on_next_tick() {
        let mut q: DeletionQueue<Box<dyn FnOnce()>> = DeletionQueue::new();
        let ran = std::rc::Rc::new(RefCell::new(false));
        let ran2 = ran.clone();
        q.schedule(0, Box::new(move || *ran2.borrow_mut() = true));
        q.tick_and_flush();
        assert!(*ran.borrow());
    }

    #[test]
    fn multiple_callbacks_independent_countdowns() {
        let mut q: DeletionQueue<Box<dyn FnOnce()>> = DeletionQueue::new();
        q.schedule(0, Box::new(|| {}));
        q.schedule(3, Box::new(|| {}));
        q.tick_and_flush();
        assert_eq!(q.pending(), 1);
    }
}
