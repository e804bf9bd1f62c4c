//! Coalesced per-frame updates
//!
//! Several triggers (data changes, range changes, resizes) may ask an item to
//! relayout within one frame. A [`DirtyFlag`] turns those into a single
//! clean→dirty transition and a [`FrameScheduler`] runs the deferred work once,
//! synchronously, before the next render pass.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Upper bound on scheduler passes within one frame. Work queued by a task
/// during the final pass is left for the next frame.
pub const MAX_FRAME_PASSES: usize = 16;

/// Shared dirty flag for triggering relayouts.
#[derive(Clone, Default)]
pub struct DirtyFlag(Rc<Cell<bool>>);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dirty, so the first read computes.
    pub fn dirty() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    /// Mark dirty. Returns `true` only on a clean→dirty transition.
    pub fn mark(&self) -> bool {
        !self.0.replace(true)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub fn is_dirty(&self) -> bool {
        self.0.get()
    }
}

impl fmt::Debug for DirtyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DirtyFlag").field(&self.is_dirty()).finish()
    }
}

type Task = Box<dyn FnOnce()>;

/// Queue of deferred tasks, run once per frame.
#[derive(Default)]
pub struct FrameScheduler {
    queue: RefCell<VecDeque<(DirtyFlag, Task)>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `flag` dirty and enqueue `task` if this is a fresh transition.
    ///
    /// Returns whether the task was enqueued.
    pub fn schedule<F>(&self, flag: &DirtyFlag, task: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        if !flag.mark() {
            return false;
        }
        self.queue
            .borrow_mut()
            .push_back((flag.clone(), Box::new(task)));
        true
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run every queued task. Tasks queued while running are run too, up to
    /// [`MAX_FRAME_PASSES`] passes. A task whose flag was already cleared by
    /// its owner (an eager rebuild before the frame) is skipped. Returns the
    /// number of tasks run.
    pub fn run_frame(&self) -> usize {
        let mut ran = 0;
        for pass in 0..MAX_FRAME_PASSES {
            let batch: Vec<(DirtyFlag, Task)> = self.queue.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                return ran;
            }
            tracing::trace!(pass, tasks = batch.len(), "running frame tasks");
            for (flag, task) in batch {
                // Cleared first so the task itself may reschedule.
                if flag.take() {
                    task();
                    ran += 1;
                }
            }
        }
        let left = self.pending();
        if left > 0 {
            tracing::warn!(
                left,
                "frame update cascade exceeded {MAX_FRAME_PASSES} passes; deferring to next frame"
            );
        }
        ran
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
