//! Cooperative timer and animation-frame scheduler
//!
//! The scheduler runs on a virtual clock owned by the host. Nothing happens
//! on its own: the host's event loop (or a test) advances time and flushes
//! animation frames, and every due callback runs on the calling thread.
//!
//! - `set_timeout` / `clear_timeout`: one-shot timers in virtual time
//! - `request_animation_frame` / `cancel_animation_frame`: callbacks for the
//!   next rendered frame
//! - `run_animation_frame`: render one frame
//! - `advance`: render one frame, then move the clock forward and fire every
//!   timer that came due, in due-time then insertion order
//!
//! Callbacks may schedule more work; a timer scheduled while advancing fires
//! in the same `advance` call if it comes due before the target time.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Scheduler::new();
//! scheduler.set_timeout(Duration::from_millis(500), || println!("later"));
//! scheduler.advance(Duration::from_millis(500)); // prints "later"
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a pending timer
    pub struct TimerId;
    /// Handle to a pending animation frame callback
    pub struct FrameId;
}

type Callback = Box<dyn FnOnce()>;

struct Timer {
    due: Duration,
    seq: u64,
    callback: Callback,
}

#[derive(Default)]
struct SchedulerInner {
    now: Duration,
    next_seq: u64,
    timers: SlotMap<TimerId, Timer>,
    frames: SlotMap<FrameId, Callback>,
    frame_queue: VecDeque<FrameId>,
}

impl SchedulerInner {
    /// Remove and return the earliest timer due at or before `target`
    fn take_due(&mut self, target: Duration) -> Option<(Duration, Callback)> {
        let id = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= target)
            .min_by_key(|(_, timer)| (timer.due, timer.seq))
            .map(|(id, _)| id)?;
        let timer = self.timers.remove(id)?;
        Some((timer.due, timer.callback))
    }
}

/// Shared handle to the scheduler (cheap to clone)
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the scheduler was created
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Run `callback` once `delay` has elapsed
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let due = inner.now + delay;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let id = inner.timers.insert(Timer {
            due,
            seq,
            callback: Box::new(callback),
        });
        tracing::trace!(?id, ?due, "set timeout");
        id
    }

    /// Cancel a pending timer; returns false if it already fired or was cleared
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let cleared = self.inner.borrow_mut().timers.remove(id).is_some();
        if cleared {
            tracing::trace!(?id, "clear timeout");
        }
        cleared
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.contains_key(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Run `callback` when the next frame is rendered
    pub fn request_animation_frame<F>(&self, callback: F) -> FrameId
    where
        F: FnOnce() + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.frames.insert(Box::new(callback));
        inner.frame_queue.push_back(id);
        id
    }

    pub fn cancel_animation_frame(&self, id: FrameId) -> bool {
        self.inner.borrow_mut().frames.remove(id).is_some()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    /// Render one frame: run the callbacks requested before this call
    ///
    /// Callbacks requested while the frame runs wait for the next frame.
    /// Returns the number of callbacks run.
    pub fn run_animation_frame(&self) -> usize {
        let queued: Vec<FrameId> = self.inner.borrow_mut().frame_queue.drain(..).collect();
        let mut ran = 0;
        for id in queued {
            let callback = self.inner.borrow_mut().frames.remove(id);
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Render a frame, then move the clock forward by `elapsed`, firing due
    /// timers in order. Returns the number of timers fired.
    pub fn advance(&self, elapsed: Duration) -> usize {
        self.run_animation_frame();

        let target = self.now() + elapsed;
        let mut fired = 0;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                let next = inner.take_due(target);
                if let Some((due, _)) = &next {
                    inner.now = inner.now.max(*due);
                }
                next
            };
            match due {
                Some((_, callback)) => {
                    callback();
                    fired += 1;
                }
                None => break,
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.now = inner.now.max(target);
        fired
    }

    /// Advance until no timers remain, rendering a frame before each step
    ///
    /// Returns the number of timers fired; stops after `limit` timers so a
    /// self-rescheduling timer cannot spin forever.
    pub fn run_until_idle(&self, limit: usize) -> usize {
        let mut fired = 0;
        while fired < limit {
            let next_due = self
                .inner
                .borrow()
                .timers
                .values()
                .map(|timer| timer.due)
                .min();
            let Some(due) = next_due else {
                self.run_animation_frame();
                break;
            };
            let now = self.now();
            fired += self.advance(due.saturating_sub(now));
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_timers_fire_in_order() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (delay, name) in [(300, "c"), (100, "a"), (100, "b")] {
            let log = Rc::clone(&log);
            scheduler.set_timeout(ms(delay), move || log.borrow_mut().push(name));
        }

        assert_eq!(scheduler.advance(ms(99)), 0);
        assert_eq!(scheduler.advance(ms(1)), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert_eq!(scheduler.now(), ms(100));

        assert_eq!(scheduler.advance(ms(500)), 1);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(scheduler.now(), ms(600));
    }

    #[test]
    fn test_clear_timeout() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&fired);
        let id = scheduler.set_timeout(ms(10), move || *flag.borrow_mut() = true);

        assert!(scheduler.is_pending(id));
        assert!(scheduler.clear_timeout(id));
        assert!(!scheduler.clear_timeout(id));
        scheduler.advance(ms(20));
        assert!(!*fired.borrow());
    }

    #[test]
    fn test_nested_timer_within_advance() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_scheduler = scheduler.clone();
        let inner_log = Rc::clone(&log);
        scheduler.set_timeout(ms(10), move || {
            inner_log.borrow_mut().push(inner_scheduler.now());
            let log = Rc::clone(&inner_log);
            let s = inner_scheduler.clone();
            inner_scheduler.set_timeout(ms(10), move || log.borrow_mut().push(s.now()));
        });

        assert_eq!(scheduler.advance(ms(25)), 2);
        assert_eq!(*log.borrow(), vec![ms(10), ms(20)]);
        assert_eq!(scheduler.now(), ms(25));
    }

    #[test]
    fn test_animation_frames() {
        let scheduler = Scheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let s = scheduler.clone();
        let l = Rc::clone(&log);
        scheduler.request_animation_frame(move || {
            l.borrow_mut().push("first");
            let l = Rc::clone(&l);
            s.request_animation_frame(move || l.borrow_mut().push("second"));
        });
        let cancelled = {
            let l = Rc::clone(&log);
            scheduler.request_animation_frame(move || l.borrow_mut().push("cancelled"))
        };
        assert!(scheduler.cancel_animation_frame(cancelled));

        assert_eq!(scheduler.run_animation_frame(), 1);
        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(scheduler.pending_frames(), 1);

        // advance renders a frame before moving the clock
        scheduler.advance(Duration::ZERO);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_run_until_idle() {
        let scheduler = Scheduler::new();
        scheduler.set_timeout(ms(500), || {});
        scheduler.set_timeout(ms(50), || {});

        assert_eq!(scheduler.run_until_idle(10), 2);
        assert_eq!(scheduler.now(), ms(500));
        assert_eq!(scheduler.pending_timers(), 0);
    }
}
