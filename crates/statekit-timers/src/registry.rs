use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use smallvec::SmallVec;
use statekit_core::CancelToken;
use statekit_core::clock::{self, Clock, SharedClock};
use web_time::{Duration, Instant};

/// Converts a float millisecond count into a `Duration`.
///
/// Negative values clamp to zero. NaN does too, with a warning, since it
/// almost always means an upstream arithmetic bug.
pub fn millis(ms: f64) -> Duration {
    if ms.is_nan() {
        log::warn!("timers: NaN timeout, using 0");
        return Duration::ZERO;
    }
    if ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
}

/// Key of one timer inside a [`Timers`] registry.
///
/// Identity is never inferred from callback equality (closures are recreated
/// per call and compare useless); callers that need coalescing must pass an
/// explicit id. An omitted id gets a fresh generated one.
pub type TimerId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    Debounce,
    Throttle,
}

/// Per-registration options. `leading`/`trailing` default per mode:
/// debounce is trailing-only, throttle fires both edges.
#[derive(Clone, Default)]
pub struct TimerOptions {
    pub id: Option<TimerId>,
    pub leading: Option<bool>,
    pub trailing: Option<bool>,
}

impl TimerOptions {
    pub fn with_id(id: impl Into<TimerId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn leading(mut self, leading: bool) -> Self {
        self.leading = Some(leading);
        self
    }

    pub fn trailing(mut self, trailing: bool) -> Self {
        self.trailing = Some(trailing);
        self
    }
}

/// Handed to every callback. `run_again()` re-arms the same descriptor
/// (same id, timeout, mode, edges) once the callback returns.
pub struct TimerControl {
    run_again: Cell<bool>,
}

impl TimerControl {
    fn new() -> Self {
        Self {
            run_again: Cell::new(false),
        }
    }

    pub fn run_again(&self) {
        self.run_again.set(true);
    }

    fn requested(&self) -> bool {
        self.run_again.get()
    }
}

type TimerCallback = Box<dyn FnMut(&TimerControl)>;

struct Descriptor {
    timeout: Duration,
    mode: TimerMode,
    trailing: bool,
    cb: TimerCallback,
    deadline: Instant,
    /// Whether the deadline owes an invocation. A throttle cooldown with no
    /// calls during the window expires silently.
    fire_pending: bool,
    /// Bumped on every (re-)arming, so `poll` can tell a descriptor it
    /// snapshotted from one registered in its place mid-pass.
    generation: u64,
}

#[derive(Default)]
pub struct TimersConfig {
    pub cancel: Option<CancelToken>,
    /// Per-instance clock override; the installed global clock otherwise.
    pub clock: Option<SharedClock>,
}

#[derive(Default)]
struct State {
    entries: HashMap<TimerId, Descriptor>,
    closed: bool,
    next_auto_id: u64,
    next_generation: u64,
}

impl State {
    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

/// Keyed debounce/throttle registry. Cloning yields another handle to the
/// same registry.
#[derive(Clone)]
pub struct Timers {
    state: Rc<RefCell<State>>,
    clock: Option<SharedClock>,
}

impl Default for Timers {
    fn default() -> Self {
        Self::new(TimersConfig::default())
    }
}

impl Timers {
    pub fn new(config: TimersConfig) -> Self {
        let state = Rc::new(RefCell::new(State::default()));

        if let Some(token) = &config.cancel {
            let state = state.clone();
            token.on_cancel(move || {
                let mut st = state.borrow_mut();
                let dropped = st.entries.len();
                st.entries.clear();
                st.closed = true;
                if dropped > 0 {
                    log::debug!("timers: token cancelled, dropped {dropped} descriptor(s)");
                }
            });
        }

        Self {
            state,
            clock: config.clock,
        }
    }

    fn now(&self) -> Instant {
        match &self.clock {
            Some(c) => c.now(),
            None => clock::now(),
        }
    }

    fn resolve_id(&self, id: Option<TimerId>) -> TimerId {
        match id {
            Some(id) => id,
            None => {
                let mut st = self.state.borrow_mut();
                st.next_auto_id += 1;
                format!("timer-{}", st.next_auto_id)
            }
        }
    }

    /// (Re-)arms a debounce timer: the callback fires once `timeout` elapses
    /// with no further registrations under the same id. Each call resets the
    /// delay and the latest callback wins. With `leading`, a registration
    /// under a fresh id fires immediately as well.
    ///
    /// Returns the id used. After the owning token cancelled, this is a
    /// silent no-op (late calls during teardown are tolerated).
    pub fn debounced(
        &self,
        cb: impl FnMut(&TimerControl) + 'static,
        timeout: Duration,
        opts: TimerOptions,
    ) -> TimerId {
        let id = self.resolve_id(opts.id);
        if self.state.borrow().closed {
            return id;
        }

        let leading = opts.leading.unwrap_or(false);
        let trailing = opts.trailing.unwrap_or(true);
        let fresh = !self.state.borrow().entries.contains_key(&id);
        let mut cb: TimerCallback = Box::new(cb);

        let mut fire_pending = true;
        if fresh && leading {
            // Leading fire happens before the descriptor exists, so a panic
            // here leaves the registry untouched.
            let ctl = TimerControl::new();
            cb(&ctl);
            fire_pending = ctl.requested();
        }

        let deadline = self.now() + timeout;
        log::trace!("timers: debounce '{id}' armed for {timeout:?}");
        let mut st = self.state.borrow_mut();
        let generation = st.next_generation();
        st.entries.insert(
            id.clone(),
            Descriptor {
                timeout,
                mode: TimerMode::Debounce,
                trailing,
                cb,
                deadline,
                fire_pending,
                generation,
            },
        );
        id
    }

    /// Arms or feeds a throttle timer: the first registration fires
    /// immediately (if `leading`, the default), then calls under the same id
    /// are suppressed until `timeout` elapses. Calls made during the window
    /// mark a trailing fire, delivered once at window end when `trailing` is
    /// enabled, using the most recent callback.
    pub fn throttled(
        &self,
        cb: impl FnMut(&TimerControl) + 'static,
        timeout: Duration,
        opts: TimerOptions,
    ) -> TimerId {
        let id = self.resolve_id(opts.id);
        if self.state.borrow().closed {
            return id;
        }

        let leading = opts.leading.unwrap_or(true);
        let trailing = opts.trailing.unwrap_or(true);
        let mut cb: TimerCallback = Box::new(cb);

        {
            let mut st = self.state.borrow_mut();
            let next_generation = st.next_generation();
            if let Some(d) = st.entries.get_mut(&id) {
                if d.mode == TimerMode::Throttle {
                    // Cooldown active: record the trailing call, keep the
                    // window end where it is. Last write wins. The fresh
                    // generation keeps a mid-poll feed out of the running
                    // pass.
                    d.cb = cb;
                    d.fire_pending = true;
                    d.timeout = timeout;
                    d.trailing = trailing;
                    d.generation = next_generation;
                    return id;
                }
                // Mode changed under this id: replace outright.
                st.entries.remove(&id);
            }
        }

        let mut fire_pending = !leading;
        if leading {
            let ctl = TimerControl::new();
            cb(&ctl);
            fire_pending = ctl.requested();
        }

        let deadline = self.now() + timeout;
        log::trace!("timers: throttle '{id}' window open for {timeout:?}");
        let mut st = self.state.borrow_mut();
        let generation = st.next_generation();
        st.entries.insert(
            id.clone(),
            Descriptor {
                timeout,
                mode: TimerMode::Throttle,
                trailing,
                cb,
                deadline,
                fire_pending,
                generation,
            },
        );
        id
    }

    /// Cancels and removes the timer; no-op for unknown ids.
    pub fn cancel(&self, id: &str) {
        if self.state.borrow_mut().entries.remove(id).is_some() {
            log::trace!("timers: cancelled '{id}'");
        }
    }

    /// Cancels and removes every timer.
    pub fn clean(&self) {
        let mut st = self.state.borrow_mut();
        if !st.entries.is_empty() {
            log::debug!("timers: clean, dropped {} descriptor(s)", st.entries.len());
        }
        st.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Earliest pending deadline, so an owning loop can sleep precisely.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state
            .borrow()
            .entries
            .values()
            .map(|d| d.deadline)
            .min()
    }

    /// Fires every descriptor whose deadline has passed, in deadline order,
    /// and returns how many callbacks ran.
    ///
    /// One pass over a snapshot of the due set: descriptors a callback
    /// re-arms (via [`TimerControl::run_again`] or by registering again) wait
    /// for the next poll even when their new deadline is already due, so a
    /// zero-timeout self-rescheduling timer cannot spin this call forever.
    ///
    /// A descriptor is removed from the registry *before* its callback runs;
    /// a panicking callback therefore leaves the registry consistent, as if
    /// the timer had completed normally.
    pub fn poll(&self) -> usize {
        let now = self.now();
        let mut due: SmallVec<[(TimerId, Instant, u64); 4]> = self
            .state
            .borrow()
            .entries
            .iter()
            .filter(|(_, d)| d.deadline <= now)
            .map(|(id, d)| (id.clone(), d.deadline, d.generation))
            .collect();
        due.sort_by_key(|(_, deadline, _)| *deadline);

        let mut fired = 0;
        for (id, _, generation) in due {
            let entry = {
                let mut st = self.state.borrow_mut();
                // Skip entries a previous callback replaced or cancelled
                // during this pass.
                match st.entries.get(&id) {
                    Some(d) if d.generation == generation => st.entries.remove(&id),
                    _ => None,
                }
            };
            let Some(mut d) = entry else { continue };

            if !(d.fire_pending && d.trailing) {
                // Cooldown expired with nothing owed.
                continue;
            }

            let ctl = TimerControl::new();
            (d.cb)(&ctl);
            fired += 1;

            if ctl.requested() {
                let mut st = self.state.borrow_mut();
                if st.closed {
                    continue;
                }
                d.deadline = now + d.timeout;
                d.fire_pending = true;
                d.generation = st.next_generation();
                log::trace!("timers: '{id}' re-armed for {:?}", d.timeout);
                // run_again wins over anything the callback registered
                // under the same id.
                st.entries.insert(id, d);
            }
        }
        fired
    }
}
