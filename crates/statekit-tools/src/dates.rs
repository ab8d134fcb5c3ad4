use std::cell::RefCell;
use std::rc::Rc;

use statekit_core::clock::{self, Clock, SharedClock};
use statekit_core::{CancelToken, Signal, signal};
use statekit_timers::{TimerOptions, Timers, TimersConfig};
use web_time::{Duration, SystemTime};

const REFRESH_TIMER: &str = "dates-refresh";

/// A comparison endpoint: a fixed point in time, or "the current time,
/// continuously refreshed".
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DateLike {
    At(SystemTime),
    Now,
}

impl From<SystemTime> for DateLike {
    fn from(t: SystemTime) -> Self {
        Self::At(t)
    }
}

/// Absolute difference between the endpoints, split into display parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateDiff {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DateDiff {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }

    pub fn total_minutes(&self) -> f64 {
        self.total_seconds() as f64 / 60.0
    }

    pub fn total_hours(&self) -> f64 {
        self.total_seconds() as f64 / 3600.0
    }

    pub fn is_empty(&self) -> bool {
        self.total_seconds() == 0
    }
}

#[derive(Default)]
pub struct DatesComparatorConfig {
    pub dates: Option<(DateLike, DateLike)>,
    pub cancel: Option<CancelToken>,
    pub clock: Option<SharedClock>,
}

struct Inner {
    dates: RefCell<Option<(DateLike, DateLike)>>,
    diff: Signal<DateDiff>,
    clock: Option<SharedClock>,
}

impl Inner {
    fn wall(&self) -> SystemTime {
        match &self.clock {
            Some(c) => c.wall(),
            None => clock::wall_now(),
        }
    }

    fn resolve(&self, d: &DateLike) -> SystemTime {
        match d {
            DateLike::At(t) => *t,
            DateLike::Now => self.wall(),
        }
    }

    fn recompute(&self) -> DateDiff {
        let diff = match self.dates.borrow().as_ref() {
            Some((from, to)) => {
                let from = self.resolve(from);
                let to = self.resolve(to);
                let delta = to
                    .duration_since(from)
                    .or_else(|_| from.duration_since(to))
                    .unwrap_or(Duration::ZERO);
                DateDiff::from_seconds(delta.as_secs())
            }
            None => DateDiff::default(),
        };
        self.diff.set(diff);
        diff
    }

    fn is_dynamic(&self) -> bool {
        matches!(
            self.dates.borrow().as_ref(),
            Some((DateLike::Now, _)) | Some((_, DateLike::Now))
        )
    }
}

/// Live hours/minutes/seconds difference between two date endpoints.
///
/// While an endpoint is [`DateLike::Now`], a once-per-second
/// self-rescheduling timer keeps the difference fresh; it auto-cancels when
/// the difference reaches zero. The owner drives it via [`DatesComparator::poll`].
pub struct DatesComparator {
    inner: Rc<Inner>,
    timers: Timers,
    token: CancelToken,
}

impl DatesComparator {
    pub fn new(config: DatesComparatorConfig) -> Self {
        let token = CancelToken::linked(config.cancel.as_ref());
        let timers = Timers::new(TimersConfig {
            cancel: Some(token.clone()),
            clock: config.clock.clone(),
        });
        let inner = Rc::new(Inner {
            dates: RefCell::new(None),
            diff: signal(DateDiff::default()),
            clock: config.clock,
        });

        let comparator = Self {
            inner,
            timers,
            token,
        };
        if let Some(dates) = config.dates {
            comparator.set_dates(Some(dates));
        }
        comparator
    }

    /// Replaces the endpoints, recomputes, and restarts the refresh timer.
    pub fn set_dates(&self, dates: Option<(DateLike, DateLike)>) {
        self.timers.cancel(REFRESH_TIMER);
        *self.inner.dates.borrow_mut() = dates;
        let diff = self.inner.recompute();

        if self.inner.is_dynamic() && !diff.is_empty() {
            let inner = self.inner.clone();
            self.timers.debounced(
                move |ctl| {
                    let diff = inner.recompute();
                    if inner.is_dynamic() && !diff.is_empty() {
                        ctl.run_again();
                    }
                },
                Duration::from_secs(1),
                TimerOptions::with_id(REFRESH_TIMER),
            );
        }
    }

    pub fn dates(&self) -> Option<(DateLike, DateLike)> {
        *self.inner.dates.borrow()
    }

    pub fn diff(&self) -> DateDiff {
        self.inner.diff.get()
    }

    pub fn signal(&self) -> &Signal<DateDiff> {
        &self.inner.diff
    }

    pub fn hours(&self) -> u64 {
        self.diff().hours
    }

    pub fn minutes(&self) -> u64 {
        self.diff().minutes
    }

    pub fn seconds(&self) -> u64 {
        self.diff().seconds
    }

    pub fn is_empty(&self) -> bool {
        self.diff().is_empty()
    }

    /// Whether the refresh timer is currently armed.
    pub fn is_refreshing(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn poll(&self) -> usize {
        self.timers.poll()
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}
