use statekit_core::clock::{self, Clock, SharedClock};
use statekit_core::{CancelToken, Signal, signal};
use statekit_timers::{TimerOptions, Timers, TimersConfig};
use web_time::{Duration, SystemTime};

const REFRESH_TIMER: &str = "time-refresh";

pub struct LiveTimeConfig {
    pub update_per: Duration,
    pub cancel: Option<CancelToken>,
    pub clock: Option<SharedClock>,
}

impl Default for LiveTimeConfig {
    fn default() -> Self {
        Self {
            update_per: Duration::from_secs(1),
            cancel: None,
            clock: None,
        }
    }
}

/// Wall-clock time as a signal, refreshed every `update_per`.
///
/// The refresh only writes (and therefore only notifies) while the signal
/// has at least one subscriber; an unobserved `LiveTime` stays quiet.
pub struct LiveTime {
    value: Signal<SystemTime>,
    timers: Timers,
    clock: Option<SharedClock>,
    token: CancelToken,
}

impl LiveTime {
    pub fn new(config: LiveTimeConfig) -> Self {
        let token = CancelToken::linked(config.cancel.as_ref());
        let timers = Timers::new(TimersConfig {
            cancel: Some(token.clone()),
            clock: config.clock.clone(),
        });

        let wall = match &config.clock {
            Some(c) => c.wall(),
            None => clock::wall_now(),
        };
        let value = signal(wall);

        let sig = value.clone();
        let clk = config.clock.clone();
        timers.debounced(
            move |ctl| {
                if sig.subscriber_count() > 0 {
                    let now = match &clk {
                        Some(c) => c.wall(),
                        None => clock::wall_now(),
                    };
                    sig.set(now);
                }
                ctl.run_again();
            },
            config.update_per,
            TimerOptions::with_id(REFRESH_TIMER),
        );

        Self {
            value,
            timers,
            clock: config.clock,
            token,
        }
    }

    /// Current value; reads the clock directly so it is fresh even without
    /// subscribers.
    pub fn value(&self) -> SystemTime {
        if self.value.subscriber_count() > 0 {
            self.value.get()
        } else {
            match &self.clock {
                Some(c) => c.wall(),
                None => clock::wall_now(),
            }
        }
    }

    /// Unix milliseconds of [`LiveTime::value`].
    pub fn ms(&self) -> u128 {
        self.value()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0)
    }

    pub fn signal(&self) -> &Signal<SystemTime> {
        &self.value
    }

    pub fn poll(&self) -> usize {
        self.timers.poll()
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}
