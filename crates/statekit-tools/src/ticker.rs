use std::cell::Cell;

use statekit_core::clock::SharedClock;
use statekit_core::{CancelToken, Signal, signal};
use statekit_timers::{TimerOptions, Timers, TimersConfig};
use web_time::Duration;

const TICK_TIMER: &str = "tick";

pub struct TickerConfig {
    pub ticks_per: Duration,
    pub cancel: Option<CancelToken>,
    pub clock: Option<SharedClock>,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            ticks_per: Duration::from_secs(1),
            cancel: None,
            clock: None,
        }
    }
}

/// Counts ticks of a fixed period through a self-rescheduling registry
/// timer. Zero `ticks_per` is allowed and ticks on every poll.
pub struct Ticker {
    ticks: Signal<u64>,
    is_running: Signal<bool>,
    ticks_per: Cell<Duration>,
    timers: Timers,
    token: CancelToken,
}

impl Ticker {
    pub fn new(config: TickerConfig) -> Self {
        let token = CancelToken::linked(config.cancel.as_ref());
        let timers = Timers::new(TimersConfig {
            cancel: Some(token.clone()),
            clock: config.clock,
        });

        let ticker = Self {
            ticks: signal(0),
            is_running: signal(false),
            ticks_per: Cell::new(config.ticks_per),
            timers,
            token,
        };

        let is_running = ticker.is_running.clone();
        ticker.token.on_cancel(move || is_running.set(false));
        ticker
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }

    pub fn ticks_signal(&self) -> &Signal<u64> {
        &self.ticks
    }

    pub fn ticks_per(&self) -> Duration {
        self.ticks_per.get()
    }

    pub fn is_running(&self) -> bool {
        self.is_running.get()
    }

    /// Resets the count and starts ticking; no-op while already running or
    /// after teardown.
    pub fn start(&self) {
        if self.is_running.get() || self.token.is_cancelled() {
            return;
        }
        self.ticks.set(0);
        self.is_running.set(true);

        let ticks = self.ticks.clone();
        self.timers.debounced(
            move |ctl| {
                ticks.update(|t| *t += 1);
                ctl.run_again();
            },
            self.ticks_per.get(),
            TimerOptions::with_id(TICK_TIMER),
        );
    }

    pub fn stop(&self) {
        self.timers.cancel(TICK_TIMER);
        if self.is_running.get() {
            self.is_running.set(false);
        }
    }

    /// Stops and zeroes the count.
    pub fn reset(&self) {
        self.stop();
        if self.ticks.get() != 0 {
            self.ticks.set(0);
        }
    }

    /// Changing the period restarts the ticker (even when it was stopped).
    pub fn set_ticks_per(&self, ticks_per: Duration) {
        self.ticks_per.set(ticks_per);
        self.stop();
        self.start();
    }

    pub fn poll(&self) -> usize {
        self.timers.poll()
    }

    pub fn destroy(&self) {
        self.reset();
        self.token.cancel();
    }
}
