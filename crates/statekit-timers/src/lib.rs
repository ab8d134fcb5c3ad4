//! # Timer registry
//!
//! A keyed collection of debounce/throttle timers. Each timer is one named
//! descriptor: registering again under the same id replaces the previous
//! descriptor atomically, so there is never a window where both the old and
//! the new deadline are live.
//!
//! The registry never blocks and never spawns: it records deadlines against
//! the installed clock and fires whatever is due when its owner calls
//! [`Timers::poll`]. That makes cancellation synchronous (once `cancel` or
//! `clean` returns, the callback cannot fire) and makes the whole thing
//! deterministic under a test clock.
//!
//! ```rust
//! use statekit_timers::{Timers, TimerOptions};
//! use web_time::Duration;
//!
//! let timers = Timers::default();
//! timers.debounced(
//!     |_ctl| log::info!("settled"),
//!     Duration::from_millis(100),
//!     TimerOptions::with_id("search"),
//! );
//! // ... later, from the owner's loop:
//! timers.poll();
//! ```
//!
//! Callbacks receive a [`TimerControl`]; calling `run_again()` from inside a
//! callback re-arms the *same* descriptor with its original timeout and mode,
//! which is how self-rescheduling loops (tickers, pollers) avoid leaking a
//! new descriptor per iteration.

mod registry;


pub use registry::{TimerControl, TimerId, TimerMode, TimerOptions, Timers, TimersConfig, millis};
