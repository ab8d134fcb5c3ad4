//! # Signals, cancellation, and time
//!
//! statekit's tools are thin stateful wrappers over three primitives:
//!
//! - `Signal<T>` — observable value with an explicit subscription interface.
//! - `CancelToken` — externally owned teardown signal with idempotent cancel.
//! - `clock` — installable time source so time-based state is deterministic
//!   under test.
//!
//! ## Signals
//!
//! `Signal<T>` is a cloneable handle to a piece of state:
//!
//! ```rust
//! use statekit_core::signal;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! There is no implicit dependency tracking: consumers subscribe explicitly
//! and receive every write. Subscriptions are removable, either by key or by
//! dropping them into a `CancelToken`.
//!
//! ## Cancellation
//!
//! Every tool accepts an optional parent `CancelToken` at construction.
//! Cancelling the parent tears the tool down; teardown runs exactly once no
//! matter how many paths reach it:
//!
//! ```rust
//! use statekit_core::CancelToken;
//!
//! let token = CancelToken::new();
//! token.on_cancel(|| log::info!("torn down"));
//! token.cancel();
//! token.cancel(); // no-op
//! assert!(token.is_cancelled());
//! ```
//!
//! ## Time
//!
//! Nothing in statekit blocks or spawns threads. Time-based tools read the
//! installed [`clock::Clock`] and fire due work when their owner polls them,
//! so tests install a [`clock::TestClock`] and advance it by hand.

pub mod cancel;
pub mod clock;
pub mod signal;

mod tests;

pub use cancel::{CancelToken, Dispose};
pub use clock::{Clock, SharedClock, SystemClock, TestClock};
pub use signal::{Signal, SubKey, signal};
