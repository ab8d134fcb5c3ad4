//! Small, independent reactive state helpers.
//!
//! Each tool is a thin stateful wrapper around `statekit_core` signals with
//! its lifecycle tied to a [`statekit_core::CancelToken`]: pass a parent
//! token in the tool's config and cancelling it tears the tool down.
//! Time-based tools (ticker, dates comparator, live time) schedule through
//! their own [`statekit_timers::Timers`] registry and are driven by `poll()`
//! from the owner's loop.

pub mod dates;
pub mod keyboard;
pub mod observers;
pub mod paginator;
pub mod stepper;
pub mod storage;
pub mod tabs;
pub mod ticker;
pub mod time;

pub use dates::{DateDiff, DateLike, DatesComparator, DatesComparatorConfig};
pub use keyboard::{
    Activation, KeyAction, KeyEvent, KeyboardConfig, KeyboardHandler, Modifiers, Shortcut,
    ShortcutParseError,
};
pub use observers::{
    NetworkStatus, NetworkStatusParams, PageVisibility, PageVisibilityParams, is_online,
    is_visible, set_online, set_visible,
};
pub use paginator::{OffsetData, PageData, Paginator, PaginatorConfig};
pub use stepper::{Stepper, StepperConfig};
pub use storage::{MemoryBackend, Storage, StorageBackend, StorageConfig, StorageError};
pub use tabs::{TabId, TabItem, TabManager, TabManagerConfig, TabSource};
pub use ticker::{Ticker, TickerConfig};
pub use time::{LiveTime, LiveTimeConfig};
