use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use web_time::{Duration, Instant, SystemTime};

/// Process-wide time source. Monotonic `now()` drives timer deadlines;
/// `wall()` is what date-facing tools resolve "now" against.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn wall(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Shared handle to a clock, for tools that take a per-instance override.
pub type SharedClock = Arc<dyn Clock>;

static CLOCK: RwLock<Option<Arc<dyn Clock>>> = RwLock::new(None);

/// Installs a clock, replacing any previous one. Tests install a
/// [`TestClock`]; hosts normally leave the default in place.
pub fn set_clock(clock: Arc<dyn Clock>) {
    *CLOCK.write() = Some(clock);
}

pub fn now() -> Instant {
    CLOCK.read().as_ref().map(|c| c.now()).unwrap_or_else(Instant::now)
}

pub fn wall_now() -> SystemTime {
    CLOCK
        .read()
        .as_ref()
        .map(|c| c.wall())
        .unwrap_or_else(SystemTime::now)
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock a test advances by hand. Keep a clone around after
/// installing it; `advance` moves monotonic and wall time together.
#[derive(Clone)]
pub struct TestClock {
    now: Arc<Mutex<Instant>>,
    wall: Arc<Mutex<SystemTime>>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
            wall: Arc::new(Mutex::new(SystemTime::now())),
        }
    }

    /// Creates the clock and installs it in one step.
    pub fn install() -> Self {
        let clock = Self::new();
        set_clock(Arc::new(clock.clone()));
        clock
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
        *self.wall.lock() += by;
    }

    pub fn set_wall(&self, at: SystemTime) {
        *self.wall.lock() = at;
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    fn wall(&self) -> SystemTime {
        *self.wall.lock()
    }
}
