use std::cell::RefCell;
use std::rc::Rc;

/// Cleanup guard that runs at most once (safe to call repeatedly, clones
/// share the same once-flag).
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    pub fn run(&self) {
        if let Some(f) = self.0.borrow_mut().take() {
            f()
        }
    }
}

/// Externally owned teardown signal.
///
/// A token is a cloneable handle: every tool holds one and registers its
/// teardown with [`CancelToken::on_cancel`]. `cancel()` is idempotent and
/// runs each registered callback exactly once. Tokens created with
/// [`CancelToken::linked`] cancel when their parent cancels, so one outer
/// token can tear down an arbitrary tree of tools.
#[derive(Clone)]
pub struct CancelToken {
    inner: Rc<RefCell<TokenInner>>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: bool,
    callbacks: Vec<Box<dyn FnOnce()>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TokenInner::default())),
        }
    }

    /// New token that cancels when `parent` cancels (if there is one).
    pub fn linked(parent: Option<&CancelToken>) -> Self {
        let token = Self::new();
        if let Some(parent) = parent {
            let child = token.clone();
            parent.on_cancel(move || child.cancel());
        }
        token
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.borrow().cancelled
    }

    /// Registers teardown. If the token is already cancelled the callback
    /// runs immediately; late registrations during teardown do too.
    pub fn on_cancel(&self, f: impl FnOnce() + 'static) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.cancelled {
                inner.callbacks.push(Box::new(f));
                return;
            }
        }
        f();
    }

    pub fn cancel(&self) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if inner.cancelled {
                return;
            }
            inner.cancelled = true;
            std::mem::take(&mut inner.callbacks)
        };
        if !callbacks.is_empty() {
            log::trace!("cancel token: running {} teardown callback(s)", callbacks.len());
        }
        for cb in callbacks {
            cb();
        }
    }
}
