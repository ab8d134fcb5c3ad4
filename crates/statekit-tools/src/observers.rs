//! Process-wide capability observers.
//!
//! Each capability is a lazily-initialized thread-local singleton signal.
//! The host's event source feeds transitions in through the `set_*`
//! functions; consumers either read the current value directly or construct
//! an observer handle whose callbacks fire immediately and on every
//! transition, until its token cancels.

use std::rc::Rc;

use statekit_core::{CancelToken, Signal};

thread_local! {
    static ONLINE: Signal<bool> = Signal::new(true);
    static VISIBLE: Signal<bool> = Signal::new(true);
}

/// Host feed for network transitions. Redundant writes are swallowed so
/// observers only see actual changes.
pub fn set_online(online: bool) {
    ONLINE.with(|s| {
        if s.get() != online {
            log::debug!("observers: network {}", if online { "online" } else { "offline" });
            s.set(online);
        }
    });
}

pub fn is_online() -> bool {
    ONLINE.with(|s| s.get())
}

/// Host feed for page visibility transitions.
pub fn set_visible(visible: bool) {
    VISIBLE.with(|s| {
        if s.get() != visible {
            s.set(visible);
        }
    });
}

pub fn is_visible() -> bool {
    VISIBLE.with(|s| s.get())
}

#[derive(Default)]
pub struct NetworkStatusParams {
    pub when_online: Option<Box<dyn Fn()>>,
    pub when_offline: Option<Box<dyn Fn()>>,
    pub cancel: Option<CancelToken>,
}

/// Per-consumer view of the network singleton. Callbacks fire once at
/// construction with the current state, then on every transition.
pub struct NetworkStatus {
    token: CancelToken,
}

impl NetworkStatus {
    pub fn new(params: NetworkStatusParams) -> Self {
        let token = CancelToken::linked(params.cancel.as_ref());

        if params.when_online.is_some() || params.when_offline.is_some() {
            let when_online = Rc::new(params.when_online);
            let when_offline = Rc::new(params.when_offline);
            let notify = move |online: &bool| {
                let cb = if *online { &*when_online } else { &*when_offline };
                if let Some(f) = cb.as_ref() {
                    f();
                }
            };
            notify(&is_online());
            ONLINE.with(|s| s.subscribe_until(&token, notify));
        }

        Self { token }
    }

    pub fn is_online(&self) -> bool {
        is_online()
    }

    pub fn is_offline(&self) -> bool {
        !is_online()
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}

#[derive(Default)]
pub struct PageVisibilityParams {
    pub when_visible: Option<Box<dyn Fn()>>,
    pub when_hidden: Option<Box<dyn Fn()>>,
    pub cancel: Option<CancelToken>,
}

/// Per-consumer view of the visibility singleton; same contract as
/// [`NetworkStatus`].
pub struct PageVisibility {
    token: CancelToken,
}

impl PageVisibility {
    pub fn new(params: PageVisibilityParams) -> Self {
        let token = CancelToken::linked(params.cancel.as_ref());

        if params.when_visible.is_some() || params.when_hidden.is_some() {
            let when_visible = Rc::new(params.when_visible);
            let when_hidden = Rc::new(params.when_hidden);
            let notify = move |visible: &bool| {
                let cb = if *visible { &*when_visible } else { &*when_hidden };
                if let Some(f) = cb.as_ref() {
                    f();
                }
            };
            notify(&is_visible());
            VISIBLE.with(|s| s.subscribe_until(&token, notify));
        }

        Self { token }
    }

    pub fn is_visible(&self) -> bool {
        is_visible()
    }

    pub fn is_hidden(&self) -> bool {
        !is_visible()
    }

    pub fn destroy(&self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn network_callbacks_fire_immediately_and_on_transition() {
        set_online(true);
        let events = Rc::new(RefCell::new(Vec::new()));

        let e1 = events.clone();
        let e2 = events.clone();
        let status = NetworkStatus::new(NetworkStatusParams {
            when_online: Some(Box::new(move || e1.borrow_mut().push("online"))),
            when_offline: Some(Box::new(move || e2.borrow_mut().push("offline"))),
            cancel: None,
        });

        assert_eq!(*events.borrow(), vec!["online"], "fires with current state");
        assert!(status.is_online());

        set_online(false);
        assert_eq!(*events.borrow(), vec!["online", "offline"]);
        assert!(status.is_offline());

        // Redundant feed: no transition, no callback.
        set_online(false);
        assert_eq!(events.borrow().len(), 2);

        status.destroy();
        set_online(true);
        assert_eq!(events.borrow().len(), 2);
    }

    #[test]
    fn visibility_observers_follow_the_singleton() {
        set_visible(true);
        let hidden_count = Rc::new(RefCell::new(0));

        let h = hidden_count.clone();
        let vis = PageVisibility::new(PageVisibilityParams {
            when_visible: None,
            when_hidden: Some(Box::new(move || *h.borrow_mut() += 1)),
            cancel: None,
        });

        assert!(vis.is_visible());
        set_visible(false);
        assert!(vis.is_hidden());
        assert_eq!(*hidden_count.borrow(), 1);

        set_visible(true);
        set_visible(false);
        assert_eq!(*hidden_count.borrow(), 2);
        vis.destroy();
    }

    #[test]
    fn reads_work_without_any_observer() {
        set_online(true);
        assert!(is_online());
        set_online(false);
        assert!(!is_online());
        set_online(true);
    }
}
