#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use web_time::Duration;

    use crate::cancel::{CancelToken, Dispose};
    use crate::clock::{self, TestClock};
    use crate::signal::signal;

    #[test]
    fn signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn signal_subscription() {
        let sig = signal(0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen2 = seen.clone();
        sig.subscribe(move |v| seen2.borrow_mut().push(*v));

        sig.set(1);
        sig.update(|v| *v += 1);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn signal_unsubscribe() {
        let sig = signal(0);
        let hits = Rc::new(RefCell::new(0));

        let hits2 = hits.clone();
        let key = sig.subscribe(move |_| *hits2.borrow_mut() += 1);

        sig.set(1);
        sig.unsubscribe(key);
        sig.set(2);

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(sig.subscriber_count(), 0);
    }

    #[test]
    fn signal_subscriber_may_read_reentrantly() {
        let sig = signal(5);
        let mirrored = Rc::new(RefCell::new(0));

        let sig2 = sig.clone();
        let mirrored2 = mirrored.clone();
        sig.subscribe(move |_| *mirrored2.borrow_mut() = sig2.get());

        sig.set(9);
        assert_eq!(*mirrored.borrow(), 9);
    }

    #[test]
    fn subscribe_until_token_cancels() {
        let sig = signal(0);
        let token = CancelToken::new();
        let hits = Rc::new(RefCell::new(0));

        let hits2 = hits.clone();
        sig.subscribe_until(&token, move |_| *hits2.borrow_mut() += 1);

        sig.set(1);
        token.cancel();
        sig.set(2);

        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn dispose_runs_once() {
        let hits = Rc::new(RefCell::new(0));
        let hits2 = hits.clone();
        let d = Dispose::new(move || *hits2.borrow_mut() += 1);

        d.run();
        d.run();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn cancel_token_is_idempotent() {
        let token = CancelToken::new();
        let hits = Rc::new(RefCell::new(0));

        let hits2 = hits.clone();
        token.on_cancel(move || *hits2.borrow_mut() += 1);

        token.cancel();
        token.cancel();
        assert_eq!(*hits.borrow(), 1);
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_token_runs_late_registrations_immediately() {
        let token = CancelToken::new();
        token.cancel();

        let ran = Rc::new(RefCell::new(false));
        let ran2 = ran.clone();
        token.on_cancel(move || *ran2.borrow_mut() = true);

        assert!(*ran.borrow());
    }

    #[test]
    fn linked_token_follows_parent() {
        let parent = CancelToken::new();
        let child = CancelToken::linked(Some(&parent));

        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn linked_token_cancels_independently() {
        let parent = CancelToken::new();
        let child = CancelToken::linked(Some(&parent));

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_clock_advances_deterministically() {
        let clock = TestClock::install();
        let t0 = clock::now();

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock::now() - t0, Duration::from_millis(250));

        clock.advance(Duration::from_millis(750));
        assert_eq!(clock::now() - t0, Duration::from_millis(1000));
    }
}
