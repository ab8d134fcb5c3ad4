use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::cancel::{CancelToken, Dispose};

slotmap::new_key_type! {
    /// Key of one subscription inside a [`Signal`].
    pub struct SubKey;
}

/// Observable value with an explicit subscription interface.
///
/// Cloning a `Signal` clones the handle, not the value.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: T,
    subs: SlotMap<SubKey, Rc<dyn Fn(&T)>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: SlotMap::with_key(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Reads through a borrow without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T)
    where
        T: Clone,
    {
        let subs = {
            let mut inner = self.0.borrow_mut();
            inner.value = v;
            inner.subs.values().cloned().collect::<Vec<_>>()
        };
        // Borrow is released before notifying, so a subscriber may read or
        // even write this signal re-entrantly.
        let value = self.get();
        for s in subs {
            s(&value);
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        let subs = {
            let mut inner = self.0.borrow_mut();
            f(&mut inner.value);
            inner.subs.values().cloned().collect::<Vec<_>>()
        };
        let value = self.get();
        for s in subs {
            s(&value);
        }
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubKey {
        self.0.borrow_mut().subs.insert(Rc::new(f))
    }

    pub fn unsubscribe(&self, key: SubKey) {
        self.0.borrow_mut().subs.remove(key);
    }

    /// Subscribes until `token` cancels. The returned guard removes the
    /// subscription earlier if run by hand.
    pub fn subscribe_until(&self, token: &CancelToken, f: impl Fn(&T) + 'static) -> Dispose {
        let key = self.subscribe(f);
        let sig = self.clone();
        let dispose = Dispose::new(move || sig.unsubscribe(key));
        let d = dispose.clone();
        token.on_cancel(move || d.run());
        dispose
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subs.len()
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
