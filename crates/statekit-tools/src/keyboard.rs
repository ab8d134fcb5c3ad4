use std::str::FromStr;

use smallvec::SmallVec;
use statekit_core::{CancelToken, Signal, signal};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL  = 1 << 1;
        const ALT   = 1 << 2;
        const META  = 1 << 3;
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShortcutParseError {
    #[error("empty shortcut spec")]
    Empty,
    #[error("shortcut names more than one non-modifier key: '{0}'")]
    ExtraKey(String),
}

/// A parsed `"Ctrl+Shift+K"` style spec: a modifier set plus at most one
/// named key. A spec of only modifiers (e.g. `"Shift"`) matches any event
/// with that modifier held, including the modifier keypress itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub key: Option<String>,
}

impl FromStr for Shortcut {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut key = None;

        for token in s.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "Shift" => modifiers |= Modifiers::SHIFT,
                "Ctrl" => modifiers |= Modifiers::CTRL,
                "Alt" => modifiers |= Modifiers::ALT,
                "Meta" => modifiers |= Modifiers::META,
                other => {
                    if key.is_some() {
                        return Err(ShortcutParseError::ExtraKey(other.to_owned()));
                    }
                    key = Some(other.to_owned());
                }
            }
        }

        if modifiers.is_empty() && key.is_none() {
            return Err(ShortcutParseError::Empty);
        }
        Ok(Self { modifiers, key })
    }
}

impl Shortcut {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.modifiers.contains(self.modifiers)
            && self.key.as_deref().is_none_or(|k| event.key == k)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// One dispatchable action: shortcuts that trigger it, an optional disable
/// predicate, and the handler.
pub struct KeyAction {
    shortcuts: SmallVec<[Shortcut; 2]>,
    disabled: Option<Box<dyn Fn() -> bool>>,
    handler: Box<dyn FnMut(&KeyEvent)>,
}

impl KeyAction {
    /// Specs that fail to parse are logged and skipped rather than rejected.
    pub fn new<S: AsRef<str>>(specs: &[S], handler: impl FnMut(&KeyEvent) + 'static) -> Self {
        let shortcuts = specs
            .iter()
            .filter_map(|s| match Shortcut::from_str(s.as_ref()) {
                Ok(sc) => Some(sc),
                Err(err) => {
                    log::warn!("keyboard: skipping shortcut '{}': {err}", s.as_ref());
                    None
                }
            })
            .collect();
        Self {
            shortcuts,
            disabled: None,
            handler: Box::new(handler),
        }
    }

    pub fn disabled_when(mut self, predicate: impl Fn() -> bool + 'static) -> Self {
        self.disabled = Some(Box::new(predicate));
        self
    }
}

/// When the handler starts reacting to keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Activation {
    #[default]
    Immediate,
    /// Caller activates by hand.
    Manual,
    /// Activates on the first key it sees (that key is still dispatched).
    FirstKey,
}

#[derive(Default)]
pub struct KeyboardConfig {
    pub actions: Vec<KeyAction>,
    pub activation: Activation,
    pub on_activate: Option<Box<dyn Fn()>>,
    pub on_deactivate: Option<Box<dyn Fn()>>,
    pub on_key: Option<Box<dyn Fn(&KeyEvent)>>,
    pub cancel: Option<CancelToken>,
}

/// Dispatches key events to the first enabled action with a matching
/// shortcut. The host feeds events in via [`KeyboardHandler::handle_key`].
pub struct KeyboardHandler {
    actions: Vec<KeyAction>,
    activation: Activation,
    is_activated: Signal<bool>,
    on_activate: Option<Box<dyn Fn()>>,
    on_deactivate: Option<Box<dyn Fn()>>,
    on_key: Option<Box<dyn Fn(&KeyEvent)>>,
    token: CancelToken,
}

impl KeyboardHandler {
    pub fn new(config: KeyboardConfig) -> Self {
        Self {
            actions: config.actions,
            activation: config.activation,
            is_activated: signal(config.activation == Activation::Immediate),
            on_activate: config.on_activate,
            on_deactivate: config.on_deactivate,
            on_key: config.on_key,
            token: CancelToken::linked(config.cancel.as_ref()),
        }
    }

    pub fn is_activated(&self) -> bool {
        self.is_activated.get()
    }

    pub fn activate(&self) {
        if self.is_activated.get() {
            return;
        }
        self.is_activated.set(true);
        if let Some(f) = &self.on_activate {
            f();
        }
    }

    pub fn deactivate(&self) {
        if !self.is_activated.get() {
            return;
        }
        self.is_activated.set(false);
        if let Some(f) = &self.on_deactivate {
            f();
        }
    }

    pub fn set_actions(&mut self, actions: Vec<KeyAction>) {
        self.actions = actions;
    }

    /// Feeds one event through. The first enabled action with a fully
    /// matched shortcut handles it; later actions never see the event.
    pub fn handle_key(&mut self, event: &KeyEvent) {
        if self.token.is_cancelled() {
            return;
        }
        if let Some(f) = &self.on_key {
            f(event);
        }
        if self.activation == Activation::FirstKey {
            self.activate();
        }
        if !self.is_activated.get() {
            return;
        }

        for action in &mut self.actions {
            if action.disabled.as_ref().is_some_and(|d| d()) {
                continue;
            }
            if action.shortcuts.iter().any(|sc| sc.matches(event)) {
                (action.handler)(event);
                return;
            }
        }
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

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) + Clone) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = log.clone();
        (log, move |name| log2.borrow_mut().push(name))
    }

    #[test]
    fn parses_modifier_and_key_specs() {
        let sc: Shortcut = "Ctrl+Shift+K".parse().unwrap();
        assert_eq!(sc.modifiers, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(sc.key.as_deref(), Some("K"));

        let sc: Shortcut = "Enter".parse().unwrap();
        assert_eq!(sc.modifiers, Modifiers::empty());
        assert_eq!(sc.key.as_deref(), Some("Enter"));

        let sc: Shortcut = "Shift".parse().unwrap();
        assert_eq!(sc.key, None);
    }

    #[test]
    fn rejects_empty_and_double_key_specs() {
        assert_eq!("".parse::<Shortcut>(), Err(ShortcutParseError::Empty));
        assert_eq!(
            "A+B".parse::<Shortcut>(),
            Err(ShortcutParseError::ExtraKey("B".to_owned()))
        );
    }

    #[test]
    fn modifier_only_shortcut_matches_held_modifier() {
        let sc: Shortcut = "Shift".parse().unwrap();
        assert!(sc.matches(&KeyEvent::with_modifiers("Shift", Modifiers::SHIFT)));
        assert!(sc.matches(&KeyEvent::with_modifiers("a", Modifiers::SHIFT)));
        assert!(!sc.matches(&KeyEvent::new("a")));
    }

    #[test]
    fn combined_shortcut_needs_every_part() {
        let sc: Shortcut = "Shift+Enter".parse().unwrap();
        assert!(sc.matches(&KeyEvent::with_modifiers("Enter", Modifiers::SHIFT)));
        assert!(!sc.matches(&KeyEvent::new("Enter")));
        assert!(!sc.matches(&KeyEvent::with_modifiers("a", Modifiers::SHIFT)));
    }

    #[test]
    fn dispatches_first_matching_action_only() {
        let (hits, record) = recorder();
        let r1 = record.clone();
        let r2 = record.clone();
        let mut kb = KeyboardHandler::new(KeyboardConfig {
            actions: vec![
                KeyAction::new(&["Enter"], move |_| r1("first")),
                KeyAction::new(&["Enter", "Escape"], move |_| r2("second")),
            ],
            ..Default::default()
        });

        kb.handle_key(&KeyEvent::new("Enter"));
        assert_eq!(*hits.borrow(), vec!["first"]);

        kb.handle_key(&KeyEvent::new("Escape"));
        assert_eq!(*hits.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn disabled_actions_are_skipped() {
        let (hits, record) = recorder();
        let r1 = record.clone();
        let r2 = record.clone();
        let mut kb = KeyboardHandler::new(KeyboardConfig {
            actions: vec![
                KeyAction::new(&["Enter"], move |_| r1("disabled")).disabled_when(|| true),
                KeyAction::new(&["Enter"], move |_| r2("enabled")),
            ],
            ..Default::default()
        });

        kb.handle_key(&KeyEvent::new("Enter"));
        assert_eq!(*hits.borrow(), vec!["enabled"]);
    }

    #[test]
    fn manual_activation_gates_dispatch() {
        let (hits, record) = recorder();
        let mut kb = KeyboardHandler::new(KeyboardConfig {
            actions: vec![KeyAction::new(&["Enter"], move |_| record("hit"))],
            activation: Activation::Manual,
            ..Default::default()
        });

        assert!(!kb.is_activated());
        kb.handle_key(&KeyEvent::new("Enter"));
        assert!(hits.borrow().is_empty());

        kb.activate();
        kb.handle_key(&KeyEvent::new("Enter"));
        assert_eq!(*hits.borrow(), vec!["hit"]);
    }

    #[test]
    fn first_key_activation_dispatches_that_key() {
        let (hits, record) = recorder();
        let mut kb = KeyboardHandler::new(KeyboardConfig {
            actions: vec![KeyAction::new(&["Enter"], move |_| record("hit"))],
            activation: Activation::FirstKey,
            ..Default::default()
        });

        assert!(!kb.is_activated());
        kb.handle_key(&KeyEvent::new("Enter"));
        assert!(kb.is_activated());
        assert_eq!(*hits.borrow(), vec!["hit"]);
    }

    #[test]
    fn activation_callbacks_fire_once_per_transition() {
        let (hits, record) = recorder();
        let r1 = record.clone();
        let r2 = record.clone();
        let kb = KeyboardHandler::new(KeyboardConfig {
            activation: Activation::Manual,
            on_activate: Some(Box::new(move || r1("on"))),
            on_deactivate: Some(Box::new(move || r2("off"))),
            ..Default::default()
        });

        kb.activate();
        kb.activate();
        kb.deactivate();
        kb.deactivate();
        assert_eq!(*hits.borrow(), vec!["on", "off"]);
    }

    #[test]
    fn destroy_drops_all_dispatch() {
        let (hits, record) = recorder();
        let mut kb = KeyboardHandler::new(KeyboardConfig {
            actions: vec![KeyAction::new(&["Enter"], move |_| record("hit"))],
            ..Default::default()
        });

        kb.destroy();
        kb.handle_key(&KeyEvent::new("Enter"));
        assert!(hits.borrow().is_empty());
    }

    #[test]
    fn invalid_specs_are_skipped_not_fatal() {
        let (hits, record) = recorder();
        let mut kb = KeyboardHandler::new(KeyboardConfig {
            actions: vec![KeyAction::new(&["", "Enter"], move |_| record("hit"))],
            ..Default::default()
        });

        kb.handle_key(&KeyEvent::new("Enter"));
        assert_eq!(*hits.borrow(), vec!["hit"]);
    }
}
