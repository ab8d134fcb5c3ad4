use std::cell::RefCell;

/// Tab identity. Hosts key tabs by strings, numbers, or booleans, so all
/// three are first-class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TabId {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for TabId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for TabId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for TabId {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

pub trait TabItem {
    fn tab_id(&self) -> TabId;
}

/// Where tabs come from: a fixed list, or a resolver queried on every read.
pub enum TabSource<T> {
    List(Vec<T>),
    Resolver(Box<dyn Fn() -> Vec<T>>),
}

pub struct TabManagerConfig<T> {
    pub tabs: TabSource<T>,
    /// Used when the resolved active id is missing from the tab list;
    /// otherwise the first tab wins.
    pub fallback: Option<TabId>,
    /// External active-id statement. When set, `set_active_tab` never stores
    /// locally; the resolver is the source of truth.
    pub active_resolver: Option<Box<dyn Fn() -> Option<TabId>>>,
    pub on_change: Option<Box<dyn Fn(&TabId, Option<&T>)>>,
}

/// Tracks which item of a list is active, with fallback resolution.
pub struct TabManager<T: TabItem + Clone> {
    config: TabManagerConfig<T>,
    local_active: RefCell<Option<TabId>>,
    local_tabs: RefCell<Option<Vec<T>>>,
}

impl<T: TabItem + Clone> TabManager<T> {
    pub fn new(config: TabManagerConfig<T>) -> Self {
        Self {
            config,
            local_active: RefCell::new(None),
            local_tabs: RefCell::new(None),
        }
    }

    pub fn tabs(&self) -> Vec<T> {
        if let Some(tabs) = self.local_tabs.borrow().as_ref() {
            return tabs.clone();
        }
        match &self.config.tabs {
            TabSource::List(tabs) => tabs.clone(),
            TabSource::Resolver(f) => f(),
        }
    }

    /// Switches to self-controlled tabs; the configured source is ignored
    /// from here on.
    pub fn set_tabs(&self, tabs: Vec<T>) {
        *self.local_tabs.borrow_mut() = Some(tabs);
    }

    pub fn tabs_count(&self) -> usize {
        self.tabs().len()
    }

    pub fn tab_data(&self, id: &TabId) -> Option<T> {
        self.tabs().into_iter().find(|t| t.tab_id() == *id)
    }

    /// Resolution order: external resolver, locally set id, fallback, first
    /// tab. An id that doesn't match any tab falls through the same chain.
    pub fn active_tab(&self) -> Option<TabId> {
        let tabs = self.tabs();
        let candidate = match &self.config.active_resolver {
            Some(resolve) => resolve(),
            None => self.local_active.borrow().clone(),
        };

        let valid = |id: &TabId| tabs.iter().any(|t| t.tab_id() == *id);

        if let Some(id) = candidate
            && valid(&id)
        {
            return Some(id);
        }
        if let Some(fallback) = &self.config.fallback {
            return Some(fallback.clone());
        }
        tabs.first().map(|t| t.tab_id())
    }

    pub fn active_tab_data(&self) -> Option<T> {
        self.tab_data(&self.active_tab()?)
    }

    /// No-op when `id` is already active. `on_change` receives the incoming
    /// id and the data of the tab that was active at call time.
    pub fn set_active_tab(&self, id: impl Into<TabId>) {
        let id = id.into();
        if self.active_tab().as_ref() == Some(&id) {
            return;
        }

        if let Some(on_change) = &self.config.on_change {
            let current = self.active_tab_data();
            on_change(&id, current.as_ref());
        }

        if self.config.active_resolver.is_none() {
            *self.local_active.borrow_mut() = Some(id);
        }
    }
}
