/// In-memory browser used by the async tests
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::host::{HostError, IndicatorSink, SettingsStore, TabProvider, Timer};
use crate::tab_data::{Indicator, Scope, Tab, TabId};

pub struct FakeHost {
    tabs: RefCell<Vec<Tab>>,
    focused_window: Cell<i32>,
    settings: RefCell<Map<String, Value>>,
    storage_fails: Cell<bool>,
    tabs_fail: Cell<bool>,
    close_failures: RefCell<HashSet<TabId>>,
    close_attempts: RefCell<Vec<TabId>>,
    queries: RefCell<Vec<Scope>>,
    indicators: RefCell<Vec<(TabId, Indicator)>>,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            tabs: RefCell::new(Vec::new()),
            focused_window: Cell::new(1),
            settings: RefCell::new(Map::new()),
            storage_fails: Cell::new(false),
            tabs_fail: Cell::new(false),
            close_failures: RefCell::new(HashSet::new()),
            close_attempts: RefCell::new(Vec::new()),
            queries: RefCell::new(Vec::new()),
            indicators: RefCell::new(Vec::new()),
        }
    }

    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        let host = Self::new();
        *host.tabs.borrow_mut() = tabs;
        host
    }

    pub fn open(&self, tab: Tab) {
        self.tabs.borrow_mut().push(tab);
    }

    pub fn open_ids(&self) -> Vec<TabId> {
        self.tabs.borrow().iter().map(|t| t.id).collect()
    }

    pub fn set_url(&self, id: TabId, url: &str) {
        if let Some(tab) = self.tabs.borrow_mut().iter_mut().find(|t| t.id == id) {
            tab.url = url.to_string();
        }
    }

    pub fn focus_window(&self, window_id: i32) {
        self.focused_window.set(window_id);
    }

    pub fn store(&self, key: &str, value: Value) {
        self.settings.borrow_mut().insert(key.to_string(), value);
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        self.settings.borrow().get(key).cloned()
    }

    pub fn fail_storage(&self, fail: bool) {
        self.storage_fails.set(fail);
    }

    pub fn fail_tab_queries(&self, fail: bool) {
        self.tabs_fail.set(fail);
    }

    pub fn fail_close(&self, id: TabId) {
        self.close_failures.borrow_mut().insert(id);
    }

    pub fn close_attempts(&self) -> Vec<TabId> {
        self.close_attempts.borrow().clone()
    }

    pub fn queries(&self) -> Vec<Scope> {
        self.queries.borrow().clone()
    }

    pub fn indicators(&self) -> Vec<(TabId, Indicator)> {
        self.indicators.borrow().clone()
    }
}

impl TabProvider for FakeHost {
    async fn query_tabs(&self, scope: Scope) -> Result<Vec<Tab>, HostError> {
        self.queries.borrow_mut().push(scope);
        if self.tabs_fail.get() {
            return Err(HostError::Tabs("query rejected".to_string()));
        }

        let focused = self.focused_window.get();
        let tabs = self.tabs.borrow();
        let selected = tabs
            .iter()
            .filter(|tab| match scope {
                Scope::AllWindows => true,
                Scope::LastFocusedWindow => tab.window_id == focused,
                Scope::ActiveTab => tab.window_id == focused && tab.active,
            })
            .cloned()
            .collect();
        Ok(selected)
    }

    async fn get_tab(&self, id: TabId) -> Result<Option<Tab>, HostError> {
        Ok(self.tabs.borrow().iter().find(|t| t.id == id).cloned())
    }

    async fn close_tab(&self, id: TabId) -> Result<(), HostError> {
        self.close_attempts.borrow_mut().push(id);
        if self.close_failures.borrow().contains(&id) {
            return Err(HostError::Tabs(format!("cannot close tab {}", id)));
        }

        let mut tabs = self.tabs.borrow_mut();
        match tabs.iter().position(|t| t.id == id) {
            Some(index) => {
                tabs.remove(index);
                Ok(())
            }
            None => Err(HostError::Tabs(format!("no tab with id: {}", id))),
        }
    }
}

impl SettingsStore for FakeHost {
    async fn read(&self, key: &str) -> Result<Option<Value>, HostError> {
        if self.storage_fails.get() {
            return Err(HostError::Storage("quota exceeded".to_string()));
        }
        Ok(self.settings.borrow().get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), HostError> {
        if self.storage_fails.get() {
            return Err(HostError::Storage("quota exceeded".to_string()));
        }
        self.settings.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    async fn read_all(&self) -> Result<Map<String, Value>, HostError> {
        if self.storage_fails.get() {
            return Err(HostError::Storage("quota exceeded".to_string()));
        }
        Ok(self.settings.borrow().clone())
    }
}

impl IndicatorSink for FakeHost {
    async fn set_indicator(&self, tab: TabId, indicator: Indicator) -> Result<(), HostError> {
        self.indicators.borrow_mut().push((tab, indicator));
        Ok(())
    }
}

impl Timer for FakeHost {
    async fn sleep(&self, ms: u32) {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).await;
    }
}
