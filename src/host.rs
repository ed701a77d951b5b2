/// Services the browser provides to the detector
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tab_data::{Indicator, Scope, Tab, TabId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("tabs API failed: {0}")]
    Tabs(String),
    #[error("storage failed: {0}")]
    Storage(String),
    #[error("could not set indicator: {0}")]
    Indicator(String),
    #[error("unexpected value from browser: {0}")]
    Decode(String),
}

#[allow(async_fn_in_trait)]
pub trait TabProvider {
    async fn query_tabs(&self, scope: Scope) -> Result<Vec<Tab>, HostError>;

    /// `Ok(None)` when the tab no longer exists
    async fn get_tab(&self, id: TabId) -> Result<Option<Tab>, HostError>;

    async fn close_tab(&self, id: TabId) -> Result<(), HostError>;
}

/// Persistent key/value settings
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, HostError>;

    async fn write(&self, key: &str, value: Value) -> Result<(), HostError>;

    async fn read_all(&self) -> Result<Map<String, Value>, HostError>;
}

#[allow(async_fn_in_trait)]
pub trait IndicatorSink {
    async fn set_indicator(&self, tab: TabId, indicator: Indicator) -> Result<(), HostError>;
}

#[allow(async_fn_in_trait)]
pub trait Timer {
    async fn sleep(&self, ms: u32);
}

/// Everything the engine needs from its environment
pub trait Host: TabProvider + SettingsStore + IndicatorSink + Timer {}

impl<T> Host for T where T: TabProvider + SettingsStore + IndicatorSink + Timer {}
