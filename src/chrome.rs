/// Browser side: the `chrome.*` host and the service worker entry points
use std::rc::Rc;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::config::Trigger;
use crate::engine::Engine;
use crate::host::{HostError, IndicatorSink, SettingsStore, TabProvider, Timer};
use crate::messages::{error_response, Request};
use crate::tab_data::{Indicator, Scope, Tab, TabId};

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryTabs(scope: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getTab(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn closeTab(tab_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getAllStorage() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setIcon(tab_id: i32, path: &str) -> Result<JsValue, JsValue>;
}

/// Host backed by the extension APIs of the running browser
pub struct ChromeHost;

impl TabProvider for ChromeHost {
    async fn query_tabs(&self, scope: Scope) -> Result<Vec<Tab>, HostError> {
        let tabs = queryTabs(scope.as_str())
            .await
            .map_err(|e| HostError::Tabs(js_error(e)))?;
        decode(tabs)
    }

    async fn get_tab(&self, id: TabId) -> Result<Option<Tab>, HostError> {
        let tab = getTab(id).await.map_err(|e| HostError::Tabs(js_error(e)))?;
        if tab.is_null() || tab.is_undefined() {
            return Ok(None);
        }
        decode(tab).map(Some)
    }

    async fn close_tab(&self, id: TabId) -> Result<(), HostError> {
        closeTab(id).await.map_err(|e| HostError::Tabs(js_error(e)))?;
        Ok(())
    }
}

impl SettingsStore for ChromeHost {
    async fn read(&self, key: &str) -> Result<Option<Value>, HostError> {
        let value = getStorage(key)
            .await
            .map_err(|e| HostError::Storage(js_error(e)))?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        decode(value).map(Some)
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), HostError> {
        setStorage(key, encode(&value)?)
            .await
            .map_err(|e| HostError::Storage(js_error(e)))?;
        Ok(())
    }

    async fn read_all(&self) -> Result<Map<String, Value>, HostError> {
        let all = getAllStorage()
            .await
            .map_err(|e| HostError::Storage(js_error(e)))?;
        decode(all)
    }
}

impl IndicatorSink for ChromeHost {
    async fn set_indicator(&self, tab: TabId, indicator: Indicator) -> Result<(), HostError> {
        setIcon(tab, indicator.icon_path())
            .await
            .map_err(|e| HostError::Indicator(js_error(e)))?;
        Ok(())
    }
}

impl Timer for ChromeHost {
    async fn sleep(&self, ms: u32) {
        let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scope: web_sys::WorkerGlobalScope = js_sys::global().unchecked_into();
            if scope
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
                .is_err()
            {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, HostError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| HostError::Decode(e.to_string()))
}

// Plain objects rather than `Map`s, so chrome.storage can persist them.
fn encode(value: &Value) -> Result<JsValue, HostError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| HostError::Decode(e.to_string()))
}

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}

thread_local! {
    static ENGINE: Rc<Engine<ChromeHost>> = Rc::new(Engine::new(ChromeHost));
}

fn engine() -> Rc<Engine<ChromeHost>> {
    ENGINE.with(Rc::clone)
}

/// Service worker (re)started: load options without running a pass
#[wasm_bindgen]
pub fn boot() {
    let engine = engine();
    spawn_local(async move {
        engine.init().await;
    });
}

/// Browser started or extension installed
#[wasm_bindgen]
pub fn on_startup() {
    let engine = engine();
    spawn_local(async move {
        engine.start().await;
    });
}

/// A tab was created, updated, replaced or attached
#[wasm_bindgen]
pub fn on_tab_event(kind: &str, tab_id: i32, url: Option<String>) -> Result<(), JsValue> {
    let trigger: Trigger = kind.parse().map_err(|e: String| JsValue::from_str(&e))?;

    let pass = engine();
    spawn_local(async move {
        pass.trigger(trigger).await;
    });

    let indicator = engine();
    spawn_local(async move {
        indicator.schedule_indicator(tab_id, url).await;
    });
    Ok(())
}

#[wasm_bindgen]
pub fn on_tab_activated(tab_id: i32) {
    let engine = engine();
    spawn_local(async move {
        engine.refresh_indicator(tab_id, None).await;
    });
}

/// Handle a runtime message from the popup or options page
#[wasm_bindgen]
pub async fn on_message(request: JsValue) -> Result<JsValue, JsValue> {
    let engine = engine();

    let response = match decode::<Value>(request).map_err(|e| e.to_string()).and_then(Request::parse) {
        Ok(request) => {
            let recheck = request.changes_detection();
            let response = engine.handle_message(request).await;
            if recheck {
                let engine = engine.clone();
                spawn_local(async move {
                    engine.trigger(Trigger::DataChange).await;
                });
            }
            response
        }
        Err(e) => {
            warn!("rejected message: {}", e);
            error_response(&e)
        }
    };

    encode(&response).map_err(|e| JsValue::from_str(&e.to_string()))
}
