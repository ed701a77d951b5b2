/// Tab Dedup - closes duplicate browser tabs
/// Built with Rust + WASM, driven from a Manifest V3 service worker

pub mod config;
pub mod debounce;
pub mod engine;
pub mod host;
pub mod ignore;
pub mod messages;
pub mod normalize;
pub mod operations;
pub mod storage;
pub mod tab_data;

#[cfg(target_arch = "wasm32")]
mod chrome;

#[cfg(target_arch = "wasm32")]
pub use chrome::{boot, on_message, on_startup, on_tab_activated, on_tab_event, ChromeHost};

#[cfg(all(test, not(target_arch = "wasm32")))]
mod testing;

use wasm_bindgen::prelude::*;

pub use config::{Config, ConfigKey, Trigger};
pub use engine::{Engine, PassOutcome, PassReport};
pub use ignore::{IgnoreKind, IgnoreList};
pub use tab_data::{Tab, TabId};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Debug));
}

// The popup offers "ignore this host" with the same host the engine matches on
#[wasm_bindgen]
pub fn ignore_host(url: &str) -> Option<String> {
    ignore::url_host(url)
}
