/// Data structures for browser tabs as seen by the duplicate detector
use serde::{Deserialize, Serialize};

pub type TabId = i32;

/// A browser tab captured in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub window_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_store_id: Option<String>,
}

impl Tab {
    pub fn new(id: TabId, url: &str, window_id: i32) -> Tab {
        Tab {
            id,
            url: url.to_string(),
            pending_url: None,
            pinned: false,
            active: false,
            incognito: false,
            window_id,
            cookie_store_id: None,
        }
    }

    /// The committed URL, or the pending one while a navigation is starting
    pub fn current_url(&self) -> Option<String> {
        if !self.url.is_empty() {
            return Some(self.url.clone());
        }
        self.pending_url.clone().filter(|url| !url.is_empty())
    }
}

/// Which tabs a snapshot query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    LastFocusedWindow,
    AllWindows,
    /// The active tab of the last focused window
    ActiveTab,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::LastFocusedWindow => "window",
            Scope::AllWindows => "all",
            Scope::ActiveTab => "active",
        }
    }
}

/// Toolbar status shown for a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Active,
    Disabled,
}

impl Indicator {
    pub fn icon_path(self) -> &'static str {
        match self {
            Indicator::Active => "/images/icon.png",
            Indicator::Disabled => "/images/disabled.png",
        }
    }
}
