/// URLs and hosts exempted from duplicate detection
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Which ignore list an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreKind {
    Url,
    Host,
}

impl IgnoreKind {
    /// Storage key holding the list
    pub fn storage_key(self) -> &'static str {
        match self {
            IgnoreKind::Url => "urls",
            IgnoreKind::Host => "hosts",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreList {
    pub urls: Vec<String>,
    pub hosts: Vec<String>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw stored values, treating anything malformed as empty
    pub fn from_stored(urls: Option<Value>, hosts: Option<Value>) -> Self {
        IgnoreList {
            urls: coerce_list(urls),
            hosts: coerce_list(hosts),
        }
    }

    pub fn entries(&self, kind: IgnoreKind) -> &[String] {
        match kind {
            IgnoreKind::Url => &self.urls,
            IgnoreKind::Host => &self.hosts,
        }
    }

    pub fn replace(&mut self, kind: IgnoreKind, entries: Vec<String>) {
        match kind {
            IgnoreKind::Url => self.urls = entries,
            IgnoreKind::Host => self.hosts = entries,
        }
    }

    pub fn is_ignored(&self, url: &str) -> bool {
        if self.urls.iter().any(|u| u == url) {
            return true;
        }
        match url_host(url) {
            Some(host) => self.hosts.iter().any(|h| *h == host),
            None => false,
        }
    }

    /// Add or remove `value`; returns whether the list changed
    pub fn toggle(&mut self, kind: IgnoreKind, on: bool, value: &str) -> bool {
        let list = match kind {
            IgnoreKind::Url => &mut self.urls,
            IgnoreKind::Host => &mut self.hosts,
        };
        toggle_entry(list, on, value)
    }
}

/// Add or remove `value` in a single list; returns whether it changed
pub fn toggle_entry(list: &mut Vec<String>, on: bool, value: &str) -> bool {
    let index = list.iter().position(|entry| entry == value);
    match (on, index) {
        (true, None) => {
            list.push(value.to_string());
            true
        }
        (false, Some(index)) => {
            list.remove(index);
            true
        }
        _ => false,
    }
}

/// Read a stored list; non-arrays become empty and non-string entries are dropped
pub fn coerce_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Host of a URL as the browser reports it: hostname plus any explicit port
pub fn url_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
