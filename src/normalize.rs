/// Turns a tab into the key that decides which tabs count as the same page
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::ignore::IgnoreList;
use crate::tab_data::Tab;

static NEW_TAB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(about:(blank|newtab|home)|chrome:/+(newtab|startpageshared)/?)$")
        .expect("new tab pattern is valid")
});

static HTTP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\w").expect("http pattern is valid"));

/// Why a tab takes no part in deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Pinned,
    EmptyUrl,
    NewTab,
    Incognito,
    NotHttp,
    Ignored,
}

/// Identity of a tab under the current options
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_new_tab(url: &str) -> bool {
    NEW_TAB_RE.is_match(url)
}

pub fn is_http(url: &str) -> bool {
    HTTP_RE.is_match(url)
}

/// Check the skip rules in precedence order
pub fn skip_reason(tab: &Tab, config: &Config, ignored: &IgnoreList) -> Option<SkipReason> {
    let url = tab.url.as_str();
    if tab.pinned {
        Some(SkipReason::Pinned)
    } else if url.is_empty() {
        Some(SkipReason::EmptyUrl)
    } else if is_new_tab(url) {
        Some(SkipReason::NewTab)
    } else if tab.incognito && !config.incognito {
        Some(SkipReason::Incognito)
    } else if config.http && !is_http(url) {
        Some(SkipReason::NotHttp)
    } else if ignored.is_ignored(url) {
        Some(SkipReason::Ignored)
    } else {
        None
    }
}

/// Canonical key for `tab`, or the reason it is left alone
pub fn canonical_key(
    tab: &Tab,
    config: &Config,
    ignored: &IgnoreList,
) -> Result<CanonicalKey, SkipReason> {
    if let Some(reason) = skip_reason(tab, config, ignored) {
        return Err(reason);
    }

    let url = significant_url(&tab.url, config);
    let prefix = partition_prefix(tab, config);

    let key = if config.windows {
        format!("{}::{}::{}", prefix, tab.window_id, url)
    } else {
        format!("{}::{}", prefix, url)
    };
    Ok(CanonicalKey(key))
}

/// Drop the fragment and/or query string when they are not significant
pub fn significant_url<'a>(url: &'a str, config: &Config) -> &'a str {
    let mut url = url;
    if !config.hash {
        url = strip_from(url, '#');
    }
    if !config.query {
        url = strip_from(url, '?');
    }
    url
}

// A marker with nothing after it is kept.
fn strip_from(url: &str, marker: char) -> &str {
    match url.find(marker) {
        Some(index) if index + marker.len_utf8() < url.len() => &url[..index],
        _ => url,
    }
}

fn partition_prefix<'a>(tab: &'a Tab, config: &Config) -> &'a str {
    if tab.incognito {
        return "incognito";
    }
    match tab.cookie_store_id.as_deref() {
        Some(container) if config.containers && !container.is_empty() => container,
        _ => "normal",
    }
}
