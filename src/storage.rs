/// Storage plumbing for options, ignore lists and auxiliary UI data
///
/// Every read and write here is best effort: failures are logged and the
/// caller carries on with a fallback, matching how the extension treats its
/// key/value store.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{Config, ConfigKey};
use crate::host::SettingsStore;
use crate::ignore::{coerce_list, IgnoreKind, IgnoreList};

pub const FIRST_RUN_KEY: &str = "firstrun";
pub const DATA_PREFIX: &str = "data:";

/// A free-form `data:*` entry stored on behalf of the UI pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraEntry {
    pub id: String,
    pub value: Value,
}

pub async fn read_value<S: SettingsStore>(store: &S, key: &str) -> Option<Value> {
    match store.read(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!("reading {} failed: {}", key, e);
            None
        }
    }
}

pub async fn write_value<S: SettingsStore>(store: &S, key: &str, value: Value) -> bool {
    match store.write(key, value).await {
        Ok(()) => true,
        Err(e) => {
            warn!("writing {} failed: {}", key, e);
            false
        }
    }
}

/// Load every option, falling back per key on missing or non-boolean values
pub async fn load_config<S: SettingsStore>(store: &S) -> Config {
    let defaults = Config::default();
    let mut config = defaults;
    for key in ConfigKey::ALL {
        let value = read_value(store, key.as_str())
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or_else(|| defaults.get(key));
        config.set(key, value);
    }
    config
}

pub async fn save_config<S: SettingsStore>(store: &S, config: &Config) {
    for key in ConfigKey::ALL {
        write_value(store, key.as_str(), Value::Bool(config.get(key))).await;
    }
}

/// Seed defaults on the very first run, otherwise load what is stored
pub async fn load_or_seed_config<S: SettingsStore>(store: &S) -> Config {
    let first_run_done = read_value(store, FIRST_RUN_KEY)
        .await
        .is_some_and(|v| is_truthy(&v));

    if first_run_done {
        return load_config(store).await;
    }

    let config = Config::default();
    save_config(store, &config).await;
    write_value(store, FIRST_RUN_KEY, Value::Bool(true)).await;
    config
}

pub async fn load_entries<S: SettingsStore>(store: &S, kind: IgnoreKind) -> Vec<String> {
    coerce_list(read_value(store, kind.storage_key()).await)
}

pub async fn save_entries<S: SettingsStore>(store: &S, kind: IgnoreKind, entries: &[String]) -> bool {
    let value = Value::Array(entries.iter().cloned().map(Value::String).collect());
    write_value(store, kind.storage_key(), value).await
}

pub async fn load_ignore_list<S: SettingsStore>(store: &S) -> IgnoreList {
    IgnoreList {
        urls: load_entries(store, IgnoreKind::Url).await,
        hosts: load_entries(store, IgnoreKind::Host).await,
    }
}

pub async fn write_extra<S: SettingsStore>(store: &S, id: &str, value: Value) -> bool {
    write_value(store, &format!("{}{}", DATA_PREFIX, id), value).await
}

pub async fn load_extra<S: SettingsStore>(store: &S) -> Vec<ExtraEntry> {
    let all = match store.read_all().await {
        Ok(all) => all,
        Err(e) => {
            warn!("reading storage failed: {}", e);
            return Vec::new();
        }
    };

    all.into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(DATA_PREFIX).map(|id| ExtraEntry {
                id: id.to_string(),
                value,
            })
        })
        .collect()
}

/// Loose truthiness of values coming from JavaScript
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::testing::FakeHost;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_run_seeds_defaults() {
        let host = FakeHost::new();

        let config = load_or_seed_config(&host).await;

        assert_eq!(config, Config::default());
        assert_eq!(host.stored("firstrun"), Some(json!(true)));
        assert_eq!(host.stored("hash"), Some(json!(false)));
        assert_eq!(host.stored("old"), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_later_runs_load_stored_options() {
        let host = FakeHost::new();
        host.store("firstrun", json!(true));
        host.store("hash", json!(true));
        host.store("windows", json!("yes"));

        let config = load_or_seed_config(&host).await;

        assert!(config.hash);
        assert!(config.windows, "non-boolean falls back to the default");
        assert_eq!(host.stored("old"), None, "nothing is re-seeded");
    }

    #[tokio::test]
    async fn test_read_failures_fall_back() {
        let host = FakeHost::new();
        host.store("turnoff", json!(true));
        host.fail_storage(true);

        assert_eq!(load_config(&host).await, Config::default());
        assert_eq!(load_ignore_list(&host).await, IgnoreList::new());
        assert!(!write_extra(&host, "theme", json!("dark")).await);
    }

    #[tokio::test]
    async fn test_ignore_lists_roundtrip_through_store() {
        let host = FakeHost::new();
        host.store("hosts", json!({"not": "a list"}));

        let entries = vec!["https://a.com/".to_string()];
        assert!(save_entries(&host, IgnoreKind::Url, &entries).await);

        let ignored = load_ignore_list(&host).await;
        assert_eq!(ignored.urls, entries);
        assert!(ignored.hosts.is_empty());
    }

    #[tokio::test]
    async fn test_extra_entries() {
        let host = FakeHost::new();
        host.store("hash", json!(true));
        write_extra(&host, "color-scheme", json!("dark")).await;

        let extra = load_extra(&host).await;

        assert_eq!(
            extra,
            vec![ExtraEntry { id: "color-scheme".to_string(), value: json!("dark") }]
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("x")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }
}
