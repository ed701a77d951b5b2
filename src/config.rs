/// Detection options and the lifecycle triggers they enable
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tab_data::Scope;

/// Names of the recognized options, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Turnoff,
    Old,
    Active,
    Start,
    Replace,
    Update,
    Create,
    Attach,
    DataChange,
    Http,
    Query,
    Hash,
    Incognito,
    Windows,
    Containers,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 15] = [
        ConfigKey::Turnoff,
        ConfigKey::Old,
        ConfigKey::Active,
        ConfigKey::Start,
        ConfigKey::Replace,
        ConfigKey::Update,
        ConfigKey::Create,
        ConfigKey::Attach,
        ConfigKey::DataChange,
        ConfigKey::Http,
        ConfigKey::Query,
        ConfigKey::Hash,
        ConfigKey::Incognito,
        ConfigKey::Windows,
        ConfigKey::Containers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Turnoff => "turnoff",
            ConfigKey::Old => "old",
            ConfigKey::Active => "active",
            ConfigKey::Start => "start",
            ConfigKey::Replace => "replace",
            ConfigKey::Update => "update",
            ConfigKey::Create => "create",
            ConfigKey::Attach => "attach",
            ConfigKey::DataChange => "datachange",
            ConfigKey::Http => "http",
            ConfigKey::Query => "query",
            ConfigKey::Hash => "hash",
            ConfigKey::Incognito => "incognito",
            ConfigKey::Windows => "windows",
            ConfigKey::Containers => "containers",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown option: {}", s))
    }
}

/// The full set of boolean options driving detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub turnoff: bool,
    pub old: bool,
    pub active: bool,
    pub start: bool,
    pub replace: bool,
    pub update: bool,
    pub create: bool,
    pub attach: bool,
    pub datachange: bool,
    pub http: bool,
    pub query: bool,
    pub hash: bool,
    pub incognito: bool,
    pub windows: bool,
    pub containers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            turnoff: false,
            old: true,
            active: true,
            start: true,
            replace: true,
            update: true,
            create: true,
            attach: true,
            datachange: true,
            http: true,
            query: true,
            hash: false,
            incognito: false,
            windows: true,
            containers: true,
        }
    }
}

impl Config {
    pub fn get(&self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::Turnoff => self.turnoff,
            ConfigKey::Old => self.old,
            ConfigKey::Active => self.active,
            ConfigKey::Start => self.start,
            ConfigKey::Replace => self.replace,
            ConfigKey::Update => self.update,
            ConfigKey::Create => self.create,
            ConfigKey::Attach => self.attach,
            ConfigKey::DataChange => self.datachange,
            ConfigKey::Http => self.http,
            ConfigKey::Query => self.query,
            ConfigKey::Hash => self.hash,
            ConfigKey::Incognito => self.incognito,
            ConfigKey::Windows => self.windows,
            ConfigKey::Containers => self.containers,
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: bool) {
        let slot = match key {
            ConfigKey::Turnoff => &mut self.turnoff,
            ConfigKey::Old => &mut self.old,
            ConfigKey::Active => &mut self.active,
            ConfigKey::Start => &mut self.start,
            ConfigKey::Replace => &mut self.replace,
            ConfigKey::Update => &mut self.update,
            ConfigKey::Create => &mut self.create,
            ConfigKey::Attach => &mut self.attach,
            ConfigKey::DataChange => &mut self.datachange,
            ConfigKey::Http => &mut self.http,
            ConfigKey::Query => &mut self.query,
            ConfigKey::Hash => &mut self.hash,
            ConfigKey::Incognito => &mut self.incognito,
            ConfigKey::Windows => &mut self.windows,
            ConfigKey::Containers => &mut self.containers,
        };
        *slot = value;
    }

    /// Set an option by its stored name; unknown names are ignored
    pub fn set_named(&mut self, name: &str, value: bool) -> bool {
        match name.parse::<ConfigKey>() {
            Ok(key) => {
                self.set(key, value);
                true
            }
            Err(_) => false,
        }
    }

    /// True when the kill switch is on or no trigger can ever fire
    pub fn is_disabled(&self) -> bool {
        self.turnoff
            || !(self.start
                || self.replace
                || self.update
                || self.create
                || self.attach
                || self.datachange)
    }

    pub fn triggers(&self, trigger: Trigger) -> bool {
        self.get(trigger.option())
    }

    /// Tabs a detection pass looks at
    pub fn scope(&self) -> Scope {
        if self.windows {
            Scope::LastFocusedWindow
        } else {
            Scope::AllWindows
        }
    }

    pub fn survivor_prefs(&self) -> SurvivorPrefs {
        SurvivorPrefs {
            prefer_active: self.active,
            keep_oldest: self.old,
        }
    }
}

/// Tie-break preferences used when choosing which duplicate stays open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurvivorPrefs {
    pub prefer_active: bool,
    pub keep_oldest: bool,
}

/// Lifecycle events that may start a detection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Start,
    Create,
    Update,
    Replace,
    Attach,
    DataChange,
}

impl Trigger {
    pub fn option(self) -> ConfigKey {
        match self {
            Trigger::Start => ConfigKey::Start,
            Trigger::Create => ConfigKey::Create,
            Trigger::Update => ConfigKey::Update,
            Trigger::Replace => ConfigKey::Replace,
            Trigger::Attach => ConfigKey::Attach,
            Trigger::DataChange => ConfigKey::DataChange,
        }
    }

    /// Quiet period before the pass queries tabs
    pub fn delay_ms(self) -> u32 {
        match self {
            Trigger::Create | Trigger::Update | Trigger::Replace => 10,
            Trigger::Attach => 500,
            Trigger::Start | Trigger::DataChange => 100,
        }
    }
}

impl FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Trigger::Start),
            "create" => Ok(Trigger::Create),
            "update" => Ok(Trigger::Update),
            "replace" => Ok(Trigger::Replace),
            "attach" => Ok(Trigger::Attach),
            "datachange" => Ok(Trigger::DataChange),
            other => Err(format!("unknown trigger: {}", other)),
        }
    }
}
