/// Detection engine: reacts to browser events and closes duplicate tabs
///
/// The engine owns the current options and ignore lists and talks to the
/// browser only through [`Host`]. It is single threaded: share it with
/// `Rc` and drive its futures on a local executor. No `RefCell` borrow is
/// held across an `.await`.

use std::cell::{Cell, RefCell};

use log::{debug, info, warn};
use serde_json::Value;

use crate::config::{Config, Trigger};
use crate::debounce::Debouncer;
use crate::host::{Host, TabProvider};
use crate::ignore::{coerce_list, toggle_entry, IgnoreKind, IgnoreList};
use crate::messages::{ack, to_response, Request};
use crate::operations::{plan_closures, DuplicateGroup};
use crate::storage;
use crate::tab_data::{Indicator, Scope, Tab, TabId};

/// Wait between taking the snapshot and grouping it
pub const HANDOFF_DELAY_MS: u32 = 50;
pub const INDICATOR_DELAY_MS: u32 = 100;
/// Wait between lookups of a tab that has no URL yet
pub const URL_RETRY_DELAY_MS: u32 = 500;
pub const URL_RETRY_LIMIT: u32 = 4;

/// Process-wide state read by every pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub config: Config,
    pub ignored: IgnoreList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    Idle,
    Scheduled,
    Running,
}

/// What one detection pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub groups: usize,
    pub closed: Vec<TabId>,
    pub failed: Vec<TabId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Detection is switched off for this trigger
    Gated,
    /// A newer trigger took over before this one ran
    Superseded,
    /// The tab snapshot could not be taken
    Failed,
    Completed(PassReport),
}

pub struct Engine<H> {
    host: H,
    settings: RefCell<Settings>,
    passes: Debouncer<()>,
    indicators: Debouncer<TabId>,
    running: Cell<usize>,
}

impl<H: Host> Engine<H> {
    pub fn new(host: H) -> Self {
        Self::with_settings(host, Settings::default())
    }

    pub fn with_settings(host: H, settings: Settings) -> Self {
        Engine {
            host,
            settings: RefCell::new(settings),
            passes: Debouncer::new(),
            indicators: Debouncer::new(),
            running: Cell::new(0),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn config(&self) -> Config {
        self.settings.borrow().config
    }

    pub fn phase(&self) -> PassPhase {
        if self.passes.is_pending(&()) {
            PassPhase::Scheduled
        } else if self.running.get() > 0 {
            PassPhase::Running
        } else {
            PassPhase::Idle
        }
    }

    /// Load options (seeding defaults on first run) and ignore lists
    pub async fn init(&self) {
        let config = storage::load_or_seed_config(&self.host).await;
        let ignored = storage::load_ignore_list(&self.host).await;
        info!(
            "loaded options ({} ignored urls, {} ignored hosts)",
            ignored.urls.len(),
            ignored.hosts.len()
        );
        *self.settings.borrow_mut() = Settings { config, ignored };
    }

    /// Browser startup or install: load state, then run the start pass
    pub async fn start(&self) -> PassOutcome {
        self.init().await;
        self.trigger(Trigger::Start).await
    }

    /// Schedule a detection pass for `trigger`.
    ///
    /// Only one pass is pending at a time: a newer trigger supersedes this
    /// one at any point before it starts closing tabs. The trigger's own
    /// option is only consulted here: once a pass is pending it also stands
    /// for the triggers it superseded.
    pub async fn trigger(&self, trigger: Trigger) -> PassOutcome {
        let config = self.config();
        if config.is_disabled() || !config.triggers(trigger) {
            debug!("{:?} does not trigger detection", trigger);
            return PassOutcome::Gated;
        }

        let ticket = self.passes.schedule(());
        self.host.sleep(trigger.delay_ms()).await;
        if !self.passes.is_current(&ticket) {
            return PassOutcome::Superseded;
        }

        let config = self.config();
        if config.is_disabled() {
            self.passes.fire(ticket);
            return PassOutcome::Gated;
        }

        let tabs = match self.host.query_tabs(config.scope()).await {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("could not list tabs: {}", e);
                self.passes.fire(ticket);
                return PassOutcome::Failed;
            }
        };

        self.host.sleep(HANDOFF_DELAY_MS).await;
        if !self.passes.fire(ticket) {
            return PassOutcome::Superseded;
        }
        if self.config().is_disabled() {
            return PassOutcome::Gated;
        }

        let _running = RunningGuard::enter(&self.running);
        let report = self.run_pass(&tabs).await;
        debug!(
            "{:?} pass: {} duplicate groups, closed {:?}",
            trigger, report.groups, report.closed
        );
        PassOutcome::Completed(report)
    }

    /// Group a snapshot under the current settings and close the duplicates
    pub async fn run_pass(&self, tabs: &[Tab]) -> PassReport {
        let Settings { config, ignored } = self.settings();
        let groups = plan_closures(tabs, &config, &ignored);

        let mut report = PassReport {
            groups: groups.len(),
            ..PassReport::default()
        };
        for group in &groups {
            close_duplicates(&self.host, group, &mut report).await;
        }
        report
    }

    pub fn indicator_for(&self, url: &str) -> Indicator {
        let settings = self.settings.borrow();
        if settings.config.is_disabled() || settings.ignored.is_ignored(url) {
            Indicator::Disabled
        } else {
            Indicator::Active
        }
    }

    /// Refresh a tab's indicator once its burst of events has settled
    pub async fn schedule_indicator(&self, tab: TabId, url: Option<String>) -> Option<Indicator> {
        let ticket = self.indicators.schedule(tab);
        self.host.sleep(INDICATOR_DELAY_MS).await;
        if !self.indicators.fire(ticket) {
            return None;
        }
        self.refresh_indicator(tab, url).await
    }

    /// Set the indicator for `tab`, looking its URL up when not given
    pub async fn refresh_indicator(&self, tab: TabId, url: Option<String>) -> Option<Indicator> {
        let url = match url.filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => self.lookup_url(tab).await?,
        };

        let indicator = self.indicator_for(&url);
        if let Err(e) = self.host.set_indicator(tab, indicator).await {
            debug!("indicator for tab {}: {}", tab, e);
        }
        Some(indicator)
    }

    pub async fn refresh_active_indicator(&self) {
        match self.host.query_tabs(Scope::ActiveTab).await {
            Ok(tabs) => {
                if let Some(tab) = tabs.into_iter().next() {
                    self.refresh_indicator(tab.id, tab.current_url()).await;
                }
            }
            Err(e) => debug!("no active tab to refresh: {}", e),
        }
    }

    // A tab that is still starting its navigation has no URL yet.
    async fn lookup_url(&self, tab: TabId) -> Option<String> {
        for attempt in 0..=URL_RETRY_LIMIT {
            if attempt > 0 {
                self.host.sleep(URL_RETRY_DELAY_MS).await;
            }
            match self.host.get_tab(tab).await {
                Ok(Some(found)) => {
                    if let Some(url) = found.current_url() {
                        return Some(url);
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    debug!("lookup of tab {} failed: {}", tab, e);
                    return None;
                }
            }
        }
        None
    }

    /// Change one option in memory and in storage; unknown names are stored but inert
    pub async fn set_option(&self, name: &str, enable: bool) {
        if !self.settings.borrow_mut().config.set_named(name, enable) {
            debug!("{} is not a detection option", name);
        }
        storage::write_value(&self.host, name, Value::Bool(enable)).await;
        self.refresh_active_indicator().await;
    }

    /// Add or remove an ignore entry; returns whether anything changed
    pub async fn toggle_ignore(&self, kind: IgnoreKind, on: bool, value: &str) -> bool {
        let mut entries = match self.host.read(kind.storage_key()).await {
            Ok(stored) => coerce_list(stored),
            Err(e) => {
                warn!("reading {} failed, using loaded list: {}", kind.storage_key(), e);
                self.settings.borrow().ignored.entries(kind).to_vec()
            }
        };

        let changed = toggle_entry(&mut entries, on, value);
        if changed {
            storage::save_entries(&self.host, kind, &entries).await;
            self.settings.borrow_mut().ignored.replace(kind, entries);
        }
        changed
    }

    /// Answer a UI request. Callers schedule [`Trigger::DataChange`]
    /// afterwards when [`Request::changes_detection`] holds.
    pub async fn handle_message(&self, request: Request) -> Value {
        match request {
            Request::Ignore { ignore, kind, value, tab_id, url } => {
                self.toggle_ignore(kind, ignore, &value).await;
                if let Some(tab) = tab_id {
                    self.refresh_indicator(tab, url).await;
                }
                ack()
            }
            Request::Setup { setup, enable } => {
                self.set_option(&setup, enable).await;
                ack()
            }
            Request::Data { data, value } => {
                storage::write_extra(&self.host, &data, value).await;
                ack()
            }
            Request::Extra { .. } => to_response(&storage::load_extra(&self.host).await),
            Request::Configs { .. } => to_response(&storage::load_config(&self.host).await),
            Request::Ignored { .. } => {
                let ignored = storage::load_ignore_list(&self.host).await;
                self.settings.borrow_mut().ignored = ignored.clone();
                to_response(&ignored)
            }
        }
    }
}

/// Close every member but the survivor; failures are recorded, never raised
pub async fn close_duplicates<T: TabProvider>(tabs: &T, group: &DuplicateGroup, report: &mut PassReport) {
    for id in group.to_close() {
        match tabs.close_tab(id).await {
            Ok(()) => report.closed.push(id),
            Err(e) => {
                debug!("closing duplicate {} of {}: {}", id, group.key, e);
                report.failed.push(id);
            }
        }
    }
}

struct RunningGuard<'a>(&'a Cell<usize>);

impl<'a> RunningGuard<'a> {
    fn enter(count: &'a Cell<usize>) -> Self {
        count.set(count.get() + 1);
        RunningGuard(count)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
