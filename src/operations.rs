/// Tab operations: grouping duplicates and choosing which one stays open

use std::cmp::Ordering;
use std::collections::HashMap;

use log::trace;

use crate::config::{Config, SurvivorPrefs};
use crate::ignore::IgnoreList;
use crate::normalize::{canonical_key, CanonicalKey};
use crate::tab_data::{Tab, TabId};

/// The part of a tab the survivor selection looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: TabId,
    pub active: bool,
}

/// Tabs sharing one canonical key; `members[0]` survives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: CanonicalKey,
    pub members: Vec<Candidate>,
}

impl DuplicateGroup {
    pub fn survivor(&self) -> Option<TabId> {
        self.members.first().map(|c| c.id)
    }

    /// Every member except the survivor
    pub fn to_close(&self) -> Vec<TabId> {
        self.members.iter().skip(1).map(|c| c.id).collect()
    }
}

/// Bucket candidates by key, keeping only buckets with two or more tabs
///
/// Buckets come out in the order their key was first seen.
pub fn group_by_key<I>(entries: I) -> Vec<(CanonicalKey, Vec<Candidate>)>
where
    I: IntoIterator<Item = (CanonicalKey, Candidate)>,
{
    let mut slots: HashMap<CanonicalKey, usize> = HashMap::new();
    let mut groups: Vec<(CanonicalKey, Vec<Candidate>)> = Vec::new();

    for (key, candidate) in entries {
        match slots.get(&key) {
            Some(&slot) => groups[slot].1.push(candidate),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![candidate]));
            }
        }
    }

    groups.retain(|(_, members)| members.len() >= 2);
    groups
}

/// Total order used to rank duplicates: the smallest element survives
pub fn survivor_order(a: &Candidate, b: &Candidate, prefs: SurvivorPrefs) -> Ordering {
    let by_active = if prefs.prefer_active {
        b.active.cmp(&a.active)
    } else {
        Ordering::Equal
    };

    by_active.then_with(|| {
        if prefs.keep_oldest {
            a.id.cmp(&b.id)
        } else {
            b.id.cmp(&a.id)
        }
    })
}

/// Sort a group so the survivor comes first
pub fn select_survivor(members: &mut [Candidate], prefs: SurvivorPrefs) {
    members.sort_by(|a, b| survivor_order(a, b, prefs));
}

/// Work out every duplicate group in a snapshot, survivors first
pub fn plan_closures(tabs: &[Tab], config: &Config, ignored: &IgnoreList) -> Vec<DuplicateGroup> {
    let entries = tabs.iter().filter_map(|tab| match canonical_key(tab, config, ignored) {
        Ok(key) => Some((key, Candidate { id: tab.id, active: tab.active })),
        Err(reason) => {
            trace!("tab {} skipped: {:?}", tab.id, reason);
            None
        }
    });

    let prefs = config.survivor_prefs();
    group_by_key(entries)
        .into_iter()
        .map(|(key, mut members)| {
            select_survivor(&mut members, prefs);
            DuplicateGroup { key, members }
        })
        .collect()
}
