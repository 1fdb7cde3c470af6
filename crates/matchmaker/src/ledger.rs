//! Per-user, per-day pass quota.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schedule::PhoneWhitelist;
use store::{Category, ChatNightStore, PassEntry, StoreError};
use tracing::{debug, warn};

use crate::config::PassConfig;

/// Resolves how many passes a user gets.
#[derive(Debug, Clone)]
pub struct PassPolicy {
    config: PassConfig,
    whitelist: PhoneWhitelist,
}

impl PassPolicy {
    pub fn new(config: PassConfig, whitelist: PhoneWhitelist) -> Self {
        Self { config, whitelist }
    }

    pub fn default_total(&self, category: Category) -> u32 {
        match category {
            Category::Man => self.config.man_passes,
            Category::Woman => self.config.woman_passes,
        }
    }

    /// Override applied at creation and again on every read.
    pub fn override_total(&self, phone: Option<&str>) -> Option<u32> {
        let global = self.config.test_passes.filter(|n| *n > 0);
        global.or_else(|| {
            if self.whitelist.contains(phone) {
                self.config.whitelist_passes.filter(|n| *n > 0)
            } else {
                None
            }
        })
    }

    pub fn initial_total(&self, category: Category, phone: Option<&str>) -> u32 {
        self.override_total(phone)
            .unwrap_or_else(|| self.default_total(category))
    }
}

/// Who a ledger operation is about.
#[derive(Debug, Clone, Copy)]
pub struct PassHolder<'a> {
    pub user_id: &'a str,
    pub category: Category,
    pub phone: Option<&'a str>,
}

/// Pass entries on top of the store. Entries are created lazily and never
/// deleted.
#[derive(Clone)]
pub struct PassLedger {
    store: Arc<ChatNightStore>,
    policy: PassPolicy,
}

impl PassLedger {
    pub fn new(store: Arc<ChatNightStore>, policy: PassPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &PassPolicy {
        &self.policy
    }

    fn fresh_entry(&self, holder: PassHolder<'_>, day_key: &str, now: DateTime<Utc>) -> PassEntry {
        PassEntry {
            user_id: holder.user_id.to_string(),
            day_key: day_key.to_string(),
            passes_total: self.policy.initial_total(holder.category, holder.phone),
            passes_used: 0,
            updated_at: now,
        }
    }

    /// Apply the current override to a stored entry without persisting it,
    /// so removing the override restores the stored total.
    fn effective(&self, mut entry: PassEntry, phone: Option<&str>) -> PassEntry {
        if let Some(total) = self.policy.override_total(phone) {
            entry.passes_total = total;
        }
        entry
    }

    pub fn get_or_create(
        &self,
        holder: PassHolder<'_>,
        day_key: &str,
        now: DateTime<Utc>,
    ) -> Result<PassEntry, StoreError> {
        let entry = self.store.modify_pass(holder.user_id, day_key, |current| {
            Ok(match current {
                Some(existing) => (None, existing),
                None => {
                    let created = self.fresh_entry(holder, day_key, now);
                    debug!(
                        user_id = holder.user_id,
                        day_key,
                        passes_total = created.passes_total,
                        "pass_entry_created"
                    );
                    (Some(created.clone()), created)
                }
            })
        })?;
        Ok(self.effective(entry, holder.phone))
    }

    /// Increment `used`, creating the entry first if needed. Consumption is
    /// not capped; the quota check belongs to the caller.
    pub fn consume(
        &self,
        holder: PassHolder<'_>,
        day_key: &str,
        now: DateTime<Utc>,
    ) -> Result<PassEntry, StoreError> {
        let entry = self.store.modify_pass(holder.user_id, day_key, |current| {
            let mut entry = current.unwrap_or_else(|| self.fresh_entry(holder, day_key, now));
            entry.passes_used += 1;
            entry.updated_at = now;
            Ok((Some(entry.clone()), entry))
        })?;
        let entry = self.effective(entry, holder.phone);
        if entry.passes_used > entry.passes_total {
            warn!(
                user_id = holder.user_id,
                day_key,
                passes_used = entry.passes_used,
                passes_total = entry.passes_total,
                "pass_consumed_over_quota"
            );
        }
        Ok(entry)
    }

    /// Give back one pass taken by [`consume`](Self::consume) for a room
    /// that was never opened.
    pub fn refund(
        &self,
        holder: PassHolder<'_>,
        day_key: &str,
        now: DateTime<Utc>,
    ) -> Result<PassEntry, StoreError> {
        let entry = self.store.modify_pass(holder.user_id, day_key, |current| {
            let mut entry = current.unwrap_or_else(|| self.fresh_entry(holder, day_key, now));
            entry.passes_used = entry.passes_used.saturating_sub(1);
            entry.updated_at = now;
            Ok((Some(entry.clone()), entry))
        })?;
        debug!(user_id = holder.user_id, day_key, "pass_refunded");
        Ok(self.effective(entry, holder.phone))
    }

    /// Administrative grant: raise the stored total by `extra`.
    pub fn grant(
        &self,
        holder: PassHolder<'_>,
        day_key: &str,
        extra: u32,
        now: DateTime<Utc>,
    ) -> Result<PassEntry, StoreError> {
        let entry = self.store.modify_pass(holder.user_id, day_key, |current| {
            let mut entry = current.unwrap_or_else(|| self.fresh_entry(holder, day_key, now));
            entry.passes_total = entry.passes_total.saturating_add(extra);
            entry.updated_at = now;
            Ok((Some(entry.clone()), entry))
        })?;
        Ok(self.effective(entry, holder.phone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: &str = "2026-02-13";

    fn ledger(config: PassConfig, whitelist: &str) -> (Arc<ChatNightStore>, PassLedger) {
        let store = Arc::new(ChatNightStore::in_memory());
        let policy = PassPolicy::new(config, PhoneWhitelist::parse(whitelist));
        (store.clone(), PassLedger::new(store, policy))
    }

    fn man(user_id: &str) -> PassHolder<'_> {
        PassHolder {
            user_id,
            category: Category::Man,
            phone: None,
        }
    }

    #[test]
    fn defaults_depend_on_category() {
        let (_, ledger) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        assert_eq!(ledger.get_or_create(man("m"), DAY, now).unwrap().passes_total, 1);
        let woman = PassHolder {
            user_id: "w",
            category: Category::Woman,
            phone: None,
        };
        assert_eq!(ledger.get_or_create(woman, DAY, now).unwrap().passes_total, 2);
    }

    #[test]
    fn get_or_create_is_stable() {
        let (store, ledger) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        let first = ledger.get_or_create(man("m"), DAY, now).unwrap();
        let later = now + chrono::Duration::minutes(5);
        let second = ledger.get_or_create(man("m"), DAY, later).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.pass("m", DAY).unwrap().unwrap().updated_at, now);
    }

    #[test]
    fn consume_increments_and_is_not_capped() {
        let (_, ledger) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        assert_eq!(ledger.consume(man("m"), DAY, now).unwrap().passes_used, 1);
        let over = ledger.consume(man("m"), DAY, now).unwrap();
        assert_eq!(over.passes_used, 2);
        assert!(over.is_exhausted());
        assert_eq!(over.remaining(), 0);
    }

    #[test]
    fn refund_reverses_one_consume_and_stops_at_zero() {
        let (store, ledger) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        ledger.consume(man("m"), DAY, now).unwrap();
        assert_eq!(ledger.refund(man("m"), DAY, now).unwrap().passes_used, 0);
        assert_eq!(ledger.refund(man("m"), DAY, now).unwrap().passes_used, 0);
        assert_eq!(store.pass("m", DAY).unwrap().unwrap().passes_total, 1);
    }

    #[test]
    fn test_override_applies_on_read_without_resetting_usage() {
        let (store, plain) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        plain.consume(man("m"), DAY, now).unwrap();

        let overridden = PassLedger::new(
            store.clone(),
            PassPolicy::new(
                PassConfig {
                    test_passes: Some(100),
                    ..PassConfig::default()
                },
                PhoneWhitelist::default(),
            ),
        );
        let entry = overridden.get_or_create(man("m"), DAY, now).unwrap();
        assert_eq!(entry.passes_total, 100);
        assert_eq!(entry.passes_used, 1);
        assert_eq!(entry.remaining(), 99);

        // Stored total is untouched; dropping the override restores it.
        assert_eq!(store.pass("m", DAY).unwrap().unwrap().passes_total, 1);
        assert_eq!(plain.get_or_create(man("m"), DAY, now).unwrap().passes_total, 1);
    }

    #[test]
    fn whitelist_override_only_for_listed_phones() {
        let config = PassConfig {
            whitelist_passes: Some(10),
            ..PassConfig::default()
        };
        let (_, ledger) = ledger(config, "+91 98765 43210");
        let now = Utc::now();
        let listed = PassHolder {
            user_id: "listed",
            category: Category::Man,
            phone: Some("919876543210"),
        };
        let other = PassHolder {
            user_id: "other",
            category: Category::Man,
            phone: Some("9000000000"),
        };
        assert_eq!(ledger.get_or_create(listed, DAY, now).unwrap().passes_total, 10);
        assert_eq!(ledger.get_or_create(other, DAY, now).unwrap().passes_total, 1);
    }

    #[test]
    fn zero_override_is_ignored() {
        let config = PassConfig {
            test_passes: Some(0),
            ..PassConfig::default()
        };
        let (_, ledger) = ledger(config, "");
        let entry = ledger.get_or_create(man("m"), DAY, Utc::now()).unwrap();
        assert_eq!(entry.passes_total, 1);
    }

    #[test]
    fn grant_raises_total() {
        let (_, ledger) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        ledger.consume(man("m"), DAY, now).unwrap();
        let entry = ledger.grant(man("m"), DAY, 2, now).unwrap();
        assert_eq!(entry.passes_total, 3);
        assert_eq!(entry.remaining(), 2);
    }

    #[test]
    fn days_are_independent() {
        let (_, ledger) = ledger(PassConfig::default(), "");
        let now = Utc::now();
        ledger.consume(man("m"), DAY, now).unwrap();
        let next = ledger.get_or_create(man("m"), "2026-02-14", now).unwrap();
        assert_eq!(next.passes_used, 0);
    }
}
