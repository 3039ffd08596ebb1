//! Process-local, TTL-bounded cache of IRR calculations.
//!
//! Entries are addressed by a SHA-256 fingerprint of the sorted fund-id set, the
//! calculation date, the cash-flow list and the valuation map. Each entry remembers
//! its fund ids so a write to any of them can evict it.

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use super::irr_model::{CashFlow, CashFlowKind, IrrCalculation};
use crate::constants::{DEFAULT_CACHE_TTL_MINUTES, LATEST_CALCULATION_DATE};

/// Fingerprint of one calculation's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IrrCacheKey {
    hash: String,
    fund_ids: BTreeSet<i64>,
}

#[derive(Serialize)]
struct CanonicalFlow {
    date: String,
    amount: String,
    terminal: bool,
}

#[derive(Serialize)]
struct CanonicalKey<'a> {
    fund_ids: &'a BTreeSet<i64>,
    date: String,
    cash_flows: Option<Vec<CanonicalFlow>>,
    valuations: Option<BTreeMap<i64, String>>,
}

fn normalize_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

impl IrrCacheKey {
    /// Builds the key. Fund-id order and duplicates do not affect the result.
    pub fn build(
        fund_ids: &[i64],
        calculation_date: Option<NaiveDate>,
        cash_flows: Option<&[CashFlow]>,
        valuations: Option<&HashMap<i64, Decimal>>,
    ) -> Self {
        let fund_ids: BTreeSet<i64> = fund_ids.iter().copied().collect();

        let canonical = CanonicalKey {
            fund_ids: &fund_ids,
            date: calculation_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| LATEST_CALCULATION_DATE.to_string()),
            cash_flows: cash_flows.map(|flows| {
                flows
                    .iter()
                    .map(|f| CanonicalFlow {
                        date: f.date.format("%Y-%m-%d").to_string(),
                        amount: normalize_decimal(f.amount),
                        terminal: f.kind == CashFlowKind::Terminal,
                    })
                    .collect()
            }),
            valuations: valuations.map(|map| {
                map.iter()
                    .map(|(id, value)| (*id, normalize_decimal(*value)))
                    .collect()
            }),
        };

        // Serializing plain strings, integers and ordered maps cannot fail.
        let payload = serde_json::to_vec(&canonical).unwrap_or_default();
        let hash = hex::encode(Sha256::digest(&payload));

        Self { hash, fund_ids }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn fund_ids(&self) -> &BTreeSet<i64> {
        &self.fund_ids
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub data: IrrCalculation,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub fund_ids: BTreeSet<i64>,
}

impl CacheEntry {
    fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
    pub oldest_entry: Option<NaiveDateTime>,
    pub newest_entry: Option<NaiveDateTime>,
}

pub struct IrrCache {
    default_ttl_minutes: i64,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for IrrCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL_MINUTES)
    }
}

impl IrrCache {
    pub fn new(default_ttl_minutes: i64) -> Self {
        Self {
            default_ttl_minutes,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached calculation, evicting the entry if it has expired.
    pub fn get(&self, key: &IrrCacheKey) -> Option<IrrCalculation> {
        let now = Self::now();
        let mut entries = self.lock();
        match entries.get(key.as_str()) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key.as_str());
                debug!("IRR cache entry {} expired", key.as_str());
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    /// Stores a calculation. `ttl_minutes` of `None` uses the cache default.
    pub fn set(&self, key: &IrrCacheKey, data: IrrCalculation, ttl_minutes: Option<i64>) {
        let now = Self::now();
        let ttl = Duration::minutes(ttl_minutes.unwrap_or(self.default_ttl_minutes));
        let entry = CacheEntry {
            key: key.as_str().to_string(),
            data,
            created_at: now,
            expires_at: now + ttl,
            fund_ids: key.fund_ids().clone(),
        };
        self.lock().insert(entry.key.clone(), entry);
    }

    /// Drops every entry whose fund set intersects `fund_ids`.
    pub fn invalidate_by_funds(&self, fund_ids: &[i64]) -> usize {
        if fund_ids.is_empty() {
            return 0;
        }
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !fund_ids.iter().any(|id| entry.fund_ids.contains(id)));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Invalidated {} IRR cache entries for funds {:?}", removed, fund_ids);
        }
        removed
    }

    pub fn sweep_expired(&self) -> usize {
        let now = Self::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Self::now();
        let entries = self.lock();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total_entries: entries.len(),
            active_entries: entries.len() - expired,
            expired_entries: expired,
            oldest_entry: entries.values().map(|e| e.created_at).min(),
            newest_entry: entries.values().map(|e| e.created_at).max(),
        }
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }
}
