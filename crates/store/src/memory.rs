//! In-memory store
//!
//! A [`KeyValueStore`] backed by a `BTreeMap` behind a mutex, with Redis
//! write semantics (merging `HSET`, deduplicating `SADD`, score-updating
//! `ZADD`, `WRONGTYPE` on shape mismatch). Used as the test double for
//! export and restore, and for dry runs against a scratch store.
//!
//! Fault injection hooks simulate the failure modes the engine must
//! tolerate: a store that refuses `KEYS`, a scan cursor that never
//! terminates, and per-key read or write failures.

use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyValueStore, ScanPage, SCAN_START};
use async_trait::async_trait;
use kvsnap_core::{ScoredMember, StoreType, StoreValue, TypeTag};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const DEFAULT_SCAN_COUNT: usize = 10;

#[derive(Debug, Clone)]
enum Slot {
    String(String),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
    ZSet(Vec<ScoredMember>),
    List(Vec<String>),
    Opaque(String),
}

impl Slot {
    fn from_value(value: StoreValue) -> Self {
        match value {
            StoreValue::String(s) => Slot::String(s),
            StoreValue::Hash(fields) => Slot::Hash(fields),
            StoreValue::Set(members) => Slot::Set(members.into_iter().collect()),
            StoreValue::ZSet(members) => {
                let mut slot = Vec::new();
                zadd(&mut slot, &members);
                Slot::ZSet(slot)
            }
            StoreValue::List(items) => Slot::List(items),
        }
    }

    fn to_value(&self) -> Option<StoreValue> {
        match self {
            Slot::String(s) => Some(StoreValue::String(s.clone())),
            Slot::Hash(fields) => Some(StoreValue::Hash(fields.clone())),
            Slot::Set(members) => Some(StoreValue::Set(members.iter().cloned().collect())),
            Slot::ZSet(members) => Some(StoreValue::ZSet(members.clone())),
            Slot::List(items) => Some(StoreValue::List(items.clone())),
            Slot::Opaque(_) => None,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            Slot::String(_) => TypeTag::String.id(),
            Slot::Hash(_) => TypeTag::Hash.id(),
            Slot::Set(_) => TypeTag::Set.id(),
            Slot::ZSet(_) => TypeTag::ZSet.id(),
            Slot::List(_) => TypeTag::List.id(),
            Slot::Opaque(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct Faults {
    key_listing_disabled: bool,
    endless_scan: bool,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
}

/// In-memory [`KeyValueStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Entry>>,
    faults: Mutex<Faults>,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key with a value, replacing any previous value
    pub fn insert(&self, key: impl Into<String>, value: StoreValue) {
        self.entries.lock().insert(
            key.into(),
            Entry {
                slot: Slot::from_value(value),
                expires_at: None,
            },
        );
    }

    /// Seed a key whose type the backup format does not support
    pub fn insert_unsupported(&self, key: impl Into<String>, type_name: impl Into<String>) {
        self.entries.lock().insert(
            key.into(),
            Entry {
                slot: Slot::Opaque(type_name.into()),
                expires_at: None,
            },
        );
    }

    /// Current value at `key`
    pub fn get(&self, key: &str) -> Option<StoreValue> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        entries.get(key).and_then(|e| e.slot.to_value())
    }

    /// Every supported key and value
    ///
    /// Sets come back sorted, so two snapshots compare equal exactly when
    /// the stores hold the same data.
    pub fn snapshot(&self) -> BTreeMap<String, StoreValue> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        entries
            .iter()
            .filter_map(|(k, e)| e.slot.to_value().map(|v| (k.clone(), v)))
            .collect()
    }

    /// Number of live keys, including unsupported ones
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        entries.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Data writes issued so far (lock operations are not counted)
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make `list_all_keys` fail as if `KEYS` were disabled
    pub fn disable_key_listing(&self) {
        self.faults.lock().key_listing_disabled = true;
    }

    /// Make `scan` hand out cursors that never return to the start
    pub fn enable_endless_scan(&self) {
        self.faults.lock().endless_scan = true;
    }

    /// Make every read of `key` fail
    pub fn fail_reads_for(&self, key: impl Into<String>) {
        self.faults.lock().failing_reads.insert(key.into());
    }

    /// Make every write to `key` fail
    pub fn fail_writes_for(&self, key: impl Into<String>) {
        self.faults.lock().failing_writes.insert(key.into());
    }

    fn check_read(&self, command: &str, key: &str) -> StoreResult<()> {
        if self.faults.lock().failing_reads.contains(key) {
            return Err(StoreError::Command {
                command: command.to_string(),
                message: format!("injected read failure for {key}"),
            });
        }
        Ok(())
    }

    fn check_write(&self, command: &str, key: &str) -> StoreResult<()> {
        if self.faults.lock().failing_writes.contains(key) {
            return Err(StoreError::Command {
                command: command.to_string(),
                message: format!("injected write failure for {key}"),
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Run `f` on the live slot at `key`, if any
    fn read<T>(
        &self,
        command: &str,
        key: &str,
        f: impl FnOnce(Option<&Slot>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.check_read(command, key)?;
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        f(entries.get(key).map(|e| &e.slot))
    }

    /// Run `f` on the slot at `key`, creating it with `init` when absent
    fn write(
        &self,
        command: &str,
        key: &str,
        init: impl FnOnce() -> Slot,
        f: impl FnOnce(&mut Slot) -> bool,
    ) -> StoreResult<()> {
        self.check_write(command, key)?;
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            slot: init(),
            expires_at: None,
        });
        if f(&mut entry.slot) {
            Ok(())
        } else {
            Err(StoreError::WrongType {
                key: key.to_string(),
            })
        }
    }
}

fn purge_expired(entries: &mut BTreeMap<String, Entry>) {
    let now = Instant::now();
    entries.retain(|_, e| e.expires_at.map_or(true, |t| t > now));
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

/// Insert or re-score members, keeping ascending (score, member) order
fn zadd(slot: &mut Vec<ScoredMember>, members: &[ScoredMember]) {
    for m in members {
        slot.retain(|existing| existing.member != m.member);
        slot.push(m.clone());
    }
    slot.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.member.cmp(&b.member))
    });
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn list_all_keys(&self) -> StoreResult<Vec<String>> {
        if self.faults.lock().key_listing_disabled {
            return Err(StoreError::Unsupported {
                command: "KEYS".to_string(),
            });
        }
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        Ok(entries.keys().cloned().collect())
    }

    async fn scan(&self, cursor: &str, count: usize) -> StoreResult<ScanPage> {
        let start: usize = cursor
            .parse()
            .map_err(|_| StoreError::protocol("SCAN", format!("invalid cursor {cursor:?}")))?;
        let count = if count == 0 { DEFAULT_SCAN_COUNT } else { count };
        let endless = self.faults.lock().endless_scan;

        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        let keys: Vec<String> = entries.keys().skip(start).take(count).cloned().collect();
        let next = start + count;
        let cursor = if !endless && next >= entries.len() {
            SCAN_START.to_string()
        } else {
            next.to_string()
        };
        Ok(ScanPage { cursor, keys })
    }

    async fn type_of(&self, key: &str) -> StoreResult<StoreType> {
        self.read("TYPE", key, |slot| {
            Ok(match slot {
                Some(slot) => StoreType::parse(slot.type_name()),
                None => StoreType::Missing,
            })
        })
    }

    async fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        self.read("GET", key, |slot| match slot {
            None => Ok(None),
            Some(Slot::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn get_all_hash_fields(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        self.read("HGETALL", key, |slot| match slot {
            None => Ok(BTreeMap::new()),
            Some(Slot::Hash(fields)) => Ok(fields.clone()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn get_all_set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.read("SMEMBERS", key, |slot| match slot {
            None => Ok(Vec::new()),
            Some(Slot::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn get_sorted_set_range_with_scores(&self, key: &str) -> StoreResult<Vec<ScoredMember>> {
        self.read("ZRANGE", key, |slot| match slot {
            None => Ok(Vec::new()),
            Some(Slot::ZSet(members)) => Ok(members.clone()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn get_full_list(&self, key: &str) -> StoreResult<Vec<String>> {
        self.read("LRANGE", key, |slot| match slot {
            None => Ok(Vec::new()),
            Some(Slot::List(items)) => Ok(items.clone()),
            Some(_) => Err(wrong_type(key)),
        })
    }

    async fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_write("SET", key)?;
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                slot: Slot::String(value.to_string()),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> StoreResult<bool> {
        self.check_write("DEL", key)?;
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        Ok(entries.remove(key).is_some())
    }

    async fn set_hash_fields(
        &self,
        key: &str,
        fields: &BTreeMap<String, String>,
    ) -> StoreResult<()> {
        self.write(
            "HSET",
            key,
            || Slot::Hash(BTreeMap::new()),
            |slot| match slot {
                Slot::Hash(existing) => {
                    existing.extend(fields.iter().map(|(f, v)| (f.clone(), v.clone())));
                    true
                }
                _ => false,
            },
        )
    }

    async fn add_set_members(&self, key: &str, members: &[String]) -> StoreResult<()> {
        self.write(
            "SADD",
            key,
            || Slot::Set(BTreeSet::new()),
            |slot| match slot {
                Slot::Set(existing) => {
                    existing.extend(members.iter().cloned());
                    true
                }
                _ => false,
            },
        )
    }

    async fn add_sorted_set_members(
        &self,
        key: &str,
        members: &[ScoredMember],
    ) -> StoreResult<()> {
        self.write(
            "ZADD",
            key,
            || Slot::ZSet(Vec::new()),
            |slot| match slot {
                Slot::ZSet(existing) => {
                    zadd(existing, members);
                    true
                }
                _ => false,
            },
        )
    }

    async fn append_list_items(&self, key: &str, items: &[String]) -> StoreResult<()> {
        self.write(
            "RPUSH",
            key,
            || Slot::List(Vec::new()),
            |slot| match slot {
                Slot::List(existing) => {
                    existing.extend(items.iter().cloned());
                    true
                }
                _ => false,
            },
        )
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                slot: Slot::String(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock();
        purge_expired(&mut entries);
        match entries.get(key) {
            Some(Entry {
                slot: Slot::String(current),
                ..
            }) if current == expected => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
