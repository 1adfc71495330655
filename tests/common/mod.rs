//! Shared fixtures for kvsnap integration tests.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use kvsnap::prelude::*;
use kvsnap_core::ScoredMember;
use std::collections::BTreeMap;

/// Fixed "now" for every test: 2026-10-19 03:00 UTC.
pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-19T03:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn hash(pairs: &[(&str, &str)]) -> StoreValue {
    StoreValue::Hash(
        pairs
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    )
}

/// One key of each type, as in the operator runbook example.
pub fn mixed_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert("greeting", StoreValue::String("hi".into()));
    store.insert("user:1", hash(&[("name", "Ann"), ("age", "30")]));
    store.insert("tags", StoreValue::Set(strings(&["a", "b"])));
    store.insert(
        "scores",
        StoreValue::ZSet(vec![ScoredMember::new("x", 1.0), ScoredMember::new("y", 2.0)]),
    );
    store.insert("log", StoreValue::List(strings(&["e1", "e2"])));
    store
}

/// Export `store` with default options.
pub async fn export(store: &MemoryStore) -> (BackupDocument, kvsnap_engine::ExportReport) {
    Exporter::new(store, ExportOptions::default())
        .export(now())
        .await
        .unwrap()
}

/// Replay `doc` into `store` without a lock.
pub async fn restore(store: &MemoryStore, doc: &BackupDocument) -> kvsnap_engine::RestoreReport {
    kvsnap_engine::replay(store, doc).await
}
