//! Fakes for the fan-out ports.

#![allow(dead_code)]

use async_trait::async_trait;
use campus_fcm_shared::TopicMessage;
use firestore_rest::{Fields, StoreError, StoreResult, Value};
use notification_fanout::{DocumentStore, DocumentWrite, PushBroadcaster, PushFailure};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Value every server timestamp resolves to in the fake store.
pub const SERVER_TIME: &str = "2024-09-01T10:00:00Z";

/// In-memory document store with Firestore merge semantics
#[derive(Default)]
pub struct InMemoryStore {
    docs: Mutex<BTreeMap<String, Fields>>,
    commit_sizes: Mutex<Vec<usize>>,
    commit_attempts: AtomicUsize,
    failing_commits: Mutex<HashSet<usize>>,
    fail_merge: Mutex<bool>,
    fail_list: Mutex<bool>,
    barrier: Mutex<Option<Arc<Barrier>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(count: usize) -> Self {
        let store = Self::new();
        {
            let mut docs = store.docs.lock().unwrap();
            for i in 0..count {
                let mut fields = Fields::new();
                fields.insert("displayName".to_string(), Value::string(format!("Student {}", i)));
                docs.insert(format!("users/u{:04}", i), fields);
            }
        }
        store
    }

    /// Fail the `n`th batch commit (0-based, in issue order).
    pub fn fail_commit(&self, n: usize) {
        self.failing_commits.lock().unwrap().insert(n);
    }

    pub fn fail_merges(&self) {
        *self.fail_merge.lock().unwrap() = true;
    }

    pub fn fail_listing(&self) {
        *self.fail_list.lock().unwrap() = true;
    }

    /// Hold every batch commit until `parties` commits are in flight.
    pub fn rendezvous_commits(&self, parties: usize) {
        *self.barrier.lock().unwrap() = Some(Arc::new(Barrier::new(parties)));
    }

    pub fn doc(&self, path: &str) -> Option<Fields> {
        self.docs.lock().unwrap().get(path).cloned()
    }

    pub fn set_field(&self, path: &str, field: &str, value: Value) {
        self.docs
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Documents whose path starts with `prefix`.
    pub fn docs_under(&self, prefix: &str) -> BTreeMap<String, Fields> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, fields)| (path.clone(), fields.clone()))
            .collect()
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commit_sizes.lock().unwrap().clone()
    }

    fn apply(docs: &mut BTreeMap<String, Fields>, write: DocumentWrite) {
        let doc = docs.entry(write.path).or_default();
        for (field, value) in write.fields {
            doc.insert(field, value);
        }
        for field in write.server_timestamps {
            doc.insert(field, Value::TimestampValue(SERVER_TIME.to_string()));
        }
    }

    fn outage() -> StoreError {
        StoreError::Api {
            status: 503,
            message: "The service is currently unavailable.".to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn merge_document(&self, write: DocumentWrite) -> StoreResult<()> {
        if *self.fail_merge.lock().unwrap() {
            return Err(Self::outage());
        }
        Self::apply(&mut self.docs.lock().unwrap(), write);
        Ok(())
    }

    async fn list_ids(&self, collection: &str) -> StoreResult<Vec<String>> {
        if *self.fail_list.lock().unwrap() {
            return Err(Self::outage());
        }
        let prefix = format!("{}/", collection);
        Ok(self
            .docs
            .lock()
            .unwrap()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    async fn commit_batch(&self, writes: Vec<DocumentWrite>) -> StoreResult<()> {
        let attempt = self.commit_attempts.fetch_add(1, Ordering::SeqCst);

        let barrier = self.barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }

        if self.failing_commits.lock().unwrap().contains(&attempt) {
            return Err(Self::outage());
        }

        let size = writes.len();
        {
            let mut docs = self.docs.lock().unwrap();
            for write in writes {
                Self::apply(&mut docs, write);
            }
        }
        self.commit_sizes.lock().unwrap().push(size);
        Ok(())
    }
}

/// Push broadcaster that records every message
#[derive(Default)]
pub struct RecordingPush {
    messages: Mutex<Vec<TopicMessage>>,
}

impl RecordingPush {
    pub fn messages(&self) -> Vec<TopicMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushBroadcaster for RecordingPush {
    async fn broadcast(&self, message: &TopicMessage) -> Result<String, PushFailure> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(message.clone());
        Ok(format!("projects/campus-nav/messages/{}", messages.len()))
    }
}

/// Push broadcaster whose every call is rejected
#[derive(Default)]
pub struct FailingPush {
    calls: AtomicUsize,
}

impl FailingPush {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushBroadcaster for FailingPush {
    async fn broadcast(&self, _message: &TopicMessage) -> Result<String, PushFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PushFailure(
            "FCM API error: 503 Service Unavailable - UNAVAILABLE".to_string(),
        ))
    }
}
