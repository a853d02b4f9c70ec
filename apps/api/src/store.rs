//! Bounded in-memory store of rendered documents.
//!
//! A stored document is the render root an export reads from. The oldest
//! entry is evicted once the store is full.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::export::filename::FilenameHint;
use crate::render::RenderedDocument;

#[derive(Debug)]
pub struct StoredDocument {
    pub id: Uuid,
    pub document: RenderedDocument,
    /// Naming hint derived from the CV at render time.
    pub hint: FilenameHint,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<Uuid, Arc<StoredDocument>>,
    order: VecDeque<Uuid>,
}

#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

impl DocumentStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: capacity.max(1),
        }
    }

    pub async fn insert(&self, document: RenderedDocument, hint: FilenameHint) -> Arc<StoredDocument> {
        let stored = Arc::new(StoredDocument {
            id: Uuid::new_v4(),
            document,
            hint,
            created_at: Utc::now(),
        });

        let mut inner = self.inner.write().await;
        while inner.order.len() >= self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.documents.remove(&evicted);
                debug!("Evicted document {}", evicted);
            }
        }
        inner.order.push_back(stored.id);
        inner.documents.insert(stored.id, stored.clone());
        stored
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<StoredDocument>> {
        self.inner.read().await.documents.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
