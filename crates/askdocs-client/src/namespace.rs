//! Session namespace handling
//!
//! The backend groups every chunk of related uploads under one namespace.
//! The client only ever learns it from a response and carries it forward.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Backend-assigned index identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Wrap a backend value; blank strings are not a namespace
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds the namespace of one session
///
/// Clones share the same slot, so the upload orchestrator and the query
/// dispatcher of one session see the same value while separate sessions
/// stay isolated.
#[derive(Debug, Clone, Default)]
pub struct NamespaceManager {
    current: Arc<RwLock<Option<Namespace>>>,
}

impl NamespaceManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager seeded with a known namespace
    pub fn with_namespace(namespace: Namespace) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(namespace))),
        }
    }

    /// Current namespace, if one was established
    pub fn get(&self) -> Option<Namespace> {
        self.current.read().clone()
    }

    /// Replace the namespace; last call wins
    pub fn set(&self, namespace: Namespace) {
        let mut current = self.current.write();
        if current.as_ref() != Some(&namespace) {
            tracing::info!("Session namespace set to {}", namespace);
        }
        *current = Some(namespace);
    }
}
