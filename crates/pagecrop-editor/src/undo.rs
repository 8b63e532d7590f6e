// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Undo stack — bounded history of whole-document snapshots taken before each
// destructive edit (whiteout, page deletion).
//
// Each snapshot carries a SHA-256 digest of its bytes, checked on restore so a
// corrupted snapshot is reported instead of silently loaded.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use pagecrop_core::error::{EditorError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Compute the SHA-256 hash of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A serialized copy of the document.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: Uuid,
    /// The edit this snapshot precedes, e.g. "whiteout".
    pub label: String,
    pub taken_at: DateTime<Utc>,
    bytes: Vec<u8>,
    digest: String,
}

impl Snapshot {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        let digest = hash_bytes(&bytes);
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            taken_at: Utc::now(),
            bytes,
            digest,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Check the bytes still match the digest taken at capture time.
    pub fn verify(&self) -> Result<()> {
        let actual = hash_bytes(&self.bytes);
        if actual == self.digest {
            Ok(())
        } else {
            Err(EditorError::SnapshotMismatch {
                expected: self.digest.clone(),
                actual,
            })
        }
    }

    /// Verified document bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.verify()?;
        Ok(self.bytes)
    }
}

/// Snapshot stack holding at most `depth` entries; pushing onto a full stack
/// evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<Snapshot>,
    depth: usize,
}

impl UndoStack {
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(depth),
            depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot `pop` would return.
    pub fn peek(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    #[instrument(skip(self, snapshot), fields(label = %snapshot.label, bytes = snapshot.bytes.len()))]
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.depth == 0 {
            return;
        }
        while self.entries.len() >= self.depth {
            if let Some(evicted) = self.entries.pop_front() {
                debug!(id = %evicted.id, label = %evicted.label, "Oldest snapshot evicted");
            }
        }
        self.entries.push_back(snapshot);
    }

    /// Most recent snapshot, or [`EditorError::NothingToUndo`].
    pub fn pop(&mut self) -> Result<Snapshot> {
        self.entries.pop_back().ok_or(EditorError::NothingToUndo)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_known_value() {
        assert_eq!(
            hash_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn keeps_only_the_most_recent_entries() {
        let mut stack = UndoStack::new(10);
        for i in 0..11u8 {
            stack.push(Snapshot::new(format!("edit {i}"), vec![i]));
        }
        assert_eq!(stack.len(), 10);

        let mut restored = Vec::new();
        while let Ok(snapshot) = stack.pop() {
            restored.push(snapshot.into_bytes().unwrap()[0]);
        }
        assert_eq!(restored, (1..11).rev().collect::<Vec<u8>>());
    }

    #[test]
    fn pop_returns_exact_bytes() {
        let mut stack = UndoStack::new(3);
        let bytes = b"%PDF-1.5 snapshot".to_vec();
        stack.push(Snapshot::new("whiteout", bytes.clone()));
        assert_eq!(stack.peek().unwrap().label, "whiteout");
        assert_eq!(stack.pop().unwrap().into_bytes().unwrap(), bytes);
    }

    #[test]
    fn empty_stack_reports_nothing_to_undo() {
        let mut stack = UndoStack::new(10);
        assert!(matches!(stack.pop(), Err(EditorError::NothingToUndo)));
    }

    #[test]
    fn corrupted_snapshot_is_detected() {
        let mut snapshot = Snapshot::new("delete", b"original".to_vec());
        snapshot.bytes[0] = b'O';
        assert!(matches!(
            snapshot.into_bytes(),
            Err(EditorError::SnapshotMismatch { .. })
        ));
    }

    #[test]
    fn zero_depth_disables_history() {
        let mut stack = UndoStack::new(0);
        stack.push(Snapshot::new("whiteout", vec![1]));
        assert!(stack.is_empty());
    }
}
