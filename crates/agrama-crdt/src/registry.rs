//! Document registry: one mutator lock per document, unrestricted
//! concurrency across documents.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use agrama_core::errors::{AgramaResult, CrdtError};

use crate::document::{ApplyOutcome, CollabDocument, LocalEdit};
use crate::operation::{CrdtOperation, Position};
use crate::vector_clock::VectorClock;

/// All live collaborative documents, keyed by path.
pub struct DocumentRegistry {
    docs: DashMap<String, Arc<Mutex<CollabDocument>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    /// Get or create the document at `path`, seeding it with `initial`
    /// when it does not exist yet.
    pub fn open(&self, path: &str, initial: &str) -> Arc<Mutex<CollabDocument>> {
        self.docs
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CollabDocument::new(path, initial))))
            .clone()
    }

    fn get(&self, path: &str) -> AgramaResult<Arc<Mutex<CollabDocument>>> {
        self.docs
            .get(path)
            .map(|r| r.clone())
            .ok_or_else(|| CrdtError::DocumentNotFound { path: path.to_string() }.into())
    }

    /// Apply a local edit under the document's mutator lock.
    pub fn apply_local(
        &self,
        path: &str,
        agent: &str,
        edit: LocalEdit,
    ) -> AgramaResult<CrdtOperation> {
        let doc = self.get(path)?;
        let mut doc = doc.lock();
        doc.apply_local(agent, edit)
    }

    /// Merge a remote operation into its document.
    pub fn merge_remote(&self, op: CrdtOperation) -> AgramaResult<ApplyOutcome> {
        let doc = self.get(&op.doc)?;
        let mut doc = doc.lock();
        doc.merge_remote(op)
    }

    pub fn update_cursor(&self, path: &str, agent: &str, position: Position) -> AgramaResult<()> {
        let doc = self.get(path)?;
        doc.lock().update_cursor(agent, position);
        Ok(())
    }

    pub fn snapshot(&self, path: &str) -> AgramaResult<(String, VectorClock)> {
        let doc = self.get(path)?;
        let doc = doc.lock();
        Ok(doc.snapshot())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_is_idempotent() {
        let reg = DocumentRegistry::new();
        reg.open("a.txt", "seed");
        reg.open("a.txt", "ignored");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.snapshot("a.txt").unwrap().0, "seed");
    }

    #[test]
    fn missing_document_errors() {
        let reg = DocumentRegistry::new();
        assert!(reg.snapshot("nope.txt").is_err());
    }

    #[test]
    fn edits_flow_through_the_registry() {
        let reg = DocumentRegistry::new();
        reg.open("d.txt", "abc");
        let op = reg
            .apply_local("d.txt", "x", LocalEdit::Insert { offset: 3, text: "!".into() })
            .unwrap();
        assert_eq!(op.agent, "x");
        assert_eq!(reg.snapshot("d.txt").unwrap().0, "abc!");
    }

    #[test]
    fn documents_are_independent() {
        let reg = DocumentRegistry::new();
        reg.open("a.txt", "aaa");
        reg.open("b.txt", "bbb");
        reg.apply_local("a.txt", "x", LocalEdit::Delete { offset: 0, len: 1 })
            .unwrap();
        assert_eq!(reg.snapshot("a.txt").unwrap().0, "aa");
        assert_eq!(reg.snapshot("b.txt").unwrap().0, "bbb");
    }
}
