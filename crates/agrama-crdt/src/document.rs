//! The collaborative text document.
//!
//! An operation-based sequence CRDT: every character is an element with a
//! stable identity, anchored after the element to its left at insertion
//! time. The document is the preorder walk of the resulting anchor tree.
//! Siblings under one anchor are ordered by descending (causal height,
//! run id) — causally-later inserts land first, and concurrent inserts
//! resolve by the hash-of-operation-id tiebreaker — so any delivery order
//! consistent with causality converges to the same text. Deletes are
//! tombstones, which makes them idempotent and commutative with
//! everything.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use agrama_core::errors::{AgramaResult, CrdtError};

use crate::operation::{run_id_for, CrdtOperation, ElementId, OpKind, Position};
use crate::vector_clock::VectorClock;

/// Run id reserved for a document's initial seed text.
const SEED_RUN: u128 = 0;

#[derive(Debug, Clone)]
struct Element {
    ch: char,
    tombstone: bool,
    /// Causal height of the creating operation (sum of its clock).
    lamport: u64,
    run: u128,
}

/// A local edit before it becomes an operation.
#[derive(Debug, Clone)]
pub enum LocalEdit {
    Insert { offset: usize, text: String },
    Delete { offset: usize, len: usize },
    Modify { offset: usize, len: usize, text: String },
}

/// What `merge_remote` did with an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Missing causal dependencies; held until they arrive.
    Buffered,
    /// Already applied; duplicate delivery is a no-op.
    Duplicate,
}

/// One agent-shared text document.
pub struct CollabDocument {
    path: String,
    clock: VectorClock,
    elements: HashMap<ElementId, Element>,
    /// anchor → ordered child element ids (descending (lamport, run)).
    children: HashMap<Option<ElementId>, Vec<ElementId>>,
    applied: HashSet<Uuid>,
    buffered: Vec<CrdtOperation>,
    cursors: HashMap<String, Position>,
    log: Vec<CrdtOperation>,
}

impl CollabDocument {
    /// Create a document seeded with `initial` text. Seed characters have
    /// causal height 0, so every real operation orders around them
    /// correctly.
    pub fn new(path: impl Into<String>, initial: &str) -> Self {
        let mut doc = Self {
            path: path.into(),
            clock: VectorClock::new(),
            elements: HashMap::new(),
            children: HashMap::new(),
            applied: HashSet::new(),
            buffered: Vec::new(),
            cursors: HashMap::new(),
            log: Vec::new(),
        };
        doc.insert_run(SEED_RUN, 0, None, initial);
        doc
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Current text and clock.
    pub fn snapshot(&self) -> (String, VectorClock) {
        let text = self
            .visible_elements()
            .iter()
            .map(|(_, ch)| *ch)
            .collect();
        (text, self.clock.clone())
    }

    /// The append-only operation log, in application order.
    pub fn log(&self) -> &[CrdtOperation] {
        &self.log
    }

    /// Operations buffered on missing causal dependencies.
    pub fn buffered_count(&self) -> usize {
        self.buffered.len()
    }

    /// Per-agent cursor positions.
    pub fn cursor(&self, agent: &str) -> Option<Position> {
        self.cursors.get(agent).copied()
    }

    /// Move an agent's cursor. Commutes with every text operation.
    pub fn update_cursor(&mut self, agent: &str, position: Position) {
        self.cursors.insert(agent.to_string(), position);
    }

    /// Apply a local edit, producing the operation to broadcast.
    ///
    /// Offsets are clamped to the current visible length; the operation's
    /// clock is the document clock with this agent's component advanced.
    pub fn apply_local(&mut self, agent: &str, edit: LocalEdit) -> AgramaResult<CrdtOperation> {
        let visible = self.visible_elements();
        let visible_len = visible.len();

        let (kind, offset, payload, anchor, targets) = match edit {
            LocalEdit::Insert { offset, text } => {
                let offset = offset.min(visible_len);
                let anchor = if offset == 0 {
                    None
                } else {
                    Some(visible[offset - 1].0)
                };
                (OpKind::Insert, offset, text, anchor, Vec::new())
            }
            LocalEdit::Delete { offset, len } => {
                let offset = offset.min(visible_len);
                let end = (offset + len.max(1)).min(visible_len);
                let targets: Vec<ElementId> =
                    visible[offset..end].iter().map(|(id, _)| *id).collect();
                (OpKind::Delete, offset, String::new(), None, targets)
            }
            LocalEdit::Modify { offset, len, text } => {
                let offset = offset.min(visible_len);
                let end = (offset + len).min(visible_len);
                let targets: Vec<ElementId> =
                    visible[offset..end].iter().map(|(id, _)| *id).collect();
                let anchor = if offset == 0 {
                    None
                } else {
                    Some(visible[offset - 1].0)
                };
                (OpKind::Modify, offset, text, anchor, targets)
            }
        };

        self.clock.increment(agent);
        let op = CrdtOperation {
            id: Uuid::new_v4(),
            agent: agent.to_string(),
            doc: self.path.clone(),
            kind,
            position: self.position_at(&visible, offset),
            payload,
            anchor,
            targets,
            clock: self.clock.clone(),
        };

        self.integrate(&op)?;
        self.applied.insert(op.id);
        self.log.push(op.clone());
        Ok(op)
    }

    /// Apply an operation from another agent.
    ///
    /// Duplicates are no-ops. Operations whose causal dependencies are
    /// missing are buffered; applying one operation drains every buffered
    /// operation it unblocks.
    pub fn merge_remote(&mut self, op: CrdtOperation) -> AgramaResult<ApplyOutcome> {
        if self.applied.contains(&op.id) {
            return Ok(ApplyOutcome::Duplicate);
        }
        if !self.can_apply(&op) {
            debug!(doc = %self.path, op = %op.id, "buffering operation on missing dependencies");
            if !self.buffered.iter().any(|b| b.id == op.id) {
                self.buffered.push(op);
            }
            return Ok(ApplyOutcome::Buffered);
        }

        self.apply_op(op)?;

        // Applying one operation can unblock buffered ones; drain to a
        // fixed point.
        let mut progressed = true;
        while progressed {
            progressed = false;
            let mut remaining = Vec::new();
            for buffered in std::mem::take(&mut self.buffered) {
                if self.applied.contains(&buffered.id) {
                    continue;
                }
                if self.can_apply(&buffered) {
                    self.apply_op(buffered)?;
                    progressed = true;
                } else {
                    remaining.push(buffered);
                }
            }
            self.buffered = remaining;
        }
        Ok(ApplyOutcome::Applied)
    }

    /// Causal delivery gate: the origin component must be exactly one
    /// ahead of ours, every other component at most equal.
    fn can_apply(&self, op: &CrdtOperation) -> bool {
        if op.clock.get(&op.agent) != self.clock.get(&op.agent) + 1 {
            return false;
        }
        op.clock
            .agents()
            .filter(|a| *a != op.agent)
            .all(|a| op.clock.get(a) <= self.clock.get(a))
    }

    fn apply_op(&mut self, op: CrdtOperation) -> AgramaResult<()> {
        self.integrate(&op)?;
        self.clock.merge(&op.clock);
        self.applied.insert(op.id);
        self.log.push(op);
        Ok(())
    }

    /// Mutate the element tree for one operation.
    fn integrate(&mut self, op: &CrdtOperation) -> AgramaResult<()> {
        let lamport = clock_sum(&op.clock);
        let run = run_id_for(op.id);

        match op.kind {
            OpKind::Insert => {
                self.insert_run(run, lamport, op.anchor, &op.payload);
            }
            OpKind::Delete => {
                self.tombstone(&op.targets, op)?;
            }
            OpKind::Modify => {
                self.tombstone(&op.targets, op)?;
                self.insert_run(run, lamport, op.anchor, &op.payload);
            }
        }
        Ok(())
    }

    fn tombstone(&mut self, targets: &[ElementId], op: &CrdtOperation) -> AgramaResult<()> {
        for target in targets {
            let element = self
                .elements
                .get_mut(target)
                .ok_or_else(|| CrdtError::UnknownElement {
                    op_id: op.id.to_string(),
                    element: format!("{target:?}"),
                })?;
            element.tombstone = true;
        }
        Ok(())
    }

    /// Insert a run of characters. The first element attaches after the
    /// anchor; each further element chains after its predecessor, keeping
    /// the run contiguous under concurrent edits.
    fn insert_run(&mut self, run: u128, lamport: u64, anchor: Option<ElementId>, text: &str) {
        let mut parent = anchor;
        for (seq, ch) in text.chars().enumerate() {
            let id = ElementId {
                run,
                seq: seq as u32,
            };
            self.elements.insert(
                id,
                Element {
                    ch,
                    tombstone: false,
                    lamport,
                    run,
                },
            );
            let siblings = self.children.entry(parent).or_default();
            let pos = siblings.partition_point(|sib| {
                let s = &self.elements[sib];
                // Descending (lamport, run): causally-later first, then
                // tiebreak by run id.
                (s.lamport, s.run) > (lamport, run)
            });
            siblings.insert(pos, id);
            parent = Some(id);
        }
    }

    /// Visible (id, char) pairs in document order.
    fn visible_elements(&self) -> Vec<(ElementId, char)> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = Vec::new();
        if let Some(roots) = self.children.get(&None) {
            stack.extend(roots.iter().rev());
        }
        while let Some(id) = stack.pop() {
            let element = &self.elements[&id];
            if !element.tombstone {
                out.push((id, element.ch));
            }
            if let Some(kids) = self.children.get(&Some(id)) {
                stack.extend(kids.iter().rev());
            }
        }
        out
    }

    fn position_at(&self, visible: &[(ElementId, char)], offset: usize) -> Position {
        let mut line = 0u32;
        let mut column = 0u32;
        for (_, ch) in &visible[..offset.min(visible.len())] {
            if *ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Position {
            line,
            column,
            offset,
        }
    }
}

/// Causal height of a clock: strictly increases along any causal chain.
fn clock_sum(clock: &VectorClock) -> u64 {
    clock.agents().map(|a| clock.get(a)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_edits_read_naturally() {
        let mut doc = CollabDocument::new("d.txt", "");
        doc.apply_local("x", LocalEdit::Insert { offset: 0, text: "hello".into() })
            .unwrap();
        doc.apply_local("x", LocalEdit::Insert { offset: 5, text: " world".into() })
            .unwrap();
        assert_eq!(doc.snapshot().0, "hello world");

        doc.apply_local("x", LocalEdit::Insert { offset: 0, text: ">".into() })
            .unwrap();
        assert_eq!(doc.snapshot().0, ">hello world");
    }

    #[test]
    fn delete_removes_visible_range() {
        let mut doc = CollabDocument::new("d.txt", "abcdef");
        doc.apply_local("x", LocalEdit::Delete { offset: 1, len: 2 })
            .unwrap();
        assert_eq!(doc.snapshot().0, "adef");
    }

    #[test]
    fn modify_is_delete_plus_insert() {
        let mut doc = CollabDocument::new("d.txt", "abc");
        doc.apply_local(
            "x",
            LocalEdit::Modify { offset: 1, len: 1, text: "XY".into() },
        )
        .unwrap();
        assert_eq!(doc.snapshot().0, "aXYc");
    }

    #[test]
    fn concurrent_insert_and_delete_converge() {
        // Scenario: X inserts 'Z' at offset 1, Y concurrently deletes the
        // character at offset 2. Both replicas end identical.
        let mut x = CollabDocument::new("d.txt", "abc");
        let mut y = CollabDocument::new("d.txt", "abc");

        let op_x = x
            .apply_local("X", LocalEdit::Insert { offset: 1, text: "Z".into() })
            .unwrap();
        let op_y = y
            .apply_local("Y", LocalEdit::Delete { offset: 2, len: 1 })
            .unwrap();
        assert_eq!(x.snapshot().0, "aZbc");
        assert_eq!(y.snapshot().0, "ab");

        assert_eq!(x.merge_remote(op_y).unwrap(), ApplyOutcome::Applied);
        assert_eq!(y.merge_remote(op_x).unwrap(), ApplyOutcome::Applied);

        let (text_x, clock_x) = x.snapshot();
        let (text_y, clock_y) = y.snapshot();
        assert_eq!(text_x, text_y);
        assert_eq!(text_x.len(), 3);
        assert_eq!(text_x, "aZb");
        assert_eq!(clock_x, clock_y);
        assert_eq!(clock_x.get("X"), 1);
        assert_eq!(clock_x.get("Y"), 1);
    }

    #[test]
    fn duplicate_delivery_is_a_noop() {
        let mut x = CollabDocument::new("d.txt", "abc");
        let mut y = CollabDocument::new("d.txt", "abc");
        let op = x
            .apply_local("X", LocalEdit::Insert { offset: 0, text: "!".into() })
            .unwrap();

        assert_eq!(y.merge_remote(op.clone()).unwrap(), ApplyOutcome::Applied);
        assert_eq!(y.merge_remote(op).unwrap(), ApplyOutcome::Duplicate);
        assert_eq!(y.snapshot().0, "!abc");
    }

    #[test]
    fn out_of_order_delivery_buffers_until_dependencies_arrive() {
        let mut x = CollabDocument::new("d.txt", "");
        let mut y = CollabDocument::new("d.txt", "");

        let first = x
            .apply_local("X", LocalEdit::Insert { offset: 0, text: "a".into() })
            .unwrap();
        let second = x
            .apply_local("X", LocalEdit::Insert { offset: 1, text: "b".into() })
            .unwrap();

        assert_eq!(y.merge_remote(second).unwrap(), ApplyOutcome::Buffered);
        assert_eq!(y.buffered_count(), 1);
        assert_eq!(y.snapshot().0, "");

        assert_eq!(y.merge_remote(first).unwrap(), ApplyOutcome::Applied);
        assert_eq!(y.buffered_count(), 0);
        assert_eq!(y.snapshot().0, "ab");
    }

    #[test]
    fn cursor_updates_commute_with_text_ops() {
        let mut doc = CollabDocument::new("d.txt", "abc");
        doc.update_cursor("X", Position { line: 0, column: 2, offset: 2 });
        doc.apply_local("Y", LocalEdit::Insert { offset: 0, text: "zz".into() })
            .unwrap();
        assert_eq!(doc.cursor("X").map(|p| p.offset), Some(2));
    }

    #[test]
    fn local_op_clock_is_doc_clock_plus_one() {
        let mut doc = CollabDocument::new("d.txt", "");
        let before = doc.snapshot().1.get("X");
        let op = doc
            .apply_local("X", LocalEdit::Insert { offset: 0, text: "a".into() })
            .unwrap();
        assert_eq!(op.clock.get("X"), before + 1);
        assert_eq!(doc.snapshot().1.get("X"), before + 1);
    }

    #[test]
    fn position_tracks_lines_and_columns() {
        let mut doc = CollabDocument::new("d.txt", "ab\ncd");
        let op = doc
            .apply_local("X", LocalEdit::Insert { offset: 4, text: "!".into() })
            .unwrap();
        assert_eq!(op.position.line, 1);
        assert_eq!(op.position.column, 1);
        assert_eq!(doc.snapshot().0, "ab\nc!d");
    }
}
