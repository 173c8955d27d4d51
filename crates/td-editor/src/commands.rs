//! Undo/redo stack over document snapshots.
//!
//! Discrete edits record a checkpoint before mutating. Drag gestures use
//! snapshot batching: the document is captured once at gesture start and the
//! whole gesture undoes in a single step, however many move events it
//! produced. A gesture that ends where it started records nothing.

use crate::session::EditorSession;
use td_core::model::SchemaDoc;

pub const DEFAULT_UNDO_DEPTH: usize = 100;

#[derive(Debug, Clone)]
struct Snapshot {
    doc: SchemaDoc,
    description: String,
}

pub struct CommandStack {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
    /// Document captured at `begin_gesture`, pending until the gesture ends.
    gesture: Option<Snapshot>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            gesture: None,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Name of the edit `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|s| s.description.as_str())
    }

    /// Record the pre-mutation state of a discrete edit. Call immediately
    /// before the mutation.
    pub fn checkpoint(&mut self, session: &EditorSession, description: &str) {
        if self.gesture.is_some() {
            // inside a gesture the start snapshot already covers this edit
            return;
        }
        self.push_undo(Snapshot {
            doc: session.doc.clone(),
            description: description.to_string(),
        });
        self.redo_stack.clear();
    }

    /// Start a drag/resize gesture. Nested calls are not supported; a
    /// second begin replaces nothing and keeps the first snapshot.
    pub fn begin_gesture(&mut self, session: &EditorSession, description: &str) {
        if self.gesture.is_none() {
            self.gesture = Some(Snapshot {
                doc: session.doc.clone(),
                description: description.to_string(),
            });
        }
    }

    /// Close the gesture. Records one undo step when the document actually
    /// changed.
    pub fn end_gesture(&mut self, session: &EditorSession) {
        let Some(snapshot) = self.gesture.take() else {
            return;
        };
        if snapshot.doc != session.doc {
            self.push_undo(snapshot);
            self.redo_stack.clear();
        }
    }

    pub fn undo(&mut self, session: &mut EditorSession) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(Snapshot {
            doc: session.doc.clone(),
            description: snapshot.description.clone(),
        });
        restore(session, snapshot.doc);
        true
    }

    pub fn redo(&mut self, session: &mut EditorSession) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(Snapshot {
            doc: session.doc.clone(),
            description: snapshot.description.clone(),
        });
        restore(session, snapshot.doc);
        true
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }
}

fn restore(session: &mut EditorSession, doc: SchemaDoc) {
    session.doc = doc;
    session.selection.prune(&session.doc);
    session.touch();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_undo_redo_cycle() {
        let mut session = EditorSession::new();
        let mut stack = CommandStack::default();

        stack.checkpoint(&session, "add table");
        session.add_table();
        assert_eq!(session.doc.tables.len(), 1);

        assert!(stack.undo(&mut session));
        assert!(session.doc.tables.is_empty());

        assert!(stack.redo(&mut session));
        assert_eq!(session.doc.tables.len(), 1);
    }

    #[test]
    fn gesture_batches_to_one_step() {
        let mut session = EditorSession::new();
        let id = session.add_table();
        let mut stack = CommandStack::default();

        stack.begin_gesture(&session, "move table");
        for step in 1..=10 {
            session.move_tables(&[td_core::model::MovePatch {
                id,
                x: step as f32 * 10.0,
                y: 0.0,
            }]);
        }
        stack.end_gesture(&session);

        let before = session.doc.table(id).unwrap().x;
        assert_eq!(before, 100.0);
        assert!(stack.undo(&mut session));
        // one undo reverts the whole drag
        assert_ne!(session.doc.table(id).unwrap().x, before);
        assert!(!stack.can_undo());
    }

    #[test]
    fn unchanged_gesture_records_nothing() {
        let mut session = EditorSession::new();
        session.add_table();
        let mut stack = CommandStack::default();

        stack.begin_gesture(&session, "move table");
        stack.end_gesture(&session);
        assert!(!stack.can_undo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut session = EditorSession::new();
        let mut stack = CommandStack::default();

        stack.checkpoint(&session, "add table");
        session.add_table();
        stack.undo(&mut session);
        assert!(stack.can_redo());

        stack.checkpoint(&session, "add note");
        session.add_note();
        assert!(!stack.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut session = EditorSession::new();
        let mut stack = CommandStack::new(3);
        for _ in 0..10 {
            stack.checkpoint(&session, "add table");
            session.add_table();
        }
        let mut undone = 0;
        while stack.undo(&mut session) {
            undone += 1;
        }
        assert_eq!(undone, 3);
    }
}
