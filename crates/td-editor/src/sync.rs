//! Bidirectional sync engine: canvas model ⇄ text buffer.
//!
//! Exactly one direction is authoritative at a time, tracked by an explicit
//! state machine instead of an ad hoc "user is typing" flag:
//!
//! - **Model→Text**: a canvas mutation regenerates the buffer, unless a text
//!   edit is still settling (regenerating then would stomp in-flight
//!   keystrokes).
//! - **Text→Model**: buffer edits settle behind a debounce; when the timer
//!   fires, the buffer is parsed once with its latest content and applied.
//!
//! Applying text re-parses from scratch, so an identity merge matches parsed
//! tables and columns to existing ones *by name* and carries over their ids,
//! positions, and colors. Without it every keystroke would scatter the
//! user's layout.
//!
//! The engine is clocked explicitly: callers pass a millisecond timestamp to
//! [`SyncEngine::text_edited`] and [`SyncEngine::poll`]. There is no
//! internal timer.

use crate::session::EditorSession;
use std::collections::{HashMap, HashSet};
use td_core::json::{JsonError, tables_from_json, tables_to_json};
use td_core::model::SchemaDoc;
use td_core::parser::{Diagnostic, parse_schema};
use td_core::{Camera, EntityId, Viewport, emit_mermaid, emit_schema, emit_sql};
use thiserror::Error;

/// Debounce settle delay for text edits. A "pause in typing" heuristic;
/// anything bounded in the 300–1000ms range behaves acceptably.
pub const SETTLE_DELAY_MS: u64 = 800;

// ─── Notation ────────────────────────────────────────────────────────────

/// The textual notation shown in the editor pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    /// Schema DSL. Bidirectional, with live diagnostics.
    #[default]
    Dbml,
    /// Structural dump of the table list. Bidirectional, wholesale replace.
    Json,
    /// Mermaid ER diagram. Generated only; edits are rejected.
    Mermaid,
    /// SQL DDL. Generated only; edits are rejected.
    Sql,
}

impl Notation {
    pub fn extension(self) -> &'static str {
        match self {
            Notation::Dbml => "dbml",
            Notation::Json => "json",
            Notation::Mermaid => "mmd",
            Notation::Sql => "sql",
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Notation::Dbml | Notation::Json)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SyncError {
    /// The buffer did not parse; the model is unchanged. Ranges are byte
    /// offsets into the buffer.
    #[error("schema text has {} diagnostic(s)", .0.len())]
    Parse(Vec<Diagnostic>),
    /// Attempt to apply text in a generated-only notation.
    #[error("{0:?} notation is read-only; edits cannot be applied")]
    NotationReadOnly(Notation),
    #[error(transparent)]
    Json(#[from] JsonError),
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Authoritative sync direction. `Idle` between cycles; the applying states
/// guard against re-entrant echo while a cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    ApplyingModelToText,
    ApplyingTextToModel,
}

pub struct SyncEngine {
    notation: Notation,
    state: SyncState,
    text: String,
    diagnostics: Vec<Diagnostic>,
    /// Deadline (ms) of the pending text apply, rescheduled on every edit.
    deadline_ms: Option<u64>,
}

impl SyncEngine {
    pub fn new(notation: Notation) -> Self {
        Self {
            notation,
            state: SyncState::default(),
            text: String::new(),
            diagnostics: Vec::new(),
            deadline_ms: None,
        }
    }

    pub fn notation(&self) -> Notation {
        self.notation
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Switch notation. Drops any pending edit and regenerates the buffer
    /// from the model.
    pub fn set_notation(
        &mut self,
        notation: Notation,
        session: &EditorSession,
    ) -> Result<(), SyncError> {
        self.notation = notation;
        self.deadline_ms = None;
        self.diagnostics.clear();
        self.text = render_text(&session.doc, notation)?;
        Ok(())
    }

    // ─── Text → Model ────────────────────────────────────────────────────

    /// Record a buffer edit and (re)start the settle timer. The previous
    /// pending deadline, if any, is cancelled.
    pub fn text_edited(&mut self, text: impl Into<String>, now_ms: u64) {
        self.text = text.into();
        self.deadline_ms = Some(now_ms + SETTLE_DELAY_MS);
    }

    /// Drive the debounce clock. Returns `None` while nothing is due;
    /// otherwise parses the latest buffer content once and applies it.
    pub fn poll(
        &mut self,
        now_ms: u64,
        session: &mut EditorSession,
    ) -> Option<Result<(), SyncError>> {
        let deadline = self.deadline_ms?;
        if now_ms < deadline {
            return None;
        }
        self.deadline_ms = None;

        self.state = SyncState::ApplyingTextToModel;
        let result = self.apply_text(session);
        self.state = SyncState::Idle;

        match &result {
            Ok(()) => self.diagnostics.clear(),
            Err(SyncError::Parse(diags)) => {
                log::debug!("text apply failed with {} diagnostic(s)", diags.len());
                self.diagnostics = diags.clone();
            }
            Err(err) => log::debug!("text apply rejected: {err}"),
        }
        Some(result)
    }

    fn apply_text(&mut self, session: &mut EditorSession) -> Result<(), SyncError> {
        match self.notation {
            Notation::Dbml => {
                let parsed = parse_schema(&self.text).map_err(SyncError::Parse)?;
                merge_parsed(session, parsed);
                Ok(())
            }
            Notation::Json => {
                // Ids are serialized in this notation, so a wholesale
                // replace already preserves identity.
                let tables = tables_from_json(&self.text)?;
                session.doc.tables = tables;
                session.selection.prune(&session.doc);
                session.touch();
                Ok(())
            }
            Notation::Mermaid | Notation::Sql => {
                Err(SyncError::NotationReadOnly(self.notation))
            }
        }
    }

    // ─── Model → Text ────────────────────────────────────────────────────

    /// React to a canvas-side mutation: regenerate the buffer from the
    /// model. Suppressed (returns `Ok(None)`) while a text edit is settling
    /// or a text apply is in flight, so the echo cannot overwrite
    /// keystrokes.
    pub fn model_changed(
        &mut self,
        session: &EditorSession,
    ) -> Result<Option<&str>, SyncError> {
        if self.deadline_ms.is_some() || self.state != SyncState::Idle {
            return Ok(None);
        }
        self.state = SyncState::ApplyingModelToText;
        let rendered = render_text(&session.doc, self.notation);
        self.state = SyncState::Idle;
        self.text = rendered?;
        Ok(Some(&self.text))
    }
}

/// Render the model in the given notation.
pub fn render_text(doc: &SchemaDoc, notation: Notation) -> Result<String, SyncError> {
    match notation {
        Notation::Dbml => Ok(emit_schema(doc)),
        Notation::Json => Ok(tables_to_json(&doc.tables)?),
        Notation::Mermaid => Ok(emit_mermaid(doc)),
        Notation::Sql => Ok(emit_sql(doc)),
    }
}

// ─── Identity merge ──────────────────────────────────────────────────────

/// Apply a freshly parsed document over the session's model, matching
/// tables and columns by name so ids, positions, and colors survive the
/// re-parse. Unmatched tables are new: they keep their generated id and get
/// a scatter position inside the current viewport. Notes and areas have no
/// textual form and are left untouched.
fn merge_parsed(session: &mut EditorSession, mut parsed: SchemaDoc) {
    let mut remap: HashMap<EntityId, EntityId> = HashMap::new();
    let mut claimed: HashSet<EntityId> = HashSet::new();

    for table in &mut parsed.tables {
        let existing = session
            .doc
            .tables
            .iter()
            .find(|t| t.name == table.name && !claimed.contains(&t.id))
            .cloned();

        let Some(old) = existing else {
            let (x, y) = session.next_scatter_position();
            table.x = x;
            table.y = y;
            continue;
        };

        claimed.insert(old.id);
        remap.insert(table.id, old.id);
        table.id = old.id;
        table.x = old.x;
        table.y = old.y;
        table.color = old.color;
        table.is_locked = old.is_locked;

        for column in &mut table.columns {
            if let Some(old_col) = old.columns.iter().find(|c| c.name == column.name) {
                remap.insert(column.id, old_col.id);
                column.id = old_col.id;
            }
        }
    }

    for rel in &mut parsed.relationships {
        for endpoint in [
            &mut rel.source_table,
            &mut rel.source_column,
            &mut rel.target_table,
            &mut rel.target_column,
        ] {
            if let Some(kept) = remap.get(endpoint) {
                *endpoint = *kept;
            }
        }
    }

    session.doc.tables = parsed.tables;
    session.doc.relationships = parsed.relationships;
    session.selection.prune(&session.doc);
    session.touch();
}

/// Deterministic placement for the `n`-th text-originated table: a 5×4 grid
/// walk across the current viewport's world bounds.
pub fn scatter_position(camera: &Camera, viewport: Viewport, n: u64) -> (f32, f32) {
    let (left, top) = camera.to_world(0.0, 0.0);
    let world_w = viewport.width / camera.zoom;
    let world_h = viewport.height / camera.zoom;
    let col = (n % 5) as f32;
    let row = ((n / 5) % 4) as f32;
    (
        left + world_w * (0.08 + 0.18 * col),
        top + world_h * (0.10 + 0.22 * row),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::model::Table;

    #[test]
    fn scatter_stays_inside_viewport_world_bounds() {
        let camera = Camera {
            x: -250.0,
            y: 80.0,
            zoom: 0.5,
        };
        let viewport = Viewport::default();
        let (left, top) = camera.to_world(0.0, 0.0);
        let (right, bottom) = camera.to_world(viewport.width, viewport.height);
        for n in 0..40 {
            let (x, y) = scatter_position(&camera, viewport, n);
            assert!(x >= left && x <= right, "x out of view for n={n}");
            assert!(y >= top && y <= bottom, "y out of view for n={n}");
        }
    }

    #[test]
    fn read_only_notations_reject_edits() {
        for notation in [Notation::Mermaid, Notation::Sql] {
            let mut session = EditorSession::new();
            let mut engine = SyncEngine::new(notation);
            engine.text_edited("anything, even empty next:", 0);
            engine.text_edited("", 1);
            let result = engine.poll(SETTLE_DELAY_MS + 1, &mut session);
            assert!(matches!(
                result,
                Some(Err(SyncError::NotationReadOnly(n))) if n == notation
            ));
        }
    }

    #[test]
    fn json_apply_replaces_tables_wholesale() {
        let mut session = EditorSession::new();
        session.doc.add_table(Table::starter("old", 0.0, 0.0));

        let replacement = vec![Table::starter("fresh", 5.0, 6.0)];
        let text = tables_to_json(&replacement).unwrap();

        let mut engine = SyncEngine::new(Notation::Json);
        engine.text_edited(text, 0);
        let result = engine.poll(SETTLE_DELAY_MS, &mut session);
        assert!(matches!(result, Some(Ok(()))));
        assert_eq!(session.doc.tables, replacement);
    }

    #[test]
    fn malformed_json_leaves_model_unchanged() {
        let mut session = EditorSession::new();
        session.doc.add_table(Table::starter("keep", 0.0, 0.0));
        let before = session.doc.clone();

        let mut engine = SyncEngine::new(Notation::Json);
        engine.text_edited("{\"not\": \"an array\"}", 0);
        let result = engine.poll(SETTLE_DELAY_MS, &mut session);
        assert!(matches!(result, Some(Err(SyncError::Json(_)))));
        assert_eq!(session.doc, before);
    }

    #[test]
    fn model_changed_is_suppressed_while_edit_settles() {
        let mut session = EditorSession::new();
        session.add_table();
        let mut engine = SyncEngine::new(Notation::Dbml);

        engine.text_edited("Table pending { id int [pk] }", 0);
        // Echo suppressed: the user's in-flight keystrokes survive.
        assert!(engine.model_changed(&session).unwrap().is_none());
        assert_eq!(engine.text(), "Table pending { id int [pk] }");

        engine.poll(SETTLE_DELAY_MS, &mut session).unwrap().unwrap();
        // After the apply settles, model→text flows again.
        assert!(engine.model_changed(&session).unwrap().is_some());
    }

    #[test]
    fn parse_failure_sets_diagnostics_and_success_clears_them() {
        let mut session = EditorSession::new();
        let mut engine = SyncEngine::new(Notation::Dbml);

        engine.text_edited("Table { broken", 0);
        let result = engine.poll(SETTLE_DELAY_MS, &mut session);
        assert!(matches!(result, Some(Err(SyncError::Parse(_)))));
        assert!(!engine.diagnostics().is_empty());
        assert!(session.doc.tables.is_empty());

        engine.text_edited("Table fixed { id int [pk] }", 1_000);
        engine
            .poll(1_000 + SETTLE_DELAY_MS, &mut session)
            .unwrap()
            .unwrap();
        assert!(engine.diagnostics().is_empty());
        assert_eq!(session.doc.tables.len(), 1);
    }
}
