//! The editor session: one owned object per open diagram.
//!
//! Owns the document, camera, viewport, and selection, and exposes every
//! mutation as a method. There are no ambient globals; two sessions never
//! share state, so tests run without cross-contamination.

use crate::sync::scatter_position;
use td_core::model::*;
use td_core::validate::{Finding, validate_schema};
use td_core::{Camera, EntityId, Viewport};

// ─── Selection ───────────────────────────────────────────────────────────

/// Mutually exclusive selection: at most one entity kind is selected at any
/// time. Within the table kind multiple ids may be selected (multi-drag).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub tables: Vec<EntityId>,
    pub notes: Vec<EntityId>,
    pub areas: Vec<EntityId>,
    pub relationship: Option<EntityId>,
}

impl Selection {
    pub fn clear(&mut self) {
        self.tables.clear();
        self.notes.clear();
        self.areas.clear();
        self.relationship = None;
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.notes.is_empty()
            && self.areas.is_empty()
            && self.relationship.is_none()
    }

    pub fn select_table(&mut self, id: EntityId) {
        self.clear();
        self.tables.push(id);
    }

    /// Add a table to the selection, clearing any other kind first.
    pub fn extend_tables(&mut self, id: EntityId) {
        self.notes.clear();
        self.areas.clear();
        self.relationship = None;
        if !self.tables.contains(&id) {
            self.tables.push(id);
        }
    }

    pub fn select_note(&mut self, id: EntityId) {
        self.clear();
        self.notes.push(id);
    }

    pub fn select_area(&mut self, id: EntityId) {
        self.clear();
        self.areas.push(id);
    }

    pub fn select_relationship(&mut self, id: EntityId) {
        self.clear();
        self.relationship = Some(id);
    }

    /// Drop ids that no longer exist in the document.
    pub(crate) fn prune(&mut self, doc: &SchemaDoc) {
        self.tables.retain(|id| doc.table(*id).is_some());
        self.notes.retain(|id| doc.note(*id).is_some());
        self.areas.retain(|id| doc.area(*id).is_some());
        if let Some(id) = self.relationship
            && !doc.relationships.iter().any(|r| r.id == id)
        {
            self.relationship = None;
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

/// Everything one open diagram needs. Document mutations go through the
/// session so the revision counter (and the memoized findings) stay honest.
pub struct EditorSession {
    pub doc: SchemaDoc,
    pub camera: Camera,
    pub viewport: Viewport,
    pub selection: Selection,
    revision: u64,
    /// Count of entities ever created here; drives color cycling and
    /// scatter placement.
    created: u64,
    findings_rev: Option<u64>,
    findings: Vec<Finding>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self {
            doc: SchemaDoc::new(),
            camera: Camera::default(),
            viewport: Viewport::default(),
            selection: Selection::default(),
            revision: 0,
            created: 0,
            findings_rev: None,
            findings: Vec::new(),
        }
    }

    pub fn from_doc(doc: SchemaDoc) -> Self {
        let mut session = Self::new();
        session.created = doc.tables.len() as u64;
        session.doc = doc;
        session
    }

    /// Monotonic document revision; bumps on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark the document changed. Called by every mutating method, and by
    /// the sync engine after a text-originated apply.
    pub fn touch(&mut self) {
        self.revision += 1;
    }

    // ─── Entity creation ─────────────────────────────────────────────────

    /// Add a starter table centered on the viewport and select it
    /// exclusively.
    pub fn add_table(&mut self) -> EntityId {
        let (cx, cy) = self.camera.world_center(self.viewport);
        let name = format!("table_{}", self.created + 1);
        let mut table = Table::starter(name, cx - 110.0, cy - 80.0);
        table.color = ColorToken::cycle(self.created as usize);
        self.created += 1;
        let id = self.doc.add_table(table);
        self.selection.select_table(id);
        self.touch();
        id
    }

    pub fn add_note(&mut self) -> EntityId {
        let (cx, cy) = self.camera.world_center(self.viewport);
        let note = Note::new(format!("note_{}", self.created + 1), cx - 90.0, cy - 60.0);
        self.created += 1;
        let id = self.doc.add_note(note);
        self.selection.select_note(id);
        self.touch();
        id
    }

    pub fn add_area(&mut self) -> EntityId {
        let (cx, cy) = self.camera.world_center(self.viewport);
        let area = Area::new(format!("area_{}", self.created + 1), cx - 160.0, cy - 120.0);
        self.created += 1;
        let id = self.doc.add_area(area);
        self.selection.select_area(id);
        self.touch();
        id
    }

    pub fn add_relationship(&mut self, draft: RelationshipDraft) -> EntityId {
        let id = self.doc.add_relationship(draft);
        self.selection.select_relationship(id);
        self.touch();
        id
    }

    /// Placement for a table that arrived from the text side (no viewport
    /// anchor of its own).
    pub fn next_scatter_position(&mut self) -> (f32, f32) {
        let pos = scatter_position(&self.camera, self.viewport, self.created);
        self.created += 1;
        pos
    }

    // ─── Entity removal ──────────────────────────────────────────────────

    pub fn remove_table(&mut self, id: EntityId) -> Option<Table> {
        let removed = self.doc.remove_table(id);
        if removed.is_some() {
            self.selection.prune(&self.doc);
            self.touch();
        }
        removed
    }

    pub fn remove_note(&mut self, id: EntityId) -> Option<Note> {
        let removed = self.doc.remove_note(id);
        if removed.is_some() {
            self.selection.prune(&self.doc);
            self.touch();
        }
        removed
    }

    pub fn remove_area(&mut self, id: EntityId) -> Option<Area> {
        let removed = self.doc.remove_area(id);
        if removed.is_some() {
            self.selection.prune(&self.doc);
            self.touch();
        }
        removed
    }

    pub fn remove_relationship(&mut self, id: EntityId) -> bool {
        let before = self.doc.relationships.len();
        self.doc.relationships.retain(|r| r.id != id);
        let removed = self.doc.relationships.len() != before;
        if removed {
            self.selection.prune(&self.doc);
            self.touch();
        }
        removed
    }

    // ─── Moves ───────────────────────────────────────────────────────────

    /// One state update for the whole patch set; multi-select drags stay
    /// atomic.
    pub fn move_tables(&mut self, patches: &[MovePatch]) {
        if patches.is_empty() {
            return;
        }
        self.doc.move_tables(patches);
        self.touch();
    }

    pub fn move_notes(&mut self, patches: &[MovePatch]) {
        if patches.is_empty() {
            return;
        }
        self.doc.move_notes(patches);
        self.touch();
    }

    pub fn move_areas(&mut self, patches: &[MovePatch]) {
        if patches.is_empty() {
            return;
        }
        self.doc.move_areas(patches);
        self.touch();
    }

    // ─── Findings ────────────────────────────────────────────────────────

    /// Validation findings, memoized on the document revision.
    pub fn findings(&mut self) -> &[Finding] {
        if self.findings_rev != Some(self.revision) {
            self.findings = validate_schema(&self.doc.tables, &self.doc.relationships);
            self.findings_rev = Some(self.revision);
        }
        &self.findings
    }

    /// Selecting an issue selects its associated table.
    pub fn select_finding(&mut self, finding_id: &str) {
        let table_id = self
            .findings
            .iter()
            .find(|f| f.id == finding_id)
            .and_then(|f| f.table_id);
        if let Some(id) = table_id {
            self.selection.select_table(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_table_centers_and_selects() {
        let mut session = EditorSession::new();
        session.camera.pan_by(-500.0, -300.0);
        let id = session.add_table();
        let (cx, cy) = session.camera.world_center(session.viewport);
        let table = session.doc.table(id).unwrap();
        assert!((table.x - (cx - 110.0)).abs() < 1e-3);
        assert!((table.y - (cy - 80.0)).abs() < 1e-3);
        assert_eq!(session.selection.tables, vec![id]);
    }

    #[test]
    fn selection_kinds_are_mutually_exclusive() {
        let mut session = EditorSession::new();
        let table = session.add_table();
        assert_eq!(session.selection.tables, vec![table]);

        let note = session.add_note();
        assert!(session.selection.tables.is_empty());
        assert_eq!(session.selection.notes, vec![note]);

        let area = session.add_area();
        assert!(session.selection.notes.is_empty());
        assert_eq!(session.selection.areas, vec![area]);

        let rel = session.add_relationship(RelationshipDraft::default());
        assert!(session.selection.areas.is_empty());
        assert_eq!(session.selection.relationship, Some(rel));

        session.selection.select_table(table);
        assert_eq!(session.selection.relationship, None);
        // at most one kind non-empty, always
        let kinds = [
            !session.selection.tables.is_empty(),
            !session.selection.notes.is_empty(),
            !session.selection.areas.is_empty(),
            session.selection.relationship.is_some(),
        ];
        assert_eq!(kinds.iter().filter(|k| **k).count(), 1);
    }

    #[test]
    fn removal_prunes_selection() {
        let mut session = EditorSession::new();
        let id = session.add_table();
        session.remove_table(id);
        assert!(session.selection.is_empty());
    }

    #[test]
    fn colors_cycle_across_new_tables() {
        let mut session = EditorSession::new();
        let a = session.add_table();
        let b = session.add_table();
        let ca = session.doc.table(a).unwrap().color;
        let cb = session.doc.table(b).unwrap().color;
        assert_ne!(ca, cb);
    }

    #[test]
    fn findings_are_memoized_per_revision() {
        let mut session = EditorSession::new();
        session.add_table();
        let rev = session.revision();
        let count = session.findings().len();
        assert_eq!(session.findings().len(), count);
        assert_eq!(session.revision(), rev);

        session.add_table();
        assert!(session.revision() > rev);
        // second table duplicates nothing, but the isolated-table rule now
        // applies to both
        assert!(
            session
                .findings()
                .iter()
                .filter(|f| f.rule == "isolated-table")
                .count()
                == 2
        );
    }

    #[test]
    fn finding_selection_targets_its_table() {
        let mut session = EditorSession::new();
        let id = session.add_table();
        session.add_table();
        session.selection.clear();

        let finding_id = session
            .findings()
            .iter()
            .find(|f| f.table_id == Some(id))
            .map(|f| f.id.clone())
            .unwrap();
        session.select_finding(&finding_id);
        assert_eq!(session.selection.tables, vec![id]);
    }
}
