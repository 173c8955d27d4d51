//! Core schema data model for TD diagrams.
//!
//! A [`SchemaDoc`] is the in-memory diagram: tables (with ordered columns),
//! relationships between columns, free-form notes, and area rectangles.
//! Tables and relationships carry referential semantics; notes and areas are
//! purely visual. Entity `x, y` are world-space coordinates of the top-left
//! corner.

use crate::id::EntityId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// Accent color for a table header, note, or area. A closed set — rendering
/// matches exhaustively instead of going through a string-keyed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorToken {
    Slate,
    Red,
    Orange,
    Amber,
    Green,
    Teal,
    #[default]
    Blue,
    Indigo,
    Violet,
    Pink,
}

impl ColorToken {
    /// Default palette order used when cycling colors for new entities.
    pub const PALETTE: [ColorToken; 10] = [
        ColorToken::Blue,
        ColorToken::Teal,
        ColorToken::Green,
        ColorToken::Amber,
        ColorToken::Orange,
        ColorToken::Red,
        ColorToken::Pink,
        ColorToken::Violet,
        ColorToken::Indigo,
        ColorToken::Slate,
    ];

    /// Pick the n-th palette color, wrapping around.
    pub fn cycle(n: usize) -> Self {
        Self::PALETTE[n % Self::PALETTE.len()]
    }

    /// Hex value for rendering.
    pub fn as_hex(&self) -> &'static str {
        match self {
            ColorToken::Slate => "#64748B",
            ColorToken::Red => "#EF4444",
            ColorToken::Orange => "#F97316",
            ColorToken::Amber => "#F59E0B",
            ColorToken::Green => "#22C55E",
            ColorToken::Teal => "#14B8A6",
            ColorToken::Blue => "#3B82F6",
            ColorToken::Indigo => "#6366F1",
            ColorToken::Violet => "#8B5CF6",
            ColorToken::Pink => "#EC4899",
        }
    }
}

// ─── Columns & Tables ────────────────────────────────────────────────────

/// A table column. Owned exclusively by its [`Table`]; identity survives
/// renames and text round-trips (the sync engine matches by name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: EntityId,
    pub name: String,
    /// Upper-case canonical type token, e.g. `INT`, `VARCHAR(255)`.
    pub ty: String,
    pub is_primary_key: bool,
    pub is_not_null: bool,
    pub is_unique: bool,
    pub is_auto_increment: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate("col"),
            name: name.into(),
            ty: ty.into(),
            is_primary_key: false,
            is_not_null: false,
            is_unique: false,
            is_auto_increment: false,
        }
    }
}

/// A table node on the canvas. Column order is rendering order and is
/// significant: it determines row positions and connector anchor geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: EntityId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub color: ColorToken,
    pub is_locked: bool,
    pub comment: Option<String>,
    pub columns: SmallVec<[Column; 8]>,
}

impl Table {
    pub fn new(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: EntityId::generate("tbl"),
            name: name.into(),
            x,
            y,
            color: ColorToken::default(),
            is_locked: false,
            comment: None,
            columns: SmallVec::new(),
        }
    }

    /// The default layout for a freshly added table: a single-PK
    /// `id` / `name` / `created_at` / `email` scaffold.
    pub fn starter(name: impl Into<String>, x: f32, y: f32) -> Self {
        let mut table = Self::new(name, x, y);
        let mut id_col = Column::new("id", "INT");
        id_col.is_primary_key = true;
        id_col.is_not_null = true;
        id_col.is_auto_increment = true;
        table.columns.push(id_col);
        table.columns.push(Column::new("name", "VARCHAR"));
        table.columns.push(Column::new("created_at", "TIMESTAMP"));
        table.columns.push(Column::new("email", "VARCHAR"));
        table
    }

    pub fn column(&self, column_id: EntityId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn column_mut(&mut self, column_id: EntityId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }
}

// ─── Relationships ───────────────────────────────────────────────────────

/// Declared multiplicity between the source and target columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cardinality {
    OneToOne,
    #[default]
    OneToMany,
    ManyToOne,
}

/// Referential action on update/delete of the referenced row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl RefAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            RefAction::NoAction => "NO ACTION",
            RefAction::Restrict => "RESTRICT",
            RefAction::Cascade => "CASCADE",
            RefAction::SetNull => "SET NULL",
            RefAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// A relationship edge between two table columns.
///
/// Endpoint ids are plain references — the model layer accepts dangling ids
/// (the validation engine reports them), but [`SchemaDoc::remove_table`]
/// cascade-deletes every relationship touching a removed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: EntityId,
    pub name: String,
    pub source_table: EntityId,
    pub source_column: EntityId,
    pub target_table: EntityId,
    pub target_column: EntityId,
    pub cardinality: Cardinality,
    pub on_update: RefAction,
    pub on_delete: RefAction,
}

/// Partial relationship as produced by the connect gesture or a `Ref`
/// statement. [`Relationship::from_draft`] fills the defaults — this is a
/// merge, not a validation step.
#[derive(Debug, Clone, Default)]
pub struct RelationshipDraft {
    pub name: Option<String>,
    pub source_table: EntityId,
    pub source_column: EntityId,
    pub target_table: EntityId,
    pub target_column: EntityId,
    pub cardinality: Option<Cardinality>,
    pub on_update: Option<RefAction>,
    pub on_delete: Option<RefAction>,
}

impl Relationship {
    pub fn from_draft(draft: RelationshipDraft) -> Self {
        let id = EntityId::generate("rel");
        Self {
            id,
            name: draft.name.unwrap_or_else(|| id.as_str().to_string()),
            source_table: draft.source_table,
            source_column: draft.source_column,
            target_table: draft.target_table,
            target_column: draft.target_column,
            cardinality: draft.cardinality.unwrap_or_default(),
            on_update: draft.on_update.unwrap_or_default(),
            on_delete: draft.on_delete.unwrap_or_default(),
        }
    }

    /// True when either endpoint references `table_id`.
    pub fn touches_table(&self, table_id: EntityId) -> bool {
        self.source_table == table_id || self.target_table == table_id
    }

    /// True when either endpoint references `column_id`.
    pub fn touches_column(&self, column_id: EntityId) -> bool {
        self.source_column == column_id || self.target_column == column_id
    }
}

// ─── Notes & Areas ───────────────────────────────────────────────────────

/// Free-text annotation. Independent lifecycle, no referential constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub content: String,
    pub color: ColorToken,
    pub is_locked: bool,
}

impl Note {
    pub fn new(title: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: EntityId::generate("note"),
            x,
            y,
            width: 180.0,
            height: 120.0,
            title: title.into(),
            content: String::new(),
            color: ColorToken::Amber,
            is_locked: false,
        }
    }
}

/// A grouping rectangle. Containment is purely spatial — areas hold no data
/// relationship to the tables they visually cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub color: ColorToken,
    pub is_locked: bool,
    pub z_index: i32,
}

impl Area {
    pub fn new(title: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: EntityId::generate("area"),
            x,
            y,
            width: 320.0,
            height: 240.0,
            title: title.into(),
            color: ColorToken::Slate,
            is_locked: false,
            z_index: 0,
        }
    }
}

// ─── Batched moves ───────────────────────────────────────────────────────

/// One absolute-position update inside a batched move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovePatch {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
}

// ─── Schema document ─────────────────────────────────────────────────────

/// The complete diagram document: the single mutable state owned by an
/// editor session. All mutation goes through these operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDoc {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
    pub notes: Vec<Note>,
    pub areas: Vec<Area>,
}

impl SchemaDoc {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Tables ──────────────────────────────────────────────────────────

    pub fn table(&self, id: EntityId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn table_mut(&mut self, id: EntityId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn add_table(&mut self, table: Table) -> EntityId {
        let id = table.id;
        self.tables.push(table);
        id
    }

    /// Remove a table and cascade-delete every relationship referencing it.
    /// Returns the removed table, or `None` if the id is unknown.
    pub fn remove_table(&mut self, id: EntityId) -> Option<Table> {
        let pos = self.tables.iter().position(|t| t.id == id)?;
        let removed = self.tables.remove(pos);
        self.relationships.retain(|r| !r.touches_table(id));
        Some(removed)
    }

    /// Apply a list of absolute position updates in one state transition, so
    /// a multi-select drag never shows a partially moved frame.
    pub fn move_tables(&mut self, patches: &[MovePatch]) {
        for table in &mut self.tables {
            if let Some(p) = patches.iter().find(|p| p.id == table.id) {
                table.x = p.x;
                table.y = p.y;
            }
        }
    }

    // ─── Columns ─────────────────────────────────────────────────────────

    /// Address a column by the `(table, column)` compound key.
    pub fn column(&self, table_id: EntityId, column_id: EntityId) -> Option<&Column> {
        self.table(table_id)?.column(column_id)
    }

    pub fn column_mut(&mut self, table_id: EntityId, column_id: EntityId) -> Option<&mut Column> {
        self.table_mut(table_id)?.column_mut(column_id)
    }

    pub fn add_column(&mut self, table_id: EntityId, column: Column) -> Option<EntityId> {
        let table = self.table_mut(table_id)?;
        let id = column.id;
        table.columns.push(column);
        Some(id)
    }

    /// Remove a column, cascading to relationships anchored on it.
    pub fn remove_column(&mut self, table_id: EntityId, column_id: EntityId) -> Option<Column> {
        let table = self.table_mut(table_id)?;
        let pos = table.columns.iter().position(|c| c.id == column_id)?;
        let removed = table.columns.remove(pos);
        self.relationships.retain(|r| !r.touches_column(column_id));
        Some(removed)
    }

    // ─── Relationships ───────────────────────────────────────────────────

    pub fn relationship(&self, id: EntityId) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Create a relationship from a partial draft, filling defaults.
    /// Endpoint ids are not checked here — dangling references surface
    /// through the validation engine instead.
    pub fn add_relationship(&mut self, draft: RelationshipDraft) -> EntityId {
        let rel = Relationship::from_draft(draft);
        let id = rel.id;
        self.relationships.push(rel);
        id
    }

    pub fn remove_relationship(&mut self, id: EntityId) -> Option<Relationship> {
        let pos = self.relationships.iter().position(|r| r.id == id)?;
        Some(self.relationships.remove(pos))
    }

    // ─── Notes ───────────────────────────────────────────────────────────

    pub fn note(&self, id: EntityId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note_mut(&mut self, id: EntityId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn add_note(&mut self, note: Note) -> EntityId {
        let id = note.id;
        self.notes.push(note);
        id
    }

    pub fn remove_note(&mut self, id: EntityId) -> Option<Note> {
        let pos = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(pos))
    }

    pub fn move_notes(&mut self, patches: &[MovePatch]) {
        for note in &mut self.notes {
            if let Some(p) = patches.iter().find(|p| p.id == note.id) {
                note.x = p.x;
                note.y = p.y;
            }
        }
    }

    // ─── Areas ───────────────────────────────────────────────────────────

    pub fn area(&self, id: EntityId) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn area_mut(&mut self, id: EntityId) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| a.id == id)
    }

    pub fn add_area(&mut self, area: Area) -> EntityId {
        let id = area.id;
        self.areas.push(area);
        id
    }

    pub fn remove_area(&mut self, id: EntityId) -> Option<Area> {
        let pos = self.areas.iter().position(|a| a.id == id)?;
        Some(self.areas.remove(pos))
    }

    pub fn move_areas(&mut self, patches: &[MovePatch]) {
        for area in &mut self.areas {
            if let Some(p) = patches.iter().find(|p| p.id == area.id) {
                area.x = p.x;
                area.y = p.y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_linked_tables() -> SchemaDoc {
        let mut doc = SchemaDoc::new();
        let users = Table::starter("users", 10.0, 20.0);
        let posts = Table::starter("posts", 400.0, 20.0);
        let (users_id, users_pk) = (users.id, users.columns[0].id);
        let (posts_id, posts_pk) = (posts.id, posts.columns[0].id);
        doc.add_table(users);
        doc.add_table(posts);
        doc.add_relationship(RelationshipDraft {
            source_table: posts_id,
            source_column: posts_pk,
            target_table: users_id,
            target_column: users_pk,
            ..Default::default()
        });
        doc
    }

    #[test]
    fn starter_table_has_single_pk_scaffold() {
        let t = Table::starter("users", 0.0, 0.0);
        let names: Vec<_> = t.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "created_at", "email"]);
        assert_eq!(t.columns.iter().filter(|c| c.is_primary_key).count(), 1);
        assert!(t.columns[0].is_auto_increment);
    }

    #[test]
    fn draft_fills_defaults() {
        let mut doc = two_linked_tables();
        let rel_id = doc.relationships[0].id;
        let rel = doc.relationship(rel_id).unwrap();
        assert_eq!(rel.cardinality, Cardinality::OneToMany);
        assert_eq!(rel.on_update, RefAction::NoAction);
        assert_eq!(rel.on_delete, RefAction::NoAction);

        // Dangling refs are accepted at this layer.
        let dangling = doc.add_relationship(RelationshipDraft {
            source_table: EntityId::intern("ghost"),
            ..Default::default()
        });
        assert!(doc.relationship(dangling).is_some());
    }

    #[test]
    fn remove_table_cascades_relationships() {
        let mut doc = two_linked_tables();
        let users_id = doc.table_by_name("users").unwrap().id;
        assert_eq!(doc.relationships.len(), 1);
        doc.remove_table(users_id);
        assert!(doc.relationships.is_empty());
        assert!(doc.table_by_name("users").is_none());
    }

    #[test]
    fn remove_column_cascades_relationships() {
        let mut doc = two_linked_tables();
        let users = doc.table_by_name("users").unwrap();
        let (users_id, pk) = (users.id, users.columns[0].id);
        doc.remove_column(users_id, pk);
        assert!(doc.relationships.is_empty());
    }

    #[test]
    fn batched_move_applies_all_in_one_pass() {
        let mut doc = two_linked_tables();
        let a = doc.tables[0].id;
        let b = doc.tables[1].id;
        doc.move_tables(&[
            MovePatch { id: a, x: 1.0, y: 1.0 },
            MovePatch { id: b, x: 2.0, y: 2.0 },
        ]);
        assert_eq!((doc.tables[0].x, doc.tables[0].y), (1.0, 1.0));
        assert_eq!((doc.tables[1].x, doc.tables[1].y), (2.0, 2.0));
    }

    #[test]
    fn rename_keeps_column_identity() {
        let mut doc = two_linked_tables();
        let users_id = doc.table_by_name("users").unwrap().id;
        let col_id = doc.table(users_id).unwrap().columns[1].id;
        doc.column_mut(users_id, col_id).unwrap().name = "full_name".into();
        assert_eq!(doc.column(users_id, col_id).unwrap().name, "full_name");
        assert_eq!(doc.column(users_id, col_id).unwrap().id, col_id);
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(ColorToken::cycle(0), ColorToken::Blue);
        assert_eq!(ColorToken::cycle(10), ColorToken::Blue);
        assert_ne!(ColorToken::cycle(1), ColorToken::cycle(2));
    }
}
