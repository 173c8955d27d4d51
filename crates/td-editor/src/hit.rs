//! World-space hit testing.
//!
//! Pointer coordinates are converted to world space by the caller (tools use
//! the camera's inverse transform) and resolved here against entity geometry,
//! front to back: tables above notes above areas, later declarations on top,
//! areas ordered by `z_index`.

use td_core::model::*;
use td_core::EntityId;

// ─── Table geometry ──────────────────────────────────────────────────────

/// Tables render at a fixed width; height derives from the column count.
pub const TABLE_WIDTH: f32 = 220.0;
pub const TABLE_HEADER_HEIGHT: f32 = 40.0;
pub const TABLE_ROW_HEIGHT: f32 = 32.0;

/// Half-size of the square connector grip at each end of a column row.
pub const GRIP_RADIUS: f32 = 8.0;

/// Square resize handle edge length for notes and areas.
pub const RESIZE_HANDLE: f32 = 12.0;

pub fn table_height(table: &Table) -> f32 {
    TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT * table.columns.len() as f32
}

/// World-space anchor of a column's connector grip on the given side.
pub fn grip_center(table: &Table, row: usize, side: GripSide) -> (f32, f32) {
    let x = match side {
        GripSide::Left => table.x,
        GripSide::Right => table.x + TABLE_WIDTH,
    };
    let y = table.y + TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT * (row as f32 + 0.5);
    (x, y)
}

// ─── Hit targets ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripSide {
    Left,
    Right,
}

/// Corner of an area's resize handle set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

/// What a world-space point lands on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    TableBody(EntityId),
    /// A column connector grip; starts the connect gesture.
    ColumnGrip {
        table: EntityId,
        column: EntityId,
    },
    NoteBody(EntityId),
    /// Notes resize from their south-east corner only.
    NoteResizeHandle(EntityId),
    AreaBody(EntityId),
    AreaResizeHandle {
        area: EntityId,
        corner: Corner,
    },
    Empty,
}

/// Resolve a world-space point to the topmost entity under it.
#[must_use]
pub fn hit_test(doc: &SchemaDoc, wx: f32, wy: f32) -> HitTarget {
    // Tables, topmost first. Grips extend slightly outside the body, so
    // they are tested before the body rectangle.
    for table in doc.tables.iter().rev() {
        for (row, column) in table.columns.iter().enumerate() {
            for side in [GripSide::Left, GripSide::Right] {
                let (gx, gy) = grip_center(table, row, side);
                if (wx - gx).abs() <= GRIP_RADIUS && (wy - gy).abs() <= GRIP_RADIUS {
                    return HitTarget::ColumnGrip {
                        table: table.id,
                        column: column.id,
                    };
                }
            }
        }
        if contains(table.x, table.y, TABLE_WIDTH, table_height(table), wx, wy) {
            return HitTarget::TableBody(table.id);
        }
    }

    for note in doc.notes.iter().rev() {
        let hx = note.x + note.width - RESIZE_HANDLE;
        let hy = note.y + note.height - RESIZE_HANDLE;
        if contains(hx, hy, RESIZE_HANDLE, RESIZE_HANDLE, wx, wy) {
            return HitTarget::NoteResizeHandle(note.id);
        }
        if contains(note.x, note.y, note.width, note.height, wx, wy) {
            return HitTarget::NoteBody(note.id);
        }
    }

    let mut areas: Vec<&Area> = doc.areas.iter().collect();
    areas.sort_by_key(|a| std::cmp::Reverse(a.z_index));
    for area in areas {
        if let Some(corner) = area_corner_at(area, wx, wy) {
            return HitTarget::AreaResizeHandle {
                area: area.id,
                corner,
            };
        }
        if contains(area.x, area.y, area.width, area.height, wx, wy) {
            return HitTarget::AreaBody(area.id);
        }
    }

    HitTarget::Empty
}

fn area_corner_at(area: &Area, wx: f32, wy: f32) -> Option<Corner> {
    let corners = [
        (Corner::NorthWest, area.x, area.y),
        (Corner::NorthEast, area.x + area.width - RESIZE_HANDLE, area.y),
        (
            Corner::SouthWest,
            area.x,
            area.y + area.height - RESIZE_HANDLE,
        ),
        (
            Corner::SouthEast,
            area.x + area.width - RESIZE_HANDLE,
            area.y + area.height - RESIZE_HANDLE,
        ),
    ];
    corners
        .into_iter()
        .find(|&(_, cx, cy)| contains(cx, cy, RESIZE_HANDLE, RESIZE_HANDLE, wx, wy))
        .map(|(corner, _, _)| corner)
}

fn contains(x: f32, y: f32, w: f32, h: f32, px: f32, py: f32) -> bool {
    px >= x && px <= x + w && py >= y && py <= y + h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_table() -> (SchemaDoc, EntityId) {
        let mut doc = SchemaDoc::new();
        let id = doc.add_table(Table::starter("users", 100.0, 100.0));
        (doc, id)
    }

    #[test]
    fn body_and_empty() {
        let (doc, id) = doc_with_table();
        assert_eq!(hit_test(&doc, 150.0, 120.0), HitTarget::TableBody(id));
        assert_eq!(hit_test(&doc, 0.0, 0.0), HitTarget::Empty);
    }

    #[test]
    fn grip_beats_body() {
        let (doc, id) = doc_with_table();
        let table = doc.table(id).unwrap();
        let (gx, gy) = grip_center(table, 0, GripSide::Right);
        match hit_test(&doc, gx, gy) {
            HitTarget::ColumnGrip { table: t, column } => {
                assert_eq!(t, id);
                assert_eq!(column, table.columns[0].id);
            }
            other => panic!("expected grip, got {other:?}"),
        }
    }

    #[test]
    fn later_tables_hit_first() {
        let mut doc = SchemaDoc::new();
        let below = doc.add_table(Table::starter("below", 0.0, 0.0));
        let above = doc.add_table(Table::starter("above", 10.0, 10.0));
        assert_eq!(hit_test(&doc, 50.0, 50.0), HitTarget::TableBody(above));
        assert_eq!(hit_test(&doc, 5.0, 5.0), HitTarget::TableBody(below));
    }

    #[test]
    fn area_z_index_orders_hits() {
        let mut doc = SchemaDoc::new();
        let mut a = Area::new("back", 0.0, 0.0);
        a.z_index = 0;
        let mut b = Area::new("front", 0.0, 0.0);
        b.z_index = 5;
        let _back = doc.add_area(a);
        let front = doc.add_area(b);
        assert_eq!(hit_test(&doc, 160.0, 120.0), HitTarget::AreaBody(front));
    }

    #[test]
    fn note_resize_handle() {
        let mut doc = SchemaDoc::new();
        let id = doc.add_note(Note::new("todo", 0.0, 0.0));
        let note = doc.note(id).unwrap();
        let target = hit_test(
            &doc,
            note.x + note.width - 2.0,
            note.y + note.height - 2.0,
        );
        assert_eq!(target, HitTarget::NoteResizeHandle(id));
    }
}
