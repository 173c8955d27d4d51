//! Interaction state machine: raw pointer events → document mutations.
//!
//! A single controller tracks the active gesture. Pointer coordinates come
//! in as screen space and are converted through the camera's inverse
//! transform exactly once per event, so camera and document updates from one
//! event land in the same state transition.
//!
//! | Gesture | Trigger |
//! |---------|---------|
//! | Panning | middle-button drag, or space+left drag |
//! | Dragging | left-down on a table/note/area body |
//! | Resizing | left-down on a note/area resize handle |
//! | Connecting | left-down on a column connector grip |

use crate::hit::{Corner, HitTarget, hit_test};
use crate::input::{Button, InputEvent, apply_wheel};
use crate::session::EditorSession;
use td_core::EntityId;
use td_core::model::{Cardinality, MovePatch, RelationshipDraft};

/// Minimum note size after a resize.
pub const NOTE_MIN_WIDTH: f32 = 120.0;
pub const NOTE_MIN_HEIGHT: f32 = 80.0;
/// Minimum area size after a resize.
pub const AREA_MIN_WIDTH: f32 = 160.0;
pub const AREA_MIN_HEIGHT: f32 = 120.0;

/// Which entity list a drag gesture moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Tables,
    Notes,
    Areas,
}

/// The active gesture. Every variant captures the pointer id that started
/// it; events from other pointers do not advance the gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    Panning {
        pointer_id: u32,
        last_x: f32,
        last_y: f32,
    },
    Dragging {
        pointer_id: u32,
        kind: DragKind,
        /// Per-entity world-space offset from the pointer, captured once at
        /// drag start so relative positions survive the whole gesture.
        offsets: Vec<(EntityId, f32, f32)>,
    },
    ResizingNote {
        pointer_id: u32,
        note: EntityId,
    },
    ResizingArea {
        pointer_id: u32,
        area: EntityId,
        corner: Corner,
    },
    Connecting {
        pointer_id: u32,
        source_table: EntityId,
        source_column: EntityId,
        /// Current pointer position in world space, for rendering the
        /// provisional edge.
        cursor: (f32, f32),
    },
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Idle
    }
}

#[derive(Default)]
pub struct InteractionController {
    state: Interaction,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &Interaction {
        &self.state
    }

    /// Feed one input event. Camera and document mutations happen inside
    /// this call, atomically per event.
    pub fn handle(&mut self, session: &mut EditorSession, event: InputEvent) {
        match event {
            InputEvent::PointerDown {
                pointer_id,
                button,
                x,
                y,
                modifiers,
            } => {
                if !matches!(self.state, Interaction::Idle) {
                    return;
                }
                if button == Button::Middle || (button == Button::Left && modifiers.space) {
                    self.state = Interaction::Panning {
                        pointer_id,
                        last_x: x,
                        last_y: y,
                    };
                    return;
                }
                if button != Button::Left {
                    return;
                }
                let (wx, wy) = session.camera.to_world(x, y);
                self.pointer_down(session, pointer_id, wx, wy, modifiers.shift);
            }
            InputEvent::PointerMove {
                pointer_id, x, y, ..
            } => self.pointer_move(session, pointer_id, x, y),
            InputEvent::PointerUp { pointer_id, x, y } => {
                self.pointer_up(session, pointer_id, x, y);
            }
            InputEvent::PointerCancel { pointer_id } => {
                if self.state_pointer() == Some(pointer_id) {
                    self.state = Interaction::Idle;
                }
            }
            InputEvent::Wheel {
                x,
                y,
                delta_x,
                delta_y,
                modifiers,
            } => {
                apply_wheel(&mut session.camera, x, y, delta_x, delta_y, modifiers);
            }
        }
    }

    fn state_pointer(&self) -> Option<u32> {
        match self.state {
            Interaction::Idle => None,
            Interaction::Panning { pointer_id, .. }
            | Interaction::Dragging { pointer_id, .. }
            | Interaction::ResizingNote { pointer_id, .. }
            | Interaction::ResizingArea { pointer_id, .. }
            | Interaction::Connecting { pointer_id, .. } => Some(pointer_id),
        }
    }

    fn pointer_down(
        &mut self,
        session: &mut EditorSession,
        pointer_id: u32,
        wx: f32,
        wy: f32,
        shift: bool,
    ) {
        match hit_test(&session.doc, wx, wy) {
            HitTarget::TableBody(id) => {
                if shift {
                    session.selection.extend_tables(id);
                } else if !session.selection.tables.contains(&id) {
                    session.selection.select_table(id);
                }
                let offsets: Vec<(EntityId, f32, f32)> = session
                    .selection
                    .tables
                    .iter()
                    .filter_map(|tid| session.doc.table(*tid))
                    .filter(|t| !t.is_locked)
                    .map(|t| (t.id, t.x - wx, t.y - wy))
                    .collect();
                if !offsets.is_empty() {
                    self.state = Interaction::Dragging {
                        pointer_id,
                        kind: DragKind::Tables,
                        offsets,
                    };
                }
            }
            HitTarget::NoteBody(id) => {
                session.selection.select_note(id);
                if let Some(note) = session.doc.note(id).filter(|n| !n.is_locked) {
                    self.state = Interaction::Dragging {
                        pointer_id,
                        kind: DragKind::Notes,
                        offsets: vec![(id, note.x - wx, note.y - wy)],
                    };
                }
            }
            HitTarget::AreaBody(id) => {
                session.selection.select_area(id);
                if let Some(area) = session.doc.area(id).filter(|a| !a.is_locked) {
                    self.state = Interaction::Dragging {
                        pointer_id,
                        kind: DragKind::Areas,
                        offsets: vec![(id, area.x - wx, area.y - wy)],
                    };
                }
            }
            HitTarget::NoteResizeHandle(id) => {
                session.selection.select_note(id);
                if session.doc.note(id).is_some_and(|n| !n.is_locked) {
                    self.state = Interaction::ResizingNote {
                        pointer_id,
                        note: id,
                    };
                }
            }
            HitTarget::AreaResizeHandle { area, corner } => {
                session.selection.select_area(area);
                if session.doc.area(area).is_some_and(|a| !a.is_locked) {
                    self.state = Interaction::ResizingArea {
                        pointer_id,
                        area,
                        corner,
                    };
                }
            }
            HitTarget::ColumnGrip { table, column } => {
                self.state = Interaction::Connecting {
                    pointer_id,
                    source_table: table,
                    source_column: column,
                    cursor: (wx, wy),
                };
            }
            HitTarget::Empty => {
                session.selection.clear();
            }
        }
    }

    fn pointer_move(&mut self, session: &mut EditorSession, pointer_id: u32, sx: f32, sy: f32) {
        match &mut self.state {
            Interaction::Panning {
                pointer_id: pid,
                last_x,
                last_y,
            } if *pid == pointer_id => {
                session.camera.pan_by(sx - *last_x, sy - *last_y);
                *last_x = sx;
                *last_y = sy;
            }
            Interaction::Dragging {
                pointer_id: pid,
                kind,
                offsets,
            } if *pid == pointer_id => {
                let (wx, wy) = session.camera.to_world(sx, sy);
                let patches: Vec<MovePatch> = offsets
                    .iter()
                    .map(|(id, ox, oy)| MovePatch {
                        id: *id,
                        x: wx + ox,
                        y: wy + oy,
                    })
                    .collect();
                let kind = *kind;
                match kind {
                    DragKind::Tables => session.move_tables(&patches),
                    DragKind::Notes => session.move_notes(&patches),
                    DragKind::Areas => session.move_areas(&patches),
                }
            }
            Interaction::ResizingNote {
                pointer_id: pid,
                note,
            } if *pid == pointer_id => {
                let (wx, wy) = session.camera.to_world(sx, sy);
                let note = *note;
                if let Some(n) = session.doc.note_mut(note) {
                    n.width = (wx - n.x).max(NOTE_MIN_WIDTH);
                    n.height = (wy - n.y).max(NOTE_MIN_HEIGHT);
                    session.touch();
                }
            }
            Interaction::ResizingArea {
                pointer_id: pid,
                area,
                corner,
            } if *pid == pointer_id => {
                let (wx, wy) = session.camera.to_world(sx, sy);
                let (area, corner) = (*area, *corner);
                if let Some(a) = session.doc.area_mut(area) {
                    resize_area(a, corner, wx, wy);
                    session.touch();
                }
            }
            Interaction::Connecting {
                pointer_id: pid,
                cursor,
                ..
            } if *pid == pointer_id => {
                *cursor = session.camera.to_world(sx, sy);
            }
            _ => {}
        }
    }

    fn pointer_up(&mut self, session: &mut EditorSession, pointer_id: u32, sx: f32, sy: f32) {
        if self.state_pointer() != Some(pointer_id) {
            return;
        }
        if let Interaction::Connecting {
            source_table,
            source_column,
            ..
        } = self.state
        {
            let (wx, wy) = session.camera.to_world(sx, sy);
            if let HitTarget::ColumnGrip { table, column } = hit_test(&session.doc, wx, wy)
                && column != source_column
            {
                session.add_relationship(RelationshipDraft {
                    source_table,
                    source_column,
                    target_table: table,
                    target_column: column,
                    cardinality: Some(Cardinality::OneToMany),
                    ..Default::default()
                });
            }
        }
        self.state = Interaction::Idle;
    }
}

/// Corner-aware area resize with a minimum-size floor. North/west corners
/// move `x`/`y`; the opposite edge stays put.
fn resize_area(area: &mut td_core::model::Area, corner: Corner, wx: f32, wy: f32) {
    let right = area.x + area.width;
    let bottom = area.y + area.height;
    match corner {
        Corner::SouthEast => {
            area.width = (wx - area.x).max(AREA_MIN_WIDTH);
            area.height = (wy - area.y).max(AREA_MIN_HEIGHT);
        }
        Corner::SouthWest => {
            area.x = wx.min(right - AREA_MIN_WIDTH);
            area.width = right - area.x;
            area.height = (wy - area.y).max(AREA_MIN_HEIGHT);
        }
        Corner::NorthEast => {
            area.y = wy.min(bottom - AREA_MIN_HEIGHT);
            area.height = bottom - area.y;
            area.width = (wx - area.x).max(AREA_MIN_WIDTH);
        }
        Corner::NorthWest => {
            area.x = wx.min(right - AREA_MIN_WIDTH);
            area.width = right - area.x;
            area.y = wy.min(bottom - AREA_MIN_HEIGHT);
            area.height = bottom - area.y;
        }
    }
}
