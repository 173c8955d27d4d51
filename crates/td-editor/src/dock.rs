//! Dock-tab relocation: dragging editor tabs between the two side panels.
//!
//! UI chrome adjacent to the core. A dragged tab carries its id and origin
//! side; a drop zone id resolves to a target side by exact or prefix match,
//! and a drop on the origin side is a no-op.

/// Panel side a tab can dock to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Payload carried by a tab drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabDrag {
    pub tab_id: String,
    pub from_side: Side,
}

/// Resolve a drop-zone id to a side. Zone ids are either the literal side
/// name or prefixed forms like `left-dock` / `right-panel`.
pub fn resolve_zone(zone_id: &str) -> Option<Side> {
    if zone_id == "left" || zone_id.starts_with("left-") {
        Some(Side::Left)
    } else if zone_id == "right" || zone_id.starts_with("right-") {
        Some(Side::Right)
    } else {
        None
    }
}

/// Compute the relocation a drop implies, if any. Returns the target side
/// only when the tab actually changes sides.
pub fn resolve_drop(drag: &TabDrag, zone_id: &str) -> Option<Side> {
    let target = resolve_zone(zone_id)?;
    if target == drag.from_side {
        return None;
    }
    Some(target)
}
