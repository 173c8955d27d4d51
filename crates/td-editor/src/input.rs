//! Raw input events and the wheel policy.
//!
//! Pointer events arrive in screen space; tools convert them to world space
//! through the camera's inverse transform. The wheel policy lives here
//! because it is a design decision, not an incidental mapping:
//!
//! | Modifier | Effect |
//! |----------|--------|
//! | none | pan by `(deltaX, deltaY)`, each clamped to ±120px |
//! | **Shift** | horizontal-only pan, `deltaY` reinterpreted as horizontal |
//! | **Ctrl/Cmd** | zoom at cursor, `exp(-deltaY * k)` clamped to `[0.85, 1.15]` |

use td_core::Camera;

/// Per-event pan clamp. Trackpads occasionally report huge single-event
/// deltas; clamping keeps those from teleporting the canvas.
pub const WHEEL_PAN_CLAMP: f32 = 120.0;

/// Exponent scale for wheel zoom.
pub const WHEEL_ZOOM_K: f32 = 0.01;

/// Per-event zoom factor bounds.
pub const WHEEL_ZOOM_MIN: f32 = 0.85;
pub const WHEEL_ZOOM_MAX: f32 = 1.15;

/// Keyboard modifier state carried on every pointer event. `space` is held
/// key state, not a modifier in the DOM sense, but it gates the pan gesture
/// the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub space: bool,
}

impl Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer button, from the platform's button index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Middle,
    Right,
}

/// A raw input event in screen-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown {
        pointer_id: u32,
        button: Button,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },
    PointerMove {
        pointer_id: u32,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },
    PointerUp {
        pointer_id: u32,
        x: f32,
        y: f32,
    },
    /// Pointer capture was lost (window blur, element removal). Tools treat
    /// this as pointer-up without a commit position.
    PointerCancel { pointer_id: u32 },
    Wheel {
        x: f32,
        y: f32,
        delta_x: f32,
        delta_y: f32,
        modifiers: Modifiers,
    },
}

/// Apply the wheel policy to the camera. Returns `true` when the camera
/// changed.
pub fn apply_wheel(
    camera: &mut Camera,
    x: f32,
    y: f32,
    delta_x: f32,
    delta_y: f32,
    modifiers: Modifiers,
) -> bool {
    if modifiers.primary() {
        let factor = (-delta_y * WHEEL_ZOOM_K)
            .exp()
            .clamp(WHEEL_ZOOM_MIN, WHEEL_ZOOM_MAX);
        return camera.zoom_at(factor, x, y);
    }

    let clamp = |d: f32| d.clamp(-WHEEL_PAN_CLAMP, WHEEL_PAN_CLAMP);
    let (dx, dy) = if modifiers.shift {
        (clamp(-delta_y), 0.0)
    } else {
        (clamp(-delta_x), clamp(-delta_y))
    };
    if dx == 0.0 && dy == 0.0 {
        return false;
    }
    camera.pan_by(dx, dy);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::MAX_ZOOM;

    #[test]
    fn plain_wheel_pans_with_clamp() {
        let mut camera = Camera::default();
        apply_wheel(&mut camera, 0.0, 0.0, 10.0, 900.0, Modifiers::default());
        assert_eq!(camera.x, -10.0);
        // the huge deltaY spike is tamed to the clamp
        assert_eq!(camera.y, -WHEEL_PAN_CLAMP);
    }

    #[test]
    fn shift_wheel_pans_horizontally_from_delta_y() {
        let mut camera = Camera::default();
        let mods = Modifiers {
            shift: true,
            ..Default::default()
        };
        apply_wheel(&mut camera, 0.0, 0.0, 0.0, 40.0, mods);
        assert_eq!(camera.x, -40.0);
        assert_eq!(camera.y, 0.0);
    }

    #[test]
    fn ctrl_wheel_zooms_with_bounded_factor() {
        let mut camera = Camera::default();
        let mods = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        // Enormous delta still produces at most a 15% step.
        apply_wheel(&mut camera, 100.0, 100.0, 0.0, -10_000.0, mods);
        assert!((camera.zoom - WHEEL_ZOOM_MAX).abs() < 1e-6);
    }

    #[test]
    fn ctrl_wheel_respects_camera_bounds() {
        let mut camera = Camera::default();
        let mods = Modifiers {
            meta: true,
            ..Default::default()
        };
        for _ in 0..100 {
            apply_wheel(&mut camera, 0.0, 0.0, 0.0, -10_000.0, mods);
        }
        assert!(camera.zoom <= MAX_ZOOM);
    }
}
