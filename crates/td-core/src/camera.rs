//! Camera and viewport: the affine transform between world and screen space.
//!
//! The canvas is infinite; entities live in world coordinates and the camera
//! maps them to screen pixels via `screen = world * zoom + (x, y)`. Pan and
//! zoom mutate the camera only — entity coordinates never change when the
//! view moves.

use serde::{Deserialize, Serialize};

/// Lower bound for the zoom factor. Also guarantees the inverse transform
/// never divides by zero.
pub const MIN_ZOOM: f32 = 0.15;
/// Upper bound for the zoom factor.
pub const MAX_ZOOM: f32 = 3.0;

/// The view transform: screen-space translation plus uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen-space translation offset (x).
    pub x: f32,
    /// Screen-space translation offset (y).
    pub y: f32,
    /// Uniform scale factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Map a world point to screen space.
    pub fn to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.zoom + self.x, wy * self.zoom + self.y)
    }

    /// Map a screen point to world space (inverse transform).
    pub fn to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.x) / self.zoom, (sy - self.y) / self.zoom)
    }

    /// Pan by screen-space deltas. The canvas is unbounded, so no clamping.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Multiply zoom by `factor`, keeping the world point under the screen
    /// point `(sx, sy)` visually fixed. Returns `false` (and leaves the
    /// camera untouched) when the clamped zoom equals the current zoom.
    pub fn zoom_at(&mut self, factor: f32, sx: f32, sy: f32) -> bool {
        self.set_zoom_at(self.zoom * factor, sx, sy)
    }

    /// Set an absolute zoom with the same fixed-point math as [`zoom_at`].
    /// Used by zoom-menu presets.
    ///
    /// [`zoom_at`]: Camera::zoom_at
    pub fn set_zoom_at(&mut self, zoom: f32, sx: f32, sy: f32) -> bool {
        let next = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if next == self.zoom {
            return false;
        }
        // World point under the cursor with the *old* zoom, then solve the
        // translation so the same point lands back under the cursor with the
        // *new* zoom.
        let (wx, wy) = self.to_world(sx, sy);
        self.zoom = next;
        self.x = sx - wx * next;
        self.y = sy - wy * next;
        true
    }

    /// World-space point at the center of the given viewport. Used for
    /// centered insertion of new entities.
    pub fn world_center(&self, viewport: Viewport) -> (f32, f32) {
        self.to_world(viewport.width / 2.0, viewport.height / 2.0)
    }
}

/// The visible canvas size in screen pixels. Recalculated when the container
/// resizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport {
    pub fn set(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
