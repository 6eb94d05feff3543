//! Rendering surface abstraction
//!
//! The simulation never touches pixels. It hands vertex lists and animation
//! requests to a [`Surface`]; the browser build backs this with SVG, the
//! native build and tests use [`HeadlessSurface`].

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::wedge::Wedge;

/// Opaque handle to a shape owned by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeHandle(pub u32);

/// Drawing operations the board and bricks need
pub trait Surface {
    /// Create a closed polygon and return its handle
    fn draw_polygon(&mut self, points: &[Vec2], class: &str) -> ShapeHandle;

    /// Replace the vertices of an existing polygon
    fn update_polygon(&mut self, handle: ShapeHandle, points: &[Vec2]);

    /// Start a rotation of `angle_delta` degrees around `center`.
    /// Completion is tracked by the caller, which then calls [`Surface::reset_transform`].
    fn animate_rotation(
        &mut self,
        handle: ShapeHandle,
        angle_delta: f32,
        center: Vec2,
        duration_ms: f32,
    );

    /// Drop any transient transform left by an animation
    fn reset_transform(&mut self, handle: ShapeHandle);

    /// Cosmetic marker for a shape about to be removed
    fn tag_shape_for_removal(&mut self, handle: ShapeHandle);

    fn remove_shape(&mut self, handle: ShapeHandle);

    fn draw_wedge(&mut self, wedge: &Wedge, center: Vec2, class: &str) -> ShapeHandle {
        self.draw_polygon(&wedge.vertices(center), class)
    }

    fn update_wedge(&mut self, handle: ShapeHandle, wedge: &Wedge, center: Vec2) {
        self.update_polygon(handle, &wedge.vertices(center));
    }
}

/// A shape as recorded by [`HeadlessSurface`]
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessShape {
    pub points: Vec<Vec2>,
    pub class: String,
    /// Transient rotation applied by an unfinished animation (degrees)
    pub rotation_deg: f32,
    pub tagged_for_removal: bool,
}

/// In-memory surface that records shapes instead of drawing them
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    shapes: BTreeMap<ShapeHandle, HeadlessShape>,
    next_handle: u32,
    animations_started: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&HeadlessShape> {
        self.shapes.get(&handle)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Number of live shapes carrying the given class
    pub fn count_with_class(&self, class: &str) -> usize {
        self.shapes.values().filter(|s| s.class == class).count()
    }

    pub fn animations_started(&self) -> usize {
        self.animations_started
    }
}

impl Surface for HeadlessSurface {
    fn draw_polygon(&mut self, points: &[Vec2], class: &str) -> ShapeHandle {
        let handle = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(
            handle,
            HeadlessShape {
                points: points.to_vec(),
                class: class.to_string(),
                rotation_deg: 0.0,
                tagged_for_removal: false,
            },
        );
        handle
    }

    fn update_polygon(&mut self, handle: ShapeHandle, points: &[Vec2]) {
        if let Some(shape) = self.shapes.get_mut(&handle) {
            shape.points = points.to_vec();
        }
    }

    fn animate_rotation(
        &mut self,
        handle: ShapeHandle,
        angle_delta: f32,
        _center: Vec2,
        _duration_ms: f32,
    ) {
        if let Some(shape) = self.shapes.get_mut(&handle) {
            shape.rotation_deg += angle_delta;
            self.animations_started += 1;
        }
    }

    fn reset_transform(&mut self, handle: ShapeHandle) {
        if let Some(shape) = self.shapes.get_mut(&handle) {
            shape.rotation_deg = 0.0;
        }
    }

    fn tag_shape_for_removal(&mut self, handle: ShapeHandle) {
        if let Some(shape) = self.shapes.get_mut(&handle) {
            shape.tagged_for_removal = true;
        }
    }

    fn remove_shape(&mut self, handle: ShapeHandle) {
        self.shapes.remove(&handle);
    }
}
