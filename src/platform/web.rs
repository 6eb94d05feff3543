//! Browser backend: SVG surface and frame scheduling

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window};

use crate::consts::FRAME_FALLBACK_MS;
use crate::sim::wedge::path_data;
use crate::sim::test_mode_requested;
use crate::surface::{ShapeHandle, Surface};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Class added to shapes that are about to be deleted
pub const REMOVING_CLASS: &str = "removing";

struct SvgShape {
    element: Element,
    /// Rotation accumulated by animations that have not been reset yet
    rotation_deg: f32,
}

/// [`Surface`] backed by `<path>` elements inside an `<svg>` root
pub struct SvgSurface {
    document: Document,
    root: Element,
    shapes: HashMap<ShapeHandle, SvgShape>,
    next_handle: u32,
}

impl SvgSurface {
    pub fn new(document: Document, root: Element) -> Self {
        Self {
            document,
            root,
            shapes: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Look up the root `<svg>` by element id
    pub fn from_element_id(document: Document, id: &str) -> Result<Self, JsValue> {
        let root = document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{id}'")))?;
        Ok(Self::new(document, root))
    }

    fn create_path(&self, points: &[Vec2], class: &str) -> Result<Element, JsValue> {
        let element = self.document.create_element_ns(Some(SVG_NS), "path")?;
        element.set_attribute("d", &path_data(points, true))?;
        element.set_attribute("class", class)?;
        self.root.append_child(&element)?;
        Ok(element)
    }
}

impl Surface for SvgSurface {
    fn draw_polygon(&mut self, points: &[Vec2], class: &str) -> ShapeHandle {
        let handle = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        match self.create_path(points, class) {
            Ok(element) => {
                self.shapes.insert(
                    handle,
                    SvgShape {
                        element,
                        rotation_deg: 0.0,
                    },
                );
            }
            Err(e) => log::error!("Failed to create shape {class}: {e:?}"),
        }
        handle
    }

    fn update_polygon(&mut self, handle: ShapeHandle, points: &[Vec2]) {
        if let Some(shape) = self.shapes.get(&handle) {
            let _ = shape.element.set_attribute("d", &path_data(points, true));
        }
    }

    fn animate_rotation(
        &mut self,
        handle: ShapeHandle,
        angle_delta: f32,
        center: Vec2,
        duration_ms: f32,
    ) {
        let Some(shape) = self.shapes.get_mut(&handle) else {
            return;
        };
        shape.rotation_deg += angle_delta;
        let style = format!(
            "transform: rotate({}deg); transform-origin: {}px {}px; transition: transform {}ms linear",
            shape.rotation_deg, center.x, center.y, duration_ms
        );
        let _ = shape.element.set_attribute("style", &style);
    }

    fn reset_transform(&mut self, handle: ShapeHandle) {
        if let Some(shape) = self.shapes.get_mut(&handle) {
            shape.rotation_deg = 0.0;
            // Dropping the whole style also drops the transition, so the reset is instant
            let _ = shape.element.remove_attribute("style");
        }
    }

    fn tag_shape_for_removal(&mut self, handle: ShapeHandle) {
        if let Some(shape) = self.shapes.get(&handle) {
            let _ = shape.element.class_list().add_1(REMOVING_CLASS);
        }
    }

    fn remove_shape(&mut self, handle: ShapeHandle) {
        if let Some(shape) = self.shapes.remove(&handle) {
            shape.element.remove();
        }
    }
}

/// Run `callback` on the next animation frame, or after a short timer when
/// the browser has no animation frame support
pub fn schedule_frame(window: &Window, callback: Closure<dyn FnMut()>) {
    let function = callback.as_ref().unchecked_ref();
    if window.request_animation_frame(function).is_err() {
        log::warn!("requestAnimationFrame unavailable, falling back to setTimeout");
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            function,
            FRAME_FALLBACK_MS,
        );
    }
    callback.forget();
}

/// Whether the page URL asks for the scripted test sequence
pub fn test_mode_from_location(window: &Window) -> bool {
    window
        .location()
        .search()
        .map(|query| test_mode_requested(&query))
        .unwrap_or(false)
}

/// Viewport size in CSS pixels
pub fn viewport_size(window: &Window) -> (f32, f32) {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
    (dim(window.inner_width()), dim(window.inner_height()))
}
