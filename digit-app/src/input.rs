//! DOM event translation.

use digit_core::{ClientRect, PointerEvent, PointerPhase, TouchPoint};
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlCanvasElement, MouseEvent, TouchEvent};

/// DOM event names the pad listens to, with the phase each maps to.
pub(crate) const LISTENED: [(&str, PointerPhase); 8] = [
    ("mousedown", PointerPhase::Down),
    ("mousemove", PointerPhase::Move),
    ("mouseup", PointerPhase::Up),
    ("mouseleave", PointerPhase::Leave),
    ("touchstart", PointerPhase::Down),
    ("touchmove", PointerPhase::Move),
    ("touchend", PointerPhase::Up),
    ("touchcancel", PointerPhase::Cancel),
];

/// Convert a DOM mouse or touch event into a [`PointerEvent`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn pointer_event(event: &Event, phase: PointerPhase) -> Option<PointerEvent> {
    let timestamp_ms = event.time_stamp().max(0.0) as u64;

    if let Some(touch) = event.dyn_ref::<TouchEvent>() {
        let list = touch.touches();
        let touches = (0..list.length())
            .filter_map(|i| list.get(i))
            .map(|t| TouchPoint {
                id: u32::try_from(t.identifier()).unwrap_or_default(),
                client_x: f64::from(t.client_x()),
                client_y: f64::from(t.client_y()),
            })
            .collect();
        return Some(PointerEvent::touch(phase, touches).at(timestamp_ms));
    }

    event.dyn_ref::<MouseEvent>().map(|mouse| {
        PointerEvent::mouse(phase, f64::from(mouse.client_x()), f64::from(mouse.client_y()))
            .at(timestamp_ms)
    })
}

/// Where the canvas is currently displayed.
pub(crate) fn client_rect(canvas: &HtmlCanvasElement) -> ClientRect {
    let rect = canvas.get_bounding_client_rect();
    ClientRect {
        left: rect.left(),
        top: rect.top(),
        width: rect.width(),
        height: rect.height(),
    }
}
