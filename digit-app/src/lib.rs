//! # Digit Canvas WASM Application
//!
//! Binds the drawing pad to a `<canvas>` element and the export gateway to
//! the page.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! CLASSIFIER_ENDPOINT=https://example.com/predict wasm-pack build --target web digit-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { DigitPadApp } from './pkg/digit_app.js';
//!
//! await init();
//! const app = new DigitPadApp('pad');          // or new DigitPadApp('pad', url)
//! app.onPrediction((label, loading) => { output.textContent = loading ? '…' : label; });
//! saveButton.onclick = () => app.save();
//! predictButton.onclick = () => app.predict();
//! clearButton.onclick = () => app.clear();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod download;
mod input;

use std::{cell::RefCell, fmt::Display, rc::Rc};

use digit_core::{PadConfig, PointerPhase, Sketchpad, DEFAULT_SURFACE_SIZE};
use digit_gateway::{ExportGateway, GatewayConfig, GatewayError, HttpClassifier};
use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, Document, Event, HtmlCanvasElement,
    ImageData,
};

use crate::download::AnchorDownload;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!(version = digit_core::VERSION, "Digit Canvas WASM initialized");
}

fn js_error(err: &impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

struct AppState {
    document: Document,
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    pad: RefCell<Sketchpad>,
    gateway: ExportGateway<Option<HttpClassifier>>,
}

impl AppState {
    /// Copy the surface onto the canvas in one write.
    fn blit(&self) {
        let pad = self.pad.borrow();
        let (Some(ctx), Some(surface)) = (self.ctx.as_ref(), pad.surface()) else {
            return;
        };
        match ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(surface.pixels()),
            surface.width(),
            surface.height(),
        ) {
            Ok(image_data) => {
                if let Err(e) = ctx.put_image_data(&image_data, 0.0, 0.0) {
                    tracing::warn!("Failed to draw surface: {:?}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to build image data: {:?}", e),
        }
    }

    fn on_pointer(&self, event: &Event, phase: PointerPhase) {
        let Some(pointer) = input::pointer_event(event, phase) else {
            return;
        };
        let disposition = {
            let mut pad = self.pad.borrow_mut();
            pad.set_geometry(input::client_rect(&self.canvas));
            pad.handle_event(&pointer)
        };
        if disposition.should_prevent_default() {
            event.prevent_default();
            if phase == PointerPhase::Move {
                self.blit();
            }
        }
    }
}

struct Listener {
    name: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// The digit drawing pad for WASM.
#[wasm_bindgen]
pub struct DigitPadApp {
    state: Rc<AppState>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl DigitPadApp {
    /// Attach a pad to the canvas element with the given ID.
    ///
    /// The classifier endpoint is `endpoint` if given, else the
    /// `CLASSIFIER_ENDPOINT` the module was built with. Without either,
    /// `predict()` fails but drawing and saving still work.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas element is not found or the endpoint is
    /// not a valid URL.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, endpoint: Option<String>) -> Result<DigitPadApp, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;

        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("Canvas element '{canvas_id}' not found")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| JsValue::from_str("Element is not a canvas"))?;
        canvas.set_width(DEFAULT_SURFACE_SIZE);
        canvas.set_height(DEFAULT_SURFACE_SIZE);

        // Without a 2D context the pad still tracks gestures but draws nothing.
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
        let pad = if ctx.is_some() {
            Sketchpad::new(PadConfig::default())
        } else {
            tracing::warn!("2D context not available; drawing disabled");
            Sketchpad::detached(PadConfig::default())
        }
        .map_err(|e| js_error(&e))?;

        let endpoint = endpoint
            .or_else(|| option_env!("CLASSIFIER_ENDPOINT").map(str::to_string))
            .filter(|url| !url.trim().is_empty());
        let mut config = GatewayConfig::default();
        if let Some(url) = endpoint {
            config = config.with_endpoint(url.trim()).map_err(|e| js_error(&e))?;
        }
        let classifier = match config.endpoint {
            Some(_) => Some(HttpClassifier::from_config(&config).map_err(|e| js_error(&e))?),
            None => None,
        };

        let state = Rc::new(AppState {
            document,
            canvas,
            ctx,
            pad: RefCell::new(pad),
            gateway: ExportGateway::new(classifier, config),
        });

        let mut app = Self {
            state,
            listeners: Vec::new(),
        };
        app.attach_listeners()?;

        // Mount-time clear.
        app.clear();
        tracing::info!(canvas = canvas_id, "Digit pad mounted");
        Ok(app)
    }

    /// Reset the drawing to white.
    pub fn clear(&self) {
        self.state.pad.borrow_mut().clear();
        self.state.blit();
    }

    /// Download the drawing as `drawing.png`.
    ///
    /// # Errors
    ///
    /// Returns an error if the drawing cannot be encoded or the download
    /// cannot start.
    pub fn save(&self) -> Result<(), JsValue> {
        let pad = self.state.pad.borrow();
        let surface = pad
            .surface()
            .ok_or_else(|| js_error(&GatewayError::NoSurface))?;
        self.state
            .gateway
            .save_locally(surface, &AnchorDownload::new(self.state.document.clone()))
            .map_err(|e| js_error(&e))
    }

    /// Submit the drawing for classification.
    ///
    /// Returns once the request is started; the outcome arrives through
    /// [`DigitPadApp::on_prediction`]. Failures are logged to the console and
    /// leave the label unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the drawing cannot be encoded.
    pub fn predict(&self) -> Result<(), JsValue> {
        let image = {
            let pad = self.state.pad.borrow();
            let surface = pad
                .surface()
                .ok_or_else(|| js_error(&GatewayError::NoSurface))?;
            self.state.gateway.encode(surface).map_err(|e| js_error(&e))?
        };

        // Loading is visible as soon as predict() returns.
        let pending = self.state.gateway.begin_submission();
        let state = Rc::clone(&self.state);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = state.gateway.complete_submission(pending, &image).await {
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "Prediction failed: {err}"
                )));
            }
        });
        Ok(())
    }

    /// Call `callback(label, loading)` whenever the prediction changes.
    #[wasm_bindgen(js_name = onPrediction)]
    pub fn on_prediction(&self, callback: js_sys::Function) {
        let mut rx = self.state.gateway.subscribe();
        wasm_bindgen_futures::spawn_local(async move {
            while rx.changed().await.is_ok() {
                let view = rx.borrow_and_update().clone();
                if let Err(e) = callback.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(&view.label),
                    &JsValue::from_bool(view.loading),
                ) {
                    tracing::warn!("Prediction callback threw: {:?}", e);
                }
            }
        });
    }

    /// Last label received, empty until the first success.
    #[must_use]
    pub fn prediction(&self) -> String {
        self.state.gateway.view().label
    }

    /// Whether a prediction request is in flight.
    #[wasm_bindgen(js_name = isLoading)]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.gateway.view().loading
    }

    /// Whether a stroke is in progress.
    #[wasm_bindgen(js_name = isDrawing)]
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.state.pad.borrow().stroke_state().is_active()
    }

    /// Copy of the RGBA surface, or `undefined` without a 2D context.
    #[wasm_bindgen(js_name = surfacePixels)]
    #[must_use]
    pub fn surface_pixels(&self) -> Option<Vec<u8>> {
        self.state
            .pad
            .borrow()
            .surface()
            .map(|surface| surface.pixels().to_vec())
    }
}

impl DigitPadApp {
    fn attach_listeners(&mut self) -> Result<(), JsValue> {
        // Non-passive so touchmove can cancel scrolling.
        let options = AddEventListenerOptions::new();
        options.set_passive(false);

        for (name, phase) in input::LISTENED {
            let state = Rc::clone(&self.state);
            let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                state.on_pointer(&event, phase);
            });
            self.state
                .canvas
                .add_event_listener_with_callback_and_add_event_listener_options(
                    name,
                    callback.as_ref().unchecked_ref(),
                    &options,
                )?;
            self.listeners.push(Listener { name, callback });
        }
        Ok(())
    }
}

impl Drop for DigitPadApp {
    fn drop(&mut self) {
        for listener in self.listeners.drain(..) {
            if let Err(e) = self.state.canvas.remove_event_listener_with_callback(
                listener.name,
                listener.callback.as_ref().unchecked_ref(),
            ) {
                tracing::warn!("Failed to remove {} listener: {:?}", listener.name, e);
            }
        }
    }
}
