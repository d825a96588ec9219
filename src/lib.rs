// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod logging;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::prelude::wasm_bindgen;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{AddEventListenerOptions, Document, Event, EventTarget, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, Window};

    use crate::config::ViewerConfig;
    use crate::controller::frame_loop::default_target;
    use crate::controller::input::{flip_y, wasm as web_input, InputEvent, InputSource, PrimaryTouch};
    use crate::controller::ViewerLoop;
    use crate::logging;
    use crate::view::{AxisDisplay, TextSink};

    type EventQueue = Rc<RefCell<Vec<InputEvent>>>;

    /// HUD line backed by a DOM element
    struct DomText(HtmlElement);

    impl TextSink for DomText {
        fn set_text(&mut self, text: &str) {
            self.0.set_inner_text(text);
        }

        fn set_visible(&mut self, visible: bool) {
            self.0.set_hidden(!visible);
        }
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
        let document = window.document().ok_or_else(|| js_error("no document on window"))?;

        let config = read_config(&document)?;
        logging::init(&config.log_level);

        let (width, height) = viewport_size(&window);
        let display = create_hud(&document)?;
        let target = Rc::new(RefCell::new(default_target(&config)));
        let mut viewer = ViewerLoop::new(&config, target, display, width, height)
            .map_err(|e| js_error(format!("invalid bindings: {e}")))?;

        let events: EventQueue = Rc::new(RefCell::new(Vec::new()));
        create_material_buttons(&document, &config, events.clone())?;
        setup_input_listeners(&window, &document, config.input_source, events.clone())?;

        // Frame loop: drain queued input, then update
        let performance = window.performance();
        let mut last = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
        RcCellCallback::new(window.clone(), move || {
            let now = performance.as_ref().map(|p| p.now()).unwrap_or(last);
            let dt = ((now - last) / 1000.0).clamp(0.0, 0.1) as f32;
            last = now;

            for event in events.borrow_mut().drain(..) {
                viewer.handle_event(&event);
            }
            viewer.update(dt);
        })
        .start();

        Ok(())
    }

    /// Config comes from `<script id="panview-config" type="application/json">` when present
    fn read_config(document: &Document) -> Result<ViewerConfig, JsValue> {
        let Some(element) = document.get_element_by_id("panview-config") else {
            return Ok(ViewerConfig::default());
        };
        let content = element.text_content().unwrap_or_default();
        ViewerConfig::from_json(Path::new("#panview-config"), &content).map_err(|e| js_error(e.to_string()))
    }

    fn create_hud(document: &Document) -> Result<AxisDisplay, JsValue> {
        let body = document.body().ok_or_else(|| js_error("no body on document"))?;
        let hud = document.create_element("div")?;
        hud.set_id("hud");
        body.append_child(&hud)?;

        let mut display = AxisDisplay::new();
        for axis in ["x", "y", "z"] {
            let line = document
                .create_element("div")?
                .dyn_into::<HtmlElement>()
                .map_err(|_| js_error("failed to create HUD line"))?;
            line.set_id(&format!("axis-{axis}"));
            line.set_hidden(true);
            hud.append_child(&line)?;
            display.push(Some(Box::new(DomText(line))));
        }
        Ok(display)
    }

    fn create_material_buttons(document: &Document, config: &ViewerConfig, events: EventQueue) -> Result<(), JsValue> {
        let body = document.body().ok_or_else(|| js_error("no body on document"))?;
        let bar = document.create_element("div")?;
        bar.set_id("materials");
        body.append_child(&bar)?;

        for (index, material) in config.materials.iter().enumerate() {
            let button = document.create_element("button")?;
            button.set_text_content(Some(&material.name));
            let events = events.clone();
            listen::<Event>(&button, "click", move |_| {
                events.borrow_mut().push(InputEvent::MaterialButton(index));
            })?;
            bar.append_child(&button)?;
        }
        Ok(())
    }

    /// Setup all input event listeners; everything is queued for the next frame
    fn setup_input_listeners(
        window: &Window,
        document: &Document,
        source: InputSource,
        events: EventQueue,
    ) -> Result<(), JsValue> {
        // Keyboard
        {
            let events = events.clone();
            listen::<KeyboardEvent>(document, "keydown", move |e| {
                if matches!(e.key().as_str(), "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight") {
                    e.prevent_default();
                }
                // Held keys repeat; the input state only needs the first press
                if !e.repeat() {
                    events.borrow_mut().push(web_input::keyboard_event_to_input(&e, true));
                }
            })?;
        }
        {
            let events = events.clone();
            listen::<KeyboardEvent>(document, "keyup", move |e| {
                events.borrow_mut().push(web_input::keyboard_event_to_input(&e, false));
            })?;
        }

        // Focus loss and visibility - release everything
        {
            let events = events.clone();
            listen::<Event>(window, "blur", move |_| {
                events.borrow_mut().push(InputEvent::FocusLost);
            })?;
        }
        {
            let events = events.clone();
            let doc = document.clone();
            listen::<Event>(document, "visibilitychange", move |_| {
                events.borrow_mut().push(InputEvent::VisibilityChanged { visible: !doc.hidden() });
            })?;
        }

        // Resize
        {
            let events = events.clone();
            let win = window.clone();
            listen::<Event>(window, "resize", move |_| {
                let (width, height) = viewport_size(&win);
                events.borrow_mut().push(InputEvent::Resized { width, height });
            })?;
        }

        // Touch follows one finger by identifier. Listeners are not passive, so
        // preventDefault stops scrolling, zooming and the emulated mouse events.
        type TouchConverter = fn(&TouchEvent, u32, &mut PrimaryTouch<i32>) -> Option<InputEvent>;
        let touch_handlers: [(&str, TouchConverter); 4] = [
            ("touchstart", web_input::touch_start_to_input),
            ("touchmove", web_input::touch_move_to_input),
            ("touchend", web_input::touch_end_to_input),
            ("touchcancel", web_input::touch_end_to_input),
        ];
        let primary = Rc::new(RefCell::new(PrimaryTouch::default()));
        for (name, convert) in touch_handlers {
            let events = events.clone();
            let primary = primary.clone();
            let win = window.clone();
            listen_active::<TouchEvent>(window, name, move |e| {
                e.prevent_default();
                let (_, height) = viewport_size(&win);
                if let Some(event) = convert(&e, height, &mut primary.borrow_mut()) {
                    events.borrow_mut().push(event);
                }
            })?;
        }

        // Mouse stands in for touch on desktop browsers
        if source == InputSource::TouchDrag {
            let mouse_handlers: [(&str, fn(f32, f32) -> InputEvent, bool); 3] = [
                ("mousedown", |x, y| InputEvent::TouchStart { x, y }, false),
                ("mousemove", |x, y| InputEvent::TouchMove { x, y }, true),
                ("mouseup", |x, y| InputEvent::TouchEnd { x, y }, false),
            ];
            for (name, to_event, needs_button) in mouse_handlers {
                let events = events.clone();
                let win = window.clone();
                listen::<MouseEvent>(window, name, move |e| {
                    if needs_button && e.buttons() & 1 == 0 {
                        return;
                    }
                    let (_, height) = viewport_size(&win);
                    let x = e.client_x() as f32;
                    let y = flip_y(e.client_y() as f32, height);
                    events.borrow_mut().push(to_event(x, y));
                })?;
            }
        }

        Ok(())
    }

    /// Attach a listener for the lifetime of the page
    fn listen<E: JsCast + 'static>(
        target: &EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) -> Result<(), JsValue> {
        let closure = typed_closure(handler);
        target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// Like `listen`, but registered as non-passive so the handler may call `prevent_default`
    fn listen_active<E: JsCast + 'static>(
        target: &EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) -> Result<(), JsValue> {
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        let closure = typed_closure(handler);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            closure.as_ref().unchecked_ref(),
            &options,
        )?;
        closure.forget();
        Ok(())
    }

    fn typed_closure<E: JsCast + 'static>(mut handler: impl FnMut(E) + 'static) -> Closure<dyn FnMut(Event)> {
        Closure::wrap(Box::new(move |e: Event| {
            if let Ok(e) = e.dyn_into::<E>() {
                handler(e);
            }
        }) as Box<dyn FnMut(Event)>)
    }

    fn viewport_size(window: &Window) -> (u32, u32) {
        let read = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
        (read(window.inner_width()), read(window.inner_height()))
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Recursively schedule next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        tracing::error!("requestAnimationFrame failed: {:?}", e);
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!("requestAnimationFrame failed to start: {:?}", e);
                }
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
        }
    }
}
