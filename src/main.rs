//! Hexfall entry point
//!
//! The browser build drives a [`GameSession`] from animation frames and
//! keyboard/touch input. The native build plays the scripted test sequence
//! on a headless surface and reports the outcome.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{AddEventListenerOptions, KeyboardEvent, TouchEvent};

    use hexfall::SessionConfig;
    use hexfall::platform::web::{
        SvgSurface, schedule_frame, test_mode_from_location, viewport_size,
    };
    use hexfall::platform::touch_direction;
    use hexfall::sim::{BoardEvent, GameSession, RotateDirection};

    /// Game instance holding all state
    struct Game {
        session: GameSession<SvgSurface>,
        document: web_sys::Document,
        /// Set by teardown; the frame loop stops rescheduling
        stopped: bool,
    }

    impl Game {
        fn frame(&mut self, now: f64) {
            for event in self.session.tick(now) {
                match event {
                    BoardEvent::BricksCleared { bricks } => {
                        log::debug!("Cleared {} bricks", bricks.len());
                        self.update_hud();
                    }
                    BoardEvent::GameOver => {
                        log::info!("Game over, score {}", self.session.score().current);
                        self.update_hud();
                        if let Some(el) = self.document.get_element_by_id("game-over") {
                            let _ = el.set_attribute("class", "");
                        }
                    }
                    BoardEvent::BrickLanded { .. } => {}
                }
            }
        }

        fn update_hud(&self) {
            if let Some(el) = self.document.get_element_by_id("score") {
                el.set_text_content(Some(&self.session.score().current.to_string()));
            }
            if let Some(el) = self.document.get_element_by_id("level") {
                el.set_text_content(Some(&self.session.board().difficulty_level().to_string()));
            }
        }

        fn toggle_pause(&mut self, now: f64) {
            let paused = !self.session.is_paused();
            self.session.set_paused(paused, now);
        }

        fn teardown(&mut self) {
            self.session.teardown();
            self.stopped = true;
            log::info!("Game torn down");
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Hexfall starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let (width, height) = viewport_size(&window);
        let mut config = SessionConfig::for_viewport(width, height);
        config.test_mode = test_mode_from_location(&window);
        config
            .validate()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let surface = SvgSurface::from_element_id(document.clone(), "game")?;
        let seed = js_sys::Date::now() as u64;
        let mut session = GameSession::new(config, surface, seed);
        session.start(js_sys::Date::now());

        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            document,
            stopped: false,
        }));
        game.borrow().update_hud();

        setup_input_handlers(&window, game.clone());
        request_frame(game);

        log::info!("Hexfall running!");
        Ok(())
    }

    fn setup_input_handlers(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" => g.session.fire_left(),
                    "ArrowRight" => g.session.fire_right(),
                    "p" | "P" => g.toggle_pause(js_sys::Date::now()),
                    "Escape" => g.teardown(),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch: left half rotates left, right half rotates right.
        // Registered non-passive so prevent_default suppresses scrolling and zoom.
        {
            let window_clone = window.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let Some(touch) = event.touches().get(0) else {
                    return;
                };
                event.prevent_default();
                let (width, _) = viewport_size(&window_clone);
                let mut g = game.borrow_mut();
                match touch_direction(touch.client_x() as f32, width) {
                    RotateDirection::Left => g.session.fire_left(),
                    RotateDirection::Right => g.session.fire_right(),
                }
            });
            let options = AddEventListenerOptions::new();
            options.set_passive(false);
            let _ = window.add_event_listener_with_callback_and_add_event_listener_options(
                "touchstart",
                closure.as_ref().unchecked_ref(),
                &options,
            );
            closure.forget();
        }
    }

    fn request_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move || game_loop(game));
        schedule_frame(&window, closure);
    }

    fn game_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            if g.stopped {
                return;
            }
            g.frame(js_sys::Date::now());
        }

        request_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Hexfall (native) starting...");
    log::info!("Interactive play needs the browser build; running the scripted sequence headless");

    run_test_sequence();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play the scripted test sequence to completion on a headless surface
#[cfg(not(target_arch = "wasm32"))]
fn run_test_sequence() {
    use hexfall::sim::{BoardEvent, GameSession};
    use hexfall::{HeadlessSurface, SessionConfig};

    const FRAME_MS: f64 = 16.0;
    const MAX_FRAMES: u32 = 10_000;

    let config = SessionConfig {
        test_mode: true,
        ..SessionConfig::default()
    };
    let mut session = GameSession::new(config, HeadlessSurface::new(), 0);
    let mut now = 0.0;
    session.start(now);

    for _ in 0..MAX_FRAMES {
        now += FRAME_MS;
        for event in session.tick(now) {
            match event {
                BoardEvent::BrickLanded { id, sector, radius } => {
                    log::debug!("Brick {:?} landed in sector {} at {:.1}", id, sector, radius);
                }
                BoardEvent::BricksCleared { bricks } => {
                    log::info!("Cleared {} bricks at {:.0}ms", bricks.len(), now);
                }
                BoardEvent::GameOver => log::warn!("Game over at {:.0}ms", now),
            }
        }
        let board = session.board();
        if board.falling_bricks().is_empty() && board.pending_effects() == 0 && session.spawned() >= 6
        {
            break;
        }
    }

    let board = session.board();
    println!(
        "Test sequence finished at {:.0}ms: score {}, {} attached, {} shapes on surface",
        now,
        session.score().current,
        board.attached_bricks().len(),
        board.surface().shape_count()
    );
}
