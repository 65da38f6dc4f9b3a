//! Flappy entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use flappy::assets::{self, AssetPool, SOUND_MANIFEST, TEXTURE_MANIFEST};
    use flappy::audio::{AudioManager, Cue};
    use flappy::consts::*;
    use flappy::input::{ACTIVATE_KEY, InputState, MUTE_KEY, PRIMARY_POINTER};
    use flappy::renderer::RenderState;
    use flappy::settings::Settings;
    use flappy::sim::{GameContext, Level, REQUIRED_TEXTURES};

    /// Game instance holding all state
    struct Game {
        level: Level,
        render_state: RenderState,
        audio: Rc<RefCell<AudioManager>>,
        input: InputState,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
    }

    impl Game {
        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;
            self.input.begin_frame();

            let mut audio = self.audio.borrow_mut();
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let mut ctx = GameContext {
                    input: &self.input,
                    audio: &mut *audio,
                };
                self.level.update(SIM_DT, &mut ctx);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // One-shot presses only reach the first step
                self.input.end_frame();
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            let (renderer, camera) = self.level.render_parts();
            match self.render_state.render(renderer, camera) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let (w, h) = (self.render_state.config.width, self.render_state.config.height);
                    self.render_state.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }
    }

    fn js_err(e: impl std::fmt::Display) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    fn canvas_pixel_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        (
            (canvas.client_width() as f64 * dpr) as u32,
            (canvas.client_height() as f64 * dpr) as u32,
        )
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(js_err)?;

        log::info!("Flappy starting...");

        let settings = Settings::load();
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let (width, height) = canvas_pixel_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize WebGPU, falling back to WebGL2
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(js_err)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(js_err)?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = RenderState::new(surface, &adapter, width, height)
            .await
            .map_err(js_err)?;

        let audio = Rc::new(RefCell::new(AudioManager::new()));
        audio.borrow().apply_settings(&settings);
        let audio_enabled = audio.borrow().context().is_some();

        // Load everything, then wait for the barrier
        let pool = Rc::new(RefCell::new(AssetPool::new()));
        for (name, url) in TEXTURE_MANIFEST {
            assets::load_texture(&pool, name, url);
        }
        if audio_enabled {
            for (name, url) in SOUND_MANIFEST {
                assets::load_audio(&pool, &audio, name, url);
            }
        }
        assets::wait_for_all(&pool).await;

        let mut pool = pool.borrow_mut();
        let uploaded = pool.upload_decoded(|name, image| {
            render_state.upload_texture(name, image.width, image.height, &image.rgba)
        });
        log::info!("Uploaded {uploaded} textures");

        let sounds: Vec<&str> = if audio_enabled {
            Cue::ALL.iter().map(Cue::name).collect()
        } else {
            Vec::new()
        };
        if let Err(e) = pool.require(REQUIRED_TEXTURES, &sounds) {
            log::error!("Not starting: {e}");
            return Err(js_err(e));
        }

        let seed = settings.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        let level = Level::new(&pool, seed, &mut *audio.borrow_mut()).map_err(js_err)?;
        drop(pool);
        log::info!("Game initialized with seed: {}", seed);

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let game = Rc::new(RefCell::new(Game {
            level,
            render_state,
            audio,
            input: InputState::new(),
            settings,
            accumulator: 0.0,
            last_time: 0.0,
        }));

        setup_input_handlers(&window, &canvas, game.clone());
        setup_focus_handlers(&window, game.clone());
        setup_resize(&window, canvas, game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Flappy running!");
        Ok(())
    }

    fn setup_input_handlers(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) {
        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let code = event.code();
                if code == ACTIVATE_KEY {
                    // Keep the page from scrolling
                    event.prevent_default();
                }
                let mut g = game.borrow_mut();
                g.audio.borrow().resume();
                if code == MUTE_KEY && !event.repeat() {
                    let muted = g.settings.toggle_muted();
                    g.audio.borrow().apply_settings(&g.settings);
                    log::info!("Audio {}", if muted { "muted" } else { "unmuted" });
                }
                g.input.key_down(&code);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.borrow().resume();
                g.input.pointer_down(PRIMARY_POINTER);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.pointer_up(PRIMARY_POINTER);
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.audio.borrow().resume();
                if event.touches().length() > 0 {
                    g.input.pointer_down(PRIMARY_POINTER);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if event.touches().length() == 0 {
                    game.borrow_mut().input.pointer_up(PRIMARY_POINTER);
                }
            });
            for name in ["touchend", "touchcancel"] {
                let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }
    }

    fn setup_focus_handlers(window: &web_sys::Window, game: Rc<RefCell<Game>>) {
        // Window blur (click outside, tab switch)
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
            let mut g = game.borrow_mut();
            g.input.release_all();
            if g.settings.mute_on_blur {
                g.audio.borrow().suspend();
                log::info!("Audio suspended (window blur)");
            }
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(window: &web_sys::Window, canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = canvas_pixel_size(&window, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);
            game.borrow_mut().render_state.resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flappy (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    if let Err(e) = headless_demo(42, 60.0) {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Run the simulation without a GPU, letting a simple bot play
#[cfg(not(target_arch = "wasm32"))]
fn headless_demo(seed: u64, seconds: f32) -> Result<(), flappy::AssetError> {
    use flappy::audio::NullAudio;
    use flappy::consts::*;
    use flappy::input::{ACTIVATE_KEY, InputState};
    use flappy::renderer::{Texture, TextureId};
    use flappy::sim::{GameContext, GamePhase, Level, REQUIRED_TEXTURES};

    // Sizes of the shipped images; only the handles matter here
    let sizes = [(34, 72), (52, 320), (288, 512), (288, 512), (336, 112), (240, 36), (192, 42)];
    let mut pool = flappy::AssetPool::new();
    for (i, (name, (w, h))) in REQUIRED_TEXTURES.iter().zip(sizes).enumerate() {
        pool.insert_texture(name, Texture::new(TextureId(i as u32 + 1), w, h));
    }

    let mut audio = NullAudio;
    let mut level = Level::new(&pool, seed, &mut audio)?;
    let mut input = InputState::new();
    let mut runs = 0;
    let mut best = 0;

    let steps = (seconds / SIM_DT) as u32;
    for _ in 0..steps {
        let press = match level.phase() {
            GamePhase::Ready => true,
            GamePhase::GameOver => level.state().elapsed() >= RESTART_DELAY_MS,
            GamePhase::Playing => {
                let player = level.player();
                let target = level
                    .pipes()
                    .iter()
                    .filter(|p| p.x() + PIPE_WIDTH / 2.0 > player.x())
                    .min_by(|a, b| a.x().total_cmp(&b.x()))
                    .map_or(0.0, |p| p.gap_y() + PIPE_GAP * 0.35);
                player.y() < target && player.velocity() > 0.0
            }
        };
        if press {
            input.key_down(ACTIVATE_KEY);
        }
        input.begin_frame();

        let was_over = level.phase() == GamePhase::GameOver;
        let mut ctx = GameContext {
            input: &input,
            audio: &mut audio,
        };
        level.update(SIM_DT, &mut ctx);
        input.end_frame();
        input.key_up(ACTIVATE_KEY);

        if !was_over && level.phase() == GamePhase::GameOver {
            runs += 1;
            best = best.max(level.score());
            log::info!("Run {runs} ended with score {}", level.score());
        }
    }

    best = best.max(level.score());
    println!("Simulated {seconds}s: {runs} runs, best score {best}");
    Ok(())
}
