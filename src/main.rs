//! Mosquito Snatch entry point
//!
//! Browser build: canvas front-end driven by `requestAnimationFrame`.
//! Native build: a headless auto-played session against the in-memory ranking.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement,
        HtmlSelectElement, PointerEvent,
    };

    use mosquito_snatch::config::{Difficulty, GameConfig};
    use mosquito_snatch::game::Game;
    use mosquito_snatch::hud::HudText;
    use mosquito_snatch::platform::{self, web::HttpRanking};
    use mosquito_snatch::ranking::LeaderboardView;
    use mosquito_snatch::settings::{PlayerName, Settings};
    use mosquito_snatch::sim::Arena;

    /// Page-level state shared by every callback
    struct App {
        config: GameConfig,
        game: Option<Game>,
        document: Document,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        /// Arena size in CSS pixels
        arena: (f32, f32),
        settings: Settings,
        ranking: HttpRanking,
        board: LeaderboardView,
        /// Pending `requestAnimationFrame` handle; `None` when the loop is idle
        frame_request: Option<i32>,
    }

    impl App {
        /// Size the canvas for the current viewport
        fn fit_canvas(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let viewport = window
                .inner_width()
                .ok()
                .and_then(|w| w.as_f64())
                .unwrap_or(1024.0) as f32;
            let (w, h) = platform::arena_size_for_viewport(viewport);
            let dpr = window.device_pixel_ratio();

            self.canvas.set_width((w as f64 * dpr) as u32);
            self.canvas.set_height((h as f64 * dpr) as u32);
            let _ = self
                .canvas
                .set_attribute("style", &format!("width:{w}px;height:{h}px"));
            // Resizing the backing store resets the transform
            let _ = self.ctx.scale(dpr, dpr);
            self.arena = (w, h);

            if let Some(game) = self.game.as_mut() {
                let resized = Arena::new(w, h, self.config.hit_radius_px)
                    .and_then(|arena| game.resize(arena));
                if let Err(e) = resized {
                    log::warn!("Arena resize rejected: {}", e);
                }
            }
        }

        /// Map a pointer position to arena-local coordinates
        fn to_arena(&self, client_x: f64, client_y: f64) -> glam::Vec2 {
            let rect = self.canvas.get_bounding_client_rect();
            let sx = if rect.width() > 0.0 { self.arena.0 as f64 / rect.width() } else { 1.0 };
            let sy = if rect.height() > 0.0 { self.arena.1 as f64 / rect.height() } else { 1.0 };
            glam::Vec2::new(
                ((client_x - rect.left()) * sx) as f32,
                ((client_y - rect.top()) * sy) as f32,
            )
        }

        fn render(&self) {
            let (w, h) = self.arena;
            self.ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
            let Some(game) = self.game.as_ref() else {
                return;
            };

            for creature in game.snapshot() {
                self.ctx.begin_path();
                let _ = self.ctx.arc(
                    creature.pos.x as f64,
                    creature.pos.y as f64,
                    creature.radius as f64,
                    0.0,
                    TAU,
                );
                self.ctx.set_fill_style_str(creature.kind.color());
                self.ctx.fill();
                self.ctx.set_stroke_style_str("#000");
                self.ctx.set_line_width(2.0);
                self.ctx.stroke();
            }
        }

        fn update_hud(&self) {
            let Some(game) = self.game.as_ref() else {
                return;
            };
            let hud = HudText::from_session(game.session());
            set_text(&self.document, "hud-name", &hud.name);
            set_text(&self.document, "hud-difficulty", hud.difficulty);
            set_text(&self.document, "hud-time", &hud.time_left);
            set_text(&self.document, "hud-score", &hud.score);
            if let Some(el) = self.document.get_element_by_id("hud-score") {
                let class = if hud.score_negative { "hud-value negative" } else { "hud-value" };
                let _ = el.set_attribute("class", class);
            }
            set_text(&self.document, "status", hud.status.as_deref().unwrap_or(""));
            set_hidden(&self.document, "restart-btn", game.session().is_running());
        }

        fn render_leaderboard(&self) {
            let Some(list) = self.document.get_element_by_id("leaderboard") else {
                return;
            };
            list.set_text_content(None);
            for line in self.board.lines() {
                if let Ok(item) = self.document.create_element("li") {
                    item.set_text_content(Some(&line));
                    let _ = list.append_child(&item);
                }
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if hidden { "hidden" } else { "" });
        }
    }

    /// Balance overrides from `<script id="game-config" type="application/json">`
    fn config_from_page(document: &Document) -> GameConfig {
        let Some(json) = document
            .get_element_by_id("game-config")
            .and_then(|el| el.text_content())
        else {
            return GameConfig::default();
        };
        match GameConfig::from_json(&json) {
            Ok(config) => {
                log::info!("Loaded game config from page");
                config
            }
            Err(e) => {
                log::warn!("Ignoring page game config: {}", e);
                GameConfig::default()
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Mosquito Snatch starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let api_base = canvas.get_attribute("data-api-base").unwrap_or_default();
        let settings = Settings::load();

        if let Some(input) = document
            .get_element_by_id("name-input")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            if let Some(name) = settings.last_name.as_ref() {
                input.set_value(name.as_str());
            }
        }
        if let Some(select) = document
            .get_element_by_id("difficulty-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        {
            select.set_value(settings.difficulty.as_str());
        }

        let app = Rc::new(RefCell::new(App {
            config: config_from_page(&document),
            game: None,
            document: document.clone(),
            canvas: canvas.clone(),
            ctx,
            arena: (0.0, 0.0),
            settings,
            ranking: HttpRanking::new(api_base),
            board: LeaderboardView::Loading,
            frame_request: None,
        }));
        app.borrow_mut().fit_canvas();

        setup_input_handlers(&canvas, app.clone());
        setup_start_button(app.clone());
        setup_restart_button(app.clone());
        setup_difficulty_select(app.clone());
        setup_auto_pause(app.clone());
        setup_resize(app.clone());
        setup_teardown(app.clone());

        let difficulty = app.borrow().settings.difficulty;
        refresh_leaderboard(app, difficulty);

        log::info!("Mosquito Snatch running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            event.prevent_default();
            let mut a = app.borrow_mut();
            let point = a.to_arena(event.client_x() as f64, event.client_y() as f64);
            if let Some(game) = a.game.as_mut() {
                if let Some(hit) = game.tap(point, platform::now_ms()) {
                    log::debug!("Hit {} #{}", hit.kind.as_str(), hit.id);
                }
            }
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn selected_difficulty(document: &Document) -> Difficulty {
        document
            .get_element_by_id("difficulty-select")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
            .and_then(|select| Difficulty::from_str(&select.value()))
            .unwrap_or_default()
    }

    fn setup_start_button(app: Rc<RefCell<App>>) {
        let document = app.borrow().document.clone();
        let Some(btn) = document.get_element_by_id("start-btn") else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let difficulty = {
                let mut guard = app.borrow_mut();
                let a = &mut *guard;
                let raw = a
                    .document
                    .get_element_by_id("name-input")
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.value())
                    .unwrap_or_default();
                let name = match PlayerName::parse(&raw) {
                    Ok(name) => name,
                    Err(e) => {
                        set_text(&a.document, "form-error", &e.to_string());
                        return;
                    }
                };
                set_text(&a.document, "form-error", "");
                let difficulty = selected_difficulty(&a.document);

                let arena = match Arena::new(a.arena.0, a.arena.1, a.config.hit_radius_px) {
                    Ok(arena) => arena,
                    Err(e) => {
                        log::error!("Cannot start: {}", e);
                        return;
                    }
                };
                let seed = platform::fresh_seed();
                let mut game = match Game::new(a.config.clone(), name.clone(), difficulty, arena, seed) {
                    Ok(game) => game,
                    Err(e) => {
                        log::error!("Cannot start: {}", e);
                        return;
                    }
                };
                game.start(platform::now_ms());
                if let Some(old) = a.game.as_mut() {
                    old.stop();
                }
                a.game = Some(game);
                log::info!("Game started with seed: {}", seed);

                a.settings.remember(&name, difficulty);
                a.settings.save();
                set_hidden(&a.document, "start-panel", true);
                difficulty
            };
            ensure_frame_loop(app.clone());
            refresh_leaderboard(app.clone(), difficulty);
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_restart_button(app: Rc<RefCell<App>>) {
        let document = app.borrow().document.clone();
        let Some(btn) = document.get_element_by_id("restart-btn") else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let restarted = match app.borrow_mut().game.as_mut() {
                Some(game) => {
                    game.replay();
                    game.start(platform::now_ms())
                }
                None => false,
            };
            if restarted {
                log::info!("Game restarted");
                ensure_frame_loop(app.clone());
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_difficulty_select(app: Rc<RefCell<App>>) {
        let document = app.borrow().document.clone();
        let Some(select) = document.get_element_by_id("difficulty-select") else {
            return;
        };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let difficulty = {
                let mut a = app.borrow_mut();
                let difficulty = selected_difficulty(&a.document);
                if let Some(game) = a.game.as_mut() {
                    if let Err(e) = game.set_difficulty(difficulty) {
                        log::warn!("Difficulty change rejected: {}", e);
                    }
                }
                difficulty
            };
            refresh_leaderboard(app.clone(), difficulty);
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let document = app.borrow().document.clone();
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            if let Some(game) = app.borrow_mut().game.as_mut() {
                if game.session().is_running() {
                    game.set_paused(hidden);
                }
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().fit_canvas();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Leaving the page halts the game and cancels the pending frame
    fn setup_teardown(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            if let Some(id) = a.frame_request.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
            }
            if let Some(game) = a.game.as_mut() {
                game.stop();
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Fire the single submission attempt for a finished session
    fn submit_result(app: Rc<RefCell<App>>) {
        let (record, ranking) = {
            let mut a = app.borrow_mut();
            let Some(record) = a.game.as_mut().and_then(Game::take_result) else {
                return;
            };
            (record, a.ranking.clone())
        };

        wasm_bindgen_futures::spawn_local(async move {
            let outcome = ranking.submit(&record).await;
            let stored = matches!(&outcome, Ok(ack) if ack.stored);
            {
                let mut a = app.borrow_mut();
                if let Some(game) = a.game.as_mut() {
                    game.record_submission(outcome);
                }
                // The frame loop is idle once a session ends
                a.update_hud();
            }
            if stored {
                refresh_leaderboard(app, record.difficulty);
            }
        });
    }

    fn refresh_leaderboard(app: Rc<RefCell<App>>, difficulty: Difficulty) {
        let ranking = {
            let mut a = app.borrow_mut();
            a.board = LeaderboardView::Loading;
            a.render_leaderboard();
            a.ranking.clone()
        };

        wasm_bindgen_futures::spawn_local(async move {
            let result = ranking.leaderboard(difficulty).await;
            let mut a = app.borrow_mut();
            a.board = LeaderboardView::from_result(result);
            a.render_leaderboard();
        });
    }

    /// Start the frame loop unless a frame is already scheduled
    fn ensure_frame_loop(app: Rc<RefCell<App>>) {
        if app.borrow().frame_request.is_none() {
            request_animation_frame(app);
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let callback_app = app.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(callback_app, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => app.borrow_mut().frame_request = Some(id),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let (ended, keep_going) = {
            let mut a = app.borrow_mut();
            a.frame_request = None;
            let ended = a.game.as_mut().is_some_and(|g| g.frame(time).ended);
            a.render();
            a.update_hud();
            let keep_going = a.game.as_ref().is_some_and(Game::wants_frames);
            (ended, keep_going)
        };
        if ended {
            submit_result(app.clone());
        }

        if keep_going {
            request_animation_frame(app);
        } else {
            log::debug!("Frame loop idle");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;

    use mosquito_snatch::config::{Difficulty, GameConfig};
    use mosquito_snatch::consts::{DEFAULT_ARENA_HEIGHT, DEFAULT_ARENA_WIDTH, REFERENCE_FRAME_MS};
    use mosquito_snatch::game::Game;
    use mosquito_snatch::hud::HudText;
    use mosquito_snatch::platform;
    use mosquito_snatch::ranking::{LeaderboardView, LocalRanking, RankingService};
    use mosquito_snatch::settings::PlayerName;
    use mosquito_snatch::sim::{Arena, AutoPlayer};

    /// Environment variable naming a JSON balance file
    const CONFIG_ENV: &str = "MOSQUITO_SNATCH_CONFIG";
    const REPORT_EVERY_MS: f64 = 10_000.0;

    fn load_config() -> Result<GameConfig, Box<dyn Error>> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)?;
                log::info!("Loaded game config from {}", path);
                Ok(GameConfig::from_json(&json)?)
            }
            Err(_) => Ok(GameConfig::default()),
        }
    }

    /// `mosquito-snatch [name] [difficulty] [seed]`
    pub fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
        let name = PlayerName::parse(args.first().map(String::as_str).unwrap_or("player"))?;
        let difficulty = match args.get(1) {
            Some(raw) => Difficulty::from_str(raw).ok_or_else(|| format!("unknown difficulty: {raw}"))?,
            None => Difficulty::default(),
        };
        let seed = match args.get(2) {
            Some(raw) => raw.parse::<u64>()?,
            None => platform::fresh_seed(),
        };

        let config = load_config()?;
        let arena = Arena::new(DEFAULT_ARENA_WIDTH, DEFAULT_ARENA_HEIGHT, config.hit_radius_px)?;
        let mut game = Game::new(config, name, difficulty, arena, seed)?;
        let mut bot = AutoPlayer::default();
        let mut ranking = LocalRanking::new();

        log::info!("Headless session on {} with seed {}", difficulty, seed);

        let frame = REFERENCE_FRAME_MS as f64;
        let mut now = 0.0;
        let mut next_report = REPORT_EVERY_MS;
        game.start(now);
        loop {
            now += frame;
            if game.frame(now).ended {
                break;
            }
            if let Some(point) = bot.next_tap(&game.snapshot(), now) {
                if let Some(hit) = game.tap(point, now) {
                    log::debug!("{:>8.0}ms hit {} #{}", now, hit.kind.as_str(), hit.id);
                }
            }
            if now >= next_report {
                let hud = HudText::from_session(game.session());
                log::info!("{} left, score {}", hud.time_left, hud.score);
                next_report += REPORT_EVERY_MS;
            }
        }

        game.submit_with(&mut ranking);
        if let Some(status) = HudText::from_session(game.session()).status {
            log::info!("{}", status);
        }

        let board = LeaderboardView::from_result(ranking.leaderboard(difficulty));
        log::info!("Leaderboard ({}):", difficulty.label());
        for line in board.lines() {
            log::info!("  {}", line);
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = headless::run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
