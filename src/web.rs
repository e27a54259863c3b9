//! Browser bindings
//!
//! The page owns the canvas, the input field and `requestAnimationFrame`;
//! it calls [`WebGame::frame`] with `performance.now()` and draws the JSON
//! snapshot it gets back. Best score and settings live in LocalStorage.

use wasm_bindgen::prelude::*;

use crate::persistence::LocalStore;
use crate::session::Session;
use crate::settings::GameSettings;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    log::info!("Times Invaders starting...");
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Game handle exported to JavaScript
#[wasm_bindgen]
pub struct WebGame {
    session: Session,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let settings = GameSettings::load();
        WebGame {
            session: Session::new(settings, Box::new(LocalStore)),
        }
    }

    /// Advance one animation frame and return the snapshot as JSON
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let mut json = Ok(String::new());
        self.session
            .frame(now_ms, |snap| json = serde_json::to_string(snap));
        json.map_err(js_error)
    }

    /// Submit an answer; returns the outcome as JSON
    pub fn submit(&mut self, raw: &str, now_ms: f64) -> Result<String, JsValue> {
        let outcome = self.session.submit(raw, now_ms);
        serde_json::to_string(&outcome).map_err(js_error)
    }

    #[wasm_bindgen(js_name = startGame)]
    pub fn start_game(&mut self) -> Result<(), JsValue> {
        self.session.start().map_err(js_error)
    }

    pub fn restart(&mut self) -> Result<(), JsValue> {
        self.session.restart().map_err(js_error)
    }

    pub fn pause(&mut self) -> bool {
        self.session.pause()
    }

    pub fn resume(&mut self) -> Result<(), JsValue> {
        self.session.resume().map_err(js_error)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    #[wasm_bindgen(js_name = toggleTable)]
    pub fn toggle_table(&mut self, table: u32) -> Result<(), JsValue> {
        self.session.toggle_table(table).map_err(js_error)?;
        self.save_tables();
        Ok(())
    }

    #[wasm_bindgen(js_name = selectAllTables)]
    pub fn select_all_tables(&mut self) -> Result<(), JsValue> {
        self.session.select_all_tables().map_err(js_error)?;
        self.save_tables();
        Ok(())
    }

    #[wasm_bindgen(js_name = clearTables)]
    pub fn clear_tables(&mut self) -> Result<(), JsValue> {
        self.session.clear_tables().map_err(js_error)?;
        self.save_tables();
        Ok(())
    }

    pub fn tables(&self) -> Vec<u32> {
        self.session.tables().to_vec()
    }

    /// Hint line for the HUD
    pub fn status(&self) -> String {
        self.session.status().to_string()
    }

    pub fn best(&self) -> f64 {
        self.session.best() as f64
    }

    /// The table selection is remembered between visits
    fn save_tables(&self) {
        let settings = GameSettings {
            tables: self.session.tables().to_vec(),
            ..self.session.settings().clone()
        };
        settings.save();
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
