//! Minesweeper knowledge base.
//!
//! Deduces which cells of a hidden board are safe or mines from a stream of
//! "this cell touches N mines" observations, by constraint propagation and
//! subset resolution. Also exports the board, an autoplay driver and a
//! no-guess board generator, with a `wasm_bindgen` surface for JavaScript.
//!
//! Flat arrays handed to JavaScript are row-major: `cells[row * width + col]`.

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod knowledge;
pub mod rng;
pub mod sentence;
pub mod types;

pub use config::GameConfig;
pub use error::{ConfigError, GameError, KbError};
pub use knowledge::{InferencePolicy, KnowledgeBase, KnowledgeSnapshot};
pub use sentence::Constraint;
pub use types::{Bounds, Cell};

// ─── WASM Exports (only compiled for wasm32 target) ─────────────────────────

#[cfg(target_arch = "wasm32")]
mod wasm_exports {
    use wasm_bindgen::prelude::*;
    use crate::config::GameConfig;
    use crate::knowledge::KnowledgeBase;
    use crate::rng::GameRng;
    use crate::types::{Bounds, Cell};
    use crate::game;

    fn js_error(err: impl std::fmt::Display) -> JsValue {
        js_sys::Error::new(&err.to_string()).into()
    }

    /// `{ row, col }` or `null`.
    fn cell_to_js(cell: Option<Cell>) -> Result<JsValue, JsValue> {
        let Some(cell) = cell else {
            return Ok(JsValue::NULL);
        };
        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"row".into(), &(cell.row as u32).into())?;
        js_sys::Reflect::set(&obj, &"col".into(), &(cell.col as u32).into())?;
        Ok(obj.into())
    }

    /// Knowledge base owned by JavaScript, one per game.
    #[wasm_bindgen(js_name = "KnowledgeBase")]
    pub struct WasmKnowledgeBase {
        inner: KnowledgeBase,
        rng: GameRng,
    }

    #[wasm_bindgen(js_class = "KnowledgeBase")]
    impl WasmKnowledgeBase {
        /// `config` is an optional `GameConfig`-shaped object; only its
        /// `policy` and `seed` are used.
        #[wasm_bindgen(constructor)]
        pub fn new(height: usize, width: usize, config: JsValue) -> Result<WasmKnowledgeBase, JsValue> {
            let config: GameConfig = if config.is_undefined() || config.is_null() {
                GameConfig::default()
            } else {
                serde_wasm_bindgen::from_value(config)?
            };
            Ok(Self {
                inner: KnowledgeBase::with_policy(Bounds::new(height, width), config.policy),
                rng: GameRng::from_optional_seed(config.seed),
            })
        }

        /// Record a revealed cell. Throws on contract violations.
        pub fn observe(&mut self, row: usize, col: usize, count: usize) -> Result<(), JsValue> {
            self.inner.observe(Cell::new(row, col), count).map_err(js_error)
        }

        #[wasm_bindgen(js_name = "safeMove")]
        pub fn safe_move(&self) -> Result<JsValue, JsValue> {
            cell_to_js(self.inner.safe_move_candidate())
        }

        #[wasm_bindgen(js_name = "randomMove")]
        pub fn random_move(&mut self) -> Result<JsValue, JsValue> {
            cell_to_js(self.inner.random_move_candidate(&mut self.rng, true))
        }

        pub fn snapshot(&self) -> Result<JsValue, JsValue> {
            Ok(serde_wasm_bindgen::to_value(&self.inner.snapshot())?)
        }
    }

    /// Play a whole game from a `GameConfig` object.
    /// Returns the `GameReport` as a plain object.
    #[wasm_bindgen(js_name = "autoplay")]
    pub fn wasm_autoplay(config: JsValue) -> Result<JsValue, JsValue> {
        let config: GameConfig = serde_wasm_bindgen::from_value(config)?;
        let report = game::play(&config).map_err(js_error)?;
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Generate a board clearable without guessing.
    /// Returns JS object: `{ success: bool, attempts: u32, mines: Uint8Array, numbers: Uint8Array }`
    #[wasm_bindgen(js_name = "generateNoGuessBoard")]
    pub fn wasm_generate_no_guess_board(config: JsValue, max_attempts: u32) -> Result<JsValue, JsValue> {
        let config: GameConfig = serde_wasm_bindgen::from_value(config)?;
        let result = game::generate_no_guess(&config, max_attempts).map_err(js_error)?;
        let field = &result.field;

        let mines: Vec<u8> = field.bounds().cells().map(|c| field.is_hazard(c) as u8).collect();
        let numbers: Vec<u8> = field
            .bounds()
            .cells()
            .map(|c| field.nearby_hazards(c).unwrap_or(0) as u8)
            .collect();

        let obj = js_sys::Object::new();
        js_sys::Reflect::set(&obj, &"success".into(), &result.success.into())?;
        js_sys::Reflect::set(&obj, &"attempts".into(), &result.attempts.into())?;
        js_sys::Reflect::set(&obj, &"mines".into(), &js_sys::Uint8Array::from(&mines[..]).into())?;
        js_sys::Reflect::set(&obj, &"numbers".into(), &js_sys::Uint8Array::from(&numbers[..]).into())?;
        Ok(obj.into())
    }

    /// Ping function to verify WASM is loaded.
    #[wasm_bindgen(js_name = "ping")]
    pub fn wasm_ping() -> String {
        "WASM knowledge base ready".to_string()
    }
}
