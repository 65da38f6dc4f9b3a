//! Flappy - a pixel-art side-scroller on a batched sprite renderer
//!
//! Core modules:
//! - `renderer`: Sprite batching, camera and the WebGPU pipeline
//! - `sim`: Fixed-step simulation (entities, level, game state machine)
//! - `assets`: Texture/audio registry and the load barrier
//! - `input`: Per-frame key and pointer state
//! - `audio`: Sound cue playback
//! - `settings`: Persisted player preferences

pub mod assets;
pub mod audio;
pub mod input;
pub mod math;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use assets::{AssetError, AssetPool};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frame deltas above this are clamped (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Logical screen size in world units
    pub const WIDTH: f32 = 360.0;
    pub const HEIGHT: f32 = 520.0;
    pub const ASPECT: f32 = WIDTH / HEIGHT;

    /// Sprites per batch
    pub const BATCH_CAPACITY: usize = 1000;
    /// Distinct textures a batch can bind (slot 0 is the untextured fill)
    pub const MAX_TEXTURE_SLOTS: usize = 8;

    /// Horizontal scroll speed of pipes and ground (units/s)
    pub const SCROLL_SPEED: f32 = 150.0;

    /// Player physics
    pub const GRAVITY: f32 = 1780.0;
    pub const MAX_FALL_SPEED: f32 = 540.0;
    pub const FLAP_IMPULSE: f32 = 480.0;
    pub const PLAYER_FLOOR_Y: f32 = -150.0;
    pub const PLAYER_WIDTH: f32 = 45.0;
    pub const PLAYER_HEIGHT: f32 = 30.0;
    pub const PLAYER_START: (f32, f32) = (-80.0, 60.0);
    pub const PLAYER_MAX_ANGLE: f32 = 0.4;
    pub const PLAYER_MIN_ANGLE: f32 = -std::f32::consts::FRAC_PI_2;
    /// Dive rotation speed (rad/s)
    pub const PLAYER_DIVE_RATE: f32 = 7.0;

    /// Pipe layout
    pub const PIPE_COUNT: usize = 3;
    pub const PIPE_WIDTH: f32 = 70.0;
    pub const PIPE_HEIGHT: f32 = 360.0;
    pub const PIPE_GAP: f32 = 120.0;
    pub const PIPE_SPACING: f32 = 230.0;
    pub const PIPE_MIN_Y: f32 = -100.0;
    pub const PIPE_MAX_Y: f32 = 80.0;

    /// Ground strip
    pub const GROUND_HEIGHT: f32 = 120.0;
    pub const GROUND_OFFSET: f32 = 40.0;

    /// Timings (milliseconds on the simulation clock)
    pub const FLAP_FRAME_MS: f64 = 80.0;
    pub const GAMEOVER_SHOW_DELAY_MS: f64 = 800.0;
    pub const RESTART_DELAY_MS: f64 = GAMEOVER_SHOW_DELAY_MS * 2.0;
    pub const FLASH_DURATION_MS: f64 = 300.0;
    pub const DAY_NIGHT_DURATION_MS: f64 = 1500.0;

    /// Score display
    pub const SCORE_DIGITS: usize = 4;
    pub const DIGIT_WIDTH: f32 = 24.0;
    pub const DIGIT_HEIGHT: f32 = 36.0;
    pub const SCORE_POS: (f32, f32) = (0.0, 190.0);
    /// Background toggles day/night every this many points
    pub const DAY_NIGHT_EVERY: u32 = 10;
}
