//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No GPU or platform dependencies; sprites are handed to the [`Renderer`]
//!   and sounds go through an [`AudioSink`]
//!
//! [`Renderer`]: crate::renderer::Renderer
//! [`AudioSink`]: crate::audio::AudioSink

pub mod ground;
pub mod level;
pub mod overlay;
pub mod pipe;
pub mod player;
pub mod score;
pub mod state;

pub use ground::Ground;
pub use level::{GameContext, Level, REQUIRED_TEXTURES};
pub use overlay::{Background, Fade, Filter};
pub use pipe::Pipe;
pub use player::Player;
pub use score::Score;
pub use state::{GamePhase, StateMachine};
