//! Sound cues and background music
//!
//! The simulation only talks to [`AudioSink`]. In the browser that is
//! [`AudioManager`] (Web Audio, decoded clips routed through master, music
//! and cue gain nodes); natively it is [`NullAudio`].

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Flap
    Wing,
    /// Pipe passed
    Point,
    /// Collision or floor contact
    Hit,
    /// Crashed into a pipe
    Die,
    /// Banner or screen transition
    Swoosh,
}

impl Cue {
    pub const ALL: [Cue; 5] = [Cue::Wing, Cue::Point, Cue::Hit, Cue::Die, Cue::Swoosh];

    /// Asset name of the clip
    pub fn name(&self) -> &'static str {
        match self {
            Cue::Wing => "wing",
            Cue::Point => "point",
            Cue::Hit => "hit",
            Cue::Die => "die",
            Cue::Swoosh => "swoosh",
        }
    }
}

pub trait AudioSink {
    fn play_cue(&mut self, cue: Cue);
    /// Start a looping track, replacing any current one
    fn play_looping(&mut self, clip: &str);
    fn stop_music(&mut self);
}

/// Discards everything; used by headless runs
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_cue(&mut self, cue: Cue) {
        log::trace!("cue {:?}", cue);
    }

    fn play_looping(&mut self, _clip: &str) {}

    fn stop_music(&mut self) {}
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::collections::HashMap;

    use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext, GainNode};

    use super::{AudioSink, Cue};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master: Option<GainNode>,
        music_gain: Option<GainNode>,
        cue_gain: Option<GainNode>,
        clips: HashMap<String, AudioBuffer>,
        music: Option<AudioBufferSourceNode>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            let Some(ctx) = ctx else {
                log::warn!("Failed to create AudioContext - audio disabled");
                return Self {
                    ctx: None,
                    master: None,
                    music_gain: None,
                    cue_gain: None,
                    clips: HashMap::new(),
                    music: None,
                };
            };

            let master = ctx.create_gain().ok();
            if let Some(master) = &master {
                master.connect_with_audio_node(&ctx.destination()).ok();
            }
            let bus = || {
                let gain = ctx.create_gain().ok()?;
                gain.connect_with_audio_node(master.as_ref()?).ok()?;
                Some(gain)
            };
            let music_gain = bus();
            let cue_gain = bus();

            Self {
                ctx: Some(ctx),
                master,
                music_gain,
                cue_gain,
                clips: HashMap::new(),
                music: None,
            }
        }

        /// Context used to decode fetched clips
        pub fn context(&self) -> Option<&AudioContext> {
            self.ctx.as_ref()
        }

        pub fn insert_clip(&mut self, name: &str, buffer: AudioBuffer) {
            self.clips.insert(name.to_string(), buffer);
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }

        /// Pause output, e.g. while the page is hidden; the next gesture resumes
        pub fn suspend(&self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Running {
                    let _ = ctx.suspend();
                }
            }
        }

        /// Push volumes from settings into the gain nodes
        pub fn apply_settings(&self, settings: &Settings) {
            for (node, value) in [
                (&self.master, 1.0),
                (&self.music_gain, settings.effective_music_volume()),
                (&self.cue_gain, settings.effective_cue_volume()),
            ] {
                if let Some(node) = node {
                    node.gain().set_value(value.clamp(0.0, 1.0));
                }
            }
        }

        fn source(&self, clip: &str, bus: &Option<GainNode>) -> Option<AudioBufferSourceNode> {
            let ctx = self.ctx.as_ref()?;
            let Some(buffer) = self.clips.get(clip) else {
                log::warn!("Audio clip '{clip}' not loaded");
                return None;
            };
            let node = ctx.create_buffer_source().ok()?;
            node.set_buffer(Some(buffer));
            node.connect_with_audio_node(bus.as_ref()?).ok()?;
            Some(node)
        }
    }

    impl AudioSink for AudioManager {
        fn play_cue(&mut self, cue: Cue) {
            if let Some(node) = self.source(cue.name(), &self.cue_gain) {
                node.start().ok();
            }
        }

        fn play_looping(&mut self, clip: &str) {
            self.stop_music();
            if let Some(node) = self.source(clip, &self.music_gain) {
                node.set_loop(true);
                node.start().ok();
                self.music = Some(node);
            }
        }

        fn stop_music(&mut self) {
            if let Some(node) = self.music.take() {
                node.stop().ok();
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names_match_asset_names() {
        let names: Vec<&str> = Cue::ALL.iter().map(Cue::name).collect();
        assert_eq!(names, vec!["wing", "point", "hit", "die", "swoosh"]);
    }

    #[test]
    fn test_null_audio_accepts_everything() {
        let mut audio = NullAudio;
        audio.play_cue(Cue::Hit);
        audio.play_looping("theme");
        audio.stop_music();
    }
}
