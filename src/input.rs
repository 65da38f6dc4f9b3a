//! Keyboard and pointer state, latched once per frame
//!
//! Browser events arrive between frames and only record what happened.
//! [`InputState::begin_frame`] turns those records into "just pressed" edges
//! for the simulation, and [`InputState::end_frame`] clears the edges so a
//! single press is seen by exactly one simulation step.

use std::collections::HashSet;

/// Key code that flaps
pub const ACTIVATE_KEY: &str = "Space";

/// Key code that toggles mute
pub const MUTE_KEY: &str = "KeyM";

/// Primary pointer (mouse or first touch)
pub const PRIMARY_POINTER: i32 = 0;

#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<String>,
    /// Presses recorded since the last `begin_frame`
    keys_pressed: HashSet<String>,
    keys_just_pressed: HashSet<String>,
    /// Primary pointer held
    pointer_down: bool,
    pointer_pressed: bool,
    pointer_just_pressed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, code: &str) {
        // Ignore auto-repeat
        if self.keys_down.insert(code.to_string()) {
            self.keys_pressed.insert(code.to_string());
        }
    }

    pub fn key_up(&mut self, code: &str) {
        self.keys_down.remove(code);
    }

    pub fn pointer_down(&mut self, id: i32) {
        if id != PRIMARY_POINTER {
            return;
        }
        if !self.pointer_down {
            self.pointer_pressed = true;
        }
        self.pointer_down = true;
    }

    pub fn pointer_up(&mut self, id: i32) {
        if id == PRIMARY_POINTER {
            self.pointer_down = false;
        }
    }

    /// Drop held state, e.g. when the page loses focus
    pub fn release_all(&mut self) {
        self.keys_down.clear();
        self.pointer_down = false;
    }

    /// Latch presses recorded since the previous frame. Edges not yet
    /// consumed by `end_frame` carry over.
    pub fn begin_frame(&mut self) {
        self.keys_just_pressed.extend(self.keys_pressed.drain());
        self.pointer_just_pressed |= std::mem::take(&mut self.pointer_pressed);
    }

    /// Consume this frame's edges
    pub fn end_frame(&mut self) {
        self.keys_just_pressed.clear();
        self.pointer_just_pressed = false;
    }

    pub fn is_key_down(&self, code: &str) -> bool {
        self.keys_down.contains(code)
    }

    pub fn is_key_just_pressed(&self, code: &str) -> bool {
        self.keys_just_pressed.contains(code)
    }

    pub fn is_pointer_just_pressed(&self) -> bool {
        self.pointer_just_pressed
    }

    /// Space or a fresh tap/click
    pub fn activate_just_pressed(&self) -> bool {
        self.is_key_just_pressed(ACTIVATE_KEY) || self.pointer_just_pressed
    }

    #[cfg(test)]
    pub(crate) fn pressed(code: &str) -> Self {
        let mut input = Self::new();
        input.key_down(code);
        input.begin_frame();
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_visible_for_one_frame() {
        let mut input = InputState::new();
        input.key_down("Space");
        assert!(!input.activate_just_pressed());

        input.begin_frame();
        assert!(input.activate_just_pressed());
        input.end_frame();
        assert!(!input.activate_just_pressed());

        // Held key does not retrigger
        input.key_down("Space");
        input.begin_frame();
        assert!(!input.activate_just_pressed());
        assert!(input.is_key_down("Space"));
    }

    #[test]
    fn test_tap_between_frames_is_not_lost() {
        let mut input = InputState::new();
        input.pointer_down(PRIMARY_POINTER);
        input.pointer_up(PRIMARY_POINTER);
        input.begin_frame();
        assert!(input.is_pointer_just_pressed());
        input.end_frame();

        // Held pointer does not retrigger
        input.pointer_down(PRIMARY_POINTER);
        input.pointer_down(PRIMARY_POINTER);
        input.begin_frame();
        assert!(input.is_pointer_just_pressed());
        input.end_frame();
        input.pointer_down(PRIMARY_POINTER);
        input.begin_frame();
        assert!(!input.is_pointer_just_pressed());
    }

    #[test]
    fn test_unconsumed_press_survives_next_frame() {
        let mut input = InputState::new();
        input.key_down("Space");
        input.begin_frame();
        // No simulation step ran, so end_frame was never called
        input.begin_frame();
        assert!(input.activate_just_pressed());
    }

    #[test]
    fn test_secondary_touch_ignored() {
        let mut input = InputState::new();
        input.pointer_down(3);
        input.begin_frame();
        assert!(!input.activate_just_pressed());
    }

    #[test]
    fn test_other_keys_do_not_activate() {
        let mut input = InputState::new();
        input.key_down("KeyA");
        input.begin_frame();
        assert!(input.is_key_just_pressed("KeyA"));
        assert!(!input.activate_just_pressed());
        input.key_up("KeyA");
        input.release_all();
        assert!(!input.is_key_down("KeyA"));
    }
}
