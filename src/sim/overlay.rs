//! Time-driven overlays: the white hit flash and the day/night background
//!
//! Both are driven by [`Fade`], a restartable 0..1 ramp measured on the
//! level clock.

use crate::consts::{DAY_NIGHT_DURATION_MS, FLASH_DURATION_MS, HEIGHT, WIDTH};
use crate::math::{clamp01, step};
use crate::renderer::{Renderer, SharedSprite, Sprite, SpriteInstance, Texture};

/// Filter overlay sits above everything except the banner
const FILTER_Z: i32 = 4;
const BACKGROUND_Z: i32 = 1;

/// Linear ramp from `start` to `start + duration`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    start: f64,
    duration: f64,
    playing: bool,
}

impl Fade {
    pub fn new(duration: f64) -> Self {
        Self {
            start: 0.0,
            duration,
            playing: false,
        }
    }

    /// (Re)start the ramp at `now`
    pub fn play(&mut self, now: f64) {
        self.start = now;
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn ratio(&self, now: f64) -> f64 {
        clamp01(step(self.start, self.start + self.duration, now))
    }
}

/// Full-screen solid flash played on game over
pub struct Filter {
    sprite: SharedSprite,
    fade: Fade,
}

impl Filter {
    pub fn new(renderer: &mut Renderer) -> Self {
        let mut inst = SpriteInstance::new(Sprite::solid())
            .with_scale(WIDTH, HEIGHT)
            .with_z(FILTER_Z);
        inst.set_color(0.0, 0.0, 0.0, 0.0);
        let sprite = inst.shared();
        renderer.add(&sprite);
        Self {
            sprite,
            fade: Fade::new(FLASH_DURATION_MS),
        }
    }

    pub fn play(&mut self, now: f64) {
        self.fade.play(now);
    }

    pub fn is_playing(&self) -> bool {
        self.fade.is_playing()
    }

    pub fn update(&mut self, now: f64) {
        if !self.fade.is_playing() {
            return;
        }
        let v = self.fade.ratio(now);
        let c = (1.0 - v) as f32;
        let mut sprite = self.sprite.borrow_mut();
        sprite.set_color(c, c, c, c);
        if v >= 1.0 {
            self.fade.stop();
            sprite.set_color(0.0, 0.0, 0.0, 0.0);
        }
    }

    pub fn color(&self) -> [f32; 4] {
        self.sprite.borrow().color
    }
}

/// Day layer over a night layer; fading the day layer switches between them
pub struct Background {
    _night: SharedSprite,
    day: SharedSprite,
    fade: Fade,
    is_day: bool,
}

impl Background {
    pub fn new(renderer: &mut Renderer, day: Texture, night: Texture) -> Self {
        let layer = |texture| {
            SpriteInstance::new(Sprite::whole(texture))
                .with_scale(WIDTH, HEIGHT)
                .with_z(BACKGROUND_Z)
                .shared()
        };
        // Night first so day draws over it within the shared batch
        let night = layer(night);
        renderer.add(&night);
        let day = layer(day);
        renderer.add(&day);

        Self {
            _night: night,
            day,
            fade: Fade::new(DAY_NIGHT_DURATION_MS),
            is_day: true,
        }
    }

    pub fn is_day(&self) -> bool {
        self.is_day
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_playing()
    }

    /// Start fading towards the other time of day
    pub fn change(&mut self, now: f64) {
        self.is_day = !self.is_day;
        self.fade.play(now);
        log::debug!("Background fading to {}", if self.is_day { "day" } else { "night" });
    }

    /// Back to full daylight immediately
    pub fn reset(&mut self) {
        self.fade.stop();
        self.is_day = true;
        self.day.borrow_mut().set_color(1.0, 1.0, 1.0, 1.0);
    }

    pub fn update(&mut self, now: f64) {
        if !self.fade.is_playing() {
            return;
        }
        let v = self.fade.ratio(now);
        let c = (if self.is_day { v } else { 1.0 - v }) as f32;
        self.day.borrow_mut().set_color(c, c, c, c);
        if v >= 1.0 {
            self.fade.stop();
        }
    }

    pub fn day_alpha(&self) -> f32 {
        self.day.borrow().color[3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextureId;

    #[test]
    fn test_fade_ratio_clamps() {
        let mut fade = Fade::new(300.0);
        fade.play(1000.0);
        assert_eq!(fade.ratio(900.0), 0.0);
        assert_eq!(fade.ratio(1150.0), 0.5);
        assert_eq!(fade.ratio(2000.0), 1.0);
        fade.play(5000.0);
        assert_eq!(fade.ratio(5000.0), 0.0);
    }

    #[test]
    fn test_filter_flash_clears_when_done() {
        let mut renderer = Renderer::new(16);
        let mut filter = Filter::new(&mut renderer);
        assert_eq!(filter.color(), [0.0; 4]);

        filter.play(100.0);
        filter.update(100.0);
        assert_eq!(filter.color(), [1.0; 4]);
        filter.update(250.0);
        assert_eq!(filter.color(), [0.5; 4]);
        filter.update(400.0);
        assert_eq!(filter.color(), [0.0; 4]);
        assert!(!filter.is_playing());
    }

    #[test]
    fn test_background_day_night_cycle() {
        let mut renderer = Renderer::new(16);
        let day = Texture::new(TextureId(1), 288, 512);
        let night = Texture::new(TextureId(2), 288, 512);
        let mut bg = Background::new(&mut renderer, day, night);
        assert_eq!(renderer.sprite_count(), 2);
        assert!(bg.is_day());

        bg.change(0.0);
        assert!(!bg.is_day());
        bg.update(750.0);
        assert!((bg.day_alpha() - 0.5).abs() < 1e-6);
        bg.update(1500.0);
        assert_eq!(bg.day_alpha(), 0.0);
        assert!(!bg.is_fading());

        bg.change(2000.0);
        bg.update(3500.0);
        assert_eq!(bg.day_alpha(), 1.0);

        bg.change(4000.0);
        bg.update(4100.0);
        bg.reset();
        assert!(bg.is_day());
        assert_eq!(bg.day_alpha(), 1.0);
        bg.update(6000.0);
        assert_eq!(bg.day_alpha(), 1.0);
    }
}
