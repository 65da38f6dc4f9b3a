//! The level: owns every entity, the renderer they draw into and the
//! Ready / Playing / GameOver state machine.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::ground::Ground;
use super::overlay::{Background, Filter};
use super::pipe::Pipe;
use super::player::Player;
use super::score::Score;
use super::state::{GamePhase, StateMachine};
use crate::assets::{AssetError, AssetPool};
use crate::audio::{AudioSink, Cue};
use crate::consts::*;
use crate::input::InputState;
use crate::renderer::{Camera, Renderer, SharedSprite, Sprite, SpriteInstance};

/// Textures [`Level::new`] looks up
pub const REQUIRED_TEXTURES: &[&str] = &[
    "player",
    "pipe",
    "background",
    "background-night",
    "ground",
    "digits",
    "gameover",
];

const BANNER_SIZE: (f32, f32) = (280.0, 50.0);
const BANNER_Y: f32 = 90.0;
const BANNER_Z: i32 = 4;

/// Per-step collaborators passed in by the driver
pub struct GameContext<'a> {
    pub input: &'a InputState,
    pub audio: &'a mut dyn AudioSink,
}

fn initial_pipe_x(index: usize) -> f32 {
    WIDTH * 1.5 + index as f32 * PIPE_SPACING
}

pub struct Level {
    renderer: Renderer,
    camera: Camera,
    state: StateMachine,
    rng: Pcg32,
    background: Background,
    player: Player,
    ground: Ground,
    pipes: Vec<Pipe>,
    score: Score,
    filter: Filter,
    banner: SharedSprite,
    banner_visible: bool,
}

impl Level {
    /// Build every entity (in draw order within each layer) and enter Ready
    pub fn new(assets: &AssetPool, seed: u64, audio: &mut dyn AudioSink) -> Result<Self, AssetError> {
        let mut renderer = Renderer::new(BATCH_CAPACITY);
        let mut rng = Pcg32::seed_from_u64(seed);

        let background = Background::new(
            &mut renderer,
            assets.texture("background")?,
            assets.texture("background-night")?,
        );
        let player = Player::new(&mut renderer, assets.texture("player")?);
        let ground = Ground::new(&mut renderer, assets.texture("ground")?);
        let pipe_texture = assets.texture("pipe")?;
        let pipes = (0..PIPE_COUNT)
            .map(|i| Pipe::new(&mut renderer, pipe_texture, initial_pipe_x(i), &mut rng))
            .collect();
        let score = Score::new(&mut renderer, assets.texture("digits")?);
        let filter = Filter::new(&mut renderer);
        let (bw, bh) = BANNER_SIZE;
        let banner = SpriteInstance::new(Sprite::whole(assets.texture("gameover")?))
            .with_scale(bw, bh)
            .with_position(0.0, BANNER_Y)
            .with_z(BANNER_Z)
            .shared();

        let mut level = Self {
            renderer,
            camera: Camera::new(WIDTH, HEIGHT),
            state: StateMachine::new(),
            rng,
            background,
            player,
            ground,
            pipes,
            score,
            filter,
            banner,
            banner_visible: false,
        };
        level.set_state(GamePhase::Ready, audio);

        log::info!(
            "Level ready: {} sprites in {} batches (seed {seed})",
            level.renderer.sprite_count(),
            level.renderer.batch_count()
        );
        Ok(level)
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase()
    }

    pub fn state(&self) -> &StateMachine {
        &self.state
    }

    pub fn score(&self) -> u32 {
        self.score.value()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Everything the GPU pass needs
    pub fn render_parts(&mut self) -> (&mut Renderer, &mut Camera) {
        (&mut self.renderer, &mut self.camera)
    }

    /// Advance one fixed step of `dt` seconds
    pub fn update(&mut self, dt: f32, ctx: &mut GameContext<'_>) {
        self.state.advance(dt);
        let now = self.state.clock();

        self.update_player(dt, ctx);
        self.ground.update(dt, self.state.phase());

        let player_x = self.player.x();
        let count = self.pipes.len();
        let mut passed = 0;
        for pipe in &mut self.pipes {
            if pipe.update(dt, self.state.phase(), player_x, count, &mut self.rng) {
                passed += 1;
            }
        }
        for _ in 0..passed {
            self.pass_pipe(ctx.audio);
        }

        self.filter.update(now);

        if self.state.is(GamePhase::GameOver)
            && self.state.elapsed() >= GAMEOVER_SHOW_DELAY_MS
            && !self.banner_visible
        {
            self.banner_visible = true;
            self.renderer.add(&self.banner);
            ctx.audio.play_cue(Cue::Swoosh);
        }

        self.background.update(now);
    }

    fn update_player(&mut self, dt: f32, ctx: &mut GameContext<'_>) {
        self.player.apply_gravity(self.state.phase(), dt);

        if ctx.input.activate_just_pressed() {
            if self.state.is(GamePhase::Ready) {
                self.set_state(GamePhase::Playing, ctx.audio);
            }
            if self.state.is(GamePhase::Playing) {
                self.player.flap();
                ctx.audio.play_cue(Cue::Wing);
            }
            if self.state.is(GamePhase::GameOver) && self.state.elapsed() >= RESTART_DELAY_MS {
                self.set_state(GamePhase::Ready, ctx.audio);
            }
        }

        if self.player.integrate(dt) {
            if !self.state.is(GamePhase::GameOver) {
                ctx.audio.play_cue(Cue::Hit);
            }
            self.game_over(ctx.audio);
        }

        if !self.state.is(GamePhase::GameOver)
            && self.pipes.iter().any(|pipe| self.player.collides(pipe))
        {
            ctx.audio.play_cue(Cue::Hit);
            ctx.audio.play_cue(Cue::Die);
            self.game_over(ctx.audio);
        }

        self.player.update_rotation(self.state.phase(), dt);
        if !self.state.is(GamePhase::GameOver) {
            self.player.animate(self.state.clock());
        }
    }

    /// Player cleared a pipe
    pub(crate) fn pass_pipe(&mut self, audio: &mut dyn AudioSink) {
        audio.play_cue(Cue::Point);
        if self.score.inc(&mut self.renderer) {
            self.background.change(self.state.clock());
        }
    }

    /// Enter `phase`; entering Ready resets the run
    pub fn set_state(&mut self, phase: GamePhase, audio: &mut dyn AudioSink) {
        self.state.set(phase);
        if phase == GamePhase::Ready {
            self.reset();
            if self.banner_visible {
                self.renderer.remove(&self.banner);
                self.banner_visible = false;
            }
            audio.play_cue(Cue::Swoosh);
        }
    }

    /// End the run; repeated calls are ignored
    pub fn game_over(&mut self, audio: &mut dyn AudioSink) {
        if self.state.is(GamePhase::GameOver) {
            return;
        }
        log::info!("Game over with score {}", self.score.value());
        self.set_state(GamePhase::GameOver, audio);
        self.filter.play(self.state.clock());
    }

    fn reset(&mut self) {
        self.score.set(&mut self.renderer, 0);
        self.background.reset();
        self.player.reset();
        for (i, pipe) in self.pipes.iter_mut().enumerate() {
            pipe.reset(&mut self.rng);
            pipe.set_x(initial_pipe_x(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::RecordingAudio;
    use crate::renderer::{Texture, TextureId};

    fn test_assets() -> AssetPool {
        let sizes = [
            ("player", 34, 72),
            ("pipe", 52, 320),
            ("background", 288, 512),
            ("background-night", 288, 512),
            ("ground", 336, 112),
            ("digits", 240, 36),
            ("gameover", 192, 42),
        ];
        let mut pool = AssetPool::new();
        for (i, (name, w, h)) in sizes.into_iter().enumerate() {
            pool.insert_texture(name, Texture::new(TextureId(i as u32 + 1), w, h));
        }
        pool
    }

    fn level(seed: u64) -> (Level, RecordingAudio) {
        let mut audio = RecordingAudio::default();
        let level = Level::new(&test_assets(), seed, &mut audio).unwrap();
        (level, audio)
    }

    fn step(level: &mut Level, audio: &mut RecordingAudio, activate: bool) {
        let input = if activate {
            InputState::pressed(crate::input::ACTIVATE_KEY)
        } else {
            InputState::new()
        };
        let mut ctx = GameContext { input: &input, audio };
        level.update(SIM_DT, &mut ctx);
    }

    /// Start a run and let the bird drop onto the floor
    fn crash(level: &mut Level, audio: &mut RecordingAudio) {
        step(level, audio, true);
        for _ in 0..600 {
            if level.phase() == GamePhase::GameOver {
                return;
            }
            step(level, audio, false);
        }
        panic!("bird never reached the floor");
    }

    fn pipe_xs(level: &Level) -> Vec<f32> {
        level.pipes().iter().map(Pipe::x).collect()
    }

    #[test]
    fn test_new_level_is_ready() {
        let (level, mut audio) = level(1);
        assert_eq!(level.phase(), GamePhase::Ready);
        assert_eq!(level.score(), 0);
        assert_eq!(audio.take(), vec![Cue::Swoosh]);
        assert_eq!(pipe_xs(&level), vec![540.0, 770.0, 1000.0]);

        let zs: Vec<i32> = level.renderer().batches().iter().map(|b| b.z_index()).collect();
        assert_eq!(zs, vec![1, 2, 3, 4]);
        // 2 background + 6 pipe halves + player + 2 ground + 1 digit + filter
        assert_eq!(level.renderer().sprite_count(), 13);
        assert!(!level.banner_visible());
    }

    #[test]
    fn test_missing_texture_is_an_error() {
        let mut audio = RecordingAudio::default();
        let err = Level::new(&AssetPool::new(), 1, &mut audio).err().unwrap();
        assert!(matches!(err, AssetError::Unavailable { .. }));
    }

    #[test]
    fn test_ready_holds_still_until_activate() {
        let (mut level, mut audio) = level(2);
        for _ in 0..120 {
            step(&mut level, &mut audio, false);
        }
        assert_eq!(level.phase(), GamePhase::Ready);
        assert_eq!(level.player().y(), 60.0);
        assert_eq!(pipe_xs(&level), vec![540.0, 770.0, 1000.0]);

        audio.take();
        step(&mut level, &mut audio, true);
        assert_eq!(level.phase(), GamePhase::Playing);
        assert_eq!(audio.take(), vec![Cue::Wing]);
        assert!(level.player().y() > 60.0);
        assert!(level.pipes()[0].x() < 540.0);
    }

    #[test]
    fn test_floor_contact_ends_run_once() {
        let (mut level, mut audio) = level(3);
        audio.take();
        crash(&mut level, &mut audio);

        let cues = audio.take();
        assert_eq!(cues.iter().filter(|c| **c == Cue::Hit).count(), 1);
        assert!(!cues.contains(&Cue::Die));
        assert!(level.filter().is_playing());
        assert_eq!(level.player().y(), PLAYER_FLOOR_Y);

        // Frozen world, no more hits
        let xs = pipe_xs(&level);
        for _ in 0..30 {
            step(&mut level, &mut audio, false);
        }
        assert_eq!(pipe_xs(&level), xs);
        assert!(!audio.take().contains(&Cue::Hit));
        assert_eq!(level.player().y(), PLAYER_FLOOR_Y);
    }

    #[test]
    fn test_banner_appears_once_after_delay() {
        let (mut level, mut audio) = level(4);
        crash(&mut level, &mut audio);
        audio.take();

        while level.state().elapsed() < GAMEOVER_SHOW_DELAY_MS {
            assert!(!level.banner_visible());
            step(&mut level, &mut audio, false);
        }
        assert!(level.banner_visible());
        assert_eq!(audio.take(), vec![Cue::Swoosh]);
        step(&mut level, &mut audio, false);
        assert!(audio.take().is_empty());
    }

    #[test]
    fn test_restart_needs_delay_then_resets() {
        let (mut level, mut audio) = level(5);
        crash(&mut level, &mut audio);
        level.pass_pipe(&mut audio);
        assert_eq!(level.score(), 1);

        // Too early: ignored
        step(&mut level, &mut audio, true);
        assert_eq!(level.phase(), GamePhase::GameOver);

        while level.state().elapsed() < RESTART_DELAY_MS {
            step(&mut level, &mut audio, false);
        }
        assert!(level.banner_visible());
        let sprites_before = level.renderer().sprite_count();
        audio.take();

        step(&mut level, &mut audio, true);
        assert_eq!(level.phase(), GamePhase::Ready);
        assert_eq!(audio.take(), vec![Cue::Swoosh]);
        assert_eq!(level.score(), 0);
        assert!(!level.banner_visible());
        assert_eq!(level.renderer().sprite_count(), sprites_before - 1);
        assert_eq!(pipe_xs(&level), vec![540.0, 770.0, 1000.0]);
        assert!(level.pipes().iter().all(|p| !p.passed()));
        assert!(level.background().is_day());
        assert_eq!(level.player().position().x, -80.0);
        assert_eq!(level.player().y(), 60.0);
    }

    #[test]
    fn test_game_over_is_idempotent() {
        let (mut level, mut audio) = level(6);
        step(&mut level, &mut audio, true);
        level.game_over(&mut audio);
        let entered = level.state().entered_at();
        step(&mut level, &mut audio, false);
        level.game_over(&mut audio);
        assert_eq!(level.state().entered_at(), entered);
    }

    #[test]
    fn test_tenth_point_toggles_day_night() {
        let (mut level, mut audio) = level(7);
        audio.take();
        for _ in 0..9 {
            level.pass_pipe(&mut audio);
        }
        assert!(level.background().is_day());
        level.pass_pipe(&mut audio);
        assert!(!level.background().is_day());
        assert!(level.background().is_fading());
        assert_eq!(audio.take(), vec![Cue::Point; 10]);
        assert_eq!(level.score(), 10);
    }

    #[test]
    fn test_same_seed_same_pipes() {
        let (a, _) = level(99);
        let (b, _) = level(99);
        let gaps = |l: &Level| l.pipes().iter().map(Pipe::gap_y).collect::<Vec<_>>();
        assert_eq!(gaps(&a), gaps(&b));
        for gap in gaps(&a) {
            assert!((PIPE_MIN_Y..PIPE_MAX_Y).contains(&gap));
        }
    }
}
