/// The game session: owns every ship, enemy, star and shot, and advances
/// them one fixed frame at a time.
///
/// Frame order: input → movement and firing → collisions → game-over check
/// → explosion animations. Drawing is a separate read-only pass.

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::audio::AudioSink;
use crate::collision::collides;
use crate::config::{
    GameConfig, BACKGROUND_INTERVAL, BACKGROUND_STEP, ENEMY_HOMES, ENEMY_STARTS, PLAYER_STARTS,
    PLAYFIELD_HEIGHT, RESPAWN_MAX, RESPAWN_MIN, STAR_STARTS,
};
use crate::entities::{Animated, Entity, GameStatus, PlayerId, Side, Winner};
use crate::error::{GameError, Violation};
use crate::input::{InputSnapshot, PlayerIntent};
use crate::persistence::{load_from_file, save_to_file, SaveRecord};
use crate::projectile::Projectile;
use crate::render::{RenderTarget, Scoreboard, Visual};
use crate::vector::Vec2;

pub const ENEMY_COUNT: usize = 3;
pub const STAR_COUNT: usize = 3;

pub struct GameSession {
    config: GameConfig,
    status: GameStatus,
    players: [Entity; 2],
    enemies: [Entity; ENEMY_COUNT],
    stars: [Entity; STAR_COUNT],
    projectiles: Vec<Projectile>,
    rng: StdRng,
    /// Simulated time; advances by `config.frame` per frame.
    clock: Duration,
    frame: u64,
    last_player_shot: [Option<Duration>; 2],
    next_enemy_shot: [Duration; ENEMY_COUNT],
    previous_input: InputSnapshot,
    background_offset: f32,
    background_timer: Duration,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::with_rng(config, rng))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        let frames = config.entity_explosion_frames;
        let players = PlayerId::ALL
            .map(|id| Entity::player(id, PLAYER_STARTS[id.index()], config.starting_lives, frames));
        let enemies = ENEMY_STARTS.map(|at| Entity::enemy(at, config.enemy_speed, frames));
        let stars = STAR_STARTS.map(|at| Entity::star(at, config.star_velocity, frames));

        let mut session = Self {
            status: GameStatus::Playing,
            players,
            enemies,
            stars,
            projectiles: Vec::new(),
            rng,
            clock: Duration::ZERO,
            frame: 0,
            last_player_shot: [None; 2],
            next_enemy_shot: [Duration::ZERO; ENEMY_COUNT],
            previous_input: InputSnapshot::default(),
            background_offset: PLAYFIELD_HEIGHT,
            background_timer: Duration::ZERO,
            config,
        };
        for slot in 0..ENEMY_COUNT {
            session.next_enemy_shot[slot] = session.enemy_fire_deadline();
        }
        info!(
            lives = session.config.starting_lives,
            seed = ?session.config.seed,
            "session started"
        );
        session
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn player(&self, id: PlayerId) -> &Entity {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Entity {
        &mut self.players[id.index()]
    }

    pub fn enemies(&self) -> &[Entity] {
        &self.enemies
    }

    pub fn stars(&self) -> &[Entity] {
        &self.stars
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn background_offset(&self) -> f32 {
        self.background_offset
    }

    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard {
            lives: self.players.each_ref().map(Entity::lives),
            scores: self.players.each_ref().map(Entity::score),
            status: self.status,
        }
    }

    /// Whether any ship, enemy, star or shot is still mid-explosion.
    pub fn any_exploding(&self) -> bool {
        self.players
            .iter()
            .chain(&self.enemies)
            .chain(&self.stars)
            .any(Entity::is_exploding)
            || self.projectiles.iter().any(Projectile::is_exploding)
    }

    /// Add a shot to the field.
    pub fn spawn_projectile(&mut self, owner: Side, at: Vec2) {
        let speed = match owner {
            Side::Player1 | Side::Player2 => self.config.player_shot_speed,
            Side::Enemy => self.config.enemy_shot_speed,
        };
        self.projectiles.push(Projectile::new(
            owner,
            at,
            speed,
            self.config.projectile_explosion_frames,
        ));
    }

    // ── Frame step ───────────────────────────────────────────────────────────

    /// Advance one frame. Once the game is over this only records input.
    pub fn advance_frame(&mut self, input: &InputSnapshot, audio: &mut impl AudioSink) -> GameStatus {
        let intents = PlayerId::ALL.map(|id| input.intent(&self.previous_input, id));
        self.previous_input = *input;
        if self.status != GameStatus::Playing {
            return self.status;
        }

        self.frame += 1;
        self.clock += self.config.frame;

        self.move_players(&intents, audio);
        self.move_npcs();
        self.fire_player_shots(&intents);
        self.fire_enemy_shots();
        self.advance_projectiles();
        self.scroll_background();

        // Explosions triggered by this frame's hits start on frame 0 next
        // frame; only the ones already playing advance now.
        let animating: Vec<bool> = self.animated().map(|a| a.is_exploding()).collect();

        self.resolve_collisions(audio);
        self.evaluate_game_over();

        for (thing, was_animating) in self.animated().zip(animating) {
            if was_animating {
                thing.advance_explosion();
            }
        }
        self.enforce_invariants();
        self.status
    }

    fn animated(&mut self) -> impl Iterator<Item = &mut dyn Animated> + '_ {
        self.players
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .chain(self.stars.iter_mut())
            .map(|e| e as &mut dyn Animated)
            .chain(self.projectiles.iter_mut().map(|p| p as &mut dyn Animated))
    }

    fn move_players(&mut self, intents: &[PlayerIntent; 2], audio: &mut impl AudioSink) {
        let dt = self.config.dt();
        for (player, intent) in self.players.iter_mut().zip(intents) {
            if player.is_exploding() {
                continue;
            }
            if intent.rotate {
                player.rotate();
            }
            player.move_by(intent.directions);
            player.integrate(dt);
            player.update_engine(dt, audio);
        }
    }

    fn move_npcs(&mut self) {
        for enemy in self.enemies.iter_mut().filter(|e| !e.is_exploding()) {
            enemy.patrol();
        }
        let bounce = self.config.star_vertical_bounce;
        for star in self.stars.iter_mut().filter(|s| !s.is_exploding()) {
            star.drift(bounce);
        }
    }

    fn fire_player_shots(&mut self, intents: &[PlayerIntent; 2]) {
        for id in PlayerId::ALL {
            let i = id.index();
            let player = &self.players[i];
            if !intents[i].fire || player.is_exploding() {
                continue;
            }
            let ready = match self.last_player_shot[i] {
                Some(last) => self.clock.saturating_sub(last) >= self.config.player_fire_cooldown,
                None => true,
            };
            if !ready {
                continue;
            }
            let muzzle = player.position() - Vec2::new(0.0, player.size().y / 2.0);
            self.last_player_shot[i] = Some(self.clock);
            self.spawn_projectile(Side::from(id), muzzle);
        }
    }

    fn fire_enemy_shots(&mut self) {
        for slot in 0..ENEMY_COUNT {
            let enemy = &self.enemies[slot];
            if enemy.is_exploding() || self.clock < self.next_enemy_shot[slot] {
                continue;
            }
            let muzzle = enemy.position() + Vec2::new(0.0, enemy.size().y / 2.0);
            self.spawn_projectile(Side::Enemy, muzzle);
            self.next_enemy_shot[slot] = self.enemy_fire_deadline();
        }
    }

    fn enemy_fire_deadline(&mut self) -> Duration {
        let jitter_ms = self.config.enemy_fire_jitter.as_millis() as u64;
        let jitter = Duration::from_millis(self.rng.gen_range(0..=jitter_ms));
        self.clock + self.config.enemy_fire_interval + jitter
    }

    /// Move every shot, then drop the ones that left the field or finished
    /// exploding.
    fn advance_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            projectile.advance(projectile.heading());
        }
        self.projectiles.retain(|p| !p.is_spent());
    }

    fn scroll_background(&mut self) {
        self.background_timer += self.config.frame;
        while self.background_timer >= BACKGROUND_INTERVAL {
            self.background_timer -= BACKGROUND_INTERVAL;
            self.background_offset -= BACKGROUND_STEP;
            if self.background_offset < 0.0 {
                self.background_offset = PLAYFIELD_HEIGHT;
            }
        }
    }

    fn resolve_collisions(&mut self, audio: &mut impl AudioSink) {
        let Self { projectiles, players, enemies, stars, rng, .. } = self;

        for shot in projectiles.iter_mut().filter(|p| p.is_alive()) {
            match shot.owner().player() {
                Some(shooter) => {
                    let hit = enemies
                        .iter_mut()
                        .enumerate()
                        .find(|(_, e)| !e.is_exploding() && collides(&*shot, &**e));
                    if let Some((slot, enemy)) = hit {
                        enemy.explode(audio);
                        enemy.set_position(ENEMY_HOMES[slot]);
                        players[shooter.index()].increase_score(1);
                        shot.explode(audio);
                        debug!(?shooter, slot, "enemy shot down");
                    }
                }
                None => {
                    let hit = players
                        .iter_mut()
                        .find(|p| !p.is_exploding() && collides(&*shot, &**p));
                    if let Some(player) = hit {
                        player.explode(audio);
                        player.decrease_lives();
                        player.set_position(random_respawn(rng));
                        shot.explode(audio);
                        debug!(kind = ?player.kind(), lives = player.lives(), "player hit");
                    }
                }
            }
        }

        for player in players.iter_mut().filter(|p| !p.is_exploding()) {
            for star in stars.iter_mut() {
                if star.is_exploding() || !collides(&*player, &*star) {
                    continue;
                }
                player.increase_lives(1);
                star.explode(audio);
                star.set_position(random_respawn(rng));
                debug!(kind = ?player.kind(), lives = player.lives(), "star collected");
            }
        }
    }

    fn evaluate_game_over(&mut self) {
        if self.players.iter().all(|p| p.lives() > 0) {
            return;
        }
        let winner = self.leader();
        self.status = GameStatus::GameOver(winner);
        info!(
            ?winner,
            p1_score = self.players[0].score(),
            p2_score = self.players[1].score(),
            frame = self.frame,
            "game over"
        );
    }

    /// Higher score wins, whoever ran out of lives.
    fn leader(&self) -> Winner {
        let (p1, p2) = (self.players[0].score(), self.players[1].score());
        match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => Winner::Player1,
            std::cmp::Ordering::Less => Winner::Player2,
            std::cmp::Ordering::Equal => Winner::Tie,
        }
    }

    // ── Invariants ───────────────────────────────────────────────────────────

    pub fn check_invariants(&self) -> Result<(), Violation> {
        for id in PlayerId::ALL {
            let lives = self.players[id.index()].lives();
            if lives < 0 {
                return Err(Violation::NegativeLives { side: Side::from(id), lives });
            }
        }
        let explosions = self
            .players
            .iter()
            .chain(&self.enemies)
            .chain(&self.stars)
            .map(Entity::explosion)
            .chain(self.projectiles.iter().map(Projectile::explosion));
        for explosion in explosions {
            if let Some(frame) = explosion.overrun() {
                return Err(Violation::ExplosionOverrun {
                    frame,
                    frame_count: explosion.frame_count(),
                });
            }
        }
        Ok(())
    }

    /// Log any broken invariant and clamp the offending state back into
    /// range instead of failing the frame.
    fn enforce_invariants(&mut self) {
        let Err(violation) = self.check_invariants() else {
            return;
        };
        let err = GameError::from(violation);
        warn!(%err, frame = self.frame, "clamping invalid game state");
        for player in &mut self.players {
            if player.lives() < 0 {
                player.set_lives(0);
            }
        }
        for thing in self.animated() {
            if thing.explosion_mut().overrun().is_some() {
                thing.explosion_mut().reset();
            }
        }
    }

    // ── Drawing ──────────────────────────────────────────────────────────────

    /// Background, players, player shots, enemy shots, enemies, stars, then
    /// the scoreboard. A ship with no lives left is not drawn.
    pub fn draw<R: RenderTarget>(&self, target: &mut R) -> Result<(), R::Error> {
        target.reset_frame()?;
        target.draw(Visual::Background, Vec2::new(0.0, self.background_offset))?;

        for player in self.players.iter().filter(|p| p.lives() > 0) {
            let (visual, at) = player.visual();
            target.draw(visual, at)?;
        }

        let (player_shots, enemy_shots): (Vec<&Projectile>, Vec<&Projectile>) = self
            .projectiles
            .iter()
            .partition(|p| p.owner() != Side::Enemy);
        for shot in player_shots.into_iter().chain(enemy_shots) {
            if let Some((visual, at)) = shot.visual() {
                target.draw(visual, at)?;
            }
        }

        for entity in self.enemies.iter().chain(&self.stars) {
            let (visual, at) = entity.visual();
            target.draw(visual, at)?;
        }

        target.draw_status(&self.scoreboard())?;
        target.present_frame()
    }

    // ── Save / load ──────────────────────────────────────────────────────────

    /// Write both players to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), GameError> {
        save_to_file(path, &self.save_record())?;
        Ok(())
    }

    /// Read a record from `path` and apply it. On any error the session is
    /// left exactly as it was.
    pub fn load_from(&mut self, path: &Path) -> Result<(), GameError> {
        let record = load_from_file(path)?;
        self.apply_record(&record);
        Ok(())
    }

    pub fn save_record(&self) -> SaveRecord {
        let [p1, p2] = &self.players;
        SaveRecord {
            p1_lives: p1.lives(),
            p2_lives: p2.lives(),
            p1_pos: p1.position(),
            p2_pos: p2.position(),
            p1_score: p1.score(),
            p2_score: p2.score(),
        }
    }

    /// Restore both players from a record. Loaded ships start at rest with no
    /// explosion playing. A record with lives left for both resumes play even
    /// after a game over.
    pub fn apply_record(&mut self, record: &SaveRecord) {
        let [p1, p2] = &mut self.players;
        p1.set_lives(record.p1_lives);
        p2.set_lives(record.p2_lives);
        p1.set_score(record.p1_score);
        p2.set_score(record.p2_score);
        p1.set_position(record.p1_pos);
        p2.set_position(record.p2_pos);
        p1.settle();
        p2.settle();

        self.status = GameStatus::Playing;
        self.evaluate_game_over();
        info!(status = ?self.status, "save record applied");
    }
}

fn random_respawn(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.gen_range(RESPAWN_MIN.x..RESPAWN_MAX.x),
        rng.gen_range(RESPAWN_MIN.y..RESPAWN_MAX.y),
    )
}
