use twin_duel::audio::{Cue, Silent};
use twin_duel::config::{GameConfig, ENEMY_HOMES, RESPAWN_MAX, RESPAWN_MIN};
use twin_duel::entities::{
    EngineState, ExplosionState, GameStatus, Orientation, PlayerId, Side, Winner,
};
use twin_duel::error::GameError;
use twin_duel::input::{Action, InputSnapshot};
use twin_duel::render::{DrawList, Visual};
use twin_duel::session::GameSession;
use twin_duel::vector::Vec2;

fn make_session() -> GameSession {
    let config = GameConfig { seed: Some(42), ..GameConfig::default() };
    GameSession::new(config).unwrap()
}

fn idle() -> InputSnapshot {
    InputSnapshot::new()
}

fn shots_of(session: &GameSession, owner: Side) -> usize {
    session.projectiles().iter().filter(|p| p.owner() == owner).count()
}

fn in_respawn_region(at: Vec2) -> bool {
    (RESPAWN_MIN.x..RESPAWN_MAX.x).contains(&at.x) && (RESPAWN_MIN.y..RESPAWN_MAX.y).contains(&at.y)
}

// ── construction ──────────────────────────────────────────────────────────────

#[test]
fn new_session_starts_playing_with_full_lives() {
    let s = make_session();
    assert_eq!(s.status(), GameStatus::Playing);
    assert_eq!(s.frame(), 0);
    assert_eq!(s.enemies().len(), 3);
    assert_eq!(s.stars().len(), 3);
    assert!(s.projectiles().is_empty());
    for id in PlayerId::ALL {
        assert_eq!(s.player(id).lives(), 10);
        assert_eq!(s.player(id).score(), 0);
    }
    assert!(!s.any_exploding());
}

#[test]
fn invalid_config_is_an_initialization_error() {
    let config = GameConfig { starting_lives: 0, ..GameConfig::default() };
    let err = GameSession::new(config).err().unwrap();
    assert!(matches!(err, GameError::Initialization(_)));
    assert!(err.is_fatal());
}

// ── shooting enemies ──────────────────────────────────────────────────────────

#[test]
fn player_shot_downs_enemy_and_scores() {
    let mut s = make_session();
    let mut cues: Vec<Cue> = Vec::new();
    assert_eq!(s.enemies()[0].position(), Vec2::new(100.0, 100.0));

    s.spawn_projectile(Side::Player1, Vec2::new(100.0, 112.0));
    s.advance_frame(&idle(), &mut cues);

    let enemy = &s.enemies()[0];
    assert_eq!(s.player(PlayerId::One).score(), 1);
    assert_eq!(s.player(PlayerId::Two).score(), 0);
    assert_eq!(enemy.position(), ENEMY_HOMES[0]);
    assert_eq!(enemy.explosion().state(), ExplosionState::Exploding { frame: 0 });
    // enemy and shot both blew up
    assert_eq!(cues.iter().filter(|&&c| c == Cue::Explosion).count(), 2);
    assert!(s.projectiles().iter().all(|p| !p.is_alive()));
}

#[test]
fn second_player_gets_credit_for_own_hit() {
    let mut s = make_session();
    s.spawn_projectile(Side::Player2, Vec2::new(100.0, 112.0));
    s.advance_frame(&idle(), &mut Silent);
    assert_eq!(s.player(PlayerId::One).score(), 0);
    assert_eq!(s.player(PlayerId::Two).score(), 1);
}

#[test]
fn exploding_enemy_finishes_after_its_frame_count() {
    let mut s = make_session();
    s.spawn_projectile(Side::Player1, Vec2::new(100.0, 112.0));
    s.advance_frame(&idle(), &mut Silent);
    assert!(s.any_exploding());

    for _ in 0..14 {
        s.advance_frame(&idle(), &mut Silent);
        assert!(s.enemies()[0].is_exploding());
    }
    s.advance_frame(&idle(), &mut Silent);
    assert!(!s.enemies()[0].is_exploding());
}

#[test]
fn each_enemy_slot_returns_to_its_own_home() {
    let mut s = make_session();
    // slots 1 and 2 patrol to (153, 150) and (203, 200) before the hits land
    s.spawn_projectile(Side::Player1, Vec2::new(150.0, 162.0));
    s.spawn_projectile(Side::Player1, Vec2::new(200.0, 212.0));
    s.advance_frame(&idle(), &mut Silent);

    assert_eq!(s.player(PlayerId::One).score(), 2);
    assert_eq!(s.enemies()[1].position(), Vec2::new(750.0, 150.0));
    assert_eq!(s.enemies()[2].position(), Vec2::new(650.0, 200.0));
    assert_eq!(&ENEMY_HOMES[1..], &[Vec2::new(750.0, 150.0), Vec2::new(650.0, 200.0)]);
    assert!(!s.enemies()[0].is_exploding());
}

// ── getting hit ───────────────────────────────────────────────────────────────

#[test]
fn enemy_shot_hits_second_player() {
    let mut s = make_session();
    assert_eq!(s.player(PlayerId::Two).position(), Vec2::new(300.0, 400.0));

    s.spawn_projectile(Side::Enemy, Vec2::new(300.0, 392.0));
    s.advance_frame(&idle(), &mut Silent);

    assert_eq!(s.player(PlayerId::Two).lives(), 9);
    assert!(s.player(PlayerId::Two).is_exploding());
    assert_eq!(s.player(PlayerId::One).lives(), 10);
}

#[test]
fn shots_pass_through_their_own_side() {
    let mut s = make_session();
    // player 2's shot over player 1, an enemy shot over enemy slot 0
    s.spawn_projectile(Side::Player2, Vec2::new(100.0, 408.0));
    s.spawn_projectile(Side::Enemy, Vec2::new(100.0, 92.0));
    s.advance_frame(&idle(), &mut Silent);

    assert_eq!(s.player(PlayerId::One).lives(), 10);
    assert!(!s.player(PlayerId::One).is_exploding());
    assert!(!s.enemies()[0].is_exploding());
    assert_eq!(s.player(PlayerId::Two).score(), 0);
    assert_eq!(s.projectiles().len(), 2);
    assert!(s.projectiles().iter().all(|p| p.is_alive()));
}

#[test]
fn exploding_player_ignores_movement_and_fire() {
    let mut s = make_session();
    s.player_mut(PlayerId::One).explode(&mut Silent);
    let held = idle().with(Action::P1Right).with(Action::P1Up).with(Action::P1Fire);

    for _ in 0..5 {
        s.advance_frame(&held, &mut Silent);
    }
    let p1 = s.player(PlayerId::One);
    assert!(p1.is_exploding());
    assert_eq!(p1.position(), Vec2::new(100.0, 400.0));
    assert_eq!(p1.velocity(), Vec2::ZERO);
    assert_eq!(shots_of(&s, Side::Player1), 0);
}

#[test]
fn last_life_lost_ends_game_with_higher_score_winning() {
    let mut s = make_session();
    s.player_mut(PlayerId::One).set_lives(1);
    s.player_mut(PlayerId::Two).set_score(3);

    s.spawn_projectile(Side::Enemy, Vec2::new(100.0, 392.0));
    let status = s.advance_frame(&idle(), &mut Silent);

    assert_eq!(s.player(PlayerId::One).lives(), 0);
    assert_eq!(status, GameStatus::GameOver(Winner::Player2));
    assert_eq!(s.status(), status);
}

#[test]
fn last_life_lost_with_equal_scores_is_a_tie() {
    let mut s = make_session();
    s.player_mut(PlayerId::One).set_lives(1);

    s.spawn_projectile(Side::Enemy, Vec2::new(100.0, 392.0));
    assert_eq!(s.advance_frame(&idle(), &mut Silent), GameStatus::GameOver(Winner::Tie));
}

#[test]
fn hit_player_respawns_inside_region() {
    let mut s = make_session();
    s.spawn_projectile(Side::Enemy, Vec2::new(100.0, 392.0));
    s.advance_frame(&idle(), &mut Silent);

    let p1 = s.player(PlayerId::One);
    assert_eq!(p1.lives(), 9);
    assert!(p1.is_exploding());
    assert!(in_respawn_region(p1.position()), "{:?}", p1.position());
    assert_eq!(s.status(), GameStatus::Playing);
}

// ── stars ─────────────────────────────────────────────────────────────────────

#[test]
fn second_player_collects_star() {
    let mut s = make_session();
    let star_at = s.stars()[1].position();
    s.player_mut(PlayerId::Two).set_position(star_at);

    s.advance_frame(&idle(), &mut Silent);

    assert_eq!(s.player(PlayerId::Two).lives(), 11);
    assert_eq!(s.player(PlayerId::One).lives(), 10);
    assert!(s.stars()[1].is_exploding());
}

#[test]
fn touching_star_grants_a_life() {
    let mut s = make_session();
    let star_at = s.stars()[0].position();
    s.player_mut(PlayerId::One).set_position(star_at);

    s.advance_frame(&idle(), &mut Silent);

    assert_eq!(s.player(PlayerId::One).lives(), 11);
    let star = &s.stars()[0];
    assert!(star.is_exploding());
    assert!(in_respawn_region(star.position()));
}

// ── firing ────────────────────────────────────────────────────────────────────

#[test]
fn fired_shot_leaves_top_and_is_pruned() {
    let mut s = make_session();
    s.player_mut(PlayerId::One).set_position(Vec2::new(700.0, 400.0));

    s.advance_frame(&idle().with(Action::P1Fire), &mut Silent);
    assert_eq!(s.projectiles().len(), 1);

    let mut frames = 0;
    while !s.projectiles().is_empty() {
        s.advance_frame(&idle(), &mut Silent);
        frames += 1;
        assert!(frames < 40, "shot never left the field");
    }
    assert_eq!(s.player(PlayerId::One).score(), 0);
}

#[test]
fn held_fire_respects_cooldown() {
    let mut s = make_session();
    let fire = idle().with(Action::P1Fire);

    // 33 ms frames: 300 ms cooldown means the next shot comes on frame 11
    for _ in 0..10 {
        s.advance_frame(&fire, &mut Silent);
    }
    assert_eq!(shots_of(&s, Side::Player1), 1);
    s.advance_frame(&fire, &mut Silent);
    assert_eq!(shots_of(&s, Side::Player1), 2);
    assert_eq!(shots_of(&s, Side::Player2), 0);
}

#[test]
fn both_players_fire_in_the_same_frame() {
    let mut s = make_session();
    let input = idle().with(Action::P1Fire).with(Action::P2Fire);
    s.advance_frame(&input, &mut Silent);
    assert_eq!(shots_of(&s, Side::Player1), 1);
    assert_eq!(shots_of(&s, Side::Player2), 1);
}

#[test]
fn enemies_eventually_open_fire() {
    let mut s = make_session();
    let mut seen = false;
    // deadline is at most 2 s + 3 s of jitter
    for _ in 0..160 {
        s.advance_frame(&idle(), &mut Silent);
        seen |= shots_of(&s, Side::Enemy) > 0;
    }
    assert!(seen);
}

// ── movement and rotation ─────────────────────────────────────────────────────

#[test]
fn rotate_turns_once_per_press() {
    let mut s = make_session();
    let rotate = idle().with(Action::P1Rotate);

    for _ in 0..3 {
        s.advance_frame(&rotate, &mut Silent);
    }
    assert_eq!(s.player(PlayerId::One).orientation(), Orientation::Left);
    assert_eq!(s.player(PlayerId::Two).orientation(), Orientation::Forward);

    s.advance_frame(&idle(), &mut Silent);
    s.advance_frame(&rotate, &mut Silent);
    assert_eq!(s.player(PlayerId::One).orientation(), Orientation::Backward);
}

#[test]
fn thrust_moves_player_and_starts_engine() {
    let mut s = make_session();
    let mut cues: Vec<Cue> = Vec::new();
    let start = s.player(PlayerId::Two).position();

    for _ in 0..20 {
        s.advance_frame(&idle().with(Action::P2Right), &mut cues);
    }
    let p2 = s.player(PlayerId::Two);
    assert!(p2.position().x > start.x);
    assert_eq!(p2.position().y, start.y);
    assert!(cues.contains(&Cue::EngineStart));
}

// ── game over ─────────────────────────────────────────────────────────────────

#[test]
fn game_over_freezes_the_session() {
    let mut s = make_session();
    s.player_mut(PlayerId::Two).set_lives(0);
    s.player_mut(PlayerId::Two).set_score(5);
    assert_eq!(s.advance_frame(&idle(), &mut Silent), GameStatus::GameOver(Winner::Player2));

    let frame = s.frame();
    let enemy_at = s.enemies()[0].position();
    for _ in 0..5 {
        s.advance_frame(&idle().with(Action::P1Fire), &mut Silent);
    }
    assert_eq!(s.frame(), frame);
    assert_eq!(s.enemies()[0].position(), enemy_at);
    assert!(s.projectiles().is_empty());
}

// ── save / load ───────────────────────────────────────────────────────────────

#[test]
fn save_and_load_restore_both_players() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.sav");

    let mut s = make_session();
    s.player_mut(PlayerId::One).set_lives(4);
    s.player_mut(PlayerId::Two).set_score(9);
    s.player_mut(PlayerId::Two).set_position(Vec2::new(321.5, 222.0));
    s.save_to(&path).unwrap();

    let mut fresh = make_session();
    fresh.load_from(&path).unwrap();

    assert_eq!(fresh.save_record(), s.save_record());
    assert_eq!(fresh.player(PlayerId::One).lives(), 4);
    assert_eq!(fresh.player(PlayerId::Two).score(), 9);
    assert_eq!(fresh.player(PlayerId::Two).position(), Vec2::new(321.5, 222.0));
}

#[test]
fn failed_load_leaves_session_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.sav");
    std::fs::write(&path, "3\nlots\n").unwrap();

    let mut s = make_session();
    s.player_mut(PlayerId::One).set_score(6);
    let before = s.save_record();

    let err = s.load_from(&path).unwrap_err();
    assert!(matches!(err, GameError::Persistence(_)));
    assert!(!err.is_fatal());
    let err = s.load_from(&dir.path().join("missing.sav")).unwrap_err();
    assert!(matches!(err, GameError::Persistence(_)));

    assert_eq!(s.save_record(), before);
    assert_eq!(s.status(), GameStatus::Playing);
}

#[test]
fn loaded_ship_starts_at_rest() {
    let mut s = make_session();
    let p1 = s.player_mut(PlayerId::One);
    p1.set_velocity(Vec2::new(50.0, 0.0));
    p1.explode(&mut Silent);
    let record = s.save_record();

    s.apply_record(&record);
    let p1 = s.player(PlayerId::One);
    assert!(!p1.is_exploding());
    assert_eq!(p1.velocity(), Vec2::ZERO);
    assert_eq!(p1.engine_state(), EngineState::Stopped);

    s.advance_frame(&idle(), &mut Silent);
    assert_eq!(s.player(PlayerId::One).position(), record.p1_pos);
}

#[test]
fn loading_live_record_resumes_after_game_over() {
    let mut s = make_session();
    s.player_mut(PlayerId::One).set_lives(0);
    s.advance_frame(&idle(), &mut Silent);
    assert!(matches!(s.status(), GameStatus::GameOver(_)));

    let mut record = s.save_record();
    record.p1_lives = 2;
    s.apply_record(&record);
    assert_eq!(s.status(), GameStatus::Playing);

    record.p2_lives = 0;
    s.apply_record(&record);
    assert_eq!(s.status(), GameStatus::GameOver(Winner::Tie));
}

// ── drawing ───────────────────────────────────────────────────────────────────

#[test]
fn draw_order_is_back_to_front() {
    let mut s = make_session();
    s.spawn_projectile(Side::Enemy, Vec2::new(400.0, 300.0));
    s.spawn_projectile(Side::Player2, Vec2::new(500.0, 300.0));

    let mut list = DrawList::default();
    s.draw(&mut list).unwrap();

    let visuals: Vec<Visual> = list.calls.iter().map(|(v, _)| *v).collect();
    assert_eq!(visuals[0], Visual::Background);
    assert!(matches!(visuals[1], Visual::Player { id: PlayerId::One, .. }));
    assert!(matches!(visuals[2], Visual::Player { id: PlayerId::Two, .. }));
    assert_eq!(visuals[3], Visual::Projectile { owner: Side::Player2 });
    assert_eq!(visuals[4], Visual::Projectile { owner: Side::Enemy });
    assert_eq!(&visuals[5..8], &[Visual::Enemy; 3]);
    assert_eq!(&visuals[8..], &[Visual::Star; 3]);

    assert_eq!(list.presented, 1);
    let board = list.status.unwrap();
    assert_eq!(board.lives, [10, 10]);
    assert_eq!(board.status, GameStatus::Playing);
}

#[test]
fn ship_without_lives_is_not_drawn() {
    let mut s = make_session();
    s.player_mut(PlayerId::One).set_lives(0);
    s.advance_frame(&idle(), &mut Silent);
    assert!(matches!(s.status(), GameStatus::GameOver(_)));

    let mut list = DrawList::default();
    s.draw(&mut list).unwrap();
    let ships: Vec<Visual> = list
        .calls
        .iter()
        .map(|(v, _)| *v)
        .filter(|v| matches!(v, Visual::Player { .. }))
        .collect();
    assert_eq!(ships.len(), 1);
    assert!(matches!(ships[0], Visual::Player { id: PlayerId::Two, .. }));
}

#[test]
fn exploding_enemy_draws_explosion_where_it_was_hit() {
    let mut s = make_session();
    s.spawn_projectile(Side::Player1, Vec2::new(100.0, 112.0));
    s.advance_frame(&idle(), &mut Silent);

    // patrolled 3 units right before the hit, then jumped home
    let (visual, at) = s.enemies()[0].visual();
    assert_eq!(visual, Visual::Explosion { frame: 0, frame_count: 15 });
    assert_eq!(at, Vec2::new(103.0, 100.0));

    let mut list = DrawList::default();
    s.draw(&mut list).unwrap();
    let explosions = list
        .calls
        .iter()
        .filter(|(v, _)| matches!(v, Visual::Explosion { .. }))
        .count();
    assert_eq!(explosions, 2);
}

// ── determinism ───────────────────────────────────────────────────────────────

#[test]
fn same_seed_and_input_replay_identically() {
    let script = |frame: u64| {
        let mut input = InputSnapshot::new();
        if frame % 7 < 3 {
            input.press(Action::P1Left);
            input.press(Action::P2Fire);
        }
        if frame % 11 == 0 {
            input.press(Action::P1Fire);
        }
        input
    };

    let mut a = make_session();
    let mut b = make_session();
    for frame in 0..300 {
        a.advance_frame(&script(frame), &mut Silent);
        b.advance_frame(&script(frame), &mut Silent);
    }

    assert_eq!(a.save_record(), b.save_record());
    assert_eq!(a.projectiles().len(), b.projectiles().len());
    for (x, y) in a.enemies().iter().zip(b.enemies()) {
        assert_eq!(x.position(), y.position());
    }
    for (x, y) in a.stars().iter().zip(b.stars()) {
        assert_eq!(x.position(), y.position());
    }
}
