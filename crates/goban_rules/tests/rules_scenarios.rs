use goban_rules::{
    Color, GameError, GameRecord, IllegalMove, Match, MatchConfig, MatchSeed, Move, MoveOutcome,
    Point,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::time::Instant;

fn untimed(size: usize) -> MatchConfig {
    MatchConfig {
        board_size: size,
        main_time_secs: 0,
        overtime_secs: 0,
        overtime_periods: 0,
        ..MatchConfig::between("alice", "bob")
    }
}

fn play(m: &mut Match, x: usize, y: usize) -> Result<MoveOutcome, GameError> {
    let color = m.game().to_move();
    m.play(color, Move::Place(Point::new(x, y)), Instant::now())
}

fn pass(m: &mut Match) {
    let color = m.game().to_move();
    m.play(color, Move::Pass, Instant::now()).unwrap();
}

/// Black and white stones arranged so that (1,1) and (2,1) form a ko.
fn ko_position() -> Match {
    let mut m = Match::new(&untimed(9), Instant::now()).unwrap();
    for (x, y) in [(1, 2), (2, 2), (0, 1), (3, 1), (1, 0), (2, 0), (8, 8), (1, 1)] {
        play(&mut m, x, y).unwrap();
    }
    m
}

#[test]
fn lone_stone_is_captured() {
    let mut m = Match::new(&untimed(9), Instant::now()).unwrap();
    play(&mut m, 4, 5).unwrap();
    play(&mut m, 4, 4).unwrap();
    play(&mut m, 3, 4).unwrap();
    pass(&mut m);
    play(&mut m, 5, 4).unwrap();
    pass(&mut m);
    let outcome = play(&mut m, 4, 3).unwrap();

    assert_eq!(outcome, MoveOutcome::Placed { captured: 1 });
    assert_eq!(m.game().captures().black, 1);
    assert_eq!(m.game().board().get(Point::new(4, 4)), None);
}

#[test]
fn capture_takes_precedence_over_suicide() {
    let mut m = ko_position();
    // (2,1) has no empty neighbour but removes the white stone at (1,1).
    let outcome = play(&mut m, 2, 1).unwrap();
    assert_eq!(outcome, MoveOutcome::Placed { captured: 1 });
    assert_eq!(m.game().board().get(Point::new(2, 1)), Some(Color::Black));
}

#[test]
fn ko_retake_is_rolled_back_exactly() {
    let mut m = ko_position();
    play(&mut m, 2, 1).unwrap();
    let board_before = m.game().board().clone();
    let captures_before = m.game().captures();
    let history_before = m.game().history().len();

    let err = play(&mut m, 1, 1).unwrap_err();
    assert_eq!(err, GameError::IllegalMove(IllegalMove::KoViolation));
    assert_eq!(m.game().board(), &board_before);
    assert_eq!(m.game().captures(), captures_before);
    assert_eq!(m.game().history().len(), history_before);
    assert_eq!(m.game().to_move(), Color::White);
}

/// Two independent kos on the bottom edge, black holding both.
///
/// Ko A turns on (1,1)/(2,1), ko B on (6,1)/(7,1). White is to move.
fn double_ko_position() -> Match {
    let mut m = Match::new(&untimed(9), Instant::now()).unwrap();
    let setup = [
        (1, 2), (2, 2), (0, 1), (3, 1), (1, 0), (2, 0),
        (6, 2), (7, 2), (5, 1), (8, 1), (6, 0), (7, 0),
        (2, 1),
    ];
    for (x, y) in setup {
        play(&mut m, x, y).unwrap();
    }
    pass(&mut m);
    play(&mut m, 7, 1).unwrap();
    m
}

#[test]
fn superko_catches_a_cycle_longer_than_a_retake() {
    let mut m = double_ko_position();
    let start = m.game().board().clone();

    // White takes ko A, black waits, white takes ko B, black retakes A.
    assert_eq!(play(&mut m, 1, 1).unwrap(), MoveOutcome::Placed { captured: 1 });
    pass(&mut m);
    assert_eq!(play(&mut m, 6, 1).unwrap(), MoveOutcome::Placed { captured: 1 });
    assert_eq!(play(&mut m, 2, 1).unwrap(), MoveOutcome::Placed { captured: 1 });
    pass(&mut m);

    // Retaking B is not an immediate retake, but it would rebuild `start`.
    let board_before = m.game().board().clone();
    let captures_before = m.game().captures();
    let moves_before = m.game().moves().len();
    let err = play(&mut m, 7, 1).unwrap_err();

    assert_eq!(err, GameError::IllegalMove(IllegalMove::KoViolation));
    assert_ne!(&board_before, &start);
    assert_eq!(m.game().board(), &board_before);
    assert_eq!(m.game().captures(), captures_before);
    assert_eq!(m.game().moves().len(), moves_before);
    assert_eq!(m.game().to_move(), Color::Black);
}

#[test]
fn stones_are_never_double_counted() {
    let mut rng = Pcg64::seed_from_u64(7);
    let mut m = Match::new(&untimed(7), Instant::now()).unwrap();
    let mut placed = 0;

    for _ in 0..2_000 {
        let x = rng.gen_range(0..7);
        let y = rng.gen_range(0..7);
        if play(&mut m, x, y).is_ok() {
            placed += 1;
        }
        let game = m.game();
        let captures = game.captures();
        let live = game.board().count(Color::Black) + game.board().count(Color::White);
        assert_eq!(captures.black + captures.white + live, placed);
    }
    assert!(placed > 0);
}

#[test]
fn finalize_is_idempotent() {
    let mut m = Match::new(&untimed(5), Instant::now()).unwrap();
    for y in 0..5 {
        play(&mut m, 1, y).unwrap();
        play(&mut m, 3, y).unwrap();
    }
    pass(&mut m);
    pass(&mut m);

    let first = m.finalize_score().unwrap();
    let second = m.finalize_score().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.black, 10.0);
    assert_eq!(first.white, 16.5);
    assert_eq!(m.result().unwrap().winner, Some(Color::White));
}

#[test]
fn record_round_trip_restores_position() {
    let mut m = Match::new(&untimed(9), Instant::now()).unwrap();
    play(&mut m, 4, 4).unwrap();
    play(&mut m, 0, 0).unwrap();
    pass(&mut m);
    play(&mut m, 8, 8).unwrap();
    m.resign(Color::Black).unwrap();

    let text = m.to_record().to_string();
    assert!(text.contains("SZ[9]"));
    assert!(text.contains(";B[ee]"));
    // Engine row 0 is the bottom row, archive row 'i' on a 9x9 board.
    assert!(text.contains(";W[ai]"));
    assert!(text.contains(";W[ia]"));
    assert!(text.contains("RE[W+R]"));

    let record = GameRecord::parse(&text).unwrap();
    assert_eq!(record.moves, m.game().moves());

    let mut replayed = Match::new(&untimed(9), Instant::now()).unwrap();
    replayed
        .apply_seed(&MatchSeed::Record(text), Instant::now())
        .unwrap();
    assert_eq!(replayed.game().board(), m.game().board());
    assert_eq!(replayed.game().to_move(), Color::Black);
}
