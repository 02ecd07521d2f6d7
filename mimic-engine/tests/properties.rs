use mimic_common::{HumanizeConfig, MimicError, Span};
use mimic_engine::{BehavioralEngine, KeyAction, Point, ScrollDirection, BACKSPACE};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn forced_overshoot() -> HumanizeConfig {
    HumanizeConfig {
        overshoot_chance: 1.0,
        ..HumanizeConfig::default()
    }
}

#[test]
fn paths_always_end_on_target() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    let start = Point::new(12.0, 700.0);
    for (x, y) in [(13.5, 700.0), (500.0, 300.0), (1919.0, 0.0), (-40.0, 2200.0)] {
        let end = Point::new(x, y);
        for allow_overshoot in [false, true] {
            let path = engine.generate_path(start, end, allow_overshoot);
            assert!(!path.is_empty());
            assert_eq!(*path.last().unwrap(), end);
        }
    }
}

#[test]
fn negligible_moves_collapse_to_target() {
    let engine = BehavioralEngine::new(forced_overshoot());
    let end = Point::new(300.0, 300.0);
    assert_eq!(engine.generate_path(end, end, true), vec![end]);
    assert_eq!(
        engine.generate_path(Point::new(300.5, 299.5), end, true),
        vec![end]
    );
}

#[test]
fn repeated_paths_differ() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    let start = Point::new(0.0, 0.0);
    let end = Point::new(800.0, 450.0);
    let first = engine.generate_path(start, end, true);
    let repeats = (0..5)
        .map(|_| engine.generate_path(start, end, true))
        .filter(|path| *path != first)
        .count();
    assert_eq!(repeats, 5);
}

#[test]
fn independent_engines_diverge() {
    let a = BehavioralEngine::new(HumanizeConfig::default());
    let b = BehavioralEngine::new(HumanizeConfig::default());
    let start = Point::new(0.0, 0.0);
    let end = Point::new(640.0, 360.0);
    assert_ne!(a.generate_path(start, end, true), b.generate_path(start, end, true));
}

#[test]
fn forced_overshoot_goes_past_then_returns() {
    let engine = BehavioralEngine::new(forced_overshoot());
    let start = Point::new(0.0, 0.0);
    let end = Point::new(500.0, 300.0);
    let distance = start.distance_to(end);

    for _ in 0..20 {
        let path = engine.generate_path(start, end, true);
        assert_eq!(*path.last().unwrap(), end);

        // Projection on the travel direction beyond the target's own.
        let (ux, uy) = (end.x / distance, end.y / distance);
        let furthest = path
            .iter()
            .map(|p| p.x * ux + p.y * uy)
            .fold(f64::MIN, f64::max);
        assert!(furthest > distance + 1.0, "no overshoot: {furthest} <= {distance}");

        let farthest_after_start = path
            .iter()
            .skip(path.len() / 2)
            .map(|p| p.distance_to(end))
            .fold(0.0, f64::max);
        assert!(farthest_after_start > path.last().unwrap().distance_to(end));
    }
}

#[test]
fn typing_without_typos_is_verbatim() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    assert!(engine.generate_typing("", None, None).is_empty());

    let text = "Thanks for connecting, Ana!";
    let actions = engine.generate_typing(text, Some(Span::new(40, 80)), Some(0.0));
    assert_eq!(actions.len(), text.chars().count());
    let typed: String = actions.iter().filter_map(KeyAction::character).collect();
    assert_eq!(typed, text);
    assert!(!typed.contains(BACKSPACE));
}

#[test]
fn typing_with_certain_typos_corrects_every_mistake() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    let text = "Quick 42!";
    let chars: Vec<char> = text.chars().collect();
    let actions = engine.generate_typing(text, Some(Span::new(60, 60)), Some(1.0));
    assert_eq!(actions.len(), 4 * (chars.len() - 1) + 1);

    for (i, group) in actions.chunks(4).enumerate().take(chars.len() - 1) {
        assert!(matches!(group[0], KeyAction::Key { .. }));
        assert!(matches!(group[1], KeyAction::Pause { .. }));
        assert!(group[2].is_backspace());
        assert_eq!(group[3].character(), Some(chars[i]));
    }

    let corrected: String = actions
        .chunks(4)
        .map(|group| group.last().and_then(KeyAction::character).unwrap())
        .collect();
    assert_eq!(corrected, text);
}

#[test]
fn scroll_sums_to_requested_distance() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    for (direction, sign) in [(ScrollDirection::Forward, 1), (ScrollDirection::Backward, -1)] {
        for distance in [1_i64, 120, 999, 5000] {
            let actions = engine.generate_scroll(direction, distance, Some(Span::new(40, 160)));
            let total: i64 = actions.iter().map(|a| i64::from(a.distance)).sum();
            assert_eq!(total, sign * distance);
            assert!(actions.last().unwrap().is_pause());
        }
        assert!(engine
            .generate_scroll(direction, 0, Some(Span::new(40, 160)))
            .is_empty());
    }
}

#[test]
fn oversized_scroll_request_stays_small() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    let actions = engine.generate_scroll(
        ScrollDirection::Forward,
        i64::from(u32::MAX),
        Some(Span::new(1, 1)),
    );
    assert!(actions.len() <= 513, "{} actions", actions.len());
    let total: i64 = actions.iter().map(|a| i64::from(a.distance)).sum();
    assert_eq!(total, i64::from(i32::MAX));
}

#[tokio::test]
async fn sleep_with_zero_variance_is_close_to_base() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    let cancel = CancellationToken::new();
    let started = std::time::Instant::now();
    engine.sleep(Some(0.05), Some(0.0), &cancel).await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(49), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(500), "{elapsed:?}");
}

#[tokio::test]
async fn cancelled_sleep_returns_early() {
    let engine = BehavioralEngine::new(HumanizeConfig::default());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = engine.sleep(Some(5.0), Some(0.0), &cancel).await;
    assert!(matches!(outcome, Err(MimicError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}
