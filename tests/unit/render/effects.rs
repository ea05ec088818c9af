use super::*;
use crate::foundation::core::CanvasSize;
use crate::render::canvas::{DisplayList, DrawCommand};

fn words(texts: &[&str]) -> Vec<StyledWord> {
    texts
        .iter()
        .map(|t| StyledWord {
            text: (*t).to_owned(),
            class: WordClass::Neutral,
            color: Rgba::opaque(Rgb::WHITE),
        })
        .collect()
}

fn state<'a>(words: &'a [StyledWord], physics: &'a PhysicsState) -> EffectState<'a> {
    EffectState {
        line_index: 3,
        words,
        line_progress: 0.5,
        time_s: 12.0,
        center: Point::new(540.0, 960.0),
        font_size: 64.0,
        palette: [Rgb::BLACK, Rgb::new(233, 69, 96), Rgb::WHITE],
        physics,
        entry_style: "fade",
        exit_style: "fade",
        intensity: 0.5,
        seed: 42,
    }
}

fn list() -> DisplayList {
    DisplayList::new(CanvasSize::default())
}

#[test]
fn builtin_registry_has_every_effect() {
    let reg = EffectRegistry::builtin();
    for key in [
        "resolve",
        "fracture",
        "pressure",
        "breathe",
        "ember",
        "orbit",
        "typewriter",
        "glitch",
    ] {
        assert!(reg.contains(key), "{key}");
    }
    assert!(reg.contains("  Glitch "));
    assert!(!reg.contains("nope"));
    assert_eq!(reg.keys().count(), 8);
}

#[test]
fn unknown_keys_fall_back_to_resolve() {
    let reg = EffectRegistry::builtin();
    let ws = words(&["hello", "world"]);
    let physics = PhysicsState::default();
    let s = state(&ws, &physics);

    let mut a = list();
    reg.get("does-not-exist")(&mut a, &s);
    let mut b = list();
    reg.get("resolve")(&mut b, &s);
    assert_eq!(a.commands(), b.commands());
    assert_eq!(a.texts(), vec!["hello", "world"]);
}

#[test]
fn register_overrides_by_normalized_key() {
    fn nothing(_: &mut dyn Canvas2d, _: &EffectState<'_>) {}
    let mut reg = EffectRegistry::builtin();
    reg.register(" ORBIT", nothing);
    let ws = words(&["x"]);
    let physics = PhysicsState::default();
    let mut dl = list();
    reg.get("orbit")(&mut dl, &state(&ws, &physics));
    assert!(dl.is_empty());
}

#[test]
fn selection_prefers_hook_finale_then_explicit_then_pool() {
    let pool: Vec<String> = ["a", "b", "c"].iter().map(|s| (*s).to_owned()).collect();
    assert_eq!(select_effect_key(Some("glitch"), &pool, 5, 2, true), "fracture");
    assert_eq!(select_effect_key(Some("glitch"), &pool, 5, 2, false), "glitch");
    assert_eq!(select_effect_key(Some("  "), &pool, 5, 2, false), "b");
    // (5 + 2 * 7) % 3 == 1
    assert_eq!(select_effect_key(None, &pool, 5, 2, false), "b");
    assert_eq!(select_effect_key(None, &[], 5, 2, false), "resolve");
    assert_eq!(select_effect_key(None, &pool, u32::MAX, usize::MAX / 8, false).len(), 1);
}

#[test]
fn hook_finals_are_last_lines_starting_in_each_hook() {
    let lines: Vec<LyricLine> = (0..10)
        .map(|i| LyricLine::new(format!("l{i}"), i as f64 * 3.0, i as f64 * 3.0 + 2.5))
        .collect();
    let hooks = vec![
        HookRegion {
            start: 0.0,
            end: 10.0,
            label: "a".into(),
        },
        HookRegion {
            start: 14.0,
            end: 24.0,
            label: "b".into(),
        },
        HookRegion {
            start: 100.0,
            end: 110.0,
            label: "c".into(),
        },
    ];
    assert_eq!(hook_final_lines(&lines, &hooks), vec![3, 7]);
}

#[test]
fn envelope_fades_in_and_out() {
    assert_eq!(envelope("fade", "fade", 0.0).alpha, 0.0);
    assert_eq!(envelope("fade", "fade", 0.5).alpha, 1.0);
    assert_eq!(envelope("fade", "fade", 1.0).alpha, 0.0);
    assert_eq!(envelope("cut", "cut", 0.0).alpha, 1.0);
    assert!(envelope("rise", "fade", 0.02).rise > 0.0);
    assert!(envelope("slam", "fade", 0.0).scale > 1.0);
    assert!(envelope("fade", "sink", 0.98).rise < 0.0);
    assert_eq!(envelope("fade", "fade", f64::NAN).alpha, 0.0);
}

#[test]
fn every_effect_draws_finite_commands_under_stress() {
    let reg = EffectRegistry::builtin();
    let ws = words(&["burn", "it", "all", "down"]);
    let physics = PhysicsState {
        shake: 1.0,
        glow: 1.0,
        heat: 1.0,
        shatter: 1.0,
        blur: 8.0,
        is_fractured: true,
        word_offsets: vec![Vec2::new(3.0, -2.0); 4],
        ..PhysicsState::default()
    };
    let keys: Vec<String> = reg.keys().map(str::to_owned).collect();
    for key in keys {
        let mut dl = list();
        reg.get(&key)(&mut dl, &state(&ws, &physics));
        assert!(!dl.is_empty(), "{key} drew nothing");
        for cmd in dl.commands() {
            if let DrawCommand::Text { origin, size_px, .. } = cmd {
                assert!(origin.x.is_finite() && origin.y.is_finite() && size_px.is_finite());
            }
        }
    }
}

#[test]
fn effects_are_deterministic() {
    let reg = EffectRegistry::builtin();
    let ws = words(&["stars", "fall"]);
    let physics = PhysicsState {
        shatter: 0.7,
        heat: 0.4,
        ..PhysicsState::default()
    };
    for key in ["fracture", "ember", "glitch"] {
        let mut a = list();
        let mut b = list();
        reg.get(key)(&mut a, &state(&ws, &physics));
        reg.get(key)(&mut b, &state(&ws, &physics));
        assert_eq!(a.fingerprint(), b.fingerprint(), "{key}");
    }
}

#[test]
fn typewriter_reveals_words_progressively() {
    let reg = EffectRegistry::builtin();
    let ws = words(&["one", "two", "three"]);
    let physics = PhysicsState::default();
    let mut s = state(&ws, &physics);
    s.entry_style = "cut";

    s.line_progress = 0.2;
    let mut early = list();
    reg.get("typewriter")(&mut early, &s);
    s.line_progress = 0.8;
    let mut late = list();
    reg.get("typewriter")(&mut late, &s);
    assert!(early.texts().len() < late.texts().len());
    assert_eq!(late.texts(), vec!["one", "two", "three"]);
}

#[test]
fn icons_follow_position_and_style() {
    let ws = words(&["fire"]);
    let physics = PhysicsState::default();
    let s = state(&ws, &physics);
    let mut entry = StoryboardEntry::neutral(3);

    let mut dl = list();
    draw_icon(&mut dl, &entry, &s);
    assert!(dl.is_empty());

    entry.icon_glyph = Some("🔥".into());
    entry.icon_position = Some("above".into());
    entry.icon_style = Some("filled".into());
    let mut dl = list();
    draw_icon(&mut dl, &entry, &s);
    let DrawCommand::Text { origin, color, .. } = &dl.commands()[0] else {
        panic!("expected icon text");
    };
    assert!(origin.y < s.center.y);
    assert_eq!(color.rgb, s.palette[1]);

    entry.icon_position = Some("behind".into());
    entry.icon_scale = Some(f64::NAN);
    let mut dl = list();
    draw_icon(&mut dl, &entry, &s);
    let DrawCommand::Text { origin, size_px, .. } = &dl.commands()[0] else {
        panic!("expected icon text");
    };
    assert_eq!(*origin, s.center);
    assert!((size_px - s.font_size * 1.4).abs() < 1e-9);
}
