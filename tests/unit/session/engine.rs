use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::CanvasSize;
use crate::model::physics_spec::SystemKind;
use crate::render::canvas::{DisplayList, DrawCommand};
use crate::session::clock::ManualClock;

fn inputs() -> SessionInputs {
    let lines = (0..40)
        .map(|i| {
            let start = i as f64 * 4.5;
            LyricLine::new(format!("we burn the night {i}"), start, start + 4.0)
        })
        .collect();
    let spec = PhysicsSpec {
        system: SystemKind::Pressure,
        effect_pool: vec!["pressure".into(), "breathe".into(), "orbit".into()],
        logic_seed: 7,
        ..PhysicsSpec::default()
    };
    SessionInputs::new(lines, BeatGrid::synthetic(120.0, 180.0).unwrap(), spec, 180.0)
}

fn engine() -> PlaybackEngine {
    PlaybackEngine::new(inputs(), &EngineConfig::default()).unwrap()
}

fn list() -> DisplayList {
    DisplayList::new(CanvasSize::default())
}

fn frame_at(engine: &mut PlaybackEngine, t: f64) -> (FrameReport, DisplayList) {
    let mut dl = list();
    let report = engine.frame(&ManualClock::at(t), &mut dl);
    (report, dl)
}

#[test]
fn rejects_unsorted_lyrics() {
    let mut bad = inputs();
    bad.lines.swap(0, 1);
    assert!(PlaybackEngine::new(bad, &EngineConfig::default()).is_err());
}

#[test]
fn frames_draw_the_active_line() {
    let mut e = engine();
    let (report, dl) = frame_at(&mut e, 10.0);
    assert_eq!(report.line_index, Some(2));
    assert!(report.drawn);
    assert!(matches!(dl.commands()[0], DrawCommand::Clear(_)));
    let texts = dl.texts();
    assert!(texts.contains(&"burn"), "{texts:?}");
    assert!(report.effect.is_some());

    let (gap, _) = frame_at(&mut e, 4.2);
    assert_eq!(gap.line_index, None);
    assert_eq!(gap.effect, None);
}

#[test]
fn beats_feed_up_to_the_catchup_cap() {
    let mut e = engine();
    let (first, _) = frame_at(&mut e, 0.0);
    assert_eq!(first.fed_beats, 1);
    assert_eq!(e.beat_cursor(), 1);

    let (jump, _) = frame_at(&mut e, 60.0);
    assert_eq!(jump.beat_index, 121);
    assert_eq!(jump.fed_beats, 4);
    assert_eq!(jump.skipped_beats, 116);
    assert_eq!(e.beat_cursor(), 121);

    let (same, _) = frame_at(&mut e, 60.1);
    assert_eq!(same.fed_beats, 0);
}

#[test]
fn seeking_backwards_resets_physics_and_cursor() {
    let mut e = engine();
    for i in 0..40 {
        frame_at(&mut e, i as f64 * 0.25);
    }
    let (back, _) = frame_at(&mut e, 2.1);
    assert!(back.seeked);
    assert_eq!(back.fed_beats, 0);
    assert_eq!(e.beat_cursor(), 5);
    assert_eq!(back.beat_index, 5);
}

#[test]
fn hidden_sessions_keep_counting_beats_without_drawing() {
    let mut e = engine();
    e.update(PlaybackPatch {
        hidden: Some(true),
        ..PlaybackPatch::default()
    });
    let (report, dl) = frame_at(&mut e, 1.2);
    assert!(!report.drawn);
    assert!(dl.is_empty());
    assert_eq!(report.fed_beats, 3);
    assert!(e.is_hidden());
}

#[test]
fn final_hook_lines_get_the_finale_effect() {
    let mut i = inputs();
    i.hooks = vec![
        HookRegion {
            start: 30.0,
            end: 40.0,
            label: "a".into(),
        },
        HookRegion {
            start: 90.0,
            end: 100.0,
            label: "b".into(),
        },
    ];
    let mut e = PlaybackEngine::new(i, &EngineConfig::default()).unwrap();
    assert_eq!(e.hooks().len(), 2);
    let (finale, _) = frame_at(&mut e, 37.0);
    assert_eq!(finale.line_index, Some(8));
    assert_eq!(finale.effect.as_deref(), Some("fracture"));

    let (plain, _) = frame_at(&mut e, 50.0);
    let effect = plain.effect.unwrap();
    assert!(["pressure", "breathe", "orbit"].contains(&effect.as_str()), "{effect}");
}

#[test]
fn micro_surprise_fires_on_the_interval_beat() {
    let cfg = EngineConfig {
        micro_surprise_interval: 4,
        ..EngineConfig::default()
    };
    let mut e = PlaybackEngine::new(inputs(), &cfg).unwrap();
    let (on, _) = frame_at(&mut e, 1.55);
    assert_eq!(on.beat_index, 4);
    assert_eq!(on.surprise, Some(SurpriseKind::RgbSplit));

    let (off, _) = frame_at(&mut e, 1.9);
    assert_eq!(off.surprise, None);

    e.update(PlaybackPatch {
        micro_surprise_interval: Some(0),
        ..PlaybackPatch::default()
    });
    let (disabled, _) = frame_at(&mut e, 3.55);
    assert_eq!(disabled.surprise, None);
}

#[test]
fn overrides_replace_the_effective_spec() {
    let mut e = engine();
    e.update(PlaybackPatch {
        overrides: Some(SpecOverrides {
            palette: Some(vec!["#000000".into(), "#ff0000".into(), "#00ff00".into()]),
            system: Some(SystemKind::Orbit),
            energy: Some(2.0),
        }),
        ..PlaybackPatch::default()
    });
    assert_eq!(e.spec().system, SystemKind::Orbit);
    assert_eq!(e.spec().palette[1], "#ff0000");

    e.update(PlaybackPatch {
        overrides: Some(SpecOverrides::default()),
        ..PlaybackPatch::default()
    });
    assert_eq!(e.spec().system, SystemKind::Pressure);
}

#[test]
fn progress_bar_is_optional() {
    let mut shown = engine();
    let mut plain = engine();
    plain.update(PlaybackPatch {
        show_progress: Some(false),
        ..PlaybackPatch::default()
    });
    let (_, with) = frame_at(&mut shown, 20.0);
    let (_, without) = frame_at(&mut plain, 20.0);
    assert_eq!(with.len(), without.len() + 2);
}

#[test]
fn direction_swap_keeps_the_beat_cursor() {
    let mut e = engine();
    frame_at(&mut e, 30.0);
    let cursor = e.beat_cursor();

    let doc = CinematicDirection {
        thesis: "late arrival".into(),
        ..CinematicDirection::default()
    };
    e.set_direction(doc);
    assert_eq!(e.beat_cursor(), cursor);
    assert_eq!(e.interpreter().document().thesis, "late arrival");
    assert_eq!(e.interpreter().document().storyboard.len(), 40);

    let (report, _) = frame_at(&mut e, 30.2);
    assert!(!report.seeked);
}

#[test]
fn identical_sessions_draw_identical_frames() {
    let mut a = engine();
    let mut b = engine();
    for i in 0..30 {
        let t = i as f64 * 0.4;
        let (ra, la) = frame_at(&mut a, t);
        let (rb, lb) = frame_at(&mut b, t);
        assert_eq!(ra, rb);
        assert_eq!(la.fingerprint(), lb.fingerprint());
    }
}

#[test]
fn comments_appear_in_the_frame() {
    let mut i = inputs();
    i.comments = vec![("c1".into(), "so good".into())];
    let mut e = PlaybackEngine::new(i, &EngineConfig::default()).unwrap();
    e.push_comment("c2", "again!");
    assert_eq!(e.constellation().len(), 2);
    let (_, dl) = frame_at(&mut e, 5.0);
    let texts = dl.texts();
    assert!(texts.contains(&"so good") && texts.contains(&"again!"));
}

#[derive(Clone)]
struct SharedClock {
    inner: ManualClock,
    paused: Rc<Cell<bool>>,
}

impl AudioClock for SharedClock {
    fn current_time(&self) -> f64 {
        self.inner.current_time()
    }

    fn is_paused(&self) -> bool {
        self.inner.is_paused()
    }

    fn is_muted(&self) -> bool {
        self.inner.is_muted()
    }

    fn set_muted(&mut self, muted: bool) {
        self.inner.set_muted(muted);
    }

    fn play(&mut self) {
        self.inner.play();
        self.paused.set(false);
    }

    fn pause(&mut self) {
        self.inner.pause();
        self.paused.set(true);
    }
}

impl std::fmt::Debug for SharedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedClock").finish_non_exhaustive()
    }
}

#[test]
fn teardown_stops_frames_and_pauses_the_clock() {
    let mut session = PlaybackSession::new(engine(), ManualClock::at(3.0));
    session.play();
    assert!(!session.clock().is_paused());
    session.update(PlaybackPatch {
        muted: Some(true),
        ..PlaybackPatch::default()
    });
    assert!(session.clock().is_muted());

    let mut dl = list();
    assert!(session.frame(&mut dl).is_some());
    session.teardown();
    assert!(session.clock().is_paused());
    assert!(session.frame(&mut dl).is_none());
    session.play();
    assert!(session.clock().is_paused());
}

#[test]
fn dropping_a_session_pauses_its_clock() {
    let paused = Rc::new(Cell::new(true));
    let clock = SharedClock {
        inner: ManualClock::new(),
        paused: Rc::clone(&paused),
    };
    let mut session = PlaybackSession::new(engine(), clock);
    session.play();
    assert!(!paused.get());
    drop(session);
    assert!(paused.get());
}
