use super::*;
use crate::model::direction::{StoryboardEntry, WordDirective};

fn setup(texts: &[&str]) -> (CinematicDirection, Vec<LyricLine>) {
    let lines: Vec<LyricLine> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| LyricLine::new(*t, i as f64 * 3.0, i as f64 * 3.0 + 2.5))
        .collect();
    let doc = CinematicDirection {
        storyboard: (0..lines.len()).map(StoryboardEntry::neutral).collect(),
        ..CinematicDirection::default()
    };
    (doc, lines)
}

fn icon_indices(doc: &CinematicDirection) -> Vec<usize> {
    (0..doc.storyboard.len())
        .filter(|&i| doc.storyboard[i].has_icon())
        .collect()
}

#[test]
fn vocabulary_is_sorted_and_searchable() {
    assert!(VOCABULARY.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(lookup_icon("FIRE!").map(|g| g.glyph), Some("🔥"));
    assert!(lookup_icon("xylophone").is_none());
}

#[test]
fn spacing_formula() {
    assert_eq!(icon_spacing(20, 10), 2);
    assert_eq!(icon_spacing(60, 10), 5);
    assert_eq!(icon_spacing(3, 10), 2);
}

#[test]
fn reaches_target_with_spacing_when_matches_are_spread() {
    let texts: Vec<String> = (0..24)
        .map(|i| if i % 2 == 1 { format!("plain words {i}") } else { format!("the fire {i}") })
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let (mut doc, lines) = setup(&refs);
    let plan = plan_icons(&mut doc, &lines, &IconPlannerConfig::default());
    let icons = icon_indices(&doc);
    assert!(icons.len() >= 10);
    assert!(!plan.relaxed);
    for w in icons.windows(2) {
        assert!(w[1] - w[0] >= plan.spacing);
    }
    let e = &doc.storyboard[icons[0]];
    assert_eq!(e.icon_position.as_deref(), Some("behind"));
    assert_eq!(e.icon_scale, Some(2.2));
}

#[test]
fn clustered_matches_require_relaxation() {
    let mut texts = vec!["nothing here"; 40];
    for t in texts.iter_mut().take(12) {
        *t = "stars above";
    }
    let (mut doc, lines) = setup(&texts);
    let plan = plan_icons(&mut doc, &lines, &IconPlannerConfig::default());
    assert_eq!(plan.spacing, 3);
    assert!(plan.relaxed);
    assert_eq!(icon_indices(&doc).len(), 10);
}

#[test]
fn existing_icons_count_and_constrain_spacing() {
    let texts = vec!["fire fire"; 30];
    let (mut doc, lines) = setup(&texts);
    doc.storyboard[5].icon_glyph = Some("★".to_owned());
    let cfg = IconPlannerConfig {
        min_icons: 4,
        ..IconPlannerConfig::default()
    };
    let plan = plan_icons(&mut doc, &lines, &cfg);
    assert_eq!(plan.added.len(), 3);
    assert_eq!(plan.spacing, 5);
    for &i in &plan.added {
        assert!(i.abs_diff(5) >= 5);
    }
    assert_eq!(doc.storyboard[5].icon_glyph.as_deref(), Some("★"));
}

#[test]
fn enough_existing_icons_is_a_no_op() {
    let (mut doc, lines) = setup(&["fire"; 12]);
    for e in doc.storyboard.iter_mut().take(10) {
        e.icon_glyph = Some("x".to_owned());
    }
    let before = doc.clone();
    let plan = plan_icons(&mut doc, &lines, &IconPlannerConfig::default());
    assert!(plan.added.is_empty());
    assert_eq!(doc, before);
}

#[test]
fn hero_and_directive_words_win_ordering() {
    let texts = ["moon and rain", "rain again", "rain once more"];
    let (mut doc, lines) = setup(&texts);
    doc.storyboard[2].hero_word = Some("Rain".to_owned());
    doc.word_directives.insert("moon", WordDirective::default());
    let cfg = IconPlannerConfig {
        min_icons: 2,
        ..IconPlannerConfig::default()
    };
    let plan = plan_icons(&mut doc, &lines, &cfg);
    assert_eq!(plan.added, vec![0, 2]);
    assert_eq!(doc.storyboard[0].icon_glyph.as_deref(), Some("🌙"));
}

#[test]
fn planning_is_deterministic() {
    let texts: Vec<String> = (0..30).map(|i| format!("love {i} night")).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let (doc, lines) = setup(&refs);
    let (mut a, mut b) = (doc.clone(), doc);
    let pa = plan_icons(&mut a, &lines, &IconPlannerConfig::default());
    let pb = plan_icons(&mut b, &lines, &IconPlannerConfig::default());
    assert_eq!(pa, pb);
    assert_eq!(a, b);
}
