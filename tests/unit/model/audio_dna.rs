use super::*;
use serde_json::json;

fn region(start: f64, end: f64) -> HookRegion {
    HookRegion {
        start,
        end,
        label: "chorus".to_owned(),
    }
}

fn assert_well_formed(hooks: &[HookRegion], duration: f64, cfg: &HookConfig) {
    assert_eq!(hooks.len(), 2);
    assert!(!hooks[0].overlaps(&hooks[1]));
    assert!(hooks[0].start <= hooks[1].start);
    for h in hooks {
        assert!(h.start >= 0.0 && h.end <= duration + 1e-9);
        assert!(h.len() >= cfg.min_len_s - 1e-9 && h.len() <= cfg.max_len_s + 1e-9);
    }
}

#[test]
fn single_hook_gets_a_second_after_it() {
    let cfg = HookConfig::default();
    let hooks = normalize_hooks(&[region(30.0, 40.0)], 180.0, &cfg);
    assert_well_formed(&hooks, 180.0, &cfg);
    assert_eq!(hooks[0], region(30.0, 40.0));
    assert_eq!(hooks[1].start, 42.0);
    assert_eq!(hooks[1].end, 52.0);
}

#[test]
fn single_hook_at_the_end_gets_a_second_before_it() {
    let cfg = HookConfig::default();
    let hooks = normalize_hooks(&[region(170.0, 180.0)], 180.0, &cfg);
    assert_well_formed(&hooks, 180.0, &cfg);
    assert_eq!(hooks[1], region(170.0, 180.0));
    assert_eq!(hooks[0].end, 168.0);
}

#[test]
fn lengths_are_clamped_into_range() {
    let cfg = HookConfig::default();
    let hooks = normalize_hooks(&[region(10.0, 12.0), region(50.0, 90.0)], 180.0, &cfg);
    assert_well_formed(&hooks, 180.0, &cfg);
    assert_eq!(hooks[0].len(), 8.0);
    assert_eq!(hooks[1].len(), 12.0);
}

#[test]
fn overlapping_and_extra_hooks_are_dropped() {
    let cfg = HookConfig::default();
    let hooks = normalize_hooks(
        &[region(20.0, 30.0), region(25.0, 35.0), region(60.0, 70.0), region(90.0, 100.0)],
        180.0,
        &cfg,
    );
    assert_well_formed(&hooks, 180.0, &cfg);
    assert_eq!(hooks[0].start, 20.0);
    assert_eq!(hooks[1].start, 60.0);
}

#[test]
fn no_hooks_and_bad_duration_still_yield_two() {
    let cfg = HookConfig::default();
    let hooks = normalize_hooks(&[region(f64::NAN, 3.0)], f64::NAN, &cfg);
    assert_eq!(hooks.len(), 2);
    assert!(!hooks[0].overlaps(&hooks[1]));
}

#[test]
fn short_song_is_split_in_halves() {
    let cfg = HookConfig::default();
    let hooks = normalize_hooks(&[region(0.0, 10.0)], 10.0, &cfg);
    assert_eq!(hooks.len(), 2);
    assert!(!hooks[0].overlaps(&hooks[1]));
    assert_eq!(hooks[0].start, 0.0);
    assert_eq!(hooks[1].end, 10.0);
}

#[test]
fn lenient_decode_and_effective_spec() {
    let v = json!({
        "hottest_hooks": [{ "start": 10, "end": 20, "label": "drop" }, { "start": "x" }],
        "mood": "euphoric",
        "physics_spec": { "system": "combustion", "logic_seed": 5 },
        "typographyProfile": { "fontFamily": "Bebas" },
        "lexicon": ["fire", "night"]
    });
    let (dna, dropped) = AudioDna::from_value_lenient(&v);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dna.hottest_hooks.len(), 1);
    assert_eq!(dna.mood, "euphoric");
    let spec = dna.effective_spec();
    assert_eq!(spec.logic_seed, 5);
    assert_eq!(spec.typography_profile.font_family, "Bebas");
}

#[test]
fn fallback_is_playable() {
    let cfg = HookConfig::default();
    let dna = AudioDna::fallback(120.0, 9, &cfg);
    assert_well_formed(&dna.hottest_hooks, 120.0, &cfg);
    assert_eq!(dna.physics_spec.logic_seed, 9);
}
