use super::*;

#[test]
fn partial_json_keeps_defaults() {
    let cfg: EngineConfig = serde_json::from_str(
        r#"{"tick_hz": 120, "diversity": {"history_cap": 5}, "canvas": {"width": 720, "height": 1280}}"#,
    )
    .unwrap();
    assert_eq!(cfg.tick_hz, 120.0);
    assert_eq!(cfg.diversity.history_cap, 5);
    assert_eq!(cfg.diversity.min_rgb_distance, 60.0);
    assert_eq!(cfg.canvas.width, 720);
    assert_eq!(cfg.micro_surprise_interval, 16);
    assert_eq!(cfg.retry.max_attempts, 2);
    assert_eq!(cfg.hooks.min_len_s, 8.0);
    cfg.validate().unwrap();
}

#[test]
fn empty_object_is_the_default_config() {
    let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, EngineConfig::default());
    cfg.validate().unwrap();
}

#[test]
fn validate_rejects_bad_values() {
    let cfg = EngineConfig {
        tick_hz: 0.0,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());

    let mut cfg = EngineConfig::default();
    cfg.hooks.max_len_s = 4.0;
    assert!(cfg.validate().is_err());

    let mut cfg = EngineConfig::default();
    cfg.canvas.width = 0;
    assert!(cfg.validate().is_err());

    let cfg = EngineConfig {
        micro_surprise_window_s: f64::NAN,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reports_missing_files() {
    let err = EngineConfig::from_path(std::path::Path::new("/nonexistent/hookdance.json"))
        .unwrap_err();
    assert!(err.to_string().contains("read engine config"));
}

#[test]
fn font_path_selects_the_face() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.fonts().unwrap().family(), FontBook::bundled().family());

    let cfg: EngineConfig =
        serde_json::from_str(r#"{"font_path": "/nonexistent/face.ttf"}"#).unwrap();
    let err = cfg.fonts().unwrap_err();
    assert!(err.to_string().contains("read font"));
}
