use super::*;
use crate::generation::gateway::GatewayError;

#[derive(Default)]
struct Recording {
    replies: Vec<Result<String, GatewayError>>,
    notes: Vec<Option<String>>,
    attachments: Vec<usize>,
}

impl GenerationGateway for Recording {
    fn complete(&mut self, request: &GatewayRequest) -> Result<String, GatewayError> {
        self.notes.push(request.corrective_note.clone());
        self.attachments
            .push(request.attachment.as_ref().map_or(0, Vec::len));
        if self.replies.is_empty() {
            return Err(GatewayError::Unavailable("script exhausted".into()));
        }
        self.replies.remove(0)
    }
}

fn scripted(replies: &[&str]) -> Recording {
    Recording {
        replies: replies.iter().map(|r| Ok((*r).to_owned())).collect(),
        ..Recording::default()
    }
}

fn lines() -> Vec<LyricLine> {
    (0..6)
        .map(|i| LyricLine::new(format!("line {i}"), i as f64 * 4.0, i as f64 * 4.0 + 3.5))
        .collect()
}

fn dna_text(palette: [&str; 3]) -> String {
    serde_json::json!({
        "hottest_hooks": [
            {"start": 30.0, "end": 40.0, "label": "chorus"},
            {"start": 90.0, "end": 100.0, "label": "bridge"}
        ],
        "description": "slow burn",
        "mood": "defiant",
        "world": "neon rain",
        "physics_spec": {"system": "pressure", "palette": palette},
        "lexicon": ["fire", "rain"]
    })
    .to_string()
}

fn audio_request<'a>(lines: &'a [LyricLine]) -> AudioDnaRequest<'a> {
    AudioDnaRequest {
        title: "Song",
        artist: "Artist",
        lines,
        beat_grid: None,
        duration_s: 180.0,
        audio: &[1, 2, 3, 4],
    }
}

#[test]
fn direction_text_is_ingested() {
    let lines = lines();
    let text = "```json\n{\"thesis\": \"a city wakes\", \"chapters\": [],}\n```";
    let mut svc = GenerationService::with_config(scripted(&[text]), &EngineConfig::default());
    let req = DirectionRequest {
        title: "Song",
        artist: "Artist",
        lines: &lines,
        beat_grid: None,
        scene_context: Some("rooftop"),
    };
    let outcome = svc.generate_direction(&req).unwrap();
    let doc = outcome.document().expect("parsed document");
    assert_eq!(doc.thesis, "a city wakes");
    assert_eq!(doc.storyboard.len(), lines.len());
}

#[test]
fn unparseable_direction_is_not_an_error() {
    let lines = lines();
    let mut svc =
        GenerationService::with_config(scripted(&["no json here"]), &EngineConfig::default());
    let req = DirectionRequest {
        title: "Song",
        artist: "Artist",
        lines: &lines,
        beat_grid: None,
        scene_context: None,
    };
    let outcome = svc.generate_direction(&req).unwrap();
    assert!(matches!(outcome, DirectionOutcome::Unparseable(ref raw) if raw == "no json here"));
}

#[test]
fn transport_failures_surface_with_their_status() {
    let lines = lines();
    let gw = Recording {
        replies: vec![Err(GatewayError::QuotaExhausted)],
        ..Recording::default()
    };
    let mut svc = GenerationService::with_config(gw, &EngineConfig::default());
    let err = svc.generate_audio_dna(&audio_request(&lines)).unwrap_err();
    let crate::DanceError::Gateway(gateway) = &err else {
        panic!("expected gateway error, got {err}");
    };
    assert_eq!(gateway.status(), "quota_exhausted");
    assert!(svc.history().is_empty());
}

#[test]
fn clean_audio_dna_is_ok_and_remembered() {
    let lines = lines();
    let text = dna_text(["#101010", "#e94560", "#f0f0f0"]);
    let mut svc = GenerationService::with_config(scripted(&[&text]), &EngineConfig::default());
    let outcome = svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    assert_eq!(outcome.kind(), "ok");
    assert_eq!(outcome.dna().hottest_hooks.len(), 2);
    assert_eq!(outcome.dna().mood, "defiant");
    assert_eq!(svc.history().len(), 1);
    assert_eq!(svc.gateway_mut().attachments, vec![4]);
}

#[test]
fn single_hook_is_completed_to_two() {
    let lines = lines();
    let text = r#"{"hottest_hooks": [{"start": 20, "end": 30, "label": "hook"}], "mood": "calm"}"#;
    let mut svc = GenerationService::with_config(scripted(&[text]), &EngineConfig::default());
    let outcome = svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    assert_eq!(outcome.kind(), "partial");
    let hooks = &outcome.dna().hottest_hooks;
    assert_eq!(hooks.len(), 2);
    assert!(!hooks[0].overlaps(&hooks[1]));
}

#[test]
fn garbage_audio_dna_uses_the_canned_document() {
    let lines = lines();
    let mut svc =
        GenerationService::with_config(scripted(&["sorry, I can't"]), &EngineConfig::default());
    let outcome = svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    assert!(outcome.is_fallback());
    assert_eq!(outcome.dna().hottest_hooks.len(), 2);
    assert!(svc.history().is_empty());
}

#[test]
fn similar_palette_is_resubmitted_with_a_note() {
    let lines = lines();
    let first = dna_text(["#101010", "#e94560", "#f0f0f0"]);
    let close = dna_text(["#121212", "#ea4662", "#eeeeee"]);
    let fresh = dna_text(["#ffffff", "#0044ff", "#000000"]);
    let mut svc = GenerationService::with_config(
        scripted(&[&first, &close, &fresh]),
        &EngineConfig::default(),
    );

    svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    let outcome = svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    assert_eq!(
        outcome.dna().physics_spec.palette,
        vec!["#ffffff", "#0044ff", "#000000"]
    );
    assert_eq!(svc.resubmits(), 1);
    assert_eq!(svc.history().len(), 2);

    let notes = &svc.gateway_mut().notes;
    assert_eq!(notes.len(), 3);
    assert!(notes[0].is_none() && notes[1].is_none());
    assert!(notes[2].as_deref().unwrap().contains("#101010"));
}

#[test]
fn resubmission_is_bounded() {
    let lines = lines();
    let a = dna_text(["#101010", "#e94560", "#f0f0f0"]);
    let mut svc =
        GenerationService::with_config(scripted(&[&a, &a, &a, &a]), &EngineConfig::default());
    svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    let outcome = svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    assert_eq!(outcome.kind(), "ok");
    assert_eq!(svc.resubmits(), 1);
    assert_eq!(svc.gateway_mut().notes.len(), 3);
    assert_eq!(svc.history().len(), 2);
}

#[test]
fn injected_history_is_consulted() {
    let lines = lines();
    let mut history = GenerationHistory::new(3);
    let spec = crate::model::physics_spec::PhysicsSpec {
        palette: vec!["#101010".into(), "#e94560".into(), "#f0f0f0".into()],
        ..Default::default()
    };
    history.push(GenerationRecord::from_spec(&spec));

    let a = dna_text(["#101010", "#e94560", "#f0f0f0"]);
    let b = dna_text(["#ffffff", "#0044ff", "#000000"]);
    let mut svc = GenerationService::new(scripted(&[&a, &b]), history, &EngineConfig::default());
    svc.generate_audio_dna(&audio_request(&lines)).unwrap();
    assert_eq!(svc.resubmits(), 1);
    assert_eq!(svc.history().len(), 2);
}
