use super::*;
use crate::foundation::core::CanvasSize;
use crate::model::beat_grid::BeatGrid;
use crate::model::lyrics::LyricLine;
use crate::model::physics_spec::PhysicsSpec;
use crate::render::canvas::DisplayList;

const WAIT: Duration = Duration::from_secs(5);

fn init() -> WorkerMessage {
    let lines = (0..8)
        .map(|i| LyricLine::new(format!("line {i}"), i as f64 * 2.0, i as f64 * 2.0 + 1.8))
        .collect();
    let inputs = SessionInputs::new(
        lines,
        BeatGrid::synthetic(120.0, 16.0).unwrap(),
        PhysicsSpec::default(),
        16.0,
    );
    let config = EngineConfig {
        canvas: CanvasSize::new(320, 568).unwrap(),
        ..EngineConfig::default()
    };
    WorkerMessage::Init(Box::new(WorkerInit {
        inputs,
        config,
        canvas: Box::new(DisplayList::new(CanvasSize::new(320, 568).unwrap())),
    }))
}

fn wait_for(worker: &RenderWorker, pred: impl Fn(&WorkerEvent) -> bool) -> WorkerEvent {
    loop {
        let ev = worker.recv_timeout(WAIT).expect("worker event");
        if pred(&ev) {
            return ev;
        }
    }
}

#[test]
fn transition_table() {
    use MessageKind as M;
    use WorkerState as S;
    assert_eq!(S::Idle.on_message(M::Init), Some(S::Initialized));
    assert_eq!(S::Idle.on_message(M::Play), None);
    assert_eq!(S::Idle.on_message(M::Seek), None);
    assert_eq!(S::Idle.on_message(M::Destroy), Some(S::Destroyed));
    assert_eq!(S::Initialized.on_message(M::Init), None);
    assert_eq!(S::Initialized.on_message(M::Play), Some(S::Playing));
    assert_eq!(S::Initialized.on_message(M::Pause), None);
    assert_eq!(S::Initialized.on_message(M::Seek), Some(S::Initialized));
    assert_eq!(S::Playing.on_message(M::Pause), Some(S::Paused));
    assert_eq!(S::Playing.on_message(M::Play), None);
    assert_eq!(S::Playing.on_message(M::Seek), Some(S::Playing));
    assert_eq!(S::Paused.on_message(M::Play), Some(S::Playing));
    assert_eq!(S::Paused.on_message(M::Pause), None);
    for m in [M::Init, M::Seek, M::Play, M::Pause, M::Destroy] {
        assert_eq!(S::Destroyed.on_message(m), None);
    }
}

#[test]
fn worker_runs_through_its_lifecycle() {
    let worker = RenderWorker::spawn(Duration::from_millis(2)).unwrap();

    assert!(worker.send(WorkerMessage::Play));
    assert_eq!(
        worker.recv_timeout(WAIT),
        Some(WorkerEvent::Rejected {
            state: WorkerState::Idle,
            message: MessageKind::Play
        })
    );

    worker.send(init());
    assert_eq!(
        worker.recv_timeout(WAIT),
        Some(WorkerEvent::State(WorkerState::Initialized))
    );

    worker.send(WorkerMessage::Seek(4.5));
    let Some(WorkerEvent::Frame(report)) = worker.recv_timeout(WAIT) else {
        panic!("expected a frame after seek");
    };
    assert_eq!(report.time_s, 4.5);
    assert_eq!(report.line_index, Some(2));

    worker.send(WorkerMessage::Play);
    wait_for(&worker, |e| *e == WorkerEvent::State(WorkerState::Playing));
    let WorkerEvent::Frame(later) = wait_for(&worker, |e| matches!(e, WorkerEvent::Frame(_)))
    else {
        unreachable!()
    };
    assert!(later.time_s > 4.5);

    worker.send(WorkerMessage::Pause);
    wait_for(&worker, |e| *e == WorkerEvent::State(WorkerState::Paused));
    worker.send(WorkerMessage::Destroy);
    wait_for(&worker, |e| *e == WorkerEvent::State(WorkerState::Destroyed));
    worker.shutdown();
}

#[test]
fn invalid_init_leaves_the_worker_idle() {
    let worker = RenderWorker::spawn(Duration::from_millis(2)).unwrap();
    let mut lines = vec![
        LyricLine::new("b", 5.0, 6.0),
        LyricLine::new("a", 0.0, 1.0),
    ];
    lines.sort_by(|a, b| b.start.total_cmp(&a.start));
    let inputs = SessionInputs::new(lines, BeatGrid::default(), PhysicsSpec::default(), 6.0);
    worker.send(WorkerMessage::Init(Box::new(WorkerInit {
        inputs,
        config: EngineConfig::default(),
        canvas: Box::new(DisplayList::new(CanvasSize::default())),
    })));
    assert!(matches!(worker.recv_timeout(WAIT), Some(WorkerEvent::Failed(_))));

    worker.send(init());
    assert_eq!(
        worker.recv_timeout(WAIT),
        Some(WorkerEvent::State(WorkerState::Initialized))
    );
}

#[test]
fn dropping_the_handle_stops_the_thread() {
    let worker = RenderWorker::spawn(Duration::from_millis(1)).unwrap();
    worker.send(init());
    worker.send(WorkerMessage::Play);
    drop(worker);
}
