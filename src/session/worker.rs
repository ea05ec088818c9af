use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::foundation::error::{DanceError, DanceResult};
use crate::render::canvas::Canvas2d;
use crate::session::clock::{AudioClock, ManualClock};
use crate::session::engine::{FrameReport, PlaybackEngine, SessionInputs};

/// Lifecycle of the off-thread renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Idle,
    Initialized,
    Playing,
    Paused,
    Destroyed,
}

/// Message discriminant used by the transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Init,
    Seek,
    Play,
    Pause,
    Destroy,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Seek => "seek",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Destroy => "destroy",
        }
    }
}

impl WorkerState {
    /// Next state for `msg`, or `None` when the message is not valid here.
    pub fn on_message(self, msg: MessageKind) -> Option<Self> {
        use MessageKind as M;
        match (self, msg) {
            (Self::Destroyed, _) => None,
            (_, M::Destroy) => Some(Self::Destroyed),
            (Self::Idle, M::Init) => Some(Self::Initialized),
            (Self::Idle, _) | (_, M::Init) => None,
            (Self::Initialized | Self::Paused, M::Play) => Some(Self::Playing),
            (Self::Playing, M::Pause) => Some(Self::Paused),
            (s, M::Seek) => Some(s),
            _ => None,
        }
    }
}

/// Everything the worker takes ownership of on `Init`, including the surface it draws on.
pub struct WorkerInit {
    pub inputs: SessionInputs,
    pub config: EngineConfig,
    pub canvas: Box<dyn Canvas2d + Send>,
}

impl std::fmt::Debug for WorkerInit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerInit")
            .field("lines", &self.inputs.lines.len())
            .field("canvas", &self.canvas.size())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum WorkerMessage {
    Init(Box<WorkerInit>),
    /// Move playback to the given second and draw one frame.
    Seek(f64),
    Play,
    Pause,
    Destroy,
}

impl WorkerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Init(_) => MessageKind::Init,
            Self::Seek(_) => MessageKind::Seek,
            Self::Play => MessageKind::Play,
            Self::Pause => MessageKind::Pause,
            Self::Destroy => MessageKind::Destroy,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkerEvent {
    State(WorkerState),
    /// A message that is not valid in the current state was ignored.
    Rejected {
        state: WorkerState,
        message: MessageKind,
    },
    /// `Init` carried inputs the engine refused; the worker stays idle.
    Failed(String),
    Frame(FrameReport),
}

/// Handle to a render thread that owns its engine, clock and surface.
///
/// Communication is message passing only. Dropping the handle destroys the worker and joins it.
#[derive(Debug)]
pub struct RenderWorker {
    tx: Sender<WorkerMessage>,
    events: Receiver<WorkerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Start a worker that renders one frame per `frame_interval` of playback while playing.
    pub fn spawn(frame_interval: Duration) -> DanceResult<Self> {
        let (tx, rx) = mpsc::channel();
        let (ev_tx, events) = mpsc::channel();
        let interval = if frame_interval.is_zero() {
            Duration::from_millis(16)
        } else {
            frame_interval
        };
        let handle = std::thread::Builder::new()
            .name("hookdance-render".to_owned())
            .spawn(move || run_worker(&rx, &ev_tx, interval))
            .map_err(|e| DanceError::render(format!("spawn render worker: {e}")))?;
        Ok(Self {
            tx,
            events,
            handle: Some(handle),
        })
    }

    /// Post a message. Returns `false` once the worker has exited.
    pub fn send(&self, msg: WorkerMessage) -> bool {
        self.tx.send(msg).is_ok()
    }

    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Destroy the worker and wait for its thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(WorkerMessage::Destroy);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("render worker panicked");
        }
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Live {
    engine: PlaybackEngine,
    canvas: Box<dyn Canvas2d + Send>,
}

impl Live {
    fn frame(&mut self, clock: &ManualClock) -> FrameReport {
        self.engine.frame(clock, self.canvas.as_mut())
    }
}

fn run_worker(rx: &Receiver<WorkerMessage>, events: &Sender<WorkerEvent>, interval: Duration) {
    let mut state = WorkerState::Idle;
    let mut clock = ManualClock::new();
    let mut live: Option<Live> = None;
    // A closed event channel only means nobody is listening.
    let emit = |ev: WorkerEvent| {
        let _ = events.send(ev);
    };

    loop {
        let msg = if state == WorkerState::Playing {
            match rx.recv_timeout(interval) {
                Ok(m) => Some(m),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(m) => Some(m),
                Err(_) => break,
            }
        };

        let Some(msg) = msg else {
            clock.advance(interval.as_secs_f64());
            if let Some(l) = live.as_mut() {
                emit(WorkerEvent::Frame(l.frame(&clock)));
            }
            continue;
        };

        let kind = msg.kind();
        let Some(next) = state.on_message(kind) else {
            tracing::warn!(
                state = ?state,
                message = kind.as_str(),
                "render worker ignored message"
            );
            emit(WorkerEvent::Rejected {
                state,
                message: kind,
            });
            continue;
        };

        match msg {
            WorkerMessage::Init(init) => {
                let WorkerInit {
                    inputs,
                    config,
                    canvas,
                } = *init;
                match PlaybackEngine::new(inputs, &config) {
                    Ok(engine) => live = Some(Live { engine, canvas }),
                    Err(e) => {
                        tracing::warn!(error = %e, "render worker init failed");
                        emit(WorkerEvent::Failed(e.to_string()));
                        continue;
                    }
                }
            }
            WorkerMessage::Seek(t) => {
                clock.set_time(t);
                if let Some(l) = live.as_mut() {
                    emit(WorkerEvent::Frame(l.frame(&clock)));
                }
            }
            WorkerMessage::Play => clock.play(),
            WorkerMessage::Pause => clock.pause(),
            WorkerMessage::Destroy => {
                clock.pause();
                live = None;
            }
        }

        if next != state {
            tracing::info!(from = ?state, to = ?next, "render worker state");
            state = next;
            emit(WorkerEvent::State(next));
        }
        if state == WorkerState::Destroyed {
            break;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/worker.rs"]
mod tests;
