/// The authoritative playback clock, shaped like a media element.
///
/// The engine reads `current_time` every frame and never consults wall-clock time.
pub trait AudioClock {
    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn is_paused(&self) -> bool;
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
    fn play(&mut self);
    fn pause(&mut self);
}

impl<C: AudioClock + ?Sized> AudioClock for Box<C> {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn is_muted(&self) -> bool {
        (**self).is_muted()
    }

    fn set_muted(&mut self, muted: bool) {
        (**self).set_muted(muted);
    }

    fn play(&mut self) {
        (**self).play();
    }

    fn pause(&mut self) {
        (**self).pause();
    }
}

/// Clock driven explicitly by the caller: tests, offline renders, the render worker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManualClock {
    time_s: f64,
    playing: bool,
    muted: bool,
}

impl ManualClock {
    /// Paused at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paused at `time_s`.
    pub fn at(time_s: f64) -> Self {
        let mut c = Self::new();
        c.set_time(time_s);
        c
    }

    /// Seek. Non-finite or negative positions snap to zero.
    pub fn set_time(&mut self, time_s: f64) {
        self.time_s = if time_s.is_finite() { time_s.max(0.0) } else { 0.0 };
    }

    /// Move forward by `dt` while playing; ignored while paused.
    pub fn advance(&mut self, dt: f64) {
        if self.playing && dt.is_finite() && dt > 0.0 {
            self.time_s += dt;
        }
    }
}

impl AudioClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time_s
    }

    fn is_paused(&self) -> bool {
        !self.playing
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/clock.rs"]
mod tests;
