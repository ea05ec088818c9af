use super::*;

#[test]
fn manual_clock_starts_paused_and_only_advances_while_playing() {
    let mut c = ManualClock::new();
    assert!(c.is_paused());
    c.advance(1.0);
    assert_eq!(c.current_time(), 0.0);

    c.play();
    c.advance(0.5);
    c.advance(f64::NAN);
    c.advance(-3.0);
    assert_eq!(c.current_time(), 0.5);

    c.pause();
    c.advance(1.0);
    assert_eq!(c.current_time(), 0.5);
}

#[test]
fn seeking_sanitizes_positions() {
    let mut c = ManualClock::at(12.5);
    assert_eq!(c.current_time(), 12.5);
    c.set_time(-4.0);
    assert_eq!(c.current_time(), 0.0);
    c.set_time(f64::INFINITY);
    assert_eq!(c.current_time(), 0.0);
}

#[test]
fn boxed_clocks_forward_calls() {
    let mut c: Box<dyn AudioClock> = Box::new(ManualClock::at(3.0));
    c.set_muted(true);
    c.play();
    assert!(c.is_muted());
    assert!(!c.is_paused());
    assert_eq!(c.current_time(), 3.0);
}
