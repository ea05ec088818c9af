use super::*;

fn list() -> DisplayList {
    DisplayList::new(CanvasSize {
        width: 100,
        height: 200,
    })
}

#[test]
fn text_width_comes_from_the_font() {
    let dl = list();
    assert_eq!(dl.measure_text("", 40.0), 0.0);
    assert_eq!(dl.measure_text("abc", f64::NAN), 0.0);
    assert_eq!(dl.measure_text("abc", -3.0), 0.0);
    let small = dl.measure_text("abcd", 10.0);
    let large = dl.measure_text("abcd", 40.0);
    assert!(small > 0.0);
    assert!(large > 3.0 * small);
    assert!(dl.measure_text("mmmm", 20.0) > dl.measure_text("llll", 20.0));
}

#[test]
fn alignment_moves_left_edge() {
    assert_eq!(aligned_left(50.0, 20.0, TextAlign::Left), 50.0);
    assert_eq!(aligned_left(50.0, 20.0, TextAlign::Center), 40.0);
    assert_eq!(aligned_left(50.0, 20.0, TextAlign::Right), 30.0);
}

#[test]
fn save_restore_scopes_state() {
    let mut dl = list();
    dl.save();
    dl.set_global_alpha(0.5);
    dl.set_blend(BlendMode::Lighter);
    dl.transform(Affine::translate((10.0, 0.0)));
    dl.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba::opaque(Rgb::WHITE));
    dl.restore();
    dl.restore();
    dl.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Rgba::opaque(Rgb::WHITE));

    let DrawCommand::Rect { state: inner, .. } = &dl.commands()[0] else {
        panic!("expected rect");
    };
    let DrawCommand::Rect { state: outer, .. } = &dl.commands()[1] else {
        panic!("expected rect");
    };
    assert_eq!(inner.alpha, 0.5);
    assert_eq!(inner.blend, BlendMode::Lighter);
    assert_eq!(inner.transform, Affine::translate((10.0, 0.0)));
    assert_eq!(*outer, DrawState::default());
}

#[test]
fn non_finite_draws_are_dropped() {
    let mut dl = list();
    dl.set_transform(Affine::scale(f64::NAN));
    dl.set_global_alpha(f64::INFINITY);
    dl.fill_rect(Rect::new(0.0, f64::NAN, 1.0, 1.0), Rgba::opaque(Rgb::BLACK));
    dl.fill_circle(Point::new(1.0, 1.0), f64::INFINITY, Rgba::opaque(Rgb::BLACK));
    dl.fill_circle(Point::new(1.0, 1.0), 0.0, Rgba::opaque(Rgb::BLACK));
    dl.fill_text("x", Point::new(f64::NAN, 0.0), 10.0, Rgba::opaque(Rgb::BLACK), TextAlign::Left);
    dl.fill_text("", Point::ORIGIN, 10.0, Rgba::opaque(Rgb::BLACK), TextAlign::Left);
    assert!(dl.is_empty());

    dl.fill_circle(Point::new(1.0, 1.0), 2.0, Rgba::opaque(Rgb::BLACK));
    let DrawCommand::Circle { state, .. } = &dl.commands()[0] else {
        panic!("expected circle");
    };
    assert_eq!(state.transform, Affine::IDENTITY);
    assert_eq!(state.alpha, 0.0);
}

#[test]
fn fingerprint_tracks_content() {
    let draw = |text: &str| {
        let mut dl = list();
        dl.clear(Rgb::new(1, 2, 3));
        dl.fill_text(
            text,
            Point::new(50.0, 100.0),
            24.0,
            Rgba::opaque(Rgb::WHITE),
            TextAlign::Center,
        );
        dl
    };
    assert_eq!(draw("hello").fingerprint(), draw("hello").fingerprint());
    assert_ne!(draw("hello").fingerprint(), draw("hellp").fingerprint());
    assert_eq!(draw("hello").texts(), vec!["hello"]);

    let mut dl = draw("hello");
    dl.reset();
    assert!(dl.is_empty());
    assert_ne!(dl.fingerprint(), draw("hello").fingerprint());
}

#[test]
fn replay_reproduces_commands() {
    let mut src = list();
    src.clear(Rgb::BLACK);
    src.set_global_alpha(0.25);
    src.set_blend(BlendMode::Difference);
    src.fill_circle(Point::new(3.0, 4.0), 5.0, Rgba::opaque(Rgb::WHITE));
    src.set_transform(Affine::rotate(0.3));
    src.fill_text("hey", Point::new(1.0, 2.0), 12.0, Rgba::opaque(Rgb::WHITE), TextAlign::Right);

    let mut dst = list();
    src.replay(&mut dst);
    assert_eq!(src.commands(), dst.commands());
    assert_eq!(src.fingerprint(), dst.fingerprint());
}

#[test]
fn fingerprint_bytes_are_hi_then_lo() {
    let fp = FrameFingerprint { hi: 1, lo: 2 };
    let b = fp.to_bytes();
    assert_eq!(b[7], 1);
    assert_eq!(b[15], 2);
}
