use super::*;

#[test]
fn hex_parsing_is_strict_six_digit() {
    assert_eq!(Rgb::parse_hex("#FF8000"), Some(Rgb::new(255, 128, 0)));
    assert_eq!(Rgb::parse_hex(" #0a0b0c "), Some(Rgb::new(10, 11, 12)));
    assert_eq!(Rgb::parse_hex("FF8000"), None);
    assert_eq!(Rgb::parse_hex("#fff"), None);
    assert_eq!(Rgb::parse_hex("#ff800080"), None);
    assert_eq!(Rgb::parse_hex("#gg0000"), None);
}

#[test]
fn hex_format_roundtrips_lowercase() {
    let c = Rgb::new(233, 69, 96);
    assert_eq!(c.to_hex(), "#e94560");
    assert_eq!(Rgb::parse_hex(&c.to_hex()), Some(c));
}

#[test]
fn distance_and_mix() {
    assert_eq!(Rgb::BLACK.distance(Rgb::BLACK), 0.0);
    assert!((Rgb::new(3, 4, 0).distance(Rgb::BLACK) - 5.0).abs() < 1e-12);
    assert_eq!(Rgb::BLACK.mix(Rgb::WHITE, 0.5), Rgb::new(128, 128, 128));
    assert_eq!(Rgb::BLACK.mix(Rgb::WHITE, f64::NAN), Rgb::BLACK);
}

#[test]
fn rgba_clamps_alpha() {
    assert_eq!(Rgba::new(Rgb::WHITE, 2.0).alpha, 1.0);
    assert_eq!(Rgba::new(Rgb::WHITE, f64::NAN).alpha, 0.0);
    assert_eq!(Rgba::opaque(Rgb::WHITE).fade(0.5).alpha_u8(), 128);
}

#[test]
fn canvas_size_rejects_zero() {
    assert!(CanvasSize::new(0, 10).is_err());
    assert_eq!(CanvasSize::new(4, 2).unwrap().as_f64(), (4.0, 2.0));
}

#[test]
fn transform_to_affine_identity_and_translation() {
    let t = Transform2D::default();
    assert_eq!(t.to_affine(), Affine::IDENTITY);

    let t = Transform2D {
        translate: Vec2::new(10.0, -2.5),
        ..Transform2D::default()
    };
    assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
}

#[test]
fn transform_scales_around_anchor() {
    let t = Transform2D {
        scale: 2.0,
        anchor: Vec2::new(5.0, 5.0),
        ..Transform2D::default()
    };
    let p = t.to_affine() * Point::new(5.0, 5.0);
    assert!((p.x - 5.0).abs() < 1e-12);
    assert!((p.y - 5.0).abs() < 1e-12);
}
