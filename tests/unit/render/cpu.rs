use super::*;

fn pixel(frame: &FrameRgba, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn canvas(w: u32, h: u32) -> CpuCanvas {
    CpuCanvas::new(CanvasSize::new(w, h).unwrap()).unwrap()
}

#[test]
fn rejects_sizes_beyond_u16() {
    let err = CpuCanvas::new(CanvasSize {
        width: 70_000,
        height: 10,
    })
    .unwrap_err();
    assert!(err.to_string().contains("width"));
}

#[test]
fn clear_fills_every_pixel_opaque() {
    let mut c = canvas(16, 8);
    c.clear(Rgb::new(200, 10, 20));
    let frame = c.finish();
    assert_eq!(frame.data.len(), 16 * 8 * 4);
    assert_eq!(pixel(&frame, 0, 0), [200, 10, 20, 255]);
    assert_eq!(pixel(&frame, 15, 7), [200, 10, 20, 255]);
}

#[test]
fn rect_and_transform_land_where_expected() {
    let mut c = canvas(32, 32);
    c.clear(Rgb::BLACK);
    c.set_transform(Affine::translate((16.0, 0.0)));
    c.fill_rect(Rect::new(0.0, 0.0, 16.0, 32.0), Rgba::opaque(Rgb::WHITE));
    let frame = c.finish();
    assert_eq!(pixel(&frame, 4, 16), [0, 0, 0, 255]);
    assert_eq!(pixel(&frame, 24, 16), [255, 255, 255, 255]);
}

#[test]
fn finish_starts_a_fresh_frame() {
    let mut c = canvas(8, 8);
    c.clear(Rgb::WHITE);
    c.set_global_alpha(0.0);
    let _ = c.finish();
    let frame = c.finish();
    assert_eq!(pixel(&frame, 4, 4), [0, 0, 0, 0]);
}

fn lit_in_row(frame: &FrameRgba, y: u32) -> usize {
    (0..frame.width).filter(|&x| pixel(frame, x, y)[0] > 128).count()
}

fn draw_word(text: &str) -> FrameRgba {
    let mut c = canvas(200, 100);
    c.clear(Rgb::BLACK);
    c.fill_text(text, Point::new(100.0, 50.0), 40.0, Rgba::opaque(Rgb::WHITE), TextAlign::Center);
    c.finish()
}

#[test]
fn text_is_drawn_from_shaped_glyphs() {
    let stem = lit_in_row(&draw_word("I"), 50);
    assert!((1..=8).contains(&stem), "{stem}");
    let wide = lit_in_row(&draw_word("WWW"), 50);
    assert!(wide > 3 * stem, "{wide} vs {stem}");
    assert_eq!(lit_in_row(&draw_word(" "), 50), 0);
}

#[test]
fn alignment_moves_glyphs_with_the_anchor() {
    let lit_columns = |align: TextAlign| {
        let mut c = canvas(200, 100);
        c.clear(Rgb::BLACK);
        c.fill_text("HH", Point::new(100.0, 50.0), 30.0, Rgba::opaque(Rgb::WHITE), align);
        let frame = c.finish();
        (0..frame.width)
            .filter(|&x| pixel(&frame, x, 50)[0] > 128)
            .collect::<Vec<u32>>()
    };
    let left = lit_columns(TextAlign::Left);
    let right = lit_columns(TextAlign::Right);
    assert!(left.iter().all(|&x| x >= 99));
    assert!(right.iter().all(|&x| x <= 101));
    assert!(!left.is_empty() && !right.is_empty());
}

#[test]
fn measurement_matches_the_recording_surface() {
    let c = canvas(10, 10);
    let dl = crate::render::canvas::DisplayList::new(CanvasSize::new(10, 10).unwrap());
    for text in ["iiiiiiii", "WWWWWWWW", "City lights"] {
        assert_eq!(c.measure_text(text, 40.0), dl.measure_text(text, 40.0));
    }
    assert!(c.measure_text("WWWWWWWW", 40.0) > 2.0 * c.measure_text("iiiiiiii", 40.0));
}
