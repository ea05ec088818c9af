use super::*;

#[test]
fn fnv_seeded_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"hookdance");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_u8(b'h');
    b.write_bytes(b"ookdance");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv32_matches_reference_vectors() {
    assert_eq!(fnv1a32(b""), 0x811c_9dc5);
    assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
}

#[test]
fn clamp_finite_maps_nan_to_fallback() {
    assert_eq!(clamp_finite(f64::NAN, 0.0, 1.0, 0.5), 0.5);
    assert_eq!(clamp_finite(f64::INFINITY, 0.0, 1.0, 0.5), 0.5);
    assert_eq!(clamp_finite(3.0, 0.0, 1.0, 0.5), 1.0);
    assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
}
