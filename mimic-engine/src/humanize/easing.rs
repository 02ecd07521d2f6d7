/// Ease-in-out cubic remapping of `t` in `[0, 1]` (clamped).
///
/// Slow near both ends, fast through the middle.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
