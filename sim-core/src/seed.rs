//! Initial point sets for seeding a [`crate::line::DifferentialLine`].

use glam::DVec2;
use rand::Rng;
use std::f64::consts::TAU;

/// `count` points evenly spaced on a circle, counter-clockwise from angle 0.
pub fn ring(center: DVec2, radius: f64, count: usize) -> Vec<DVec2> {
    (0..count)
        .map(|i| center + DVec2::from_angle(TAU * i as f64 / count as f64) * radius)
        .collect()
}

/// Like [`ring`], but each point's radius is scaled by a factor drawn
/// uniformly from `[1 - jitter, 1 + jitter]`.
pub fn jittered_ring(
    center: DVec2,
    radius: f64,
    count: usize,
    jitter: f64,
    rng: &mut impl Rng,
) -> Vec<DVec2> {
    let jitter = jitter.abs();
    (0..count)
        .map(|i| {
            let scale = if jitter > 0.0 {
                rng.random_range(1.0 - jitter..=1.0 + jitter)
            } else {
                1.0
            };
            center + DVec2::from_angle(TAU * i as f64 / count as f64) * radius * scale
        })
        .collect()
}

/// `count` points evenly spaced from `start` to `end`, both included.
pub fn segment(start: DVec2, end: DVec2, count: usize) -> Vec<DVec2> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..count)
            .map(|i| start.lerp(end, i as f64 / (count - 1) as f64))
            .collect(),
    }
}
