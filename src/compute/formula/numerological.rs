//! Numerological family: Pythagorean letter values reduced to a digit root.
//!
//! The root (1-9) selects the shape directly. Hue and position follow the
//! golden angle, closeness to a Fibonacci number feeds symmetry and
//! saturation, and a prime letter total boosts brightness.

use super::text;
use super::{GOLDEN_ANGLE, PHI};
use crate::schema::{Formula, RawVisual, ShapeType};

pub(super) fn transform(formula: &Formula, name: &str) -> RawVisual {
    let letters = text::letters(name);
    let digit_w = formula.weight("digit_weight");
    let golden_w = formula.weight("golden_weight");
    let fibonacci_w = formula.weight("fibonacci_weight");
    let prime_w = formula.weight("prime_weight");

    let total: u64 = letters.iter().map(|&l| text::pythagorean_value(l)).sum();
    let weighted_total = (total as f64 * digit_w).round().max(0.0) as u64;
    let root = text::digit_root(weighted_total);
    let root_f = root as f64;

    let nearest = text::nearest_fibonacci(total as f64) as f64;
    let fibonacci = (1.0 - (total as f64 - nearest).abs() / nearest).max(0.0) * fibonacci_w;
    let prime = if text::is_prime(total) { prime_w } else { 0.0 };

    // Phyllotaxis placement: angle by the golden angle, radius by the root.
    let theta = (root_f * GOLDEN_ANGLE * golden_w).to_radians();
    let radius = (root_f / 9.0).sqrt();

    RawVisual {
        shape_type: ShapeType::from_digit_root(root),
        palette: None,
        complexity: root_f / 9.0,
        symmetry: fibonacci,
        angular_vs_curved: ((root_f - 5.0) / 2.0).tanh(),
        hue: GOLDEN_ANGLE * root_f * golden_w,
        saturation: 40.0 + 60.0 * fibonacci,
        brightness: (50.0 + 20.0 * root_f / 9.0) * (1.0 + 0.3 * prime),
        x: radius * theta.cos(),
        y: radius * theta.sin(),
        z: fibonacci,
        rotation: 40.0 * root_f * digit_w,
        glow_intensity: 0.5 * fibonacci + 0.5 * prime,
        pattern_density: total as f64 / 100.0 * digit_w,
        fractal_dimension: 1.0 + (PHI - 1.0) * fibonacci,
    }
}
