use nalgebra::Vector2;

/// 2D vector used for positions, velocities and forces.
pub type Vec2 = Vector2<f64>;

#[inline]
pub fn zero() -> Vec2 {
    Vec2::new(0.0, 0.0)
}

/// Squared euclidean distance between two points.
#[inline]
pub fn distance_squared(a: &Vec2, b: &Vec2) -> f64 {
    (a - b).norm_squared()
}

/// Unit vector in the direction of `v`, or the zero vector when `v` has no length.
#[inline]
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    let len2 = v.norm_squared();
    if len2 > 0.0 {
        v / len2.sqrt()
    } else {
        zero()
    }
}

/// Rescale `v` down to exactly `max` when its magnitude exceeds it.
#[inline]
pub fn clamp_magnitude(v: Vec2, max: f64) -> Vec2 {
    let len2 = v.norm_squared();
    if len2 > max * max {
        v * (max / len2.sqrt())
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_or_zero_handles_zero_length() {
        assert_eq!(normalize_or_zero(zero()), zero());
        let n = normalize_or_zero(Vec2::new(3.0, 4.0));
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!((n.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn clamp_magnitude_rescales_to_bound() {
        let v = clamp_magnitude(Vec2::new(30.0, 40.0), 5.0);
        assert!((v.norm() - 5.0).abs() < 1e-12);
        assert!((v.x - 3.0).abs() < 1e-12);

        let small = Vec2::new(0.1, -0.1);
        assert_eq!(clamp_magnitude(small, 5.0), small);
    }

    #[test]
    fn distance_squared_skips_the_root() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert_eq!(distance_squared(&a, &b), 25.0);
    }
}
