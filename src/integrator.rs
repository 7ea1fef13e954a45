use crate::algorithms::flocking::FlockParams;
use crate::vector::{clamp_magnitude, Vec2};

/// Explicit one-step integrator with force/speed clamping and wall reflection.
///
/// The position advances with the velocity of the *previous* step and walls are
/// detected on the previous position, so an agent may sit up to one step outside
/// the field before it bounces.
#[derive(Debug, Clone)]
pub struct Integrator {
    max_force: f64,
    max_speed: f64,
    width: f64,
    height: f64,
}

impl Integrator {
    pub fn new(params: &FlockParams) -> Self {
        Self {
            max_force: params.max_force,
            max_speed: params.max_speed,
            width: params.width,
            height: params.height,
        }
    }

    pub fn clamp_force(&self, force: Vec2) -> Vec2 {
        clamp_magnitude(force, self.max_force)
    }

    pub fn clamp_speed(&self, velocity: Vec2) -> Vec2 {
        clamp_magnitude(velocity, self.max_speed)
    }

    /// Advance one agent by one step. Returns the new (position, velocity).
    pub fn advance(&self, prev_pos: Vec2, prev_vel: Vec2, force: Vec2) -> (Vec2, Vec2) {
        let force = self.clamp_force(force);
        let mut vel = self.clamp_speed(prev_vel + force);
        let mut pos = prev_pos + prev_vel;

        reflect_axis(prev_pos.x, prev_vel.x, self.width, &mut pos.x, &mut vel.x);
        reflect_axis(prev_pos.y, prev_vel.y, self.height, &mut pos.y, &mut vel.y);

        (pos, vel)
    }
}

/// Bounce off the walls at 0 and `max`, nudging one unit back into the field.
#[inline]
fn reflect_axis(prev_pos: f64, prev_vel: f64, max: f64, pos: &mut f64, vel: &mut f64) {
    if prev_pos < 0.0 {
        *pos = prev_pos.abs() + 1.0;
        *vel = -prev_vel;
    } else if prev_pos > max {
        *pos = 2.0 * max - prev_pos - 1.0;
        *vel = -prev_vel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::zero;

    fn integrator() -> Integrator {
        Integrator::new(&FlockParams::default())
    }

    #[test]
    fn zero_force_moves_by_previous_velocity() {
        let (pos, vel) = integrator().advance(Vec2::new(10.0, 20.0), Vec2::new(1.25, -0.5), zero());
        assert_eq!(pos, Vec2::new(11.25, 19.5));
        assert_eq!(vel, Vec2::new(1.25, -0.5));
    }

    #[test]
    fn force_is_clamped_before_it_reaches_velocity() {
        let params = FlockParams::default();
        let (_, vel) = integrator().advance(Vec2::new(50.0, 50.0), zero(), Vec2::new(3.0, 4.0));
        assert!((vel.norm() - params.max_force).abs() < 1e-12);
        assert!((vel.x - 0.6 * params.max_force).abs() < 1e-12);
    }

    #[test]
    fn speed_is_clamped_but_position_uses_old_velocity() {
        let params = FlockParams::default();
        let prev_vel = Vec2::new(4.99, 0.0);
        let (pos, vel) = integrator().advance(Vec2::new(50.0, 50.0), prev_vel, Vec2::new(0.15, 0.0));
        assert!((vel.norm() - params.max_speed).abs() < 1e-12);
        assert!((pos.x - 54.99).abs() < 1e-12);
        assert_eq!(pos.y, 50.0);
    }

    #[test]
    fn reflects_off_left_wall_from_previous_position() {
        let (pos, vel) =
            integrator().advance(Vec2::new(-0.5, 100.0), Vec2::new(-1.0, 0.25), zero());
        assert!((pos.x - 1.5).abs() < 1e-12);
        assert_eq!(vel.x, 1.0);
        assert_eq!(pos.y, 100.25);
        assert_eq!(vel.y, 0.25);
    }

    #[test]
    fn reflects_off_far_walls() {
        let (pos, vel) =
            integrator().advance(Vec2::new(203.0, 204.0), Vec2::new(2.0, 1.0), zero());
        assert_eq!(pos, Vec2::new(196.0, 195.0));
        assert_eq!(vel, Vec2::new(-2.0, -1.0));
    }

    #[test]
    fn no_reflection_while_previous_position_is_inside() {
        let (pos, vel) = integrator().advance(Vec2::new(0.5, 100.0), Vec2::new(-2.0, 0.0), zero());
        assert_eq!(pos.x, -1.5);
        assert_eq!(vel.x, -2.0);
    }
}
