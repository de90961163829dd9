//! Fixed-step explicit Euler integrator with wall reflection
//!
//! `euler_step` advances a single particle given its net force; it never
//! touches any other particle, so the engine can integrate every body from
//! one committed snapshot and commit the results together

use super::params::Limits;
use super::states::{Boundary, NVec3, Particle};

/// Result of one Euler step for one particle
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub particle: Particle, // updated velocity/acceleration, position = staged next position
    pub settled: bool, // |v| fell below the settle threshold
    pub damped: bool, // runaway damper fired
    pub reflected: bool, // a wall was hit this step
}

/// Inelastic wall collision, applied per axis.
///
/// For every axis where `x` lies outside the box: scale the whole velocity
/// by `restitution`, flip that axis' component and clamp the position to
/// the face. Corner hits flip several components in one call.
/// Returns true when any axis was out of range.
pub fn reflect(x: &mut NVec3, v: &mut NVec3, boundary: &Boundary, restitution: f64) -> bool {
    let mut hit = false;
    for k in 0..3 {
        let [lo, hi] = boundary.axis(k);
        if x[k] < lo || x[k] > hi {
            *v *= restitution;
            v[k] = -v[k];
            x[k] = if x[k] < lo { lo } else { hi };
            hit = true;
        }
    }
    hit
}

/// Advance `p` by one explicit Euler step of size `dt` under `force`.
///
/// v_n+1 = v_n + dt * F / m, then wall reflection on the current position,
/// then x_n+1 = x_n + dt * v_n+1. The velocity damper runs after the
/// position is staged, matching the order the slab runs were tuned with.
pub fn euler_step(
    p: &Particle,
    force: NVec3,
    dt: f64,
    boundary: Option<&Boundary>,
    limits: &Limits,
) -> StepOutcome {
    let mut next = p.clone();

    // a = F / m
    next.a = force / p.m;

    // kick
    next.v += next.a * dt;

    // wall hit on the committed position, before drifting
    let reflected = match boundary {
        Some(b) => reflect(&mut next.x, &mut next.v, b, limits.restitution),
        None => false,
    };

    // drift
    next.x += next.v * dt;

    let speed = next.v.norm();
    let settled = speed < limits.settle_speed;

    // numerical blowup damper
    let damped = speed > limits.runaway_speed;
    if damped {
        log::trace!("particle {} at |v| = {speed:.3e}, damping", p.id);
        next.v /= 10.0;
    }

    StepOutcome {
        particle: next,
        settled,
        damped,
        reflected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Boundary {
        Boundary::new([-1.0, 1.0], [-1.0, 1.0], [-1.0, 1.0]).unwrap()
    }

    fn body(x: NVec3, v: NVec3) -> Particle {
        Particle::new(0, x, v, 2.0, 1.0, 0.01).unwrap()
    }

    #[test]
    fn free_step_matches_euler() {
        let p = body(NVec3::zeros(), NVec3::new(1.0, 0.0, 0.0));
        let out = euler_step(&p, NVec3::new(4.0, 0.0, 0.0), 0.1, None, &Limits::default());
        // a = 2, v = 1.2, x = 0.12
        assert!((out.particle.a.x - 2.0).abs() < 1e-12);
        assert!((out.particle.v.x - 1.2).abs() < 1e-12);
        assert!((out.particle.x.x - 0.12).abs() < 1e-12);
        assert!(!out.settled && !out.damped && !out.reflected);
    }

    #[test]
    fn reflection_flips_and_scales() {
        let mut x = NVec3::new(1.5, 0.0, 0.0);
        let mut v = NVec3::new(2.0, 1.0, 0.0);
        assert!(reflect(&mut x, &mut v, &unit_box(), 0.7));
        assert_eq!(x.x, 1.0);
        assert!((v.x + 1.4).abs() < 1e-12);
        assert!((v.y - 0.7).abs() < 1e-12);
    }

    #[test]
    fn corner_hit_flips_every_offending_axis() {
        let mut x = NVec3::new(-2.0, 3.0, 0.0);
        let mut v = NVec3::new(-1.0, 1.0, 1.0);
        reflect(&mut x, &mut v, &unit_box(), 0.5);
        assert_eq!(x, NVec3::new(-1.0, 1.0, 0.0));
        // scaled twice (0.25), x and y flipped
        assert!((v - NVec3::new(0.25, -0.25, 0.25)).norm() < 1e-12);
    }

    #[test]
    fn inside_particle_is_untouched() {
        let mut x = NVec3::new(0.2, -0.3, 0.9);
        let mut v = NVec3::new(5.0, 5.0, 5.0);
        assert!(!reflect(&mut x, &mut v, &unit_box(), 0.7));
        assert_eq!(v, NVec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn slow_particle_reports_settled() {
        let p = body(NVec3::zeros(), NVec3::new(1e-5, 0.0, 0.0));
        let out = euler_step(&p, NVec3::zeros(), 0.01, Some(&unit_box()), &Limits::default());
        assert!(out.settled);
    }

    #[test]
    fn runaway_velocity_is_damped() {
        let p = body(NVec3::zeros(), NVec3::new(150.0, 0.0, 0.0));
        let out = euler_step(&p, NVec3::zeros(), 1e-6, None, &Limits::default());
        assert!(out.damped);
        assert!((out.particle.v.x - 15.0).abs() < 1e-9);
    }
}
