//! Fusion of oppositely charged particles
//!
//! Two particles of opposite sign closer than the fusion radius collapse
//! into one body that keeps the sum of charge, mass and volume, the total
//! momentum and the centre of mass. The pair potential that disappears with
//! the pair is parked in the receiver's `stored_energy` so that the energy
//! series stays continuous across merges.
//!
//! Absorbed particles are only marked during the scan; the collection is
//! compacted once the scan is over.

use crate::simulation::params::K_COULOMB;
use crate::simulation::states::Particle;

/// Record of one fusion, receiver first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    pub receiver: u32,
    pub absorbed: u32,
    pub separation: f64,
    pub released_energy: f64, // k q1 q2 / d moved into stored_energy
}

/// Fold `other` into `receiver`.
///
/// With `conserve_kinetic` the merged velocity keeps the momentum direction
/// but is rescaled to the pre-merge kinetic energy. A perfectly inelastic
/// fusion cannot conserve both; this is an approximation the slab runs opt
/// into.
pub fn merge_pair(receiver: &mut Particle, other: &Particle, conserve_kinetic: bool) -> MergeEvent {
    let separation = (receiver.x - other.x).norm();
    let released_energy = if separation > 0.0 {
        K_COULOMB * receiver.q * other.q / separation
    } else {
        0.0
    };

    let ek_before = receiver.kinetic_energy() + other.kinetic_energy();
    let m1 = receiver.m;
    let m2 = other.m;
    let m = m1 + m2;

    receiver.stored_energy += released_energy + other.stored_energy;
    receiver.q += other.q;
    receiver.radius = (receiver.radius.powi(3) + other.radius.powi(3)).cbrt();
    receiver.v = (m1 * receiver.v + m2 * other.v) / m;
    receiver.x = (m1 * receiver.x + m2 * other.x) / m;
    receiver.a = (m1 * receiver.a + m2 * other.a) / m;
    receiver.m = m;

    if conserve_kinetic {
        let speed = receiver.v.norm();
        if speed > 0.0 {
            let target_speed = (2.0 * ek_before / m).sqrt();
            receiver.v *= target_speed / speed;
        }
    }

    MergeEvent {
        receiver: receiver.id,
        absorbed: other.id,
        separation,
        released_energy,
    }
}

#[inline]
fn eligible(a: &Particle, b: &Particle, fusion_radius: f64) -> bool {
    a.q * b.q < 0.0 && (a.x - b.x).norm() < fusion_radius
}

/// Scan every unordered pair once and fuse eligible pairs.
///
/// The lower index receives. A particle absorbed earlier in the scan is
/// skipped; a receiver whose charge became neutral simply stops being
/// eligible. Returns the merges in scan order.
pub fn try_merge_all(particles: &mut Vec<Particle>, fusion_radius: f64, conserve_kinetic: bool) -> Vec<MergeEvent> {
    let n = particles.len();
    let mut absorbed = vec![false; n];
    let mut events = Vec::new();

    for i in 0..n {
        if absorbed[i] || particles[i].q == 0.0 {
            continue;
        }
        for j in (i + 1)..n {
            if absorbed[j] {
                continue;
            }
            // split so the receiver can be mutated while reading the other
            let (head, tail) = particles.split_at_mut(j);
            let (receiver, other) = (&mut head[i], &tail[0]);
            if !eligible(receiver, other, fusion_radius) {
                continue;
            }

            let event = merge_pair(receiver, other, conserve_kinetic);
            log::debug!(
                "merged {} into {} at d = {:.3e}, q = {:.3e}",
                event.absorbed,
                event.receiver,
                event.separation,
                receiver.q
            );
            absorbed[j] = true;
            events.push(event);
        }
    }

    if !events.is_empty() {
        let mut flags = absorbed.into_iter();
        particles.retain(|_| !flags.next().unwrap_or(false));
    }
    events
}
