//! Step size selection
//!
//! A run either uses a fixed `dt` or the adaptive controller. The adaptive
//! controller starts with the pairwise-minimum policy and moves, once and
//! for good, to the energy-based policy when the last negative charge has
//! been merged away.

use crate::error::{Error, Result};
use crate::simulation::energy::kinetic_energy;
use crate::simulation::states::{has_negative_charge, Particle};

/// One time regime of the energy-based policy: applies while `t < until`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRegime {
    pub until: f64,
    pub floor: f64,
    pub ceiling: f64,
}

/// Tuning of the adaptive controller
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveConfig {
    pub floor: f64, // lower bound of the pairwise-minimum step
    pub ceiling: f64, // upper bound of the pairwise-minimum step
    pub energy_gain: f64, // dt = gain * sqrt(Ek)
    pub regimes: [EnergyRegime; 3], // ordered by `until`; the last is open-ended
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            floor: 1e-9,
            ceiling: 0.003,
            energy_gain: 1e-3,
            regimes: [
                EnergyRegime { until: 1.0, floor: 1e-7, ceiling: 1e-3 },
                EnergyRegime { until: 10.0, floor: 1e-6, ceiling: 3e-3 },
                EnergyRegime { until: f64::INFINITY, floor: 1e-5, ceiling: 1e-2 },
            ],
        }
    }
}

/// How the run chooses `dt`
#[derive(Debug, Clone, PartialEq)]
pub enum StepPolicy {
    Fixed(f64),
    Adaptive(AdaptiveConfig),
}

impl Default for StepPolicy {
    fn default() -> Self {
        StepPolicy::Adaptive(AdaptiveConfig::default())
    }
}

impl StepPolicy {
    pub fn validate(&self) -> Result<()> {
        match self {
            StepPolicy::Fixed(dt) => {
                if !dt.is_finite() || *dt <= 0.0 {
                    return Err(Error::InvalidConfig(format!("fixed dt must be finite and > 0, got {dt}")));
                }
            }
            StepPolicy::Adaptive(cfg) => {
                let bounds_ok = |lo: f64, hi: f64| lo > 0.0 && lo.is_finite() && hi.is_finite() && lo <= hi;
                if !bounds_ok(cfg.floor, cfg.ceiling) {
                    return Err(Error::InvalidConfig("adaptive floor/ceiling must satisfy 0 < floor <= ceiling".into()));
                }
                if !cfg.energy_gain.is_finite() || cfg.energy_gain <= 0.0 {
                    return Err(Error::InvalidConfig("energy_gain must be finite and > 0".into()));
                }
                let mut prev = f64::NEG_INFINITY;
                for r in &cfg.regimes {
                    if !bounds_ok(r.floor, r.ceiling) {
                        return Err(Error::InvalidConfig("energy regime floor/ceiling must satisfy 0 < floor <= ceiling".into()));
                    }
                    if r.until <= prev {
                        return Err(Error::InvalidConfig("energy regimes must be ordered by increasing `until`".into()));
                    }
                    prev = r.until;
                }
            }
        }
        Ok(())
    }
}

/// Which adaptive rule is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PairwiseMinimum,
    EnergyBased,
}

#[derive(Debug, Clone)]
pub struct TimestepController {
    policy: StepPolicy,
    phase: Phase,
}

impl TimestepController {
    pub fn new(policy: StepPolicy) -> Self {
        Self {
            policy,
            phase: Phase::PairwiseMinimum,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Step size for the next step from the committed particles at time `t`.
    /// Always > 0 for a validated policy.
    pub fn next_dt(&mut self, particles: &[Particle], t: f64) -> f64 {
        let cfg = match &self.policy {
            StepPolicy::Fixed(dt) => return *dt,
            StepPolicy::Adaptive(cfg) => cfg,
        };

        if self.phase == Phase::PairwiseMinimum && !has_negative_charge(particles) {
            log::debug!("no negative charge left at t = {t:.6}, switching to energy-based steps");
            self.phase = Phase::EnergyBased;
        }

        match self.phase {
            Phase::PairwiseMinimum => pairwise_minimum_dt(particles, cfg.floor, cfg.ceiling),
            Phase::EnergyBased => energy_based_dt(kinetic_energy(particles), t, cfg),
        }
    }
}

/// Closest-approach candidate over charged pairs.
///
/// An opposite-sign pair closer than the running candidate replaces it
/// outright; any other pair closer than a third of the candidate tightens
/// it to three times that separation. Only the first particle of a pair
/// must be charged. `None` when no such pair exists.
pub fn closest_approach(particles: &[Particle]) -> Option<f64> {
    let mut candidate = f64::INFINITY;
    let n = particles.len();
    for i in 0..n {
        let pi = &particles[i];
        if pi.q == 0.0 {
            continue;
        }
        // neutral partners still tighten the candidate, they just never
        // count as an opposite pair
        for pj in &particles[(i + 1)..n] {
            let d = (pi.x - pj.x).norm();
            if d < candidate && pi.q * pj.q < 0.0 {
                candidate = d;
            } else if d < candidate / 3.0 {
                candidate = 3.0 * d;
            }
        }
    }
    candidate.is_finite().then_some(candidate)
}

/// dt = clamp(d^2, floor, ceiling); the ceiling when nothing interacts
pub fn pairwise_minimum_dt(particles: &[Particle], floor: f64, ceiling: f64) -> f64 {
    match closest_approach(particles) {
        Some(d) => (d * d).clamp(floor, ceiling),
        None => ceiling,
    }
}

/// dt = clamp(gain * sqrt(Ek), floor, ceiling) with the bounds of the
/// regime that contains `t`
pub fn energy_based_dt(ek: f64, t: f64, cfg: &AdaptiveConfig) -> f64 {
    let regime = cfg
        .regimes
        .iter()
        .find(|r| t < r.until)
        .unwrap_or(&cfg.regimes[cfg.regimes.len() - 1]);
    (cfg.energy_gain * ek.max(0.0).sqrt()).clamp(regime.floor, regime.ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::NVec3;

    fn charge(id: u32, x: f64, q: f64) -> Particle {
        Particle::new(id, NVec3::new(x, 0.0, 0.0), NVec3::zeros(), 1.0, q, 0.001).unwrap()
    }

    #[test]
    fn fixed_policy_returns_fixed_dt() {
        let mut c = TimestepController::new(StepPolicy::Fixed(1e-4));
        assert_eq!(c.next_dt(&[charge(0, 0.0, 1.0)], 0.0), 1e-4);
    }

    #[test]
    fn opposite_pair_sets_candidate() {
        let ps = [charge(0, 0.0, 1.0), charge(1, 0.02, -1.0), charge(2, 1.0, 1.0)];
        let d = closest_approach(&ps).unwrap();
        assert!((d - 0.02).abs() < 1e-12);
        let dt = pairwise_minimum_dt(&ps, 1e-9, 0.003);
        assert!((dt - 4e-4).abs() < 1e-12);
    }

    #[test]
    fn close_like_pair_tightens_candidate() {
        // like pair at 0.01 after an opposite pair at 0.5: 0.01 < 0.5 / 3
        let ps = [charge(0, 0.0, 1.0), charge(1, 0.5, -1.0), charge(2, 0.01, 1.0)];
        let d = closest_approach(&ps).unwrap();
        assert!((d - 0.03).abs() < 1e-12);
    }

    #[test]
    fn neutral_partner_tightens_candidate() {
        // opposite pair at 0.6, then a neutral body 0.01 from the first charge
        let ps = [charge(0, 0.0, 1.0), charge(1, 0.6, -1.0), charge(2, 0.01, 0.0)];
        let d = closest_approach(&ps).unwrap();
        assert!((d - 0.03).abs() < 1e-12);

        // a neutral body alone with one charge still yields a candidate
        let ps = [charge(0, 0.0, 1.0), charge(1, 0.2, 0.0)];
        assert!((closest_approach(&ps).unwrap() - 0.6).abs() < 1e-12);

        // neutral-neutral pairs are never looked at
        let ps = [charge(0, 0.0, 0.0), charge(1, 0.2, 0.0)];
        assert!(closest_approach(&ps).is_none());
    }

    #[test]
    fn floor_and_ceiling_bound_the_step() {
        let far = [charge(0, 0.0, 1.0), charge(1, 3.0, -1.0)];
        assert_eq!(pairwise_minimum_dt(&far, 1e-9, 0.003), 0.003);
        let touching = [charge(0, 0.0, 1.0), charge(1, 1e-6, -1.0)];
        assert_eq!(pairwise_minimum_dt(&touching, 1e-9, 0.003), 1e-9);
        let lonely = [charge(0, 0.0, 1.0)];
        assert_eq!(pairwise_minimum_dt(&lonely, 1e-9, 0.003), 0.003);
    }

    #[test]
    fn switch_to_energy_policy_is_one_way() {
        let mut c = TimestepController::new(StepPolicy::default());
        let mixed = [charge(0, 0.0, 1.0), charge(1, 0.1, -1.0)];
        let positive = [charge(0, 0.0, 1.0), charge(1, 0.1, 1.0)];

        c.next_dt(&mixed, 0.0);
        assert_eq!(c.phase(), Phase::PairwiseMinimum);
        c.next_dt(&positive, 0.1);
        assert_eq!(c.phase(), Phase::EnergyBased);
        c.next_dt(&mixed, 0.2);
        assert_eq!(c.phase(), Phase::EnergyBased);
    }

    #[test]
    fn energy_policy_uses_regime_bounds() {
        let cfg = AdaptiveConfig::default();
        // zero energy pins to the regime floor
        assert_eq!(energy_based_dt(0.0, 0.5, &cfg), 1e-7);
        assert_eq!(energy_based_dt(0.0, 5.0, &cfg), 1e-6);
        assert_eq!(energy_based_dt(0.0, 500.0, &cfg), 1e-5);
        // gain * sqrt(4) = 2e-3 fits the second regime
        assert!((energy_based_dt(4.0, 5.0, &cfg) - 2e-3).abs() < 1e-15);
        // huge energy pins to the ceiling
        assert_eq!(energy_based_dt(1e12, 5.0, &cfg), 3e-3);
    }

    #[test]
    fn unordered_regimes_rejected() {
        let mut cfg = AdaptiveConfig::default();
        cfg.regimes.swap(0, 1);
        assert!(StepPolicy::Adaptive(cfg).validate().is_err());
    }
}
