//! Modality classification: how was a candidate detected?
//!
//! Senses are evaluated from least to most accurate so that each one can
//! overwrite the remembered position of the previous:
//!
//! | Sense    | Trigger                                  | Position            |
//! |----------|------------------------------------------|---------------------|
//! | Smell    | `distance < scent_range`                 | actual ± scent noise|
//! | Hearing  | `distance < hearing_range`               | actual ± sound noise|
//! | Sight    | in vision range and inside the FOV cone  | exact               |
//! | Implicit | `distance < implicit_range`              | exact               |
//!
//! Noisy senses only re-randomize when the target actually moved, so a
//! stationary scent source does not jitter from scan to scan.
//!
//! Line-of-sight occlusion is not modeled: anything inside the cone is seen.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SensesConfig;
use crate::record::SensedRecord;
use crate::types::{EntityId, Pose, Vec3};

/// An entity inside the agent's maximum sense radius this scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The candidate entity.
    pub id: EntityId,
    /// Its ground-truth position.
    pub position: Vec3,
    /// Distance from the sensing agent.
    pub distance: f32,
}

impl Candidate {
    /// Build a candidate, measuring its distance from `origin`.
    #[must_use]
    pub fn measured(id: EntityId, position: Vec3, origin: Vec3) -> Self {
        Self {
            id,
            position,
            distance: position.distance(origin),
        }
    }
}

/// Applies the sense rules to candidates, owning the noise source.
#[derive(Debug, Clone)]
pub struct ModalityClassifier {
    senses: SensesConfig,
    rng: StdRng,
}

impl ModalityClassifier {
    /// Create a classifier; a seed makes positional noise reproducible.
    #[must_use]
    pub fn new(senses: SensesConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { senses, rng }
    }

    /// The sense configuration in use.
    #[must_use]
    pub fn senses(&self) -> &SensesConfig {
        &self.senses
    }

    /// Classify `candidate` into `record`, returning whether any sense fired.
    ///
    /// `record` must have had its sense flags cleared for this scan.
    /// `first_detection` forces noisy senses to pick a fresh offset.
    pub fn classify(
        &mut self,
        record: &mut SensedRecord,
        candidate: &Candidate,
        pose: &Pose,
        first_detection: bool,
    ) -> bool {
        let moved = first_detection || record.actual_position != candidate.position;
        let distance = candidate.distance;

        if distance < self.senses.scent_range {
            if moved {
                record.sensed_position = self.jitter(candidate.position, self.senses.scent_accuracy_radius);
            }
            record.smelled = true;
        }
        if distance < self.senses.hearing_range {
            if moved {
                record.sensed_position = self.jitter(candidate.position, self.senses.hearing_accuracy_radius);
            }
            record.heard = true;
        }
        if distance < self.senses.vision_range && can_see(pose, candidate.position, &self.senses) {
            record.sensed_position = candidate.position;
            record.seen = true;
        }
        if distance < self.senses.implicit_range {
            record.sensed_position = candidate.position;
            record.implicitly_detected = true;
        }

        record.actual_position = candidate.position;
        record.distance = distance;
        record.is_sensed()
    }

    /// `position` displaced by a uniform random point inside a sphere of `radius`.
    fn jitter(&mut self, position: Vec3, radius: f32) -> Vec3 {
        if radius <= 0.0 {
            return position;
        }
        position + random_in_unit_sphere(&mut self.rng) * radius
    }
}

/// Whether `target` lies inside the agent's vision cone.
#[must_use]
pub fn can_see(pose: &Pose, target: Vec3, senses: &SensesConfig) -> bool {
    let to_target = target - pose.position;
    pose.forward.angle_deg(to_target) < senses.fov_half_angle_deg
}

fn random_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if p.dot(p) <= 1.0 {
            return p;
        }
    }
}
