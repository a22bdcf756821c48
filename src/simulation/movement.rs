//! Wander steps on the ground plane
//!
//! A step picks a random heading and one of three path shapes. Whatever
//! the shape, the horizontal displacement from the origin lands in
//! `[min, max]` and height is left alone.

use std::f32::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::core::types::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanderShape {
    Straight,
    /// Arc that ends turned away from the initial heading
    Curved,
    /// Sum of a few short random steps
    Jitter,
}

/// Outcome of one planned wander step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderStep {
    pub shape: WanderShape,
    /// Initial heading in radians
    pub heading: f32,
    /// Horizontal displacement
    pub distance: f32,
    pub new_position: Vec3,
    /// Yaw-only rotation facing the direction of travel at the end
    pub new_rotation: Vec3,
}

const JITTER_STEPS: usize = 3;

pub fn plan_wander<R: Rng + ?Sized>(origin: Vec3, rng: &mut R, min: f32, max: f32) -> WanderStep {
    let heading = rng.gen_range(0.0..TAU);
    let distance = if max > min { rng.gen_range(min..=max) } else { min };

    let shape = match rng.gen_range(0..3) {
        0 => WanderShape::Straight,
        1 => WanderShape::Curved,
        _ => WanderShape::Jitter,
    };

    let (direction, facing) = match shape {
        WanderShape::Straight => (heading, heading),
        WanderShape::Curved => {
            // A circular arc turning by `turn` has its chord at half the turn
            let turn = rng.gen_range(-FRAC_PI_2..FRAC_PI_2);
            (heading + turn / 2.0, heading + turn)
        }
        WanderShape::Jitter => {
            let (mut dx, mut dz) = (heading.cos(), heading.sin());
            for _ in 1..JITTER_STEPS {
                let angle = rng.gen_range(0.0..TAU);
                dx += angle.cos();
                dz += angle.sin();
            }
            // Steps that cancel out fall back to the initial heading
            let direction = if dx.hypot(dz) > 1e-3 { dz.atan2(dx) } else { heading };
            (direction, direction)
        }
    };

    let new_position = Vec3::new(
        origin.x + distance * direction.cos(),
        origin.y,
        origin.z + distance * direction.sin(),
    );

    WanderStep {
        shape,
        heading,
        distance,
        new_position,
        new_rotation: Vec3::new(0.0, facing.rem_euclid(TAU), 0.0),
    }
}
