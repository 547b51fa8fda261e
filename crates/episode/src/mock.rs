//! Synthetic episode shown before anything is loaded: a sphere of radius
//! 0.2 m whose surface ripples over one full period of the sequence.

use crate::error::Result;
use crate::frames::{FrameSequence, POINT_STRIDE};
use rand::Rng;
use std::f32::consts::TAU;

const BASE_RADIUS_M: f32 = 0.2;
const RIPPLE_M: f32 = 0.04;
const RIPPLE_LOBES: f32 = 5.0;

pub fn mock_sequence<R: Rng + ?Sized>(
    frames: usize,
    points: usize,
    rng: &mut R,
) -> Result<FrameSequence> {
    let mut out = Vec::with_capacity(frames);

    for t in 0..frames {
        let phase = t as f32 / frames as f32 * TAU;
        let mut data = vec![0.0f32; points * POINT_STRIDE];

        for p in data.chunks_exact_mut(POINT_STRIDE) {
            // Uniform direction on the sphere.
            let theta = TAU * rng.gen::<f32>();
            let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
            let r = BASE_RADIUS_M + RIPPLE_M * (phi * RIPPLE_LOBES + phase).sin();

            let (sin_phi, cos_phi) = phi.sin_cos();
            let (sin_theta, cos_theta) = theta.sin_cos();
            p[0] = r * sin_phi * cos_theta;
            p[1] = r * sin_phi * sin_theta;
            p[2] = r * cos_phi;

            p[3] = 0.5 + 0.5 * phase.sin();
            p[4] = (p[1] / 3.0).abs();
            p[5] = (p[2] / 3.0).abs();
        }

        out.push(data);
    }

    FrameSequence::from_frames(out)
}
