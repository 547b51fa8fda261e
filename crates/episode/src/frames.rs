//! Point-cloud frame sequences.
//!
//! A frame is a flat `f32` buffer laid out as `[x, y, z, r, g, b]` per point.
//! Sequences are validated once on construction so that every later access
//! (playback, GPU upload) can index without further checks.

use crate::error::{DataError, Result};
use rayon::prelude::*;

/// Number of `f32` values per point: xyz position followed by rgb colour.
pub const POINT_STRIDE: usize = 6;

/// One point exactly as it sits in a frame buffer.
/// Must match the instance layout of the point pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColoredPoint {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// An ordered set of equally sized point-cloud frames forming one episode.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Vec<f32>>,
    points_per_frame: usize,
    rescaled_colors: bool,
}

impl FrameSequence {
    /// Validates and takes ownership of raw frames.
    ///
    /// Colours above 1.0 anywhere in the sequence mark it as 0-255 data; the
    /// whole sequence is then divided down into [0, 1].
    pub fn from_frames(mut frames: Vec<Vec<f32>>) -> Result<Self> {
        let first = frames.first().ok_or(DataError::EmptySequence)?;
        if first.len() % POINT_STRIDE != 0 {
            return Err(DataError::BadStride {
                frame: 0,
                len: first.len(),
                stride: POINT_STRIDE,
            });
        }
        let points_per_frame = first.len() / POINT_STRIDE;

        for (frame, data) in frames.iter().enumerate().skip(1) {
            if data.len() % POINT_STRIDE != 0 {
                return Err(DataError::BadStride {
                    frame,
                    len: data.len(),
                    stride: POINT_STRIDE,
                });
            }
            let found = data.len() / POINT_STRIDE;
            if found != points_per_frame {
                return Err(DataError::RaggedFrame {
                    frame,
                    found,
                    expected: points_per_frame,
                });
            }
        }

        let rescaled_colors = frames.par_iter().any(|f| {
            f.chunks_exact(POINT_STRIDE)
                .any(|p| p[3..].iter().any(|&c| c > 1.0))
        });

        if rescaled_colors {
            frames.par_iter_mut().for_each(|f| {
                for p in f.chunks_exact_mut(POINT_STRIDE) {
                    for c in &mut p[3..] {
                        *c /= 255.0;
                    }
                }
            });
        }

        Ok(Self {
            frames,
            points_per_frame,
            rescaled_colors,
        })
    }

    /// Number of frames (always at least one).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn points_per_frame(&self) -> usize {
        self.points_per_frame
    }

    /// True when the source colours were 0-255 and got normalised.
    pub fn rescaled_colors(&self) -> bool {
        self.rescaled_colors
    }

    /// Raw `[x, y, z, r, g, b]` values of one frame.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// The frame reinterpreted as points, without copying.
    pub fn points(&self, index: usize) -> Option<&[ColoredPoint]> {
        self.frame(index)
            .and_then(|f| bytemuck::try_cast_slice(f).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(points: &[[f32; 6]]) -> Vec<f32> {
        points.iter().flatten().copied().collect()
    }

    #[test]
    fn rejects_empty_sequence() {
        assert!(matches!(
            FrameSequence::from_frames(Vec::new()),
            Err(DataError::EmptySequence)
        ));
    }

    #[test]
    fn rejects_partial_points() {
        let err = FrameSequence::from_frames(vec![vec![0.0; 6], vec![0.0; 7]]).unwrap_err();
        assert!(matches!(err, DataError::BadStride { frame: 1, len: 7, .. }));
    }

    #[test]
    fn rejects_ragged_frames() {
        let err = FrameSequence::from_frames(vec![vec![0.0; 12], vec![0.0; 6]]).unwrap_err();
        assert!(matches!(
            err,
            DataError::RaggedFrame {
                frame: 1,
                found: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn exposes_points_in_place() {
        let seq = FrameSequence::from_frames(vec![frame(&[
            [1.0, 2.0, 3.0, 0.1, 0.2, 0.3],
            [4.0, 5.0, 6.0, 0.4, 0.5, 0.6],
        ])])
        .unwrap();

        assert_eq!(seq.len(), 1);
        assert_eq!(seq.points_per_frame(), 2);
        let pts = seq.points(0).unwrap();
        assert_eq!(pts[1].position, [4.0, 5.0, 6.0]);
        assert_eq!(pts[1].color, [0.4, 0.5, 0.6]);
        assert!(seq.points(1).is_none());
        assert!(!seq.rescaled_colors());
    }

    #[test]
    fn byte_colors_are_normalised_across_all_frames() {
        let seq = FrameSequence::from_frames(vec![
            frame(&[[0.0, 0.0, 0.0, 255.0, 0.0, 51.0]]),
            frame(&[[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]]),
        ])
        .unwrap();

        assert!(seq.rescaled_colors());
        let first = seq.points(0).unwrap()[0].color;
        assert_relative_eq!(first[0], 1.0);
        assert_relative_eq!(first[2], 0.2);
        let second = seq.points(1).unwrap()[0].color;
        assert_relative_eq!(second[0], 1.0 / 255.0);
    }
}
