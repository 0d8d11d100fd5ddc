//! Keyframed transform animation

use crate::foundation::math::{Mat4, Transform};

/// Transform keyframes, sampled with linear interpolation
///
/// Frames before the first key hold the first key, frames after the last
/// key hold the last key.
#[derive(Debug, Clone, Default)]
pub struct TransformTrack {
    keys: Vec<(f64, Transform)>,
}

impl TransformTrack {
    /// A track holding one transform at every frame
    pub fn fixed(transform: Transform) -> Self {
        Self {
            keys: vec![(0.0, transform)],
        }
    }

    /// Insert or replace the key at `frame` (builder pattern)
    pub fn with_key(mut self, frame: f64, transform: Transform) -> Self {
        self.set_key(frame, transform);
        self
    }

    /// Insert or replace the key at `frame`
    pub fn set_key(&mut self, frame: f64, transform: Transform) {
        match self.keys.binary_search_by(|(f, _)| f.total_cmp(&frame)) {
            Ok(index) => self.keys[index].1 = transform,
            Err(index) => self.keys.insert(index, (frame, transform)),
        }
    }

    /// Whether the transform changes over time
    pub fn is_animated(&self) -> bool {
        self.keys.len() > 1
    }

    /// Transform at a (possibly fractional) frame
    ///
    /// A NaN frame samples the first key.
    pub fn sample(&self, frame: f64) -> Transform {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Transform::identity(),
        };
        if frame.is_nan() || frame <= first.0 {
            return first.1;
        }
        if frame >= last.0 {
            return last.1;
        }

        let next = self.keys.partition_point(|(f, _)| *f <= frame);
        let (f0, t0) = &self.keys[next - 1];
        let (f1, t1) = &self.keys[next];
        let t = ((frame - f0) / (f1 - f0)) as f32;
        t0.lerp(t1, t)
    }

    /// World matrix at a frame
    pub fn matrix_at(&self, frame: f64) -> Mat4 {
        self.sample(frame).to_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn track() -> TransformTrack {
        TransformTrack::default()
            .with_key(10.0, Transform::from_position(Vec3::new(10.0, 0.0, 0.0)))
            .with_key(0.0, Transform::from_position(Vec3::zeros()))
    }

    #[test]
    fn test_empty_track_is_identity() {
        let sampled = TransformTrack::default().sample(4.0);
        assert_relative_eq!(sampled.position, Vec3::zeros());
    }

    #[test]
    fn test_sample_interpolates() {
        let sampled = track().sample(2.5);
        assert_relative_eq!(sampled.position.x, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_sample_clamps_outside_range() {
        let track = track();
        assert_relative_eq!(track.sample(-3.0).position.x, 0.0);
        assert_relative_eq!(track.sample(42.0).position.x, 10.0);
    }

    #[test]
    fn test_nan_frame_samples_first_key() {
        assert_relative_eq!(track().sample(f64::NAN).position.x, 0.0);
        assert_relative_eq!(track().sample(f64::INFINITY).position.x, 10.0);
    }

    #[test]
    fn test_set_key_replaces_existing_frame() {
        let mut track = track();
        track.set_key(10.0, Transform::from_position(Vec3::new(20.0, 0.0, 0.0)));
        assert!(track.is_animated());
        assert_relative_eq!(track.sample(10.0).position.x, 20.0);
    }
}
