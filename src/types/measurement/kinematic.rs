#[cfg(not(any(test, feature = "std")))]
use micromath::F32Ext;
use nalgebra::{Vector2, Vector3};

/// Position and velocity in the world frame: x north, y east, z up, in meters.
#[derive(Default, Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
}

impl KinematicState {
    pub fn new(position: Vector3<f32>, velocity: Vector3<f32>) -> Self {
        Self { position, velocity }
    }

    pub fn altitude(&self) -> f32 {
        self.position.z
    }

    pub fn vertical_speed(&self) -> f32 {
        self.velocity.z
    }

    pub fn horizontal_position(&self) -> Vector2<f32> {
        self.position.xy()
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|v| v.is_finite())
    }
}

/// Unit vector pointing along `heading`.
pub fn forward_axis(heading: f32) -> Vector2<f32> {
    Vector2::new(heading.cos(), heading.sin())
}

/// Unit vector pointing to the right of `heading`.
pub fn right_axis(heading: f32) -> Vector2<f32> {
    Vector2::new(-heading.sin(), heading.cos())
}

/// Splits a horizontal world vector into (forward, right) components relative to `heading`.
pub fn decompose(vector: Vector2<f32>, heading: f32) -> (f32, f32) {
    (vector.dot(&forward_axis(heading)), vector.dot(&right_axis(heading)))
}

/// Inverse of [`decompose`].
pub fn compose(forward: f32, right: f32, heading: f32) -> Vector2<f32> {
    forward_axis(heading) * forward + right_axis(heading) * right
}

mod test {
    #[test]
    fn test_decompose() {
        use core::f32::consts::PI;

        use nalgebra::Vector2;

        use super::{compose, decompose};

        // Facing north, moving east is moving right
        let (forward, right) = decompose(Vector2::new(0.0, 2.0), 0.0);
        assert!(forward.abs() < 1e-6 && (right - 2.0).abs() < 1e-6);

        // Facing west, moving north is moving right
        let (forward, right) = decompose(Vector2::new(3.0, 0.0), -PI / 2.0);
        assert!(forward.abs() < 1e-5 && (right - 3.0).abs() < 1e-5);

        let vector = compose(1.5, -0.5, 0.7);
        let (forward, right) = decompose(vector, 0.7);
        assert!((forward - 1.5).abs() < 1e-5 && (right + 0.5).abs() < 1e-5);
    }
}
