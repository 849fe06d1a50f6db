//! Pinhole camera with a field of view and an affine view transformation.

pub use super::*;

use burn::tensor::TensorData;

/// A perspective camera in 3D space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// The horizontal field of view in radians.
    pub field_of_view_x: f64,
    /// The vertical field of view in radians.
    pub field_of_view_y: f64,
    /// Affine transformation from world space to view space.
    ///
    /// It is in **column-major order**, i.e., `M[col][row]`.
    ///
    /// # Format
    ///
    /// ```plaintext
    /// [R_v   | T_v]
    /// [...   | ...]
    /// [0 0 0 | 1  ]
    /// ```
    pub view_transform: [[f64; 4]; 4],
}

/// Linear transformations.
impl PerspectiveCamera {
    /// Returns the affine transformation matrix.
    ///
    /// Both `rotation` and the output are in **column-major order**, i.e., `M[col][row]`.
    #[inline]
    pub const fn transform(
        rotation: &[[f64; 3]; 3],
        translation: &[f64; 3],
    ) -> [[f64; 4]; 4] {
        let r = rotation;
        let t = translation;
        [
            [r[0][0], r[0][1], r[0][2], 0.0],
            [r[1][0], r[1][1], r[1][2], 0.0],
            [r[2][0], r[2][1], r[2][2], 0.0],
            [t[0], t[1], t[2], 1.0],
        ]
    }

    /// `R_v` laid out row-major, so that `p_w = (p_v - T_v) * R_v`
    /// for row vectors.
    fn view_rotation(&self) -> [f64; 9] {
        let m = &self.view_transform;
        [
            m[0][0], m[1][0], m[2][0], //
            m[0][1], m[1][1], m[2][1], //
            m[0][2], m[1][2], m[2][2], //
        ]
    }

    /// `T_v`
    fn view_translation(&self) -> [f64; 3] {
        let t = &self.view_transform[3];
        [t[0], t[1], t[2]]
    }

    /// Camera position in world space, `-R_v^T * T_v`.
    pub fn position(&self) -> [f64; 3] {
        let m = &self.view_transform;
        let t = self.view_translation();
        [0, 1, 2].map(|i| -(0..3).map(|j| t[j] * m[i][j]).sum::<f64>())
    }
}

impl<B: Backend> Camera<B> for PerspectiveCamera {
    /// `[1 / tan(Fov_x / 2), 1 / tan(Fov_y / 2)]`
    fn focal_length(&self) -> [f64; 2] {
        [
            (self.field_of_view_x / 2.0).tan().recip(),
            (self.field_of_view_y / 2.0).tan().recip(),
        ]
    }

    fn camera_center(
        &self,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        Tensor::from_data(
            TensorData::new(self.position().to_vec(), [1, 3])
                .convert::<B::FloatElem>(),
            device,
        )
    }

    /// `p_v = (x * z, y * z, z)`, then `p_w = (p_v - T_v) * R_v` for row vectors
    fn unproject_points(
        &self,
        points: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let device = points.device();
        let [point_count, _] = points.dims();

        // [N, 1]
        let depths = points.to_owned().slice([0..point_count, 2..3]);
        // [N, 2]
        let positions_plane = points.slice([0..point_count, 0..2]);
        // [N, 3]
        let positions_view = Tensor::cat(
            vec![positions_plane.mul(depths.to_owned()), depths],
            1,
        );

        // [1, 3]
        let view_translation = Tensor::<B, 2>::from_data(
            TensorData::new(self.view_translation().to_vec(), [1, 3])
                .convert::<B::FloatElem>(),
            &device,
        );
        // [3, 3]
        let view_rotation = Tensor::<B, 2>::from_data(
            TensorData::new(self.view_rotation().to_vec(), [3, 3])
                .convert::<B::FloatElem>(),
            &device,
        );

        (positions_view - view_translation).matmul(view_rotation)
    }
}

impl Default for PerspectiveCamera {
    /// A camera at the world origin looking down `+Z` with `90°` fields of view.
    #[inline]
    fn default() -> Self {
        Self {
            field_of_view_x: std::f64::consts::FRAC_PI_2,
            field_of_view_y: std::f64::consts::FRAC_PI_2,
            view_transform: Self::transform(
                &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                &[0.0, 0.0, 0.0],
            ),
        }
    }
}
