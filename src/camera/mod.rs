//! Camera capability consumed by ray generation.

pub mod perspective;

pub use burn::tensor::{backend::Backend, Tensor};
pub use perspective::*;

/// The operations ray generation needs from a camera.
pub trait Camera<B: Backend> {
    /// Focal lengths `[f_x, f_y]` in normalized device units.
    ///
    /// NDC coordinates are divided by them to land on the image plane at depth `1`.
    fn focal_length(&self) -> [f64; 2];

    /// Camera center in world space.
    ///
    /// The shape is `[1, 3]`.
    fn camera_center(
        &self,
        device: &B::Device,
    ) -> Tensor<B, 2>;

    /// Maps image-plane points `(x, y, depth)` into world space.
    ///
    /// ## Shapes
    ///
    /// * `points` - `[N, 3]`
    /// * `output` - `[N, 3]`
    fn unproject_points(
        &self,
        points: Tensor<B, 2>,
    ) -> Tensor<B, 2>;
}
