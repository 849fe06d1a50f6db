use burn::tensor::{backend, Float, Tensor};

pub trait TensorFloatExtension {
    /// Scales every lane along `dim` to unit L2 norm.
    ///
    /// Lanes of zero length stay zero.
    fn normalize(
        self,
        dim: usize,
    ) -> Self;
}

impl<B: backend::Backend, const D: usize> TensorFloatExtension
    for Tensor<B, D, Float>
{
    fn normalize(
        self,
        dim: usize,
    ) -> Self {
        assert!(dim < D, "dim should be less than self.dims().len()");

        let norms = self
            .to_owned()
            .powf_scalar(2.0)
            .sum_dim(dim)
            .sqrt()
            .clamp_min(f32::EPSILON);
        self.div(norms)
    }
}
