//! Stratified (uniform) sampling of depths along rays.

pub use super::*;

use rand_distr::{Distribution, Uniform};

/// The configuration for [`StratifiedRaysampler`].
#[derive(Config, Copy, Debug)]
pub struct StratifiedRaysamplerConfig {
    /// Number of sample points per ray.
    #[config(default = 64)]
    pub n_pts_per_ray: usize,
    /// Minimum depth along the rays.
    #[config(default = 0.0)]
    pub min_depth: f32,
    /// Maximum depth along the rays.
    #[config(default = 5.0)]
    pub max_depth: f32,
}

/// Sampling depths uniformly at random between the near and far bounds.
///
/// `z ~ U[min_depth, max_depth)`, `sample_point = origin + direction * z`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StratifiedRaysampler {
    /// `K`
    pub n_pts_per_ray: usize,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl StratifiedRaysamplerConfig {
    /// Initialize from the configuration.
    ///
    /// It fails if `n_pts_per_ray` is zero,
    /// or the depths are not a finite range with `min_depth <= max_depth`.
    pub fn init(&self) -> Result<StratifiedRaysampler, Error> {
        if self.n_pts_per_ray == 0 {
            return Err(Error::Validation(
                "n_pts_per_ray".into(),
                "positive".into(),
            ));
        }
        if !self.min_depth.is_finite() || !self.max_depth.is_finite() {
            return Err(Error::Validation(
                format!(
                    "The depth range [{}, {}]",
                    self.min_depth, self.max_depth
                ),
                "finite".into(),
            ));
        }
        if self.min_depth > self.max_depth {
            return Err(Error::Validation(
                format!("min_depth {}", self.min_depth),
                format!("no more than max_depth {}", self.max_depth),
            ));
        }
        if !(self.max_depth - self.min_depth).is_finite() {
            return Err(Error::Validation(
                format!(
                    "The depth span {} - {}",
                    self.max_depth, self.min_depth
                ),
                "finite".into(),
            ));
        }

        Ok(StratifiedRaysampler {
            n_pts_per_ray: self.n_pts_per_ray,
            min_depth: self.min_depth,
            max_depth: self.max_depth,
        })
    }
}

impl StratifiedRaysampler {
    /// Drawing `count` depths in `[min_depth, max_depth)`.
    ///
    /// An empty range yields `min_depth` only.
    fn sample_depths(
        &self,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<f32> {
        if self.min_depth < self.max_depth {
            let distribution = Uniform::new(self.min_depth, self.max_depth);
            (0..count).map(|_| distribution.sample(rng)).collect()
        } else {
            vec![self.min_depth; count]
        }
    }
}

impl<B: Backend> Raysampler<B> for StratifiedRaysampler {
    /// ## Shapes
    ///
    /// * `sample_points` - `[R, K, 3]`
    /// * `sample_lengths` - `[R, K, 1]`
    fn sample(
        &self,
        ray_bundle: RayBundle<B>,
        rng: &mut dyn RngCore,
    ) -> Result<RayBundle<B>, Error> {
        #[cfg(debug_assertions)]
        log::debug!(target: "nerf_rays::sampler::stratified", "sample");

        let device = ray_bundle.device();
        // R
        let ray_count = ray_bundle.ray_count();
        // K
        let point_count = self.n_pts_per_ray;

        // [R, K, 1]
        let sample_lengths = Tensor::<B, 3>::from_data(
            TensorData::new(
                self.sample_depths(ray_count * point_count, rng),
                [ray_count, point_count, 1],
            )
            .convert::<B::FloatElem>(),
            &device,
        );
        // [R, K, 3] <- [R, 1, 3]
        let origins = ray_bundle
            .origins()
            .unsqueeze_dim::<3>(1)
            .repeat_dim(1, point_count);
        // [R, K, 3] <- [R, 1, 3]
        let directions = ray_bundle
            .directions()
            .unsqueeze_dim::<3>(1)
            .repeat_dim(1, point_count);
        // [R, K, 3]
        let sample_points = origins + directions * sample_lengths.to_owned();

        #[cfg(debug_assertions)]
        log::debug!(
            target: "nerf_rays::sampler::stratified",
            "sample > {ray_count} rays x {point_count} points",
        );

        ray_bundle.with_samples(sample_points, sample_lengths)
    }
}

impl Default for StratifiedRaysamplerConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
