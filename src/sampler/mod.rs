//! Point sampling along rays.

pub mod stratified;

pub use crate::{error::Error, ray::RayBundle};
pub use burn::{
    config::Config,
    tensor::{backend::Backend, Tensor, TensorData},
};
pub use rand::RngCore;
pub use stratified::*;

use std::{fmt, str::FromStr};

/// Attaching sample points and lengths to the rays.
pub trait Raysampler<B: Backend>: fmt::Debug {
    /// Sampling points along every ray of `ray_bundle`.
    ///
    /// The output keeps the rays and the shape of `ray_bundle`,
    /// with [`RayBundle::sample_points`] and [`RayBundle::sample_lengths`] replaced.
    fn sample(
        &self,
        ray_bundle: RayBundle<B>,
        rng: &mut dyn RngCore,
    ) -> Result<RayBundle<B>, Error>;
}

/// The registered raysamplers by name.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum RaysamplerKind {
    /// `"stratified"`, [`StratifiedRaysampler`]
    #[default]
    Stratified,
}

impl RaysamplerKind {
    /// The registered name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stratified => "stratified",
        }
    }

    /// Initialize the raysampler of this kind from the configuration.
    pub fn init<B: Backend>(
        &self,
        config: &StratifiedRaysamplerConfig,
    ) -> Result<Box<dyn Raysampler<B>>, Error> {
        match self {
            Self::Stratified => Ok(Box::new(config.init()?)),
        }
    }
}

impl FromStr for RaysamplerKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "stratified" => Ok(Self::Stratified),
            _ => Err(Error::Validation(
                format!("The raysampler name {name:?}"),
                "one of [\"stratified\"]".into(),
            )),
        }
    }
}

impl fmt::Display for RaysamplerKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}
