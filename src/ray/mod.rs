//! Rays through the pixels of an image.

pub mod bundle;
pub mod generate;
pub mod pixel;

pub use crate::error::Error;
pub use bundle::*;
pub use burn::tensor::{backend::Backend, Int, Tensor, TensorData};
pub use generate::*;
pub use pixel::*;
