#![allow(missing_docs)]

pub mod backend;
pub mod camera;
pub mod error;
pub mod function;
pub mod image;
pub mod ray;
pub mod sampler;
