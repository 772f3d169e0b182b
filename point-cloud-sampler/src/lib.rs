//! Out-of-core sampling and density estimation for large particle point clouds.

pub mod artifact;
pub mod bounds;
pub mod catalogue;
pub mod config;
pub mod container;
pub mod density;
pub mod error;
pub mod loader;
pub mod locator;
pub mod manifest;
pub mod palette;
pub mod particles;
pub mod pipeline;
pub mod sampling;

pub use error::{Result, SamplerError};
