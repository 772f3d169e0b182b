/// Default values shared by the sampler configuration.
pub mod dataset_paths;
pub mod density;
pub mod palette;
pub mod sampling;
