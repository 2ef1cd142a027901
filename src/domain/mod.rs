// Domain layer: models and ports shared by the pipeline, the modules and the config sources.

pub mod model;
pub mod ports;
