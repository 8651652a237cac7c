// Domain layer: launch request model and the process runner port.

pub mod model;
pub mod ports;
