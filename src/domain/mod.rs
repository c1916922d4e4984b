// Domain layer: records, request/response models and ports.

pub mod model;
pub mod ports;
