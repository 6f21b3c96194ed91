// Domain layer: wire models and ports (interfaces) for the backend, the session and the position sensor.

pub mod model;
pub mod ports;
