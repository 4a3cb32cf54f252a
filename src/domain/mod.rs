// Domain layer: product records, run reports and the ports the pipeline talks to.

pub mod model;
pub mod ports;
