// Domain layer: records, reports and the seams between the pipeline stages.

pub mod model;
pub mod ports;
