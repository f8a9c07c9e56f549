// Domain layer: models, the data access port and the quiz selector. No I/O here.

pub mod model;
pub mod ports;
pub mod selector;
