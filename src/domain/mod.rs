// Domain layer: records, schema and the retrieval/config ports.

pub mod model;
pub mod ports;
