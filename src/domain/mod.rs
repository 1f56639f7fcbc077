// Domain layer: broadcast data model and the communicator port.

pub mod model;
pub mod ports;
