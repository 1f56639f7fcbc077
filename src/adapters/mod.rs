// Adapters layer: concrete transports behind the communicator port.

pub mod local;

pub use local::{LocalCommunicator, LocalGroup};
