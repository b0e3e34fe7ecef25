//! Application layer: the controller and the transport seam it drives.

pub mod controller;
pub mod transport;

pub use controller::{AvrController, ControllerError};
pub use transport::{Dial, LineTransport, TransportError};
