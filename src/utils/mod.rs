pub mod error;

pub use error::{TransportError, VfdError};
