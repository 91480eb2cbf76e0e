mod channel;
mod error;
mod message;
mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use self::channel::*;
pub use self::error::{Error, Result};
pub use self::message::{Command, Response};
pub use self::traits::{ProtocolDecoder, ProtocolEncoder, Transport};
