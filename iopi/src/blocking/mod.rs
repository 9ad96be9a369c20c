use std::fmt;

use iopi_msg::to_bytes::MessageToBytesError;

use crate::req::uri;

/// Blocking CoAP client
pub mod client;

/// Blocking CoAP server
pub mod server;

pub use client::Client;
pub use server::Server;

/// Errors encounterable by the blocking client and server
#[derive(Debug)]
pub enum Error<E> {
  /// Some socket operation (e.g. binding, sending) failed
  Sock(E),
  /// Serializing a message to bytes failed
  ToBytes(MessageToBytesError),
  /// The clock could not be read
  Clock(embedded_time::clock::Error),
  /// A request's destination could not be parsed or resolved
  Uri(uri::Error),
  /// The server worker thread could not be spawned
  Spawn(std::io::Error),
  /// The server worker thread panicked
  WorkerPanicked,
}

impl<E> From<uri::Error> for Error<E> {
  fn from(e: uri::Error) -> Self {
    Error::Uri(e)
  }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Error::Sock(e) => write!(f, "socket error: {:?}", e),
      | Error::ToBytes(e) => write!(f, "message could not be serialized: {}", e),
      | Error::Clock(e) => write!(f, "clock error: {:?}", e),
      | Error::Uri(e) => write!(f, "{}", e),
      | Error::Spawn(e) => write!(f, "server thread could not be spawned: {}", e),
      | Error::WorkerPanicked => write!(f, "server thread panicked"),
    }
  }
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}
