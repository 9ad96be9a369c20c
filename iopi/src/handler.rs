//! The contract between a transport and the code that answers its requests.
//!
//! A [`RequestHandler`] speaks in HTTP-style statuses so the same handler can
//! sit behind more than one transport; the CoAP server bridges them with
//! [`http_to_coap`](crate::resp::code::http_to_coap).

use std::fmt;
use std::sync::Arc;

/// What a handler answered with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
  /// HTTP-style status. `0` means no route matched the path.
  pub status: u16,
  /// Response body
  pub body: Option<String>,
  /// MIME type of `body`
  pub content_type: Option<String>,
}

impl Reply {
  /// A reply with a status, body and MIME type
  pub fn new(status: u16, body: Option<String>, content_type: Option<&str>) -> Self {
    Self { status,
           body,
           content_type: content_type.map(String::from) }
  }

  /// `200` with a plain text body
  pub fn text(body: impl Into<String>) -> Self {
    Self::new(200, Some(body.into()), Some("text/plain"))
  }

  /// No route matched the path
  ///
  /// ```
  /// use iopi::handler::Reply;
  ///
  /// assert_eq!(Reply::not_found().status, 0);
  /// ```
  pub fn not_found() -> Self {
    Self::default()
  }
}

/// Errors a handler may fail with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
  /// The request was understood but refused, e.g. writing
  /// to a pin configured as an input. Answered with 4.03.
  Forbidden(String),
  /// Anything else. Answered with 5.00.
  Internal(String),
}

impl fmt::Display for HandlerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | HandlerError::Forbidden(msg) | HandlerError::Internal(msg) => write!(f, "{}", msg),
    }
  }
}

impl std::error::Error for HandlerError {}

/// Answers requests on behalf of a transport.
///
/// `path` never has a leading `/`.
/// `compact` asks for abbreviated output where the handler supports it.
pub trait RequestHandler: Send + Sync {
  /// Answer a GET
  fn do_get(&self, path: &str, compact: bool) -> Result<Reply, HandlerError>;

  /// Answer a POST
  fn do_post(&self, path: &str, payload: &[u8], compact: bool) -> Result<Reply, HandlerError>;
}

impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
  fn do_get(&self, path: &str, compact: bool) -> Result<Reply, HandlerError> {
    (**self).do_get(path, compact)
  }

  fn do_post(&self, path: &str, payload: &[u8], compact: bool) -> Result<Reply, HandlerError> {
    (**self).do_post(path, payload, compact)
  }
}

impl<H: RequestHandler + ?Sized> RequestHandler for &H {
  fn do_get(&self, path: &str, compact: bool) -> Result<Reply, HandlerError> {
    (**self).do_get(path, compact)
  }

  fn do_post(&self, path: &str, payload: &[u8], compact: bool) -> Result<Reply, HandlerError> {
    (**self).do_post(path, payload, compact)
  }
}
