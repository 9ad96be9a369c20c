use iopi_msg::{Id, Message, Token, Type};

use crate::net::Addrd;

#[doc(hidden)]
pub mod method;
#[doc(inline)]
pub use method::Method;

pub mod uri;

/// A CoAP request
///
/// ```
/// use iopi::req::{Method, Req};
///
/// let mut req = Req::post("coap://127.0.0.1/GPIO/25/value").unwrap();
/// req.as_mut().set_payload("1");
///
/// assert_eq!(req.addr().port(), 5683);
/// assert_eq!(req.data().method(), Method::POST);
/// assert_eq!(req.data().path(), "/GPIO/25/value");
/// assert_eq!(req.data().payload(), Some(b"1".as_ref()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Req(pub(crate) Message);

impl Req {
  /// Create a confirmable request for `path` without a destination.
  ///
  /// The message id is filled in by the client that sends it.
  pub fn new(method: Method, path: &str) -> Self {
    let mut msg = Message::new(Type::Con, method.0, Id(0));
    msg.set_path(path);
    Self(msg)
  }

  fn addressed(method: Method, uri: &str) -> Result<Addrd<Self>, uri::Error> {
    let uri = uri::Uri::parse(uri)?;
    let addr = uri.resolve()?;
    Ok(Addrd(Self::new(method, &uri.path), addr))
  }

  /// Creates a new GET request
  ///
  /// ```
  /// use iopi::req::Req;
  ///
  /// let _req = Req::get("coap://127.0.0.1/GPIO/25/value").unwrap();
  /// ```
  pub fn get(uri: &str) -> Result<Addrd<Self>, uri::Error> {
    Self::addressed(Method::GET, uri)
  }

  /// Creates a new POST request
  pub fn post(uri: &str) -> Result<Addrd<Self>, uri::Error> {
    Self::addressed(Method::POST, uri)
  }

  /// Creates a new PUT request
  pub fn put(uri: &str) -> Result<Addrd<Self>, uri::Error> {
    Self::addressed(Method::PUT, uri)
  }

  /// Creates a new DELETE request
  pub fn delete(uri: &str) -> Result<Addrd<Self>, uri::Error> {
    Self::addressed(Method::DELETE, uri)
  }

  /// Get the request method
  pub fn method(&self) -> Method {
    Method(self.0.code)
  }

  /// Get the request type (confirmable, non-confirmable)
  pub fn msg_type(&self) -> Type {
    self.0.ty
  }

  /// Set this request to be non-confirmable
  ///
  /// Some messages do not require an acknowledgement.
  ///
  /// This is particularly true for messages that are repeated regularly for
  /// application requirements, such as repeated readings from a sensor.
  pub fn non(&mut self) {
    self.0.ty = Type::Non;
  }

  /// Get a copy of the message id for this request
  pub fn msg_id(&self) -> Id {
    self.0.id
  }

  /// Set the message id
  pub fn set_msg_id(&mut self, id: Id) {
    self.0.id = id;
  }

  /// Set the token used to correlate the response with this request
  pub fn set_token(&mut self, token: Token) {
    self.0.token = token;
  }

  /// The request path, e.g. `/GPIO/25/value`
  pub fn path(&self) -> String {
    self.0.path()
  }

  /// Get the payload, if there is one
  pub fn payload(&self) -> Option<&[u8]> {
    self.0.payload()
  }

  /// Get the payload and attempt to interpret it as an ASCII string
  pub fn payload_str(&self) -> Option<&str> {
    self.payload().and_then(|p| core::str::from_utf8(p).ok())
  }

  /// Add a payload to this request
  pub fn set_payload<P: Into<Vec<u8>>>(&mut self, payload: P) {
    self.0.set_payload(payload);
  }

  /// Set the `Content-Format` of the payload
  pub fn set_content_format(&mut self, format: Option<u16>) {
    self.0.set_content_format(format);
  }

  /// Borrow the underlying message
  pub fn msg(&self) -> &Message {
    &self.0
  }
}

impl From<Req> for Message {
  fn from(req: Req) -> Self {
    req.0
  }
}

#[cfg(test)]
mod tests {
  use iopi_msg::opt::known::URI_PATH;

  use super::*;

  #[test]
  fn new_is_confirmable_with_path_options() {
    let req = Req::new(Method::GET, "/GPIO/25/value");
    let segments = req.msg()
                      .get(URI_PATH)
                      .filter_map(|v| v.as_str())
                      .collect::<Vec<_>>();

    assert_eq!(req.msg_type(), Type::Con);
    assert_eq!(segments, vec!["GPIO", "25", "value"]);
  }

  #[test]
  fn non() {
    let mut req = Req::new(Method::PUT, "/");
    req.non();
    assert_eq!(req.msg_type(), Type::Non);
    assert_eq!(req.path(), "");
  }

  #[test]
  fn bad_uri() {
    assert!(Req::get("http://127.0.0.1/").is_err());
  }
}
