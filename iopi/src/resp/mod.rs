use iopi_msg::{Code, Id, Message, Token, Type};

use crate::req::Req;

/// Response codes
pub mod code;

/// A CoAP response
///
/// ```
/// use iopi::req::{Method, Req};
/// use iopi::resp::{code, Resp};
/// use iopi::ContentFormat;
///
/// // pretend this is an incoming request
/// let req = Req::new(Method::GET, "/GPIO/25/value");
/// let mut resp = Resp::for_request(&req);
///
/// resp.set_code(code::CONTENT);
/// resp.set_content_format(Some(ContentFormat::Text.into()));
/// resp.set_payload("1");
///
/// assert_eq!(resp.payload_str(), Some("1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resp(pub(crate) Message);

impl Resp {
  /// Create a new response for a given request.
  ///
  /// Confirmable requests are answered with an ACK, everything else with a NON.
  /// Either way the response carries the request's id, token and path.
  ///
  /// ```
  /// use iopi::req::{Method, Req};
  /// use iopi::resp::{code, Resp};
  /// use iopi_msg::Type;
  ///
  /// let req = Req::new(Method::GET, "/hello");
  /// let resp = Resp::for_request(&req);
  ///
  /// assert_eq!(resp.msg_type(), Type::Ack);
  /// assert_eq!(resp.msg_id(), req.msg_id());
  /// assert_eq!(resp.code(), code::CONTENT);
  /// ```
  pub fn for_request(req: &Req) -> Self {
    let req = req.msg();
    let ty = match req.ty {
      | Type::Con => Type::Ack,
      | _ => Type::Non,
    };

    let mut msg = Message::new(ty, code::CONTENT, req.id);
    msg.token = req.token;
    msg.set_path(&req.path());

    Self(msg)
  }

  /// Get the message type
  pub fn msg_type(&self) -> Type {
    self.0.ty
  }

  /// Get the message id
  pub fn msg_id(&self) -> Id {
    self.0.id
  }

  /// Get the message token
  pub fn token(&self) -> Token {
    self.0.token
  }

  /// Get the response code
  pub fn code(&self) -> Code {
    self.0.code
  }

  /// Change the response code
  pub fn set_code(&mut self, code: Code) {
    self.0.code = code;
  }

  /// Get the payload's raw bytes
  pub fn payload(&self) -> Option<&[u8]> {
    self.0.payload()
  }

  /// Get the payload and attempt to interpret it as an ASCII string
  pub fn payload_str(&self) -> Option<&str> {
    self.payload().and_then(|p| core::str::from_utf8(p).ok())
  }

  /// Replace the payload
  pub fn set_payload<P: Into<Vec<u8>>>(&mut self, payload: P) {
    self.0.set_payload(payload);
  }

  /// Set or clear the `Content-Format` of the payload
  pub fn set_content_format(&mut self, format: Option<u16>) {
    self.0.set_content_format(format);
  }

  /// Borrow the underlying message
  pub fn msg(&self) -> &Message {
    &self.0
  }
}

impl From<Resp> for Message {
  fn from(resp: Resp) -> Self {
    resp.0
  }
}

impl From<Message> for Resp {
  fn from(msg: Message) -> Self {
    Self(msg)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::req::Method;

  #[test]
  fn non_confirmable_gets_non() {
    let mut req = Req::new(Method::POST, "/GPIO/25/value");
    req.non();
    req.set_msg_id(Id(77));
    req.set_token(Token::from_slice(&[1, 2]).unwrap());

    let resp = Resp::for_request(&req);

    assert_eq!(resp.msg_type(), Type::Non);
    assert_eq!(resp.msg_id(), Id(77));
    assert_eq!(resp.token(), Token::from_slice(&[1, 2]).unwrap());
    assert_eq!(resp.msg().path(), "/GPIO/25/value");
  }

  #[test]
  fn empty_payload_is_absent() {
    let mut resp = Resp::for_request(&Req::new(Method::GET, "/"));
    resp.set_payload("");
    assert_eq!(resp.payload(), None);
  }
}
