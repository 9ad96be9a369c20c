pub use iopi_msg::Code;

use crate::code;

// 2.xx
code!(rfc7252("5.9.1.1") CREATED = 2 . 01);
code!(rfc7252("5.9.1.2") DELETED = 2 . 02);
code!(rfc7252("5.9.1.3") VALID   = 2 . 03);
code!(rfc7252("5.9.1.4") CHANGED = 2 . 04);
code!(rfc7252("5.9.1.5") CONTENT = 2 . 05);

// 4.xx
code!(rfc7252("5.9.2.1")  BAD_REQUEST                = 4 . 00);
code!(rfc7252("5.9.2.2")  UNAUTHORIZED               = 4 . 01);
code!(rfc7252("5.9.2.3")  BAD_OPTION                 = 4 . 02);
code!(rfc7252("5.9.2.4")  FORBIDDEN                  = 4 . 03);
code!(rfc7252("5.9.2.5")  NOT_FOUND                  = 4 . 04);
code!(rfc7252("5.9.2.6")  METHOD_NOT_ALLOWED         = 4 . 05);
code!(rfc7252("5.9.2.7")  NOT_ACCEPTABLE             = 4 . 06);
code!(rfc7252("5.9.2.8")  PRECONDITION_FAILED        = 4 . 12);
code!(rfc7252("5.9.2.9")  REQUEST_ENTITY_TOO_LARGE   = 4 . 13);
code!(rfc7252("5.9.2.10") UNSUPPORTED_CONTENT_FORMAT = 4 . 15);

// 5.xx
code!(rfc7252("5.9.3.1") INTERNAL_SERVER_ERROR  =  5 . 00);
code!(rfc7252("5.9.3.2") NOT_IMPLEMENTED        =  5 . 01);
code!(rfc7252("5.9.3.3") BAD_GATEWAY            =  5 . 02);
code!(rfc7252("5.9.3.4") SERVICE_UNAVAILABLE    =  5 . 03);
code!(rfc7252("5.9.3.5") GATEWAY_TIMEOUT        =  5 . 04);
code!(rfc7252("5.9.3.6") PROXYING_NOT_SUPPORTED =  5 . 05);

/// Map a three-digit HTTP status onto the numeric value of
/// the CoAP code with the same class and detail.
///
/// ```
/// use iopi::resp::code::http_to_coap;
///
/// assert_eq!(http_to_coap(404), 132);
/// assert_eq!(http_to_coap(200), 64);
/// assert_eq!(http_to_coap(500), 160);
/// ```
pub const fn http_to_coap(status: u16) -> u16 {
  (status / 100) * 32 + (status % 100)
}

/// Convert HTTP statuses to CoAP codes
pub trait HttpStatus: Sized {
  /// Bridge an HTTP status to a code, if the bridged value
  /// fits in a single code byte.
  ///
  /// ```
  /// use iopi::resp::code::{self, HttpStatus};
  /// use iopi::Code;
  ///
  /// assert_eq!(Code::try_from_http(404), Some(code::NOT_FOUND));
  /// assert_eq!(Code::try_from_http(999), None);
  /// ```
  fn try_from_http(status: u16) -> Option<Self>;
}

impl HttpStatus for Code {
  fn try_from_http(status: u16) -> Option<Self> {
    u8::try_from(http_to_coap(status)).ok().map(Code::from)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formula_holds_for_every_status() {
    for status in 100..=599u16 {
      let coap = http_to_coap(status);
      assert_eq!(coap, (status / 100) * 32 + status % 100);

      match Code::try_from_http(status) {
        | Some(code) => assert_eq!(u8::from(code) as u16, coap),
        | None => assert!(coap > 255, "{} -> {}", status, coap),
      }

      if status % 100 < 32 {
        let code = Code::try_from_http(status).unwrap();
        assert_eq!((code.class as u16, code.detail as u16), (status / 100, status % 100));
      }
    }
  }

  #[test]
  fn fixed_examples() {
    assert_eq!(Code::try_from_http(404), Some(NOT_FOUND));
    assert_eq!(Code::try_from_http(403), Some(FORBIDDEN));
    assert_eq!(Code::try_from_http(500), Some(INTERNAL_SERVER_ERROR));
    assert_eq!(u8::from(CONTENT), 69);
    assert_eq!(u8::from(CHANGED), 68);
    assert_eq!(u8::from(NOT_IMPLEMENTED), 161);
  }

  #[test]
  fn too_large() {
    assert_eq!(http_to_coap(800), 256);
    assert_eq!(Code::try_from_http(800), None);
  }
}
