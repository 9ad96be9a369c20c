use std::fmt;

use iopi_msg::Code;

use crate::code;

/// Request method
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Method(pub(crate) Code);

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match *self {
      | Method::EMPTY => write!(f, "EMPTY"),
      | Method::GET => write!(f, "GET"),
      | Method::POST => write!(f, "POST"),
      | Method::PUT => write!(f, "PUT"),
      | Method::DELETE => write!(f, "DELETE"),
      | Method(c) => write!(f, "{}", c),
    }
  }
}

impl Method {
  code!(rfc7252("4.1")   EMPTY  = Method(0 . 00));
  code!(rfc7252("5.8.1") GET    = Method(0 . 01));
  code!(rfc7252("5.8.2") POST   = Method(0 . 02));
  code!(rfc7252("5.8.3") PUT    = Method(0 . 03));
  code!(rfc7252("5.8.4") DELETE = Method(0 . 04));

  /// The message code for this method
  pub fn code(&self) -> Code {
    self.0
  }
}

impl From<Method> for Code {
  fn from(m: Method) -> Code {
    m.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display() {
    assert_eq!(Method::GET.to_string(), "GET");
    assert_eq!(Method::POST.to_string(), "POST");
    assert_eq!(Method(Code::new(0, 7)).to_string(), "0.07");
  }

  #[test]
  fn codes() {
    assert_eq!(u8::from(Method::GET.code()), 1);
    assert_eq!(u8::from(Method::POST.code()), 2);
    assert_eq!(u8::from(Method::PUT.code()), 3);
    assert_eq!(u8::from(Method::DELETE.code()), 4);
  }
}
