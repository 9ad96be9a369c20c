//! The Content-Format registry.
//!
//! A fixed table between Content-Format codes and MIME types:
//!
//! |code|MIME type|
//! |---|---|
//! |0|`text/plain`|
//! |40|`application/link-format`|
//! |41|`application/xml`|
//! |42|`application/octet-stream`|
//! |47|`application/exi`|
//! |50|`application/json`|
//!
//! Absence is preserved in both directions; a missing MIME type
//! never turns into `text/plain`.

use core::fmt;

/// Content-Format
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentFormat {
  /// `text/plain`
  Text,
  /// `application/link-format`
  LinkFormat,
  /// `application/xml`
  Xml,
  /// `application/octet-stream`
  OctetStream,
  /// `application/exi`
  Exi,
  /// `application/json`
  Json,
  /// Another content format
  Other(u16),
}

const TABLE: [(ContentFormat, &str); 6] = [(ContentFormat::Text, "text/plain"),
                                           (ContentFormat::LinkFormat, "application/link-format"),
                                           (ContentFormat::Xml, "application/xml"),
                                           (ContentFormat::OctetStream, "application/octet-stream"),
                                           (ContentFormat::Exi, "application/exi"),
                                           (ContentFormat::Json, "application/json")];

/// A Content-Format code that is not in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnknownContentFormat(pub u16);

impl fmt::Display for UnknownContentFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown content format {}", self.0)
  }
}

impl ContentFormat {
  /// The registered MIME type, if this format has one
  pub fn mime(&self) -> Option<&'static str> {
    TABLE.iter().find(|(f, _)| f == self).map(|(_, m)| *m)
  }

  /// Look up a MIME type in the registry
  pub fn from_mime(mime: &str) -> Option<Self> {
    TABLE.iter().find(|(_, m)| *m == mime).map(|(f, _)| *f)
  }
}

/// Content-Format code for a MIME type.
///
/// `None` and unregistered MIME types both yield `None`.
///
/// ```
/// use iopi_msg::content_format::code_of;
///
/// assert_eq!(code_of(Some("application/json")), Some(50));
/// assert_eq!(code_of(Some("text/html")), None);
/// assert_eq!(code_of(None), None);
/// ```
pub fn code_of(mime: Option<&str>) -> Option<u16> {
  mime.and_then(ContentFormat::from_mime).map(|f| u16::from(&f))
}

/// MIME type for a Content-Format code.
///
/// `None` yields `Ok(None)`; a code outside the registry is an error.
///
/// ```
/// use iopi_msg::content_format::{string_of, UnknownContentFormat};
///
/// assert_eq!(string_of(Some(0)), Ok(Some("text/plain")));
/// assert_eq!(string_of(None), Ok(None));
/// assert_eq!(string_of(Some(9999)), Err(UnknownContentFormat(9999)));
/// ```
pub fn string_of(code: Option<u16>) -> Result<Option<&'static str>, UnknownContentFormat> {
  match code {
    | None => Ok(None),
    | Some(n) => ContentFormat::from(n).mime()
                                       .map(Some)
                                       .ok_or(UnknownContentFormat(n)),
  }
}

impl<'a> From<&'a ContentFormat> for u16 {
  fn from(f: &'a ContentFormat) -> Self {
    use ContentFormat::*;
    match *f {
      | Text => 0,
      | LinkFormat => 40,
      | Xml => 41,
      | OctetStream => 42,
      | Exi => 47,
      | Json => 50,
      | Other(n) => n,
    }
  }
}

impl From<ContentFormat> for u16 {
  fn from(f: ContentFormat) -> Self {
    u16::from(&f)
  }
}

impl From<u16> for ContentFormat {
  fn from(n: u16) -> Self {
    use ContentFormat::*;
    match n {
      | 0 => Text,
      | 40 => LinkFormat,
      | 41 => Xml,
      | 42 => OctetStream,
      | 47 => Exi,
      | 50 => Json,
      | n => Other(n),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn symmetric_for_every_registered_code() {
    for code in [0u16, 40, 41, 42, 47, 50] {
      let mime = string_of(Some(code)).unwrap();
      assert!(mime.is_some());
      assert_eq!(code_of(mime), Some(code));
      assert_eq!(string_of(code_of(mime)), Ok(mime));
    }
  }

  #[test]
  fn absence_survives() {
    assert_eq!(code_of(None), None);
    assert_eq!(string_of(None), Ok(None));
  }

  #[test]
  fn unknown_code_is_an_error() {
    assert_eq!(string_of(Some(1)), Err(UnknownContentFormat(1)));
    assert_eq!(ContentFormat::from(1).mime(), None);
  }

  #[test]
  fn other_roundtrips_numerically() {
    assert_eq!(u16::from(&ContentFormat::from(11542)), 11542);
    assert_eq!(u16::from(ContentFormat::Json), 50);
  }
}
