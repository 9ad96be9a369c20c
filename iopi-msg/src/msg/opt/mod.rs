use core::str;

use std_alloc::string::String;
use std_alloc::vec::Vec;
use toad_macros::rfc_7252_doc;

use crate::cursor::Cursor;
use crate::from_bytes::*;

/// Option numbers and content formats
pub mod known;

/// Option parsing errors
pub mod parse_error;
pub use parse_error::*;

/// Largest option delta or value length representable
/// by the extended header encoding (`269 + 0xFFFF`).
pub const MAX_EXTENDED: u32 = 269 + 0xFFFF;

pub(crate) fn parse_opt_len_or_delta<A: AsRef<[u8]>>(head: u8,
                                                     bytes: &mut Cursor<A>,
                                                     reserved_err: OptParseError)
                                                     -> Result<u32, OptParseError> {
  match head {
    | 13 => {
      let n = bytes.next().ok_or_else(OptParseError::eof)?;
      Ok((n as u32) + 13)
    },
    | 14 => match bytes.take_exact(2) {
      | Some(&[a, b]) => Ok(u16::from_be_bytes([a, b]) as u32 + 269),
      | _ => Err(OptParseError::eof()),
    },
    | 15 => Err(reserved_err),
    | _ => Ok(head as u32),
  }
}

#[doc = rfc_7252_doc!("5.4")]
/// <details><summary><b>RFC7252 Section 3.1 Option binary format</b></summary>
#[doc = concat!("\n#", rfc_7252_doc!("3.1"))]
/// </details>
///
/// # `Opt` struct
/// A CoAP Option and its absolute Option Number.
///
/// The wire format stores deltas between consecutive option numbers;
/// deltas are computed when serializing and accumulated when parsing.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct Opt {
  /// See [`OptNumber`]
  pub number: OptNumber,
  /// See [`OptValue`]
  pub value: OptValue,
}

impl Opt {
  /// Create an option
  pub fn new(number: OptNumber, value: OptValue) -> Self {
    Self { number, value }
  }

  /// Interpret this option's value according to the value format of its number
  ///
  /// ```
  /// use iopi_msg::opt::known::{CONTENT_FORMAT, ETAG, URI_PATH};
  /// use iopi_msg::{Opt, OptValue, OptValueRef};
  ///
  /// let path = Opt::new(URI_PATH, OptValue::from("GPIO"));
  /// assert_eq!(path.typed(), Some(OptValueRef::Str("GPIO")));
  ///
  /// let format = Opt::new(CONTENT_FORMAT, OptValue(vec![0, 50]));
  /// assert_eq!(format.typed(), Some(OptValueRef::Uint(50)));
  ///
  /// let etag = Opt::new(ETAG, OptValue(vec![0xFF]));
  /// assert_eq!(etag.typed(), Some(OptValueRef::Opaque(&[0xFF])));
  /// ```
  ///
  /// Yields `None` for string options whose value is not UTF-8,
  /// and for unsigned options longer than 8 bytes.
  pub fn typed(&self) -> Option<OptValueRef<'_>> {
    match self.number.kind() {
      | OptKind::Opaque => Some(OptValueRef::Opaque(&self.value.0)),
      | OptKind::Uint => self.value.as_uint().map(OptValueRef::Uint),
      | OptKind::String => self.value.as_str().map(OptValueRef::Str),
    }
  }

  /// Number of bytes this option occupies on the wire when it follows
  /// an option numbered `prev`
  pub fn get_size(&self, prev: OptNumber) -> usize {
    let ext = |n: u32| match n {
      | n if n >= 269 => 2,
      | n if n >= 13 => 1,
      | _ => 0,
    };

    let delta = self.number.0.saturating_sub(prev.0);
    1 + ext(delta) + ext(self.value.0.len() as u32) + self.value.0.len()
  }

  /// Given a collection to [`Extend`] and an Opt, add that Opt's bytes to the collection.
  ///
  /// `delta` is the difference between this option's number and the previous one's,
  /// and must already have been checked against [`MAX_EXTENDED`].
  pub(crate) fn extend_bytes(&self, delta: u32, bytes: &mut impl Extend<u8>) {
    let (del, del_bytes) = crate::to_bytes::opt_len_or_delta(delta);
    let (len, len_bytes) = crate::to_bytes::opt_len_or_delta(self.value.0.len() as u32);
    let del = del << 4;

    let header = del | len;

    bytes.extend(Some(header));

    if let Some(bs) = del_bytes {
      bytes.extend(bs);
    }

    if let Some(bs) = len_bytes {
      bytes.extend(bs);
    }

    bytes.extend(self.value.0.iter().copied());
  }
}

#[doc = rfc_7252_doc!("5.4.6")]
/// <details><summary><b>RFC7252 Section 12.2 Core CoAP Option Numbers</b></summary>
#[doc = concat!("\n#", rfc_7252_doc!("12.2"))]
/// </details>
///
/// # `OptNumber` struct
/// See [`known`] for the numbers this crate gives names to.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub struct OptNumber(pub u32);

/// How an option's value bytes should be interpreted
#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug)]
pub enum OptKind {
  /// Raw bytes (`If-Match`, `ETag`)
  Opaque,
  /// Big-endian unsigned integer with leading zero bytes omitted
  /// (`Uri-Port`, `Content-Format`, `Max-Age`, `Accept`)
  Uint,
  /// UTF-8 text (every other option)
  String,
}

impl OptNumber {
  /// The value format of options with this number
  ///
  /// ```
  /// use iopi_msg::opt::known::*;
  /// use iopi_msg::OptKind;
  ///
  /// assert_eq!(IF_MATCH.kind(), OptKind::Opaque);
  /// assert_eq!(MAX_AGE.kind(), OptKind::Uint);
  /// assert_eq!(URI_PATH.kind(), OptKind::String);
  /// ```
  pub fn kind(&self) -> OptKind {
    match *self {
      | known::IF_MATCH | known::ETAG => OptKind::Opaque,
      | known::URI_PORT | known::CONTENT_FORMAT | known::MAX_AGE | known::ACCEPT => OptKind::Uint,
      | _ => OptKind::String,
    }
  }

  /// Longest value, in bytes, an unsigned option with this number may carry
  ///
  /// ```
  /// use iopi_msg::opt::known::*;
  ///
  /// assert_eq!(CONTENT_FORMAT.max_uint_len(), Some(2));
  /// assert_eq!(MAX_AGE.max_uint_len(), Some(4));
  /// assert_eq!(URI_PATH.max_uint_len(), None);
  /// ```
  pub fn max_uint_len(&self) -> Option<usize> {
    match *self {
      | known::URI_PORT | known::CONTENT_FORMAT | known::ACCEPT => Some(2),
      | known::MAX_AGE => Some(4),
      | _ => None,
    }
  }
}

#[doc = rfc_7252_doc!("3.2")]
#[derive(Default, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct OptValue(pub Vec<u8>);

impl OptValue {
  /// Create a minimal-length unsigned integer option value
  ///
  /// ```
  /// use iopi_msg::OptValue;
  ///
  /// assert_eq!(OptValue::uint(0), OptValue(vec![]));
  /// assert_eq!(OptValue::uint(5683), OptValue(vec![0x16, 0x33]));
  /// ```
  pub fn uint(n: u64) -> Self {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    Self(bytes[skip..].to_vec())
  }

  /// Interpret the value as a big-endian unsigned integer.
  ///
  /// Empty values are 0. Values longer than 8 bytes do not fit and yield `None`.
  pub fn as_uint(&self) -> Option<u64> {
    match self.0.len() {
      | n if n > 8 => None,
      | _ => Some(self.0.iter().fold(0u64, |n, b| (n << 8) | (*b as u64))),
    }
  }

  /// Interpret the value as UTF-8
  pub fn as_str(&self) -> Option<&str> {
    str::from_utf8(&self.0).ok()
  }
}

impl From<Vec<u8>> for OptValue {
  fn from(v: Vec<u8>) -> Self {
    Self(v)
  }
}

impl From<&[u8]> for OptValue {
  fn from(v: &[u8]) -> Self {
    Self(v.to_vec())
  }
}

impl From<&str> for OptValue {
  fn from(s: &str) -> Self {
    Self(s.as_bytes().to_vec())
  }
}

impl From<String> for OptValue {
  fn from(s: String) -> Self {
    Self(s.into_bytes())
  }
}

/// A borrowed, typed view of an option value
///
/// See [`Opt::typed`]
#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug)]
pub enum OptValueRef<'a> {
  /// See [`OptKind::Opaque`]
  Opaque(&'a [u8]),
  /// See [`OptKind::Uint`]
  Uint(u64),
  /// See [`OptKind::String`]
  Str(&'a str),
}

impl<Bytes: AsRef<[u8]>> TryConsumeBytes<Bytes> for Vec<Opt> {
  type Error = OptParseError;

  fn try_consume_bytes(bytes: &mut Cursor<Bytes>) -> Result<Self, Self::Error> {
    let mut opts = Vec::new();
    let mut prev = OptNumber(0);

    loop {
      match Opt::try_consume_after(prev, bytes) {
        | Ok(opt) => {
          prev = opt.number;
          opts.push(opt);
        },
        | Err(OptParseError::OptionsExhausted) => break Ok(opts),
        | Err(e) => break Err(e),
      }
    }
  }
}

impl Opt {
  /// Parse the option following an option numbered `prev`
  fn try_consume_after<A: AsRef<[u8]>>(prev: OptNumber,
                                       bytes: &mut Cursor<A>)
                                       -> Result<Self, OptParseError> {
    let byte1 = bytes.next()
                     .ok_or(OptParseError::OptionsExhausted)
                     .and_then(|b| {
                       if b == 0b11111111 {
                         Err(OptParseError::OptionsExhausted)
                       } else {
                         Ok(b)
                       }
                     })?;

    // extended delta bytes precede extended length bytes
    let delta = parse_opt_len_or_delta(byte1 >> 4,
                                       bytes,
                                       OptParseError::OptionDeltaReservedValue(15))?;

    let len = parse_opt_len_or_delta(byte1 & 0b00001111,
                                     bytes,
                                     OptParseError::ValueLengthReservedValue(15))?
              as usize;

    let number = prev.0
                     .checked_add(delta)
                     .map(OptNumber)
                     .ok_or(OptParseError::NumberTooLarge)?;

    let value = bytes.take_exact(len).ok_or_else(OptParseError::eof)?;

    if number.kind() == OptKind::String && str::from_utf8(value).is_err() {
      return Err(OptParseError::ValueNotUtf8(number));
    }

    if number.max_uint_len().map_or(false, |max| value.len() > max) {
      return Err(OptParseError::UintTooLong(number));
    }

    Ok(Opt { number,
             value: OptValue(value.to_vec()) })
  }
}
