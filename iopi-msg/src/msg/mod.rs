use std_alloc::string::String;
use std_alloc::vec::Vec;
use toad_macros::rfc_7252_doc;

use crate::cursor::Cursor;

/// Message Code
pub mod code;

/// Message parsing errors
pub mod parse_error;

/// Message ID
pub mod id;

/// Message Options
pub mod opt;

/// Message Type
pub mod ty;

/// Message Token
pub mod token;

/// Message Version
pub mod ver;

pub use code::*;
pub use id::*;
pub use opt::known::{content_format, ContentFormat};
pub use opt::*;
pub use parse_error::*;
pub use token::*;
pub use ty::*;
pub use ver::*;

use crate::from_bytes::TryConsumeBytes;
use crate::TryFromBytes;

#[doc = rfc_7252_doc!("5.5")]
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Payload(pub Vec<u8>);

/// Struct representing the first byte of a message.
///
/// ```text
/// CoAP version
/// |
/// |  Message type (request, response, empty)
/// |  |
/// |  |  Length of token, in bytes. (4-bit integer)
/// |  |  |
/// vv vv vvvv
/// 01 00 0000
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Byte1 {
  pub(crate) ver: Version,
  pub(crate) ty: Type,
  pub(crate) tkl: u8,
}

impl TryFrom<u8> for Byte1 {
  type Error = MessageParseError;

  fn try_from(b: u8) -> Result<Self, Self::Error> {
    let ver = b >> 6; // bits 0 & 1
    let ty = b >> 4 & 0b11; // bits 2 & 3
    let tkl = b & 0b1111u8; // last 4 bits

    Ok(Byte1 { ver: Version(ver),
               ty: Type::try_from(ty)?,
               tkl })
  }
}

/// # `Message` struct
/// Low-level representation of a CoAP message.
///
/// Options are stored with their absolute [`OptNumber`] and must be kept in ascending
/// order; [`Message::add_option`] does this for you. The request path and content
/// format are not separate fields, they are views over the `Uri-Path` and
/// `Content-Format` options.
///
/// Messages support both serializing to bytes and from bytes, by using the provided [`TryFromBytes`] and [`TryIntoBytes`](crate::TryIntoBytes) traits.
///
/// <details>
/// <summary><b>RFC7252 - CoAP Messaging Model</b></summary>
#[doc = concat!("\n#", rfc_7252_doc!("2.1"))]
/// </details>
/// <details>
/// <summary><b>RFC7252 - CoAP Message Binary Format</b></summary>
#[doc = concat!("\n#", rfc_7252_doc!("3"))]
/// </details>
///
/// ```
/// use iopi_msg::*;
/// # //                       version  token len  code (2.05 Content)
/// # //                       |        |          /
/// # //                       |  type  |         /  message ID
/// # //                       |  |     |        |   |
/// # //                       vv vv vvvv vvvvvvvv vvvvvvvvvvvvvvvv
/// # let header: [u8; 4] = 0b_01_00_0001_01000101_0000000000000001u32.to_be_bytes();
/// # let token: [u8; 1] = [254u8];
/// # let options: [&[u8]; 2] = [&[0b_1100_0001u8], &[50]];
/// # let payload: [&[u8]; 2] = [&[0b_11111111u8], b"{\"value\": 1}"];
/// let packet: Vec<u8> = /* bytes! */
/// # [header.as_ref(), token.as_ref(), options.concat().as_ref(), payload.concat().as_ref()].concat();
///
/// let msg = Message::try_from_bytes(&packet).unwrap();
///
/// assert_eq!(msg.code, Code::new(2, 5));
/// assert_eq!(msg.content_format(), Some(50));
/// assert_eq!(msg.payload(), Some(b"{\"value\": 1}".as_ref()));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Message {
  /// see [`Id`] for details
  pub id: Id,
  /// see [`Type`] for details
  pub ty: Type,
  /// see [`Version`] for details
  pub ver: Version,
  /// see [`Token`] for details
  pub token: Token,
  /// see [`Code`] for details
  pub code: Code,
  /// see [`opt::Opt`] for details
  pub opts: Vec<Opt>,
  /// see [`Payload`]
  pub payload: Payload,
}

impl Message {
  /// Create a message with no token, options or payload
  ///
  /// ```
  /// use iopi_msg::{Code, Id, Message, Type};
  ///
  /// let get = Message::new(Type::Con, Code::new(0, 1), Id(12));
  /// assert_eq!(get.path(), "");
  /// assert_eq!(get.payload(), None);
  /// ```
  pub fn new(ty: Type, code: Code, id: Id) -> Self {
    Self { id,
           ty,
           code,
           ver: Version::default(),
           token: Token::default(),
           opts: Vec::new(),
           payload: Payload::default() }
  }

  /// Insert an option, keeping options sorted by number.
  ///
  /// Options sharing a number keep the order they were added in.
  ///
  /// ```
  /// use iopi_msg::opt::known::{CONTENT_FORMAT, URI_PATH};
  /// use iopi_msg::{Code, Id, Message, Type};
  ///
  /// let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1));
  /// msg.add_option(CONTENT_FORMAT, vec![50u8]);
  /// msg.add_option(URI_PATH, "a");
  /// msg.add_option(URI_PATH, "b");
  ///
  /// let numbers = msg.opts.iter().map(|o| o.number.0).collect::<Vec<_>>();
  /// assert_eq!(numbers, vec![11, 11, 12]);
  /// assert_eq!(msg.path(), "/a/b");
  /// ```
  pub fn add_option<V: Into<OptValue>>(&mut self, number: OptNumber, value: V) {
    let ix = self.opts.partition_point(|o| o.number <= number);
    self.opts.insert(ix, Opt::new(number, value.into()));
  }

  /// Iterate over the values of every option with number `number`
  pub fn get(&self, number: OptNumber) -> impl Iterator<Item = &OptValue> {
    self.opts
        .iter()
        .filter(move |o| o.number == number)
        .map(|o| &o.value)
  }

  /// Remove every option with number `number`, yielding how many were removed
  pub fn remove(&mut self, number: OptNumber) -> usize {
    let before = self.opts.len();
    self.opts.retain(|o| o.number != number);
    before - self.opts.len()
  }

  /// The request path, built from every `Uri-Path` option in order.
  ///
  /// Each segment is prefixed with `/`, so a message without
  /// `Uri-Path` options has the path `""`.
  pub fn path(&self) -> String {
    self.get(opt::known::URI_PATH)
        .fold(String::new(), |mut path, seg| {
          path.push('/');
          path.push_str(&String::from_utf8_lossy(&seg.0));
          path
        })
  }

  /// Replace the `Uri-Path` options with one option per
  /// non-empty `/`-delimited segment of `path`.
  ///
  /// ```
  /// use iopi_msg::opt::known::URI_PATH;
  /// use iopi_msg::{Code, Id, Message, Type};
  ///
  /// let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1));
  /// msg.set_path("//GPIO/25/");
  ///
  /// assert_eq!(msg.get(URI_PATH).count(), 2);
  /// assert_eq!(msg.path(), "/GPIO/25");
  /// ```
  pub fn set_path(&mut self, path: &str) {
    self.remove(opt::known::URI_PATH);
    path.split('/')
        .filter(|seg| !seg.is_empty())
        .for_each(|seg| self.add_option(opt::known::URI_PATH, seg));
  }

  /// The `Content-Format` of this message's payload, if one was set.
  ///
  /// A value wider than 2 bytes is not a content format and yields `None`;
  /// decoding rejects such messages outright.
  pub fn content_format(&self) -> Option<u16> {
    self.get(opt::known::CONTENT_FORMAT)
        .next()
        .and_then(OptValue::as_uint)
        .and_then(|n| u16::try_from(n).ok())
  }

  /// Set or clear the `Content-Format` option.
  ///
  /// Formats that fit in one byte are written as one byte, otherwise two.
  pub fn set_content_format(&mut self, format: Option<u16>) {
    self.remove(opt::known::CONTENT_FORMAT);

    if let Some(format) = format {
      let value = match u8::try_from(format) {
        | Ok(b) => std_alloc::vec![b],
        | Err(_) => format.to_be_bytes().to_vec(),
      };
      self.add_option(opt::known::CONTENT_FORMAT, value);
    }
  }

  /// The payload, or `None` when it is empty
  pub fn payload(&self) -> Option<&[u8]> {
    match self.payload.0.as_slice() {
      | [] => None,
      | bytes => Some(bytes),
    }
  }

  /// Replace the payload
  pub fn set_payload<P: Into<Vec<u8>>>(&mut self, payload: P) {
    self.payload = Payload(payload.into());
  }
}

impl<Bytes: AsRef<[u8]>> TryFromBytes<Bytes> for Message {
  type Error = MessageParseError;

  fn try_from_bytes(bytes: Bytes) -> Result<Self, Self::Error> {
    let mut bytes = Cursor::new(bytes);

    let Byte1 { tkl, ty, ver } = bytes.next().ok_or_else(MessageParseError::eof)?.try_into()?;

    if tkl > 8 {
      return Err(Self::Error::InvalidTokenLength(tkl));
    }

    let code: Code = bytes.next().ok_or_else(MessageParseError::eof)?.into();
    let id: Id = Id::try_consume_bytes(&mut bytes)?;
    let token = Token::consume(&mut bytes, tkl)?;

    let opts = Vec::<Opt>::try_consume_bytes(&mut bytes)?;
    let payload = Payload(bytes.take_until_end().to_vec());

    Ok(Message { id,
                 ty,
                 ver,
                 code,
                 token,
                 opts,
                 payload })
  }
}

#[cfg(test)]
mod tests {
  use std_alloc::vec;

  use super::*;
  use crate::opt::known::*;

  #[test]
  fn parse_msg() {
    let (expect, msg) = crate::test_msg();
    assert_eq!(Message::try_from_bytes(&msg).unwrap(), expect)
  }

  #[test]
  fn parse_byte1() {
    let byte = 0b_01_10_0011u8;
    let byte = Byte1::try_from(byte).unwrap();
    assert_eq!(byte,
               Byte1 { ver: Version(1),
                       ty: Type::Ack,
                       tkl: 3 })
  }

  #[test]
  fn parse_id() {
    let mut id_bytes = Cursor::new(34u16.to_be_bytes());
    let id = Id::try_consume_bytes(&mut id_bytes).unwrap();
    assert_eq!(id, Id(34));
  }

  #[test]
  fn parse_rejects_long_token() {
    let bytes = [0b_01_00_1001u8, 0b_000_00001, 0, 1];
    assert_eq!(Message::try_from_bytes(bytes),
               Err(MessageParseError::InvalidTokenLength(9)));
  }

  #[test]
  fn parse_rejects_truncated() {
    assert_eq!(Message::try_from_bytes([0u8; 0]), Err(MessageParseError::eof()));
    assert_eq!(Message::try_from_bytes([0b_01_00_0000u8, 1, 0]),
               Err(MessageParseError::eof()));

    // token length 2, only 1 token byte
    assert_eq!(Message::try_from_bytes([0b_01_00_0010u8, 1, 0, 1, 9]),
               Err(MessageParseError::eof()));

    // option claims 3 value bytes, only 1 present
    assert_eq!(Message::try_from_bytes([0b_01_00_0000u8, 1, 0, 1, 0b_1011_0011, b'a']),
               Err(MessageParseError::OptParseError(OptParseError::eof())));
  }

  #[test]
  fn payload_marker_without_payload_is_empty() {
    let msg = Message::try_from_bytes([0b_01_01_0000u8, 1, 0, 7, 0xFF]).unwrap();
    assert_eq!(msg.ty, Type::Non);
    assert_eq!(msg.id, Id(7));
    assert_eq!(msg.payload(), None);
  }

  #[test]
  fn path_spans_uri_path_options() {
    let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1));
    msg.set_path("/GPIO/25/value");

    let segs = msg.get(URI_PATH).map(|v| v.0.clone()).collect::<Vec<_>>();
    assert_eq!(segs, vec![b"GPIO".to_vec(), b"25".to_vec(), b"value".to_vec()]);
    assert_eq!(msg.path(), "/GPIO/25/value");

    msg.set_path("devices");
    assert_eq!(msg.path(), "/devices");
  }

  #[test]
  fn content_format_width() {
    let mut msg = Message::new(Type::Con, Code::new(2, 5), Id(1));
    assert_eq!(msg.content_format(), None);

    msg.set_content_format(Some(0));
    assert_eq!(msg.get(CONTENT_FORMAT).next(), Some(&OptValue(vec![0])));
    assert_eq!(msg.content_format(), Some(0));

    msg.set_content_format(Some(50));
    assert_eq!(msg.get(CONTENT_FORMAT).count(), 1);
    assert_eq!(msg.content_format(), Some(50));

    msg.set_content_format(Some(11542));
    assert_eq!(msg.get(CONTENT_FORMAT).next(),
               Some(&OptValue(11542u16.to_be_bytes().to_vec())));
    assert_eq!(msg.content_format(), Some(11542));

    msg.set_content_format(None);
    assert_eq!(msg.content_format(), None);
  }

  #[test]
  fn wide_content_format_is_not_a_known_one() {
    //              ver ty tkl   code 2.05     id   cf (delta 12, len 3)   65586
    let bytes = [0b_01_00_0000, 0b_010_00101, 0, 1, 0b_1100_0011, 0x01, 0x00, 0x32];
    assert_eq!(Message::try_from_bytes(bytes),
               Err(MessageParseError::OptParseError(OptParseError::UintTooLong(CONTENT_FORMAT))));

    let mut msg = Message::new(Type::Ack, Code::new(2, 5), Id(1));
    msg.opts.push(Opt::new(CONTENT_FORMAT, OptValue(vec![0x01, 0x00, 0x32])));
    assert_eq!(msg.content_format(), None);
  }
}
