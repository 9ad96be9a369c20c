use core::fmt;

use std_alloc::vec::Vec;
use tinyvec::ArrayVec;

use crate::*;

/// Trait allowing fallible conversion into bytes
pub trait TryIntoBytes {
  /// Error type yielded if conversion fails
  type Error;

  /// Try to convert into a collection of bytes
  ///
  /// ```
  /// use iopi_msg::{Code, Id, Message, TryIntoBytes, Type};
  ///
  /// let mut msg = Message::new(Type::Non, Code::new(0, 1), Id(0));
  /// msg.set_path("/devices");
  ///
  /// let bytes: Vec<u8> = msg.try_into_bytes().unwrap();
  /// assert_eq!(bytes[0], 0b_01_01_0000);
  /// ```
  fn try_into_bytes(&self) -> Result<Vec<u8>, Self::Error>;
}

/// Errors encounterable serializing to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageToBytesError {
  /// An option's number was lower than the option before it
  OptionsOutOfOrder {
    /// Number of the option before the offending one
    prev: OptNumber,
    /// Number of the offending option
    number: OptNumber,
  },
  /// Gap between two consecutive option numbers is too large to encode
  OptionDeltaTooLarge(OptNumber),
  /// Option value is too long to encode
  OptionValueTooLong(OptNumber),
}

impl fmt::Display for MessageToBytesError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::OptionsOutOfOrder { prev, number } => {
        write!(f, "option {} follows option {}", number.0, prev.0)
      },
      | Self::OptionDeltaTooLarge(n) => write!(f, "delta to option {} is too large", n.0),
      | Self::OptionValueTooLong(n) => write!(f, "value of option {} is too long", n.0),
    }
  }
}

impl Message {
  /// Number of bytes this message occupies on the wire
  pub fn get_size(&self) -> usize {
    let header_size = 4;
    let token_size = self.token.0.len();
    let payload_size = match self.payload.0.len() {
      | 0 => 0,
      | n => n + 1,
    };

    let (opts_size, _) = self.opts
                             .iter()
                             .fold((0, OptNumber(0)), |(size, prev), o| {
                               (size + o.get_size(prev), o.number)
                             });

    header_size + token_size + opts_size + payload_size
  }
}

impl TryIntoBytes for Message {
  type Error = MessageToBytesError;

  fn try_into_bytes(&self) -> Result<Vec<u8>, Self::Error> {
    let mut bytes = Vec::with_capacity(self.get_size());

    let byte1: u8 = Byte1 { tkl: self.token.0.len() as u8,
                            ver: self.ver,
                            ty: self.ty }.into();
    let code: u8 = self.code.into();
    let id: [u8; 2] = self.id.into();

    bytes.push(byte1);
    bytes.push(code);

    bytes.extend(id);
    bytes.extend(self.token.0);

    let mut prev = OptNumber(0);
    for o in self.opts.iter() {
      let delta = o.number
                   .0
                   .checked_sub(prev.0)
                   .ok_or(Self::Error::OptionsOutOfOrder { prev,
                                                           number: o.number })?;

      if delta > opt::MAX_EXTENDED {
        return Err(Self::Error::OptionDeltaTooLarge(o.number));
      }

      if o.value.0.len() > opt::MAX_EXTENDED as usize {
        return Err(Self::Error::OptionValueTooLong(o.number));
      }

      o.extend_bytes(delta, &mut bytes);
      prev = o.number;
    }

    if !self.payload.0.is_empty() {
      bytes.push(0b11111111);
      bytes.extend_from_slice(&self.payload.0);
    }

    Ok(bytes)
  }
}

/// Header nibble and extension bytes for an option delta or length.
///
/// `val` must not exceed [`opt::MAX_EXTENDED`].
pub(crate) fn opt_len_or_delta(val: u32) -> (u8, Option<ArrayVec<[u8; 2]>>) {
  match val {
    | n if n >= 269 => {
      let mut bytes = ArrayVec::new();
      bytes.extend(((n - 269) as u16).to_be_bytes());
      (14, Some(bytes))
    },
    | n if n >= 13 => {
      let mut bytes = ArrayVec::new();
      bytes.push((n - 13) as u8);
      (13, Some(bytes))
    },
    | n => (n as u8, None),
  }
}

impl From<Id> for [u8; 2] {
  fn from(id: Id) -> [u8; 2] {
    id.0.to_be_bytes()
  }
}

impl From<Type> for u8 {
  fn from(t: Type) -> u8 {
    use Type::*;
    match t {
      | Con => 0,
      | Non => 1,
      | Ack => 2,
      | Reset => 3,
    }
  }
}

impl From<Byte1> for u8 {
  fn from(b: Byte1) -> u8 {
    let ver = b.ver.0 << 6;
    let ty = u8::from(b.ty) << 4;
    let tkl = b.tkl;

    ver | ty | tkl
  }
}
