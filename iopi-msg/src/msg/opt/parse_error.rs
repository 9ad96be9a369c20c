use core::fmt;

use super::known;
use super::OptNumber;

/// Errors encounterable while parsing an option from bytes
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord)]
pub enum OptParseError {
  /// Reached end of stream before parsing was finished
  UnexpectedEndOfStream,

  /// Option Delta was set to 15, which is invalid.
  OptionDeltaReservedValue(u8),

  /// Value Length was set to 15, which is invalid.
  ValueLengthReservedValue(u8),

  /// The value of an option that carries a string was not valid UTF-8
  ValueNotUtf8(OptNumber),

  /// An unsigned integer option was longer than its number allows,
  /// e.g. a 3-byte `Content-Format`
  UintTooLong(OptNumber),

  /// Accumulated option deltas overflowed the option number
  NumberTooLarge,

  /// Not a true failure case; only means we tried to read the payload marker byte (0xFF)
  /// as an option header.
  OptionsExhausted,
}

impl OptParseError {
  /// Shorthand for [`OptParseError::UnexpectedEndOfStream`]
  pub fn eof() -> Self {
    Self::UnexpectedEndOfStream
  }
}

impl fmt::Display for OptParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::UnexpectedEndOfStream => write!(f, "option ran past the end of the message"),
      | Self::OptionDeltaReservedValue(n) => write!(f, "option delta nibble {} is reserved", n),
      | Self::ValueLengthReservedValue(n) => write!(f, "option length nibble {} is reserved", n),
      | Self::ValueNotUtf8(n) => write!(f, "value of {} is not utf8", Named(*n)),
      | Self::UintTooLong(n) => write!(f, "value of {} is too long", Named(*n)),
      | Self::NumberTooLarge => write!(f, "option number overflowed"),
      | Self::OptionsExhausted => write!(f, "no more options"),
    }
  }
}

struct Named(OptNumber);

impl fmt::Display for Named {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match known::name(self.0) {
      | Some(name) => write!(f, "{} ({})", name, self.0 .0),
      | None => write!(f, "option {}", self.0 .0),
    }
  }
}

#[cfg(test)]
mod tests {
  use std_alloc::string::ToString;

  use super::*;

  #[test]
  fn display_names_known_options() {
    assert_eq!(OptParseError::UintTooLong(known::CONTENT_FORMAT).to_string(),
               "value of Content-Format (12) is too long");
    assert_eq!(OptParseError::ValueNotUtf8(OptNumber(2)).to_string(),
               "value of option 2 is not utf8");
  }
}
