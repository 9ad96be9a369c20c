use tinyvec::ArrayVec;
use toad_macros::rfc_7252_doc;

use super::MessageParseError;
use crate::cursor::Cursor;

#[doc = rfc_7252_doc!("5.3.1")]
#[derive(Copy, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Token(pub ArrayVec<[u8; 8]>);

impl Token {
  /// Copy up to 8 bytes into a token, yielding `None` if `bytes` is longer than that
  ///
  /// ```
  /// use iopi_msg::Token;
  ///
  /// assert_eq!(Token::from_slice(&[1, 2]).map(|t| t.0.len()), Some(2));
  /// assert_eq!(Token::from_slice(&[0; 9]), None);
  /// ```
  pub fn from_slice(bytes: &[u8]) -> Option<Self> {
    ArrayVec::try_from(bytes).ok().map(Token)
  }

  /// Read a token of `tkl` bytes
  pub(crate) fn consume<A: AsRef<[u8]>>(bytes: &mut Cursor<A>,
                                        tkl: u8)
                                        -> Result<Self, MessageParseError> {
    bytes.take_exact(tkl as usize)
         .ok_or_else(MessageParseError::eof)
         .and_then(|bs| Token::from_slice(bs).ok_or(MessageParseError::InvalidTokenLength(tkl)))
  }
}
