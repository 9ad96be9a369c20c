//! Low-level representation of CoAP messages.
//!
//! The most notable item in `iopi_msg` is [`Message`];
//! a CoAP message very close to the actual byte layout.
//!
//! ## Options
//! A message carries an ordered list of [`Opt`]ions (in http terms: headers).
//! On the wire each option is stored as a _delta_ from the previous option's number,
//! so options are always kept in ascending number order. [`Message::add_option`]
//! maintains that order for you, and serializing a message whose options were
//! pushed out of order is an error rather than a silently corrupted datagram.
//!
//! The two options that the rest of `iopi` cares about are exposed as derived views:
//! - [`Message::path`] / [`Message::set_path`] over the repeated `Uri-Path` option
//! - [`Message::content_format`] / [`Message::set_content_format`] over `Content-Format`
//!
//! ```rust
//! use iopi_msg::{Code, Id, Message, TryFromBytes, TryIntoBytes, Type};
//!
//! let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(1));
//! msg.set_path("/GPIO/25/value");
//!
//! let bytes = msg.try_into_bytes().unwrap();
//! let parsed = Message::try_from_bytes(&bytes).unwrap();
//!
//! assert_eq!(parsed.path(), "/GPIO/25/value");
//! assert_eq!(parsed, msg);
//! ```
//!
//! ## Content formats
//! The [`content_format`] module holds the static table mapping Content-Format
//! codes to MIME types, and the two lookups used when bridging to and from the
//! plain-text HTTP transport.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(test), forbid(missing_debug_implementations))]
#![cfg_attr(not(test), warn(unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
#![deny(missing_docs)]

extern crate alloc as std_alloc;

mod cursor;

#[doc(hidden)]
pub mod from_bytes;

/// Message structs
pub mod msg;

#[doc(hidden)]
pub mod to_bytes;

#[doc(inline)]
pub use from_bytes::TryFromBytes;
#[doc(inline)]
pub use msg::*;
#[doc(inline)]
pub use to_bytes::TryIntoBytes;

#[cfg(test)]
pub(crate) fn test_msg() -> (Message, std_alloc::vec::Vec<u8>) {
  use std_alloc::vec;

  //                                    ver ty  tkl  code (2.05)  id
  let header: [u8; 4] = 0b_01_00_0001_010_00101_0000000000000001u32.to_be_bytes();
  let token: [u8; 1] = [254u8];
  let content_format: &[u8] = &[50];
  //                              delta 12, len 1
  let options: [&[u8]; 2] = [&[0b_1100_0001u8], content_format];
  let payload: [&[u8]; 2] = [&[0b1111_1111_u8], b"hello, world!"];
  let bytes = [header.as_ref(),
               token.as_ref(),
               options.concat().as_ref(),
               payload.concat().as_ref()].concat();

  let msg = Message { id: Id(1),
                      ty: Type::Con,
                      ver: Version(1),
                      token: Token(tinyvec::array_vec!([u8; 8] => 254)),
                      opts: vec![Opt::new(opt::known::CONTENT_FORMAT, OptValue(vec![50]))],
                      code: Code { class: 2,
                                   detail: 5 },
                      payload: Payload(b"hello, world!".to_vec()) };
  (msg, bytes)
}
