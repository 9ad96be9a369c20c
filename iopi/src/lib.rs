//! CoAP transport for the iopi sensor & actuator control surface.
//!
//! `iopi` answers the same requests as the plain-text HTTP transport,
//! over the Constrained Application Protocol: small binary datagrams on UDP.
//!
//! ## Pieces
//! - [`blocking::Client`] sends one request at a time, retransmitting on timeout,
//!   and yields the response or `None` once its attempts are exhausted.
//! - [`blocking::Server`] runs a receive loop on a worker thread, dispatching GET and POST
//!   requests to a [`RequestHandler`](handler::RequestHandler) and optionally joining
//!   the iopi multicast group.
//! - [`client::PiClient`] wraps a blocking client with the board's REST routes:
//!   GPIO reads and writes and macro calls.
//! - [`router::Router`] is the route table every transport shares.
//! - [`resp::code::http_to_coap`] maps the handlers' HTTP-style status codes
//!   onto CoAP response codes.
//!
//! ## Example
//! ```no_run
//! use iopi::blocking::{Client, Server};
//! use iopi::config::Config;
//! use iopi::net::Addrd;
//! use iopi::req::Req;
//! use iopi::router::{Args, Router};
//!
//! let mut router = Router::new();
//! router.get("GPIO/%(channel)d/value", |args: &Args| {
//!         let channel = args.int("channel")?;
//!         Ok(Some((channel % 2).into()))
//!       })
//!       .unwrap();
//!
//! let server = Server::try_new(5683, router, Config::default()).unwrap()
//!                                                               .start()
//!                                                               .unwrap();
//!
//! let mut client = Client::try_new_std().unwrap();
//! let req: Addrd<Req> = Req::get("coap://127.0.0.1/GPIO/25/value").unwrap();
//! let rep = client.send(req).unwrap();
//!
//! println!("{:?}", rep.and_then(|rep| rep.payload().map(|p| p.to_vec())));
//! server.stop().unwrap();
//! ```

#![cfg_attr(not(test), forbid(missing_debug_implementations))]
#![cfg_attr(not(test), warn(unreachable_pub))]
#![cfg_attr(not(test), deny(unsafe_code, missing_copy_implementations))]
#![cfg_attr(any(docsrs, feature = "docs"), feature(doc_cfg))]
#![deny(missing_docs)]

#[cfg(test)]
pub(crate) mod test;

/// Blocking client & server
pub mod blocking;

pub mod client;

/// Configuring runtime behavior
pub mod config;

pub mod handler;

/// Message summaries for log lines
pub mod logging;

/// Network abstractions
pub mod net;

/// `std` implementations of the network & clock abstractions
pub mod platform;

/// Requests
pub mod req;

/// Responses
pub mod resp;

/// Customizable retrying of fallible operations
pub mod retry;

pub mod router;

/// Time abstractions
pub mod time;

/// Well-known addresses
pub mod multicast {
  use std::net::Ipv4Addr;

  /// Multicast group the server joins when multicast is enabled
  pub const GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 1, 123);
}

pub use iopi_msg::{Code, ContentFormat, Message};

/// Target used for every log line emitted by this crate
pub(crate) const LOG_TARGET: &str = "iopi";

macro_rules! code {
  (rfc7252($section:literal) $name:ident = $c:literal . $d:literal) => {
    #[doc = toad_macros::rfc_7252_doc!($section)]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: iopi_msg::Code = iopi_msg::Code::new($c, $d);
  };
  (rfc7252($section:literal) $name:ident = $newtype:tt($c:literal . $d:literal)) => {
    #[doc = toad_macros::rfc_7252_doc!($section)]
    #[allow(clippy::zero_prefixed_literal)]
    pub const $name: $newtype = $newtype(iopi_msg::Code::new($c, $d));
  };
}

pub(crate) use code;
