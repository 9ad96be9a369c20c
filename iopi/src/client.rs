//! Talking to an iopi board's REST surface over CoAP.
//!
//! [`PiClient`] wraps a [`blocking::Client`] bound to one destination and
//! speaks in paths rather than messages. [`Macro`] and [`Gpio`] build the
//! paths for macro calls and the GPIO routes.
//!
//! ```no_run
//! use iopi::client::PiClient;
//!
//! let mut pi = PiClient::coap("raspberrypi.local", 5683).unwrap();
//!
//! pi.gpio().set_function(17, "out").unwrap();
//! pi.gpio().digital_write(17, 1).unwrap();
//! assert_eq!(pi.gpio().digital_read(17).unwrap(), 1);
//!
//! pi.macro_("toggle").call(&[&17]).unwrap();
//! ```

use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};

use iopi_msg::Code;

use crate::blocking;
use crate::net::{Addrd, Socket};
use crate::req::{uri, Method, Req};
use crate::time::Clock;
use crate::{platform, LOG_TARGET};

/// Errors encounterable by a [`PiClient`]
#[derive(Debug)]
pub enum Error<E> {
  /// Sending the request failed
  Transport(blocking::Error<E>),
  /// Every attempt went unanswered
  NoResponse,
  /// The board answered with a code outside of 2.xx
  Refused {
    /// The response code
    code: Code,
    /// The response payload, usually the reason
    body: String,
  },
  /// A route expected to yield a number yielded something else
  NotANumber(String),
}

impl<E> From<blocking::Error<E>> for Error<E> {
  fn from(e: blocking::Error<E>) -> Self {
    Error::Transport(e)
  }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Error::Transport(e) => write!(f, "{}", e),
      | Error::NoResponse => write!(f, "No data received"),
      | Error::Refused { code, body } => write!(f, "request refused with {}: {}", code, body),
      | Error::NotANumber(body) => write!(f, "expected a number, got {:?}", body),
    }
  }
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}

/// A client bound to a single iopi board (or to every board, see [`PiClient::multicast`])
#[derive(Debug)]
pub struct PiClient<S: Socket = UdpSocket, C: Clock = platform::Clock> {
  client: blocking::Client<S, C>,
  dest: SocketAddr,
  non: bool,
}

impl PiClient<UdpSocket, platform::Clock> {
  /// Talk to the board at `host:port`
  pub fn coap(host: &str, port: u16) -> Result<Self, Error<std::io::Error>> {
    let dest = (host, port).to_socket_addrs()
                           .ok()
                           .and_then(|mut addrs| addrs.next())
                           .ok_or_else(|| uri::Error::Unresolvable(format!("{}:{}", host, port)))
                           .map_err(blocking::Error::from)?;

    Ok(Self::new(blocking::Client::try_new_std()?, dest))
  }

  /// Talk to every board listening on the iopi multicast group.
  ///
  /// Requests are sent non-confirmable, and the first board to
  /// answer provides the response.
  pub fn multicast(port: u16) -> Result<Self, Error<std::io::Error>> {
    let dest = SocketAddr::new(IpAddr::V4(crate::multicast::GROUP), port);
    Ok(Self::new(blocking::Client::try_new_std()?, dest).non_confirmable())
  }
}

impl<S: Socket, C: Clock> PiClient<S, C> {
  /// Send requests to `dest` through `client`
  pub fn new(client: blocking::Client<S, C>, dest: SocketAddr) -> Self {
    Self { client,
           dest,
           non: false }
  }

  /// Send every request as non-confirmable
  pub fn non_confirmable(mut self) -> Self {
    self.non = true;
    self
  }

  /// Where requests are sent
  pub fn dest(&self) -> SocketAddr {
    self.dest
  }

  /// Send a request for `path` and yield the response payload as text.
  ///
  /// An unanswered request is [`Error::NoResponse`]; a response with a
  /// code outside of 2.xx is [`Error::Refused`].
  pub fn send_request(&mut self, method: Method, path: &str) -> Result<String, Error<S::Error>> {
    let mut req = Req::new(method, path);
    if self.non {
      req.non();
    }

    log::trace!(target: LOG_TARGET, "{} {}{}", method, self.dest, path);

    let rep = self.client
                  .send(Addrd(req, self.dest))?
                  .ok_or(Error::NoResponse)?;

    let body = rep.payload()
                  .map(|p| String::from_utf8_lossy(p).into_owned())
                  .unwrap_or_default();

    match rep.code.class {
      | 2 => Ok(body),
      | _ => Err(Error::Refused { code: rep.code,
                                  body }),
    }
  }

  /// A macro registered on the board
  pub fn macro_(&mut self, name: &str) -> Macro<'_, S, C> {
    Macro { pi: self,
            path: format!("/macros/{}/", name) }
  }

  /// The board's native GPIO header
  pub fn gpio(&mut self) -> Gpio<'_, S, C> {
    Gpio { pi: self,
           path: "/GPIO".to_string() }
  }

  /// A digital I/O device (e.g. a GPIO expander) registered on the board as `name`
  pub fn gpio_device(&mut self, name: &str) -> Gpio<'_, S, C> {
    Gpio { pi: self,
           path: format!("/devices/{}/digital", name) }
  }
}

/// See [`PiClient::macro_`]
#[derive(Debug)]
pub struct Macro<'a, S: Socket, C: Clock> {
  pi: &'a mut PiClient<S, C>,
  path: String,
}

impl<'a, S: Socket, C: Clock> Macro<'a, S, C> {
  /// Call the macro with comma-joined `args`, yielding its result
  pub fn call(&mut self, args: &[&dyn fmt::Display]) -> Result<String, Error<S::Error>> {
    let args = args.iter()
                   .map(|a| a.to_string())
                   .collect::<Vec<_>>()
                   .join(",");

    let path = format!("{}{}", self.path, args);
    self.pi.send_request(Method::POST, &path)
  }
}

/// See [`PiClient::gpio`] and [`PiClient::gpio_device`]
#[derive(Debug)]
pub struct Gpio<'a, S: Socket, C: Clock> {
  pi: &'a mut PiClient<S, C>,
  path: String,
}

impl<'a, S: Socket, C: Clock> Gpio<'a, S, C> {
  fn get(&mut self, route: &str) -> Result<String, Error<S::Error>> {
    let path = format!("{}{}", self.path, route);
    self.pi.send_request(Method::GET, &path)
  }

  fn post(&mut self, route: &str) -> Result<String, Error<S::Error>> {
    let path = format!("{}{}", self.path, route);
    self.pi.send_request(Method::POST, &path)
  }

  fn int(body: String) -> Result<i64, Error<S::Error>> {
    body.trim().parse().map_err(|_| Error::NotANumber(body))
  }

  /// `IN`, `OUT` or an alternative function name
  pub fn get_function(&mut self, channel: u8) -> Result<String, Error<S::Error>> {
    self.get(&format!("/{}/function", channel))
  }

  /// Set a channel's function (`in` / `out`), yielding the function now set
  pub fn set_function(&mut self, channel: u8, function: &str) -> Result<String, Error<S::Error>> {
    self.post(&format!("/{}/function/{}", channel, function))
  }

  /// Read a channel's level
  pub fn digital_read(&mut self, channel: u8) -> Result<i64, Error<S::Error>> {
    self.get(&format!("/{}/value", channel)).and_then(Self::int)
  }

  /// Drive a channel, yielding the level now set
  pub fn digital_write(&mut self, channel: u8, value: u8) -> Result<i64, Error<S::Error>> {
    self.post(&format!("/{}/value/{}", channel, value))
        .and_then(Self::int)
  }

  /// Read every channel at once as a bitmask
  pub fn port_read(&mut self) -> Result<i64, Error<S::Error>> {
    self.get("/integer").and_then(Self::int)
  }

  /// Write every channel at once from a bitmask
  pub fn port_write(&mut self, value: i64) -> Result<i64, Error<S::Error>> {
    self.post(&format!("/integer/{}", value))
        .and_then(Self::int)
  }
}
