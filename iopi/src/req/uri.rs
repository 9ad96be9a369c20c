//! `coap://` URIs

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

/// Port used when a URI does not name one
pub const DEFAULT_PORT: u16 = 5683;

/// Errors encountered when parsing or resolving a URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// The URI did not start with `coap://`
  UnsupportedScheme(String),
  /// There was nothing between `coap://` and the path
  MissingHost,
  /// An IPv6 host was opened with `[` but never closed
  UnclosedBracket,
  /// The text after `:` was not a port number
  InvalidPort(String),
  /// The host could not be resolved to a socket address
  Unresolvable(String),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Error::UnsupportedScheme(s) => write!(f, "unsupported URI scheme {:?}, expected coap", s),
      | Error::MissingHost => write!(f, "URI has no host"),
      | Error::UnclosedBracket => write!(f, "IPv6 host is missing a closing ']'"),
      | Error::InvalidPort(p) => write!(f, "invalid port {:?}", p),
      | Error::Unresolvable(h) => write!(f, "could not resolve host {:?}", h),
    }
  }
}

impl std::error::Error for Error {}

/// A parsed `coap://host[:port]/path` URI.
///
/// Query strings and fragments are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
  /// Host name or address, without IPv6 brackets
  pub host: String,
  /// Destination port
  pub port: u16,
  /// Path, always starting with `/`
  pub path: String,
}

impl Uri {
  /// Parse a URI
  ///
  /// ```
  /// use iopi::req::uri::Uri;
  ///
  /// let uri = Uri::parse("coap://[::1]:1234/GPIO/25/value?x=1").unwrap();
  /// assert_eq!(uri.host, "::1");
  /// assert_eq!(uri.port, 1234);
  /// assert_eq!(uri.path, "/GPIO/25/value");
  /// ```
  pub fn parse(uri: &str) -> Result<Self, Error> {
    let rest = match uri.find("://") {
      | Some(ix) if uri[..ix].eq_ignore_ascii_case("coap") => &uri[ix + 3..],
      | Some(ix) => return Err(Error::UnsupportedScheme(uri[..ix].to_string())),
      | None => return Err(Error::UnsupportedScheme(String::new())),
    };

    let rest = rest.split(|c| c == '?' || c == '#').next().unwrap_or("");
    let (authority, path) = match rest.find('/') {
      | Some(ix) => rest.split_at(ix),
      | None => (rest, "/"),
    };

    let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
      let close = v6.find(']').ok_or(Error::UnclosedBracket)?;
      (&v6[..close], v6[close + 1..].strip_prefix(':'))
    } else {
      match authority.rfind(':') {
        | Some(ix) => (&authority[..ix], Some(&authority[ix + 1..])),
        | None => (authority, None),
      }
    };

    if host.is_empty() {
      return Err(Error::MissingHost);
    }

    let port = match port {
      | Some(p) => p.parse::<u16>()
                    .map_err(|_| Error::InvalidPort(p.to_string()))?,
      | None => DEFAULT_PORT,
    };

    Ok(Uri { host: host.to_string(),
             port,
             path: path.to_string() })
  }

  /// Resolve the host to the first socket address it names
  pub fn resolve(&self) -> Result<SocketAddr, Error> {
    let unresolvable = || Error::Unresolvable(self.host.clone());

    (self.host.as_str(), self.port).to_socket_addrs()
                                   .map_err(|_| unresolvable())?
                                   .next()
                                   .ok_or_else(unresolvable)
  }
}

#[cfg(test)]
mod tests {
  use std::net::Ipv4Addr;

  use super::*;

  #[test]
  fn parse_default_port() {
    let uri = Uri::parse("coap://127.0.0.1/GPIO/25/value").unwrap();
    assert_eq!(uri,
               Uri { host: "127.0.0.1".into(),
                     port: DEFAULT_PORT,
                     path: "/GPIO/25/value".into() });
  }

  #[test]
  fn parse_no_path() {
    let uri = Uri::parse("coap://224.0.1.123:5684").unwrap();
    assert_eq!(uri.port, 5684);
    assert_eq!(uri.path, "/");
  }

  #[test]
  fn parse_errors() {
    assert_eq!(Uri::parse("http://foo/bar"),
               Err(Error::UnsupportedScheme("http".into())));
    assert_eq!(Uri::parse("foo/bar"), Err(Error::UnsupportedScheme("".into())));
    assert_eq!(Uri::parse("coap:///bar"), Err(Error::MissingHost));
    assert_eq!(Uri::parse("coap://[::1/bar"), Err(Error::UnclosedBracket));
    assert_eq!(Uri::parse("coap://foo:bar/"), Err(Error::InvalidPort("bar".into())));
  }

  #[test]
  fn resolve() {
    let addr = Uri::parse("coap://127.0.0.1:9999/").unwrap()
                                                   .resolve()
                                                   .unwrap();
    assert_eq!(addr, SocketAddr::from((Ipv4Addr::LOCALHOST, 9999)));
  }
}
