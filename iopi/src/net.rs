use std::fmt::Debug;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// Largest datagram read from a socket; longer datagrams are truncated
pub const DGRAM_CAPACITY: usize = 1500;

/// Data that came from (or is headed to) a network socket
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Clone, Copy)]
pub struct Addrd<T>(pub T, pub SocketAddr);

impl<T> Addrd<T> {
  /// Borrow the contents of this Addressed
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Discard the socket and get the data in this Addressed
  pub fn unwrap(self) -> T {
    self.0
  }

  /// Map the data contained in this Addressed
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// Borrow the contents of the addressed item
  pub fn data(&self) -> &T {
    &self.0
  }

  /// Mutably borrow the contents of the addressed item
  pub fn data_mut(&mut self) -> &mut T {
    &mut self.0
  }

  /// Copy the socket address for the data
  pub fn addr(&self) -> SocketAddr {
    self.1
  }
}

impl<T> AsMut<T> for Addrd<T> {
  fn as_mut(&mut self) -> &mut T {
    &mut self.0
  }
}

/// A CoAP network socket
///
/// This mirrors the Udp socket traits in embedded-nal, but allows us to implement them for foreign types (like `std::net::UdpSocket`).
///
/// Every operation is non-blocking; "no datagram yet" is [`nb::Error::WouldBlock`].
pub trait Socket: Sized {
  /// The error yielded by socket operations
  type Error: Debug;

  /// Get the local address this socket was created from
  fn local_addr(&self) -> SocketAddr;

  /// Bind the socket to an address, without doing any spooky magic things like
  /// joining multicast groups.
  ///
  /// Implementors of `bind_raw` should:
  ///  - yield a socket in a non-blocking state
  ///  - bind to the first address if `addr` yields multiple addresses
  fn bind_raw<A: ToSocketAddrs>(addr: A) -> Result<Self, Self::Error>;

  /// Send a message to a remote address
  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error>;

  /// Pull a buffered datagram from the socket, along with the address to the sender.
  ///
  /// It is expected that (like [`std::net::UdpSocket`]) if the message is larger
  /// than the buffer, those bytes are dropped and not considered an error condition.
  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error>;

  /// Poll the socket for a datagram
  fn poll(&self) -> Result<Option<Addrd<Vec<u8>>>, Self::Error> {
    let mut buf = [0u8; DGRAM_CAPACITY];
    let recvd = self.recv(&mut buf);

    match recvd {
      | Ok(Addrd(n, addr)) => Ok(Some(Addrd(buf[..n.min(DGRAM_CAPACITY)].to_vec(), addr))),
      | Err(nb::Error::WouldBlock) => Ok(None),
      | Err(nb::Error::Other(e)) => Err(e),
    }
  }

  /// Join a multicast group
  fn join_multicast(&self, addr: IpAddr) -> Result<(), Self::Error>;

  /// Set the number of hops outbound multicast datagrams may take
  fn set_multicast_ttl(&self, ttl: u32) -> Result<(), Self::Error>;
}
