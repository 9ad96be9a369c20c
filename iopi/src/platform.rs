use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};

use embedded_time::rate::Fraction;

use crate::net::{Addrd, Socket};

/// Implement [`embedded_time::Clock`] using [`std::time`] primitives
#[derive(Debug, Clone, Copy)]
pub struct Clock(std::time::Instant);

impl Default for Clock {
  fn default() -> Self {
    Self::new()
  }
}

impl Clock {
  /// Create a new clock
  pub fn new() -> Self {
    Self(std::time::Instant::now())
  }
}

impl embedded_time::Clock for Clock {
  type T = u64;

  // microseconds
  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

  fn try_now(&self) -> Result<embedded_time::Instant<Self>, embedded_time::clock::Error> {
    let now = std::time::Instant::now();
    let elapsed = now.duration_since(self.0);
    Ok(embedded_time::Instant::new(elapsed.as_micros() as u64))
  }
}

fn io_to_nb(err: io::Error) -> nb::Error<io::Error> {
  match err.kind() {
    | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => nb::Error::WouldBlock,
    | _ => nb::Error::Other(err),
  }
}

impl Socket for UdpSocket {
  type Error = io::Error;

  fn local_addr(&self) -> SocketAddr {
    UdpSocket::local_addr(self).unwrap_or_else(|_| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
  }

  fn bind_raw<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
    let addr = addr.to_socket_addrs()?
                   .next()
                   .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address to bind"))?;

    let sock = UdpSocket::bind(addr)?;
    sock.set_nonblocking(true)?;
    Ok(sock)
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), io::Error> {
    self.send_to(msg.data(), msg.addr())
        .map(|_| ())
        .map_err(io_to_nb)
  }

  fn recv(&self, buffer: &mut [u8]) -> nb::Result<Addrd<usize>, io::Error> {
    self.recv_from(buffer)
        .map(|(n, addr)| Addrd(n, addr))
        .map_err(io_to_nb)
  }

  fn join_multicast(&self, addr: IpAddr) -> io::Result<()> {
    match addr {
      | IpAddr::V4(addr) => self.join_multicast_v4(&addr, &Ipv4Addr::UNSPECIFIED),
      | IpAddr::V6(addr) => self.join_multicast_v6(&addr, 0),
    }
  }

  fn set_multicast_ttl(&self, ttl: u32) -> io::Result<()> {
    self.set_multicast_ttl_v4(ttl)
  }
}

#[cfg(test)]
mod tests {
  use embedded_time::duration::Milliseconds;
  use embedded_time::Clock as _;

  use super::*;

  #[test]
  fn clock_moves_forward() {
    let clock = Clock::new();
    let a = clock.try_now().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = clock.try_now().unwrap();

    let elapsed = Milliseconds::<u64>::try_from(b - a).unwrap();
    assert!(elapsed >= Milliseconds(2u64));
  }

  #[test]
  fn udp_socket_is_nonblocking() {
    let sock = <UdpSocket as Socket>::bind_raw("127.0.0.1:0").unwrap();
    assert!(matches!(Socket::recv(&sock, &mut [0u8; 8]), Err(nb::Error::WouldBlock)));
    assert_eq!(sock.poll().unwrap(), None);
  }

  #[test]
  fn udp_socket_roundtrip() {
    let a = <UdpSocket as Socket>::bind_raw("127.0.0.1:0").unwrap();
    let b = <UdpSocket as Socket>::bind_raw("127.0.0.1:0").unwrap();

    nb::block!(Socket::send(&a, Addrd(b"hi".as_ref(), Socket::local_addr(&b)))).unwrap();

    let got = loop {
      if let Some(dgram) = b.poll().unwrap() {
        break dgram;
      }
    };

    assert_eq!(got, Addrd(b"hi".to_vec(), Socket::local_addr(&a)));
  }
}
