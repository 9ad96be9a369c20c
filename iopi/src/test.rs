#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use embedded_time::rate::Fraction;
use embedded_time::Instant;
use iopi_msg::{Message, TryFromBytes, TryIntoBytes};

use crate::net::*;

pub(crate) fn dummy_addr() -> SocketAddr {
  SocketAddr::from((Ipv4Addr::new(192, 168, 0, 1), 8080))
}

pub(crate) fn dummy_addr_2() -> SocketAddr {
  SocketAddr::from((Ipv4Addr::new(192, 168, 0, 2), 8080))
}

/// A clock counting milliseconds, shared between clones.
///
/// Every `try_now` moves time forward by `step` milliseconds,
/// so loops that poll the clock make progress without sleeping.
#[derive(Debug, Clone, Default)]
pub struct ClockMock {
  millis: Arc<AtomicU64>,
  step: Arc<AtomicU64>,
}

impl ClockMock {
  pub fn new() -> Self {
    Self::default()
  }

  /// A clock that advances `step` milliseconds every time it is read
  pub fn stepping(step: u64) -> Self {
    let clock = Self::new();
    clock.step.store(step, Ordering::SeqCst);
    clock
  }

  pub fn set_millis(&self, to: u64) {
    self.millis.store(to, Ordering::SeqCst);
  }

  pub fn advance_millis(&self, by: u64) {
    self.millis.fetch_add(by, Ordering::SeqCst);
  }

  pub fn millis(&self) -> u64 {
    self.millis.load(Ordering::SeqCst)
  }
}

impl embedded_time::Clock for ClockMock {
  type T = u64;

  const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

  fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
    let step = self.step.load(Ordering::SeqCst);
    Ok(Instant::new(self.millis.fetch_add(step, Ordering::SeqCst)))
  }
}

/// A mocked socket
#[derive(Debug, Clone)]
pub struct SockMock {
  /// Inbound bytes from remote sockets. Address represents the sender
  pub rx: Arc<Mutex<Vec<Addrd<Vec<u8>>>>>,
  /// Outbound bytes to remote sockets. Address represents the destination
  pub tx: Arc<Mutex<Vec<Addrd<Vec<u8>>>>>,
  /// Multicast groups joined
  pub groups: Arc<Mutex<Vec<IpAddr>>>,
  /// Multicast TTL, if one was set
  pub ttl: Arc<Mutex<Option<u32>>>,
  addr: SocketAddr,
}

impl SockMock {
  pub fn new() -> Self {
    Self { rx: Default::default(),
           tx: Default::default(),
           groups: Default::default(),
           ttl: Default::default(),
           addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5683)) }
  }

  pub fn send_msg(&self, msg: Addrd<Message>) {
    self.rx
        .lock()
        .unwrap()
        .push(msg.map(|msg| msg.try_into_bytes().unwrap()));
  }

  /// Every datagram sent so far, decoded
  pub fn sent_msgs(&self) -> Vec<Addrd<Message>> {
    self.tx
        .lock()
        .unwrap()
        .iter()
        .map(|dgram| dgram.as_ref().map(|bytes| Message::try_from_bytes(bytes).unwrap()))
        .collect()
  }
}

impl Socket for SockMock {
  type Error = Option<()>;

  fn local_addr(&self) -> SocketAddr {
    self.addr
  }

  fn bind_raw<A: ToSocketAddrs>(addr: A) -> Result<Self, Self::Error> {
    let addr = addr.to_socket_addrs().ok().and_then(|mut a| a.next()).ok_or(None)?;
    Ok(Self { addr, ..Self::new() })
  }

  fn send(&self, msg: Addrd<&[u8]>) -> nb::Result<(), Self::Error> {
    self.tx.lock().unwrap().push(msg.map(|bytes| bytes.to_vec()));
    Ok(())
  }

  fn recv(&self, buf: &mut [u8]) -> nb::Result<Addrd<usize>, Self::Error> {
    let mut rx = self.rx.lock().unwrap();

    if rx.is_empty() {
      return Err(nb::Error::WouldBlock);
    }

    let dgram = rx.remove(0);
    let n = dgram.data().len().min(buf.len());
    buf[..n].copy_from_slice(&dgram.data()[..n]);

    Ok(dgram.map(|_| n))
  }

  fn join_multicast(&self, addr: IpAddr) -> Result<(), Self::Error> {
    self.groups.lock().unwrap().push(addr);
    Ok(())
  }

  fn set_multicast_ttl(&self, ttl: u32) -> Result<(), Self::Error> {
    *self.ttl.lock().unwrap() = Some(ttl);
    Ok(())
  }
}
