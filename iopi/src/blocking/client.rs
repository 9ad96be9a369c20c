use std::net::UdpSocket;

use embedded_time::duration::Milliseconds;
use embedded_time::Instant;
use iopi_msg::{Id, Message, TryFromBytes, TryIntoBytes};
use rand::{Rng, SeedableRng};

use super::Error;
use crate::config::Config;
use crate::logging::msg_summary;
use crate::net::{Addrd, Socket};
use crate::retry::{RetryTimer, YouShould};
use crate::time::{Clock, Millis};
use crate::{platform, LOG_TARGET};

/// A client that sends one request at a time and
/// waits for its response.
///
/// Any datagram received while waiting is taken to be the response;
/// there is no correlation by message id or token.
///
/// ```no_run
/// use iopi::blocking::Client;
/// use iopi::req::Req;
///
/// let mut client = Client::try_new_std().unwrap();
/// let mut req = Req::post("coap://224.0.1.123/GPIO/25/value/1").unwrap();
/// req.as_mut().non();
///
/// match client.send(req).unwrap() {
///   | Some(rep) => println!("{:?}", rep.payload()),
///   | None => println!("nobody answered"),
/// }
/// ```
#[derive(Debug)]
pub struct Client<S: Socket = UdpSocket, C: Clock = platform::Clock> {
  sock: S,
  clock: C,
  config: Config,
  id: Id,
}

impl Client<UdpSocket, platform::Clock> {
  /// Bind a client to an ephemeral port on all interfaces,
  /// with the default [`Config`].
  pub fn try_new_std() -> Result<Self, Error<std::io::Error>> {
    let sock = <UdpSocket as Socket>::bind_raw(("0.0.0.0", 0)).map_err(Error::Sock)?;
    Self::new(sock, platform::Clock::new(), Config::default())
  }
}

impl<S: Socket, C: Clock> Client<S, C> {
  /// Create a client over a bound socket.
  ///
  /// This sets the socket's multicast TTL to `config.client.multicast_ttl`.
  pub fn new(sock: S, clock: C, config: Config) -> Result<Self, Error<S::Error>> {
    sock.set_multicast_ttl(config.client.multicast_ttl)
        .map_err(Error::Sock)?;

    let now = clock.try_now().map_err(Error::Clock)?;
    let id = Self::seed_id(now, config.client.msg_id_seed);

    Ok(Self { sock,
              clock,
              config,
              id })
  }

  fn seed_id(now: Instant<C>, seed: u16) -> Id {
    let ms = Millis::try_from(now.duration_since_epoch()).map(|Milliseconds(ms)| ms)
                                                         .unwrap_or(0);
    let mut rand = rand_chacha::ChaCha8Rng::seed_from_u64(ms ^ u64::from(seed));
    Id(rand.gen())
  }

  fn now(&self) -> Result<Instant<C>, Error<S::Error>> {
    self.clock.try_now().map_err(Error::Clock)
  }

  fn send_bytes(&self, bytes: &[u8], addr: std::net::SocketAddr) -> Result<(), Error<S::Error>> {
    nb::block!(self.sock.send(Addrd(bytes, addr))).map_err(Error::Sock)
  }

  /// Borrow the socket this client sends from
  pub fn socket(&self) -> &S {
    &self.sock
  }

  /// Send a request and wait for a response.
  ///
  /// The request is stamped with this client's next message id, then sent
  /// up to `config.client.max_attempts` times, waiting out the retry strategy's
  /// delay after each. Yields `Ok(None)` when every attempt went unanswered.
  ///
  /// Datagrams that are not CoAP messages are ignored.
  pub fn send<M: Into<Message>>(&mut self, req: Addrd<M>) -> Result<Option<Message>, Error<S::Error>> {
    let Addrd(msg, addr) = req;
    let mut msg: Message = msg.into();

    msg.id = self.id;
    self.id = self.id.next();

    let bytes = msg.try_into_bytes().map_err(Error::ToBytes)?;
    let mut retry = RetryTimer::new(self.now()?,
                                    self.config.client.retry_strategy,
                                    self.config.client.max_attempts);

    log::debug!(target: LOG_TARGET, "{} -> {}", msg_summary(&msg), addr);
    self.send_bytes(&bytes, addr)?;

    loop {
      if let Some(Addrd(dgram, from)) = self.sock.poll().map_err(Error::Sock)? {
        match Message::try_from_bytes(&dgram) {
          | Ok(rep) => {
            log::debug!(target: LOG_TARGET, "{} <- {}", msg_summary(&rep), from);
            return Ok(Some(rep));
          },
          | Err(e) => log::debug!(target: LOG_TARGET, "ignoring datagram from {}: {}", from, e),
        }
      }

      match retry.what_should_i_do(self.now()?) {
        | Ok(YouShould::Retry) => {
          log::debug!(target: LOG_TARGET,
                      "no response to {} (id {}), attempt {}",
                      addr,
                      msg.id.0,
                      retry.attempts().0);
          self.send_bytes(&bytes, addr)?;
        },
        | Ok(YouShould::Cry) => {
          log::debug!(target: LOG_TARGET,
                      "giving up on {} (id {}) after {} attempts",
                      addr,
                      msg.id.0,
                      retry.attempts().0);
          return Ok(None);
        },
        | Err(nb::Error::WouldBlock) => std::thread::sleep(self.config.poll_interval_std()),
        | Err(nb::Error::Other(e)) => return Err(Error::Clock(e)),
      }
    }
  }
}
