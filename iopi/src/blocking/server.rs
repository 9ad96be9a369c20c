use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use iopi_msg::{content_format, CodeKind, Message, TryFromBytes, TryIntoBytes};

use super::Error;
use crate::config::Config;
use crate::handler::{HandlerError, Reply, RequestHandler};
use crate::net::{Addrd, Socket};
use crate::req::{Method, Req};
use crate::resp::code::{self, HttpStatus};
use crate::resp::Resp;
use crate::LOG_TARGET;

/// Lifecycle of a [`Server`]'s receive loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
  /// Started, but the loop has not begun receiving
  Idle,
  /// Receiving and answering requests
  Running,
  /// Stopped for good
  Stopped,
}

#[derive(Debug)]
struct Shared {
  state: Mutex<State>,
  changed: Condvar,
}

impl Shared {
  fn state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn set(&self, state: State) {
    *self.state() = state;
    self.changed.notify_all();
  }
}

/// A CoAP server answering GET and POST requests with a [`RequestHandler`].
///
/// ```no_run
/// use iopi::blocking::Server;
/// use iopi::config::Config;
/// use iopi::router::Router;
///
/// let mut router = Router::new();
/// router.get("hello", |_| Ok(Some("world".into()))).unwrap();
///
/// let server = Server::try_new(5683, router, Config::default()).unwrap()
///                                                               .start()
///                                                               .unwrap();
/// server.enable_multicast().unwrap();
///
/// // ...
///
/// server.stop().unwrap();
/// ```
#[derive(Debug)]
pub struct Server<H, S: Socket = UdpSocket> {
  sock: S,
  handler: H,
  config: Config,
}

impl<H: RequestHandler + 'static> Server<H, UdpSocket> {
  /// Bind a server to `port` on all IPv4 interfaces
  pub fn try_new(port: u16, handler: H, config: Config) -> Result<Self, Error<std::io::Error>> {
    let sock = <UdpSocket as Socket>::bind_raw((Ipv4Addr::UNSPECIFIED, port)).map_err(Error::Sock)?;
    Ok(Self::new(sock, handler, config))
  }
}

impl<H, S> Server<H, S>
  where H: RequestHandler + 'static,
        S: Socket + Send + Sync + 'static
{
  /// Create a server over a bound socket
  pub fn new(sock: S, handler: H, config: Config) -> Self {
    Self { sock,
           handler,
           config }
  }

  /// Start the receive loop on a worker thread named `coap`
  pub fn start(self) -> Result<Running<S>, Error<S::Error>> {
    let Self { sock, handler, config } = self;

    let sock = Arc::new(sock);
    let shared = Arc::new(Shared { state: Mutex::new(State::Idle),
                                   changed: Condvar::new() });

    let worker = {
      let sock = sock.clone();
      let shared = shared.clone();
      std::thread::Builder::new().name("coap".into())
                                 .spawn(move || serve(&*sock, &handler, &config, &shared))
                                 .map_err(Error::Spawn)?
    };

    Ok(Running { sock,
                 shared,
                 config,
                 worker: Some(worker) })
  }
}

/// A started [`Server`]
///
/// Dropping this stops the server.
#[derive(Debug)]
pub struct Running<S: Socket = UdpSocket> {
  sock: Arc<S>,
  shared: Arc<Shared>,
  config: Config,
  worker: Option<JoinHandle<()>>,
}

impl<S: Socket> Running<S> {
  /// Current state of the receive loop
  pub fn state(&self) -> State {
    *self.shared.state()
  }

  /// Address the server is bound to
  pub fn local_addr(&self) -> std::net::SocketAddr {
    self.sock.local_addr()
  }

  /// Wait for the receive loop to start, then join the
  /// configured multicast group.
  ///
  /// Requests received through the group are answered
  /// directly to their sender.
  pub fn enable_multicast(&self) -> Result<(), Error<S::Error>> {
    {
      let mut state = self.shared.state();
      while *state == State::Idle {
        state = self.shared
                    .changed
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
      }
    }

    let group = self.config.server.multicast_group;
    self.sock
        .join_multicast(IpAddr::V4(group))
        .map_err(Error::Sock)?;

    log::info!(target: LOG_TARGET,
               "CoAP Server binded on coap://{}:{}/ (MULTICAST)",
               group,
               self.local_addr().port());
    Ok(())
  }

  /// Stop the receive loop and wait for the worker to exit.
  ///
  /// A request being handled when this is called is answered first.
  /// The socket is closed once the last reference to it is dropped.
  pub fn stop(mut self) -> Result<(), Error<S::Error>> {
    self.shutdown()
  }

  fn shutdown(&mut self) -> Result<(), Error<S::Error>> {
    self.shared.set(State::Stopped);

    match self.worker.take() {
      | Some(worker) => worker.join().map_err(|_| Error::WorkerPanicked),
      | None => Ok(()),
    }
  }
}

impl<S: Socket> Drop for Running<S> {
  fn drop(&mut self) {
    if let Err(e) = self.shutdown() {
      log::error!(target: LOG_TARGET, "{}", e);
    }
  }
}

fn serve<S: Socket, H: RequestHandler>(sock: &S, handler: &H, config: &Config, shared: &Shared) {
  {
    let mut state = shared.state();
    if *state != State::Idle {
      return;
    }
    *state = State::Running;
    shared.changed.notify_all();
  }

  log::info!(target: LOG_TARGET,
             "CoAP Server binded on coap://{}/",
             sock.local_addr());

  loop {
    if *shared.state() != State::Running {
      break;
    }

    match sock.poll() {
      | Ok(Some(dgram)) => handle(sock, handler, dgram),
      | Ok(None) => {
        let state = shared.state();
        let _ = shared.changed
                      .wait_timeout_while(state, config.idle_wait_std(), |s| *s == State::Running);
      },
      | Err(e) => {
        log::error!(target: LOG_TARGET, "receive failed: {:?}", e);
        let state = shared.state();
        let _ = shared.changed
                      .wait_timeout_while(state, config.idle_wait_std(), |s| *s == State::Running);
      },
    }
  }

  log::info!(target: LOG_TARGET, "CoAP Server stopped");
}

fn handle<S: Socket, H: RequestHandler>(sock: &S, handler: &H, Addrd(dgram, from): Addrd<Vec<u8>>) {
  let req = match Message::try_from_bytes(&dgram) {
    | Ok(req) => req,
    | Err(e) => {
      log::debug!(target: LOG_TARGET, "dropping malformed datagram from {}: {}", from, e);
      return;
    },
  };

  let rep = match respond(handler, &req) {
    | Some(rep) => rep,
    | None => return,
  };

  log::debug!(target: LOG_TARGET,
              "\"{} {} CoAP/{}.0\" - {} (Client: {})",
              Method(req.code),
              req.path(),
              req.ver.0,
              rep.code,
              from.ip());

  let bytes = match rep.try_into_bytes() {
    | Ok(bytes) => bytes,
    | Err(e) => {
      log::error!(target: LOG_TARGET, "response to {} could not be serialized: {}", from, e);
      return;
    },
  };

  if let Err(e) = nb::block!(sock.send(Addrd(bytes.as_slice(), from))) {
    log::error!(target: LOG_TARGET, "failed to answer {}: {:?}", from, e);
  }
}

fn reply_code(method: Method, status: u16) -> iopi_msg::Code {
  match status {
    | 0 => code::NOT_FOUND,
    | 200 if method == Method::GET => code::CONTENT,
    | 200 => code::CHANGED,
    | other => iopi_msg::Code::try_from_http(other).unwrap_or_else(|| {
                                                      log::warn!(target: LOG_TARGET,
                                                                 "status {} has no CoAP code",
                                                                 other);
                                                      code::INTERNAL_SERVER_ERROR
                                                    }),
  }
}

/// Answer a decoded request with `handler`.
///
/// GET and POST are dispatched to the handler; other request codes,
/// including the empty code, are answered with 5.01. Responses yield `None`.
///
/// ```
/// use iopi::blocking::server::respond;
/// use iopi::handler::{HandlerError, Reply, RequestHandler};
/// use iopi::req::{Method, Req};
/// use iopi::resp::code;
/// use iopi_msg::Message;
///
/// struct Answer;
///
/// impl RequestHandler for Answer {
///   fn do_get(&self, path: &str, _: bool) -> Result<Reply, HandlerError> {
///     match path {
///       | "answer" => Ok(Reply::text("42")),
///       | _ => Ok(Reply::not_found()),
///     }
///   }
///
///   fn do_post(&self, _: &str, _: &[u8], _: bool) -> Result<Reply, HandlerError> {
///     Ok(Reply::not_found())
///   }
/// }
///
/// let req = Message::from(Req::new(Method::GET, "/answer"));
/// let rep = respond(&Answer, &req).unwrap();
///
/// assert_eq!(rep.code, code::CONTENT);
/// assert_eq!(rep.payload(), Some(b"42".as_ref()));
/// ```
pub fn respond<H: RequestHandler + ?Sized>(handler: &H, req: &Message) -> Option<Message> {
  let req = match req.code.kind() {
    | CodeKind::Response => {
      log::warn!(target: LOG_TARGET,
                 "Received CoAP Response: {}",
                 crate::logging::msg_summary(req));
      return None;
    },
    | _ => Req(req.clone()),
  };

  let mut rep = Resp::for_request(&req);
  let method = req.method();
  let path = req.path();
  let path = path.strip_prefix('/').unwrap_or(&path);

  let outcome = panic::catch_unwind(AssertUnwindSafe(|| match method {
                                      | Method::GET => Some(handler.do_get(path, true)),
                                      | Method::POST => {
                                        Some(handler.do_post(path, req.payload().unwrap_or(&[]), true))
                                      },
                                      | _ => None,
                                    }));

  match outcome {
    | Ok(None) => rep.set_code(code::NOT_IMPLEMENTED),
    | Ok(Some(Ok(Reply { status,
                         body,
                         content_type, }))) => {
      rep.set_code(reply_code(method, status));
      rep.set_payload(body.unwrap_or_default());
      rep.set_content_format(content_format::code_of(content_type.as_deref()));
    },
    | Ok(Some(Err(HandlerError::Forbidden(msg)))) => {
      rep.set_code(code::FORBIDDEN);
      rep.set_payload(msg);
      rep.set_content_format(Some(iopi_msg::ContentFormat::Text.into()));
    },
    | Ok(Some(Err(HandlerError::Internal(msg)))) => {
      log::error!(target: LOG_TARGET, "{} {}: {}", method, req.path(), msg);
      rep.set_code(code::INTERNAL_SERVER_ERROR);
    },
    | Err(_) => {
      log::error!(target: LOG_TARGET, "{} {}: handler panicked", method, req.path());
      rep.set_code(code::INTERNAL_SERVER_ERROR);
    },
  }

  Some(rep.into())
}

#[cfg(test)]
mod tests {
  use iopi_msg::{Code, Id, Token, Type};

  use super::*;
  use crate::test::{dummy_addr, SockMock};

  struct Fixed;

  impl RequestHandler for Fixed {
    fn do_get(&self, path: &str, compact: bool) -> Result<Reply, HandlerError> {
      assert!(compact);
      match path {
        | "GPIO/25/value" => Ok(Reply::new(200, Some("42".into()), Some("text/plain"))),
        | "forbidden" => Err(HandlerError::Forbidden("Channel must be in range 0-53".into())),
        | "broken" => Err(HandlerError::Internal("oops".into())),
        | "panics" => panic!("handler panicked"),
        | "json" => Ok(Reply::new(200, Some("{}".into()), Some("application/json"))),
        | "teapot" => Ok(Reply::new(418, None, None)),
        | "huge" => Ok(Reply::new(999, None, None)),
        | _ => Ok(Reply::not_found()),
      }
    }

    fn do_post(&self, path: &str, payload: &[u8], _: bool) -> Result<Reply, HandlerError> {
      match path {
        | "GPIO/25/value" => Ok(Reply::new(200, Some(String::from_utf8_lossy(payload).into()), None)),
        | _ => Ok(Reply::not_found()),
      }
    }
  }

  fn req(method: Method, path: &str) -> Message {
    let mut req = Req::new(method, path);
    req.set_msg_id(Id(12));
    req.set_token(Token::from_slice(&[7]).unwrap());
    req.into()
  }

  #[test]
  fn get_content() {
    let rep = respond(&Fixed, &req(Method::GET, "/GPIO/25/value")).unwrap();

    assert_eq!(u8::from(rep.code), 69);
    assert_eq!(rep.payload(), Some(b"42".as_ref()));
    assert_eq!(rep.content_format(), Some(0));
    assert_eq!(rep.ty, Type::Ack);
    assert_eq!(rep.id, Id(12));
    assert_eq!(rep.token, Token::from_slice(&[7]).unwrap());
    assert_eq!(rep.path(), "/GPIO/25/value");
  }

  #[test]
  fn not_found() {
    let rep = respond(&Fixed, &req(Method::GET, "/nope")).unwrap();
    assert_eq!(u8::from(rep.code), 132);
    assert_eq!(rep.payload(), None);
    assert_eq!(rep.content_format(), None);
  }

  #[test]
  fn post_changed() {
    let mut msg = req(Method::POST, "/GPIO/25/value");
    msg.set_payload("1");
    let rep = respond(&Fixed, &msg).unwrap();

    assert_eq!(u8::from(rep.code), 68);
    assert_eq!(rep.payload(), Some(b"1".as_ref()));
    assert_eq!(rep.content_format(), None);
  }

  #[test]
  fn other_statuses_are_bridged() {
    assert_eq!(respond(&Fixed, &req(Method::GET, "/teapot")).unwrap().code,
               Code::new(4, 18));
    assert_eq!(respond(&Fixed, &req(Method::GET, "/huge")).unwrap().code,
               code::INTERNAL_SERVER_ERROR);
    assert_eq!(respond(&Fixed, &req(Method::GET, "/json")).unwrap()
                                                            .content_format(),
               Some(50));
  }

  #[test]
  fn unsupported_methods() {
    let rep = respond(&Fixed, &req(Method::PUT, "/GPIO/25/value")).unwrap();
    assert_eq!(u8::from(rep.code), 161);

    let empty = Message::new(Type::Con, Code::new(0, 0), Id(1));
    assert_eq!(respond(&Fixed, &empty).unwrap().code, code::NOT_IMPLEMENTED);
  }

  #[test]
  fn responses_are_dropped() {
    let rep = Message::new(Type::Ack, Code::new(2, 5), Id(1));
    assert_eq!(respond(&Fixed, &rep), None);
  }

  #[test]
  fn handler_errors() {
    let rep = respond(&Fixed, &req(Method::GET, "/forbidden")).unwrap();
    assert_eq!(rep.code, code::FORBIDDEN);
    assert_eq!(rep.payload(), Some(b"Channel must be in range 0-53".as_ref()));

    let rep = respond(&Fixed, &req(Method::GET, "/broken")).unwrap();
    assert_eq!(rep.code, code::INTERNAL_SERVER_ERROR);

    let rep = respond(&Fixed, &req(Method::GET, "/panics")).unwrap();
    assert_eq!(rep.code, code::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn non_confirmable_gets_non() {
    let mut msg = req(Method::GET, "/GPIO/25/value");
    msg.ty = Type::Non;
    assert_eq!(respond(&Fixed, &msg).unwrap().ty, Type::Non);
  }

  fn wait_for<F: Fn() -> bool>(f: F) {
    let start = std::time::Instant::now();
    while !f() {
      assert!(start.elapsed() < std::time::Duration::from_secs(5), "timed out");
      std::thread::sleep(std::time::Duration::from_millis(1));
    }
  }

  #[test]
  fn stop_interrupts_idle_wait() {
    let mut config = Config::default();
    config.server.idle_wait = embedded_time::duration::Milliseconds(60_000);

    let running = Server::new(SockMock::new(), Fixed, config).start().unwrap();
    wait_for(|| running.state() == State::Running);

    let start = std::time::Instant::now();
    running.stop().unwrap();
    assert!(start.elapsed() < std::time::Duration::from_secs(5));
  }

  #[test]
  fn serves_until_stopped() {
    let sock = SockMock::new();
    let running = Server::new(sock.clone(), Fixed, Config::default()).start()
                                                                     .unwrap();

    running.enable_multicast().unwrap();
    assert_eq!(running.state(), State::Running);
    assert_eq!(*sock.groups.lock().unwrap(),
               vec![IpAddr::V4(crate::multicast::GROUP)]);

    sock.rx.lock().unwrap().push(Addrd(vec![0xFF], dummy_addr()));
    sock.send_msg(Addrd(req(Method::GET, "/GPIO/25/value"), dummy_addr()));
    wait_for(|| sock.tx.lock().unwrap().len() == 1);

    let sent = sock.sent_msgs();
    assert_eq!(sent[0].addr(), dummy_addr());
    assert_eq!(sent[0].data().code, code::CONTENT);

    running.stop().unwrap();

    sock.send_msg(Addrd(req(Method::GET, "/GPIO/25/value"), dummy_addr()));
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(sock.tx.lock().unwrap().len(), 1);
  }
}
