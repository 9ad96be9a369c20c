use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use iopi::blocking::server::Running;
use iopi::blocking::Server;
use iopi::config::Config;
use iopi::handler::HandlerError;
use iopi::router::Router;
use serde::Serialize;

#[allow(dead_code)]
pub const PORT: u16 = 5683;

#[derive(Debug, Clone, Copy, Serialize)]
struct Pin {
  function: &'static str,
  value: u8,
}

type Board = Arc<Mutex<BTreeMap<i64, Pin>>>;

fn pin_mut<T>(board: &Board, channel: i64, f: impl FnOnce(&mut Pin) -> T) -> Result<T, HandlerError> {
  if !(0..=53).contains(&channel) {
    return Err(HandlerError::Forbidden(format!("Channel {} must be in range 0-53", channel)));
  }

  let mut board = board.lock()
                       .map_err(|_| HandlerError::Internal("board lock poisoned".into()))?;
  let pin = board.entry(channel).or_insert(Pin { function: "IN",
                                                 value: 0 });
  Ok(f(pin))
}

pub fn router() -> Router {
  let board = Board::default();
  let mut router = Router::new();

  let b = board.clone();
  router.get("GPIO/%(channel)d/value", move |args| {
          let value = pin_mut(&b, args.int("channel")?, |pin| pin.value)?;
          Ok(Some(value.into()))
        })
        .unwrap()
        .with_format("%d");

  let b = board.clone();
  router.post("GPIO/%(channel)d/value/%(value)d", move |args| {
          let value = args.int("value")?;
          pin_mut(&b, args.int("channel")?, |pin| match pin.function {
            | "OUT" => {
              pin.value = (value != 0) as u8;
              Ok(Some(pin.value.into()))
            },
            | _ => Err(HandlerError::Forbidden("GPIO not in OUT mode".into())),
          })?
        })
        .unwrap()
        .with_format("%d");

  let b = board.clone();
  router.get("GPIO/%(channel)d/function", move |args| {
          let function = pin_mut(&b, args.int("channel")?, |pin| pin.function)?;
          Ok(Some(function.into()))
        })
        .unwrap()
        .with_format("%s");

  let b = board.clone();
  router.post("GPIO/%(channel)d/function/%(function)s", move |args| {
          let function = match args.str("function")? {
            | "in" | "IN" => "IN",
            | "out" | "OUT" => "OUT",
            | other => return Err(HandlerError::Forbidden(format!("Unknown function {}", other))),
          };
          pin_mut(&b, args.int("channel")?, |pin| pin.function = function)?;
          Ok(Some(function.into()))
        })
        .unwrap()
        .with_format("%s");

  let b = board.clone();
  router.get("*", move |_| {
          let board = b.lock()
                       .map_err(|_| HandlerError::Internal("board lock poisoned".into()))?;
          serde_json::to_value(&*board).map(Some)
                                       .map_err(|e| HandlerError::Internal(e.to_string()))
        })
        .unwrap()
        .with_content_type("application/json");

  router.alias("/led", "/GPIO/17");

  let b = board;
  router.macro_("toggle", move |args| {
          let channel = args.first()
                            .and_then(|c| c.parse().ok())
                            .ok_or_else(|| HandlerError::Internal("toggle takes a channel".into()))?;
          let value = pin_mut(&b, channel, |pin| {
                        pin.value ^= 1;
                        pin.value
                      })?;
          Ok(Some(value.to_string()))
        });

  router
}

pub fn spawn(port: u16) -> Running {
  let server = Server::try_new(port, router(), Config::default()).unwrap();
  let running = server.start().unwrap();
  if let Err(e) = running.enable_multicast() {
    log::warn!("multicast unavailable: {}", e);
  }
  running
}

#[allow(dead_code)]
fn main() {
  simple_logger::init_with_level(log::Level::Debug).unwrap();

  let _server = spawn(PORT);
  log::info!("serving on coap://0.0.0.0:{}/", PORT);

  loop {
    std::thread::park();
  }
}
