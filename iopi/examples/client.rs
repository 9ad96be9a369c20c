use std::net::{Ipv4Addr, SocketAddr};

use iopi::blocking::Client;
use iopi::client::PiClient;
use iopi::req::Req;
use iopi::Message;

#[path = "./server.rs"]
mod server;

const SERVER: &str = "coap://127.0.0.1:5684";

trait Log {
  fn log(self);
}

impl<E: std::fmt::Debug> Log for Result<Option<Message>, E> {
  fn log(self) {
    match self {
      | Ok(None) => {
        log::info!("ok! did not receive a response");
      },
      | Ok(Some(rep)) => {
        log::info!("ok! {} {:?}",
                   rep.code,
                   rep.payload().map(String::from_utf8_lossy));
      },
      | Err(e) => {
        log::error!("error! {:?}", e);
      },
    }
  }
}

fn main() {
  simple_logger::init_with_level(log::Level::Debug).unwrap();

  let server = server::spawn(5684);
  let mut client = Client::try_new_std().unwrap();

  let get = |path: &str| Req::get(&format!("{}/{}", SERVER, path)).unwrap();
  let post = |path: &str| Req::post(&format!("{}/{}", SERVER, path)).unwrap();

  client.send(get("version")).log();
  client.send(post("led/function/out")).log();
  client.send(get("GPIO/99/value")).log();
  client.send(get("*")).log();
  client.send(get("nope")).log();

  let mut pi = PiClient::new(client, SocketAddr::from((Ipv4Addr::LOCALHOST, 5684)));
  log::info!("GPIO 17 is {:?}", pi.gpio().digital_read(17));
  log::info!("wrote {:?}", pi.gpio().digital_write(17, 1));
  log::info!("toggled to {:?}", pi.macro_("toggle").call(&[&17]));
  log::info!("GPIO 4 is {:?}", pi.gpio().get_function(4));
  log::info!("GPIO 4 write {:?}", pi.gpio().digital_write(4, 1).map_err(|e| e.to_string()));

  server.stop().unwrap();
}
