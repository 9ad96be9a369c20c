use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use iopi::blocking::server::Running;
use iopi::blocking::{Client, Server};
use iopi::client::{self, PiClient};
use iopi::config::Config;
use iopi::handler::HandlerError;
use iopi::net::{Addrd, Socket};
use iopi::platform;
use iopi::req::Req;
use iopi::resp::code;
use iopi::retry::Strategy;
use iopi::router::Router;
use iopi_msg::opt::known::URI_PATH;

fn serve() -> (Running, u16) {
  let mut router = Router::new();
  router.get("GPIO/%(channel)d/value", |args| Ok(Some((args.int("channel")? % 2).into())))
        .unwrap()
        .with_format("%d");
  router.post("GPIO/%(channel)d/value/%(value)d", |args| Ok(Some(args.int("value")?.into())))
        .unwrap()
        .with_format("%d");
  router.get("GPIO/%(channel)d/function", |_| {
          Err(HandlerError::Forbidden("Channel must be in range 0-53".into()))
        })
        .unwrap();

  let running = Server::try_new(0, router, Config::default()).unwrap()
                                                            .start()
                                                            .unwrap();
  let port = running.local_addr().port();
  (running, port)
}

fn uri(port: u16, path: &str) -> String {
  format!("coap://127.0.0.1:{}/{}", port, path)
}

#[test]
fn get_post_and_not_found() {
  let _ = simple_logger::init_with_level(log::Level::Debug);

  let (server, port) = serve();
  let mut client = Client::try_new_std().unwrap();

  let rep = client.send(Req::get(&uri(port, "GPIO/25/value")).unwrap())
                  .unwrap()
                  .unwrap();
  assert_eq!(u8::from(rep.code), 69);
  assert_eq!(rep.payload(), Some(b"1".as_ref()));
  assert_eq!(rep.content_format(), Some(0));
  assert_eq!(rep.path(), "/GPIO/25/value");
  assert_eq!(rep.get(URI_PATH).filter_map(|v| v.as_str()).collect::<Vec<_>>(),
             vec!["GPIO", "25", "value"]);

  let rep = client.send(Req::post(&uri(port, "GPIO/25/value/1")).unwrap())
                  .unwrap()
                  .unwrap();
  assert_eq!(u8::from(rep.code), 68);
  assert_eq!(rep.payload(), Some(b"1".as_ref()));

  let rep = client.send(Req::get(&uri(port, "GPIO/25/nothing")).unwrap())
                  .unwrap()
                  .unwrap();
  assert_eq!(u8::from(rep.code), 132);

  let rep = client.send(Req::get(&uri(port, "GPIO/25/function")).unwrap())
                  .unwrap()
                  .unwrap();
  assert_eq!(rep.code, code::FORBIDDEN);
  assert_eq!(rep.payload(), Some(b"Channel must be in range 0-53".as_ref()));

  server.stop().unwrap();
}

#[test]
fn stopped_server_does_not_answer() {
  let (server, port) = serve();
  server.stop().unwrap();

  let mut config = Config::default();
  config.client.retry_strategy = Strategy::fixed(20);

  let sock = <UdpSocket as Socket>::bind_raw("127.0.0.1:0").unwrap();
  let mut client = Client::new(sock, platform::Clock::new(), config).unwrap();

  let rep = client.send(Req::get(&uri(port, "GPIO/25/value")).unwrap())
                  .unwrap();
  assert_eq!(rep, None);
}

#[test]
fn silent_peer_gets_four_attempts() {
  let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
  silent.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
  let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, silent.local_addr().unwrap().port()));

  let mut config = Config::default();
  config.client.retry_strategy = Strategy::fixed(100);

  let sock = <UdpSocket as Socket>::bind_raw("127.0.0.1:0").unwrap();
  let mut client = Client::new(sock, platform::Clock::new(), config).unwrap();

  let start = Instant::now();
  let rep = client.send(Addrd(Req::new(iopi::req::Method::GET, "/GPIO/25/value"), addr))
                  .unwrap();
  let elapsed = start.elapsed();

  assert_eq!(rep, None);
  assert!(elapsed >= Duration::from_millis(400), "{:?}", elapsed);

  let mut buf = [0u8; 64];
  let received = std::iter::from_fn(|| silent.recv(&mut buf).ok()).count();
  assert_eq!(received, 4);
}

#[test]
fn gpio_over_the_client_facade() {
  let (server, port) = serve();

  let mut pi = PiClient::coap("127.0.0.1", port).unwrap();
  assert_eq!(pi.dest().port(), port);

  assert_eq!(pi.gpio().digital_read(25).unwrap(), 1);
  assert_eq!(pi.gpio().digital_read(24).unwrap(), 0);
  assert_eq!(pi.gpio().digital_write(25, 1).unwrap(), 1);

  match pi.gpio().get_function(25) {
    | Err(client::Error::Refused { code: refused, body }) => {
      assert_eq!(refused, code::FORBIDDEN);
      assert_eq!(body, "Channel must be in range 0-53");
    },
    | other => panic!("expected a refusal, got {:?}", other),
  }

  server.stop().unwrap();
}
