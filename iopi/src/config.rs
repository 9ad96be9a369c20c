use std::net::Ipv4Addr;

use embedded_time::duration::Milliseconds;

use crate::retry::{Attempts, Strategy};
use crate::time::Millis;

/// Configuration options related to sending requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Client {
  /// How long to wait for a response to each attempt
  /// before sending the request again.
  ///
  /// Defaults to a fixed 1 second, with no backoff:
  /// ```
  /// use iopi::config::Client;
  /// use iopi::retry::Strategy;
  ///
  /// assert_eq!(Client::default().retry_strategy, Strategy::fixed(1_000));
  /// ```
  pub retry_strategy: Strategy,
  /// Number of times a request is sent before giving up
  /// on a response.
  ///
  /// Defaults to 4 attempts.
  /// ```
  /// use iopi::config::Client;
  /// use iopi::retry::Attempts;
  ///
  /// assert_eq!(Client::default().max_attempts, Attempts(4));
  /// ```
  pub max_attempts: Attempts,
  /// Number of router hops outbound multicast requests may take.
  ///
  /// Defaults to 2.
  pub multicast_ttl: u32,
  /// Seed mixed into the first message id of every client,
  /// so that clients started at the same instant do not collide.
  ///
  /// Defaults to 0.
  pub msg_id_seed: u16,
}

/// Configuration options related to serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Server {
  /// Group joined by [`Running::enable_multicast`](crate::blocking::server::Running::enable_multicast).
  ///
  /// Defaults to [`multicast::GROUP`](crate::multicast::GROUP) (`224.0.1.123`).
  pub multicast_group: Ipv4Addr,
  /// How long the receive loop sleeps when no datagram is waiting.
  ///
  /// [`Running::stop`](crate::blocking::server::Running::stop) wakes the loop
  /// early, so this only bounds how often an idle server polls its socket.
  ///
  /// Defaults to 100 milliseconds.
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use iopi::config::Config;
  ///
  /// assert_eq!(Config::default().server.idle_wait, Milliseconds(100u64));
  /// ```
  pub idle_wait: Millis,
}

impl Default for Client {
  fn default() -> Self {
    Client { retry_strategy: Strategy::fixed(1_000),
             max_attempts: Attempts(4),
             multicast_ttl: 2,
             msg_id_seed: 0 }
  }
}

impl Default for Server {
  fn default() -> Self {
    Server { multicast_group: crate::multicast::GROUP,
             idle_wait: Milliseconds(100) }
  }
}

/// Runtime config
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Config {
  /// See [`Client`]
  pub client: Client,
  /// See [`Server`]
  pub server: Server,
  /// How long a client waiting on a response sleeps between
  /// polls of its non-blocking socket.
  ///
  /// Defaults to 1 millisecond.
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use iopi::config::Config;
  ///
  /// assert_eq!(Config::default().poll_interval, Milliseconds(1u64));
  /// ```
  pub poll_interval: Millis,
}

impl Default for Config {
  fn default() -> Self {
    Config { client: Client::default(),
             server: Server::default(),
             poll_interval: Milliseconds(1) }
  }
}

impl Config {
  /// Longest a client can spend on one request that never gets a response
  ///
  /// ```
  /// use embedded_time::duration::Milliseconds;
  /// use iopi::config::Config;
  ///
  /// assert_eq!(Config::default().max_transmit_wait(), Milliseconds(4_000u64));
  /// ```
  pub fn max_transmit_wait(&self) -> Millis {
    self.client
        .retry_strategy
        .max_time(self.client.max_attempts)
  }

  pub(crate) fn poll_interval_std(&self) -> std::time::Duration {
    std::time::Duration::from_millis(self.poll_interval.0)
  }

  pub(crate) fn idle_wait_std(&self) -> std::time::Duration {
    std::time::Duration::from_millis(self.server.idle_wait.0)
  }
}
