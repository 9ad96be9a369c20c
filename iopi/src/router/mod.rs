//! A route table shared by every transport.
//!
//! ```
//! use iopi::handler::RequestHandler;
//! use iopi::router::Router;
//!
//! let mut router = Router::new();
//! router.get("GPIO/%(channel)d/value", |args| Ok(Some((args.int("channel")? % 2).into())))
//!       .unwrap();
//! router.alias("/pin", "/GPIO");
//!
//! let reply = router.do_get("pin/3/value", true).unwrap();
//! assert_eq!(reply.status, 200);
//! assert_eq!(reply.body.as_deref(), Some("1"));
//!
//! assert_eq!(router.do_get("nope", true).unwrap().status, 0);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::handler::{HandlerError, Reply, RequestHandler};
use crate::req::Method;
use crate::LOG_TARGET;

pub mod format;
pub mod template;

pub use template::{Arg, Args, Template, TemplateError};

type EndpointFn = dyn Fn(&Args) -> Result<Option<Value>, HandlerError> + Send + Sync;
type MacroFn = dyn Fn(&[&str]) -> Result<Option<String>, HandlerError> + Send + Sync;

const JSON: &str = "application/json";
const PLAIN: &str = "text/plain";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Render {
  fmt: String,
  content_type: String,
}

/// A registered endpoint
pub struct Endpoint {
  method: Method,
  template: Template,
  payload_arg: Option<String>,
  render: Option<Render>,
  f: Box<EndpointFn>,
}

impl fmt::Debug for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Endpoint")
     .field("method", &self.method)
     .field("template", &self.template.text())
     .field("payload_arg", &self.payload_arg)
     .field("render", &self.render)
     .finish()
  }
}

impl Endpoint {
  /// Bind the request payload to the argument `name`
  pub fn with_payload(&mut self, name: &str) -> &mut Self {
    self.payload_arg = Some(name.to_string());
    self
  }

  /// Set the MIME type of rendered results.
  ///
  /// `application/json` renders results as JSON; anything else
  /// renders them with the endpoint's format (`%s` by default).
  pub fn with_content_type(&mut self, mime: &str) -> &mut Self {
    let fmt = self.render
                  .take()
                  .map(|r| r.fmt)
                  .unwrap_or_else(|| "%s".to_string());
    self.render = Some(Render { fmt,
                                content_type: mime.to_string() });
    self
  }

  /// Set the `%`-style format used to render results.
  ///
  /// The MIME type defaults to `text/plain`.
  pub fn with_format(&mut self, fmt: &str) -> &mut Self {
    let content_type = self.render
                           .take()
                           .map(|r| r.content_type)
                           .unwrap_or_else(|| PLAIN.to_string());
    self.render = Some(Render { fmt: fmt.to_string(),
                                content_type });
    self
  }

  fn call(&self, mut args: Args, payload: Option<&[u8]>) -> Result<Reply, HandlerError> {
    if let (Some(name), Some(payload)) = (&self.payload_arg, payload) {
      args.insert(name, Arg::Str(String::from_utf8_lossy(payload).into_owned()));
    }

    let result = match (self.f)(&args)? {
      | Some(result) => result,
      | None => return Ok(Reply::new(200, None, None)),
    };

    let reply = match &self.render {
      | None => Reply::new(200, Some(format::to_text(&result)), None),
      | Some(Render { content_type, .. }) if content_type == JSON => {
        let body = serde_json::to_string(&result).map_err(|e| HandlerError::Internal(e.to_string()))?;
        Reply::new(200, Some(body), Some(JSON))
      },
      | Some(Render { fmt, content_type }) => {
        let body =
          format::format(fmt, &result).map_err(|e| HandlerError::Internal(e.to_string()))?;
        Reply::new(200, Some(body), Some(content_type.as_str()))
      },
    };

    Ok(reply)
  }
}

/// The route table
///
/// Built once at startup, then shared with every transport
/// (e.g. behind an [`Arc`](std::sync::Arc)).
pub struct Router {
  endpoints: Vec<Endpoint>,
  aliases: Vec<(String, String)>,
  macros: BTreeMap<String, Box<MacroFn>>,
}

impl fmt::Debug for Router {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Router")
     .field("endpoints", &self.endpoints)
     .field("aliases", &self.aliases)
     .field("macros", &self.macros.keys().collect::<Vec<_>>())
     .finish()
  }
}

impl Default for Router {
  fn default() -> Self {
    Self::new()
  }
}

impl Router {
  /// An empty route table
  pub fn new() -> Self {
    Self { endpoints: Vec::new(),
           aliases: Vec::new(),
           macros: BTreeMap::new() }
  }

  /// Register an endpoint for `method` requests matching `template`
  pub fn endpoint<F>(&mut self, method: Method, template: &str, f: F) -> Result<&mut Endpoint, TemplateError>
    where F: Fn(&Args) -> Result<Option<Value>, HandlerError> + Send + Sync + 'static
  {
    let template = Template::parse(template)?;
    log::trace!(target: LOG_TARGET, "{} {}", method, template.text());

    let ix = self.endpoints.len();
    self.endpoints.push(Endpoint { method,
                                   template,
                                   payload_arg: None,
                                   render: None,
                                   f: Box::new(f) });
    Ok(&mut self.endpoints[ix])
  }

  /// Register a GET endpoint
  pub fn get<F>(&mut self, template: &str, f: F) -> Result<&mut Endpoint, TemplateError>
    where F: Fn(&Args) -> Result<Option<Value>, HandlerError> + Send + Sync + 'static
  {
    self.endpoint(Method::GET, template, f)
  }

  /// Register a POST endpoint
  pub fn post<F>(&mut self, template: &str, f: F) -> Result<&mut Endpoint, TemplateError>
    where F: Fn(&Args) -> Result<Option<Value>, HandlerError> + Send + Sync + 'static
  {
    self.endpoint(Method::POST, template, f)
  }

  /// Route paths starting with `source` to `destination` instead.
  ///
  /// Leading `/`s are ignored. Aliases are tried in the order they were added.
  pub fn alias(&mut self, source: &str, destination: &str) {
    let source = source.strip_prefix('/').unwrap_or(source);
    let destination = destination.strip_prefix('/').unwrap_or(destination);
    log::info!(target: LOG_TARGET, "Added Route /{} => /{}", source, destination);
    self.aliases
        .push((source.to_string(), destination.to_string()));
  }

  /// Register a macro, callable with `POST macros/<name>[/<arg,arg,...>]`
  pub fn macro_<F>(&mut self, name: &str, f: F)
    where F: Fn(&[&str]) -> Result<Option<String>, HandlerError> + Send + Sync + 'static
  {
    self.macros.insert(name.to_string(), Box::new(f));
  }

  fn resolve_alias(&self, path: &str) -> String {
    match self.aliases
              .iter()
              .find(|(source, _)| path.starts_with(source.as_str()))
    {
      | Some((source, destination)) => {
        let routed = path.replacen(source.as_str(), destination, 1);
        log::info!(target: LOG_TARGET, "Routing /{} => /{}", path, routed);
        routed
      },
      | None => path.to_string(),
    }
  }

  fn find(&self, method: Method, path: &str) -> Option<(&Endpoint, Args)> {
    let exact = self.endpoints
                    .iter()
                    .find(|e| e.method == method && e.template.text() == path);

    match exact {
      | Some(e) => Some((e, Args::default())),
      | None => self.endpoints
                    .iter()
                    .filter(|e| e.method == method)
                    .find_map(|e| e.template.matches(path).map(|args| (e, args))),
    }
  }

  fn dispatch(&self,
              method: Method,
              path: &str,
              payload: Option<&[u8]>,
              compact: bool)
              -> Result<Reply, HandlerError> {
    match self.find(method, path) {
      | Some((endpoint, mut args)) => {
        args.set_compact(compact);
        endpoint.call(args, payload)
      },
      | None => Ok(Reply::not_found()),
    }
  }

  fn call_macro(&self, path: &str) -> Result<Reply, HandlerError> {
    let mut parts = path.split('/').skip(1);
    let name = parts.next().unwrap_or("");
    let value = parts.next().unwrap_or("");

    let f = match self.macros.get(name) {
      | Some(f) => f,
      | None => return Ok(Reply::new(404, Some(format!("{} Not Found", name)), Some(PLAIN))),
    };

    let args = if value.is_empty() {
      Vec::new()
    } else {
      value.split(',').collect()
    };

    let result = f(&args)?;
    Ok(Reply::new(200, Some(result.unwrap_or_default()), Some(PLAIN)))
  }
}

impl RequestHandler for Router {
  fn do_get(&self, path: &str, compact: bool) -> Result<Reply, HandlerError> {
    let path = self.resolve_alias(path);

    match path.as_str() {
      | "version" => Ok(Reply::text(env!("CARGO_PKG_VERSION"))),
      | path => self.dispatch(Method::GET, path, None, compact),
    }
  }

  fn do_post(&self, path: &str, payload: &[u8], compact: bool) -> Result<Reply, HandlerError> {
    let path = self.resolve_alias(path);

    if path.starts_with("macros/") {
      self.call_macro(&path)
    } else {
      self.dispatch(Method::POST, &path, Some(payload), compact)
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicI64, Ordering};
  use std::sync::Arc;

  use serde_json::json;

  use super::*;

  fn gpio_router() -> (Router, Arc<AtomicI64>) {
    let level = Arc::new(AtomicI64::new(0));
    let mut router = Router::new();

    let l = level.clone();
    router.get("GPIO/%(channel)d/value", move |_| Ok(Some(l.load(Ordering::SeqCst).into())))
          .unwrap()
          .with_format("%d");

    let l = level.clone();
    router.post("GPIO/%(channel)d/value/%(value)d", move |args| {
            l.store(args.int("value")?, Ordering::SeqCst);
            Ok(Some(args.int("value")?.into()))
          })
          .unwrap()
          .with_format("%d");

    router.post("GPIO/%(channel)d/sequence", |args| Ok(Some(args.str("data")?.into())))
          .unwrap()
          .with_payload("data");

    router.get("GPIO/%(channel)d/function", |args| {
            if args.int("channel")? > 53 {
              Err(HandlerError::Forbidden("Channel must be in range 0-53".into()))
            } else {
              Ok(Some("IN".into()))
            }
          })
          .unwrap();

    router.get("*", |args| Ok(Some(json!({ "compact": args.compact() }))))
          .unwrap()
          .with_content_type(JSON);

    (router, level)
  }

  #[test]
  fn get_and_post() {
    let (router, level) = gpio_router();

    assert_eq!(router.do_get("GPIO/4/value", true).unwrap(),
               Reply::new(200, Some("0".into()), Some(PLAIN)));

    let reply = router.do_post("GPIO/4/value/1", b"", true).unwrap();
    assert_eq!(reply.body.as_deref(), Some("1"));
    assert_eq!(level.load(Ordering::SeqCst), 1);

    assert_eq!(router.do_get("GPIO/4/value", true).unwrap().body.as_deref(),
               Some("1"));
  }

  #[test]
  fn methods_are_separate() {
    let (router, _) = gpio_router();
    assert_eq!(router.do_post("GPIO/4/value", b"", true).unwrap().status, 0);
    assert_eq!(router.do_get("GPIO/4/value/1", true).unwrap().status, 0);
  }

  #[test]
  fn unrendered_results_have_no_content_type() {
    let (router, _) = gpio_router();
    assert_eq!(router.do_get("GPIO/4/function", true).unwrap(),
               Reply::new(200, Some("IN".into()), None));
  }

  #[test]
  fn payload_binding() {
    let (router, _) = gpio_router();
    let reply = router.do_post("GPIO/4/sequence", b"10,0101", true).unwrap();
    assert_eq!(reply.body.as_deref(), Some("10,0101"));
  }

  #[test]
  fn json_rendering_and_compact() {
    let (router, _) = gpio_router();
    let reply = router.do_get("*", false).unwrap();
    assert_eq!(reply.body.as_deref(), Some(r#"{"compact":false}"#));
    assert_eq!(reply.content_type.as_deref(), Some(JSON));
  }

  #[test]
  fn exact_template_text_wins() {
    let mut router = Router::new();
    router.get("%(name)s", |_| Ok(Some("placeholder".into()))).unwrap();
    router.get("exact", |_| Ok(Some("exact".into()))).unwrap();

    assert_eq!(router.do_get("exact", true).unwrap().body.as_deref(), Some("exact"));
    assert_eq!(router.do_get("other", true).unwrap().body.as_deref(), Some("placeholder"));
  }

  #[test]
  fn handler_errors_propagate() {
    let (router, _) = gpio_router();
    assert!(matches!(router.do_get("GPIO/99/function", true),
                     Err(HandlerError::Forbidden(_))));
  }

  #[test]
  fn empty_result() {
    let mut router = Router::new();
    router.post("reset", |_| Ok(None)).unwrap().with_format("%d");
    assert_eq!(router.do_post("reset", b"", true).unwrap(), Reply::new(200, None, None));
  }

  #[test]
  fn version() {
    let reply = Router::new().do_get("version", true).unwrap();
    assert_eq!(reply, Reply::text(env!("CARGO_PKG_VERSION")));
  }

  #[test]
  fn aliases() {
    let (mut router, _) = gpio_router();
    router.alias("/led", "/GPIO/4");
    router.alias("/l", "/GPIO/17");

    assert_eq!(router.resolve_alias("led/value"), "GPIO/4/value");
    assert_eq!(router.resolve_alias("lamp"), "GPIO/17amp");
    assert_eq!(router.resolve_alias("GPIO/4/value"), "GPIO/4/value");
    assert_eq!(router.do_get("led/value", true).unwrap().status, 200);
  }

  #[test]
  fn macros() {
    let mut router = Router::new();
    router.macro_("sum", |args| {
            let total = args.iter()
                            .map(|a| a.parse::<i64>().map_err(|e| HandlerError::Internal(e.to_string())))
                            .sum::<Result<i64, _>>()?;
            Ok(Some(total.to_string()))
          });
    router.macro_("noop", |_| Ok(None));

    assert_eq!(router.do_post("macros/sum/1,2,3", b"", true).unwrap(),
               Reply::text("6"));
    assert_eq!(router.do_post("macros/sum/4", b"", true).unwrap(), Reply::text("4"));
    assert_eq!(router.do_post("macros/sum", b"", true).unwrap(), Reply::text("0"));
    assert_eq!(router.do_post("macros/noop", b"", true).unwrap(), Reply::text(""));
    assert_eq!(router.do_post("macros/what", b"", true).unwrap(),
               Reply::new(404, Some("what Not Found".into()), Some(PLAIN)));
    assert!(router.do_post("macros/sum/a", b"", true).is_err());
  }
}
