//! Path templates like `GPIO/%(channel)d/value`.
//!
//! A template is split on `/`. Each segment is either a literal, compared
//! verbatim, or a placeholder capturing the matching path segment:
//!
//! |placeholder|captures|
//! |---|---|
//! |`%name`, `%(name)`, `%(name)s`|string|
//! |`%(name)b`|bool (`1`, `true`, `True`, `yes`, `Yes` are true)|
//! |`%(name)d`|int, with `0b` / `0x` prefixes for binary / hex|
//! |`%(name)x`|hex int|
//! |`%(name)f`|float|

use std::collections::BTreeMap;
use std::fmt;

use crate::handler::HandlerError;

/// A template that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
  /// `%(` without a matching `)`
  MissingClosingBrace(String),
  /// A type character outside `s`, `b`, `d`, `x`, `f`
  UnknownType(char),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | TemplateError::MissingClosingBrace(seg) => write!(f, "missing closing brace in {:?}", seg),
      | TemplateError::UnknownType(t) => write!(f, "unknown format type: {}", t),
    }
  }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgType {
  Str,
  Bool,
  Int,
  Hex,
  Float,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Literal(String),
  Placeholder(String, ArgType),
}

impl Segment {
  fn parse(seg: &str) -> Result<Self, TemplateError> {
    let fmt = match seg.strip_prefix('%') {
      | Some(fmt) if !fmt.is_empty() => fmt,
      | _ => return Ok(Segment::Literal(seg.to_string())),
    };

    let (name, ty) = match fmt.strip_prefix('(') {
      | None => (fmt, 's'),
      | Some(inner) => match inner.rfind(')') {
        | Some(close) if close == inner.len() - 1 => (&inner[..close], 's'),
        | Some(close) if close + 2 == inner.len() => {
          (&inner[..close], inner[close + 1..].chars().next().unwrap_or('s'))
        },
        | _ => return Err(TemplateError::MissingClosingBrace(seg.to_string())),
      },
    };

    let ty = match ty {
      | 's' => ArgType::Str,
      | 'b' => ArgType::Bool,
      | 'd' => ArgType::Int,
      | 'x' => ArgType::Hex,
      | 'f' => ArgType::Float,
      | other => return Err(TemplateError::UnknownType(other)),
    };

    Ok(Segment::Placeholder(name.to_string(), ty))
  }
}

/// A parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  text: String,
  segments: Vec<Segment>,
}

impl Template {
  /// Parse a template
  pub fn parse(text: &str) -> Result<Self, TemplateError> {
    let segments = text.split('/')
                       .map(Segment::parse)
                       .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { text: text.to_string(),
              segments })
  }

  /// The template as written
  pub fn text(&self) -> &str {
    &self.text
  }

  /// Match a path against this template, yielding the captured arguments.
  ///
  /// A placeholder whose segment does not parse as its type does not match.
  ///
  /// ```
  /// use iopi::router::template::{Arg, Template};
  ///
  /// let t = Template::parse("GPIO/%(channel)d/value").unwrap();
  ///
  /// let args = t.matches("GPIO/0x19/value").unwrap();
  /// assert_eq!(args.get("channel"), Some(&Arg::Int(25)));
  ///
  /// assert!(t.matches("GPIO/abc/value").is_none());
  /// assert!(t.matches("GPIO/25").is_none());
  /// ```
  pub fn matches(&self, path: &str) -> Option<Args> {
    let parts = path.split('/').collect::<Vec<_>>();
    if parts.len() != self.segments.len() {
      return None;
    }

    let mut args = Args::default();
    for (seg, part) in self.segments.iter().zip(parts) {
      match seg {
        | Segment::Literal(lit) if lit == part => (),
        | Segment::Literal(_) => return None,
        | Segment::Placeholder(name, ty) => {
          args.insert(name, parse_arg(*ty, part)?);
        },
      }
    }

    Some(args)
  }
}

fn str_to_bool(s: &str) -> bool {
  matches!(s, "1" | "true" | "True" | "yes" | "Yes")
}

fn str_to_int(s: &str) -> Option<i64> {
  let (neg, digits) = match s.strip_prefix('-') {
    | Some(d) => (true, d),
    | None => (false, s),
  };

  let n = if let Some(bin) = digits.strip_prefix("0b") {
    i64::from_str_radix(bin, 2).ok()?
  } else if let Some(hex) = digits.strip_prefix("0x") {
    i64::from_str_radix(hex, 16).ok()?
  } else {
    digits.parse::<i64>().ok()?
  };

  Some(if neg { -n } else { n })
}

fn parse_arg(ty: ArgType, s: &str) -> Option<Arg> {
  match ty {
    | ArgType::Str => Some(Arg::Str(s.to_string())),
    | ArgType::Bool => Some(Arg::Bool(str_to_bool(s))),
    | ArgType::Int => str_to_int(s).map(Arg::Int),
    | ArgType::Hex => {
      let hex = s.strip_prefix("0x").unwrap_or(s);
      i64::from_str_radix(hex, 16).ok().map(Arg::Int)
    },
    | ArgType::Float => s.parse::<f64>().ok().map(Arg::Float),
  }
}

/// A captured argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
  /// `%(name)s`, or a bound payload
  Str(String),
  /// `%(name)b`
  Bool(bool),
  /// `%(name)d` and `%(name)x`
  Int(i64),
  /// `%(name)f`
  Float(f64),
}

/// Arguments passed to an endpoint
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Args {
  values: BTreeMap<String, Arg>,
  compact: bool,
}

impl Args {
  pub(crate) fn insert(&mut self, name: &str, arg: Arg) {
    self.values.insert(name.to_string(), arg);
  }

  pub(crate) fn set_compact(&mut self, compact: bool) {
    self.compact = compact;
  }

  /// Whether the transport asked for abbreviated output
  pub fn compact(&self) -> bool {
    self.compact
  }

  /// Get an argument by name
  pub fn get(&self, name: &str) -> Option<&Arg> {
    self.values.get(name)
  }

  fn missing(name: &str, ty: &str) -> HandlerError {
    HandlerError::Internal(format!("missing {} argument {:?}", ty, name))
  }

  /// Get a string argument
  pub fn str(&self, name: &str) -> Result<&str, HandlerError> {
    match self.get(name) {
      | Some(Arg::Str(s)) => Ok(s),
      | _ => Err(Self::missing(name, "string")),
    }
  }

  /// Get a bool argument
  pub fn bool(&self, name: &str) -> Result<bool, HandlerError> {
    match self.get(name) {
      | Some(Arg::Bool(b)) => Ok(*b),
      | Some(Arg::Str(s)) => Ok(str_to_bool(s)),
      | _ => Err(Self::missing(name, "bool")),
    }
  }

  /// Get an int argument.
  ///
  /// String arguments, such as a bound payload, are parsed like `%(name)d`.
  pub fn int(&self, name: &str) -> Result<i64, HandlerError> {
    match self.get(name) {
      | Some(Arg::Int(n)) => Ok(*n),
      | Some(Arg::Str(s)) => str_to_int(s).ok_or_else(|| {
                                             HandlerError::Internal(format!("invalid literal for int: {:?}", s))
                                           }),
      | _ => Err(Self::missing(name, "int")),
    }
  }

  /// Get a float argument
  pub fn float(&self, name: &str) -> Result<f64, HandlerError> {
    match self.get(name) {
      | Some(Arg::Float(f)) => Ok(*f),
      | Some(Arg::Int(n)) => Ok(*n as f64),
      | Some(Arg::Str(s)) => s.parse()
                              .map_err(|_| HandlerError::Internal(format!("could not convert {:?} to float", s))),
      | _ => Err(Self::missing(name, "float")),
    }
  }
}
