//! `%`-style formatting of handler results.
//!
//! Supports `%s`, `%d`/`%i`, `%x`/`%X`, `%f` and `%%`, with an optional
//! zero flag, width and precision (`%04d`, `%.2f`). A JSON array supplies
//! one value per conversion; any other value is used for every conversion.

use std::fmt;

use serde_json::Value;

/// Why a value could not be formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
  /// The format string ended in the middle of a conversion
  Incomplete,
  /// A conversion character this formatter does not know
  UnknownConversion(char),
  /// The format asked for more values than were given
  NotEnoughValues,
  /// A numeric conversion was given something that is not a number
  NotANumber(String),
}

impl fmt::Display for FormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | FormatError::Incomplete => write!(f, "incomplete format"),
      | FormatError::UnknownConversion(c) => write!(f, "unsupported format character {:?}", c),
      | FormatError::NotEnoughValues => write!(f, "not enough arguments for format string"),
      | FormatError::NotANumber(v) => write!(f, "a number is required, not {}", v),
    }
  }
}

/// Render a value as text: strings as-is, everything else as JSON
pub fn to_text(value: &Value) -> String {
  match value {
    | Value::String(s) => s.clone(),
    | other => other.to_string(),
  }
}

fn as_int(value: &Value) -> Result<i64, FormatError> {
  match value {
    | Value::Bool(b) => Ok(*b as i64),
    | Value::Number(n) => n.as_i64()
                           .or_else(|| n.as_f64().map(|f| f as i64))
                           .ok_or_else(|| FormatError::NotANumber(n.to_string())),
    | other => Err(FormatError::NotANumber(to_text(other))),
  }
}

fn as_float(value: &Value) -> Result<f64, FormatError> {
  match value {
    | Value::Bool(b) => Ok(*b as i64 as f64),
    | Value::Number(n) => n.as_f64()
                           .ok_or_else(|| FormatError::NotANumber(n.to_string())),
    | other => Err(FormatError::NotANumber(to_text(other))),
  }
}

#[derive(Default)]
struct Flags {
  zero: bool,
  width: usize,
  precision: Option<usize>,
}

impl Flags {
  fn pad(&self, s: String) -> String {
    if s.len() >= self.width {
      s
    } else if self.zero {
      let (sign, digits) = match s.strip_prefix('-') {
        | Some(d) => ("-", d),
        | None => ("", s.as_str()),
      };
      format!("{}{:0>w$}", sign, digits, w = self.width - sign.len())
    } else {
      format!("{:>w$}", s, w = self.width)
    }
  }
}

/// Format `value` with `fmt`
///
/// ```
/// use iopi::router::format::format;
/// use serde_json::json;
///
/// assert_eq!(format("%d%%", &json!(42)).unwrap(), "42%");
/// assert_eq!(format("%.2f", &json!(0.5)).unwrap(), "0.50");
/// assert_eq!(format("%s=%02x", &json!(["a", 10])).unwrap(), "a=0a");
/// ```
pub fn format(fmt: &str, value: &Value) -> Result<String, FormatError> {
  let mut values: Box<dyn Iterator<Item = &Value> + '_> = match value {
    | Value::Array(items) => Box::new(items.iter()),
    | single => Box::new(std::iter::repeat(single)),
  };

  let mut out = String::with_capacity(fmt.len());
  let mut chars = fmt.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '%' {
      out.push(c);
      continue;
    }

    let mut flags = Flags::default();
    if chars.peek() == Some(&'0') {
      flags.zero = true;
      chars.next();
    }
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
      flags.width = flags.width * 10 + d as usize;
      chars.next();
    }
    if chars.peek() == Some(&'.') {
      chars.next();
      let mut precision = 0;
      while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        precision = precision * 10 + d as usize;
        chars.next();
      }
      flags.precision = Some(precision);
    }

    let conv = chars.next().ok_or(FormatError::Incomplete)?;
    if conv == '%' {
      out.push('%');
      continue;
    }

    let value = values.next().ok_or(FormatError::NotEnoughValues)?;
    let rendered = match conv {
      | 's' => to_text(value),
      | 'd' | 'i' => as_int(value)?.to_string(),
      | 'x' => format!("{:x}", as_int(value)?),
      | 'X' => format!("{:X}", as_int(value)?),
      | 'f' => format!("{:.p$}", as_float(value)?, p = flags.precision.unwrap_or(6)),
      | other => return Err(FormatError::UnknownConversion(other)),
    };

    out.push_str(&flags.pad(rendered));
  }

  Ok(out)
}
