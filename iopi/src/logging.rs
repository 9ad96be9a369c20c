use iopi_msg::{CodeKind, Message};

/// One-line description of a message, e.g.
/// `Request CON 0.01 /GPIO/25/value (id 3, 0 byte payload)`
///
/// ```
/// use iopi::logging::msg_summary;
/// use iopi_msg::{Code, Id, Message, Type};
///
/// let mut msg = Message::new(Type::Con, Code::new(0, 1), Id(3));
/// msg.set_path("GPIO/25/value");
///
/// assert_eq!(msg_summary(&msg),
///            "Request CON 0.01 /GPIO/25/value (id 3, 0 byte payload)");
/// ```
pub fn msg_summary(msg: &Message) -> String {
  let kind = match msg.code.kind() {
    | CodeKind::Empty => "Empty",
    | CodeKind::Request => "Request",
    | CodeKind::Response => "Response",
  };

  let path = match msg.path() {
    | p if p.is_empty() => p,
    | p => format!(" {}", p),
  };

  format!("{} {} {}{} (id {}, {} byte payload)",
          kind,
          msg.ty.name(),
          msg.code,
          path,
          msg.id.0,
          msg.payload.0.len())
}
