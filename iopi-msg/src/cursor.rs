/// A cursor over a byte array (std- and alloc-less port of [`std::io::Cursor`])
///
/// Every read is bounds-checked; running off the end of the buffer
/// yields `None` rather than panicking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Cursor<T> {
  t: T,
  cursor: usize,
}

impl<T: AsRef<[u8]>> Cursor<T> {
  /// Creates a new cursor
  pub(crate) fn new(t: T) -> Cursor<T> {
    Cursor { t, cursor: 0 }
  }

  fn len(&self) -> usize {
    self.t.as_ref().len()
  }

  /// Take the next byte in the cursor, returning None
  /// if the cursor is exhausted.
  pub(crate) fn next(&mut self) -> Option<u8> {
    self.take_exact(1).map(|a| a[0])
  }

  /// Take `n` bytes from the cursor, returning None if
  /// fewer than `n` bytes remain.
  ///
  /// The position is not advanced when this returns None.
  pub(crate) fn take_exact(&mut self, n: usize) -> Option<&[u8]> {
    let end = self.cursor.checked_add(n).filter(|end| *end <= self.len())?;
    let start = self.cursor;
    self.cursor = end;
    Some(&self.t.as_ref()[start..end])
  }

  /// Consume and return every byte remaining in the buffer
  pub(crate) fn take_until_end(&mut self) -> &[u8] {
    let start = self.cursor;
    self.cursor = self.len();
    &self.t.as_ref()[start..]
  }

  /// Number of bytes that have not yet been consumed
  pub(crate) fn remaining(&self) -> usize {
    self.len() - self.cursor
  }

  /// Whether the cursor has reached the end
  /// of the buffer.
  pub(crate) fn is_exhausted(&self) -> bool {
    self.remaining() == 0
  }
}
