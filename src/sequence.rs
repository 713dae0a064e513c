/// One-byte sequence counter for outgoing commands.
///
/// BattlEye tags each command with a single byte, so the counter starts at 0
/// and wraps from 255 back to 0. It is owned by one session and never shared.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
  next: u8,
}

impl SequenceCounter {
  /// Creates a counter whose first value is 0.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the next sequence number and advances the counter.
  pub fn next(&mut self) -> u8 {
    let current = self.next;
    self.next = self.next.wrapping_add(1);
    current
  }
}
