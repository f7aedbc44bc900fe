#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
  /// packet counter
  pub(crate) counter: u32, // 0 - 4
  /// ASCII tag
  pub(crate) tag: [u8; 8], // 4 - 12

  // Version 2 fields.

  pub(crate) flags: [u16; 2], // 12 - 16
  /// Creation time.
  pub(crate) stamp: u64, // 16 - 24
}

impl Header {
  pub(crate) const WIDTH: usize = 24;

  /// Reads every field at its packed position in native byte order.
  fn from_native(block: &[u8; Self::WIDTH]) -> Self {
    Self {
      counter: u32::from_be_bytes([block[0], block[1], block[2], block[3]]),
      tag: core::array::from_fn(|i| block[4 + i]),
      flags: core::array::from_fn(|i| { let at = 12 + i * 2; u16::from_be_bytes([block[at], block[at + 1]]) }),
      stamp: u64::from_be_bytes([block[16], block[17], block[18], block[19], block[20], block[21], block[22], block[23]]),
    }
  }
}

impl From<&[u8; Header::WIDTH]> for Header {
  #[cfg(any())]
  fn from(block: &[u8; Self::WIDTH]) -> Self {
    Self::from_native(block)
  }

  #[cfg(all())]
  fn from(block: &[u8; Self::WIDTH]) -> Self {
    let mut raw = Self::from_native(block);
    raw.counter = u32::swap_bytes(raw.counter);
    raw.flags = [
      u16::swap_bytes(raw.flags[0]),
      u16::swap_bytes(raw.flags[1]),
    ];
    raw.stamp = u64::swap_bytes(raw.stamp);
    raw
  }
}
