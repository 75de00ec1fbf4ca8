//! 5x5 display payloads: symbol bitmaps and scroll text.

/// Side length of the LED matrix.
pub const DISPLAY_SIZE: usize = 5;

/// Number of payload bytes carrying a symbol bitmap.
pub const SYMBOL_LEN: usize = 4;

/// Longest scroll text accepted by the display-write command.
pub const MAX_SCROLL_LEN: usize = 18;

const SYMBOL_MASK: u32 = (1 << 25) - 1;

/// A 5x5 image packed into 25 bits.
///
/// Bits are laid out column-major: pixel `(row, col)` is bit
/// `col * 5 + row` of the big-endian word formed by the four payload bytes.
///
/// # Example
///
/// ```
/// use botlink_proto::Symbol;
///
/// let symbol = Symbol::from_payload([0x00, 0x00, 0x00, 0x01]);
/// assert!(symbol.is_lit(0, 0));
/// assert!(!symbol.is_lit(1, 0));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Symbol(u32);

impl Symbol {
    pub const BLANK: Self = Self(0);
    pub const FULL: Self = Self(SYMBOL_MASK);

    /// Build from a raw 25-bit value; higher bits are ignored.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & SYMBOL_MASK)
    }

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Decode the four payload bytes of a display frame.
    #[inline]
    #[must_use]
    pub const fn from_payload(bytes: [u8; SYMBOL_LEN]) -> Self {
        Self::from_bits(u32::from_be_bytes(bytes))
    }

    /// Encode into the four payload bytes of a display frame.
    #[inline]
    #[must_use]
    pub const fn to_payload(self) -> [u8; SYMBOL_LEN] {
        self.0.to_be_bytes()
    }

    #[inline]
    const fn bit(row: usize, col: usize) -> u32 {
        1 << (col * DISPLAY_SIZE + row)
    }

    /// Whether the pixel at `(row, col)` is on. Out-of-range coordinates are off.
    #[inline]
    #[must_use]
    pub const fn is_lit(self, row: usize, col: usize) -> bool {
        row < DISPLAY_SIZE && col < DISPLAY_SIZE && self.0 & Self::bit(row, col) != 0
    }

    /// Turn one pixel on or off. Out-of-range coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, lit: bool) {
        if row >= DISPLAY_SIZE || col >= DISPLAY_SIZE {
            return;
        }
        if lit {
            self.0 |= Self::bit(row, col);
        } else {
            self.0 &= !Self::bit(row, col);
        }
    }

    /// Build from a per-pixel grid indexed `[row][col]`.
    #[must_use]
    pub fn from_pixels(pixels: &[[bool; DISPLAY_SIZE]; DISPLAY_SIZE]) -> Self {
        let mut symbol = Self::BLANK;
        for (row, line) in pixels.iter().enumerate() {
            for (col, &lit) in line.iter().enumerate() {
                symbol.set(row, col, lit);
            }
        }
        symbol
    }

    /// Expand into a per-pixel grid indexed `[row][col]`.
    #[must_use]
    pub fn pixels(self) -> [[bool; DISPLAY_SIZE]; DISPLAY_SIZE] {
        let mut pixels = [[false; DISPLAY_SIZE]; DISPLAY_SIZE];
        for (row, line) in pixels.iter_mut().enumerate() {
            for (col, lit) in line.iter_mut().enumerate() {
                *lit = self.is_lit(row, col);
            }
        }
        pixels
    }
}

/// Scroll/print text carried inline in a frame (at most [`MAX_SCROLL_LEN`] bytes).
///
/// The bytes are passed to the display untouched; no encoding is assumed.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Text {
    bytes: [u8; MAX_SCROLL_LEN],
    len: u8,
}

impl Text {
    /// Copy `bytes` into a text buffer. Returns `None` if it is too long.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_SCROLL_LEN {
            return None;
        }
        let mut text = Self::default();
        text.bytes[..bytes.len()].copy_from_slice(bytes);
        text.len = bytes.len() as u8;
        Some(text)
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
