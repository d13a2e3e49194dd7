//! Immutable fixed-radix paths through the tree.
//!
//! A [`PathView`] is a window `(offset, len)` over a shared, immutable byte buffer. The buffer is
//! read as a sequence of fixed-width symbols, most significant bits first: one bit per symbol for
//! [`BitPath`], four bits per symbol for [`NibblePath`]. Slicing only moves the window, so every
//! sub-path shares the buffer of the path it was cut from.
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher as StdHasher};
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use bitvec::{order::Msb0, view::BitView};

use crate::PathError;

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

/// Symbol width of a [`PathView`].
pub trait Radix: Debug + Clone + Copy + Default + Send + Sync + 'static {
    /// Width of one symbol in bits. Must divide 8.
    const BITS: usize;
    /// Name of the path type, used by `Debug`.
    const NAME: &'static str;

    /// Reads the symbol at `index` (counted in symbols from the start of `bytes`).
    fn read(bytes: &[u8], index: usize) -> u8;
    fn to_char(symbol: u8) -> char;
    fn from_char(c: char) -> Option<u8>;
}

/// One bit per symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bit;

impl Radix for Bit {
    const BITS: usize = 1;
    const NAME: &'static str = "BitPath";

    fn read(bytes: &[u8], index: usize) -> u8 {
        bytes.view_bits::<Msb0>()[index] as u8
    }
    fn to_char(symbol: u8) -> char {
        if symbol == 0 {
            '0'
        } else {
            '1'
        }
    }
    fn from_char(c: char) -> Option<u8> {
        match c {
            '0' => Some(0),
            '1' => Some(1),
            _ => None,
        }
    }
}

/// Four bits (half a byte) per symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nibble;

impl Radix for Nibble {
    const BITS: usize = 4;
    const NAME: &'static str = "NibblePath";

    fn read(bytes: &[u8], index: usize) -> u8 {
        let byte = bytes[index / 2];
        if index % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0f
        }
    }
    fn to_char(symbol: u8) -> char {
        HEX_CHARS[(symbol & 0x0f) as usize] as char
    }
    fn from_char(c: char) -> Option<u8> {
        c.to_digit(16).map(|digit| digit as u8)
    }
}

pub type BitPath = PathView<Bit>;
pub type NibblePath = PathView<Nibble>;

/// Immutable view over a sequence of `R` symbols.
///
/// Equality and hashing compare symbol content, never the underlying buffer.
#[derive(Clone)]
pub struct PathView<R: Radix> {
    buf: Arc<[u8]>,
    offset: usize,
    len: usize,
    _radix: PhantomData<R>,
}

impl<R: Radix> PathView<R> {
    /// The empty path.
    pub fn empty() -> Self {
        Self::new(Arc::from(Vec::new()), 0, 0)
    }

    /// Creates a path covering every symbol of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let len = bytes.len() * 8 / R::BITS;
        Self::new(Arc::from(bytes), 0, len)
    }

    fn new(buf: Arc<[u8]>, offset: usize, len: usize) -> Self {
        debug_assert!((offset + len) * R::BITS <= buf.len() * 8);
        Self {
            buf,
            offset,
            len,
            _radix: PhantomData,
        }
    }

    /// Sub-view without bounds checking. Callers guarantee `begin + len <= self.len`.
    fn view(&self, begin: usize, len: usize) -> Self {
        if begin == 0 && len == self.len {
            return self.clone();
        }
        Self::new(self.buf.clone(), self.offset + begin, len)
    }

    /// Number of symbols in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the symbol at `index`.
    pub fn symbol_at(&self, index: usize) -> Result<u8, PathError> {
        if index >= self.len {
            return Err(PathError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(R::read(&self.buf, self.offset + index))
    }

    /// Iterates over the symbols of the view.
    pub fn symbols(&self) -> impl Iterator<Item = u8> + '_ {
        (self.offset..self.offset + self.len).map(|i| R::read(&self.buf, i))
    }

    /// Returns the symbols `begin..end` as a new view over the same buffer.
    pub fn slice(&self, begin: usize, end: usize) -> Result<Self, PathError> {
        if begin > end || end > self.len {
            return Err(PathError::SliceOutOfRange {
                begin,
                end,
                len: self.len,
            });
        }
        Ok(self.view(begin, end - begin))
    }

    /// Returns the symbols from `begin` to the end of the view.
    pub fn slice_from(&self, begin: usize) -> Result<Self, PathError> {
        self.slice(begin, self.len)
    }

    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.starts_with_at(prefix, 0)
    }

    /// Tests whether the sub-path beginning at `offset` starts with `prefix`.
    /// An `offset` past the end is simply not a match.
    pub fn starts_with_at(&self, prefix: &Self, offset: usize) -> bool {
        if offset > self.len || prefix.len > self.len - offset {
            return false;
        }
        self.view(offset, prefix.len).symbols().eq(prefix.symbols())
    }

    /// Longest prefix shared by `a` and `b`, as a view into `a`.
    ///
    /// `"1a2b3c"` and `"1a2f4d"` share `"1a2"`.
    pub fn common_prefix(a: &Self, b: &Self) -> Self {
        let shared = a
            .symbols()
            .zip(b.symbols())
            .take_while(|(x, y)| x == y)
            .count();
        a.view(0, shared)
    }

    /// Reinterprets this view as a bit path over the same buffer.
    pub fn bits(&self) -> BitPath {
        PathView::new(self.buf.clone(), self.offset * R::BITS, self.len * R::BITS)
    }
}

impl<R: Radix> Default for PathView<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: Radix> PartialEq for PathView<R> {
    fn eq(&self, other: &Self) -> bool {
        if self.len != other.len {
            return false;
        }
        if Arc::ptr_eq(&self.buf, &other.buf) && self.offset == other.offset {
            return true;
        }
        self.symbols().eq(other.symbols())
    }
}

impl<R: Radix> Eq for PathView<R> {}

impl<R: Radix> Hash for PathView<R> {
    fn hash<S: StdHasher>(&self, state: &mut S) {
        state.write_usize(self.len);
        for symbol in self.symbols() {
            state.write_u8(symbol);
        }
    }
}

impl<R: Radix> Display for PathView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.symbols()
            .try_for_each(|symbol| write!(f, "{}", R::to_char(symbol)))
    }
}

impl<R: Radix> Debug for PathView<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", R::NAME, self)
    }
}

impl<R: Radix> FromStr for PathView<R> {
    type Err = PathError;

    /// Parses one character per symbol. Lengths that do not fill whole bytes are padded with
    /// zero bits in the buffer and cut off by the view.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols = s
            .chars()
            .map(|c| R::from_char(c).ok_or(PathError::InvalidSymbol(c)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut bytes = vec![0u8; (symbols.len() * R::BITS).div_ceil(8)];
        for (i, &symbol) in symbols.iter().enumerate() {
            let bit = i * R::BITS;
            bytes[bit / 8] |= symbol << (8 - R::BITS - bit % 8);
        }
        Ok(Self::new(Arc::from(bytes), 0, symbols.len()))
    }
}
