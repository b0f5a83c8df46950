//! Sequential named-field extraction from a byte buffer.
//!
//! The KWM container is a flat little-endian layout with one twist: byte-run
//! fields whose length is given by an earlier integer field. This module
//! decodes such layouts with a small builder: each [`Unpacker::with_field`]
//! call declares the next field and decodes it at the current cursor, so a
//! whole layout reads as a chain of declarations.
//!
//! # Example
//!
//! ```rust
//! use wmsig_crypto::unpacker::{FieldKind, Repeat, Unpacker};
//!
//! // u16 length, then that many bytes, then the rest of the buffer.
//! let data = [0x03, 0x00, b'a', b'b', b'c', 0xff, 0xee];
//! let fields = Unpacker::new(&data)
//!     .with_field(FieldKind::U16, Repeat::Count(1), "len")?
//!     .with_field(FieldKind::Bytes, Repeat::FieldRef("len"), "body")?
//!     .with_field(FieldKind::Bytes, Repeat::Remainder, "tail")?;
//!
//! assert_eq!(fields.uint("len")?, 3);
//! assert_eq!(fields.bytes("body")?, b"abc");
//! assert_eq!(fields.bytes("tail")?, [0xff, 0xee]);
//! # Ok::<(), wmsig_core::error::FormatError>(())
//! ```
//!
//! All multi-byte integers are little-endian; that is the container's native
//! byte order and must be preserved exactly.

use wmsig_core::error::{FormatError, FormatResult};

// ============================================================================
// Field descriptors
// ============================================================================

/// The primitive a field decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Little-endian unsigned 16-bit integer.
    U16,
    /// Little-endian unsigned 32-bit integer.
    U32,
    /// Raw byte run.
    Bytes,
}

/// How many primitives (or, for [`FieldKind::Bytes`], how many bytes) a
/// field covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat<'a> {
    /// A literal count.
    Count(usize),
    /// Everything from the cursor to the end of the buffer.
    Remainder,
    /// The value of a previously decoded integer field, looked up by name.
    ///
    /// This is how length-prefixed fields are expressed: declare the length
    /// integer first, then reference it.
    FieldRef(&'a str),
}

/// A decoded field value.
///
/// A repeat of exactly 1 collapses integer fields to a scalar for ergonomic
/// access; larger repeats decode to a sequence. Byte runs are always a
/// single contiguous value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A single u16.
    U16(u16),
    /// A single u32.
    U32(u32),
    /// A byte run.
    Bytes(Vec<u8>),
    /// A sequence of u16 values.
    U16Seq(Vec<u16>),
    /// A sequence of u32 values.
    U32Seq(Vec<u32>),
}

impl Field {
    /// The value as an unsigned integer, if this is a scalar integer field.
    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::U16(v) => Some(u64::from(*v)),
            Self::U32(v) => Some(u64::from(*v)),
            Self::Bytes(_) | Self::U16Seq(_) | Self::U32Seq(_) => None,
        }
    }

    /// The value as a byte slice, if this is a byte-run field.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

// ============================================================================
// Unpacker
// ============================================================================

/// Cursor-based decoder over a byte buffer.
///
/// Fields are decoded in declaration order in a single pass; the decoded
/// mapping is kept in declaration order so error messages can list what is
/// known so far.
#[derive(Debug)]
pub struct Unpacker<'b> {
    /// The buffer being decoded.
    buffer: &'b [u8],
    /// Offset of the next undecoded byte.
    cursor: usize,
    /// Decoded fields in declaration order. Layouts here are a handful of
    /// fields, so linear lookup beats a map.
    fields: Vec<(String, Field)>,
}

impl<'b> Unpacker<'b> {
    /// Start decoding `buffer` at offset 0.
    #[must_use]
    pub const fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            fields: Vec::new(),
        }
    }

    /// Declare and decode the next field.
    ///
    /// # Errors
    /// - [`FormatError::BadLengthRef`] if `repeat` references a field that
    ///   is absent or not a scalar integer.
    /// - [`FormatError::UnexpectedEnd`] if the buffer is too short for the
    ///   declared field.
    pub fn with_field(
        mut self,
        kind: FieldKind,
        repeat: Repeat<'_>,
        name: &str,
    ) -> FormatResult<Self> {
        let count = self.resolve_repeat(repeat)?;
        let value = match kind {
            FieldKind::Bytes => {
                let len = count.unwrap_or(self.remaining());
                Field::Bytes(self.take(len, name)?.to_vec())
            }
            FieldKind::U16 => {
                self.decode_ints(count, name, u16::from_le_bytes, Field::U16, Field::U16Seq)?
            }
            FieldKind::U32 => {
                self.decode_ints(count, name, u32::from_le_bytes, Field::U32, Field::U32Seq)?
            }
        };
        self.fields.push((name.to_string(), value));
        Ok(self)
    }

    /// Look up a decoded field by name.
    ///
    /// # Errors
    /// Returns [`FormatError::UnknownField`] listing the currently known
    /// field names when `name` was never declared.
    pub fn get(&self, name: &str) -> FormatResult<&Field> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f)
            .ok_or_else(|| FormatError::unknown_field(name, self.names()))
    }

    /// Look up a decoded scalar integer field by name.
    ///
    /// # Errors
    /// [`FormatError::UnknownField`] for undeclared names,
    /// [`FormatError::WrongKind`] when the field is not a scalar integer.
    pub fn uint(&self, name: &str) -> FormatResult<u64> {
        self.get(name)?
            .as_uint()
            .ok_or_else(|| FormatError::wrong_kind(name, "an integer"))
    }

    /// Look up a decoded byte-run field by name.
    ///
    /// # Errors
    /// [`FormatError::UnknownField`] for undeclared names,
    /// [`FormatError::WrongKind`] when the field is not a byte run.
    pub fn bytes(&self, name: &str) -> FormatResult<&[u8]> {
        self.get(name)?
            .as_bytes()
            .ok_or_else(|| FormatError::wrong_kind(name, "a byte run"))
    }

    /// Number of undecoded bytes left in the buffer.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Names of the fields decoded so far, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Resolve a repeat to a concrete count (`None` means "to end of buffer").
    fn resolve_repeat(&self, repeat: Repeat<'_>) -> FormatResult<Option<usize>> {
        match repeat {
            Repeat::Count(n) => Ok(Some(n)),
            Repeat::Remainder => Ok(None),
            Repeat::FieldRef(name) => {
                let value = self
                    .fields
                    .iter()
                    .find(|(n, _)| n == name)
                    .and_then(|(_, f)| f.as_uint())
                    .ok_or_else(|| FormatError::bad_length_ref(name))?;
                usize::try_from(value).map(Some).map_err(|_| FormatError::bad_length_ref(name))
            }
        }
    }

    /// Consume `len` bytes at the cursor.
    fn take(&mut self, len: usize, name: &str) -> FormatResult<&'b [u8]> {
        if self.remaining() < len {
            return Err(FormatError::unexpected_end(name, len, self.remaining()));
        }
        let slice = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(slice)
    }

    /// Decode `count` fixed-width integers; a count of exactly 1 collapses
    /// to a scalar.
    fn decode_ints<const W: usize, T, F>(
        &mut self,
        count: Option<usize>,
        name: &str,
        from_le: F,
        scalar: impl Fn(T) -> Field,
        sequence: impl Fn(Vec<T>) -> Field,
    ) -> FormatResult<Field>
    where
        F: Fn([u8; W]) -> T,
    {
        let count = count.unwrap_or(self.remaining() / W);
        let raw = self.take(count * W, name)?;
        let mut values: Vec<T> = raw
            .chunks_exact(W)
            .map(|chunk| {
                let mut word = [0u8; W];
                word.copy_from_slice(chunk);
                from_le(word)
            })
            .collect();
        if values.len() == 1 {
            // Repeat of exactly 1 collapses to a scalar field.
            let only = values.remove(0);
            Ok(scalar(only))
        } else {
            Ok(sequence(values))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
