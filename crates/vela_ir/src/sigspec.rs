//! Signal references built from chunks of wires and constants.
//!
//! A [`SigSpec`] is an ordered concatenation of [`SigChunk`]s, each either
//! a contiguous slice of a wire or a constant vector. Chunk 0 holds the
//! least significant bits. The optimizer manipulates signals both at chunk
//! granularity (cheap concatenation and extraction) and at bit granularity
//! ([`SigBit`], used by the alias map and the pattern rules).

use crate::constant::Const;
use crate::ids::WireId;
use crate::module::Module;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use vela_common::{Interner, Logic, LogicVec};

/// A single bit of a signal: one bit of a wire, or a constant value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigBit {
    /// Bit `bit` of wire `wire`.
    Wire {
        /// The wire.
        wire: WireId,
        /// The bit index within the wire.
        bit: u32,
    },
    /// A constant logic value.
    Const(Logic),
}

impl SigBit {
    /// Returns `true` for constant `X`/`Z` bits.
    pub fn is_undef(self) -> bool {
        matches!(self, SigBit::Const(v) if v.is_undef())
    }
}

/// A contiguous piece of a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigChunk {
    /// The bit range `[offset, offset + width)` of a wire.
    Wire {
        /// The wire.
        wire: WireId,
        /// The first bit of the range.
        offset: u32,
        /// The number of bits, at least 1.
        width: u32,
    },
    /// A constant vector.
    Const(LogicVec),
}

impl SigChunk {
    /// The width of this chunk in bits.
    pub fn width(&self) -> u32 {
        match self {
            SigChunk::Wire { width, .. } => *width,
            SigChunk::Const(v) => v.width(),
        }
    }
}

/// An ordered, possibly empty concatenation of chunks.
///
/// Equality and hashing are defined on the bit sequence, so two specs that
/// chunk the same bits differently compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigSpec {
    chunks: Vec<SigChunk>,
}

impl SigSpec {
    /// The empty signal.
    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }

    /// The whole of a wire of the given width.
    pub fn wire(wire: WireId, width: u32) -> Self {
        Self::from_chunks(vec![SigChunk::Wire {
            wire,
            offset: 0,
            width,
        }])
    }

    /// The bit range `[offset, offset + width)` of a wire.
    pub fn wire_slice(wire: WireId, offset: u32, width: u32) -> Self {
        Self::from_chunks(vec![SigChunk::Wire {
            wire,
            offset,
            width,
        }])
    }

    /// A constant signal.
    pub fn constant(value: LogicVec) -> Self {
        Self::from_chunks(vec![SigChunk::Const(value)])
    }

    /// A single-bit constant signal.
    pub fn bit(value: Logic) -> Self {
        Self::constant(LogicVec::from_logic(value))
    }

    /// An all-`X` signal of the given width.
    pub fn undef(width: u32) -> Self {
        Self::constant(LogicVec::undef(width))
    }

    /// Builds a spec from chunks, dropping zero-width chunks and merging
    /// mergeable neighbors.
    pub fn from_chunks(chunks: Vec<SigChunk>) -> Self {
        let mut spec = Self::empty();
        for chunk in chunks {
            spec.push_chunk(chunk);
        }
        spec
    }

    /// Builds a spec from a bit sequence (bit 0 first), re-chunking into
    /// maximal runs.
    pub fn from_bits<I: IntoIterator<Item = SigBit>>(bits: I) -> Self {
        let mut spec = Self::empty();
        for bit in bits {
            spec.push_bit(bit);
        }
        spec
    }

    /// The chunks, least significant first.
    pub fn chunks(&self) -> &[SigChunk] {
        &self.chunks
    }

    /// Total width in bits.
    pub fn width(&self) -> u32 {
        self.chunks.iter().map(SigChunk::width).sum()
    }

    /// Returns `true` if the signal has no bits.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Appends `other` at the most significant end.
    pub fn append(&mut self, other: &SigSpec) {
        for chunk in &other.chunks {
            self.push_chunk(chunk.clone());
        }
    }

    /// Appends a single chunk at the most significant end, merging with
    /// the current top chunk when the two are contiguous.
    pub fn push_chunk(&mut self, chunk: SigChunk) {
        if chunk.width() == 0 {
            return;
        }
        if let Some(top) = self.chunks.last_mut() {
            match (top, &chunk) {
                (
                    SigChunk::Wire {
                        wire: w1,
                        offset: o1,
                        width: n1,
                    },
                    SigChunk::Wire {
                        wire: w2,
                        offset: o2,
                        width: n2,
                    },
                ) if w1 == w2 && *o1 + *n1 == *o2 => {
                    *n1 += *n2;
                    return;
                }
                (SigChunk::Const(v1), SigChunk::Const(v2)) => {
                    *v1 = v1.concat(v2);
                    return;
                }
                _ => {}
            }
        }
        self.chunks.push(chunk);
    }

    /// Appends a single bit at the most significant end.
    pub fn push_bit(&mut self, bit: SigBit) {
        let chunk = match bit {
            SigBit::Wire { wire, bit } => SigChunk::Wire {
                wire,
                offset: bit,
                width: 1,
            },
            SigBit::Const(v) => SigChunk::Const(LogicVec::from_logic(v)),
        };
        self.push_chunk(chunk);
    }

    /// The bit sequence, bit 0 first.
    pub fn bits(&self) -> Vec<SigBit> {
        let mut bits = Vec::with_capacity(self.width() as usize);
        for chunk in &self.chunks {
            match chunk {
                SigChunk::Wire {
                    wire,
                    offset,
                    width,
                } => {
                    for i in 0..*width {
                        bits.push(SigBit::Wire {
                            wire: *wire,
                            bit: offset + i,
                        });
                    }
                }
                SigChunk::Const(v) => {
                    for b in v.iter() {
                        bits.push(SigBit::Const(b));
                    }
                }
            }
        }
        bits
    }

    /// The single bit of a 1-bit signal, or `None` for other widths.
    pub fn as_bit(&self) -> Option<SigBit> {
        if self.width() == 1 {
            self.bits().first().copied()
        } else {
            None
        }
    }

    /// Copies the bit range `[offset, offset + width)` into a new spec.
    ///
    /// # Panics
    ///
    /// Panics if the range extends past the end of the signal.
    pub fn extract(&self, offset: u32, width: u32) -> SigSpec {
        let bits = self.bits();
        assert!(
            (offset + width) as usize <= bits.len(),
            "extract [{offset}, {}) out of bounds for width {}",
            offset + width,
            bits.len()
        );
        Self::from_bits(
            bits[offset as usize..(offset + width) as usize]
                .iter()
                .copied(),
        )
    }

    /// Returns `true` if every chunk is a constant.
    pub fn is_fully_const(&self) -> bool {
        self.chunks
            .iter()
            .all(|c| matches!(c, SigChunk::Const(_)))
    }

    /// Returns `true` if every bit is a constant `X` or `Z`. The empty
    /// signal counts as fully undefined.
    pub fn is_fully_undef(&self) -> bool {
        self.chunks.iter().all(|c| match c {
            SigChunk::Const(v) => v.is_fully_undef(),
            SigChunk::Wire { .. } => false,
        })
    }

    /// The constant payload if the signal is fully constant.
    pub fn as_const(&self) -> Option<LogicVec> {
        let mut value = LogicVec::zeros(0);
        for chunk in &self.chunks {
            match chunk {
                SigChunk::Const(v) => value = value.concat(v),
                SigChunk::Wire { .. } => return None,
            }
        }
        Some(value)
    }

    /// Reads a fully constant signal as a boolean (any bit `One`).
    ///
    /// # Panics
    ///
    /// Panics if the signal is not fully constant.
    pub fn as_bool(&self) -> bool {
        self.as_const()
            .unwrap_or_else(|| panic!("as_bool on non-constant signal"))
            .any_one()
    }

    /// Resizes to `width` bits: truncates from the top, or pads with the
    /// current most significant bit when `signed` (replicating a wire bit
    /// if that is what sits on top) and with constant `0` otherwise.
    pub fn extend_u0(&mut self, width: u32, signed: bool) {
        let cur = self.width();
        if width < cur {
            *self = self.extract(0, width);
            return;
        }
        if width == cur {
            return;
        }
        let pad = if signed && cur > 0 {
            *self.bits().last().expect("non-empty signal has a top bit")
        } else {
            SigBit::Const(Logic::Zero)
        };
        for _ in cur..width {
            self.push_bit(pad);
        }
    }

    /// Matches the bit sequence against a literal pattern.
    ///
    /// The pattern is written most significant bit first over the alphabet
    /// `{0, 1, x, -}`: `0`/`1` match the corresponding driven constants,
    /// `x` matches the undefined constants (`X` or `Z`), and `-` matches
    /// anything, wire bits included.
    ///
    /// # Panics
    ///
    /// Panics if the pattern length differs from the signal width, or on
    /// characters outside the alphabet.
    pub fn matches(&self, pattern: &str) -> bool {
        let bits = self.bits();
        assert_eq!(
            pattern.chars().count(),
            bits.len(),
            "pattern {pattern:?} does not cover a {}-bit signal",
            bits.len()
        );
        for (bit, c) in bits.iter().zip(pattern.chars().rev()) {
            let ok = match c {
                '-' => true,
                '0' => *bit == SigBit::Const(Logic::Zero),
                '1' => *bit == SigBit::Const(Logic::One),
                'x' => bit.is_undef(),
                _ => panic!("invalid pattern character {c:?}"),
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Renders the bit sequence most significant first, printing wire bits
    /// as `?`. Used in rewrite-trace messages.
    pub fn bit_string(&self) -> String {
        self.bits()
            .iter()
            .rev()
            .map(|bit| match bit {
                SigBit::Const(v) => v.to_char(),
                SigBit::Wire { .. } => '?',
            })
            .collect()
    }

    /// Renders the signal for diagnostics, resolving wire names through
    /// the module and interner.
    pub fn display(&self, module: &Module, interner: &Interner) -> String {
        let render_chunk = |chunk: &SigChunk| match chunk {
            SigChunk::Const(v) => format!("{}'{}", v.width(), v),
            SigChunk::Wire {
                wire,
                offset,
                width,
            } => {
                let w = module.wires.get(*wire);
                let name = interner.resolve(w.name);
                if *offset == 0 && *width == w.width {
                    name.to_string()
                } else if *width == 1 {
                    format!("{name} [{offset}]")
                } else {
                    format!("{name} [{}:{offset}]", offset + width - 1)
                }
            }
        };
        match self.chunks.as_slice() {
            [] => "{ }".to_string(),
            [chunk] => render_chunk(chunk),
            chunks => {
                let parts: Vec<String> = chunks.iter().rev().map(render_chunk).collect();
                format!("{{ {} }}", parts.join(", "))
            }
        }
    }
}

impl From<Const> for SigSpec {
    fn from(value: Const) -> Self {
        Self::constant(value.bits)
    }
}

impl PartialEq for SigSpec {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width() && self.bits() == other.bits()
    }
}

impl Eq for SigSpec {}

impl Hash for SigSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for bit in self.bits() {
            bit.hash(state);
        }
    }
}
