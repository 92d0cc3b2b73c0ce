//! Static directory of cell-type knowledge.
//!
//! Answers, for every [`CellType`], whether the optimizer understands the
//! type and which of its ports carry data in and out. Unknown cell types
//! report `false` from every query; callers that need a conservative
//! reading (the undriven-net analysis) treat unknown cells as having all
//! ports bidirectional.

use vela_ir::{CellType, PortName};

/// Classification of a cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    /// A combinational operator the optimizer fully understands.
    Combinational,
    /// Anything else; skipped by the rewrite engine.
    Unknown,
}

/// Static registry of per-type port directions.
#[derive(Debug, Default)]
pub struct CellDirectory;

impl CellDirectory {
    /// Creates the directory.
    pub fn new() -> Self {
        Self
    }

    /// Classifies a cell type.
    pub fn class(&self, ty: &CellType) -> CellClass {
        match ty {
            CellType::Unknown(_) => CellClass::Unknown,
            _ => CellClass::Combinational,
        }
    }

    /// Returns `true` if the optimizer understands this cell type.
    pub fn is_known(&self, ty: &CellType) -> bool {
        self.class(ty) == CellClass::Combinational
    }

    /// Returns `true` if `port` is a data input of a known cell type.
    pub fn is_input(&self, ty: &CellType, port: &PortName) -> bool {
        if !self.is_known(ty) {
            return false;
        }
        match port {
            PortName::A => has_a(ty),
            PortName::B => has_b(ty),
            PortName::S => has_s(ty),
            PortName::Y | PortName::Other(_) => false,
        }
    }

    /// Returns `true` if `port` is the output of a known cell type.
    pub fn is_output(&self, ty: &CellType, port: &PortName) -> bool {
        self.is_known(ty) && *port == PortName::Y
    }
}

fn has_a(ty: &CellType) -> bool {
    !matches!(ty, CellType::Unknown(_))
}

fn has_b(ty: &CellType) -> bool {
    use CellType::*;
    matches!(
        ty,
        GateAnd
            | GateOr
            | GateXor
            | GateMux
            | And
            | Or
            | Xor
            | Xnor
            | LogicAnd
            | LogicOr
            | Shl
            | Shr
            | Sshl
            | Sshr
            | Lt
            | Le
            | Eq
            | Ne
            | Eqx
            | Nex
            | Gt
            | Ge
            | Add
            | Sub
            | Mul
            | Div
            | Mod
            | Pow
            | Mux
            | Pmux
    )
}

fn has_s(ty: &CellType) -> bool {
    matches!(ty, CellType::GateMux | CellType::Mux | CellType::Pmux)
}
