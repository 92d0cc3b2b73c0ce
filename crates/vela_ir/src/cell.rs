//! Cell definitions — parameterized operator nodes in the netlist.
//!
//! Cell types form a closed vocabulary of word-level operators plus a
//! handful of single-bit gate primitives; anything else is carried as
//! [`CellType::Unknown`] and left untouched by the optimizer.

use crate::constant::Const;
use crate::ids::CellId;
use crate::sigspec::SigSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vela_common::{Ident, Interner};

/// The type tag of a cell.
///
/// `Gate*` variants are the single-bit gate primitives (`$_INV_`,
/// `$_AND_`, ...) with no width parameters; the remaining named variants
/// are the parameterized word-level operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// `$_INV_` — single-bit inverter.
    GateInv,
    /// `$_AND_` — single-bit AND.
    GateAnd,
    /// `$_OR_` — single-bit OR.
    GateOr,
    /// `$_XOR_` — single-bit XOR.
    GateXor,
    /// `$_MUX_` — single-bit 2:1 mux.
    GateMux,

    /// `$not` — bitwise complement.
    Not,
    /// `$pos` — identity / sign-aware resize.
    Pos,
    /// `$neg` — arithmetic negation.
    Neg,
    /// `$bu0` — zero-extension marker.
    Bu0,
    /// `$logic_not` — boolean complement.
    LogicNot,
    /// `$reduce_and` — AND reduction.
    ReduceAnd,
    /// `$reduce_or` — OR reduction.
    ReduceOr,
    /// `$reduce_xor` — XOR reduction.
    ReduceXor,
    /// `$reduce_xnor` — XNOR reduction.
    ReduceXnor,
    /// `$reduce_bool` — boolean reduction.
    ReduceBool,

    /// `$and` — bitwise AND.
    And,
    /// `$or` — bitwise OR.
    Or,
    /// `$xor` — bitwise XOR.
    Xor,
    /// `$xnor` — bitwise XNOR.
    Xnor,
    /// `$logic_and` — boolean AND.
    LogicAnd,
    /// `$logic_or` — boolean OR.
    LogicOr,

    /// `$shl` — logical shift left.
    Shl,
    /// `$shr` — logical shift right.
    Shr,
    /// `$sshl` — arithmetic shift left.
    Sshl,
    /// `$sshr` — arithmetic shift right.
    Sshr,

    /// `$lt` — less-than.
    Lt,
    /// `$le` — less-or-equal.
    Le,
    /// `$eq` — equality.
    Eq,
    /// `$ne` — inequality.
    Ne,
    /// `$eqx` — exact (x-aware) equality.
    Eqx,
    /// `$nex` — exact (x-aware) inequality.
    Nex,
    /// `$gt` — greater-than.
    Gt,
    /// `$ge` — greater-or-equal.
    Ge,

    /// `$add` — addition.
    Add,
    /// `$sub` — subtraction.
    Sub,
    /// `$mul` — multiplication.
    Mul,
    /// `$div` — division.
    Div,
    /// `$mod` — modulo.
    Mod,
    /// `$pow` — exponentiation.
    Pow,

    /// `$mux` — word-level 2:1 mux.
    Mux,
    /// `$pmux` — priority mux with an S vector.
    Pmux,

    /// Any other cell type, carried opaquely by name.
    Unknown(Ident),
}

impl CellType {
    /// The type name for every known variant, `None` for [`Unknown`](Self::Unknown).
    pub fn known_name(&self) -> Option<&'static str> {
        use CellType::*;
        Some(match self {
            GateInv => "$_INV_",
            GateAnd => "$_AND_",
            GateOr => "$_OR_",
            GateXor => "$_XOR_",
            GateMux => "$_MUX_",
            Not => "$not",
            Pos => "$pos",
            Neg => "$neg",
            Bu0 => "$bu0",
            LogicNot => "$logic_not",
            ReduceAnd => "$reduce_and",
            ReduceOr => "$reduce_or",
            ReduceXor => "$reduce_xor",
            ReduceXnor => "$reduce_xnor",
            ReduceBool => "$reduce_bool",
            And => "$and",
            Or => "$or",
            Xor => "$xor",
            Xnor => "$xnor",
            LogicAnd => "$logic_and",
            LogicOr => "$logic_or",
            Shl => "$shl",
            Shr => "$shr",
            Sshl => "$sshl",
            Sshr => "$sshr",
            Lt => "$lt",
            Le => "$le",
            Eq => "$eq",
            Ne => "$ne",
            Eqx => "$eqx",
            Nex => "$nex",
            Gt => "$gt",
            Ge => "$ge",
            Add => "$add",
            Sub => "$sub",
            Mul => "$mul",
            Div => "$div",
            Mod => "$mod",
            Pow => "$pow",
            Mux => "$mux",
            Pmux => "$pmux",
            Unknown(_) => return None,
        })
    }

    /// Parses a type name, interning unrecognized names as
    /// [`Unknown`](Self::Unknown).
    pub fn from_name(name: &str, interner: &Interner) -> Self {
        use CellType::*;
        match name {
            "$_INV_" => GateInv,
            "$_AND_" => GateAnd,
            "$_OR_" => GateOr,
            "$_XOR_" => GateXor,
            "$_MUX_" => GateMux,
            "$not" => Not,
            "$pos" => Pos,
            "$neg" => Neg,
            "$bu0" => Bu0,
            "$logic_not" => LogicNot,
            "$reduce_and" => ReduceAnd,
            "$reduce_or" => ReduceOr,
            "$reduce_xor" => ReduceXor,
            "$reduce_xnor" => ReduceXnor,
            "$reduce_bool" => ReduceBool,
            "$and" => And,
            "$or" => Or,
            "$xor" => Xor,
            "$xnor" => Xnor,
            "$logic_and" => LogicAnd,
            "$logic_or" => LogicOr,
            "$shl" => Shl,
            "$shr" => Shr,
            "$sshl" => Sshl,
            "$sshr" => Sshr,
            "$lt" => Lt,
            "$le" => Le,
            "$eq" => Eq,
            "$ne" => Ne,
            "$eqx" => Eqx,
            "$nex" => Nex,
            "$gt" => Gt,
            "$ge" => Ge,
            "$add" => Add,
            "$sub" => Sub,
            "$mul" => Mul,
            "$div" => Div,
            "$mod" => Mod,
            "$pow" => Pow,
            "$mux" => Mux,
            "$pmux" => Pmux,
            other => Unknown(interner.intern(other)),
        }
    }

    /// The type name, resolving [`Unknown`](Self::Unknown) through the
    /// interner.
    pub fn display<'a>(&self, interner: &'a Interner) -> &'a str {
        match self {
            CellType::Unknown(name) => interner.resolve(*name),
            known => known.known_name().expect("known cell type has a name"),
        }
    }
}

/// A connection port of a cell.
///
/// The closed vocabulary uses only `A`, `B`, `S`, and `Y`; ports of
/// unknown cell types are carried by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PortName {
    /// First operand.
    A,
    /// Second operand.
    B,
    /// Select input.
    S,
    /// Output.
    Y,
    /// A port of an unknown cell type.
    Other(Ident),
}

/// A parameter of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamName {
    /// Width of operand A.
    AWidth,
    /// Width of operand B.
    BWidth,
    /// Width of the output.
    YWidth,
    /// Width of the select vector (`$pmux`).
    SWidth,
    /// Operand A is signed.
    ASigned,
    /// Operand B is signed.
    BSigned,
    /// Data width of the mux family.
    Width,
    /// A parameter of an unknown cell type.
    Other(Ident),
}

/// A cell: a parameterized netlist node with named port connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The unique ID of this cell within its module.
    pub id: CellId,
    /// The interned cell instance name.
    pub name: Ident,
    /// The cell type.
    pub ty: CellType,
    /// Port-to-signal connections.
    pub connections: BTreeMap<PortName, SigSpec>,
    /// Parameter values.
    pub parameters: BTreeMap<ParamName, Const>,
}

impl Cell {
    /// Returns the signal connected to `port`.
    ///
    /// # Panics
    ///
    /// Panics if the port is not connected; reading a missing schema port
    /// means the netlist is malformed.
    pub fn port(&self, port: PortName) -> &SigSpec {
        self.connections
            .get(&port)
            .unwrap_or_else(|| panic!("cell has no connection on port {port:?}"))
    }

    /// Returns the signal connected to `port`, or `None`.
    pub fn get_port(&self, port: PortName) -> Option<&SigSpec> {
        self.connections.get(&port)
    }

    /// Connects `port` to `sig`, replacing any previous connection.
    pub fn set_port(&mut self, port: PortName, sig: SigSpec) {
        self.connections.insert(port, sig);
    }

    /// Disconnects `port`, returning the previous signal if any.
    pub fn unset_port(&mut self, port: PortName) -> Option<SigSpec> {
        self.connections.remove(&port)
    }

    /// Reads an integer parameter.
    ///
    /// # Panics
    ///
    /// Panics if the parameter is missing or not a definite integer.
    pub fn param_int(&self, param: ParamName) -> i64 {
        self.parameters
            .get(&param)
            .unwrap_or_else(|| panic!("cell has no parameter {param:?}"))
            .as_int()
    }

    /// Reads a boolean parameter (any `One` bit counts as true).
    ///
    /// # Panics
    ///
    /// Panics if the parameter is missing.
    pub fn param_bool(&self, param: ParamName) -> bool {
        self.parameters
            .get(&param)
            .unwrap_or_else(|| panic!("cell has no parameter {param:?}"))
            .as_bool()
    }

    /// Sets an integer parameter.
    pub fn set_param_int(&mut self, param: ParamName, value: i64) {
        self.parameters.insert(param, Const::from_int(value));
    }

    /// Removes a parameter, returning its previous value if any.
    pub fn unset_param(&mut self, param: ParamName) -> Option<Const> {
        self.parameters.remove(&param)
    }
}
