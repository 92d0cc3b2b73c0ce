//! Wire definitions — named bit-vector signals within a module.

use crate::ids::WireId;
use serde::{Deserialize, Serialize};
use vela_common::Ident;

/// The port role of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireRole {
    /// A module-internal wire.
    Internal,
    /// An input port of the module.
    Input,
    /// An output port of the module.
    Output,
    /// A bidirectional port of the module.
    Inout,
}

/// A named bit-vector signal of fixed width.
///
/// Names follow the usual sigil convention: a leading `$` marks a
/// compiler-generated wire, a leading `\` a wire the user declared. The
/// optimizer treats the distinction semantically — user-visible wires win
/// alias-map ties, and generated wires never acquire spurious drivers
/// during undriven-net replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    /// The unique ID of this wire within its module.
    pub id: WireId,
    /// The interned wire name, including its sigil.
    pub name: Ident,
    /// The width in bits, at least 1.
    pub width: u32,
    /// The port role.
    pub role: WireRole,
}

impl Wire {
    /// Returns `true` for input and inout ports — wires whose value is
    /// driven from outside the module.
    pub fn is_port_input(&self) -> bool {
        matches!(self.role, WireRole::Input | WireRole::Inout)
    }

    /// Returns `true` for output and inout ports — wires observed from
    /// outside the module.
    pub fn is_port_output(&self) -> bool {
        matches!(self.role, WireRole::Output | WireRole::Inout)
    }
}

/// Returns `true` if a wire name denotes a compiler-generated wire.
pub fn is_generated_name(name: &str) -> bool {
    name.starts_with('$')
}
