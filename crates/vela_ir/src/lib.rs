//! VelaIR — the netlist representation of the Vela RTL toolchain.
//!
//! This crate defines the in-memory data model consumed by the synthesis
//! and optimization passes: [`Design`], [`Module`], [`Wire`], [`Cell`],
//! and the chunk-based [`SigSpec`] signal machinery.

#![warn(missing_docs)]

pub mod arena;
pub mod cell;
pub mod constant;
pub mod design;
pub mod ids;
pub mod module;
pub mod sigspec;
pub mod wire;

pub use arena::{Arena, ArenaId};
pub use cell::{Cell, CellType, ParamName, PortName};
pub use constant::Const;
pub use design::{Design, Selection};
pub use ids::{CellId, ModuleId, WireId};
pub use module::{Connection, Module};
pub use sigspec::{SigBit, SigChunk, SigSpec};
pub use wire::{is_generated_name, Wire, WireRole};
