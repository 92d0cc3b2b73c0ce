//! Module definitions — one hardware module of a design.

use crate::arena::Arena;
use crate::cell::{Cell, CellType, ParamName, PortName};
use crate::constant::Const;
use crate::ids::{CellId, ModuleId, WireId};
use crate::sigspec::SigSpec;
use crate::wire::{Wire, WireRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vela_common::Ident;

/// A direct assignment tying two equal-width signals together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// The driven side.
    pub lhs: SigSpec,
    /// The driving side.
    pub rhs: SigSpec,
}

/// A single hardware module: wires, cells, and direct assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The unique ID of this module in the design.
    pub id: ModuleId,
    /// The interned module name.
    pub name: Ident,
    /// All wires of the module.
    pub wires: Arena<WireId, Wire>,
    /// All cells of the module.
    pub cells: Arena<CellId, Cell>,
    /// Direct assignments, in insertion order.
    pub connections: Vec<Connection>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(id: ModuleId, name: Ident) -> Self {
        Self {
            id,
            name,
            wires: Arena::new(),
            cells: Arena::new(),
            connections: Vec::new(),
        }
    }

    /// Adds a wire and returns its ID.
    pub fn add_wire(&mut self, name: Ident, width: u32, role: WireRole) -> WireId {
        assert!(width >= 1, "wire width must be at least 1");
        self.wires.alloc_with(|id| Wire {
            id,
            name,
            width,
            role,
        })
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(
        &mut self,
        name: Ident,
        ty: CellType,
        connections: BTreeMap<PortName, SigSpec>,
        parameters: BTreeMap<ParamName, Const>,
    ) -> CellId {
        self.cells.alloc_with(|id| Cell {
            id,
            name,
            ty,
            connections,
            parameters,
        })
    }

    /// Removes a cell, dropping its storage and registry entry in one step.
    ///
    /// # Panics
    ///
    /// Panics if the cell was already removed.
    pub fn remove_cell(&mut self, id: CellId) -> Cell {
        self.cells.remove(id)
    }

    /// Appends the direct assignment `lhs := rhs`.
    ///
    /// # Panics
    ///
    /// Panics if the two sides differ in width.
    pub fn connect(&mut self, lhs: SigSpec, rhs: SigSpec) {
        assert_eq!(
            lhs.width(),
            rhs.width(),
            "direct assignment width mismatch in module {}",
            self.id.as_raw()
        );
        self.connections.push(Connection { lhs, rhs });
    }

    /// The width of a wire.
    pub fn wire_width(&self, id: WireId) -> u32 {
        self.wires.get(id).width
    }

    /// The whole of a wire as a signal.
    pub fn wire_sig(&self, id: WireId) -> SigSpec {
        SigSpec::wire(id, self.wire_width(id))
    }
}
