//! The JSON netlist interchange document.
//!
//! Serialized netlists store names as plain strings (identifiers are an
//! in-memory representation only) and signals as explicit chunk lists,
//! least significant chunk first. Constant chunks carry their bits as a
//! binary string, most significant bit first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vela_common::{Ident, Interner, LogicVec};
use vela_ir::{
    CellType, Const, Design, Module, ParamName, PortName, SigChunk, SigSpec, WireId, WireRole,
};

/// Errors produced while converting a document into an in-memory design.
#[derive(Debug, thiserror::Error)]
pub enum NetlistDocError {
    /// A signal chunk names a wire the module does not declare.
    #[error("module '{module}' has no wire named '{wire}'")]
    UnknownWire {
        /// The module being converted.
        module: String,
        /// The missing wire name.
        wire: String,
    },
    /// A constant chunk contains characters outside `0`/`1`/`x`/`z`.
    #[error("invalid constant '{0}'")]
    BadConstant(String),
    /// A slice extends past the end of its wire.
    #[error("slice [{offset} +: {width}] out of range for wire '{wire}'")]
    SliceOutOfRange {
        /// The sliced wire name.
        wire: String,
        /// The first bit of the slice.
        offset: u32,
        /// The slice width.
        width: u32,
    },
    /// A parameter value is negative.
    #[error("parameter '{name}' has negative value {value}")]
    NegativeParameter {
        /// The parameter name.
        name: String,
        /// The offending value.
        value: i64,
    },
    /// A direct assignment connects signals of different widths.
    #[error("assignment width mismatch in module '{module}': {lhs} vs {rhs} bits")]
    WidthMismatch {
        /// The module being converted.
        module: String,
        /// Left-hand width.
        lhs: u32,
        /// Right-hand width.
        rhs: u32,
    },
}

/// A whole design document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignDoc {
    /// Modules by name.
    pub modules: BTreeMap<String, ModuleDoc>,
}

/// One module of a design document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDoc {
    /// Wire declarations.
    #[serde(default)]
    pub wires: Vec<WireDoc>,
    /// Cell instances.
    #[serde(default)]
    pub cells: Vec<CellDoc>,
    /// Direct assignments.
    #[serde(default)]
    pub connections: Vec<ConnectionDoc>,
}

/// A wire declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireDoc {
    /// The wire name, including its `\` or `$` sigil.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Port role; plain internal wire when omitted.
    #[serde(default)]
    pub role: RoleDoc,
}

/// Port role of a wire in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleDoc {
    /// Module-internal wire.
    #[default]
    Internal,
    /// Input port.
    Input,
    /// Output port.
    Output,
    /// Bidirectional port.
    Inout,
}

/// A cell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellDoc {
    /// The cell instance name.
    pub name: String,
    /// The cell type name (e.g. `$and`, `$_MUX_`).
    #[serde(rename = "type")]
    pub ty: String,
    /// Integer parameter values by name (e.g. `A_WIDTH`).
    #[serde(default)]
    pub parameters: BTreeMap<String, i64>,
    /// Port connections by name.
    #[serde(default)]
    pub connections: BTreeMap<String, SigDoc>,
}

/// A direct assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDoc {
    /// The driven signal.
    pub lhs: SigDoc,
    /// The driving signal.
    pub rhs: SigDoc,
}

/// A signal: chunks listed least significant first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigDoc(pub Vec<ChunkDoc>);

/// One chunk of a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkDoc {
    /// A constant, most significant bit first (e.g. `"10xz"`).
    Const {
        /// The bits.
        value: String,
    },
    /// A bit range of a wire.
    Slice {
        /// The wire name.
        wire: String,
        /// First bit of the range.
        offset: u32,
        /// Number of bits.
        width: u32,
    },
    /// A whole wire.
    Wire {
        /// The wire name.
        wire: String,
    },
}

impl DesignDoc {
    /// Builds the in-memory design, interning every name.
    pub fn to_design(&self, interner: &Interner) -> Result<Design, NetlistDocError> {
        let mut design = Design::new();
        for (module_name, module_doc) in &self.modules {
            let id = design.add_module(interner.intern(module_name));
            let module = design.modules.get_mut(id);
            let mut wires: BTreeMap<Ident, WireId> = BTreeMap::new();
            for wire in &module_doc.wires {
                let role = match wire.role {
                    RoleDoc::Internal => WireRole::Internal,
                    RoleDoc::Input => WireRole::Input,
                    RoleDoc::Output => WireRole::Output,
                    RoleDoc::Inout => WireRole::Inout,
                };
                let name = interner.intern(&wire.name);
                let wid = module.add_wire(name, wire.width, role);
                wires.insert(name, wid);
            }
            for cell in &module_doc.cells {
                let ty = CellType::from_name(&cell.ty, interner);
                let mut parameters = BTreeMap::new();
                for (name, value) in &cell.parameters {
                    if *value < 0 {
                        return Err(NetlistDocError::NegativeParameter {
                            name: name.clone(),
                            value: *value,
                        });
                    }
                    parameters.insert(param_from_name(name, interner), Const::from_int(*value));
                }
                let mut connections = BTreeMap::new();
                for (port, sig) in &cell.connections {
                    connections.insert(
                        port_from_name(port, interner),
                        sig_from_doc(module, module_name, interner, &wires, sig)?,
                    );
                }
                module.add_cell(interner.intern(&cell.name), ty, connections, parameters);
            }
            for conn in &module_doc.connections {
                let lhs = sig_from_doc(module, module_name, interner, &wires, &conn.lhs)?;
                let rhs = sig_from_doc(module, module_name, interner, &wires, &conn.rhs)?;
                if lhs.width() != rhs.width() {
                    return Err(NetlistDocError::WidthMismatch {
                        module: module_name.clone(),
                        lhs: lhs.width(),
                        rhs: rhs.width(),
                    });
                }
                module.connect(lhs, rhs);
            }
        }
        Ok(design)
    }

    /// Renders an in-memory design back into a document.
    pub fn from_design(design: &Design, interner: &Interner) -> Self {
        let mut modules = BTreeMap::new();
        for (_, module) in design.modules.iter() {
            let wires = module
                .wires
                .values()
                .map(|wire| WireDoc {
                    name: interner.resolve(wire.name).to_string(),
                    width: wire.width,
                    role: match wire.role {
                        WireRole::Internal => RoleDoc::Internal,
                        WireRole::Input => RoleDoc::Input,
                        WireRole::Output => RoleDoc::Output,
                        WireRole::Inout => RoleDoc::Inout,
                    },
                })
                .collect();
            let cells = module
                .cells
                .values()
                .map(|cell| CellDoc {
                    name: interner.resolve(cell.name).to_string(),
                    ty: cell.ty.display(interner).to_string(),
                    parameters: cell
                        .parameters
                        .iter()
                        .map(|(p, v)| (param_to_name(p, interner), v.as_int()))
                        .collect(),
                    connections: cell
                        .connections
                        .iter()
                        .map(|(p, sig)| {
                            (port_to_name(p, interner), sig_to_doc(module, interner, sig))
                        })
                        .collect(),
                })
                .collect();
            let connections = module
                .connections
                .iter()
                .map(|conn| ConnectionDoc {
                    lhs: sig_to_doc(module, interner, &conn.lhs),
                    rhs: sig_to_doc(module, interner, &conn.rhs),
                })
                .collect();
            modules.insert(
                interner.resolve(module.name).to_string(),
                ModuleDoc {
                    wires,
                    cells,
                    connections,
                },
            );
        }
        Self { modules }
    }
}

fn port_from_name(name: &str, interner: &Interner) -> PortName {
    match name {
        "A" => PortName::A,
        "B" => PortName::B,
        "S" => PortName::S,
        "Y" => PortName::Y,
        other => PortName::Other(interner.intern(other)),
    }
}

fn port_to_name(port: &PortName, interner: &Interner) -> String {
    match port {
        PortName::A => "A".to_string(),
        PortName::B => "B".to_string(),
        PortName::S => "S".to_string(),
        PortName::Y => "Y".to_string(),
        PortName::Other(name) => interner.resolve(*name).to_string(),
    }
}

fn param_from_name(name: &str, interner: &Interner) -> ParamName {
    match name {
        "A_WIDTH" => ParamName::AWidth,
        "B_WIDTH" => ParamName::BWidth,
        "Y_WIDTH" => ParamName::YWidth,
        "S_WIDTH" => ParamName::SWidth,
        "A_SIGNED" => ParamName::ASigned,
        "B_SIGNED" => ParamName::BSigned,
        "WIDTH" => ParamName::Width,
        other => ParamName::Other(interner.intern(other)),
    }
}

fn param_to_name(param: &ParamName, interner: &Interner) -> String {
    match param {
        ParamName::AWidth => "A_WIDTH".to_string(),
        ParamName::BWidth => "B_WIDTH".to_string(),
        ParamName::YWidth => "Y_WIDTH".to_string(),
        ParamName::SWidth => "S_WIDTH".to_string(),
        ParamName::ASigned => "A_SIGNED".to_string(),
        ParamName::BSigned => "B_SIGNED".to_string(),
        ParamName::Width => "WIDTH".to_string(),
        ParamName::Other(name) => interner.resolve(*name).to_string(),
    }
}

fn sig_from_doc(
    module: &Module,
    module_name: &str,
    interner: &Interner,
    wires: &BTreeMap<Ident, WireId>,
    doc: &SigDoc,
) -> Result<SigSpec, NetlistDocError> {
    let mut sig = SigSpec::empty();
    for chunk in &doc.0 {
        match chunk {
            ChunkDoc::Const { value } => {
                let bits = LogicVec::from_binary_str(value)
                    .ok_or_else(|| NetlistDocError::BadConstant(value.clone()))?;
                sig.append(&SigSpec::constant(bits));
            }
            ChunkDoc::Wire { wire } => {
                let wid = lookup_wire(module_name, interner, wires, wire)?;
                sig.append(&SigSpec::wire(wid, module.wire_width(wid)));
            }
            ChunkDoc::Slice {
                wire,
                offset,
                width,
            } => {
                let wid = lookup_wire(module_name, interner, wires, wire)?;
                if offset + width > module.wire_width(wid) {
                    return Err(NetlistDocError::SliceOutOfRange {
                        wire: wire.clone(),
                        offset: *offset,
                        width: *width,
                    });
                }
                sig.append(&SigSpec::wire_slice(wid, *offset, *width));
            }
        }
    }
    Ok(sig)
}

fn lookup_wire(
    module_name: &str,
    interner: &Interner,
    wires: &BTreeMap<Ident, WireId>,
    name: &str,
) -> Result<WireId, NetlistDocError> {
    // A name that was never interned cannot belong to any module; one
    // that was may still name a wire of a different module.
    interner
        .get(name)
        .and_then(|ident| wires.get(&ident).copied())
        .ok_or_else(|| NetlistDocError::UnknownWire {
            module: module_name.to_string(),
            wire: name.to_string(),
        })
}

fn sig_to_doc(module: &Module, interner: &Interner, sig: &SigSpec) -> SigDoc {
    let chunks = sig
        .chunks()
        .iter()
        .map(|chunk| match chunk {
            SigChunk::Const(value) => ChunkDoc::Const {
                value: value.to_string(),
            },
            SigChunk::Wire {
                wire,
                offset,
                width,
            } => {
                let name = interner.resolve(module.wires.get(*wire).name).to_string();
                if *offset == 0 && *width == module.wire_width(*wire) {
                    ChunkDoc::Wire { wire: name }
                } else {
                    ChunkDoc::Slice {
                        wire: name,
                        offset: *offset,
                        width: *width,
                    }
                }
            }
        })
        .collect();
    SigDoc(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_ir::Selection;
    use vela_opt::{OptConfig, OptConstPass, Pass};

    fn sample_doc() -> DesignDoc {
        serde_json::from_str(
            r#"{
                "modules": {
                    "\\top": {
                        "wires": [
                            {"name": "\\x", "width": 1, "role": "input"},
                            {"name": "\\y", "width": 1, "role": "output"},
                            {"name": "$t0", "width": 2}
                        ],
                        "cells": [
                            {
                                "name": "$and0",
                                "type": "$_AND_",
                                "connections": {
                                    "A": [{"value": "0"}],
                                    "B": [{"wire": "\\x"}],
                                    "Y": [{"wire": "\\y"}]
                                }
                            }
                        ],
                        "connections": [
                            {
                                "lhs": [{"wire": "$t0"}],
                                "rhs": [{"wire": "\\x"}, {"value": "1"}]
                            }
                        ]
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn document_parses_and_converts() {
        let interner = Interner::new();
        let doc = sample_doc();
        let design = doc.to_design(&interner).unwrap();
        assert_eq!(design.modules.len(), 1);
        let module = design.modules.values().next().unwrap();
        assert_eq!(module.wires.len(), 3);
        assert_eq!(module.cells.len(), 1);
        assert_eq!(module.connections.len(), 1);
        assert_eq!(module.connections[0].lhs.width(), 2);
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let interner = Interner::new();
        let doc = sample_doc();
        let design = doc.to_design(&interner).unwrap();
        let back = DesignDoc::from_design(&design, &interner);
        let again = back.to_design(&interner).unwrap();
        let a = serde_json::to_string(&back).unwrap();
        let b = serde_json::to_string(&DesignDoc::from_design(&again, &interner)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_wire_is_an_error() {
        let interner = Interner::new();
        let mut doc = sample_doc();
        let module = doc.modules.get_mut("\\top").unwrap();
        module.cells[0]
            .connections
            .insert("A".to_string(), SigDoc(vec![ChunkDoc::Wire {
                wire: "\\missing".to_string(),
            }]));
        let err = doc.to_design(&interner).unwrap_err();
        assert!(matches!(err, NetlistDocError::UnknownWire { .. }));
    }

    #[test]
    fn bad_constant_is_an_error() {
        let interner = Interner::new();
        let mut doc = sample_doc();
        let module = doc.modules.get_mut("\\top").unwrap();
        module.cells[0]
            .connections
            .insert("A".to_string(), SigDoc(vec![ChunkDoc::Const {
                value: "01q".to_string(),
            }]));
        let err = doc.to_design(&interner).unwrap_err();
        assert!(matches!(err, NetlistDocError::BadConstant(_)));
    }

    #[test]
    fn out_of_range_slice_is_an_error() {
        let interner = Interner::new();
        let mut doc = sample_doc();
        let module = doc.modules.get_mut("\\top").unwrap();
        module.connections[0].lhs = SigDoc(vec![ChunkDoc::Slice {
            wire: "$t0".to_string(),
            offset: 1,
            width: 2,
        }]);
        let err = doc.to_design(&interner).unwrap_err();
        assert!(matches!(err, NetlistDocError::SliceOutOfRange { .. }));
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let interner = Interner::new();
        let mut doc = sample_doc();
        let module = doc.modules.get_mut("\\top").unwrap();
        module.connections[0].rhs = SigDoc(vec![ChunkDoc::Const {
            value: "101".to_string(),
        }]);
        let err = doc.to_design(&interner).unwrap_err();
        assert!(matches!(err, NetlistDocError::WidthMismatch { .. }));
    }

    #[test]
    fn negative_parameter_is_an_error() {
        let interner = Interner::new();
        let mut doc = sample_doc();
        let module = doc.modules.get_mut("\\top").unwrap();
        module.cells[0]
            .parameters
            .insert("A_WIDTH".to_string(), -4);
        let err = doc.to_design(&interner).unwrap_err();
        assert!(matches!(err, NetlistDocError::NegativeParameter { .. }));
    }

    #[test]
    fn unknown_cell_types_survive_the_roundtrip() {
        let interner = Interner::new();
        let mut doc = sample_doc();
        let module = doc.modules.get_mut("\\top").unwrap();
        module.cells[0].ty = "$custom_blob".to_string();
        let design = doc.to_design(&interner).unwrap();
        let back = DesignDoc::from_design(&design, &interner);
        assert_eq!(back.modules["\\top"].cells[0].ty, "$custom_blob");
    }

    #[test]
    fn document_runs_through_the_pass() {
        let interner = Interner::new();
        let doc = sample_doc();
        let mut design = doc.to_design(&interner).unwrap();
        let pass = OptConstPass::new(OptConfig {
            mux_undef: true,
            mux_bool: true,
            undriven: true,
        });
        assert!(pass.run(&mut design, &Selection::full(), &interner));
        let back = DesignDoc::from_design(&design, &interner);
        // and(0, \x) folded away; \y is now driven by a constant.
        let module = &back.modules["\\top"];
        assert!(module.cells.is_empty());
        assert!(module.connections.iter().any(|conn| {
            matches!(conn.lhs.0.as_slice(), [ChunkDoc::Wire { wire }] if wire == "\\y")
                && matches!(conn.rhs.0.as_slice(), [ChunkDoc::Const { value }] if value == "0")
        }));
    }
}
