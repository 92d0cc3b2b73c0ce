//! Undriven-net replacement: ties bits nobody drives to the undefined
//! constant.
//!
//! A bit counts as driven when a cell output or a module input port
//! reaches it (through the alias map). Undriven bits of user-visible
//! wires are tied to `x` outright; undriven bits of generated (`$`)
//! wires are tied only where something actually reads them, so dead
//! internal wires never acquire spurious drivers. Unknown cell types are
//! handled conservatively: every port counts as both driving and
//! reading.

use crate::celltypes::CellDirectory;
use crate::sigmap::SigMap;
use std::collections::HashSet;
use vela_common::Interner;
use vela_ir::{is_generated_name, Module, SigBit, SigSpec, WireId};

/// Appends `chunk := x` assignments for every undriven chunk of the
/// module. Returns `true` if any tie-off was added.
pub fn replace_undriven(module: &mut Module, interner: &Interner) -> bool {
    let directory = CellDirectory::new();
    let sigmap = SigMap::new(module, interner);

    let mut driven: HashSet<(WireId, u32)> = HashSet::new();
    let mut used: HashSet<(WireId, u32)> = HashSet::new();

    let mut collect = |set: &mut HashSet<(WireId, u32)>, sig: &SigSpec| {
        for bit in sigmap.apply(sig).bits() {
            if let SigBit::Wire { wire, bit } = bit {
                set.insert((wire, bit));
            }
        }
    };

    for (_, cell) in module.cells.iter() {
        let known = directory.is_known(&cell.ty);
        for (port, sig) in &cell.connections {
            if !known || directory.is_output(&cell.ty, port) {
                collect(&mut driven, sig);
            }
            if !known || directory.is_input(&cell.ty, port) {
                collect(&mut used, sig);
            }
        }
    }
    for (id, wire) in module.wires.iter() {
        let sig = SigSpec::wire(id, wire.width);
        if wire.is_port_input() {
            collect(&mut driven, &sig);
        }
        if wire.is_port_output() {
            collect(&mut used, &sig);
        }
    }

    // Walk every wire bit that is its own canonical representative; those
    // bits enumerate the whole canonical bit space exactly once.
    let mut ties: Vec<SigSpec> = Vec::new();
    for (id, wire) in module.wires.iter() {
        let generated = is_generated_name(interner.resolve(wire.name));
        let mut run: Vec<u32> = Vec::new();
        for bit in 0..=wire.width {
            let undriven = bit < wire.width
                && sigmap.bit(SigBit::Wire { wire: id, bit })
                    == SigBit::Wire { wire: id, bit }
                && !driven.contains(&(id, bit));
            if undriven {
                run.push(bit);
                continue;
            }
            if !run.is_empty() {
                push_chunks(&mut ties, id, &run, generated, &used);
                run.clear();
            }
        }
    }

    let changed = !ties.is_empty();
    for chunk in ties {
        log::info!(
            "Setting undriven signal in {} to undef: {}",
            interner.resolve(module.name),
            chunk.display(module, interner),
        );
        let width = chunk.width();
        module.connect(chunk, SigSpec::undef(width));
    }
    changed
}

/// Emits tie-off chunks for one maximal run of undriven bits. Generated
/// wires are narrowed to the bits something reads.
fn push_chunks(
    ties: &mut Vec<SigSpec>,
    wire: WireId,
    run: &[u32],
    generated: bool,
    used: &HashSet<(WireId, u32)>,
) {
    let mut start: Option<u32> = None;
    let mut previous = 0;
    for &bit in run {
        let keep = !generated || used.contains(&(wire, bit));
        match start {
            Some(s) if !keep => {
                ties.push(SigSpec::wire_slice(wire, s, previous - s + 1));
                start = None;
            }
            None if keep => start = Some(bit),
            _ => {}
        }
        previous = bit;
    }
    if let Some(s) = start {
        ties.push(SigSpec::wire_slice(wire, s, previous - s + 1));
    }
}
