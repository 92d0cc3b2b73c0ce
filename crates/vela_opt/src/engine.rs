//! The peephole rewrite engine.
//!
//! One *walk* visits every selected cell of a module once. Per cell, the
//! rewrite rules below are tried in a fixed order and at most one fires;
//! a firing rule replaces the cell with a direct assignment or mutates it
//! in place, and the walk moves on to the next cell. The caller re-walks
//! until quiescence (see [`opt_const`](crate::opt_const)).
//!
//! Rule order per cell:
//!
//! 1. double-inverter elimination
//! 2. mux select through an inverter
//! 3. literal pattern folding on the single-bit gates
//! 4. equality operand narrowing
//! 5. boolean equality collapse
//! 6. mux-to-buffer/inverter (`mux_bool`), with `consume_x` AND/OR forms
//! 7. mux undef-branch pruning (`mux_undef`)
//! 8. generic constant folding through the evaluators
//! 9. conservative `$mux` folding (constant select, identical branches)
//!
//! The alias map and the inverter map are rebuilt for every walk; both go
//! stale as soon as a rewrite fires, which is why no rule fires twice for
//! one cell within a walk.

use crate::fold;
use crate::sigmap::SigMap;
use std::collections::HashMap;
use vela_common::{Interner, Logic};
use vela_ir::{CellId, CellType, Module, ParamName, PortName, Selection, SigBit, SigSpec};

/// Mode flags for one engine walk.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineFlags {
    /// Treat `x` inputs as the absorbing element on AND/OR (unsound under
    /// strict four-valued semantics; gated by the fixed-point driver).
    pub consume_x: bool,
    /// Prune mux branches with undefined data or select bits.
    pub mux_undef: bool,
    /// Rewrite boolean-shaped muxes into buffers and inverters.
    pub mux_bool: bool,
}

/// Walks every selected cell of `module` once, returning `true` if any
/// rewrite fired.
pub fn run_walk(
    module: &mut Module,
    selection: &Selection,
    flags: EngineFlags,
    interner: &Interner,
) -> bool {
    let sigmap = SigMap::new(module, interner);
    let mut invert_map: HashMap<SigBit, SigSpec> = HashMap::new();
    let mut cells = Vec::with_capacity(module.cells.len());

    for (id, cell) in module.cells.iter() {
        if !selection.contains_cell(module.name, cell.name) {
            continue;
        }
        if matches!(
            cell.ty,
            CellType::GateInv | CellType::Not | CellType::LogicNot
        ) {
            if let (Some(a), Some(y)) = (cell.get_port(PortName::A), cell.get_port(PortName::Y)) {
                if a.width() == 1 && y.width() == 1 {
                    if let Some(key) = sigmap.apply(y).as_bit() {
                        invert_map.insert(key, sigmap.apply(a));
                    }
                }
            }
        }
        cells.push(id);
    }

    let mut walk = Walk {
        sigmap,
        invert_map,
        flags,
        interner,
        did_something: false,
    };
    for id in cells {
        walk.visit(module, id);
    }
    walk.did_something
}

/// What a matched gate pattern does with the output.
#[derive(Clone, Copy)]
enum GateAction {
    /// Drive Y with a constant bit.
    Const(Logic),
    /// Drive Y with the input bit at this index.
    Pass(u32),
}

/// Pattern table entry: pattern, requires `consume_x`, action.
type GateRule = (&'static str, bool, GateAction);

/// `$_AND_` patterns over the bits `[B, A]` (A is the high pattern char).
const AND_RULES: &[GateRule] = &[
    ("-0", false, GateAction::Const(Logic::Zero)),
    ("0-", false, GateAction::Const(Logic::Zero)),
    ("11", false, GateAction::Const(Logic::One)),
    ("xx", false, GateAction::Const(Logic::X)),
    ("1x", false, GateAction::Const(Logic::X)),
    ("x1", false, GateAction::Const(Logic::X)),
    ("-x", true, GateAction::Const(Logic::Zero)),
    ("x-", true, GateAction::Const(Logic::Zero)),
    ("-1", false, GateAction::Pass(1)),
    ("1-", false, GateAction::Pass(0)),
];

/// `$_OR_` patterns.
const OR_RULES: &[GateRule] = &[
    ("-1", false, GateAction::Const(Logic::One)),
    ("1-", false, GateAction::Const(Logic::One)),
    ("00", false, GateAction::Const(Logic::Zero)),
    ("xx", false, GateAction::Const(Logic::X)),
    ("0x", false, GateAction::Const(Logic::X)),
    ("x0", false, GateAction::Const(Logic::X)),
    ("-x", true, GateAction::Const(Logic::One)),
    ("x-", true, GateAction::Const(Logic::One)),
    ("-0", false, GateAction::Pass(1)),
    ("0-", false, GateAction::Pass(0)),
];

/// `$_XOR_` patterns.
const XOR_RULES: &[GateRule] = &[
    ("00", false, GateAction::Const(Logic::Zero)),
    ("01", false, GateAction::Const(Logic::One)),
    ("10", false, GateAction::Const(Logic::One)),
    ("11", false, GateAction::Const(Logic::Zero)),
    ("-x", false, GateAction::Const(Logic::X)),
    ("x-", false, GateAction::Const(Logic::X)),
    ("-0", false, GateAction::Pass(1)),
    ("0-", false, GateAction::Pass(0)),
];

/// `$_INV_` patterns over the single input bit.
const INV_RULES: &[GateRule] = &[
    ("1", false, GateAction::Const(Logic::Zero)),
    ("0", false, GateAction::Const(Logic::One)),
    ("x", false, GateAction::Const(Logic::X)),
];

struct Walk<'a> {
    sigmap: SigMap,
    invert_map: HashMap<SigBit, SigSpec>,
    flags: EngineFlags,
    interner: &'a Interner,
    did_something: bool,
}

impl Walk<'_> {
    fn visit(&mut self, module: &mut Module, id: CellId) {
        if self.rule_double_invert(module, id) {
            return;
        }
        if self.rule_mux_inverted_select(module, id) {
            return;
        }
        if self.rule_gate_patterns(module, id) {
            return;
        }
        if self.rule_eq_narrowing(module, id) {
            return;
        }
        if self.rule_bool_eq_collapse(module, id) {
            return;
        }
        if self.rule_mux_bool(module, id) {
            return;
        }
        if self.rule_mux_undef(module, id) {
            return;
        }
        if self.rule_generic_fold(module, id) {
            return;
        }
        self.rule_mux_const_select(module, id);
    }

    /// Replaces a cell with the direct assignment `Y := value` and logs
    /// the rewrite.
    fn replace_cell(&mut self, module: &mut Module, id: CellId, reason: &str, value: SigSpec) {
        let (y, ty_name, cell_name) = {
            let cell = module.cells.get(id);
            (
                cell.port(PortName::Y).clone(),
                cell.ty.display(self.interner).to_string(),
                self.interner.resolve(cell.name).to_string(),
            )
        };
        assert_eq!(
            y.width(),
            value.width(),
            "replacement width mismatch for cell '{cell_name}'"
        );
        log::info!(
            "Replacing {} cell '{}' ({}) in module '{}' with constant driver '{} = {}'.",
            ty_name,
            cell_name,
            reason,
            self.interner.resolve(module.name),
            y.display(module, self.interner),
            value.display(module, self.interner),
        );
        module.connect(y, value);
        module.remove_cell(id);
        self.did_something = true;
    }

    /// An inverter whose input is itself an inverted signal becomes a
    /// direct assignment to the pre-inverted signal.
    fn rule_double_invert(&mut self, module: &mut Module, id: CellId) -> bool {
        let cell = module.cells.get(id);
        if !matches!(
            cell.ty,
            CellType::GateInv | CellType::Not | CellType::LogicNot
        ) {
            return false;
        }
        let Some(y) = cell.get_port(PortName::Y) else {
            return false;
        };
        if y.width() != 1 {
            return false;
        }
        let Some(bit) = self.sigmap.apply(cell.port(PortName::A)).as_bit() else {
            return false;
        };
        let Some(original) = self.invert_map.get(&bit).cloned() else {
            return false;
        };
        self.replace_cell(module, id, "double_invert", original);
        true
    }

    /// A mux selected by an inverted signal swaps its branches and selects
    /// by the pre-inverted signal instead.
    fn rule_mux_inverted_select(&mut self, module: &mut Module, id: CellId) -> bool {
        let cell = module.cells.get(id);
        if !matches!(cell.ty, CellType::GateMux | CellType::Mux) {
            return false;
        }
        let Some(bit) = self.sigmap.apply(cell.port(PortName::S)).as_bit() else {
            return false;
        };
        let Some(original) = self.invert_map.get(&bit).cloned() else {
            return false;
        };
        let cell = module.cells.get_mut(id);
        let a = cell.port(PortName::A).clone();
        let b = cell.port(PortName::B).clone();
        cell.set_port(PortName::A, b);
        cell.set_port(PortName::B, a);
        cell.set_port(PortName::S, original);
        self.did_something = true;
        true
    }

    fn rule_gate_patterns(&mut self, module: &mut Module, id: CellId) -> bool {
        match module.cells.get(id).ty {
            CellType::GateInv => {
                let input = self.sigmap.apply(module.cells.get(id).port(PortName::A));
                self.apply_gate_rules(module, id, input, INV_RULES)
            }
            CellType::GateAnd => {
                let input = self.gate_input(module, id, &[PortName::B, PortName::A]);
                self.apply_gate_rules(module, id, input, AND_RULES)
            }
            CellType::GateOr => {
                let input = self.gate_input(module, id, &[PortName::B, PortName::A]);
                self.apply_gate_rules(module, id, input, OR_RULES)
            }
            CellType::GateXor => {
                let input = self.gate_input(module, id, &[PortName::B, PortName::A]);
                self.apply_gate_rules(module, id, input, XOR_RULES)
            }
            CellType::GateMux => self.rule_gate_mux(module, id),
            _ => false,
        }
    }

    /// Concatenates gate inputs, first port lowest, and canonicalizes.
    fn gate_input(&self, module: &Module, id: CellId, ports: &[PortName]) -> SigSpec {
        let cell = module.cells.get(id);
        let mut input = SigSpec::empty();
        for port in ports {
            input.append(cell.port(*port));
        }
        self.sigmap.apply(&input)
    }

    fn apply_gate_rules(
        &mut self,
        module: &mut Module,
        id: CellId,
        input: SigSpec,
        rules: &[GateRule],
    ) -> bool {
        for (pattern, needs_consume_x, action) in rules {
            if *needs_consume_x && !self.flags.consume_x {
                continue;
            }
            if input.matches(pattern) {
                let value = match action {
                    GateAction::Const(v) => SigSpec::bit(*v),
                    GateAction::Pass(i) => input.extract(*i, 1),
                };
                let reason = input.bit_string();
                self.replace_cell(module, id, &reason, value);
                return true;
            }
        }
        false
    }

    /// `$_MUX_` folding over the canonicalized bits `[S, B, A]`.
    fn rule_gate_mux(&mut self, module: &mut Module, id: CellId) -> bool {
        let input = self.gate_input(module, id, &[PortName::S, PortName::B, PortName::A]);
        let a = input.extract(2, 1);
        let b = input.extract(1, 1);
        let s = input.extract(0, 1);
        let reason = input.bit_string();
        if a == b || input.matches("--0") {
            self.replace_cell(module, id, &reason, a);
            return true;
        }
        if input.matches("--1") {
            self.replace_cell(module, id, &reason, b);
            return true;
        }
        if input.matches("01-") {
            self.replace_cell(module, id, &reason, s);
            return true;
        }
        if input.matches("10-") {
            // mux(1, 0, s) is an inverter of s.
            let cell = module.cells.get_mut(id);
            cell.ty = CellType::GateInv;
            cell.set_port(PortName::A, s);
            cell.unset_port(PortName::B);
            cell.unset_port(PortName::S);
            return true;
        }
        for (pattern, value) in [
            ("11-", Logic::One),
            ("00-", Logic::Zero),
            ("xx-", Logic::X),
            ("01x", Logic::X),
            ("10x", Logic::X),
        ] {
            if input.matches(pattern) {
                self.replace_cell(module, id, &reason, SigSpec::bit(value));
                return true;
            }
        }
        if self.flags.mux_undef {
            if input.matches("x--") {
                self.replace_cell(module, id, &reason, b);
                return true;
            }
            if input.matches("-x-") || input.matches("--x") {
                self.replace_cell(module, id, &reason, a);
                return true;
            }
        }
        false
    }

    /// Narrows `$eq`-family operands: differing constant bits decide the
    /// whole comparison, identical bits drop out. A pure narrowing keeps
    /// the cell and is not a firing — later rules still get a look.
    fn rule_eq_narrowing(&mut self, module: &mut Module, id: CellId) -> bool {
        let cell = module.cells.get(id);
        if !matches!(
            cell.ty,
            CellType::Eq | CellType::Ne | CellType::Eqx | CellType::Nex
        ) {
            return false;
        }
        let eq_family = matches!(cell.ty, CellType::Eq | CellType::Eqx);
        let y_width = cell.param_int(ParamName::YWidth) as u32;
        let mut a = cell.port(PortName::A).clone();
        let mut b = cell.port(PortName::B).clone();
        if cell.param_int(ParamName::AWidth) != cell.param_int(ParamName::BWidth) {
            let width = a.width().max(b.width());
            let signed =
                cell.param_bool(ParamName::ASigned) && cell.param_bool(ParamName::BSigned);
            a.extend_u0(width, signed);
            b.extend_u0(width, signed);
        }
        let a_bits = a.bits();
        let b_bits = b.bits();
        assert_eq!(
            a_bits.len(),
            b_bits.len(),
            "unaligned equality operands on cell '{}'",
            self.interner.resolve(cell.name)
        );

        let trivial = |family_hit: bool| {
            let mut y = SigSpec::bit(Logic::from_bool(family_hit));
            y.extend_u0(y_width, false);
            y
        };

        let mut new_a = Vec::new();
        let mut new_b = Vec::new();
        for (&ab, &bb) in a_bits.iter().zip(&b_bits) {
            if let (SigBit::Const(av), SigBit::Const(bv)) = (ab, bb) {
                if av.is_def() && bv.is_def() && av != bv {
                    // One definitely different bit settles the comparison.
                    let y = trivial(!eq_family);
                    self.replace_cell(module, id, "empty", y);
                    return true;
                }
            }
            if ab == bb {
                continue;
            }
            new_a.push(ab);
            new_b.push(bb);
        }
        if new_a.is_empty() {
            let y = trivial(eq_family);
            self.replace_cell(module, id, "empty", y);
            return true;
        }
        if (new_a.len() as u32) < a.width() {
            let width = new_a.len() as i64;
            let cell = module.cells.get_mut(id);
            cell.set_port(PortName::A, SigSpec::from_bits(new_a));
            cell.set_port(PortName::B, SigSpec::from_bits(new_b));
            cell.set_param_int(ParamName::AWidth, width);
            cell.set_param_int(ParamName::BWidth, width);
        }
        false
    }

    /// 1-bit `$eq`/`$ne` against a 1-bit constant folds to a buffer or an
    /// inverter of the symbolic side.
    fn rule_bool_eq_collapse(&mut self, module: &mut Module, id: CellId) -> bool {
        let cell = module.cells.get(id);
        if !matches!(cell.ty, CellType::Eq | CellType::Ne) {
            return false;
        }
        if cell.param_int(ParamName::YWidth) != 1
            || cell.param_int(ParamName::AWidth) != 1
            || cell.param_int(ParamName::BWidth) != 1
        {
            return false;
        }
        let is_eq = cell.ty == CellType::Eq;
        let mut a = self.sigmap.apply(cell.port(PortName::A));
        let mut b = self.sigmap.apply(cell.port(PortName::B));
        if a.is_fully_const() {
            // Canonical form keeps the constant on the B side.
            std::mem::swap(&mut a, &mut b);
            let cell = module.cells.get_mut(id);
            cell.set_port(PortName::A, a.clone());
            cell.set_port(PortName::B, b.clone());
        }
        if !b.is_fully_const() {
            return false;
        }
        if b.as_bool() == is_eq {
            let value = module.cells.get(id).port(PortName::A).clone();
            let reason = b.bit_string();
            self.replace_cell(module, id, &reason, value);
        } else {
            let cell = module.cells.get_mut(id);
            cell.ty = CellType::Not;
            cell.unset_param(ParamName::BWidth);
            cell.unset_param(ParamName::BSigned);
            cell.unset_port(PortName::B);
        }
        true
    }

    /// `mux_bool` rewrites plus their `consume_x` AND/OR forms.
    fn rule_mux_bool(&mut self, module: &mut Module, id: CellId) -> bool {
        if !self.flags.mux_bool {
            return false;
        }
        let cell = module.cells.get(id);
        if !matches!(cell.ty, CellType::Mux | CellType::GateMux) {
            return false;
        }
        let zero = SigSpec::bit(Logic::Zero);
        let one = SigSpec::bit(Logic::One);
        let a_is_zero = *cell.port(PortName::A) == zero;
        let a_is_one = *cell.port(PortName::A) == one;
        let b_is_zero = *cell.port(PortName::B) == zero;
        let b_is_one = *cell.port(PortName::B) == one;

        if a_is_zero && b_is_one {
            let s = cell.port(PortName::S).clone();
            self.replace_cell(module, id, "mux_bool", s);
            return true;
        }
        if a_is_one && b_is_zero {
            // mux(1, 0, s) = not(s).
            let cell = module.cells.get_mut(id);
            let s = cell.unset_port(PortName::S).expect("mux has an S port");
            cell.unset_port(PortName::B);
            cell.set_port(PortName::A, s);
            if cell.ty == CellType::Mux {
                let width = cell.param_int(ParamName::Width);
                cell.set_param_int(ParamName::AWidth, width);
                cell.set_param_int(ParamName::YWidth, width);
                cell.set_param_int(ParamName::ASigned, 0);
                cell.unset_param(ParamName::Width);
                cell.ty = CellType::Not;
            } else {
                cell.ty = CellType::GateInv;
            }
            self.did_something = true;
            return true;
        }
        if self.flags.consume_x && a_is_zero {
            // mux(0, b, s) = and(s, b) once x is read as 0.
            let cell = module.cells.get_mut(id);
            let s = cell.unset_port(PortName::S).expect("mux has an S port");
            cell.set_port(PortName::A, s);
            if cell.ty == CellType::Mux {
                self.mux_to_binary(module, id, CellType::And);
            } else {
                module.cells.get_mut(id).ty = CellType::GateAnd;
            }
            self.did_something = true;
            return true;
        }
        if self.flags.consume_x && b_is_one {
            // mux(a, 1, s) = or(a, s) once x is read as 1.
            let cell = module.cells.get_mut(id);
            let s = cell.unset_port(PortName::S).expect("mux has an S port");
            cell.set_port(PortName::B, s);
            if cell.ty == CellType::Mux {
                self.mux_to_binary(module, id, CellType::Or);
            } else {
                module.cells.get_mut(id).ty = CellType::GateOr;
            }
            self.did_something = true;
            return true;
        }
        false
    }

    /// Rewrites a word-level `$mux` into a binary cell, mapping `WIDTH`
    /// onto the binary parameter schema.
    fn mux_to_binary(&self, module: &mut Module, id: CellId, ty: CellType) {
        let cell = module.cells.get_mut(id);
        let width = cell.param_int(ParamName::Width);
        cell.set_param_int(ParamName::AWidth, width);
        cell.set_param_int(ParamName::BWidth, width);
        cell.set_param_int(ParamName::YWidth, width);
        cell.set_param_int(ParamName::ASigned, 0);
        cell.set_param_int(ParamName::BSigned, 0);
        cell.unset_param(ParamName::Width);
        cell.ty = ty;
    }

    /// Prunes undefined branches from `$mux`/`$pmux` cells.
    fn rule_mux_undef(&mut self, module: &mut Module, id: CellId) -> bool {
        if !self.flags.mux_undef {
            return false;
        }
        let cell = module.cells.get(id);
        if !matches!(cell.ty, CellType::Mux | CellType::Pmux) {
            return false;
        }
        let a = cell.port(PortName::A).clone();
        let b = cell.port(PortName::B).clone();
        let s = cell.port(PortName::S).clone();
        let width = a.width();

        if (a.is_fully_undef() && b.is_fully_undef()) || s.is_fully_undef() {
            self.replace_cell(module, id, "mux undef", a);
            return true;
        }

        let mut new_b = SigSpec::empty();
        let mut new_s = SigSpec::empty();
        for i in 0..s.width() {
            let old_b = b.extract(i * width, width);
            let old_s = s.extract(i, 1);
            if old_b.is_fully_undef() || old_s.is_fully_undef() {
                continue;
            }
            new_b.append(&old_b);
            new_s.append(&old_s);
        }
        let mut new_a = a;
        if new_a.is_fully_undef() && new_s.width() > 0 {
            // Promote the last surviving branch to the default.
            new_a = new_b.extract((new_s.width() - 1) * width, width);
            new_b = new_b.extract(0, (new_s.width() - 1) * width);
            new_s = new_s.extract(0, new_s.width() - 1);
        }
        if new_s.width() == 0 {
            self.replace_cell(module, id, "mux undef", new_a);
            return true;
        }
        if new_a == SigSpec::bit(Logic::Zero) && new_b == SigSpec::bit(Logic::One) {
            self.replace_cell(module, id, "mux undef", new_s);
            return true;
        }
        if s.width() != new_s.width() {
            let s_width = new_s.width() as i64;
            let cell = module.cells.get_mut(id);
            cell.set_port(PortName::A, new_a);
            cell.set_port(PortName::B, new_b);
            cell.set_port(PortName::S, new_s);
            if s_width > 1 {
                cell.ty = CellType::Pmux;
                cell.set_param_int(ParamName::SWidth, s_width);
            } else {
                cell.ty = CellType::Mux;
                cell.unset_param(ParamName::SWidth);
            }
            self.did_something = true;
        }
        false
    }

    /// Generic constant folding: every input fully constant under
    /// canonicalization invokes the evaluator.
    fn rule_generic_fold(&mut self, module: &mut Module, id: CellId) -> bool {
        use CellType::*;
        let cell = module.cells.get(id);
        match cell.ty {
            Not | Pos | Bu0 | Neg | LogicNot | ReduceAnd | ReduceOr | ReduceXor | ReduceXnor
            | ReduceBool => {
                let a = self.sigmap.apply(cell.port(PortName::A));
                let Some(av) = a.as_const() else {
                    return false;
                };
                let y = fold::eval_unary(
                    cell.ty,
                    &av,
                    cell.param_bool(ParamName::ASigned),
                    cell.param_int(ParamName::YWidth) as u32,
                );
                let reason = a.bit_string();
                self.replace_cell(module, id, &reason, SigSpec::constant(y));
                true
            }
            And | Or | Xor | Xnor | LogicAnd | LogicOr | Shl | Shr | Sshl | Sshr | Lt | Le
            | Eq | Ne | Eqx | Nex | Gt | Ge | Add | Sub | Mul | Div | Mod | Pow => {
                let a = self.sigmap.apply(cell.port(PortName::A));
                let b = self.sigmap.apply(cell.port(PortName::B));
                let (Some(av), Some(bv)) = (a.as_const(), b.as_const()) else {
                    return false;
                };
                let y = fold::eval_binary(
                    cell.ty,
                    &av,
                    &bv,
                    cell.param_bool(ParamName::ASigned),
                    cell.param_bool(ParamName::BSigned),
                    cell.param_int(ParamName::YWidth) as u32,
                );
                let reason = format!("{}, {}", a.bit_string(), b.bit_string());
                self.replace_cell(module, id, &reason, SigSpec::constant(y));
                true
            }
            _ => false,
        }
    }

    /// Conservative `$mux` folding. Mux trees are structurally significant
    /// to downstream passes, so only two shapes fold: a fully constant
    /// select and identical branches.
    fn rule_mux_const_select(&mut self, module: &mut Module, id: CellId) -> bool {
        let cell = module.cells.get(id);
        if cell.ty != CellType::Mux {
            return false;
        }
        let s = self.sigmap.apply(cell.port(PortName::S));
        if s.is_fully_const() {
            let chosen = if s.as_bool() {
                cell.port(PortName::B).clone()
            } else {
                cell.port(PortName::A).clone()
            };
            let reason = s.bit_string();
            self.replace_cell(module, id, &reason, chosen);
            return true;
        }
        let a = self.sigmap.apply(cell.port(PortName::A));
        let b = self.sigmap.apply(cell.port(PortName::B));
        if a == b {
            let value = cell.port(PortName::A).clone();
            let reason = s.bit_string();
            self.replace_cell(module, id, &reason, value);
            return true;
        }
        false
    }
}
