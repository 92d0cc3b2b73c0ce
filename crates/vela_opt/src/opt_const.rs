//! The constant-folding pass and its fixed-point driver.
//!
//! Per selected module the driver optionally ties off undriven nets, then
//! iterates the rewrite engine: the safe rules run to quiescence, the
//! x-absorbing rules run once, and the whole cycle repeats until nothing
//! fires. Running the unsafe rules at most once per outer iteration keeps
//! them from feeding themselves into an unbounded chain; every rewrite
//! removes a cell or strictly narrows an operand, so the loop terminates.

use crate::engine::{run_walk, EngineFlags};
use crate::undriven::replace_undriven;
use vela_common::Interner;
use vela_ir::{Design, Selection};

/// Configuration for [`OptConstPass`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OptConfig {
    /// Prune undefined branches from `$mux`/`$pmux`/`$_MUX_` cells.
    pub mux_undef: bool,
    /// Rewrite boolean-shaped muxes into buffers and inverters.
    pub mux_bool: bool,
    /// Tie undriven nets to the undefined constant before iterating.
    pub undriven: bool,
}

/// A netlist optimization pass over a whole design.
///
/// Each pass reports whether it changed anything, which surrounding
/// passes use to decide whether to re-run their own analyses.
pub trait Pass {
    /// The pass name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the pass, returning `true` if the design changed.
    fn run(&self, design: &mut Design, selection: &Selection, interner: &Interner) -> bool;
}

/// Constant folding and local peephole optimization.
pub struct OptConstPass {
    config: OptConfig,
}

impl OptConstPass {
    /// Creates the pass with the given configuration.
    pub fn new(config: OptConfig) -> Self {
        Self { config }
    }
}

impl Pass for OptConstPass {
    fn name(&self) -> &'static str {
        "opt_const"
    }

    fn run(&self, design: &mut Design, selection: &Selection, interner: &Interner) -> bool {
        log::debug!("Executing opt_const pass (perform const folding).");
        let mut changed = false;
        for id in design.modules.ids() {
            let module = design.modules.get_mut(id);
            if !selection.contains_module(module.name) {
                continue;
            }
            if self.config.undriven {
                changed |= replace_undriven(module, interner);
            }
            let safe = EngineFlags {
                consume_x: false,
                mux_undef: self.config.mux_undef,
                mux_bool: self.config.mux_bool,
            };
            let unsafe_x = EngineFlags {
                consume_x: true,
                ..safe
            };
            loop {
                while run_walk(module, selection, safe, interner) {
                    changed = true;
                }
                if !run_walk(module, selection, unsafe_x, interner) {
                    break;
                }
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vela_common::LogicVec;
    use vela_ir::{
        CellId, CellType, Const, Module, ModuleId, ParamName, PortName, SigSpec, WireId, WireRole,
    };

    fn all_flags() -> OptConfig {
        OptConfig {
            mux_undef: true,
            mux_bool: true,
            undriven: true,
        }
    }

    fn bits(s: &str) -> SigSpec {
        SigSpec::constant(LogicVec::from_binary_str(s).unwrap())
    }

    struct TestDesign {
        design: Design,
        module: ModuleId,
    }

    impl TestDesign {
        fn new(interner: &Interner) -> Self {
            let mut design = Design::new();
            let module = design.add_module(interner.intern("\\top"));
            Self { design, module }
        }

        fn module(&mut self) -> &mut Module {
            self.design.modules.get_mut(self.module)
        }

        fn wire(&mut self, interner: &Interner, name: &str, width: u32) -> WireId {
            self.module()
                .add_wire(interner.intern(name), width, WireRole::Internal)
        }

        fn cell(
            &mut self,
            interner: &Interner,
            name: &str,
            ty: CellType,
            connections: &[(PortName, SigSpec)],
            parameters: &[(ParamName, i64)],
        ) -> CellId {
            let conns: BTreeMap<PortName, SigSpec> = connections.iter().cloned().collect();
            let params: BTreeMap<ParamName, Const> = parameters
                .iter()
                .map(|(p, v)| (*p, Const::from_int(*v)))
                .collect();
            self.module()
                .add_cell(interner.intern(name), ty, conns, params)
        }

        fn run(&mut self, interner: &Interner, config: OptConfig) -> bool {
            OptConstPass::new(config).run(&mut self.design, &Selection::full(), interner)
        }
    }

    #[test]
    fn double_inverter_chain_collapses() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let input = t.wire(&interner, "\\in", 1);
        let mid = t.wire(&interner, "\\mid", 1);
        let out = t.wire(&interner, "\\out", 1);
        let in_sig = t.module().wire_sig(input);
        let mid_sig = t.module().wire_sig(mid);
        let out_sig = t.module().wire_sig(out);
        t.cell(
            &interner,
            "$g1",
            CellType::GateInv,
            &[(PortName::A, in_sig.clone()), (PortName::Y, mid_sig.clone())],
            &[],
        );
        let g2 = t.cell(
            &interner,
            "$g2",
            CellType::GateInv,
            &[(PortName::A, mid_sig), (PortName::Y, out_sig.clone())],
            &[],
        );
        assert!(t.run(&interner, all_flags()));
        // The inner inverter pair collapses to a direct assignment; the
        // first inverter still drives \mid (removing it is dead-code
        // elimination, a separate pass).
        assert!(!t.module().cells.contains(g2));
        assert!(t
            .module()
            .connections
            .iter()
            .any(|c| c.lhs == out_sig && c.rhs == in_sig));
    }

    #[test]
    fn constant_and_gate_folds() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let x = t.wire(&interner, "\\x", 1);
        let y = t.wire(&interner, "\\y", 1);
        let x_sig = t.module().wire_sig(x);
        let y_sig = t.module().wire_sig(y);
        let cell = t.cell(
            &interner,
            "$and0",
            CellType::GateAnd,
            &[
                (PortName::A, bits("0")),
                (PortName::B, x_sig),
                (PortName::Y, y_sig.clone()),
            ],
            &[],
        );
        assert!(t.run(&interner, all_flags()));
        assert!(!t.module().cells.contains(cell));
        assert!(t
            .module()
            .connections
            .iter()
            .any(|c| c.lhs == y_sig && c.rhs == bits("0")));
    }

    #[test]
    fn eq_short_circuits_on_differing_constant_bits() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let a = t.wire(&interner, "\\a", 1);
        let b = t.wire(&interner, "\\b", 1);
        let y = t.wire(&interner, "\\y", 1);
        let a_sig = t.module().wire_sig(a);
        let b_sig = t.module().wire_sig(b);
        let y_sig = t.module().wire_sig(y);
        let mut lhs = b_sig.clone();
        lhs.append(&a_sig);
        lhs.append(&bits("10"));
        let mut rhs = b_sig;
        rhs.append(&a_sig);
        rhs.append(&bits("11"));
        let cell = t.cell(
            &interner,
            "$eq0",
            CellType::Eq,
            &[
                (PortName::A, lhs),
                (PortName::B, rhs),
                (PortName::Y, y_sig.clone()),
            ],
            &[
                (ParamName::AWidth, 4),
                (ParamName::BWidth, 4),
                (ParamName::YWidth, 1),
                (ParamName::ASigned, 0),
                (ParamName::BSigned, 0),
            ],
        );
        assert!(t.run(&interner, all_flags()));
        assert!(!t.module().cells.contains(cell));
        assert!(t
            .module()
            .connections
            .iter()
            .any(|c| c.lhs == y_sig && c.rhs == bits("0")));
    }

    #[test]
    fn bool_mux_becomes_inverter() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let s = t.wire(&interner, "\\s", 1);
        let y = t.wire(&interner, "\\y", 1);
        let s_sig = t.module().wire_sig(s);
        let y_sig = t.module().wire_sig(y);
        let cell = t.cell(
            &interner,
            "$mux0",
            CellType::GateMux,
            &[
                (PortName::A, bits("1")),
                (PortName::B, bits("0")),
                (PortName::S, s_sig.clone()),
                (PortName::Y, y_sig),
            ],
            &[],
        );
        assert!(t.run(&interner, all_flags()));
        let cell = t.module().cells.get(cell);
        assert_eq!(cell.ty, CellType::GateInv);
        assert_eq!(*cell.port(PortName::A), s_sig);
        assert!(cell.get_port(PortName::B).is_none());
        assert!(cell.get_port(PortName::S).is_none());
    }

    #[test]
    fn pmux_prunes_to_inverter_through_composed_rewrites() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let s0 = t.wire(&interner, "\\s0", 1);
        let s1 = t.wire(&interner, "\\s1", 1);
        let s2 = t.wire(&interner, "\\s2", 1);
        let y = t.wire(&interner, "\\y", 1);
        let s0_sig = t.module().wire_sig(s0);
        let mut s = s0_sig.clone();
        s.append(&t.module().wire_sig(s1));
        s.append(&t.module().wire_sig(s2));
        let mut b = bits("0");
        b.append(&bits("x"));
        b.append(&bits("1"));
        let y_sig = t.module().wire_sig(y);
        let cell = t.cell(
            &interner,
            "$pmux0",
            CellType::Pmux,
            &[
                (PortName::A, bits("x")),
                (PortName::B, b),
                (PortName::S, s),
                (PortName::Y, y_sig),
            ],
            &[(ParamName::Width, 1), (ParamName::SWidth, 3)],
        );
        assert!(t.run(&interner, all_flags()));
        // One walk prunes to mux(A=1, B=0, S=\s0); the next rewrites that
        // shape into an inverter of \s0.
        let cell = t.module().cells.get(cell);
        assert_eq!(cell.ty, CellType::Not);
        assert_eq!(*cell.port(PortName::A), s0_sig);
    }

    #[test]
    fn undriven_wire_is_tied_off() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let w = t.wire(&interner, "\\dangling", 2);
        let w_sig = t.module().wire_sig(w);
        assert!(t.run(&interner, all_flags()));
        assert!(t
            .module()
            .connections
            .iter()
            .any(|c| c.lhs == w_sig && c.rhs == SigSpec::undef(2)));
        // Without the flag the wire is left alone.
        let mut t2 = TestDesign::new(&interner);
        t2.wire(&interner, "\\dangling", 2);
        assert!(!t2.run(
            &interner,
            OptConfig {
                undriven: false,
                ..all_flags()
            }
        ));
        assert!(t2.module().connections.is_empty());
    }

    #[test]
    fn rewrites_compose_across_walks() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        // not(not(1)) folds in two engine walks: the inner inverter folds
        // to a constant, the alias then lets the outer one fold too.
        let mid = t.wire(&interner, "\\mid", 1);
        let out = t.wire(&interner, "\\out", 1);
        let mid_sig = t.module().wire_sig(mid);
        let out_sig = t.module().wire_sig(out);
        let g1 = t.cell(
            &interner,
            "$g1",
            CellType::GateInv,
            &[(PortName::A, bits("1")), (PortName::Y, mid_sig.clone())],
            &[],
        );
        let g2 = t.cell(
            &interner,
            "$g2",
            CellType::GateInv,
            &[(PortName::A, mid_sig), (PortName::Y, out_sig.clone())],
            &[],
        );
        assert!(t.run(&interner, all_flags()));
        assert!(!t.module().cells.contains(g1));
        assert!(!t.module().cells.contains(g2));
        assert!(t
            .module()
            .connections
            .iter()
            .any(|c| c.lhs == out_sig && c.rhs == bits("1")));
    }

    #[test]
    fn pass_is_idempotent() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let x = t.wire(&interner, "\\x", 1);
        let y = t.wire(&interner, "\\y", 1);
        let z = t.wire(&interner, "\\z", 4);
        let x_sig = t.module().wire_sig(x);
        let y_sig = t.module().wire_sig(y);
        let z_sig = t.module().wire_sig(z);
        t.cell(
            &interner,
            "$and0",
            CellType::GateAnd,
            &[
                (PortName::A, bits("1")),
                (PortName::B, x_sig),
                (PortName::Y, y_sig),
            ],
            &[],
        );
        t.cell(
            &interner,
            "$add0",
            CellType::Add,
            &[
                (PortName::A, bits("0001")),
                (PortName::B, bits("0010")),
                (PortName::Y, z_sig),
            ],
            &[
                (ParamName::AWidth, 4),
                (ParamName::BWidth, 4),
                (ParamName::YWidth, 4),
                (ParamName::ASigned, 0),
                (ParamName::BSigned, 0),
            ],
        );
        assert!(t.run(&interner, all_flags()));
        let after_first = t.module().connections.clone();
        let cells_after_first = t.module().cells.len();
        // A second run finds nothing left to do.
        assert!(!t.run(&interner, all_flags()));
        assert_eq!(t.module().connections, after_first);
        assert_eq!(t.module().cells.len(), cells_after_first);
    }

    #[test]
    fn selection_is_respected() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let y = t.wire(&interner, "\\y", 1);
        let y_sig = t.module().wire_sig(y);
        let cell = t.cell(
            &interner,
            "$inv0",
            CellType::GateInv,
            &[(PortName::A, bits("1")), (PortName::Y, y_sig)],
            &[],
        );
        let selection = Selection::of_modules([interner.intern("\\other")]);
        let changed =
            OptConstPass::new(all_flags()).run(&mut t.design, &selection, &interner);
        assert!(!changed);
        assert!(t.module().cells.contains(cell));
    }

    #[test]
    fn unsafe_rules_fire_only_in_the_consume_x_phase() {
        let interner = Interner::new();
        let mut t = TestDesign::new(&interner);
        let x = t.wire(&interner, "\\x", 1);
        let y = t.wire(&interner, "\\y", 1);
        let x_sig = t.module().wire_sig(x);
        let y_sig = t.module().wire_sig(y);
        let cell = t.cell(
            &interner,
            "$and0",
            CellType::GateAnd,
            &[
                (PortName::A, bits("x")),
                (PortName::B, x_sig),
                (PortName::Y, y_sig.clone()),
            ],
            &[],
        );
        // and(x, wire) only folds via the x-absorbing phase of the driver.
        assert!(t.run(&interner, all_flags()));
        assert!(!t.module().cells.contains(cell));
        assert!(t
            .module()
            .connections
            .iter()
            .any(|c| c.lhs == y_sig && c.rhs == bits("0")));
    }

    #[test]
    fn empty_design_is_a_quiet_no_op() {
        let interner = Interner::new();
        let mut design = Design::new();
        design.add_module(interner.intern("\\empty"));
        let changed =
            OptConstPass::new(all_flags()).run(&mut design, &Selection::full(), &interner);
        assert!(!changed);
    }

    #[test]
    fn pass_reports_name() {
        assert_eq!(OptConstPass::new(OptConfig::default()).name(), "opt_const");
    }
}
