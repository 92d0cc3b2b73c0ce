//! Netlist optimization passes for the Vela RTL toolchain.
//!
//! The centerpiece is the constant-folding peephole pass
//! ([`OptConstPass`]): it folds cells with constant inputs into direct
//! assignments, exploits algebraic identities on partially known inputs,
//! and optionally ties undriven nets to the undefined constant. The pass
//! iterates its rewrite engine to a fixed point per module and reports
//! whether anything changed, so surrounding passes can decide to re-run.
//!
//! # Usage
//!
//! ```ignore
//! use vela_opt::{OptConfig, OptConstPass, Pass};
//! let pass = OptConstPass::new(OptConfig {
//!     mux_undef: true,
//!     mux_bool: true,
//!     undriven: true,
//! });
//! let changed = pass.run(&mut design, &Selection::full(), &interner);
//! ```

#![warn(missing_docs)]

pub mod celltypes;
pub mod engine;
pub mod fold;
pub mod opt_const;
pub mod sigmap;
pub mod undriven;

pub use celltypes::{CellClass, CellDirectory};
pub use engine::EngineFlags;
pub use opt_const::{OptConfig, OptConstPass, Pass};
pub use sigmap::SigMap;
