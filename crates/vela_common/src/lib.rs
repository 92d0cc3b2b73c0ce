//! Shared foundational types for the Vela RTL toolchain.
//!
//! This crate provides interned identifiers, the 4-state logic value type,
//! and packed logic vectors used throughout the netlist representation and
//! the optimizer.

#![warn(missing_docs)]

pub mod ident;
pub mod logic;
pub mod logic_vec;

pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use logic_vec::LogicVec;
