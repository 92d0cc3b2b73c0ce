//! Top-level design container and optimizer selections.

use crate::arena::Arena;
use crate::ids::ModuleId;
use crate::module::Module;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vela_common::Ident;

/// A complete design: the set of modules passes operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// All modules, keyed by [`ModuleId`].
    pub modules: Arena<ModuleId, Module>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self {
            modules: Arena::new(),
        }
    }

    /// Adds an empty module and returns its ID.
    pub fn add_module(&mut self, name: Ident) -> ModuleId {
        self.modules.alloc_with(|id| Module::new(id, name))
    }
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}

/// Restricts a pass to a subset of modules and cells.
///
/// The default selection covers everything. A module filter restricts the
/// pass to the named modules; a cell filter additionally restricts it to
/// the named `(module, cell)` pairs within those modules. Unselected cells
/// are never modified or deleted.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    modules: Option<HashSet<Ident>>,
    cells: Option<HashSet<(Ident, Ident)>>,
}

impl Selection {
    /// Selects every module and cell.
    pub fn full() -> Self {
        Self::default()
    }

    /// Selects only the named modules (all of their cells).
    pub fn of_modules<I: IntoIterator<Item = Ident>>(modules: I) -> Self {
        Self {
            modules: Some(modules.into_iter().collect()),
            cells: None,
        }
    }

    /// Selects only the named `(module, cell)` pairs.
    pub fn of_cells<I: IntoIterator<Item = (Ident, Ident)>>(cells: I) -> Self {
        let cells: HashSet<(Ident, Ident)> = cells.into_iter().collect();
        Self {
            modules: Some(cells.iter().map(|(m, _)| *m).collect()),
            cells: Some(cells),
        }
    }

    /// Returns `true` if the module is selected.
    pub fn contains_module(&self, module: Ident) -> bool {
        self.modules
            .as_ref()
            .is_none_or(|set| set.contains(&module))
    }

    /// Returns `true` if the cell is selected.
    pub fn contains_cell(&self, module: Ident, cell: Ident) -> bool {
        self.contains_module(module)
            && self
                .cells
                .as_ref()
                .is_none_or(|set| set.contains(&(module, cell)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_common::Interner;

    #[test]
    fn design_construction() {
        let interner = Interner::new();
        let mut design = Design::new();
        let top = design.add_module(interner.intern("\\top"));
        let sub = design.add_module(interner.intern("\\sub"));
        assert_eq!(design.modules.len(), 2);
        assert_eq!(
            interner.resolve(design.modules.get(top).name),
            "\\top"
        );
        assert_ne!(top, sub);
    }

    #[test]
    fn full_selection_covers_everything() {
        let interner = Interner::new();
        let sel = Selection::full();
        assert!(sel.contains_module(interner.intern("\\m")));
        assert!(sel.contains_cell(interner.intern("\\m"), interner.intern("$c")));
    }

    #[test]
    fn module_selection_filters() {
        let interner = Interner::new();
        let a = interner.intern("\\a");
        let b = interner.intern("\\b");
        let sel = Selection::of_modules([a]);
        assert!(sel.contains_module(a));
        assert!(!sel.contains_module(b));
        assert!(sel.contains_cell(a, interner.intern("$c")));
        assert!(!sel.contains_cell(b, interner.intern("$c")));
    }

    #[test]
    fn cell_selection_filters() {
        let interner = Interner::new();
        let m = interner.intern("\\m");
        let c1 = interner.intern("$c1");
        let c2 = interner.intern("$c2");
        let sel = Selection::of_cells([(m, c1)]);
        assert!(sel.contains_module(m));
        assert!(sel.contains_cell(m, c1));
        assert!(!sel.contains_cell(m, c2));
    }

    #[test]
    fn design_serde_roundtrip() {
        let interner = Interner::new();
        let mut design = Design::new();
        design.add_module(interner.intern("\\top"));
        let json = serde_json::to_string(&design).unwrap();
        let back: Design = serde_json::from_str(&json).unwrap();
        assert_eq!(back.modules.len(), 1);
    }
}
