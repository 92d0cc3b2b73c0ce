//! Alias map: bit-level canonicalization of equivalent signals.
//!
//! Direct assignments chain signals together (`\y := \x`, `\z := \y`).
//! The [`SigMap`] collapses every such chain: it unions the two sides of
//! each assignment bit by bit and picks one representative per
//! equivalence class, so that [`apply`](SigMap::apply) maps any two
//! transitively connected signals to equal results.
//!
//! Representative preference: a constant bit wins over any wire bit, a
//! user-visible (`\`) wire bit wins over a generated (`$`) one, and
//! remaining ties fall to the lexicographically smaller wire name, then
//! the smaller bit index. The choice is deterministic, and `apply` is
//! idempotent.

use std::collections::HashMap;
use vela_common::Interner;
use vela_ir::{is_generated_name, Module, SigBit, SigSpec, WireId};

/// A canonicalization function over the signals of one module.
///
/// Built once per engine walk and discarded when any rewrite invalidates
/// the module's assignment structure.
pub struct SigMap {
    map: HashMap<(WireId, u32), SigBit>,
}

impl SigMap {
    /// Builds the alias map from a module's direct assignments.
    pub fn new(module: &Module, interner: &Interner) -> Self {
        let mut builder = Builder::default();
        for conn in &module.connections {
            let lhs = conn.lhs.bits();
            let rhs = conn.rhs.bits();
            assert_eq!(
                lhs.len(),
                rhs.len(),
                "direct assignment width mismatch in module '{}'",
                interner.resolve(module.name)
            );
            for (a, b) in lhs.into_iter().zip(rhs) {
                builder.union(module, interner, a, b);
            }
        }
        Self {
            map: builder.finish(),
        }
    }

    /// Maps one bit to its class representative.
    pub fn bit(&self, bit: SigBit) -> SigBit {
        match bit {
            SigBit::Wire { wire, bit } => {
                self.map.get(&(wire, bit)).copied().unwrap_or(SigBit::Wire {
                    wire,
                    bit,
                })
            }
            constant => constant,
        }
    }

    /// Maps every bit of a signal to its representative and re-chunks.
    pub fn apply(&self, sig: &SigSpec) -> SigSpec {
        SigSpec::from_bits(sig.bits().into_iter().map(|b| self.bit(b)))
    }
}

/// Union-find over wire bits, with constants folded into class
/// representatives rather than stored as nodes.
#[derive(Default)]
struct Builder {
    index: HashMap<(WireId, u32), usize>,
    parent: Vec<usize>,
    rank: Vec<u8>,
    repr: Vec<SigBit>,
}

impl Builder {
    fn node(&mut self, wire: WireId, bit: u32) -> usize {
        if let Some(&n) = self.index.get(&(wire, bit)) {
            return n;
        }
        let n = self.parent.len();
        self.index.insert((wire, bit), n);
        self.parent.push(n);
        self.rank.push(0);
        self.repr.push(SigBit::Wire { wire, bit });
        n
    }

    fn find(&mut self, mut n: usize) -> usize {
        while self.parent[n] != n {
            self.parent[n] = self.parent[self.parent[n]];
            n = self.parent[n];
        }
        n
    }

    fn union(&mut self, module: &Module, interner: &Interner, a: SigBit, b: SigBit) {
        match (a, b) {
            (SigBit::Wire { wire: wa, bit: ba }, SigBit::Wire { wire: wb, bit: bb }) => {
                let ra = {
                    let n = self.node(wa, ba);
                    self.find(n)
                };
                let rb = {
                    let n = self.node(wb, bb);
                    self.find(n)
                };
                if ra == rb {
                    return;
                }
                let repr = better(module, interner, self.repr[ra], self.repr[rb]);
                let root = if self.rank[ra] < self.rank[rb] {
                    self.parent[ra] = rb;
                    rb
                } else if self.rank[ra] > self.rank[rb] {
                    self.parent[rb] = ra;
                    ra
                } else {
                    self.parent[rb] = ra;
                    self.rank[ra] += 1;
                    ra
                };
                self.repr[root] = repr;
            }
            (SigBit::Wire { wire, bit }, SigBit::Const(_)) => {
                let n = self.node(wire, bit);
                let root = self.find(n);
                // A constant always wins the representative choice; the
                // first constant to reach a class sticks.
                if matches!(self.repr[root], SigBit::Wire { .. }) {
                    self.repr[root] = b;
                }
            }
            (SigBit::Const(_), SigBit::Wire { .. }) => self.union(module, interner, b, a),
            (SigBit::Const(_), SigBit::Const(_)) => {}
        }
    }

    fn finish(mut self) -> HashMap<(WireId, u32), SigBit> {
        let keys: Vec<(WireId, u32)> = self.index.keys().copied().collect();
        let mut map = HashMap::with_capacity(keys.len());
        for key in keys {
            let n = self.index[&key];
            let root = self.find(n);
            map.insert(key, self.repr[root]);
        }
        map
    }
}

/// Picks the preferred representative of two wire bits.
fn better(module: &Module, interner: &Interner, a: SigBit, b: SigBit) -> SigBit {
    let (SigBit::Wire { wire: wa, bit: ba }, SigBit::Wire { wire: wb, bit: bb }) = (a, b) else {
        // Constants are handled before rank-based linking.
        return if matches!(a, SigBit::Const(_)) { a } else { b };
    };
    let name_a = interner.resolve(module.wires.get(wa).name);
    let name_b = interner.resolve(module.wires.get(wb).name);
    let key_a = (is_generated_name(name_a), name_a, ba);
    let key_b = (is_generated_name(name_b), name_b, bb);
    if key_a <= key_b {
        a
    } else {
        b
    }
}
