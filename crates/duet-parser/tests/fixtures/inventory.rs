//! Stock bookkeeping.

use std::collections::HashMap;

/// Largest quantity a single item may hold.
pub const MAX_QTY: u32 = 10_000;

/// Stock levels keyed by item name.
#[derive(Debug, Default)]
pub struct Inventory {
    items: HashMap<String, u32>, // name -> quantity
}

impl Inventory {
    /// Add `qty` units of `name`.
    pub fn add(&mut self, name: &str, qty: u32) {
        let entry = self.items.entry(name.to_string()).or_insert(0);
        *entry = Self::clamp(*entry + qty);
    }

    fn clamp(qty: u32) -> u32 {
        qty.min(MAX_QTY)
    }
}
// end of inventory

fn main() {
    let describe = |inv: &Inventory| format!("{inv:?}");
    let mut inv = Inventory::default();
    inv.add("bolt", 3);
    println!("{}", describe(&inv));
}
