//! Symbol table mapping identifiers to frame slots.

use std::collections::HashMap;

/// Append-only table of identifiers.
///
/// Slots are handed out in first-seen order and double as offsets into a call
/// frame, so the order names are interned in fixes the frame layout.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    slots: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Return the slot of `name`, inserting it if it has not been seen before.
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }

        let slot = self.names.len();
        self.names.push(name.to_string());
        self.slots.insert(name.to_string(), slot);
        slot
    }

    pub fn name(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_insertion_order() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.intern("fac"), 0);
        assert_eq!(symbols.intern("n"), 1);
        assert_eq!(symbols.intern("acc"), 2);
        assert_eq!(symbols.len(), 3);
    }

    #[test]
    fn reinterning_reuses_slot() {
        let mut symbols = SymbolTable::new();
        symbols.intern("x");
        symbols.intern("y");
        assert_eq!(symbols.intern("x"), 0);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols.name(1), Some("y"));
    }

    #[test]
    fn lookup_by_slot() {
        let mut symbols = SymbolTable::new();
        assert!(symbols.is_empty());
        symbols.intern("a");
        symbols.intern("b");
        assert_eq!(symbols.name(1), Some("b"));
        assert_eq!(symbols.name(2), None);
        let names: Vec<_> = symbols.iter().collect();
        assert_eq!(names, vec![(0, "a"), (1, "b")]);
    }
}
