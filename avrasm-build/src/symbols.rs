use ahash::AHashMap;
use string_interner::DefaultSymbol;

/// Labels and `.equ` constants share one namespace.
#[derive(Debug, Default)]
pub struct SymbolTable {
    values: AHashMap<DefaultSymbol, u64>,
}

/// The name was already defined; the first definition is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate(pub DefaultSymbol);

impl SymbolTable {
    pub fn insert(&mut self, name: DefaultSymbol, value: u64) -> Result<(), Duplicate> {
        if self.values.contains_key(&name) {
            return Err(Duplicate(name));
        }
        self.values.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: DefaultSymbol) -> Option<u64> {
        self.values.get(&name).copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
