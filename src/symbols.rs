use crate::{Type, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub typ: Type,
    /// Last statically known value; only its type matters after checking.
    pub value: Value,
}

/// The single global scope. There is no block scoping.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` with the default value of `typ`. Returns `false` and
    /// leaves the first declaration in place if the name already exists.
    pub fn declare(&mut self, name: &str, typ: Type) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }
        self.symbols.insert(
            name.to_string(),
            Symbol {
                typ,
                value: typ.default_value(),
            },
        );
        true
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Records an assignment. The value is widened to the declared type where
    /// needed. Unknown names are ignored.
    pub fn assign(&mut self, name: &str, value: Value) {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.value = value.coerce_to(symbol.typ);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_sets_default() {
        let mut table = SymbolTable::new();
        assert!(table.declare("x", Type::Float));
        let symbol = table.lookup("x").unwrap();
        assert_eq!(symbol.typ, Type::Float);
        assert_eq!(symbol.value, Value::Float(0.0));
    }

    #[test]
    fn first_declaration_wins() {
        let mut table = SymbolTable::new();
        assert!(table.declare("x", Type::Int));
        assert!(!table.declare("x", Type::String));
        assert_eq!(table.lookup("x").unwrap().typ, Type::Int);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut table = SymbolTable::new();
        table.declare("x", Type::Int);
        assert!(table.lookup("X").is_none());
    }

    #[test]
    fn assignment_widens_into_float() {
        let mut table = SymbolTable::new();
        table.declare("f", Type::Float);
        table.assign("f", Value::Int(3));
        assert_eq!(table.lookup("f").unwrap().value, Value::Float(3.0));
        table.assign("missing", Value::Int(1));
        assert!(table.lookup("missing").is_none());
    }
}
