//! Symbol tables and the string-literal pool built during parsing

use super::ast::SourceLocation;
use crate::types::Type;
use rustc_hash::FxHashMap;

/// A declared variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub location: SourceLocation,
}

/// Ordered name -> symbol mapping. Later declarations shadow earlier ones.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn declare(&mut self, name: &str, ty: Type, location: SourceLocation) {
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            location,
        });
    }

    /// Most recent declaration of `name`
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().rev().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Pooled string literals; identical text shares one label index
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    literals: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl StringPool {
    pub fn new() -> Self {
        StringPool::default()
    }

    /// Index of `text`, adding it on first sight
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(&idx) = self.index.get(text) {
            return idx;
        }
        let idx = self.literals.len();
        self.literals.push(text.to_string());
        self.index.insert(text.to_string(), idx);
        idx
    }

    /// Literals in label order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.literals.iter().map(String::as_str).enumerate()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}
