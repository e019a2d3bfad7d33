//! String interner for identifiers, literals and generated names.
//!
//! The lowering pass interns every name it emits (including synthesized
//! temporaries), and the renderer looks them back up. Interning goes through
//! `&self`, so one interner can be shared by every unit of a compilation and
//! by concurrent compilations.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

#[derive(Default)]
struct Table {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Thread-safe string interner.
///
/// Strings are leaked on first insertion so lookups can hand out `&'static str`
/// without holding the lock.
pub struct StringInterner {
    table: RwLock<Table>,
}

impl StringInterner {
    /// Create an interner with the empty string and Luau keywords pre-interned.
    pub fn new() -> Self {
        let interner = StringInterner {
            table: RwLock::new(Table::default()),
        };
        interner.intern("");
        for kw in PRE_INTERNED {
            interner.intern(kw);
        }
        interner
    }

    /// Intern a string, returning its [`Name`].
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&index) = self.table.read().map.get(s) {
            return Name::from_index(index);
        }

        let mut table = self.table.write();
        // Another writer may have raced us between the two locks.
        if let Some(&index) = table.map.get(s) {
            return Name::from_index(index);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = u32::try_from(table.strings.len())
            .unwrap_or_else(|_| panic!("string interner exceeded u32::MAX entries"));
        table.strings.push(leaked);
        table.map.insert(leaked, index);
        Name::from_index(index)
    }

    /// Intern an owned string.
    pub fn intern_owned(&self, s: String) -> Name {
        self.intern(&s)
    }

    /// Look up the text of a [`Name`].
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.read().strings.get(name.index()).copied().unwrap_or("")
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Luau keywords and the runtime identifiers every chunk mentions.
const PRE_INTERNED: &[&str] = &[
    "and", "break", "continue", "do", "else", "elseif", "end", "false", "for", "function",
    "if", "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until",
    "while", "self", "CS", "new", "constructor", "__index", "__tostring", "number", "string",
    "boolean", "any",
];

/// Read-only name lookup, for code that only renders names.
pub trait StringLookup {
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Reference-counted interner handle shared across compilations and threads.
#[derive(Clone, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &StringInterner {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.intern("Counter");
        let b = interner.intern("Counter");
        let c = interner.intern("Point");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.lookup(a), "Counter");
    }

    #[test]
    fn empty_string_is_name_empty() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn keywords_are_pre_interned() {
        let interner = StringInterner::new();
        let before = interner.len();
        interner.intern("local");
        interner.intern("until");
        assert_eq!(interner.len(), before);
    }

    #[test]
    fn shared_interner_clones_share_storage() {
        let shared = SharedInterner::new();
        let other = shared.clone();
        let name = shared.intern("shared");
        assert_eq!(other.intern("shared"), name);
        assert_eq!(other.lookup(name), "shared");
    }
}
