//! Lexical scope chain for the resolution pass.
//!
//! A stack of symbol tables. The bottom scope is the script root: its
//! declarations become persistent script variables. Every other scope is
//! nested and looks up through the chain. Scopes live for one resolution
//! pass only.

use drift_common::fold;
use drift_common::sym::VarRef;
use rustc_hash::FxHashMap;

pub struct ScopeTree {
    scopes: Vec<FxHashMap<String, VarRef>>,
}

impl ScopeTree {
    /// A fresh tree holding only the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the root scope");
        self.scopes.pop();
    }

    /// Whether the current scope is the script root.
    pub fn in_root(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Bind a name in the current scope, replacing any same-scope binding.
    pub fn declare(&mut self, name: &str, var: VarRef) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(fold(name), var);
    }

    /// Look up a name in the current scope only.
    pub fn get_local(&self, name: &str) -> Option<VarRef> {
        self.scopes
            .last()
            .expect("scope stack is never empty")
            .get(&fold(name))
            .cloned()
    }

    /// Look up a name from the innermost scope outward.
    pub fn lookup(&self, name: &str) -> Option<VarRef> {
        let folded = fold(name);
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&folded).cloned())
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_common::script::VarKind;
    use drift_common::sym::VarInfo;

    fn var(name: &str) -> VarRef {
        VarInfo::declared(name, name.to_owned(), VarKind::Int).into_ref()
    }

    #[test]
    fn nested_lookup_walks_outward() {
        let mut tree = ScopeTree::new();
        tree.declare("x", var("x"));
        tree.push();
        assert!(tree.lookup("x").is_some());
        assert!(tree.get_local("x").is_none());
        tree.pop();
        assert!(tree.get_local("x").is_some());
    }

    #[test]
    fn inner_binding_shadows_outer() {
        let mut tree = ScopeTree::new();
        tree.declare("x", var("x"));
        tree.push();
        let inner = var("x");
        tree.declare("x", inner.clone());
        let found = tree.lookup("x").unwrap();
        assert!(std::rc::Rc::ptr_eq(&found, &inner));
    }

    #[test]
    fn names_fold_case() {
        let mut tree = ScopeTree::new();
        tree.declare("Foo", var("Foo"));
        assert!(tree.lookup("foo").is_some());
        assert!(tree.get_local("FOO").is_some());
    }

    #[test]
    fn names_vanish_with_their_scope() {
        let mut tree = ScopeTree::new();
        tree.push();
        tree.declare("inner", var("inner"));
        tree.pop();
        assert!(tree.lookup("inner").is_none());
    }
}
