use std::cell::RefCell;
use std::rc::Rc;

use crate::script::VarKind;
use crate::ty::Ty;

/// Shared handle to a resolved symbol. AST nodes, scope tables, and the
/// final variable-table builder all point at the same cell; resolution
/// finalizes indices in place after the whole tree has been visited.
pub type VarRef = Rc<RefCell<VarInfo>>;

/// A resolved script variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    /// Name as written in source.
    pub name: String,
    /// Engine-visible name. Identical to `name` for persistent variables;
    /// temporaries get a mangled `__temp_<name>_<n>` rename.
    pub rename: String,
    /// 1-based slot index. Assigned when resolution finalizes.
    pub index: u32,
    pub kind: VarKind,
    pub ty: Ty,
    /// True if this symbol already existed on the target script object
    /// before this compilation (incremental recompilation).
    pub pre_existing: bool,
    /// Set once any identifier resolves to this symbol.
    pub used: bool,
    /// Lambda signature when this symbol holds a lambda value. Lambda
    /// bindings are write-once.
    pub lambda: Option<LambdaSig>,
}

impl VarInfo {
    /// A freshly declared (non-carried-over) symbol. The slot index is a
    /// placeholder until resolution finalizes.
    pub fn declared(name: &str, rename: String, kind: VarKind) -> Self {
        Self {
            name: name.to_owned(),
            rename,
            index: 0,
            kind,
            ty: Ty::var_of(kind),
            pre_existing: false,
            used: false,
            lambda: None,
        }
    }

    /// A symbol seeded from the target script's existing variable table.
    pub fn pre_existing(name: &str, kind: VarKind, index: u32) -> Self {
        Self {
            name: name.to_owned(),
            rename: name.to_owned(),
            index,
            kind,
            ty: Ty::var_of(kind),
            pre_existing: true,
            used: false,
            lambda: None,
        }
    }

    /// Wrap into the shared handle form the AST stores.
    pub fn into_ref(self) -> VarRef {
        Rc::new(RefCell::new(self))
    }
}

/// Parameter and return types of a lambda-holding symbol, captured at
/// resolution and refined by the type checker.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaSig {
    pub params: Vec<Ty>,
    pub ret: Ty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_symbol_defaults() {
        let v = VarInfo::declared("count", "count".into(), VarKind::Int);
        assert_eq!(v.ty, Ty::NumberVar);
        assert!(!v.pre_existing);
        assert!(!v.used);
        assert_eq!(v.index, 0);
    }

    #[test]
    fn pre_existing_keeps_slot() {
        let v = VarInfo::pre_existing("hp", VarKind::Double, 3);
        assert!(v.pre_existing);
        assert_eq!(v.index, 3);
        assert_eq!(v.rename, "hp");
    }
}
