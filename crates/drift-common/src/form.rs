use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cmd::ParamKind;
use crate::fold;
use crate::script::VarKind;

/// Kind of a data-defined form, as coarse as the compiler needs: enough to
/// run the per-parameter form-category predicates and to distinguish
/// globals (which read as numbers and encode with `'G'`) from everything
/// else (`'R'`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Reference,
    Actor,
    Creature,
    Container,
    Door,
    Item,
    Weapon,
    Armor,
    Quest,
    Spell,
    Global,
    /// A standalone script form (user-defined function target).
    Script,
}

impl FormKind {
    /// The form-category predicate: whether a form of this kind satisfies a
    /// parameter's declared kind.
    pub fn matches_param(self, kind: ParamKind) -> bool {
        match kind {
            ParamKind::AnyForm => true,
            ParamKind::ObjectRef => !matches!(self, FormKind::Global | FormKind::Script),
            ParamKind::Actor => matches!(self, FormKind::Actor | FormKind::Creature),
            ParamKind::Container => {
                matches!(self, FormKind::Container | FormKind::Actor | FormKind::Creature)
            }
            ParamKind::Item => matches!(self, FormKind::Item | FormKind::Weapon | FormKind::Armor),
            ParamKind::Quest => self == FormKind::Quest,
            ParamKind::Spell => self == FormKind::Spell,
            ParamKind::Global => self == FormKind::Global,
            ParamKind::ScriptForm | ParamKind::Callable => self == FormKind::Script,
            // Non-form parameter kinds never match a form category.
            _ => false,
        }
    }

    /// Whether member access (`form.variable`) can target this kind.
    /// Globals are scalar values, not scripted objects.
    pub fn supports_members(self) -> bool {
        self != FormKind::Global
    }
}

/// One variable of a scripted form's own persistent variable table, used to
/// resolve `form.variable` member accesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVar {
    pub name: String,
    pub kind: VarKind,
    pub index: u32,
}

/// A data-defined form the compiler can resolve bare identifiers against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInfo {
    /// Editor id, the name scripts refer to the form by.
    pub edid: String,
    pub form_id: u32,
    pub kind: FormKind,
    /// Persistent variables of the form's attached script, if any.
    #[serde(default)]
    pub script_vars: Vec<RemoteVar>,
}

impl FormInfo {
    /// Look up a member variable by name (case-insensitive).
    pub fn member(&self, name: &str) -> Option<&RemoteVar> {
        let folded = fold(name);
        self.script_vars.iter().find(|v| fold(&v.name) == folded)
    }
}

/// Form lookup the compiler consumes from its host.
///
/// `by_id` exists for runtime collaborators that share the table; the
/// compiler itself only resolves by name.
pub trait FormResolver {
    fn by_name(&self, name: &str) -> Option<Arc<FormInfo>>;
    fn by_id(&self, id: u32) -> Option<Arc<FormInfo>>;
}

/// Map-backed [`FormResolver`], used by the CLI (loaded from JSON) and by
/// tests.
#[derive(Debug, Default, Clone)]
pub struct FormMap {
    by_name: FxHashMap<String, Arc<FormInfo>>,
    by_id: FxHashMap<u32, Arc<FormInfo>>,
}

impl FormMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, form: FormInfo) {
        let form = Arc::new(form);
        self.by_name.insert(fold(&form.edid), form.clone());
        self.by_id.insert(form.form_id, form);
    }

    pub fn extend(&mut self, forms: impl IntoIterator<Item = FormInfo>) {
        for form in forms {
            self.insert(form);
        }
    }
}

impl FormResolver for FormMap {
    fn by_name(&self, name: &str) -> Option<Arc<FormInfo>> {
        self.by_name.get(&fold(name)).cloned()
    }

    fn by_id(&self, id: u32) -> Option<Arc<FormInfo>> {
        self.by_id.get(&id).cloned()
    }
}
