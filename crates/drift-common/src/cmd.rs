use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::fold;
use crate::ty::Ty;

/// Names of commands the compiler itself emits calls to during lowering.
pub mod intrinsics {
    /// Generic call opcode for arbitrary callees (lambdas, UDF forms).
    pub const CALL: &str = "Call";
    pub const CALL_AFTER_SECONDS: &str = "CallAfterSeconds";
    pub const CALL_AFTER_FRAMES: &str = "CallAfterFrames";
    pub const CALL_FOR_SECONDS: &str = "CallForSeconds";
    /// Process-wide named-slot store used to intern lambda values.
    pub const SET_MOD_LOCAL_DATA: &str = "SetModLocalData";
    pub const GET_MOD_LOCAL_DATA: &str = "GetModLocalData";
    /// Return-value carrier inside function bodies.
    pub const SET_FUNCTION_VALUE: &str = "SetFunctionValue";
    /// Vanilla message statement, encoded with the default convention.
    pub const SHOW_MESSAGE: &str = "ShowMessage";
}

/// Identity the compiler records for itself in every script's plugin
/// requirements.
pub const COMPILER_IDENTITY: &str = "drift";

/// Declared kind of one command parameter.
///
/// A closed enumeration: value kinds, form-category kinds (each paired with
/// a predicate on the resolved form, see [`crate::form::FormKind`]), and
/// enum kinds whose arguments may be written as bare named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    // ── Value kinds ────────────────────────────────────────────────────
    Number,
    Integer,
    Float,
    String,
    Array,
    Pair,
    /// Anything; the runtime sorts it out.
    Any,
    /// A lambda-typed variable or a user-defined-function form.
    Callable,

    // ── Form-category kinds ────────────────────────────────────────────
    AnyForm,
    ObjectRef,
    Actor,
    Container,
    Item,
    Quest,
    Spell,
    Global,
    ScriptForm,

    // ── Enum kinds (bare named constants accepted) ─────────────────────
    ActorValue,
    Axis,
    AnimationGroup,
    Sex,
    CrimeType,
    FormType,
    Alignment,
    EquipType,
    CriticalStage,
}

impl ParamKind {
    /// Whether bare identifiers in this position are first tried as named
    /// enum constants.
    pub fn is_enum(self) -> bool {
        matches!(
            self,
            ParamKind::ActorValue
                | ParamKind::Axis
                | ParamKind::AnimationGroup
                | ParamKind::Sex
                | ParamKind::CrimeType
                | ParamKind::FormType
                | ParamKind::Alignment
                | ParamKind::EquipType
                | ParamKind::CriticalStage
        )
    }

    /// Whether this kind expects a form-valued argument.
    pub fn is_form(self) -> bool {
        matches!(
            self,
            ParamKind::AnyForm
                | ParamKind::ObjectRef
                | ParamKind::Actor
                | ParamKind::Container
                | ParamKind::Item
                | ParamKind::Quest
                | ParamKind::Spell
                | ParamKind::Global
                | ParamKind::ScriptForm
        )
    }

    /// Whether a checked expression type is acceptable in this position.
    /// Form-category narrowing happens separately, against the resolved
    /// form itself.
    pub fn accepts(self, ty: Ty) -> bool {
        let ty = ty.basic();
        if ty == Ty::Ambiguous {
            return true;
        }
        match self {
            ParamKind::Number | ParamKind::Integer | ParamKind::Float => {
                matches!(ty, Ty::Number | Ty::Boolean)
            }
            ParamKind::String => ty == Ty::String,
            ParamKind::Array => ty == Ty::Array,
            ParamKind::Pair => ty == Ty::Pair,
            ParamKind::Any => true,
            ParamKind::Callable => matches!(ty, Ty::Lambda | Ty::Form),
            // Enum kinds end up as plain numbers once a named constant has
            // been resolved.
            k if k.is_enum() => ty == Ty::Number,
            // Form kinds.
            _ => ty == Ty::Form,
        }
    }

    /// Spelling used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::String => "string",
            ParamKind::Array => "array",
            ParamKind::Pair => "pair",
            ParamKind::Any => "any value",
            ParamKind::Callable => "callable",
            ParamKind::AnyForm => "form",
            ParamKind::ObjectRef => "object reference",
            ParamKind::Actor => "actor",
            ParamKind::Container => "container",
            ParamKind::Item => "item",
            ParamKind::Quest => "quest",
            ParamKind::Spell => "spell",
            ParamKind::Global => "global",
            ParamKind::ScriptForm => "script",
            ParamKind::ActorValue => "actor value",
            ParamKind::Axis => "axis",
            ParamKind::AnimationGroup => "animation group",
            ParamKind::Sex => "sex",
            ParamKind::CrimeType => "crime type",
            ParamKind::FormType => "form type",
            ParamKind::Alignment => "alignment",
            ParamKind::EquipType => "equip type",
            ParamKind::CriticalStage => "critical stage",
        }
    }
}

/// Declared return kind of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetKind {
    Number,
    String,
    Array,
    Form,
    /// The command returns something the table cannot express precisely.
    Ambiguous,
    /// The command returns nothing useful.
    Nothing,
}

impl RetKind {
    pub fn ty(self) -> Ty {
        match self {
            RetKind::Number => Ty::Number,
            RetKind::String => Ty::String,
            RetKind::Array => Ty::Array,
            RetKind::Form => Ty::Form,
            RetKind::Ambiguous | RetKind::Nothing => Ty::Ambiguous,
        }
    }
}

/// How the runtime parses this command's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseConvention {
    /// Legacy convention: each compiled argument carries the expression
    /// evaluator entry tag and its own length field.
    Default,
    /// Extender convention: arguments are plain length-prefixed expression
    /// streams.
    Extended,
}

/// One positional parameter of a command signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSig {
    pub name: String,
    pub kind: ParamKind,
    pub optional: bool,
}

impl ParamSig {
    pub fn required(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            optional: false,
        }
    }

    pub fn optional(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            optional: true,
        }
    }
}

/// A command signature: the unit of the external symbol table the compiler
/// consumes. Owning-extension identity feeds the compiled script's plugin
/// requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSig {
    pub name: String,
    pub opcode: u16,
    pub params: Vec<ParamSig>,
    pub ret: RetKind,
    pub convention: ParseConvention,
    pub origin: String,
}

impl CommandSig {
    /// Number of leading non-optional parameters.
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }
}

/// Flat name-indexed table of command signatures. Lookup is
/// case-insensitive.
#[derive(Debug, Default, Clone)]
pub struct CommandTable {
    by_name: FxHashMap<String, Arc<CommandSig>>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sig: CommandSig) {
        self.by_name.insert(fold(&sig.name), Arc::new(sig));
    }

    pub fn get(&self, name: &str) -> Option<Arc<CommandSig>> {
        self.by_name.get(&fold(name)).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Merge externally supplied signatures (e.g. from a JSON table) into
    /// this table, replacing same-name entries.
    pub fn extend(&mut self, sigs: impl IntoIterator<Item = CommandSig>) {
        for sig in sigs {
            self.insert(sig);
        }
    }

    /// The built-in table: the intrinsics the lowering passes emit calls to,
    /// plus a representative set of engine and extender commands.
    pub fn core() -> Self {
        use ParamKind as P;
        use ParseConvention::{Default, Extended};
        use RetKind as R;

        let mut table = CommandTable::new();

        let call_args = |lead: Vec<ParamSig>| {
            let mut params = lead;
            params.push(ParamSig::required("callee", P::Callable));
            for i in 0..10 {
                params.push(ParamSig::optional(&format!("arg{i}"), P::Any));
            }
            params
        };

        // ── Compiler intrinsics ────────────────────────────────────────
        table.insert(CommandSig {
            name: intrinsics::CALL.into(),
            opcode: 0x1480,
            params: call_args(vec![]),
            ret: R::Ambiguous,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });
        table.insert(CommandSig {
            name: intrinsics::CALL_AFTER_SECONDS.into(),
            opcode: 0x1481,
            params: call_args(vec![ParamSig::required("seconds", P::Number)]),
            ret: R::Ambiguous,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });
        table.insert(CommandSig {
            name: intrinsics::CALL_AFTER_FRAMES.into(),
            opcode: 0x1482,
            params: call_args(vec![ParamSig::required("frames", P::Number)]),
            ret: R::Ambiguous,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });
        table.insert(CommandSig {
            name: intrinsics::CALL_FOR_SECONDS.into(),
            opcode: 0x1483,
            params: call_args(vec![ParamSig::required("seconds", P::Number)]),
            ret: R::Ambiguous,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });
        table.insert(CommandSig {
            name: intrinsics::SET_MOD_LOCAL_DATA.into(),
            opcode: 0x1484,
            params: vec![
                ParamSig::required("key", P::String),
                ParamSig::required("value", P::Any),
            ],
            ret: R::Nothing,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });
        table.insert(CommandSig {
            name: intrinsics::GET_MOD_LOCAL_DATA.into(),
            opcode: 0x1485,
            params: vec![ParamSig::required("key", P::String)],
            ret: R::Ambiguous,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });
        table.insert(CommandSig {
            name: intrinsics::SET_FUNCTION_VALUE.into(),
            opcode: 0x1486,
            params: vec![ParamSig::required("value", P::Any)],
            ret: R::Nothing,
            convention: Extended,
            origin: COMPILER_IDENTITY.into(),
        });

        // ── Vanilla engine commands (default convention) ───────────────
        table.insert(CommandSig {
            name: intrinsics::SHOW_MESSAGE.into(),
            opcode: 0x1000,
            params: vec![
                ParamSig::required("message", P::String),
                ParamSig::optional("button1", P::String),
                ParamSig::optional("button2", P::String),
                ParamSig::optional("button3", P::String),
                ParamSig::optional("button4", P::String),
            ],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "GetDead".into(),
            opcode: 0x102E,
            params: vec![],
            ret: R::Number,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "GetAV".into(),
            opcode: 0x100E,
            params: vec![ParamSig::required("actorValue", P::ActorValue)],
            ret: R::Number,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "ForceAV".into(),
            opcode: 0x100F,
            params: vec![
                ParamSig::required("actorValue", P::ActorValue),
                ParamSig::required("amount", P::Number),
            ],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "AddItem".into(),
            opcode: 0x1002,
            params: vec![
                ParamSig::required("item", P::Item),
                ParamSig::required("count", P::Integer),
            ],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "PlaceAtMe".into(),
            opcode: 0x1025,
            params: vec![
                ParamSig::required("form", P::AnyForm),
                ParamSig::optional("count", P::Integer),
            ],
            ret: R::Form,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "GetStage".into(),
            opcode: 0x103A,
            params: vec![ParamSig::required("quest", P::Quest)],
            ret: R::Number,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "SetStage".into(),
            opcode: 0x1039,
            params: vec![
                ParamSig::required("quest", P::Quest),
                ParamSig::required("stage", P::Integer),
            ],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "Rotate".into(),
            opcode: 0x1031,
            params: vec![
                ParamSig::required("axis", P::Axis),
                ParamSig::required("degreesPerSec", P::Number),
            ],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "PlayGroup".into(),
            opcode: 0x1013,
            params: vec![
                ParamSig::required("animGroup", P::AnimationGroup),
                ParamSig::required("initFlag", P::Integer),
            ],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "GetIsSex".into(),
            opcode: 0x1045,
            params: vec![ParamSig::required("sex", P::Sex)],
            ret: R::Number,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "SetCriticalStage".into(),
            opcode: 0x1118,
            params: vec![ParamSig::required("stage", P::CriticalStage)],
            ret: R::Nothing,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "GetIsUsedItemType".into(),
            opcode: 0x1119,
            params: vec![ParamSig::required("formType", P::FormType)],
            ret: R::Number,
            convention: Default,
            origin: "base".into(),
        });
        table.insert(CommandSig {
            name: "GetSecondsPassed".into(),
            opcode: 0x101A,
            params: vec![],
            ret: R::Number,
            convention: Default,
            origin: "base".into(),
        });

        // ── Extender commands (extended convention) ────────────────────
        table.insert(CommandSig {
            name: "ar_Size".into(),
            opcode: 0x1560,
            params: vec![ParamSig::required("array", P::Array)],
            ret: R::Number,
            convention: Extended,
            origin: "nvse".into(),
        });
        table.insert(CommandSig {
            name: "ar_Append".into(),
            opcode: 0x1561,
            params: vec![
                ParamSig::required("array", P::Array),
                ParamSig::required("value", P::Any),
            ],
            ret: R::Nothing,
            convention: Extended,
            origin: "nvse".into(),
        });
        table.insert(CommandSig {
            name: "sv_Length".into(),
            opcode: 0x1562,
            params: vec![ParamSig::required("string", P::String)],
            ret: R::Number,
            convention: Extended,
            origin: "nvse".into(),
        });

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let table = CommandTable::core();
        assert!(table.get("getav").is_some());
        assert!(table.get("GETAV").is_some());
        assert!(table.get("NoSuchCommand").is_none());
    }

    #[test]
    fn core_has_all_intrinsics() {
        let table = CommandTable::core();
        for name in [
            intrinsics::CALL,
            intrinsics::CALL_AFTER_SECONDS,
            intrinsics::CALL_AFTER_FRAMES,
            intrinsics::CALL_FOR_SECONDS,
            intrinsics::SET_MOD_LOCAL_DATA,
            intrinsics::GET_MOD_LOCAL_DATA,
            intrinsics::SET_FUNCTION_VALUE,
            intrinsics::SHOW_MESSAGE,
        ] {
            assert!(table.get(name).is_some(), "missing intrinsic {name}");
        }
    }

    #[test]
    fn required_count_ignores_optionals() {
        let table = CommandTable::core();
        let place = table.get("PlaceAtMe").unwrap();
        assert_eq!(place.params.len(), 2);
        assert_eq!(place.required_count(), 1);
    }

    #[test]
    fn param_kind_accepts_basics() {
        assert!(ParamKind::Number.accepts(Ty::Number));
        assert!(ParamKind::Number.accepts(Ty::NumberVar));
        assert!(ParamKind::Number.accepts(Ty::Ambiguous));
        assert!(!ParamKind::Number.accepts(Ty::String));
        assert!(ParamKind::Quest.accepts(Ty::Form));
        assert!(ParamKind::Quest.accepts(Ty::RefVar));
        assert!(!ParamKind::Quest.accepts(Ty::Number));
        assert!(ParamKind::Callable.accepts(Ty::Lambda));
    }

    #[test]
    fn extend_replaces_entries() {
        let mut table = CommandTable::core();
        let before = table.get("GetDead").unwrap().opcode;
        table.extend([CommandSig {
            name: "GetDead".into(),
            opcode: 0x2000,
            params: vec![],
            ret: RetKind::Number,
            convention: ParseConvention::Default,
            origin: "patch".into(),
        }]);
        assert_ne!(table.get("GetDead").unwrap().opcode, before);
    }

    #[test]
    fn signatures_round_trip_through_json() {
        let sig = CommandSig {
            name: "TestCmd".into(),
            opcode: 0x2001,
            params: vec![ParamSig::optional("x", ParamKind::ActorValue)],
            ret: RetKind::Ambiguous,
            convention: ParseConvention::Extended,
            origin: "test-plugin".into(),
        };
        let json = serde_json::to_string(&sig).unwrap();
        let back: CommandSig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
