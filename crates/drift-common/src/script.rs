use serde::{Deserialize, Serialize};

/// Declared kind of a script variable. This is what the engine's variable
/// table records; the finer structural [`crate::ty::Ty`] lattice only exists
/// during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Int,
    Double,
    Ref,
    String,
    Array,
}

impl VarKind {
    /// Engine encoding of the variable kind, used by the `'V'` operand tag.
    pub fn code(self) -> u8 {
        match self {
            VarKind::Double => 0,
            VarKind::Int => 1,
            VarKind::Ref => 2,
            VarKind::String => 3,
            VarKind::Array => 4,
        }
    }

    /// Keyword spelling, used in diagnostics.
    pub fn keyword(self) -> &'static str {
        match self {
            VarKind::Int => "int",
            VarKind::Double => "double",
            VarKind::Ref => "ref",
            VarKind::String => "string",
            VarKind::Array => "array",
        }
    }
}

/// Engine code for an event-block type, or `None` for an unknown type.
///
/// Code 1 is the function-body framing used for user-defined functions and
/// embedded lambda sub-scripts; it has no source-level `begin` spelling.
pub fn block_type_code(name: &str) -> Option<u16> {
    let code = match crate::fold(name).as_str() {
        "gamemode" => 0,
        "menumode" => 2,
        "onactivate" => 3,
        "onadd" => 4,
        "ondrop" => 5,
        "onequip" => 6,
        "onunequip" => 7,
        "ondeath" => 8,
        "onhit" => 9,
        "onhitwith" => 10,
        "oncombatend" => 11,
        "ontriggerenter" => 12,
        "ontriggerleave" => 13,
        "onreset" => 14,
        _ => return None,
    };
    Some(code)
}

/// Block-type code for function bodies (UDFs and lambdas).
pub const FUNCTION_BLOCK_CODE: u16 = 1;

/// One entry of a script's variable table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptVar {
    pub name: String,
    pub kind: VarKind,
    /// 1-based slot index. Slots are stable across incremental recompiles
    /// for persistent variables; temporaries are renumbered every compile.
    pub index: u32,
}

/// One entry of a script's reference table: a distinct external form or
/// global referenced by name, in first-use order. `'R'`/`'G'` operands index
/// into this table, 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefEntry {
    pub name: String,
    pub form_id: u32,
    pub is_global: bool,
}

/// The mutable target script record handed to the compiler.
///
/// On success the compiler fills in the bytecode buffer, the variable and
/// reference tables, the editor id (unless compiling a fragment unit), the
/// plugin requirements, and the summary counters. On failure the record is
/// left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Script {
    /// The script's own declared name. Not set for fragment units.
    pub editor_id: Option<String>,
    pub bytecode: Vec<u8>,
    /// Full variable table: persistent variables first (slots `1..=n`),
    /// then this compile's temporaries.
    pub vars: Vec<ScriptVar>,
    /// How many leading entries of `vars` are persistent.
    pub persistent_count: u32,
    pub refs: Vec<RefEntry>,
    /// Plugin identities this script requires at load time: the compiler's
    /// own plus the owning extension of every command invoked.
    pub requirements: Vec<String>,
    pub var_count: u32,
    pub ref_count: u32,
    pub unused_var_count: u32,
    pub compiled_len: u32,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// The persistent variables carried over into the next compile of this
    /// script (the "pre-existing" table for incremental recompilation).
    pub fn persistent_vars(&self) -> &[ScriptVar] {
        &self.vars[..self.persistent_count as usize]
    }
}
