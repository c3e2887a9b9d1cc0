//! Drift bytecode backend and pipeline driver.
//!
//! [`compile`] runs the fixed pass sequence over one source unit:
//!
//! 1. lex + parse (lexical errors are fatal; syntax errors collect)
//! 2. match lowering
//! 3. variable resolution (seeded with the target script's existing
//!    variable table for incremental recompilation)
//! 4. call lowering
//! 5. type checking
//! 6. loop lowering, lambda lowering
//! 7. byte emission
//!
//! The driver stops immediately after any stage that reports errors, so no
//! pass ever receives a tree an earlier pass flagged as broken; a single
//! stage may still have accumulated several independent errors. On success
//! the target [`Script`] record receives the bytecode, the rebuilt
//! variable and reference tables, the editor id (unless compiling a
//! fragment unit), the plugin requirements, and the summary counters.

pub mod emit;
pub mod gen;

use std::fmt;

use drift_common::cmd::CommandTable;
use drift_common::error::LexError;
use drift_common::form::FormResolver;
use drift_common::script::Script;
use drift_parser::ParseError;
use drift_passes::{Notice, PassError};
use drift_typeck::TypeError;

pub use gen::{generate, CodegenError, GenOutput};

/// Per-invocation compile options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Fragment units (dialogue results and the like) get no editor id.
    pub fragment: bool,
}

/// Which stage failed, with everything that stage collected.
#[derive(Debug)]
pub enum CompileFailure {
    Lex(LexError),
    Parse(Vec<ParseError>),
    Resolve(Vec<PassError>),
    Type(Vec<TypeError>),
    Codegen(CodegenError),
}

impl CompileFailure {
    pub fn stage(&self) -> &'static str {
        match self {
            CompileFailure::Lex(_) => "lex",
            CompileFailure::Parse(_) => "parse",
            CompileFailure::Resolve(_) => "resolve",
            CompileFailure::Type(_) => "typecheck",
            CompileFailure::Codegen(_) => "codegen",
        }
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileFailure::Lex(error) => write!(f, "lexical error: {error}"),
            CompileFailure::Parse(errors) => {
                write!(f, "{} syntax error(s)", errors.len())
            }
            CompileFailure::Resolve(errors) => {
                write!(f, "{} resolution error(s)", errors.len())
            }
            CompileFailure::Type(errors) => write!(f, "{} type error(s)", errors.len()),
            CompileFailure::Codegen(error) => write!(f, "code generation failed: {error}"),
        }
    }
}

impl std::error::Error for CompileFailure {}

/// What a successful compilation reports besides the script record itself.
#[derive(Debug, Default)]
pub struct CompileSummary {
    pub notices: Vec<Notice>,
    pub requirements: Vec<String>,
    pub var_count: u32,
    pub ref_count: u32,
    pub unused_var_count: u32,
    pub compiled_len: u32,
}

/// Compile one source unit into the target script record.
///
/// The record is only mutated on success; any failure leaves it untouched
/// (including its carried-over variable table, which seeds resolution).
pub fn compile(
    source: &str,
    table: &CommandTable,
    forms: &dyn FormResolver,
    options: &CompileOptions,
    script: &mut Script,
) -> Result<CompileSummary, CompileFailure> {
    let parse = drift_parser::parse(source).map_err(CompileFailure::Lex)?;
    if !parse.ok() {
        return Err(CompileFailure::Parse(parse.errors().to_vec()));
    }
    let mut unit = parse.unit;

    drift_passes::match_lower::run(&mut unit);

    let resolved = drift_passes::resolve::run(&mut unit, script.persistent_vars(), forms);
    if !resolved.ok() {
        return Err(CompileFailure::Resolve(resolved.errors));
    }

    drift_passes::call_lower::run(&mut unit, table, forms);

    let checked = drift_typeck::check(&mut unit, table, forms);
    if !checked.ok() {
        return Err(CompileFailure::Type(checked.errors));
    }

    drift_passes::loop_lower::run(&mut unit);
    drift_passes::lambda_lower::run(&mut unit, table);

    let output = gen::generate(&unit, table, forms).map_err(CompileFailure::Codegen)?;

    // All stages passed; hand everything to the target record.
    let unused = resolved
        .globals
        .iter()
        .filter(|var| !var.borrow().used)
        .count() as u32;
    script.editor_id = (!options.fragment).then(|| unit.name.clone());
    script.vars = resolved.var_table();
    script.persistent_count = resolved.globals.len() as u32;
    script.bytecode = output.bytecode;
    script.refs = output.refs;
    script.requirements = checked.requirements.clone();
    script.var_count = script.vars.len() as u32;
    script.ref_count = script.refs.len() as u32;
    script.unused_var_count = unused;
    script.compiled_len = script.bytecode.len() as u32;

    Ok(CompileSummary {
        notices: resolved.notices,
        requirements: checked.requirements,
        var_count: script.var_count,
        ref_count: script.ref_count,
        unused_var_count: script.unused_var_count,
        compiled_len: script.compiled_len,
    })
}
