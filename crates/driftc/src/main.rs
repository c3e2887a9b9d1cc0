//! The Drift compiler CLI.
//!
//! Provides the `driftc` command with the following subcommands:
//!
//! - `driftc build <file>` - Compile a Drift script to engine bytecode
//! - `driftc ast <file>` - Parse a script and print its syntax tree
//!
//! Options for `build`:
//! - `--table` - Extend the built-in command table from a JSON file
//! - `--forms` - Load a form map (editor ids, form ids, kinds) from JSON
//! - `--output` - Write the compiled bytecode to a file
//! - `--fragment` - Compile as a fragment unit (no editor id)
//! - `--dump` - Hex-dump the compiled bytecode to stdout
//! - `--json` - Output diagnostics as JSON (one object per line)
//! - `--no-color` - Disable colorized output

use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};

use drift_codegen::{compile, CompileFailure, CompileOptions};
use drift_common::cmd::{CommandSig, CommandTable};
use drift_common::form::{FormInfo, FormMap};
use drift_common::script::Script;
use drift_common::span::Span;
use drift_typeck::diagnostics::{render_diagnostic, DiagnosticOptions};

#[derive(Parser)]
#[command(name = "driftc", version, about = "The Drift script compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Drift script to engine bytecode
    Build {
        /// Path to the script source file
        file: PathBuf,

        /// Extend the built-in command table from a JSON signature list
        #[arg(long)]
        table: Option<PathBuf>,

        /// Load a form map from a JSON form list
        #[arg(long)]
        forms: Option<PathBuf>,

        /// Write the compiled bytecode to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compile as a fragment unit (no editor id is assigned)
        #[arg(long)]
        fragment: bool,

        /// Hex-dump the compiled bytecode to stdout
        #[arg(long)]
        dump: bool,

        /// Output diagnostics as JSON (one object per line)
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
    /// Parse a script and print its syntax tree
    Ast {
        /// Path to the script source file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            file,
            table,
            forms,
            output,
            fragment,
            dump,
            json,
            no_color,
        } => build(
            &file,
            table.as_deref(),
            forms.as_deref(),
            output.as_deref(),
            fragment,
            dump,
            json,
            no_color,
        ),
        Commands::Ast { file } => print_ast(&file),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn build(
    file: &Path,
    table_path: Option<&Path>,
    forms_path: Option<&Path>,
    output: Option<&Path>,
    fragment: bool,
    dump: bool,
    json: bool,
    no_color: bool,
) -> Result<(), String> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read '{}': {e}", file.display()))?;

    let mut table = CommandTable::core();
    if let Some(path) = table_path {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
        let sigs: Vec<CommandSig> = serde_json::from_str(&text)
            .map_err(|e| format!("invalid command table '{}': {e}", path.display()))?;
        table.extend(sigs);
    }

    let mut forms = FormMap::new();
    if let Some(path) = forms_path {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
        let defs: Vec<FormInfo> = serde_json::from_str(&text)
            .map_err(|e| format!("invalid form map '{}': {e}", path.display()))?;
        forms.extend(defs);
    }

    let options = CompileOptions { fragment };
    let mut script = Script::new();
    let color = !no_color && !json;

    match compile(&source, &table, &forms, &options, &mut script) {
        Ok(summary) => {
            for notice in &summary.notices {
                if json {
                    let line = serde_json::json!({
                        "severity": "advice",
                        "message": notice.message,
                        "file": file.display().to_string(),
                        "spans": [{"start": notice.span.start, "end": notice.span.end}],
                    });
                    eprintln!("{line}");
                } else {
                    report_span(
                        ReportKind::Advice,
                        &notice.message,
                        notice.span,
                        &source,
                        color,
                    );
                }
            }

            if let Some(path) = output {
                std::fs::write(path, &script.bytecode)
                    .map_err(|e| format!("failed to write '{}': {e}", path.display()))?;
                eprintln!("  Bytecode: {}", path.display());
            }
            if dump {
                print!("{}", hex_dump(&script.bytecode));
            }
            eprintln!(
                "  Compiled: {} ({} bytes, {} var(s), {} ref(s), {} unused)",
                script.editor_id.as_deref().unwrap_or("<fragment>"),
                summary.compiled_len,
                summary.var_count,
                summary.ref_count,
                summary.unused_var_count,
            );
            if !summary.requirements.is_empty() {
                eprintln!("  Requires: {}", summary.requirements.join(", "));
            }
            Ok(())
        }
        Err(failure) => {
            report_failure(&failure, &source, file, json, color);
            Err("compilation failed due to errors above".to_owned())
        }
    }
}

/// Report every error a failed stage collected.
fn report_failure(failure: &CompileFailure, source: &str, file: &Path, json: bool, color: bool) {
    let file_name = file.display().to_string();
    let emit = |code: &str, message: &str, span: Span| {
        if json {
            let line = serde_json::json!({
                "code": code,
                "severity": "error",
                "message": message,
                "file": file_name,
                "spans": [{"start": span.start, "end": span.end}],
            });
            eprintln!("{line}");
        } else {
            report_span(ReportKind::Error, message, span, source, color);
        }
    };

    match failure {
        CompileFailure::Lex(error) => emit("L0001", &error.to_string(), error.span),
        CompileFailure::Parse(errors) => {
            for error in errors {
                emit("P0001", &error.message, error.span);
            }
        }
        CompileFailure::Resolve(errors) => {
            for error in errors {
                emit("R0001", &error.message, error.span);
            }
        }
        CompileFailure::Type(errors) => {
            for error in errors {
                if json {
                    emit("E0000", &error.to_string(), error.span());
                } else {
                    let rendered =
                        render_diagnostic(error, source, &DiagnosticOptions { color });
                    eprint!("{rendered}");
                }
            }
        }
        CompileFailure::Codegen(error) => {
            eprintln!("error: {error}");
        }
    }
}

/// Render a single labeled span report.
fn report_span(kind: ReportKind, message: &str, span: Span, source: &str, color: bool) {
    let config = Config::default().with_color(color);
    let start = span.start as usize;
    let end = (span.end as usize).max(start + 1).min(source.len().max(start + 1));
    let _ = Report::<std::ops::Range<usize>>::build(kind, start..end)
        .with_message(message)
        .with_config(config)
        .with_label(Label::new(start..end).with_message(message).with_color(Color::Red))
        .finish()
        .eprint(Source::from(source));
}

fn print_ast(file: &Path) -> Result<(), String> {
    let source = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read '{}': {e}", file.display()))?;
    let parse = drift_parser::parse(&source).map_err(|e| format!("lexical error: {e}"))?;
    for error in parse.errors() {
        report_span(ReportKind::Error, &error.message, error.span, &source, true);
    }
    print!("{}", drift_parser::printer::print_unit(&parse.unit));
    if parse.ok() {
        Ok(())
    } else {
        Err("parsing failed due to errors above".to_owned())
    }
}

/// Classic 16-bytes-per-line hex dump with offsets.
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (i, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:08x}  ", i * 16));
        for byte in chunk {
            out.push_str(&format!("{byte:02x} "));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_formats_offsets_and_bytes() {
        let dump = hex_dump(&[0x1D, 0x00, 0x00, 0x00]);
        assert_eq!(dump, "00000000  1d 00 00 00 \n");
    }

    #[test]
    fn hex_dump_wraps_lines() {
        let dump = hex_dump(&[0u8; 20]);
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.lines().nth(1).unwrap().starts_with("00000010"));
    }
}
