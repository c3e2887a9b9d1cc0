//! Ariadne-based diagnostic rendering for type errors and the other
//! collected error families. Output is colorless when requested so tests
//! can pin exact text.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use drift_common::span::Span;

use crate::error::TypeError;

/// Rendering options shared by the CLI.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    pub color: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Assign a stable error code to each variant.
fn error_code(error: &TypeError) -> &'static str {
    use TypeError::*;
    match error {
        OperatorType { .. } => "E0001",
        UnresolvedIdentifier { .. } => "E0002",
        UnknownCommand { .. } => "E0003",
        ArityMismatch { .. } => "E0004",
        ArgType { .. } => "E0005",
        FormCategory { .. } => "E0006",
        DotReceiver { .. } | ReceiverNotSimple { .. } => "E0007",
        AssignToLambda { .. } => "E0008",
        OutsideLoop { .. } => "E0009",
        ReturnTypeMismatch { .. } => "E0010",
        ReturnValueInEventBlock { .. } => "E0011",
        MixedScriptKind { .. } | MultipleFunctions { .. } => "E0012",
        DuplicateBlock { .. } => "E0013",
        UnknownBlockType { .. } => "E0014",
        UnknownForm { .. } => "E0015",
        MemberNotScripted { .. } | NoMemberVariable { .. } | InvalidMemberBase { .. } => "E0016",
        MapElement { .. } => "E0017",
        DeclInit { .. } => "E0018",
        ConditionType { .. } => "E0019",
        IterableType { .. } => "E0020",
        LambdaArity { .. } | LambdaArgType { .. } => "E0021",
        MembershipElement { .. } => "E0022",
    }
}

fn to_range(span: Span, source_len: usize) -> Range<usize> {
    let start = (span.start as usize).min(source_len);
    let end = (span.end as usize).clamp(start, source_len);
    if start == end {
        start..(start + 1).min(source_len).max(start)
    } else {
        start..end
    }
}

/// Render one type error as a labeled source report.
pub fn render_diagnostic(error: &TypeError, source: &str, options: &DiagnosticOptions) -> String {
    let config = Config::default().with_color(options.color);
    let range = to_range(error.span(), source.len());

    let mut builder = Report::build(ReportKind::Error, range.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config);

    builder.add_label(
        Label::new(range)
            .with_message(primary_label(error))
            .with_color(Color::Red),
    );

    // A second label pointing at the earlier return site makes the
    // mismatch legible.
    if let TypeError::ReturnTypeMismatch {
        expected, earlier, ..
    } = error
    {
        builder.add_label(
            Label::new(to_range(*earlier, source.len()))
                .with_message(format!("return type `{expected}` established here"))
                .with_color(Color::Blue),
        );
    }

    if let Some(help) = help_text(error) {
        builder.set_help(help);
    }

    let mut buffer = Vec::new();
    builder
        .finish()
        .write(Source::from(source), &mut buffer)
        .expect("diagnostic rendering cannot fail on an in-memory buffer");
    String::from_utf8(buffer).expect("ariadne output is UTF-8")
}

fn primary_label(error: &TypeError) -> String {
    use TypeError::*;
    match error {
        OperatorType { lhs, rhs, .. } => match rhs {
            Some(rhs) => format!("`{lhs}` and `{rhs}` here"),
            None => format!("`{lhs}` here"),
        },
        UnresolvedIdentifier { .. } => "not a variable, form, or global".to_owned(),
        UnknownCommand { .. } => "not in the command table".to_owned(),
        ArityMismatch { found, .. } => format!("{found} argument(s) supplied"),
        ArgType { found, .. } => format!("this argument is `{found}`"),
        FormCategory { form, .. } => format!("`{form}` resolved here"),
        DotReceiver { ty, .. } => format!("receiver has type `{ty}`"),
        ReceiverNotSimple { .. } => "this receiver".to_owned(),
        AssignToLambda { .. } => "lambda bindings are write-once".to_owned(),
        OutsideLoop { .. } => "no enclosing loop".to_owned(),
        ReturnTypeMismatch { found, .. } => format!("this returns `{found}`"),
        ReturnValueInEventBlock { .. } => "value returned here".to_owned(),
        MixedScriptKind { .. } => "function declared here".to_owned(),
        MultipleFunctions { .. } => "second function declared here".to_owned(),
        DuplicateBlock { .. } => "already declared above".to_owned(),
        UnknownBlockType { .. } => "not an event block type".to_owned(),
        UnknownForm { .. } => "no form with this editor id".to_owned(),
        MemberNotScripted { .. } => "form has no script".to_owned(),
        NoMemberVariable { member, .. } => format!("no variable `{member}`"),
        InvalidMemberBase { .. } => "not an object form".to_owned(),
        MapElement { .. } => "expected `key::value`".to_owned(),
        DeclInit { found, .. } => format!("initializer is `{found}`"),
        ConditionType { found, .. } => format!("condition is `{found}`"),
        IterableType { found, .. } => format!("iterable is `{found}`"),
        LambdaArity { found, .. } => format!("{found} argument(s) supplied"),
        LambdaArgType { found, .. } => format!("this argument is `{found}`"),
        MembershipElement { element, .. } => format!("element is `{element}`"),
    }
}

fn help_text(error: &TypeError) -> Option<String> {
    use TypeError::*;
    match error {
        OperatorType { op: "+", lhs, rhs, .. }
            if *lhs == drift_common::ty::Ty::String
                || *rhs == Some(drift_common::ty::Ty::String) =>
        {
            Some("`+` concatenates strings only when both sides are strings; use `$` to stringify".to_owned())
        }
        UnresolvedIdentifier { .. } => {
            Some("declare the variable, or check the form's editor id".to_owned())
        }
        OutsideLoop { keyword, .. } => {
            Some(format!("`{keyword}` is only valid inside `while`, `for`, or foreach bodies"))
        }
        MixedScriptKind { .. } => {
            Some("move the function into its own script".to_owned())
        }
        MapElement { .. } => Some("write `{k1::v1, k2::v2}`".to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_common::ty::Ty;

    #[test]
    fn renders_span_and_code() {
        let source = "name t; int x; x = \"text\" + x;";
        let error = TypeError::OperatorType {
            op: "+",
            lhs: Ty::String,
            rhs: Some(Ty::Number),
            span: Span::new(19, 29),
        };
        let rendered = render_diagnostic(&error, source, &DiagnosticOptions { color: false });
        assert!(rendered.contains("E0001"), "{rendered}");
        assert!(rendered.contains("operator `+`"), "{rendered}");
        assert!(rendered.contains("String"), "{rendered}");
    }

    #[test]
    fn return_mismatch_gets_two_labels() {
        let source = "name t; fn f(int a) { return 1; return \"x\"; }";
        let error = TypeError::ReturnTypeMismatch {
            expected: Ty::Number,
            found: Ty::String,
            earlier: Span::new(22, 31),
            span: Span::new(32, 44),
        };
        let rendered = render_diagnostic(&error, source, &DiagnosticOptions { color: false });
        assert!(rendered.contains("established here"), "{rendered}");
    }
}
