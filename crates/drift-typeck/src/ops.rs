//! Operator type algebra: every operator is a total table lookup
//! `(operand types) -> result | Invalid`. Anything not explicitly listed is
//! `Invalid` and surfaces as a reported type error -- never a silent
//! pass-through.

use drift_common::ty::Ty;
use drift_parser::ast::{AssignOp, BinOp, UnOp};

/// Whether a basic type behaves as a number (engine booleans are numbers).
fn numeric(ty: Ty) -> bool {
    matches!(ty, Ty::Number | Ty::Boolean)
}

/// Result type of a binary operator application, or `Invalid`.
pub fn binary_result(op: BinOp, lhs: Ty, rhs: Ty) -> Ty {
    use BinOp::*;
    let (l, r) = (lhs.basic(), rhs.basic());

    // The wildcard type trusts the runtime; comparisons still yield a
    // boolean shape.
    if l == Ty::Ambiguous || r == Ty::Ambiguous {
        return match op {
            Eq | Ne | Lt | Le | Gt | Ge | LogicalAnd | LogicalOr => Ty::Boolean,
            _ => Ty::Ambiguous,
        };
    }

    match op {
        Add => match (l, r) {
            _ if numeric(l) && numeric(r) => Ty::Number,
            (Ty::String, Ty::String) => Ty::String,
            _ => Ty::Invalid,
        },
        Sub | Mul | Div | Mod | Pow | Shl | Shr | BitAnd | BitOr => {
            if numeric(l) && numeric(r) {
                Ty::Number
            } else {
                Ty::Invalid
            }
        }
        Eq | Ne => match (l, r) {
            _ if numeric(l) && numeric(r) => Ty::Boolean,
            (Ty::String, Ty::String) => Ty::Boolean,
            (Ty::Form, Ty::Form) => Ty::Boolean,
            (Ty::Array, Ty::Array) => Ty::Boolean,
            _ => Ty::Invalid,
        },
        Lt | Le | Gt | Ge => match (l, r) {
            _ if numeric(l) && numeric(r) => Ty::Boolean,
            (Ty::String, Ty::String) => Ty::Boolean,
            _ => Ty::Invalid,
        },
        LogicalAnd | LogicalOr => {
            if numeric(l) && numeric(r) {
                Ty::Boolean
            } else {
                Ty::Invalid
            }
        }
    }
}

/// Result type of a prefix unary operator, or `Invalid`. `Inc`/`Dec` are
/// handled separately by the checker because they need the raw
/// variable-flavored operand type.
pub fn unary_result(op: UnOp, operand: Ty) -> Ty {
    use UnOp::*;
    let t = operand.basic();
    if t == Ty::Ambiguous {
        return match op {
            Not => Ty::Boolean,
            ToString => Ty::String,
            _ => Ty::Ambiguous,
        };
    }
    match op {
        Not => {
            if numeric(t) {
                Ty::Boolean
            } else {
                Ty::Invalid
            }
        }
        Neg | BitNot => {
            if numeric(t) {
                Ty::Number
            } else {
                Ty::Invalid
            }
        }
        ToString => match t {
            Ty::Number | Ty::Boolean | Ty::String | Ty::Form | Ty::Array => Ty::String,
            _ => Ty::Invalid,
        },
        ToNumber => match t {
            Ty::Number | Ty::Boolean | Ty::String => Ty::Number,
            _ => Ty::Invalid,
        },
        Box => {
            if t == Ty::Invalid {
                Ty::Invalid
            } else {
                Ty::Array
            }
        }
        Unbox => match t {
            Ty::Array | Ty::Pair => Ty::Ambiguous,
            _ => Ty::Invalid,
        },
        Inc | Dec => Ty::Invalid,
    }
}

/// Result type of an assignment. The left side keeps its raw flavor so the
/// table can insist on an actual variable (or a wildcard slot such as an
/// array element).
pub fn assign_result(op: AssignOp, target: Ty, value: Ty) -> Ty {
    let value = match op.binary() {
        Some(bin) => {
            let combined = binary_result(bin, target, value);
            if combined == Ty::Invalid {
                return Ty::Invalid;
            }
            combined
        }
        None => value.basic(),
    };

    if target == Ty::Ambiguous {
        return Ty::Ambiguous;
    }
    if !target.is_var() {
        return Ty::Invalid;
    }
    if value == Ty::Ambiguous {
        return target.basic();
    }
    let ok = match target.basic() {
        Ty::Number => numeric(value),
        Ty::String => value == Ty::String,
        Ty::Array => value == Ty::Array,
        Ty::Form => value == Ty::Form || value == Ty::Lambda,
        _ => false,
    };
    if ok {
        target.basic()
    } else {
        Ty::Invalid
    }
}

/// Result type of a subscript, or `Invalid`. A pair index slices.
pub fn subscript_result(base: Ty, index: Ty) -> Ty {
    let (b, i) = (base.basic(), index.basic());
    if b == Ty::Ambiguous {
        return Ty::Ambiguous;
    }
    match (b, i) {
        (Ty::Array, _) if numeric(i) || i == Ty::String || i == Ty::Ambiguous => Ty::Ambiguous,
        (Ty::Array, Ty::Pair) => Ty::Array,
        (Ty::String, _) if numeric(i) || i == Ty::Ambiguous => Ty::String,
        (Ty::String, Ty::Pair) => Ty::String,
        _ => Ty::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_on_numbers() {
        assert_eq!(binary_result(BinOp::Add, Ty::Number, Ty::Number), Ty::Number);
        assert_eq!(
            binary_result(BinOp::Add, Ty::NumberVar, Ty::Number),
            Ty::Number
        );
        assert_eq!(binary_result(BinOp::Mul, Ty::Boolean, Ty::Number), Ty::Number);
    }

    #[test]
    fn string_concat_but_not_string_math() {
        assert_eq!(binary_result(BinOp::Add, Ty::String, Ty::String), Ty::String);
        assert_eq!(binary_result(BinOp::Sub, Ty::String, Ty::String), Ty::Invalid);
        assert_eq!(binary_result(BinOp::Add, Ty::String, Ty::Array), Ty::Invalid);
    }

    #[test]
    fn unlisted_pairs_are_invalid_not_silent() {
        for op in [
            BinOp::Add,
            BinOp::Sub,
            BinOp::Shl,
            BinOp::BitAnd,
            BinOp::LogicalAnd,
        ] {
            assert_eq!(binary_result(op, Ty::Form, Ty::Array), Ty::Invalid);
            assert_eq!(binary_result(op, Ty::Pair, Ty::Number), Ty::Invalid);
            assert_eq!(binary_result(op, Ty::Lambda, Ty::Lambda), Ty::Invalid);
        }
    }

    #[test]
    fn equality_covers_forms_and_arrays() {
        assert_eq!(binary_result(BinOp::Eq, Ty::Form, Ty::Form), Ty::Boolean);
        assert_eq!(binary_result(BinOp::Ne, Ty::Array, Ty::Array), Ty::Boolean);
        assert_eq!(binary_result(BinOp::Eq, Ty::Form, Ty::Number), Ty::Invalid);
    }

    #[test]
    fn ambiguous_passes_through() {
        assert_eq!(
            binary_result(BinOp::Add, Ty::Ambiguous, Ty::String),
            Ty::Ambiguous
        );
        assert_eq!(
            binary_result(BinOp::Lt, Ty::Ambiguous, Ty::Number),
            Ty::Boolean
        );
    }

    #[test]
    fn unary_tables() {
        assert_eq!(unary_result(UnOp::Neg, Ty::NumberVar), Ty::Number);
        assert_eq!(unary_result(UnOp::Neg, Ty::String), Ty::Invalid);
        assert_eq!(unary_result(UnOp::ToString, Ty::Number), Ty::String);
        assert_eq!(unary_result(UnOp::ToNumber, Ty::String), Ty::Number);
        assert_eq!(unary_result(UnOp::ToNumber, Ty::Array), Ty::Invalid);
        assert_eq!(unary_result(UnOp::Box, Ty::Form), Ty::Array);
        assert_eq!(unary_result(UnOp::Unbox, Ty::ArrayVar), Ty::Ambiguous);
        assert_eq!(unary_result(UnOp::Unbox, Ty::Number), Ty::Invalid);
    }

    #[test]
    fn assignment_requires_a_variable_target() {
        assert_eq!(
            assign_result(AssignOp::Assign, Ty::NumberVar, Ty::Number),
            Ty::Number
        );
        assert_eq!(
            assign_result(AssignOp::Assign, Ty::Number, Ty::Number),
            Ty::Invalid
        );
        assert_eq!(
            assign_result(AssignOp::Assign, Ty::StringVar, Ty::Number),
            Ty::Invalid
        );
        assert_eq!(
            assign_result(AssignOp::Assign, Ty::RefVar, Ty::Form),
            Ty::Form
        );
        assert_eq!(
            assign_result(AssignOp::Assign, Ty::Ambiguous, Ty::String),
            Ty::Ambiguous
        );
    }

    #[test]
    fn compound_assignment_composes_the_binary_table() {
        assert_eq!(
            assign_result(AssignOp::Add, Ty::NumberVar, Ty::Number),
            Ty::Number
        );
        assert_eq!(
            assign_result(AssignOp::Add, Ty::StringVar, Ty::String),
            Ty::String
        );
        assert_eq!(
            assign_result(AssignOp::Sub, Ty::StringVar, Ty::String),
            Ty::Invalid
        );
    }

    #[test]
    fn subscript_table() {
        assert_eq!(subscript_result(Ty::ArrayVar, Ty::Number), Ty::Ambiguous);
        assert_eq!(subscript_result(Ty::ArrayVar, Ty::Pair), Ty::Array);
        assert_eq!(subscript_result(Ty::StringVar, Ty::Number), Ty::String);
        assert_eq!(subscript_result(Ty::Number, Ty::Number), Ty::Invalid);
    }
}
