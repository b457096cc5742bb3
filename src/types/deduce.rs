//! Result-type deduction for binary operators and assignment
//!
//! Deduction is shallow. Function signatures are not tracked, so
//! an operand may be type-less (an identifier that only resolves as a function
//! name); in that case the other operand's type is used as a placeholder.
//! Two operands with the same type variant yield the left type as-is, even when
//! their pointees differ.

use super::{is_scalar, Type, TypeError};
use crate::parser::ast::BinOp;
use std::mem::discriminant;

/// Deduce the result type of `lhs op rhs`
pub fn deduce_type(
    op: &BinOp,
    lhs: Option<&Type>,
    rhs: Option<&Type>,
) -> Result<Option<Type>, TypeError> {
    let additive = matches!(op, BinOp::Add | BinOp::Sub);

    let (lhs, rhs) = match (lhs, rhs) {
        (Some(l), Some(r)) => (l, r),
        (None, other) | (other, None) => return Ok(other.cloned()),
    };

    if additive && lhs.is_pointer_like() && rhs.is_pointer_like() {
        return Err(TypeError::PointerArithmetic);
    }

    if discriminant(lhs) == discriminant(rhs) {
        return Ok(Some(lhs.clone()));
    }

    match op {
        BinOp::Assign => Ok(Some(lhs.clone())),
        BinOp::Add | BinOp::Sub if lhs.is_pointer_like() && is_scalar(rhs) => {
            Ok(Some(lhs.clone()))
        }
        BinOp::Add | BinOp::Sub if is_scalar(lhs) && rhs.is_pointer_like() => {
            Ok(Some(rhs.clone()))
        }
        _ => Ok(Some(lhs.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn int_ptr() -> Type {
        Type::pointer_to(Type::Int)
    }

    #[test]
    fn test_typeless_side_takes_other_type() {
        assert_eq!(
            deduce_type(&BinOp::Add, None, Some(&Type::Int)),
            Ok(Some(Type::Int))
        );
        assert_eq!(
            deduce_type(&BinOp::Mul, Some(&int_ptr()), None),
            Ok(Some(int_ptr()))
        );
        assert_eq!(deduce_type(&BinOp::Add, None, None), Ok(None));
    }

    #[test]
    fn test_same_variant_returns_lhs_unchanged() {
        assert_eq!(
            deduce_type(&BinOp::Mul, Some(&Type::Int), Some(&Type::Int)),
            Ok(Some(Type::Int))
        );

        // Pointees are not unified
        let char_ptr = Type::pointer_to(Type::Char);
        assert_eq!(
            deduce_type(&BinOp::Assign, Some(&char_ptr), Some(&int_ptr())),
            Ok(Some(char_ptr))
        );
    }

    #[test]
    fn test_assignment_takes_lhs() {
        assert_eq!(
            deduce_type(&BinOp::Assign, Some(&Type::Char), Some(&Type::Int)),
            Ok(Some(Type::Char))
        );
        assert_eq!(
            deduce_type(&BinOp::Assign, Some(&int_ptr()), Some(&Type::Int)),
            Ok(Some(int_ptr()))
        );
    }

    #[test]
    fn test_pointer_arithmetic_takes_pointer_side() {
        assert_eq!(
            deduce_type(&BinOp::Add, Some(&int_ptr()), Some(&Type::Int)),
            Ok(Some(int_ptr()))
        );
        assert_eq!(
            deduce_type(&BinOp::Add, Some(&Type::Char), Some(&int_ptr())),
            Ok(Some(int_ptr()))
        );

        let array = Type::array_of(Type::Int, 3);
        assert_eq!(
            deduce_type(&BinOp::Sub, Some(&array), Some(&Type::Int)),
            Ok(Some(array))
        );
    }

    #[test]
    fn test_mixed_scalars_take_lhs() {
        assert_eq!(
            deduce_type(&BinOp::Add, Some(&Type::Char), Some(&Type::Int)),
            Ok(Some(Type::Char))
        );
        assert_eq!(
            deduce_type(&BinOp::Lt, Some(&Type::Int), Some(&Type::Short)),
            Ok(Some(Type::Int))
        );
    }

    #[test]
    fn test_pointer_plus_pointer_is_fatal() {
        assert_eq!(
            deduce_type(&BinOp::Sub, Some(&int_ptr()), Some(&int_ptr())),
            Err(TypeError::PointerArithmetic)
        );
        assert_eq!(
            deduce_type(
                &BinOp::Add,
                Some(&Type::array_of(Type::Int, 2)),
                Some(&int_ptr())
            ),
            Err(TypeError::PointerArithmetic)
        );
    }

    #[test]
    fn test_pointer_comparison_is_allowed() {
        assert_eq!(
            deduce_type(&BinOp::Eq, Some(&int_ptr()), Some(&int_ptr())),
            Ok(Some(int_ptr()))
        );
    }
}
