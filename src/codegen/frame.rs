//! Stack-frame layout
//!
//! ```text
//!   rbp+24   8th argument
//!   rbp+16   7th argument
//!   rbp+8    return address
//!   rbp      saved rbp
//!   rbp-8    1st argument (copied from rdi)
//!   ...
//!   rbp-48   6th argument (copied from r9)
//!   ...      locals, in declaration order
//! ```
//!
//! A name declared more than once in one function (in sibling or nested
//! blocks) gets a single slot, sized for its largest declaration.

use super::constants::{ARG_REGISTERS, SLOT_SIZE, STACK_ALIGNMENT, STACK_ARGS_OFFSET};
use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::{AstNode, FunctionDef};
use crate::types::{size_of, MAX_OBJECT_SIZE};
use rustc_hash::FxHashMap;

/// Offsets of every parameter and local of one function, relative to `rbp`
#[derive(Debug, Clone, Default)]
pub struct StackFrameLayout {
    offsets: FxHashMap<String, i64>,
    size: usize,
}

impl StackFrameLayout {
    pub fn new(function: &FunctionDef) -> CompileResult<Self> {
        let mut offsets = FxHashMap::default();
        let mut reserved = 0usize;

        for (i, param) in function.params.iter().enumerate() {
            let offset = if i < ARG_REGISTERS.len() {
                reserved += SLOT_SIZE;
                -(reserved as i64)
            } else {
                STACK_ARGS_OFFSET + (SLOT_SIZE * (i - ARG_REGISTERS.len())) as i64
            };
            offsets.insert(param.name.clone(), offset);
        }

        // Largest size per local name, in order of first declaration
        let mut locals: Vec<(&str, usize)> = Vec::new();
        collect_declarations(&function.body, &mut |name, size, node| {
            if function.params.iter().any(|p| p.name == name) {
                return Err(CompileError::semantic(
                    "Declaration shadows a parameter",
                    name,
                    node.location(),
                ));
            }
            match locals.iter_mut().find(|(n, _)| *n == name) {
                Some((_, largest)) => *largest = (*largest).max(size),
                None => locals.push((name, size)),
            }
            Ok(())
        })?;

        let too_large = || {
            CompileError::semantic(
                "Stack frame too large",
                function.name.as_str(),
                function.location,
            )
        };

        for (name, size) in locals {
            reserved = size
                .max(1)
                .checked_next_multiple_of(SLOT_SIZE)
                .and_then(|slot| reserved.checked_add(slot))
                .filter(|&total| total <= MAX_OBJECT_SIZE)
                .ok_or_else(too_large)?;
            offsets.insert(name.to_string(), -(reserved as i64));
        }

        let size = reserved
            .checked_next_multiple_of(STACK_ALIGNMENT)
            .filter(|&size| size <= MAX_OBJECT_SIZE)
            .ok_or_else(too_large)?;

        Ok(StackFrameLayout { offsets, size })
    }

    /// Offset of `name` from `rbp`
    pub fn offset(&self, name: &str) -> Option<i64> {
        self.offsets.get(name).copied()
    }

    /// Bytes reserved below `rbp`, a multiple of [`STACK_ALIGNMENT`]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Visit every declaration in `node`, recursing through nested statements
fn collect_declarations<'a, F>(node: &'a AstNode, visit: &mut F) -> CompileResult<()>
where
    F: FnMut(&'a str, usize, &'a AstNode) -> CompileResult<()>,
{
    match node {
        AstNode::Declaration { name, ty, .. } => visit(name, size_of(ty), node),
        AstNode::Compound { statements, .. } => statements
            .iter()
            .try_for_each(|stmt| collect_declarations(stmt, visit)),
        AstNode::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_declarations(then_branch, visit)?;
            match else_branch {
                Some(branch) => collect_declarations(branch, visit),
                None => Ok(()),
            }
        }
        AstNode::While { body, .. } | AstNode::For { body, .. } => {
            collect_declarations(body, visit)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use pretty_assertions::assert_eq;

    fn layout(source: &str) -> StackFrameLayout {
        let program = parse_source(source).unwrap();
        StackFrameLayout::new(&program.functions[0]).unwrap()
    }

    #[test]
    fn test_register_and_stack_parameters() {
        let frame = layout(
            "int f(int a, int b, int c, int d, int e, int f, int g, int h) { return 0; }",
        );
        let offsets: Vec<_> = ["a", "b", "c", "d", "e", "f", "g", "h"]
            .iter()
            .map(|n| frame.offset(n).unwrap())
            .collect();
        assert_eq!(offsets, vec![-8, -16, -24, -32, -40, -48, 16, 24]);
        assert_eq!(frame.size(), 48);
    }

    #[test]
    fn test_locals_follow_parameters() {
        let frame = layout("int f(int a) { char c; int x[3]; short s; return 0; }");
        assert_eq!(frame.offset("a"), Some(-8));
        assert_eq!(frame.offset("c"), Some(-16));
        assert_eq!(frame.offset("x"), Some(-32));
        assert_eq!(frame.offset("s"), Some(-40));
        assert_eq!(frame.size(), 48);
    }

    #[test]
    fn test_nested_declarations_are_found() {
        let frame = layout(
            "int main() { if (1) { int a; } else { int b; } while (0) { int c; } for (;;) { int d; } return 0; }",
        );
        for name in ["a", "b", "c", "d"] {
            assert!(frame.offset(name).is_some(), "{} has no slot", name);
        }
        assert_eq!(frame.size(), 32);
    }

    #[test]
    fn test_redeclared_name_shares_largest_slot() {
        let frame = layout("int main() { { int x; } { int x[4]; } int y; return 0; }");
        assert_eq!(frame.offset("x"), Some(-16));
        assert_eq!(frame.offset("y"), Some(-24));
        assert_eq!(frame.size(), 32);
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let program = parse_source(
            "int main() { char a[2000000000]; char b[2000000000]; return 0; }",
        )
        .unwrap();
        match StackFrameLayout::new(&program.functions[0]).unwrap_err() {
            CompileError::Semantic { message, token, .. } => {
                assert_eq!(message, "Stack frame too large");
                assert_eq!(token, "main");
            }
            other => panic!("Expected semantic error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_frame() {
        let frame = layout("int main() { return 0; }");
        assert_eq!(frame.size(), 0);
        assert_eq!(frame.offset("main"), None);
    }

    #[test]
    fn test_shadowing_a_parameter_is_rejected() {
        let program = parse_source("int f(int a) { { int a; } return 0; }").unwrap();
        assert!(StackFrameLayout::new(&program.functions[0]).is_err());
    }
}
