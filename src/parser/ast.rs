// AST (Abstract Syntax Tree) definitions for the compiler

use crate::parser::symbols::{StringPool, SymbolTable};
use crate::types::Type;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    // Plain assignment, only used for type deduction
    Assign,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    AddrOf,  // &x
    Deref,   // *x
    PreInc,  // ++x
    PreDec,  // --x
    PostInc, // x++
    PostDec, // x--
}

/// Short-circuiting logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Where an identifier was found during parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    Global,
    /// Not declared; only valid as the callee of a call
    Unresolved,
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone)]
pub enum AstNode {
    // Expressions
    IntLiteral {
        value: i64,
        location: SourceLocation,
    },
    StringLiteral {
        text: String,
        index: usize,
        ty: Type,
        location: SourceLocation,
    },
    Identifier {
        name: String,
        ty: Option<Type>,
        scope: Scope,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        ty: Option<Type>,
        location: SourceLocation,
    },
    BinaryOp {
        op: BinOp,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
        ty: Option<Type>,
        location: SourceLocation,
    },
    LogicalOp {
        op: LogicalOp,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
        location: SourceLocation,
    },
    /// `lhs = rhs`, or `lhs op= rhs` when `op` is set
    Assignment {
        op: Option<BinOp>,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
        ty: Option<Type>,
        location: SourceLocation,
    },
    Call {
        name: String,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    MemberAccess {
        base: Box<AstNode>,
        member: String,
        ty: Type,
        location: SourceLocation,
    },

    // Statements
    Declaration {
        name: String,
        ty: Type,
        init: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    Compound {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
        location: SourceLocation,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        step: Option<Box<AstNode>>,
        body: Box<AstNode>,
        location: SourceLocation,
    },
    Return {
        value: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    Blank {
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            AstNode::IntLiteral { location, .. }
            | AstNode::StringLiteral { location, .. }
            | AstNode::Identifier { location, .. }
            | AstNode::UnaryOp { location, .. }
            | AstNode::BinaryOp { location, .. }
            | AstNode::LogicalOp { location, .. }
            | AstNode::Assignment { location, .. }
            | AstNode::Call { location, .. }
            | AstNode::MemberAccess { location, .. }
            | AstNode::Declaration { location, .. }
            | AstNode::Compound { location, .. }
            | AstNode::If { location, .. }
            | AstNode::While { location, .. }
            | AstNode::For { location, .. }
            | AstNode::Return { location, .. }
            | AstNode::Blank { location } => *location,
        }
    }

    /// Static type of an expression node; `None` for statements and for
    /// identifiers that never resolved
    pub fn ty(&self) -> Option<Type> {
        match self {
            AstNode::IntLiteral { .. } | AstNode::LogicalOp { .. } | AstNode::Call { .. } => {
                Some(Type::Int)
            }
            AstNode::StringLiteral { ty, .. } | AstNode::MemberAccess { ty, .. } => {
                Some(ty.clone())
            }
            AstNode::Identifier { ty, .. }
            | AstNode::UnaryOp { ty, .. }
            | AstNode::BinaryOp { ty, .. }
            | AstNode::Assignment { ty, .. } => ty.clone(),
            AstNode::Declaration { .. }
            | AstNode::Compound { .. }
            | AstNode::If { .. }
            | AstNode::While { .. }
            | AstNode::For { .. }
            | AstNode::Return { .. }
            | AstNode::Blank { .. } => None,
        }
    }

    /// Short source-like description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            AstNode::IntLiteral { value, .. } => value.to_string(),
            AstNode::StringLiteral { text, .. } => format!("\"{}\"", text),
            AstNode::Identifier { name, .. } | AstNode::Declaration { name, .. } => name.clone(),
            AstNode::Call { name, .. } => format!("{}()", name),
            AstNode::MemberAccess { base, member, .. } => {
                format!("{}.{}", base.describe(), member)
            }
            AstNode::UnaryOp { op, operand, .. } => {
                let operand = operand.describe();
                match op {
                    UnOp::AddrOf => format!("&{}", operand),
                    UnOp::Deref => format!("*{}", operand),
                    UnOp::PreInc => format!("++{}", operand),
                    UnOp::PreDec => format!("--{}", operand),
                    UnOp::PostInc => format!("{}++", operand),
                    UnOp::PostDec => format!("{}--", operand),
                }
            }
            AstNode::BinaryOp { lhs, rhs, .. }
            | AstNode::LogicalOp { lhs, rhs, .. }
            | AstNode::Assignment { lhs, rhs, .. } => {
                format!("{} ... {}", lhs.describe(), rhs.describe())
            }
            AstNode::Compound { .. } => "{".to_string(),
            AstNode::If { .. } => "if".to_string(),
            AstNode::While { .. } => "while".to_string(),
            AstNode::For { .. } => "for".to_string(),
            AstNode::Return { .. } => "return".to_string(),
            AstNode::Blank { .. } => ";".to_string(),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub param_type: Type,
    pub location: SourceLocation,
}

/// A parsed function definition
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    /// Always a [`AstNode::Compound`]
    pub body: AstNode,
    pub return_type: Type,
    /// Parameters and locals of this function, in declaration order
    pub locals: SymbolTable,
    pub location: SourceLocation,
}

/// A global variable; initialisers are folded to constants while parsing
#[derive(Debug, Clone)]
pub struct GlobalVar {
    pub name: String,
    pub ty: Type,
    pub init: Option<i64>,
    pub location: SourceLocation,
}

/// Top-level program structure
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
    pub globals: Vec<GlobalVar>,
    pub strings: StringPool,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn global(&self, name: &str) -> Option<&GlobalVar> {
        self.globals.iter().rev().find(|g| g.name == name)
    }
}
