//! Type representation, sizing and struct layout
//!
//! Types are immutable once built and shared through [`Rc`], so a pointer to
//! `int` and the `int` element of an array can point at the same node without
//! any ownership bookkeeping.
//!
//! # Sizes
//!
//! | Type      | Size                          | Alignment          |
//! |-----------|-------------------------------|--------------------|
//! | `char`    | 1                             | 1                  |
//! | `short`   | 2                             | 2                  |
//! | `int`     | 4                             | 4                  |
//! | `T*`      | 8                             | 8                  |
//! | `T[n]`    | `n * sizeof(T)`               | `sizeof(T)`        |
//! | `struct`  | last member end, rounded to 8 | 8                  |
//!
//! Result types of binary operators are deduced in [`deduce`].

pub mod deduce;

pub use deduce::deduce_type;

use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Structs are always padded to a multiple of this many bytes
pub const STRUCT_ALIGNMENT: usize = 8;

/// Largest object the generated code can address: `rbp`- and `rip`-relative
/// displacements are signed 32-bit
pub const MAX_OBJECT_SIZE: usize = i32::MAX as usize;

/// Type-level failures; the parser attaches a source location to them
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Pointer +/- pointer operation not supported")]
    PointerArithmetic,

    #[error("Duplicate struct member")]
    DuplicateMember(String),

    #[error("Array too large")]
    ArrayTooLarge,

    #[error("Struct too large")]
    StructTooLarge,
}

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Char,
    Short,
    Int,
    Pointer(Rc<Type>),
    Array(Rc<Type>, usize),
    Struct(Rc<StructType>),
}

/// A struct member with its byte offset from the start of the struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    pub offset: usize,
}

/// Ordered struct layout, built member by member with [`StructType::add_member`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructType {
    members: Vec<Member>,
    end: usize,
}

impl Type {
    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer(Rc::new(pointee))
    }

    pub fn array_of(element: Type, len: usize) -> Self {
        Type::Array(Rc::new(element), len)
    }

    /// `element[len]`, rejected when it would exceed [`MAX_OBJECT_SIZE`]
    pub fn checked_array_of(element: Type, len: usize) -> Result<Self, TypeError> {
        size_of(&element)
            .checked_mul(len)
            .filter(|&size| size <= MAX_OBJECT_SIZE)
            .ok_or(TypeError::ArrayTooLarge)?;
        Ok(Type::array_of(element, len))
    }

    /// Pointee of a pointer, or element of an array
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) | Type::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// Pointers and arrays both take part in pointer arithmetic
    pub fn is_pointer_like(&self) -> bool {
        matches!(self, Type::Pointer(_) | Type::Array(..))
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(layout) => Some(layout),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Char => write!(f, "char"),
            Type::Short => write!(f, "short"),
            Type::Int => write!(f, "int"),
            Type::Pointer(inner) => write!(f, "{}*", inner),
            Type::Array(inner, len) => write!(f, "{}[{}]", inner, len),
            Type::Struct(layout) => {
                write!(f, "struct {{")?;
                for member in &layout.members {
                    write!(f, " {} {};", member.ty, member.name)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl StructType {
    pub fn new() -> Self {
        StructType::default()
    }

    /// Append a member at the current end, rounded up to the member's alignment
    pub fn add_member(&mut self, name: &str, ty: Type) -> Result<(), TypeError> {
        if self.member(name).is_some() {
            return Err(TypeError::DuplicateMember(name.to_string()));
        }

        let align = align_of(&ty);
        let offset = self
            .end
            .checked_next_multiple_of(align)
            .ok_or(TypeError::StructTooLarge)?;
        self.end = offset
            .checked_add(size_of(&ty))
            .filter(|&end| end.next_multiple_of(STRUCT_ALIGNMENT) <= MAX_OBJECT_SIZE)
            .ok_or(TypeError::StructTooLarge)?;
        self.members.push(Member {
            name: name.to_string(),
            ty,
            offset,
        });
        Ok(())
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Size of the struct: last member end rounded up to [`STRUCT_ALIGNMENT`]
    pub fn size(&self) -> usize {
        self.end.div_ceil(STRUCT_ALIGNMENT) * STRUCT_ALIGNMENT
    }
}

/// Size of a type in bytes
pub fn size_of(ty: &Type) -> usize {
    match ty {
        Type::Char => 1,
        Type::Short => 2,
        Type::Int => 4,
        Type::Pointer(_) => 8,
        Type::Array(element, len) => len * size_of(element),
        Type::Struct(layout) => layout.size(),
    }
}

/// Alignment of a type when placed inside a struct
pub fn align_of(ty: &Type) -> usize {
    let align = match ty {
        Type::Array(element, _) => size_of(element),
        Type::Struct(_) => STRUCT_ALIGNMENT,
        other => size_of(other),
    };
    align.max(1)
}

/// Whether the type is one of the integer types
pub fn is_scalar(ty: &Type) -> bool {
    matches!(ty, Type::Char | Type::Short | Type::Int)
}
