//! Shape categories observed by the graph walker.
//!
//! Every inspectable type reports exactly one [`Kind`]. The walker dispatches
//! on the matching [`Shape`](crate::Shape) variant; the kind is also folded
//! into each [`Locator`](crate::Locator) so values of different kinds that
//! share an address never collide.

use std::fmt;

/// Top-level shape category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// bool, char, integers and floats of any width.
    Scalar(ScalarKind),
    /// Struct-like composite with a fixed set of fields.
    Aggregate,
    /// Indexable run of elements: arrays, vectors, slices, text.
    Sequence(SequenceKind),
    /// Key/value mapping or set.
    Map,
    /// Pointer-like or polymorphic holder.
    Reference(ReferenceKind),
    /// Raw pointers, callables and channel handles.
    Unsafe(UnsafeKind),
    /// Type-erased holder whose contents cannot be introspected.
    Untyped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char,
    Int,
    Uint,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Array,
    Vec,
    Slice,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Box,
    Rc,
    Arc,
    Weak,
    Borrow,
    Option,
    Dyn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsafeKind {
    RawPointer,
    Callable,
    Channel,
}

impl Kind {
    /// Returns true for the kinds that are only accepted with the unsafe opt-in.
    pub const fn is_unsafe(&self) -> bool {
        matches!(self, Kind::Unsafe(_))
    }

    /// Returns true for scalar kinds.
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Kind::Scalar(_))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Scalar(s) => write!(f, "scalar({})", s),
            Kind::Aggregate => f.write_str("aggregate"),
            Kind::Sequence(s) => write!(f, "sequence({})", s),
            Kind::Map => f.write_str("map"),
            Kind::Reference(r) => write!(f, "reference({})", r),
            Kind::Unsafe(u) => write!(f, "{}", u),
            Kind::Untyped => f.write_str("untyped"),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Float => "float",
        })
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SequenceKind::Array => "array",
            SequenceKind::Vec => "vec",
            SequenceKind::Slice => "slice",
            SequenceKind::Text => "text",
        })
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Box => "box",
            ReferenceKind::Rc => "rc",
            ReferenceKind::Arc => "arc",
            ReferenceKind::Weak => "weak",
            ReferenceKind::Borrow => "borrow",
            ReferenceKind::Option => "option",
            ReferenceKind::Dyn => "dyn",
        })
    }
}

impl fmt::Display for UnsafeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnsafeKind::RawPointer => "raw pointer",
            UnsafeKind::Callable => "callable",
            UnsafeKind::Channel => "channel",
        })
    }
}
