//! Value introspection.
//!
//! The walker never looks at raw memory of composite values. Instead every
//! type it may meet implements [`Inspect`], which exposes:
//!
//! - a static [`TypeInfo`] (name, [`Kind`], size, field types),
//! - a [`Shape`] view the walker dispatches on,
//! - a padding-free representation written by [`Inspect::write_repr`].
//!
//! User structs opt in with [`inspect_struct!`](crate::inspect_struct).

mod impls;
mod macros;

use std::fmt;

use crate::cache::TypeKey;
use crate::hash::type_tag;
use crate::kind::Kind;

/// Enumerates the field types of an aggregate.
pub type FieldList = fn(&mut dyn FnMut(TypeInfo));

/// Static description of a type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    name: &'static str,
    kind: Kind,
    size: usize,
    fields: Option<FieldList>,
    interior: bool,
}

impl TypeInfo {
    /// Description of a sized inspectable type.
    pub fn of<T: Inspect>() -> Self {
        T::describe()
    }

    /// Description of a type with no inspectable fields.
    pub fn leaf<T>(kind: Kind) -> Self {
        Self {
            name: std::any::type_name::<T>(),
            kind,
            size: std::mem::size_of::<T>(),
            fields: None,
            interior: false,
        }
    }

    /// Description of a struct-like type whose fields are listed by
    /// [`Inspect::describe_fields`].
    pub fn aggregate<T: Inspect>() -> Self {
        Self {
            fields: Some(T::describe_fields as FieldList),
            ..Self::leaf::<T>(Kind::Aggregate)
        }
    }

    /// Description of a wrapper that is observed as its inner value.
    ///
    /// Keeps the wrapper's name and size so cache keys and locator tags stay
    /// distinct from the inner type.
    pub fn transparent<T>(inner: TypeInfo) -> Self {
        Self {
            name: std::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
            ..inner
        }
    }

    /// Mark the type as readable only through a runtime borrow check.
    ///
    /// Such types are never primitive, so the walker always visits them and
    /// notices when they cannot be read.
    pub const fn with_interior_borrow(mut self) -> Self {
        self.interior = true;
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub const fn has_interior_borrow(&self) -> bool {
        self.interior
    }

    /// Call `visit` once per field type, in declaration order.
    pub fn for_each_field(&self, visit: &mut dyn FnMut(TypeInfo)) {
        if let Some(fields) = self.fields {
            fields(visit);
        }
    }

    /// Identity used by the type cache.
    pub const fn key(&self) -> TypeKey {
        TypeKey::new(self.name, self.size)
    }

    /// Tag folded into locators.
    pub fn tag(&self) -> u64 {
        type_tag(self.name)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("interior", &self.interior)
            .finish()
    }
}

/// A value the graph walker can fingerprint.
///
/// The trait is object safe; the walker only ever handles `&dyn Inspect`.
///
/// # Safety
///
/// Implementations of `Cell` and `RefCell` read their contents without a
/// guard, relying on nothing else running while a walk is in progress.
/// Every method of an implementation, and of the [`Members`] it exposes,
/// must therefore only read. It must not mutate, or call code that can
/// mutate, any value reachable from the root being walked.
///
/// Implement it with [`inspect_struct!`](crate::inspect_struct), or by
/// hand:
///
/// ```
/// use immcheck_core::{Inspect, Kind, ScalarKind, Shape, TypeInfo};
///
/// struct Level(u8);
///
/// // SAFETY: every method only reads `self.0`.
/// unsafe impl Inspect for Level {
///     fn describe() -> TypeInfo {
///         TypeInfo::leaf::<Self>(Kind::Scalar(ScalarKind::Uint))
///     }
///
///     fn type_info(&self) -> TypeInfo {
///         Self::describe()
///     }
///
///     fn shape(&self) -> Shape<'_> {
///         Shape::Scalar(std::slice::from_ref(&self.0))
///     }
///
///     fn write_repr(&self, out: &mut Vec<u8>) {
///         out.push(self.0);
///     }
/// }
/// ```
///
/// Leaving out `unsafe` does not compile:
///
/// ```compile_fail
/// use immcheck_core::{Inspect, Kind, ScalarKind, Shape, TypeInfo};
///
/// struct Level(u8);
///
/// impl Inspect for Level {
///     fn describe() -> TypeInfo {
///         TypeInfo::leaf::<Self>(Kind::Scalar(ScalarKind::Uint))
///     }
///
///     fn type_info(&self) -> TypeInfo {
///         Self::describe()
///     }
///
///     fn shape(&self) -> Shape<'_> {
///         Shape::Scalar(std::slice::from_ref(&self.0))
///     }
///
///     fn write_repr(&self, out: &mut Vec<u8>) {
///         out.push(self.0);
///     }
/// }
/// ```
pub unsafe trait Inspect {
    /// Static description of `Self`.
    fn describe() -> TypeInfo
    where
        Self: Sized;

    /// Field types of an aggregate. Empty for every other kind.
    fn describe_fields(visit: &mut dyn FnMut(TypeInfo))
    where
        Self: Sized,
    {
        let _ = visit;
    }

    /// Static description of the concrete type behind `self`.
    fn type_info(&self) -> TypeInfo;

    /// View of the value the walker dispatches on.
    fn shape(&self) -> Shape<'_>;

    /// Append the in-place representation of the value, excluding padding.
    ///
    /// Scalars write their bytes, owning containers their pointer, length and
    /// capacity words, references the pointee address, aggregates their
    /// fields in declaration order.
    fn write_repr(&self, out: &mut Vec<u8>);

    /// Contiguous byte view of a run of values, if `Self` is a plain scalar.
    fn scalar_slice(items: &[Self]) -> Option<&[u8]>
    where
        Self: Sized,
    {
        let _ = items;
        None
    }
}

/// Enumerates the directly contained values of a composite.
pub trait Members {
    fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect));
}

/// Closed view of a value, one variant per [`Kind`] family.
pub enum Shape<'a> {
    /// Raw bytes of a scalar.
    Scalar(&'a [u8]),
    /// Struct-like composite.
    Aggregate(&'a dyn Members),
    /// Indexable run of elements.
    Sequence(Sequence<'a>),
    /// Mapping or set. Members alternate key, value for maps.
    Map { len: usize, entries: &'a dyn Members },
    /// Pointer-like holder. `None` when nil.
    Reference(Option<&'a dyn Inspect>),
    /// Raw pointer, callable or channel, with the address it refers to.
    ///
    /// The walker digests [`Inspect::write_repr`] of such values, which
    /// covers the whole handle (a trait object's vtable, a channel's shared
    /// state).
    Unsafe(usize),
    /// Interior value that is mutably borrowed and cannot be read.
    Locked,
    /// Type-erased value.
    Untyped,
}

/// Backing storage of a sequence.
pub struct Sequence<'a> {
    /// Address of the first element, 0 when there is no backing storage.
    pub data: usize,
    pub len: usize,
    pub elem: TypeInfo,
    /// Whole span as bytes when the elements are plain scalars.
    pub bytes: Option<&'a [u8]>,
    pub items: &'a dyn Members,
}

impl<'a> Sequence<'a> {
    /// Sequence view over a slice owned by `holder`.
    pub fn of_slice<T: Inspect>(items: &'a [T], holder: &'a dyn Members) -> Self {
        Self {
            data: items.as_ptr() as usize,
            len: items.len(),
            elem: T::describe(),
            bytes: T::scalar_slice(items),
            items: holder,
        }
    }
}

/// Address of the value behind an inspectable reference.
pub fn address_of(value: &dyn Inspect) -> usize {
    value as *const dyn Inspect as *const () as usize
}

pub(crate) fn write_address(address: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&address.to_ne_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ReferenceKind, ScalarKind, SequenceKind};

    #[test]
    fn test_scalar_info() {
        let info = TypeInfo::of::<u32>();
        assert_eq!(info.name(), "u32");
        assert_eq!(info.kind(), Kind::Scalar(ScalarKind::Uint));
        assert_eq!(info.size(), 4);
    }

    #[test]
    fn test_tuple_fields_listed_in_order() {
        let mut names = Vec::new();
        TypeInfo::of::<(u8, String, bool)>().for_each_field(&mut |f| names.push(f.name()));
        assert_eq!(names, vec!["u8", "alloc::string::String", "bool"]);
    }

    #[test]
    fn test_transparent_keeps_outer_identity() {
        let info = TypeInfo::of::<std::cell::Cell<u64>>();
        assert_eq!(info.kind(), Kind::Scalar(ScalarKind::Uint));
        assert!(info.name().contains("Cell"));
        assert_ne!(info.tag(), TypeInfo::of::<u64>().tag());
    }

    #[test]
    fn test_refcell_has_interior_borrow() {
        assert!(TypeInfo::of::<std::cell::RefCell<u8>>().has_interior_borrow());
        assert!(!TypeInfo::of::<std::cell::Cell<u8>>().has_interior_borrow());
    }

    #[test]
    fn test_write_repr_excludes_padding() {
        // (u8, u32) occupies 8 bytes but only 5 are data.
        let mut out = Vec::new();
        (7u8, 9u32).write_repr(&mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], 7);
    }

    #[test]
    fn test_sequence_shape_for_vec() {
        let v = vec![1u16, 2, 3];
        match v.shape() {
            Shape::Sequence(seq) => {
                assert_eq!(seq.len, 3);
                assert_eq!(seq.data, v.as_ptr() as usize);
                assert_eq!(seq.bytes.map(|b| b.len()), Some(6));
            }
            _ => panic!("expected sequence"),
        }
        assert_eq!(v.type_info().kind(), Kind::Sequence(SequenceKind::Vec));
    }

    #[test]
    fn test_address_of_matches_reference() {
        let value = 5u64;
        assert_eq!(address_of(&value), &value as *const u64 as usize);
    }

    struct Level(u8);

    // SAFETY: every method only reads `self.0`.
    unsafe impl Inspect for Level {
        fn describe() -> TypeInfo {
            TypeInfo::leaf::<Self>(Kind::Scalar(ScalarKind::Uint))
        }

        fn type_info(&self) -> TypeInfo {
            Self::describe()
        }

        fn shape(&self) -> Shape<'_> {
            Shape::Scalar(std::slice::from_ref(&self.0))
        }

        fn write_repr(&self, out: &mut Vec<u8>) {
            out.push(self.0);
        }
    }

    #[test]
    fn test_hand_written_impl() {
        let level = Level(3);
        assert_eq!(level.type_info().kind(), Kind::Scalar(ScalarKind::Uint));
        assert!(matches!(level.shape(), Shape::Scalar(&[3])));

        let boxed: Box<dyn Inspect> = Box::new(Level(4));
        match boxed.shape() {
            Shape::Reference(Some(target)) => {
                let mut out = Vec::new();
                target.write_repr(&mut out);
                assert_eq!(out, vec![4]);
            }
            _ => panic!("expected reference"),
        }
    }

    #[test]
    fn test_option_reports_nil() {
        let none: Option<Box<u8>> = None;
        assert!(matches!(none.shape(), Shape::Reference(None)));
        assert_eq!(
            none.type_info().kind(),
            Kind::Reference(ReferenceKind::Option)
        );
    }
}
