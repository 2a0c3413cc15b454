//! [`Inspect`] implementations for standard library types.
//!
//! Every impl here only reads, which is what the `unsafe impl`s promise.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::{self, Rc};
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::Arc;

use super::{address_of, write_address, Inspect, Members, Sequence, Shape, TypeInfo};
use crate::kind::{Kind, ReferenceKind, ScalarKind, SequenceKind, UnsafeKind};

fn data_address<T: ?Sized>(value: &T) -> usize {
    value as *const T as *const () as usize
}

/// Collects the words a `Hash` impl feeds it.
struct WordSink<'o>(&'o mut Vec<u8>);

impl Hasher for WordSink<'_> {
    fn finish(&self) -> u64 {
        0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }
}

/// Append the full pointer to `value`: its address plus the metadata of a
/// fat pointer (the vtable of a trait object).
fn write_fat_pointer<T: ?Sized>(value: &T, out: &mut Vec<u8>) {
    (value as *const T).hash(&mut WordSink(out));
}

/// The shared channel state a std channel handle points at.
///
/// Handles are a flavor tag followed by one pointer to the shared state, so
/// the last word is that pointer for every flavor. Clones of one handle agree
/// on it and handles of distinct channels never do.
fn channel_state<H>(handle: &H) -> usize {
    const WORD: usize = mem::size_of::<usize>();
    let size = mem::size_of::<H>();
    if size < WORD || size % WORD != 0 || mem::align_of::<H>() < WORD {
        return data_address(handle);
    }
    // SAFETY: `H` is at least one word long, word aligned and a whole number
    // of words, so its last word is in bounds, aligned and holds the
    // initialized state pointer.
    unsafe {
        (handle as *const H)
            .cast::<u8>()
            .add(size - WORD)
            .cast::<usize>()
            .read()
    }
}

fn visit_all<'a, T: Inspect>(items: &'a [T], visit: &mut dyn FnMut(&'a dyn Inspect)) {
    for item in items {
        visit(item);
    }
}

fn write_items<T: Inspect>(items: &[T], out: &mut Vec<u8>) {
    match T::scalar_slice(items) {
        Some(bytes) => out.extend_from_slice(bytes),
        None => items.iter().for_each(|item| item.write_repr(out)),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        unsafe impl Inspect for $ty {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Scalar(ScalarKind::$kind))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Scalar(bytemuck::bytes_of(self))
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(bytemuck::bytes_of(self));
            }

            fn scalar_slice(items: &[Self]) -> Option<&[u8]> {
                Some(bytemuck::cast_slice(items))
            }
        }
    )*};
}

scalar! {
    bool => Bool,
    char => Char,
    i8 => Int, i16 => Int, i32 => Int, i64 => Int, i128 => Int, isize => Int,
    u8 => Uint, u16 => Uint, u32 => Uint, u64 => Uint, u128 => Uint, usize => Uint,
    f32 => Float, f64 => Float,
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

unsafe impl Inspect for () {
    fn describe() -> TypeInfo {
        TypeInfo::aggregate::<Self>()
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Aggregate(self)
    }

    fn write_repr(&self, _out: &mut Vec<u8>) {}
}

impl Members for () {
    fn for_each_member<'a>(&'a self, _visit: &mut dyn FnMut(&'a dyn Inspect)) {}
}

macro_rules! tuple {
    ($($name:ident . $idx:tt),+) => {
        unsafe impl<$($name: Inspect),+> Inspect for ($($name,)+) {
            fn describe() -> TypeInfo {
                TypeInfo::aggregate::<Self>()
            }

            fn describe_fields(visit: &mut dyn FnMut(TypeInfo)) {
                $(visit($name::describe());)+
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Aggregate(self)
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                $(self.$idx.write_repr(out);)+
            }
        }

        impl<$($name: Inspect),+> Members for ($($name,)+) {
            fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
                $(visit(&self.$idx);)+
            }
        }
    };
}

tuple!(A.0);
tuple!(A.0, B.1);
tuple!(A.0, B.1, C.2);
tuple!(A.0, B.1, C.2, D.3);
tuple!(A.0, B.1, C.2, D.3, E.4);
tuple!(A.0, B.1, C.2, D.3, E.4, F.5);
tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

unsafe impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Sequence(SequenceKind::Array))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(Sequence::of_slice(self.as_slice(), self))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_items(self.as_slice(), out);
    }
}

impl<T: Inspect, const N: usize> Members for [T; N] {
    fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
        visit_all(self.as_slice(), visit);
    }
}

unsafe impl<T: Inspect> Inspect for Vec<T> {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Sequence(SequenceKind::Vec))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(Sequence::of_slice(self.as_slice(), self))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_address(self.as_ptr() as usize, out);
        out.extend_from_slice(&self.len().to_ne_bytes());
        out.extend_from_slice(&self.capacity().to_ne_bytes());
    }
}

impl<T: Inspect> Members for Vec<T> {
    fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
        visit_all(self.as_slice(), visit);
    }
}

unsafe impl<T: Inspect> Inspect for Box<[T]> {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Sequence(SequenceKind::Slice))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(Sequence::of_slice(&self[..], self))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_address(self.as_ptr() as usize, out);
        out.extend_from_slice(&self.len().to_ne_bytes());
    }
}

impl<T: Inspect> Members for Box<[T]> {
    fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
        visit_all(&self[..], visit);
    }
}

unsafe impl<'r, T: Inspect> Inspect for &'r [T] {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Sequence(SequenceKind::Slice))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(Sequence::of_slice(*self, self))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_address(self.as_ptr() as usize, out);
        out.extend_from_slice(&self.len().to_ne_bytes());
    }
}

impl<'r, T: Inspect> Members for &'r [T] {
    fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
        visit_all(*self, visit);
    }
}

macro_rules! text {
    ($([$($lt:lifetime)?] $ty:ty => $capacity:expr),* $(,)?) => {$(
        unsafe impl<$($lt)?> Inspect for $ty {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Sequence(SequenceKind::Text))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Sequence(Sequence::of_slice(self.as_bytes(), self))
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(self.as_ptr() as usize, out);
                out.extend_from_slice(&self.len().to_ne_bytes());
                let capacity = $capacity;
                if let Some(capacity) = capacity(self) {
                    out.extend_from_slice(&capacity.to_ne_bytes());
                }
            }
        }

        impl<$($lt)?> Members for $ty {
            fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
                visit_all(self.as_bytes(), visit);
            }
        }
    )*};
}

text! {
    [] String => |s: &String| Some(s.capacity()),
    [] Box<str> => |_: &Box<str>| None::<usize>,
    ['r] &'r str => |_: &&str| None::<usize>,
}

// ---------------------------------------------------------------------------
// Associative containers
// ---------------------------------------------------------------------------

macro_rules! map {
    ($($map:ident<$k:ident, $v:ident $(, $s:ident)?>),*) => {$(
        unsafe impl<$k: Inspect, $v: Inspect $(, $s)?> Inspect for $map<$k, $v $(, $s)?> {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Map)
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Map { len: self.len(), entries: self }
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.len().to_ne_bytes());
            }
        }

        impl<$k: Inspect, $v: Inspect $(, $s)?> Members for $map<$k, $v $(, $s)?> {
            fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
                for (key, value) in self.iter() {
                    visit(key);
                    visit(value);
                }
            }
        }
    )*};
}

map!(HashMap<K, V, S>, BTreeMap<K, V>);

macro_rules! set {
    ($($set:ident<$k:ident $(, $s:ident)?>),*) => {$(
        unsafe impl<$k: Inspect $(, $s)?> Inspect for $set<$k $(, $s)?> {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Map)
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Map { len: self.len(), entries: self }
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.len().to_ne_bytes());
            }
        }

        impl<$k: Inspect $(, $s)?> Members for $set<$k $(, $s)?> {
            fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn Inspect)) {
                for key in self.iter() {
                    visit(key);
                }
            }
        }
    )*};
}

set!(HashSet<K, S>, BTreeSet<K>);

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

macro_rules! pointer {
    ($($holder:ident => $kind:ident),*) => {$(
        unsafe impl<T: Inspect> Inspect for $holder<T> {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Reference(ReferenceKind::$kind))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                let target: &dyn Inspect = &**self;
                Shape::Reference(Some(target))
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(data_address::<T>(&**self), out);
            }
        }
    )*};
}

pointer!(Box => Box, Rc => Rc, Arc => Arc);

unsafe impl<'r, T: Inspect> Inspect for &'r T {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Reference(ReferenceKind::Borrow))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        let target: &dyn Inspect = *self;
        Shape::Reference(Some(target))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_address(data_address::<T>(*self), out);
    }
}

unsafe impl<T: Inspect> Inspect for rc::Weak<T> {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Reference(ReferenceKind::Weak))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        if self.strong_count() == 0 {
            return Shape::Reference(None);
        }
        // SAFETY: a strong reference exists, so the value is alive. `Weak` is
        // `!Send` and the walk runs to completion on this thread without
        // dropping anything, so the value outlives the returned borrow.
        let target: &dyn Inspect = unsafe { &*self.as_ptr() };
        Shape::Reference(Some(target))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_address(self.as_ptr() as *const () as usize, out);
    }
}

unsafe impl<T: Inspect> Inspect for Option<T> {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Reference(ReferenceKind::Option))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        match self {
            Some(value) => {
                let target: &dyn Inspect = value;
                Shape::Reference(Some(target))
            }
            None => Shape::Reference(None),
        }
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        match self {
            Some(value) => {
                out.push(1);
                value.write_repr(out);
            }
            None => out.push(0),
        }
    }
}

macro_rules! dyn_pointer {
    ($($holder:ty),* $(,)?) => {$(
        unsafe impl Inspect for $holder {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Reference(ReferenceKind::Dyn))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                let target: &dyn Inspect = &**self;
                Shape::Reference(Some(target))
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(address_of(&**self), out);
            }
        }
    )*};
}

dyn_pointer! {
    Box<dyn Inspect>,
    Box<dyn Inspect + Send>,
    Box<dyn Inspect + Send + Sync>,
    Rc<dyn Inspect>,
    Arc<dyn Inspect + Send + Sync>,
}

unsafe impl<'r> Inspect for &'r dyn Inspect {
    fn describe() -> TypeInfo {
        TypeInfo::leaf::<Self>(Kind::Reference(ReferenceKind::Dyn))
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        Shape::Reference(Some(*self))
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        write_address(address_of(*self), out);
    }
}

// ---------------------------------------------------------------------------
// Interior mutability
// ---------------------------------------------------------------------------

fn cell_value<T>(cell: &Cell<T>) -> &T {
    // SAFETY: `Cell` is `!Sync`, and the `Inspect` contract forbids any
    // inspected code from writing while a walk holds this borrow.
    unsafe { &*cell.as_ptr() }
}

unsafe impl<T: Inspect + Copy> Inspect for Cell<T> {
    fn describe() -> TypeInfo {
        TypeInfo::transparent::<Self>(T::describe())
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        cell_value(self).shape()
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        cell_value(self).write_repr(out);
    }
}

unsafe impl<T: Inspect> Inspect for RefCell<T> {
    fn describe() -> TypeInfo {
        TypeInfo::transparent::<Self>(T::describe()).with_interior_borrow()
    }

    fn type_info(&self) -> TypeInfo {
        Self::describe()
    }

    fn shape(&self) -> Shape<'_> {
        // SAFETY: `RefCell` is `!Sync`, the borrow flag shows no `RefMut`
        // alive, and the `Inspect` contract forbids any inspected code from
        // starting one while the walk holds this view.
        match unsafe { self.try_borrow_unguarded() } {
            Ok(value) => value.shape(),
            Err(_) => Shape::Locked,
        }
    }

    fn write_repr(&self, out: &mut Vec<u8>) {
        // SAFETY: as in `shape`.
        if let Ok(value) = unsafe { self.try_borrow_unguarded() } {
            value.write_repr(out);
        }
    }
}

// ---------------------------------------------------------------------------
// Inherently unsafe kinds
// ---------------------------------------------------------------------------

macro_rules! raw_pointer {
    ($($ptr:ty),*) => {$(
        unsafe impl<T: ?Sized> Inspect for $ptr {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Unsafe(UnsafeKind::RawPointer))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Unsafe(self.cast::<()>() as usize)
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(self.cast::<()>() as usize, out);
            }
        }
    )*};
}

raw_pointer!(*const T, *mut T);

macro_rules! fn_pointer {
    ($($arg:ident),*) => {
        unsafe impl<R $(, $arg)*> Inspect for fn($($arg),*) -> R {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Unsafe(UnsafeKind::Callable))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Unsafe(*self as usize)
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(*self as usize, out);
            }
        }
    };
}

fn_pointer!();
fn_pointer!(A);
fn_pointer!(A, B);
fn_pointer!(A, B, C);
fn_pointer!(A, B, C, D);

macro_rules! callable_object {
    ($($holder:ty),* $(,)?) => {$(
        unsafe impl<R: 'static> Inspect for $holder {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Unsafe(UnsafeKind::Callable))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Unsafe(data_address(&**self))
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_fat_pointer(&**self, out);
            }
        }
    )*};
}

callable_object! {
    Box<dyn Fn() -> R>,
    Box<dyn Fn() -> R + Send + Sync>,
    Box<dyn FnMut() -> R>,
    Box<dyn FnMut() -> R + Send>,
    Arc<dyn Fn() -> R + Send + Sync>,
}

macro_rules! channel {
    ($($handle:ident),*) => {$(
        unsafe impl<T> Inspect for $handle<T> {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Unsafe(UnsafeKind::Channel))
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Unsafe(channel_state(self))
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(channel_state(self), out);
            }
        }
    )*};
}

channel!(Sender, SyncSender, Receiver);

// ---------------------------------------------------------------------------
// Untyped
// ---------------------------------------------------------------------------

macro_rules! untyped {
    ($([$($lt:lifetime)?] $holder:ty),* $(,)?) => {$(
        unsafe impl<$($lt)?> Inspect for $holder {
            fn describe() -> TypeInfo {
                TypeInfo::leaf::<Self>(Kind::Untyped)
            }

            fn type_info(&self) -> TypeInfo {
                Self::describe()
            }

            fn shape(&self) -> Shape<'_> {
                Shape::Untyped
            }

            fn write_repr(&self, out: &mut Vec<u8>) {
                write_address(data_address(&**self), out);
            }
        }
    )*};
}

untyped! {
    [] Box<dyn Any>,
    [] Box<dyn Any + Send>,
    [] Box<dyn Any + Send + Sync>,
    ['r] &'r dyn Any,
}
