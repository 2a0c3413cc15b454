/// Implement [`Inspect`](crate::Inspect) for a struct with named fields.
///
/// List every field with its type. Fields left out are not fingerprinted.
///
/// ```
/// use immcheck_core::inspect_struct;
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// inspect_struct!(Point { x: i32, y: i32 });
///
/// struct Labeled<T> {
///     label: String,
///     value: T,
/// }
///
/// inspect_struct!(impl<T> Labeled<T> { label: String, value: T });
/// ```
#[macro_export]
macro_rules! inspect_struct {
    (impl<$($param:ident),+ $(,)?> $name:ident<$($arg:ident),+ $(,)?> {
        $($field:ident : $fty:ty),* $(,)?
    }) => {
        // SAFETY: the generated methods only read fields through their own
        // `Inspect` impls.
        unsafe impl<$($param: $crate::Inspect),+> $crate::Inspect for $name<$($arg),+> {
            $crate::inspect_struct!(@body $($field : $fty),*);
        }

        impl<$($param: $crate::Inspect),+> $crate::Members for $name<$($arg),+> {
            $crate::inspect_struct!(@members $($field),*);
        }
    };

    ($name:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        // SAFETY: as above.
        unsafe impl $crate::Inspect for $name {
            $crate::inspect_struct!(@body $($field : $fty),*);
        }

        impl $crate::Members for $name {
            $crate::inspect_struct!(@members $($field),*);
        }
    };

    (@body $($field:ident : $fty:ty),*) => {
        fn describe() -> $crate::TypeInfo {
            $crate::TypeInfo::aggregate::<Self>()
        }

        fn describe_fields(visit: &mut dyn FnMut($crate::TypeInfo)) {
            let _ = &visit;
            $(visit(<$fty as $crate::Inspect>::describe());)*
        }

        fn type_info(&self) -> $crate::TypeInfo {
            <Self as $crate::Inspect>::describe()
        }

        fn shape(&self) -> $crate::Shape<'_> {
            $crate::Shape::Aggregate(self)
        }

        fn write_repr(&self, out: &mut Vec<u8>) {
            let _ = &out;
            $($crate::Inspect::write_repr(&self.$field, out);)*
        }
    };

    (@members $($field:ident),*) => {
        fn for_each_member<'a>(&'a self, visit: &mut dyn FnMut(&'a dyn $crate::Inspect)) {
            let _ = &visit;
            $(visit(&self.$field);)*
        }
    };
}
