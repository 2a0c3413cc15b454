//! Primitive type classification.
//!
//! A type is primitive when it is a scalar, or an aggregate whose fields are
//! all primitive. Primitive values are fully covered by one hash of their
//! representation, so the walker never recurses into them.

use crate::cache::TypeCache;
use crate::inspect::TypeInfo;
use crate::kind::Kind;

/// Decides whether a type is primitive, optionally memoizing aggregates.
#[derive(Clone, Copy)]
pub struct TypeClassifier<'c> {
    cache: Option<&'c TypeCache>,
}

impl TypeClassifier<'static> {
    pub const fn uncached() -> Self {
        Self { cache: None }
    }
}

impl<'c> TypeClassifier<'c> {
    pub const fn with_cache(cache: &'c TypeCache) -> Self {
        Self { cache: Some(cache) }
    }

    pub fn is_primitive(&self, info: &TypeInfo) -> bool {
        if info.has_interior_borrow() {
            return false;
        }
        match info.kind() {
            Kind::Scalar(_) => true,
            Kind::Aggregate => self.aggregate_is_primitive(info),
            _ => false,
        }
    }

    fn aggregate_is_primitive(&self, info: &TypeInfo) -> bool {
        let key = info.key();
        if let Some(verdict) = self.cache.and_then(|cache| cache.load(&key)) {
            return verdict;
        }

        let mut primitive = true;
        info.for_each_field(&mut |field| {
            if primitive && !self.is_primitive(&field) {
                primitive = false;
            }
        });

        if let Some(cache) = self.cache {
            cache.store(key, primitive);
        }
        primitive
    }
}
