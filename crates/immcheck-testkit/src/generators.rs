//! Proptest generators for property-based testing.

use std::collections::{BTreeMap, HashMap};

use proptest::prelude::*;

use crate::fixtures::{Person, Profile};

/// A run of scalars, possibly empty.
pub fn scalars(max_len: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(any::<u64>(), 0..=max_len)
}

/// A non-empty byte buffer.
pub fn bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Short lowercase text.
pub fn word() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,15}".prop_map(String::from)
}

pub fn person() -> impl Strategy<Value = Person> {
    (any::<u16>(), any::<u8>()).prop_map(|(age, height)| Person { age, height })
}

pub fn score_map(max_len: usize) -> impl Strategy<Value = HashMap<String, u32>> {
    prop::collection::hash_map(word(), any::<u32>(), 0..=max_len)
}

pub fn ordered_map(max_len: usize) -> impl Strategy<Value = BTreeMap<u32, String>> {
    prop::collection::btree_map(any::<u32>(), word(), 0..=max_len)
}

/// A position in a buffer of `len` bytes and a bit within that byte.
pub fn bit_flip(len: usize) -> impl Strategy<Value = (usize, u8)> {
    (0..len.max(1), 0u8..8)
}

/// Parameters for generating a [`Profile`].
#[derive(Debug, Clone)]
pub struct ProfileParams {
    pub name: String,
    pub tags: Vec<String>,
    pub scores: Vec<(String, u32)>,
    pub manager: Option<Person>,
}

impl Arbitrary for ProfileParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            word(),
            prop::collection::vec(word(), 0..6),
            prop::collection::vec((word(), any::<u32>()), 0..8),
            proptest::option::of(person()),
        )
            .prop_map(|(name, tags, scores, manager)| ProfileParams {
                name,
                tags,
                scores,
                manager,
            })
            .boxed()
    }
}

/// Build a profile from parameters.
pub fn profile_from_params(params: &ProfileParams) -> Profile {
    Profile {
        name: params.name.clone(),
        tags: params.tags.clone(),
        scores: params.scores.iter().cloned().collect(),
        manager: params.manager.map(Box::new),
    }
}
