//! Graph traversal that fills a [`Fingerprint`].
//!
//! The walk is iterative: values waiting to be visited sit on an explicit
//! stack, so deep graphs cannot overflow the call stack. Every reference
//! target is recorded in a visited set before it is pushed, which makes
//! cycles and shared aliases terminate after one visit.

use std::collections::HashSet;

use crate::cache::TypeCache;
use crate::classify::TypeClassifier;
use crate::error::{CheckError, Result, Unsupported};
use crate::fingerprint::Fingerprint;
use crate::inspect::{address_of, Inspect, Shape};
use crate::types::{Digest, Locator};

/// Traversal settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    /// Record raw pointers, callables and channels by their handle instead
    /// of failing.
    pub allow_unsafe_kinds: bool,
    /// Memoize aggregate classification in the global [`TypeCache`].
    pub use_type_cache: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            allow_unsafe_kinds: false,
            use_type_cache: true,
        }
    }
}

/// Scratch state reused across traversals.
#[derive(Debug, Default)]
pub struct Workspace {
    visited: HashSet<Locator>,
    scratch: Vec<u8>,
}

impl Workspace {
    pub fn clear(&mut self) {
        self.visited.clear();
        self.scratch.clear();
    }
}

/// Walks one value graph into a fingerprint.
pub struct GraphWalker<'w, 'v> {
    fingerprint: &'w mut Fingerprint,
    workspace: &'w mut Workspace,
    pending: Vec<&'v dyn Inspect>,
    classifier: TypeClassifier<'static>,
    config: WalkConfig,
}

impl<'w, 'v> GraphWalker<'w, 'v> {
    pub fn new(
        fingerprint: &'w mut Fingerprint,
        workspace: &'w mut Workspace,
        config: WalkConfig,
    ) -> Self {
        let classifier = if config.use_type_cache {
            TypeClassifier::with_cache(TypeCache::global())
        } else {
            TypeClassifier::uncached()
        };
        Self {
            fingerprint,
            workspace,
            pending: Vec::new(),
            classifier,
            config,
        }
    }

    /// Traverse everything reachable from `root`.
    ///
    /// Fails on a nil or untyped root, and on any unsupported value met on
    /// the way. The visited set is cleared whatever the outcome.
    pub fn walk(mut self, root: &'v dyn Inspect) -> Result<()> {
        self.workspace.clear();
        let result = self.run(root);
        self.workspace.clear();
        result
    }

    fn run(&mut self, root: &'v dyn Inspect) -> Result<()> {
        if let Shape::Reference(None) = root.shape() {
            return Err(CheckError::unsupported(
                &root.type_info(),
                Unsupported::NilRoot,
            ));
        }

        self.pending.push(root);
        while let Some(value) = self.pending.pop() {
            self.visit(value)?;
        }
        Ok(())
    }

    fn visit(&mut self, value: &'v dyn Inspect) -> Result<()> {
        let info = value.type_info();
        let address = address_of(value);
        let locator = Locator::new(address, &info);

        match value.shape() {
            Shape::Scalar(bytes) => {
                self.fingerprint.insert(locator, Digest::content(bytes));
            }

            Shape::Aggregate(members) => {
                let scratch = &mut self.workspace.scratch;
                scratch.clear();
                value.write_repr(scratch);
                self.fingerprint.insert(locator, Digest::content(scratch));

                if !self.classifier.is_primitive(&info) {
                    let classifier = self.classifier;
                    let pending = &mut self.pending;
                    members.for_each_member(&mut |member| {
                        if !classifier.is_primitive(&member.type_info()) {
                            pending.push(member);
                        }
                    });
                }
            }

            Shape::Sequence(seq) => {
                if seq.len == 0 || seq.data == 0 {
                    self.fingerprint
                        .insert(locator, Digest::from_address(address));
                    return Ok(());
                }

                let digest = match seq.bytes {
                    Some(bytes) => Digest::content(bytes),
                    None => {
                        let scratch = &mut self.workspace.scratch;
                        scratch.clear();
                        seq.items
                            .for_each_member(&mut |item| item.write_repr(scratch));
                        Digest::content(scratch)
                    }
                };
                self.fingerprint.insert(
                    Locator::new(seq.data, &info),
                    digest.with_len(seq.len),
                );

                if !self.classifier.is_primitive(&seq.elem) {
                    let pending = &mut self.pending;
                    seq.items.for_each_member(&mut |item| pending.push(item));
                }
            }

            Shape::Map { len, entries } => {
                if len == 0 {
                    self.fingerprint
                        .insert(locator, Digest::from_address(address));
                    return Ok(());
                }

                self.fingerprint.insert(locator, Digest::from_count(len));
                let pending = &mut self.pending;
                entries.for_each_member(&mut |entry| pending.push(entry));
            }

            Shape::Reference(None) => {
                self.fingerprint
                    .insert(locator, Digest::from_address(address));
            }

            Shape::Reference(Some(target)) => {
                let target_address = address_of(target);
                self.fingerprint
                    .insert(locator, Digest::from_address(target_address));

                let target_locator = Locator::new(target_address, &target.type_info());
                if self.workspace.visited.insert(target_locator) {
                    self.pending.push(target);
                }
            }

            Shape::Unsafe(_) => {
                if !self.config.allow_unsafe_kinds {
                    return Err(CheckError::unsupported(&info, Unsupported::UnsafeKind));
                }
                // The repr carries the whole handle, vtable included.
                let scratch = &mut self.workspace.scratch;
                scratch.clear();
                value.write_repr(scratch);
                self.fingerprint.insert(locator, Digest::content(scratch));
            }

            Shape::Locked => {
                return Err(CheckError::unsupported(&info, Unsupported::Borrowed));
            }

            Shape::Untyped => {
                return Err(CheckError::unsupported(&info, Unsupported::Untyped));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::kind::Kind;

    fn capture(root: &dyn Inspect, config: WalkConfig) -> Result<Fingerprint> {
        let mut fingerprint = Fingerprint::new();
        let mut workspace = Workspace::default();
        GraphWalker::new(&mut fingerprint, &mut workspace, config).walk(root)?;
        Ok(fingerprint)
    }

    fn fingerprint(root: &dyn Inspect) -> Fingerprint {
        capture(root, WalkConfig::default()).unwrap()
    }

    #[test]
    fn test_scalar_run_is_one_entry() {
        let values = vec![1u64; 1024];
        assert_eq!(fingerprint(&values).len(), 1);
    }

    #[test]
    fn test_primitive_aggregate_is_not_recursed() {
        let value = (1u8, (2u16, 3u32));
        assert_eq!(fingerprint(&value).len(), 1);
    }

    #[test]
    fn test_non_primitive_fields_are_recursed() {
        let value = (1u8, String::from("abc"));
        // the tuple plus the string's buffer
        assert_eq!(fingerprint(&value).len(), 2);
    }

    #[test]
    fn test_mutation_changes_fingerprint() {
        let mut values = vec![1u32, 2, 3, 4];
        let before = fingerprint(&values);
        values[0] = 99;
        let after = fingerprint(&values);
        assert_ne!(before, after);
        assert_eq!(after, fingerprint(&values));
    }

    #[test]
    fn test_zero_sized_elements_track_length() {
        let mut units = vec![(), ()];
        let before = fingerprint(&units);
        units.push(());
        assert_ne!(before, fingerprint(&units));
    }

    #[test]
    fn test_empty_sequence_is_terminal() {
        let empty: Vec<String> = Vec::new();
        let print = fingerprint(&empty);
        assert_eq!(print.len(), 1);
        let (locator, digest) = print.iter().next().unwrap();
        assert_eq!(digest.as_u64(), locator.address() as u64);
    }

    #[test]
    fn test_map_records_entry_count_and_entries() {
        let mut map = HashMap::new();
        map.insert(String::from("a"), 1u32);
        map.insert(String::from("b"), 2u32);
        let print = fingerprint(&map);
        // map header, two key buffers, two values
        assert_eq!(print.len(), 5);
        assert!(print
            .iter()
            .any(|(locator, digest)| locator.kind() == Kind::Map && digest.as_u64() == 2));
    }

    #[test]
    fn test_nil_root_fails() {
        let none: Option<u8> = None;
        let err = capture(&none, WalkConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CheckError::UnsupportedType {
                reason: Unsupported::NilRoot,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_nil_is_terminal() {
        let value: (u8, Option<Box<u8>>) = (1, None);
        assert_eq!(fingerprint(&value).len(), 2);
    }

    #[test]
    fn test_unsafe_kind_policy() {
        let value: (u8, fn() -> u8) = (1, || 2);
        let err = capture(&value, WalkConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CheckError::UnsupportedType {
                reason: Unsupported::UnsafeKind,
                ..
            }
        ));

        let allowed = WalkConfig {
            allow_unsafe_kinds: true,
            ..WalkConfig::default()
        };
        assert!(capture(&value, allowed).is_ok());
    }

    #[test]
    fn test_untyped_fails_even_when_unsafe_allowed() {
        let value: Box<dyn std::any::Any> = Box::new(1u8);
        let allowed = WalkConfig {
            allow_unsafe_kinds: true,
            ..WalkConfig::default()
        };
        assert!(matches!(
            capture(&value, allowed),
            Err(CheckError::UnsupportedType {
                reason: Unsupported::Untyped,
                ..
            })
        ));
    }

    #[test]
    fn test_locked_refcell_fails() {
        let cell = RefCell::new(vec![1u8]);
        let _guard = cell.borrow_mut();
        assert!(matches!(
            capture(&cell, WalkConfig::default()),
            Err(CheckError::UnsupportedType {
                reason: Unsupported::Borrowed,
                ..
            })
        ));
    }

    #[test]
    fn test_cycle_terminates() {
        struct Node {
            value: u32,
            next: Option<Rc<RefCell<Node>>>,
        }
        crate::inspect_struct!(Node {
            value: u32,
            next: Option<Rc<RefCell<Node>>>
        });

        let a = Rc::new(RefCell::new(Node {
            value: 1,
            next: None,
        }));
        let b = Rc::new(RefCell::new(Node {
            value: 2,
            next: Some(a.clone()),
        }));
        a.borrow_mut().next = Some(b.clone());

        let before = fingerprint(&a);
        assert_eq!(before, fingerprint(&a));

        b.borrow_mut().value = 3;
        assert_ne!(before, fingerprint(&a));

        a.borrow_mut().next = None;
    }

    #[test]
    fn test_shared_alias_visited_once() {
        let shared = Rc::new(String::from("shared"));
        let pair = (shared.clone(), shared.clone());
        // tuple, two rc holders, one string buffer
        assert_eq!(fingerprint(&pair).len(), 4);
    }

    #[test]
    fn test_walk_without_type_cache() {
        let config = WalkConfig {
            use_type_cache: false,
            ..WalkConfig::default()
        };
        let value = (1u8, vec![2u8]);
        assert_eq!(
            capture(&value, config).unwrap(),
            capture(&value, WalkConfig::default()).unwrap()
        );
    }
}
