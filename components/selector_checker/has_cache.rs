/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Caching for `:has()`.
//!
//! A `:has()` argument such as `> .a ~ .b` can only match elements in a
//! bounded region around the anchor element: its *traversal scope*. The
//! [`HasArgumentContext`] works out that region from the shape of the
//! argument, [`HasArgumentTraversal`] walks it, and the [`HasCacheScope`]
//! remembers, per argument selector, which elements were already checked or
//! matched, so that every anchor is evaluated at most once per pass.
//!
//! The cache scope also keeps, per traversal shape and anchor, a Bloom filter
//! of the identifiers found in the traversal scope. Arguments that need an
//! identifier the filter has never seen are rejected without a walk.

use bitflags::bitflags;
use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::bloom::{relative_selector_hashes, BloomFilter};
use crate::element_flags::ElementSelectorFlags;
use crate::parser::{Combinator, Component, Selector};
use crate::tree::{Element, OpaqueElement};

pub const INFINITE_DEPTH: i32 = i32::MAX;
pub const INFINITE_ADJACENT_DISTANCE: i32 = i32::MAX;

bitflags! {
    /// What the cache knows about an element, for one argument selector.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct HasResult: u8 {
        /// The element was checked as a `:has()` anchor.
        const CHECKED = 1 << 0;
        /// The argument matched with the element as its anchor.
        const MATCHED = 1 << 1;
        /// The element, its descendants, its next siblings and their
        /// descendants were all checked as argument subjects.
        const ALL_DESCENDANTS_OR_NEXT_SIBLINGS_CHECKED = 1 << 2;
        /// Some children of the element carry the flag above.
        const SOME_CHILDREN_CHECKED = 1 << 3;
    }
}

/// Where the subjects of a `:has()` argument can be, relative to the anchor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HasTraversalScope {
    /// Any descendant: `:has(.a)`, `:has(.a ~ .b)`.
    Subtree,
    /// Any next sibling: `:has(~ .a)`.
    AllNextSiblings,
    /// The next sibling at a fixed distance: `:has(+ .a + .b)`.
    OneNextSibling,
    /// Descendants at a fixed depth: `:has(> .a > .b)`.
    FixedDepthDescendants,
    /// The subtree of one next sibling: `:has(+ .a .b)`.
    OneNextSiblingSubtree,
    /// The subtrees of all next siblings: `:has(~ .a .b)`.
    AllNextSiblingSubtrees,
    /// Fixed-depth descendants of one next sibling: `:has(+ .a > .b)`.
    OneNextSiblingFixedDepthDescendants,
    /// Fixed-depth descendants of all next siblings: `:has(~ .a > .b)`.
    AllNextSiblingsFixedDepthDescendants,
}

/// Fast-reject filters are shared by arguments with the same traversal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HasTraversalType {
    pub scope: HasTraversalScope,
    pub adjacent_distance_limit: i32,
    pub depth_limit: i32,
}

/// The shape of one `:has()` argument selector.
#[derive(Debug)]
pub struct HasArgumentContext<'s> {
    selector: &'s Selector,
    leftmost_relation: Combinator,
    adjacent_distance_limit: i32,
    depth_limit: i32,
    traversal_scope: HasTraversalScope,
    sibling_combinator_at_rightmost: bool,
    sibling_combinator_between_child_or_descendant_combinator: bool,
    hashes: SmallVec<[u32; 8]>,
}

impl<'s> HasArgumentContext<'s> {
    pub fn new(selector: &'s Selector) -> Self {
        let mut leftmost_relation = Combinator::RelativeDescendant;
        let mut adjacent_distance_limit = 0;
        let mut depth_limit = 0;
        let mut contains_child_or_descendant_combinator = false;
        let mut sibling_combinator_at_leftmost = false;
        let mut sibling_combinator_at_rightmost = false;
        let mut sibling_combinator_between_child_or_descendant_combinator = false;

        // Walk the combinators from the subject compound towards the anchor.
        for component in selector.components() {
            let Component::Combinator(combinator) = *component else {
                continue;
            };
            match combinator {
                Combinator::Descendant | Combinator::RelativeDescendant => {
                    if sibling_combinator_at_leftmost {
                        sibling_combinator_at_leftmost = false;
                        sibling_combinator_between_child_or_descendant_combinator = true;
                    }
                    contains_child_or_descendant_combinator = true;
                    depth_limit = INFINITE_DEPTH;
                    adjacent_distance_limit = 0;
                },
                Combinator::Child | Combinator::RelativeChild => {
                    if sibling_combinator_at_leftmost {
                        sibling_combinator_at_leftmost = false;
                        sibling_combinator_between_child_or_descendant_combinator = true;
                    }
                    contains_child_or_descendant_combinator = true;
                    if depth_limit != INFINITE_DEPTH {
                        depth_limit += 1;
                    }
                    adjacent_distance_limit = 0;
                },
                Combinator::NextSibling | Combinator::RelativeNextSibling => {
                    if contains_child_or_descendant_combinator {
                        sibling_combinator_at_leftmost = true;
                    } else {
                        sibling_combinator_at_rightmost = true;
                    }
                    if adjacent_distance_limit != INFINITE_ADJACENT_DISTANCE {
                        adjacent_distance_limit += 1;
                    }
                },
                Combinator::LaterSibling | Combinator::RelativeLaterSibling => {
                    if contains_child_or_descendant_combinator {
                        sibling_combinator_at_leftmost = true;
                    } else {
                        sibling_combinator_at_rightmost = true;
                    }
                    adjacent_distance_limit = INFINITE_ADJACENT_DISTANCE;
                },
                other => {
                    debug_assert!(false, "Unexpected combinator {:?} in :has() argument", other);
                    continue;
                },
            }
            if combinator.is_relative() {
                leftmost_relation = combinator;
                break;
            }
        }

        let traversal_scope = if adjacent_distance_limit == 0 {
            if depth_limit == INFINITE_DEPTH {
                HasTraversalScope::Subtree
            } else {
                HasTraversalScope::FixedDepthDescendants
            }
        } else if depth_limit == 0 {
            if adjacent_distance_limit == INFINITE_ADJACENT_DISTANCE {
                HasTraversalScope::AllNextSiblings
            } else {
                HasTraversalScope::OneNextSibling
            }
        } else if depth_limit == INFINITE_DEPTH {
            if adjacent_distance_limit == INFINITE_ADJACENT_DISTANCE {
                HasTraversalScope::AllNextSiblingSubtrees
            } else {
                HasTraversalScope::OneNextSiblingSubtree
            }
        } else if adjacent_distance_limit == INFINITE_ADJACENT_DISTANCE {
            HasTraversalScope::AllNextSiblingsFixedDepthDescendants
        } else {
            HasTraversalScope::OneNextSiblingFixedDepthDescendants
        };

        HasArgumentContext {
            selector,
            leftmost_relation,
            adjacent_distance_limit,
            depth_limit,
            traversal_scope,
            sibling_combinator_at_rightmost,
            sibling_combinator_between_child_or_descendant_combinator,
            hashes: relative_selector_hashes(selector),
        }
    }

    #[inline]
    pub fn selector(&self) -> &'s Selector {
        self.selector
    }

    #[inline]
    pub fn leftmost_relation(&self) -> Combinator {
        self.leftmost_relation
    }

    #[inline]
    pub fn adjacent_distance_limit(&self) -> i32 {
        self.adjacent_distance_limit
    }

    #[inline]
    pub fn adjacent_distance_fixed(&self) -> bool {
        self.adjacent_distance_limit != INFINITE_ADJACENT_DISTANCE
    }

    #[inline]
    pub fn depth_limit(&self) -> i32 {
        self.depth_limit
    }

    #[inline]
    pub fn depth_fixed(&self) -> bool {
        self.depth_limit != INFINITE_DEPTH
    }

    #[inline]
    pub fn traversal_scope(&self) -> HasTraversalScope {
        self.traversal_scope
    }

    pub fn traversal_type(&self) -> HasTraversalType {
        HasTraversalType {
            scope: self.traversal_scope,
            adjacent_distance_limit: self.adjacent_distance_limit,
            depth_limit: self.depth_limit,
        }
    }

    #[inline]
    pub fn sibling_combinator_at_rightmost(&self) -> bool {
        self.sibling_combinator_at_rightmost
    }

    #[inline]
    pub fn sibling_combinator_between_child_or_descendant_combinator(&self) -> bool {
        self.sibling_combinator_between_child_or_descendant_combinator
    }

    /// Identifier hashes every subject of the argument must contribute.
    #[inline]
    pub fn hashes(&self) -> &[u32] {
        &self.hashes
    }

    /// The flag that marks an element at depth 0 of the traversal.
    pub fn siblings_affected_by_has_flags(&self) -> ElementSelectorFlags {
        if self.depth_limit == 0 {
            ElementSelectorFlags::SIBLINGS_AFFECTED_BY_HAS_FOR_SIBLING_RELATIONSHIP
        } else {
            ElementSelectorFlags::SIBLINGS_AFFECTED_BY_HAS_FOR_SIBLING_DESCENDANT_RELATIONSHIP
        }
    }

    /// The flag that marks an element found at `depth` of the traversal.
    pub fn affected_by_has_flags_at_depth(&self, depth: i32) -> ElementSelectorFlags {
        if depth > 0 {
            ElementSelectorFlags::ANCESTORS_OR_ANCESTOR_SIBLINGS_AFFECTED_BY_HAS
        } else {
            self.siblings_affected_by_has_flags()
        }
    }

    /// Whether an element at `depth` can't be a subject of the argument.
    pub fn skips_depth(&self, depth: i32) -> bool {
        // Siblings of the anchor are never subjects when the argument goes
        // down the tree, and a fixed depth rules out every other depth.
        (self.depth_limit > 0 && depth == 0) || (self.depth_fixed() && depth != self.depth_limit)
    }
}

/// Walks the traversal scope of an argument around an anchor, in reverse
/// pre-order, along with the depth of each element relative to the anchor.
///
/// Starting from the end makes every element come after the elements it
/// could reach through `~`, `+` or a descendant combinator, which is what
/// lets the cache mark whole regions as checked.
#[derive(Debug)]
pub struct HasArgumentTraversal<E: Element> {
    depth_limit: i32,
    last_element: Option<E>,
    current_element: Option<E>,
    current_depth: i32,
}

impl<E: Element> HasArgumentTraversal<E> {
    pub fn new(anchor: &E, argument: &HasArgumentContext) -> Self {
        let mut traversal = HasArgumentTraversal {
            depth_limit: argument.depth_limit(),
            last_element: None,
            current_element: None,
            current_depth: 0,
        };

        if argument.adjacent_distance_limit() == 0 {
            traversal.last_element = anchor.first_element_child();
            if traversal.last_element.is_none() {
                return traversal;
            }
            traversal.current_element = traversal.last_within(anchor);
            return traversal;
        }

        let Some(next_sibling) = anchor.next_sibling_element() else {
            return traversal;
        };
        traversal.last_element = Some(next_sibling.clone());

        let mut start = next_sibling;
        if argument.adjacent_distance_fixed() {
            let mut distance = 1;
            while distance < argument.adjacent_distance_limit() {
                let Some(next) = start.next_sibling_element() else {
                    break;
                };
                start = next;
                distance += 1;
            }
        } else {
            while let Some(next) = start.next_sibling_element() {
                start = next;
            }
        }

        traversal.current_element = traversal.last_within(&start).or(Some(start));
        traversal
    }

    /// Moves to the previous element in tree order, within the depth limit.
    pub fn advance(&mut self) {
        let Some(current) = self.current_element.take() else {
            return;
        };
        if self.last_element.as_ref().is_some_and(|last| last.is_same(&current)) {
            return;
        }
        if let Some(previous) = current.prev_sibling_element() {
            self.current_element = self.last_within(&previous).or(Some(previous));
            return;
        }
        debug_assert!(self.current_depth > 0);
        self.current_depth -= 1;
        self.current_element = current.parent_element();
    }

    /// The last element of a pre-order walk from `element`, going no deeper
    /// than the depth limit.
    fn last_within(&mut self, element: &E) -> Option<E> {
        if self.current_depth == self.depth_limit {
            return None;
        }
        let mut last_descendant = None;
        let mut descendant = element.last_element_child();
        while let Some(current) = descendant {
            self.current_depth += 1;
            if self.current_depth == self.depth_limit {
                last_descendant = Some(current);
                break;
            }
            descendant = current.last_element_child();
            last_descendant = Some(current);
        }
        last_descendant
    }
}

impl<E: Element> Iterator for HasArgumentTraversal<E> {
    type Item = (E, i32);

    fn next(&mut self) -> Option<(E, i32)> {
        let element = self.current_element.clone()?;
        let depth = self.current_depth;
        self.advance();
        Some((element, depth))
    }
}

/// Identifier hashes of a traversal scope. The Bloom filter is only
/// allocated on the second check of an anchor.
#[derive(Clone, Default)]
pub struct FastRejectFilter {
    bloom: Option<Box<BloomFilter>>,
}

impl FastRejectFilter {
    #[inline]
    pub fn bloom_filter_allocated(&self) -> bool {
        self.bloom.is_some()
    }

    pub fn allocate_bloom_filter(&mut self) {
        self.bloom.get_or_insert_with(Default::default);
    }

    pub fn add_element_hashes<E: Element>(&mut self, element: &E) {
        if let Some(ref mut bloom) = self.bloom {
            bloom.insert_element(element);
        }
    }

    /// True if some hash is certainly missing from the traversal scope.
    pub fn fast_reject(&self, hashes: &[u32]) -> bool {
        match self.bloom {
            Some(ref bloom) => hashes.iter().any(|hash| !bloom.might_contain_hash(*hash)),
            None => false,
        }
    }
}

/// The `:has()` cache for one matching pass.
///
/// Results depend on the current tree, attributes and element state, so a
/// cache scope must be dropped before any of them change.
#[derive(Default)]
pub struct HasCacheScope {
    results: FxHashMap<usize, FxHashMap<OpaqueElement, HasResult>>,
    fast_reject_filters: FxHashMap<HasTraversalType, FxHashMap<OpaqueElement, FastRejectFilter>>,
    bloom_filter_allocation_count: usize,
    traversal_count: usize,
}

impl HasCacheScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache context for one argument selector.
    pub fn context<'c>(&'c mut self, argument: &'c HasArgumentContext) -> HasCacheContext<'c> {
        HasCacheContext {
            results: self.results.entry(argument.selector().key()).or_default(),
            fast_reject_filters: self
                .fast_reject_filters
                .entry(argument.traversal_type())
                .or_default(),
            bloom_filter_allocation_count: &mut self.bloom_filter_allocation_count,
            traversal_count: &mut self.traversal_count,
            argument,
        }
    }

    /// The cached bits of `element` for `argument`.
    pub fn result<E: Element>(&self, argument: &Selector, element: &E) -> HasResult {
        self.results
            .get(&argument.key())
            .and_then(|results| results.get(&element.opaque()))
            .copied()
            .unwrap_or_default()
    }

    /// Number of elements with cached bits for `argument`.
    pub fn result_cache_count(&self, argument: &Selector) -> usize {
        self.results.get(&argument.key()).map_or(0, |results| results.len())
    }

    /// Number of anchors with a fast-reject filter entry, allocated or not,
    /// for the traversal shape of `argument`.
    pub fn fast_reject_filter_cache_count(&self, argument: &Selector) -> usize {
        let traversal_type = HasArgumentContext::new(argument).traversal_type();
        self.fast_reject_filters
            .get(&traversal_type)
            .map_or(0, |filters| filters.len())
    }

    pub fn bloom_filter_allocation_count(&self) -> usize {
        self.bloom_filter_allocation_count
    }

    /// Number of argument traversals that actually ran.
    pub fn traversal_count(&self) -> usize {
        self.traversal_count
    }
}

/// The cache of one argument selector, within a [`HasCacheScope`].
pub struct HasCacheContext<'c> {
    results: &'c mut FxHashMap<OpaqueElement, HasResult>,
    fast_reject_filters: &'c mut FxHashMap<OpaqueElement, FastRejectFilter>,
    bloom_filter_allocation_count: &'c mut usize,
    traversal_count: &'c mut usize,
    argument: &'c HasArgumentContext<'c>,
}

impl<'c> HasCacheContext<'c> {
    pub fn result<E: Element>(&self, element: &E) -> HasResult {
        self.results.get(&element.opaque()).copied().unwrap_or_default()
    }

    /// Ors `bits` into the entry of `element`, returning what was there.
    fn set_result_and_get_old<E: Element>(&mut self, element: &E, bits: HasResult) -> HasResult {
        let entry = self.results.entry(element.opaque()).or_default();
        let old = *entry;
        *entry |= bits;
        old
    }

    pub fn set_checked<E: Element>(&mut self, element: &E) {
        self.set_result_and_get_old(element, HasResult::CHECKED);
    }

    pub fn set_matched_and_get_old_result<E: Element>(&mut self, element: &E) -> HasResult {
        self.set_result_and_get_old(element, HasResult::CHECKED | HasResult::MATCHED)
    }

    fn set_traversed_element_as_checked<E: Element>(&mut self, element: &E, parent: Option<&E>) {
        self.set_result_and_get_old(
            element,
            HasResult::CHECKED | HasResult::ALL_DESCENDANTS_OR_NEXT_SIBLINGS_CHECKED,
        );
        if let Some(parent) = parent {
            self.set_result_and_get_old(parent, HasResult::SOME_CHILDREN_CHECKED);
        }
    }

    /// Marks the region a reverse pre-order traversal covered, from the
    /// first element of the scope up to `last_element` (the last one it
    /// visited, at `last_depth`), as checked.
    pub fn set_all_traversed_elements_as_checked<E: Element>(
        &mut self,
        last_element: &E,
        last_depth: i32,
    ) {
        let include_depth_zero = match self.argument.traversal_scope() {
            HasTraversalScope::Subtree | HasTraversalScope::OneNextSiblingSubtree => false,
            HasTraversalScope::AllNextSiblingSubtrees => true,
            HasTraversalScope::AllNextSiblings => {
                let parent = last_element.parent_element();
                self.set_traversed_element_as_checked(last_element, parent.as_ref());
                return;
            },
            HasTraversalScope::OneNextSibling |
            HasTraversalScope::FixedDepthDescendants |
            HasTraversalScope::OneNextSiblingFixedDepthDescendants |
            HasTraversalScope::AllNextSiblingsFixedDepthDescendants => return,
        };

        let parent = last_element.parent_element();
        let parent = if last_depth > 0 { parent.as_ref() } else { None };
        self.set_traversed_element_as_checked(last_element, parent);

        let mut element = last_element.clone();
        let mut depth = last_depth;
        loop {
            if depth == 0 {
                break;
            }
            let Some(parent) = element.parent_element() else {
                break;
            };
            element = parent;
            depth -= 1;
            if depth == 0 && !include_depth_zero {
                break;
            }
            if let Some(next) = element.next_sibling_element() {
                let parent = element.parent_element();
                self.set_traversed_element_as_checked(&next, parent.as_ref());
            }
        }
    }

    /// Whether the traversal scope of `anchor` lies inside a region an
    /// earlier traversal already marked as checked.
    pub fn already_checked<E: Element>(&self, anchor: &E) -> bool {
        let (start, check_ancestors) = match self.argument.traversal_scope() {
            HasTraversalScope::Subtree => (anchor.clone(), true),
            HasTraversalScope::OneNextSiblingSubtree |
            HasTraversalScope::AllNextSiblingSubtrees => (
                anchor.next_sibling_element().unwrap_or_else(|| anchor.clone()),
                true,
            ),
            HasTraversalScope::AllNextSiblings => (
                anchor.next_sibling_element().unwrap_or_else(|| anchor.clone()),
                false,
            ),
            HasTraversalScope::OneNextSibling |
            HasTraversalScope::FixedDepthDescendants |
            HasTraversalScope::OneNextSiblingFixedDepthDescendants |
            HasTraversalScope::AllNextSiblingsFixedDepthDescendants => return false,
        };

        let mut element = start;
        loop {
            let Some(parent) = element.parent_element() else {
                return false;
            };
            if self.result(&parent).contains(HasResult::SOME_CHILDREN_CHECKED) &&
                self.inclusive_previous_sibling_checked(&element)
            {
                return true;
            }
            if !check_ancestors {
                return false;
            }
            element = parent;
        }
    }

    fn inclusive_previous_sibling_checked<E: Element>(&self, element: &E) -> bool {
        let mut sibling = Some(element.clone());
        while let Some(current) = sibling {
            if self
                .result(&current)
                .contains(HasResult::ALL_DESCENDANTS_OR_NEXT_SIBLINGS_CHECKED)
            {
                return true;
            }
            sibling = current.prev_sibling_element();
        }
        false
    }

    /// The fast-reject filter of `anchor`, and whether it was just created.
    pub fn ensure_fast_reject_filter<E: Element>(
        &mut self,
        anchor: &E,
    ) -> (&mut FastRejectFilter, bool) {
        let mut is_new = false;
        let filter = self
            .fast_reject_filters
            .entry(anchor.opaque())
            .or_insert_with(|| {
                is_new = true;
                FastRejectFilter::default()
            });
        (filter, is_new)
    }

    /// Allocates the Bloom filter of `anchor` and fills it with the
    /// identifiers of its traversal scope. `visit` sees every element of the
    /// scope along with its depth.
    pub fn fill_fast_reject_filter<E, F>(&mut self, anchor: &E, mut visit: F)
    where
        E: Element,
        F: FnMut(&E, i32),
    {
        let argument = self.argument;
        let (filter, _) = self.ensure_fast_reject_filter(anchor);
        if filter.bloom_filter_allocated() {
            return;
        }
        filter.allocate_bloom_filter();
        for (element, depth) in HasArgumentTraversal::new(anchor, argument) {
            filter.add_element_hashes(&element);
            visit(&element, depth);
        }
        *self.bloom_filter_allocation_count += 1;
        debug!(
            "Allocated :has() fast reject filter for {:?} ({:?})",
            anchor.opaque(),
            argument.traversal_scope()
        );
    }

    pub fn fast_reject<E: Element>(&self, anchor: &E, hashes: &[u32]) -> bool {
        self.fast_reject_filters
            .get(&anchor.opaque())
            .is_some_and(|filter| filter.fast_reject(hashes))
    }

    pub(crate) fn note_traversal(&mut self) {
        *self.traversal_count += 1;
    }
}
