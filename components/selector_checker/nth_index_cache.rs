/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Sibling indices for the `:nth-*` pseudo-classes.
//!
//! Every lookup starts as a plain sibling scan. When a scan walks past more
//! siblings than the configured threshold, the positions of every
//! `stride`-th matching sibling are memoized for the parent, so that later
//! lookups under the same parent only walk back to the nearest sample.
//!
//! The cache belongs to one matching pass and must be dropped before the
//! tree changes.

use log::debug;
use rustc_hash::FxHashMap;

use crate::parser::{LocalName, Namespace};
use crate::tree::{Element, OpaqueElement};

pub const DEFAULT_SIBLING_THRESHOLD: usize = 32;
pub const DEFAULT_STRIDE: u32 = 3;

/// Which siblings count towards an index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NthFilter {
    /// Every element sibling (`:nth-child`).
    Child,
    /// Siblings matching a selector list, by list identity
    /// (`:nth-child(An+B of S)`).
    ChildOf(usize),
    /// Siblings with the same qualified name (`:nth-of-type`).
    OfType(LocalName, Namespace),
}

impl NthFilter {
    pub fn of_type<E: Element>(element: &E) -> Self {
        NthFilter::OfType(element.local_name().clone(), element.namespace().clone())
    }
}

/// The node whose children an index counts within.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum SiblingParent {
    Element(OpaqueElement),
    /// The shadow root of the given host.
    ShadowRoot(OpaqueElement),
}

impl SiblingParent {
    fn of<E: Element>(element: &E) -> Option<Self> {
        if element.parent_node_is_shadow_root() {
            return element
                .containing_shadow_host()
                .map(|host| SiblingParent::ShadowRoot(host.opaque()));
        }
        element
            .parent_element()
            .map(|parent| SiblingParent::Element(parent.opaque()))
    }
}

/// Sampled positions of the filtered children of one parent.
#[derive(Debug, Default)]
struct NthIndexData {
    samples: FxHashMap<OpaqueElement, u32>,
    count: u32,
}

impl NthIndexData {
    fn build<E, F>(element: &E, stride: u32, matches: &mut F) -> Self
    where
        E: Element,
        F: FnMut(&E) -> bool,
    {
        let mut first = element.clone();
        while let Some(prev) = first.prev_sibling_element() {
            first = prev;
        }

        let mut data = NthIndexData::default();
        let mut sibling = Some(first);
        while let Some(current) = sibling {
            if matches(&current) {
                data.count += 1;
                if data.count % stride == 0 {
                    data.samples.insert(current.opaque(), data.count);
                }
            }
            sibling = current.next_sibling_element();
        }
        data
    }

    fn nth_index<E, F>(&self, element: &E, matches: &mut F) -> u32
    where
        E: Element,
        F: FnMut(&E) -> bool,
    {
        let mut index = 0;
        let mut sibling = Some(element.clone());
        while let Some(current) = sibling {
            if let Some(sampled) = self.samples.get(&current.opaque()) {
                return sampled + index;
            }
            index += 1;
            sibling = previous_matching(&current, matches);
        }
        index
    }

    fn nth_last_index<E, F>(&self, element: &E, matches: &mut F) -> u32
    where
        E: Element,
        F: FnMut(&E) -> bool,
    {
        self.count - self.nth_index(element, matches) + 1
    }
}

fn previous_matching<E, F>(element: &E, matches: &mut F) -> Option<E>
where
    E: Element,
    F: FnMut(&E) -> bool,
{
    let mut sibling = element.prev_sibling_element();
    while let Some(current) = sibling {
        if matches(&current) {
            return Some(current);
        }
        sibling = current.prev_sibling_element();
    }
    None
}

/// Counts `element` and the matching siblings before it (or after it, when
/// `from_end`). Also returns how many siblings were visited.
pub fn uncached_nth_index<E, F>(element: &E, from_end: bool, mut matches: F) -> (u32, usize)
where
    E: Element,
    F: FnMut(&E) -> bool,
{
    let step = |e: &E| {
        if from_end {
            e.next_sibling_element()
        } else {
            e.prev_sibling_element()
        }
    };
    let mut index = 1;
    let mut visited = 0;
    let mut sibling = step(element);
    while let Some(current) = sibling {
        visited += 1;
        if matches(&current) {
            index += 1;
        }
        sibling = step(&current);
    }
    (index, visited)
}

#[derive(Debug)]
pub struct NthIndexCache {
    entries: FxHashMap<(SiblingParent, NthFilter), NthIndexData>,
    sibling_threshold: usize,
    stride: u32,
}

impl Default for NthIndexCache {
    fn default() -> Self {
        Self::new(DEFAULT_SIBLING_THRESHOLD, DEFAULT_STRIDE)
    }
}

impl NthIndexCache {
    pub fn new(sibling_threshold: usize, stride: u32) -> Self {
        NthIndexCache {
            entries: FxHashMap::default(),
            sibling_threshold,
            stride: stride.max(1),
        }
    }

    /// A cache configured from the runtime preferences.
    pub fn from_prefs() -> Self {
        let threshold =
            style_config::get_i32(style_config::NTH_INDEX_CACHE_SIBLING_THRESHOLD).max(0);
        let stride = style_config::get_i32(style_config::NTH_INDEX_CACHE_STRIDE).max(1);
        Self::new(threshold as usize, stride as u32)
    }

    /// Number of parents with memoized indices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The 1-based position of `element` among the siblings `matches` accepts,
    /// counted from the start or, when `from_end`, from the end.
    ///
    /// `element` itself must be one of those siblings.
    pub fn nth_index<E, F>(
        &mut self,
        element: &E,
        filter: &NthFilter,
        from_end: bool,
        mut matches: F,
    ) -> u32
    where
        E: Element,
        F: FnMut(&E) -> bool,
    {
        let Some(parent) = SiblingParent::of(element) else {
            return 1;
        };

        let key = (parent, filter.clone());
        if let Some(data) = self.entries.get(&key) {
            let index = if from_end {
                data.nth_last_index(element, &mut matches)
            } else {
                data.nth_index(element, &mut matches)
            };
            debug_assert_eq!(
                index,
                uncached_nth_index(element, from_end, &mut matches).0,
                "Cached nth index disagrees with a sibling scan"
            );
            return index;
        }

        let (index, visited) = uncached_nth_index(element, from_end, &mut matches);
        if visited > self.sibling_threshold {
            let data = NthIndexData::build(element, self.stride, &mut matches);
            debug!(
                "Caching {} nth indices for {:?} ({:?})",
                data.count, parent, filter
            );
            self.entries.insert(key, data);
        }
        index
    }
}

fn lookup<E, F>(
    element: &E,
    cache: Option<&mut NthIndexCache>,
    filter: NthFilter,
    from_end: bool,
    mut matches: F,
) -> u32
where
    E: Element,
    F: FnMut(&E) -> bool,
{
    match cache {
        Some(cache) => cache.nth_index(element, &filter, from_end, matches),
        None => {
            if SiblingParent::of(element).is_none() {
                return 1;
            }
            uncached_nth_index(element, from_end, &mut matches).0
        },
    }
}

pub fn nth_child_index<E: Element>(element: &E, cache: Option<&mut NthIndexCache>) -> u32 {
    lookup(element, cache, NthFilter::Child, false, |_| true)
}

pub fn nth_last_child_index<E: Element>(element: &E, cache: Option<&mut NthIndexCache>) -> u32 {
    lookup(element, cache, NthFilter::Child, true, |_| true)
}

pub fn nth_of_type_index<E: Element>(element: &E, cache: Option<&mut NthIndexCache>) -> u32 {
    let filter = NthFilter::of_type(element);
    lookup(element, cache, filter, false, |sibling| same_type(element, sibling))
}

pub fn nth_last_of_type_index<E: Element>(
    element: &E,
    cache: Option<&mut NthIndexCache>,
) -> u32 {
    let filter = NthFilter::of_type(element);
    lookup(element, cache, filter, true, |sibling| same_type(element, sibling))
}

/// `:nth-child(An+B of S)`: `matches` tests a sibling against `S`, whose
/// identity is `list_key`.
pub fn nth_child_index_of<E, F>(
    element: &E,
    cache: Option<&mut NthIndexCache>,
    list_key: usize,
    from_end: bool,
    matches: F,
) -> u32
where
    E: Element,
    F: FnMut(&E) -> bool,
{
    lookup(element, cache, NthFilter::ChildOf(list_key), from_end, matches)
}

#[inline]
pub fn same_type<E: Element>(a: &E, b: &E) -> bool {
    a.local_name() == b.local_name() && a.namespace() == b.namespace()
}
