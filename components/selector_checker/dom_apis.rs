/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Generic implementations of the selector-based DOM APIs, on top of the
//! checker.

use smallvec::SmallVec;

use crate::context::{MatchingContext, MatchingMode, QuirksMode};
use crate::has_cache::HasCacheScope;
use crate::matching;
use crate::nth_index_cache::NthIndexCache;
use crate::parser::SelectorList;
use crate::scope::ScopeNode;
use crate::tree::Element;

/// <https://dom.spec.whatwg.org/#dom-element-matches>
pub fn element_matches<E>(
    element: &E,
    selector_list: &SelectorList,
    quirks_mode: QuirksMode,
) -> bool
where
    E: Element,
{
    let mut context = MatchingContext::new(MatchingMode::QueryingRules, quirks_mode);
    context.scope = Some(ScopeNode::Element(element.clone()));
    matching::matches_selector_list(selector_list, element, &mut context)
}

/// <https://dom.spec.whatwg.org/#dom-element-closest>
pub fn element_closest<E>(
    element: E,
    selector_list: &SelectorList,
    quirks_mode: QuirksMode,
) -> Option<E>
where
    E: Element,
{
    let mut nth_index_cache = NthIndexCache::from_prefs();

    let mut context = MatchingContext::new(MatchingMode::QueryingRules, quirks_mode)
        .with_nth_index_cache(&mut nth_index_cache);
    context.scope = Some(ScopeNode::Element(element.clone()));

    let mut current = Some(element);
    while let Some(element) = current.take() {
        if matching::matches_selector_list(selector_list, &element, &mut context) {
            return Some(element);
        }
        current = element.parent_element();
    }

    None
}

/// The result of a querySelector call.
pub type QuerySelectorResult<E> = SmallVec<[E; 128]>;

/// The query kind we're doing (either only the first descendant that matches or
/// all of them).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuerySelectorKind {
    /// <https://dom.spec.whatwg.org/#dom-parentnode-queryselectorall>
    All,
    /// <https://dom.spec.whatwg.org/#dom-parentnode-queryselector>
    First,
}

/// The element after `element` in tree order, without leaving `root`.
fn next_in_preorder<E: Element>(element: &E, root: &E) -> Option<E> {
    if let Some(child) = element.first_element_child() {
        return Some(child);
    }
    let mut current = element.clone();
    loop {
        if current.is_same(root) {
            return None;
        }
        if let Some(sibling) = current.next_sibling_element() {
            return Some(sibling);
        }
        current = current.parent_element()?;
    }
}

/// <https://dom.spec.whatwg.org/#dom-parentnode-queryselector>
///
/// Appends the descendants of `root` matching `selector_list` to `results`,
/// in tree order. `root` is the `:scope`. One nth-index cache and one `:has()`
/// cache serve the whole query, since the tree doesn't change during it.
pub fn query_selector<E: Element>(
    root: E,
    selector_list: &SelectorList,
    results: &mut QuerySelectorResult<E>,
    kind: QuerySelectorKind,
    quirks_mode: QuirksMode,
) {
    let mut nth_index_cache = NthIndexCache::from_prefs();
    let mut has_cache = HasCacheScope::new();
    let mut context = MatchingContext::new(MatchingMode::QueryingRules, quirks_mode)
        .with_nth_index_cache(&mut nth_index_cache)
        .with_has_cache(&mut has_cache);
    context.scope = Some(ScopeNode::Element(root.clone()));

    let mut current = next_in_preorder(&root, &root);
    while let Some(element) = current {
        if matching::matches_selector_list(selector_list, &element, &mut context) {
            results.push(element.clone());
            if kind == QuerySelectorKind::First {
                return;
            }
        }
        current = next_in_preorder(&element, &root);
    }
}
