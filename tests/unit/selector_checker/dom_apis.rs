/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use selector_checker::context::QuirksMode;
use selector_checker::dom_apis::{
    element_closest, element_matches, query_selector, QuerySelectorKind, QuerySelectorResult,
};
use selector_checker::parser::{
    Combinator, Component, PseudoClass, PseudoElement, SelectorBuilder, SelectorList,
};

use crate::dom::{Document, El};

fn indices(results: &QuerySelectorResult<El<'_>>) -> Vec<usize> {
    results.iter().map(|element| element.index).collect()
}

fn query(doc: &Document, root: usize, list: &SelectorList, kind: QuerySelectorKind) -> Vec<usize> {
    let mut results = QuerySelectorResult::new();
    query_selector(doc.get(root), list, &mut results, kind, QuirksMode::NoQuirks);
    indices(&results)
}

#[test]
fn matches_the_element_itself() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "ul");
    let item = doc.add(list, "li.active");
    let element = doc.get(item);

    let active = SelectorBuilder::new().tag("li").class("active").build_list();
    assert!(element_matches(&element, &active, QuirksMode::NoQuirks));
    let inactive = SelectorBuilder::new().class("inactive").build_list();
    assert!(!element_matches(&element, &inactive, QuirksMode::NoQuirks));

    // Pseudo-elements never match elements.
    let before = SelectorBuilder::new()
        .tag("li")
        .pseudo_element(PseudoElement::Before)
        .build_list();
    assert!(!element_matches(&element, &before, QuirksMode::NoQuirks));

    // :scope is the element being tested.
    let scope = SelectorBuilder::new().pseudo_class(PseudoClass::Scope).build_list();
    assert!(element_matches(&element, &scope, QuirksMode::NoQuirks));
    let scope_child = SelectorBuilder::new()
        .pseudo_class(PseudoClass::Scope)
        .child()
        .tag("li")
        .build_list();
    assert!(!element_matches(&doc.get(list), &scope_child, QuirksMode::NoQuirks));
    assert!(!element_matches(&element, &scope_child, QuirksMode::NoQuirks));

    // ul:has(> li)
    let has_item = SelectorBuilder::new()
        .tag("ul")
        .push(Component::Has(SelectorList::single(
            SelectorBuilder::relative(Combinator::Child).tag("li").build(),
        )))
        .build_list();
    assert!(element_matches(&doc.get(list), &has_item, QuirksMode::NoQuirks));
    assert!(!element_matches(&element, &has_item, QuirksMode::NoQuirks));
}

#[test]
fn closest_walks_inclusive_ancestors() {
    let mut doc = Document::html();
    let outer = doc.add(Document::ROOT, "div.outer");
    let inner = doc.add(outer, "div.inner");
    let span = doc.add(inner, "span");

    let div = SelectorBuilder::new().tag("div").build_list();
    let closest = |index: usize, list: &SelectorList| {
        element_closest(doc.get(index), list, QuirksMode::NoQuirks).map(|element| element.index)
    };
    assert_eq!(closest(span, &div), Some(inner));
    assert_eq!(closest(inner, &div), Some(inner));

    let outer_class = SelectorBuilder::new().class("outer").build_list();
    assert_eq!(closest(span, &outer_class), Some(outer));

    let table = SelectorBuilder::new().tag("table").build_list();
    assert_eq!(closest(span, &table), None);
}

#[test]
fn query_selector_all_and_first() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "ul.top");
    let first = doc.add(list, "li.x");
    let nested_list = doc.add(first, "ul");
    let nested = doc.add_many(nested_list, "li.x", 2);
    let second = doc.add(list, "li");
    let third = doc.add(list, "li.x");

    let x = SelectorBuilder::new().class("x").build_list();
    // Tree order.
    assert_eq!(
        query(&doc, list, &x, QuerySelectorKind::All),
        [first, nested[0], nested[1], third]
    );
    assert_eq!(query(&doc, list, &x, QuerySelectorKind::First), [first]);

    // :scope > li leaves the nested items out.
    let children = SelectorBuilder::new()
        .pseudo_class(PseudoClass::Scope)
        .child()
        .tag("li")
        .build_list();
    assert_eq!(
        query(&doc, list, &children, QuerySelectorKind::All),
        [first, second, third]
    );

    // The root itself is never a result, but selectors still see its
    // ancestors and it.
    let ul = SelectorBuilder::new().tag("ul").build_list();
    assert_eq!(query(&doc, list, &ul, QuerySelectorKind::All), [nested_list]);
    let under_top = SelectorBuilder::new()
        .class("top")
        .descendant()
        .tag("ul")
        .build_list();
    assert_eq!(query(&doc, first, &under_top, QuerySelectorKind::All), [nested_list]);

    let missing = SelectorBuilder::new().tag("table").build_list();
    assert!(query(&doc, list, &missing, QuerySelectorKind::First).is_empty());
}

#[test]
fn query_selector_with_long_sibling_lists() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "ol");
    let items = doc.add_many(list, "li", 100);

    let even = SelectorBuilder::new()
        .push(Component::nth_child(2, 0))
        .build_list();
    let expected: Vec<usize> = items.iter().copied().skip(1).step_by(2).collect();
    assert_eq!(query(&doc, list, &even, QuerySelectorKind::All), expected);

    let last_three = SelectorBuilder::new()
        .push(Component::nth_last_child(-1, 3))
        .build_list();
    assert_eq!(
        query(&doc, list, &last_three, QuerySelectorKind::All),
        &items[97..]
    );
}
