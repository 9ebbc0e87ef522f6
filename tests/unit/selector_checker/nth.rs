/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use selector_checker::context::{MatchingContext, MatchingMode, QuirksMode};
use selector_checker::nth_index_cache::{self, same_type, uncached_nth_index, NthIndexCache};
use selector_checker::parser::{
    Component, NthSelectorData, NthType, Selector, SelectorBuilder, SelectorList,
};
use selector_checker::tree::Element;

use crate::dom::Document;
use crate::{matches, matching_among};

#[test]
fn an_plus_b() {
    for a in -3..=3 {
        for b in -3..=5 {
            let nth = NthSelectorData::new(NthType::Child, a, b);
            for index in 1..=20u32 {
                let expected = (0..=40).any(|n| a * n + b == index as i32);
                assert_eq!(
                    nth.matches_index(index),
                    expected,
                    "{}n{:+} at {}",
                    a,
                    b,
                    index
                );
            }
        }
    }
}

#[test]
fn cached_indices_agree_with_sibling_scans() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "div");
    let mut children = Vec::new();
    for i in 0..50 {
        children.push(doc.add(list, if i % 3 == 0 { "p" } else { "span" }));
    }

    let mut cache = NthIndexCache::new(8, 3);
    // Walk backwards too, so lookups hit both sides of the samples.
    for &child in children.iter().chain(children.iter().rev()) {
        let element = doc.get(child);
        assert_eq!(
            nth_index_cache::nth_child_index(&element, Some(&mut cache)),
            uncached_nth_index(&element, false, |_| true).0
        );
        assert_eq!(
            nth_index_cache::nth_last_child_index(&element, Some(&mut cache)),
            uncached_nth_index(&element, true, |_| true).0
        );
        assert_eq!(
            nth_index_cache::nth_of_type_index(&element, Some(&mut cache)),
            uncached_nth_index(&element, false, |sibling| same_type(&element, sibling)).0
        );
        assert_eq!(
            nth_index_cache::nth_last_of_type_index(&element, Some(&mut cache)),
            uncached_nth_index(&element, true, |sibling| same_type(&element, sibling)).0
        );
    }
    // One entry for every element sibling, and one per type.
    assert_eq!(cache.len(), 3);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn short_sibling_lists_are_not_memoized() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "ul");
    let items = doc.add_many(list, "li", 10);

    let mut cache = NthIndexCache::default();
    for (position, &item) in items.iter().enumerate() {
        let index = nth_index_cache::nth_child_index(&doc.get(item), Some(&mut cache));
        assert_eq!(index as usize, position + 1);
    }
    assert!(cache.is_empty());
}

#[test]
fn selectors_match_the_same_with_and_without_a_cache() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "ul");
    let items = doc.add_many(list, "li", 40);

    let selectors = [
        SelectorBuilder::new().push(Component::nth_child(3, 1)).build(),
        SelectorBuilder::new().push(Component::nth_last_child(2, 0)).build(),
        SelectorBuilder::new().push(Component::nth_of_type(-1, 5)).build(),
        SelectorBuilder::new().push(Component::nth_last_of_type(0, 7)).build(),
    ];

    let mut cache = NthIndexCache::new(4, 5);
    for selector in &selectors {
        let uncached = matching_among(&doc, &items, selector);
        let cached: Vec<usize> = {
            let mut context =
                MatchingContext::new(MatchingMode::ResolvingStyle, QuirksMode::NoQuirks)
                    .with_nth_index_cache(&mut cache);
            items
                .iter()
                .copied()
                .filter(|&item| {
                    selector_checker::matches_selector(selector, &doc.get(item), &mut context)
                })
                .collect()
        };
        assert_eq!(cached, uncached);
    }
    assert!(!cache.is_empty());

    // :nth-child(3n+1) from the first item.
    let first = matching_among(&doc, &items, &selectors[0]);
    assert_eq!(first.len(), 14);
    assert_eq!(first[0], items[0]);
    assert_eq!(first[1], items[3]);
    // :nth-of-type(-n+5) is the first five.
    assert_eq!(matching_among(&doc, &items, &selectors[2]), &items[..5]);
    // :nth-last-of-type(7)
    assert_eq!(matching_among(&doc, &items, &selectors[3]), [items[33]]);
}

#[test]
fn nth_child_of_selector_list() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "ul");
    let items = [
        doc.add(list, "li.x"),
        doc.add(list, "li"),
        doc.add(list, "li.x"),
        doc.add(list, "li.x"),
        doc.add(list, "li"),
    ];
    let of_x = || SelectorBuilder::new().class("x").build_list();

    // :nth-child(2 of .x)
    let second = SelectorBuilder::new()
        .push(Component::nth_child_of(0, 2, false, of_x()))
        .build();
    assert_eq!(matching_among(&doc, &items, &second), [items[2]]);

    // :nth-last-child(1 of .x)
    let last = SelectorBuilder::new()
        .push(Component::nth_child_of(0, 1, true, of_x()))
        .build();
    assert_eq!(matching_among(&doc, &items, &last), [items[3]]);

    // :nth-child(odd of .x)
    let odd = SelectorBuilder::new()
        .push(Component::nth_child_of(2, 1, false, of_x()))
        .build();
    assert_eq!(matching_among(&doc, &items, &odd), [items[0], items[3]]);
}

/// Matches `selectors` in turn over `elements`, with one cache for all of them.
fn matching_with_shared_cache(
    doc: &Document,
    elements: &[usize],
    selectors: &[Selector],
    cache: &mut NthIndexCache,
) -> Vec<Vec<usize>> {
    let mut context =
        MatchingContext::new(MatchingMode::ResolvingStyle, QuirksMode::NoQuirks)
            .with_nth_index_cache(cache);
    selectors
        .iter()
        .map(|selector| {
            elements
                .iter()
                .copied()
                .filter(|&element| {
                    selector_checker::matches_selector(selector, &doc.get(element), &mut context)
                })
                .collect()
        })
        .collect()
}

#[test]
fn filters_sharing_a_cache_stay_apart() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "div");
    let kids: Vec<usize> = (0..60)
        .map(|i| doc.add(list, if i % 2 == 0 { "li.a" } else { "li.b" }))
        .collect();

    let a = SelectorBuilder::new().class("a").build();
    let b = SelectorBuilder::new().class("b").build();
    // Both lists start with the same selector.
    let of_a = SelectorList::single(a.clone());
    let of_a_or_b = SelectorList::from_vec(vec![a, b]);

    let thirtieth_a = SelectorBuilder::new()
        .push(Component::nth_child_of(0, 30, false, of_a.clone()))
        .build();
    let thirtieth_a_or_b = SelectorBuilder::new()
        .push(Component::nth_child_of(0, 30, false, of_a_or_b.clone()))
        .build();

    let mut cache = NthIndexCache::new(8, 3);
    let found = matching_with_shared_cache(
        &doc,
        &kids,
        &[thirtieth_a.clone(), thirtieth_a_or_b.clone()],
        &mut cache,
    );
    assert_eq!(found[0], [kids[58]]);
    assert_eq!(found[1], [kids[29]]);
    assert_eq!(cache.len(), 2);
}

#[test]
fn cached_and_uncached_nth_results_agree() {
    let mut doc = Document::html();
    let list = doc.add(Document::ROOT, "div");
    let kids: Vec<usize> = (0..70)
        .map(|i| {
            let spec = match i % 5 {
                0 => "p.a",
                1 => "li.a",
                2 => "li.b",
                3 => "li.a.b",
                _ => "span",
            };
            doc.add(list, spec)
        })
        .collect();

    let a = SelectorBuilder::new().class("a").build();
    let b = SelectorBuilder::new().class("b").build();
    let li = SelectorBuilder::new().tag("li").build();
    let of_a = SelectorList::single(a.clone());
    let of_a_or_b = SelectorList::from_vec(vec![a.clone(), b.clone()]);
    let of_b_or_li = SelectorList::from_vec(vec![b, li]);
    let nth = |component: Component| SelectorBuilder::new().push(component).build();

    let mut selectors = vec![
        nth(Component::nth_child(3, 1)),
        nth(Component::nth_last_child(4, 2)),
        nth(Component::nth_of_type(2, 0)),
        nth(Component::nth_last_of_type(-1, 6)),
    ];
    for list in [&of_a, &of_a_or_b, &of_b_or_li] {
        selectors.push(nth(Component::nth_child_of(2, 1, false, list.clone())));
        selectors.push(nth(Component::nth_child_of(0, 9, false, list.clone())));
        selectors.push(nth(Component::nth_child_of(3, 0, true, list.clone())));
        selectors.push(nth(Component::nth_child_of(-1, 4, true, list.clone())));
    }

    let uncached: Vec<Vec<usize>> = selectors
        .iter()
        .map(|selector| matching_among(&doc, &kids, selector))
        .collect();

    let mut cache = NthIndexCache::new(8, 3);
    assert_eq!(
        matching_with_shared_cache(&doc, &kids, &selectors, &mut cache),
        uncached
    );
    // Again in the reverse order, on a fresh cache.
    let mut cache = NthIndexCache::new(8, 3);
    let mut reversed = selectors.clone();
    reversed.reverse();
    let mut expected = uncached.clone();
    expected.reverse();
    assert_eq!(
        matching_with_shared_cache(&doc, &kids, &reversed, &mut cache),
        expected
    );
    assert!(expected.iter().any(|found| !found.is_empty()));
}

#[test]
fn roots_and_shadow_children() {
    let mut doc = Document::html();
    let host = doc.add(Document::ROOT, "div");
    let shadow = [
        doc.add_shadow(host, "span"),
        doc.add_shadow(host, "b"),
        doc.add_shadow(host, "span"),
    ];

    let root = doc.get(Document::ROOT);
    assert_eq!(nth_index_cache::nth_child_index(&root, None), 1);
    assert!(root.prev_sibling_element().is_none());
    let first = SelectorBuilder::new().push(Component::nth_child(0, 1)).build();
    assert!(matches(&doc, Document::ROOT, &first));

    // Children of a shadow root are siblings of each other.
    let last = doc.get(shadow[2]);
    assert_eq!(nth_index_cache::nth_child_index(&last, None), 3);
    assert_eq!(nth_index_cache::nth_of_type_index(&last, None), 2);
    assert_eq!(nth_index_cache::nth_last_child_index(&doc.get(shadow[0]), None), 3);
}
