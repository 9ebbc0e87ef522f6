/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![cfg(test)]

#[macro_use]
extern crate size_of_test;

mod dom_apis;
mod nth;
mod pseudo;
mod size_of;

use selector_checker::context::{
    MatchResult, MatchingContext, MatchingMode, QuirksMode, SelectorCheckingContext,
};
use selector_checker::parser::Selector;

use crate::dom::{Document, El};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A style-resolving context without a scope.
pub fn resolving<'a>() -> MatchingContext<'a, El<'a>> {
    MatchingContext::new(MatchingMode::ResolvingStyle, QuirksMode::NoQuirks)
}

/// Whether element `index` itself matches `selector`, with no scope.
pub fn matches(document: &Document, index: usize, selector: &Selector) -> bool {
    init_logger();
    let mut context = resolving();
    selector_checker::matches_selector(selector, &document.get(index), &mut context)
}

/// Runs `selector` against element `index` and hands back the match result.
pub fn match_result<'a>(
    document: &'a Document,
    index: usize,
    selector: &Selector,
    matching: &mut MatchingContext<'_, El<'a>>,
) -> (bool, MatchResult<El<'a>>) {
    init_logger();
    let mut context = SelectorCheckingContext::new(selector, document.get(index));
    context.scope = matching.scope.clone();
    let mut result = MatchResult::default();
    let matched = selector_checker::matches(&context, matching, &mut result);
    (matched, result)
}

/// The elements of `indices` matching `selector`.
pub fn matching_among(document: &Document, indices: &[usize], selector: &Selector) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&index| matches(document, index, selector))
        .collect()
}
