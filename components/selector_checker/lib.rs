/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Matching of CSS selectors against an abstract element tree, with the
//! caches that keep structural pseudo-classes and `:has()` cheap.

#[macro_use]
extern crate size_of_test;

pub mod bloom;
pub mod context;
pub mod dom_apis;
pub mod element_flags;
pub mod has_cache;
pub mod matching;
pub mod nth_index_cache;
pub mod parser;
pub mod scope;
pub mod tree;

pub use crate::context::{
    Impact, MatchFlags, MatchResult, MatchingContext, MatchingMode, MatchingOptions, QuirksMode,
    SelectorCheckingContext,
};
pub use crate::element_flags::ElementSelectorFlags;
pub use crate::has_cache::HasCacheScope;
pub use crate::matching::{matches, matches_selector, matches_selector_list, MatchStatus};
pub use crate::nth_index_cache::NthIndexCache;
pub use crate::parser::{Selector, SelectorBuilder, SelectorList};
pub use crate::scope::{ScopeNode, StyleScope};
pub use crate::tree::{Element, OpaqueElement};

size_of_test!(MatchStatus, 1);
size_of_test!(Impact, 1);
size_of_test!(parser::PseudoId, 1);
size_of_test!(MatchFlags, 1);
