/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use servo_arc::Arc;
use smallvec::SmallVec;

use crate::has_cache::HasCacheScope;
use crate::nth_index_cache::NthIndexCache;
use crate::parser::{Atom, CaseSensitivity, Component, PseudoId, Selector};
use crate::scope::{Activations, ScopeNode, StyleScope};
use crate::tree::{Element, OpaqueElement};

/// What kind of selector matching the caller is doing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchingMode {
    /// Computing the style of an element. Only this mode records
    /// invalidation flags on elements.
    ResolvingStyle,
    /// Collecting the rules that apply to an element, e.g. for devtools.
    CollectingStyleRules,
    /// Collecting the CSSOM rules that apply to an element.
    CollectingCssRules,
    /// Answering a DOM query such as `querySelector()`. The only mode that
    /// tests `:last-*` pseudo-classes while the parent is still parsing.
    QueryingRules,
}

/// The mode a document is in.
/// <https://quirks.spec.whatwg.org/>
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum QuirksMode {
    /// Quirks mode.
    Quirks,
    /// Limited quirks mode.
    LimitedQuirks,
    /// No quirks mode.
    NoQuirks,
}

impl QuirksMode {
    #[inline]
    pub fn classes_and_ids_case_sensitivity(self) -> CaseSensitivity {
        match self {
            QuirksMode::NoQuirks | QuirksMode::LimitedQuirks => CaseSensitivity::CaseSensitive,
            QuirksMode::Quirks => CaseSensitivity::AsciiCaseInsensitive,
        }
    }
}

/// Which position a simple selector is in, relative to the subject.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Impact {
    /// In the compound that matches the subject.
    Subject,
    /// In a compound that matches an ancestor or sibling of the subject.
    NonSubject,
    /// Either; used where a result is shared between both positions.
    Both,
}

impl Impact {
    #[inline]
    pub fn impacts_subject(self) -> bool {
        matches!(self, Impact::Subject | Impact::Both)
    }

    #[inline]
    pub fn impacts_non_subject(self) -> bool {
        matches!(self, Impact::NonSubject | Impact::Both)
    }
}

bitflags! {
    /// State-dependent pseudo-classes the subject compound depended on.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct MatchFlags: u8 {
        const AFFECTED_BY_HOVER = 1 << 0;
        const AFFECTED_BY_ACTIVE = 1 << 1;
        const AFFECTED_BY_DRAG = 1 << 2;
        const AFFECTED_BY_FOCUS_WITHIN = 1 << 3;
    }
}

/// What a successful match implies.
#[derive(Debug)]
pub struct MatchResult<E> {
    /// The pseudo-element the selector applies to, if any.
    pub dynamic_pseudo: PseudoId,
    /// The name of a matched `::highlight()`.
    pub custom_highlight_name: Option<Atom>,
    /// While matching a `:has()` argument: the elements its leftmost
    /// compound matched.
    pub leftmost_compound_matches: Option<SmallVec<[E; 4]>>,
    /// Generations between the subject and the `@scope` root it matched in.
    pub proximity: u32,
    pub flags: MatchFlags,
}

impl<E> Default for MatchResult<E> {
    fn default() -> Self {
        MatchResult {
            dynamic_pseudo: PseudoId::None,
            custom_highlight_name: None,
            leftmost_compound_matches: None,
            proximity: u32::MAX,
            flags: MatchFlags::empty(),
        }
    }
}

/// The scrollbar part being styled, when matching scrollbar pseudo-elements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollbarPart {
    NoPart,
    BackButtonStart,
    ForwardButtonStart,
    BackTrack,
    Thumb,
    ForwardTrack,
    BackButtonEnd,
    ForwardButtonEnd,
    /// The whole scrollbar.
    ScrollbarBg,
    /// The track, including the thumb.
    TrackBg,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScrollbarOrientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug)]
pub struct ScrollbarState {
    pub orientation: ScrollbarOrientation,
    pub enabled: bool,
    pub hovered_part: ScrollbarPart,
    pub pressed_part: ScrollbarPart,
    pub has_buttons: bool,
    pub corner_present: bool,
    /// The part the pseudo-element being matched stands for.
    pub part: ScrollbarPart,
}

/// Behaviour switches, read from the preferences once per pass.
#[derive(Clone, Copy, Debug)]
pub struct MatchingOptions {
    /// Let whitespace-only text children count as empty for `:empty`.
    pub empty_whitespace_is_empty: bool,
    /// Use Bloom filters to skip `:has()` traversals.
    pub has_fast_reject: bool,
    pub max_nesting_depth: usize,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        MatchingOptions {
            empty_whitespace_is_empty: false,
            has_fast_reject: true,
            max_nesting_depth: 512,
        }
    }
}

impl MatchingOptions {
    pub fn from_prefs() -> Self {
        MatchingOptions {
            empty_whitespace_is_empty: style_config::get_bool(
                style_config::EMPTY_WHITESPACE_IS_EMPTY,
            ),
            has_fast_reject: style_config::get_bool(style_config::HAS_FAST_REJECT_ENABLED),
            max_nesting_depth: style_config::get_i32(style_config::MAX_NESTING_DEPTH).max(1)
                as usize,
        }
    }
}

/// Web compatibility counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct UseCounters {
    /// `:empty` failed only because of whitespace text children.
    pub empty_whitespace_only_fail: usize,
    /// An attribute selector matched only through the legacy
    /// case-insensitive attribute list.
    pub case_insensitive_attr_match: usize,
    /// `:host-context()` was evaluated.
    pub host_context: usize,
}

/// Data associated with the matching process for an element. This context
/// is used across many selectors for an element, so it's not appropriate for
/// transient data that applies to only a single selector.
pub struct MatchingContext<'a, E: Element> {
    pub mode: MatchingMode,
    pub quirks_mode: QuirksMode,
    /// The scope top-level matches start in, if any.
    pub scope: Option<ScopeNode<E>>,
    pub nth_index_cache: Option<&'a mut NthIndexCache>,
    /// The `:has()` cache. Only supply one while the tree doesn't change.
    pub has_cache: Option<&'a mut HasCacheScope>,
    /// The argument of the pseudo-element being resolved, like the name of
    /// a `::highlight()`.
    pub pseudo_argument: Option<Atom>,
    /// Set while matching scrollbar pseudo-elements.
    pub scrollbar: Option<ScrollbarState>,
    pub is_window_active: bool,
    pub options: MatchingOptions,
    pub use_counters: UseCounters,

    pub(crate) scope_activations: FxHashMap<(usize, OpaqueElement), Arc<Activations<E>>>,
    pub(crate) nesting_level: usize,
}

impl<'a, E: Element> MatchingContext<'a, E> {
    pub fn new(mode: MatchingMode, quirks_mode: QuirksMode) -> Self {
        MatchingContext {
            mode,
            quirks_mode,
            scope: None,
            nth_index_cache: None,
            has_cache: None,
            pseudo_argument: None,
            scrollbar: None,
            is_window_active: true,
            options: MatchingOptions::from_prefs(),
            use_counters: UseCounters::default(),
            scope_activations: FxHashMap::default(),
            nesting_level: 0,
        }
    }

    pub fn with_nth_index_cache(mut self, cache: &'a mut NthIndexCache) -> Self {
        self.nth_index_cache = Some(cache);
        self
    }

    pub fn with_has_cache(mut self, cache: &'a mut HasCacheScope) -> Self {
        self.has_cache = Some(cache);
        self
    }

    #[inline]
    pub fn classes_and_ids_case_sensitivity(&self) -> CaseSensitivity {
        self.quirks_mode.classes_and_ids_case_sensitivity()
    }

    /// Runs `f` one nesting level deeper.
    #[inline]
    pub(crate) fn nest<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.nesting_level += 1;
        let result = f(self);
        self.nesting_level -= 1;
        result
    }
}

/// Where the checker is: a simple selector of a complex selector, the
/// element it is tested against, and the state carried along the way.
///
/// Cheap to clone; every combinator step works on a modified copy.
#[derive(Clone, Debug)]
pub struct SelectorCheckingContext<'s, E> {
    pub selector: &'s Selector,
    /// Index of the current simple selector in `selector`.
    pub index: usize,
    pub element: E,
    /// The element whose style is being matched.
    pub subject: E,
    pub previous_element: Option<E>,
    pub scope: Option<ScopeNode<E>>,
    /// The innermost `@scope` the selector is in.
    pub style_scope: Option<&'s StyleScope>,
    /// The anchor of the `:has()` argument being matched.
    pub relative_anchor_element: Option<E>,
    /// The pseudo-element being resolved, or `PseudoId::None` for the
    /// element itself.
    pub pseudo_id: PseudoId,
    pub impact: Impact,
    pub is_sub_selector: bool,
    pub in_rightmost_compound: bool,
    pub in_nested_complex_selector: bool,
    pub has_scrollbar_pseudo: bool,
    pub has_selection_pseudo: bool,
    pub treat_shadow_host_as_normal_scope: bool,
    pub is_inside_has_pseudo_class: bool,
    pub pseudo_has_in_rightmost_compound: bool,
    pub match_visited: bool,
    /// `match_visited` was turned off on the way here.
    pub had_match_visited: bool,
}

impl<'s, E: Element> SelectorCheckingContext<'s, E> {
    /// A context for matching `selector`, from its rightmost simple
    /// selector, against `element`.
    pub fn new(selector: &'s Selector, element: E) -> Self {
        SelectorCheckingContext {
            selector,
            index: 0,
            subject: element.clone(),
            element,
            previous_element: None,
            scope: None,
            style_scope: None,
            relative_anchor_element: None,
            pseudo_id: PseudoId::None,
            impact: Impact::Subject,
            is_sub_selector: false,
            in_rightmost_compound: true,
            in_nested_complex_selector: false,
            has_scrollbar_pseudo: false,
            has_selection_pseudo: false,
            treat_shadow_host_as_normal_scope: false,
            is_inside_has_pseudo_class: false,
            pseudo_has_in_rightmost_compound: true,
            match_visited: false,
            had_match_visited: false,
        }
    }

    /// The simple selector being checked.
    #[inline]
    pub fn component(&self) -> &'s Component {
        self.selector.component(self.index)
    }

    /// Turns off `:visited` matching for the rest of the chain.
    #[inline]
    pub fn disallow_match_visited(&mut self) {
        self.had_match_visited |= self.match_visited;
        self.match_visited = false;
    }
}
