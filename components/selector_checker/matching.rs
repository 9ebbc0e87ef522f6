/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The selector checker.
//!
//! Matching starts at the rightmost simple selector and works leftwards:
//! every simple selector of a compound is checked against the current
//! element, then a combinator moves to the element the next compound has to
//! match. The four-valued [`MatchStatus`] lets the ancestor and sibling
//! walks stop as soon as no other candidate can succeed.

use log::{debug, trace, warn};
use smallvec::SmallVec;

use crate::context::{
    Impact, MatchFlags, MatchResult, MatchingContext, MatchingMode, QuirksMode,
    ScrollbarOrientation, ScrollbarPart, SelectorCheckingContext,
};
use crate::element_flags::ElementSelectorFlags;
use crate::has_cache::{
    HasArgumentContext, HasArgumentTraversal, HasCacheContext, HasCacheScope, HasResult,
};
use crate::nth_index_cache::{self, same_type};
use crate::parser::{
    Atom, AttrCaseMode, AttrOperator, AttrSelector, CaseSensitivity, Combinator, Component, Link,
    NamespaceConstraint, NthSelectorData, NthType, PseudoClass, PseudoElement, PseudoId,
    Selector, SelectorList, TagSelector,
};
use crate::scope::{ensure_activations, ScopeNode};
use crate::tree::{AttributeRef, ChildContent, Directionality, Element, ElementState};

/// The outcome of matching the rest of a selector from some element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchStatus {
    Matches,
    /// The element doesn't match; other ancestors or siblings might.
    FailsLocally,
    /// No sibling of the element can match; an ancestor might.
    FailsAllSiblings,
    /// Nothing on the way to the root can match.
    FailsCompletely,
}

/// Attributes whose values are compared ASCII case-insensitively in HTML
/// documents, unless the selector has the `s` flag.
/// <https://html.spec.whatwg.org/multipage/#case-sensitivity-of-selectors>
const LEGACY_CASE_INSENSITIVE_ATTRIBUTES: &[&str] = &[
    "accept",
    "accept-charset",
    "align",
    "alink",
    "axis",
    "bgcolor",
    "charset",
    "checked",
    "clear",
    "codetype",
    "color",
    "compact",
    "declare",
    "defer",
    "dir",
    "direction",
    "disabled",
    "enctype",
    "face",
    "frame",
    "hreflang",
    "http-equiv",
    "lang",
    "language",
    "link",
    "media",
    "method",
    "multiple",
    "nohref",
    "noresize",
    "noshade",
    "nowrap",
    "readonly",
    "rel",
    "rev",
    "rules",
    "scope",
    "scrolling",
    "selected",
    "shape",
    "target",
    "text",
    "type",
    "valign",
    "valuetype",
    "vlink",
];

/// Matches a selector, from the simple selector `context` points at, and
/// reports what the match implies in `result`.
pub fn matches<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    debug_assert!(!context.had_match_visited);
    match_selector(context, matching, result) == MatchStatus::Matches
}

/// Whether `element` itself (not one of its pseudo-elements) matches
/// `selector`, with the scope of `matching`.
pub fn matches_selector<E: Element>(
    selector: &Selector,
    element: &E,
    matching: &mut MatchingContext<'_, E>,
) -> bool {
    let mut context = SelectorCheckingContext::new(selector, element.clone());
    context.scope = matching.scope.clone();
    let mut result = MatchResult::default();
    matches(&context, matching, &mut result) && result.dynamic_pseudo == PseudoId::None
}

/// Whether `element` matches any selector of `list`.
pub fn matches_selector_list<E: Element>(
    list: &SelectorList,
    element: &E,
    matching: &mut MatchingContext<'_, E>,
) -> bool {
    list.slice()
        .iter()
        .any(|selector| matches_selector(selector, element, matching))
}

/// Matches from `context.index` one nesting level deeper. Combinators and
/// nested selectors come through here; steps within a compound don't.
pub(crate) fn match_selector<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> MatchStatus {
    if matching.nesting_level >= matching.options.max_nesting_depth {
        warn!(
            "Selector nesting deeper than {} levels, giving up",
            matching.options.max_nesting_depth
        );
        return MatchStatus::FailsCompletely;
    }
    matching.nest(|matching| match_compound_and_relation(context, matching, result))
}

fn match_compound_and_relation<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> MatchStatus {
    let mut sub_result = MatchResult::default();
    let matched = check_one(context, matching, &mut sub_result);
    result.flags |= sub_result.flags;
    if !matched {
        return MatchStatus::FailsLocally;
    }
    if sub_result.proximity != u32::MAX {
        result.proximity = sub_result.proximity;
    }
    if sub_result.dynamic_pseudo != PseudoId::None {
        result.dynamic_pseudo = sub_result.dynamic_pseudo;
        result.custom_highlight_name = sub_result.custom_highlight_name.take();
    }

    match context.selector.link(context.index) {
        Link::Last => MatchStatus::Matches,
        Link::SubSelector => match_for_sub_selector(context, matching, result),
        Link::Combinator(combinator) => {
            // Scope activation stays on the same element.
            if combinator != Combinator::ScopeActivation && next_selector_exceeds_scope(context) {
                return MatchStatus::FailsCompletely;
            }
            if context.pseudo_id != PseudoId::None && context.pseudo_id != result.dynamic_pseudo {
                return MatchStatus::FailsCompletely;
            }
            let dynamic_pseudo = std::mem::replace(&mut result.dynamic_pseudo, PseudoId::None);
            let status = match_for_relation(context, combinator, matching, result);
            result.dynamic_pseudo = dynamic_pseudo;
            status
        },
    }
}

fn match_for_sub_selector<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> MatchStatus {
    let mut next = context.clone();
    next.index = context.index + 1;

    let dynamic_pseudo = result.dynamic_pseudo;
    next.has_scrollbar_pseudo = dynamic_pseudo != PseudoId::None &&
        (matching.scrollbar.is_some() ||
            dynamic_pseudo == PseudoId::ScrollbarCorner ||
            dynamic_pseudo == PseudoId::Resizer);

    // Simple selectors after a pseudo-element apply to the pseudo-element.
    // When matching for the originating element they are skipped, so that
    // `.a::before:hover` still reports that `.a` may have a ::before.
    if context.in_rightmost_compound &&
        dynamic_pseudo != PseudoId::None &&
        context.pseudo_id == PseudoId::None
    {
        // A custom scrollbar needs at least one rule without pseudo-classes.
        if !next.has_scrollbar_pseudo && dynamic_pseudo == PseudoId::Scrollbar {
            return MatchStatus::FailsCompletely;
        }
        return MatchStatus::Matches;
    }

    next.has_selection_pseudo = dynamic_pseudo == PseudoId::Selection;
    next.is_sub_selector = true;
    match_compound_and_relation(&next, matching, result)
}

fn push_leftmost_compound_match<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    result: &mut MatchResult<E>,
) {
    match result.leftmost_compound_matches {
        Some(ref mut matches) => matches.push(context.element.clone()),
        None => debug_assert!(false, "Relative combinator outside of :has()"),
    }
}

fn match_for_relation<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    combinator: Combinator,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> MatchStatus {
    let mut next = context.clone();
    next.index = context.selector.next_index(context.index);

    // :visited only applies to the first link on the way up, and never to
    // siblings.
    if (!context.is_sub_selector || context.in_nested_complex_selector) &&
        (context.element.is_link() ||
            !matches!(
                combinator,
                Combinator::ScopeActivation | Combinator::Descendant | Combinator::Child
            ))
    {
        next.disallow_match_visited();
    }

    next.in_rightmost_compound = false;
    next.impact = Impact::NonSubject;
    next.is_sub_selector = false;
    next.previous_element = Some(context.element.clone());
    next.pseudo_id = PseudoId::None;

    trace!("{:?} from {:?}", combinator, context.element);

    match combinator {
        Combinator::Descendant | Combinator::RelativeDescendant => {
            if combinator.is_relative() {
                push_leftmost_compound_match(context, result);
            }
            // `:scope` as the whole leftmost compound, with a fragment as the
            // scope, matches any ancestor chain.
            if next.component().is_scope() &&
                next.selector.link(next.index) == Link::Last &&
                context.scope.as_ref().is_some_and(ScopeNode::is_document_fragment)
            {
                return MatchStatus::Matches;
            }
            let mut parent = parent_element(&next);
            while let Some(element) = parent {
                next.element = element;
                let status = match_selector(&next, matching, result);
                if matches!(status, MatchStatus::Matches | MatchStatus::FailsCompletely) {
                    return status;
                }
                if next_selector_exceeds_scope(&next) {
                    return MatchStatus::FailsCompletely;
                }
                if next.element.is_link() {
                    next.disallow_match_visited();
                }
                parent = parent_element(&next);
            }
            MatchStatus::FailsCompletely
        },
        Combinator::Child | Combinator::RelativeChild => {
            if combinator.is_relative() {
                push_leftmost_compound_match(context, result);
            }
            match parent_element(&next) {
                Some(parent) => {
                    next.element = parent;
                    match_selector(&next, matching, result)
                },
                None => MatchStatus::FailsCompletely,
            }
        },
        Combinator::NextSibling | Combinator::RelativeNextSibling => {
            if combinator.is_relative() {
                push_leftmost_compound_match(context, result);
            }
            if matching.mode == MatchingMode::ResolvingStyle {
                flag_parent(
                    &context.element,
                    ElementSelectorFlags::CHILDREN_AFFECTED_BY_DIRECT_ADJACENT_RULES,
                );
            }
            match context.element.prev_sibling_element() {
                Some(sibling) => {
                    next.element = sibling;
                    match_selector(&next, matching, result)
                },
                None => MatchStatus::FailsAllSiblings,
            }
        },
        Combinator::LaterSibling | Combinator::RelativeLaterSibling => {
            if combinator.is_relative() {
                push_leftmost_compound_match(context, result);
            }
            if matching.mode == MatchingMode::ResolvingStyle {
                flag_parent(
                    &context.element,
                    ElementSelectorFlags::CHILDREN_AFFECTED_BY_INDIRECT_ADJACENT_RULES,
                );
            }
            let mut sibling = context.element.prev_sibling_element();
            while let Some(element) = sibling {
                next.element = element;
                let status = match_selector(&next, matching, result);
                if status != MatchStatus::FailsLocally {
                    return status;
                }
                sibling = next.element.prev_sibling_element();
            }
            MatchStatus::FailsAllSiblings
        },
        Combinator::UaShadow => {
            // Leaving the scope's own tree would escape the scope.
            if let Some(host) = context.scope.as_ref().and_then(ScopeNode::owner_shadow_host) {
                if host.tree_scope() == context.element.tree_scope() {
                    return MatchStatus::FailsCompletely;
                }
            }
            match context.element.containing_shadow_host() {
                Some(host) => {
                    next.element = host;
                    match_selector(&next, matching, result)
                },
                None => MatchStatus::FailsCompletely,
            }
        },
        Combinator::ShadowSlot => {
            if context.element.is_html_slot_element() {
                return MatchStatus::FailsCompletely;
            }
            match find_slot_element_in_scope(context) {
                Some(slot) => {
                    next.element = slot;
                    match_selector(&next, matching, result)
                },
                None => MatchStatus::FailsCompletely,
            }
        },
        Combinator::ShadowPart => {
            let Some(ref scope) = context.scope else {
                debug_assert!(false, "::part() matched without a scope");
                return MatchStatus::FailsCompletely;
            };
            // A ::part() rule lives in the host's tree scope, or in the
            // subject's own when preceded by :host.
            let host_tree_scope = if next.component().is_host() {
                scope.parent_tree_scope()
            } else {
                Some(scope.tree_scope())
            };
            let mut host = context.element.containing_shadow_host();
            while let Some(element) = host {
                if Some(element.tree_scope()) == host_tree_scope {
                    next.element = element;
                    return match_selector(&next, matching, result);
                }
                host = element.containing_shadow_host();
            }
            MatchStatus::FailsCompletely
        },
        Combinator::ScopeActivation => {
            let Some(style_scope) = context.style_scope else {
                return match_selector(&next, matching, result);
            };
            let activations = ensure_activations(context, style_scope, matching);
            // Only the subject takes match flags; elsewhere the flags are
            // set on elements directly.
            if context.impact.impacts_subject() {
                result.flags |= activations.match_flags;
            }
            if activations.active().next().is_none() {
                return MatchStatus::FailsCompletely;
            }
            for activation in activations.active() {
                next.match_visited = context.match_visited;
                next.impact = context.impact;
                next.style_scope = None;
                next.scope = activation.root.clone();
                if match_selector(&next, matching, result) == MatchStatus::Matches {
                    result.proximity = activation.proximity;
                    return MatchStatus::Matches;
                }
            }
            MatchStatus::FailsLocally
        },
    }
}

/// The parent to test the next compound against. Inside the scope's tree,
/// and from a child of a shadow root that is the scope, this crosses from
/// the shadow root to its host.
fn parent_element<E: Element>(context: &SelectorCheckingContext<'_, E>) -> Option<E> {
    if let Some(ref scope) = context.scope {
        if scope.is_containing_shadow_root_of(&context.element) ||
            scope.tree_scope() == context.element.tree_scope()
        {
            return context.element.parent_or_shadow_host_element();
        }
    }
    context.element.parent_element()
}

/// Without a scope, the assigned slot. With one, the first slot in the
/// assignment chain that is in the scope's tree.
fn find_slot_element_in_scope<E: Element>(context: &SelectorCheckingContext<'_, E>) -> Option<E> {
    let Some(ref scope) = context.scope else {
        return context.element.assigned_slot();
    };
    let tree_scope = scope.tree_scope();
    let mut slot = context.element.assigned_slot();
    while let Some(current) = slot {
        if current.tree_scope() == tree_scope {
            return Some(current);
        }
        slot = current.assigned_slot();
    }
    None
}

fn next_selector_exceeds_scope<E: Element>(context: &SelectorCheckingContext<'_, E>) -> bool {
    match context.scope {
        Some(ref scope) if scope.is_in_shadow_tree() => scope
            .owner_shadow_host()
            .is_some_and(|host| host.is_same(&context.element)),
        _ => false,
    }
}

fn flag_parent<E: Element>(element: &E, flags: ElementSelectorFlags) {
    if let Some(parent) = element.parent_element() {
        parent.apply_selector_flags(flags);
    }
}

/// Checks the simple selector `context` points at.
fn check_one<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    let element = &context.element;
    let component = context.component();

    // Inside its own shadow tree the host is featureless: only :host and
    // friends, :scope and :true see it.
    if let Some(host) = context.scope.as_ref().and_then(ScopeNode::owner_shadow_host) {
        if host.is_same(element) &&
            !component.is_host() &&
            !matches!(
                *component,
                Component::PseudoClass(PseudoClass::True | PseudoClass::Scope)
            ) &&
            !context.treat_shadow_host_as_normal_scope &&
            !component.is_pseudo_element()
        {
            return false;
        }
    }

    match *component {
        Component::Combinator(..) => {
            debug_assert!(false, "Can't check a combinator");
            false
        },
        Component::Tag(ref tag) => matches_tag_name(element, tag),
        Component::Class(ref class) => {
            element.has_class(class, matching.classes_and_ids_case_sensitivity())
        },
        Component::ID(ref id) => element.id().is_some_and(|own| {
            matching
                .classes_and_ids_case_sensitivity()
                .eq_atom(own, id)
        }),
        Component::Attribute(ref attr) => any_attribute_matches(element, attr, matching),
        Component::PseudoElement(ref pseudo_element) => {
            check_pseudo_element(context, pseudo_element, matching, result)
        },
        _ => check_pseudo_class(context, matching, result),
    }
}

fn matches_tag_name<E: Element>(element: &E, tag: &TagSelector) -> bool {
    if let Some(ref local_name) = tag.local_name {
        if local_name != element.local_name() {
            // Foreign elements in HTML documents keep their camel case
            // (foreignObject), while type selectors are lowercased there.
            if element.is_html_element() || !element.is_in_html_document() {
                return false;
            }
            if !local_name.eq_ignore_ascii_case(element.local_name()) {
                return false;
            }
        }
    }
    match tag.namespace {
        NamespaceConstraint::Any => true,
        NamespaceConstraint::Specific(ref namespace) => namespace == element.namespace(),
    }
}

#[inline]
fn is_html_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

fn attribute_value_matches(
    value: &str,
    operator: AttrOperator,
    selector_value: &str,
    case_sensitivity: CaseSensitivity,
) -> bool {
    match operator {
        AttrOperator::Exists => true,
        AttrOperator::Equal => case_sensitivity.eq(value, selector_value),
        AttrOperator::Includes => {
            if selector_value.is_empty() || selector_value.bytes().any(is_html_space) {
                return false;
            }
            let bytes = value.as_bytes();
            let mut from = 0;
            while let Some(found) = case_sensitivity.find(value, selector_value, from) {
                let end = found + selector_value.len();
                if (found == 0 || is_html_space(bytes[found - 1])) &&
                    (end == bytes.len() || is_html_space(bytes[end]))
                {
                    return true;
                }
                from = found + 1;
            }
            false
        },
        AttrOperator::Substring => {
            !selector_value.is_empty() && case_sensitivity.contains(value, selector_value)
        },
        AttrOperator::Prefix => {
            !selector_value.is_empty() && case_sensitivity.starts_with(value, selector_value)
        },
        AttrOperator::Suffix => {
            !selector_value.is_empty() && case_sensitivity.ends_with(value, selector_value)
        },
        AttrOperator::DashMatch => {
            case_sensitivity.starts_with(value, selector_value) &&
                (value.len() == selector_value.len() ||
                    value.as_bytes()[selector_value.len()] == b'-')
        },
    }
}

fn attribute_name_matches(
    attribute: &AttributeRef,
    selector: &AttrSelector,
    ignore_case: bool,
) -> bool {
    let names_match = if ignore_case {
        attribute.local_name.eq_ignore_ascii_case(&selector.local_name)
    } else {
        *attribute.local_name == selector.local_name
    };
    names_match &&
        match selector.namespace {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Specific(ref namespace) => namespace == attribute.namespace,
        }
}

fn is_legacy_case_insensitive(selector: &AttrSelector) -> bool {
    let null_namespace = match selector.namespace {
        NamespaceConstraint::Any => true,
        NamespaceConstraint::Specific(ref namespace) => namespace.is_empty(),
    };
    null_namespace &&
        LEGACY_CASE_INSENSITIVE_ATTRIBUTES
            .iter()
            .any(|name| (*selector.local_name).eq_ignore_ascii_case(name))
}

fn any_attribute_matches<E: Element>(
    element: &E,
    selector: &AttrSelector,
    matching: &mut MatchingContext<'_, E>,
) -> bool {
    element.synchronize_attribute(&selector.local_name);

    let case_sensitivity = if selector.case_mode == AttrCaseMode::CaseInsensitive {
        CaseSensitivity::AsciiCaseInsensitive
    } else {
        CaseSensitivity::CaseSensitive
    };
    let any_namespace = selector.namespace == NamespaceConstraint::Any;

    for attribute in element.attributes() {
        if !attribute_name_matches(&attribute, selector, false) {
            // Foreign attributes in HTML documents keep their camel case
            // (viewBox).
            if element.is_html_element() || !element.is_in_html_document() {
                continue;
            }
            if !attribute_name_matches(&attribute, selector, true) {
                continue;
            }
        }

        if attribute_value_matches(
            attribute.value,
            selector.operator,
            &selector.value,
            case_sensitivity,
        ) {
            return true;
        }

        if case_sensitivity == CaseSensitivity::AsciiCaseInsensitive {
            if !any_namespace {
                return false;
            }
            continue;
        }

        if element.is_in_html_document() &&
            is_legacy_case_insensitive(selector) &&
            attribute_value_matches(
                attribute.value,
                selector.operator,
                &selector.value,
                CaseSensitivity::AsciiCaseInsensitive,
            )
        {
            if selector.case_mode == AttrCaseMode::CaseSensitiveAlways {
                return false;
            }
            matching.use_counters.case_insensitive_attr_match += 1;
            debug!(
                "[{}] matched case-insensitively on {:?}",
                selector.local_name, element
            );
            return true;
        }

        if !any_namespace {
            return false;
        }
    }
    false
}

/// Tries every selector of `list` against the current element.
fn matches_any_in_list<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    list: &'s SelectorList,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    let mut sub_context = context.clone();
    sub_context.is_sub_selector = true;
    sub_context.in_nested_complex_selector = true;
    sub_context.pseudo_id = PseudoId::None;
    for selector in list.slice() {
        sub_context.selector = selector;
        sub_context.index = 0;
        let mut sub_result = MatchResult::default();
        let status = match_selector(&sub_context, matching, &mut sub_result);
        result.flags |= sub_result.flags;
        if status == MatchStatus::Matches {
            return true;
        }
    }
    false
}

fn check_pseudo_class<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    if context.has_scrollbar_pseudo {
        return check_scrollbar_pseudo_class(context, matching, result);
    }

    let element = &context.element;
    match *context.component() {
        Component::Negation(ref list) => !matches_any_in_list(context, list, matching, result),
        Component::Is(ref list) | Component::Where(ref list) => {
            matches_any_in_list(context, list, matching, result)
        },
        // A top-level `&` behaves like :scope.
        Component::Parent(None) => check_pseudo_scope(context, matching, result),
        Component::Parent(Some(ref list)) => matches_any_in_list(context, list, matching, result),
        Component::Nth(ref nth) => check_nth(context, nth, None, matching, result),
        Component::NthOf(ref nth_of) => {
            check_nth(context, &nth_of.nth, Some(&nth_of.selectors), matching, result)
        },
        Component::Has(ref list) => {
            if matching.mode == MatchingMode::ResolvingStyle {
                let mut flags = ElementSelectorFlags::empty();
                if context.impact.impacts_subject() {
                    flags |= ElementSelectorFlags::AFFECTED_BY_SUBJECT_HAS;
                }
                if context.impact.impacts_non_subject() {
                    flags |= ElementSelectorFlags::AFFECTED_BY_NON_SUBJECT_HAS;
                }
                if contains_pseudo_class(list) {
                    flags |= ElementSelectorFlags::AFFECTED_BY_PSEUDO_IN_HAS;
                }
                if contains_complex_logical_combinations(list) {
                    flags |= ElementSelectorFlags::AFFECTED_BY_LOGICAL_COMBINATIONS_IN_HAS;
                }
                element.apply_selector_flags(flags);
            }
            check_pseudo_has(context, list, matching, result)
        },
        Component::Host(ref argument) => {
            check_pseudo_host(context, argument.as_ref(), false, matching, result)
        },
        Component::HostContext(ref argument) => {
            matching.use_counters.host_context += 1;
            check_pseudo_host(context, Some(argument), true, matching, result)
        },
        Component::Lang(ref lang) => element.lang().is_some_and(|value| {
            CaseSensitivity::AsciiCaseInsensitive.starts_with(&value, lang) &&
                (value.len() == lang.len() || value.as_bytes()[lang.len()] == b'-')
        }),
        Component::Dir(ref dir) => {
            let directionality = element.directionality();
            ((**dir).eq_ignore_ascii_case("ltr") && directionality == Directionality::Ltr) ||
                ((**dir).eq_ignore_ascii_case("rtl") && directionality == Directionality::Rtl)
        },
        Component::State(ref name) => element.has_custom_state(name),
        Component::PseudoClass(pseudo_class) => {
            match_pseudo_class(context, pseudo_class, matching, result)
        },
        Component::Combinator(..) |
        Component::Tag(..) |
        Component::ID(..) |
        Component::Class(..) |
        Component::Attribute(..) |
        Component::PseudoElement(..) => {
            debug_assert!(false, "Not a pseudo-class: {:?}", context.component());
            false
        },
    }
}

/// Whether a `:has()` argument depends on a pseudo-class.
fn contains_pseudo_class(list: &SelectorList) -> bool {
    list.slice()
        .iter()
        .flat_map(|selector| selector.components())
        .any(|component| {
            component.is_pseudo_class() &&
                *component != Component::PseudoClass(PseudoClass::RelativeAnchor)
        })
}

/// Whether a `:has()` argument nests a logical combination with a complex
/// selector, or another `:has()`.
fn contains_complex_logical_combinations(list: &SelectorList) -> bool {
    list.slice()
        .iter()
        .flat_map(|selector| selector.components())
        .any(|component| match *component {
            Component::Is(ref nested) |
            Component::Where(ref nested) |
            Component::Negation(ref nested) |
            Component::Parent(Some(ref nested)) => {
                nested
                    .slice()
                    .iter()
                    .any(|selector| selector.components().iter().any(Component::is_combinator)) ||
                    contains_complex_logical_combinations(nested)
            },
            Component::Has(..) => true,
            _ => false,
        })
}

/// Whether `:last-*` pseudo-classes can be decided yet.
fn parent_finished_parsing<E: Element>(element: &E, matching: &MatchingContext<'_, E>) -> bool {
    matching.mode == MatchingMode::QueryingRules ||
        element
            .parent_element()
            .is_none_or(|parent| parent.is_finished_parsing_children())
}

fn is_first_of_type<E: Element>(element: &E) -> bool {
    let mut sibling = element.prev_sibling_element();
    while let Some(current) = sibling {
        if same_type(element, &current) {
            return false;
        }
        sibling = current.prev_sibling_element();
    }
    true
}

fn is_last_of_type<E: Element>(element: &E) -> bool {
    let mut sibling = element.next_sibling_element();
    while let Some(current) = sibling {
        if same_type(element, &current) {
            return false;
        }
        sibling = current.next_sibling_element();
    }
    true
}

fn check_nth<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    nth: &NthSelectorData,
    of: Option<&'s SelectorList>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    let element = &context.element;
    let from_end = nth.ty.is_from_end();
    if matching.mode == MatchingMode::ResolvingStyle {
        flag_parent(
            element,
            if from_end {
                ElementSelectorFlags::CHILDREN_AFFECTED_BY_BACKWARD_POSITIONAL_RULES
            } else {
                ElementSelectorFlags::CHILDREN_AFFECTED_BY_FORWARD_POSITIONAL_RULES
            },
        );
    }
    if from_end && !parent_finished_parsing(element, matching) {
        return false;
    }

    if let Some(list) = of {
        // The element itself has to match `S` to be indexed among the
        // siblings that do.
        if !matches_any_in_list(context, list, matching, result) {
            return false;
        }
    }

    let mut cache = matching.nth_index_cache.take();
    let index = match of {
        Some(list) => nth_index_cache::nth_child_index_of(
            element,
            cache.as_deref_mut(),
            list.key(),
            from_end,
            |sibling| {
                let mut sibling_context = context.clone();
                sibling_context.element = sibling.clone();
                matches_any_in_list(&sibling_context, list, matching, &mut MatchResult::default())
            },
        ),
        None => match nth.ty {
            NthType::Child => nth_index_cache::nth_child_index(element, cache.as_deref_mut()),
            NthType::LastChild => {
                nth_index_cache::nth_last_child_index(element, cache.as_deref_mut())
            },
            NthType::OfType => nth_index_cache::nth_of_type_index(element, cache.as_deref_mut()),
            NthType::LastOfType => {
                nth_index_cache::nth_last_of_type_index(element, cache.as_deref_mut())
            },
        },
    };
    matching.nth_index_cache = cache;
    nth.matches_index(index)
}

/// Records what a user action pseudo-class depends on.
fn note_user_action_dependency<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
    in_has: ElementSelectorFlags,
    children_or_siblings: ElementSelectorFlags,
    match_flag: MatchFlags,
) {
    if matching.mode == MatchingMode::ResolvingStyle {
        if context.is_inside_has_pseudo_class {
            context.element.apply_selector_flags(in_has);
        } else if context.impact.impacts_non_subject() {
            context.element.apply_selector_flags(children_or_siblings);
        }
    }
    if context.impact.impacts_subject() {
        result.flags |= match_flag;
    }
}

/// The :hover and :active quirk: in quirks mode they only match links, or
/// compounds with something more specific than user action pseudo-classes.
/// <https://quirks.spec.whatwg.org/#the-:active-and-:hover-quirk>
fn should_match_hover_or_active<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &MatchingContext<'_, E>,
) -> bool {
    if matching.quirks_mode != QuirksMode::Quirks ||
        context.is_sub_selector ||
        context.element.is_link()
    {
        return true;
    }
    let selector = context.selector;
    let mut start = context.index;
    while start > 0 && !selector.component(start - 1).is_combinator() {
        start -= 1;
    }
    let mut end = context.index;
    while selector.link(end) == Link::SubSelector {
        end += 1;
    }
    selector.components()[start..=end]
        .iter()
        .enumerate()
        .any(|(offset, component)| {
            start + offset != context.index &&
                !matches!(
                    *component,
                    Component::PseudoClass(PseudoClass::Hover | PseudoClass::Active) |
                        Component::Tag(TagSelector {
                            local_name: None,
                            ..
                        })
                )
        })
}

fn match_pseudo_class<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    pseudo_class: PseudoClass,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    let element = &context.element;
    let state = element.state();
    let resolving_style = matching.mode == MatchingMode::ResolvingStyle;
    match pseudo_class {
        PseudoClass::Empty => {
            let mut is_empty = true;
            let mut has_whitespace = false;
            for child in element.child_content() {
                match child {
                    ChildContent::Element => {
                        is_empty = false;
                        break;
                    },
                    ChildContent::Text(text) if !text.is_empty() => {
                        if text.bytes().all(is_html_space) {
                            has_whitespace = true;
                        } else {
                            is_empty = false;
                            break;
                        }
                    },
                    ChildContent::Text(..) | ChildContent::Other => {},
                }
            }
            if is_empty && has_whitespace && !matching.options.empty_whitespace_is_empty {
                matching.use_counters.empty_whitespace_only_fail += 1;
                debug!(":empty failed on whitespace-only {:?}", element);
                is_empty = false;
            }
            if resolving_style {
                element.apply_selector_flags(ElementSelectorFlags::STYLE_AFFECTED_BY_EMPTY);
            }
            is_empty
        },
        PseudoClass::Root => element.is_document_element(),
        PseudoClass::Scope => check_pseudo_scope(context, matching, result),
        PseudoClass::FirstChild => {
            if resolving_style {
                flag_parent(element, ElementSelectorFlags::CHILDREN_AFFECTED_BY_FIRST_CHILD_RULES);
                element.apply_selector_flags(ElementSelectorFlags::AFFECTED_BY_FIRST_CHILD_RULES);
            }
            element.prev_sibling_element().is_none()
        },
        PseudoClass::LastChild => {
            if resolving_style {
                flag_parent(element, ElementSelectorFlags::CHILDREN_AFFECTED_BY_LAST_CHILD_RULES);
                element.apply_selector_flags(ElementSelectorFlags::AFFECTED_BY_LAST_CHILD_RULES);
            }
            parent_finished_parsing(element, matching) && element.next_sibling_element().is_none()
        },
        PseudoClass::OnlyChild => {
            if resolving_style {
                flag_parent(
                    element,
                    ElementSelectorFlags::CHILDREN_AFFECTED_BY_FIRST_CHILD_RULES |
                        ElementSelectorFlags::CHILDREN_AFFECTED_BY_LAST_CHILD_RULES,
                );
                element.apply_selector_flags(
                    ElementSelectorFlags::AFFECTED_BY_FIRST_CHILD_RULES |
                        ElementSelectorFlags::AFFECTED_BY_LAST_CHILD_RULES,
                );
            }
            parent_finished_parsing(element, matching) &&
                element.prev_sibling_element().is_none() &&
                element.next_sibling_element().is_none()
        },
        PseudoClass::FirstOfType => {
            if resolving_style {
                flag_parent(
                    element,
                    ElementSelectorFlags::CHILDREN_AFFECTED_BY_FORWARD_POSITIONAL_RULES,
                );
            }
            is_first_of_type(element)
        },
        PseudoClass::LastOfType => {
            if resolving_style {
                flag_parent(
                    element,
                    ElementSelectorFlags::CHILDREN_AFFECTED_BY_BACKWARD_POSITIONAL_RULES,
                );
            }
            parent_finished_parsing(element, matching) && is_last_of_type(element)
        },
        PseudoClass::OnlyOfType => {
            if resolving_style {
                flag_parent(
                    element,
                    ElementSelectorFlags::CHILDREN_AFFECTED_BY_FORWARD_POSITIONAL_RULES |
                        ElementSelectorFlags::CHILDREN_AFFECTED_BY_BACKWARD_POSITIONAL_RULES,
                );
            }
            parent_finished_parsing(element, matching) &&
                is_first_of_type(element) &&
                is_last_of_type(element)
        },
        PseudoClass::AnyLink => element.is_link(),
        PseudoClass::Link => element.is_link() && !context.match_visited,
        PseudoClass::Visited => element.is_link() && context.match_visited,
        PseudoClass::Hover => {
            note_user_action_dependency(
                context,
                matching,
                result,
                ElementSelectorFlags::ANCESTORS_OR_SIBLINGS_AFFECTED_BY_HOVER_IN_HAS,
                ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_HOVER,
                MatchFlags::AFFECTED_BY_HOVER,
            );
            should_match_hover_or_active(context, matching) && state.contains(ElementState::HOVER)
        },
        PseudoClass::Active => {
            note_user_action_dependency(
                context,
                matching,
                result,
                ElementSelectorFlags::ANCESTORS_OR_SIBLINGS_AFFECTED_BY_ACTIVE_IN_HAS,
                ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_ACTIVE,
                MatchFlags::AFFECTED_BY_ACTIVE,
            );
            should_match_hover_or_active(context, matching) && state.contains(ElementState::ACTIVE)
        },
        PseudoClass::Focus => {
            note_user_action_dependency(
                context,
                matching,
                result,
                ElementSelectorFlags::ANCESTORS_OR_SIBLINGS_AFFECTED_BY_FOCUS_IN_HAS,
                ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_FOCUS,
                MatchFlags::empty(),
            );
            state.contains(ElementState::FOCUS)
        },
        PseudoClass::FocusVisible => {
            note_user_action_dependency(
                context,
                matching,
                result,
                ElementSelectorFlags::ANCESTORS_OR_SIBLINGS_AFFECTED_BY_FOCUS_VISIBLE_IN_HAS,
                ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_FOCUS_VISIBLE,
                MatchFlags::empty(),
            );
            state.contains(ElementState::FOCUS_VISIBLE)
        },
        PseudoClass::FocusWithin => {
            note_user_action_dependency(
                context,
                matching,
                result,
                ElementSelectorFlags::ANCESTORS_OR_SIBLINGS_AFFECTED_BY_FOCUS_IN_HAS,
                ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_FOCUS_WITHIN,
                MatchFlags::AFFECTED_BY_FOCUS_WITHIN,
            );
            state.contains(ElementState::FOCUS_WITHIN)
        },
        PseudoClass::Drag => {
            note_user_action_dependency(
                context,
                matching,
                result,
                ElementSelectorFlags::empty(),
                ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_DRAG,
                MatchFlags::AFFECTED_BY_DRAG,
            );
            state.contains(ElementState::DRAG)
        },
        PseudoClass::Enabled => state.contains(ElementState::ENABLED),
        PseudoClass::Disabled => state.contains(ElementState::DISABLED),
        PseudoClass::Checked => state.contains(ElementState::CHECKED),
        PseudoClass::Indeterminate => state.contains(ElementState::INDETERMINATE),
        PseudoClass::Valid => state.contains(ElementState::FORM_CONTROL | ElementState::VALID),
        PseudoClass::Invalid => {
            state.contains(ElementState::FORM_CONTROL | ElementState::INVALID)
        },
        PseudoClass::Required => state.contains(ElementState::REQUIRED),
        PseudoClass::Optional => state.contains(ElementState::OPTIONAL),
        PseudoClass::ReadOnly => !state.contains(ElementState::READ_WRITE),
        PseudoClass::ReadWrite => state.contains(ElementState::READ_WRITE),
        PseudoClass::InRange => {
            state.contains(ElementState::FORM_CONTROL | ElementState::IN_RANGE)
        },
        PseudoClass::OutOfRange => {
            state.contains(ElementState::FORM_CONTROL | ElementState::OUT_OF_RANGE)
        },
        PseudoClass::PlaceholderShown => state.contains(ElementState::PLACEHOLDER_SHOWN),
        PseudoClass::Default => state.contains(ElementState::DEFAULT),
        PseudoClass::Defined => state.contains(ElementState::DEFINED),
        PseudoClass::Target => state.contains(ElementState::TARGET),
        PseudoClass::Fullscreen => state.contains(ElementState::FULLSCREEN),
        PseudoClass::Modal => state.intersects(ElementState::MODAL | ElementState::FULLSCREEN),
        PseudoClass::PopoverOpen => state.contains(ElementState::POPOVER_OPEN),
        PseudoClass::Open => state.contains(ElementState::OPENABLE | ElementState::OPEN),
        PseudoClass::Closed => {
            state.contains(ElementState::OPENABLE) && !state.contains(ElementState::OPEN)
        },
        PseudoClass::Paused => state.contains(ElementState::PAUSED),
        PseudoClass::Playing => state.contains(ElementState::PLAYING),
        PseudoClass::Autofill => state.contains(ElementState::AUTOFILL),
        PseudoClass::WindowInactive => context.has_selection_pseudo && !matching.is_window_active,
        PseudoClass::Horizontal |
        PseudoClass::Vertical |
        PseudoClass::Decrement |
        PseudoClass::Increment |
        PseudoClass::Start |
        PseudoClass::End |
        PseudoClass::DoubleButton |
        PseudoClass::SingleButton |
        PseudoClass::NoButton |
        PseudoClass::CornerPresent => false,
        PseudoClass::RelativeAnchor => {
            debug_assert!(
                context.relative_anchor_element.is_some(),
                "Relative anchor outside of :has()"
            );
            context
                .relative_anchor_element
                .as_ref()
                .is_some_and(|anchor| anchor.is_same(element))
        },
        PseudoClass::True => true,
        PseudoClass::Unparsed => false,
    }
}

/// Pseudo-classes after a scrollbar pseudo-element apply to the scrollbar
/// part in `MatchingContext::scrollbar`.
fn check_scrollbar_pseudo_class<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    let pseudo_class = match *context.component() {
        Component::Negation(ref list) => {
            return !matches_any_in_list(context, list, matching, result);
        },
        // Resizers and corners have no scrollbar but react to this one.
        Component::PseudoClass(PseudoClass::WindowInactive) => {
            return !matching.is_window_active;
        },
        Component::PseudoClass(pseudo_class) => pseudo_class,
        _ => return false,
    };
    let Some(scrollbar) = matching.scrollbar else {
        return false;
    };

    let part = scrollbar.part;
    let matches_part = |target: ScrollbarPart| match part {
        ScrollbarPart::ScrollbarBg => target != ScrollbarPart::NoPart,
        ScrollbarPart::TrackBg => matches!(
            target,
            ScrollbarPart::BackTrack | ScrollbarPart::ForwardTrack | ScrollbarPart::Thumb
        ),
        _ => part == target,
    };

    match pseudo_class {
        PseudoClass::Enabled => scrollbar.enabled,
        PseudoClass::Disabled => !scrollbar.enabled,
        PseudoClass::Hover => matches_part(scrollbar.hovered_part),
        PseudoClass::Active => matches_part(scrollbar.pressed_part),
        PseudoClass::Horizontal => scrollbar.orientation == ScrollbarOrientation::Horizontal,
        PseudoClass::Vertical => scrollbar.orientation == ScrollbarOrientation::Vertical,
        PseudoClass::Decrement => matches!(
            part,
            ScrollbarPart::BackButtonStart | ScrollbarPart::BackButtonEnd | ScrollbarPart::BackTrack
        ),
        PseudoClass::Increment => matches!(
            part,
            ScrollbarPart::ForwardButtonStart |
                ScrollbarPart::ForwardButtonEnd |
                ScrollbarPart::ForwardTrack
        ),
        PseudoClass::Start => matches!(
            part,
            ScrollbarPart::BackButtonStart |
                ScrollbarPart::ForwardButtonStart |
                ScrollbarPart::BackTrack
        ),
        PseudoClass::End => matches!(
            part,
            ScrollbarPart::BackButtonEnd |
                ScrollbarPart::ForwardButtonEnd |
                ScrollbarPart::ForwardTrack
        ),
        // Never matches on any platform.
        PseudoClass::DoubleButton => false,
        PseudoClass::SingleButton => {
            scrollbar.has_buttons &&
                matches!(
                    part,
                    ScrollbarPart::BackButtonStart |
                        ScrollbarPart::ForwardButtonEnd |
                        ScrollbarPart::BackTrack |
                        ScrollbarPart::ForwardTrack
                )
        },
        PseudoClass::NoButton => {
            !scrollbar.has_buttons &&
                matches!(part, ScrollbarPart::BackTrack | ScrollbarPart::ForwardTrack)
        },
        PseudoClass::CornerPresent => scrollbar.corner_present,
        _ => false,
    }
}

fn matches_user_agent_part<E: Element>(element: &E, name: &str) -> bool {
    element.is_in_user_agent_shadow_tree() &&
        element.user_agent_part().is_some_and(|part| &**part == name)
}

fn check_pseudo_element<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    pseudo_element: &'s PseudoElement,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    // Can happen through `&` in a nested rule.
    if context.in_nested_complex_selector {
        return false;
    }

    let element = &context.element;
    match *pseudo_element {
        PseudoElement::Part(ref names) => names.iter().all(|name| element.is_part(name)),
        PseudoElement::Placeholder => matches_user_agent_part(element, "placeholder"),
        PseudoElement::FileSelectorButton => {
            matches_user_agent_part(element, "file-selector-button")
        },
        PseudoElement::DetailsContent => matches_user_agent_part(element, "details-content"),
        PseudoElement::UserAgentPart(ref name) => matches_user_agent_part(element, name),
        PseudoElement::Slotted(ref compound) => {
            let mut sub_context = context.clone();
            sub_context.selector = compound;
            sub_context.index = 0;
            sub_context.is_sub_selector = true;
            sub_context.scope = None;
            sub_context.treat_shadow_host_as_normal_scope = false;
            let mut sub_result = MatchResult::default();
            let status = match_selector(&sub_context, matching, &mut sub_result);
            result.flags |= sub_result.flags;
            status == MatchStatus::Matches
        },
        PseudoElement::Highlight(ref name) => {
            // Without an argument this matches for the originating element,
            // which tracks that some ::highlight() may apply.
            result.dynamic_pseudo = PseudoId::Highlight;
            if matching.pseudo_argument.as_ref().is_none_or(|argument| argument == name) {
                result.custom_highlight_name = Some(name.clone());
                return true;
            }
            false
        },
        PseudoElement::ViewTransition => {
            check_view_transition(context, pseudo_element.pseudo_id(), None, matching, result)
        },
        PseudoElement::ViewTransitionGroup(ref name) |
        PseudoElement::ViewTransitionImagePair(ref name) |
        PseudoElement::ViewTransitionOld(ref name) |
        PseudoElement::ViewTransitionNew(ref name) => check_view_transition(
            context,
            pseudo_element.pseudo_id(),
            Some(name),
            matching,
            result,
        ),
        PseudoElement::ScrollbarButton |
        PseudoElement::ScrollbarCorner |
        PseudoElement::ScrollbarThumb |
        PseudoElement::ScrollbarTrack |
        PseudoElement::ScrollbarTrackPiece => {
            if pseudo_element.pseudo_id() != context.pseudo_id {
                return false;
            }
            result.dynamic_pseudo = context.pseudo_id;
            true
        },
        PseudoElement::Before |
        PseudoElement::After |
        PseudoElement::Marker |
        PseudoElement::FirstLine |
        PseudoElement::FirstLetter |
        PseudoElement::Backdrop |
        PseudoElement::Selection |
        PseudoElement::TargetText |
        PseudoElement::Scrollbar |
        PseudoElement::Resizer => {
            result.dynamic_pseudo = pseudo_element.pseudo_id();
            true
        },
    }
}

fn check_view_transition<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    pseudo_id: PseudoId,
    name: Option<&Atom>,
    matching: &MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    // For the originating element, only record that the pseudo may exist.
    if context.element.is_document_element() && context.pseudo_id == PseudoId::None {
        result.dynamic_pseudo = pseudo_id;
        return true;
    }
    if pseudo_id != context.pseudo_id {
        return false;
    }
    result.dynamic_pseudo = context.pseudo_id;
    match name {
        None => pseudo_id == PseudoId::ViewTransition,
        Some(name) => &**name == "*" || matching.pseudo_argument.as_ref() == Some(name),
    }
}

/// `:host`, `:host(compound)` and `:host-context(compound)`.
fn check_pseudo_host<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    argument: Option<&'s Selector>,
    is_host_context: bool,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    // Only matches the host of the shadow tree the rule is in.
    let Some(host) = context.scope.as_ref().and_then(ScopeNode::owner_shadow_host) else {
        return false;
    };
    if !host.is_same(&context.element) {
        return false;
    }
    let Some(argument) = argument else {
        return true;
    };

    let mut host_context = context.clone();
    host_context.selector = argument;
    host_context.index = 0;
    host_context.is_sub_selector = true;
    host_context.treat_shadow_host_as_normal_scope = true;

    let mut next_element = Some(context.element.clone());
    while let Some(element) = next_element {
        host_context.element = element;
        let mut sub_result = MatchResult::default();
        let status = match_selector(&host_context, matching, &mut sub_result);
        result.flags |= sub_result.flags;
        if status == MatchStatus::Matches {
            return true;
        }
        host_context.treat_shadow_host_as_normal_scope = false;
        host_context.scope = None;

        if !is_host_context {
            break;
        }
        // :host-context() goes on through the flat tree ancestors.
        host_context.in_rightmost_compound = false;
        host_context.impact = Impact::NonSubject;
        next_element = host_context.element.flat_tree_parent_element();
    }
    false
}

fn check_pseudo_scope<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    if let Some(style_scope) = context.style_scope {
        let activations = ensure_activations(context, style_scope, matching);
        if context.impact.impacts_subject() {
            result.flags |= activations.match_flags;
        }
        for activation in activations.active() {
            if activation
                .root
                .as_ref()
                .is_some_and(|root| root.is_element(&context.element))
            {
                result.proximity = activation.proximity;
                return true;
            }
        }
        return false;
    }
    match context.scope {
        Some(ScopeNode::Element(ref scope)) => scope.is_same(&context.element),
        _ => context.element.is_document_element(),
    }
}

enum HasEarlyBreak {
    ReturnAsMatched,
    MoveToNextArgument,
    None,
}

/// Whether this is the subject `:has()` of `element.matches()`, where the
/// anchor is the scope and already-checked regions don't apply.
fn is_subject_has_in_matches_argument<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
) -> bool {
    context.in_rightmost_compound &&
        context
            .scope
            .as_ref()
            .is_some_and(|scope| scope.is_element(&context.element))
}

fn set_anchor_as_checked_and_get_old_result<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    cache: &mut HasCacheContext<'_>,
) -> HasResult {
    let anchor = &context.element;
    let previous = cache.result(anchor);
    if previous.contains(HasResult::CHECKED) {
        return previous;
    }
    if !is_subject_has_in_matches_argument(context) && cache.already_checked(anchor) {
        // Don't grow the cache for elements it has nothing on.
        if !previous.is_empty() {
            cache.set_checked(anchor);
        }
        return previous | HasResult::CHECKED;
    }
    cache.set_checked(anchor);
    previous
}

fn set_affected_by_has_flags_for_anchor<E: Element>(argument: &HasArgumentContext, anchor: &E) {
    let flags = match argument.leftmost_relation() {
        Combinator::RelativeChild | Combinator::RelativeDescendant => {
            ElementSelectorFlags::ANCESTORS_OR_ANCESTOR_SIBLINGS_AFFECTED_BY_HAS
        },
        _ => argument.siblings_affected_by_has_flags(),
    };
    anchor.apply_selector_flags(flags);
}

fn set_affected_by_has_flags_for_anchor_siblings<E: Element>(
    argument: &HasArgumentContext,
    anchor: &E,
) {
    if argument.adjacent_distance_limit() == 0 {
        return;
    }
    let flags = argument.siblings_affected_by_has_flags();
    let mut distance = 1;
    let mut sibling = anchor.next_sibling_element();
    while let Some(current) = sibling {
        if distance > argument.adjacent_distance_limit() {
            break;
        }
        current.apply_selector_flags(flags);
        sibling = current.next_sibling_element();
        distance += 1;
    }
}

/// Flags the elements between a matched argument subject and the anchor:
/// its previous siblings, ancestors and ancestors' previous siblings, as far
/// as the argument's combinators reach.
fn set_affected_by_has_for_argument_matched_element<E: Element>(
    argument: &HasArgumentContext,
    anchor: &E,
    matched: &E,
    matched_depth: i32,
) {
    let mut current = matched.clone();
    let mut depth = matched_depth;
    loop {
        let next = if depth == 0 {
            current.prev_sibling_element()
        } else {
            let traverse_siblings = if depth == matched_depth {
                argument.sibling_combinator_at_rightmost()
            } else {
                argument.sibling_combinator_between_child_or_descendant_combinator()
            };
            match traverse_siblings
                .then(|| current.prev_sibling_element())
                .flatten()
            {
                Some(previous) => Some(previous),
                None => {
                    depth -= 1;
                    current.parent_element()
                },
            }
        };
        let Some(next) = next else {
            break;
        };
        if next.is_same(anchor) {
            break;
        }
        next.apply_selector_flags(argument.affected_by_has_flags_at_depth(depth));
        current = next;
    }
}

/// Marks the whole traversal scope of `anchor` as checked, after the
/// fast-reject filter ruled the argument out.
fn set_all_elements_in_traversal_scope_as_checked<E: Element>(
    anchor: &E,
    argument: &HasArgumentContext,
    cache: &mut HasCacheContext<'_>,
) {
    let mut last = Some(anchor.clone());
    let mut depth = 0;
    if argument.adjacent_distance_limit() > 0 {
        last = anchor.next_sibling_element();
    }
    if argument.depth_limit() > 0 {
        last = last.and_then(|element| element.first_element_child());
        depth = 1;
    }
    if let Some(last) = last {
        cache.set_all_traversed_elements_as_checked(&last, depth);
    }
}

fn check_early_break_for_has_argument<E: Element>(
    context: &SelectorCheckingContext<'_, E>,
    argument: &HasArgumentContext,
    cache: Option<&mut HasCacheContext<'_>>,
    update_affected_by_has_flags: &mut bool,
    fast_reject_enabled: bool,
) -> HasEarlyBreak {
    let Some(cache) = cache else {
        return HasEarlyBreak::None;
    };
    let anchor = &context.element;

    let previous = set_anchor_as_checked_and_get_old_result(context, cache);
    if previous.contains(HasResult::CHECKED) {
        if *update_affected_by_has_flags {
            set_affected_by_has_flags_for_anchor_siblings(argument, anchor);
        }
        return if previous.contains(HasResult::MATCHED) {
            HasEarlyBreak::ReturnAsMatched
        } else {
            HasEarlyBreak::MoveToNextArgument
        };
    }

    if !fast_reject_enabled {
        return HasEarlyBreak::None;
    }

    // The filter is only filled on the second check of an anchor, or on the
    // first when the anchor is known to be tested by several :has().
    let (is_new, allocated) = {
        let (filter, is_new) = cache.ensure_fast_reject_filter(anchor);
        (is_new, filter.bloom_filter_allocated())
    };
    if is_new &&
        !anchor
            .selector_flags()
            .contains(ElementSelectorFlags::AFFECTED_BY_MULTIPLE_HAS)
    {
        return HasEarlyBreak::None;
    }
    if !allocated {
        let update_flags = *update_affected_by_has_flags;
        if update_flags {
            anchor.apply_selector_flags(ElementSelectorFlags::AFFECTED_BY_MULTIPLE_HAS);
        }
        cache.fill_fast_reject_filter(anchor, |element: &E, depth: i32| {
            if update_flags {
                element.apply_selector_flags(argument.affected_by_has_flags_at_depth(depth));
            }
        });
    }
    // Filling the filter flagged the traversal scope already.
    *update_affected_by_has_flags = false;

    if cache.fast_reject(anchor, argument.hashes()) {
        debug!(
            ":has() argument {:?} fast-rejected on {:?}",
            argument.selector(),
            anchor
        );
        set_all_elements_in_traversal_scope_as_checked(anchor, argument, cache);
        return HasEarlyBreak::MoveToNextArgument;
    }
    HasEarlyBreak::None
}

/// Walks from every leftmost compound match towards where the anchor would
/// be, caching every element on the way as matched. Returns whether the
/// anchor was reached.
fn cache_matched_elements_and_return_matched_result<E: Element>(
    leftmost_relation: Combinator,
    anchor: &E,
    leftmost_compound_matches: &[E],
    cache: Option<&mut HasCacheContext<'_>>,
) -> bool {
    let step = |element: &E| match leftmost_relation {
        Combinator::RelativeDescendant | Combinator::RelativeChild => element.parent_element(),
        _ => element.prev_sibling_element(),
    };
    let indirect = matches!(
        leftmost_relation,
        Combinator::RelativeDescendant | Combinator::RelativeLaterSibling
    );

    let Some(cache) = cache else {
        return leftmost_compound_matches.iter().any(|leftmost| {
            let mut current = step(leftmost);
            while let Some(element) = current {
                if element.is_same(anchor) {
                    return true;
                }
                if !indirect {
                    break;
                }
                current = step(&element);
            }
            false
        });
    };

    let mut matched = false;
    for leftmost in leftmost_compound_matches {
        let mut current = step(leftmost);
        while let Some(element) = current {
            if element.is_same(anchor) {
                matched = true;
            }
            let old = cache.set_matched_and_get_old_result(&element);
            if !indirect || old.contains(HasResult::MATCHED) {
                break;
            }
            current = step(&element);
        }
    }
    matched
}

fn check_pseudo_has<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    list: &'s SelectorList,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
) -> bool {
    // Argument matching never needs the cache itself, so it is moved out
    // for the duration.
    let mut cache = matching.has_cache.take();
    let matched = check_pseudo_has_arguments(context, list, matching, result, cache.as_deref_mut());
    matching.has_cache = cache;
    matched
}

fn check_pseudo_has_arguments<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    list: &'s SelectorList,
    matching: &mut MatchingContext<'_, E>,
    result: &mut MatchResult<E>,
    mut cache: Option<&mut HasCacheScope>,
) -> bool {
    let anchor = &context.element;
    let fast_reject_enabled = matching.options.has_fast_reject;

    for argument in list.slice() {
        let argument_context = HasArgumentContext::new(argument);
        let mut cache_context = cache
            .as_deref_mut()
            .map(|scope| scope.context(&argument_context));
        let mut update_affected_by_has_flags = matching.mode == MatchingMode::ResolvingStyle;

        // Removing a child can change what a `+` argument reaches.
        if update_affected_by_has_flags &&
            argument_context.adjacent_distance_limit() > 0 &&
            argument_context.adjacent_distance_fixed()
        {
            flag_parent(
                anchor,
                ElementSelectorFlags::CHILDREN_AFFECTED_BY_DIRECT_ADJACENT_RULES,
            );
        }

        if update_affected_by_has_flags {
            set_affected_by_has_flags_for_anchor(&argument_context, anchor);
        }

        match check_early_break_for_has_argument(
            context,
            &argument_context,
            cache_context.as_mut(),
            &mut update_affected_by_has_flags,
            fast_reject_enabled,
        ) {
            HasEarlyBreak::ReturnAsMatched => return true,
            HasEarlyBreak::MoveToNextArgument => continue,
            HasEarlyBreak::None => {},
        }

        // :visited never matches inside :has().
        let mut sub_context = SelectorCheckingContext::new(argument, anchor.clone());
        sub_context.scope = context.scope.clone();
        sub_context.relative_anchor_element = Some(anchor.clone());
        sub_context.is_inside_has_pseudo_class = true;
        sub_context.pseudo_has_in_rightmost_compound = context.in_rightmost_compound;

        if let Some(ref mut cache_context) = cache_context {
            cache_context.note_traversal();
        }

        let mut selector_matched = false;
        let mut last_checked: Option<(E, i32)> = None;
        for (element, depth) in HasArgumentTraversal::new(anchor, &argument_context) {
            if update_affected_by_has_flags {
                element
                    .apply_selector_flags(argument_context.affected_by_has_flags_at_depth(depth));
            }
            if argument_context.skips_depth(depth) {
                continue;
            }

            trace!(":has() candidate {:?} at depth {}", element, depth);
            sub_context.element = element.clone();
            sub_context.subject = element.clone();
            let mut sub_result = MatchResult {
                leftmost_compound_matches: Some(SmallVec::new()),
                ..MatchResult::default()
            };
            match_selector(&sub_context, matching, &mut sub_result);
            result.flags |= sub_result.flags;
            let leftmost_compound_matches =
                sub_result.leftmost_compound_matches.unwrap_or_default();

            last_checked = Some((element, depth));
            selector_matched = cache_matched_elements_and_return_matched_result(
                argument_context.leftmost_relation(),
                anchor,
                &leftmost_compound_matches,
                cache_context.as_mut(),
            );
            if selector_matched {
                break;
            }
        }

        if let (Some(cache_context), Some((last, depth))) =
            (cache_context.as_mut(), last_checked.as_ref())
        {
            cache_context.set_all_traversed_elements_as_checked(last, *depth);
        }

        if !selector_matched {
            continue;
        }

        if update_affected_by_has_flags {
            if let Some((last, depth)) = last_checked {
                set_affected_by_has_for_argument_matched_element(
                    &argument_context,
                    anchor,
                    &last,
                    depth,
                );
            }
        }
        return true;
    }
    false
}
