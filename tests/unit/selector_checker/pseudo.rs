/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use selector_checker::context::{
    MatchFlags, MatchResult, MatchingContext, MatchingMode, QuirksMode, ScrollbarOrientation,
    ScrollbarPart, ScrollbarState, SelectorCheckingContext,
};
use selector_checker::element_flags::ElementSelectorFlags;
use selector_checker::parser::{
    Atom, Combinator, Component, PseudoClass, PseudoElement, PseudoId, SelectorBuilder,
};
use selector_checker::tree::{Directionality, ElementState};

use crate::dom::Document;
use crate::{match_result, matches, resolving};

fn pseudo(pseudo_class: PseudoClass) -> selector_checker::parser::Selector {
    SelectorBuilder::new().pseudo_class(pseudo_class).build()
}

#[test]
fn only_child_is_first_and_last() {
    let mut doc = Document::html();
    let single_parent = doc.add(Document::ROOT, "div");
    let single = doc.add(single_parent, "p");
    let list = doc.add(Document::ROOT, "ul");
    let mut elements = doc.add_many(list, "li", 4);
    elements.push(single);

    let first = pseudo(PseudoClass::FirstChild);
    let last = pseudo(PseudoClass::LastChild);
    let only = pseudo(PseudoClass::OnlyChild);
    for element in elements {
        let is_first = matches(&doc, element, &first);
        let is_last = matches(&doc, element, &last);
        assert_eq!(matches(&doc, element, &only), is_first && is_last);
    }
    assert!(matches(&doc, single, &only));
}

#[test]
fn of_type_pseudo_classes() {
    let mut doc = Document::html();
    let parent = doc.add(Document::ROOT, "div");
    let h1 = doc.add(parent, "h1");
    let p1 = doc.add(parent, "p");
    let p2 = doc.add(parent, "p");
    let span = doc.add(parent, "span");

    let first = pseudo(PseudoClass::FirstOfType);
    let last = pseudo(PseudoClass::LastOfType);
    let only = pseudo(PseudoClass::OnlyOfType);
    assert!(matches(&doc, p1, &first));
    assert!(!matches(&doc, p2, &first));
    assert!(matches(&doc, p2, &last));
    assert!(!matches(&doc, p1, &last));
    assert!(matches(&doc, h1, &only));
    assert!(matches(&doc, span, &only));
    assert!(!matches(&doc, p1, &only));

    let flags = doc.flags(parent);
    assert!(flags.contains(
        ElementSelectorFlags::CHILDREN_AFFECTED_BY_FORWARD_POSITIONAL_RULES |
            ElementSelectorFlags::CHILDREN_AFFECTED_BY_BACKWARD_POSITIONAL_RULES
    ));
}

#[test]
fn last_child_waits_for_parsing() {
    let mut doc = Document::html();
    let parent = doc.add(Document::ROOT, "div");
    let child = doc.add(parent, "p");
    doc.set_parsing(parent);

    let last = pseudo(PseudoClass::LastChild);
    let first = pseudo(PseudoClass::FirstChild);
    assert!(!matches(&doc, child, &last));
    assert!(matches(&doc, child, &first));

    let mut querying = MatchingContext::new(MatchingMode::QueryingRules, QuirksMode::NoQuirks);
    assert!(selector_checker::matches_selector(&last, &doc.get(child), &mut querying));
}

#[test]
fn empty_and_whitespace() {
    let mut doc = Document::html();
    let truly_empty = doc.add(Document::ROOT, "div");
    let comment_only = doc.add(Document::ROOT, "div");
    doc.add_comment(comment_only);
    let whitespace = doc.add(Document::ROOT, "div");
    doc.add_text(whitespace, " \n\t ");
    let text = doc.add(Document::ROOT, "div");
    doc.add_text(text, "hello");
    let with_child = doc.add(Document::ROOT, "div");
    doc.add(with_child, "span");

    let empty = pseudo(PseudoClass::Empty);
    assert!(matches(&doc, truly_empty, &empty));
    assert!(matches(&doc, comment_only, &empty));
    assert!(!matches(&doc, text, &empty));
    assert!(!matches(&doc, with_child, &empty));
    assert!(doc
        .flags(truly_empty)
        .contains(ElementSelectorFlags::STYLE_AFFECTED_BY_EMPTY));

    let mut context = resolving();
    assert!(!selector_checker::matches_selector(
        &empty,
        &doc.get(whitespace),
        &mut context
    ));
    assert_eq!(context.use_counters.empty_whitespace_only_fail, 1);

    context.options.empty_whitespace_is_empty = true;
    assert!(selector_checker::matches_selector(
        &empty,
        &doc.get(whitespace),
        &mut context
    ));
}

#[test]
fn root_lang_dir_and_state() {
    let mut doc = Document::html();
    doc.set_attr(Document::ROOT, "lang", "en-GB");
    let body = doc.add(Document::ROOT, "body");
    let french = doc.add(body, "p");
    doc.set_attr(french, "lang", "fr");
    let english = doc.add(body, "p");
    doc.set_dir(english, Directionality::Rtl);
    doc.add_custom_state(english, "loading");

    assert!(matches(&doc, Document::ROOT, &pseudo(PseudoClass::Root)));
    assert!(!matches(&doc, body, &pseudo(PseudoClass::Root)));

    let lang = |tag: &str| {
        SelectorBuilder::new()
            .push(Component::Lang(Atom::from(tag)))
            .build()
    };
    assert!(matches(&doc, english, &lang("en")));
    assert!(matches(&doc, english, &lang("EN-gb")));
    assert!(!matches(&doc, english, &lang("e")));
    assert!(matches(&doc, french, &lang("fr")));
    assert!(!matches(&doc, french, &lang("en")));

    let dir = |value: &str| {
        SelectorBuilder::new()
            .push(Component::Dir(Atom::from(value)))
            .build()
    };
    assert!(matches(&doc, english, &dir("rtl")));
    assert!(!matches(&doc, english, &dir("ltr")));
    assert!(matches(&doc, french, &dir("LTR")));
    assert!(!matches(&doc, french, &dir("auto")));

    let state = SelectorBuilder::new()
        .push(Component::State(Atom::from("loading")))
        .build();
    assert!(matches(&doc, english, &state));
    assert!(!matches(&doc, french, &state));
}

#[test]
fn element_state_pseudo_classes() {
    let mut doc = Document::html();
    let input = doc.add(Document::ROOT, "input");
    doc.set_state(
        input,
        ElementState::ENABLED |
            ElementState::CHECKED |
            ElementState::INVALID |
            ElementState::READ_WRITE |
            ElementState::FORM_CONTROL,
    );
    let output = doc.add(Document::ROOT, "output");
    doc.set_state(output, ElementState::VALID);
    let details = doc.add(Document::ROOT, "details");
    doc.set_state(details, ElementState::OPENABLE);
    let div = doc.add(Document::ROOT, "div");

    assert!(matches(&doc, input, &pseudo(PseudoClass::Enabled)));
    assert!(!matches(&doc, input, &pseudo(PseudoClass::Disabled)));
    assert!(matches(&doc, input, &pseudo(PseudoClass::Checked)));
    assert!(matches(&doc, input, &pseudo(PseudoClass::Invalid)));
    assert!(matches(&doc, input, &pseudo(PseudoClass::ReadWrite)));
    assert!(!matches(&doc, input, &pseudo(PseudoClass::ReadOnly)));

    // Validity only applies to form controls.
    assert!(!matches(&doc, output, &pseudo(PseudoClass::Valid)));
    assert!(matches(&doc, div, &pseudo(PseudoClass::ReadOnly)));

    assert!(matches(&doc, details, &pseudo(PseudoClass::Closed)));
    assert!(!matches(&doc, details, &pseudo(PseudoClass::Open)));
    assert!(!matches(&doc, div, &pseudo(PseudoClass::Closed)));
    doc.set_state(details, ElementState::OPEN);
    assert!(matches(&doc, details, &pseudo(PseudoClass::Open)));

    assert!(matches(&doc, div, &pseudo(PseudoClass::True)));
    assert!(!matches(&doc, div, &pseudo(PseudoClass::Unparsed)));
}

#[test]
fn links_and_visited() {
    let mut doc = Document::html();
    let link = doc.add(Document::ROOT, "a");
    doc.set_link(link);
    let inner = doc.add(link, "span");
    let after = doc.add(Document::ROOT, "span");

    let any_link = pseudo(PseudoClass::AnyLink);
    let unvisited = pseudo(PseudoClass::Link);
    let visited = pseudo(PseudoClass::Visited);
    assert!(matches(&doc, link, &any_link));
    assert!(matches(&doc, link, &unvisited));
    assert!(!matches(&doc, link, &visited));

    // The visited pass matches with `match_visited` set.
    let visited_pass = |index: usize, selector: &selector_checker::parser::Selector| {
        let mut matching = resolving();
        let mut context = SelectorCheckingContext::new(selector, doc.get(index));
        context.match_visited = true;
        let mut result = MatchResult::default();
        selector_checker::matches(&context, &mut matching, &mut result)
    };
    assert!(visited_pass(link, &visited));
    assert!(!visited_pass(link, &unvisited));

    // :visited only applies up the ancestor chain, never across siblings.
    let descendant = SelectorBuilder::new()
        .tag("a")
        .pseudo_class(PseudoClass::Visited)
        .descendant()
        .tag("span")
        .build();
    let sibling = SelectorBuilder::new()
        .tag("a")
        .pseudo_class(PseudoClass::Visited)
        .next_sibling()
        .tag("span")
        .build();
    assert!(visited_pass(inner, &descendant));
    assert!(!visited_pass(after, &sibling));
}

#[test]
fn hover_quirk() {
    let mut doc = Document::html();
    let div = doc.add(Document::ROOT, "div.box");
    doc.set_state(div, ElementState::HOVER | ElementState::ACTIVE);
    let link = doc.add(Document::ROOT, "a");
    doc.set_link(link);
    doc.set_state(link, ElementState::HOVER);

    let bare = pseudo(PseudoClass::Hover);
    let user_actions_only = SelectorBuilder::new()
        .pseudo_class(PseudoClass::Hover)
        .pseudo_class(PseudoClass::Active)
        .build();
    let tagged = SelectorBuilder::new()
        .tag("div")
        .pseudo_class(PseudoClass::Hover)
        .build();
    let classed = SelectorBuilder::new()
        .pseudo_class(PseudoClass::Hover)
        .class("box")
        .build();

    let mut quirks = MatchingContext::new(MatchingMode::ResolvingStyle, QuirksMode::Quirks);
    let mut check = |index: usize, selector: &selector_checker::parser::Selector| {
        selector_checker::matches_selector(selector, &doc.get(index), &mut quirks)
    };
    assert!(!check(div, &bare));
    assert!(!check(div, &user_actions_only));
    assert!(check(div, &tagged));
    assert!(check(div, &classed));
    assert!(check(link, &bare));

    assert!(matches(&doc, div, &bare));
}

#[test]
fn user_action_dependencies() {
    let mut doc = Document::html();
    let parent = doc.add(Document::ROOT, "div.a");
    let child = doc.add(parent, "span.b");
    doc.set_state(child, ElementState::HOVER | ElementState::FOCUS_WITHIN);

    // .a:hover .b
    let ancestor_hover = SelectorBuilder::new()
        .class("a")
        .pseudo_class(PseudoClass::Hover)
        .descendant()
        .class("b")
        .build();
    assert!(!matches(&doc, child, &ancestor_hover));
    assert!(doc
        .flags(parent)
        .contains(ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_HOVER));

    // .b:hover:focus-within
    let subject = SelectorBuilder::new()
        .class("b")
        .pseudo_class(PseudoClass::Hover)
        .pseudo_class(PseudoClass::FocusWithin)
        .build();
    let mut matching = resolving();
    let (matched, result) = match_result(&doc, child, &subject, &mut matching);
    assert!(matched);
    assert_eq!(
        result.flags,
        MatchFlags::AFFECTED_BY_HOVER | MatchFlags::AFFECTED_BY_FOCUS_WITHIN
    );
    assert!(!doc
        .flags(child)
        .contains(ElementSelectorFlags::CHILDREN_OR_SIBLINGS_AFFECTED_BY_HOVER));

    // Nothing is recorded outside of style resolution.
    doc.clear_flags();
    let mut querying = MatchingContext::new(MatchingMode::QueryingRules, QuirksMode::NoQuirks);
    selector_checker::matches_selector(&ancestor_hover, &doc.get(child), &mut querying);
    assert!(doc.flags(parent).is_empty());
}

#[test]
fn pseudo_elements_report_dynamic_pseudo() {
    let mut doc = Document::html();
    let div = doc.add(Document::ROOT, "div");
    let child = doc.add(div, "span");

    let before = SelectorBuilder::new()
        .tag("div")
        .pseudo_element(PseudoElement::Before)
        .build();
    let mut matching = resolving();
    let (matched, result) = match_result(&doc, div, &before, &mut matching);
    assert!(matched);
    assert_eq!(result.dynamic_pseudo, PseudoId::Before);
    // The element itself doesn't match.
    assert!(!matches(&doc, div, &before));

    // State after a pseudo-element isn't checked for the originating element.
    let before_hover = SelectorBuilder::new()
        .tag("div")
        .pseudo_element(PseudoElement::Before)
        .pseudo_class(PseudoClass::Hover)
        .build();
    let (matched, result) = match_result(&doc, div, &before_hover, &mut matching);
    assert!(matched);
    assert_eq!(result.dynamic_pseudo, PseudoId::Before);

    // Resolving ::before needs it in the subject compound.
    let child_of_div = SelectorBuilder::new().tag("div").child().tag("span").build();
    let mut context = SelectorCheckingContext::new(&child_of_div, doc.get(child));
    context.pseudo_id = PseudoId::Before;
    let mut result = MatchResult::default();
    assert!(!selector_checker::matches(&context, &mut matching, &mut result));
    assert!(matches(&doc, child, &child_of_div));
}

#[test]
fn highlight_names() {
    let mut doc = Document::html();
    let div = doc.add(Document::ROOT, "div");
    let selector = SelectorBuilder::new()
        .tag("div")
        .pseudo_element(PseudoElement::Highlight(Atom::from("search")))
        .build();

    let mut any = resolving();
    let (matched, result) = match_result(&doc, div, &selector, &mut any);
    assert!(matched);
    assert_eq!(result.custom_highlight_name, Some(Atom::from("search")));

    let mut named = resolving();
    named.pseudo_argument = Some(Atom::from("search"));
    assert!(match_result(&doc, div, &selector, &mut named).0);

    let mut other = resolving();
    other.pseudo_argument = Some(Atom::from("spelling"));
    let (matched, result) = match_result(&doc, div, &selector, &mut other);
    assert!(!matched);
    assert_eq!(result.custom_highlight_name, None);
}

#[test]
fn user_agent_parts() {
    let mut doc = Document::html();
    let input = doc.add(Document::ROOT, "input");
    doc.set_user_agent_shadow(input);
    let placeholder = doc.add_shadow(input, "div");
    doc.set_user_agent_part(placeholder, "placeholder");
    let other = doc.add_shadow(input, "div");

    // input::placeholder
    let selector = SelectorBuilder::new()
        .tag("input")
        .combinator(Combinator::UaShadow)
        .pseudo_element(PseudoElement::Placeholder)
        .build();
    assert!(matches(&doc, placeholder, &selector));
    assert!(!matches(&doc, other, &selector));

    let textarea = SelectorBuilder::new()
        .tag("textarea")
        .combinator(Combinator::UaShadow)
        .pseudo_element(PseudoElement::Placeholder)
        .build();
    assert!(!matches(&doc, placeholder, &textarea));
}

#[test]
fn view_transitions() {
    let mut doc = Document::html();
    let body = doc.add(Document::ROOT, "body");
    let group = |name: &str| {
        SelectorBuilder::new()
            .pseudo_element(PseudoElement::ViewTransitionGroup(Atom::from(name)))
            .build()
    };

    // The document element originates view transition pseudo-elements.
    let mut matching = resolving();
    let (matched, result) = match_result(&doc, Document::ROOT, &group("header"), &mut matching);
    assert!(matched);
    assert_eq!(result.dynamic_pseudo, PseudoId::ViewTransitionGroup);
    assert!(!match_result(&doc, body, &group("header"), &mut matching).0);

    let resolve = |name: &str, argument: &str| {
        let mut matching = resolving();
        matching.pseudo_argument = Some(Atom::from(argument));
        let selector = group(name);
        let mut context = SelectorCheckingContext::new(&selector, doc.get(Document::ROOT));
        context.pseudo_id = PseudoId::ViewTransitionGroup;
        let mut result = MatchResult::default();
        selector_checker::matches(&context, &mut matching, &mut result)
    };
    assert!(resolve("header", "header"));
    assert!(resolve("*", "header"));
    assert!(!resolve("footer", "header"));
}

#[test]
fn scrollbar_pseudo_classes() {
    let mut doc = Document::html();
    let div = doc.add(Document::ROOT, "div");

    let thumb_with = |pseudo_class: PseudoClass| {
        SelectorBuilder::new()
            .tag("div")
            .pseudo_element(PseudoElement::ScrollbarThumb)
            .pseudo_class(pseudo_class)
            .build()
    };
    let state = ScrollbarState {
        orientation: ScrollbarOrientation::Vertical,
        enabled: true,
        hovered_part: ScrollbarPart::Thumb,
        pressed_part: ScrollbarPart::NoPart,
        has_buttons: false,
        corner_present: true,
        part: ScrollbarPart::Thumb,
    };
    let check = |selector: &selector_checker::parser::Selector, state: ScrollbarState| {
        let mut matching = resolving();
        matching.scrollbar = Some(state);
        let mut context = SelectorCheckingContext::new(selector, doc.get(div));
        context.pseudo_id = PseudoId::ScrollbarThumb;
        let mut result = MatchResult::default();
        let matched = selector_checker::matches(&context, &mut matching, &mut result);
        matched && result.dynamic_pseudo == PseudoId::ScrollbarThumb
    };

    assert!(check(&thumb_with(PseudoClass::Hover), state));
    assert!(!check(&thumb_with(PseudoClass::Active), state));
    assert!(check(&thumb_with(PseudoClass::Vertical), state));
    assert!(!check(&thumb_with(PseudoClass::Horizontal), state));
    assert!(check(&thumb_with(PseudoClass::Enabled), state));
    assert!(check(&thumb_with(PseudoClass::CornerPresent), state));
    assert!(!check(&thumb_with(PseudoClass::DoubleButton), state));
    assert!(!check(&thumb_with(PseudoClass::Decrement), state));

    let track = ScrollbarState {
        part: ScrollbarPart::BackTrack,
        ..state
    };
    assert!(check(&thumb_with(PseudoClass::Decrement), track));
    assert!(check(&thumb_with(PseudoClass::Start), track));
    assert!(check(&thumb_with(PseudoClass::NoButton), track));
    assert!(!check(&thumb_with(PseudoClass::SingleButton), track));

    let hovered_track = ScrollbarState {
        part: ScrollbarPart::TrackBg,
        hovered_part: ScrollbarPart::Thumb,
        ..state
    };
    assert!(check(&thumb_with(PseudoClass::Hover), hovered_track));

    // Scrollbar pseudo-classes never match outside of a scrollbar.
    assert!(!matches(&doc, div, &pseudo(PseudoClass::Horizontal)));
}
