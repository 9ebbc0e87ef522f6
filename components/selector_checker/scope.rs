/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `@scope` rules and the scoping roots of a match.
//!
//! An `@scope (from) to (to)` rule is *activated* by every element matching
//! `from` (within the activations of the enclosing `@scope`, if any). The
//! activation stays in effect for the descendants of that root, one step of
//! proximity further per generation, until an element matching `to` limits
//! it. The limit element itself still sees the activation, its descendants
//! don't, and selectors never match inside a limited activation.

use servo_arc::Arc;
use smallvec::SmallVec;

use crate::context::{
    Impact, MatchFlags, MatchResult, MatchingContext, SelectorCheckingContext,
};
use crate::matching::{match_selector, MatchStatus};
use crate::parser::SelectorList;
use crate::tree::{Element, TreeScope};

/// The node `:scope` refers to, and that bounds combinator traversal.
#[derive(Clone, Debug)]
pub enum ScopeNode<E> {
    /// The scoping element: `element.querySelector()`, an `@scope` root.
    Element(E),
    /// The shadow root of `host`, for rules in a shadow tree.
    ShadowRoot(E),
    /// The document.
    Document,
    /// A document fragment outside of any shadow tree.
    Fragment,
}

impl<E: Element> ScopeNode<E> {
    /// The host of the shadow tree this scope belongs to, if any.
    pub fn owner_shadow_host(&self) -> Option<E> {
        match *self {
            ScopeNode::Element(ref element) => element.containing_shadow_host(),
            ScopeNode::ShadowRoot(ref host) => Some(host.clone()),
            ScopeNode::Document | ScopeNode::Fragment => None,
        }
    }

    pub fn tree_scope(&self) -> TreeScope {
        match *self {
            ScopeNode::Element(ref element) => element.tree_scope(),
            ScopeNode::ShadowRoot(ref host) => TreeScope::Shadow(host.opaque()),
            ScopeNode::Document | ScopeNode::Fragment => TreeScope::Document,
        }
    }

    /// The tree scope that contains the host of this scope's shadow tree.
    pub fn parent_tree_scope(&self) -> Option<TreeScope> {
        self.owner_shadow_host().map(|host| host.tree_scope())
    }

    #[inline]
    pub fn is_in_shadow_tree(&self) -> bool {
        self.tree_scope() != TreeScope::Document
    }

    /// Shadow roots are document fragments too.
    #[inline]
    pub fn is_document_fragment(&self) -> bool {
        matches!(*self, ScopeNode::ShadowRoot(..) | ScopeNode::Fragment)
    }

    /// Whether this is the shadow root `element` is a child of.
    pub fn is_containing_shadow_root_of(&self, element: &E) -> bool {
        match *self {
            ScopeNode::ShadowRoot(ref host) => {
                element.parent_node_is_shadow_root() &&
                    element
                        .containing_shadow_host()
                        .is_some_and(|own_host| own_host.is_same(host))
            },
            _ => false,
        }
    }

    #[inline]
    pub fn is_element(&self, element: &E) -> bool {
        matches!(*self, ScopeNode::Element(ref scope) if scope.is_same(element))
    }

    /// The highest element activations under this root may be found at.
    fn activation_ceiling(&self) -> Option<&E> {
        match *self {
            ScopeNode::Element(ref element) | ScopeNode::ShadowRoot(ref element) => Some(element),
            ScopeNode::Document | ScopeNode::Fragment => None,
        }
    }
}

/// The prelude of an `@scope` rule, linked to the `@scope` it is nested in.
#[derive(Debug)]
pub struct StyleScope {
    from: Option<SelectorList>,
    to: Option<SelectorList>,
    parent: Option<Arc<StyleScope>>,
}

impl StyleScope {
    /// `@scope (from) to (to)`. Without `from` the scope is implicit, and its
    /// roots are the elements the tree reports through
    /// `Element::is_implicit_scope_root`.
    pub fn new(from: Option<SelectorList>, to: Option<SelectorList>) -> Self {
        StyleScope {
            from,
            to,
            parent: None,
        }
    }

    /// Nests this scope inside `parent`.
    pub fn nested(mut self, parent: Arc<StyleScope>) -> Self {
        self.parent = Some(parent);
        self
    }

    #[inline]
    pub fn from(&self) -> Option<&SelectorList> {
        self.from.as_ref()
    }

    #[inline]
    pub fn to(&self) -> Option<&SelectorList> {
        self.to.as_ref()
    }

    #[inline]
    pub fn parent(&self) -> Option<&StyleScope> {
        self.parent.as_deref()
    }

    #[inline]
    pub fn is_implicit(&self) -> bool {
        self.from.is_none()
    }

    /// Identity for the activation cache.
    #[inline]
    pub fn key(&self) -> usize {
        self as *const StyleScope as usize
    }
}

#[derive(Clone, Debug)]
pub struct Activation<E> {
    /// `None` only for the default activation of a match without a scope.
    pub root: Option<ScopeNode<E>>,
    /// Generations between the element and `root`.
    pub proximity: u32,
    /// The element matched the scope's limit.
    pub limited: bool,
}

/// The activations of one `@scope` at one element.
#[derive(Debug)]
pub struct Activations<E> {
    pub activations: SmallVec<[Activation<E>; 1]>,
    /// Flags gathered while matching `from` and `to` selectors.
    pub match_flags: MatchFlags,
}

impl<E> Default for Activations<E> {
    fn default() -> Self {
        Activations {
            activations: SmallVec::new(),
            match_flags: MatchFlags::empty(),
        }
    }
}

impl<E> Activations<E> {
    /// The activations selectors can match in.
    pub fn active(&self) -> impl Iterator<Item = &Activation<E>> {
        self.activations.iter().filter(|activation| !activation.limited)
    }
}

/// The activations of `style_scope` at the subject of `context`.
pub(crate) fn ensure_activations<'s, E: Element>(
    context: &SelectorCheckingContext<'s, E>,
    style_scope: &StyleScope,
    matching: &mut MatchingContext<'_, E>,
) -> Arc<Activations<E>> {
    let outer = match style_scope.parent() {
        Some(parent) => ensure_activations(context, parent, matching),
        None => {
            let mut default = Activations::default();
            default.activations.push(Activation {
                root: context.scope.clone(),
                proximity: u32::MAX,
                limited: false,
            });
            Arc::new(default)
        },
    };
    // Limits must be evaluated with the original :visited setting, even if a
    // link on the way here turned it off.
    let match_visited = context.match_visited || context.had_match_visited;
    calculate_activations(
        &context.subject,
        style_scope,
        &outer,
        !match_visited,
        match_visited,
        matching,
    )
}

fn calculate_activations<E: Element>(
    element: &E,
    style_scope: &StyleScope,
    outer: &Activations<E>,
    use_cache: bool,
    match_visited: bool,
    matching: &mut MatchingContext<'_, E>,
) -> Arc<Activations<E>> {
    let key = (style_scope.key(), element.opaque());
    if use_cache {
        if let Some(cached) = matching.scope_activations.get(&key) {
            return cached.clone();
        }
    }

    let mut activations = Activations::default();
    let mut outer_active = outer.active().peekable();
    if let Some(highest) = outer_active.peek() {
        // Stay within the outer scope.
        let at_ceiling = highest
            .root
            .as_ref()
            .and_then(ScopeNode::activation_ceiling)
            .is_some_and(|ceiling| ceiling.is_same(element));
        let parent_activations = match element.parent_or_shadow_host_element() {
            Some(parent) if !at_ceiling => Some(calculate_activations(
                &parent,
                style_scope,
                outer,
                use_cache,
                match_visited && !element.is_link(),
                matching,
            )),
            _ => None,
        };

        if let Some(parent_activations) = parent_activations {
            activations.match_flags = parent_activations.match_flags;
            for activation in parent_activations.active() {
                let limited = is_scoping_limit(
                    style_scope,
                    activation.root.as_ref(),
                    element,
                    match_visited,
                    &mut activations.match_flags,
                    matching,
                );
                activations.activations.push(Activation {
                    root: activation.root.clone(),
                    proximity: activation.proximity.saturating_add(1),
                    limited,
                });
            }
        }

        for outer_activation in outer_active {
            let activates = match style_scope.from() {
                Some(from) => matches_with_scope(
                    element,
                    from,
                    outer_activation.root.as_ref(),
                    match_visited,
                    &mut activations.match_flags,
                    matching,
                ),
                None => element.is_implicit_scope_root(style_scope),
            };
            if !activates {
                continue;
            }
            // A new root can be its own limit: @scope (.x) to (.x).
            let root = ScopeNode::Element(element.clone());
            let limited = is_scoping_limit(
                style_scope,
                Some(&root),
                element,
                match_visited,
                &mut activations.match_flags,
                matching,
            );
            activations.activations.push(Activation {
                root: Some(root),
                proximity: 0,
                limited,
            });
            break;
        }
    }

    let activations = Arc::new(activations);
    if use_cache {
        matching.scope_activations.insert(key, activations.clone());
    }
    activations
}

fn is_scoping_limit<E: Element>(
    style_scope: &StyleScope,
    root: Option<&ScopeNode<E>>,
    element: &E,
    match_visited: bool,
    match_flags: &mut MatchFlags,
    matching: &mut MatchingContext<'_, E>,
) -> bool {
    match style_scope.to() {
        Some(to) => matches_with_scope(element, to, root, match_visited, match_flags, matching),
        None => false,
    }
}

/// Matches `list` against `element` with `root` as the `:scope`.
///
/// The outcome is cached for any position of `:scope` in the selector using
/// it, so flags are recorded for both subject and non-subject impact.
fn matches_with_scope<E: Element>(
    element: &E,
    list: &SelectorList,
    root: Option<&ScopeNode<E>>,
    match_visited: bool,
    match_flags: &mut MatchFlags,
    matching: &mut MatchingContext<'_, E>,
) -> bool {
    for selector in list.slice() {
        let mut context = SelectorCheckingContext::new(selector, element.clone());
        context.scope = root.cloned();
        context.match_visited = match_visited;
        context.impact = Impact::Both;
        let mut result = MatchResult::default();
        let matched = match_selector(&context, matching, &mut result) == MatchStatus::Matches;
        *match_flags |= result.flags;
        if matched {
            return true;
        }
    }
    false
}
