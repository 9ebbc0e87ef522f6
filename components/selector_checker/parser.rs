/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The already-parsed selector representation consumed by the checker.
//!
//! A `Selector` stores its simple selectors in *matching order*: the
//! rightmost compound comes first, and `Component::Combinator` entries sit
//! between compounds. Inside a compound the simple selectors keep their
//! source order, which matters for pseudo-elements (`div::before:hover`).
//!
//! Text parsing is out of scope; selectors are assembled with
//! `SelectorBuilder`, which takes them in source order.

use std::fmt;

use servo_arc::Arc;
use smallvec::{smallvec, SmallVec};

pub type Atom = string_cache::DefaultAtom;
pub type LocalName = Atom;
pub type Namespace = Atom;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The relation between two compounds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Combinator {
    /// Whitespace.
    Descendant,
    /// `>`
    Child,
    /// `+`
    NextSibling,
    /// `~`
    LaterSibling,
    /// The leftmost relation of a `:has()` argument, e.g. `:has(.a)`.
    RelativeDescendant,
    /// `:has(> .a)`
    RelativeChild,
    /// `:has(+ .a)`
    RelativeNextSibling,
    /// `:has(~ .a)`
    RelativeLaterSibling,
    /// From a user-agent shadow tree element to its host, as used by
    /// `input::placeholder`.
    UaShadow,
    /// From a slotted element to its assigned slot (`::slotted()`).
    ShadowSlot,
    /// From a part to the host in the rule's tree scope (`::part()`).
    ShadowPart,
    /// Enters the activations of an `@scope` rule without moving.
    ScopeActivation,
}

impl Combinator {
    #[inline]
    pub fn is_relative(self) -> bool {
        matches!(
            self,
            Combinator::RelativeDescendant |
                Combinator::RelativeChild |
                Combinator::RelativeNextSibling |
                Combinator::RelativeLaterSibling
        )
    }

    #[inline]
    pub fn is_sibling(self) -> bool {
        matches!(
            self,
            Combinator::NextSibling |
                Combinator::LaterSibling |
                Combinator::RelativeNextSibling |
                Combinator::RelativeLaterSibling
        )
    }

    /// The relative counterpart of a plain combinator.
    pub fn to_relative(self) -> Combinator {
        match self {
            Combinator::Descendant => Combinator::RelativeDescendant,
            Combinator::Child => Combinator::RelativeChild,
            Combinator::NextSibling => Combinator::RelativeNextSibling,
            Combinator::LaterSibling => Combinator::RelativeLaterSibling,
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaseSensitivity {
    CaseSensitive,
    AsciiCaseInsensitive,
}

impl CaseSensitivity {
    #[inline]
    pub fn eq(self, a: &str, b: &str) -> bool {
        match self {
            CaseSensitivity::CaseSensitive => a == b,
            CaseSensitivity::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }

    #[inline]
    pub fn eq_atom(self, a: &Atom, b: &Atom) -> bool {
        match self {
            CaseSensitivity::CaseSensitive => a == b,
            CaseSensitivity::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }

    #[inline]
    fn eq_bytes(self, a: &[u8], b: &[u8]) -> bool {
        match self {
            CaseSensitivity::CaseSensitive => a == b,
            CaseSensitivity::AsciiCaseInsensitive => a.eq_ignore_ascii_case(b),
        }
    }

    pub fn starts_with(self, haystack: &str, needle: &str) -> bool {
        let (hay, needle) = (haystack.as_bytes(), needle.as_bytes());
        hay.len() >= needle.len() && self.eq_bytes(&hay[..needle.len()], needle)
    }

    pub fn ends_with(self, haystack: &str, needle: &str) -> bool {
        let (hay, needle) = (haystack.as_bytes(), needle.as_bytes());
        hay.len() >= needle.len() && self.eq_bytes(&hay[hay.len() - needle.len()..], needle)
    }

    /// Byte offset of the first occurrence of `needle` at or after `from`.
    pub fn find(self, haystack: &str, needle: &str, from: usize) -> Option<usize> {
        let hay = haystack.as_bytes();
        let needle = needle.as_bytes();
        if needle.len() > hay.len() {
            return None;
        }
        (from..=hay.len() - needle.len())
            .find(|&start| self.eq_bytes(&hay[start..start + needle.len()], needle))
    }

    pub fn contains(self, haystack: &str, needle: &str) -> bool {
        self.find(haystack, needle, 0).is_some()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NamespaceConstraint {
    /// `*|`
    Any,
    /// A specific namespace url. The empty atom is the null namespace.
    Specific(Namespace),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TagSelector {
    /// `None` for the universal selector.
    pub local_name: Option<LocalName>,
    pub namespace: NamespaceConstraint,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrOperator {
    /// `[attr]`
    Exists,
    /// `[attr=value]`
    Equal,
    /// `[attr~=value]`
    Includes,
    /// `[attr|=value]`
    DashMatch,
    /// `[attr^=value]`
    Prefix,
    /// `[attr*=value]`
    Substring,
    /// `[attr$=value]`
    Suffix,
}

/// The case flag of an attribute selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttrCaseMode {
    /// No flag: case-sensitive, except for the legacy HTML attribute list in
    /// HTML documents.
    Default,
    /// `i`
    CaseInsensitive,
    /// `s`
    CaseSensitiveAlways,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttrSelector {
    pub local_name: LocalName,
    pub namespace: NamespaceConstraint,
    pub operator: AttrOperator,
    pub value: Atom,
    pub case_mode: AttrCaseMode,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NthType {
    Child,
    LastChild,
    OfType,
    LastOfType,
}

impl NthType {
    #[inline]
    pub fn is_of_type(self) -> bool {
        matches!(self, NthType::OfType | NthType::LastOfType)
    }

    #[inline]
    pub fn is_from_end(self) -> bool {
        matches!(self, NthType::LastChild | NthType::LastOfType)
    }
}

/// `:nth-*(An+B)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NthSelectorData {
    pub ty: NthType,
    pub a: i32,
    pub b: i32,
}

impl NthSelectorData {
    #[inline]
    pub const fn new(ty: NthType, a: i32, b: i32) -> Self {
        NthSelectorData { ty, a, b }
    }

    /// Whether `index` (1-based) is `An+B` for some `n >= 0`.
    pub fn matches_index(&self, index: u32) -> bool {
        let index = i64::from(index);
        let a = i64::from(self.a);
        let b = i64::from(self.b);
        if a == 0 {
            return index == b;
        }
        if a > 0 {
            if index < b {
                return false;
            }
            return (index - b) % a == 0;
        }
        if index > b {
            return false;
        }
        (b - index) % (-a) == 0
    }
}

/// `:nth-child(An+B of S)` and `:nth-last-child(An+B of S)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NthOfSelectorData {
    pub nth: NthSelectorData,
    pub selectors: SelectorList,
}

/// Pseudo-classes without arguments.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PseudoClass {
    Empty,
    Root,
    Scope,
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
    AnyLink,
    Link,
    Visited,
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    Drag,
    Enabled,
    Disabled,
    Checked,
    Indeterminate,
    Valid,
    Invalid,
    Required,
    Optional,
    ReadOnly,
    ReadWrite,
    InRange,
    OutOfRange,
    PlaceholderShown,
    Default,
    Defined,
    Target,
    Fullscreen,
    Modal,
    PopoverOpen,
    Open,
    Closed,
    Paused,
    Playing,
    Autofill,
    WindowInactive,
    // Scrollbar pseudo-classes.
    Horizontal,
    Vertical,
    Decrement,
    Increment,
    Start,
    End,
    DoubleButton,
    SingleButton,
    NoButton,
    CornerPresent,
    /// The implicit anchor at the left of a `:has()` argument.
    RelativeAnchor,
    /// Always matches. Used as the rightmost compound of `@scope` rules.
    True,
    /// A pseudo-class the parser kept but could not understand.
    Unparsed,
}

/// The ids a matched pseudo-element resolves to.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum PseudoId {
    #[default]
    None,
    FirstLine,
    FirstLetter,
    Before,
    After,
    Marker,
    Backdrop,
    Selection,
    TargetText,
    Highlight,
    Scrollbar,
    ScrollbarButton,
    ScrollbarThumb,
    ScrollbarTrack,
    ScrollbarTrackPiece,
    ScrollbarCorner,
    Resizer,
    ViewTransition,
    ViewTransitionGroup,
    ViewTransitionImagePair,
    ViewTransitionOld,
    ViewTransitionNew,
}

impl PseudoId {
    #[inline]
    pub fn is_scrollbar_part(self) -> bool {
        matches!(
            self,
            PseudoId::Scrollbar |
                PseudoId::ScrollbarButton |
                PseudoId::ScrollbarThumb |
                PseudoId::ScrollbarTrack |
                PseudoId::ScrollbarTrackPiece |
                PseudoId::ScrollbarCorner |
                PseudoId::Resizer
        )
    }

    #[inline]
    pub fn is_view_transition(self) -> bool {
        matches!(
            self,
            PseudoId::ViewTransition |
                PseudoId::ViewTransitionGroup |
                PseudoId::ViewTransitionImagePair |
                PseudoId::ViewTransitionOld |
                PseudoId::ViewTransitionNew
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PseudoElement {
    Before,
    After,
    Marker,
    FirstLine,
    FirstLetter,
    Backdrop,
    Selection,
    TargetText,
    /// `::highlight(name)`
    Highlight(Atom),
    /// `::part(a b)`; every name has to be a part of the element.
    Part(Box<[Atom]>),
    /// `::slotted(compound)`
    Slotted(Selector),
    Placeholder,
    FileSelectorButton,
    DetailsContent,
    /// `::-webkit-*` and other user-agent shadow parts, by part name.
    UserAgentPart(Atom),
    Scrollbar,
    ScrollbarButton,
    ScrollbarThumb,
    ScrollbarTrack,
    ScrollbarTrackPiece,
    ScrollbarCorner,
    Resizer,
    ViewTransition,
    /// The argument is a transition name or `*`.
    ViewTransitionGroup(Atom),
    ViewTransitionImagePair(Atom),
    ViewTransitionOld(Atom),
    ViewTransitionNew(Atom),
}

impl PseudoElement {
    /// The dynamic pseudo id this pseudo-element resolves to, if any.
    pub fn pseudo_id(&self) -> PseudoId {
        match *self {
            PseudoElement::Before => PseudoId::Before,
            PseudoElement::After => PseudoId::After,
            PseudoElement::Marker => PseudoId::Marker,
            PseudoElement::FirstLine => PseudoId::FirstLine,
            PseudoElement::FirstLetter => PseudoId::FirstLetter,
            PseudoElement::Backdrop => PseudoId::Backdrop,
            PseudoElement::Selection => PseudoId::Selection,
            PseudoElement::TargetText => PseudoId::TargetText,
            PseudoElement::Highlight(..) => PseudoId::Highlight,
            PseudoElement::Scrollbar => PseudoId::Scrollbar,
            PseudoElement::ScrollbarButton => PseudoId::ScrollbarButton,
            PseudoElement::ScrollbarThumb => PseudoId::ScrollbarThumb,
            PseudoElement::ScrollbarTrack => PseudoId::ScrollbarTrack,
            PseudoElement::ScrollbarTrackPiece => PseudoId::ScrollbarTrackPiece,
            PseudoElement::ScrollbarCorner => PseudoId::ScrollbarCorner,
            PseudoElement::Resizer => PseudoId::Resizer,
            PseudoElement::ViewTransition => PseudoId::ViewTransition,
            PseudoElement::ViewTransitionGroup(..) => PseudoId::ViewTransitionGroup,
            PseudoElement::ViewTransitionImagePair(..) => PseudoId::ViewTransitionImagePair,
            PseudoElement::ViewTransitionOld(..) => PseudoId::ViewTransitionOld,
            PseudoElement::ViewTransitionNew(..) => PseudoId::ViewTransitionNew,
            PseudoElement::Part(..) |
            PseudoElement::Slotted(..) |
            PseudoElement::Placeholder |
            PseudoElement::FileSelectorButton |
            PseudoElement::DetailsContent |
            PseudoElement::UserAgentPart(..) => PseudoId::None,
        }
    }
}

/// A simple selector, or a combinator between two compounds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Component {
    Combinator(Combinator),

    Tag(TagSelector),
    ID(Atom),
    Class(Atom),
    Attribute(Box<AttrSelector>),

    PseudoClass(PseudoClass),
    Nth(NthSelectorData),
    NthOf(Box<NthOfSelectorData>),
    /// `:is()`
    Is(SelectorList),
    /// `:where()`
    Where(SelectorList),
    /// `:not()`
    Negation(SelectorList),
    /// `:has()`; every selector in the list starts with a relative combinator.
    Has(SelectorList),
    /// The nesting selector `&`. `None` at the top level, where it behaves
    /// like `:scope`.
    Parent(Option<SelectorList>),
    /// `:host` or `:host(compound)`
    Host(Option<Selector>),
    /// `:host-context(compound)`
    HostContext(Selector),
    /// `:lang(tag)`
    Lang(Atom),
    /// `:dir(ltr|rtl)`
    Dir(Atom),
    /// `:state(ident)`
    State(Atom),

    PseudoElement(PseudoElement),
}

impl Component {
    #[inline]
    pub fn is_combinator(&self) -> bool {
        matches!(*self, Component::Combinator(..))
    }

    #[inline]
    pub fn is_host(&self) -> bool {
        matches!(*self, Component::Host(..) | Component::HostContext(..))
    }

    #[inline]
    pub fn is_pseudo_element(&self) -> bool {
        matches!(*self, Component::PseudoElement(..))
    }

    #[inline]
    pub fn is_scope(&self) -> bool {
        matches!(*self, Component::PseudoClass(PseudoClass::Scope))
    }

    /// Whether this is a pseudo-class, the way `:has()` invalidation counts
    /// them.
    pub fn is_pseudo_class(&self) -> bool {
        matches!(
            *self,
            Component::PseudoClass(..) |
                Component::Nth(..) |
                Component::NthOf(..) |
                Component::Is(..) |
                Component::Where(..) |
                Component::Negation(..) |
                Component::Has(..) |
                Component::Parent(..) |
                Component::Host(..) |
                Component::HostContext(..) |
                Component::Lang(..) |
                Component::Dir(..) |
                Component::State(..)
        )
    }

    pub fn nth_child(a: i32, b: i32) -> Self {
        Component::Nth(NthSelectorData::new(NthType::Child, a, b))
    }

    pub fn nth_last_child(a: i32, b: i32) -> Self {
        Component::Nth(NthSelectorData::new(NthType::LastChild, a, b))
    }

    pub fn nth_of_type(a: i32, b: i32) -> Self {
        Component::Nth(NthSelectorData::new(NthType::OfType, a, b))
    }

    pub fn nth_last_of_type(a: i32, b: i32) -> Self {
        Component::Nth(NthSelectorData::new(NthType::LastOfType, a, b))
    }

    /// `:nth-child(An+B of S)`, or `:nth-last-child` when `from_end`.
    pub fn nth_child_of(a: i32, b: i32, from_end: bool, selectors: SelectorList) -> Self {
        let ty = if from_end {
            NthType::LastChild
        } else {
            NthType::Child
        };
        Component::NthOf(Box::new(NthOfSelectorData {
            nth: NthSelectorData::new(ty, a, b),
            selectors,
        }))
    }
}

/// What follows the simple selector at some index of a selector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Link {
    /// The simple selector is the last one in the complex selector.
    Last,
    /// The next simple selector is in the same compound.
    SubSelector,
    /// A combinator separates it from the next compound.
    Combinator(Combinator),
}

#[derive(Debug, Eq, PartialEq)]
struct SelectorInner {
    components: Box<[Component]>,
}

/// A complex selector.
///
/// Cheap to clone; clones share the same components and the same identity.
#[derive(Clone, Eq, PartialEq)]
pub struct Selector(Arc<SelectorInner>);

impl Selector {
    fn from_components(components: Vec<Component>) -> Self {
        debug_assert!(!components.is_empty(), "Empty selector");
        debug_assert!(
            !components.first().is_some_and(Component::is_combinator) &&
                !components.last().is_some_and(Component::is_combinator),
            "Selector can't start or end with a combinator"
        );
        Selector(Arc::new(SelectorInner {
            components: components.into_boxed_slice(),
        }))
    }

    /// The components, in matching order.
    #[inline]
    pub fn components(&self) -> &[Component] {
        &self.0.components
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.components.is_empty()
    }

    #[inline]
    pub fn component(&self, index: usize) -> &Component {
        &self.0.components[index]
    }

    /// A stable identity for cache keys. Two clones of a selector have the
    /// same key; two equal but separately built selectors do not.
    #[inline]
    pub fn key(&self) -> usize {
        &*self.0 as *const SelectorInner as usize
    }

    /// What follows the simple selector at `index`.
    #[inline]
    pub fn link(&self, index: usize) -> Link {
        match self.0.components.get(index + 1) {
            None => Link::Last,
            Some(Component::Combinator(combinator)) => Link::Combinator(*combinator),
            Some(_) => Link::SubSelector,
        }
    }

    /// The index of the simple selector matched after the one at `index`.
    #[inline]
    pub fn next_index(&self, index: usize) -> usize {
        match self.link(index) {
            Link::Combinator(..) => index + 2,
            Link::SubSelector | Link::Last => index + 1,
        }
    }

    /// The leftmost relative combinator, for a `:has()` argument.
    pub fn leftmost_relation(&self) -> Option<Combinator> {
        self.components().iter().rev().find_map(|component| match *component {
            Component::Combinator(c) if c.is_relative() => Some(c),
            _ => None,
        })
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.components().iter()).finish()
    }
}

/// A comma-separated list of selectors.
///
/// Clones share the same selectors and the same identity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectorList(Arc<SmallVec<[Selector; 1]>>);

impl SelectorList {
    pub fn single(selector: Selector) -> Self {
        SelectorList(Arc::new(smallvec![selector]))
    }

    pub fn from_vec(selectors: Vec<Selector>) -> Self {
        SelectorList(Arc::new(SmallVec::from_vec(selectors)))
    }

    #[inline]
    pub fn slice(&self) -> &[Selector] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A stable identity for cache keys, covering the whole list. Lists
    /// built separately have different keys even when they share selectors.
    #[inline]
    pub fn key(&self) -> usize {
        &*self.0 as *const SmallVec<[Selector; 1]> as usize
    }
}

/// Builds a `Selector` from simple selectors and combinators given in source
/// order.
#[derive(Debug, Default)]
pub struct SelectorBuilder {
    /// Finished compounds, each with the combinator that follows it.
    compounds: Vec<(Vec<Component>, Combinator)>,
    current: Vec<Component>,
}

impl SelectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a `:has()` argument whose leftmost relation is `combinator`,
    /// e.g. `Combinator::Child` for `:has(> ...)`.
    pub fn relative(combinator: Combinator) -> Self {
        let mut builder = Self::new();
        builder
            .current
            .push(Component::PseudoClass(PseudoClass::RelativeAnchor));
        builder.combinator(combinator.to_relative())
    }

    pub fn push(mut self, component: Component) -> Self {
        debug_assert!(!component.is_combinator(), "Use SelectorBuilder::combinator");
        self.current.push(component);
        self
    }

    pub fn combinator(mut self, combinator: Combinator) -> Self {
        debug_assert!(!self.current.is_empty(), "Empty compound selector");
        let compound = std::mem::take(&mut self.current);
        self.compounds.push((compound, combinator));
        self
    }

    pub fn tag(self, local_name: &str) -> Self {
        self.push(Component::Tag(TagSelector {
            local_name: Some(LocalName::from(local_name)),
            namespace: NamespaceConstraint::Any,
        }))
    }

    /// A type selector restricted to a namespace, like `svg|rect`.
    pub fn tag_ns(self, local_name: Option<&str>, namespace: NamespaceConstraint) -> Self {
        self.push(Component::Tag(TagSelector {
            local_name: local_name.map(LocalName::from),
            namespace,
        }))
    }

    pub fn universal(self) -> Self {
        self.tag_ns(None, NamespaceConstraint::Any)
    }

    pub fn id(self, id: &str) -> Self {
        self.push(Component::ID(Atom::from(id)))
    }

    pub fn class(self, class: &str) -> Self {
        self.push(Component::Class(Atom::from(class)))
    }

    pub fn attr(self, local_name: &str, operator: AttrOperator, value: &str) -> Self {
        self.attr_with(
            local_name,
            NamespaceConstraint::Specific(Namespace::from("")),
            operator,
            value,
            AttrCaseMode::Default,
        )
    }

    pub fn attr_with(
        self,
        local_name: &str,
        namespace: NamespaceConstraint,
        operator: AttrOperator,
        value: &str,
        case_mode: AttrCaseMode,
    ) -> Self {
        self.push(Component::Attribute(Box::new(AttrSelector {
            local_name: LocalName::from(local_name),
            namespace,
            operator,
            value: Atom::from(value),
            case_mode,
        })))
    }

    pub fn pseudo_class(self, pseudo_class: PseudoClass) -> Self {
        self.push(Component::PseudoClass(pseudo_class))
    }

    pub fn pseudo_element(self, pseudo_element: PseudoElement) -> Self {
        self.push(Component::PseudoElement(pseudo_element))
    }

    pub fn descendant(self) -> Self {
        self.combinator(Combinator::Descendant)
    }

    pub fn child(self) -> Self {
        self.combinator(Combinator::Child)
    }

    pub fn next_sibling(self) -> Self {
        self.combinator(Combinator::NextSibling)
    }

    pub fn later_sibling(self) -> Self {
        self.combinator(Combinator::LaterSibling)
    }

    /// Ends a compound that contains `:scope` inside a `@scope` rule. The
    /// scope activations of the subject are entered before that compound
    /// is matched.
    pub fn activate_scope(self) -> Self {
        self.combinator(Combinator::ScopeActivation)
            .pseudo_class(PseudoClass::True)
    }

    /// Lays the compounds out in matching order.
    pub fn build(self) -> Selector {
        let SelectorBuilder {
            compounds,
            current,
        } = self;
        debug_assert!(!current.is_empty(), "Empty compound selector");
        let len = compounds.iter().map(|(c, _)| c.len() + 1).sum::<usize>() + current.len();
        let mut components = Vec::with_capacity(len);
        components.extend(current);
        for (compound, combinator) in compounds.into_iter().rev() {
            components.push(Component::Combinator(combinator));
            components.extend(compound);
        }
        Selector::from_components(components)
    }

    /// Shorthand for a one-selector list.
    pub fn build_list(self) -> SelectorList {
        SelectorList::single(self.build())
    }
}
