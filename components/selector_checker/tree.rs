/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Traits that nodes must implement. Breaks the otherwise-cyclic dependency
//! between the checker and the DOM it runs against.

use std::fmt::Debug;

use bitflags::bitflags;

use crate::element_flags::ElementSelectorFlags;
use crate::parser::{Atom, CaseSensitivity, LocalName, Namespace, HTML_NAMESPACE};
use crate::scope::StyleScope;

/// Opaque identity of an element, usable as a hash key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OpaqueElement(usize);

impl OpaqueElement {
    /// Creates a new OpaqueElement from an arbitrarily-typed pointer.
    pub fn new<T>(ptr: &T) -> Self {
        OpaqueElement(ptr as *const T as usize)
    }

    /// Creates an OpaqueElement from a host-chosen number, such as an arena
    /// index.
    pub const fn from_raw(value: usize) -> Self {
        OpaqueElement(value)
    }

    pub const fn as_raw(self) -> usize {
        self.0
    }
}

/// The tree an element lives in: the document tree, or the shadow tree of a
/// given host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TreeScope {
    Document,
    Shadow(OpaqueElement),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Directionality {
    Ltr,
    Rtl,
}

bitflags! {
    /// Dynamic state an element exposes to state-based pseudo-classes.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ElementState: u64 {
        const HOVER = 1 << 0;
        const ACTIVE = 1 << 1;
        const FOCUS = 1 << 2;
        const FOCUS_VISIBLE = 1 << 3;
        const FOCUS_WITHIN = 1 << 4;
        const DRAG = 1 << 5;
        const ENABLED = 1 << 7;
        const DISABLED = 1 << 8;
        const CHECKED = 1 << 9;
        const INDETERMINATE = 1 << 10;
        const VALID = 1 << 11;
        const INVALID = 1 << 12;
        const REQUIRED = 1 << 13;
        const OPTIONAL = 1 << 14;
        const READ_WRITE = 1 << 15;
        const IN_RANGE = 1 << 16;
        const OUT_OF_RANGE = 1 << 17;
        const PLACEHOLDER_SHOWN = 1 << 18;
        const DEFAULT = 1 << 19;
        const DEFINED = 1 << 20;
        const TARGET = 1 << 21;
        const FULLSCREEN = 1 << 22;
        const MODAL = 1 << 23;
        const POPOVER_OPEN = 1 << 24;
        const OPEN = 1 << 25;
        const PAUSED = 1 << 26;
        const PLAYING = 1 << 27;
        const AUTOFILL = 1 << 28;
        /// The element is a form control; gates the validity and range
        /// pseudo-classes.
        const FORM_CONTROL = 1 << 29;
        /// The element supports :open and :closed.
        const OPENABLE = 1 << 30;
    }
}

/// One attribute of an element.
#[derive(Clone, Copy, Debug)]
pub struct AttributeRef<'a> {
    pub namespace: &'a Namespace,
    pub local_name: &'a LocalName,
    pub value: &'a str,
}

/// A child node, as seen by `:empty`.
#[derive(Clone, Copy, Debug)]
pub enum ChildContent<'a> {
    Element,
    Text(&'a str),
    /// Comments and processing instructions.
    Other,
}

pub trait Element: Sized + Clone + Debug {
    /// Converts self into an opaque representation.
    fn opaque(&self) -> OpaqueElement;

    #[inline]
    fn is_same(&self, other: &Self) -> bool {
        self.opaque() == other.opaque()
    }

    fn parent_element(&self) -> Option<Self>;

    /// Whether the parent node of this element is a shadow root.
    fn parent_node_is_shadow_root(&self) -> bool;

    /// The host of the shadow tree this element is in, if any.
    fn containing_shadow_host(&self) -> Option<Self>;

    /// Whether this element is in a user agent shadow tree.
    fn is_in_user_agent_shadow_tree(&self) -> bool {
        false
    }

    /// The parent element, crossing from a shadow root to its host.
    fn parent_or_shadow_host_element(&self) -> Option<Self> {
        if self.parent_node_is_shadow_root() {
            return self.containing_shadow_host();
        }
        self.parent_element()
    }

    /// The parent in the flat tree: the assigned slot for slotted elements.
    fn flat_tree_parent_element(&self) -> Option<Self> {
        self.assigned_slot()
            .or_else(|| self.parent_or_shadow_host_element())
    }

    fn tree_scope(&self) -> TreeScope {
        match self.containing_shadow_host() {
            Some(host) => TreeScope::Shadow(host.opaque()),
            None => TreeScope::Document,
        }
    }

    fn prev_sibling_element(&self) -> Option<Self>;

    fn next_sibling_element(&self) -> Option<Self>;

    fn first_element_child(&self) -> Option<Self>;

    fn last_element_child(&self) -> Option<Self>;

    /// The slot this element is assigned to, if any.
    fn assigned_slot(&self) -> Option<Self> {
        None
    }

    /// Whether this is a `<slot>` that takes part in slot assignment.
    fn is_html_slot_element(&self) -> bool {
        false
    }

    /// The child nodes, for `:empty`.
    fn child_content(&self) -> impl Iterator<Item = ChildContent<'_>>;

    /// False while the parser may still append children.
    fn is_finished_parsing_children(&self) -> bool {
        true
    }

    fn local_name(&self) -> &LocalName;

    /// Empty string for no namespace.
    fn namespace(&self) -> &Namespace;

    fn is_html_element(&self) -> bool {
        &**self.namespace() == HTML_NAMESPACE
    }

    /// Whether the owner document is an HTML document.
    fn is_in_html_document(&self) -> bool;

    /// Whether this element is the document element.
    fn is_document_element(&self) -> bool;

    fn id(&self) -> Option<&Atom>;

    fn has_class(&self, name: &Atom, case_sensitivity: CaseSensitivity) -> bool;

    /// Executes the callback for each class.
    fn each_class<F>(&self, callback: F)
    where
        F: FnMut(&Atom);

    fn attributes(&self) -> impl Iterator<Item = AttributeRef<'_>>;

    /// Brings a lazily serialized attribute up to date before it is read.
    fn synchronize_attribute(&self, _local_name: &LocalName) {}

    fn state(&self) -> ElementState;

    /// Whether this is a link (an `a` or `area` with `href`, say).
    fn is_link(&self) -> bool;

    /// The language of the element, taking inheritance into account.
    fn lang(&self) -> Option<Atom>;

    fn directionality(&self) -> Directionality;

    /// Whether `name` is one of the element's `part` names.
    fn is_part(&self, _name: &Atom) -> bool {
        false
    }

    /// The part name of an element inside a user agent shadow tree.
    fn user_agent_part(&self) -> Option<&Atom> {
        None
    }

    /// Whether the element has the given custom state (`:state()`).
    fn has_custom_state(&self, _name: &Atom) -> bool {
        false
    }

    /// Whether the element is the owner of a `@scope` rule without a
    /// prelude.
    fn is_implicit_scope_root(&self, _scope: &StyleScope) -> bool {
        false
    }

    fn selector_flags(&self) -> ElementSelectorFlags {
        ElementSelectorFlags::empty()
    }

    /// Records flags found while matching. The checker never clears them.
    fn apply_selector_flags(&self, flags: ElementSelectorFlags);
}
