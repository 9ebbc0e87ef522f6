/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Flags the checker records on elements while matching, so that DOM
//! mutations know which elements to restyle later.

use bitflags::bitflags;

bitflags! {
    /// Set on an element (or on its parent) as a side effect of matching.
    ///
    /// The checker only ever adds flags; clearing them is up to the host.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ElementSelectorFlags: u32 {
        /// The first child of this element may have changed what it matches,
        /// because of :first-child or :only-child.
        const CHILDREN_AFFECTED_BY_FIRST_CHILD_RULES = 1 << 0;
        /// Same as above, for :last-child or :only-child.
        const CHILDREN_AFFECTED_BY_LAST_CHILD_RULES = 1 << 1;
        /// Children match `+` combinators.
        const CHILDREN_AFFECTED_BY_DIRECT_ADJACENT_RULES = 1 << 2;
        /// Children match `~` combinators.
        const CHILDREN_AFFECTED_BY_INDIRECT_ADJACENT_RULES = 1 << 3;
        /// Inserting a child may change what later children match, because of
        /// :nth-child, :first-of-type or :nth-of-type.
        const CHILDREN_AFFECTED_BY_FORWARD_POSITIONAL_RULES = 1 << 4;
        /// Inserting a child may change what earlier children match, because
        /// of :nth-last-child, :last-of-type or :nth-last-of-type.
        const CHILDREN_AFFECTED_BY_BACKWARD_POSITIONAL_RULES = 1 << 5;

        /// This element matched against :first-child.
        const AFFECTED_BY_FIRST_CHILD_RULES = 1 << 6;
        /// This element matched against :last-child.
        const AFFECTED_BY_LAST_CHILD_RULES = 1 << 7;
        /// This element's style depends on :empty.
        const STYLE_AFFECTED_BY_EMPTY = 1 << 8;

        /// A user action pseudo-class appeared outside the subject compound,
        /// so descendants or siblings of this element depend on its state.
        const CHILDREN_OR_SIBLINGS_AFFECTED_BY_HOVER = 1 << 9;
        const CHILDREN_OR_SIBLINGS_AFFECTED_BY_ACTIVE = 1 << 10;
        const CHILDREN_OR_SIBLINGS_AFFECTED_BY_FOCUS = 1 << 11;
        const CHILDREN_OR_SIBLINGS_AFFECTED_BY_FOCUS_VISIBLE = 1 << 12;
        const CHILDREN_OR_SIBLINGS_AFFECTED_BY_FOCUS_WITHIN = 1 << 13;
        const CHILDREN_OR_SIBLINGS_AFFECTED_BY_DRAG = 1 << 14;

        /// A user action pseudo-class was tested inside a :has() argument.
        const ANCESTORS_OR_SIBLINGS_AFFECTED_BY_HOVER_IN_HAS = 1 << 15;
        const ANCESTORS_OR_SIBLINGS_AFFECTED_BY_ACTIVE_IN_HAS = 1 << 16;
        const ANCESTORS_OR_SIBLINGS_AFFECTED_BY_FOCUS_IN_HAS = 1 << 17;
        const ANCESTORS_OR_SIBLINGS_AFFECTED_BY_FOCUS_VISIBLE_IN_HAS = 1 << 18;

        /// A :has() in the subject compound was tested on this element.
        const AFFECTED_BY_SUBJECT_HAS = 1 << 19;
        /// A :has() outside the subject compound was tested on this element.
        const AFFECTED_BY_NON_SUBJECT_HAS = 1 << 20;
        /// A :has() argument on this element contains pseudo-classes.
        const AFFECTED_BY_PSEUDO_IN_HAS = 1 << 21;
        /// A :has() argument on this element nests :is(), :not() or :has()
        /// with complex selectors.
        const AFFECTED_BY_LOGICAL_COMBINATIONS_IN_HAS = 1 << 22;
        /// More than one :has() was tested on this element.
        const AFFECTED_BY_MULTIPLE_HAS = 1 << 23;

        /// An element in a :has() descendant traversal; a change to it may
        /// change what an ancestor (or an ancestor's sibling) matches.
        const ANCESTORS_OR_ANCESTOR_SIBLINGS_AFFECTED_BY_HAS = 1 << 24;
        /// An element in a :has() sibling traversal.
        const SIBLINGS_AFFECTED_BY_HAS_FOR_SIBLING_RELATIONSHIP = 1 << 25;
        /// A descendant of a sibling in a :has() traversal.
        const SIBLINGS_AFFECTED_BY_HAS_FOR_SIBLING_DESCENDANT_RELATIONSHIP = 1 << 26;
    }
}

impl ElementSelectorFlags {
    /// The flags that describe what the *children* of an element are
    /// affected by, and so belong on a parent.
    pub fn for_parent(self) -> Self {
        self & (Self::CHILDREN_AFFECTED_BY_FIRST_CHILD_RULES |
            Self::CHILDREN_AFFECTED_BY_LAST_CHILD_RULES |
            Self::CHILDREN_AFFECTED_BY_DIRECT_ADJACENT_RULES |
            Self::CHILDREN_AFFECTED_BY_INDIRECT_ADJACENT_RULES |
            Self::CHILDREN_AFFECTED_BY_FORWARD_POSITIONAL_RULES |
            Self::CHILDREN_AFFECTED_BY_BACKWARD_POSITIONAL_RULES)
    }

    /// The flags an element keeps for itself.
    pub fn for_self(self) -> Self {
        self - self.for_parent()
    }
}
