/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Counting bloom filters over element identifiers, used to reject `:has()`
//! arguments without walking the tree.

#[cfg(test)]
use std::hash::Hash;
use std::hash::Hasher;

use rustc_hash::FxHasher;
use smallvec::SmallVec;

use crate::parser::{Component, Selector};
use crate::tree::Element;

const KEY_SIZE: usize = 12;
const ARRAY_SIZE: usize = 1 << KEY_SIZE;
const KEY_MASK: u32 = (1 << KEY_SIZE) - 1;

// Identifiers of different kinds must not collide with each other, so each
// kind is salted before it goes into the filter.
const TAG_NAME_SALT: u32 = 13;
const ID_SALT: u32 = 17;
const CLASS_SALT: u32 = 19;
const ATTRIBUTE_SALT: u32 = 11;

/// A counting Bloom filter with 8-bit counters and two hash functions, over
/// 2**12 slots.
///
/// With two hash functions and M slots holding N keys the false positive
/// rate is about (1 - exp(-2N/M))^2, which stays within a few percent for the
/// few hundred identifiers a typical subtree contributes.
pub struct BloomFilter {
    counters: [u8; ARRAY_SIZE],
}

impl Clone for BloomFilter {
    #[inline]
    fn clone(&self) -> BloomFilter {
        BloomFilter {
            counters: self.counters,
        }
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl BloomFilter {
    /// Creates a new bloom filter.
    #[inline]
    pub fn new() -> BloomFilter {
        BloomFilter {
            counters: [0; ARRAY_SIZE],
        }
    }

    #[inline]
    pub fn insert_hash(&mut self, hash: u32) {
        for slot in [hash1(hash), hash2(hash)] {
            let counter = &mut self.counters[slot as usize];
            if !full(counter) {
                *counter += 1;
            }
        }
    }

    #[inline]
    pub fn might_contain_hash(&self, hash: u32) -> bool {
        self.counters[hash1(hash) as usize] != 0 && self.counters[hash2(hash) as usize] != 0
    }

    /// Adds the identifier hashes of an element: its tag name, id, classes
    /// and attribute names.
    pub fn insert_element<E: Element>(&mut self, element: &E) {
        each_element_hash(element, |hash| self.insert_hash(hash));
    }
}

#[cfg(test)]
impl BloomFilter {
    fn clear(&mut self) {
        self.counters = [0; ARRAY_SIZE]
    }

    fn insert<T: Hash>(&mut self, elem: &T) {
        self.insert_hash(hash(elem))
    }

    /// Saturated counters stay put, since their true count is unknown.
    fn remove_hash(&mut self, hash: u32) {
        for slot in [hash1(hash), hash2(hash)] {
            let counter = &mut self.counters[slot as usize];
            if !full(counter) && *counter > 0 {
                *counter -= 1;
            }
        }
    }

    fn remove<T: Hash>(&mut self, elem: &T) {
        self.remove_hash(hash(elem))
    }

    fn might_contain<T: Hash>(&self, elem: &T) -> bool {
        self.might_contain_hash(hash(elem))
    }
}

#[inline]
fn full(slot: &u8) -> bool {
    *slot == 0xff
}

#[cfg(test)]
fn hash<T: Hash>(elem: &T) -> u32 {
    let mut hasher = FxHasher::default();
    elem.hash(&mut hasher);
    fold(hasher.finish())
}

#[inline]
fn fold(hash: u64) -> u32 {
    (hash >> 32) as u32 ^ (hash as u32)
}

/// Fx hashes of nearby inputs share most of their low bits, and both slots
/// are cut from the low 24 bits, so spread them first.
#[inline]
fn mix(hash: u32) -> u32 {
    hash.wrapping_mul(0x9e37_79b9)
}

#[inline]
fn hash1(hash: u32) -> u32 {
    mix(hash) & KEY_MASK
}

#[inline]
fn hash2(hash: u32) -> u32 {
    (mix(hash) >> KEY_SIZE) & KEY_MASK
}

/// Identifiers are hashed ASCII-lowercased. Folding case can only add false
/// positives, which keeps the filter correct in quirks mode and for
/// case-insensitive attribute names.
fn identifier_hash(name: &str, salt: u32) -> u32 {
    let mut hasher = FxHasher::default();
    for byte in name.bytes() {
        hasher.write_u8(byte.to_ascii_lowercase());
    }
    fold(hasher.finish()).wrapping_mul(salt)
}

/// Calls `f` with the hash of every identifier of `element`.
pub fn each_element_hash<E, F>(element: &E, mut f: F)
where
    E: Element,
    F: FnMut(u32),
{
    f(identifier_hash(element.local_name(), TAG_NAME_SALT));
    if let Some(id) = element.id() {
        f(identifier_hash(id, ID_SALT));
    }
    element.each_class(|class| f(identifier_hash(class, CLASS_SALT)));
    for attr in element.attributes() {
        f(identifier_hash(attr.local_name, ATTRIBUTE_SALT));
    }
}

/// The identifier hashes an element must contribute for `selector` to match
/// somewhere below or beside a `:has()` anchor.
///
/// Only simple selectors at the top level of the compounds right of the
/// anchor count; anything nested in a logical combination may be satisfied
/// otherwise.
pub fn relative_selector_hashes(selector: &Selector) -> SmallVec<[u32; 8]> {
    let mut hashes = SmallVec::new();
    for component in selector.components() {
        let hash = match *component {
            Component::Combinator(combinator) if combinator.is_relative() => break,
            Component::Tag(ref tag) => match tag.local_name {
                Some(ref name) => identifier_hash(name, TAG_NAME_SALT),
                None => continue,
            },
            Component::ID(ref id) => identifier_hash(id, ID_SALT),
            Component::Class(ref class) => identifier_hash(class, CLASS_SALT),
            Component::Attribute(ref attr) => identifier_hash(&attr.local_name, ATTRIBUTE_SALT),
            _ => continue,
        };
        hashes.push(hash);
    }
    hashes
}
