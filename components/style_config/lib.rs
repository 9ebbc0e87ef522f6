/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Runtime preferences read by the selector checker.
//!
//! Every preference is registered with a typed default; setting an unknown
//! key or a value of the wrong type is an error rather than a silent insert.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use lazy_static::lazy_static;
use log::debug;
use serde::Deserialize;

/// Whether whitespace-only text children still count as `:empty`.
pub const EMPTY_WHITESPACE_IS_EMPTY: &str = "layout.css.empty.whitespace-is-empty";
/// Whether `:has()` may build fast-reject Bloom filters.
pub const HAS_FAST_REJECT_ENABLED: &str = "layout.css.has.fast-reject.enabled";
/// The deepest selector nesting the checker will follow.
pub const MAX_NESTING_DEPTH: &str = "layout.css.selectors.max-nesting-depth";
/// Sibling count above which nth-index lookups are memoized.
pub const NTH_INDEX_CACHE_SIBLING_THRESHOLD: &str =
    "layout.css.nth-index-cache.sibling-threshold";
/// Sampling stride of a memoized nth-index entry.
pub const NTH_INDEX_CACHE_STRIDE: &str = "layout.css.nth-index-cache.stride";

lazy_static! {
    static ref PREFS: Preferences = Preferences::with_defaults();
}

/// A single preference value.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i32),
}

impl PrefValue {
    fn type_name(&self) -> &'static str {
        match *self {
            PrefValue::Bool(..) => "bool",
            PrefValue::Int(..) => "i32",
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum PrefError {
    NoSuchPref(String),
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    InvalidJson(String),
}

impl fmt::Display for PrefError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PrefError::NoSuchPref(ref key) => write!(f, "unknown preference {}", key),
            PrefError::WrongType {
                ref key,
                expected,
                found,
            } => write!(f, "preference {} expects {}, got {}", key, expected, found),
            PrefError::InvalidJson(ref message) => {
                write!(f, "could not parse preferences: {}", message)
            },
        }
    }
}

impl std::error::Error for PrefError {}

#[derive(Debug, Default)]
pub struct Preferences {
    values: RwLock<HashMap<&'static str, PrefValue>>,
}

impl Preferences {
    /// Creates a store with every known preference set to its default.
    pub fn with_defaults() -> Self {
        let prefs = Preferences::default();
        prefs.reset();
        prefs
    }

    /// Restores every preference to its default.
    pub fn reset(&self) {
        let mut values = self.values.write().expect("RwLock is poisoned");
        values.clear();
        values.insert(EMPTY_WHITESPACE_IS_EMPTY, PrefValue::Bool(false));
        values.insert(HAS_FAST_REJECT_ENABLED, PrefValue::Bool(true));
        values.insert(MAX_NESTING_DEPTH, PrefValue::Int(512));
        values.insert(NTH_INDEX_CACHE_SIBLING_THRESHOLD, PrefValue::Int(32));
        values.insert(NTH_INDEX_CACHE_STRIDE, PrefValue::Int(3));
    }

    pub fn get(&self, key: &str) -> Option<PrefValue> {
        let values = self.values.read().expect("RwLock is poisoned");
        values.get(key).copied()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(PrefValue::Bool(value)) => value,
            _ => false,
        }
    }

    pub fn get_i32(&self, key: &str) -> i32 {
        match self.get(key) {
            Some(PrefValue::Int(value)) => value,
            _ => 0,
        }
    }

    pub fn set(&self, key: &str, value: PrefValue) -> Result<(), PrefError> {
        let mut values = self.values.write().expect("RwLock is poisoned");
        let pref = values
            .get_mut(key)
            .ok_or_else(|| PrefError::NoSuchPref(key.to_owned()))?;
        if std::mem::discriminant(pref) != std::mem::discriminant(&value) {
            return Err(PrefError::WrongType {
                key: key.to_owned(),
                expected: pref.type_name(),
                found: value.type_name(),
            });
        }
        debug!("Setting preference {} to {:?}", key, value);
        *pref = value;
        Ok(())
    }

    pub fn set_bool(&self, key: &str, value: bool) -> Result<(), PrefError> {
        self.set(key, PrefValue::Bool(value))
    }

    pub fn set_i32(&self, key: &str, value: i32) -> Result<(), PrefError> {
        self.set(key, PrefValue::Int(value))
    }

    /// Applies a flat JSON object of preference overrides.
    ///
    /// Nothing is applied unless every entry is valid.
    pub fn load_from_json(&self, json: &str) -> Result<(), PrefError> {
        let overrides: HashMap<String, PrefValue> =
            serde_json::from_str(json).map_err(|e| PrefError::InvalidJson(e.to_string()))?;
        for (key, value) in &overrides {
            match self.get(key) {
                None => return Err(PrefError::NoSuchPref(key.clone())),
                Some(current) if current.type_name() != value.type_name() => {
                    return Err(PrefError::WrongType {
                        key: key.clone(),
                        expected: current.type_name(),
                        found: value.type_name(),
                    });
                },
                Some(_) => {},
            }
        }
        for (key, value) in overrides {
            self.set(&key, value)?;
        }
        Ok(())
    }
}

pub fn get_bool(key: &str) -> bool {
    PREFS.get_bool(key)
}

pub fn get_i32(key: &str) -> i32 {
    PREFS.get_i32(key)
}

pub fn set_bool(key: &str, value: bool) -> Result<(), PrefError> {
    PREFS.set_bool(key, value)
}

pub fn set_i32(key: &str, value: i32) -> Result<(), PrefError> {
    PREFS.set_i32(key, value)
}

pub fn load_from_json(json: &str) -> Result<(), PrefError> {
    PREFS.load_from_json(json)
}

pub fn reset() {
    PREFS.reset()
}
