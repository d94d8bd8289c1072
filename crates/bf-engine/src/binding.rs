//! Variable bindings.
//!
//! The caller owns the bindings and updates them as inputs change; the
//! engine only reads them through [`Lookup`]. During rendering every read
//! goes through a [`BindingContext`], which remembers what was read so the
//! renderer can tell whether a slot's output is still current.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::formula::format_number;

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)$").expect("invalid decimal regex"));

/// A bound input value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum BindingValue {
    /// Free text, selector state or a date string.
    Text(String),
    /// Numeric input.
    Number(f64),
    /// Checkbox-style input.
    Bool(bool),
}

impl BindingValue {
    /// Numeric reading used by formulas.
    ///
    /// Numbers are used as-is and text holding a plain decimal number is
    /// parsed. Everything else reads as 0.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let s = s.trim();
                if DECIMAL_RE.is_match(s) {
                    s.parse().unwrap_or(0.0)
                } else {
                    0.0
                }
            }
            Self::Bool(_) => 0.0,
        }
    }
}

impl fmt::Display for BindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for BindingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for BindingValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for BindingValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for BindingValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// The usual owned binding map.
pub type Bindings = HashMap<String, BindingValue>;

/// Read access to variable bindings. Absent keys mean "unanswered".
pub trait Lookup {
    /// Value bound to `key`, if any.
    fn lookup(&self, key: &str) -> Option<&BindingValue>;
}

impl<S: std::hash::BuildHasher> Lookup for HashMap<String, BindingValue, S> {
    fn lookup(&self, key: &str) -> Option<&BindingValue> {
        self.get(key)
    }
}

impl Lookup for BTreeMap<String, BindingValue> {
    fn lookup(&self, key: &str) -> Option<&BindingValue> {
        self.get(key)
    }
}

/// One recorded read: the key and the value it returned.
pub type Read = (String, Option<BindingValue>);

/// Read channel that records every lookup.
///
/// Slots of the render plan read bindings only through a context. The
/// recorded reads are the slot's dependencies: as long as every key still
/// returns an equal value, the slot's output cannot have changed.
pub struct BindingContext<'a> {
    bindings: &'a dyn Lookup,
    reads: RefCell<Vec<Read>>,
}

impl<'a> BindingContext<'a> {
    /// Wrap bindings for one slot evaluation.
    pub fn new(bindings: &'a dyn Lookup) -> Self {
        Self {
            bindings,
            reads: RefCell::new(Vec::new()),
        }
    }

    /// Look up a key and record the read.
    pub fn get(&self, key: &str) -> Option<&'a BindingValue> {
        let value = self.bindings.lookup(key);
        let mut reads = self.reads.borrow_mut();
        if !reads.iter().any(|(k, _)| k == key) {
            reads.push((key.to_owned(), value.cloned()));
        }
        value
    }

    /// Reads made so far, in first-read order.
    pub fn into_reads(self) -> Vec<Read> {
        self.reads.into_inner()
    }
}

impl Lookup for BindingContext<'_> {
    fn lookup(&self, key: &str) -> Option<&BindingValue> {
        self.get(key)
    }
}

/// Whether every recorded read still returns the same value.
pub(crate) fn reads_unchanged(reads: &[Read], bindings: &dyn Lookup) -> bool {
    reads
        .iter()
        .all(|(key, value)| bindings.lookup(key) == value.as_ref())
}
