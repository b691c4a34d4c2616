//! Parsed shape of one directive (§3 "Directive", §4.B grammar).

use indexmap::IndexMap;

/// One entry of a `var_list`: a name, optionally paired with an alias via
/// the `/` separator (argument name / formal-parameter name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePair {
    pub name: String,
    pub alias: Option<String>,
}

impl NamePair {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }
}

/// `name "=" expr ":" expr [ ":" expr ]` — an induction variable, its bounds,
/// and an optional step (default `"1"`, per §4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub induction_var: String,
    pub lower: String,
    pub upper: String,
    pub step: String,
}

/// `var_list ":" var_list` — a correspondence between call-site arguments
/// and callee subscript variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub mapped: Vec<NamePair>,
    pub mapping: Vec<NamePair>,
}

impl Mapping {
    pub fn mapped_dimensions(&self) -> usize {
        self.mapping.len()
    }
}

/// The value carried by one clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseValue {
    /// A bare clause name with no argument list (e.g. `parallel`).
    Flag,
    Range(Range),
    Mapping(Mapping),
    NameList(Vec<NamePair>),
    /// A single scalar argument (string, integer, or bare identifier).
    Scalar(String),
}

/// A fully parsed directive: a kind keyword plus its clauses, keyed by
/// clause name (clause order is irrelevant per §4.B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: String,
    pub clauses: IndexMap<String, ClauseValue>,
}

impl Directive {
    pub fn range(&self) -> Option<&Range> {
        match self.clauses.get("range") {
            Some(ClauseValue::Range(r)) => Some(r),
            _ => None,
        }
    }

    pub fn mapping(&self) -> Option<&Mapping> {
        match self.clauses.get("map") {
            Some(ClauseValue::Mapping(m)) => Some(m),
            _ => None,
        }
    }

    pub fn has_flag(&self, name: &str) -> bool {
        matches!(self.clauses.get(name), Some(ClauseValue::Flag))
    }

    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.clauses.get(name) {
            Some(ClauseValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn name_list(&self, name: &str) -> Option<&[NamePair]> {
        match self.clauses.get(name) {
            Some(ClauseValue::NameList(list)) => Some(list.as_slice()),
            _ => None,
        }
    }

    /// The group label shared by dependent transformations (§3, §4.D.1),
    /// carried by the `group` clause when present.
    pub fn group_label(&self) -> Option<&str> {
        self.scalar("group")
    }
}
