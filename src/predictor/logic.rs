//! Three-valued truth for conditions over partially observed symptoms.

use std::ops::{BitAnd, BitOr, Not};

use serde::Serialize;

/// Outcome of evaluating a condition.
///
/// `Unknown` means the condition referenced a field the operator has not
/// filled in. It is never treated as `False`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    pub fn is_true(self) -> bool {
        self == Truth::True
    }

    /// Conjunction over any number of operands. `True` for an empty input.
    pub fn all<I: IntoIterator<Item = Truth>>(values: I) -> Truth {
        values.into_iter().fold(Truth::True, |acc, v| acc & v)
    }

    /// Disjunction over any number of operands. `False` for an empty input.
    pub fn any<I: IntoIterator<Item = Truth>>(values: I) -> Truth {
        values.into_iter().fold(Truth::False, |acc, v| acc | v)
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

impl BitAnd for Truth {
    type Output = Truth;

    fn bitand(self, rhs: Truth) -> Truth {
        match (self, rhs) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Unknown,
        }
    }
}

impl BitOr for Truth {
    type Output = Truth;

    fn bitor(self, rhs: Truth) -> Truth {
        match (self, rhs) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Unknown,
        }
    }
}

impl Not for Truth {
    type Output = Truth;

    fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}
