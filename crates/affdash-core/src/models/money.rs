use std::fmt;

use serde::{Deserialize, Serialize};

/// An amount in minor currency units (pence).
///
/// Amounts travel and are stored as integers; they only become `£x.yy` text
/// at render time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pence(pub i64);

impl Pence {
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl From<i64> for Pence {
    fn from(value: i64) -> Self {
        Pence(value)
    }
}

impl fmt::Display for Pence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}£{}.{:02}", sign, abs / 100, abs % 100)
    }
}
