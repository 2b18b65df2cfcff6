use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for sensitive data (card numbers, CVVs) that masks its value in Debug and Display output.
///
/// Serialization still writes the real value, so the wrapper is only a guard against
/// accidental leakage through `tracing::info!("{:?}", request)` and friends.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    /// Last four non-whitespace characters, e.g. for "card ending in 4242" receipts.
    pub fn last4(&self) -> String {
        let compact: Vec<char> = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        let start = compact.len().saturating_sub(4);
        compact[start..].iter().collect()
    }
}
