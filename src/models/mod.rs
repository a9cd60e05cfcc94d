//! Domain models: database entities, request/response DTOs and the
//! common envelope types used by the API layer.

mod click;
mod dto;
mod link;

pub use click::*;
pub use dto::*;
pub use link::*;

use serde::{Deserialize, Serialize};

/// Opaque unique identifier for stored entities.
///
/// Newtype over the nanoid string so ids cannot be confused with short
/// codes or owner ids at the type level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!(21))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_fixed_length() {
        let a = Id::new();
        let b = Id::new();

        assert_ne!(a.as_str(), b.as_str());
        assert_eq!(a.as_str().len(), 21);
    }
}
