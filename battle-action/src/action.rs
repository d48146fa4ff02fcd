use std::{
    convert::Infallible,
    fmt::Display,
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};

/// An opaque, submittable decision symbol (e.g. `"move 1"`, `"switch 2"`, `"team 123"`).
///
/// The driver never inspects the contents of an action beyond equality and string encoding;
/// any richer structure (what a move targets, whether it mega evolves) is the business of the
/// `BattleState` collaborator and the agents that produce actions.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Creates an action from its wire encoding.
    pub fn new<S>(encoded: S) -> Self
    where
        S: Into<String>,
    {
        Self(encoded.into())
    }

    /// The wire encoding of this action.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Action {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod action_test {
    use super::Action;

    #[test]
    fn round_trips_through_string_encoding() {
        let action = Action::new("move 1");
        assert_eq!(action.as_str(), "move 1");
        assert_eq!(action.to_string(), "move 1");
    }

    #[test]
    fn equality_is_by_encoded_value() {
        assert_eq!(Action::new("switch 2"), Action::from("switch 2"));
        assert_ne!(Action::new("switch 2"), Action::new("switch 3"));
    }
}
