use battle_action::Action;

/// Interprets the handful of concrete choice shapes the built-in agents know how to rank.
///
/// The core driver treats [`Action`] as opaque; this parsing only exists so the built-in
/// agents in this crate can make a reasonable ranking decision without any domain-specific
/// game-state model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Move(u32),
    Switch(u32),
    Team(u32),
    Pass,
    Forfeit,
    /// Anything that does not match one of the recognized shapes.
    Other,
}

impl Choice {
    pub fn parse(action: &Action) -> Self {
        let s = action.as_str();
        if s == "pass" {
            return Self::Pass;
        }
        if s == "forfeit" {
            return Self::Forfeit;
        }
        if let Some(slot) = Self::parse_slot(s, "move ") {
            return Self::Move(slot);
        }
        if let Some(slot) = Self::parse_slot(s, "switch ") {
            return Self::Switch(slot);
        }
        if let Some(slot) = Self::parse_slot(s, "team ") {
            return Self::Team(slot);
        }
        Self::Other
    }

    fn parse_slot(s: &str, prefix: &str) -> Option<u32> {
        s.strip_prefix(prefix)?.trim().parse().ok()
    }

    pub fn is_move(self) -> bool {
        matches!(self, Self::Move(_))
    }
}

#[cfg(test)]
mod choice_test {
    use battle_action::Action;

    use super::Choice;

    #[test]
    fn parses_recognized_shapes() {
        assert_eq!(Choice::parse(&Action::new("move 2")), Choice::Move(2));
        assert_eq!(Choice::parse(&Action::new("switch 3")), Choice::Switch(3));
        assert_eq!(Choice::parse(&Action::new("team 123")), Choice::Team(123));
        assert_eq!(Choice::parse(&Action::new("pass")), Choice::Pass);
        assert_eq!(Choice::parse(&Action::new("forfeit")), Choice::Forfeit);
    }

    #[test]
    fn falls_back_to_other_for_unrecognized_encodings() {
        assert_eq!(Choice::parse(&Action::new("mega move 2")), Choice::Other);
        assert_eq!(Choice::parse(&Action::new("move abc")), Choice::Other);
    }
}
