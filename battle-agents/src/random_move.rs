use async_trait::async_trait;
use battle_action::Action;
use battle_driver::Agent;
use battle_prng::{
    PseudoRandomNumberGenerator,
    RealPseudoRandomNumberGenerator,
};

use crate::{
    choice::Choice,
    random::shuffle,
};

/// Ranks move choices (in random order) ahead of every other kind of choice (also shuffled).
///
/// Falls back to picking uniformly among whatever is left when no move is legal (for example,
/// when the side must switch out a fainted creature).
pub struct RandomMoveAgent {
    rng: Box<dyn PseudoRandomNumberGenerator>,
}

impl RandomMoveAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Box::new(RealPseudoRandomNumberGenerator::new(seed)),
        }
    }
}

#[async_trait]
impl<S> Agent<S> for RandomMoveAgent
where
    S: Send,
{
    async fn agent(&mut self, _state: &S, choices: &mut Vec<Action>) {
        let (mut moves, mut rest): (Vec<Action>, Vec<Action>) = choices
            .drain(..)
            .partition(|action| Choice::parse(action).is_move());

        shuffle(self.rng.as_mut(), &mut moves);
        shuffle(self.rng.as_mut(), &mut rest);

        choices.extend(moves);
        choices.extend(rest);
    }
}

#[cfg(test)]
mod random_move_agent_test {
    use battle_action::Action;
    use battle_driver::Agent;

    use super::RandomMoveAgent;

    #[tokio::test]
    async fn moves_always_precede_switches() {
        let mut agent = RandomMoveAgent::new(Some(3));
        let mut choices = vec![
            Action::new("switch 1"),
            Action::new("move 1"),
            Action::new("switch 2"),
            Action::new("move 2"),
        ];
        agent.agent(&(), &mut choices).await;

        let first_switch = choices
            .iter()
            .position(|a| a.as_str().starts_with("switch"))
            .unwrap();
        let last_move = choices
            .iter()
            .rposition(|a| a.as_str().starts_with("move"))
            .unwrap();
        assert!(last_move < first_switch);
    }

    #[tokio::test]
    async fn falls_back_to_non_move_choices_when_no_move_is_legal() {
        let mut agent = RandomMoveAgent::new(Some(3));
        let mut choices = vec![Action::new("switch 1"), Action::new("switch 2")];
        let original_len = choices.len();
        agent.agent(&(), &mut choices).await;
        assert_eq!(choices.len(), original_len);
    }
}
