use async_trait::async_trait;
use battle_action::Action;
use battle_driver::Agent;
use battle_prng::{
    PseudoRandomNumberGenerator,
    RealPseudoRandomNumberGenerator,
};

/// Ranks every legal choice in a uniformly random order.
pub struct RandomAgent {
    rng: Box<dyn PseudoRandomNumberGenerator>,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: Box::new(RealPseudoRandomNumberGenerator::new(seed)),
        }
    }
}

#[async_trait]
impl<S> Agent<S> for RandomAgent
where
    S: Send,
{
    async fn agent(&mut self, _state: &S, choices: &mut Vec<Action>) {
        shuffle(self.rng.as_mut(), choices);
    }
}

/// Fisher-Yates, back to front, using `rng.next_bounded` for each swap partner.
pub(crate) fn shuffle(rng: &mut dyn PseudoRandomNumberGenerator, items: &mut [Action]) {
    for i in (1..items.len()).rev() {
        let j = rng.next_bounded(i + 1);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod random_agent_test {
    use battle_action::Action;
    use battle_driver::Agent;

    use super::RandomAgent;

    #[tokio::test]
    async fn keeps_the_same_multiset_of_choices() {
        let mut agent = RandomAgent::new(Some(7));
        let mut choices = vec![
            Action::new("move 1"),
            Action::new("move 2"),
            Action::new("switch 1"),
        ];
        let original = choices.clone();
        agent.agent(&(), &mut choices).await;

        let mut sorted_original = original.clone();
        let mut sorted_after = choices.clone();
        sorted_original.sort_by_key(|a| a.to_string());
        sorted_after.sort_by_key(|a| a.to_string());
        assert_eq!(sorted_original, sorted_after);
    }

    #[tokio::test]
    async fn same_seed_is_deterministic() {
        let choices = vec![
            Action::new("move 1"),
            Action::new("move 2"),
            Action::new("move 3"),
            Action::new("move 4"),
        ];

        let mut a = RandomAgent::new(Some(42));
        let mut b = RandomAgent::new(Some(42));
        let mut ca = choices.clone();
        let mut cb = choices.clone();
        a.agent(&(), &mut ca).await;
        b.agent(&(), &mut cb).await;

        assert_eq!(ca, cb);
    }
}
