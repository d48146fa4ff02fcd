use async_trait::async_trait;
use battle_action::Action;
use battle_driver::Agent;

use crate::choice::Choice;

/// Approximates "always attack" without any damage model: true damage calculation depends on
/// domain game-state knowledge this crate never sees (species, stats, type chart), so this
/// agent instead prefers any move over switching, and otherwise keeps the order the
/// `BattleState` collaborator handed it.
///
/// Among moves, higher move slots sort first; this is an arbitrary but deterministic
/// tie-break, not a claim about which move actually deals more damage.
pub struct MaxDamageAgent;

impl MaxDamageAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MaxDamageAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Agent<S> for MaxDamageAgent
where
    S: Send,
{
    async fn agent(&mut self, _state: &S, choices: &mut Vec<Action>) {
        choices.sort_by_key(|action| match Choice::parse(action) {
            Choice::Move(slot) => (0, std::cmp::Reverse(slot)),
            Choice::Switch(slot) => (1, std::cmp::Reverse(slot)),
            Choice::Team(slot) => (2, std::cmp::Reverse(slot)),
            Choice::Pass => (3, std::cmp::Reverse(0)),
            Choice::Forfeit => (5, std::cmp::Reverse(0)),
            Choice::Other => (4, std::cmp::Reverse(0)),
        });
    }
}
