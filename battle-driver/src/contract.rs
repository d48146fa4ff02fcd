use async_trait::async_trait;
use battle_action::{
    Action,
    Event,
    ExecutorResult,
    RequestBody,
};

/// The external, domain-specific view of a battle's state.
///
/// Implementors own everything about the game itself; this crate never inspects the contents
/// of a snapshot or a choice beyond treating actions as opaque strings.
pub trait BattleState: Send {
    /// An opaque view of the state handed to an [`Agent`]. Dropped once the agent call returns.
    type Snapshot: Send;

    /// Folds a non-request event into the tracked state.
    fn apply_event(&mut self, event: &Event);

    /// The legal actions for `request`, in no particular order.
    fn choices_for_request(&self, request: &RequestBody) -> Vec<Action>;

    /// A snapshot of the current state, suitable for handing to an [`Agent`].
    fn snapshot(&self) -> Self::Snapshot;
}

/// Ranks a list of legal choices, most preferred first, given a view of the battle state.
///
/// Implementations are expected to reorder `choices` in place rather than replace it: the
/// decision loop submits choices to the executor in the resulting order and stops at the first
/// one that is accepted.
#[async_trait]
pub trait Agent<Snapshot>: Send
where
    Snapshot: Send,
{
    async fn agent(&mut self, state: &Snapshot, choices: &mut Vec<Action>);
}

/// Submits a single ranked action and reports how the simulator responded.
#[async_trait]
pub trait Executor: Send {
    async fn executor(&mut self, action: &Action, debug: Option<&str>) -> ExecutorResult;
}

/// Transmits a choice to the simulator. Returns `false` if the transport can no longer carry
/// messages (for example, the simulator process has exited).
#[async_trait]
pub trait ChoiceSender: Send {
    async fn send_choice(&mut self, action: &Action, debug: Option<&str>) -> bool;
}

#[async_trait]
impl<S> Agent<S> for Box<dyn Agent<S> + Send>
where
    S: Send + Sync,
{
    async fn agent(&mut self, state: &S, choices: &mut Vec<Action>) {
        (**self).agent(state, choices).await;
    }
}

#[async_trait]
impl ChoiceSender for Box<dyn ChoiceSender + Send> {
    async fn send_choice(&mut self, action: &Action, debug: Option<&str>) -> bool {
        (**self).send_choice(action, debug).await
    }
}

/// The decision loop a [`crate::BattleDriver`] drives.
///
/// Combines game-state bookkeeping (`handle_event`) with the per-request decision procedure
/// (`decide`). [`AgentContext`] is the generic implementation built from a [`BattleState`] and
/// an [`Agent`]; implement this trait directly only when that composition doesn't fit.
#[async_trait]
pub trait BattleParser: Send {
    /// Updates internal state from a game event that is not a request.
    async fn handle_event(&mut self, event: &Event) -> anyhow::Result<()>;

    /// Runs the decision procedure for `request`, submitting ranked choices through `executor`
    /// until one is accepted or the ranking is exhausted.
    async fn decide(
        &mut self,
        request: &RequestBody,
        executor: &mut dyn Executor,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl BattleParser for Box<dyn BattleParser + Send> {
    async fn handle_event(&mut self, event: &Event) -> anyhow::Result<()> {
        (**self).handle_event(event).await
    }

    async fn decide(
        &mut self,
        request: &RequestBody,
        executor: &mut dyn Executor,
    ) -> anyhow::Result<()> {
        (**self).decide(request, executor).await
    }
}

/// The default [`BattleParser`]: pairs an opaque [`BattleState`] with the [`Agent`] that ranks
/// its choices, and runs the generic submit-until-accepted loop over the executor.
pub struct AgentContext<S, A>
where
    S: BattleState,
    A: Agent<S::Snapshot>,
{
    pub state: S,
    pub agent: A,
}

impl<S, A> AgentContext<S, A>
where
    S: BattleState,
    A: Agent<S::Snapshot>,
{
    pub fn new(state: S, agent: A) -> Self {
        Self { state, agent }
    }
}

#[async_trait]
impl<S, A> BattleParser for AgentContext<S, A>
where
    S: BattleState + Send,
    S::Snapshot: Send,
    A: Agent<S::Snapshot> + Send,
{
    async fn handle_event(&mut self, event: &Event) -> anyhow::Result<()> {
        self.state.apply_event(event);
        Ok(())
    }

    async fn decide(
        &mut self,
        request: &RequestBody,
        executor: &mut dyn Executor,
    ) -> anyhow::Result<()> {
        let mut choices = self.state.choices_for_request(request);
        if choices.is_empty() {
            return Ok(());
        }

        let snapshot = self.state.snapshot();
        self.agent.agent(&snapshot, &mut choices).await;
        drop(snapshot);

        for choice in &choices {
            if let ExecutorResult::Accepted = executor.executor(choice, None).await {
                return Ok(());
            }
        }

        // Every ranked choice was rejected. Submitting a forfeit is the last resort so the
        // battle can still conclude instead of leaving the driver waiting forever.
        executor.executor(&Action::new("forfeit"), None).await;
        Ok(())
    }
}
