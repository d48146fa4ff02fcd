use async_trait::async_trait;
use battle_action::{
    Action,
    Event,
    ExecutorResult,
    RequestBody,
};

use crate::contract::{
    BattleParser,
    Executor,
};

/// Reward for the wrapped client winning the battle.
pub const WIN_REWARD: f64 = 1.0;
/// Reward for the wrapped client losing the battle.
pub const LOSE_REWARD: f64 = -1.0;
/// Reward for the battle ending in a tie.
pub const TIE_REWARD: f64 = 0.0;

/// A single training tuple surfaced once a wrapped battle concludes.
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    /// The last action accepted by the simulator, if any was ever accepted.
    pub action: Option<Action>,
    /// The reward accumulated between the last two decisions.
    pub reward: f64,
    /// Whether the battle reached a terminal event (`Win` or `Tie`) before the wrapper was
    /// asked to finish.
    pub terminated: bool,
}

/// Receives the reward accumulated since an agent's previous decision, together with the
/// action that decision resulted in.
#[async_trait]
pub trait RewardObserver: Send {
    async fn observe(&mut self, action: Option<&Action>, reward: f64, terminated: bool);
}

struct RecordingExecutor<'a> {
    inner: &'a mut dyn Executor,
    last_action: &'a mut Option<Action>,
}

#[async_trait]
impl<'a> Executor for RecordingExecutor<'a> {
    async fn executor(&mut self, action: &Action, debug: Option<&str>) -> ExecutorResult {
        let result = self.inner.executor(action, debug).await;
        if let ExecutorResult::Accepted = result {
            *self.last_action = Some(action.clone());
        }
        result
    }
}

/// Decorates a [`BattleParser`] to turn the raw event stream into reinforcement-learning
/// training tuples.
///
/// Reward accrues between decisions: a win or tie contributes `WIN_REWARD`/`LOSE_REWARD`/
/// `TIE_REWARD` to the running total the moment it is observed, and the total is handed to the
/// `observer` (paired with the previous decision's action) right before the next decision is
/// made, then reset.
pub struct ExperienceWrapper<P, O> {
    inner: P,
    observer: O,
    client_username: String,
    last_action: Option<Action>,
    reward: f64,
    terminated: bool,
}

impl<P, O> ExperienceWrapper<P, O> {
    pub fn new(inner: P, observer: O, client_username: impl Into<String>) -> Self {
        Self {
            inner,
            observer,
            client_username: client_username.into(),
            last_action: None,
            reward: 0.0,
            terminated: false,
        }
    }

    /// Consumes the wrapper, returning the final training tuple if the battle reached a
    /// terminal event. Returns `None` if the battle was truncated (for example, by a turn
    /// cap) before anyone won or tied.
    pub fn finish(self) -> Option<Experience> {
        self.terminated.then_some(Experience {
            action: self.last_action,
            reward: self.reward,
            terminated: self.terminated,
        })
    }
}

#[async_trait]
impl<P, O> BattleParser for ExperienceWrapper<P, O>
where
    P: BattleParser + Send,
    O: RewardObserver + Send,
{
    async fn handle_event(&mut self, event: &Event) -> anyhow::Result<()> {
        self.inner.handle_event(event).await?;
        let terminal_reward = match event {
            Event::Win(name) if *name == self.client_username => Some(WIN_REWARD),
            Event::Win(_) => Some(LOSE_REWARD),
            Event::Tie => Some(TIE_REWARD),
            _ => None,
        };
        // Pushed here, not just left for the next `decide`, because a battle can end with no
        // further decision ever requested from this side.
        if let Some(reward) = terminal_reward {
            self.reward += reward;
            self.terminated = true;
            self.observer
                .observe(self.last_action.as_ref(), self.reward, true)
                .await;
        }
        Ok(())
    }

    async fn decide(
        &mut self,
        request: &RequestBody,
        executor: &mut dyn Executor,
    ) -> anyhow::Result<()> {
        self.observer
            .observe(self.last_action.as_ref(), self.reward, self.terminated)
            .await;
        self.reward = 0.0;

        let mut wrapped = RecordingExecutor {
            inner: executor,
            last_action: &mut self.last_action,
        };
        self.inner.decide(request, &mut wrapped).await
    }
}

#[cfg(test)]
mod experience_wrapper_test {
    use async_trait::async_trait;
    use battle_action::{
        Action,
        Event,
        ExecutorResult,
        RequestBody,
        RequestKind,
    };

    use super::{
        Experience,
        ExperienceWrapper,
        LOSE_REWARD,
        RewardObserver,
        TIE_REWARD,
        WIN_REWARD,
    };
    use crate::contract::{
        BattleParser,
        Executor,
    };

    struct NullParser;

    #[async_trait]
    impl BattleParser for NullParser {
        async fn handle_event(&mut self, _event: &Event) -> anyhow::Result<()> {
            Ok(())
        }

        async fn decide(
            &mut self,
            _request: &RequestBody,
            executor: &mut dyn Executor,
        ) -> anyhow::Result<()> {
            executor.executor(&Action::new("move 1"), None).await;
            Ok(())
        }
    }

    struct AlwaysAccept;

    #[async_trait]
    impl Executor for AlwaysAccept {
        async fn executor(&mut self, _action: &Action, _debug: Option<&str>) -> ExecutorResult {
            ExecutorResult::Accepted
        }
    }

    struct NullObserver;

    #[async_trait]
    impl RewardObserver for NullObserver {
        async fn observe(&mut self, _action: Option<&Action>, _reward: f64, _terminated: bool) {}
    }

    struct RecordingObserver(std::sync::Arc<std::sync::Mutex<Vec<(Option<Action>, f64, bool)>>>);

    #[async_trait]
    impl RewardObserver for RecordingObserver {
        async fn observe(&mut self, action: Option<&Action>, reward: f64, terminated: bool) {
            self.0
                .lock()
                .unwrap()
                .push((action.cloned(), reward, terminated));
        }
    }

    #[test]
    fn constants_match_expected_values() {
        assert_eq!(WIN_REWARD, 1.0);
        assert_eq!(LOSE_REWARD, -1.0);
        assert_eq!(TIE_REWARD, 0.0);
    }

    #[tokio::test]
    async fn win_produces_positive_terminal_experience() {
        let mut wrapper = ExperienceWrapper::new(NullParser, NullObserver, "me");
        let request = RequestBody {
            id: 1,
            kind: RequestKind::Move,
        };
        let mut executor = AlwaysAccept;
        wrapper.decide(&request, &mut executor).await.unwrap();
        wrapper
            .handle_event(&Event::Win("me".to_owned()))
            .await
            .unwrap();

        let experience = wrapper.finish().unwrap();
        assert_eq!(
            experience,
            Experience {
                action: Some(Action::new("move 1")),
                reward: WIN_REWARD,
                terminated: true,
            }
        );
    }

    #[tokio::test]
    async fn loss_produces_negative_terminal_experience() {
        let mut wrapper = ExperienceWrapper::new(NullParser, NullObserver, "me");
        wrapper
            .handle_event(&Event::Win("opponent".to_owned()))
            .await
            .unwrap();

        let experience = wrapper.finish().unwrap();
        assert_eq!(experience.reward, LOSE_REWARD);
        assert!(experience.terminated);
    }

    #[tokio::test]
    async fn truncated_battle_has_no_experience() {
        let wrapper = ExperienceWrapper::new(NullParser, NullObserver, "me");
        assert_eq!(wrapper.finish(), None);
    }

    #[tokio::test]
    async fn terminal_event_notifies_the_observer_even_without_a_following_decide() {
        let calls = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut wrapper =
            ExperienceWrapper::new(NullParser, RecordingObserver(calls.clone()), "me");
        wrapper
            .handle_event(&Event::Win("me".to_owned()))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(None, WIN_REWARD, true)]);
    }
}
