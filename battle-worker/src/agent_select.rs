use std::marker::PhantomData;

use agent_bridge::AgentBridge;
use anyhow::anyhow;
use async_trait::async_trait;
use battle_action::Action;
use battle_agents::{
    MaxDamageAgent,
    RandomAgent,
    RandomMoveAgent,
};
use battle_driver::Agent;

use crate::{
    DynWriter,
    protocol::{
        AgentKind,
        AgentOpts,
    },
};
use std::sync::Arc;

/// Encodes a domain-specific state snapshot into the dense byte buffer the predictor expects.
///
/// Size and layout are owned entirely by the implementor; this crate only moves the bytes.
pub trait StateEncoder<Snapshot>: Send + Sync {
    fn encode(&self, state: &Snapshot) -> Vec<u8>;
}

/// An [`Agent`] that defers every decision to a remote predictor over the [`AgentBridge`].
pub struct ModelAgent<Snapshot, E> {
    bridge: Arc<AgentBridge<DynWriter>>,
    encoder: E,
    battle_id: String,
    agent_name: String,
    last_action: Option<Action>,
    _snapshot: PhantomData<fn() -> Snapshot>,
}

impl<Snapshot, E> ModelAgent<Snapshot, E> {
    pub fn new(
        bridge: Arc<AgentBridge<DynWriter>>,
        encoder: E,
        battle_id: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Self {
        Self {
            bridge,
            encoder,
            battle_id: battle_id.into(),
            agent_name: agent_name.into(),
            last_action: None,
            _snapshot: PhantomData,
        }
    }
}

#[async_trait]
impl<Snapshot, E> Agent<Snapshot> for ModelAgent<Snapshot, E>
where
    Snapshot: Send + Sync,
    E: StateEncoder<Snapshot> + Send + Sync,
{
    async fn agent(&mut self, state: &Snapshot, choices: &mut Vec<Action>) {
        let encoded = self.encoder.encode(state);
        match self
            .bridge
            .call(
                &self.battle_id,
                &self.agent_name,
                choices.clone(),
                self.last_action.clone(),
                None,
                &encoded,
            )
            .await
        {
            Ok(ranked) => *choices = ranked,
            Err(err) => {
                log::warn!(
                    "agent bridge call failed for {}/{}: {err}",
                    self.battle_id,
                    self.agent_name
                );
            }
        }
        if let Some(action) = choices.first() {
            self.last_action = Some(action.clone());
        }
    }
}

/// Selects the decision maker for one side: a remote model call, or a built-in heuristic
/// parameterized by an optional RNG seed.
pub fn choose_agent<Snapshot, E>(
    opts: &AgentOpts,
    battle_id: &str,
    bridge: Arc<AgentBridge<DynWriter>>,
    encoder: E,
) -> anyhow::Result<crate::DynAgent<Snapshot>>
where
    Snapshot: Send + Sync + 'static,
    E: StateEncoder<Snapshot> + Send + Sync + 'static,
{
    opts.validate().map_err(|err| anyhow!(err))?;
    match opts.kind {
        AgentKind::Model => Ok(Box::new(ModelAgent::new(
            bridge,
            encoder,
            battle_id.to_owned(),
            opts.name.clone(),
        ))),
        AgentKind::Random => Ok(Box::new(RandomAgent::new(opts.rand_seed))),
        AgentKind::RandomMove => Ok(Box::new(RandomMoveAgent::new(opts.rand_seed))),
        AgentKind::MaxDamage => Ok(Box::new(MaxDamageAgent::new())),
    }
}

#[cfg(test)]
mod agent_select_test {
    use agent_bridge::{
        AgentBridge,
        FrameWriter,
    };
    use super::{
        AgentKind,
        AgentOpts,
        choose_agent,
    };
    use crate::DynWriter;
    use std::sync::Arc;

    struct NullEncoder;

    impl super::StateEncoder<()> for NullEncoder {
        fn encode(&self, _state: &()) -> Vec<u8> {
            Vec::new()
        }
    }

    fn bridge() -> Arc<AgentBridge<DynWriter>> {
        let writer: DynWriter = Box::new(tokio::io::sink());
        Arc::new(AgentBridge::new(FrameWriter::new(writer)))
    }

    fn opts(kind: AgentKind, model: Option<&str>) -> AgentOpts {
        AgentOpts {
            name: "p1".to_owned(),
            kind,
            model: model.map(str::to_owned),
            experience: None,
            team_seed: None,
            rand_seed: Some(1),
        }
    }

    #[test]
    fn selects_an_agent_for_every_built_in_kind() {
        for kind in [AgentKind::Random, AgentKind::RandomMove, AgentKind::MaxDamage] {
            let agent = choose_agent::<(), NullEncoder>(
                &opts(kind, None),
                "battle-1",
                bridge(),
                NullEncoder,
            );
            assert!(matches!(agent, Ok(_)));
        }
    }

    #[test]
    fn model_without_a_model_id_is_rejected() {
        let agent = choose_agent::<(), NullEncoder>(
            &opts(AgentKind::Model, None),
            "battle-1",
            bridge(),
            NullEncoder,
        );
        assert!(agent.is_err());
    }

    #[test]
    fn model_with_a_model_id_builds_a_model_agent() {
        let agent = choose_agent::<(), NullEncoder>(
            &opts(AgentKind::Model, Some("v1")),
            "battle-1",
            bridge(),
            NullEncoder,
        );
        assert!(matches!(agent, Ok(_)));
    }
}
