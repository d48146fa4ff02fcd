use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex as StdMutex,
    },
    time::Duration,
};

use agent_bridge::{
    AgentBridge,
    AgentFinalKind,
    AgentFinalMessage,
    FrameReader,
    FrameWriter,
};
use battle_driver::{
    DeferredLogSink,
    Experience,
};
use battle_pipeline::{
    BattleConfig,
    run_battle,
};
use tokio::{
    io::AsyncRead,
    sync::Mutex,
    task::JoinSet,
};

use crate::{
    DynWriter,
    error::WorkerError,
    protocol::{
        AgentKind,
        AgentOpts,
        BattleReply,
        BattleReplyKind,
        BattleRequest,
        Sides,
    },
    runtime::BattleRuntime,
};

async fn dispatch_battle<R>(
    runtime: Arc<R>,
    bridge: Arc<AgentBridge<DynWriter>>,
    request: BattleRequest,
) -> BattleReply
where
    R: BattleRuntime + 'static,
{
    let agents = Sides {
        p1: request.agents.p1.name.clone(),
        p2: request.agents.p2.name.clone(),
    };

    bridge.register_battle(&request.id).await;

    let prepared = match runtime.prepare(&request).await {
        Ok(prepared) => prepared,
        Err(err) => {
            bridge.close_battle(&request.id).await;
            return BattleReply {
                kind: BattleReplyKind::Battle,
                id: request.id,
                agents,
                winner: None,
                truncated: None,
                log_path: None,
                err: Some(format!("{err:#}")),
            };
        }
    };

    let config = BattleConfig {
        max_turns: request.max_turns,
        log_path: request.log_path.clone(),
        eager_log: !request.only_log_on_error.unwrap_or(false),
        timeout: request.timeout_ms.map(Duration::from_millis),
    };

    let p1_experience = prepared.p1.experience_slot.clone();
    let p2_experience = prepared.p2.experience_slot.clone();

    let outcome = run_battle(
        config,
        DeferredLogSink::new(),
        prepared.p1.driver,
        prepared.p1.events,
        prepared.p2.driver,
        prepared.p2.events,
        prepared.omniscient,
    )
    .await;

    send_agent_final(&bridge, &request.id, &request.agents.p1, p1_experience).await;
    send_agent_final(&bridge, &request.id, &request.agents.p2, p2_experience).await;

    bridge.close_battle(&request.id).await;

    BattleReply {
        kind: BattleReplyKind::Battle,
        id: request.id,
        agents,
        winner: outcome.winner,
        truncated: outcome.truncated.then_some(true),
        log_path: outcome.log_path,
        err: outcome.error,
    }
}

async fn send_agent_final(
    bridge: &AgentBridge<DynWriter>,
    battle_id: &str,
    opts: &AgentOpts,
    slot: Option<Arc<StdMutex<Option<Experience>>>>,
) {
    if opts.kind != AgentKind::Model {
        return;
    }
    let experience = slot.and_then(|slot| slot.lock().unwrap().take());
    let message = AgentFinalMessage {
        kind: AgentFinalKind::AgentFinal,
        battle: battle_id.to_owned(),
        name: opts.name.clone(),
        action: experience.as_ref().and_then(|experience| experience.action.clone()),
        reward: experience.as_ref().map(|experience| experience.reward),
        terminated: experience.as_ref().map(|experience| experience.terminated),
    };
    if let Err(err) = bridge.send_final(&message).await {
        log::warn!(
            "failed to send agent_final for {battle_id}/{}: {err}",
            opts.name
        );
    }
}

/// Handshakes, accepts battle requests, multiplexes many concurrent battles, and replies with
/// results as each finishes.
///
/// Concurrency across battles is bounded only by whatever dispatches requests upstream; within
/// one battle, the driver's own invariants serialize decisions per side.
pub struct BattleWorker<R> {
    runtime: Arc<R>,
    bridge: Arc<AgentBridge<DynWriter>>,
    battle_writer: Mutex<FrameWriter<DynWriter>>,
}

impl<R> BattleWorker<R>
where
    R: BattleRuntime + 'static,
{
    pub fn new(
        runtime: Arc<R>,
        bridge: Arc<AgentBridge<DynWriter>>,
        battle_writer: FrameWriter<DynWriter>,
    ) -> Self {
        Self {
            runtime,
            bridge,
            battle_writer: Mutex::new(battle_writer),
        }
    }

    /// Reads battle requests from `battle_reader` until the stream closes, running every
    /// accepted battle concurrently and writing a reply as soon as it finishes.
    pub async fn run<BR>(&self, mut battle_reader: FrameReader<BR>) -> Result<(), WorkerError>
    where
        BR: AsyncRead + Unpin + Send,
    {
        let mut seen_ids = HashSet::new();
        let mut battles: JoinSet<BattleReply> = JoinSet::new();

        loop {
            tokio::select! {
                frame = battle_reader.recv() => {
                    let Some(frames) = frame? else { break };
                    let header = frames.first().ok_or(WorkerError::EmptyMessage)?;
                    let request: BattleRequest = serde_json::from_slice(header)?;
                    if !seen_ids.insert(request.id.clone()) {
                        return Err(WorkerError::DuplicateBattleId(request.id));
                    }
                    let runtime = self.runtime.clone();
                    let bridge = self.bridge.clone();
                    battles.spawn(dispatch_battle(runtime, bridge, request));
                }
                Some(result) = battles.join_next(), if !battles.is_empty() => {
                    let reply = result.map_err(|_| WorkerError::DispatchPanicked)?;
                    self.send_reply(&reply).await?;
                }
                else => break,
            }
        }

        while let Some(result) = battles.join_next().await {
            let reply = result.map_err(|_| WorkerError::DispatchPanicked)?;
            self.send_reply(&reply).await?;
        }
        Ok(())
    }

    async fn send_reply(&self, reply: &BattleReply) -> Result<(), WorkerError> {
        let bytes = serde_json::to_vec(reply)?;
        self.battle_writer.lock().await.send(&[&bytes]).await?;
        Ok(())
    }
}
