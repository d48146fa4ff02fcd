use ahash::HashMap;
use battle_action::Action;
use futures_util::lock::Mutex as AsyncMutex;
use tokio::{
    io::AsyncWrite,
    sync::{
        Mutex,
        oneshot,
    },
};

use crate::{
    BridgeError,
    protocol::{
        AgentFinalMessage,
        AgentReplyHeader,
        AgentRequestHeader,
        AgentRequestKind,
    },
    transport::FrameWriter,
};

type BattleEntries = HashMap<String, oneshot::Sender<AgentReplyHeader>>;

/// Request/reply correlation with a remote predictor over a duplex socket.
///
/// Owns the write half of the socket. A separate puller task owns the read half and calls
/// [`AgentBridge::deliver`] for every reply it parses; `pending` is the only state shared
/// between the two, guarded by an async mutex so a lookup never interleaves with an insert or
/// removal from the other side.
///
/// `pending` is keyed first by battle id, then by agent name, mirroring the fact that a battle
/// entry has its own lifecycle: [`Self::register_battle`] at dispatch, [`Self::close_battle`]
/// at dispatch completion. A call for a battle id that was never registered (or was already
/// closed) fails fast with [`BridgeError::UnknownBattle`] instead of silently installing a
/// waiter nobody will ever tear down.
pub struct AgentBridge<W> {
    writer: Mutex<FrameWriter<W>>,
    pending: AsyncMutex<HashMap<String, BattleEntries>>,
}

impl<W> AgentBridge<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: FrameWriter<W>) -> Self {
        Self {
            writer: Mutex::new(writer),
            pending: AsyncMutex::new(HashMap::default()),
        }
    }

    /// Creates the per-battle entry in `pending`. Must be called before any [`Self::call`] for
    /// this battle id.
    pub async fn register_battle(&self, battle: &str) {
        self.pending
            .lock()
            .await
            .entry(battle.to_owned())
            .or_default();
    }

    /// Removes the per-battle entry from `pending`. Called once dispatch for this battle has
    /// finished and no further calls for it are expected.
    pub async fn close_battle(&self, battle: &str) {
        self.pending.lock().await.remove(battle);
    }

    /// Issues one agent request and waits for its matching reply, ranking `choices` by the
    /// predictor's response. Fails if `battle` was never registered, or if a request for this
    /// `(battle, name)` pair is already outstanding.
    pub async fn call(
        &self,
        battle: &str,
        name: &str,
        choices: Vec<Action>,
        last_action: Option<Action>,
        reward: Option<f64>,
        state: &[u8],
    ) -> Result<Vec<Action>, BridgeError> {
        let rx = {
            let mut pending = self.pending.lock().await;
            let entries = pending
                .get_mut(battle)
                .ok_or_else(|| BridgeError::UnknownBattle(battle.to_owned()))?;
            if entries.contains_key(name) {
                return Err(BridgeError::RequestAlreadyOutstanding);
            }
            let (tx, rx) = oneshot::channel();
            entries.insert(name.to_owned(), tx);
            rx
        };

        let header = AgentRequestHeader {
            kind: AgentRequestKind::Agent,
            battle: battle.to_owned(),
            name: name.to_owned(),
            choices: choices.clone(),
            last_action,
            reward,
        };
        let header_bytes = serde_json::to_vec(&header)?;

        let sent = {
            let mut writer = self.writer.lock().await;
            writer.send(&[&header_bytes, state]).await
        };
        if let Err(err) = sent {
            if let Some(entries) = self.pending.lock().await.get_mut(battle) {
                entries.remove(name);
            }
            return Err(BridgeError::Io(err));
        }

        let reply = rx.await.map_err(|_| BridgeError::BridgeClosed)?;
        Ok(rank_choices(choices, &reply.ranked_actions))
    }

    /// Sends a fire-and-forget `agent_final` message; no reply is expected.
    pub async fn send_final(&self, message: &AgentFinalMessage) -> Result<(), BridgeError> {
        let bytes = serde_json::to_vec(message)?;
        let mut writer = self.writer.lock().await;
        writer.send(&[&bytes]).await?;
        Ok(())
    }

    /// Resolves the oneshot waiting for `reply`, keyed by `(reply.battle, reply.name)`.
    ///
    /// Called by the puller task for every parsed reply frame. A reply for an unregistered
    /// battle, or with no matching outstanding request, is always a protocol violation.
    pub async fn deliver(&self, reply: AgentReplyHeader) -> Result<(), BridgeError> {
        let sender = self
            .pending
            .lock()
            .await
            .get_mut(&reply.battle)
            .and_then(|entries| entries.remove(&reply.name));
        match sender {
            Some(sender) => sender.send(reply).map_err(|_| BridgeError::UnsolicitedReply),
            None => Err(BridgeError::UnsolicitedReply),
        }
    }
}

fn rank_choices(mut choices: Vec<Action>, ranked: &[Action]) -> Vec<Action> {
    choices.sort_by_key(|action| ranked.iter().position(|a| a == action).unwrap_or(usize::MAX));
    choices
}

#[cfg(test)]
mod agent_bridge_test {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::{
        AgentBridge,
        AgentReplyHeader,
    };
    use crate::{
        BridgeError,
        transport::FrameWriter,
    };
    use battle_action::Action;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn sink_bridge() -> Arc<AgentBridge<tokio::io::Sink>> {
        Arc::new(AgentBridge::new(FrameWriter::new(tokio::io::sink())))
    }

    #[tokio::test]
    async fn a_call_for_an_unregistered_battle_is_rejected() {
        let bridge = sink_bridge();
        let err = bridge
            .call("battle-1", "p1", vec![Action::new("move 1")], None, None, &[])
            .await
            .unwrap_err();
        assert_matches!(err, BridgeError::UnknownBattle(battle) if battle == "battle-1");
    }

    #[tokio::test]
    async fn duplicate_request_for_the_same_pair_is_rejected() {
        let bridge = sink_bridge();
        bridge.register_battle("battle-1").await;
        let waiting = bridge.clone();
        let first = tokio::spawn(async move {
            waiting
                .call("battle-1", "p1", vec![Action::new("move 1")], None, None, &[])
                .await
        });
        settle().await;

        let err = bridge
            .call("battle-1", "p1", vec![], None, None, &[])
            .await
            .unwrap_err();
        assert_matches!(err, BridgeError::RequestAlreadyOutstanding);

        bridge
            .deliver(AgentReplyHeader {
                battle: "battle-1".to_owned(),
                name: "p1".to_owned(),
                ranked_actions: vec![Action::new("move 1")],
            })
            .await
            .unwrap();
        assert_eq!(first.await.unwrap().unwrap(), vec![Action::new("move 1")]);
    }

    #[tokio::test]
    async fn a_call_after_the_battle_is_closed_is_rejected() {
        let bridge = sink_bridge();
        bridge.register_battle("battle-1").await;
        bridge.close_battle("battle-1").await;

        let err = bridge
            .call("battle-1", "p1", vec![Action::new("move 1")], None, None, &[])
            .await
            .unwrap_err();
        assert_matches!(err, BridgeError::UnknownBattle(battle) if battle == "battle-1");
    }

    #[tokio::test]
    async fn unsolicited_reply_is_rejected() {
        let bridge = sink_bridge();
        let err = bridge
            .deliver(AgentReplyHeader {
                battle: "battle-1".to_owned(),
                name: "p1".to_owned(),
                ranked_actions: Vec::new(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, BridgeError::UnsolicitedReply);
    }

    #[tokio::test]
    async fn ranked_actions_stable_sort_choices_with_missing_actions_last() {
        let bridge = sink_bridge();
        bridge.register_battle("battle-1").await;
        let waiting = bridge.clone();
        let choices = vec![
            Action::new("move 1"),
            Action::new("move 2"),
            Action::new("switch 1"),
        ];
        let task = tokio::spawn(async move {
            waiting
                .call("battle-1", "p1", choices, None, None, &[])
                .await
        });
        settle().await;

        bridge
            .deliver(AgentReplyHeader {
                battle: "battle-1".to_owned(),
                name: "p1".to_owned(),
                ranked_actions: vec![Action::new("switch 1"), Action::new("move 2")],
            })
            .await
            .unwrap();

        let ranked = task.await.unwrap().unwrap();
        assert_eq!(
            ranked,
            vec![
                Action::new("switch 1"),
                Action::new("move 2"),
                Action::new("move 1"),
            ]
        );
    }

    #[tokio::test]
    async fn send_final_writes_a_single_frame_message() {
        use crate::{
            protocol::{
                AgentFinalKind,
                AgentFinalMessage,
            },
            transport::FrameReader,
        };

        let (client, server) = tokio::io::duplex(4096);
        let bridge = AgentBridge::new(FrameWriter::new(client));
        let mut reader = FrameReader::new(server);

        bridge
            .send_final(&AgentFinalMessage {
                kind: AgentFinalKind::AgentFinal,
                battle: "battle-1".to_owned(),
                name: "p1".to_owned(),
                action: None,
                reward: Some(1.0),
                terminated: Some(true),
            })
            .await
            .unwrap();

        let frames = reader.recv().await.unwrap().unwrap();
        assert_eq!(frames.len(), 1);
        let json: serde_json::Value = serde_json::from_slice(&frames[0]).unwrap();
        assert_eq!(json["type"], "agent_final");
        assert_eq!(json["battle"], "battle-1");
    }
}
