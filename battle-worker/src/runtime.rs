use std::sync::{
    Arc,
    Mutex as StdMutex,
};

use async_trait::async_trait;
use battle_driver::{
    BattleDriver,
    Experience,
};

use crate::{
    DynEventStream,
    DynParser,
    DynSender,
    protocol::BattleRequest,
};

/// Everything the worker needs to run one side of a battle to completion.
pub struct PreparedSide {
    pub driver: BattleDriver<DynParser, DynSender>,
    pub events: DynEventStream,
    /// Filled in by the wiring collaborator iff this side is a `"model"` agent with experience
    /// reporting enabled. Read after the battle completes.
    pub experience_slot: Option<Arc<StdMutex<Option<Experience>>>>,
}

/// Both sides plus the stream used to observe the winner.
pub struct PreparedBattle {
    pub p1: PreparedSide,
    pub p2: PreparedSide,
    pub omniscient: DynEventStream,
}

/// Builds the simulator connection and both sides' decision logic for one battle request.
///
/// Owns every domain-specific detail this crate treats as external: starting the simulator
/// process, tokenizing its output (the `EventParser` collaborator), and tracking game state
/// (the `BattleState` collaborator). The worker only ever sees the finished
/// [`BattleDriver`]/event-stream pair this trait hands back.
#[async_trait]
pub trait BattleRuntime: Send + Sync {
    async fn prepare(&self, request: &BattleRequest) -> anyhow::Result<PreparedBattle>;
}
