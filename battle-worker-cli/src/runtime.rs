use anyhow::anyhow;
use async_trait::async_trait;
use battle_worker::{
    BattleRequest,
    BattleRuntime,
    PreparedBattle,
};

/// Stands in for the simulator-launching, state-tracking, wire-tokenizing collaborator this
/// crate treats as external. Wiring a real game integration means replacing this with a type
/// that starts the simulator process and builds the two sides' drivers from it.
pub struct UnimplementedRuntime;

#[async_trait]
impl BattleRuntime for UnimplementedRuntime {
    async fn prepare(&self, request: &BattleRequest) -> anyhow::Result<PreparedBattle> {
        Err(anyhow!(
            "battle {}: no BattleRuntime is wired into this binary; supply a BattleState/\
             EventParser/simulator integration before running battles",
            request.id
        ))
    }
}
