use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

/// One side's id, matching the wire protocol's `p1`/`p2` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    P1,
    P2,
}

/// A value keyed by battle side, mirroring the wire protocol's `{p1, p2}` object shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sides<T> {
    pub p1: T,
    pub p2: T,
}

impl<T> Sides<T> {
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::P1 => &self.p1,
            Side::P2 => &self.p2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Model,
    Random,
    RandomMove,
    MaxDamage,
}

/// One side's agent configuration, as sent by the server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOpts {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub model: Option<String>,
    pub experience: Option<bool>,
    pub team_seed: Option<u64>,
    pub rand_seed: Option<u64>,
}

impl AgentOpts {
    /// `model` must be set iff `kind == Model`.
    pub fn validate(&self) -> Result<(), String> {
        match (self.kind, &self.model) {
            (AgentKind::Model, None) => {
                Err(format!("agent \"{}\" is type \"model\" but has no model id", self.name))
            }
            (AgentKind::Model, Some(_)) => Ok(()),
            (_, None) => Ok(()),
            (_, Some(_)) => Err(format!(
                "agent \"{}\" has a model id but is not type \"model\"",
                self.name
            )),
        }
    }
}

/// A battle request, server to worker.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRequest {
    pub id: String,
    pub agents: Sides<AgentOpts>,
    pub max_turns: Option<u64>,
    pub log_path: Option<PathBuf>,
    pub only_log_on_error: Option<bool>,
    pub seed: Option<u64>,
    pub timeout_ms: Option<u64>,
}

/// A battle reply, worker to server. At most one terminal flag among `winner`, `truncated`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleReply {
    #[serde(rename = "type")]
    pub kind: BattleReplyKind,
    pub id: String,
    pub agents: Sides<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleReplyKind {
    Battle,
}
