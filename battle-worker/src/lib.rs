mod agent_select;
mod dispatch;
mod error;
mod protocol;
mod runtime;

use battle_driver::{
    Agent,
    BattleParser,
    ChoiceSender,
};
use battle_pipeline::EventStream;

/// A boxed parser, used to keep the worker's per-battle dispatch task homogeneous across
/// whatever concrete `BattleState`/`Agent` pairing a [`runtime::BattleRuntime`] builds.
pub type DynParser = Box<dyn BattleParser + Send>;
pub type DynSender = Box<dyn ChoiceSender + Send>;
pub type DynEventStream = Box<dyn EventStream + Send>;
pub type DynAgent<Snapshot> = Box<dyn Agent<Snapshot> + Send>;
pub type DynWriter = Box<dyn tokio::io::AsyncWrite + Unpin + Send>;
pub type DynReader = Box<dyn tokio::io::AsyncRead + Unpin + Send>;

pub use agent_select::{
    ModelAgent,
    StateEncoder,
    choose_agent,
};
pub use dispatch::BattleWorker;
pub use error::WorkerError;
pub use protocol::{
    AgentKind,
    AgentOpts,
    BattleReply,
    BattleReplyKind,
    BattleRequest,
    Side,
    Sides,
};
pub use runtime::{
    BattleRuntime,
    PreparedBattle,
    PreparedSide,
};
