mod pipeline;
mod stream;

pub use pipeline::{
    BattleConfig,
    BattleOutcome,
    run_battle,
};
pub use stream::{
    ChunkStream,
    EventParser,
    EventStream,
    ParsingEventStream,
};
