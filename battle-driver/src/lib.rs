mod contract;
mod driver;
mod experience;
mod log_sink;
mod timeout;

pub use contract::{
    Agent,
    AgentContext,
    BattleParser,
    BattleState,
    ChoiceSender,
    Executor,
};
pub use driver::{
    Battling,
    BattleDriver,
    DriverError,
};
pub use experience::{
    Experience,
    ExperienceWrapper,
    LOSE_REWARD,
    RewardObserver,
    TIE_REWARD,
    WIN_REWARD,
};
pub use log_sink::DeferredLogSink;
pub use timeout::{
    TimedOut,
    with_timeout,
};
