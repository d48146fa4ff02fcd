use std::{
    path::PathBuf,
    time::Duration,
};

use anyhow::anyhow;
use battle_action::Event;
use battle_driver::{
    Battling,
    BattleDriver,
    BattleParser,
    ChoiceSender,
    DeferredLogSink,
    DriverError,
    with_timeout,
};
use thiserror::Error;

use crate::stream::EventStream;

/// Configuration for a single battle run.
#[derive(Debug, Clone, Default)]
pub struct BattleConfig {
    /// Truncate the battle once either side observes a turn at or beyond this count.
    pub max_turns: Option<u64>,
    /// Where to realize the battle log, if a concrete path is wanted.
    pub log_path: Option<PathBuf>,
    /// Realize the log immediately rather than only on error.
    pub eager_log: bool,
    /// Deadline applied to every stream read and driver invocation.
    pub timeout: Option<Duration>,
}

/// The outcome of a single battle run. Errors are captured here rather than propagated, per the
/// pipeline's "never re-throw" contract: a battle that fails still produces a result record.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleOutcome {
    pub winner: Option<String>,
    pub truncated: bool,
    pub log_path: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Error, Debug)]
enum SideError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("simulator stream timed out")]
    TimedOut,
}

async fn run_side<P, C, R>(
    mut driver: BattleDriver<P, C>,
    mut events: R,
    max_turns: Option<u64>,
    timeout: Option<Duration>,
) -> Result<bool, SideError>
where
    P: BattleParser + 'static,
    C: ChoiceSender + 'static,
    R: EventStream,
{
    loop {
        let next = match timeout {
            Some(deadline) => with_timeout(events.next_event(), deadline)
                .await
                .map_err(|_| SideError::TimedOut)?,
            None => events.next_event().await,
        };

        let Some(event) = next else {
            if driver.finish().is_err() {
                log::warn!("simulator stream ended with a decision still outstanding");
            }
            return Ok(false);
        };

        let truncate = matches!(&event, Event::Turn(n) if max_turns.is_some_and(|max| *n >= max));

        match event {
            Event::Halt => driver.halt().await?,
            other => driver.handle(other).await?,
        }

        if truncate {
            driver.force_finish().await;
            return Ok(true);
        }

        if matches!(driver.battling(), Battling::Finished) {
            driver.finish().ok();
            return Ok(false);
        }
    }
}

async fn capture_winner<R>(mut omniscient: R, timeout: Option<Duration>) -> Option<String>
where
    R: EventStream,
{
    loop {
        let next = match timeout {
            Some(deadline) => with_timeout(omniscient.next_event(), deadline)
                .await
                .ok()
                .flatten(),
            None => omniscient.next_event().await,
        };
        match next {
            Some(Event::Win(name)) => return Some(name),
            Some(Event::Tie) | None => return None,
            _ => continue,
        }
    }
}

/// Runs one battle to completion: drives both sides' drivers over their event streams, watches
/// an omniscient stream for the winner, enforces `config.max_turns`, and always returns a
/// result record rather than propagating errors.
pub async fn run_battle<P1, C1, R1, P2, C2, R2, OR>(
    config: BattleConfig,
    mut log_sink: DeferredLogSink,
    p1_driver: BattleDriver<P1, C1>,
    p1_events: R1,
    p2_driver: BattleDriver<P2, C2>,
    p2_events: R2,
    omniscient: OR,
) -> BattleOutcome
where
    P1: BattleParser + 'static,
    C1: ChoiceSender + 'static,
    R1: EventStream + Send + 'static,
    P2: BattleParser + 'static,
    C2: ChoiceSender + 'static,
    R2: EventStream + Send + 'static,
    OR: EventStream,
{
    if config.eager_log {
        if let Err(err) = log_sink.ensure(config.log_path.clone(), "battle").await {
            log::warn!("failed to eagerly realize battle log: {err:#}");
        }
    }

    let max_turns = config.max_turns;
    let timeout = config.timeout;
    let p1_task = tokio::spawn(run_side(p1_driver, p1_events, max_turns, timeout));
    let p2_task = tokio::spawn(run_side(p2_driver, p2_events, max_turns, timeout));

    let (p1_result, p2_result, winner) =
        tokio::join!(p1_task, p2_task, capture_winner(omniscient, timeout));

    let outcome = match (p1_result, p2_result) {
        (Ok(Ok(truncated1)), Ok(Ok(truncated2))) => Ok((truncated1 || truncated2, winner)),
        (Ok(Err(err)), _) | (_, Ok(Err(err))) => Err(anyhow::Error::new(err)),
        _ => Err(anyhow!("a battle side task panicked")),
    };

    match outcome {
        Ok((truncated, winner)) => {
            let log_path = log_sink.realized_path().await;
            if let Err(err) = log_sink.finish().await {
                log::warn!("failed to flush battle log: {err:#}");
            }
            BattleOutcome {
                winner,
                truncated,
                log_path,
                error: None,
            }
        }
        Err(err) => {
            let log_path = match log_sink.ensure(config.log_path.clone(), "battle").await {
                Ok(path) => Some(path),
                Err(ensure_err) => {
                    log::warn!("failed to realize battle log after error: {ensure_err:#}");
                    log_sink.realized_path().await
                }
            };
            if let Err(flush_err) = log_sink.finish().await {
                log::warn!("failed to flush battle log: {flush_err:#}");
            }
            BattleOutcome {
                winner: None,
                truncated: false,
                log_path,
                error: Some(format!("{err:#}")),
            }
        }
    }
}
