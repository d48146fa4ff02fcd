use std::sync::Arc;

use async_trait::async_trait;
use battle_action::{
    Action,
    Event,
    ExecutorResult,
    RequestBody,
};
use thiserror::Error;
use tokio::{
    sync::{
        Mutex,
        oneshot,
    },
    task::JoinHandle,
};

use crate::contract::{
    BattleParser,
    ChoiceSender,
    Executor,
};

/// The lifecycle state of a battle as observed by one side's driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Battling {
    NotStarted,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnavailableChoice {
    Move,
    Switch,
}

/// Errors raised by [`BattleDriver`]. Anything other than [`DriverError::Parser`] is a protocol
/// violation and is fatal to the surrounding battle.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("received a request that conflicts with the pending request")]
    UnexpectedRequest,
    #[error("halt received but there is no pending request to process")]
    NoRequestToProcess,
    #[error("halt received while a decision is already in flight")]
    AlreadyHalted,
    #[error("finish called while a decision is still outstanding")]
    DecisionOutstanding,
    #[error("the decision task panicked or was cancelled")]
    DecisionTaskFailed,
    #[error(transparent)]
    Parser(anyhow::Error),
}

/// Cosmetic or purely informational event kinds that are dropped before ever reaching the
/// parser or affecting driver state.
const COSMETIC_KINDS: &[&str] = &[
    "chat", "c", "c:", "html", "uhtml", "uhtmlchange", "debug", "rule", "formats", "unlink",
    "tier", "rated", "j", "J", "l", "L", "n", "N", "raw", "warning", "message", "gametype", "gen",
];

fn is_cosmetic(kind: &str) -> bool {
    COSMETIC_KINDS.contains(&kind)
}

/// The driver-owned [`Executor`] handed to a spawned decision task.
///
/// Holds no state of its own beyond shared handles: the waker the driver resolves from event
/// arrivals, and the sender used to actually transmit a choice to the simulator.
struct DriverExecutor<C> {
    waker: Arc<Mutex<Option<oneshot::Sender<ExecutorResult>>>>,
    sender: Arc<Mutex<C>>,
}

#[async_trait]
impl<C> Executor for DriverExecutor<C>
where
    C: ChoiceSender + 'static,
{
    async fn executor(&mut self, action: &Action, debug: Option<&str>) -> ExecutorResult {
        let (tx, rx) = oneshot::channel();
        {
            let mut waker = self.waker.lock().await;
            *waker = Some(tx);
        }

        let sent = self.sender.lock().await.send_choice(action, debug).await;
        if !sent {
            // Transport is gone; nobody will ever resolve this waker.
            self.waker.lock().await.take();
            return ExecutorResult::RejectedUnknown;
        }

        // If the waker was resolved, `rx` yields its value. If the driver dropped the sending
        // half without resolving (e.g. force_finish raced ahead of us), treat it the same as an
        // outright rejection so the parser can decide what to do next.
        rx.await.unwrap_or(ExecutorResult::RejectedUnknown)
    }
}

fn spawn_decision<P, C>(
    parser: Arc<Mutex<P>>,
    waker: Arc<Mutex<Option<oneshot::Sender<ExecutorResult>>>>,
    sender: Arc<Mutex<C>>,
    request: RequestBody,
) -> JoinHandle<Result<(), anyhow::Error>>
where
    P: BattleParser + 'static,
    C: ChoiceSender + 'static,
{
    tokio::spawn(async move {
        let mut executor = DriverExecutor { waker, sender };
        let mut parser = parser.lock().await;
        parser.decide(&request, &mut executor).await
    })
}

/// The per-side event-reordering state machine.
///
/// Consumes events from the simulator in arrival order, reorders `request` events so the
/// parser sees explanatory game events first, and mediates the parser's decisions through a
/// single in-flight `executor` call at a time.
pub struct BattleDriver<P, C>
where
    P: BattleParser + 'static,
    C: ChoiceSender + 'static,
{
    parser: Arc<Mutex<P>>,
    sender: Arc<Mutex<C>>,
    battling: Battling,
    pending_request: Option<RequestBody>,
    progress: bool,
    executor_waker: Arc<Mutex<Option<oneshot::Sender<ExecutorResult>>>>,
    unavailable_choice: Option<UnavailableChoice>,
    decision_task: Option<JoinHandle<Result<(), anyhow::Error>>>,
}

impl<P, C> BattleDriver<P, C>
where
    P: BattleParser + 'static,
    C: ChoiceSender + 'static,
{
    /// Creates a new driver over `parser`, sending choices through `sender`.
    pub fn new(parser: P, sender: C) -> Self {
        Self {
            parser: Arc::new(Mutex::new(parser)),
            sender: Arc::new(Mutex::new(sender)),
            battling: Battling::NotStarted,
            pending_request: None,
            progress: false,
            executor_waker: Arc::new(Mutex::new(None)),
            unavailable_choice: None,
            decision_task: None,
        }
    }

    /// The current lifecycle state.
    pub fn battling(&self) -> Battling {
        self.battling
    }

    /// Consumes one event from the simulator.
    pub async fn handle(&mut self, event: Event) -> Result<(), DriverError> {
        match &event {
            Event::Halt => return self.halt().await,
            Event::Error(reason) => {
                self.handle_error(reason.clone()).await;
                return Ok(());
            }
            Event::Request(body) => {
                let body = body.clone();
                return self.handle_request(body).await;
            }
            _ => {}
        }

        if matches!(self.battling, Battling::Finished) {
            return Ok(());
        }
        if let Event::Other(kind) = &event {
            if is_cosmetic(kind) {
                return Ok(());
            }
        }

        let starts_battle = matches!(event, Event::Start);
        let ends_battle = matches!(event, Event::Win(_) | Event::Tie);

        self.advance(event).await?;

        if starts_battle {
            self.battling = Battling::Running;
        } else if ends_battle {
            self.battling = Battling::Finished;
        }
        Ok(())
    }

    /// Signals the end of a block of game-progressing events.
    pub async fn halt(&mut self) -> Result<(), DriverError> {
        if !matches!(self.battling, Battling::Running) {
            return Ok(());
        }
        if !self.progress {
            // Nothing has happened since the last halt; treat a repeated halt as a no-op.
            return Ok(());
        }
        if self.decision_task.is_some() {
            return Err(DriverError::AlreadyHalted);
        }

        let request = match self.pending_request.take() {
            Some(request) => request,
            None => return Err(DriverError::NoRequestToProcess),
        };
        self.decision_task = Some(spawn_decision(
            self.parser.clone(),
            self.executor_waker.clone(),
            self.sender.clone(),
            request,
        ));
        self.progress = false;
        Ok(())
    }

    /// Asserts the battle ended cleanly and tears down the driver.
    pub fn finish(self) -> Result<(), DriverError> {
        if self.decision_task.is_some() {
            return Err(DriverError::DecisionOutstanding);
        }
        Ok(())
    }

    /// Aborts the battle: resolves any pending decision with `RejectedUnknown` so the parser
    /// unblocks, and abandons the decision task's eventual result.
    pub async fn force_finish(&mut self) {
        self.resolve_waker(ExecutorResult::RejectedUnknown).await;
        if let Some(task) = self.decision_task.take() {
            task.abort();
        }
        self.battling = Battling::Finished;
    }

    async fn handle_request(&mut self, body: RequestBody) -> Result<(), DriverError> {
        match self.battling {
            Battling::NotStarted => {
                // Delivered straight to the parser: there is no preceding game-event block to
                // wait for, so the decision starts immediately instead of waiting on `halt`.
                self.await_decision_task().await?;
                self.decision_task = Some(spawn_decision(
                    self.parser.clone(),
                    self.executor_waker.clone(),
                    self.sender.clone(),
                    body,
                ));
                Ok(())
            }
            Battling::Running => {
                if let Some(unavailable) = self.unavailable_choice.take() {
                    let result = match unavailable {
                        UnavailableChoice::Move => ExecutorResult::Disabled,
                        UnavailableChoice::Switch => ExecutorResult::Trapped,
                    };
                    self.resolve_waker(result).await;
                    return Ok(());
                }

                match &self.pending_request {
                    None => {
                        self.resolve_waker(ExecutorResult::Accepted).await;
                        self.pending_request = Some(body);
                        Ok(())
                    }
                    Some(existing) if *existing == body => {
                        // Duplicate request with an identical body: a no-op.
                        Ok(())
                    }
                    Some(_) => Err(DriverError::UnexpectedRequest),
                }
            }
            Battling::Finished => Ok(()),
        }
    }

    async fn handle_error(&mut self, reason: String) {
        if reason.starts_with("[Unavailable choice] Can't move") {
            self.unavailable_choice = Some(UnavailableChoice::Move);
        } else if reason.starts_with("[Unavailable choice] Can't switch") {
            self.unavailable_choice = Some(UnavailableChoice::Switch);
        } else if reason.starts_with("[Invalid choice]") {
            self.resolve_waker(ExecutorResult::RejectedUnknown).await;
        } else {
            log::warn!("ignoring unrecognized simulator error: {reason}");
        }
    }

    /// Handles any event that is neither a halt, an error, nor a request: resolves the waker as
    /// accepted, waits out any in-flight decision, marks progress, and forwards the event.
    async fn advance(&mut self, event: Event) -> Result<(), DriverError> {
        self.resolve_waker(ExecutorResult::Accepted).await;
        self.await_decision_task().await?;
        self.progress = true;

        let mut parser = self.parser.lock().await;
        parser
            .handle_event(&event)
            .await
            .map_err(DriverError::Parser)
    }

    async fn resolve_waker(&self, result: ExecutorResult) {
        if let Some(tx) = self.executor_waker.lock().await.take() {
            // If the receiver was already dropped, there is nothing left to notify.
            let _ = tx.send(result);
        }
    }

    /// Awaits the in-flight decision task, if any.
    ///
    /// `JoinHandle::await` resolves immediately for an already-completed task, so a decision
    /// task that never invoked `executor` (and therefore finished as soon as it ran) never
    /// blocks the next event from being handled.
    async fn await_decision_task(&mut self) -> Result<(), DriverError> {
        if let Some(task) = self.decision_task.take() {
            task.await
                .map_err(|_| DriverError::DecisionTaskFailed)?
                .map_err(DriverError::Parser)?;
        }
        Ok(())
    }
}
