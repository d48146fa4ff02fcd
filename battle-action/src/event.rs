/// The kind of decision a [`RequestBody`] is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// No decision is actually required; the side is just being kept informed.
    Wait,
    /// A move (and, implicitly, a switch) decision is due.
    Move,
    /// Team order must be chosen before the battle starts.
    TeamPreview,
}

/// The body of a `request` event: the simulator announcing that a decision is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    /// Monotonically increasing identifier for this request.
    pub id: u64,
    /// What kind of decision this request is asking for.
    pub kind: RequestKind,
}

/// Which class of choice the simulator refused as currently unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableChoiceKind {
    Move,
    Switch,
}

/// A structured event produced by the (external) event parser from one simulator chunk.
///
/// The driver reads only a kind tag and, for a few kinds, one or two positional fields. Any
/// kind it does not recognize as game-relevant is forwarded untouched via [`Event::Other`] so
/// the `BattleState` collaborator can update its own model of the battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A decision is due.
    Request(RequestBody),
    /// The simulator rejected the last choice; `reason` carries the `[...]`-prefixed message.
    Error(String),
    /// The battle has begun.
    Start,
    /// The turn counter advanced to `n`.
    Turn(u64),
    /// The battle ended; `name` is the winning player's username.
    Win(String),
    /// The battle ended in a tie.
    Tie,
    /// Out-of-band marker: the simulator is blocked waiting for input.
    Halt,
    /// Any other event kind, tagged with its name, forwarded to the `BattleState` collaborator
    /// if the driver's allow-list considers it game-relevant.
    Other(String),
}

impl Event {
    /// The kind tag of this event, as it would appear on the wire.
    ///
    /// Used by the driver's event filter to consult its allow-list without needing to match on
    /// every variant twice.
    pub fn kind_tag(&self) -> &str {
        match self {
            Self::Request(_) => "request",
            Self::Error(_) => "error",
            Self::Start => "start",
            Self::Turn(_) => "turn",
            Self::Win(_) => "win",
            Self::Tie => "tie",
            Self::Halt => "halt",
            Self::Other(kind) => kind.as_str(),
        }
    }
}
