mod bridge;
mod handshake;
mod protocol;
mod puller;
mod socket;
mod transport;

use thiserror::Error;

pub use bridge::AgentBridge;
pub use handshake::perform_handshake;
pub use protocol::{
    AgentFinalKind,
    AgentFinalMessage,
    AgentReplyHeader,
    AgentRequestHeader,
    AgentRequestKind,
    Handshake,
};
pub use puller::run_puller;
pub use socket::{
    agent_socket_name,
    battle_socket_name,
    connect_local,
};
pub use transport::{
    FrameReader,
    FrameWriter,
};

/// Errors from the agent bridge's handshake, correlation, and transport layers.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("handshake failed: peer did not send 'ack'")]
    HandshakeProtocol,
    #[error("handshake channel closed before completing")]
    HandshakeClosed,
    #[error("a request for this battle/agent pair is already outstanding")]
    RequestAlreadyOutstanding,
    #[error("no such battle registered: {0}")]
    UnknownBattle(String),
    #[error("agent bridge closed before a reply arrived")]
    BridgeClosed,
    #[error("received a reply with no matching outstanding request")]
    UnsolicitedReply,
    #[error("message had no frames")]
    EmptyMessage,
    #[error("agent reply carried {0} frames, expected exactly 1")]
    MalformedReply(usize),
    #[error("malformed message frame")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
