use std::sync::Arc;

use tokio::io::{
    AsyncRead,
    AsyncWrite,
};

use crate::{
    AgentBridge,
    BridgeError,
    protocol::AgentReplyHeader,
    transport::FrameReader,
};

/// Reads reply frames from the agent socket until it closes, resolving each against `bridge`.
///
/// Runs for the lifetime of the worker. An unsolicited or malformed reply ends the loop with an
/// error; the caller treats that as fatal to the worker process.
pub async fn run_puller<R, W>(
    mut reader: FrameReader<R>,
    bridge: Arc<AgentBridge<W>>,
) -> Result<(), BridgeError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    while let Some(frames) = reader.recv().await? {
        if frames.len() != 1 {
            return Err(BridgeError::MalformedReply(frames.len()));
        }
        let reply: AgentReplyHeader = serde_json::from_slice(&frames[0])?;
        bridge.deliver(reply).await?;
    }
    Ok(())
}
