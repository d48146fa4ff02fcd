use tokio::io::{
    AsyncRead,
    AsyncWrite,
};

use crate::{
    BridgeError,
    protocol::Handshake,
    transport::{
        recv_message,
        send_message,
    },
};

/// Performs the worker side of the handshake: send `ready`, then require `ack`.
///
/// Any other reply, or the stream closing before one arrives, is fatal.
pub async fn perform_handshake<S>(stream: &mut S) -> Result<(), BridgeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ready = serde_json::to_vec(&Handshake::Ready)?;
    send_message(stream, &[&ready]).await?;

    let reply = recv_message(stream)
        .await?
        .ok_or(BridgeError::HandshakeClosed)?;
    let frame = reply.first().ok_or(BridgeError::EmptyMessage)?;
    let parsed: Handshake =
        serde_json::from_slice(frame).map_err(|_| BridgeError::HandshakeProtocol)?;
    match parsed {
        Handshake::Ack => Ok(()),
        Handshake::Ready => Err(BridgeError::HandshakeProtocol),
    }
}
