use std::io;

use tokio::io::{
    AsyncRead,
    AsyncReadExt,
    AsyncWrite,
    AsyncWriteExt,
};

/// Writes one multipart message as a frame count followed by length-prefixed frames.
pub async fn send_message<W>(writer: &mut W, frames: &[&[u8]]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_u32_le(frames.len() as u32).await?;
    for frame in frames {
        writer.write_u32_le(frame.len() as u32).await?;
        writer.write_all(frame).await?;
    }
    writer.flush().await
}

/// Reads one multipart message, or `None` if the stream ended cleanly before the next message.
pub async fn recv_message<R>(reader: &mut R) -> io::Result<Option<Vec<Vec<u8>>>>
where
    R: AsyncRead + Unpin,
{
    let frame_count = match reader.read_u32_le().await {
        Ok(count) => count,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    };
    let mut frames = Vec::with_capacity(frame_count as usize);
    for _ in 0..frame_count {
        let len = reader.read_u32_le().await?;
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).await?;
        frames.push(buf);
    }
    Ok(Some(frames))
}

/// The write half of a duplex socket, framing whole multipart messages.
///
/// Kept separate from the read half so one task can own sends behind a mutex while a dedicated
/// puller task owns the read half exclusively.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W> FrameWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn send(&mut self, frames: &[&[u8]]) -> io::Result<()> {
        send_message(&mut self.writer, frames).await
    }
}

/// The read half of a duplex socket, framing whole multipart messages.
pub struct FrameReader<R> {
    reader: R,
}

impl<R> FrameReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub async fn recv(&mut self) -> io::Result<Option<Vec<Vec<u8>>>> {
        recv_message(&mut self.reader).await
    }
}
