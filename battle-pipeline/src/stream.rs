use std::collections::VecDeque;

use async_trait::async_trait;
use battle_action::Event;

/// Reads raw, unparsed chunks from one side of a simulator connection.
#[async_trait]
pub trait ChunkStream: Send {
    /// Reads the next chunk, or `None` once the stream has ended.
    async fn read_chunk(&mut self) -> Option<String>;
}

/// Tokenizes one raw simulator chunk into zero or more structured events.
///
/// Kept separate from [`ChunkStream`] because a single chunk commonly carries several events
/// (for example, a full turn's worth of log lines), and because the actual tokenization logic
/// is domain-specific wire parsing this crate never needs to know about.
pub trait EventParser: Send {
    fn parse_chunk(&mut self, chunk: &str) -> Vec<Event>;
}

/// A source of already-structured events, one at a time.
#[async_trait]
pub trait EventStream: Send {
    async fn next_event(&mut self) -> Option<Event>;
}

#[async_trait]
impl EventStream for Box<dyn EventStream + Send> {
    async fn next_event(&mut self) -> Option<Event> {
        (**self).next_event().await
    }
}

/// Combines a [`ChunkStream`] and an [`EventParser`] into an [`EventStream`], buffering any
/// extra events a single chunk produced until they are drained.
pub struct ParsingEventStream<R, P> {
    reader: R,
    parser: P,
    buffered: VecDeque<Event>,
}

impl<R, P> ParsingEventStream<R, P> {
    pub fn new(reader: R, parser: P) -> Self {
        Self {
            reader,
            parser,
            buffered: VecDeque::new(),
        }
    }
}

#[async_trait]
impl<R, P> EventStream for ParsingEventStream<R, P>
where
    R: ChunkStream,
    P: EventParser,
{
    async fn next_event(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.buffered.pop_front() {
                return Some(event);
            }
            let chunk = self.reader.read_chunk().await?;
            self.buffered.extend(self.parser.parse_chunk(&chunk));
        }
    }
}
