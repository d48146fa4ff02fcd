use std::path::{
    Path,
    PathBuf,
};

use anyhow::{
    Context,
    Result,
};
use tokio::{
    fs::File,
    io::AsyncWriteExt,
    sync::Mutex,
};

enum Sink {
    Buffering(Vec<String>),
    Realized {
        path: PathBuf,
        file: File,
    },
}

/// A battle log sink that only pays for I/O once something actually asks to see the log.
///
/// Lines are buffered in memory until [`DeferredLogSink::ensure`] is called, at which point the
/// buffer is flushed to a concrete file and all subsequent writes go straight to it. If `ensure`
/// is never called, the buffer is simply dropped.
pub struct DeferredLogSink {
    sink: Mutex<Sink>,
}

impl DeferredLogSink {
    /// Creates a new sink that buffers in memory.
    pub fn new() -> Self {
        Self {
            sink: Mutex::new(Sink::Buffering(Vec::new())),
        }
    }

    /// Appends a line to the log.
    pub async fn write_line<S>(&self, line: S) -> Result<()>
    where
        S: Into<String>,
    {
        let line = line.into();
        let mut sink = self.sink.lock().await;
        match &mut *sink {
            Sink::Buffering(buffer) => {
                buffer.push(line);
                Ok(())
            }
            Sink::Realized { file, .. } => {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
                Ok(())
            }
        }
    }

    /// Realizes the buffer to a concrete file, returning its path.
    ///
    /// If a realized file already exists, this is a no-op and returns the existing path. If
    /// `path` is `None`, a unique path is derived from `template` (treated as a filename
    /// prefix).
    pub async fn ensure(&self, path: Option<PathBuf>, template: &str) -> Result<PathBuf> {
        let mut sink = self.sink.lock().await;
        if let Sink::Realized { path, .. } = &*sink {
            return Ok(path.clone());
        }

        let path = path.unwrap_or_else(|| Self::unique_path(template));
        let mut file = File::create(&path)
            .await
            .with_context(|| format!("failed to create log file at {}", path.display()))?;

        if let Sink::Buffering(buffer) = &*sink {
            for line in buffer {
                file.write_all(line.as_bytes()).await?;
                file.write_all(b"\n").await?;
            }
        }
        file.flush().await?;

        *sink = Sink::Realized {
            path: path.clone(),
            file,
        };
        Ok(path)
    }

    /// The realized path, if [`Self::ensure`] has been called.
    pub async fn realized_path(&self) -> Option<PathBuf> {
        match &*self.sink.lock().await {
            Sink::Realized { path, .. } => Some(path.clone()),
            Sink::Buffering(_) => None,
        }
    }

    /// Flushes a realized file, or discards the buffer if never realized.
    pub async fn finish(self) -> Result<()> {
        if let Sink::Realized { mut file, .. } = self.sink.into_inner() {
            file.flush().await?;
        }
        Ok(())
    }

    fn unique_path(template: &str) -> PathBuf {
        let unique = uuid::Uuid::new_v4();
        Path::new(&format!("{template}-{unique}.log")).to_owned()
    }
}

impl Default for DeferredLogSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod deferred_log_sink_test {
    use super::DeferredLogSink;

    #[tokio::test]
    async fn buffers_until_ensured() {
        let sink = DeferredLogSink::new();
        sink.write_line("line one").await.unwrap();
        sink.write_line("line two").await.unwrap();
        assert!(sink.realized_path().await.is_none());

        let dir = tempdir();
        let path = dir.join("battle.log");
        let realized = sink.ensure(Some(path.clone()), "unused").await.unwrap();
        assert_eq!(realized, path);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "line one\nline two\n");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let sink = DeferredLogSink::new();
        let dir = tempdir();
        let path = dir.join("idempotent.log");
        let first = sink.ensure(Some(path.clone()), "unused").await.unwrap();
        sink.write_line("after ensure").await.unwrap();
        let second = sink.ensure(Some(path.clone()), "unused").await.unwrap();
        assert_eq!(first, second);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "after ensure\n");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn never_ensured_discards_buffer() {
        let sink = DeferredLogSink::new();
        sink.write_line("never written").await.unwrap();
        sink.finish().await.unwrap();
    }

    fn tempdir() -> std::path::PathBuf {
        std::env::temp_dir()
    }
}
