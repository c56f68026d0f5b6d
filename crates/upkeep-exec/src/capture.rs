//! Output capture for child process streams.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::warn;

/// Drains one child stream on a background task.
///
/// Bytes land in a shared buffer as they arrive, so whatever was read
/// before the reader is stopped is still available.
pub(crate) struct OutputCapture {
    buf: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl OutputCapture {
    pub(crate) fn spawn<R>(stream: Option<R>, label: &'static str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let reader = stream.map(|mut stream| {
            let buf = Arc::clone(&buf);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match stream.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => buf
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .extend_from_slice(&chunk[..n]),
                        Err(e) => {
                            warn!(stream = label, error = %e, "Error reading task output");
                            break;
                        }
                    }
                }
            })
        });
        Self { buf, reader }
    }

    /// Wait until the stream reaches EOF.
    ///
    /// Safe to call again after being cancelled mid-way.
    pub(crate) async fn closed(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            let _ = reader.await;
            self.reader = None;
        }
    }

    /// Stop reading and return what was captured.
    pub(crate) fn finish(self) -> String {
        if let Some(reader) = &self.reader {
            reader.abort();
        }
        let bytes = std::mem::take(&mut *self.buf.lock().unwrap_or_else(|e| e.into_inner()));
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
