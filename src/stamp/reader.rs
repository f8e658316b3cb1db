use crossbeam::channel::{self, Receiver, Sender};
use std::fs;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::error::StampResult;
use crate::stamp::controller::RequestId;

pub enum ReadCommand {
    Read { request: RequestId, path: PathBuf },
    Stop,
}

pub struct ReadOutcome {
    pub request: RequestId,
    pub result: StampResult<Vec<u8>>,
}

/// Reads selected images off the UI thread.
///
/// Every outcome carries the id of the request that produced it so the
/// controller can drop results from superseded selections.
pub struct ImageReader {
    tx_cmd: Sender<ReadCommand>,
    rx_result: Receiver<ReadOutcome>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ImageReader {
    pub fn new() -> Self {
        let (tx_cmd, rx_cmd) = channel::unbounded::<ReadCommand>();
        let (tx_result, rx_result) = channel::bounded::<ReadOutcome>(4);

        let thread_handle = thread::spawn(move || {
            reader_thread(rx_cmd, tx_result);
        });

        Self {
            tx_cmd,
            rx_result,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn read(&self, request: RequestId, path: PathBuf) {
        let _ = self.tx_cmd.send(ReadCommand::Read { request, path });
    }

    pub fn try_recv(&self) -> Option<ReadOutcome> {
        self.rx_result.try_recv().ok()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<ReadOutcome> {
        self.rx_result.recv_timeout(timeout).ok()
    }

    pub fn stop(&self) {
        let _ = self.tx_cmd.send(ReadCommand::Stop);
    }
}

impl Drop for ImageReader {
    fn drop(&mut self) {
        let _ = self.tx_cmd.send(ReadCommand::Stop);
        // Disconnect results so a worker parked on a full channel wakes up.
        self.rx_result = channel::never();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn reader_thread(rx_cmd: Receiver<ReadCommand>, tx_result: Sender<ReadOutcome>) {
    loop {
        let cmd = match rx_cmd.recv() {
            Ok(c) => c,
            Err(_) => return,
        };

        match cmd {
            ReadCommand::Read { request, path } => {
                let result = fs::read(&path).map_err(Into::into);
                debug!(?request, path = %path.display(), ok = result.is_ok(), "image read finished");
                if tx_result.send(ReadOutcome { request, result }).is_err() {
                    return;
                }
            }
            ReadCommand::Stop => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn delivers_bytes_tagged_with_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let reader = ImageReader::new();
        reader.read(RequestId(7), path);

        let outcome = reader.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.request, RequestId(7));
        assert_eq!(outcome.result.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();

        let reader = ImageReader::new();
        reader.read(RequestId(1), dir.path().join("missing.png"));

        let outcome = reader.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.request, RequestId(1));
        assert!(outcome.result.is_err());
    }

    #[test]
    fn stop_ends_worker() {
        let reader = ImageReader::new();
        reader.stop();
        drop(reader);
    }
}
