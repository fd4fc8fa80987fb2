//! Scripted in-memory transport
//!
//! Replays a fixed sequence of device output and records everything written,
//! so menu sequences can be checked without a board attached. Gaps in the
//! script behave like a silent device: the read waits out its timeout on the
//! Tokio clock, which makes timing behavior testable with paused time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;

use crate::{error::*, Transport};

#[derive(Debug, Clone)]
enum Step {
    Output(Vec<u8>),
    Pending(Vec<u8>),
    Silence,
}

/// Shared handle to the bytes a [`ScriptedTransport`] has sent
#[derive(Debug, Clone, Default)]
pub struct WriteLog {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl WriteLog {
    /// Each `send` call, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    /// Everything sent, concatenated
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.lock().concat()
    }

    /// Number of `send` calls
    pub fn len(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.lock().is_empty()
    }
}

/// Transport that replays scripted device output
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    log: WriteLog,
    connected: bool,
    closed_after_script: bool,
    fail_disconnect: bool,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one chunk of device output
    pub fn output(mut self, data: impl AsRef<[u8]>) -> Self {
        self.script.push_back(Step::Output(data.as_ref().to_vec()));
        self
    }

    /// Queue one `\r\n`-terminated line per entry
    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            let mut data = line.as_ref().as_bytes().to_vec();
            data.extend_from_slice(b"\r\n");
            self.script.push_back(Step::Output(data));
        }
        self
    }

    /// Queue output that is already waiting before the next write
    ///
    /// It is read like any other output unless [`Transport::discard_input`]
    /// drops it first.
    pub fn pending(mut self, data: impl AsRef<[u8]>) -> Self {
        self.script.push_back(Step::Pending(data.as_ref().to_vec()));
        self
    }

    /// Queue one read that times out
    pub fn silence(mut self) -> Self {
        self.script.push_back(Step::Silence);
        self
    }

    /// Report the stream as closed once the script runs out
    pub fn close_after_script(mut self) -> Self {
        self.closed_after_script = true;
        self
    }

    /// Make `disconnect` fail with an I/O error
    pub fn fail_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// Handle for inspecting writes after the transport is moved away
    pub fn write_log(&self) -> WriteLog {
        self.log.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.fail_disconnect {
            return Err(Error::Io(std::io::Error::other("bridge went away")));
        }
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.log.writes.lock().push(data.to_vec());
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        match self.script.pop_front() {
            Some(Step::Output(data) | Step::Pending(data)) => Ok(BytesMut::from(&data[..])),
            Some(Step::Silence) => {
                tokio::time::sleep(timeout).await;
                Err(Error::ReadTimeout)
            }
            None if self.closed_after_script => Err(Error::ConnectionClosed),
            None => {
                tokio::time::sleep(timeout).await;
                Err(Error::ReadTimeout)
            }
        }
    }

    async fn discard_input(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        while let Some(Step::Pending(_)) = self.script.front() {
            self.script.pop_front();
        }
        Ok(())
    }

    fn remote_addr(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_replays_script_then_times_out() {
        let mut transport = ScriptedTransport::new().lines(["ACK"]).silence();
        transport.connect().await.unwrap();

        let first = transport.receive(Duration::from_secs(1)).await.unwrap();
        assert_eq!(&first[..], b"ACK\r\n");

        let start = tokio::time::Instant::now();
        let silent = transport.receive(Duration::from_secs(1)).await;
        assert!(matches!(silent, Err(Error::ReadTimeout)));
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_records_writes() {
        let mut transport = ScriptedTransport::new();
        let log = transport.write_log();
        transport.connect().await.unwrap();

        transport.send(b"7").await.unwrap();
        transport.send(b"value\r\n").await.unwrap();

        assert_eq!(log.writes(), vec![b"7".to_vec(), b"value\r\n".to_vec()]);
        assert_eq!(log.bytes(), b"7value\r\n".to_vec());
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_closed_after_script() {
        let mut transport = ScriptedTransport::new().output(b"x").close_after_script();
        transport.connect().await.unwrap();

        assert!(transport.receive(Duration::from_secs(1)).await.is_ok());
        assert!(matches!(
            transport.receive(Duration::from_secs(1)).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_discard_drops_only_pending_output() {
        let mut transport = ScriptedTransport::new()
            .pending(b"[INFO] boot\r\n")
            .pending(b"stale\r\n")
            .lines(["ACK"]);
        transport.connect().await.unwrap();

        transport.discard_input().await.unwrap();

        let next = transport.receive(Duration::from_secs(1)).await.unwrap();
        assert_eq!(&next[..], b"ACK\r\n");
    }

    #[tokio::test]
    async fn test_pending_output_is_readable_without_discard() {
        let mut transport = ScriptedTransport::new().pending(b"stale\r\n");
        transport.connect().await.unwrap();

        let next = transport.receive(Duration::from_secs(1)).await.unwrap();
        assert_eq!(&next[..], b"stale\r\n");
    }

    #[tokio::test]
    async fn test_fail_disconnect() {
        let mut transport = ScriptedTransport::new().fail_disconnect();
        transport.connect().await.unwrap();

        assert!(matches!(transport.disconnect().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_requires_connect() {
        let mut transport = ScriptedTransport::new();
        assert!(matches!(transport.send(b"0").await, Err(Error::NotConnected)));
    }
}
