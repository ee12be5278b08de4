//! Engine process bridge
//!
//! Every environment is its own child process, so sessions never share
//! engine state. The child speaks the line protocol in `protocol.rs` on its
//! stdin/stdout and logs to the inherited stderr.

use crate::protocol::{EngineReply, EngineRequest, decode_line, encode_line};
use async_trait::async_trait;
use sponsor_core::{Environment, GameEngine, Result, SponsorError, Transition};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Configuration for spawning engine processes
#[derive(Debug, Clone)]
pub struct ProcessEngineConfig {
    /// Executable to run (default: sponsor-engine)
    pub command: String,
    /// Arguments passed to every engine process
    pub args: Vec<String>,
    /// How long a closed engine may take to exit before it is killed
    pub shutdown_grace: Duration,
}

impl Default for ProcessEngineConfig {
    fn default() -> Self {
        Self {
            command: "sponsor-engine".into(),
            args: vec![],
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

/// Game engine that spawns one process per environment
pub struct ProcessEngine {
    config: ProcessEngineConfig,
}

impl ProcessEngine {
    /// Create an engine that spawns processes as `config` describes
    pub fn with_config(config: ProcessEngineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl GameEngine for ProcessEngine {
    async fn create(&self, game_type: &str) -> Result<Box<dyn Environment>> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SponsorError::Engine(format!(
                    "Failed to spawn {}: {}",
                    self.config.command, e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SponsorError::Engine("Engine stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SponsorError::Engine("Engine stdout unavailable".into()))?;
        debug!("Spawned engine process {:?} for {}", child.id(), game_type);

        let mut env = ProcessEnvironment::from_io(BufReader::new(stdout), stdin);
        env.child = Some(child);
        env.shutdown_grace = self.config.shutdown_grace;

        let make = EngineRequest::Make {
            game_type: game_type.to_string(),
        };
        let failure = match env.exchange(&make).await {
            Ok(EngineReply::Ready) => {
                info!("Engine ready for {}", game_type);
                return Ok(Box::new(env));
            }
            Ok(EngineReply::Error { message }) => {
                warn!("Engine refused {}: {}", game_type, message);
                SponsorError::UnknownGameType(game_type.to_string())
            }
            Ok(other) => unexpected("Ready", &other),
            Err(e) => {
                warn!("Engine failed to start {}: {}", game_type, e);
                e
            }
        };
        env.shutdown().await.ok();
        Err(failure)
    }
}

/// Environment served over a line-oriented byte stream
pub struct ProcessEnvironment {
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    child: Option<Child>,
    shutdown_grace: Duration,
    closed: bool,
}

impl ProcessEnvironment {
    /// Talk to an engine over arbitrary streams (no child process to manage)
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
            shutdown_grace: ProcessEngineConfig::default().shutdown_grace,
            closed: false,
        }
    }

    async fn send(&mut self, request: &EngineRequest) -> Result<()> {
        if self.closed {
            return Err(SponsorError::Engine("Engine already closed".into()));
        }
        let line = encode_line(request)?;
        debug!("[Sponsor→Engine] {}", line.trim_end());
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SponsorError::Engine(format!("Failed to write to engine: {}", e)))?;
        self.writer
            .flush()
            .await
            .map_err(|e| SponsorError::Engine(format!("Failed to flush engine input: {}", e)))
    }

    /// Send a request and wait for its reply. `Error` replies become `Err`.
    async fn request(&mut self, request: &EngineRequest) -> Result<EngineReply> {
        match self.exchange(request).await? {
            EngineReply::Error { message } => Err(SponsorError::Engine(message)),
            reply => Ok(reply),
        }
    }

    /// Send a request and read back whatever the engine replied
    async fn exchange(&mut self, request: &EngineRequest) -> Result<EngineReply> {
        self.send(request).await?;

        let mut line = String::new();
        let bytes_read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| SponsorError::Engine(format!("Failed to read from engine: {}", e)))?;
        if bytes_read == 0 {
            return Err(SponsorError::Engine("Engine closed its output".into()));
        }

        let preview: String = line.trim_end().chars().take(200).collect();
        debug!("[Engine→Sponsor] len={} json={}", line.len(), preview);

        decode_line(&line)
            .map_err(|e| SponsorError::Protocol(format!("Undecodable engine reply: {}", e)))
    }

    async fn transition(&mut self, request: EngineRequest) -> Result<Transition> {
        match self.request(&request).await? {
            EngineReply::Transition {
                state,
                active_player,
            } => Ok(Transition {
                state: state.into(),
                active_player,
            }),
            other => Err(unexpected("Transition", &other)),
        }
    }
}

#[async_trait]
impl Environment for ProcessEnvironment {
    async fn reset(&mut self) -> Result<Transition> {
        self.transition(EngineRequest::Reset).await
    }

    async fn step(&mut self, action: i64) -> Result<Transition> {
        self.transition(EngineRequest::Step { action }).await
    }

    async fn is_over(&mut self) -> Result<bool> {
        match self.request(&EngineRequest::IsOver).await? {
            EngineReply::Over { is_over } => Ok(is_over),
            other => Err(unexpected("Over", &other)),
        }
    }

    async fn payoffs(&mut self) -> Result<Vec<f64>> {
        match self.request(&EngineRequest::GetPayoffs).await? {
            EngineReply::Payoffs { payoffs } => Ok(payoffs),
            other => Err(unexpected("Payoffs", &other)),
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        // The engine may already be gone; closing is best effort
        if let Err(e) = self.send(&EngineRequest::Close).await {
            debug!("Close not delivered: {}", e);
        }
        self.closed = true;

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
                Ok(Ok(status)) => debug!("Engine process exited: {}", status),
                Ok(Err(e)) => warn!("Failed to wait for engine process: {}", e),
                Err(_) => {
                    warn!("Engine process ignored Close, killing it");
                    child
                        .kill()
                        .await
                        .map_err(|e| SponsorError::Engine(format!("Failed to kill engine: {}", e)))?;
                }
            }
        }
        Ok(())
    }
}

fn unexpected(expected: &str, got: &EngineReply) -> SponsorError {
    SponsorError::Protocol(format!("Expected {} reply, got {:?}", expected, got))
}
