//! # sponsor-server
//!
//! Stream server for the card-game sponsor protocol.
//!
//! This crate provides:
//! - `Session`, the per-stream lifecycle state machine
//! - `EngineRegistry` for routing game types to engines
//! - Length-prefixed framing and the TCP transport
//! - `SponsorServer`, which runs one session task per connection

pub mod config;
pub mod registry;
pub mod session;
pub mod transport;

pub use config::{ResumePolicy, ServerConfig};
pub use registry::EngineRegistry;
pub use session::{Lifecycle, Session, SessionId, run_session};

use sponsor_core::{GameEngine, Result, SponsorError};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Card-game sponsor server
pub struct SponsorServer {
    /// Engine shared by every session (sessions never share environments)
    engine: Arc<dyn GameEngine>,
    config: ServerConfig,
    next_session: AtomicU64,
}

impl SponsorServer {
    /// Create a new server with the given engine
    pub fn new(engine: impl GameEngine, config: ServerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
            next_session: AtomicU64::new(1),
        }
    }

    /// Create a fresh session bound to this server's engine
    fn session(&self) -> Session {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        Session::new(id, self.engine.clone(), self.config.resume_policy)
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind(self.config.addr).await.map_err(|e| {
            SponsorError::Transport(format!("Failed to bind {}: {}", self.config.addr, e))
        })
    }

    /// Accept connections on `listener` until `shutdown` completes.
    ///
    /// Each connection gets its own task and session. Sessions already
    /// running are left to finish on their own.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        info!(
            "Sponsor server listening on {} (resume policy: {})",
            local.map_or_else(|| "?".to_string(), |a| a.to_string()),
            self.config.resume_policy
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Sponsor server shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    let session = self.session();
                    let id = session.id();
                    info!("Session {} opened by {}", id, peer);
                    let (reader, writer) = transport::tcp::split(stream, self.config.max_frame_len);
                    tokio::spawn(async move {
                        match run_session(session, reader, writer).await {
                            Ok(()) => debug!("Session {} ended", id),
                            Err(e) => error!("Session {} terminated: {}", id, e),
                        }
                    });
                }
            }
        }
    }
}
