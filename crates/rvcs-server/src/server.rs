use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn, Instrument};

use rvcs_core::SessionId;
use rvcs_store::{Database, RepositoryRepo};
use rvcs_vcs::{CommandRunner, ProcessRunner};

use crate::error::ServerError;
use crate::rpc::{self, Response};
use crate::session::{Session, SessionContext};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    /// Candidate ports, tried in order. `0` lets the OS pick.
    pub ports: Vec<u16>,
    /// Default repository path for `use` without a path.
    pub repo_root: PathBuf,
    /// Longest accepted request line, in bytes.
    pub max_line_bytes: usize,
    /// Per-invocation limit for VCS tools. `None` waits indefinitely.
    pub command_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            ports: vec![9091, 9092, 9093],
            repo_root: PathBuf::from("."),
            max_line_bytes: 64 * 1024,
            command_timeout: Some(rvcs_vcs::runner::DEFAULT_TIMEOUT),
        }
    }
}

/// Connected clients, keyed by session.
#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<SessionId, SocketAddr>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: SessionId, peer: SocketAddr) {
        self.clients.insert(id, peer);
    }

    pub fn unregister(&self, id: &SessionId) {
        self.clients.remove(id);
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }
}

/// Handle returned by `start()`. Dropping it leaves the server running;
/// call [`ServerHandle::shutdown`] to stop accepting.
pub struct ServerHandle {
    pub port: u16,
    pub addr: SocketAddr,
    clients: Arc<ClientRegistry>,
    accept: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn connected_clients(&self) -> usize {
        self.clients.count()
    }

    pub fn shutdown(self) {
        self.accept.abort();
    }
}

/// Bind the first free candidate port and start accepting clients.
pub async fn start(config: ServerConfig, db: Database) -> Result<ServerHandle, ServerError> {
    let runner: Arc<dyn CommandRunner> = Arc::new(match config.command_timeout {
        Some(timeout) => ProcessRunner::with_timeout(timeout),
        None => ProcessRunner::without_timeout(),
    });
    start_with_runner(config, db, runner).await
}

/// Like [`start`], with the tool runner supplied by the caller.
pub async fn start_with_runner(
    config: ServerConfig,
    db: Database,
    runner: Arc<dyn CommandRunner>,
) -> Result<ServerHandle, ServerError> {
    let registry = RepositoryRepo::new(db);
    let managed = registry.count()?;

    let listener = bind_first_free(&config.host, &config.ports).await?;
    let addr = listener.local_addr()?;
    info!(%addr, managed, repo_root = %config.repo_root.display(), "rvcs server started");

    let ctx = SessionContext {
        registry,
        runner,
        repo_root: config.repo_root.clone(),
    };
    let clients = Arc::new(ClientRegistry::new());

    let accept = tokio::spawn(accept_loop(
        listener,
        ctx,
        Arc::clone(&clients),
        config.max_line_bytes,
    ));

    Ok(ServerHandle {
        port: addr.port(),
        addr,
        clients,
        accept,
    })
}

async fn bind_first_free(host: &str, ports: &[u16]) -> Result<TcpListener, ServerError> {
    for &port in ports {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(host, port, error = %e, "port unavailable"),
        }
    }
    Err(ServerError::NoFreePort {
        host: host.to_string(),
        ports: ports.to_vec(),
    })
}

async fn accept_loop(
    listener: TcpListener,
    ctx: SessionContext,
    clients: Arc<ClientRegistry>,
    max_line_bytes: usize,
) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };

        let session = Session::new(ctx.clone());
        let id = session.id().clone();
        clients.register(id.clone(), peer);

        let clients = Arc::clone(&clients);
        let span = tracing::info_span!("session", session_id = %id, %peer);
        tokio::spawn(
            async move {
                info!("client connected");
                if let Err(e) = handle_client(stream, session, max_line_bytes).await {
                    warn!(error = %e, "connection error");
                }
                clients.unregister(&id);
                info!("client disconnected");
            }
            .instrument(span),
        );
    }
}

/// Serve one connection until the client quits or the transport goes away.
async fn handle_client(
    stream: TcpStream,
    mut session: Session,
    max_line_bytes: usize,
) -> Result<(), LinesCodecError> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(max_line_bytes));
    send(&mut framed, &Response::greeting()).await?;

    while let Some(line) = framed.next().await {
        let line = match line {
            Ok(line) => line,
            // The framed stream ends after a decode error, so this closes.
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!(max_line_bytes, "request line too long");
                send(&mut framed, &Response::parse_error("line too long")).await?;
                break;
            }
            Err(e) => return Err(e),
        };

        let request = match rpc::parse_line(&line) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(response) => {
                send(&mut framed, &response).await?;
                continue;
            }
        };

        debug!(verb = %request.verb, "request");
        let outcome = session.handle(&request.verb, &request.args()).await;
        send(&mut framed, &Response::from_reply(request.id, outcome.reply)).await?;

        if outcome.close {
            break;
        }
    }
    Ok(())
}

async fn send(
    framed: &mut Framed<TcpStream, LinesCodec>,
    response: &Response,
) -> Result<(), LinesCodecError> {
    let json = serde_json::to_string(response)
        .map_err(|e| LinesCodecError::Io(std::io::Error::other(e)))?;
    framed.send(json).await
}
