// Command listener: one connection at a time, one request line per connection,
// fixed response, then close.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::command::CommandChannel;
use crate::config::{REQUEST_BUFFER_SIZE, REQUEST_READ_TIMEOUT};
use crate::messages::Request;

/// Control page served for every non-status request
pub const CONTROL_PAGE: &str = include_str!("../static/index.html");

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out reading request from {peer}")]
    ReadTimeout { peer: SocketAddr },

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Serve one accepted connection
pub async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    commands: &CommandChannel,
) -> Result<(), ServerError> {
    let mut buf = vec![0u8; REQUEST_BUFFER_SIZE];
    let n = timeout(REQUEST_READ_TIMEOUT, stream.read(&mut buf))
        .await
        .map_err(|_| ServerError::ReadTimeout { peer })??;

    let request = String::from_utf8_lossy(&buf[..n]);
    let request_line = request.lines().next().unwrap_or_default();
    info!("Request from {}: {}", peer, request_line);

    let response = commands.handle(Request::parse(request_line));
    stream.write_all(&response.to_bytes(CONTROL_PAGE)?).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Accept and serve connections until `shutdown` reads `true`.
///
/// Per-connection failures are logged; only a shutdown ends the loop.
pub async fn serve(
    listener: TcpListener,
    commands: CommandChannel,
    mut shutdown: watch::Receiver<bool>,
) {
    match listener.local_addr() {
        Ok(addr) => info!("Command listener on http://{}", addr),
        Err(e) => warn!("Command listener address unknown: {}", e),
    }

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if let Err(e) = handle_connection(stream, peer, &commands).await {
                        warn!("Connection from {} failed: {}", peer, e);
                    }
                }
                Err(e) => warn!("Accept failed: {}", e),
            },
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone, nobody can ask us to keep running
                    break;
                }
            }
        }
    }

    info!("Command listener stopped");
}
