// Keyboard teleop: 1-5 speed presets, 0/space stop, S status, Q quit
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Send speed commands to a running monorail runtime")]
struct Args {
    /// Address of the runtime's command listener
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    info!("Target: {}", args.addr);
    info!("Controls: 1-5=speed preset, 0/space=stop, s=status, q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&args.addr).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        if kind != KeyEventKind::Press {
            continue;
        }

        let path = match code {
            KeyCode::Char(c @ '1'..='5') => format!("/Motor/on{}", c),
            KeyCode::Char('0') | KeyCode::Char(' ') => "/Motor/off".to_string(),
            KeyCode::Char('s') => "/status".to_string(),
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => continue,
        };

        match send(addr, &path).await {
            Ok(reply) => info!("{} -> {}", path, reply),
            Err(e) => warn!("{} failed: {}", path, e),
        }
    }

    Ok(())
}

/// Issue one request and return the status line (or JSON body for /status)
async fn send(addr: &str, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", path, addr);
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;

    let status_line = response.lines().next().unwrap_or_default().to_string();
    if path == "/status" {
        Ok(response
            .split("\r\n\r\n")
            .nth(1)
            .unwrap_or(status_line.as_str())
            .to_string())
    } else {
        Ok(status_line)
    }
}
