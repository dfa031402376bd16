//! Minimal MJPEG feed server
//!
//! Run with: cargo run --example serve_feed [BIND_ADDR] [--v4l2 [DEVICE]]
//!
//! Examples:
//!   cargo run --example serve_feed                      # rpicam, 0.0.0.0:9000
//!   cargo run --example serve_feed localhost:8080       # rpicam, custom bind
//!   cargo run --example serve_feed --v4l2 /dev/video1   # USB webcam via ffmpeg
//!
//! Open http://<host>:<port>/ in a browser to watch the stream. Capture
//! starts when the first viewer connects and stops on its own a few seconds
//! after the last one disconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use mjpeg_rs::{transport, CameraSession, CaptureConfig, FramingMode, NoLight, V4l2Backend};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:9000
/// - "localhost:8080" -> 127.0.0.1:8080
/// - "0.0.0.0:9000" -> 0.0.0.0:9000
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 9000;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: serve_feed [BIND_ADDR] [--v4l2 [DEVICE]]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:9000)");
    eprintln!("  --v4l2       Capture from a V4L2 device via ffmpeg instead of rpicam-vid");
    eprintln!("  DEVICE       V4L2 device path (default: /dev/video0)");
}

async fn serve_viewer(session: Arc<CameraSession>, mut socket: TcpStream) -> std::io::Result<()> {
    // Swallow the request head; every path serves the feed.
    let mut head = [0u8; 1024];
    let _ = socket.read(&mut head).await?;

    socket
        .write_all(
            format!(
                "HTTP/1.1 200 OK\r\n\
                 Cache-Control: no-cache\r\n\
                 Connection: keep-alive\r\n\
                 Content-Type: {}\r\n\r\n",
                transport::content_type(transport::BOUNDARY)
            )
            .as_bytes(),
        )
        .await?;

    // The subscription detaches on drop, on every exit path out of here.
    let mut viewer = session
        .attach()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    while let Some(frame) = viewer.recv().await {
        transport::write_part(&mut socket, transport::BOUNDARY, &frame).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mjpeg_rs=debug".parse()?)
                .add_directive("serve_feed=debug".parse()?),
        )
        .init();

    let mut bind_addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
    let mut use_v4l2 = false;
    let mut device = "/dev/video0".to_string();

    let mut rest = args[1..].iter();
    while let Some(arg) = rest.next() {
        if arg == "--v4l2" {
            use_v4l2 = true;
            if let Some(d) = rest.next() {
                device = d.clone();
            }
        } else {
            bind_addr = match parse_bind_addr(arg) {
                Ok(addr) => addr,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    eprintln!();
                    print_usage();
                    std::process::exit(1);
                }
            };
        }
    }

    let session = if use_v4l2 {
        let config = CaptureConfig::default().framing(FramingMode::Multipart);
        Arc::new(CameraSession::with_parts(
            config,
            Box::new(V4l2Backend::new(device)),
            Arc::new(NoLight),
        ))
    } else {
        Arc::new(CameraSession::new(CaptureConfig::default()))
    };

    let listener = TcpListener::bind(bind_addr).await?;
    println!("Serving MJPEG feed on http://{}/", bind_addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer_addr) = accepted?;
                tracing::debug!(peer = %peer_addr, "New viewer connection");

                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    if let Err(e) = serve_viewer(session, socket).await {
                        tracing::debug!(peer = %peer_addr, error = %e, "Viewer connection closed");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                session.stop();
                break;
            }
        }
    }

    Ok(())
}
