//! Capture a handful of frames to disk
//!
//! Run with: cargo run --example capture_frames [COUNT] [OUT_DIR]
//!
//! Attaches a single viewer (which lazily starts the camera), saves COUNT
//! frames as JPEG files, then stops the session.

use std::path::PathBuf;
use std::sync::Arc;

use mjpeg_rs::{CameraSession, CaptureConfig};

fn print_usage() {
    eprintln!("Usage: capture_frames [COUNT] [OUT_DIR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  COUNT     Number of frames to save (default: 10)");
    eprintln!("  OUT_DIR   Output directory (default: current directory)");
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
                .add_directive("mjpeg_rs=debug".parse()?),
        )
        .init();

    let count: usize = match args.get(1) {
        Some(arg) => match arg.parse() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: COUNT must be a number, got '{}'", arg);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => 10,
    };
    let out_dir = PathBuf::from(args.get(2).map(String::as_str).unwrap_or("."));

    let session = Arc::new(CameraSession::new(CaptureConfig::default()));
    let mut viewer = session.attach()?;

    for i in 0..count {
        let Some(frame) = viewer.recv().await else {
            eprintln!("Capture stream ended early after {} frames", i);
            break;
        };

        let path = out_dir.join(format!("frame-{:04}.jpg", i));
        tokio::fs::write(&path, frame.as_ref()).await?;
        println!("{} ({} bytes)", path.display(), frame.len());
    }

    let stats = session.stats();
    println!(
        "Done: {} frames assembled, {} bytes read, {} dropped on the channel",
        stats.frames, stats.bytes_read, stats.channel_drops
    );

    drop(viewer);
    session.stop();
    Ok(())
}
