// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the camera screen
//!
//! This module provides command-line functionality for:
//! - Decoding QR codes in image files
//! - Capturing and saving a single photo
//! - Running the interactive camera screen against an image-backed feed

use qrcam::app::frame_processor::{CodeClass, QrDetector};
use qrcam::app::{CameraSession, NotificationLevel, SessionCommand, SessionEvent};
use qrcam::backends::camera::still_image::load_image_frame;
use qrcam::backends::camera::StillImageFeed;
use qrcam::config::Config;
use qrcam::errors::AppResult;
use qrcam::permissions::{PermissionGate, StaticPermission};
use qrcam::pipelines::photo::{CaptureController, PersistenceWriter};
use qrcam::storage::{FolderPicker, LocalDirectoryAccess};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Config from an explicit file, or the default location with fallback
pub fn load_config(path: Option<&Path>) -> AppResult<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Ok(Config::load()),
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn picker_for(root: Option<PathBuf>) -> FolderPicker {
    root.map(FolderPicker::Fixed)
        .unwrap_or_else(FolderPicker::native)
}

/// Print every QR code found in the given images
pub fn scan_images(images: &[PathBuf]) -> CliResult {
    runtime()?.block_on(scan(images))
}

async fn scan(images: &[PathBuf]) -> CliResult {
    let detector = QrDetector::new();
    let mut found = 0usize;

    for path in images {
        let frame = match load_image_frame(path).await {
            Ok(frame) => frame,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                continue;
            }
        };

        let payloads = detector.detect(Arc::new(frame)).await;
        if payloads.is_empty() {
            println!("{}: no QR code found", path.display());
        }
        for payload in payloads {
            let class = match CodeClass::classify(&payload) {
                CodeClass::Url(_) => "url",
                CodeClass::Plain => "text",
            };
            println!("{}: [{}] {}", path.display(), class, payload);
            found += 1;
        }
    }

    println!("{} code(s) found in {} image(s)", found, images.len());
    Ok(())
}

/// Capture one photo from `source` and save it
pub fn capture_photo(config: &Config, source: PathBuf, root: Option<PathBuf>) -> CliResult {
    runtime()?.block_on(capture(config, source, root))
}

async fn capture(config: &Config, source: PathBuf, root: Option<PathBuf>) -> CliResult {
    let mut feed = StillImageFeed::from_path(source.clone()).with_facing(config.default_facing);
    let mut controller = CaptureController::new(config.capture_cache_dir())
        .with_preview_divisor(config.preview_divisor);
    let writer =
        PersistenceWriter::new(LocalDirectoryAccess, picker_for(root)).with_config(config);

    println!("Capturing from {}...", source.display());
    let image = controller.capture(&mut feed).await?;
    if let Some(preview) = controller.preview() {
        println!(
            "Captured {}x{} (preview {}x{})",
            image.width, image.height, preview.width, preview.height
        );
    }

    let saved = writer.persist(image).await?;
    println!("Photo saved: {} ({} bytes)", saved.path().display(), saved.byte_len);
    Ok(())
}

/// Run the camera screen until `quit` or end of input
pub fn run_session(config: &Config, source: PathBuf, root: Option<PathBuf>) -> CliResult {
    runtime()?.block_on(run(config, source, root))
}

async fn run(config: &Config, source: PathBuf, root: Option<PathBuf>) -> CliResult {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let feed = StillImageFeed::from_path(source);
    let writer =
        PersistenceWriter::new(LocalDirectoryAccess, picker_for(root)).with_config(config);
    let session = CameraSession::new(feed, writer, config, event_tx);

    // An image file needs no camera permission
    let mut gate = PermissionGate::new(StaticPermission::granted());
    gate.refresh().await;

    println!("Commands: shot, flip, dismiss, open, scan on|off, quit");
    std::thread::spawn(move || read_commands(command_tx));

    let (result, ()) = tokio::join!(session.run(&gate, command_rx), print_events(event_rx));
    result?;
    Ok(())
}

fn read_commands(commands: mpsc::UnboundedSender<SessionCommand>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let command = match line.trim() {
            "" => continue,
            "shot" | "s" => SessionCommand::Capture,
            "flip" | "f" => SessionCommand::ToggleFacing,
            "dismiss" | "d" => SessionCommand::DismissPreview,
            "open" | "o" => SessionCommand::OpenCode,
            "scan on" => SessionCommand::SetScanning(true),
            "scan off" => SessionCommand::SetScanning(false),
            "quit" | "q" => SessionCommand::Quit,
            other => {
                eprintln!("Unknown command: {}", other);
                continue;
            }
        };
        let quit = command == SessionCommand::Quit;
        if commands.send(command).is_err() || quit {
            break;
        }
    }
}

async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::CodeDetected(code) => match code.url() {
                Some(url) => println!("QR link: {} (type 'open' to visit)", url),
                None => println!("QR text: {}", code.payload),
            },
            SessionEvent::CodeCleared => println!("QR code cleared"),
            SessionEvent::PreviewShown { width, height } => {
                println!("Preview {}x{} (type 'dismiss' to close)", width, height)
            }
            SessionEvent::PreviewDismissed => println!("Preview closed"),
            SessionEvent::FacingChanged(facing) => println!("Using {} camera", facing),
            SessionEvent::Notification(note) => match note.level {
                NotificationLevel::Info => println!("{}", note.message),
                NotificationLevel::Error => eprintln!("{}", note.message),
            },
        }
    }
}
