//! MPS demonstration binary.
//!
//! A thin harness over `mps_core`: opens a real `TcpStream`, runs either
//! the initiator or the responder role to completion, and exchanges one
//! text message. It carries no protocol logic of its own, everything
//! interesting lives in `mps-core`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mps_core::config::Config;
use mps_core::transport::TcpTransport;
use mps_core::Session;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use tracing::{error, info};

/// MPS (Message Protocol Secure) demonstration node.
#[derive(Parser)]
#[command(name = "mps-node")]
#[command(about = "Initiator/responder demonstration harness for the MPS protocol engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Negotiated frame size in bytes (the `package_max_size` option).
    #[arg(long, default_value_t = 1000, global = true)]
    frame_size: u32,

    /// RSA modulus size in bits.
    #[arg(long, default_value_t = 512, global = true)]
    key_size: u32,

    /// Protocol tag placed as the first field of every header.
    #[arg(long, default_value = "mps", global = true)]
    proto_name: String,

    /// Persist the local RSA keypair at this path instead of
    /// generating a fresh one every run.
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for one connection, run the responder handshake, then
    /// print whatever text the initiator sends.
    Listen {
        /// Address to bind, e.g. 127.0.0.1:9000.
        addr: SocketAddr,

        /// Pin the first peer key seen at this path (trust-on-first-use).
        #[arg(long)]
        pub_file: Option<PathBuf>,
    },
    /// Connect to a listening responder, run the initiator handshake,
    /// then send one text message.
    Connect {
        /// Address to dial, e.g. 127.0.0.1:9000.
        addr: SocketAddr,

        /// Text to send once the handshake completes.
        message: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = Config::default()
        .with_frame_size(cli.frame_size)
        .with_key_size(cli.key_size)
        .with_proto_name(cli.proto_name.clone());
    if let Some(path) = &cli.key_file {
        cfg = cfg.with_const_key(path.to_string_lossy().into_owned());
    }

    match cli.command {
        Commands::Listen { addr, pub_file } => listen(cfg, addr, pub_file),
        Commands::Connect { addr, message } => connect(cfg, addr, &message),
    }
}

fn listen(cfg: Config, addr: SocketAddr, pub_file: Option<PathBuf>) -> Result<()> {
    let cfg = match pub_file {
        Some(path) => cfg.with_save_pub(path.to_string_lossy().into_owned()),
        None => cfg,
    };

    let listener = TcpListener::bind(addr).with_context(|| format!("binding {addr}"))?;
    info!("mps-node responder listening on {addr}");

    for incoming in listener.incoming() {
        let stream = incoming.context("accepting connection")?;
        let peer = stream.peer_addr().ok();
        let cfg = cfg.clone();

        thread::spawn(move || {
            if let Err(err) = handle_responder(stream, &cfg) {
                error!(?peer, %err, "responder connection failed");
            }
        });
    }

    Ok(())
}

fn handle_responder(stream: TcpStream, cfg: &Config) -> Result<()> {
    let transport = TcpTransport::new(stream);
    let mut session = Session::accept(transport, cfg)?;
    info!(
        frame_size = session.params().frame_size,
        key_size = session.params().key_size,
        "handshake complete, awaiting message"
    );

    let text = session.recv(true)?;
    info!(%text, "received message");
    session.close();
    Ok(())
}

fn connect(cfg: Config, addr: SocketAddr, message: &str) -> Result<()> {
    let stream = TcpStream::connect(addr).with_context(|| format!("connecting to {addr}"))?;
    let transport = TcpTransport::new(stream);

    let mut session = Session::connect(transport, &cfg)?;
    info!(
        frame_size = session.params().frame_size,
        key_size = session.params().key_size,
        "handshake complete, sending message"
    );

    session.send(message, true)?;
    info!("message sent");
    session.close();
    Ok(())
}
