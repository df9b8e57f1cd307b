//! Classification server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 0.0.0.0:8000, ./model_max_state.pth, auto device
//! oar-cls-serve
//!
//! # Safetensors weights on the second GPU, from a config file
//! oar-cls-serve --config serve.json --weights model.safetensors --device cuda:1
//! ```

use clap::Parser;
use oar_cls_serve::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "oar-cls-serve")]
#[command(about = "HTTP image classification with a ResNet-50 + LSTM model")]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "CLASSIFY_HOST")]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long, env = "CLASSIFY_PORT")]
    port: Option<u16>,

    /// Path to the model weights (.safetensors, .pth or .pt)
    #[arg(short, long, env = "CLASSIFY_WEIGHTS")]
    weights: Option<PathBuf>,

    /// Device to run on: auto, cpu, cuda, or cuda:N
    #[arg(short, long, env = "CLASSIFY_DEVICE")]
    device: Option<DeviceSpec>,

    /// Per-request timeout in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,

    /// Maximum request body size in bytes
    #[arg(long)]
    max_body_bytes: Option<usize>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_path(path)?,
            None => ServerConfig::default(),
        };
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(weights) = self.weights {
            config.weights_path = weights;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(bytes) = self.max_body_bytes {
            config.max_body_bytes = bytes;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = args.into_config()?;
    info!(
        weights = %config.weights_path.display(),
        device = %config.device,
        "starting classification server"
    );

    let model = match ResNetLstmBuilder::new()
        .config(config.model.clone())
        .device(config.device)
        .build(&config.weights_path)
    {
        Ok(model) => model,
        Err(e) => {
            error!("failed to load model: {}", e.detailed_message());
            return Err(e.into());
        }
    };

    startup(config, Arc::new(model)).await
}
