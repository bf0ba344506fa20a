use anyhow::{anyhow, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use thumbor_url::constants::SECURITY_KEY_ENV;
use thumbor_url::logging::{init_subscriber, LogFormat};
use thumbor_url::request::split_filters;
use thumbor_url::{Center, CropBox, HAlign, SignerConfig, TransformationRequest, Trim, VAlign};

/// Thumbor URL builder - signs image transformation URLs
#[derive(Parser, Debug)]
#[command(name = "thumbor-url")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Security key (overrides the configuration file and THUMBOR_SECURITY_KEY)
    #[arg(short, long, global = true)]
    key: Option<String>,

    /// Log output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the unsigned canonical path
    UrlFor(RequestArgs),
    /// Print the signed path
    Generate(RequestArgs),
    /// Decrypt a legacy URL segment and print its options as JSON
    Decode { segment: String },
    /// Check the signature of a signed path
    Verify { path: String },
}

#[derive(ClapArgs, Debug)]
struct RequestArgs {
    /// Source image locator
    image: String,

    #[arg(long, allow_hyphen_values = true)]
    width: Option<i32>,

    #[arg(long, allow_hyphen_values = true)]
    height: Option<i32>,

    #[arg(long)]
    original_width: Option<u32>,

    #[arg(long)]
    original_height: Option<u32>,

    /// Focal point as "x,y"
    #[arg(long)]
    center: Option<Center>,

    /// Crop box as "left,top,right,bottom"
    #[arg(long)]
    crop: Option<CropBox>,

    #[arg(long)]
    halign: Option<HAlign>,

    #[arg(long)]
    valign: Option<VAlign>,

    /// "true", "{direction}" or "{direction}:{tolerance}"
    #[arg(long)]
    trim: Option<Trim>,

    /// Filter call, repeatable; colon-joined lists are split
    #[arg(long = "filter")]
    filters: Vec<String>,

    #[arg(long)]
    smart: bool,

    #[arg(long)]
    fit_in: bool,

    #[arg(long)]
    flip: bool,

    #[arg(long)]
    flop: bool,

    #[arg(long)]
    meta: bool,

    /// Use the legacy encrypted format
    #[arg(long)]
    legacy: bool,
}

impl RequestArgs {
    fn into_request(self) -> TransformationRequest {
        TransformationRequest {
            image: self.image,
            width: self.width,
            height: self.height,
            original_width: self.original_width,
            original_height: self.original_height,
            center: self.center,
            crop: self.crop,
            halign: self.halign.unwrap_or_default(),
            valign: self.valign.unwrap_or_default(),
            trim: self.trim,
            filters: self
                .filters
                .iter()
                .flat_map(|filter| split_filters(filter))
                .collect(),
            smart: self.smart,
            fit_in: self.fit_in,
            flip: self.flip,
            flop: self.flop,
            meta: self.meta,
            legacy: self.legacy,
        }
    }
}

fn load_config(path: Option<&Path>, key: Option<String>) -> anyhow::Result<SignerConfig> {
    let mut config = match path {
        Some(path) => SignerConfig::from_file(path)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SignerConfig::new(std::env::var(SECURITY_KEY_ENV).unwrap_or_default()),
    };

    if let Some(key) = key {
        config.security_key = key;
    }

    config.validate().map_err(|e| anyhow!(e))?;

    tracing::info!(
        config_file = ?path,
        server_url = ?config.server_url,
        legacy = config.legacy,
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn run(args: Args) -> anyhow::Result<String> {
    match args.command {
        Command::UrlFor(request) => Ok(thumbor_url::url_for(&request.into_request())?),
        Command::Generate(request) => {
            let config = load_config(args.config.as_deref(), args.key)?;
            let mut request = request.into_request();
            request.legacy |= config.legacy;
            let path = config.crypto_url()?.generate(&request)?;
            Ok(config.absolute_url(&path))
        }
        Command::Decode { segment } => {
            let config = load_config(args.config.as_deref(), args.key)?;
            let descriptor = config.crypto_url()?.decode_legacy(&segment)?;
            Ok(serde_json::to_string_pretty(&descriptor)?)
        }
        Command::Verify { path } => {
            let config = load_config(args.config.as_deref(), args.key)?;
            config.crypto_url()?.validate(&path)?;
            Ok("valid".to_string())
        }
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging subsystem
    if let Err(e) = init_subscriber(args.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
