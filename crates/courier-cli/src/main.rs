use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use courier_media::ImageFormat;
use tracing::debug;

mod commands;
mod config;

use config::CourierConfig;

#[derive(Parser)]
#[command(name = "courier", about = "Courier media previews and credential storage")]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Credential storage root, overrides config
    #[arg(long, global = true)]
    storage_root: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the optional media backends and print the outcome of each
    Probe,

    /// Print the MIME type for a file name
    Mime { path: PathBuf },

    /// Print the preferred extension for a MIME type
    Ext { mime: String },

    /// Inspect or provision an account's identity
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Inspect or replace an account's nonce
    Nonce {
        #[command(subcommand)]
        action: NonceAction,
    },

    /// Scale an image into a bounding box
    Scale {
        input: PathBuf,
        output: PathBuf,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// jpeg, png or bmp; defaults to the output extension, then jpeg
        #[arg(long)]
        format: Option<ImageFormat>,
    },

    /// Print the pixel size of an image
    Dimensions { input: PathBuf },

    /// Print width, height, bitrate and duration of a video
    VideoInfo { input: PathBuf },

    /// Write a JPEG preview of an image or video
    Preview { input: PathBuf, output: PathBuf },

    /// Print the upload hash (base64 SHA-256) of a file
    Hash { file: PathBuf },
}

#[derive(Subcommand)]
enum IdentityAction {
    /// Print the stored identity as base64
    Show { account: String },

    /// Store a fresh random identity unless one exists
    Init { account: String },

    /// Overwrite the identity with a base64 value
    Set { account: String, value: String },
}

#[derive(Subcommand)]
enum NonceAction {
    /// Print the stored nonce as base64
    Show { account: String },

    /// Overwrite the nonce with a base64 value
    Set { account: String, value: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "courier=debug" } else { "courier=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => CourierConfig::load(path)?,
        None => CourierConfig::default(),
    };

    // CLI overrides
    if let Some(root) = args.storage_root {
        config.storage.root = root;
    }
    debug!(storage_root = %config.storage.root, "configuration loaded");

    let mut out = io::stdout().lock();
    match args.command {
        Command::Probe => commands::probe(&config, &mut out),
        Command::Mime { path } => commands::mime(&config, &path, &mut out),
        Command::Ext { mime } => commands::ext(&config, &mime, &mut out),
        Command::Identity { action } => match action {
            IdentityAction::Show { account } => commands::identity_show(&config, &account, &mut out),
            IdentityAction::Init { account } => commands::identity_init(&config, &account, &mut out),
            IdentityAction::Set { account, value } => {
                commands::identity_set(&config, &account, &value, &mut out)
            }
        },
        Command::Nonce { action } => match action {
            NonceAction::Show { account } => commands::nonce_show(&config, &account, &mut out),
            NonceAction::Set { account, value } => {
                commands::nonce_set(&config, &account, &value, &mut out)
            }
        },
        Command::Scale {
            input,
            output,
            width,
            height,
            format,
        } => commands::scale(&config, &input, &output, (width, height), format, &mut out),
        Command::Dimensions { input } => commands::dimensions(&config, &input, &mut out),
        Command::VideoInfo { input } => commands::video_info(&config, &input, &mut out),
        Command::Preview { input, output } => commands::preview(&config, &input, &output, &mut out),
        Command::Hash { file } => commands::hash(&file, &mut out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "courier",
            "identity",
            "show",
            "+491234",
            "--storage-root",
            "/tmp/store",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.storage_root.as_deref(), Some("/tmp/store"));
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Identity {
                action: IdentityAction::Show { .. }
            }
        ));
    }

    #[test]
    fn scale_parses_format() {
        let args = Args::try_parse_from([
            "courier", "scale", "in.png", "out.bmp", "--width", "10", "--height", "20", "--format",
            "bmp",
        ])
        .unwrap();
        match args.command {
            Command::Scale {
                width,
                height,
                format,
                ..
            } => {
                assert_eq!((width, height), (10, 20));
                assert_eq!(format, Some(ImageFormat::Bmp));
            }
            _ => panic!("expected scale"),
        }
    }

    #[test]
    fn scale_rejects_unknown_format() {
        assert!(Args::try_parse_from([
            "courier", "scale", "a", "b", "--width", "1", "--height", "1", "--format", "tga",
        ])
        .is_err());
    }
}
