//! Subcommand implementations. Each writes its human-readable result to `out`.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use courier_media::{upload_hash, Backend, ImageFormat, MediaPipeline};
use courier_store::{generate_identity, AccountKey, IdentityStore};
use tracing::info;

use crate::config::CourierConfig;

fn pipeline(config: &CourierConfig) -> MediaPipeline {
    MediaPipeline::from_config(config.media.clone())
}

fn store(config: &CourierConfig) -> Result<IdentityStore> {
    IdentityStore::from_config(&config.storage).context("failed to resolve storage root")
}

fn decode_value(value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value.trim())
        .with_context(|| format!("not valid base64: {value}"))
}

pub fn probe(config: &CourierConfig, out: &mut impl Write) -> Result<()> {
    let pipeline = pipeline(config);
    let set = pipeline.capabilities().capabilities();
    for backend in Backend::ALL {
        writeln!(out, "{:<18} {}", backend, set.get(backend))?;
    }
    Ok(())
}

pub fn mime(config: &CourierConfig, path: &Path, out: &mut impl Write) -> Result<()> {
    let mime = pipeline(config).resolve_mime(path)?;
    writeln!(out, "{mime}")?;
    Ok(())
}

pub fn ext(config: &CourierConfig, mime: &str, out: &mut impl Write) -> Result<()> {
    let ext = pipeline(config).mime().extension_for(mime)?;
    writeln!(out, "{ext}")?;
    Ok(())
}

pub fn identity_show(config: &CourierConfig, account: &str, out: &mut impl Write) -> Result<()> {
    let account = AccountKey::new(account)?;
    match store(config)?.read_identity(&account)? {
        Some(identity) => writeln!(out, "{} bytes: {}", identity.len(), STANDARD.encode(identity))?,
        None => writeln!(out, "no identity stored for {account}")?,
    }
    Ok(())
}

/// Provision a random identity, leaving an existing one untouched.
pub fn identity_init(config: &CourierConfig, account: &str, out: &mut impl Write) -> Result<()> {
    let account = AccountKey::new(account)?;
    let store = store(config)?;
    if store.read_identity(&account)?.is_some() {
        writeln!(out, "identity already stored for {account}")?;
        return Ok(());
    }

    let identity = generate_identity();
    store.write_identity(&account, &identity)?;
    info!(%account, "identity provisioned");
    writeln!(out, "{} bytes: {}", identity.len(), STANDARD.encode(identity))?;
    Ok(())
}

pub fn identity_set(
    config: &CourierConfig,
    account: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<()> {
    let account = AccountKey::new(account)?;
    let identity = decode_value(value)?;
    store(config)?.write_identity(&account, &identity)?;
    writeln!(out, "identity stored for {account}")?;
    Ok(())
}

pub fn nonce_show(config: &CourierConfig, account: &str, out: &mut impl Write) -> Result<()> {
    let account = AccountKey::new(account)?;
    match store(config)?.read_nonce(&account)? {
        Some(nonce) => writeln!(out, "{}", STANDARD.encode(nonce))?,
        None => writeln!(out, "no nonce stored for {account}")?,
    }
    Ok(())
}

pub fn nonce_set(
    config: &CourierConfig,
    account: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<()> {
    let account = AccountKey::new(account)?;
    let nonce = decode_value(value)?;
    store(config)?.write_nonce(&account, &nonce)?;
    writeln!(out, "nonce stored for {account}")?;
    Ok(())
}

/// Explicit format, else the output extension, else JPEG.
fn output_format(output: &Path, format: Option<ImageFormat>) -> ImageFormat {
    format
        .or_else(|| {
            output
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| ext.parse().ok())
        })
        .unwrap_or(ImageFormat::Jpeg)
}

pub fn scale(
    config: &CourierConfig,
    input: &Path,
    output: &Path,
    (width, height): (u32, u32),
    format: Option<ImageFormat>,
    out: &mut impl Write,
) -> Result<()> {
    let format = output_format(output, format);
    let scaled = pipeline(config)
        .scale_image(input, output, format, width, height)
        .with_context(|| format!("failed to scale {}", input.display()))?;
    if scaled {
        writeln!(out, "wrote {} ({format})", output.display())?;
    } else {
        writeln!(out, "image backend not available, nothing written")?;
    }
    Ok(())
}

pub fn dimensions(config: &CourierConfig, input: &Path, out: &mut impl Write) -> Result<()> {
    match pipeline(config).image_dimensions(input)? {
        Some((width, height)) => writeln!(out, "{width}x{height}")?,
        None => writeln!(out, "image backend not available")?,
    }
    Ok(())
}

pub fn video_info(config: &CourierConfig, input: &Path, out: &mut impl Write) -> Result<()> {
    match pipeline(config).video_properties(input)? {
        Some(props) => {
            writeln!(out, "width:    {}", props.width)?;
            writeln!(out, "height:   {}", props.height)?;
            writeln!(out, "bitrate:  {}", props.bitrate)?;
            writeln!(out, "duration: {:.3}", props.duration)?;
        }
        None => writeln!(out, "no video properties available for {}", input.display())?,
    }
    Ok(())
}

pub fn preview(
    config: &CourierConfig,
    input: &Path,
    output: &Path,
    out: &mut impl Write,
) -> Result<()> {
    match pipeline(config).preview(input)? {
        Some(jpeg) => {
            fs::write(output, &jpeg)
                .with_context(|| format!("failed to write {}", output.display()))?;
            writeln!(out, "wrote {} bytes to {}", jpeg.len(), output.display())?;
        }
        None => writeln!(out, "no preview produced for {}", input.display())?,
    }
    Ok(())
}

pub fn hash(file: &Path, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", upload_hash(file)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> CourierConfig {
        let mut config = CourierConfig::default();
        config.storage.root = dir.path().join("store").to_string_lossy().into_owned();
        config.media.inspection_tool = "courier-test-no-such-tool".into();
        config.media.mime.system_tables = false;
        config
    }

    fn run<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn identity_init_keeps_existing_identity() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let first = run(|out| identity_init(&config, "+49123", out));
        assert!(first.starts_with("20 bytes: "));
        let shown = run(|out| identity_show(&config, "49123@s.whatsapp.net", out));
        assert_eq!(first, shown);

        let second = run(|out| identity_init(&config, "49123", out));
        assert!(second.contains("already stored"));
        assert_eq!(run(|out| identity_show(&config, "49123", out)), shown);
    }

    #[test]
    fn identity_set_overwrites() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        run(|out| identity_set(&config, "49123", "AQID", out));
        assert_eq!(run(|out| identity_show(&config, "49123", out)), "3 bytes: AQID\n");
    }

    #[test]
    fn identity_set_rejects_bad_base64() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut out = Vec::new();
        assert!(identity_set(&config, "49123", "***", &mut out).is_err());
    }

    #[test]
    fn nonce_show_before_and_after_set() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        assert!(run(|out| nonce_show(&config, "49123", out)).starts_with("no nonce stored"));
        run(|out| nonce_set(&config, "49123", "c2VjcmV0", out));
        assert_eq!(run(|out| nonce_show(&config, "49123", out)), "c2VjcmV0\n");
    }

    #[test]
    fn invalid_account_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut out = Vec::new();
        assert!(identity_show(&config, "../escape", &mut out).is_err());
    }

    #[test]
    fn mime_lookups() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        assert_eq!(run(|out| mime(&config, Path::new("clip.MP4"), out)), "video/mp4\n");
        assert_eq!(run(|out| ext(&config, "image/jpeg", out)), "jpg\n");
    }

    #[test]
    fn output_format_falls_back_to_extension_then_jpeg() {
        assert_eq!(output_format(Path::new("a.png"), None), ImageFormat::Png);
        assert_eq!(output_format(Path::new("a.png"), Some(ImageFormat::Bmp)), ImageFormat::Bmp);
        assert_eq!(output_format(Path::new("a.out"), None), ImageFormat::Jpeg);
    }

    #[test]
    fn preview_of_document_is_a_notice() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let doc = dir.path().join("notes.txt");
        let target = dir.path().join("preview.jpg");
        fs::write(&doc, "hello").unwrap();

        let printed = run(|out| preview(&config, &doc, &target, out));
        assert!(printed.starts_with("no preview produced"));
        assert!(!target.exists());
    }

    #[test]
    fn hash_prints_digest() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("abc");
        fs::write(&file, "abc").unwrap();
        assert_eq!(
            run(|out| hash(&file, out)),
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=\n"
        );
    }
}
