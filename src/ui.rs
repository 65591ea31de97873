// UI layer: one handler per command. Each handler builds what it needs,
// runs a single transfer behind a spinner and reports the outcome.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::TransferClient;
use crate::cli::{Cli, Command, ConnectionArgs};
use crate::config::{ConfigFile, Settings, DEFAULT_BASE_URL};

const CLIP_FRAME: &str = "------------";

/// Dispatch the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        cmd, connection, ..
    } = cli;

    match cmd {
        None | Some(Command::Help) => {
            Cli::print_help()?;
            Ok(())
        }
        Some(Command::Configure) => handle_configure(&config_path(&connection)),
        Some(Command::Put { path }) => handle_put(&client_from(&connection)?, &path),
        Some(Command::Putclip { text }) => handle_putclip(&client_from(&connection)?, &text),
        Some(Command::Get { name, new_name }) => handle_get(
            &client_from(&connection)?,
            name.as_deref().unwrap_or_default(),
            new_name.as_deref(),
        ),
        Some(Command::Getclip) => handle_getclip(&client_from(&connection)?),
    }
}

fn config_path(connection: &ConnectionArgs) -> PathBuf {
    connection
        .config
        .clone()
        .unwrap_or_else(ConfigFile::default_path)
}

fn client_from(connection: &ConnectionArgs) -> Result<TransferClient> {
    let file = ConfigFile::load(&config_path(connection))?;
    let settings = Settings::resolve(
        connection.base_url.clone(),
        connection.upload_key.clone(),
        file,
    )?;
    let client = TransferClient::new(settings)?;
    log::debug!("using {}", client.settings().base_url());
    Ok(client)
}

fn handle_put(client: &TransferClient, path: &Path) -> Result<()> {
    let upload = with_spinner("Uploading...", || client.upload(path))
        .context("error occurred uploading the specified file")?;
    log::debug!("sent {} bytes", upload.bytes);
    println!("INFO: file [{}] has been successfully uploaded.", path.display());
    Ok(())
}

fn handle_putclip(client: &TransferClient, text: &str) -> Result<()> {
    with_spinner("Uploading clip...", || client.upload_clip(text))
        .context("error occurred uploading the specified clip")?;
    println!("INFO: your clip has been successfully uploaded.");
    Ok(())
}

fn handle_get(client: &TransferClient, name: &str, new_name: Option<&str>) -> Result<()> {
    let download = with_spinner("Downloading...", || client.download(name, new_name))
        .context("error occurred downloading the file")?;
    println!(
        "INFO: wrote {} bytes of file {} to the local disk",
        download.bytes,
        download.path.display()
    );
    Ok(())
}

fn handle_getclip(client: &TransferClient) -> Result<()> {
    let clip = with_spinner("Downloading clip...", || client.download_clip())
        .context("error occurred downloading a clip")?;
    if clip.is_empty() {
        println!("INFO: Your clip is empty or blank.");
        return Ok(());
    }
    println!("{CLIP_FRAME}");
    if clip.ends_with('\n') {
        print!("{clip}");
    } else {
        println!("{clip}");
    }
    println!("{CLIP_FRAME}");
    Ok(())
}

/// Prompt for the base URL and upload key and persist them.
fn handle_configure(path: &Path) -> Result<()> {
    let current = ConfigFile::load(path)?;

    let base_url: String = Input::new()
        .with_prompt("Base URL")
        .default(
            current
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )
        .interact_text()?;
    // `Password` hides the key as it is typed.
    let upload_key: String = Password::new()
        .with_prompt("Upload key")
        .allow_empty_password(current.upload_key.is_some())
        .interact()?;

    let cfg = ConfigFile {
        base_url: Some(base_url),
        upload_key: match upload_key.is_empty() {
            true => current.upload_key,
            false => Some(upload_key),
        },
    };
    // Validate before writing so a typo doesn't land on disk.
    Settings::new(
        cfg.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        cfg.upload_key.clone().unwrap_or_default(),
    )?;
    cfg.persist(path)?;
    println!("INFO: settings saved to {}", path.display());
    Ok(())
}

/// Run `f` while a spinner ticks on stderr. The spinner hides itself when
/// stderr is not a terminal.
fn with_spinner<T>(msg: &'static str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}
