//! fletchkit - load an arrow model, apply options, print the cart message.
//!
//! Usage:
//!   fletchkit [--settings FILE] [--asset PATH|URL] [--variant ID]
//!             [--config FILE] [--set field=value]... [--pick control=swatch]...
//!             [--config-out FILE]
//!   fletchkit --list-options [--settings FILE]
//!   fletchkit --relay URL [--out FILE]
//!
//! Examples:
//!   fletchkit --asset assets/arrow.glb --set fletch=4 --pick nock=Pink
//!   fletchkit --relay https://cdn.example/arrow.glb --out arrow.glb

use fletchkit::app::{LoadOutcome, Session, SessionError};
use fletchkit::assets::cache::AssetCache;
use fletchkit::assets::{AssetLoader, AssetSource};
use fletchkit::config::serialization::{self, SerializationError};
use fletchkit::config::{ConfigError, ConfigOption, Configuration};
use fletchkit::relay::{self, UreqFetcher};
use fletchkit::scene::binder::BindError;
use fletchkit::settings::{SettingsError, ViewerSettings};
use fletchkit::ui::{ControlPanel, UiError};

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Control(#[from] UiError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("relay answered {status}: {message}")]
    Relay { status: u16, message: String },
}

#[derive(Default)]
struct Args {
    settings: Option<PathBuf>,
    asset: Option<String>,
    variant: Option<String>,
    config: Option<PathBuf>,
    config_out: Option<PathBuf>,
    sets: Vec<String>,
    picks: Vec<String>,
    list_options: bool,
    relay: Option<String>,
    out: Option<PathBuf>,
}

impl Args {
    fn parse(raw: impl IntoIterator<Item = String>) -> Result<Self, CliError> {
        let mut args = Args::default();
        let mut iter = raw.into_iter();
        while let Some(flag) = iter.next() {
            let mut value = || iter.next().ok_or_else(|| CliError::MissingValue(flag.clone()));
            match flag.as_str() {
                "--settings" => args.settings = Some(PathBuf::from(value()?)),
                "--asset" => args.asset = Some(value()?),
                "--variant" => args.variant = Some(value()?),
                "--config" => args.config = Some(PathBuf::from(value()?)),
                "--config-out" => args.config_out = Some(PathBuf::from(value()?)),
                "--set" => args.sets.push(value()?),
                "--pick" => args.picks.push(value()?),
                "--relay" => args.relay = Some(value()?),
                "--out" => args.out = Some(PathBuf::from(value()?)),
                "--list-options" => args.list_options = true,
                other => return Err(CliError::UnknownArgument(other.to_string())),
            }
        }
        Ok(args)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match Args::parse(std::env::args().skip(1)).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut settings = ViewerSettings::load_or_default(args.settings.as_deref())?;
    if let Some(variant) = &args.variant {
        settings.variant_id = variant.clone();
    }
    let panel = ControlPanel::new(settings.palette.clone());

    if args.list_options {
        print!("{}", panel.option_listing());
        return Ok(());
    }
    if let Some(url) = &args.relay {
        return run_relay(url, args.out.as_ref());
    }

    let initial = match &args.config {
        Some(path) => serialization::import_configuration(path)?,
        None => Configuration::default(),
    };
    let source = AssetSource::parse(args.asset.as_deref().unwrap_or(&settings.asset_url));
    let fetcher = UreqFetcher::new();
    let loader = AssetLoader::new(&fetcher).with_cache(AssetCache::new(&settings.cache_dir));
    let mut session = Session::new(settings, initial);

    for set in &args.sets {
        session.apply_option(set.parse::<ConfigOption>()?)?;
    }
    for pick in &args.picks {
        session.apply_option(panel.pick_str(pick)?)?;
    }

    log::info!("Loading {}", source.display_name());
    let ticket = session.begin_load();
    let result = loader.load(&source);
    if let LoadOutcome::Discarded = session.finish_load(ticket, result)? {
        log::warn!("Load was superseded before it finished");
    }
    session.tick(Instant::now());

    println!("{}", panel.summary(&session.configuration(), session.last_report()));
    if let Some(camera) = session.camera() {
        println!(
            "camera eye ({:.3}, {:.3}, {:.3}) target ({:.3}, {:.3}, {:.3}) near {:.4} far {:.1}",
            camera.eye.x,
            camera.eye.y,
            camera.eye.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.near,
            camera.far
        );
    }
    println!("{}", session.cart_envelope().to_json()?);

    if let Some(path) = &args.config_out {
        serialization::export_configuration(&session.configuration(), path)?;
        log::info!("Configuration exported to {}", path.display());
    }
    Ok(())
}

fn run_relay(url: &str, out: Option<&PathBuf>) -> Result<(), CliError> {
    let response = relay::handle(Some(url), &UreqFetcher::new());
    if !response.is_ok() {
        return Err(CliError::Relay {
            status: response.status,
            message: String::from_utf8_lossy(&response.body).into_owned(),
        });
    }
    let content_type = response.header("Content-Type").unwrap_or(relay::DEFAULT_CONTENT_TYPE);
    match out {
        Some(path) => {
            std::fs::write(path, &response.body).map_err(|source| CliError::Write {
                path: path.display().to_string(),
                source,
            })?;
            println!("{} bytes ({content_type}) -> {}", response.body.len(), path.display());
        }
        None => println!("{} bytes ({content_type})", response.body.len()),
    }
    Ok(())
}
