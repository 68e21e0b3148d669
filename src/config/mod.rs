use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, fmt, EnvFilter, Registry};

pub mod settings;
pub mod validation;

pub use settings::{AddGroupConfig, PlatformConfig, ServerConfig, Settings};
pub use validation::{validate_configuration, ConfigurationValidator};

const DEFAULT_LEVEL: &str = "info";

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directive for the crate at `level`, keeping dependencies quiet
pub fn level_directive(level: &str) -> String {
    format!("soar_actions={},reqwest=warn,hyper=warn,tokio=warn", level.trim().to_lowercase())
}

/// Initialize logging system with structured output and environment-based level filtering
///
/// `RUST_LOG` wins; otherwise `SOAR_ACTIONS_LOG_LEVEL` sets the crate level until
/// [`apply_log_level`] installs the configured one.
/// Output goes to stderr so it never mixes with stdio JSON-RPC framing.
pub fn init_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            std::env::var("SOAR_ACTIONS_LOG_LEVEL")
                .map_err(anyhow::Error::from)
                .and_then(|level| Ok(EnvFilter::try_new(level_directive(&level))?))
        })
        .unwrap_or_else(|_| EnvFilter::new(level_directive(DEFAULT_LEVEL)));

    let (filter, handle) = reload::Layer::new(env_filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_names(false)
                .with_file(true)
                .with_line_number(true)
                .with_level(true)
                .compact(),
        )
        .try_init()?;

    let _ = FILTER_HANDLE.set(handle);
    tracing::info!("Structured logging initialized");
    Ok(())
}

/// Switch the crate's log level to the one from loaded settings.
///
/// `RUST_LOG` keeps precedence. Returns `false` when nothing was changed,
/// either because `RUST_LOG` is set or [`init_logging`] never ran.
pub fn apply_log_level(level: &str) -> anyhow::Result<bool> {
    let filter = EnvFilter::try_new(level_directive(level))?;

    if std::env::var_os("RUST_LOG").is_some() {
        return Ok(false);
    }

    match FILTER_HANDLE.get() {
        Some(handle) => {
            handle.reload(filter)?;
            tracing::debug!("Log level set to {}", level);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Initialize logging for testing with reduced verbosity
pub fn init_test_logging() -> anyhow::Result<()> {
    let env_filter = EnvFilter::new("soar_actions=debug");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_test_writer().compact())
        .try_init()
        .or_else(|_| Ok(())) // Ignore if already initialized
}

/// Log structured events with consistent formatting
#[macro_export]
macro_rules! log_event {
    (incident = $incident_id:expr, $level:ident, $($field:tt)*) => {
        tracing::$level!(
            incident_id = %$incident_id,
            $($field)*
        );
    };
    (event = $event_id:expr, $level:ident, $($field:tt)*) => {
        tracing::$level!(
            event_id = %$event_id,
            $($field)*
        );
    };
}
