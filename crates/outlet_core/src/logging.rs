//! Router log bootstrap.
//!
//! # Responsibility
//! - Start the size-rotated file log once per process.
//! - Map router subsystems to log targets so each one can be tuned on its
//!   own, e.g. `info,reuse=debug` while chasing a cache problem.
//! - Keep diagnostics metadata-only: outlet paths, component type names and
//!   handle ids, never route params or data.
//!
//! # Invariants
//! - Re-initializing with the same directory and levels is a no-op; any other
//!   combination is rejected.
//! - Initialization never panics.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "outlet";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    levels: LogLevels,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Router areas with their own log target.
///
/// `name` is the value written in the `module=` field of every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subsystem {
    Router,
    Reconcile,
    Reuse,
    Component,
    Outlet,
}

impl Subsystem {
    pub const ALL: [Subsystem; 5] = [
        Self::Router,
        Self::Reconcile,
        Self::Reuse,
        Self::Component,
        Self::Outlet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Reconcile => "reconcile",
            Self::Reuse => "reuse",
            Self::Component => "component",
            Self::Outlet => "outlet",
        }
    }

    /// Module path prefix the `log` macros use as target.
    pub fn target(self) -> &'static str {
        match self {
            Self::Router => "outlet_core::router",
            Self::Reconcile => "outlet_core::reconcile",
            Self::Reuse => "outlet_core::reuse",
            Self::Component => "outlet_core::component",
            Self::Outlet => "outlet_core::outlet",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|subsystem| subsystem.name() == name)
    }
}

/// Log level setup errors.
#[derive(Debug)]
pub enum LoggingError {
    /// Level is not one of off|error|warn|info|debug|trace.
    InvalidLevel(String),
    /// Override names a subsystem that does not exist.
    UnknownSubsystem(String),
    /// Directory is empty or relative.
    InvalidDirectory(String),
    CreateDirectory {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Logging already runs with different levels or directory.
    AlreadyInitialized { active: String, requested: String },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected off|error|warn|info|debug|trace"
            ),
            Self::UnknownSubsystem(name) => write!(
                f,
                "unknown log subsystem `{name}`; expected router|reconcile|reuse|component|outlet"
            ),
            Self::InvalidDirectory(detail) => write!(f, "invalid log directory: {detail}"),
            Self::CreateDirectory { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "logging already initialized as `{active}`; refusing to switch to `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Default level plus per-subsystem overrides.
///
/// Written as `default[,subsystem=level]*`, for example `warn,reconcile=debug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLevels {
    default: LevelFilter,
    overrides: BTreeMap<Subsystem, LevelFilter>,
}

impl LogLevels {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    /// Parses `default[,subsystem=level]*`; names are case-insensitive.
    ///
    /// # Errors
    /// - `InvalidLevel` for an empty spec, a second default or an unknown level.
    /// - `UnknownSubsystem` for an override outside `Subsystem::ALL`.
    pub fn parse(spec: &str) -> Result<Self, LoggingError> {
        let mut default = None;
        let mut overrides = BTreeMap::new();
        for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                Some((name, level)) => {
                    let name = name.trim().to_ascii_lowercase();
                    let subsystem = Subsystem::from_name(&name)
                        .ok_or(LoggingError::UnknownSubsystem(name))?;
                    overrides.insert(subsystem, parse_level(level)?);
                }
                None if default.is_none() => default = Some(parse_level(part)?),
                None => return Err(LoggingError::InvalidLevel(spec.trim().to_string())),
            }
        }
        let default = default.ok_or_else(|| LoggingError::InvalidLevel(spec.trim().to_string()))?;
        Ok(Self { default, overrides })
    }

    pub fn with_override(mut self, subsystem: Subsystem, level: LevelFilter) -> Self {
        self.overrides.insert(subsystem, level);
        self
    }

    pub fn default_level(&self) -> LevelFilter {
        self.default
    }

    /// Effective level for one subsystem.
    pub fn level_for(&self, subsystem: Subsystem) -> LevelFilter {
        self.overrides
            .get(&subsystem)
            .copied()
            .unwrap_or(self.default)
    }

    fn specification(&self) -> LogSpecification {
        let mut builder = LogSpecification::builder();
        builder.default(self.default);
        for (subsystem, level) in &self.overrides {
            builder.module(subsystem.target(), *level);
        }
        builder.build()
    }
}

impl Display for LogLevels {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", level_name(self.default))?;
        for (subsystem, level) in &self.overrides {
            write!(f, ",{}={}", subsystem.name(), level_name(*level))?;
        }
        Ok(())
    }
}

/// Starts file logging under `log_dir` with `levels` (see `LogLevels::parse`).
///
/// # Errors
/// - Level spec errors from `LogLevels::parse`.
/// - `InvalidDirectory` when `log_dir` is empty or relative.
/// - `CreateDirectory` / `Backend` when the file logger cannot start.
/// - `AlreadyInitialized` when logging runs with another setup.
pub fn init_logging(levels: &str, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let levels = LogLevels::parse(levels)?;
    let log_dir = normalize_log_dir(log_dir.as_ref())?;

    if let Some(state) = LOGGING_STATE.get() {
        return state.ensure_matches(&levels, &log_dir);
    }

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, LoggingError> {
        std::fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
            dir: log_dir.clone(),
            source,
        })?;

        let logger = Logger::with(levels.specification())
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir.as_path())
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(LoggingError::Backend)?;

        install_panic_hook_once();
        info!(
            "event=logging_init module=logging status=ok levels={} log_dir={} version={}",
            levels,
            log_dir.display(),
            env!("CARGO_PKG_VERSION")
        );

        Ok(LoggingState {
            levels: levels.clone(),
            log_dir: log_dir.clone(),
            _logger: logger,
        })
    })?;

    // Another thread may have won the race with a different setup.
    state.ensure_matches(&levels, &log_dir)
}

/// Level used when a config does not name one: `debug` in debug builds,
/// `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

impl LoggingState {
    fn ensure_matches(&self, levels: &LogLevels, log_dir: &Path) -> Result<(), LoggingError> {
        if self.levels == *levels && self.log_dir == log_dir {
            return Ok(());
        }
        Err(LoggingError::AlreadyInitialized {
            active: format!("{} at {}", self.levels, self.log_dir.display()),
            requested: format!("{} at {}", levels, log_dir.display()),
        })
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| LoggingError::InvalidLevel(level.trim().to_string()))
}

fn level_name(level: LevelFilter) -> String {
    level.to_string().to_ascii_lowercase()
}

fn normalize_log_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    let raw = log_dir.to_string_lossy();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::InvalidDirectory("path is empty".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{trimmed}` is not absolute"
        )));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may echo route params; strip newlines and cap length.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            panic_payload_summary(panic_info)
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
