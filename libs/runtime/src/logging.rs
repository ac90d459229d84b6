use crate::config::{LoggingConfig, Section};
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{level_filters::LevelFilter, Level, Metadata};
use tracing_subscriber::{filter::filter_fn, fmt, layer::SubscriberExt, prelude::*, Registry};

const DEFAULT_SECTION: &str = "default";

// -------- level helpers --------

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_crate_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Value of the most specific section whose prefix covers `target`.
fn longest_match<'a, T: 'a>(
    sections: impl Iterator<Item = (&'a String, &'a T)>,
    target: &str,
) -> Option<&'a T> {
    sections
        .filter(|(prefix, _)| matches_crate_prefix(target, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, value)| value)
}

/// Resolved per-target maximum levels for one sink (console or file).
/// Explicit sections win over the "default" section and the longest matching
/// prefix wins among them; `None` means off.
#[derive(Clone, Debug, Default)]
struct LevelTable {
    by_prefix: Vec<(String, Option<Level>)>,
    default: Option<Level>,
}

impl LevelTable {
    fn level_for(&self, target: &str) -> Option<Level> {
        longest_match(self.by_prefix.iter().map(|(p, l)| (p, l)), target)
            .map_or(self.default, |level| *level)
    }

    fn enabled(&self, meta: &Metadata<'_>) -> bool {
        self.level_for(meta.target())
            .is_some_and(|max| meta.level() <= &max)
    }
}

fn console_levels(cfg: &LoggingConfig) -> LevelTable {
    let mut table = LevelTable::default();
    for (name, section) in cfg {
        let level = parse_tracing_level(&section.console_level);
        if name == DEFAULT_SECTION {
            table.default = level;
        } else {
            table.by_prefix.push((name.clone(), level));
        }
    }
    table
}

/// File levels only apply to sections that actually configure a file.
fn file_levels(cfg: &LoggingConfig) -> LevelTable {
    let mut table = LevelTable::default();
    for (name, section) in cfg {
        let level = if section.file.trim().is_empty() {
            None
        } else {
            parse_tracing_level(&section.file_level)
        };
        if name == DEFAULT_SECTION {
            table.default = level;
        } else {
            table.by_prefix.push((name.clone(), level));
        }
    }
    table
}

// -------- rotating writer for files --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

/// Writer that drops records whose target has no file sink.
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

/// Route log records to different files by target prefix.
struct MultiFileRouter {
    default: Option<RotWriter>,
    by_prefix: HashMap<String, RotWriter>,
}

impl MultiFileRouter {
    fn resolve_for(&self, target: &str) -> Option<RotWriter> {
        longest_match(self.by_prefix.iter(), target)
            .cloned()
            .or_else(|| self.default.clone())
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for MultiFileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve_for(meta.target()))
    }
}

// -------- path resolution helpers --------

/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer(section: &Section, log_path: &Path) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let file_limit = match (section.max_backups, section.max_age_days) {
        (Some(n), _) => FileLimit::MaxFiles(n),
        (None, Some(days)) => FileLimit::Age(chrono::Duration::days(i64::from(days))),
        (None, None) => FileLimit::MaxFiles(3),
    };

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(file_limit),
        ContentLimit::BytesSurpassed(usize::try_from(max_bytes).unwrap_or(usize::MAX)),
        Compression::None,
        #[cfg(unix)]
        None,
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn build_file_router(cfg: &LoggingConfig, base_dir: &Path) -> MultiFileRouter {
    let mut router = MultiFileRouter {
        default: None,
        by_prefix: HashMap::new(),
    };

    for (name, section) in cfg {
        if section.file.trim().is_empty() {
            continue;
        }
        let log_path = resolve_log_path(&section.file, base_dir);
        match create_rotating_writer(section, &log_path) {
            Ok(writer) if name == DEFAULT_SECTION => router.default = Some(writer),
            Ok(writer) => {
                router.by_prefix.insert(name.clone(), writer);
            }
            Err(e) => {
                // The subscriber is not installed yet, so stderr is the only channel.
                eprintln!(
                    "Failed to init log file for '{}': {} ({})",
                    name,
                    log_path.display(),
                    e
                );
            }
        }
    }

    router
}

// -------- public init --------

/// Initialize the global subscriber from configuration.
/// - `cfg`: logging sections keyed by target prefix ("default" is the catch-all)
/// - `base_dir`: base directory for relative log file paths (usually server.home_dir)
///
/// Console output is human-readable; files receive JSON lines.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_default_logging();
        return;
    }

    let console = console_levels(cfg);
    let console_layer = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(filter_fn(move |meta: &Metadata<'_>| console.enabled(meta)));

    let router = build_file_router(cfg, base_dir);
    let file_layer = if router.is_empty() {
        None
    } else {
        let files = file_levels(cfg);
        Some(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(router)
                .with_filter(filter_fn(move |meta: &Metadata<'_>| files.enabled(meta))),
        )
    };

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

fn init_default_logging() {
    let _ = fmt()
        .with_target(true)
        .with_max_level(LevelFilter::INFO)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .try_init();
}

// =================== tests ===================
