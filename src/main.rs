use std::process::ExitCode;
use std::sync::Arc;

use metabox::controller::{Collaborators, ControllerConfig, MetadataBoxController};
use metabox::db;
use metabox::dir_size::LocalDirectorySize;
use metabox::entry::Entry;
use metabox::errors::DomainError;
use metabox::file_type::ExtensionClassifier;
use metabox::formatter::FileMetadataFormatter;
use metabox::metadata::LocalMetadataModel;
use metabox::metadata_box::SharedMetadataBox;
use metabox::quick_view::{QuickView, QuickViewModel};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use tracing::{info, warn};

fn init_logging() {
    static GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    let base = db::data_dir().unwrap_or_else(|_| std::env::temp_dir().join("metabox"));
    let log_dir = base.join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log dir {:?}: {}", log_dir, e);
        return;
    }
    let file_appender = tracing_appender::rolling::never(&log_dir, "metabox.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = GUARD.set(guard);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(non_blocking);
    if let Err(e) = subscriber.try_init() {
        eprintln!("Failed to init tracing subscriber: {e}");
    }
    info!(log_dir = %log_dir.display(), "logging initialized");
}

/// Settings-backed collaborators; any unreadable setting falls back to its
/// default.
struct Settings {
    conn: Option<Connection>,
    quick_view: QuickView,
    formatter: FileMetadataFormatter,
    metadata_model: LocalMetadataModel,
    config: ControllerConfig,
}

impl Settings {
    fn load() -> Self {
        let conn = match db::open() {
            Ok(conn) => conn,
            Err(error) => {
                warn!(error = %error.describe(), "settings unavailable, using defaults");
                return Self::defaults();
            }
        };
        Self::from_conn(conn)
    }

    fn defaults() -> Self {
        Self {
            conn: None,
            quick_view: QuickView::default(),
            formatter: FileMetadataFormatter::default(),
            metadata_model: LocalMetadataModel::new(),
            config: ControllerConfig::default(),
        }
    }

    fn from_conn(conn: Connection) -> Self {
        let fallback = |what: &str, error: db::DbError| {
            warn!(setting = what, error = %error.describe(), "failed to read setting");
        };
        let quick_view = QuickView::from_settings(&conn).unwrap_or_else(|e| {
            fallback("metadata box toggle", e);
            QuickView::default()
        });
        let formatter = FileMetadataFormatter::from_settings(&conn).unwrap_or_else(|e| {
            fallback("clock", e);
            FileMetadataFormatter::default()
        });
        let metadata_model = LocalMetadataModel::from_settings(&conn).unwrap_or_else(|e| {
            fallback("ffprobe", e);
            LocalMetadataModel::new()
        });
        let config = ControllerConfig::load(&conn).unwrap_or_else(|e| {
            fallback("stale guard", e);
            ControllerConfig::default()
        });
        Self {
            conn: Some(conn),
            quick_view,
            formatter,
            metadata_model,
            config,
        }
    }

    /// Turns the metadata box on and remembers it for later runs.
    fn activate(&self) {
        self.quick_view.set_metadata_box_active(true);
        let Some(conn) = &self.conn else {
            return;
        };
        if let Err(error) = self.quick_view.persist(conn) {
            warn!(error = %error.describe(), "failed to save metadata box toggle");
        }
    }
}

struct Args {
    activate: bool,
    paths: Vec<String>,
}

impl Args {
    fn parse(raw: impl Iterator<Item = String>) -> Option<Self> {
        let mut args = Args {
            activate: false,
            paths: Vec::new(),
        };
        for arg in raw {
            match arg.as_str() {
                "--active" => args.activate = true,
                flag if flag.starts_with("--") => return None,
                _ => args.paths.push(arg),
            }
        }
        (!args.paths.is_empty()).then_some(args)
    }
}

async fn run(args: Args) -> ExitCode {
    let settings = Settings::load();
    if args.activate {
        settings.activate();
    }
    if !settings.quick_view.metadata_box_active() {
        info!("metadata box is off; pass --active to turn it on");
    }
    let widget = SharedMetadataBox::default();
    let selection = Arc::new(QuickViewModel::default());
    let controller = match MetadataBoxController::new(
        Collaborators {
            metadata_model: Arc::new(settings.metadata_model),
            metadata_box: Arc::new(widget.clone()),
            quick_view: Arc::new(settings.quick_view),
            quick_view_model: selection.clone(),
            formatter: Arc::new(settings.formatter),
            classifier: Arc::new(ExtensionClassifier),
            directory_size: Arc::new(LocalDirectorySize),
        },
        settings.config,
    ) {
        Ok(controller) => controller,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let mut status = ExitCode::SUCCESS;
    for path in args.paths {
        let entry = match Entry::from_path(&path) {
            Ok(entry) => entry,
            Err(error) => {
                eprintln!("{path}: {error}");
                status = ExitCode::FAILURE;
                continue;
            }
        };
        selection.set_selected_entry(Some(Arc::new(entry)));
        controller.settle().await;
        match serde_json::to_string_pretty(&widget.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("{path}: {error}");
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}

fn main() -> ExitCode {
    let Some(args) = Args::parse(std::env::args().skip(1)) else {
        eprintln!("usage: metabox [--active] <path>...");
        return ExitCode::from(2);
    };
    init_logging();

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(run(args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn args(raw: &[&str]) -> Option<Args> {
        Args::parse(raw.iter().map(|s| s.to_string()))
    }

    fn uniq_db_path() -> std::path::PathBuf {
        let ts = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_nanos();
        std::env::temp_dir().join(format!("metabox-cli-{ts}.db"))
    }

    #[test]
    fn parses_paths_and_active_flag() {
        let parsed = args(&["--active", "/a", "b"]).unwrap();
        assert!(parsed.activate);
        assert_eq!(parsed.paths, vec!["/a".to_string(), "b".to_string()]);
        assert!(!args(&["/a"]).unwrap().activate);
        assert!(args(&["--active"]).is_none());
        assert!(args(&["--bogus", "/a"]).is_none());
    }

    #[test]
    fn persisted_toggle_is_honoured_and_saved() {
        let path = uniq_db_path();

        let settings = Settings::from_conn(db::open_at(&path).unwrap());
        assert!(!settings.quick_view.metadata_box_active());
        settings.activate();
        drop(settings);

        let settings = Settings::from_conn(db::open_at(&path).unwrap());
        assert!(settings.quick_view.metadata_box_active());
        drop(settings);
        let _ = std::fs::remove_file(&path);
    }
}
