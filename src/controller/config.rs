use rusqlite::Connection;
use tracing::warn;

use crate::db::{self, DbResult};

pub const STALE_GUARD_KEY: &str = "staleGuard";

/// Which asynchronous completions re-check the selection before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StaleGuard {
    /// Only the directory-size result is checked; general, MIME and media
    /// results may land after the selection moved on.
    #[default]
    DirectorySizeOnly,
    /// Every completion must belong to the latest cycle and selection.
    AllBranches,
}

impl StaleGuard {
    pub fn as_setting_str(self) -> &'static str {
        match self {
            Self::DirectorySizeOnly => "directorySize",
            Self::AllBranches => "allBranches",
        }
    }

    pub fn from_setting_str(raw: &str) -> Option<Self> {
        match raw.trim() {
            "directorySize" => Some(Self::DirectorySizeOnly),
            "allBranches" => Some(Self::AllBranches),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerConfig {
    pub stale_guard: StaleGuard,
}

impl ControllerConfig {
    pub fn load(conn: &Connection) -> DbResult<Self> {
        let stale_guard = match db::get_setting_string(conn, STALE_GUARD_KEY)? {
            Some(raw) => StaleGuard::from_setting_str(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown stale guard setting, using default");
                StaleGuard::default()
            }),
            None => StaleGuard::default(),
        };
        Ok(Self { stale_guard })
    }

    pub fn store(&self, conn: &Connection) -> DbResult<()> {
        db::set_setting_string(conn, STALE_GUARD_KEY, self.stale_guard.as_setting_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::uniq_db_path;

    #[test]
    fn defaults_when_unset_or_unknown() {
        let path = uniq_db_path("config");
        let conn = db::open_at(&path).unwrap();
        assert_eq!(ControllerConfig::load(&conn).unwrap(), ControllerConfig::default());

        db::set_setting_string(&conn, STALE_GUARD_KEY, "sometimes").unwrap();
        assert_eq!(
            ControllerConfig::load(&conn).unwrap().stale_guard,
            StaleGuard::DirectorySizeOnly
        );

        ControllerConfig {
            stale_guard: StaleGuard::AllBranches,
        }
        .store(&conn)
        .unwrap();
        assert_eq!(
            ControllerConfig::load(&conn).unwrap().stale_guard,
            StaleGuard::AllBranches
        );

        drop(conn);
        let _ = std::fs::remove_file(&path);
    }
}
