use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a fetch request may use the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Read cursors, fetch what is newer, persist, advance cursors
    #[default]
    Default,
    /// Always call the source, never persist
    NoCache,
    /// Never call the source, return whatever is cached
    CacheOnly,
    /// Fetch everything from the beginning of time, persist, overwrite cursors
    FullSave,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid cache mode: {0}")]
pub struct InvalidModeError(pub String);

impl CacheMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheMode::Default => "default",
            CacheMode::NoCache => "no_cache",
            CacheMode::CacheOnly => "cache_only",
            CacheMode::FullSave => "full_save",
        }
    }

    /// Whether fetched items are written to the store
    pub fn persists(&self) -> bool {
        matches!(self, CacheMode::Default | CacheMode::FullSave)
    }

    /// Whether the source may be called at all
    pub fn calls_source(&self) -> bool {
        !matches!(self, CacheMode::CacheOnly)
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "default" | "0" => Ok(CacheMode::Default),
            "no_cache" | "1" => Ok(CacheMode::NoCache),
            "cache_only" | "2" => Ok(CacheMode::CacheOnly),
            "full_save" | "3" => Ok(CacheMode::FullSave),
            _ => Err(InvalidModeError(s.to_string())),
        }
    }
}

/// Legacy numeric codes used by older configuration files
impl TryFrom<i64> for CacheMode {
    type Error = InvalidModeError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(CacheMode::Default),
            1 => Ok(CacheMode::NoCache),
            2 => Ok(CacheMode::CacheOnly),
            3 => Ok(CacheMode::FullSave),
            other => Err(InvalidModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("default".parse::<CacheMode>().unwrap(), CacheMode::Default);
        assert_eq!("no_cache".parse::<CacheMode>().unwrap(), CacheMode::NoCache);
        assert_eq!("Cache-Only".parse::<CacheMode>().unwrap(), CacheMode::CacheOnly);
        assert_eq!("full_save".parse::<CacheMode>().unwrap(), CacheMode::FullSave);
    }

    #[test]
    fn test_parse_legacy_codes() {
        assert_eq!("2".parse::<CacheMode>().unwrap(), CacheMode::CacheOnly);
        assert_eq!(CacheMode::try_from(3).unwrap(), CacheMode::FullSave);
        assert!(CacheMode::try_from(4).is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = "sometimes".parse::<CacheMode>().unwrap_err();
        assert_eq!(err, InvalidModeError("sometimes".to_string()));
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for mode in [CacheMode::Default, CacheMode::NoCache, CacheMode::CacheOnly, CacheMode::FullSave] {
            assert_eq!(mode.to_string().parse::<CacheMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_capabilities() {
        assert!(CacheMode::Default.persists());
        assert!(CacheMode::FullSave.persists());
        assert!(!CacheMode::NoCache.persists());
        assert!(!CacheMode::CacheOnly.calls_source());
    }
}
