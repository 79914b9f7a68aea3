//! Compiler configuration.
//!
//! Built in code with the `with_*` methods, or read from the environment:
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `FPATH_POLICY` | `strict` or `lenient` | required |
//! | `FPATH_OPTIMIZE` | run AST compaction | `true` |
//! | `FPATH_CACHE_DIR` | artifact cache directory | none |
//! | `FPATH_CACHE_TTL_SECS` | idle time before eviction | none |
//! | `FPATH_SWEEP_INTERVAL_SECS` | background sweep period | none |

use std::path::PathBuf;
use std::time::Duration;

use fpath_codegen::DEFAULT_MAX_DEPTH;
use fpath_lower::ResolutionPolicy;

use crate::ConfigError;

/// Renderers kept in memory unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerConfig {
    pub policy: ResolutionPolicy,
    pub optimize: bool,
    /// Expression nesting limit for code generation.
    pub max_depth: usize,
    /// Maximum renderers held by the memory cache.
    pub capacity: usize,
    /// Idle time after which a cached renderer is evicted by a sweep.
    pub ttl: Option<Duration>,
    /// Period of the background sweeper. No sweeper thread when unset.
    pub sweep_interval: Option<Duration>,
    pub disk: Option<DiskCacheConfig>,
}

impl CompilerConfig {
    /// The policy has no default: every deployment picks one.
    pub fn new(policy: ResolutionPolicy) -> Self {
        CompilerConfig {
            policy,
            optimize: true,
            max_depth: DEFAULT_MAX_DEPTH,
            capacity: DEFAULT_CAPACITY,
            ttl: None,
            sweep_interval: None,
            disk: None,
        }
    }

    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_disk_cache(mut self, disk: DiskCacheConfig) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Read the `FPATH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        const POLICY: &str = "FPATH_POLICY";
        let raw = lookup(POLICY).ok_or(ConfigError::Missing { var: POLICY })?;
        let policy = raw.parse::<ResolutionPolicy>().map_err(|reason| ConfigError::Invalid {
            var: POLICY,
            value: raw.clone(),
            reason,
        })?;
        let mut config = CompilerConfig::new(policy);

        if let Some(raw) = lookup("FPATH_OPTIMIZE") {
            config.optimize = parse_bool("FPATH_OPTIMIZE", &raw)?;
        }
        let ttl = lookup("FPATH_CACHE_TTL_SECS")
            .map(|raw| parse_secs("FPATH_CACHE_TTL_SECS", &raw))
            .transpose()?;
        config.ttl = ttl;
        if let Some(raw) = lookup("FPATH_SWEEP_INTERVAL_SECS") {
            config.sweep_interval = Some(parse_secs("FPATH_SWEEP_INTERVAL_SECS", &raw)?);
        }
        if let Some(dir) = lookup("FPATH_CACHE_DIR").filter(|d| !d.trim().is_empty()) {
            config.disk = Some(DiskCacheConfig { dir: PathBuf::from(dir), ttl });
        }
        Ok(config)
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_owned(),
            reason: String::from("expected true or false"),
        }),
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid {
            var,
            value: raw.to_owned(),
            reason: String::from("expected a positive number of seconds"),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
    }
}

/// On-disk artifact cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskCacheConfig {
    /// Root directory; artifacts live in `<dir>/units/`.
    pub dir: PathBuf,
    /// Age of the last access after which a sweep deletes an artifact.
    pub ttl: Option<Duration>,
}

impl DiskCacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskCacheConfig { dir: dir.into(), ttl: None }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: FxHashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_policy_is_required() {
        let err = CompilerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: "FPATH_POLICY" });

        let err = CompilerConfig::from_lookup(lookup(&[("FPATH_POLICY", "loose")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "FPATH_POLICY", .. }));
    }

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::from_lookup(lookup(&[("FPATH_POLICY", " Lenient ")])).unwrap();
        assert_eq!(config, CompilerConfig::new(ResolutionPolicy::Lenient));
        assert!(config.optimize);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.disk.is_none());
    }

    #[test]
    fn test_full_environment() {
        let config = CompilerConfig::from_lookup(lookup(&[
            ("FPATH_POLICY", "strict"),
            ("FPATH_OPTIMIZE", "false"),
            ("FPATH_CACHE_DIR", "/var/cache/fpath"),
            ("FPATH_CACHE_TTL_SECS", "3600"),
            ("FPATH_SWEEP_INTERVAL_SECS", "60"),
        ]))
        .unwrap();
        assert!(!config.optimize);
        assert_eq!(config.ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(60)));
        assert_eq!(
            config.disk,
            Some(DiskCacheConfig::new("/var/cache/fpath").with_ttl(Duration::from_secs(3600)))
        );
    }

    #[test]
    fn test_invalid_numbers() {
        for (var, value) in [("FPATH_CACHE_TTL_SECS", "soon"), ("FPATH_SWEEP_INTERVAL_SECS", "0")] {
            let vars = [("FPATH_POLICY", "strict"), (var, value)];
            let err = CompilerConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: v, .. } if v == var));
        }
        let vars = [("FPATH_POLICY", "strict"), ("FPATH_OPTIMIZE", "maybe")];
        let err = CompilerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "FPATH_OPTIMIZE", .. }));
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        assert_eq!(CompilerConfig::new(ResolutionPolicy::Strict).with_capacity(0).capacity, 1);
    }
}
