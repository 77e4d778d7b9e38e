//! Jobs-file loading and change detection
//!
//! The jobs file is a YAML mapping of job name to attributes. Every load
//! produces an immutable `ConfigSnapshot` carrying a content fingerprint,
//! so the scheduler can cheaply tell whether anything changed and, when it
//! has, which jobs were added since the previous snapshot.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::job::{JobSpec, RawJob};
use crate::common::{Error, Result};

/// Immutable parse of the jobs file at one point in time
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    fingerprint: String,
    jobs: BTreeMap<String, JobSpec>,
}

impl ConfigSnapshot {
    /// SHA-256 of the raw file bytes, used only as an equality token
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn jobs(&self) -> impl Iterator<Item = &JobSpec> {
        self.jobs.values()
    }

    pub fn get(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.get(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job names present here but absent from `old`.
    ///
    /// Removals and in-place edits are intentionally not reported; only
    /// additions are admitted on reload.
    pub fn added_since(&self, old: &ConfigSnapshot) -> BTreeSet<String> {
        self.jobs
            .keys()
            .filter(|name| !old.jobs.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Job names present in `old` but no longer here. Logged for operator
    /// visibility; the scheduler does not act on them.
    pub fn removed_since(&self, old: &ConfigSnapshot) -> BTreeSet<String> {
        old.jobs
            .keys()
            .filter(|name| !self.jobs.contains_key(*name))
            .cloned()
            .collect()
    }
}

/// Reads and fingerprints the jobs file
#[derive(Debug, Clone)]
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the jobs file into a snapshot
    pub fn load(&self) -> Result<ConfigSnapshot> {
        if !self.path.exists() {
            return Err(Error::ConfigMissing(self.path.clone()));
        }
        let bytes = std::fs::read(&self.path).map_err(|e| Error::FileRead {
            path: self.path.display().to_string(),
            error: e.to_string(),
        })?;

        let fingerprint = format!("{:x}", Sha256::digest(&bytes));

        let raw: BTreeMap<String, RawJob> = serde_yaml::from_slice(&bytes)
            .map_err(|e| Error::ConfigParse(e.to_string()))?;

        let mut jobs = BTreeMap::new();
        for (name, attrs) in &raw {
            let spec = JobSpec::from_raw(name, attrs)?;
            jobs.insert(name.clone(), spec);
        }

        Ok(ConfigSnapshot { fingerprint, jobs })
    }

    /// Cheap change check against a known fingerprint.
    ///
    /// Reads the file but skips YAML parsing and validation.
    pub fn changed(&self, known_fingerprint: &str) -> Result<bool> {
        if !self.path.exists() {
            return Err(Error::ConfigMissing(self.path.clone()));
        }
        let bytes = std::fs::read(&self.path).map_err(|e| Error::FileRead {
            path: self.path.display().to_string(),
            error: e.to_string(),
        })?;
        let fingerprint = format!("{:x}", Sha256::digest(&bytes));
        Ok(fingerprint != known_fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_JOBS: &str = r#"
login:
  interval: 900
  browser: firefox
  username: tester
  password: secret
checkout:
  interval: 1800
  browser: chrome
  username: tester
  password: secret
"#;

    fn write_conf(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("webtesterconf.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_parses_all_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = ConfigWatcher::new(write_conf(&dir, TWO_JOBS));
        let snap = watcher.load().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("login").unwrap().interval().as_secs(), 900);
    }

    #[test]
    fn test_missing_file_is_config_missing() {
        let watcher = ConfigWatcher::new("/nonexistent/webtesterconf.yaml");
        assert!(matches!(watcher.load(), Err(Error::ConfigMissing(_))));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = ConfigWatcher::new(write_conf(&dir, "login: [not, a, mapping"));
        assert!(matches!(watcher.load(), Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_invalid_job_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let conf = "bad:\n  interval: 0\n  browser: chrome\n  username: u\n  password: p\n";
        let watcher = ConfigWatcher::new(write_conf(&dir, conf));
        assert!(watcher.load().is_err());
    }

    #[test]
    fn test_unchanged_file_has_equal_fingerprint_and_empty_diff() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = ConfigWatcher::new(write_conf(&dir, TWO_JOBS));
        let first = watcher.load().unwrap();
        let second = watcher.load().unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert!(!watcher.changed(first.fingerprint()).unwrap());
        assert!(second.added_since(&first).is_empty());
    }

    #[test]
    fn test_diff_reports_additions_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(&dir, TWO_JOBS);
        let watcher = ConfigWatcher::new(&path);
        let old = watcher.load().unwrap();

        let extended = format!(
            "{TWO_JOBS}search:\n  interval: 600\n  browser: edge\n  username: u\n  password: p\n"
        );
        std::fs::write(&path, &extended).unwrap();

        assert!(watcher.changed(old.fingerprint()).unwrap());
        let new = watcher.load().unwrap();
        let added = new.added_since(&old);
        assert_eq!(added.into_iter().collect::<Vec<_>>(), vec!["search"]);
        // Existing jobs are not re-reported.
        assert!(new.removed_since(&old).is_empty());
    }

    #[test]
    fn test_removals_reported_separately() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conf(&dir, TWO_JOBS);
        let watcher = ConfigWatcher::new(&path);
        let old = watcher.load().unwrap();

        let only_login = "login:\n  interval: 900\n  browser: firefox\n  username: t\n  password: s\n";
        std::fs::write(&path, only_login).unwrap();
        let new = watcher.load().unwrap();

        assert!(new.added_since(&old).is_empty());
        assert_eq!(
            new.removed_since(&old).into_iter().collect::<Vec<_>>(),
            vec!["checkout"]
        );
    }
}
