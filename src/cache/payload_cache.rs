use crate::cache::error::CacheError;
use crate::types::DayKey;
use log::debug;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Append-only, write-once store of raw per-day payloads.
///
/// Each [`DayKey`] maps deterministically to
/// `<root>/<location>/<year>/<day_of_year>.json`, so independent runs agree
/// on addressing without coordination. An existence check on that path is the
/// resumability primitive for the fetch stage.
#[derive(Debug, Clone)]
pub struct PayloadCache {
    root: PathBuf,
}

impl PayloadCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all cached years for a location.
    pub fn location_dir(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }

    fn year_dir(&self, location: &str, year: i32) -> PathBuf {
        self.location_dir(location).join(year.to_string())
    }

    fn payload_path(&self, key: &DayKey) -> PathBuf {
        self.year_dir(&key.location, key.year)
            .join(format!("{}.json", key.day_of_year))
    }

    pub fn exists(&self, key: &DayKey) -> bool {
        self.payload_path(key).is_file()
    }

    /// Persists a payload, staging to a temp file in the destination
    /// directory and publishing with an atomic no-clobber rename. A reader
    /// never observes a half-written blob at the final path, and a payload
    /// already present for `key` is left untouched.
    pub fn write(&self, key: &DayKey, payload: &Value) -> Result<(), CacheError> {
        let path = self.payload_path(key);
        let dir = self.year_dir(&key.location, key.year);
        fs::create_dir_all(&dir).map_err(|e| CacheError::DirCreation(dir.clone(), e))?;

        let mut staged =
            NamedTempFile::new_in(&dir).map_err(|e| CacheError::Stage(path.clone(), e))?;
        serde_json::to_writer(&mut staged, payload)
            .map_err(|e| CacheError::Encode(path.clone(), e))?;
        staged
            .flush()
            .map_err(|e| CacheError::Stage(path.clone(), e))?;

        match staged.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                // Another writer published this key first; the cache is
                // write-once, so the existing blob wins.
                debug!("payload for {} already published, keeping existing", key);
                Ok(())
            }
            Err(e) => Err(CacheError::Publish(path, e.error)),
        }
    }

    pub fn read(&self, key: &DayKey) -> Result<Value, CacheError> {
        let path = self.payload_path(key);
        let bytes = fs::read(&path).map_err(|e| CacheError::Read(path.clone(), e))?;
        serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode(path, e))
    }

    /// Returns every [`DayKey`] present for `(location, year)`, in day order.
    /// A missing year directory is an empty set, not an error.
    pub fn list(&self, location: &str, year: i32) -> Result<BTreeSet<DayKey>, CacheError> {
        let dir = self.year_dir(location, year);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(CacheError::List(dir, e)),
        };

        let mut keys = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::List(dir.clone(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let doy = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok());
            if let Some(doy) = doy.filter(|d| (1..=366).contains(d)) {
                keys.insert(DayKey::new(location, year, doy));
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_payload(time: i64) -> Value {
        json!({
            "timezone": "Europe/Lisbon",
            "daily": { "data": [{ "time": time, "temperatureMax": 17.2 }] }
        })
    }

    #[test]
    fn write_then_exists_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let cache = PayloadCache::new(dir.path());
        let key = DayKey::new("lisbon", 2019, 42);

        assert!(!cache.exists(&key));
        cache.write(&key, &sample_payload(1_550_000_000)).unwrap();
        assert!(cache.exists(&key));

        let read_back = cache.read(&key).unwrap();
        assert_eq!(read_back, sample_payload(1_550_000_000));
        assert!(dir.path().join("lisbon/2019/42.json").is_file());
    }

    #[test]
    fn write_never_clobbers_an_existing_payload() {
        let dir = tempdir().unwrap();
        let cache = PayloadCache::new(dir.path());
        let key = DayKey::new("lisbon", 2019, 1);

        cache.write(&key, &sample_payload(1)).unwrap();
        cache.write(&key, &sample_payload(2)).unwrap();

        let kept = cache.read(&key).unwrap();
        assert_eq!(kept["daily"]["data"][0]["time"], 1);
    }

    #[test]
    fn list_returns_day_keys_in_order() {
        let dir = tempdir().unwrap();
        let cache = PayloadCache::new(dir.path());
        for doy in [300u32, 2, 45] {
            let key = DayKey::new("porto", 2020, doy);
            cache.write(&key, &sample_payload(doy as i64)).unwrap();
        }
        // A stray non-payload file is ignored.
        std::fs::write(dir.path().join("porto/2020/notes.txt"), "x").unwrap();

        let keys = cache.list("porto", 2020).unwrap();
        let days: Vec<u32> = keys.iter().map(|k| k.day_of_year).collect();
        assert_eq!(days, vec![2, 45, 300]);
    }

    #[test]
    fn list_of_unknown_year_is_empty() {
        let dir = tempdir().unwrap();
        let cache = PayloadCache::new(dir.path());
        assert!(cache.list("nowhere", 1999).unwrap().is_empty());
    }
}
