//! Deterministic collaborators and stored fixtures for anima tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use hashbrown::HashMap;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Deserialize;

mod clock;
mod resolver;
mod sink;

pub use clock::ManualClock;
pub use resolver::NamedResolver;
pub use sink::MemorySink;

static MANIFEST: OnceCell<Manifest> = OnceCell::new();

#[derive(Debug, Deserialize)]
struct Manifest {
    runs: HashMap<String, String>,
}

fn manifest() -> Result<&'static Manifest> {
    MANIFEST.get_or_try_init(|| {
        let raw = include_str!("../../../../fixtures/manifest.json");
        serde_json::from_str(raw).context("fixtures manifest should parse")
    })
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Stored run configurations under `fixtures/runs/`.
pub mod runs {
    use super::*;
    use anima_core::RunConfig;

    pub fn keys() -> Result<Vec<String>> {
        let mut keys: Vec<String> = manifest()?.runs.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&manifest()?.runs, "run", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        super::load_json(lookup(&manifest()?.runs, "run", name)?)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        Ok(resolve_path(lookup(&manifest()?.runs, "run", name)?))
    }

    /// Parse and validate a stored run configuration.
    pub fn load_run_config(name: &str) -> Result<RunConfig> {
        let text = json(name)?;
        anima_core::parse_run_config_json(&text)
            .with_context(|| format!("run fixture '{name}' is not a valid run config"))
    }
}

pub use runs::load_run_config;

#[cfg(test)]
mod tests {
    use super::*;
    use anima_core::{PropertySink, Repeat, TimeSource};

    #[test]
    fn every_run_fixture_parses_and_validates() {
        let keys = runs::keys().unwrap();
        assert!(keys.contains(&"fade-in".to_string()));
        for key in keys {
            let cfg = load_run_config(&key).unwrap_or_else(|e| panic!("{key}: {e:#}"));
            cfg.validate().unwrap();
        }
        assert_eq!(load_run_config("yoyo-infinite").unwrap().repeat, Repeat::Infinite);
    }

    #[test]
    fn unknown_fixture_names_error() {
        assert!(runs::json("nope").is_err());
        assert!(runs::path("fade-in").unwrap().exists());
        let raw: serde_json::Value = runs::load("fade-in").unwrap();
        assert_eq!(raw["duration"], 1000);
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(5.0);
        clock.advance(10.0);
        assert_eq!(clock.now_ms(), 15.0);
        clock.set(2.0);
        assert_eq!(clock.now(), 2.0);
    }

    #[test]
    fn memory_sink_stages_until_applied() {
        let mut sink = MemorySink::new().with_value("x", 1.0);
        assert!(matches!(sink.current_value("x"), Some(anima_api_core::RawValue::Number(n)) if n == 1.0));
        sink.update_property("x", anima_api_core::Value::Scalar(3.0));
        assert_eq!(sink.staged_len(), 1);
        assert_eq!(sink.scalar("x"), None);
        sink.apply_updates();
        assert_eq!(sink.scalar("x"), Some(3.0));
        sink.reset();
        assert_eq!(sink.scalar("x"), None);
        assert_eq!(sink.reset_count(), 1);
    }
}
