use std::path::PathBuf;

use tactics_engine::{compile_def_dirs, ContentCompileError, DefDatabase};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::scenario::{Scenario, ScenarioError, DEFAULT_SCENARIO_JSON, DEFAULT_SCENARIO_NAME};

const SCENARIO_ENV_VAR: &str = "TACTICS_SCENARIO";
const SEED_ENV_VAR: &str = "TACTICS_SEED";
const DEFS_DIRS_ENV_VAR: &str = "TACTICS_DEFS_DIRS";

pub(crate) struct AppWiring {
    pub(crate) scenario_name: String,
    pub(crate) scenario: Scenario,
    pub(crate) defs: DefDatabase,
}

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Defs(#[from] ContentCompileError),
}

#[derive(Debug, Default)]
struct StartupOptions {
    scenario_path: Option<PathBuf>,
    seed: Option<String>,
    defs_dirs: Vec<PathBuf>,
}

pub(crate) fn build_app() -> Option<AppWiring> {
    init_tracing();
    info!("=== Tactics Startup ===");

    let options = StartupOptions {
        scenario_path: std::env::var_os(SCENARIO_ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| std::env::args_os().nth(1).map(PathBuf::from)),
        seed: std::env::var(SEED_ENV_VAR).ok(),
        defs_dirs: parse_defs_dirs_from_env(),
    };
    match load_wiring(options) {
        Ok(wiring) => Some(wiring),
        Err(err) => {
            error!(error = %err, "startup_failed");
            None
        }
    }
}

fn load_wiring(options: StartupOptions) -> Result<AppWiring, StartupError> {
    let (scenario_name, mut scenario) = match &options.scenario_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
                path: path.clone(),
                source,
            })?;
            (path.display().to_string(), Scenario::from_json_str(&raw)?)
        }
        None => (
            DEFAULT_SCENARIO_NAME.to_string(),
            Scenario::from_json_str(DEFAULT_SCENARIO_JSON)?,
        ),
    };
    if let Some(seed) = &options.seed {
        scenario.override_seed(seed)?;
    }

    let defs = compile_def_dirs(&options.defs_dirs)?;
    info!(
        scenario = %scenario_name,
        seed = scenario.config.seed,
        weapons = defs.weapon_defs().len(),
        creatures = defs.creature_defs().len(),
        extra_def_dirs = options.defs_dirs.len(),
        "startup_loaded"
    );
    Ok(AppWiring {
        scenario_name,
        scenario,
        defs,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_defs_dirs_from_env() -> Vec<PathBuf> {
    std::env::var(DEFS_DIRS_ENV_VAR)
        .ok()
        .map(|raw| parse_path_list(&raw))
        .unwrap_or_default()
}

fn parse_path_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn path_list_skips_blank_entries() {
        assert_eq!(
            parse_path_list(" a ,, b/c ,"),
            vec![PathBuf::from("a"), PathBuf::from("b/c")]
        );
        assert!(parse_path_list("").is_empty());
    }

    #[test]
    fn defaults_to_the_embedded_scenario() {
        let wiring = load_wiring(StartupOptions::default()).expect("wiring");
        assert_eq!(wiring.scenario_name, DEFAULT_SCENARIO_NAME);
        assert!(wiring.defs.creature_id_by_name("raider").is_some());
    }

    #[test]
    fn scenario_file_seed_and_extra_defs_are_applied() {
        let temp = TempDir::new().expect("tempdir");
        let scenario_path = temp.path().join("duel.json");
        fs::write(
            &scenario_path,
            r#"{
                "name": "duel",
                "ticks": 3,
                "map": ["....."],
                "creatures": [
                    { "def": "ghoul", "alignment": "AgainstPlayer", "at": { "x": 0, "y": 0 } },
                    { "def": "operative", "alignment": "WithPlayer", "at": { "x": 4, "y": 0 } }
                ]
            }"#,
        )
        .expect("write scenario");
        let defs_dir = temp.path().join("extra");
        fs::create_dir_all(&defs_dir).expect("mkdir");
        fs::write(
            defs_dir.join("ghoul.xml"),
            r#"<Defs>
                <CreatureDef>
                    <defName>ghoul</defName>
                    <label>ghoul</label>
                    <weapon>knife</weapon>
                    <health>12</health>
                </CreatureDef>
            </Defs>"#,
        )
        .expect("write defs");

        let wiring = load_wiring(StartupOptions {
            scenario_path: Some(scenario_path),
            seed: Some("41".to_string()),
            defs_dirs: vec![defs_dir],
        })
        .expect("wiring");
        assert_eq!(wiring.scenario.name, "duel");
        assert_eq!(wiring.scenario.config.seed, 41);
        assert!(wiring.scenario.build_world(&wiring.defs).is_ok());
    }

    #[test]
    fn missing_scenario_file_is_a_read_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_wiring(StartupOptions {
            scenario_path: Some(temp.path().join("absent.json")),
            ..StartupOptions::default()
        });
        assert!(matches!(
            err,
            Err(StartupError::Scenario(ScenarioError::Read { .. }))
        ));
    }
}
