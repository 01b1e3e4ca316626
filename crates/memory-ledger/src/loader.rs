//! Settings and stage reel loading.
//!
//! Both sources are optional. Any failure degrades to an empty default and is
//! logged; loading never fails the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

/// One entry of the stage reel used to seed an empty ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub memory: Vec<String>,
}

/// Load the YAML settings mapping at `path`.
pub fn load_config(path: &Path) -> Value {
    let empty = Value::Object(Map::new());

    if !path.exists() {
        warn!(path = %path.display(), "Settings file not found, using empty config");
        return empty;
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read settings file");
            return empty;
        }
    };

    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => {
            info!(path = %path.display(), "Loaded settings");
            value
        }
        Ok(Value::Null) => {
            warn!(path = %path.display(), "Settings file is empty");
            empty
        }
        Ok(_) => {
            error!(path = %path.display(), "Settings root is not a mapping");
            empty
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to parse settings file");
            empty
        }
    }
}

/// Load the JSON stage reel at `path`.
pub fn load_reel(path: &Path) -> Vec<StageDescriptor> {
    if !path.exists() {
        warn!(path = %path.display(), "Memory reel not found");
        return Vec::new();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read memory reel");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<StageDescriptor>>(&contents) {
        Ok(reel) => {
            info!(stages = reel.len(), "Loaded memory reel");
            reel
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to parse memory reel");
            Vec::new()
        }
    }
}
