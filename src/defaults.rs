//! Packaged configuration layers.
//!
//! The `default`, `debug` and `library` layers ship inside the binary as one
//! JSON resource, `resources/configuration.json`.

use serde_json::Value;

use crate::error::{Error, Result};

const PACKAGED_CONFIGURATION: &str = include_str!("../resources/configuration.json");

/// The packaged layers, parsed
#[derive(Debug, Clone, PartialEq)]
pub struct PackagedLayers {
    /// Base of every composition
    pub default: Value,
    /// Applied on top of `default` in debug mode
    pub debug: Value,
    /// Applied for library projects
    pub library: Value,
}

/// Parse the packaged layers.
pub fn packaged_layers() -> Result<PackagedLayers> {
    let mut packaged: Value =
        serde_json::from_str(PACKAGED_CONFIGURATION).map_err(|error| Error::ConfigParse {
            message: format!("Packaged configuration is malformed: {}", error),
            hint: None,
        })?;

    let mut take = |name: &str| -> Result<Value> {
        match packaged.get_mut(name).map(Value::take) {
            Some(layer @ Value::Object(_)) => Ok(layer),
            _ => Err(Error::ConfigParse {
                message: format!("Packaged configuration lacks the '{}' layer", name),
                hint: None,
            }),
        }
    };
    Ok(PackagedLayers {
        default: take("default")?,
        debug: take("debug")?,
        library: take("library")?,
    })
}

/// Debug mode of the packaged default layer.
pub fn default_debug(layers: &PackagedLayers) -> bool {
    layers
        .default
        .get("debug")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
