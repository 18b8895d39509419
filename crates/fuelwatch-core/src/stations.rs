use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::model::{Brand, Station, StationId};
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct StationsFile {
    pub stations: Vec<Station>,
}

/// Built-in registry for the Seixal municipality.
#[must_use]
pub fn default_registry() -> Vec<Station> {
    [
        ("66099", Brand::Galp, "Galp Arrentela", "Seixal"),
        ("65949", Brand::Galp, "Galp Petrolinos", "Fogueteiro"),
        ("65948", Brand::Prio, "PRIO Amora", "Amora"),
        ("65947", Brand::Prio, "Prio Corroios", "Corroios"),
        ("65946", Brand::Prio, "PRIO Fernão Ferro", "Fernão Ferro"),
        ("65945", Brand::Cepsa, "Cepsa Fogueteiro", "Seixal"),
    ]
    .into_iter()
    .map(|(id, brand, name, location)| Station {
        id: StationId::new(id),
        brand,
        name: name.to_string(),
        location: location.to_string(),
    })
    .collect()
}

/// Load and validate a station registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stations(path: &Path) -> Result<Vec<Station>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: StationsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::StationsFileParse)?;

    validate_stations(&file.stations)?;

    Ok(file.stations)
}

/// Registry from `path` when configured, the built-in one otherwise.
///
/// # Errors
///
/// Propagates [`load_stations`] failures.
pub fn resolve_registry(path: Option<&Path>) -> Result<Vec<Station>, ConfigError> {
    match path {
        Some(path) => load_stations(path),
        None => Ok(default_registry()),
    }
}

fn validate_stations(stations: &[Station]) -> Result<(), ConfigError> {
    if stations.is_empty() {
        return Err(ConfigError::Validation(
            "station registry must contain at least one station".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for station in stations {
        if station.id.as_str().trim().is_empty() {
            return Err(ConfigError::Validation(
                "station id must be non-empty".to_string(),
            ));
        }

        if station.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "station '{}' has an empty name",
                station.id
            )));
        }

        if !seen_ids.insert(station.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate station id: '{}'",
                station.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "stations_test.rs"]
mod tests;
