use super::types::{CountryRecord, RawCountryRecord};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A loaded dataset snapshot. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub snapshot: Option<String>,
    pub countries: Vec<CountryRecord>,
}

impl Dataset {
    /// Find a country by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&CountryRecord> {
        self.countries
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml")
    )
}

/// Load a dataset from a JSON or YAML file
///
/// The format is picked from the extension: `.yaml`/`.yml` is YAML, anything
/// else is JSON. The document is either a bare list of records or an object
/// with a `countries` list and an optional `snapshot` label.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read or parsed
/// - A record has a field of the wrong type (the field and country are named)
/// - A record is missing a required field
/// - Two records share a country name
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        anyhow::bail!("Dataset file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset at {}", path.display()))?;

    let document: Value = if is_yaml(path) {
        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse dataset: invalid JSON in {}", path.display()))?
    };

    let dataset = build_dataset(document)
        .with_context(|| format!("Invalid dataset in {}", path.display()))?;

    debug!(
        path = %path.display(),
        countries = dataset.countries.len(),
        "loaded dataset"
    );

    Ok(dataset)
}

/// Split a document into its snapshot label and raw record values
fn split_document(document: Value) -> Result<(Option<String>, Vec<Value>)> {
    match document {
        Value::Array(records) => Ok((None, records)),
        Value::Object(mut fields) => {
            let snapshot = match fields.remove("snapshot") {
                None | Some(Value::Null) => None,
                Some(Value::String(label)) => Some(label),
                Some(other) => anyhow::bail!("`snapshot` must be a string, got {}", other),
            };
            match fields.remove("countries") {
                Some(Value::Array(records)) => Ok((snapshot, records)),
                Some(_) => anyhow::bail!("`countries` must be a list of records"),
                None => anyhow::bail!("missing `countries` list"),
            }
        }
        _ => anyhow::bail!("expected a list of records or an object with a `countries` list"),
    }
}

fn record_label(value: &Value) -> &str {
    ["name", "country", "Country"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .unwrap_or("<unnamed>")
}

/// Decode one record. On a type error, name the offending key as written in the file.
fn decode_record(value: Value) -> Result<RawCountryRecord> {
    let fields = match &value {
        Value::Object(fields) => fields.clone(),
        other => anyhow::bail!("record must be an object, got {}", other),
    };

    serde_json::from_value::<RawCountryRecord>(value).map_err(|err| {
        let offending = fields.iter().find(|(key, field)| {
            let mut single = Map::new();
            single.insert((*key).clone(), (*field).clone());
            serde_json::from_value::<RawCountryRecord>(Value::Object(single)).is_err()
        });
        match offending {
            Some((key, _)) => anyhow::anyhow!("field `{}`: {}", key, err),
            None => anyhow::anyhow!(err),
        }
    })
}

fn build_dataset(document: Value) -> Result<Dataset> {
    let (snapshot, raw_records) = split_document(document)?;

    let mut seen = HashSet::new();
    let mut countries = Vec::with_capacity(raw_records.len());

    for (i, value) in raw_records.into_iter().enumerate() {
        let label = format!("record #{} ({})", i + 1, record_label(&value));
        let raw = decode_record(value).with_context(|| label.clone())?;
        let record = CountryRecord::try_from(raw).with_context(|| label.clone())?;
        if !seen.insert(record.name.to_lowercase()) {
            anyhow::bail!("{}: duplicate country '{}'", label, record.name);
        }
        countries.push(record);
    }

    Ok(Dataset {
        snapshot,
        countries,
    })
}
