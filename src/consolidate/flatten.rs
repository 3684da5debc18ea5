use crate::consolidate::error::ConsolidateError;
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One scalar cell of a flattened observation row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// One observation row: flattened field path -> scalar value. The `time`
/// field (epoch seconds) identifies the row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    pub fields: BTreeMap<String, CellValue>,
}

impl FlatRecord {
    /// Epoch seconds of the `time` field, when present and integral.
    pub fn epoch_time(&self) -> Option<i64> {
        match self.fields.get("time") {
            Some(CellValue::Int(t)) => Some(*t),
            _ => None,
        }
    }
}

/// All flattened rows of one cached year, plus the timezone the payloads
/// reported for the location.
#[derive(Debug, Clone, Default)]
pub struct YearObservations {
    pub rows: Vec<FlatRecord>,
    pub timezone: Option<String>,
}

/// Flattens one nested observation record into a row, joining nested object
/// paths with dots (`precip.intensity` style). Arrays are kept as their JSON
/// text; null fields are dropped.
pub fn flatten_record(record: &Map<String, Value>) -> FlatRecord {
    let mut row = FlatRecord::default();
    for (name, value) in record {
        flatten_into(name, value, &mut row.fields);
    }
    row
}

fn flatten_into(path: &str, value: &Value, out: &mut BTreeMap<String, CellValue>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(path.to_string(), CellValue::Bool(*b));
        }
        Value::Number(n) => {
            let cell = match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            };
            out.insert(path.to_string(), cell);
        }
        Value::String(s) => {
            out.insert(path.to_string(), CellValue::Str(s.clone()));
        }
        Value::Array(_) => {
            out.insert(path.to_string(), CellValue::Str(value.to_string()));
        }
        Value::Object(map) => {
            for (name, nested) in map {
                flatten_into(&format!("{path}.{name}"), nested, out);
            }
        }
    }
}

/// Reads every cached payload file under `year_dir`, extracts and flattens
/// the `sub_key.data` records, and picks up the reported timezone (the last
/// file read wins; all files of one location are expected to agree).
pub fn load_year(year_dir: &Path, sub_key: &str) -> Result<YearObservations, ConsolidateError> {
    let mut files = Vec::new();
    let entries =
        fs::read_dir(year_dir).map_err(|e| ConsolidateError::DirList(year_dir.to_path_buf(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ConsolidateError::DirList(year_dir.to_path_buf(), e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }
    // Deterministic read order; the final dataset is sorted by time anyway.
    files.sort();
    debug!("{}: {} payload files", year_dir.display(), files.len());

    let mut observations = YearObservations::default();
    for path in files {
        let bytes =
            fs::read(&path).map_err(|e| ConsolidateError::PayloadRead(path.clone(), e))?;
        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ConsolidateError::PayloadParse(path.clone(), e))?;

        let data = payload
            .get(sub_key)
            .and_then(|v| v.get("data"))
            .and_then(Value::as_array)
            .ok_or_else(|| ConsolidateError::MalformedPayload {
                path: path.clone(),
                key: format!("{sub_key}.data"),
            })?;

        for record in data {
            if let Some(map) = record.as_object() {
                observations.rows.push(flatten_record(map));
            }
        }

        if let Some(tz) = payload.get("timezone").and_then(Value::as_str) {
            observations.timezone = Some(tz.to_string());
        }
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn flatten_joins_nested_paths_with_dots() {
        let record = json!({
            "time": 1_546_300_800,
            "summary": "Clear",
            "precip": { "intensity": 0.1, "type": "rain" },
            "cloudCover": 0.25,
            "isDaytime": true,
            "gaps": null
        });
        let row = flatten_record(record.as_object().unwrap());

        assert_eq!(row.epoch_time(), Some(1_546_300_800));
        assert_eq!(
            row.fields.get("precip.intensity"),
            Some(&CellValue::Float(0.1))
        );
        assert_eq!(
            row.fields.get("precip.type"),
            Some(&CellValue::Str("rain".to_string()))
        );
        assert_eq!(row.fields.get("isDaytime"), Some(&CellValue::Bool(true)));
        assert!(!row.fields.contains_key("gaps"), "nulls are dropped");
    }

    #[test]
    fn load_year_collects_rows_and_timezone() {
        let dir = tempdir().unwrap();
        for (doy, time) in [(1u32, 100i64), (2, 200)] {
            let payload = json!({
                "timezone": "America/New_York",
                "daily": { "data": [{ "time": time, "temperatureMax": 5.0 }] }
            });
            fs::write(
                dir.path().join(format!("{doy}.json")),
                serde_json::to_vec(&payload).unwrap(),
            )
            .unwrap();
        }

        let observations = load_year(dir.path(), "daily").unwrap();
        assert_eq!(observations.rows.len(), 2);
        assert_eq!(observations.timezone.as_deref(), Some("America/New_York"));
    }

    #[test]
    fn load_year_fails_on_missing_sub_key() {
        let dir = tempdir().unwrap();
        let payload = json!({ "timezone": "UTC", "hourly": { "data": [] } });
        fs::write(
            dir.path().join("1.json"),
            serde_json::to_vec(&payload).unwrap(),
        )
        .unwrap();

        let err = load_year(dir.path(), "daily").unwrap_err();
        assert!(matches!(
            err,
            ConsolidateError::MalformedPayload { key, .. } if key == "daily.data"
        ));
    }

    #[test]
    fn load_year_counts_every_data_entry() {
        let dir = tempdir().unwrap();
        let payload = json!({
            "timezone": "UTC",
            "daily": { "data": [{ "time": 1 }, { "time": 2 }, { "time": 3 }] }
        });
        fs::write(
            dir.path().join("1.json"),
            serde_json::to_vec(&payload).unwrap(),
        )
        .unwrap();

        let observations = load_year(dir.path(), "daily").unwrap();
        assert_eq!(observations.rows.len(), 3);
    }
}
