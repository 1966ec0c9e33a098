use std::collections::HashMap;

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use thiserror::Error;

use crate::model::{Function, Line, Location, Mapping, Profile, Sample, ValueType};

#[derive(Debug, Error)]
pub enum PprofParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("profile declares no sample types")]
    NoSampleTypes,
    #[error("string index {index} out of range (table has {len} entries)")]
    StringIndex { index: u64, len: usize },
}

/// JSON rendering of a pprof `Profile` message.
///
/// Field names follow the protobuf JSON mapping (`sampleType`,
/// `locationId`, ...); both the singular proto field names and the plural
/// forms some exporters emit are accepted. 64-bit integers may be JSON
/// numbers or, as proto3 JSON writes them, decimal strings. All strings are
/// indices into `stringTable`.
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PprofJson {
    #[serde(default)]
    sample_type: Vec<PprofValueType>,
    #[serde(default, alias = "sample")]
    samples: Vec<PprofSample>,
    #[serde(default, alias = "location")]
    locations: Vec<PprofLocation>,
    #[serde(default, alias = "function")]
    functions: Vec<PprofFunction>,
    #[serde(default, alias = "mapping")]
    mappings: Vec<PprofMapping>,
    #[serde(default)]
    string_table: Vec<String>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    default_sample_type: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    time_nanos: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    duration_nanos: i64,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct PprofValueType {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default, rename = "type")]
    value_type: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    unit: u64,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PprofSample {
    #[serde_as(as = "Vec<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    location_id: Vec<u64>,
    #[serde_as(as = "Vec<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    value: Vec<i64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PprofLocation {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    id: u64,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    mapping_id: Option<u64>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    address: u64,
    #[serde(default)]
    line: Vec<PprofLine>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PprofLine {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    function_id: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    line: i64,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct PprofFunction {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    id: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    name: u64,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    filename: Option<u64>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
struct PprofMapping {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    id: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    filename: u64,
}

fn lookup(table: &[String], index: u64) -> Result<String, PprofParseError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i))
        .cloned()
        .ok_or(PprofParseError::StringIndex {
            index,
            len: table.len(),
        })
}

/// Parse a pprof JSON export into a `Profile`.
pub fn parse_pprof(data: &[u8]) -> Result<Profile, PprofParseError> {
    let pprof: PprofJson = serde_json::from_slice(data)?;

    if pprof.sample_type.is_empty() {
        return Err(PprofParseError::NoSampleTypes);
    }
    let strings = &pprof.string_table;

    let sample_types = pprof
        .sample_type
        .iter()
        .map(|t| {
            Ok(ValueType {
                ty: lookup(strings, t.value_type)?,
                unit: lookup(strings, t.unit)?,
            })
        })
        .collect::<Result<Vec<_>, PprofParseError>>()?;

    let functions: HashMap<u64, Function> = pprof
        .functions
        .iter()
        .map(|f| {
            let function = Function {
                id: f.id,
                name: lookup(strings, f.name)?,
                filename: f
                    .filename
                    .and_then(|i| lookup(strings, i).ok())
                    .filter(|name| !name.is_empty()),
            };
            Ok((f.id, function))
        })
        .collect::<Result<_, PprofParseError>>()?;

    let locations: HashMap<u64, Location> = pprof
        .locations
        .into_iter()
        .map(|l| {
            let location = Location {
                id: l.id,
                mapping_id: l.mapping_id.filter(|&id| id != 0),
                address: l.address,
                lines: l
                    .line
                    .iter()
                    .map(|line| Line {
                        function_id: line.function_id,
                        line: line.line,
                    })
                    .collect(),
            };
            (l.id, location)
        })
        .collect();

    let mappings = pprof
        .mappings
        .iter()
        .map(|m| {
            Ok(Mapping {
                id: m.id,
                file: lookup(strings, m.filename)?,
            })
        })
        .collect::<Result<Vec<_>, PprofParseError>>()?;

    let samples = pprof
        .samples
        .into_iter()
        .map(|s| Sample {
            location_ids: s.location_id,
            values: s.value,
        })
        .collect();

    // index 0 is the empty string: no default
    let default_sample_type = Some(lookup(strings, pprof.default_sample_type)?)
        .filter(|name| !name.is_empty());

    Ok(Profile {
        sample_types,
        default_sample_type,
        samples,
        locations,
        functions,
        mappings,
        time_nanos: pprof.time_nanos,
        duration_nanos: pprof.duration_nanos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_pprof() {
        let json = r#"{
            "sampleType": [{"type": 1, "unit": 2}],
            "samples": [
                {"locationId": [3, 2, 1], "value": [10]},
                {"locationId": [3, 2], "value": [20]}
            ],
            "locations": [
                {"id": 1, "line": [{"functionId": 1}]},
                {"id": 2, "line": [{"functionId": 2}]},
                {"id": 3, "line": [{"functionId": 3}]}
            ],
            "functions": [
                {"id": 1, "name": 3},
                {"id": 2, "name": 4},
                {"id": 3, "name": 5}
            ],
            "stringTable": ["", "samples", "count", "main", "work", "compute"]
        }"#;

        let profile = parse_pprof(json.as_bytes()).unwrap();
        assert_eq!(profile.sample_types, vec![ValueType::new("samples", "count")]);
        assert_eq!(profile.samples.len(), 2);
        assert_eq!(
            profile.stack_names(&profile.samples[0]),
            vec!["main", "work", "compute"]
        );
        assert_eq!(profile.stack_names(&profile.samples[1]), vec!["work", "compute"]);
    }

    #[test]
    fn accepts_proto_field_names_and_metadata() {
        let json = r#"{
            "sampleType": [{"type": 1, "unit": 2}, {"type": 3, "unit": 4}],
            "sample": [{"locationId": [1], "value": [1, 100]}],
            "location": [{"id": 1, "mappingId": 1, "address": 4096,
                          "line": [{"functionId": 2, "line": 7}, {"functionId": 1, "line": 3}]}],
            "function": [{"id": 1, "name": 5, "filename": 7}, {"id": 2, "name": 6}],
            "mapping": [{"id": 1, "filename": 8}],
            "stringTable": ["", "samples", "count", "cpu", "nanoseconds",
                            "main", "helper", "main.go", "/bin/app"],
            "timeNanos": 1496415840000000000,
            "durationNanos": 2000000000,
            "defaultSampleType": 3
        }"#;

        let profile = parse_pprof(json.as_bytes()).unwrap();
        assert_eq!(profile.sample_index_by_name("cpu"), Some(1));
        assert_eq!(profile.main_file(), Some("/bin/app"));
        assert_eq!(profile.duration_nanos, 2_000_000_000);
        assert_eq!(profile.default_sample_type.as_deref(), Some("cpu"));
        assert_eq!(profile.locations[&1].lines.len(), 2);
        assert_eq!(profile.functions[&1].filename.as_deref(), Some("main.go"));
        // helper was inlined into main at the same address
        assert_eq!(profile.stack_names(&profile.samples[0]), vec!["main", "helper"]);
    }

    #[test]
    fn accepts_proto3_string_integers() {
        let json = r#"{
            "sampleType": [{"type": "1", "unit": "2"}],
            "sample": [{"locationId": ["2", "1"], "value": ["30000000"]}],
            "location": [
                {"id": "1", "mappingId": "1", "address": "4198400", "line": [{"functionId": "1", "line": "12"}]},
                {"id": "2", "line": [{"functionId": "2"}]}
            ],
            "function": [{"id": "1", "name": "3"}, {"id": "2", "name": "4", "filename": "6"}],
            "mapping": [{"id": "1", "filename": "5"}],
            "stringTable": ["", "cpu", "nanoseconds", "main", "work", "/bin/app", "work.go"],
            "defaultSampleType": "1",
            "timeNanos": "1496415840000000000",
            "durationNanos": "10000000000"
        }"#;

        let profile = parse_pprof(json.as_bytes()).unwrap();
        assert_eq!(profile.time_nanos, 1_496_415_840_000_000_000);
        assert_eq!(profile.duration_nanos, 10_000_000_000);
        assert_eq!(profile.default_sample_type.as_deref(), Some("cpu"));
        assert_eq!(profile.samples[0].values, vec![30_000_000]);
        assert_eq!(profile.locations[&1].address, 4_198_400);
        assert_eq!(profile.functions[&2].filename.as_deref(), Some("work.go"));
        assert_eq!(profile.stack_names(&profile.samples[0]), vec!["main", "work"]);
    }

    #[test]
    fn rejects_non_numeric_strings() {
        let json = r#"{"sampleType":[{"type":"cpu","unit":"2"}],"stringTable":["","cpu","ns"]}"#;
        assert!(matches!(
            parse_pprof(json.as_bytes()),
            Err(PprofParseError::Json(_))
        ));
    }

    #[test]
    fn empty_samples_are_allowed() {
        let json = r#"{"sampleType":[{"type":1,"unit":2}],"stringTable":["","cpu","nanoseconds"]}"#;
        let profile = parse_pprof(json.as_bytes()).unwrap();
        assert!(profile.samples.is_empty());
        assert_eq!(profile.default_sample_type, None);
    }

    #[test]
    fn missing_sample_types_errors() {
        let json = r#"{"samples":[],"locations":[],"functions":[],"stringTable":[]}"#;
        assert!(matches!(
            parse_pprof(json.as_bytes()),
            Err(PprofParseError::NoSampleTypes)
        ));
    }

    #[test]
    fn dangling_string_index_errors() {
        let json = r#"{"sampleType":[{"type":1,"unit":9}],"stringTable":["","cpu"]}"#;
        assert!(matches!(
            parse_pprof(json.as_bytes()),
            Err(PprofParseError::StringIndex { index: 9, len: 2 })
        ));
    }

    #[test]
    fn invalid_json_errors() {
        assert!(matches!(
            parse_pprof(b"{not json"),
            Err(PprofParseError::Json(_))
        ));
    }
}
