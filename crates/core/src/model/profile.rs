use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One measurement series of a profile, e.g. `cpu`/`nanoseconds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueType {
    #[serde(rename = "type")]
    pub ty: String,
    pub unit: String,
}

impl ValueType {
    pub fn new(ty: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub id: u64,
    pub name: String,
    pub filename: Option<String>,
}

/// One resolved function at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub function_id: u64,
    pub line: i64,
}

/// A physical code location. When inlining occurred, `lines` holds one
/// entry per inlined function, innermost (callee) first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub mapping_id: Option<u64>,
    pub address: u64,
    pub lines: Vec<Line>,
}

/// A mapped binary or shared object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: u64,
    pub file: String,
}

/// One observed call stack with one value per series.
///
/// `location_ids` is ordered leaf first: index 0 is the point of capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub location_ids: Vec<u64>,
    pub values: Vec<i64>,
}

impl Sample {
    /// Value for a series, or 0 when the sample carries fewer values.
    pub fn value(&self, series: usize) -> i64 {
        self.values.get(series).copied().unwrap_or(0)
    }
}

/// An already-decoded profile. Read-only input to tree building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub sample_types: Vec<ValueType>,
    /// Series the producer suggests showing first, if any.
    #[serde(default)]
    pub default_sample_type: Option<String>,
    pub samples: Vec<Sample>,
    pub locations: HashMap<u64, Location>,
    pub functions: HashMap<u64, Function>,
    pub mappings: Vec<Mapping>,
    /// Collection start, nanoseconds since the Unix epoch.
    pub time_nanos: i64,
    pub duration_nanos: i64,
}

impl Profile {
    /// Resolve a series name to its index.
    ///
    /// Accepts the series type name, a decimal index, or a legacy
    /// `inuse_`-prefixed name (`inuse_space` selects `space`).
    pub fn sample_index_by_name(&self, name: &str) -> Option<usize> {
        if let Ok(index) = name.parse::<usize>() {
            return (index < self.sample_types.len()).then_some(index);
        }
        let without_inuse = name.strip_prefix("inuse_").unwrap_or(name);
        self.sample_types
            .iter()
            .position(|t| t.ty == name || t.ty == without_inuse)
    }

    pub fn sample_type_names(&self) -> Vec<String> {
        self.sample_types.iter().map(|t| t.ty.clone()).collect()
    }

    /// File of the main (first) mapping, if it has one.
    pub fn main_file(&self) -> Option<&str> {
        self.mappings
            .first()
            .map(|m| m.file.as_str())
            .filter(|f| !f.is_empty())
    }

    /// Function names along a sample's stack, ordered root to leaf.
    ///
    /// Every line of a location becomes its own frame so inlined calls add
    /// depth, with the inlining caller above the inlined callee. Dangling
    /// location or function ids are skipped.
    pub fn stack_names(&self, sample: &Sample) -> Vec<&str> {
        let mut names = Vec::with_capacity(sample.location_ids.len());
        for id in &sample.location_ids {
            let Some(location) = self.locations.get(id) else {
                continue;
            };
            for line in &location.lines {
                if let Some(function) = self.functions.get(&line.function_id) {
                    names.push(function.name.as_str());
                }
            }
        }
        names.reverse();
        names
    }
}

/// Incrementally assembles a [`Profile`], interning functions and
/// locations by name.
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    profile: Profile,
    function_ids: HashMap<String, u64>,
    location_ids: HashMap<Vec<u64>, u64>,
}

impl ProfileBuilder {
    pub fn new(sample_types: Vec<ValueType>) -> Self {
        Self {
            profile: Profile {
                sample_types,
                ..Profile::default()
            },
            ..Self::default()
        }
    }

    /// Id of the function with this name, creating it if needed.
    pub fn function(&mut self, name: &str) -> u64 {
        if let Some(&id) = self.function_ids.get(name) {
            return id;
        }
        let id = self.profile.functions.len() as u64 + 1;
        self.profile.functions.insert(
            id,
            Function {
                id,
                name: name.to_string(),
                filename: None,
            },
        );
        self.function_ids.insert(name.to_string(), id);
        id
    }

    /// Id of a location whose lines are `inlined`, innermost first.
    pub fn location(&mut self, inlined: &[&str]) -> u64 {
        let function_ids: Vec<u64> = inlined.iter().map(|name| self.function(name)).collect();
        if let Some(&id) = self.location_ids.get(&function_ids) {
            return id;
        }
        let id = self.profile.locations.len() as u64 + 1;
        self.profile.locations.insert(
            id,
            Location {
                id,
                mapping_id: None,
                address: 0,
                lines: function_ids
                    .iter()
                    .map(|&function_id| Line {
                        function_id,
                        line: 0,
                    })
                    .collect(),
            },
        );
        self.location_ids.insert(function_ids, id);
        id
    }

    /// Add a sample whose stack is given root first, one function per frame.
    pub fn stack(&mut self, root_first: &[&str], values: Vec<i64>) -> &mut Self {
        let location_ids = root_first
            .iter()
            .rev()
            .map(|&name| self.location(&[name]))
            .collect();
        self.sample(location_ids, values)
    }

    /// Add a sample from location ids ordered leaf first.
    pub fn sample(&mut self, location_ids: Vec<u64>, values: Vec<i64>) -> &mut Self {
        self.profile.samples.push(Sample {
            location_ids,
            values,
        });
        self
    }

    pub fn mapping(&mut self, file: impl Into<String>) -> &mut Self {
        let id = self.profile.mappings.len() as u64 + 1;
        self.profile.mappings.push(Mapping {
            id,
            file: file.into(),
        });
        self
    }

    pub fn time(&mut self, time_nanos: i64, duration_nanos: i64) -> &mut Self {
        self.profile.time_nanos = time_nanos;
        self.profile.duration_nanos = duration_nanos;
        self
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_series() -> Profile {
        ProfileBuilder::new(vec![
            ValueType::new("cpu", "nanoseconds"),
            ValueType::new("alloc", "bytes"),
        ])
        .build()
    }

    #[test]
    fn resolves_series_by_name_and_index() {
        let profile = two_series();
        assert_eq!(profile.sample_index_by_name("cpu"), Some(0));
        assert_eq!(profile.sample_index_by_name("alloc"), Some(1));
        assert_eq!(profile.sample_index_by_name("1"), Some(1));
        assert_eq!(profile.sample_index_by_name("2"), None);
        assert_eq!(profile.sample_index_by_name("wall"), None);
    }

    #[test]
    fn strips_legacy_inuse_prefix() {
        let profile = ProfileBuilder::new(vec![
            ValueType::new("objects", "count"),
            ValueType::new("space", "bytes"),
        ])
        .build();
        assert_eq!(profile.sample_index_by_name("inuse_space"), Some(1));
        assert_eq!(profile.sample_index_by_name("inuse_objects"), Some(0));
    }

    #[test]
    fn stack_names_are_root_first() {
        let mut builder = ProfileBuilder::new(vec![ValueType::new("samples", "count")]);
        builder.stack(&["main", "work", "compute"], vec![1]);
        let profile = builder.build();
        assert_eq!(
            profile.stack_names(&profile.samples[0]),
            vec!["main", "work", "compute"]
        );
    }

    #[test]
    fn inlined_lines_add_depth() {
        let mut builder = ProfileBuilder::new(vec![ValueType::new("samples", "count")]);
        // leaf location has `helper` inlined into `work`
        let leaf = builder.location(&["helper", "work"]);
        let main = builder.location(&["main"]);
        builder.sample(vec![leaf, main], vec![1]);
        let profile = builder.build();
        assert_eq!(
            profile.stack_names(&profile.samples[0]),
            vec!["main", "work", "helper"]
        );
    }

    #[test]
    fn dangling_ids_are_skipped() {
        let mut builder = ProfileBuilder::new(vec![ValueType::new("samples", "count")]);
        let main = builder.location(&["main"]);
        builder.sample(vec![99, main], vec![1]);
        let profile = builder.build();
        assert_eq!(profile.stack_names(&profile.samples[0]), vec!["main"]);
    }

    #[test]
    fn builder_interns_functions() {
        let mut builder = ProfileBuilder::new(vec![ValueType::new("samples", "count")]);
        builder.stack(&["main", "foo"], vec![1]);
        builder.stack(&["main", "bar"], vec![1]);
        let profile = builder.build();
        assert_eq!(profile.functions.len(), 3);
        assert_eq!(profile.locations.len(), 3);
    }

    #[test]
    fn missing_value_reads_as_zero() {
        let sample = Sample {
            location_ids: vec![],
            values: vec![5],
        };
        assert_eq!(sample.value(0), 5);
        assert_eq!(sample.value(3), 0);
    }

    #[test]
    fn main_file_ignores_empty_names() {
        let mut builder = ProfileBuilder::new(vec![]);
        builder.mapping("");
        assert_eq!(builder.build().main_file(), None);

        let mut builder = ProfileBuilder::new(vec![]);
        builder.mapping("/usr/bin/server");
        assert_eq!(builder.build().main_file(), Some("/usr/bin/server"));
    }
}
