// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! TSPLIB-like instance loader.
//!
//! Parses the classic CVRP text format (`DIMENSION`, `CAPACITY`,
//! `NODE_COORD_SECTION`, `DEMAND_SECTION`, `DEPOT_SECTION`) plus two
//! extension sections for VRPTW instances (`TIME_WINDOW_SECTION`,
//! `SERVICE_TIME_SECTION`). Vertex ids in the file are 1-based; the loader
//! shifts them to the 0-based `VertexIndex` space with the depot at 0.

use crate::index::VertexIndex;
use crate::instance::{Instance, InstanceBuilder, VrpKind};
use std::path::Path;

/// Error raised while loading an instance file.
#[derive(Debug)]
pub enum InstanceLoadError {
    /// The file could not be read.
    Io(std::io::Error),
    /// A line could not be parsed; carries the 1-based line number and a
    /// description.
    Parse { line: usize, message: String },
    /// A required header or section is missing.
    Missing(&'static str),
}

impl std::fmt::Display for InstanceLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceLoadError::Io(err) => write!(f, "failed to read instance file: {}", err),
            InstanceLoadError::Parse { line, message } => {
                write!(f, "parse error on line {}: {}", line, message)
            }
            InstanceLoadError::Missing(what) => {
                write!(f, "instance file is missing {}", what)
            }
        }
    }
}

impl std::error::Error for InstanceLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceLoadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InstanceLoadError {
    fn from(err: std::io::Error) -> Self {
        InstanceLoadError::Io(err)
    }
}

/// Loader for TSPLIB-like CVRP/VRPTW instance files.
#[derive(Debug, Clone, Default)]
pub struct InstanceLoader {
    /// Overrides the problem kind detected from the file when set.
    kind_override: Option<VrpKind>,
}

impl InstanceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the loaded instance to the given problem kind regardless of
    /// which sections the file carries.
    pub fn with_kind(kind: VrpKind) -> Self {
        Self {
            kind_override: Some(kind),
        }
    }

    /// Loads an instance from a file path.
    pub fn from_path(&self, path: &Path) -> Result<Instance, InstanceLoadError> {
        let text = std::fs::read_to_string(path)?;
        self.from_str(&text)
    }

    /// Loads an instance from raw text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(&self, text: &str) -> Result<Instance, InstanceLoadError> {
        let mut name = String::from("unnamed");
        let mut dim: Option<usize> = None;
        let mut capacity: Option<f64> = None;

        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut demands: Vec<(usize, f64)> = Vec::new();
        let mut windows: Vec<(usize, f64, f64)> = Vec::new();
        let mut services: Vec<(usize, f64)> = Vec::new();

        #[derive(PartialEq, Clone, Copy)]
        enum Section {
            None,
            Coords,
            Demands,
            Depot,
            Windows,
            Services,
        }
        let mut section = Section::None;

        for (line_no, raw) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let line = raw.trim();
            if line.is_empty() || line == "EOF" {
                continue;
            }

            if let Some((key, value)) = split_header(line) {
                section = Section::None;
                match key {
                    "NAME" => name = value.to_string(),
                    "DIMENSION" => {
                        dim = Some(parse_field(value, line_no, "DIMENSION")?);
                    }
                    "CAPACITY" => {
                        capacity = Some(parse_field(value, line_no, "CAPACITY")?);
                    }
                    // TYPE, COMMENT, EDGE_WEIGHT_TYPE etc. are informative
                    _ => {}
                }
                continue;
            }

            match line {
                "NODE_COORD_SECTION" => {
                    section = Section::Coords;
                    continue;
                }
                "DEMAND_SECTION" => {
                    section = Section::Demands;
                    continue;
                }
                "DEPOT_SECTION" => {
                    section = Section::Depot;
                    continue;
                }
                "TIME_WINDOW_SECTION" => {
                    section = Section::Windows;
                    continue;
                }
                "SERVICE_TIME_SECTION" => {
                    section = Section::Services;
                    continue;
                }
                _ => {}
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            match section {
                Section::Coords => {
                    expect_fields(&fields, 3, line_no, "NODE_COORD_SECTION")?;
                    coords.push((
                        parse_field::<usize>(fields[0], line_no, "vertex id")?,
                        parse_field(fields[1], line_no, "x coordinate")?,
                        parse_field(fields[2], line_no, "y coordinate")?,
                    ));
                }
                Section::Demands => {
                    expect_fields(&fields, 2, line_no, "DEMAND_SECTION")?;
                    demands.push((
                        parse_field::<usize>(fields[0], line_no, "vertex id")?,
                        parse_field(fields[1], line_no, "demand")?,
                    ));
                }
                Section::Windows => {
                    expect_fields(&fields, 3, line_no, "TIME_WINDOW_SECTION")?;
                    windows.push((
                        parse_field::<usize>(fields[0], line_no, "vertex id")?,
                        parse_field(fields[1], line_no, "earliest")?,
                        parse_field(fields[2], line_no, "latest")?,
                    ));
                }
                Section::Services => {
                    expect_fields(&fields, 2, line_no, "SERVICE_TIME_SECTION")?;
                    services.push((
                        parse_field::<usize>(fields[0], line_no, "vertex id")?,
                        parse_field(fields[1], line_no, "service time")?,
                    ));
                }
                // Depot entries are "1" then "-1"; the depot is fixed at
                // vertex 0 after the id shift, so nothing to record.
                Section::Depot => {}
                Section::None => {
                    return Err(InstanceLoadError::Parse {
                        line: line_no,
                        message: format!("unexpected content outside any section: {:?}", line),
                    });
                }
            }
        }

        let dim = dim.ok_or(InstanceLoadError::Missing("DIMENSION"))?;
        let capacity = capacity.ok_or(InstanceLoadError::Missing("CAPACITY"))?;
        if coords.is_empty() {
            return Err(InstanceLoadError::Missing("NODE_COORD_SECTION"));
        }

        let kind = match self.kind_override {
            Some(kind) => kind,
            None if windows.is_empty() => VrpKind::Cvrp,
            None => VrpKind::Vrptw,
        };

        let mut builder = InstanceBuilder::new(dim, kind);
        builder.name(name).capacity(capacity);

        for (id, x, y) in coords {
            builder.coord(shift_id(id, dim)?, x, y);
        }
        for (id, d) in demands {
            builder.demand(shift_id(id, dim)?, d);
        }
        for (id, e, l) in windows {
            builder.time_window(shift_id(id, dim)?, e, l);
        }
        for (id, s) in services {
            builder.service_time(shift_id(id, dim)?, s);
        }

        Ok(builder.build())
    }
}

fn split_header(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    // Section markers have no colon; keys are upper-case words.
    if key.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        Some((key, value.trim()))
    } else {
        None
    }
}

fn parse_field<T: std::str::FromStr>(
    value: &str,
    line: usize,
    what: &str,
) -> Result<T, InstanceLoadError> {
    value.parse().map_err(|_| InstanceLoadError::Parse {
        line,
        message: format!("invalid {}: {:?}", what, value),
    })
}

fn expect_fields(
    fields: &[&str],
    expected: usize,
    line: usize,
    section: &str,
) -> Result<(), InstanceLoadError> {
    if fields.len() < expected {
        return Err(InstanceLoadError::Parse {
            line,
            message: format!(
                "{} entry has {} fields, expected {}",
                section,
                fields.len(),
                expected
            ),
        });
    }
    Ok(())
}

fn shift_id(id: usize, dim: usize) -> Result<VertexIndex, InstanceLoadError> {
    if id == 0 || id > dim {
        return Err(InstanceLoadError::Parse {
            line: 0,
            message: format!("vertex id {} outside 1..={}", id, dim),
        });
    }
    Ok(VertexIndex::new(id - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VertexIndex;

    const TOY_CVRP: &str = "\
NAME : toy
TYPE : CVRP
DIMENSION : 3
EDGE_WEIGHT_TYPE : EUC_2D
CAPACITY : 10
NODE_COORD_SECTION
1 0 0
2 3 0
3 0 4
DEMAND_SECTION
1 0
2 4
3 5
DEPOT_SECTION
1
-1
EOF
";

    #[test]
    fn test_loads_cvrp_instance() {
        let inst = InstanceLoader::new().from_str(TOY_CVRP).unwrap();
        assert_eq!(inst.name(), "toy");
        assert_eq!(inst.kind(), VrpKind::Cvrp);
        assert_eq!(inst.dim(), 3);
        assert_eq!(inst.capacity(), 10.0);
        assert_eq!(inst.demand(VertexIndex::new(1)), 4.0);
        assert_eq!(inst.cost(VertexIndex::new(1), VertexIndex::new(2)), 5.0);
    }

    #[test]
    fn test_time_window_section_switches_to_vrptw() {
        let text = format!(
            "{}TIME_WINDOW_SECTION\n1 0 100\n2 0 50\n3 10 60\nSERVICE_TIME_SECTION\n1 0\n2 5\n3 5\nEOF\n",
            TOY_CVRP.trim_end_matches("EOF\n")
        );
        let inst = InstanceLoader::new().from_str(&text).unwrap();
        assert_eq!(inst.kind(), VrpKind::Vrptw);
        let tw = inst.time_window(VertexIndex::new(2));
        assert_eq!(tw.earliest, 10.0);
        assert_eq!(tw.latest, 60.0);
        assert_eq!(inst.service_time(VertexIndex::new(1)), 5.0);
    }

    #[test]
    fn test_kind_override_wins() {
        let loader = InstanceLoader::with_kind(VrpKind::Vrptw);
        let inst = loader.from_str(TOY_CVRP).unwrap();
        assert_eq!(inst.kind(), VrpKind::Vrptw);
    }

    #[test]
    fn test_missing_capacity_is_reported() {
        let text = "DIMENSION : 2\nNODE_COORD_SECTION\n1 0 0\n2 1 1\nEOF\n";
        let err = InstanceLoader::new().from_str(text).unwrap_err();
        assert!(matches!(err, InstanceLoadError::Missing("CAPACITY")));
    }

    #[test]
    fn test_garbage_line_is_a_parse_error() {
        let text = "DIMENSION : 2\nCAPACITY : 5\nwhat is this\n";
        let err = InstanceLoader::new().from_str(text).unwrap_err();
        match err {
            InstanceLoadError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected parse error, got {}", other),
        }
    }
}
