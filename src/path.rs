use crate::converter::{ConverterRegistry, Converters};
use crate::error::{LinkError, TrajectError};
use crate::params::Variables;
use crate::step::Step;

use std::collections::HashSet;

/// Splits a path into its segments, eliminating `.` and `..` elements.
///
/// The following rules are applied:
///  1. Repeated slashes are treated as one.
///  2. Each `.` segment (the current directory) is dropped.
///  3. Each `..` segment (the parent directory) removes the segment before it.
///  4. `..` segments at the root are dropped.
///
/// A leading or trailing slash does not produce empty segments.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment.to_owned()),
        }
    }

    segments
}

/// Joins segments into a canonical path: a single leading slash and no
/// trailing slash, `/` for the root.
pub fn create_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::with_capacity(segments.iter().map(|s| s.as_ref().len() + 1).sum());

    for segment in segments {
        path.push('/');
        path.push_str(segment.as_ref());
    }

    if path.is_empty() {
        path.push('/');
    }

    path
}

/// Returns the canonical form of `path`.
///
/// `normalize_path(normalize_path(p)) == normalize_path(p)` for every `p`.
pub fn normalize_path(path: &str) -> String {
    create_path(&parse_path(path))
}

/// Returns the segments of `path` as a stack: the first segment is the last
/// element, so segments are consumed by popping.
pub fn path_stack(path: &str) -> Vec<String> {
    let mut stack = parse_path(path);
    stack.reverse();
    stack
}

/// A compiled path pattern, such as `document/{id:int}/{name}-{version}`.
#[derive(Clone, Debug)]
pub struct Path {
    pattern: String,
    steps: Vec<Step>,
}

impl Path {
    /// Compiles a pattern using the built-in converters only.
    pub fn new(pattern: &str) -> Result<Path, TrajectError> {
        Path::compile(pattern, &Converters::new(), &ConverterRegistry::default())
    }

    /// Compiles a pattern into its steps.
    ///
    /// Fails if any step is malformed or if a variable name occurs more than
    /// once anywhere in the pattern.
    pub fn compile(
        pattern: &str,
        converters: &Converters,
        registry: &ConverterRegistry,
    ) -> Result<Path, TrajectError> {
        let mut steps = Vec::new();
        let mut known = HashSet::new();

        for segment in parse_path(pattern) {
            let step = Step::compile(&segment, converters, registry).map_err(|err| match err {
                TrajectError::DuplicateVariable { name, .. } => TrajectError::DuplicateVariable {
                    name,
                    pattern: pattern.to_owned(),
                },
                TrajectError::TypeConflict { name, .. } => TrajectError::TypeConflict {
                    name,
                    pattern: pattern.to_owned(),
                },
                err => err,
            })?;

            for name in step.names() {
                if !known.insert(name.clone()) {
                    return Err(TrajectError::DuplicateVariable {
                        name: name.clone(),
                        pattern: pattern.to_owned(),
                    });
                }
            }

            steps.push(step);
        }

        Ok(Path {
            pattern: pattern.to_owned(),
            steps,
        })
    }

    /// The pattern as it was declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The variable names of all steps, in order of appearance.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .flat_map(|step| step.names().iter().map(String::as_str))
    }

    /// Returns the pattern with variable names erased.
    ///
    /// Two paths with the same discriminator match exactly the same URLs.
    ///
    /// ```rust
    /// let path = traject::Path::new("/foo/{x}/bar/{y}").unwrap();
    /// assert_eq!(path.discriminator(), "foo/{}/bar/{}");
    /// ```
    pub fn discriminator(&self) -> String {
        self.steps
            .iter()
            .map(Step::discriminator_info)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns the printf-like template of this path.
    pub fn interpolation_str(&self) -> String {
        self.steps
            .iter()
            .map(Step::interpolation_str)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Builds a concrete path out of encoded variable values.
    pub fn interpolate(&self, variables: &Variables) -> Result<String, LinkError> {
        if let Some(name) = self
            .names()
            .find(|name| variables.get(name).filter(|v| !v.is_null()).is_none())
        {
            return Err(LinkError::MissingVariable {
                name: name.to_owned(),
                pattern: self.pattern.clone(),
            });
        }

        let segments = self
            .steps
            .iter()
            .map(|step| step.interpolate(variables))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(create_path(&segments))
    }
}
