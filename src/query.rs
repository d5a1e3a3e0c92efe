use crate::converter::{Converter, Converters};
use crate::error::{ConvertError, ParameterError};
use crate::params::Variables;
use crate::value::Value;

use std::collections::{BTreeMap, HashSet};
use url::form_urlencoded;

/// The key under which uncaptured query parameters are collected.
pub const EXTRA_PARAMETERS: &str = "extra_parameters";

/// A decoded query string.
///
/// Keys may repeat; values are kept in the order they appear.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Parses an `application/x-www-form-urlencoded` query string, without
    /// the leading `?`.
    pub fn parse(query: &str) -> Self {
        Query {
            pairs: form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value for `name`.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns the distinct keys, in order of first appearance.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(|key| seen.insert(*key))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Query {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Turns the query parameters of a request into typed arguments.
///
/// ```rust
/// use traject::{Converter, Converters, ParameterFactory, Query, Value, Variables};
///
/// let factory = ParameterFactory::new(
///     Variables::from([("page", 0)]),
///     Converters::from([("page", Converter::int())]),
///     &[],
///     false,
/// );
///
/// let arguments = factory.build(&Query::parse("page=3")).unwrap();
/// assert_eq!(arguments.get("page"), Some(&Value::Int(3)));
///
/// let arguments = factory.build(&Query::parse("")).unwrap();
/// assert_eq!(arguments.get("page"), Some(&Value::Int(0)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ParameterFactory {
    defaults: Variables,
    converters: Converters,
    required: HashSet<String>,
    capture_extra: bool,
}

impl ParameterFactory {
    /// Creates a factory for the parameters named in `defaults` and
    /// `required`.
    ///
    /// Parameters without an entry in `converters` use the identity
    /// converter. A parameter listed in `required` must be present in the
    /// query; it defaults to `Null` when `defaults` does not name it. With `capture_extra`, every other key is collected under
    /// [`EXTRA_PARAMETERS`].
    pub fn new(
        mut defaults: Variables,
        converters: Converters,
        required: &[&str],
        capture_extra: bool,
    ) -> Self {
        for &name in required {
            if !defaults.contains(name) {
                defaults.insert(name, Value::Null);
            }
        }

        ParameterFactory {
            defaults,
            converters,
            required: required.iter().map(|&name| name.to_owned()).collect(),
            capture_extra,
        }
    }

    /// The names of the known parameters.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defaults.iter().map(|(name, _)| name.as_str())
    }

    pub fn captures_extra(&self) -> bool {
        self.capture_extra
    }

    fn converter(&self, name: &str) -> Converter {
        self.converters.get_or_identity(name)
    }

    /// Builds the arguments out of `query`.
    pub fn build(&self, query: &Query) -> Result<Variables, ParameterError> {
        let mut result = Variables::new();

        for (name, default) in &self.defaults {
            let raw = query.get_all(name);
            let converter = self.converter(name);

            if converter.is_missing(&raw) {
                if self.required.contains(name) {
                    return Err(ParameterError::Missing { name: name.clone() });
                }
                result.insert(name.clone(), default.clone());
                continue;
            }

            let value = converter
                .decode_all(&raw)
                .map_err(|_| ParameterError::Decode {
                    name: name.clone(),
                    value: raw.join(","),
                })?;
            result.insert(name.clone(), value);
        }

        if !self.capture_extra {
            return Ok(result);
        }

        let extra: BTreeMap<String, Value> = query
            .keys()
            .into_iter()
            .filter(|key| !self.defaults.contains(key))
            .map(|key| {
                let value = match query.get_all(key).as_slice() {
                    [single] => Value::from(*single),
                    many => Value::List(many.iter().map(|&v| Value::from(v)).collect()),
                };
                (key.to_owned(), value)
            })
            .collect();

        trace!("captured {} extra parameters", extra.len());
        result.insert(EXTRA_PARAMETERS, Value::Map(extra));
        Ok(result)
    }

    /// Encodes the known parameters found in `variables` into a query string.
    ///
    /// `Null` values are left out. Captured extra parameters are appended
    /// when the factory captures them.
    pub fn encode(&self, variables: &Variables) -> Result<String, ConvertError> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());

        for name in self.names() {
            let Some(value) = variables.get(name).filter(|v| !v.is_null()) else {
                continue;
            };

            for raw in self.converter(name).encode_all(value)? {
                serializer.append_pair(name, &raw);
            }
        }

        if self.capture_extra {
            let extra = variables.get(EXTRA_PARAMETERS).and_then(Value::as_map);
            for (name, value) in extra.into_iter().flatten() {
                for raw in Converter::identity().list().encode_all(value)? {
                    serializer.append_pair(name, &raw);
                }
            }
        }

        Ok(serializer.finish())
    }
}
