//! Converters between raw URL text and typed [`Value`]s.
//!
//! A [`Converter`] is used in two places: to decode path variables while a
//! segment is matched, and to decode query parameters when a model's
//! arguments are assembled. Encoding goes the other way and is used when
//! links are generated.
//!
//! Converters are identified by name. The names usable inside a pattern
//! (`{id:int}`) come from a [`ConverterRegistry`], which is populated while
//! routes are registered and is no longer consulted once the router is built.

use crate::error::ConvertError;
use crate::value::Value;

use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::sync::Arc;

/// The decode/encode capability behind a [`Converter`].
pub trait Codec: Send + Sync {
    /// The name the codec is registered and compared under.
    fn name(&self) -> &str;

    /// Decodes a single raw string.
    fn decode(&self, raw: &str) -> Result<Value, ConvertError>;

    /// Encodes a single value.
    fn encode(&self, value: &Value) -> Result<String, ConvertError>;
}

struct Identity;

impl Codec for Identity {
    fn name(&self) -> &str {
        "str"
    }

    fn decode(&self, raw: &str) -> Result<Value, ConvertError> {
        Ok(Value::Str(raw.to_owned()))
    }

    fn encode(&self, value: &Value) -> Result<String, ConvertError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => Ok(value.to_string()),
            _ => Err(ConvertError::new(self.name(), value.kind())),
        }
    }
}

struct Int;

impl Codec for Int {
    fn name(&self) -> &str {
        "int"
    }

    fn decode(&self, raw: &str) -> Result<Value, ConvertError> {
        raw.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConvertError::new(self.name(), raw))
    }

    fn encode(&self, value: &Value) -> Result<String, ConvertError> {
        match value {
            Value::Int(i) => Ok(i.to_string()),
            _ => Err(ConvertError::new(self.name(), value.kind())),
        }
    }
}

struct Float;

impl Codec for Float {
    fn name(&self) -> &str {
        "float"
    }

    fn decode(&self, raw: &str) -> Result<Value, ConvertError> {
        raw.parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .map(Value::Float)
            .ok_or_else(|| ConvertError::new(self.name(), raw))
    }

    fn encode(&self, value: &Value) -> Result<String, ConvertError> {
        match value {
            Value::Float(x) => Ok(x.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            _ => Err(ConvertError::new(self.name(), value.kind())),
        }
    }
}

struct Bool;

impl Codec for Bool {
    fn name(&self) -> &str {
        "bool"
    }

    fn decode(&self, raw: &str) -> Result<Value, ConvertError> {
        match raw {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(ConvertError::new(self.name(), raw)),
        }
    }

    fn encode(&self, value: &Value) -> Result<String, ConvertError> {
        match value {
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(ConvertError::new(self.name(), value.kind())),
        }
    }
}

type DecodeFn = dyn Fn(&str) -> Option<Value> + Send + Sync;
type EncodeFn = dyn Fn(&Value) -> Option<String> + Send + Sync;

struct Custom {
    name: String,
    decode: Box<DecodeFn>,
    encode: Box<EncodeFn>,
}

impl Codec for Custom {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, raw: &str) -> Result<Value, ConvertError> {
        (self.decode)(raw).ok_or_else(|| ConvertError::new(&self.name, raw))
    }

    fn encode(&self, value: &Value) -> Result<String, ConvertError> {
        (self.encode)(value).ok_or_else(|| ConvertError::new(&self.name, value.kind()))
    }
}

/// A bidirectional codec between raw strings and [`Value`]s.
///
/// Converters are cheap to clone and compare equal when they share a name
/// and are both single-valued or both list converters.
///
/// ```rust
/// use traject::{Converter, Value};
///
/// let int = Converter::int();
/// assert_eq!(int.decode("42"), Ok(Value::Int(42)));
/// assert!(int.decode("x").is_err());
/// assert_eq!(int, Converter::int());
/// assert_ne!(int, Converter::identity());
/// ```
#[derive(Clone)]
pub struct Converter {
    codec: Arc<dyn Codec>,
    list: bool,
}

impl Converter {
    /// Wraps a custom [`Codec`].
    pub fn new(codec: impl Codec + 'static) -> Self {
        Self {
            codec: Arc::new(codec),
            list: false,
        }
    }

    /// Builds a converter out of a pair of functions.
    ///
    /// `decode` returns `None` for input it rejects.
    pub fn from_fn<D, E>(name: impl Into<String>, decode: D, encode: E) -> Self
    where
        D: Fn(&str) -> Option<Value> + Send + Sync + 'static,
        E: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self::new(Custom {
            name: name.into(),
            decode: Box::new(decode),
            encode: Box::new(encode),
        })
    }

    /// The identity converter, used for every variable without an explicit one.
    pub fn identity() -> Self {
        Self::new(Identity)
    }

    pub fn int() -> Self {
        Self::new(Int)
    }

    pub fn float() -> Self {
        Self::new(Float)
    }

    pub fn boolean() -> Self {
        Self::new(Bool)
    }

    /// Turns this converter into one that accepts any number of values, as
    /// produced by a repeated query parameter.
    pub fn list(self) -> Self {
        Self { list: true, ..self }
    }

    /// Infers a converter from the type of a default value.
    pub fn for_value(value: &Value) -> Self {
        match value {
            Value::Int(_) => Self::int(),
            Value::Float(_) => Self::float(),
            Value::Bool(_) => Self::boolean(),
            Value::List(items) => items
                .first()
                .map_or_else(Self::identity, Self::for_value)
                .list(),
            _ => Self::identity(),
        }
    }

    /// The name of the underlying codec.
    pub fn name(&self) -> &str {
        self.codec.name()
    }

    /// Returns `true` for list converters.
    pub fn is_list(&self) -> bool {
        self.list
    }

    /// Decodes a single raw string, such as a path variable.
    pub fn decode(&self, raw: &str) -> Result<Value, ConvertError> {
        self.codec.decode(raw)
    }

    /// Encodes a single value.
    pub fn encode(&self, value: &Value) -> Result<String, ConvertError> {
        self.codec.encode(value)
    }

    /// Decodes all the values supplied for one query parameter.
    ///
    /// A single-valued converter accepts exactly one value.
    pub fn decode_all(&self, raw: &[&str]) -> Result<Value, ConvertError> {
        if self.list {
            return raw
                .iter()
                .map(|s| self.codec.decode(s))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List);
        }

        match raw {
            [single] => self.codec.decode(single),
            _ => Err(ConvertError::new(self.name(), raw.join(","))),
        }
    }

    /// Encodes a query parameter value into its raw strings.
    pub fn encode_all(&self, value: &Value) -> Result<Vec<String>, ConvertError> {
        match (self.list, value) {
            (true, Value::List(items)) => items.iter().map(|v| self.codec.encode(v)).collect(),
            _ => self.codec.encode(value).map(|s| vec![s]),
        }
    }

    /// Returns `true` if the supplied raw values count as absent.
    ///
    /// List converters never consider a parameter missing: no values decode
    /// to an empty list.
    pub fn is_missing(&self, raw: &[&str]) -> bool {
        !self.list && raw.is_empty()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list && self.name() == other.name()
    }
}

impl Eq for Converter {}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converter({self})")
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list {
            write!(f, "[{}]", self.name())
        } else {
            f.write_str(self.name())
        }
    }
}

/// An explicit assignment of converters to variable or parameter names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Converters(HashMap<String, Converter>);

impl Converters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a converter for `name`, replacing any previous one.
    pub fn with(mut self, name: impl Into<String>, converter: Converter) -> Self {
        self.insert(name, converter);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, converter: Converter) -> Option<Converter> {
        self.0.insert(name.into(), converter)
    }

    pub fn get(&self, name: &str) -> Option<&Converter> {
        self.0.get(name)
    }

    /// Returns the converter for `name`, or the identity converter.
    pub fn get_or_identity(&self, name: &str) -> Converter {
        self.0.get(name).cloned().unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Converter> {
        self.0.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Converter)> for Converters {
    fn from_iter<I: IntoIterator<Item = (K, Converter)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>, const N: usize> From<[(K, Converter); N]> for Converters {
    fn from(entries: [(K, Converter); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// The converters that can be referred to by name inside a pattern.
///
/// The default registry knows `str`, `int`, `float` and `bool`. More can be
/// added while routes are being registered.
#[derive(Clone, Debug)]
pub struct ConverterRegistry {
    converters: HashMap<String, Converter>,
}

impl ConverterRegistry {
    /// A registry without any converters.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registers `converter` under its own name.
    pub fn register(&mut self, converter: Converter) {
        debug!("registering converter `{}`", converter);
        self.converters.insert(converter.name().to_owned(), converter);
    }

    /// Registers `converter` under an alias.
    pub fn register_as(&mut self, name: impl Into<String>, converter: Converter) {
        self.converters.insert(name.into(), converter);
    }

    pub fn get(&self, name: &str) -> Option<&Converter> {
        self.converters.get(name)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Converter::identity());
        registry.register(Converter::int());
        registry.register(Converter::float());
        registry.register(Converter::boolean());
        registry
    }
}
