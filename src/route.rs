use crate::converter::{Converter, Converters};
use crate::params::Variables;
use crate::path::Path;
use crate::query::ParameterFactory;
use crate::value::Value;

use std::collections::HashSet;

/// The function that turns arguments into a model. Returning `None` means
/// the model does not exist.
pub(crate) type Factory<M> = dyn Fn(&Variables) -> Option<M> + Send + Sync;

/// Model path definition
///
/// `ModelPath` uses a builder-like pattern for configuration. Only the
/// pattern is mandatory.
///
/// ```rust
/// use traject::{Converter, ModelPath};
///
/// let path = ModelPath::new("/documents/{id}")
///     .converter("id", Converter::int())
///     .parameter("page", 0)
///     .parameter("q", None::<String>)
///     .extra_parameters();
/// # let _ = path;
/// ```
#[derive(Clone, Debug)]
pub struct ModelPath {
    pub(crate) pattern: String,
    pub(crate) converters: Converters,
    pub(crate) defaults: Variables,
    pub(crate) required: HashSet<String>,
    pub(crate) capture_extra: bool,
    pub(crate) model_args: Option<HashSet<String>>,
}

impl ModelPath {
    pub fn new(pattern: impl Into<String>) -> Self {
        ModelPath {
            pattern: pattern.into(),
            converters: Converters::new(),
            defaults: Variables::new(),
            required: HashSet::new(),
            capture_extra: false,
            model_args: None,
        }
    }

    /// Sets the converter of a path variable or query parameter.
    pub fn converter(mut self, name: impl Into<String>, converter: Converter) -> Self {
        self.converters.insert(name, converter);
        self
    }

    /// Declares a query parameter with its default value.
    ///
    /// Without an explicit converter, the converter is inferred from the
    /// type of the default: integers, floats and booleans get theirs, lists
    /// a list converter, anything else the identity converter.
    pub fn parameter(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.defaults.insert(name, default);
        self
    }

    /// Marks a query parameter as required, declaring it if needed.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.defaults.contains(&name) {
            self.defaults.insert(name.clone(), Value::Null);
        }
        self.required.insert(name);
        self
    }

    /// Collects undeclared query parameters under `extra_parameters`.
    pub fn extra_parameters(mut self) -> Self {
        self.capture_extra = true;
        self
    }

    /// Restricts the path variables handed to the model factory.
    ///
    /// By default every variable of the pattern is passed.
    pub fn model_args<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model_args = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    // Converters for query parameters, explicit or inferred from defaults.
    pub(crate) fn parameter_factory(&self) -> ParameterFactory {
        let converters = self
            .defaults
            .iter()
            .map(|(name, default)| {
                let converter = self
                    .converters
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| Converter::for_value(default));
                (name.clone(), converter)
            })
            .collect();

        let required: Vec<&str> = self.required.iter().map(String::as_str).collect();
        ParameterFactory::new(
            self.defaults.clone(),
            converters,
            &required,
            self.capture_extra,
        )
    }
}

/// A registered model path.
pub(crate) struct ModelRoute<M> {
    pub(crate) path: Path,
    pub(crate) parameters: ParameterFactory,
    pub(crate) model_args: HashSet<String>,
    pub(crate) factory: Box<Factory<M>>,
}

impl<M> ModelRoute<M> {
    /// Calls the factory with the wanted path variables and the parameters.
    pub(crate) fn model(&self, variables: &Variables, parameters: Variables) -> (Option<M>, Variables) {
        let mut arguments = parameters;
        arguments.extend(variables.restricted_to(&self.model_args));
        ((self.factory)(&arguments), arguments)
    }
}
