//! `Router` resolves request paths to models.
//!
//! Models are published by registering a [`ModelPath`]: a path pattern, the
//! query parameters the model takes, and a factory that builds the model out
//! of the collected arguments. Registration happens on a [`PathRegistry`],
//! which is frozen into a [`Router`] once all paths are known.
//!
//! Here is a simple example:
//! ```rust
//! use traject::{Converter, ModelPath, PathRegistry, Request, Variables};
//!
//! #[derive(Debug, PartialEq)]
//! struct Document {
//!     id: i64,
//!     page: i64,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = PathRegistry::new();
//! let document = registry.register(
//!     ModelPath::new("/documents/{id}")
//!         .converter("id", Converter::int())
//!         .parameter("page", 0),
//!     |args: &Variables| {
//!         Some(Document {
//!             id: args.get_int("id")?,
//!             page: args.get_int("page")?,
//!         })
//!     },
//! )?;
//! let router = registry.build();
//!
//! let resolved = router.consume(&Request::new("/documents/1/+edit?page=3"))?;
//! assert_eq!(resolved.model, Some(Document { id: 1, page: 3 }));
//! assert_eq!(resolved.view_name(), Some("edit"));
//!
//! let link = router.link(document, &Variables::from([("id", 1), ("page", 2)]))?;
//! assert_eq!(link, "/documents/1?page=2");
//! # Ok(())
//! # }
//! ```
//!
//! A path pattern is a sequence of steps separated by `/`. Each step is
//! literal text with optional variables:
//! ```ignore
//!  Syntax            Matches
//!  documents         exactly `documents`
//!  {id}              any non-empty segment
//!  {id:int}          a segment decoded by the `int` converter
//!  {name}-{version}  `foo-1`: name="foo", version="1"
//! ```
//!
//! Two variables always need literal text between them: `{a}{b}` is
//! rejected. Variable names are unique within a pattern.
//!
//! When several variable steps could match a segment, the most specific one
//! is tried first:
//! ```ignore
//!   Steps registered: {id}, prefix{id}, {id}.json
//!
//!   prefixfoo      matches prefix{id}: id="foo"
//!   foo.json       matches {id}.json:  id="foo"
//!   foo            matches {id}:       id="foo"
//! ```
//! Literal steps always take precedence over variable steps.
//!
//! Resolution stops at the first segment that starts with the reserved
//! marker (`+` by default), or that no step matches. The remaining segments
//! are left for view lookup:
//! ```ignore
//!   Path: /documents/{id}
//!
//!   /documents/1            model, unconsumed: []
//!   /documents/1/+edit      model, unconsumed: ["+edit"]
//!   /documents/1/edit       model, unconsumed: ["edit"]
//!   /documents/x            no model (with an int converter)
//! ```
use crate::config::RouterConfig;
use crate::converter::ConverterRegistry;
use crate::error::{ConfigError, LinkError, ParameterError, TrajectError};
use crate::params::Variables;
use crate::path::Path;
use crate::query::Query;
use crate::request::Request;
use crate::route::{ModelPath, ModelRoute};
use crate::tree::Traject;

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifies a registered model path, e.g. to generate links to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RouteId(usize);

/// Collects model paths before they are frozen into a [`Router`].
pub struct PathRegistry<M> {
    traject: Traject<RouteId>,
    routes: Vec<ModelRoute<M>>,
    // discriminator -> pattern
    discriminators: HashMap<String, String>,
    config: RouterConfig,
}

impl<M> PathRegistry<M> {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::from_config(RouterConfig::default())
    }

    /// Creates an empty registry, rejecting an invalid reserved marker.
    pub fn with_config(config: RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: RouterConfig) -> Self {
        PathRegistry {
            traject: Traject::new().with_marker(config.reserved_marker),
            routes: Vec::new(),
            discriminators: HashMap::new(),
            config,
        }
    }

    /// The converters that patterns can name inline, e.g. `{id:int}`.
    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        self.traject.registry_mut()
    }

    /// Registers a model path.
    ///
    /// `factory` is called with the wanted path variables and the decoded
    /// query parameters, and returns `None` if no model exists for them.
    ///
    /// Fails if the pattern is malformed, if its converters conflict with a
    /// previously registered path, or if a path matching exactly the same
    /// URLs was registered before. A failed registration leaves the registry
    /// unchanged.
    pub fn register<F>(&mut self, path: ModelPath, factory: F) -> Result<RouteId, TrajectError>
    where
        F: Fn(&Variables) -> Option<M> + Send + Sync + 'static,
    {
        let compiled = self.traject.compile(&path.pattern, &path.converters)?;

        let discriminator = compiled.discriminator();
        if let Some(existing) = self.discriminators.get(&discriminator) {
            return Err(TrajectError::DuplicatePath {
                path: path.pattern.clone(),
                with: existing.clone(),
            });
        }

        let model_args: HashSet<String> = match &path.model_args {
            Some(names) => names.clone(),
            None => compiled.names().map(str::to_owned).collect(),
        };

        let id = RouteId(self.routes.len());
        self.traject.add_path_wanting(&compiled, id, &model_args)?;
        self.discriminators
            .insert(discriminator, path.pattern.clone());

        debug!("registered model path `{}` as {:?}", path.pattern, id);
        self.routes.push(ModelRoute {
            path: compiled,
            parameters: path.parameter_factory(),
            model_args,
            factory: Box::new(factory),
        });

        Ok(id)
    }

    /// Freezes the registry.
    pub fn build(self) -> Router<M> {
        Router {
            traject: self.traject,
            routes: self.routes,
            config: self.config,
        }
    }
}

impl<M> Default for PathRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves requests against a fixed set of model paths.
///
/// A router is only read once built, and can be shared between threads.
pub struct Router<M> {
    traject: Traject<RouteId>,
    routes: Vec<ModelRoute<M>>,
    config: RouterConfig,
}

/// The outcome of resolving a request.
pub struct Resolved<M> {
    /// The model, or `None` if the path does not lead to one.
    pub model: Option<M>,
    /// The segments left for view lookup, as a stack. All the segments of
    /// the request when no model was found.
    pub unconsumed: Vec<String>,
    /// The arguments the model was built from: the wanted path variables and
    /// the query parameters. Empty when no model was found.
    pub variables: Variables,
    marker: char,
}

impl<M> Resolved<M> {
    fn not_found(segments: Vec<String>, marker: char) -> Self {
        Resolved {
            model: None,
            unconsumed: segments,
            variables: Variables::new(),
            marker,
        }
    }

    pub fn is_found(&self) -> bool {
        self.model.is_some()
    }

    /// The name of the view requested after the model.
    ///
    /// The default view `""` if no segments remain, the remaining segment
    /// without its reserved marker if exactly one remains, and `None`
    /// otherwise.
    pub fn view_name(&self) -> Option<&str> {
        match self.unconsumed.as_slice() {
            [] => Some(""),
            [segment] => Some(segment.strip_prefix(self.marker).unwrap_or(segment)),
            _ => None,
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for Resolved<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("model", &self.model)
            .field("unconsumed", &self.unconsumed)
            .field("variables", &self.variables)
            .finish()
    }
}

impl<M> Router<M> {
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The number of registered model paths.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The compiled path of a route.
    pub fn path(&self, route: RouteId) -> Option<&Path> {
        self.routes.get(route.0).map(|route| &route.path)
    }

    /// Resolves a request to a model.
    ///
    /// Not finding a model is not an error. Query parameters that are
    /// missing or cannot be decoded are.
    pub fn consume(&self, request: &Request) -> Result<Resolved<M>, ParameterError> {
        self.consume_stack(request.stack(), request.query())
    }

    /// Resolves a segment stack, next segment last, to a model.
    pub fn consume_stack(&self, stack: Vec<String>, query: &Query) -> Result<Resolved<M>, ParameterError> {
        let marker = self.traject.marker();
        let original = stack.clone();
        let matched = self.traject.consume(stack);

        let Some(&id) = matched.value else {
            debug!("no model path for segments {:?}", original);
            return Ok(Resolved::not_found(original, marker));
        };

        let route = &self.routes[id.0];
        let parameters = route.parameters.build(query)?;

        match route.model(&matched.variables, parameters) {
            (Some(model), variables) => {
                debug!("resolved model path `{}`", route.path.pattern());
                Ok(Resolved {
                    model: Some(model),
                    unconsumed: matched.unconsumed,
                    variables,
                    marker,
                })
            }
            (None, _) => {
                debug!("factory for `{}` found no model", route.path.pattern());
                Ok(Resolved::not_found(original, marker))
            }
        }
    }

    /// Generates the link of a route.
    ///
    /// Path variables are interpolated into the pattern; known query
    /// parameters with a value other than `Null` are appended as a query
    /// string.
    pub fn link(&self, route: RouteId, variables: &Variables) -> Result<String, LinkError> {
        let route = self.routes.get(route.0).ok_or(LinkError::UnknownRoute)?;

        let path = route.path.interpolate(variables)?;
        let query = route.parameters.encode(variables)?;

        let mut link = format!("{}{}", self.config.link_prefix, path);
        if !query.is_empty() {
            link.push('?');
            link.push_str(&query);
        }
        Ok(link)
    }
}
