use crate::converter::{Converter, ConverterRegistry, Converters};
use crate::error::TrajectError;
use crate::params::Variables;
use crate::path::Path;
use crate::step::Step;

use std::collections::{HashMap, HashSet};

/// The segment prefix reserved for view names.
pub const VIEW_PREFIX: char = '+';

/// A trie of path patterns.
///
/// Patterns are registered through `&mut self`; once registration is done
/// the trie is only read, and can be shared between threads.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use traject::{path_stack, Converter, Converters, Traject, Value};
///
/// let mut traject = Traject::new();
/// traject.insert("/documents", "all documents")?;
/// traject.add_pattern(
///     "/documents/{id}",
///     "one document",
///     &Converters::from([("id", Converter::int())]),
/// )?;
///
/// let matched = traject.consume(path_stack("/documents/1/+edit"));
/// assert_eq!(matched.value, Some(&"one document"));
/// assert_eq!(matched.unconsumed, ["+edit"]);
/// assert_eq!(matched.variables.get("id"), Some(&Value::Int(1)));
/// # Ok(())
/// # }
/// ```
pub struct Traject<T> {
    root: Node<T>,
    registry: ConverterRegistry,
    marker: char,
}

/// The outcome of walking the trie with a stack of segments.
#[derive(Debug, PartialEq)]
pub struct Match<'t, T> {
    /// The value registered at the node where the walk stopped, if any.
    pub value: Option<&'t T>,
    /// The segments that were not consumed, as a stack.
    pub unconsumed: Vec<String>,
    /// The variables extracted along the way.
    pub variables: Variables,
}

// A node in the trie.
//
// Literal steps are looked up by exact segment. Variable steps are kept in
// the order they are tried: most specific first.
struct Node<T> {
    literals: HashMap<String, Node<T>>,
    variables: Vec<Edge<T>>,
    value: Option<T>,
    // converters of every variable bound on the way from the root
    converters: HashMap<String, Converter>,
    // variables of the incoming step that some leaf below wants extracted
    wanted: HashSet<String>,
}

struct Edge<T> {
    step: Step,
    node: Node<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Node {
            literals: HashMap::new(),
            variables: Vec::new(),
            value: None,
            converters: HashMap::new(),
            wanted: HashSet::new(),
        }
    }
}

impl<T> Node<T> {
    // Returns the child registered for exactly this step.
    fn child(&self, step: &Step) -> Option<&Node<T>> {
        if !step.has_variables() {
            return self.literals.get(step.pattern());
        }

        self.variables
            .iter()
            .find(|edge| edge.step.pattern() == step.pattern())
            .map(|edge| &edge.node)
    }

    // Returns the child for this step, creating it at its priority position.
    fn add(&mut self, step: &Step) -> &mut Node<T> {
        if !step.has_variables() {
            return self.literals.entry(step.pattern().to_owned()).or_default();
        }

        let i = match self
            .variables
            .iter()
            .position(|edge| edge.step.pattern() == step.pattern())
        {
            Some(i) => i,
            None => {
                let at = self
                    .variables
                    .iter()
                    .position(|edge| *step < edge.step)
                    .unwrap_or(self.variables.len());

                self.variables.insert(
                    at,
                    Edge {
                        step: step.clone(),
                        node: Node::default(),
                    },
                );
                at
            }
        };

        &mut self.variables[i].node
    }

    /// Resolves a segment to the child it leads to.
    ///
    /// Literal children are tried first, then variable steps in priority
    /// order. The first match wins.
    fn resolve(&self, segment: &str, variables: &mut Variables) -> Option<&Node<T>> {
        if let Some(node) = self.literals.get(segment) {
            return Some(node);
        }

        self.variables
            .iter()
            .find(|edge| edge.step.matches(segment, variables, &edge.node.wanted))
            .map(|edge| &edge.node)
    }
}

impl<T> Traject<T> {
    /// Creates an empty trie that knows the built-in converters.
    pub fn new() -> Self {
        Self::with_converters(ConverterRegistry::default())
    }

    /// Creates an empty trie whose patterns may refer to the converters in
    /// `registry`.
    pub fn with_converters(registry: ConverterRegistry) -> Self {
        Traject {
            root: Node::default(),
            registry,
            marker: VIEW_PREFIX,
        }
    }

    /// Sets the prefix that marks a segment as a view name.
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// The prefix that stops a walk, `+` unless configured otherwise.
    pub fn marker(&self) -> char {
        self.marker
    }

    /// The converters available to `{name:converter}` placeholders.
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Mutable access to the converter registry, for setup.
    pub fn registry_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.registry
    }

    /// Compiles a pattern with this trie's converter registry.
    pub fn compile(&self, pattern: &str, converters: &Converters) -> Result<Path, TrajectError> {
        Path::compile(pattern, converters, &self.registry)
    }

    /// Registers a pattern without explicit converters.
    pub fn insert(&mut self, pattern: &str, value: T) -> Result<(), TrajectError> {
        self.add_pattern(pattern, value, &Converters::new())
    }

    /// Registers a pattern.
    ///
    /// Fails if the pattern is malformed, or if one of its variables is bound
    /// to a different converter than a previous registration sharing the same
    /// trie node. Registering a pattern whose node already holds a value is
    /// not an error; the first value is kept.
    pub fn add_pattern(
        &mut self,
        pattern: &str,
        value: T,
        converters: &Converters,
    ) -> Result<(), TrajectError> {
        let path = self.compile(pattern, converters)?;
        self.add_path(&path, value)
    }

    /// Registers a compiled path, extracting all of its variables.
    pub fn add_path(&mut self, path: &Path, value: T) -> Result<(), TrajectError> {
        let wanted = path.names().map(str::to_owned).collect();
        self.add_path_wanting(path, value, &wanted)
    }

    /// Registers a compiled path. Only the variables in `wanted` are
    /// extracted for it when it is matched.
    ///
    /// The trie is left untouched if registration fails.
    pub(crate) fn add_path_wanting(
        &mut self,
        path: &Path,
        value: T,
        wanted: &HashSet<String>,
    ) -> Result<(), TrajectError> {
        self.check_conflicts(path)?;

        let mut node = &mut self.root;
        let mut bound: Vec<(&str, &Converter)> = Vec::new();

        for step in path.steps() {
            bound.extend(step.variables());
            node = node.add(step);

            for (name, converter) in &bound {
                node.converters
                    .entry((*name).to_owned())
                    .or_insert_with(|| (*converter).clone());
            }

            node.wanted.extend(
                step.names()
                    .iter()
                    .filter(|name| wanted.contains(*name))
                    .cloned(),
            );
        }

        if node.value.is_some() {
            debug!("path `{}` is already registered, keeping the first value", path.pattern());
        } else {
            debug!("registered path `{}`", path.pattern());
            node.value = Some(value);
        }

        Ok(())
    }

    // Walks the existing nodes along `path` and compares converters.
    fn check_conflicts(&self, path: &Path) -> Result<(), TrajectError> {
        let mut node = Some(&self.root);
        let mut bound: Vec<(&str, &Converter)> = Vec::new();

        for step in path.steps() {
            bound.extend(step.variables());

            let Some(current) = node.and_then(|n| n.child(step)) else {
                return Ok(());
            };

            for (name, converter) in &bound {
                if current
                    .converters
                    .get(*name)
                    .is_some_and(|existing| existing != *converter)
                {
                    return Err(TrajectError::TypeConflict {
                        name: (*name).to_owned(),
                        pattern: path.pattern().to_owned(),
                    });
                }
            }

            node = Some(current);
        }

        Ok(())
    }

    /// Walks the trie, popping segments off `stack` for as long as they
    /// resolve.
    ///
    /// The walk stops at the first segment that carries the view marker or
    /// that no step matches. The returned value is the one registered at the
    /// node reached, which may be none even if a shorter prefix has a value.
    pub fn consume(&self, mut stack: Vec<String>) -> Match<'_, T> {
        let mut variables = Variables::new();
        let mut node = &self.root;

        while let Some(segment) = stack.last() {
            if segment.starts_with(self.marker) {
                trace!("segment `{}` is a view name, stopping", segment);
                break;
            }

            match node.resolve(segment, &mut variables) {
                Some(next) => {
                    trace!("consumed segment `{}`", segment);
                    node = next;
                    stack.pop();
                }
                None => {
                    trace!("no step matches segment `{}`", segment);
                    break;
                }
            }
        }

        Match {
            value: node.value.as_ref(),
            unconsumed: stack,
            variables,
        }
    }
}

impl<T> Default for Traject<T> {
    fn default() -> Self {
        Self::new()
    }
}
