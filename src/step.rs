use crate::converter::{Converter, ConverterRegistry, Converters};
use crate::error::{ConvertError, TrajectError};
use crate::params::Variables;
use crate::value::Value;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

// Characters that cannot appear unescaped in an interpolated segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The compiled form of one segment of a path pattern.
///
/// A step is literal text with zero or more `{name}` or `{name:converter}`
/// placeholders. `"document"`, `"{id}"` and `"{name}-{version}"` are all
/// steps.
///
/// Steps registered under the same node are tried from most to least
/// specific; see the [`PartialOrd`] implementation.
#[derive(Clone)]
pub struct Step {
    pattern: String,
    generalized: String,
    parts: Vec<String>,
    names: Vec<String>,
    converters: Vec<Converter>,
    regex: Option<Regex>,
}

impl Step {
    /// Compiles a segment pattern without any explicit converters.
    pub fn new(pattern: &str) -> Result<Step, TrajectError> {
        Step::compile(pattern, &Converters::new(), &ConverterRegistry::default())
    }

    /// Compiles a segment pattern.
    ///
    /// Converters named inline (`{id:int}`) are looked up in `registry`;
    /// converters for the remaining variables come from `converters`, or
    /// default to the identity converter.
    pub fn compile(
        pattern: &str,
        converters: &Converters,
        registry: &ConverterRegistry,
    ) -> Result<Step, TrajectError> {
        let invalid = || TrajectError::InvalidStep {
            step: pattern.to_owned(),
        };

        let mut parts = Vec::new();
        let mut names: Vec<String> = Vec::new();
        let mut step_converters = Vec::new();
        let mut rest = pattern;

        while let Some(start) = rest.find('{') {
            let (literal, after) = (&rest[..start], &rest[start + 1..]);
            let end = after.find('}').ok_or_else(invalid)?;
            let variable = &after[..end];

            if literal.contains('}') || variable.contains('{') {
                return Err(invalid());
            }

            let (name, converter) = parse_variable(variable, converters, registry)?;
            if names.contains(&name) {
                return Err(TrajectError::DuplicateVariable {
                    name,
                    pattern: pattern.to_owned(),
                });
            }

            parts.push(literal.to_owned());
            names.push(name);
            step_converters.push(converter);
            rest = &after[end + 1..];
        }

        if rest.contains('}') {
            return Err(invalid());
        }
        parts.push(rest.to_owned());

        // only the literals between two variables must be non-empty
        if parts.len() > 2 && parts[1..parts.len() - 1].iter().any(String::is_empty) {
            return Err(TrajectError::ConsecutiveVariables {
                step: pattern.to_owned(),
            });
        }

        let regex = if names.is_empty() {
            None
        } else {
            Some(Regex::new(&structure_regex(&parts)).map_err(|_| invalid())?)
        };

        Ok(Step {
            pattern: pattern.to_owned(),
            generalized: parts.join("{}"),
            parts,
            names,
            converters: step_converters,
            regex,
        })
    }

    /// The pattern this step was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The pattern with variable names erased, e.g. `a{}b`.
    pub fn discriminator_info(&self) -> &str {
        &self.generalized
    }

    /// The literal text before, between and after the variables.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The variable names, in order of appearance.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_variables(&self) -> bool {
        !self.names.is_empty()
    }

    /// The converter for a variable of this step.
    pub fn converter(&self, name: &str) -> Option<&Converter> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.converters[i])
    }

    /// Returns the variables of this step with their converters.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Converter)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.converters.iter())
    }

    /// Matches a path segment against this step.
    ///
    /// On success the decoded values of the variables listed in `wanted` are
    /// written to `variables`; other variables are decoded but dropped. A
    /// value its converter rejects makes the whole step fail, and `variables`
    /// is left untouched.
    pub fn matches(&self, segment: &str, variables: &mut Variables, wanted: &HashSet<String>) -> bool {
        let Some(regex) = &self.regex else {
            return segment == self.pattern;
        };

        let Some(captures) = regex.captures(segment) else {
            return false;
        };

        let mut decoded = Vec::with_capacity(self.names.len());
        for (i, (name, converter)) in self.variables().enumerate() {
            let raw = captures.get(i + 1).map_or("", |m| m.as_str());
            let Ok(value) = converter.decode(raw) else {
                return false;
            };

            if wanted.contains(name) {
                decoded.push((name, value));
            }
        }

        variables.extend(decoded);
        true
    }

    /// The printf-like template of this step, e.g. `%(name)s-%(version)s`.
    pub fn interpolation_str(&self) -> String {
        let mut out = self.parts[0].clone();
        for (name, part) in self.names.iter().zip(&self.parts[1..]) {
            out.push_str("%(");
            out.push_str(name);
            out.push_str(")s");
            out.push_str(part);
        }
        out
    }

    /// Fills the placeholders with encoded values, percent-encoded so that
    /// each one stays inside its segment.
    ///
    /// A variable without a value is encoded as `Null`, which every built-in
    /// converter rejects.
    pub(crate) fn interpolate(&self, variables: &Variables) -> Result<String, ConvertError> {
        let mut out = self.parts[0].clone();
        for ((name, converter), part) in self.variables().zip(&self.parts[1..]) {
            let value = variables.get(name).unwrap_or(&Value::Null);
            out.extend(utf8_percent_encode(&converter.encode(value)?, SEGMENT));
            out.push_str(part);
        }
        Ok(out)
    }

    // Whether this step's structure matches the other step's pattern text,
    // i.e. whether this step is at least as general as the other.
    fn generalizes(&self, other: &Step) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(&other.pattern),
            None => self.pattern == other.pattern,
        }
    }
}

fn structure_regex(parts: &[String]) -> String {
    let mut re = String::from("(?s)^");
    re.push_str(&regex::escape(&parts[0]));
    for part in &parts[1..] {
        re.push_str("(.+)");
        re.push_str(&regex::escape(part));
    }
    re.push('$');
    re
}

// Parses the text between a pair of braces into a name and its converter.
fn parse_variable(
    variable: &str,
    converters: &Converters,
    registry: &ConverterRegistry,
) -> Result<(String, Converter), TrajectError> {
    let illegal = || TrajectError::InvalidVariable {
        variable: variable.to_owned(),
    };

    let mut pieces = variable.split(':');
    let name = pieces.next().unwrap_or_default();
    let converter_name = pieces.next();
    if pieces.next().is_some() || !is_identifier(name) {
        return Err(illegal());
    }

    let explicit = converters.get(name);
    let converter = match converter_name {
        None => explicit.cloned().unwrap_or_default(),
        Some(converter_name) => {
            let inline = registry
                .get(converter_name)
                .ok_or_else(|| TrajectError::UnknownConverter {
                    name: converter_name.to_owned(),
                })?;

            if explicit.is_some_and(|explicit| explicit != inline) {
                return Err(TrajectError::TypeConflict {
                    name: name.to_owned(),
                    pattern: format!("{{{variable}}}"),
                });
            }
            inline.clone()
        }
    };

    Ok((name.to_owned(), converter))
}

/// Returns `true` if `s` can be used as a variable name: a letter or
/// underscore followed by letters, digits and underscores.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Returns the names of the `{variables}` in `s`, in order of appearance.
///
/// Text outside braces is ignored.
pub fn parse_variables(s: &str) -> Result<Vec<String>, TrajectError> {
    let mut names = Vec::new();
    let mut rest = s;

    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };

        let variable = &after[..end];
        let name = variable.split(':').next().unwrap_or_default();
        if !is_identifier(name) {
            return Err(TrajectError::InvalidVariable {
                variable: variable.to_owned(),
            });
        }

        names.push(name.to_owned());
        rest = &after[end + 1..];
    }

    Ok(names)
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Orders sibling steps from most to least specific.
///
/// A step sorts before another if the other's structure matches its pattern
/// text but not the reverse: `prefix{x}` before `{x}`, `{a}x{b}` before
/// `{a}`, `ab{f}` before `a{f}`. Unrelated steps fall back to comparing their
/// literal parts in reverse (`b{f}` before `a{f}`). Steps that differ only in
/// variable names are not ordered.
impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.pattern == other.pattern {
            return Some(Ordering::Equal);
        }

        if self.parts == other.parts {
            return None;
        }

        match (self.generalizes(other), other.generalizes(self)) {
            (true, false) => Some(Ordering::Greater),
            (false, true) => Some(Ordering::Less),
            _ => Some(other.parts.cmp(&self.parts)),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("pattern", &self.pattern)
            .field("converters", &self.converters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> HashSet<String> {
        names.iter().map(|&n| n.to_owned()).collect()
    }

    fn sorted_steps(patterns: &[&str]) -> Vec<String> {
        let mut sorted: Vec<Step> = Vec::new();
        for pattern in patterns {
            let step = Step::new(pattern).unwrap();
            let at = sorted
                .iter()
                .position(|existing| step < *existing)
                .unwrap_or(sorted.len());
            sorted.insert(at, step);
        }
        sorted.into_iter().map(|s| s.pattern).collect()
    }

    #[test]
    fn name_step() {
        let step = Step::new("foo").unwrap();
        assert_eq!(step.pattern(), "foo");
        assert_eq!(step.discriminator_info(), "foo");
        assert_eq!(step.parts(), ["foo"]);
        assert!(step.names().is_empty());
        assert!(!step.has_variables());

        let mut variables = Variables::new();
        assert!(step.matches("foo", &mut variables, &names(&[])));
        assert!(!step.matches("bar", &mut variables, &names(&[])));
        assert!(variables.is_empty());
    }

    #[test]
    fn variable_step() {
        let step = Step::new("{foo}").unwrap();
        assert_eq!(step.discriminator_info(), "{}");
        assert_eq!(step.parts(), ["", ""]);
        assert_eq!(step.names(), ["foo"]);
        assert!(step.has_variables());

        let mut variables = Variables::new();
        assert!(step.matches("bar", &mut variables, &names(&["foo"])));
        assert_eq!(variables, Variables::from([("foo", "bar")]));

        // not wanted, so not extracted
        let mut variables = Variables::new();
        assert!(step.matches("bar", &mut variables, &names(&[])));
        assert!(variables.is_empty());
    }

    #[test]
    fn mixed_step() {
        let step = Step::new("a{foo}b").unwrap();
        assert_eq!(step.discriminator_info(), "a{}b");
        assert_eq!(step.parts(), ["a", "b"]);

        let wanted = names(&["foo"]);

        let mut variables = Variables::new();
        assert!(step.matches("abarb", &mut variables, &wanted));
        assert_eq!(variables, Variables::from([("foo", "bar")]));

        for segment in ["ab", "xbary", "yabarbx", "afoo"] {
            let mut variables = Variables::new();
            assert!(!step.matches(segment, &mut variables, &wanted), "{segment}");
            assert!(variables.is_empty());
        }
    }

    #[test]
    fn multi_mixed_step() {
        let step = Step::new("{foo}a{bar}").unwrap();
        assert_eq!(step.discriminator_info(), "{}a{}");
        assert_eq!(step.parts(), ["", "a", ""]);
        assert_eq!(step.names(), ["foo", "bar"]);
        assert_eq!(step.interpolation_str(), "%(foo)sa%(bar)s");

        let mut variables = Variables::new();
        assert!(step.matches("xaya", &mut variables, &names(&["foo", "bar"])));
        assert_eq!(variables, Variables::from([("foo", "x"), ("bar", "ya")]));
    }

    #[test]
    fn converter() {
        let converters = Converters::from([("foo", Converter::int())]);
        let step = Step::compile("{foo}", &converters, &ConverterRegistry::default()).unwrap();
        assert_eq!(step.discriminator_info(), "{}");

        let wanted = names(&["foo"]);

        let mut variables = Variables::new();
        assert!(step.matches("1", &mut variables, &wanted));
        assert_eq!(variables.get("foo"), Some(&Value::Int(1)));

        let mut variables = Variables::new();
        assert!(!step.matches("x", &mut variables, &wanted));
        assert!(variables.is_empty());
    }

    #[test]
    fn inline_converter() {
        let step = Step::new("{foo:int}").unwrap();
        assert_eq!(step.names(), ["foo"]);
        assert_eq!(step.converter("foo"), Some(&Converter::int()));
        assert_eq!(step.discriminator_info(), "{}");
    }

    #[test]
    fn inline_converter_disagrees_with_explicit() {
        let converters = Converters::from([("foo", Converter::float())]);
        let err = Step::compile("{foo:int}", &converters, &ConverterRegistry::default());
        assert!(matches!(err, Err(TrajectError::TypeConflict { .. })));
    }

    #[test]
    fn partial_decode_failure_leaves_variables() {
        let converters = Converters::from([("b", Converter::int())]);
        let step = Step::compile("{a}-{b}", &converters, &ConverterRegistry::default()).unwrap();

        let mut variables = Variables::new();
        assert!(!step.matches("x-y", &mut variables, &names(&["a", "b"])));
        assert!(variables.is_empty());
    }

    #[test]
    fn steps_the_same() {
        let step1 = Step::new("{foo}").unwrap();
        let step2 = Step::new("{foo}").unwrap();
        assert!(step1 == step2);
        assert!(!(step1 != step2));
        assert!(!(step1 < step2));
        assert!(!(step1 > step2));
        assert!(step1 >= step2);
        assert!(step1 <= step2);
    }

    #[test]
    fn step_different() {
        let step1 = Step::new("{foo}").unwrap();
        let step2 = Step::new("bar").unwrap();
        assert!(step1 != step2);
        assert!(!(step1 < step2));
        assert!(step1 > step2);
        assert!(step1 >= step2);
        assert!(!(step1 <= step2));
    }

    #[test]
    fn same_structure_unordered() {
        let step1 = Step::new("{a}").unwrap();
        let step2 = Step::new("{b}").unwrap();
        assert_eq!(step1.partial_cmp(&step2), None);
    }

    #[test]
    fn order_prefix_earlier() {
        assert_eq!(sorted_steps(&["{foo}", "prefix{foo}"]), ["prefix{foo}", "{foo}"]);
    }

    #[test]
    fn order_postfix_earlier() {
        assert_eq!(sorted_steps(&["{foo}", "{foo}postfix"]), ["{foo}postfix", "{foo}"]);
    }

    #[test]
    fn order_prefix_before_postfix() {
        assert_eq!(
            sorted_steps(&["{foo}", "a{foo}", "{foo}a"]),
            ["a{foo}", "{foo}a", "{foo}"]
        );
        assert_eq!(
            sorted_steps(&["{foo}", "a{foo}", "{foo}b"]),
            ["a{foo}", "{foo}b", "{foo}"]
        );
    }

    #[test]
    fn order_longer_prefix_before_shorter() {
        assert_eq!(sorted_steps(&["ab{f}", "a{f}"]), ["ab{f}", "a{f}"]);
        assert_eq!(sorted_steps(&["a{f}", "ab{g}"]), ["ab{g}", "a{f}"]);
    }

    #[test]
    fn order_longer_postfix_before_shorter() {
        assert_eq!(sorted_steps(&["{f}ab", "{f}b"]), ["{f}ab", "{f}b"]);
    }

    #[test]
    fn order_two_variables_before_one() {
        assert_eq!(sorted_steps(&["{a}x{b}", "{a}"]), ["{a}x{b}", "{a}"]);
        assert_eq!(sorted_steps(&["{a}x{b}x", "{a}x"]), ["{a}x{b}x", "{a}x"]);
        assert_eq!(sorted_steps(&["x{a}x{b}", "x{a}"]), ["x{a}x{b}", "x{a}"]);
    }

    #[test]
    fn order_two_variables_infix() {
        assert_eq!(
            sorted_steps(&["{a}xyz{b}", "{a}xy{b}", "{a}yz{b}", "{a}x{b}", "{a}z{b}", "{a}y{b}"]),
            ["{a}xyz{b}", "{a}yz{b}", "{a}z{b}", "{a}xy{b}", "{a}y{b}", "{a}x{b}"]
        );
    }

    #[test]
    fn order_reverse_alphabetical() {
        assert_eq!(sorted_steps(&["a{f}", "b{f}"]), ["b{f}", "a{f}"]);
        assert_eq!(sorted_steps(&["{f}a", "{f}b"]), ["{f}b", "{f}a"]);
    }

    #[test]
    fn invalid_steps() {
        assert!(matches!(Step::new("{foo"), Err(TrajectError::InvalidStep { .. })));
        assert!(matches!(Step::new("foo}"), Err(TrajectError::InvalidStep { .. })));
        assert!(matches!(Step::new("{a{b}"), Err(TrajectError::InvalidStep { .. })));
        assert!(matches!(
            Step::new("{a}{b}"),
            Err(TrajectError::ConsecutiveVariables { .. })
        ));
        assert!(matches!(
            Step::new("{a:int:int}"),
            Err(TrajectError::InvalidVariable { .. })
        ));
        assert!(matches!(Step::new("{1}"), Err(TrajectError::InvalidVariable { .. })));
        assert!(matches!(Step::new("{}"), Err(TrajectError::InvalidVariable { .. })));
        assert!(matches!(
            Step::new("{foo:blurb}"),
            Err(TrajectError::UnknownConverter { .. })
        ));
        assert!(matches!(
            Step::new("{foo}-{foo}"),
            Err(TrajectError::DuplicateVariable { .. })
        ));
    }

    #[test]
    fn identifier() {
        assert!(is_identifier("a"));
        assert!(!is_identifier(""));
        assert!(is_identifier("a1"));
        assert!(!is_identifier("1"));
        assert!(is_identifier("_"));
        assert!(is_identifier("_foo"));
        assert!(is_identifier("foo"));
        assert!(!is_identifier("."));
    }

    #[test]
    fn variables_in_text() {
        assert!(parse_variables("No variables").unwrap().is_empty());
        assert_eq!(
            parse_variables("The {foo} is the {bar}.").unwrap(),
            ["foo", "bar"]
        );
        assert!(parse_variables("{}").is_err());
        assert!(parse_variables("{1illegal}").is_err());
    }
}
