use crate::path::{normalize_path, path_stack};
use crate::query::Query;

use percent_encoding::percent_decode_str;

/// The parts of an incoming request the router looks at: the path and the
/// query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    path: String,
    query: Query,
}

impl Request {
    /// Splits a request target such as `/a/b?x=1` into its path and query.
    ///
    /// ```rust
    /// let request = traject::Request::new("/a//b/../c?x=1");
    /// assert_eq!(request.path(), "/a/c");
    /// assert_eq!(request.query().get("x"), Some("1"));
    /// assert_eq!(request.stack(), ["c", "a"]);
    /// ```
    pub fn new(target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self::from_parts(path, query),
            None => Self::from_parts(target, ""),
        }
    }

    /// Builds a request out of a path and a raw query string.
    pub fn from_parts(path: &str, query: &str) -> Self {
        Request {
            path: normalize_path(path),
            query: Query::parse(query),
        }
    }

    /// The normalized path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The percent-decoded path segments as a stack, next segment last.
    ///
    /// Segments are split before decoding, so an encoded `/` stays inside
    /// its segment.
    pub fn stack(&self) -> Vec<String> {
        path_stack(&self.path)
            .into_iter()
            .map(|segment| percent_decode_str(&segment).decode_utf8_lossy().into_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_query() {
        let request = Request::new("/foo/bar/");
        assert_eq!(request.path(), "/foo/bar");
        assert!(request.query().is_empty());
        assert_eq!(request.stack(), ["bar", "foo"]);
    }

    #[test]
    fn root() {
        let request = Request::new("?a=1&a=2");
        assert_eq!(request.path(), "/");
        assert!(request.stack().is_empty());
        assert_eq!(request.query().get_all("a"), ["1", "2"]);
    }

    #[test]
    fn percent_decoded_stack() {
        let request = Request::new("/a%20b/c%2Fd/%2Bview");
        assert_eq!(request.path(), "/a%20b/c%2Fd/%2Bview");
        assert_eq!(request.stack(), ["+view", "c/d", "a b"]);
    }
}
