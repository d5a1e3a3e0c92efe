use traject::{path_stack, Converter, Converters, Traject, Value, Variables};

macro_rules! consume_tests {
    ($($name:ident {
        routes = $routes:expr,
        $( $path:literal => $value:expr, [$($rest:literal),*], { $( $key:literal => $val:expr ),* $(,)? } );* $(;)?
    }),* $(,)?) => { $(
        #[test]
        fn $name() {
            let mut traject = Traject::new();

            for route in $routes {
                traject.insert(route, route).unwrap();
            }

            $(
                let matched = traject.consume(path_stack($path));

                assert_eq!(
                    matched.value.copied(), $value,
                    "Wrong value for path '{}'", $path
                );

                let expected_rest: Vec<&str> = vec![$($rest),*];
                assert_eq!(
                    matched.unconsumed, expected_rest,
                    "Wrong unconsumed segments for path '{}'", $path
                );

                let expected_variables: Vec<(&str, Value)> = vec![$(($key, Value::from($val))),*];
                assert_eq!(
                    matched.variables,
                    Variables::from_iter(expected_variables),
                    "Wrong variables for path '{}'", $path
                );
            )*
        }
   )* };
}

consume_tests! {
    literal {
        routes = ["a/b/c", "a/b/d", "x/y", "x/z"],
        "/a/b/c" => Some("a/b/c"), [], {};
        "/a/b/d" => Some("a/b/d"), [], {};
        "/x/y" => Some("x/y"), [], {};
        "/x/z" => Some("x/z"), [], {};
        "/a/b/c/d" => Some("a/b/c"), ["d"], {};
        "/a/b/d/d" => Some("a/b/d"), ["d"], {};
        "/x/y/1/2/3" => Some("x/y"), ["3", "2", "1"], {};
        "/1/2/3" => None, ["3", "2", "1"], {};
        // an intermediate node has no value of its own
        "/a/b" => None, [], {};
    },
    nested {
        routes = ["a", "a/b"],
        "/a" => Some("a"), [], {};
        "/a/b" => Some("a/b"), [], {};
        "/a/c" => Some("a"), ["c"], {};
        "/a/b/c" => Some("a/b"), ["c"], {};
    },
    root {
        routes = ["", "{foo}"],
        "/" => Some(""), [], {};
        "/+something" => Some(""), ["+something"], {};
        "/something" => Some("{foo}"), [], { "foo" => "something" };
        "/something/+edit" => Some("{foo}"), ["+edit"], { "foo" => "something" };
    },
    variable_specific_first {
        routes = ["a/{x}/b", "a/prefix{x}/b"],
        "/a/lah/b" => Some("a/{x}/b"), [], { "x" => "lah" };
        "/a/prefixlah/b" => Some("a/prefix{x}/b"), [], { "x" => "lah" };
    },
    multiple_steps_with_variables {
        routes = ["{x}/{y}"],
        "/x/y" => Some("{x}/{y}"), [], { "x" => "x", "y" => "y" };
        "/x" => None, [], { "x" => "x" };
    },
    nested_with_variable {
        routes = ["{id}", "{id}/sub"],
        "/a" => Some("{id}"), [], { "id" => "a" };
        "/b" => Some("{id}"), [], { "id" => "b" };
        "/a/sub" => Some("{id}/sub"), [], { "id" => "a" };
        "/a/other" => Some("{id}"), ["other"], { "id" => "a" };
    },
    greedy_middle_prefix {
        routes = ["a/prefix{x}/y", "a/{x}/z"],
        "/a/prefixX/y" => Some("a/prefix{x}/y"), [], { "x" => "X" };
        // the more specific step wins, even if it leads nowhere
        "/a/prefixX/z" => None, ["z"], { "x" => "X" };
        "/a/blah/z" => Some("a/{x}/z"), [], { "x" => "blah" };
    },
    literal_before_variable {
        routes = ["special", "{foo}"],
        "/special" => Some("special"), [], {};
        "/something" => Some("{foo}"), [], { "foo" => "something" };
    },
    mixed_steps {
        routes = ["{name}-{version}", "{name}", "v{version}"],
        "/foo-1" => Some("{name}-{version}"), [], { "name" => "foo", "version" => "1" };
        "/foo" => Some("{name}"), [], { "name" => "foo" };
        "/v2" => Some("v{version}"), [], { "version" => "2" };
        // the leftmost variable is greedy
        "/a-b-c" => Some("{name}-{version}"), [], { "name" => "a-b", "version" => "c" };
    },
    infix_priority {
        routes = ["{a}x{b}", "{a}xy{b}", "{a}xyz{b}"],
        "/1xyz2" => Some("{a}xyz{b}"), [], { "a" => "1", "b" => "2" };
        "/1xy2" => Some("{a}xy{b}"), [], { "a" => "1", "b" => "2" };
        "/1x2" => Some("{a}x{b}"), [], { "a" => "1", "b" => "2" };
    },
    inline_converter {
        routes = ["users/{id:int}", "users/{id:int}/posts/{post:int}"],
        "/users/1" => Some("users/{id:int}"), [], { "id" => 1 };
        "/users/1/posts/2" => Some("users/{id:int}/posts/{post:int}"), [], { "id" => 1, "post" => 2 };
        "/users/x" => None, ["x"], {};
        "/users/1/posts/x" => None, ["x"], { "id" => 1 };
    },
    normalized {
        routes = ["/a/b/", "//c"],
        "/a/./b" => Some("/a/b/"), [], {};
        "/x/../c/" => Some("//c"), [], {};
    },
}

#[test]
fn with_converter() {
    let mut traject = Traject::new();
    traject
        .add_pattern("{x}", "found", &Converters::from([("x", Converter::int())]))
        .unwrap();

    let matched = traject.consume(path_stack("/1"));
    assert_eq!(matched.value, Some(&"found"));
    assert_eq!(matched.variables, Variables::from([("x", 1)]));

    let matched = traject.consume(path_stack("/foo"));
    assert_eq!(matched.value, None);
    assert_eq!(matched.unconsumed, ["foo"]);
    assert!(matched.variables.is_empty());
}

#[test]
fn custom_converter() {
    let mut traject = Traject::new();
    traject.registry_mut().register(Converter::from_fn(
        "upper",
        |s| s.chars().all(char::is_uppercase).then(|| Value::from(s)),
        |v| v.as_str().map(str::to_owned),
    ));
    traject.insert("{code:upper}", "code").unwrap();
    traject.insert("{other}", "other").unwrap();

    assert_eq!(traject.consume(path_stack("/ABC")).value, Some(&"code"));
    assert_eq!(traject.consume(path_stack("/abc")).value, Some(&"other"));
}

#[test]
fn first_value_kept() {
    let mut traject = Traject::new();
    traject.insert("a/{x}", 1).unwrap();
    traject.insert("a/{x}", 2).unwrap();
    assert_eq!(traject.consume(path_stack("/a/b")).value, Some(&1));
}

#[test]
fn consume_is_deterministic() {
    let mut traject = Traject::new();
    for route in ["a/{x}", "a/{x}.json", "a/v{x}", "a/b/{y}"] {
        traject.insert(route, route).unwrap();
    }

    for path in ["/a/b", "/a/v1.json", "/a/b/c", "/a/x/y"] {
        let first = traject.consume(path_stack(path));
        for _ in 0..10 {
            assert_eq!(traject.consume(path_stack(path)), first);
        }
    }
}

#[test]
fn unwanted_variables_are_not_extracted() {
    let mut traject = Traject::new();
    let path = traject.compile("{a}/{b}", &Converters::new()).unwrap();
    traject.add_path(&path, "ab").unwrap();

    let matched = traject.consume(path_stack("/1/2"));
    assert_eq!(matched.variables, Variables::from([("a", "1"), ("b", "2")]));
}
