use criterion::{black_box, criterion_group, criterion_main, Criterion};
use traject::{path_stack, Converter, ModelPath, PathRegistry, Request, Traject, Variables};

macro_rules! routes {
    (literal) => {{
        routes!(finish => "p1", "p2", "p3")
    }};
    (brackets) => {{
        routes!(finish => "{p1}", "{p2}", "{p3}")
    }};
    (numeric) => {{
        routes!(finish => "1", "2", "3")
    }};
    (typed) => {{
        routes!(finish => "{p1:int}", "{p2:int}", "{p3:int}")
    }};
    (finish => $p1:literal, $p2:literal, $p3:literal) => {{
        [
            concat!("/documents"),
            concat!("/documents/", $p1),
            concat!("/documents/", $p1, "/versions"),
            concat!("/documents/", $p1, "/versions/", $p2),
            concat!("/documents/", $p1, "/versions/", $p2, "/diff/", $p3),
            concat!("/users"),
            concat!("/users/", $p1),
            concat!("/users/", $p1, "/documents"),
            concat!("/users/", $p1, "/groups/", $p2),
            concat!("/groups"),
            concat!("/groups/", $p1),
            concat!("/groups/", $p1, "/members"),
            concat!("/groups/", $p1, "/members/", $p2),
            concat!("/projects/", $p1, "/issues"),
            concat!("/projects/", $p1, "/issues/", $p2),
            concat!("/projects/", $p1, "/issues/", $p2, "/comments"),
            concat!("/projects/", $p1, "/issues/", $p2, "/comments/", $p3),
            concat!("/projects/", $p1, "/milestones/", $p2),
            concat!("/projects/", $p1, "/labels"),
            concat!("/search"),
            concat!("/settings"),
            concat!("/settings/", $p1),
        ]
    }};
}

fn consume(c: &mut Criterion) {
    let mut group = c.benchmark_group("Consume");

    let stacks: Vec<_> = routes!(literal).iter().map(|path| path_stack(path)).collect();

    let mut traject = Traject::new();
    for route in routes!(brackets) {
        traject.insert(route, true).unwrap();
    }
    group.bench_function("traject", |b| {
        b.iter(|| {
            for stack in black_box(&stacks) {
                let result = black_box(traject.consume(stack.clone()));
                assert_eq!(result.value, Some(&true));
            }
        });
    });

    let mut typed = Traject::new();
    for route in routes!(typed) {
        typed.insert(route, true).unwrap();
    }
    let numeric: Vec<_> = routes!(numeric).iter().map(|path| path_stack(path)).collect();
    group.bench_function("traject (int converters)", |b| {
        b.iter(|| {
            for stack in black_box(&numeric) {
                let result = black_box(typed.consume(stack.clone()));
                assert_eq!(result.value, Some(&true));
            }
        });
    });

    let mut registry = PathRegistry::new();
    for route in routes!(brackets) {
        registry
            .register(
                ModelPath::new(route)
                    .parameter("page", 0)
                    .converter("page", Converter::int()),
                |args: &Variables| Some(args.len()),
            )
            .unwrap();
    }
    let router = registry.build();
    let requests: Vec<_> = routes!(literal)
        .iter()
        .map(|path| Request::new(&format!("{path}?page=2")))
        .collect();
    group.bench_function("router", |b| {
        b.iter(|| {
            for request in black_box(&requests) {
                let result = black_box(router.consume(request).unwrap());
                assert!(result.is_found());
            }
        });
    });

    group.finish();
}

fn register(c: &mut Criterion) {
    c.bench_function("register", |b| {
        b.iter(|| {
            let mut traject = Traject::new();
            for route in black_box(routes!(brackets)) {
                traject.insert(route, true).unwrap();
            }
            traject
        });
    });
}

criterion_group!(benches, consume, register);
criterion_main!(benches);
