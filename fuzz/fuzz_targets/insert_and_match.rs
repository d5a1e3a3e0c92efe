#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Vec<(String, i32)>, String)| {
    let mut traject = traject::Traject::new();

    for (pattern, item) in data.0 {
        // malformed patterns and conflicts are expected
        let _ = traject.insert(&pattern, item);
    }

    let _ = traject.consume(traject::path_stack(&data.1));
    let _ = traject::Request::new(&data.1);
});
