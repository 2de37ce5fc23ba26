/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// Patterns are literals checked by the test suite, so a bad pattern fails
/// on first use rather than at every call site.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
