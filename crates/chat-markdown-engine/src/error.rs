use thiserror::Error;

/// Usage errors reported at the API boundary.
///
/// Parsing and rendering themselves never fail: every input reduces to some tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("a custom {missing} is required when a custom {given} is supplied")]
    IncompleteEngine {
        missing: &'static str,
        given: &'static str,
    },
}
