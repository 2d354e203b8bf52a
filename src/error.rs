use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Failures while building a tree.
///
/// Markup never fails to parse; malformed input is repaired like a browser would.
///
/// Once built, path-addressed operations never fail; they report `None`,
/// `false` or [`crate::TreeEvent::Unhandled`] for paths that do not resolve.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("data mode needs an item collection")]
    MissingData,

    #[error("no list element to build the tree from")]
    MissingList,
}
