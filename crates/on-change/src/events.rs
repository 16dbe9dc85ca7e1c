use on_change_model::Value;

use crate::path::Path;

/// The mutation channel that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Define,
    Delete,
    /// A method call, reported once for all the writes it made.
    Apply,
}

/// One logical change in the observed graph.
///
/// `previous` and `value` are underlying values, never handles. For
/// [`ChangeKind::Apply`] the path is the receiver's, `previous` is a snapshot
/// taken before the call and `value` is the receiver itself.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: Path,
    pub previous: Value,
    pub value: Value,
    pub kind: ChangeKind,
}
