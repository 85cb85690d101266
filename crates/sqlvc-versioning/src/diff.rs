//! Text diffing engine

use similar::{ChangeTag, TextDiff};
use sqlvc_schema::ModifiedObject;

/// Lines of context around each hunk
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Diff engine for comparing object definitions
pub struct DiffEngine;

impl DiffEngine {
    /// Unified diff of a modified object, saved version first
    ///
    /// Headers name the object's identity key so several diffs can be
    /// printed back to back.
    pub fn object_diff(object: &ModifiedObject, context_lines: usize) -> String {
        let key = object.key().to_string();
        let diff = TextDiff::from_lines(&object.saved.definition, &object.current.definition);
        diff.unified_diff()
            .context_radius(context_lines)
            .header(&format!("saved/{key}"), &format!("current/{key}"))
            .missing_newline_hint(true)
            .to_string()
    }

    /// Count of inserted and deleted lines
    pub fn line_stats(old: &str, new: &str) -> (usize, usize) {
        TextDiff::from_lines(old, new)
            .iter_all_changes()
            .fold((0, 0), |(ins, del), change| match change.tag() {
                ChangeTag::Insert => (ins + 1, del),
                ChangeTag::Delete => (ins, del + 1),
                ChangeTag::Equal => (ins, del),
            })
    }
}
