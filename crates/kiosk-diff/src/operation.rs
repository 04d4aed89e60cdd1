//! The ordered [`Diff`] container and its human-readable summary lines

use json_patch::{Patch, PatchOperation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered sequence of RFC 6902 patch operations.
///
/// Serializes as a bare JSON array of operations, e.g.
/// `[{"op": "replace", "path": "/storeInfo/name", "value": "Y"}]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff {
    operations: Vec<PatchOperation>,
}

impl Diff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations in application order.
    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the diff has no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterate over operations in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.operations.iter()
    }

    /// One human-readable line per operation.
    pub fn describe(&self) -> Vec<String> {
        self.operations.iter().map(summary_line).collect()
    }
}

impl From<Patch> for Diff {
    fn from(patch: Patch) -> Self {
        Self {
            operations: patch.0,
        }
    }
}

impl From<Vec<PatchOperation>> for Diff {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }
}

impl FromIterator<PatchOperation> for Diff {
    fn from_iter<I: IntoIterator<Item = PatchOperation>>(iter: I) -> Self {
        Self {
            operations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a PatchOperation;
    type IntoIter = std::slice::Iter<'a, PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Render one operation as a single line, e.g. `replace /storeInfo/name = "Y"`.
pub fn summary_line(op: &PatchOperation) -> String {
    match op {
        PatchOperation::Add(op) => {
            format!("add {} = {}", display_path(&op.path.to_string()), preview(&op.value))
        }
        PatchOperation::Remove(op) => format!("remove {}", display_path(&op.path.to_string())),
        PatchOperation::Replace(op) => {
            format!("replace {} = {}", display_path(&op.path.to_string()), preview(&op.value))
        }
        PatchOperation::Move(op) => format!(
            "move {} -> {}",
            display_path(&op.from.to_string()),
            display_path(&op.path.to_string())
        ),
        PatchOperation::Copy(op) => format!(
            "copy {} -> {}",
            display_path(&op.from.to_string()),
            display_path(&op.path.to_string())
        ),
        PatchOperation::Test(op) => {
            format!("test {} == {}", display_path(&op.path.to_string()), preview(&op.value))
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

const PREVIEW_LIMIT: usize = 60;

fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= PREVIEW_LIMIT {
        return rendered;
    }
    let truncated: String = rendered.chars().take(PREVIEW_LIMIT).collect();
    format!("{truncated}…")
}
