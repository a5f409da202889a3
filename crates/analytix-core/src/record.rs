//! Result rows produced when a run completes.

use serde::{Deserialize, Serialize};

use crate::InputFile;

/// One row of the output table. Synthesized from the input's name and size;
/// file contents are never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// 1-based position assigned at completion time.
    pub ordinal: usize,
    pub file_name: String,
    pub file_type: String,
    pub description: String,
    pub insights: String,
}

impl ResultRecord {
    pub fn synthesize(ordinal: usize, input: &InputFile) -> Self {
        let file_type = input.file_type();
        Self {
            ordinal,
            file_name: input.name.clone(),
            description: format!("Uploaded {} KB {} file", input.size_kb(), file_type),
            insights: format!("Auto-detected structure. No critical issues. {file_type} parsed."),
            file_type,
        }
    }
}
