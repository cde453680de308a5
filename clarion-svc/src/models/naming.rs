//! Output file naming convention
//!
//! Enhanced files are named `{stem}_{MODEL}{extension}`. Upload handlers
//! prefix staged files with `temp_`; that prefix is stripped so the final
//! name matches the user's original file.

use crate::models::EnhancementModel;
use std::path::Path;

/// Temporary-file prefix used when staging uploads
pub const TEMP_PREFIX: &str = "temp_";

/// Build the output file name for an input path and model.
///
/// `recording.wav` + `LarkV2` -> `recording_LARK_V2.wav`
pub fn output_file_name(input: &Path, model: EnhancementModel) -> String {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let stem = stem.strip_prefix(TEMP_PREFIX).unwrap_or(stem);

    match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, model.wire_name(), ext),
        None => format!("{}_{}", stem, model.wire_name()),
    }
}
