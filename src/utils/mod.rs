//! Small shared utilities.

/// Maximum characters of generated text echoed into logs.
const PREVIEW_LEN: usize = 100;

/// Truncate generated text for logging. Media payloads are never logged at
/// all; responses are previewed so operators can follow conversations
/// without flooding the log.
pub fn preview(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= PREVIEW_LEN {
        flat
    } else {
        let truncated: String = flat.chars().take(PREVIEW_LEN).collect();
        format!("{truncated}...")
    }
}
