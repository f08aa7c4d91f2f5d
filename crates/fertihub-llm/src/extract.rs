/// Slice the outermost JSON object out of free-form model output.
///
/// Returns the text from the first `{` to the last `}` inclusive, which strips
/// markdown fences and any prose the model wraps around its answer.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
