use crate::error::ApiError;

/// Trim the completion output and make sure something is left to speak.
pub fn validate_generated_sentence(raw: &str) -> Result<&str, ApiError> {
    let sentence = raw.trim();
    if sentence.is_empty() {
        return Err(ApiError::UpstreamText(anyhow::anyhow!(
            "completion service returned an empty sentence"
        )));
    }
    Ok(sentence)
}
