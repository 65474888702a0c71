/// Build the instruction that asks the model to phrase `keywords` as one
/// sentence in the tone named by `persona`.
pub fn build_prompt(keywords: &str, persona: &str) -> String {
    format!(
        "Convert these keywords into a natural {persona} sentence:\n\n\
         Keywords: {keywords}\n\n\
         Output only the final sentence. No explanation.",
        persona = persona.to_lowercase(),
    )
}
