/*!
 * Translation prompt shared by every provider.
 */

/// Rules the model is asked to follow so its output can be realigned line by line
const RULES: [&str; 9] = [
    "Keep the original line numbers unchanged",
    "Do not change the structure of blocks and the order of lines",
    "The first line of a block is always just a number",
    "Do not add new lines and symbols",
    "Keep special constructions (e.g., ♪) as is",
    "Consider the context of the entire text as if there were no line breaks and line numbering",
    "Do not change HTML tags (but translate the text inside the tags considering the overall context)",
    "For ambiguous expressions and words, choose a contextually appropriate translation",
    "Do not translate Latin",
];

/// Builds the single user message sent with each chunk
#[derive(Debug, Clone)]
pub struct TranslationPrompt {
    target_language: String,
}

impl TranslationPrompt {
    pub fn new(target_language: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Instructions followed by a blank line and the chunk content
    pub fn build(&self, content: &str) -> String {
        let mut prompt = format!(
            "Perform a literary translation into {} strictly adhering to:\n",
            self.target_language
        );
        for (number, rule) in RULES.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", number + 1, rule));
        }
        prompt.push('\n');
        prompt.push_str(content);
        prompt
    }
}
