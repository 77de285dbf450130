/// Character budget for the protagonist's single-line visual descriptor.
pub const VISUAL_SUMMARY_CHAR_BUDGET: usize = 150;

pub const MIN_KEY_EVENTS: usize = 5;
pub const MAX_KEY_EVENTS: usize = 10;

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You are a literary analysis assistant. You read the full text of a book and
describe its narrative structure.

RULES:
1. Base every field on the supplied text. If something is not stated, use "N/A".
2. Output ONLY one JSON object. No prose before or after it.
3. Do NOT wrap the JSON in markdown code fences.
4. Use the exact keys requested, in camelCase.
"#;

/// Build the analysis prompt for one book.
pub fn build_analysis_prompt(book_text: &str) -> String {
    format!(
        r#"<book>
{book_text}
</book>

Analyze the book above and respond with a single JSON object with exactly these keys:

{{
  "title": "The title of the book, or \"N/A\"",
  "author": "The author of the book, or \"N/A\"",
  "genre": "The primary genre",
  "protagonist": {{
    "name": "Name of the main character",
    "age": "Age or apparent age range",
    "gender": "Gender as presented in the text, or \"N/A\"",
    "personality": "Key personality traits",
    "background": "Origins and history",
    "appearance": "Physical description from the text",
    "visualSummary": "One line, comma-separated, under {VISUAL_SUMMARY_CHAR_BUDGET} characters"
  }},
  "worldbuilding": "The world the story takes place in: societies, rules, technology or magic",
  "temporalSpatialSetting": "When and where the story happens",
  "plotSummary": "A concise summary of the whole plot",
  "keyEvents": [
    {{"episodeNum": 1, "eventSummary": "A key event in story order"}}
  ],
  "endingSummary": "How the story concludes",
  "bookOverview": "A general overview of the book and its main themes"
}}

Requirements:
- "keyEvents" must contain between {MIN_KEY_EVENTS} and {MAX_KEY_EVENTS} events, numbered from 1 in story order.
- "visualSummary" is a compact list of visual traits (build, hair, clothing, notable features).
  Use neutral descriptive terms; do not use ethnic, racial, religious or other sensitive
  demographic labels.
- Output the JSON object only: no explanations, no markdown, no code fences.
"#
    )
}
