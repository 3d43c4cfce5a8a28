//! Prompt text sent to the model

use chrono::{DateTime, TimeZone};

use crate::persona::Persona;

/// Formatting and language rules appended to every persona
const FORMATTING_RULES: &str = "
IMPORTANT RULES:
1. USE STRICT MARKDOWN.
2. ALWAYS put a blank line before headers (###).
3. ALWAYS put a blank line before and after lists.
4. LANGUAGE MATCHING: If the user speaks Thai, YOU MUST REPLY IN THAI. If English, reply in English.
5. AWARENESS: Be highly aware of the conversation context. Remember previous details the user shared.
6. RESPONSE STYLE: Keep responses engaging and consistent with your persona.
";

/// Reminder appended to the user's message on the wire only
const PROMPT_REMINDER: &str =
    "(SYSTEM NOTE: Please Use Double Newlines for Headers. Match User Language. Be Aware of Context.)";

/// Build the system instruction for a persona at a given time
#[must_use]
pub fn system_instruction<Tz>(persona: &Persona, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}\n{FORMATTING_RULES}\nCurrent date and time: {}",
        persona.system_prompt,
        now.format("%A, %Y-%m-%d %H:%M %:z")
    )
}

/// Decorate the user's prompt with the formatting reminder
#[must_use]
pub fn decorate_prompt(prompt: &str) -> String {
    format!("{prompt}\n\n{PROMPT_REMINDER}")
}

/// Instructions for the HTML rewrite pass
#[must_use]
pub fn reformat_prompt(text: &str) -> String {
    format!(
        "Please rewrite the following text using HTML formatting for a web chat interface.

RULES:
1. Use <h3> for headers.
2. Use <ul> and <li> for lists.
3. Use <p> for paragraphs.
4. Use <b> for bold text.
5. Add <br> tags for extra spacing where needed.
6. Do NOT use Markdown. ONLY HTML.
7. Return ONLY the HTML code.

TEXT TO FORMAT:
{text}
"
    )
}

/// Remove code-fence markers the model may wrap around its HTML
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```html", "")
        .replace("```HTML", "")
        .replace("```", "")
        .trim()
        .to_string()
}
