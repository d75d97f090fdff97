//! Analysis prompt construction.

const ANALYSIS_PROMPT_TEMPLATE: &str = include_str!("../templates/recon/analysis_prompt.md");

// Scripts larger than this are truncated before being embedded, so one huge
// bundle cannot blow past the target model's context window.
const MAX_SCRIPT_CHARS: usize = 100_000;

const TRUNCATION_MARKER: &str = "\n\n[... truncated ...]";

/// Build the fixed instruction asking the model for a `{routes,
/// vulnerabilities}` JSON object, with the script text embedded.
pub fn build_analysis_prompt(script_text: &str) -> String {
    ANALYSIS_PROMPT_TEMPLATE.replace("{{SCRIPT}}", &truncate_script(script_text))
}

fn truncate_script(script_text: &str) -> String {
    if script_text.len() <= MAX_SCRIPT_CHARS {
        return script_text.to_string();
    }

    let mut cut = MAX_SCRIPT_CHARS;
    while !script_text.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut truncated = script_text[..cut].to_string();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
