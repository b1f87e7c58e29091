use slidemap_llm::{NOTES_MARKER, SLIDE_ID_MARKER, SUMMARY_MARKER};

/// Human-readable language name for a language code, used inside prompts.
pub fn language_name(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "de" => "German".to_string(),
        "en" => "English".to_string(),
        "fr" => "French".to_string(),
        "es" => "Spanish".to_string(),
        "it" => "Italian".to_string(),
        _ => code.to_string(),
    }
}

pub fn group_notes_system(lang: &str) -> String {
    format!(
        "You are a study assistant taking notes on one section of a lecture. \
You receive the markdown of each slide in the section and, when available, the slide images. \
Reply with a single JSON object and nothing else, using exactly these keys: \
\"slide_ids\" (array of the slide ids you were given), \
\"summary_bullets\" (3 to 7 short factual bullets), \
\"topics\" (the main concepts, most important first), \
\"connections\" (how the concepts relate to each other or to earlier material), \
\"uncertainties\" (anything unreadable, ambiguous or missing). \
Write all text values in {}.",
        language_name(lang)
    )
}

pub fn group_notes_user(group: usize, slides: &[(String, String)]) -> String {
    let mut out = format!("Slides of section {}:\n", group + 1);
    for (slide_id, markdown) in slides {
        out.push_str(&format!("\n{SLIDE_ID_MARKER} {slide_id}\n{}\n", markdown.trim()));
    }
    out
}

pub fn summary_system(lang: &str) -> String {
    format!(
        "You write a lecture summary for students revising for an exam. \
You receive structured notes for each section of the lecture, in lecture order. \
Produce Markdown: one top-level heading naming the lecture, then one second-level heading per section \
with concise bullet points. Keep the lecture order and do not invent content. \
Write in {}.",
        language_name(lang)
    )
}

pub fn summary_user(notes_json: &str) -> String {
    format!("{NOTES_MARKER}\n{notes_json}\n")
}

pub fn mind_map_system(lang: &str) -> String {
    format!(
        "You turn a lecture summary into a mind map. \
Reply with a single JSON object and nothing else: \
{{\"nodes\": [{{\"id\": \"...\", \"label\": \"...\"}}], \"edges\": [{{\"from\": \"...\", \"to\": \"...\", \"label\": \"...\"}}]}}. \
Node ids are unique lowercase ASCII snake_case identifiers. \
Every edge connects two existing node ids and its label names the relation. \
Write labels in {}.",
        language_name(lang)
    )
}

pub fn mind_map_user(summary: &str) -> String {
    format!("{SUMMARY_MARKER}\n{}\n", summary.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_map_to_names() {
        assert_eq!(language_name("de"), "German");
        assert_eq!(language_name("EN"), "English");
        assert_eq!(language_name("Klingon"), "Klingon");
    }

    #[test]
    fn group_prompt_lists_slides_in_given_order() {
        let prompt = group_notes_user(
            0,
            &[
                ("page-01".to_string(), "# Intro\n".to_string()),
                ("page-02".to_string(), "Details".to_string()),
            ],
        );
        let first = prompt.find("SLIDE_ID: page-01").unwrap();
        let second = prompt.find("SLIDE_ID: page-02").unwrap();
        assert!(first < second);
        assert!(prompt.starts_with("Slides of section 1:"));
    }

    #[test]
    fn system_prompts_name_the_language() {
        assert!(group_notes_system("de").contains("German"));
        assert!(summary_system("en").contains("English"));
        assert!(mind_map_system("fr").contains("French"));
    }
}
