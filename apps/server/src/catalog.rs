//! Built-in analysis types and the prompts sent to the model for each.

use std::collections::BTreeMap;

use video_interpreter_core::{AnalysisOptionsResponse, CUSTOM_ANALYSIS, OptionInfo};

use crate::error::ApiError;

pub const USAGE: &str =
    "Use the key (e.g., 'detailed_summary') as analysis_type in your request";

const CUSTOM_DESCRIPTION: &str = "Custom analysis based on user input";

/// `(key, prompt)` in presentation order.
const ANALYSIS_TYPES: &[(&str, &str)] = &[
    (
        "detailed_summary",
        "Give a detailed summary of this video. Include information about the setting, people involved, actions taking place, objects visible, and any dialogue or audio elements.",
    ),
    (
        "bullet_summary",
        "Summarize this video in a few short bullets. Focus on the key events and main points only.",
    ),
    (
        "timestamped_summary",
        "Generate a paragraph that summarizes this video, with corresponding timecodes. Break down what happens at different time intervals and provide a comprehensive overview.",
    ),
    (
        "quiz_generation",
        "Summarize this video in detail. Then create a quiz with 5-7 questions based on the information in this video. Include multiple choice, true/false, and short answer questions. Provide a complete answer key with explanations.",
    ),
    (
        "technical_analysis",
        "Analyze the technical aspects of this video including camera work, lighting, editing techniques, and overall production quality.",
    ),
    (
        "object_identification",
        "Identify and describe all the objects, people, and text visible in this video. Provide a comprehensive inventory of visual elements.",
    ),
    (CUSTOM_ANALYSIS, CUSTOM_DESCRIPTION),
];

/// A validated analysis type with the prompt to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub analysis_type: String,
    pub description: String,
    pub prompt: String,
}

pub fn description(key: &str) -> Option<&'static str> {
    ANALYSIS_TYPES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, prompt)| *prompt)
}

pub fn options_response() -> AnalysisOptionsResponse {
    let analysis_options: BTreeMap<String, OptionInfo> = ANALYSIS_TYPES
        .iter()
        .map(|(key, prompt)| {
            (
                key.to_string(),
                OptionInfo {
                    description: prompt.to_string(),
                },
            )
        })
        .collect();

    AnalysisOptionsResponse {
        analysis_options,
        usage: Some(USAGE.to_string()),
    }
}

/// Check the type and pick the prompt. `custom` takes the caller's prompt.
pub fn resolve(analysis_type: &str, custom_prompt: Option<&str>) -> Result<ResolvedPrompt, ApiError> {
    let Some(known) = description(analysis_type) else {
        return Err(ApiError::InvalidAnalysisType {
            choices: choices(),
        });
    };

    let prompt = if analysis_type == CUSTOM_ANALYSIS {
        custom_prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(ApiError::MissingCustomPrompt)?
    } else {
        known
    };

    Ok(ResolvedPrompt {
        analysis_type: analysis_type.to_string(),
        description: known.to_string(),
        prompt: prompt.to_string(),
    })
}

/// Keys rendered as a bracketed, quoted list: `['a', 'b']`.
fn choices() -> String {
    let keys: Vec<String> = ANALYSIS_TYPES
        .iter()
        .map(|(key, _)| format!("'{}'", key))
        .collect();
    format!("[{}]", keys.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_types_with_custom_last() {
        let response = options_response();
        assert_eq!(response.analysis_options.len(), 7);
        assert_eq!(
            response.analysis_options[CUSTOM_ANALYSIS].description,
            CUSTOM_DESCRIPTION
        );
        assert_eq!(ANALYSIS_TYPES.last().map(|(k, _)| *k), Some(CUSTOM_ANALYSIS));
    }

    #[test]
    fn builtin_types_use_their_own_prompt() {
        let resolved = resolve("bullet_summary", Some("ignored")).unwrap();
        assert!(resolved.prompt.starts_with("Summarize this video in a few short bullets"));
        assert_eq!(resolved.prompt, resolved.description);
    }

    #[test]
    fn custom_type_needs_a_non_blank_prompt() {
        assert!(matches!(
            resolve(CUSTOM_ANALYSIS, Some("   ")),
            Err(ApiError::MissingCustomPrompt)
        ));

        let resolved = resolve(CUSTOM_ANALYSIS, Some(" Count the cats ")).unwrap();
        assert_eq!(resolved.prompt, "Count the cats");
        assert_eq!(resolved.description, CUSTOM_DESCRIPTION);
    }

    #[test]
    fn unknown_type_lists_the_choices() {
        let err = resolve("haiku", None).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Invalid analysis_type. Choose from: ['detailed_summary', "));
        assert!(message.ends_with("'custom']"));
    }
}
