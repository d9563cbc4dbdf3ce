// ABOUTME: Prompt construction for the AI doctor chat feature
// ABOUTME: Builds the per-request prompt from mode, health profile, and user query
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Symptohexe Health

//! # AI Doctor Prompts
//!
//! The per-session persona instructions are loaded at compile time from a
//! markdown file; the per-request prompt is assembled here from the session
//! mode, any available health profile, and the user's query.

use crate::models::{DoctorMode, HealthData};
use std::fmt::Write;

/// AI doctor persona and safety instructions, sent as the system message
pub const DOCTOR_SYSTEM_PROMPT: &str = include_str!("doctor_system.md");

/// Get the system prompt for the AI doctor assistant
#[must_use]
pub const fn get_doctor_system_prompt() -> &'static str {
    DOCTOR_SYSTEM_PROMPT
}

/// Format present health profile fields into a text block for the prompt
///
/// Returns `None` when no health information has been recorded, so an empty
/// profile adds nothing to the prompt.
#[must_use]
pub fn format_health_block(health_data: &HealthData) -> Option<String> {
    if health_data.is_empty() {
        return None;
    }

    let mut block = String::from("User Health Information:\n");
    if let Some(age) = health_data.age {
        let _ = writeln!(block, "- Age: {age}");
    }
    if let Some(gender) = &health_data.gender {
        let _ = writeln!(block, "- Gender: {gender}");
    }
    if !health_data.conditions.is_empty() {
        let _ = writeln!(
            block,
            "- Medical conditions: {}",
            health_data.conditions.join(", ")
        );
    }
    if !health_data.medications.is_empty() {
        let _ = writeln!(
            block,
            "- Medications: {}",
            health_data.medications.join(", ")
        );
    }
    if !health_data.allergies.is_empty() {
        let _ = writeln!(block, "- Allergies: {}", health_data.allergies.join(", "));
    }

    Some(block)
}

/// Build the per-request prompt for a chat turn
///
/// Layout: mode header, health block when available, mode-specific
/// instruction, the user's query, and the fixed closing reminders.
#[must_use]
pub fn build_chat_prompt(
    mode: DoctorMode,
    health_block: Option<&str>,
    message: &str,
) -> String {
    let mode_name = match mode {
        DoctorMode::Personal => "Personal AI Doctor",
        DoctorMode::General => "General AI Doctor",
    };

    let mut prompt = format!(
        "You are an AI Doctor providing health information.\nDoctor Type: {mode_name}\n\n"
    );

    if let Some(block) = health_block {
        prompt.push_str(block);
        prompt.push('\n');
    }

    match mode {
        DoctorMode::Personal => {
            prompt.push_str(
                "As a Personal AI Doctor, remember to reference the user's health information in your response.\n\n",
            );
        }
        DoctorMode::General => {
            prompt.push_str(
                "As a General AI Doctor, provide general information without assuming personal health details.\n\n",
            );
        }
    }

    let _ = write!(
        prompt,
        "User query: {message}\n\n\
         Remember to:\n\
         - Clarify you are an AI, not a real doctor\n\
         - Avoid making definitive diagnoses\n\
         - Be empathetic yet professional\n\
         - Use simple language for medical concepts\n\
         - Include a disclaimer about seeking professional medical advice"
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_health_data_yields_no_block() {
        assert!(format_health_block(&HealthData::default()).is_none());
    }

    #[test]
    fn test_health_block_lists_present_fields_only() {
        let data = HealthData {
            age: Some(34),
            gender: None,
            conditions: vec!["asthma".into()],
            medications: vec![],
            allergies: vec!["penicillin".into()],
        };
        let block = format_health_block(&data).unwrap();

        assert!(block.contains("- Age: 34"));
        assert!(block.contains("- Medical conditions: asthma"));
        assert!(block.contains("- Allergies: penicillin"));
        assert!(!block.contains("Gender"));
        assert!(!block.contains("Medications"));
    }

    #[test]
    fn test_prompt_carries_mode_and_query() {
        let prompt = build_chat_prompt(DoctorMode::General, None, "is coffee healthy?");
        assert!(prompt.contains("General AI Doctor"));
        assert!(prompt.contains("User query: is coffee healthy?"));
        assert!(prompt.contains("professional medical advice"));
        assert!(!prompt.contains("Health Information"));
    }

    #[test]
    fn test_personal_prompt_embeds_health_block() {
        let data = HealthData {
            age: Some(60),
            ..HealthData::default()
        };
        let block = format_health_block(&data).unwrap();
        let prompt = build_chat_prompt(DoctorMode::Personal, Some(&block), "hello");
        assert!(prompt.contains("Personal AI Doctor"));
        assert!(prompt.contains("- Age: 60"));
        assert!(prompt.contains("reference the user's health information"));
    }
}
