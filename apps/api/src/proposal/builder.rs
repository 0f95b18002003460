//! Prompt Builder: combines a job description and background text into the
//! instruction document sent to the completion provider.

use rand::Rng;
use serde::Serialize;

use crate::proposal::prompts::{
    render, BANNED_PHRASES, METHODOLOGIES, OPENINGS, PROPOSAL_CHAR_LIMIT,
    PROPOSAL_PROMPT_TEMPLATE, VALUE_PROPS, VARIATION_BLOCK_TEMPLATE,
};
use crate::text::truncate_chars;

/// Per-fragment cap applied to the job description and the background independently.
pub const DEFAULT_FRAGMENT_CAP: usize = 4000;

pub const NO_JOB_DESCRIPTION: &str = "No job description provided";
pub const NO_BACKGROUND: &str = "No supporting content provided";

/// Randomly chosen style direction injected into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptVariation {
    pub opening: &'static str,
    pub methodology: &'static str,
    pub value_proposition: &'static str,
}

impl PromptVariation {
    /// Picks one entry from each candidate list. Same seed, same variation.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            opening: pick(OPENINGS, rng),
            methodology: pick(METHODOLOGIES, rng),
            value_proposition: pick(VALUE_PROPS, rng),
        }
    }

    fn block(&self) -> String {
        render(
            VARIATION_BLOCK_TEMPLATE,
            &[
                ("opening", self.opening),
                ("methodology", self.methodology),
                ("value_proposition", self.value_proposition),
            ],
        )
    }
}

fn pick<R: Rng + ?Sized>(candidates: &[&'static str], rng: &mut R) -> &'static str {
    candidates[rng.random_range(0..candidates.len())]
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    fragment_cap: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_FRAGMENT_CAP)
    }
}

impl PromptBuilder {
    pub fn new(fragment_cap: usize) -> Self {
        Self { fragment_cap }
    }

    /// Builds the proposal prompt. Pure: identical inputs yield identical text.
    pub fn create_upwork_prompt(
        &self,
        job_description: &str,
        background: &str,
        variation: Option<&PromptVariation>,
    ) -> String {
        let job = self.fragment(job_description, NO_JOB_DESCRIPTION);
        let background = self.fragment(background, NO_BACKGROUND);
        let char_limit = PROPOSAL_CHAR_LIMIT.to_string();
        let banned = BANNED_PHRASES
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let variation_block = variation.map(PromptVariation::block).unwrap_or_default();

        render(
            PROPOSAL_PROMPT_TEMPLATE,
            &[
                ("background", background),
                ("job_description", job),
                ("char_limit", char_limit.as_str()),
                ("banned_phrases", banned.as_str()),
                ("variation_block", variation_block.as_str()),
            ],
        )
    }

    fn fragment<'a>(&self, text: &'a str, placeholder: &'static str) -> &'a str {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            placeholder
        } else {
            truncate_chars(trimmed, self.fragment_cap)
        }
    }
}
