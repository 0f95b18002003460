use serde::Serialize;

use crate::proposal::insights::technologies_mentioned;
use crate::proposal::prompts::PROPOSAL_CHAR_LIMIT;

/// Above this many characters a proposal is reported as close to the limit.
pub const NEAR_LIMIT_CHARS: usize = 4500;

/// Proposals with at least this many words (and within limit) rate as excellent.
const EXCELLENT_MIN_WORDS: usize = 100;

const WORDS_PER_CONNECT: usize = 150;
const MIN_CONNECTS: usize = 1;
const MAX_CONNECTS: usize = 6;

const STRENGTH_WORDS: &[&str] = &[
    "experience",
    "improved",
    "increased",
    "reduced",
    "built",
    "implemented",
    "achieved",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    UnderLimit,
    NearLimit,
    OverLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Excellent,
    Good,
    TooLong,
}

/// Counts and limit checks computed from the finished proposal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalMetrics {
    pub word_count: usize,
    pub char_count: usize,
    pub char_limit: usize,
    /// Negative once the proposal is over the limit.
    pub remaining_chars: i64,
    pub limit_status: LimitStatus,
    pub connects_estimate: usize,
    pub quality: QualityRating,
}

impl ProposalMetrics {
    pub fn measure(proposal: &str) -> Self {
        let word_count = proposal.split_whitespace().count();
        let char_count = proposal.chars().count();
        let within_limit = char_count <= PROPOSAL_CHAR_LIMIT;

        let limit_status = if char_count <= NEAR_LIMIT_CHARS {
            LimitStatus::UnderLimit
        } else if within_limit {
            LimitStatus::NearLimit
        } else {
            LimitStatus::OverLimit
        };

        let quality = match (within_limit, word_count >= EXCELLENT_MIN_WORDS) {
            (true, true) => QualityRating::Excellent,
            (true, false) => QualityRating::Good,
            (false, _) => QualityRating::TooLong,
        };

        Self {
            word_count,
            char_count,
            char_limit: PROPOSAL_CHAR_LIMIT,
            remaining_chars: PROPOSAL_CHAR_LIMIT as i64 - char_count as i64,
            limit_status,
            connects_estimate: (word_count / WORDS_PER_CONNECT).clamp(MIN_CONNECTS, MAX_CONNECTS),
            quality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceRating {
    Strong,
    Good,
    Weak,
}

/// How well the proposal echoes the posting and backs itself with evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalAnalysis {
    /// Technologies from the job posting that the proposal mentions.
    pub technologies_used: Vec<&'static str>,
    pub strength_indicators: usize,
    pub strength_indicators_total: usize,
    pub evidence: EvidenceRating,
}

impl ProposalAnalysis {
    pub fn analyze(proposal: &str, job_description: &str) -> Self {
        let lower = proposal.to_lowercase();
        let technologies_used = technologies_mentioned(job_description)
            .into_iter()
            .filter(|term| lower.contains(&term.to_lowercase()))
            .collect();

        let found = STRENGTH_WORDS.iter().filter(|w| lower.contains(*w)).count();
        let evidence = match found {
            n if n >= 4 => EvidenceRating::Strong,
            n if n >= 2 => EvidenceRating::Good,
            _ => EvidenceRating::Weak,
        };

        Self {
            technologies_used,
            strength_indicators: found,
            strength_indicators_total: STRENGTH_WORDS.len(),
            evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_4200_char_proposal_is_under_limit() {
        let proposal = format!("{}abcde", "abcd ".repeat(839));
        let metrics = ProposalMetrics::measure(&proposal);

        assert_eq!(metrics.char_count, 4200);
        assert_eq!(metrics.word_count, 840);
        assert_eq!(metrics.remaining_chars, 800);
        assert_eq!(metrics.limit_status, LimitStatus::UnderLimit);
        assert_eq!(metrics.connects_estimate, 5);
        assert_eq!(metrics.quality, QualityRating::Excellent);
    }

    #[test]
    fn test_limit_boundaries() {
        let near = ProposalMetrics::measure(&"x".repeat(4501));
        assert_eq!(near.limit_status, LimitStatus::NearLimit);
        assert_eq!(near.quality, QualityRating::Good);

        let at_limit = ProposalMetrics::measure(&"x".repeat(5000));
        assert_eq!(at_limit.limit_status, LimitStatus::NearLimit);
        assert_eq!(at_limit.remaining_chars, 0);

        let over = ProposalMetrics::measure(&"x".repeat(5001));
        assert_eq!(over.limit_status, LimitStatus::OverLimit);
        assert_eq!(over.remaining_chars, -1);
        assert_eq!(over.quality, QualityRating::TooLong);
    }

    #[test]
    fn test_connects_estimate_is_clamped() {
        assert_eq!(ProposalMetrics::measure("one two").connects_estimate, 1);
        let long = "word ".repeat(2000);
        assert_eq!(ProposalMetrics::measure(&long).connects_estimate, 6);
    }

    #[test]
    fn test_analysis_matches_job_terms_and_evidence() {
        let job = "Python and SQL dashboard with Tableau";
        let proposal = "I built 3 Python dashboards and reduced reporting time; my SQL experience \
                        improved query speed.";
        let analysis = ProposalAnalysis::analyze(proposal, job);

        assert_eq!(analysis.technologies_used, vec!["Python", "SQL", "Dashboard"]);
        assert_eq!(analysis.strength_indicators, 4);
        assert_eq!(analysis.strength_indicators_total, 7);
        assert_eq!(analysis.evidence, EvidenceRating::Strong);
    }

    #[test]
    fn test_analysis_without_evidence_is_weak() {
        let analysis = ProposalAnalysis::analyze("Happy to help.", "Excel cleanup");
        assert!(analysis.technologies_used.is_empty());
        assert_eq!(analysis.evidence, EvidenceRating::Weak);
    }
}
