use serde::Serialize;

/// Technology names recognised in job postings and proposals.
pub const TECH_TERMS: &[&str] = &[
    "Python",
    "SQL",
    "Excel",
    "Tableau",
    "Power BI",
    "Analytics",
    "Machine Learning",
    "Dashboard",
    "API",
    "Database",
];

const METRIC_INDICATORS: &[&str] = &[
    "kpi", "target", "improve", "increase", "reduce", "month", "%", "metrics",
];

const COMPLEXITY_INDICATORS: &[&str] = &["complex", "advanced", "senior", "lead", "architect", "scale"];

/// Technologies shown in the insights summary.
pub const MAX_LISTED_TECHNOLOGIES: usize = 5;

/// Postings shorter than this are flagged as lacking detail.
pub const DETAIL_THRESHOLD_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Sufficient,
    NeedsMoreDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInsights {
    pub technologies: Vec<&'static str>,
    pub has_success_metrics: bool,
    pub high_complexity: bool,
    pub char_count: usize,
    pub detail_level: DetailLevel,
}

pub fn analyze_job(job_description: &str) -> JobInsights {
    let lower = job_description.to_lowercase();
    let char_count = job_description.chars().count();

    let mut technologies = technologies_mentioned(job_description);
    technologies.truncate(MAX_LISTED_TECHNOLOGIES);

    JobInsights {
        technologies,
        has_success_metrics: METRIC_INDICATORS.iter().any(|i| lower.contains(i)),
        high_complexity: COMPLEXITY_INDICATORS.iter().any(|i| lower.contains(i)),
        char_count,
        detail_level: if char_count < DETAIL_THRESHOLD_CHARS {
            DetailLevel::NeedsMoreDetail
        } else {
            DetailLevel::Sufficient
        },
    }
}

/// Every entry of `TECH_TERMS` found in `text`, case-insensitively, in list order.
pub fn technologies_mentioned(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    TECH_TERMS
        .iter()
        .copied()
        .filter(|term| lower.contains(&term.to_lowercase()))
        .collect()
}
