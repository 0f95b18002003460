// Prompt text for the Proposal module.
// Provider-specific wrapping lives in llm_client::prompts.

/// Hard character budget the generated proposal must respect.
pub const PROPOSAL_CHAR_LIMIT: usize = 5000;

/// Generic openings the model is told never to use.
pub const BANNED_PHRASES: &[&str] = &[
    "I'm excited",
    "I am the perfect fit",
    "Dear Hiring Manager",
    "I have read your job posting",
    "I'm confident I can",
    "passionate about",
];

/// Proposal prompt template.
/// Replace: {background}, {job_description}, {char_limit}, {banned_phrases}, {variation_block}
pub const PROPOSAL_PROMPT_TEMPLATE: &str = r#"Analyze this Upwork job posting and create a winning proposal that demonstrates deep technical understanding and proven capability.

**CRITICAL ANALYSIS REQUIREMENTS:**
1. Identify the TOP 3 technical challenges or requirements from the job posting
2. Extract specific KPIs, metrics, or success criteria mentioned
3. Note any technical tools, platforms, or methodologies specified
4. Identify potential pain points or challenges not explicitly mentioned

**MY TECHNICAL BACKGROUND:**
{background}

**JOB POSTING TO ANALYZE:**
{job_description}

**PROPOSAL REQUIREMENTS:**
- Lead with the most critical technical challenge they face
- Provide specific examples from my background that directly address their needs
- Include concrete metrics and results from previous similar work
- Demonstrate technical depth by mentioning specific tools, methodologies, or approaches
- Show understanding of their business context and industry
- Outline specific deliverables and technical approach
- Stay under {char_limit} characters total
- NO generic enthusiasm. Never use phrases such as: {banned_phrases}
- Tone: confident, direct and technical; write as a senior specialist talking to a peer
{variation_block}
**STRUCTURE:**
1. Problem identification (their core challenge)
2. Technical solution approach (specific methods/tools)
3. Relevant experience with metrics (proof of capability)
4. Technical implementation details (show expertise)
5. Specific deliverables and timeline
6. Clear next steps or questions

Create a proposal that makes the client think: "This person clearly understands our technical needs and has the exact experience to solve this problem.""#;

/// Style direction appended when prompt variation is enabled.
/// Replace: {opening}, {methodology}, {value_proposition}
pub const VARIATION_BLOCK_TEMPLATE: &str = r#"
**STYLE DIRECTION:**
- Opening angle: {opening}
- Methodology to describe: {methodology}
- Value proposition to close the solution section: {value_proposition}
"#;

pub const OPENINGS: &[&str] = &[
    "Open by restating their single biggest technical risk in one sentence.",
    "Open with the measurable outcome they are after and how quickly it can be reached.",
    "Open with a short observation about a gap in their current setup that the posting implies.",
    "Open by naming the most similar project from my background and its result.",
];

pub const METHODOLOGIES: &[&str] = &[
    "an iterative delivery plan with a working first version inside the first week",
    "a discovery-then-build approach: audit the current data and tools, then implement",
    "milestone-based delivery where each milestone ends with a demo and sign-off",
    "a test-first approach with automated checks guarding every deliverable",
];

pub const VALUE_PROPS: &[&str] = &[
    "Emphasize reduced time-to-result backed by a metric from my background.",
    "Emphasize reliability and maintainability after handover.",
    "Emphasize clear communication and predictable weekly progress.",
    "Emphasize cost saved by avoiding rework through upfront analysis.",
];

/// Fills `{name}` placeholders in one pass.
/// Substituted values are never rescanned, so user text containing braces stays literal.
/// Unknown placeholders are left as-is.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let value = after.find('}').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, end))
        });
        match value {
            Some((v, end)) => {
                out.push_str(v);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
