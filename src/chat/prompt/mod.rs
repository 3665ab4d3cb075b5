//! Prompt assembly for grounded HR answers


use crate::chat::ConversationTurn;
use crate::database::sqlite::models::OrganizationStatistics;
use crate::documents::render::format_rupiah;
use crate::indexer::RetrievedDocument;

/// Exact reply expected when the context cannot answer a question
pub const NOT_AVAILABLE: &str = "Informasi tidak tersedia";

const BASE_INSTRUCTION: &str = "\
You are the HR assistant of a company. Answer questions about its employees, \
attendance and shift schedules using only the context supplied with each question.

Rules:
- Use only facts found in the context. Never invent employees, dates or figures.
- Prefer structured Markdown: short headings, bullet lists and tables for lists of people or numbers.
- Resolve pronouns and follow-up questions (\"he\", \"that department\", \"and last week?\") from the conversation history.
- Format currency as Rupiah with \"Rp\" and dots as thousands separators, for example Rp 15.000.000.
- Reply in the language of the question.";

const STATISTICS_BRANCH: &str = "\
The context contains authoritative organization statistics. When a question \
about headcount, departments, employment types, payroll or attendance totals \
can be answered from them, answer from the statistics and never reply \
\"Informasi tidak tersedia\".";

const NO_STATISTICS_BRANCH: &str = "\
No organization statistics are available. When the context does not contain \
the answer, reply exactly \"Informasi tidak tersedia\" and do not estimate or \
invent any figures.";

/// Context gathered for one question
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatContext {
    pub statistics: Option<OrganizationStatistics>,
    /// Retrieved records, most similar first
    pub documents: Vec<RetrievedDocument>,
}

#[inline]
pub fn system_instruction(has_statistics: bool) -> String {
    let branch = if has_statistics {
        STATISTICS_BRANCH
    } else {
        NO_STATISTICS_BRANCH
    };
    format!("{}\n\n{}", BASE_INSTRUCTION, branch)
}

fn bullet_list<I>(items: I, empty: &str) -> Vec<String>
where
    I: IntoIterator<Item = (String, i64)>,
{
    let lines: Vec<String> = items
        .into_iter()
        .map(|(label, count)| format!("- {}: {}", label, count))
        .collect();
    if lines.is_empty() {
        vec![format!("- {}", empty)]
    } else {
        lines
    }
}

#[inline]
pub fn format_statistics(statistics: &OrganizationStatistics) -> String {
    let mut lines = vec![
        "## Organization statistics".to_string(),
        format!("Organization: {}", statistics.organization_name),
        format!(
            "Employees: {} total, {} active",
            statistics.total_employees, statistics.active_employees
        ),
        format!(
            "Monthly base payroll of active employees: {}",
            format_rupiah(statistics.monthly_payroll)
        ),
        "Active employees per department:".to_string(),
    ];
    lines.extend(bullet_list(
        statistics.by_department.iter().cloned(),
        "No active employees",
    ));

    lines.push("Active employees per employment type:".to_string());
    lines.extend(bullet_list(
        statistics
            .by_employment_type
            .iter()
            .map(|(kind, count)| (kind.label().to_string(), *count)),
        "No active employees",
    ));

    lines.push(format!(
        "Attendance in the last {} days (since {}):",
        statistics.attendance_window_days,
        statistics.attendance_since.format("%Y-%m-%d")
    ));
    lines.extend(bullet_list(
        statistics
            .attendance_by_status
            .iter()
            .map(|(status, count)| (status.label().to_string(), *count)),
        "No attendance records",
    ));

    lines.join("\n")
}

/// Keep documents at or above `min_similarity`, best first, whose combined
/// content fits in `max_chars`; a document that does not fit is skipped and
/// smaller ones after it may still be taken
#[inline]
pub fn select_documents(
    mut documents: Vec<RetrievedDocument>,
    min_similarity: f32,
    max_chars: usize,
) -> Vec<RetrievedDocument> {
    documents.retain(|d| d.similarity >= min_similarity);
    documents.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    let mut used = 0usize;
    documents
        .into_iter()
        .filter(|d| {
            let fits = used.saturating_add(d.content.len()) <= max_chars;
            if fits {
                used += d.content.len();
            }
            fits
        })
        .collect()
}

#[inline]
pub fn format_documents(documents: &[RetrievedDocument]) -> String {
    let mut sections = vec!["## Relevant records".to_string()];
    sections.extend(documents.iter().enumerate().map(|(i, d)| {
        format!(
            "### Record {} ({}, similarity {:.2})\n{}",
            i + 1,
            d.document_type,
            d.similarity,
            d.content
        )
    }));
    sections.join("\n\n")
}

fn format_history(history: &[ConversationTurn], max_turns: usize) -> Option<String> {
    let recent = &history[history.len().saturating_sub(max_turns)..];
    if recent.is_empty() {
        return None;
    }

    let mut lines = vec!["## Conversation so far".to_string()];
    for turn in recent {
        lines.push(format!("User: {}", turn.question));
        lines.push(format!("Assistant: {}", turn.answer));
    }
    Some(lines.join("\n"))
}

/// Prompt body: history, then context, then the question
#[inline]
pub fn build_prompt(
    question: &str,
    history: &[ConversationTurn],
    context: &ChatContext,
    max_history_turns: usize,
) -> String {
    let mut sections = Vec::new();

    if let Some(history) = format_history(history, max_history_turns) {
        sections.push(history);
    }
    if let Some(statistics) = &context.statistics {
        sections.push(format_statistics(statistics));
    }
    if !context.documents.is_empty() {
        sections.push(format_documents(&context.documents));
    }
    if context.statistics.is_none() && context.documents.is_empty() {
        sections.push("## Context\nNo records matched this question.".to_string());
    }
    sections.push(format!("## Question\n{}", question.trim()));

    sections.join("\n\n")
}
