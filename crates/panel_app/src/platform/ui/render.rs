use panel_core::{
    AppViewModel, CategoryRef, DailyDraft, MergeStage, MergeView, NoticeLevel, QueryAnswer,
    QueryStatus, SessionId, SettingsView,
};
use url::Url;

/// What has already been written for the current query and notifications.
#[derive(Debug, Default)]
pub struct RenderCursor {
    session: Option<SessionId>,
    progress_shown: usize,
    outcome_shown: bool,
    last_notice: u64,
    errors: usize,
}

impl RenderCursor {
    /// Error notifications written so far.
    pub fn errors(&self) -> usize {
        self.errors
    }
}

/// Lines that appeared since the previous call: query progress, the query
/// outcome and new notifications.
pub fn render(view: &AppViewModel, cursor: &mut RenderCursor, document_base: &Url) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(query) = &view.query {
        if cursor.session != Some(query.session_id) {
            cursor.session = Some(query.session_id);
            cursor.progress_shown = 0;
            cursor.outcome_shown = false;
            let mode = if query.online_search { "online" } else { "local" };
            lines.push(format!("> {} ({mode})", query.query));
        }
        for step in query.progress.iter().skip(cursor.progress_shown) {
            lines.push(format!("  .. {step}"));
        }
        cursor.progress_shown = cursor.progress_shown.max(query.progress.len());

        if !cursor.outcome_shown {
            if let (QueryStatus::Answered, Some(answer)) = (query.status, &query.answer) {
                lines.extend(answer_lines(answer, document_base));
                cursor.outcome_shown = true;
            } else if query.status == QueryStatus::Failed {
                // The failure itself arrives as an error notice.
                cursor.outcome_shown = true;
            }
        }
    }

    for notice in view.notices.iter() {
        if notice.id <= cursor.last_notice {
            continue;
        }
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => {
                cursor.errors += 1;
                "error"
            }
        };
        lines.push(format!("[{tag}] {}", notice.message));
        cursor.last_notice = notice.id;
    }

    lines
}

pub fn answer_lines(answer: &QueryAnswer, document_base: &Url) -> Vec<String> {
    let mut lines = vec![String::new()];
    lines.extend(answer.answer.lines().map(ToOwned::to_owned));
    if answer.sources.is_empty() {
        return lines;
    }

    lines.push(String::new());
    lines.push("Sources:".to_string());
    for (i, source) in answer.sources.iter().enumerate() {
        let title = if source.title.is_empty() {
            "(untitled)"
        } else {
            source.title.as_str()
        };
        if source.arxiv_id.is_empty() {
            lines.push(format!("[{}] {title}", i + 1));
        } else {
            lines.push(format!("[{}] {title} (arXiv:{})", i + 1, source.arxiv_id));
        }
        if !source.authors.is_empty() {
            lines.push(format!("    {}", source.authors.join(", ")));
        }
        if let Some(pdf) = source.resolve_pdf_url(document_base) {
            lines.push(format!("    {pdf}"));
        }
        if !source.summary.is_empty() {
            lines.push(format!("    {}", source.summary));
        }
    }
    lines
}

pub fn daily_draft_lines(draft: &DailyDraft) -> Vec<String> {
    let plan = match draft.research_plan.trim() {
        "" => "(backend default)",
        plan => plan,
    };
    vec![
        "Daily workflow".to_string(),
        format!("  window:        {} .. {}", draft.start_date, draft.end_date),
        format!("  research plan: {plan}"),
    ]
}

pub fn merge_lines(merges: &MergeView) -> Vec<String> {
    let mut lines = Vec::with_capacity(merges.proposals.len() + 1);
    let stage = match merges.stage {
        MergeStage::Idle => return lines,
        MergeStage::Proposing => "proposing",
        MergeStage::Reviewing => "review",
        MergeStage::Confirming => "awaiting confirmation",
        MergeStage::Executing => "executing",
    };
    lines.push(format!(
        "Merge proposals ({stage}): {} of {} agreed",
        merges.agreed_count,
        merges.proposals.len()
    ));
    for (i, proposal) in merges.proposals.iter().enumerate() {
        let mark = if proposal.agreed { 'x' } else { ' ' };
        let mut line = format!("  [{mark}] {}. {} -> {}", i + 1, proposal.from, proposal.to);
        if !proposal.reason.is_empty() {
            line.push_str(&format!("  ({})", proposal.reason));
        }
        lines.push(line);
    }
    lines
}

pub fn report_lines(names: &[String]) -> Vec<String> {
    if names.is_empty() {
        return vec!["No reports yet.".to_string()];
    }
    names.iter().map(|name| format!("  {name}")).collect()
}

pub fn category_lines(categories: &[CategoryRef]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;
    for category in categories {
        if current != Some(category.domain.as_str()) {
            lines.push(category.domain.clone());
            current = Some(category.domain.as_str());
        }
        lines.push(format!("  {}", category.task));
    }
    lines
}

/// The settings draft, with the preference matrix over `categories`.
pub fn settings_lines(settings: &SettingsView, categories: &[CategoryRef]) -> Vec<String> {
    let Some(draft) = &settings.draft else {
        return vec!["Settings not loaded.".to_string()];
    };

    let mut lines = vec!["Global settings".to_string()];
    for (key, value) in draft.global.iter() {
        lines.push(format!("  {key} = {value}"));
    }
    lines.push(format!(
        "  {} = {}",
        panel_core::ARXIV_DOMAINS_KEY,
        draft.domains_text
    ));
    if !settings.available_models.is_empty() {
        lines.push(format!(
            "  available models: {}",
            settings.available_models.join(", ")
        ));
    }

    lines.push("Preferred categories".to_string());
    let mut current: Option<&str> = None;
    for category in categories {
        if current != Some(category.domain.as_str()) {
            lines.push(format!("  {}", category.domain));
            current = Some(category.domain.as_str());
        }
        let mark = if draft.selected.contains(category) { 'x' } else { ' ' };
        lines.push(format!("    [{mark}] {}", category.task));
    }
    for orphan in draft.selected.iter().filter(|c| !categories.contains(*c)) {
        lines.push(format!("    [x] {} (not in taxonomy)", orphan.key()));
    }

    lines.push("Quality lists".to_string());
    lines.push(format!("  teams: {}", draft.teams.join(", ")));
    lines.push("  authors:".to_string());
    lines.extend(draft.authors_text.lines().map(|line| format!("    {line}")));
    lines
}
