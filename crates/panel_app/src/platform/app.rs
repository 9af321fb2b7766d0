use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use chrono::Local;
use clap::Parser;
use panel_core::{
    parse_tunable, split_domains, update, AppState, AppViewModel, CategoryRef, DailyDraftEdit,
    DailyView, MergeStage, Msg, SettingsEdit,
};
use panel_engine::EngineHandle;
use panel_logging::{panel_debug, panel_info, panel_warn};
use url::Url;

use super::cli::{Cli, Command, ReportsAction, SettingsAction};
use super::config::PanelConfig;
use super::effects::EffectRunner;
use super::logging;
use super::ui::{prompt, render};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match PanelConfig::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(err) => (PanelConfig::default(), Some(err)),
    };
    logging::initialize(config.log_destination, config.level());
    if let Some(err) = config_error {
        panel_warn!("using default configuration: {}", err);
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }

    let settings = config
        .client_settings()
        .context("invalid backend address")?;
    panel_info!("backend at {}", settings.base_url);
    let document_base = settings.document_base().clone();
    let engine = EngineHandle::new(settings).context("failed to start engine")?;
    let runner = EffectRunner::new(engine, config.reports_dir.clone());

    let mut app = App::new(runner, document_base);
    app.execute(cli.command)
}

/// Owns the state and drives it with messages until the backend goes quiet.
struct App {
    state: AppState,
    runner: EffectRunner,
    cursor: render::RenderCursor,
    document_base: Url,
}

impl App {
    fn new(runner: EffectRunner, document_base: Url) -> Self {
        Self {
            state: AppState::new(),
            runner,
            cursor: render::RenderCursor::default(),
            document_base,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            let lines = render::render(&view, &mut self.cursor, &self.document_base);
            print_lines(&lines);
        }
        self.state = state;
        if !effects.is_empty() {
            panel_debug!("dispatching {} effects", effects.len());
            self.runner.enqueue(effects);
        }
    }

    /// Feeds engine results back in until no request is outstanding.
    fn pump_until_idle(&mut self) {
        while self.state.is_busy() {
            if let Some(msg) = self.runner.next_msg(POLL_INTERVAL) {
                self.dispatch(msg);
            }
        }
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn finish(&self) -> anyhow::Result<()> {
        match self.cursor.errors() {
            0 => Ok(()),
            1 => bail!("1 operation failed"),
            n => bail!("{n} operations failed"),
        }
    }

    fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Query { text, online } => {
                self.dispatch(Msg::QuerySubmitted {
                    text,
                    online_search: online,
                });
                self.pump_until_idle();
            }
            Command::Daily {
                plan,
                start,
                end,
                yes,
            } => self.run_daily(plan, start, end, yes)?,
            Command::CollectCategories => {
                self.dispatch(Msg::CategoryCollectionRequested);
                self.pump_until_idle();
            }
            Command::Merges { exclude, yes } => self.run_merges(&exclude, yes)?,
            Command::Reports { action } => self.run_reports(action),
            Command::Settings { action } => self.run_settings(action)?,
        }
        self.finish()
    }

    fn run_daily(
        &mut self,
        plan: Option<String>,
        start: Option<chrono::NaiveDate>,
        end: Option<chrono::NaiveDate>,
        yes: bool,
    ) -> anyhow::Result<()> {
        self.dispatch(Msg::DailyPlanRequested {
            today: Local::now().date_naive(),
        });
        if let Some(plan) = plan {
            self.dispatch(Msg::DailyDraftEdited(DailyDraftEdit::ResearchPlan(plan)));
        }
        if let Some(start) = start {
            self.dispatch(Msg::DailyDraftEdited(DailyDraftEdit::StartDate(start)));
        }
        if let Some(end) = end {
            self.dispatch(Msg::DailyDraftEdited(DailyDraftEdit::EndDate(end)));
        }

        let DailyView::Reviewing(draft) = self.view().daily else {
            return Ok(());
        };
        print_lines(&render::daily_draft_lines(&draft));
        if !(yes || prompt::confirm("Run the daily workflow?")?) {
            self.dispatch(Msg::DailyCancelled);
            println!("Cancelled.");
            return Ok(());
        }

        self.dispatch(Msg::DailyConfirmed);
        self.pump_until_idle();
        let view = self.view();
        if !view.reports.is_empty() {
            println!("Reports:");
            print_lines(&render::report_lines(&view.reports));
        }
        Ok(())
    }

    fn run_merges(&mut self, exclude: &[usize], yes: bool) -> anyhow::Result<()> {
        self.dispatch(Msg::MergeProposalsRequested);
        self.pump_until_idle();
        if self.view().merges.stage != MergeStage::Reviewing {
            return Ok(());
        }

        let count = self.view().merges.proposals.len();
        for &number in exclude {
            if number == 0 || number > count {
                panel_warn!("ignoring --exclude {}: only {} proposals", number, count);
                continue;
            }
            self.dispatch(Msg::MergeAgreementToggled { index: number - 1 });
        }
        print_lines(&render::merge_lines(&self.view().merges));

        self.dispatch(Msg::MergeExecuteClicked);
        if self.view().merges.stage != MergeStage::Confirming {
            self.dispatch(Msg::MergeReviewClosed);
            return Ok(());
        }
        let agreed = self.view().merges.agreed_count;
        let question = format!("Execute {agreed} merges? This rewrites the taxonomy.");
        if !(yes || prompt::confirm(&question)?) {
            self.dispatch(Msg::MergeExecutionDeclined);
            self.dispatch(Msg::MergeReviewClosed);
            println!("Cancelled.");
            return Ok(());
        }

        self.dispatch(Msg::MergeExecutionConfirmed);
        self.pump_until_idle();
        let categories = self.view().categories;
        if !categories.is_empty() {
            println!("Categories now:");
            print_lines(&render::category_lines(&categories));
        }
        Ok(())
    }

    fn run_reports(&mut self, action: ReportsAction) {
        match action {
            ReportsAction::List => {
                self.dispatch(Msg::ReportsRefreshRequested);
                self.pump_until_idle();
                print_lines(&render::report_lines(&self.view().reports));
            }
            ReportsAction::Get { name, out } => {
                if let Some(dir) = out {
                    self.runner.set_reports_dir(dir);
                }
                self.dispatch(Msg::ReportDownloadRequested { name });
                self.pump_until_idle();
            }
        }
    }

    fn run_settings(&mut self, action: SettingsAction) -> anyhow::Result<()> {
        self.dispatch(Msg::SettingsLoadRequested);
        self.pump_until_idle();
        if self.view().settings.draft.is_none() {
            return Ok(());
        }

        match action {
            SettingsAction::Show => {}
            SettingsAction::Set {
                tunables,
                domains,
                select,
                deselect,
                teams,
                authors_file,
            } => {
                let edits = collect_edits(tunables, domains, select, deselect, teams, authors_file)?;
                for edit in edits {
                    self.dispatch(Msg::SettingsEdited(edit));
                }
                if self.cursor.errors() > 0 {
                    return Ok(());
                }
                self.dispatch(Msg::SettingsSaveRequested);
                self.pump_until_idle();
            }
        }

        let view = self.view();
        print_lines(&render::settings_lines(&view.settings, &view.categories));
        Ok(())
    }
}

fn collect_edits(
    tunables: Vec<String>,
    domains: Option<String>,
    select: Vec<String>,
    deselect: Vec<String>,
    teams: Option<String>,
    authors_file: Option<PathBuf>,
) -> anyhow::Result<Vec<SettingsEdit>> {
    let mut edits = Vec::new();
    for pair in tunables {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got `{pair}`"))?;
        edits.push(SettingsEdit::Tunable {
            key: key.trim().to_string(),
            value: parse_tunable(value),
        });
    }
    if let Some(text) = domains {
        edits.push(SettingsEdit::DomainsText(text));
    }
    for (keys, selected) in [(select, true), (deselect, false)] {
        for key in keys {
            let category = CategoryRef::from_key(&key)
                .ok_or_else(|| anyhow!("expected domain__task, got `{key}`"))?;
            edits.push(SettingsEdit::Category { category, selected });
        }
    }
    if let Some(text) = teams {
        edits.push(SettingsEdit::Teams(split_domains(&text)));
    }
    if let Some(path) = authors_file {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read authors file {}", path.display()))?;
        edits.push(SettingsEdit::AuthorsText(text));
    }
    Ok(edits)
}

fn print_lines(lines: &[String]) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        if writeln!(out, "{line}").is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_line_edits_map_to_settings_edits() {
        let edits = collect_edits(
            vec!["MAX_PAPERS=20".to_string(), "REPORT_AUTHOR=Ada".to_string()],
            Some("cs.AI, cs.CL".to_string()),
            vec!["NLP__QA".to_string()],
            vec!["CV__Detection".to_string()],
            Some("FAIR, DeepMind".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(
            edits,
            vec![
                SettingsEdit::Tunable {
                    key: "MAX_PAPERS".to_string(),
                    value: json!(20),
                },
                SettingsEdit::Tunable {
                    key: "REPORT_AUTHOR".to_string(),
                    value: json!("Ada"),
                },
                SettingsEdit::DomainsText("cs.AI, cs.CL".to_string()),
                SettingsEdit::Category {
                    category: CategoryRef::new("NLP", "QA"),
                    selected: true,
                },
                SettingsEdit::Category {
                    category: CategoryRef::new("CV", "Detection"),
                    selected: false,
                },
                SettingsEdit::Teams(vec!["FAIR".to_string(), "DeepMind".to_string()]),
            ]
        );
    }

    #[test]
    fn malformed_edits_are_rejected() {
        assert!(collect_edits(vec!["NO_EQUALS".to_string()], None, vec![], vec![], None, None).is_err());
        assert!(collect_edits(vec![], None, vec!["NLP-QA".to_string()], vec![], None, None).is_err());
    }

    #[test]
    fn authors_file_is_read_verbatim() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("authors.json");
        fs::write(&path, "[{\"name\": \"Hinton\"}]").unwrap();

        let edits = collect_edits(vec![], None, vec![], vec![], None, Some(path)).unwrap();
        assert_eq!(
            edits,
            vec![SettingsEdit::AuthorsText("[{\"name\": \"Hinton\"}]".to_string())]
        );
    }
}
