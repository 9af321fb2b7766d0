use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    CategoryRef, GlobalSettings, PdfStrategy, QualityLists, SettingsSnapshot, SettingsWrite,
    ValidationError, ARXIV_DOMAINS_KEY, PDF_STRATEGY_KEY,
};

/// Field name reported when the authors text does not parse.
pub const AUTHORS_FIELD: &str = "authors";

/// List to text view of the arXiv domains.
pub fn join_domains(domains: &[String]) -> String {
    domains.join(", ")
}

/// Text to list: split on commas, trim, drop empties.
pub fn split_domains(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Reads a command-line style value: JSON when it parses, otherwise a string.
pub fn parse_tunable(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsEdit {
    Tunable { key: String, value: Value },
    DomainsText(String),
    Category { category: CategoryRef, selected: bool },
    Teams(Vec<String>),
    AuthorsText(String),
}

/// Client-side working copy of the settings section.
///
/// The domain list lives only in `domains_text` while editing; `global` never
/// carries `DEFAULT_ARXIV_DOMAINS` until `compose` puts the list back.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDraft {
    pub global: GlobalSettings,
    pub domains_text: String,
    pub selected: BTreeSet<CategoryRef>,
    pub teams: Vec<String>,
    pub authors_text: String,
}

impl SettingsDraft {
    pub fn from_snapshot(snapshot: &SettingsSnapshot) -> Self {
        let mut global = snapshot.global.clone();
        let domains_text = join_domains(&snapshot.global.arxiv_domains());
        global.remove(ARXIV_DOMAINS_KEY);
        let authors_text = serde_json::to_string_pretty(&snapshot.quality.authors)
            .unwrap_or_else(|_| "[]".to_string());
        Self {
            global,
            domains_text,
            selected: snapshot.preferences.clone(),
            teams: snapshot.quality.teams.clone(),
            authors_text,
        }
    }

    pub fn apply(&mut self, edit: SettingsEdit) -> Result<(), ValidationError> {
        match edit {
            SettingsEdit::Tunable { key, value } if key == ARXIV_DOMAINS_KEY => {
                self.domains_text = match value {
                    Value::Array(items) => join_domains(
                        &items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(ToOwned::to_owned)
                            .collect::<Vec<_>>(),
                    ),
                    Value::String(text) => text,
                    other => other.to_string(),
                };
            }
            SettingsEdit::Tunable { key, value } => {
                if key == PDF_STRATEGY_KEY {
                    let raw = value.as_str().unwrap_or_default();
                    raw.parse::<PdfStrategy>().map_err(|message| {
                        ValidationError::MalformedField {
                            field: key.clone(),
                            message,
                        }
                    })?;
                }
                self.global.set(key, value);
            }
            SettingsEdit::DomainsText(text) => self.domains_text = text,
            SettingsEdit::Category { category, selected } => {
                if selected {
                    self.selected.insert(category);
                } else {
                    self.selected.remove(&category);
                }
            }
            SettingsEdit::Teams(teams) => {
                self.teams = teams
                    .into_iter()
                    .map(|team| team.trim().to_string())
                    .filter(|team| !team.is_empty())
                    .collect();
            }
            SettingsEdit::AuthorsText(text) => self.authors_text = text,
        }
        Ok(())
    }

    /// Builds the three write payloads, or fails before anything is sent.
    pub fn compose(&self) -> Result<SettingsWrite, ValidationError> {
        let authors: Vec<Value> = serde_json::from_str(&self.authors_text).map_err(|err| {
            ValidationError::MalformedField {
                field: AUTHORS_FIELD.to_string(),
                message: err.to_string(),
            }
        })?;

        let mut global = self.global.clone();
        global.set(
            ARXIV_DOMAINS_KEY,
            Value::Array(
                split_domains(&self.domains_text)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
        );

        Ok(SettingsWrite {
            global,
            preferences: self.selected.iter().cloned().collect(),
            quality: QualityLists {
                teams: self.teams.clone(),
                authors,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsPhase {
    #[default]
    Idle,
    Loading,
    Saving,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsState {
    pub phase: SettingsPhase,
    pub snapshot: Option<SettingsSnapshot>,
    pub draft: Option<SettingsDraft>,
    pending_write: Option<SettingsWrite>,
}

impl SettingsState {
    pub(crate) fn begin_save(&mut self, write: SettingsWrite) {
        self.phase = SettingsPhase::Saving;
        self.pending_write = Some(write);
    }

    /// Folds the written payloads into the committed snapshot.
    pub(crate) fn commit_save(&mut self) {
        self.phase = SettingsPhase::Idle;
        let Some(write) = self.pending_write.take() else {
            return;
        };
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.global = write.global;
            snapshot.preferences = write.preferences.into_iter().collect();
            snapshot.quality = write.quality;
        }
    }

    pub(crate) fn abort_save(&mut self) {
        self.phase = SettingsPhase::Idle;
        self.pending_write = None;
    }
}
