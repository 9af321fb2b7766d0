use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Reads an absent or `null` field as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Citation metadata attached to a final answer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arxiv_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
}

impl Source {
    /// Resolves `pdf_url` to an absolute link.
    ///
    /// Absolute URLs are returned as-is; relative ones (`/papers/pdf/...`) are
    /// joined onto `document_base`.
    pub fn resolve_pdf_url(&self, document_base: &Url) -> Option<Url> {
        let raw = self.pdf_url.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => document_base.join(raw).ok(),
            Err(_) => None,
        }
    }
}

/// Terminal success payload of a query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryAnswer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<Source>,
}

/// One decoded record of the query stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Progress { message: String },
    Final(QueryAnswer),
    Error { message: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Final(_) | StreamEvent::Error { .. })
    }
}

/// Separator of the textual `domain__task` key.
pub const CATEGORY_KEY_SEPARATOR: &str = "__";

/// A `(domain, task)` pair of the category taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    pub domain: String,
    pub task: String,
}

impl CategoryRef {
    pub fn new(domain: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            task: task.into(),
        }
    }

    /// Encodes the pair as `domain__task`.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.domain, CATEGORY_KEY_SEPARATOR, self.task)
    }

    /// Decodes a `domain__task` key, splitting on the first separator.
    ///
    /// Lossy when the domain itself contains the separator.
    pub fn from_key(key: &str) -> Option<Self> {
        key.split_once(CATEGORY_KEY_SEPARATOR)
            .map(|(domain, task)| Self::new(domain, task))
    }
}

impl fmt::Display for CategoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.domain, self.task)
    }
}

fn agreed_on_arrival() -> bool {
    true
}

/// A suggested taxonomy merge. `agreed` never leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeProposal {
    pub from: CategoryRef,
    pub to: CategoryRef,
    #[serde(default)]
    pub reason: String,
    #[serde(skip_serializing, default = "agreed_on_arrival")]
    pub agreed: bool,
}

/// Curated quality lists. `authors` is carried verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityLists {
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub authors: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DomainEntry {
    #[serde(default)]
    pub tasks: BTreeMap<String, Value>,
}

/// Server-held mapping of domain to its known tasks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTaxonomy(pub BTreeMap<String, DomainEntry>);

impl CategoryTaxonomy {
    /// All pairs in domain, then task order.
    pub fn categories(&self) -> Vec<CategoryRef> {
        self.0
            .iter()
            .flat_map(|(domain, entry)| {
                entry
                    .tasks
                    .keys()
                    .map(move |task| CategoryRef::new(domain.clone(), task.clone()))
            })
            .collect()
    }

    pub fn contains(&self, category: &CategoryRef) -> bool {
        self.0
            .get(&category.domain)
            .is_some_and(|entry| entry.tasks.contains_key(&category.task))
    }

    pub fn task_count(&self) -> usize {
        self.0.values().map(|entry| entry.tasks.len()).sum()
    }
}

pub const MODEL_NAME_KEY: &str = "OLLAMA_MODEL_NAME";
pub const ARXIV_DOMAINS_KEY: &str = "DEFAULT_ARXIV_DOMAINS";
pub const PDF_STRATEGY_KEY: &str = "PDF_PARSING_STRATEGY";
pub const REPORT_AUTHOR_KEY: &str = "REPORT_AUTHOR";

/// How the backend parses downloaded PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfStrategy {
    Monkey,
    Fast,
}

impl PdfStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PdfStrategy::Monkey => "monkey",
            PdfStrategy::Fast => "fast",
        }
    }
}

impl FromStr for PdfStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monkey" => Ok(PdfStrategy::Monkey),
            "fast" => Ok(PdfStrategy::Fast),
            other => Err(format!("unknown strategy `{other}` (expected monkey or fast)")),
        }
    }
}

/// Flat mapping of named tunables. Keys the client does not know about
/// round-trip untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalSettings(pub Map<String, Value>);

impl GlobalSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.get(MODEL_NAME_KEY).and_then(Value::as_str)
    }

    pub fn pdf_strategy(&self) -> Option<PdfStrategy> {
        self.get(PDF_STRATEGY_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Canonical list form of the default arXiv domains.
    pub fn arxiv_domains(&self) -> Vec<String> {
        match self.get(ARXIV_DOMAINS_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Body of `POST /run/daily_workflow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRunRequest {
    pub research_plan: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Result of a daily workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DailyRunSummary {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub papers_processed: u64,
    #[serde(default)]
    pub report_path: Option<String>,
}

/// Everything the settings section reads, applied only as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsSnapshot {
    pub global: GlobalSettings,
    pub preferences: BTreeSet<CategoryRef>,
    pub taxonomy: CategoryTaxonomy,
    pub available_models: Vec<String>,
    pub quality: QualityLists,
}

/// The three payloads written by one settings save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsWrite {
    pub global: GlobalSettings,
    pub preferences: Vec<CategoryRef>,
    pub quality: QualityLists,
}

/// Whether `name` is a plain report file name with no path components.
pub fn is_plain_report_name(name: &str) -> bool {
    !name.trim().is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}
