//! Loading of rules, tone and scenario text from a content directory.
//!
//! ```text
//! <root>/engine-rules.md
//! <root>/scenario.md              used when no scenario id is given
//! <root>/scenarios/<id>.md
//! <root>/tones/<id>.md
//! ```
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::{TurnError, TurnResult};
use crate::prompt::SystemPromptLayers;

pub const RULES_FILE: &str = "engine-rules.md";
pub const DEFAULT_SCENARIO_FILE: &str = "scenario.md";
pub const SCENARIO_TEMPLATE_FILE: &str = "TEMPLATE.md";
pub const DEFAULT_TONE: &str = "sarcastic";
pub const DEFAULT_OPENING: &str = "The game begins...";
pub const DEFAULT_DESCRIPTION: &str = "An interactive adventure awaits.";
const DESCRIPTION_CHARS: usize = 200;

/// Summary of one scenario file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the three prompt layers for a turn.
    ///
    /// Rules and scenario are required; a missing tone is an empty layer.
    pub fn load_layers(
        &self,
        scenario_id: Option<&str>,
        tone_id: Option<&str>,
    ) -> TurnResult<SystemPromptLayers> {
        let scenario = self.scenario_text(scenario_id)?;
        let rules = read_required(&self.root.join(RULES_FILE), || {
            format!("Engine rules '{}' not found", RULES_FILE)
        })?;
        let tone = self.tone_text(tone_id.unwrap_or(DEFAULT_TONE));

        Ok(SystemPromptLayers {
            rules,
            tone,
            scenario,
        })
    }

    /// The opening narration of a scenario
    pub fn opening(&self, scenario_id: Option<&str>) -> TurnResult<String> {
        let scenario = self.scenario_text(scenario_id)?;
        Ok(extract_opening(&scenario).unwrap_or_else(|| DEFAULT_OPENING.to_string()))
    }

    /// Every scenario in `<root>/scenarios`, sorted by id
    pub fn list_scenarios(&self) -> TurnResult<Vec<ScenarioSummary>> {
        let dir = self.root.join("scenarios");
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TurnError::ContentNotFound(format!(
                    "Could not read {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut scenarios = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if file_name == SCENARIO_TEMPLATE_FILE {
                continue;
            }
            let Some(id) = file_name.strip_suffix(".md").map(str::to_string) else {
                continue;
            };
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(scenario = %id, "skipping unreadable scenario: {}", e);
                    continue;
                }
            };
            scenarios.push(summarize(&id, &content));
        }

        scenarios.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(scenarios)
    }

    fn scenario_text(&self, scenario_id: Option<&str>) -> TurnResult<String> {
        match scenario_id {
            Some(id) => {
                let not_found = || format!("Scenario '{}' not found", id);
                if !is_valid_id(id) {
                    return Err(TurnError::ContentNotFound(not_found()));
                }
                let path = self.root.join("scenarios").join(format!("{}.md", id));
                read_required(&path, not_found)
            }
            None => read_required(&self.root.join(DEFAULT_SCENARIO_FILE), || {
                format!("Default scenario '{}' not found", DEFAULT_SCENARIO_FILE)
            }),
        }
    }

    fn tone_text(&self, tone_id: &str) -> String {
        if !is_valid_id(tone_id) {
            tracing::debug!(tone = tone_id, "ignoring invalid tone id");
            return String::new();
        }
        let path = self.root.join("tones").join(format!("{}.md", tone_id));
        fs::read_to_string(&path).unwrap_or_else(|_| {
            tracing::debug!(tone = tone_id, "no tone file, continuing without tone");
            String::new()
        })
    }
}

fn read_required(path: &Path, not_found: impl FnOnce() -> String) -> TurnResult<String> {
    match fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => Ok(content),
        Ok(_) => Err(TurnError::ContentNotFound(not_found())),
        Err(e) => {
            tracing::debug!(path = %path.display(), "content read failed: {}", e);
            Err(TurnError::ContentNotFound(not_found()))
        }
    }
}

/// Ids name a single file; anything that could walk the tree is rejected
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains("..")
        && !id.contains('/')
        && !id.contains('\\')
        && !id.contains('\0')
}

lazy_static! {
    static ref OPENING_RE: Regex =
        Regex::new(r"(?s)## Opening\s*\n\s*\n(.*?)(?:\n\n##|\z)").unwrap();
    static ref TITLE_RE: Regex = Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap();
}

/// The paragraphs under `## Opening`, up to the next `##` heading
pub fn extract_opening(scenario: &str) -> Option<String> {
    OPENING_RE
        .captures(scenario)
        .and_then(|captures| captures.get(1))
        .map(|opening| opening.as_str().trim().to_string())
}

fn summarize(id: &str, content: &str) -> ScenarioSummary {
    let title = TITLE_RE
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|title| title.as_str().trim().to_string())
        .unwrap_or_else(|| title_case(id));

    let description = match extract_opening(content) {
        Some(opening) => {
            let truncated: String = opening.chars().take(DESCRIPTION_CHARS).collect();
            format!("{}...", truncated)
        }
        None => DEFAULT_DESCRIPTION.to_string(),
    };

    ScenarioSummary {
        id: id.to_string(),
        title,
        description,
    }
}

fn title_case(id: &str) -> String {
    id.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
