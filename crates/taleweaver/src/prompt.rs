//! Composition of the instruction text sent with every provider round.

/// Blank line between layers so the model can tell them apart
pub const LAYER_SEPARATOR: &str = "\n\n";

/// The three independently sourced instruction texts of a turn.
///
/// Later layers specialise earlier ones, so the order is fixed: rules, then
/// tone, then scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPromptLayers {
    pub rules: String,
    /// Empty when no tone file exists
    pub tone: String,
    pub scenario: String,
}

impl SystemPromptLayers {
    pub fn compose(&self) -> String {
        compose(&self.rules, &self.tone, &self.scenario)
    }
}

pub fn compose(rules: &str, tone: &str, scenario: &str) -> String {
    let capacity = rules.len() + tone.len() + scenario.len() + 2 * LAYER_SEPARATOR.len();
    let mut prompt = String::with_capacity(capacity);
    prompt.push_str(rules);
    prompt.push_str(LAYER_SEPARATOR);
    prompt.push_str(tone);
    prompt.push_str(LAYER_SEPARATOR);
    prompt.push_str(scenario);
    prompt
}
