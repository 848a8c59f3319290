use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agent::{Agent, LoopSettings};
use crate::content::ContentStore;
use crate::conversation::Conversation;
use crate::errors::{TurnError, TurnResult};
use crate::interview::{self, InterviewStep, INTERVIEW_MODEL};
use crate::models::message::{Message, Role};
use crate::models::selector::ModelSelector;
use crate::providers::base::Provider;
use crate::providers::configs::ProviderConfig;
use crate::providers::factory::{get_provider, ProviderType};

/// One player action and the content it should be played against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnRequest {
    pub action: String,
    pub scenario_id: Option<String>,
    pub tone: Option<String>,
    pub model: Option<String>,
}

impl TurnRequest {
    pub fn new<S: Into<String>>(action: S) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }
}

/// Narrator runs game turns: it loads the prompt layers, picks the backend for
/// the requested model and drives the tool loop
pub struct Narrator {
    content: ContentStore,
    providers: HashMap<ProviderType, Arc<dyn Provider>>,
    settings: LoopSettings,
}

impl Narrator {
    pub fn new(content: ContentStore, settings: LoopSettings) -> Self {
        Self {
            content,
            providers: HashMap::new(),
            settings,
        }
    }

    /// Build a narrator with one provider handle per configured backend
    pub fn from_configs(
        content: ContentStore,
        settings: LoopSettings,
        configs: Vec<ProviderConfig>,
    ) -> TurnResult<Self> {
        let mut narrator = Self::new(content, settings);
        for config in configs {
            let provider_type = config.provider_type();
            narrator.add_provider(provider_type, Arc::from(get_provider(config)?));
        }
        Ok(narrator)
    }

    pub fn add_provider(&mut self, provider_type: ProviderType, provider: Arc<dyn Provider>) {
        info!(provider = %provider_type, "registered provider");
        self.providers.insert(provider_type, provider);
    }

    pub fn with_provider(
        mut self,
        provider_type: ProviderType,
        provider: Arc<dyn Provider>,
    ) -> Self {
        self.add_provider(provider_type, provider);
        self
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    fn agent_for(&self, selector: ModelSelector) -> TurnResult<(Agent, &'static str)> {
        let choice = selector.choice();
        let provider = self.providers.get(&choice.provider).ok_or_else(|| {
            TurnError::Provider(format!("Provider {} is not configured", choice.provider))
        })?;
        Ok((Agent::new(provider.clone(), self.settings), choice.model))
    }

    /// Play one turn against `conversation`.
    ///
    /// The user and assistant messages are appended together once the reply
    /// is complete; a failed turn leaves the conversation untouched.
    pub async fn play_turn(
        &self,
        conversation: &mut Conversation,
        request: TurnRequest,
        cancel: &CancellationToken,
    ) -> TurnResult<String> {
        let layers = self
            .content
            .load_layers(request.scenario_id.as_deref(), request.tone.as_deref())?;
        let system = layers.compose();

        let selector = ModelSelector::resolve(request.model.as_deref());
        let (agent, model) = self.agent_for(selector)?;

        let user_message = Message::user(request.action);
        let mut messages = conversation.snapshot();
        messages.push(user_message.clone());

        info!(
            scenario = request.scenario_id.as_deref().unwrap_or("default"),
            %selector,
            history = conversation.len(),
            "playing turn"
        );
        let reply = agent.reply(model, &system, &messages, cancel).await?;
        info!(
            rounds = reply.rounds,
            draws = reply.draws.len(),
            input_tokens = ?reply.usage.input_tokens,
            output_tokens = ?reply.usage.output_tokens,
            "turn complete"
        );

        conversation.append(user_message);
        conversation.append(Message::assistant(reply.text.clone()));
        Ok(reply.text)
    }

    /// Ask the next scenario-design question for an author
    pub async fn interview(
        &self,
        conversation: &[Message],
        cancel: &CancellationToken,
    ) -> TurnResult<InterviewStep> {
        let (agent, model) = self.agent_for(INTERVIEW_MODEL)?;
        interview::next_step(&agent, model, conversation, cancel).await
    }
}

/// Split a client-held transcript into its history and the pending action
///
/// The last message must come from the user.
pub fn split_pending_action(mut messages: Vec<Message>) -> TurnResult<(Conversation, String)> {
    match messages.pop() {
        Some(last) if last.role == Role::User => {
            Ok((Conversation::from_messages(messages), last.content))
        }
        Some(_) => Err(TurnError::InvalidArguments(
            "The last message must be a user message".to_string(),
        )),
        None => Err(TurnError::InvalidArguments(
            "At least one message is required".to_string(),
        )),
    }
}
