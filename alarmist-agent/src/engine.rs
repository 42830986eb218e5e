//! Dialogue engine: the slot-filling state machine
//!
//! One call to [`DialogueEngine::handle_turn`] processes one utterance for
//! one session. The engine holds only read-only tables and shared
//! collaborators, so a single instance can serve many sessions at once as
//! long as each session is lent to one turn at a time.

use crate::catalog::IntentCatalog;
use crate::command::generate;
use crate::executor::{execute, ExecutionReport};
use crate::responses::{ResponseComposer, CONFIRM_OR_DENY, DECLINED, RETRY_EXHAUSTED};
use alarmist_core::alarm::{AlarmStore, Command, Operation};
use alarmist_core::config::DialogueConfig;
use alarmist_core::session::{ConversationSession, Entities};
use alarmist_core::utils::{title_case, truncate, Chooser, Clock, RandomChooser, SystemClock};
use alarmist_core::{DialogueState, Intent};
use alarmist_nlu::patterns::has_word;
use alarmist_nlu::{
    merge_tags, validate, EntityExtractor, EntityModel, IntentClassifier, IntentModel, IntentTag,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

const HELP_REQUESTS: &[&str] = &["help", "?", "what can you do"];
const RESET_REQUESTS: &[&str] = &["reset", "start over", "clear"];
const LITERAL_CONFIRM: &[&str] = &["yes", "y", "ok", "sure", "confirm"];
const LITERAL_DENY: &[&str] = &["no", "n", "cancel", "nope"];
const GREETING_WORDS: &[&str] = &["hi", "hello", "hey"];
const GREETING_PHRASES: &[&str] = &["good morning", "good evening"];

static NAME_INTRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:i'm|i am|my name is|call me) ([a-z]+)").expect("valid name regex")
});

/// Result of running a command during a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Execution {
    Completed(ExecutionReport),
    /// The store rejected the command; the reply was still sent
    Failed { error: String },
}

/// Everything the transport needs after one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub reply: String,
    /// Session state after the turn
    pub state: DialogueState,
    /// Intent the turn acted on, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Slots known after the turn, or the slots an executed action used
    #[serde(default)]
    pub entities: Entities,
    /// Command generated when an action ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    /// Store outcome, present when a store is attached and a command ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<Execution>,
}

struct Action {
    reply: String,
    command: Option<Command>,
    execution: Option<Execution>,
}

impl Action {
    fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            command: None,
            execution: None,
        }
    }
}

/// The conversation state machine
pub struct DialogueEngine {
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    catalog: Arc<IntentCatalog>,
    responses: ResponseComposer,
    store: Option<Arc<dyn AlarmStore>>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
    timeout_ms: u64,
}

impl Default for DialogueEngine {
    fn default() -> Self {
        Self::new(&DialogueConfig::default())
    }
}

impl DialogueEngine {
    /// Create an engine using pattern classification, the system clock and
    /// random template choice
    pub fn new(config: &DialogueConfig) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            extractor: EntityExtractor::new(),
            catalog: Arc::new(IntentCatalog::new()),
            responses: ResponseComposer::new(Arc::new(RandomChooser)),
            store: None,
            clock: Arc::new(SystemClock),
            max_retries: config.max_retries.max(1),
            timeout_ms: config.classifier_timeout_ms,
        }
    }

    /// Consult `model` before the intent patterns
    pub fn with_intent_model(mut self, model: Arc<dyn IntentModel>) -> Self {
        self.classifier = IntentClassifier::with_model(model, self.timeout_ms);
        self
    }

    /// Consult `model` before the entity patterns
    pub fn with_entity_model(mut self, model: Arc<dyn EntityModel>) -> Self {
        self.extractor = EntityExtractor::with_model(model, self.timeout_ms);
        self
    }

    /// Execute confirmed commands against `store`
    pub fn with_store(mut self, store: Arc<dyn AlarmStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Route every template and prompt choice through `chooser`
    pub fn with_chooser(mut self, chooser: Arc<dyn Chooser>) -> Self {
        self.responses = ResponseComposer::new(chooser);
        self
    }

    pub fn with_catalog(mut self, catalog: IntentCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    /// Process one utterance for `session`
    pub async fn handle_turn(&self, session: &mut ConversationSession, text: &str) -> TurnOutcome {
        let text = text.trim();
        session.record_utterance(text, self.clock.now());
        self.capture_user_name(session, text);

        let lower = text.to_lowercase();
        let before = session.state;

        let action = if HELP_REQUESTS.contains(&lower.as_str()) {
            Action::reply(self.responses.help())
        } else if RESET_REQUESTS.contains(&lower.as_str()) {
            session.reset();
            Action::reply(self.responses.greeting(session.user_name.as_deref()))
        } else {
            match session.state {
                DialogueState::Idle => self.on_idle(session, text).await,
                DialogueState::Collecting => self.on_collecting(session, text),
                DialogueState::Confirming => self.on_confirming(session, text).await,
            }
        };

        debug!(
            "Session {}: {} -> {}",
            session.key,
            before.as_str(),
            session.state.as_str()
        );

        // Executed actions reset the session; report the slots they ran with
        let (intent, entities) = match (&action.command, &session.last_action) {
            (Some(_), Some(last)) => (Some(last.intent), last.entities.clone()),
            _ => (session.intent, session.entities.clone()),
        };

        TurnOutcome {
            reply: action.reply,
            state: session.state,
            intent,
            entities,
            command: action.command,
            execution: action.execution,
        }
    }

    fn capture_user_name(&self, session: &mut ConversationSession, text: &str) {
        if session.user_name.is_some() {
            return;
        }
        let lower = text.to_lowercase();
        let greeted = has_word(&lower, GREETING_WORDS)
            || GREETING_PHRASES.iter().any(|phrase| lower.contains(phrase));
        if !greeted {
            return;
        }
        if let Some(caps) = NAME_INTRO.captures(&lower) {
            let name = title_case(&caps[1]);
            debug!("Session {} introduced as {}", session.key, name);
            session.user_name = Some(name);
        }
    }

    async fn on_idle(&self, session: &mut ConversationSession, text: &str) -> Action {
        let tag = self.classifier.classify(text, DialogueState::Idle).await;
        let Some(intent) = tag.intent() else {
            let lower = text.to_lowercase();
            if has_word(&lower, GREETING_WORDS)
                || GREETING_PHRASES.iter().any(|phrase| lower.contains(phrase))
            {
                return Action::reply(self.responses.greeting(session.user_name.as_deref()));
            }
            debug!("No intent recognized in {:?}", truncate(text, 80));
            return Action::reply(self.responses.unknown_intent());
        };

        let today = self.clock.today();
        let tokens = self.extractor.extract(text).await;
        let entities: Entities = merge_tags(&tokens)
            .into_iter()
            .filter_map(|(slot, raw)| match validate(slot, &raw, today) {
                Ok(value) => Some((slot, value)),
                Err(e) => {
                    // Dropped silently: the slot is asked for again as missing
                    debug!("Discarding extracted {} {:?}: {}", slot, raw, e);
                    None
                }
            })
            .collect();

        session.begin(intent, entities, self.catalog.required(intent));
        debug!(
            "Intent {} with {:?}, missing {:?}",
            intent, session.entities, session.missing_fields
        );

        if intent == Intent::ShowAlarms {
            return self.run(session).await;
        }

        match session.current_field() {
            Some(field) => {
                let prompt = self.responses.prompt(&self.catalog, intent, field);
                Action::reply(self.responses.ask(&prompt))
            }
            None => Action::reply(
                self.responses
                    .confirmation(&session.entities, self.clock.today()),
            ),
        }
    }

    fn on_collecting(&self, session: &mut ConversationSession, text: &str) -> Action {
        let today = self.clock.today();
        let Some(field) = session.current_field() else {
            session.state = DialogueState::Confirming;
            return Action::reply(self.responses.confirmation(&session.entities, today));
        };
        let Some(intent) = session.intent else {
            session.reset();
            return Action::reply(self.responses.unknown_intent());
        };

        match validate(field, text, today) {
            Err(e) => {
                let retries = session.register_retry();
                if retries >= self.max_retries {
                    info!(
                        "Session {} reset after {} invalid {} answers",
                        session.key, retries, field
                    );
                    session.reset();
                    Action::reply(RETRY_EXHAUSTED)
                } else {
                    Action::reply(self.responses.retry(&e))
                }
            }
            Ok(value) => {
                session.fill_slot(field, value.clone());
                let next = match session.current_field() {
                    Some(next) => self.responses.prompt(&self.catalog, intent, next),
                    None => self.responses.confirmation(&session.entities, today),
                };
                Action::reply(self.responses.collected(field, &value, &next))
            }
        }
    }

    async fn on_confirming(&self, session: &mut ConversationSession, text: &str) -> Action {
        let tag = self.classifier.classify(text, DialogueState::Confirming).await;
        let literal = text.trim().to_lowercase();

        if tag == IntentTag::ConfirmAction || LITERAL_CONFIRM.contains(&literal.as_str()) {
            self.run(session).await
        } else if tag == IntentTag::DenyAction || LITERAL_DENY.contains(&literal.as_str()) {
            session.reset();
            Action::reply(DECLINED)
        } else {
            Action::reply(CONFIRM_OR_DENY)
        }
    }

    /// Generate and execute the pending command, then reset the session
    async fn run(&self, session: &mut ConversationSession) -> Action {
        let Some(intent) = session.intent else {
            session.reset();
            return Action::reply(self.responses.unknown_intent());
        };
        let today = self.clock.today();
        let command = generate(intent, &session.entities, today);
        info!("Session {} executing {}: {}", session.key, intent, command);

        let execution = match &self.store {
            Some(store) => match execute(store.as_ref(), &command).await {
                Ok(report) => Some(Execution::Completed(report)),
                Err(e) => {
                    warn!("Alarm store failed for {}: {}", intent, e);
                    Some(Execution::Failed {
                        error: e.to_string(),
                    })
                }
            },
            None => None,
        };

        let mut reply = self.responses.success(intent, &session.entities, today);
        if command.operation == Operation::Query {
            if let Some(Execution::Completed(report)) = &execution {
                reply.push('\n');
                reply.push_str(&self.responses.alarm_listing(&report.alarms, today));
            }
        }
        reply.push_str("\n\n");
        reply.push_str(self.responses.farewell());

        session.record_action(intent, self.clock.now());
        session.reset();

        Action {
            reply,
            command: Some(command),
            execution,
        }
    }
}
