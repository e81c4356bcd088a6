pub mod azure;
pub mod prompt;

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export types that consumers will need to create and use tools
pub use serde_json::{Value, json};
pub use std::collections::HashMap;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("no Azure OpenAI API key configured")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("model returned no choices")]
    EmptyResponse,
    #[error("tool call budget exhausted after {0} rounds")]
    ToolRoundsExceeded(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in the transcript relayed to and from the model, in
/// chat-completions wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(turn: &AssistantTurn) -> Self {
        Self {
            role: Role::Assistant,
            content: turn.content.clone(),
            tool_calls: (!turn.tool_calls.is_empty()).then(|| turn.tool_calls.clone()),
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub kind: ToolType,
    pub function: Function,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Function,
}

#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
}

/// What the model produced for one backend round-trip.
#[derive(Debug, Clone, Default)]
pub struct AssistantTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// One chat-completions round against whatever model service backs the agent.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Tool])
    -> Result<AssistantTurn, AgentError>;
}

/// Executes the tool calls the model asks for. Errors are reported as
/// strings so they can be handed back to the model verbatim.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&mut self, name: &str, arguments: &Value) -> Result<String, String>;
}

/// Conversation state plus the relay loop between the user, the model and
/// the registered tools.
pub struct Agent {
    backend: Box<dyn ChatBackend>,
    history: Vec<ChatMessage>,
    tools: Vec<Tool>,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(backend: Box<dyn ChatBackend>, max_tool_rounds: usize) -> Self {
        Self {
            backend,
            history: vec![],
            tools: vec![],
            max_tool_rounds,
        }
    }

    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Set all tools for the agent, replacing any existing tools
    pub fn set_tools(&mut self, tools: Vec<Tool>) {
        self.tools = tools;
    }

    pub fn set_system_prompt(&mut self, prompt: impl Display) {
        self.history.push(ChatMessage::system(prompt.to_string()));
    }

    /// Get the tools that are configured for this agent
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// The full transcript accumulated so far.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Run one user turn: append the prompt, relay the transcript to the
    /// model, dispatch any tool calls it makes through `executor` and feed
    /// the results back, until the model answers with plain text. Tool
    /// failures are passed back to the model as tool results so it can
    /// rewrite and retry.
    pub async fn run_turn(
        &mut self,
        prompt: impl Display,
        executor: &mut dyn ToolExecutor,
    ) -> Result<String, AgentError> {
        self.history.push(ChatMessage::user(prompt.to_string()));

        for _ in 0..self.max_tool_rounds {
            let turn = self.backend.chat(&self.history, &self.tools).await?;
            self.history.push(ChatMessage::assistant(&turn));

            if turn.tool_calls.is_empty() {
                return Ok(turn.content.unwrap_or_default());
            }

            for call in &turn.tool_calls {
                tracing::debug!(tool = %call.function.name, "dispatching tool call");

                let result = match serde_json::from_str::<Value>(&call.function.arguments) {
                    Ok(arguments) => executor.execute(&call.function.name, &arguments).await,
                    Err(err) => Err(format!("invalid tool arguments: {err}")),
                };

                let content = result.unwrap_or_else(|err| format!("error: {err}"));
                self.history.push(ChatMessage::tool(call.id.clone(), content));
            }
        }

        Err(AgentError::ToolRoundsExceeded(self.max_tool_rounds))
    }
}

/// Helper function to create a tool with the given name, description, and parameters
///
/// # Example
/// ```rust
/// use agent::{create_tool, json, HashMap, Value};
///
/// let parameters: HashMap<String, Value> = serde_json::from_value(json!({
///     "type": "object",
///     "properties": {
///         "query": {
///             "type": "string",
///             "description": "The SQL query to execute",
///         },
///     },
///     "required": ["query"],
/// })).unwrap();
///
/// let tool = create_tool(
///     "run_query",
///     "Execute a SQL query against the database",
///     parameters,
/// );
/// ```
pub fn create_tool(
    name: impl Into<String>,
    description: impl Into<String>,
    parameters: HashMap<String, Value>,
) -> Tool {
    Tool {
        kind: ToolType::Function,
        function: Function {
            name: name.into(),
            description: Some(description.into()),
            parameters: Some(parameters),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend returning pre-programmed turns in FIFO order.
    struct MockBackend {
        turns: Mutex<VecDeque<AssistantTurn>>,
    }

    impl MockBackend {
        fn new(turns: Vec<AssistantTurn>) -> Box<Self> {
            Box::new(Self {
                turns: Mutex::new(turns.into()),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[Tool],
        ) -> Result<AssistantTurn, AgentError> {
            Ok(self
                .turns
                .lock()
                .unwrap()
                .pop_front()
                .expect("MockBackend: no more turns available"))
        }
    }

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Vec<(String, Value)>,
        fail: bool,
    }

    #[async_trait]
    impl ToolExecutor for RecordingExecutor {
        async fn execute(&mut self, name: &str, arguments: &Value) -> Result<String, String> {
            self.calls.push((name.to_string(), arguments.clone()));
            if self.fail {
                Err("boom".to_string())
            } else {
                Ok("3 rows".to_string())
            }
        }
    }

    fn text_turn(content: &str) -> AssistantTurn {
        AssistantTurn {
            content: Some(content.to_string()),
            tool_calls: vec![],
        }
    }

    fn tool_turn(id: &str, name: &str, arguments: &str) -> AssistantTurn {
        AssistantTurn {
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
        }
    }

    #[tokio::test]
    async fn plain_answer_ends_the_turn() {
        let mut agent = Agent::new(MockBackend::new(vec![text_turn("five students")]), 8);
        agent.set_system_prompt("be helpful");
        let mut executor = RecordingExecutor::default();

        let answer = agent.run_turn("how many?", &mut executor).await.unwrap();

        assert_eq!(answer, "five students");
        assert!(executor.calls.is_empty());
        let roles: Vec<Role> = agent.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
    }

    #[tokio::test]
    async fn tool_calls_are_dispatched_and_results_relayed() {
        let mut agent = Agent::new(
            MockBackend::new(vec![
                tool_turn("call_1", "run_query", r#"{"query": "SELECT 1"}"#),
                text_turn("done"),
            ]),
            8,
        );
        let mut executor = RecordingExecutor::default();

        let answer = agent.run_turn("count them", &mut executor).await.unwrap();

        assert_eq!(answer, "done");
        assert_eq!(
            executor.calls,
            vec![("run_query".to_string(), json!({"query": "SELECT 1"}))]
        );

        let tool_msg = &agent.history()[2];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.content.as_deref(), Some("3 rows"));
    }

    #[tokio::test]
    async fn executor_errors_are_fed_back_to_the_model() {
        let mut agent = Agent::new(
            MockBackend::new(vec![
                tool_turn("call_1", "run_query", r#"{"query": "SELEKT"}"#),
                text_turn("recovered"),
            ]),
            8,
        );
        let mut executor = RecordingExecutor {
            fail: true,
            ..RecordingExecutor::default()
        };

        let answer = agent.run_turn("count", &mut executor).await.unwrap();

        assert_eq!(answer, "recovered");
        let tool_msg = &agent.history()[2];
        assert_eq!(tool_msg.content.as_deref(), Some("error: boom"));
    }

    #[tokio::test]
    async fn malformed_arguments_do_not_reach_the_executor() {
        let mut agent = Agent::new(
            MockBackend::new(vec![
                tool_turn("call_1", "run_query", "{not json"),
                text_turn("ok"),
            ]),
            8,
        );
        let mut executor = RecordingExecutor::default();

        agent.run_turn("count", &mut executor).await.unwrap();

        assert!(executor.calls.is_empty());
        let tool_msg = &agent.history()[2];
        assert!(
            tool_msg
                .content
                .as_deref()
                .unwrap()
                .starts_with("error: invalid tool arguments")
        );
    }

    #[tokio::test]
    async fn round_budget_is_enforced() {
        let turns = (0..3)
            .map(|i| tool_turn(&format!("call_{i}"), "run_query", "{}"))
            .collect();
        let mut agent = Agent::new(MockBackend::new(turns), 3);
        let mut executor = RecordingExecutor::default();

        let err = agent.run_turn("loop", &mut executor).await.unwrap_err();

        assert!(matches!(err, AgentError::ToolRoundsExceeded(3)));
    }

    #[test]
    fn tool_messages_carry_the_call_id_on_the_wire() {
        let msg = ChatMessage::tool("call_9", "ok");
        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            wire,
            json!({"role": "tool", "content": "ok", "tool_call_id": "call_9"})
        );
    }

    #[test]
    fn user_messages_omit_tool_fields() {
        let wire = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(wire, json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn create_tool_serializes_to_function_wire_form() {
        let parameters: HashMap<String, Value> = serde_json::from_value(json!({
            "type": "object",
            "properties": {},
        }))
        .unwrap();

        let wire = serde_json::to_value(create_tool("list_tables", "List tables", parameters))
            .unwrap();

        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "list_tables");
        assert_eq!(wire["function"]["parameters"]["type"], "object");
    }
}
