pub mod examples;
pub mod guard;
pub mod parse;
pub mod prompt;
pub mod table;

use std::sync::Arc;

use ai_client::{ChatModel, CompletionRequest};
use anyhow::Result;
use async_trait::async_trait;
use golk_graph::QueryRunner;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use examples::{ExampleBank, DEFAULT_K};
use prompt::{build_messages, insight_messages, ChatSettings, PromptContext};

pub const MAX_ROWS: usize = 100;
const INSIGHT_TEMPERATURE: f32 = 0.3;

/// Runs a checked read query against the graph.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run_read(&self, cypher: &str, max_rows: usize) -> Result<Vec<Value>>;
}

#[async_trait]
impl QueryExecutor for QueryRunner {
    async fn run_read(&self, cypher: &str, max_rows: usize) -> Result<Vec<Value>> {
        Ok(QueryRunner::run_read(self, cypher, max_rows).await?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatResult {
    pub text_explanation: String,
    pub cypher_query: Option<String>,
    pub data: Vec<Value>,
    pub table_html: Option<String>,
    pub table_insights: Option<String>,
    pub query_error: Option<String>,
}

pub struct ChatInput<'a> {
    pub question: &'a str,
    pub settings: &'a ChatSettings,
    pub date: &'a str,
    pub time: &'a str,
    pub questions: &'a [String],
    pub answers: &'a [String],
}

/// Question → similar examples → model → guarded query → rows, table and insights.
pub struct ChatPipeline {
    model: Arc<dyn ChatModel>,
    executor: Arc<dyn QueryExecutor>,
    examples: ExampleBank,
    schema: String,
}

impl ChatPipeline {
    pub fn new(
        model: Arc<dyn ChatModel>,
        executor: Arc<dyn QueryExecutor>,
        examples: ExampleBank,
    ) -> Self {
        Self {
            model,
            executor,
            examples,
            schema: golk_common::schema::describe(),
        }
    }

    pub fn examples(&self) -> &ExampleBank {
        &self.examples
    }

    /// Only the primary model call can fail; query and insight problems are reported in the result.
    pub async fn answer(&self, input: ChatInput<'_>) -> Result<ChatResult> {
        let hits = self.examples.most_similar(input.question, DEFAULT_K);
        info!(
            examples = hits.len(),
            model = self.model.model_name(),
            "Answering chat question"
        );

        let ctx = PromptContext {
            settings: input.settings,
            date: input.date,
            time: input.time,
            schema: &self.schema,
            examples: &hits,
        };
        let request = CompletionRequest::new(build_messages(
            &ctx,
            input.questions,
            input.answers,
            input.question,
        ))
        .temperature(input.settings.temperature())
        .json_mode();

        let reply = self.model.complete(request).await?;
        let answer = parse::parse_model_answer(&reply);

        let mut result = ChatResult {
            text_explanation: answer.text_explanation,
            cypher_query: answer.cypher_query,
            ..Default::default()
        };

        let Some(cypher) = result.cypher_query.clone() else {
            return Ok(result);
        };

        let checked = match guard::check_read_only(&cypher) {
            Ok(q) => q,
            Err(e) => {
                warn!(error = %e, cypher = %cypher, "Rejected generated query");
                result.query_error = Some(format!("Query rejected: {e}"));
                return Ok(result);
            }
        };

        match self.executor.run_read(checked, MAX_ROWS).await {
            Ok(rows) => result.data = rows,
            Err(e) => {
                warn!(error = %e, cypher = %cypher, "Generated query failed");
                result.query_error = Some(e.to_string());
                return Ok(result);
            }
        }

        if result.data.is_empty() {
            return Ok(result);
        }

        result.table_html = table::rows_to_html(&result.data);
        result.table_insights = self
            .insights(input.settings, input.question, &result.data)
            .await;
        Ok(result)
    }

    async fn insights(&self, settings: &ChatSettings, question: &str, rows: &[Value]) -> Option<String> {
        let request = CompletionRequest::new(insight_messages(settings, question, rows))
            .temperature(INSIGHT_TEMPERATURE);
        match self.model.complete(request).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Insight generation failed");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use ai_client::MessageRole;
    use serde_json::json;

    /// Replays canned replies in order; an `Err` entry simulates a provider failure.
    #[derive(Default)]
    pub struct ScriptedModel {
        pub replies: Mutex<VecDeque<Result<String, String>>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                requests: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(e)) => Err(anyhow::anyhow!(e)),
                None => Err(anyhow::anyhow!("no scripted reply left")),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    pub struct FakeGraph {
        pub rows: Vec<Value>,
        pub fail: Option<String>,
        pub executed: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl QueryExecutor for FakeGraph {
        async fn run_read(&self, cypher: &str, max_rows: usize) -> Result<Vec<Value>> {
            self.executed
                .lock()
                .unwrap()
                .push((cypher.to_string(), max_rows));
            if let Some(e) = &self.fail {
                anyhow::bail!("{e}");
            }
            Ok(self.rows.iter().take(max_rows).cloned().collect())
        }
    }

    fn pipeline(model: Arc<ScriptedModel>, graph: Arc<FakeGraph>) -> ChatPipeline {
        ChatPipeline::new(
            model,
            graph,
            ExampleBank::new(vec![examples::QueryExample {
                question: "Restaurants in Kandy".into(),
                cypher_query: "MATCH (r:Restaurant) RETURN r.Restaurant".into(),
            }]),
        )
    }

    async fn ask(p: &ChatPipeline, question: &str) -> ChatResult {
        let settings = ChatSettings::default();
        p.answer(ChatInput {
            question,
            settings: &settings,
            date: "2024-07-01",
            time: "09:00",
            questions: &[],
            answers: &[],
        })
        .await
        .unwrap()
    }

    const QUERY_REPLY: &str = r#"{"cypher_query": "MATCH (a:Area)-[:HAS_RESTAURANT]->(r:Restaurant) WHERE a.Areas = 'Kandy' RETURN r.Restaurant AS name", "text_explanation": "Restaurants in Kandy."}"#;

    #[tokio::test]
    async fn full_answer_with_rows_table_and_insights() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(QUERY_REPLY), Ok("Try Balaji Dosai.")]));
        let graph = Arc::new(FakeGraph {
            rows: vec![json!({"name": "Balaji Dosai"}), json!({"name": "Empire Cafe"})],
            ..Default::default()
        });
        let p = pipeline(model.clone(), graph.clone());

        let result = ask(&p, "Where can I eat in Kandy?").await;
        assert_eq!(result.text_explanation, "Restaurants in Kandy.");
        assert_eq!(result.data.len(), 2);
        assert!(result.table_html.unwrap().contains("<td>Empire Cafe</td>"));
        assert_eq!(result.table_insights.as_deref(), Some("Try Balaji Dosai."));
        assert_eq!(result.query_error, None);

        let executed = graph.executed.lock().unwrap();
        assert_eq!(executed[0].1, MAX_ROWS);

        let requests = model.requests.lock().unwrap();
        assert!(requests[0].json_mode);
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].messages[0].role, MessageRole::System);
        assert!(requests[0].messages[0].content.contains("Restaurants in Kandy"));
        assert!(!requests[1].json_mode);
    }

    #[tokio::test]
    async fn write_queries_are_never_executed() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(
            r#"{"cypher_query": "MATCH (n) DETACH DELETE n", "text_explanation": "Done."}"#,
        )]));
        let graph = Arc::new(FakeGraph::default());
        let result = ask(&pipeline(model, graph.clone()), "wipe it").await;

        assert!(result.query_error.unwrap().starts_with("Query rejected"));
        assert!(result.data.is_empty());
        assert!(graph.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn execution_errors_are_reported_not_raised() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(QUERY_REPLY)]));
        let graph = Arc::new(FakeGraph {
            fail: Some("Neo.ClientError.Statement.SyntaxError".into()),
            ..Default::default()
        });
        let result = ask(&pipeline(model, graph), "eat").await;
        assert!(result.query_error.unwrap().contains("SyntaxError"));
        assert_eq!(result.table_html, None);
    }

    #[tokio::test]
    async fn insight_failure_leaves_insights_empty() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(QUERY_REPLY), Err("rate limited")]));
        let graph = Arc::new(FakeGraph {
            rows: vec![json!({"name": "Balaji Dosai"})],
            ..Default::default()
        });
        let result = ask(&pipeline(model, graph), "eat").await;
        assert!(result.table_html.is_some());
        assert_eq!(result.table_insights, None);
    }

    #[tokio::test]
    async fn empty_rows_skip_table_and_insights() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(QUERY_REPLY)]));
        let result = ask(&pipeline(model.clone(), Arc::new(FakeGraph::default())), "eat").await;
        assert!(result.data.is_empty());
        assert_eq!(result.table_html, None);
        assert_eq!(model.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn plain_text_reply_has_no_query() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("Ayubowan! How can I help?")]));
        let graph = Arc::new(FakeGraph::default());
        let result = ask(&pipeline(model, graph.clone()), "hello").await;
        assert_eq!(result.text_explanation, "Ayubowan! How can I help?");
        assert_eq!(result.cypher_query, None);
        assert!(graph.executed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_is_an_error() {
        let model = Arc::new(ScriptedModel::new(vec![Err("boom")]));
        let p = pipeline(model, Arc::new(FakeGraph::default()));
        let settings = ChatSettings::default();
        let err = p
            .answer(ChatInput {
                question: "hi",
                settings: &settings,
                date: "",
                time: "",
                questions: &[],
                answers: &[],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
