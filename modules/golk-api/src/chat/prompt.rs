use ai_client::util::truncate_to_char_boundary;
use ai_client::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::examples::ScoredExample;

pub const HISTORY_TURNS: usize = 5;
/// Cap on the JSON rows handed to the insight call.
const INSIGHT_ROWS_MAX_BYTES: usize = 12_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub language: String,
    pub politeness_level: String,
    pub formality: String,
    pub creativity: f64,
    pub response_length: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            language: "English".into(),
            politeness_level: "Friendly".into(),
            formality: "Casual".into(),
            creativity: 0.7,
            response_length: "Medium".into(),
        }
    }
}

impl ChatSettings {
    pub fn temperature(&self) -> f32 {
        if self.creativity.is_finite() {
            self.creativity.clamp(0.0, 2.0) as f32
        } else {
            0.7
        }
    }
}

/// Everything the system prompt is built from.
pub struct PromptContext<'a> {
    pub settings: &'a ChatSettings,
    pub date: &'a str,
    pub time: &'a str,
    pub schema: &'a str,
    pub examples: &'a [ScoredExample<'a>],
}

const RESPONSE_SHAPE: &str = r#"Respond with a single JSON object and nothing else:
{"cypher_query": string or null, "text_explanation": string}
- "cypher_query": one read-only Cypher query answering the question from the graph, or null when the graph is not needed (greetings, general advice).
- "text_explanation": the answer for the traveller. When a query is given, describe what it returns; the rows are shown to the user separately."#;

pub fn system_prompt(ctx: &PromptContext<'_>) -> String {
    let s = ctx.settings;
    let mut prompt = format!(
        "You are GoLK, a helpful AI tour guide for Sri Lanka.\n\
         Language: {}\nPoliteness: {}\nFormality: {}\nResponse Length: {}\n\
         Today is {} and the local time is {}.\n\n\
         Provide information about Sri Lankan tourism, culture, history and attractions. \
         Be accurate and respectful of local customs.\n\n\
         Travel data lives in a Neo4j graph. Only read from it. \
         Return properties, never whole nodes or relationships.\n\n{}\n",
        s.language,
        s.politeness_level,
        s.formality,
        s.response_length,
        ctx.date,
        ctx.time,
        ctx.schema,
    );

    if !ctx.examples.is_empty() {
        prompt.push_str("\nSimilar questions and the queries that answered them:\n");
        for (i, hit) in ctx.examples.iter().enumerate() {
            prompt.push_str(&format!(
                "Example {}:\nQuestion: {}\nCypher: {}\n",
                i + 1,
                hit.example.question,
                hit.example.cypher_query
            ));
        }
    }

    prompt.push('\n');
    prompt.push_str(RESPONSE_SHAPE);
    prompt
}

/// Pair up the most recent turns, oldest first.
pub fn history_messages(questions: &[String], answers: &[String]) -> Vec<Message> {
    let turns = questions.len().min(answers.len());
    let start = turns.saturating_sub(HISTORY_TURNS);
    (start..turns)
        .flat_map(|i| {
            [
                Message::user(questions[i].clone()),
                Message::assistant(answers[i].clone()),
            ]
        })
        .collect()
}

pub fn build_messages(
    ctx: &PromptContext<'_>,
    questions: &[String],
    answers: &[String],
    question: &str,
) -> Vec<Message> {
    let mut messages = vec![Message::system(system_prompt(ctx))];
    messages.extend(history_messages(questions, answers));
    messages.push(Message::user(question));
    messages
}

pub fn insight_messages(settings: &ChatSettings, question: &str, rows: &[Value]) -> Vec<Message> {
    let data = serde_json::to_string(rows).unwrap_or_default();
    let data = truncate_to_char_boundary(&data, INSIGHT_ROWS_MAX_BYTES);
    vec![
        Message::system(format!(
            "You are GoLK, a Sri Lanka travel guide. Summarise query results for a traveller \
             in {} with a {} tone. Point out the most useful entries in a few short sentences \
             or bullet points. Do not invent data that is not in the rows.",
            settings.language, settings.politeness_level
        )),
        Message::user(format!("Question: {question}\nRows (JSON): {data}")),
    ]
}
