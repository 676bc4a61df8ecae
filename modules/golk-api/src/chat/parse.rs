use ai_client::util::{extract_json_object, strip_code_blocks};
use serde::Deserialize;
use serde_json::Value;

/// What the model answered: an optional query plus prose.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnswer {
    pub cypher_query: Option<String>,
    pub text_explanation: String,
}

#[derive(Deserialize)]
struct RawAnswer {
    #[serde(default)]
    cypher_query: Option<Value>,
    #[serde(default)]
    text_explanation: Option<Value>,
}

fn as_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn from_json(candidate: &str) -> Option<ModelAnswer> {
    let raw: RawAnswer = serde_json::from_str(candidate).ok()?;
    let cypher_query = as_text(raw.cypher_query)
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    let text_explanation = as_text(raw.text_explanation).unwrap_or_default();
    if cypher_query.is_none() && text_explanation.is_empty() {
        return None;
    }
    Some(ModelAnswer {
        cypher_query,
        text_explanation,
    })
}

/// Direct JSON, then fenced JSON, then the first balanced object, then plain text.
pub fn parse_model_answer(reply: &str) -> ModelAnswer {
    from_json(reply.trim())
        .or_else(|| from_json(strip_code_blocks(reply)))
        .or_else(|| extract_json_object(reply).and_then(from_json))
        .unwrap_or_else(|| ModelAnswer {
            cypher_query: None,
            text_explanation: reply.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_json() {
        let a = parse_model_answer(
            r#"{"cypher_query": "MATCH (a:Area) RETURN a.Areas", "text_explanation": "All areas."}"#,
        );
        assert_eq!(a.cypher_query.as_deref(), Some("MATCH (a:Area) RETURN a.Areas"));
        assert_eq!(a.text_explanation, "All areas.");
    }

    #[test]
    fn fenced_json() {
        let a = parse_model_answer(
            "```json\n{\"cypher_query\": null, \"text_explanation\": \"Ayubowan!\"}\n```",
        );
        assert_eq!(a.cypher_query, None);
        assert_eq!(a.text_explanation, "Ayubowan!");
    }

    #[test]
    fn json_embedded_in_prose() {
        let a = parse_model_answer(
            "Here you go: {\"cypher_query\": \"RETURN 1\", \"text_explanation\": \"{curly}\"} enjoy",
        );
        assert_eq!(a.cypher_query.as_deref(), Some("RETURN 1"));
        assert_eq!(a.text_explanation, "{curly}");
    }

    #[test]
    fn plain_text_falls_back_to_explanation() {
        let a = parse_model_answer("  Sri Lanka uses the rupee.  ");
        assert_eq!(a.cypher_query, None);
        assert_eq!(a.text_explanation, "Sri Lanka uses the rupee.");
    }

    #[test]
    fn blank_query_is_treated_as_none() {
        let a = parse_model_answer(r#"{"cypher_query": "  ", "text_explanation": "Hello"}"#);
        assert_eq!(a.cypher_query, None);
    }

    #[test]
    fn unrelated_json_is_plain_text() {
        let a = parse_model_answer(r#"{"foo": 1}"#);
        assert_eq!(a.cypher_query, None);
        assert_eq!(a.text_explanation, r#"{"foo": 1}"#);
    }
}
