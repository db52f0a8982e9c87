//! Structured model invocation: template rendering, one model call, and
//! schema-checked parsing of the JSON answer.

use std::{collections::BTreeMap, marker::PhantomData, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::{AnalyticsError, Result},
    llm::{ChatMessage, ChatModel, TraceContext},
};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Types a model can be asked to produce. The JSON schema derived from the
/// type is shown to the model and enforced on its answer.
pub trait StructuredOutput: DeserializeOwned + JsonSchema {}

impl<T: DeserializeOwned + JsonSchema> StructuredOutput for T {}

/// Named values substituted into `{placeholder}` slots of prompt templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptInputs(BTreeMap<String, String>);

impl PromptInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// A reusable system/user prompt pair bound to an output type and a model.
pub struct StructuredChain<T> {
    system_template: String,
    user_template: String,
    schema: Value,
    format_instructions: String,
    model: Arc<dyn ChatModel>,
    _output: PhantomData<fn() -> T>,
}

impl<T: StructuredOutput> StructuredChain<T> {
    /// Validate the templates and the output schema up front so a bad chain
    /// fails before any model call.
    pub fn build(
        system_template: impl Into<String>,
        user_template: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let system_template = system_template.into();
        let user_template = user_template.into();
        if system_template.trim().is_empty() {
            return Err(AnalyticsError::validation("system template must not be empty"));
        }
        if user_template.trim().is_empty() {
            return Err(AnalyticsError::validation("user template must not be empty"));
        }

        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(AnalyticsError::validation(
                "output schema must describe a JSON object",
            ));
        }
        let format_instructions = format_instructions(&serde_json::to_string_pretty(&schema)?);

        Ok(Self {
            system_template,
            user_template,
            schema,
            format_instructions,
            model,
            _output: PhantomData,
        })
    }

    /// Render the conversation sent to the model.
    pub fn render(&self, inputs: &PromptInputs) -> Result<Vec<ChatMessage>> {
        let mut system = render_template(&self.system_template, inputs)?;
        system.push_str(&self.format_instructions);
        let user = render_template(&self.user_template, inputs)?;
        Ok(vec![ChatMessage::system(system), ChatMessage::user(user)])
    }

    /// One model call, one parse attempt. No retries.
    pub async fn invoke(&self, inputs: &PromptInputs, trace: &TraceContext) -> Result<T> {
        let messages = self.render(inputs)?;
        info!(
            target: "textlens::trace",
            session_id = %trace.session_id,
            feature = trace.feature,
            step = trace.step,
            model = self.model.name(),
            "model call"
        );
        debug!(
            prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "rendered prompt"
        );
        let raw = self.model.invoke(&messages).await?;
        parse_structured(&raw, &self.schema)
    }
}

fn format_instructions(schema: &str) -> String {
    format!(
        r#"

Output your answer as a JSON object that conforms to the following schema:
```json
{schema}
```

Important instructions:
1. Ensure your JSON is valid and properly formatted.
2. Do not include the schema definition in your answer.
3. Only output the data instance that matches the schema.
4. Do not include any explanations or comments within the JSON output.
"#
    )
}

/// Substitute `{name}` placeholders. Every placeholder must have a value.
pub fn render_template(template: &str, inputs: &PromptInputs) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut missing = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        rendered.push_str(&template[last..whole.start()]);
        match inputs.get(name.as_str()) {
            Some(value) => rendered.push_str(value),
            None => missing.push(name.as_str().to_string()),
        }
        last = whole.end();
    }
    rendered.push_str(&template[last..]);

    if !missing.is_empty() {
        return Err(AnalyticsError::Template(format!(
            "missing values for placeholders: {}",
            missing.join(", ")
        )));
    }
    Ok(rendered)
}

/// Strip a Markdown code fence or surrounding prose from a JSON answer.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(open) = trimmed.find("```") {
        // Skip the language tag (`json`, `JSON`, ...) and cut at the last fence.
        let body = trimmed[open + 3..].trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        let body = body.rfind("```").map_or(body, |close| &body[..close]);
        return body.trim();
    }
    if trimmed.starts_with('{') {
        return trimmed;
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a model answer and check it against the schema's required fields
/// before deserialising into `T`.
pub fn parse_structured<T: DeserializeOwned>(raw: &str, schema: &Value) -> Result<T> {
    let value: Value = serde_json::from_str(extract_json(raw))
        .map_err(|e| AnalyticsError::schema(format!("response is not valid JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| AnalyticsError::schema("response is not a JSON object"))?;

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|fields| fields.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    let absent: Vec<&str> = required
        .into_iter()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !absent.is_empty() {
        return Err(AnalyticsError::schema(format!(
            "response is missing required fields: {}",
            absent.join(", ")
        )));
    }

    serde_json::from_value(value).map_err(|e| AnalyticsError::schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Answer {
        label: String,
        #[serde(default)]
        note: Option<String>,
    }

    fn answer_schema() -> Value {
        serde_json::to_value(schemars::schema_for!(Answer)).unwrap()
    }

    #[test]
    fn renders_all_placeholders() {
        let inputs = PromptInputs::new().with("topic", "reviews").with("n", 3);
        let out = render_template("About {topic}: give {n} {{\"json\"}}", &inputs).unwrap();
        assert_eq!(out, "About reviews: give 3 {{\"json\"}}");
    }

    #[test]
    fn missing_placeholder_is_template_error() {
        let err = render_template("{a} and {b}", &PromptInputs::new().with("a", 1)).unwrap_err();
        assert!(matches!(err, AnalyticsError::Template(ref m) if m.contains('b')));
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"label\": \"x\"}\n```";
        let parsed: Answer = parse_structured(raw, &answer_schema()).unwrap();
        assert_eq!(parsed.label, "x");
    }

    #[test]
    fn fence_with_trailing_prose_and_upper_case_tag() {
        let raw = "Result:\n```JSON\n{\"label\": \"z\"}\n```\nLet me know if you need more.";
        let parsed: Answer = parse_structured(raw, &answer_schema()).unwrap();
        assert_eq!(parsed.label, "z");
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = "Sure! {\"label\": \"y\", \"note\": \"n\"} Hope that helps.";
        let parsed: Answer = parse_structured(raw, &answer_schema()).unwrap();
        assert_eq!(parsed.note.as_deref(), Some("n"));
    }

    #[test]
    fn missing_required_field_is_schema_violation() {
        let err = parse_structured::<Answer>("{\"note\": \"n\"}", &answer_schema()).unwrap_err();
        assert!(matches!(err, AnalyticsError::SchemaViolation(ref m) if m.contains("label")));
    }

    #[test]
    fn non_json_is_schema_violation() {
        let err = parse_structured::<Answer>("I cannot do that", &answer_schema()).unwrap_err();
        assert!(matches!(err, AnalyticsError::SchemaViolation(_)));
    }
}
