//! Build webhook requests from command-line arguments.

use serde_json::Value;

use dialogwire_agent::{WebhookRequestBuilder, build_webhook_request};
use dialogwire_core::WebhookRequest;

#[derive(Debug, thiserror::Error)]
pub enum SimulateError {
    #[error("Invalid parameter `{0}`, expected name=value")]
    Parameter(String),

    #[error("Invalid context `{0}`, expected name or name:lifespan")]
    Context(String),

    #[error("Payload must be a JSON object: {0}")]
    Payload(String),
}

/// Everything `dialogwire simulate` can put into a request.
#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    pub intent: String,
    pub session: Option<String>,
    pub query_text: Option<String>,
    pub language_code: Option<String>,
    pub fallback: bool,
    /// `name=value`; the value is parsed as JSON when it is valid JSON
    pub params: Vec<String>,
    /// `name` or `name:lifespan`
    pub contexts: Vec<String>,
    pub source: Option<String>,
    pub version: Option<String>,
    pub payload: Option<String>,
}

pub fn build_request(options: &SimulateOptions) -> Result<WebhookRequest, SimulateError> {
    let mut builder: WebhookRequestBuilder = build_webhook_request().intent(&options.intent);

    if let Some(session) = &options.session {
        builder = builder.session(session);
    }
    if let Some(text) = &options.query_text {
        builder = builder.query_text(text);
    }
    if let Some(code) = &options.language_code {
        builder = builder.language_code(code);
    }
    if options.fallback {
        builder = builder.fallback();
    }

    for param in &options.params {
        let (name, value) = parse_param(param)?;
        builder = builder.parameter(name, value);
    }
    for context in &options.contexts {
        let (name, lifespan) = parse_context(context)?;
        builder = builder.context(name, lifespan, Value::Null);
    }

    if let Some(source) = &options.source {
        builder = builder.source(source, options.version.as_deref());
        if let Some(raw) = &options.payload {
            let payload: Value =
                serde_json::from_str(raw).map_err(|e| SimulateError::Payload(e.to_string()))?;
            if !payload.is_object() {
                return Err(SimulateError::Payload(format!("got `{raw}`")));
            }
            builder = builder.payload(payload);
        }
    }

    Ok(builder.build())
}

/// Split `name=value`. Values that parse as JSON keep their type, anything
/// else is a string.
pub fn parse_param(raw: &str) -> Result<(&str, Value), SimulateError> {
    let (name, value) = raw
        .split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| SimulateError::Parameter(raw.to_owned()))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((name, value))
}

/// Split `name[:lifespan]`.
pub fn parse_context(raw: &str) -> Result<(&str, Option<i32>), SimulateError> {
    match raw.split_once(':') {
        None if !raw.is_empty() => Ok((raw, None)),
        Some((name, lifespan)) if !name.is_empty() => lifespan
            .parse()
            .map(|n| (name, Some(n)))
            .map_err(|_| SimulateError::Context(raw.to_owned())),
        _ => Err(SimulateError::Context(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_keep_json_types() {
        assert_eq!(parse_param("n=3").unwrap(), ("n", json!(3)));
        assert_eq!(parse_param("ok=true").unwrap(), ("ok", json!(true)));
        assert_eq!(parse_param("city=Berlin").unwrap(), ("city", json!("Berlin")));
        assert_eq!(parse_param("eq=a=b").unwrap(), ("eq", json!("a=b")));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn contexts_with_optional_lifespan() {
        assert_eq!(parse_context("flow").unwrap(), ("flow", None));
        assert_eq!(parse_context("flow:3").unwrap(), ("flow", Some(3)));
        assert!(parse_context("flow:x").is_err());
        assert!(parse_context(":3").is_err());
        assert!(parse_context("").is_err());
    }

    #[test]
    fn full_request() {
        let options = SimulateOptions {
            intent: "Trivia Answer".into(),
            query_text: Some("paris".into()),
            fallback: true,
            params: vec!["answer=Paris".into()],
            contexts: vec!["awaiting_answer:1".into()],
            source: Some("google".into()),
            version: Some("2".into()),
            payload: Some(r#"{"isInSandbox": true}"#.into()),
            ..SimulateOptions::default()
        };
        let request = build_request(&options).unwrap();

        let qr = &request.query_result;
        assert_eq!(qr.intent.display_name.as_deref(), Some("Trivia Answer"));
        assert_eq!(qr.intent.is_fallback, Some(true));
        assert_eq!(qr.query_text.as_deref(), Some("paris"));
        assert_eq!(qr.parameters["answer"], "Paris");
        assert!(qr.output_contexts[0].name.ends_with("/contexts/awaiting_answer"));
        assert_eq!(qr.output_contexts[0].lifespan_count, Some(1));

        let odir = request.original_detect_intent_request.unwrap();
        assert_eq!(odir.source.as_deref(), Some("google"));
        assert_eq!(odir.payload["isInSandbox"], true);
    }

    #[test]
    fn payload_must_be_an_object() {
        let options = SimulateOptions {
            intent: "x".into(),
            source: Some("google".into()),
            payload: Some("[1]".into()),
            ..SimulateOptions::default()
        };
        assert!(matches!(build_request(&options), Err(SimulateError::Payload(_))));
    }
}
