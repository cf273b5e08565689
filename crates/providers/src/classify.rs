use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use voyage_core::intent::classify_rules;
use voyage_core::models::{
    AgentParams, ExtractedInfo, Intent, IntentResult, TravelSession, TripDuration,
};

use crate::error::{ProviderError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_RETRIES: usize = 2;

const SYSTEM_PROMPT: &str = "당신은 사용자 의도 분석 전문가입니다.";

const INSTRUCTIONS: &str = r#"사용자의 입력을 분석하여 의도를 파악하세요.

특별 지침:
- YYYY-MM-DD 형태의 날짜 입력(예: 2025-06-10)은 "info_collection"으로 분류
- 날짜 관련 입력인 경우 extracted_info에 departure_date 필드 포함

IMPORTANT: intent_type은 반드시 다음 중 하나여야 합니다:
- info_collection
- search_request
- planning_request
- calendar_action
- share_action
- modification_request
- general_conversation

다음 JSON 형태로만 응답하세요:
{
    "intent_type": "위의 7개 값 중 하나만 사용",
    "confidence": 0.0,
    "extracted_info": {},
    "agent_params": {},
    "reasoning": "분석 근거"
}"#;

pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, input: &str, session: &TravelSession) -> Result<IntentResult>;
}

/// Keyword classifier; never fails, used in offline mode and as the landing
/// spot when the model call does.
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier;

impl IntentClassifier for RuleClassifier {
    async fn classify(&self, input: &str, _session: &TravelSession) -> Result<IntentResult> {
        Ok(classify_rules(input))
    }
}

/// Chat-completions classifier against an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClassifier {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("OPENAI_API_KEY"))?;
        let base_url =
            std::env::var("VOYAGE_OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("VOYAGE_OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, base_url, model))
    }

    async fn chat_completion(&self, body: &Value) -> Result<Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut backoff = Duration::from_millis(250);

        for attempt in 0.. {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let outcome = match response {
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await?;
                    if status.is_success() {
                        return serde_json::from_str(&text).map_err(|err| {
                            ProviderError::InvalidResponse(format!("bad completion JSON: {err}"))
                        });
                    }
                    let message = serde_json::from_str::<Value>(&text)
                        .ok()
                        .and_then(|v| {
                            v.pointer("/error/message")
                                .and_then(Value::as_str)
                                .map(str::to_string)
                        })
                        .unwrap_or(text);
                    Err(ProviderError::Api {
                        status: status.as_u16(),
                        message,
                    })
                }
                Err(err) => Err(ProviderError::Http(err)),
            };

            match outcome {
                Err(err) if err.is_retryable() && attempt < MAX_RETRIES => {
                    warn!(attempt, error = %err, "classifier request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                other => return other,
            }
        }
        unreachable!("retry loop always returns")
    }
}

impl IntentClassifier for LlmClassifier {
    async fn classify(&self, input: &str, session: &TravelSession) -> Result<IntentResult> {
        let context = context_snapshot(session);
        let user_prompt = format!(
            "{INSTRUCTIONS}\n\n현재 상황: {}\n사용자 입력: \"{input}\"",
            serde_json::to_string_pretty(&context).unwrap_or_default()
        );

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt},
            ],
        });

        let completion = self.chat_completion(&body).await?;
        let content = completion
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::InvalidResponse("no message content".to_string()))?;

        debug!(model = %self.model, "classifier response received");
        parse_intent_response(content)
    }
}

/// Compact state the model sees alongside the utterance: phase, collected
/// slots, whether a plan exists, and the last three messages.
fn context_snapshot(session: &TravelSession) -> Value {
    let history: Vec<&str> = session
        .recent_context(3)
        .iter()
        .map(|m| m.content.as_str())
        .collect();

    json!({
        "current_phase": session.current_phase.as_str(),
        "collected_info": {
            "destination": session.preferences.destination,
            "travel_style": session.preferences.travel_style.map(|s| s.as_str()),
            "duration": session.preferences.duration,
            "departure_date": session.preferences.departure_date,
            "budget": session.preferences.budget.map(|b| b.as_str()),
            "companion_type": session.preferences.companion_type.map(|c| c.as_str()),
        },
        "has_travel_plan": session.travel_plan.is_some(),
        "conversation_history": history,
    })
}

/// Parses the model's JSON answer, tolerating markdown fences and loose
/// payload types. An unknown intent token degrades to general conversation
/// instead of failing the turn.
pub fn parse_intent_response(content: &str) -> Result<IntentResult> {
    let cleaned = strip_code_fences(content);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|err| ProviderError::InvalidResponse(format!("unparseable intent JSON: {err}")))?;

    let intent = value
        .get("intent_type")
        .and_then(Value::as_str)
        .and_then(Intent::parse)
        .unwrap_or(Intent::GeneralConversation);

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5) as f32;

    let mut result = IntentResult::bare(intent, confidence);
    if let Some(extracted) = value.get("extracted_info") {
        result.extracted_info = extracted_info_from_value(extracted);
    }
    if let Some(params) = value.get("agent_params") {
        result.agent_params = agent_params_from_value(params);
    }
    Ok(result)
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Field-by-field lenient conversion; a wrong-typed field is dropped rather
/// than poisoning the whole result. Duration is accepted only in structured
/// form.
fn extracted_info_from_value(value: &Value) -> ExtractedInfo {
    ExtractedInfo {
        destination: string_field(value, "destination"),
        travel_style: string_field(value, "travel_style"),
        duration: value
            .get("duration")
            .filter(|d| d.is_object())
            .and_then(|d| serde_json::from_value::<TripDuration>(d.clone()).ok()),
        departure_date: string_field(value, "departure_date"),
        budget: string_field(value, "budget"),
        companion_type: string_field(value, "companion_type"),
    }
}

fn agent_params_from_value(value: &Value) -> AgentParams {
    AgentParams {
        action: string_field(value, "action"),
        target: string_field(value, "type"),
        destination: string_field(value, "destination"),
        budget: string_field(value, "budget"),
        place: value
            .get("place")
            .and_then(|p| serde_json::from_value(p.clone()).ok()),
        place_name: string_field(value, "place_name"),
    }
}

/// Runtime-selected classifier backend.
#[derive(Debug, Clone)]
pub enum Classifier {
    Llm(LlmClassifier),
    Rules(RuleClassifier),
}

impl Classifier {
    pub fn rules() -> Self {
        Self::Rules(RuleClassifier)
    }

    /// Model-backed when `OPENAI_API_KEY` is present, keyword rules otherwise.
    pub fn from_env() -> Self {
        match LlmClassifier::from_env() {
            Ok(llm) => Self::Llm(llm),
            Err(_) => Self::Rules(RuleClassifier),
        }
    }
}

impl IntentClassifier for Classifier {
    async fn classify(&self, input: &str, session: &TravelSession) -> Result<IntentResult> {
        match self {
            Classifier::Llm(llm) => llm.classify(input, session).await,
            Classifier::Rules(rules) => rules.classify(input, session).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyage_core::models::MessageRole;

    #[test]
    fn fenced_json_is_stripped() {
        let content = "```json\n{\"intent_type\": \"planning_request\", \"confidence\": 0.9}\n```";
        let result = parse_intent_response(content).unwrap();
        assert_eq!(result.intent, Intent::PlanningRequest);
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_intent_token_degrades_to_general_conversation() {
        let result =
            parse_intent_response("{\"intent_type\": \"banana\", \"confidence\": 0.99}").unwrap();
        assert_eq!(result.intent, Intent::GeneralConversation);
    }

    #[test]
    fn missing_confidence_defaults_to_half() {
        let result = parse_intent_response("{\"intent_type\": \"share_action\"}").unwrap();
        assert!((result.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn non_json_content_is_an_invalid_response() {
        let err = parse_intent_response("I think the user wants to travel").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn string_duration_is_dropped_but_structured_one_survives() {
        let loose = parse_intent_response(
            "{\"intent_type\": \"info_collection\", \"extracted_info\": {\"duration\": \"2박 3일\"}}",
        )
        .unwrap();
        assert!(loose.extracted_info.duration.is_none());

        let structured = parse_intent_response(
            "{\"intent_type\": \"info_collection\", \"extracted_info\": {\"duration\": {\"name\": \"2박 3일\", \"days\": 3, \"nights\": 2}}}",
        )
        .unwrap();
        assert_eq!(structured.extracted_info.duration.unwrap().days, 3);
    }

    #[test]
    fn snapshot_carries_last_three_messages() {
        let mut session = TravelSession::new("s-1");
        for i in 0..5 {
            session.add_message(MessageRole::User, &format!("m{i}"));
        }
        let snapshot = context_snapshot(&session);
        let history = snapshot["conversation_history"].as_array().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], "m2");
        assert_eq!(snapshot["current_phase"], "greeting");
        assert_eq!(snapshot["has_travel_plan"], false);
    }

    #[tokio::test]
    async fn rule_classifier_is_infallible() {
        let session = TravelSession::new("s-1");
        let result = RuleClassifier.classify("아무말", &session).await.unwrap();
        assert_eq!(result.intent, Intent::InfoCollection);
    }
}
