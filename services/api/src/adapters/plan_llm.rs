//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the plan-generating LLM.
//! It implements the `PlanGenerationService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are a study-planning assistant. Generate a highly structured 7-day study plan for a student from the details they provide.

Rules:
1. Balance the workload across 7 days.
2. Include breaks (don't schedule more than 90 mins without a gap, but return only the study blocks).
3. Prioritize tasks with closer due dates and higher difficulty.
4. Each block should have a specific 'topic' derived from the subjects or tasks.
5. Ensure the 'day' field is one of: Monday, Tuesday, Wednesday, Thursday, Friday, Saturday, Sunday.

Respond with a single JSON object of this exact shape and nothing else:
{"studyPlan": [{"day": "...", "startTime": "HH:MM", "endTime": "HH:MM", "subject": "...", "topic": "...", "durationMinutes": 60}]}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use lumina_core::{
    domain::{GeneratedBlock, PlanRequest},
    ports::{PlanGenerationService, PortError, PortResult},
};
use serde::Deserialize;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanGenerationService` using an
/// OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiPlanAdapter {
    /// Creates a new `OpenAiPlanAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Renders the request details into the user turn of the prompt.
fn build_user_input(request: &PlanRequest) -> String {
    let task_lines = request
        .tasks
        .iter()
        .map(|t| {
            format!(
                "{} ({}, Due: {}, Difficulty: {})",
                t.title,
                t.subject,
                t.due_date,
                t.difficulty.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "Student details:\n\
         - Subjects: {}\n\
         - Available Study Hours per day: {}\n\
         - Existing Tasks/Deadlines: {}\n\
         - Additional Requirements: {}",
        request.subjects.join(", "),
        request.available_hours_per_day,
        task_lines,
        request.notes,
    )
}

/// Decodes the model's `{"studyPlan": [...]}` payload. A missing `studyPlan`
/// key is an empty plan; anything that does not parse is a generation failure.
fn parse_plan_response(raw: &str) -> PortResult<Vec<GeneratedBlock>> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PlanResponse {
        #[serde(default)]
        study_plan: Vec<GeneratedBlock>,
    }

    let parsed: PlanResponse = serde_json::from_str(raw.trim())
        .map_err(|e| PortError::PlanGeneration(format!("the model returned an unusable plan: {e}")))?;
    Ok(parsed.study_plan)
}

//=========================================================================================
// `PlanGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanGenerationService for OpenAiPlanAdapter {
    /// Requests one 7-day schedule from the model. A single round trip, no
    /// retries; every failure mode surfaces as `PortError::PlanGeneration`.
    async fn generate_plan(&self, request: &PlanRequest) -> PortResult<Vec<GeneratedBlock>> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::PlanGeneration(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(build_user_input(request))
                .build()
                .map_err(|e| PortError::PlanGeneration(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .n(1)
            .build()
            .map_err(|e| PortError::PlanGeneration(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::PlanGeneration(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                parse_plan_response(&content)
            } else {
                Err(PortError::PlanGeneration(
                    "Plan generation LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::PlanGeneration(
                "Plan generation LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
