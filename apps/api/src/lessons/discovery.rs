//! Content discovery: asks the model for a fresh batch of news items.

use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::lessons::prompts::{DISCOVERY_PROMPT_TEMPLATE, TUTOR_SYSTEM_TEMPLATE};
use crate::lessons::ContentFetchError;
use crate::llm_client::prompts::{fill_template, AUDIENCE, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{call_json, GenerationRequest, GenerativeModel};
use crate::models::{CefrLevel, ContentItem, Language, Topic};

/// Number of items a discovery call asks for (two articles, two videos).
pub const EXPECTED_BATCH_SIZE: usize = 4;

const DISCOVERY_TEMPERATURE: f32 = 0.5;

/// Intermediate type for the discovery payload. `items` is required.
#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    items: Vec<ContentItem>,
}

/// Fetches a batch of candidate items for the given selection.
///
/// Fails with `ContentFetchError` when the response is absent, does not parse,
/// lacks `items`, is empty, or contains an item without a title or URL.
#[instrument(skip_all, fields(language = %language, level = %level, topics = topics.len()))]
pub async fn discover_content(
    model: &dyn GenerativeModel,
    language: Language,
    level: CefrLevel,
    topics: &[Topic],
) -> Result<Vec<ContentItem>, ContentFetchError> {
    let request = build_discovery_request(language, level, topics);

    let response: DiscoveryResponse = call_json(model, &request).await?;
    validate_items(&response.items)?;

    if response.items.len() != EXPECTED_BATCH_SIZE {
        warn!(
            "Discovery returned {} items (expected {})",
            response.items.len(),
            EXPECTED_BATCH_SIZE
        );
    }
    info!("Discovered {} content items", response.items.len());

    Ok(response.items)
}

pub(crate) fn build_discovery_request(
    language: Language,
    level: CefrLevel,
    topics: &[Topic],
) -> GenerationRequest {
    let topics = topics
        .iter()
        .map(|t| t.canonical())
        .collect::<Vec<_>>()
        .join(", ");

    GenerationRequest {
        system_instruction: tutor_system_instruction(language),
        user_prompt: fill_template(
            DISCOVERY_PROMPT_TEMPLATE,
            &[
                ("language", language.name()),
                ("level", level.code()),
                ("topics", &topics),
                ("json_only", JSON_ONLY_INSTRUCTION),
            ],
        ),
        temperature: DISCOVERY_TEMPERATURE,
        // Search grounding and a JSON mime type cannot be combined, so the
        // shape is enforced through the prompt and fence stripping instead.
        json_response: false,
        search_grounding: true,
    }
}

pub(crate) fn tutor_system_instruction(language: Language) -> String {
    fill_template(
        TUTOR_SYSTEM_TEMPLATE,
        &[("language", language.name()), ("audience", AUDIENCE)],
    )
}

fn validate_items(items: &[ContentItem]) -> Result<(), ContentFetchError> {
    if items.is_empty() {
        return Err(ContentFetchError::Schema("`items` is empty".to_string()));
    }
    for (i, item) in items.iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(ContentFetchError::Schema(format!("item {i} has no title")));
        }
        if item.url.trim().is_empty() {
            return Err(ContentFetchError::Schema(format!("item {i} has no url")));
        }
    }
    Ok(())
}
