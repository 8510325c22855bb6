use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::hints::{BackgroundContext, ReservedRegion};
use crate::layout::{ImageDims, Layout, ProposedLayout, lenient};
use crate::refine::{RefineConfig, refine};

/// A model reply that parsed as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Proposal {
    #[serde(default)]
    pub product: Option<Value>,
    #[serde(default)]
    pub background: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub layout: Option<ProposedLayout>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What a model reply turned out to be. The caller decides whether an
/// unstructured reply is worth another request.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Structured(Proposal),
    Unstructured(String),
}

impl ModelResponse {
    pub fn into_proposal(self) -> Option<Proposal> {
        match self {
            ModelResponse::Structured(proposal) => Some(proposal),
            ModelResponse::Unstructured(_) => None,
        }
    }
}

/// Classifies a reply: either the whole text is a JSON object, or it is one
/// fenced code block holding a JSON object. Anything else is unstructured.
pub fn parse_response(text: &str) -> ModelResponse {
    let trimmed = text.trim();
    let body = strip_code_fence(trimmed).unwrap_or(trimmed);
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(err) => {
            debug!("model reply is not JSON: {}", err);
            return ModelResponse::Unstructured(text.to_string());
        }
    };
    if !value.is_object() {
        debug!("model reply is JSON but not an object");
        return ModelResponse::Unstructured(text.to_string());
    }
    match serde_json::from_value::<Proposal>(value) {
        Ok(proposal) => ModelResponse::Structured(proposal),
        Err(err) => {
            debug!("model reply does not look like a proposal: {}", err);
            ModelResponse::Unstructured(text.to_string())
        }
    }
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;
    let (tag, body) = inner.split_once('\n')?;
    if tag.trim().chars().all(|ch| ch.is_ascii_alphanumeric()) {
        Some(body.trim())
    } else {
        None
    }
}

/// The proposal with its layout replaced by the refined one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinedProposal {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Value>,
    pub layout: Layout,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_context: Option<BackgroundContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_regions: Option<Vec<ReservedRegion>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RefinedProposal {
    /// Stores `palette` under `background.palette`, replacing a background
    /// that is not an object.
    pub fn set_palette(&mut self, palette: Vec<String>) {
        let background = self
            .background
            .get_or_insert_with(|| Value::Object(Map::new()));
        if !background.is_object() {
            *background = Value::Object(Map::new());
        }
        if let Value::Object(map) = background {
            map.insert(
                "palette".to_string(),
                Value::Array(palette.into_iter().map(Value::String).collect()),
            );
        }
    }
}

pub fn refine_proposal(
    proposal: Proposal,
    dims: Option<ImageDims>,
    config: &RefineConfig,
) -> RefinedProposal {
    let mut extra = proposal.extra;
    // Derived sections are recomputed, never passed through.
    extra.remove("background_context");
    extra.remove("reserved_regions");
    RefinedProposal {
        product: proposal.product,
        background: proposal.background,
        layout: refine(proposal.layout, dims, config),
        background_context: None,
        reserved_regions: None,
        extra,
    }
}
