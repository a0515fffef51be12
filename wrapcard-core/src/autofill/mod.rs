//! AI autofill: persona text in, the four stats fields out.

mod gemini;

use serde_json::json;

use crate::config::AutofillConfig;
use crate::types::StatsPatch;
use crate::{Error, Result};

pub use gemini::GeminiClient;

const SYSTEM_INSTRUCTION: &str = "You are a creative engine generating \"Year in Music\" summary stats (Wrapped style).
Generate realistic looking data for Top Artists, Top Songs, Minutes Listened, and Top Genre based on a user persona.
The output must be JSON.
Minutes listened should be formatted like \"27.031\" (dot as thousand separator).
Artist and Song names should be short and punchy.";

/// One structured text-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub prompt: String,
    /// JSON schema the response must follow
    pub response_schema: serde_json::Value,
}

/// Text completion interface for autofill.
pub trait CompletionClient: Send + Sync {
    /// Return the concatenated text of the model's answer.
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Create the default Gemini-backed client.
///
/// Fails with [`Error::Config`] when no API key is available; nothing touches
/// the network in that case.
pub fn create_client(config: &AutofillConfig) -> Result<Box<dyn CompletionClient>> {
    Ok(Box::new(GeminiClient::new(config)?))
}

/// Generate stats for `persona` with the configured service.
pub fn generate(persona: &str, config: &AutofillConfig) -> Result<StatsPatch> {
    validate_persona(persona)?;
    let client = create_client(config)?;
    generate_with_client(persona, client.as_ref())
}

/// Generate stats for `persona` using a supplied client. Single attempt.
pub fn generate_with_client(persona: &str, client: &dyn CompletionClient) -> Result<StatsPatch> {
    validate_persona(persona)?;
    let request = build_request(persona);

    tracing::info!(persona_len = persona.len(), "Requesting autofill");
    let raw = client.complete(&request)?;
    if raw.trim().is_empty() {
        return Err(Error::Autofill("no response from AI".to_string()));
    }

    let patch = parse_patch(&raw)?;
    tracing::debug!(
        artists = patch.top_artists.len(),
        songs = patch.top_songs.len(),
        "Autofill response parsed"
    );
    Ok(patch)
}

/// Build the request sent for a persona.
pub fn build_request(persona: &str) -> CompletionRequest {
    CompletionRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        prompt: format!("Generate a music summary for this persona: \"{}\"", persona),
        response_schema: response_schema(),
    }
}

fn validate_persona(persona: &str) -> Result<()> {
    if persona.trim().is_empty() {
        return Err(Error::Autofill("persona must not be empty".to_string()));
    }
    Ok(())
}

fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "topArtists": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of 5 artist names",
            },
            "topSongs": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of 5 song titles",
            },
            "minutesListened": {
                "type": "STRING",
                "description": "Total minutes formatted like 12.345",
            },
            "topGenre": {
                "type": "STRING",
                "description": "The top music genre",
            },
        },
        "required": ["topArtists", "topSongs", "minutesListened", "topGenre"],
    })
}

fn parse_patch(raw: &str) -> Result<StatsPatch> {
    match serde_json::from_str::<StatsPatch>(raw) {
        Ok(patch) => Ok(patch),
        Err(first) => match extract_json_object(raw) {
            Ok(extracted) if extracted.len() < raw.trim().len() => {
                Ok(serde_json::from_str::<StatsPatch>(&extracted)?)
            }
            _ => Err(first.into()),
        },
    }
}

fn extract_json_object(raw: &str) -> Result<String> {
    let start = raw
        .find('{')
        .ok_or_else(|| Error::Autofill("response did not contain a JSON object".to_string()))?;
    let end = raw
        .rfind('}')
        .ok_or_else(|| Error::Autofill("response did not contain a JSON object".to_string()))?;
    if end <= start {
        return Err(Error::Autofill(
            "response JSON bounds are invalid".to_string(),
        ));
    }
    Ok(raw[start..=end].to_string())
}
