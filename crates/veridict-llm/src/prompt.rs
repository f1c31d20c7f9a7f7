//! Prompt construction for claim classification.

use veridict_common::NormalizedText;

use crate::backend::{LlmRequest, Message};

const SYSTEM_PROMPT: &str = "You are a meticulous fact-checking assistant. \
You classify short claims as real, fake, or uncertain, always citing \
reputable sources. You respond with a single JSON object and nothing else: \
no prose, no markdown fences.";

/// Build the classification request for a sanitized claim. The output-format
/// instruction is strict, but the reply is still treated as untrusted and
/// run through the extraction pipeline.
pub fn classification_request(text: &NormalizedText) -> LlmRequest {
    let user = format!(
        "Classify the following claim as real, fake, or uncertain.\n\
         Claim: {claim}\n\n\
         Respond with exactly one JSON object of this shape:\n\
         {{\n\
         \x20 \"status\": \"real\" | \"fake\" | \"uncertain\",\n\
         \x20 \"confidence\": <integer 0-100>,\n\
         \x20 \"justification\": \"<one or two sentences>\",\n\
         \x20 \"sources\": [{{\"title\": \"...\", \"url\": \"...\", \"summary\": \"...\"}}]\n\
         }}\n\
         Provide up to 5 reputable sources. Answer in the language of the claim.",
        claim = text.as_str()
    );

    LlmRequest {
        messages: vec![
            Message {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: user,
            },
        ],
        model: None,
        max_tokens: Some(1024),
        temperature: Some(0.1),
    }
}
