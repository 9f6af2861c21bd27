//! Text actually sent to the generative endpoints.

use super::model::GenerationRequest;

pub const DEFAULT_TARGET_TOOL: &str = "Midjourney";

/// Image tools the prompt assistant knows how to target.
pub const PROMPT_TARGET_TOOLS: &[&str] = &["Midjourney", "DALL·E 3", "Stable Diffusion"];

/// Renders the endpoint prompt for a request.
pub fn render(request: &GenerationRequest) -> String {
    match request {
        GenerationRequest::Concept { description } => concept_brief(description),
        GenerationRequest::Prompt { idea, target_tool } => {
            let tool = if target_tool.trim().is_empty() {
                DEFAULT_TARGET_TOOL
            } else {
                target_tool.trim()
            };
            prompt_brief(idea, tool)
        }
        GenerationRequest::Image { prompt } => prompt.clone(),
    }
}

fn concept_brief(description: &str) -> String {
    format!(
        "I am an interior designer and need a detailed interior design concept for the \
following space: \"{description}\". Please give a thorough description covering:\n\
- The overall style (for example modern, bohemian, industrial).\n\
- The suggested colour palette, with example colours.\n\
- The main furniture types and materials.\n\
- Lighting elements.\n\
- Finishing touches and decor.\n\
- The atmosphere the design aims for.\n\
Write in a professional, detailed tone."
    )
}

fn prompt_brief(idea: &str, tool: &str) -> String {
    format!(
        "I want to create an interior design image using {tool}. My core idea is: \"{idea}\".\n\
Please expand this idea into a detailed, optimised prompt for {tool}, including details on:\n\
- The artistic or realistic style.\n\
- The colour palette.\n\
- Lighting elements.\n\
- Camera angle and scene composition.\n\
- The fine details that will make the image unique and striking.\n\
Write the prompt in English so it suits the image generation tool."
    )
}
