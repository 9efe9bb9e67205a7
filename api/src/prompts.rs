//! Prompt templates for the four proxy operations. Shaping happens
//! server-side so every client gets the same behavior and the templates can
//! evolve without client releases.

use gitscope_core::ai::{ChallengeRequest, ChatRequest, ExplainRequest, LearningPathRequest};

use crate::upstream::UpstreamMessage;

const CONTENT_LIMIT: usize = 12_000;

pub struct Prompt {
    pub system: String,
    pub messages: Vec<UpstreamMessage>,
}

fn user(content: String) -> Vec<UpstreamMessage> {
    vec![UpstreamMessage {
        role: "user".to_string(),
        content,
    }]
}

fn clip(text: &str) -> &str {
    let mut end = text.len().min(CONTENT_LIMIT);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub fn explain(request: &ExplainRequest) -> Prompt {
    let system = "You are a patient senior engineer explaining source code to \
                  someone exploring an unfamiliar repository. Explain what the \
                  file does, how it fits into the project, and anything a \
                  newcomer would find surprising. Answer in concise markdown."
        .to_string();

    let content = format!(
        "Repository: {}\nFile: {}\nLanguage: {}\n\n```\n{}\n```",
        request.repo,
        request.path,
        request.language.as_deref().unwrap_or("unknown"),
        clip(&request.content),
    );

    Prompt {
        system,
        messages: user(content),
    }
}

pub fn learning_path(request: &LearningPathRequest) -> Prompt {
    let system = "You design learning curricula for codebases. Respond with \
                  ONLY a JSON object: {\"overview\": string, \"prerequisites\": \
                  [string], \"modules\": [{\"title\": string, \"description\": \
                  string, \"files\": [string], \"objectives\": [string], \
                  \"estimated_time\": string}], \"projects\": [string]}. \
                  Three to six modules, ordered from entry points outward."
        .to_string();

    let content = format!(
        "Repository: {}\nDescription: {}\nPrimary language: {}\n\nFiles:\n{}",
        request.repo,
        request.description.as_deref().unwrap_or("none"),
        request.language.as_deref().unwrap_or("unknown"),
        clip(&request.file_summary),
    );

    Prompt {
        system,
        messages: user(content),
    }
}

pub fn chat(request: &ChatRequest) -> Prompt {
    let system = format!(
        "You are a helpful guide for a developer exploring a repository. \
         Keep answers short and concrete; reference files by path. \
         Context: {}",
        request.context,
    );

    let mut messages: Vec<UpstreamMessage> = request
        .history
        .iter()
        .map(|turn| UpstreamMessage {
            role: turn.role.clone(),
            content: turn.content.clone(),
        })
        .collect();
    messages.push(UpstreamMessage {
        role: "user".to_string(),
        content: request.message.clone(),
    });

    Prompt { system, messages }
}

pub fn challenges(request: &ChallengeRequest) -> Prompt {
    let system = "You write quiz questions about codebases. Respond with ONLY \
                  a JSON array of 3-5 objects: {\"id\": string, \"type\": \
                  \"multiple-choice\", \"question\": string, \"options\": \
                  [string, 4 entries], \"correct_answer\": string (must equal \
                  one option exactly), \"explanation\": string, \"points\": \
                  integer 10-30}."
        .to_string();

    let content = format!(
        "Repository: {}\nModule: {}\n{}\nFiles covered:\n{}\nObjectives:\n{}",
        request.repo,
        request.module_title,
        request.module_description,
        request.files.join("\n"),
        request.objectives.join("\n"),
    );

    Prompt {
        system,
        messages: user(content),
    }
}
