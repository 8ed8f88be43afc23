//! Prompt text for edit and chat requests

use cowrite_editor::EditMode;

/// Tool the model must call to report its edit
pub const TOOL_NAME: &str = "document_edit_response";

pub const DEFAULT_INSTRUCTION: &str = "Add a Tips for Success section with three helpful onboarding tips.";

pub const ALLOWED_OPS: &str = concat!(
    "Allowed ops (array of objects, use JSON with double quotes):\n",
    "- append_markdown: { \"op\": \"append_markdown\", \"markdown\": \"...\" }\n",
    "- rename_heading: { \"op\": \"rename_heading\", \"heading\": \"Section Title\", \"newHeading\": \"New Title\", \"level\": 2 }\n",
    "- delete_section: { \"op\": \"delete_section\", \"heading\": \"Section Title\", \"level\": 2 }\n",
    "- replace_section_by_heading: { \"op\": \"replace_section_by_heading\", \"heading\": \"Section Title\", \"level\": 2, \"markdown\": \"...\" }\n",
    "- insert_after_heading: { \"op\": \"insert_after_heading\", \"heading\": \"Section Title\", \"level\": 2, \"markdown\": \"...\" }\n\n",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Edit,
    Chat,
}

#[derive(Debug, Clone, Default)]
pub struct PromptInput<'a> {
    pub content: &'a str,
    pub base_hash: Option<&'a str>,
    pub schema_hints: Option<&'a str>,
    pub recent_revision: &'a str,
    pub instruction: &'a str,
    pub message: &'a str,
}

/// Blank instructions fall back to the default
pub fn instruction_or_default(instruction: &str) -> &str {
    let trimmed = instruction.trim();
    if trimmed.is_empty() {
        DEFAULT_INSTRUCTION
    } else {
        trimmed
    }
}

pub fn build_prompt(kind: PromptKind, mode: EditMode, input: &PromptInput<'_>) -> String {
    let mut prompt = String::new();

    match kind {
        PromptKind::Edit => prompt.push_str("You are editing a shared markdown document. "),
        PromptKind::Chat => prompt.push_str(
            "You are assisting with a shared markdown document. \
             If the user is just chatting, do NOT edit and leave opsJson and markdown empty. \
             Only edit when the user clearly requests a change to the document. ",
        ),
    }
    prompt.push_str(&format!("Call the {} tool. ", TOOL_NAME));
    prompt.push_str(
        "If mode is A, set opsJson (a JSON string of the ops array) and leave markdown empty. \
         If mode is B, set markdown and leave opsJson empty. \
         If mode is A, the content below is Markdown and ops must target that document.\n\n",
    );
    prompt.push_str(ALLOWED_OPS);
    prompt.push_str("Return opsJson as a JSON string (e.g. \"[{...}]\"), not a list.\n");

    match kind {
        PromptKind::Edit => prompt.push_str(
            "Acknowledge the recent revision string in ack. \
             Make a deterministic edit based on the instruction.\n\n",
        ),
        PromptKind::Chat => prompt.push_str("Reply conversationally and briefly in reply.\n\n"),
    }

    prompt.push_str(&format!("Base hash (echo back): {}\n", input.base_hash.unwrap_or("")));
    prompt.push_str(&format!("Schema hints: {}\n\n", input.schema_hints.unwrap_or("")));
    prompt.push_str(&format!("Mode: {}\n", mode));

    match kind {
        PromptKind::Edit => {
            prompt.push_str(&format!("Recent revision: {}\n\n", input.recent_revision));
            prompt.push_str(&format!("Instruction: {}\n\n", instruction_or_default(input.instruction)));
        }
        PromptKind::Chat => prompt.push_str(&format!("Message: {}\n\n", input.message)),
    }

    prompt.push_str(&format!("Content:\n{}", input.content));
    prompt
}
