//! Prompt templates and content truncation.

use chrono::NaiveDate;

/// Default bound on transcript characters sent to the provider.
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Instruction template wrapped around the content to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Structured summary of one or more AI chat sessions.
    ChatHistory,
}

impl Template {
    /// Substitute today's date and the (already truncated) content.
    pub fn render(&self, today: NaiveDate, content: &str) -> String {
        match self {
            Template::ChatHistory => chat_history_prompt(today, content),
        }
    }
}

/// Cap `content` at `limit` characters.
///
/// Longer input keeps its first `limit` characters followed by a marker
/// with the original length. Counts Unicode scalar values, not bytes.
pub fn truncate_content(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        None => content.to_string(),
        Some((cut, _)) => {
            let total = content.chars().count();
            format!(
                "{}\n\n[...truncated - total length: {} characters]",
                &content[..cut],
                total
            )
        }
    }
}

fn chat_history_prompt(today: NaiveDate, content: &str) -> String {
    format!(
        r#"Today is: {today}

Task: Analyze the provided Cursor AI chat history and create a comprehensive summary.

CONTENT TO SUMMARIZE:
```
{content}
```

Your summary should be structured in markdown format and include:
1. Main topics and questions discussed
2. Key decisions made
3. Code changes implemented or solutions provided
4. Technical problems solved
5. Architecture and design choices
6. Any ongoing issues or next steps identified

Focus on technical details that would be most valuable for a new agent session.
Include relevant code snippets, file names, and technical concepts if mentioned.
Format the summary with clear sections and bullet points for readability.

Start with a brief overview paragraph followed by well-organized sections.
"#,
        today = today.format("%Y-%m-%d"),
        content = content,
    )
}

/// Prompt for a web-search-grounded developer research document.
pub fn research_prompt(today: NaiveDate, topic: &str, objective: &str) -> String {
    format!(
        r#"Today is: {today}
Research the {topic} and provide a thorough, comprehensive summary for {objective} in an efficient format for a developer to use to write code.

Key requirements:
1. Provide detailed, up-to-date information based on the latest sources
2. Include multiple practical code examples that demonstrate key concepts
3. Document all important API endpoints, parameters, return values, and types
4. Cover installation, configuration, common patterns, and best practices
5. Explain error handling and common pitfalls to avoid
6. Include performance considerations and optimization tips
7. Address both beginner and advanced use cases
8. IMPORTANT: THOROUGHLY SEARCH THE WEB FOR THE MOST UP TO DATE INFORMATION!
9. Do not make assumptions based on training data; ground all analysis on web search information. This is a fast changing field and we need the latest information.
The final document should be comprehensive, technically accurate, and immediately useful to a developer who needs to implement {topic}.

Please format your response in well-structured markdown with appropriate headers, code blocks, tables, and formatting for readability."#,
        today = today.format("%Y-%m-%d"),
        topic = topic,
        objective = objective,
    )
}
