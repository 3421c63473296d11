//! Prompt templates
//!
//! Every prompt that embeds records goes through `recent_records_json`, which
//! caps how many records are sent.

use crate::models::Transaction;
use crate::Result;

pub const CHAT_GREETING: &str = "Hello! I'm your personal finance assistant. I can see your latest transactions. How can I help you analyze your spending or find savings opportunities today?";

pub const NEWS_CHAT_GREETING: &str = "Hi! I've read today's financial news summary. Ask me anything about it, or how it might affect your personal finances.";

/// Pretty JSON of the `cap` most recent records, newest first. Records sharing
/// a date keep their relative order.
pub fn recent_records_json(records: &[Transaction], cap: usize) -> Result<String> {
    let mut recent: Vec<&Transaction> = records.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(cap);
    Ok(serde_json::to_string_pretty(&recent)?)
}

pub fn summary_prompt(records_json: &str) -> String {
    format!(
        r#"Analyze the following financial transactions and provide a concise, insightful summary.
- Highlight the biggest spending categories.
- Mention the total income vs. total expenses.
- Offer one smart suggestion for saving money based on the spending patterns.
- Keep the tone encouraging and helpful.
- Format the output as markdown.

Transactions:
{}"#,
        records_json
    )
}

pub fn content_analysis_prompt(content: &str) -> String {
    format!(
        r#"Analyze the following content and provide a clear, structured analysis.
- Summarize the main points in a few sentences.
- List the key takeaways as bullet points.
- Describe the overall tone or sentiment.
- Point out any financial implications or opportunities, if relevant.
- Format the output as markdown.

CONTENT:
---
{}
---"#,
        content
    )
}

pub const NEWS_PROMPT: &str = r#"Provide a brief summary of today's most important financial and market news.
Cover major stock market movements, key economic indicators, and significant corporate news.
Keep it concise and format the output as markdown with short headings and bullet points."#;

pub fn transactions_chat_instruction(records_json: &str) -> String {
    format!(
        r#"You are a friendly and knowledgeable financial assistant for an expense tracker app. Your goal is to help users understand their finances and make better decisions. You have access to their recent transactions.

Here are the user's transactions:
{}

Based on this data, answer user's questions. Be concise, helpful, and never give professional financial advice, but rather suggestions based on their provided data. Start the conversation by greeting the user and asking how you can help with their finances today."#,
        records_json
    )
}

pub fn news_chat_instruction(news_summary: &str) -> String {
    format!(
        r#"You are a friendly financial news assistant. The user has just read the following summary of today's financial news.

NEWS SUMMARY:
---
{}
---

Answer the user's follow-up questions about this news. Be concise, explain jargon in plain language, and never give professional financial advice. Start the conversation by greeting the user and inviting questions about the news."#,
        news_summary
    )
}
