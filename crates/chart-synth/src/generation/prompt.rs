//! Prompt templates for chart generation

use crate::retrieval::memory::Turn;
use crate::retrieval::SearchResult;
use crate::schema::ChartSchema;

/// Prompt builder for chart requests
///
/// Holds the format instructions rendered once from the schema; every prompt,
/// with or without a document, embeds the same instructions.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    format_instructions: String,
}

impl PromptBuilder {
    /// Create a prompt builder for a schema
    pub fn new(schema: &ChartSchema) -> Self {
        Self {
            format_instructions: Self::build_format_instructions(schema),
        }
    }

    /// Build the prompt for a question with no document
    pub fn compose(&self, question: &str) -> String {
        format!(
            "Answer the user's question as best as possible.\n{}\n{}",
            self.format_instructions,
            question.trim()
        )
    }

    /// Build context from retrieved document rows
    pub fn build_context(results: &[SearchResult]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            let location = match result.chunk.line {
                Some(line) => format!("row {}, line {}", result.chunk.id + 1, line),
                None => format!("row {}", result.chunk.id + 1),
            };

            context.push_str(&format!(
                "[{}] {}\n{}\n\n",
                i + 1,
                location,
                result.chunk.content.trim_end()
            ));
        }

        context
    }

    /// Build the document-grounded prompt
    pub fn build_retrieval_prompt(&self, question: &str, context: &str, history: &[Turn]) -> String {
        let history = if history.is_empty() {
            String::new()
        } else {
            let turns: Vec<String> = history
                .iter()
                .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
                .collect();
            format!("CHAT HISTORY:\n{}\n\n", turns.join("\n"))
        };

        format!(
            r#"Use the following rows from the uploaded document to answer the question at the end.
Take every value you chart from these rows. If the rows do not contain what the question asks for, chart only what they do contain and do not invent values.

{history}DOCUMENT ROWS:
{context}
QUESTION: {question}

Helpful Answer:"#,
            history = history,
            context = context,
            question = self.compose(question)
        )
    }

    fn build_format_instructions(schema: &ChartSchema) -> String {
        let json_schema = serde_json::to_string_pretty(&schema.to_json_schema())
            .unwrap_or_else(|_| "{}".to_string());

        let rules = schema
            .constraint_notes()
            .into_iter()
            .map(|note| format!("- {}\n", note))
            .collect::<String>();

        format!(
            r#"Your answer must be a single JSON object that conforms to the JSON Schema below.
Each field carries a "description" and, where one exists, a "default". Fields listed under "required" must always be present: when the question does not say otherwise, use the documented default. Use only the values listed under "enum", write every colour as a hex code such as #36A2EB, and do not add fields the schema does not define.

Additional rules:
{rules}
Your output will be parsed and type-checked against this schema, so return the JSON inside a markdown code block tagged json, with no comments and no trailing commas:
```json
{json_schema}
```
"#,
            rules = rules,
            json_schema = json_schema
        )
    }
}
