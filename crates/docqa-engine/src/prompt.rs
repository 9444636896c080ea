//! Generation prompt assembly. Pure string work: the instruction block
//! is picked by question type, retrieved chunks become the context
//! section, and the caller's question is injected verbatim.

use docqa_core::types::{QuestionType, ScoredChunk};

const FACTUAL_INSTRUCTION: &str = "\
Answer the question using only facts stated in the context. Quote names, \
dates, and numbers exactly as they appear. If the context does not contain \
the answer, say so plainly.";

const INTERPRETIVE_INSTRUCTION: &str = "\
Answer the question by analyzing and synthesizing the context. Draw \
connections across passages and explain your reasoning, but stay grounded \
in what the context supports.";

const BASE_TEMPLATE: &str = "\
You are an intelligent document assistant.

{instruction}

Context:
{context}

Question: {question}

Answer:";

fn instruction_for(qtype: QuestionType) -> &'static str {
    match qtype {
        QuestionType::Factual => FACTUAL_INSTRUCTION,
        QuestionType::Interpretive => INTERPRETIVE_INSTRUCTION,
    }
}

/// Join retrieved chunks into a context block, each passage tagged with
/// its source file, and fill the generation template.
pub fn assemble_prompt(chunks: &[ScoredChunk], question: &str, qtype: QuestionType) -> String {
    let context = chunks
        .iter()
        .map(|hit| format!("[source: {}]\n{}", hit.chunk.filename, hit.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    BASE_TEMPLATE
        .replace("{instruction}", instruction_for(qtype))
        .replace("{context}", &context)
        .replace("{question}", question)
}
