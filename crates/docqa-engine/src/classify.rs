//! Query classification. Two independent classifiers run per query:
//! one labels the question style (Factual vs Interpretive), the other
//! assigns a topic used to pick the collection to search. Explicit
//! labels on the request bypass the language model entirely.

use std::sync::Arc;

use tracing::warn;

use docqa_core::error::{Error, Result};
use docqa_core::traits::LanguageModel;
use docqa_core::types::{QuestionType, Topic};

const QUESTION_TYPE_PROMPT: &str = "\
Classify the question below as either Factual or Interpretive.

A Factual question asks for specific information that is stated directly in a document, \
such as names, dates, numbers, or definitions.
An Interpretive question asks for analysis, comparison, opinion, or synthesis that goes \
beyond restating document content.

Examples:
Question: What year was the novel published?
Answer: Factual
Question: What themes does the novel explore?
Answer: Interpretive
Question: Who is the author of the paper?
Answer: Factual
Question: How do the two approaches compare?
Answer: Interpretive

Respond with only the single word: Factual or Interpretive.

Question: {question}
Answer:";

const TOPIC_PROMPT: &str = "\
Classify the question below into exactly one of these topics: \
Technology, Science, People, Literature.

Technology covers software, hardware, engineering, and technical reports.
Science covers research, experiments, and scientific findings.
People covers biographies, careers, and notable figures.
Literature covers books, novels, authors, and literary analysis.

Respond with only the single topic name.

Question: {question}
Answer:";

fn ensure_nonempty(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("query is empty".into()));
    }
    Ok(trimmed)
}

/// Pick the label whose name appears earliest in the reply, ignoring
/// case. Models often pad the answer with prose; position beats
/// equality here.
fn earliest_label<T: Copy>(reply: &str, labels: &[(T, &str)]) -> Option<T> {
    let lowered = reply.to_lowercase();
    labels
        .iter()
        .filter_map(|(value, name)| lowered.find(&name.to_lowercase()).map(|pos| (pos, *value)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, value)| value)
}

pub struct QuestionTypeClassifier {
    llm: Arc<dyn LanguageModel>,
}

impl QuestionTypeClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn classify(
        &self,
        query: &str,
        explicit: Option<QuestionType>,
    ) -> Result<QuestionType> {
        let query = ensure_nonempty(query)?;
        if let Some(qtype) = explicit {
            return Ok(qtype);
        }
        let prompt = QUESTION_TYPE_PROMPT.replace("{question}", query);
        let reply = match self.llm.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "question type classification failed, defaulting to Factual");
                return Ok(QuestionType::Factual);
            }
        };
        let labels = [
            (QuestionType::Factual, QuestionType::Factual.as_str()),
            (QuestionType::Interpretive, QuestionType::Interpretive.as_str()),
        ];
        Ok(earliest_label(&reply, &labels).unwrap_or_else(|| {
            warn!(reply = %reply, "unparseable question type reply, defaulting to Factual");
            QuestionType::Factual
        }))
    }
}

pub struct TopicClassifier {
    llm: Arc<dyn LanguageModel>,
    default_topic: Topic,
}

impl TopicClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>, default_topic: Topic) -> Self {
        Self { llm, default_topic }
    }

    pub async fn classify(&self, query: &str, explicit: Option<Topic>) -> Result<Topic> {
        let query = ensure_nonempty(query)?;
        if let Some(topic) = explicit {
            return Ok(topic);
        }
        let prompt = TOPIC_PROMPT.replace("{question}", query);
        let reply = match self.llm.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, default = %self.default_topic, "topic classification failed");
                return Ok(self.default_topic);
            }
        };
        let labels: Vec<(Topic, &str)> =
            Topic::ALL.iter().map(|t| (*t, t.as_str())).collect();
        Ok(earliest_label(&reply, &labels).unwrap_or_else(|| {
            warn!(reply = %reply, default = %self.default_topic, "unparseable topic reply");
            self.default_topic
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_label_prefers_first_occurrence() {
        let labels = [
            (QuestionType::Factual, "Factual"),
            (QuestionType::Interpretive, "Interpretive"),
        ];
        assert_eq!(
            earliest_label("I'd say interpretive, not factual.", &labels),
            Some(QuestionType::Interpretive)
        );
        assert_eq!(earliest_label("FACTUAL", &labels), Some(QuestionType::Factual));
        assert_eq!(earliest_label("no idea", &labels), None);
    }
}
