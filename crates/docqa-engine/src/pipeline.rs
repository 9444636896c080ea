//! End-to-end query pipeline: classify, retrieve, assemble, generate.
//! An empty retrieval is not a failure; it short-circuits to the
//! fallback answer without touching the language model.

use std::sync::Arc;

use tracing::{debug, info};

use docqa_core::error::{Error, Result};
use docqa_core::traits::LanguageModel;
use docqa_core::types::{Answer, Classification, QueryRequest};

use crate::classify::{QuestionTypeClassifier, TopicClassifier};
use crate::prompt::assemble_prompt;
use crate::retrieval::RetrievalEngine;

pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't find any documents related to \
your question. Please try asking something else or check the document collection to \
see which topics are likely covered.";

pub struct QaPipeline {
    question_classifier: QuestionTypeClassifier,
    topic_classifier: TopicClassifier,
    retrieval: RetrievalEngine,
    llm: Arc<dyn LanguageModel>,
}

impl QaPipeline {
    pub fn new(
        question_classifier: QuestionTypeClassifier,
        topic_classifier: TopicClassifier,
        retrieval: RetrievalEngine,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self { question_classifier, topic_classifier, retrieval, llm }
    }

    pub async fn answer_query(&self, request: &QueryRequest) -> Result<Answer> {
        let query = request.text.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query is empty".into()));
        }

        let (question_type, topic) = tokio::join!(
            self.question_classifier.classify(query, request.question_type),
            self.topic_classifier.classify(query, request.topic),
        );
        let classification = Classification { question_type: question_type?, topic: topic? };
        debug!(
            question_type = %classification.question_type,
            topic = %classification.topic,
            "query classified"
        );

        let hits = self
            .retrieval
            .retrieve(query, &classification, request.filename.as_deref())
            .await?;
        if hits.is_empty() {
            info!("no chunks passed the distance threshold, answering with fallback");
            return Ok(Answer::Fallback(FALLBACK_MESSAGE));
        }

        let prompt = assemble_prompt(&hits, query, classification.question_type);
        let response = self.llm.generate(&prompt).await?;
        Ok(Answer::Grounded(response))
    }
}
