//! The end-to-end request pipeline

use std::sync::Arc;
use std::time::Duration;

use arag_core::{
    AgentResponse, ChatModel, ChatTurn, Document, Embedder, Outcome, Result, RetrievalSettings,
    SearchConfig, Settings, VectorIndex, with_timeout,
};
use arag_rag::DocumentStore;

use crate::{AnswerGenerator, HistoryRephraser, RelevanceGuard, TopicGuard};

/// Topic check, rephrasing, retrieval, relevance check, generation
///
/// Each stage is one awaited call under the request timeout. A guard
/// rejection ends the run with the guard's message and no sources; any
/// service error aborts it.
pub struct RagPipeline<M: ChatModel, E: Embedder, I: VectorIndex> {
    topic_guard: TopicGuard<M>,
    rephraser: HistoryRephraser<M>,
    relevance_guard: RelevanceGuard<E, I>,
    generator: AnswerGenerator<M>,
    store: Arc<DocumentStore<E, I>>,
    retrieval: RetrievalSettings,
    timeout: Duration,
}

impl<M: ChatModel, E: Embedder, I: VectorIndex> RagPipeline<M, E, I> {
    /// One model serves every LLM stage
    pub fn new(model: Arc<M>, store: Arc<DocumentStore<E, I>>, settings: &Settings) -> Self {
        Self {
            topic_guard: TopicGuard::new(model.clone()).with_timeout(settings.request_timeout),
            rephraser: HistoryRephraser::new(model.clone()).with_timeout(settings.request_timeout),
            relevance_guard: RelevanceGuard::new(store.clone(), settings.retrieval.clone()),
            generator: AnswerGenerator::new(model).with_timeout(settings.request_timeout),
            store,
            retrieval: settings.retrieval.clone(),
            timeout: settings.request_timeout,
        }
    }

    /// Answer `query` given the prior turns of the conversation
    pub async fn run(&self, query: &str, history: &[ChatTurn]) -> Result<AgentResponse> {
        tracing::info!(history = history.len(), "Topic check");
        let verdict = with_timeout(
            self.timeout,
            "topic classification",
            self.topic_guard.classify(query),
        )
        .await?;
        if !verdict.is_on_topic() {
            tracing::info!("Rejected: off topic");
            return Ok(AgentResponse::rejected(
                query,
                self.topic_guard.message(),
                Outcome::OffTopic,
            ));
        }

        tracing::info!("Rephrase");
        let rephrased = with_timeout(
            self.timeout,
            "query rephrasing",
            self.rephraser.rephrase(query, history),
        )
        .await?;

        tracing::info!("Retrieve");
        let context = with_timeout(self.timeout, "retrieval", self.retrieve(&rephrased)).await?;

        tracing::info!(retrieved = context.len(), "Relevance check");
        let decision = with_timeout(
            self.timeout,
            "relevance check",
            self.relevance_guard.check_relevance(query, history),
        )
        .await?;
        if !decision.relevant {
            tracing::info!("Rejected: no relevant documents");
            let message = decision
                .message
                .unwrap_or_else(|| self.retrieval.no_docs_message.clone());
            return Ok(AgentResponse::rejected(query, message, Outcome::NoRelevantDocuments));
        }

        tracing::info!(context = context.len(), "Generate");
        let answer = with_timeout(
            self.timeout,
            "answer generation",
            self.generator.generate(&rephrased, &context),
        )
        .await?;

        Ok(AgentResponse::answered(query, answer, context))
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        let mut config = SearchConfig::top_k(self.retrieval.retrieval_k);
        if let Some(threshold) = self.retrieval.similarity_threshold {
            config = config.with_threshold(threshold);
        }
        let results = self.store.search(query, &config).await?;
        Ok(results.into_iter().map(|scored| scored.document).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ScriptedModel, StaticIndex, UnreachableIndex, scored};
    use crate::prompts::OFF_TOPIC_MESSAGE;
    use arag_core::Error;
    use arag_rag::HashEmbedder;

    fn settings(threshold: Option<f32>) -> Settings {
        let mut settings = Settings::local("marketing");
        settings.retrieval.similarity_threshold = threshold;
        settings.retrieval.min_relevant_docs = 1;
        settings
    }

    fn pipeline<I: VectorIndex>(
        model: Arc<ScriptedModel>,
        index: I,
        settings: &Settings,
    ) -> RagPipeline<ScriptedModel, HashEmbedder, I> {
        let store = DocumentStore::new(Arc::new(HashEmbedder::default()), Arc::new(index));
        RagPipeline::new(model, Arc::new(store), settings)
    }

    fn campaign_index() -> StaticIndex {
        StaticIndex::new(vec![
            scored("Countdown D-3: faltam três dias para a live de Python", 0.92),
            scored("Countdown D-1: amanhã tem live, ative o lembrete", 0.88),
            scored("Countdown D-0: é hoje, 20h no YouTube", 0.81),
            scored("Receita de bolo de cenoura", 0.12),
        ])
    }

    #[tokio::test]
    async fn test_off_topic_query_is_rejected() {
        let model = Arc::new(ScriptedModel::new(["false"]));
        let pipeline = pipeline(model.clone(), campaign_index(), &settings(Some(0.5)));

        let response = pipeline.run("Qual o clima hoje?", &[]).await.unwrap();

        assert_eq!(response.outcome, Outcome::OffTopic);
        assert_eq!(response.result, OFF_TOPIC_MESSAGE);
        assert_eq!(response.query, "Qual o clima hoje?");
        assert!(response.source_documents.is_empty());
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_matching_documents_reach_generation() {
        let model = Arc::new(ScriptedModel::new([
            "true",
            "Crie a sequência de countdown da live de Python",
            "D-3: Faltam três dias!",
        ]));
        let pipeline = pipeline(model.clone(), campaign_index(), &settings(Some(0.5)));

        let response = pipeline
            .run("Crie o countdown da live de Python", &[])
            .await
            .unwrap();

        assert_eq!(response.outcome, Outcome::Answered);
        assert_eq!(response.result, "D-3: Faltam três dias!");
        assert_eq!(response.source_documents.len(), 3);

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 3);
        for doc in &response.source_documents {
            assert!(prompts[2].contains(&doc.page_content));
        }
        assert!(!prompts[2].contains("Receita de bolo"));
        assert!(prompts[2].contains("Crie a sequência de countdown da live de Python"));
    }

    #[tokio::test]
    async fn test_follow_up_without_documents_still_generates() {
        let model = Arc::new(ScriptedModel::new([
            "true",
            "Versão curta do countdown da live",
            "Faltam 3 dias!",
        ]));
        let pipeline = pipeline(model.clone(), StaticIndex::new(vec![]), &settings(Some(0.5)));
        let history = vec![
            ChatTurn::human("Crie o countdown da live de Python"),
            ChatTurn::ai("D-3: Faltam três dias para a live..."),
        ];

        let response = pipeline.run("Agora mais curto", &history).await.unwrap();

        assert_eq!(response.outcome, Outcome::Answered);
        assert_eq!(response.result, "Faltam 3 dias!");
        assert!(response.source_documents.is_empty());
        assert_eq!(model.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_no_documents_skips_generation() {
        let model = Arc::new(ScriptedModel::new(["true", "Roteiro de podcast", "nunca usado"]));
        let settings = settings(Some(0.5));
        let index = StaticIndex::new(vec![scored("Receita de bolo de cenoura", 0.12)]);
        let pipeline = pipeline(model.clone(), index, &settings);

        let response = pipeline.run("Roteiro de podcast sobre jardinagem", &[]).await.unwrap();

        assert_eq!(response.outcome, Outcome::NoRelevantDocuments);
        assert_eq!(response.result, settings.retrieval.no_docs_message);
        assert!(response.source_documents.is_empty());
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_classifier_error_aborts_run() {
        let model = Arc::new(ScriptedModel::new(Vec::<&str>::new()));
        let pipeline = pipeline(model.clone(), campaign_index(), &settings(None));

        let err = pipeline.run("Crie um post", &[]).await.unwrap_err();

        assert!(matches!(err, Error::LLMProvider(_)));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_classification_is_off_topic() {
        let model = Arc::new(ScriptedModel::new(["true, é sobre marketing"]));
        let pipeline = pipeline(model.clone(), campaign_index(), &settings(None));

        let response = pipeline.run("Crie um post", &[]).await.unwrap();

        assert_eq!(response.outcome, Outcome::OffTopic);
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_model_calls_carry_request_timeout() {
        let model = Arc::new(ScriptedModel::new(["true", "Countdown da live", "D-3!"]));
        let mut settings = settings(Some(0.5));
        settings.request_timeout = Duration::from_secs(180);
        let pipeline = pipeline(model.clone(), campaign_index(), &settings);

        pipeline.run("Crie um post", &[]).await.unwrap();

        assert_eq!(model.timeouts(), vec![Duration::from_secs(180); 3]);
    }

    #[tokio::test]
    async fn test_rephraser_error_aborts_run() {
        let model = Arc::new(ScriptedModel::new(["true"]));
        let pipeline = pipeline(model.clone(), campaign_index(), &settings(Some(0.5)));

        let err = pipeline.run("Crie um post", &[]).await.unwrap_err();

        assert!(matches!(err, Error::LLMProvider(_)));
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_generator_error_aborts_run() {
        let model = Arc::new(ScriptedModel::new(["true", "Countdown da live de Python"]));
        let pipeline = pipeline(model.clone(), campaign_index(), &settings(Some(0.5)));

        let err = pipeline.run("Crie o countdown da live", &[]).await.unwrap_err();

        assert!(matches!(err, Error::LLMProvider(_)));
        assert_eq!(model.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_index_failure_aborts_before_generation() {
        let model = Arc::new(ScriptedModel::new(["true", "Countdown da live", "nunca usado"]));
        let pipeline = pipeline(model.clone(), UnreachableIndex, &settings(Some(0.5)));
        let history = vec![ChatTurn::human("Crie um post"), ChatTurn::ai("Post pronto")];

        let err = pipeline.run("Agora mais curto", &history).await.unwrap_err();

        assert!(matches!(err, Error::IndexUnavailable(_)));
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let model = Arc::new(ScriptedModel::new(["true"]).with_delay(Duration::from_secs(5)));
        let mut settings = settings(Some(0.5));
        settings.request_timeout = Duration::from_millis(20);
        let pipeline = pipeline(model.clone(), campaign_index(), &settings);

        let err = pipeline.run("Crie um post", &[]).await.unwrap_err();

        match err {
            Error::Timeout(message) => assert!(message.contains("topic classification")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
