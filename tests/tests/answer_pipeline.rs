use application::rag_service::{RagService, ANSWER_TEMPERATURE, FALLBACK_ANSWER};
use application::retriever::{IndexRetriever, RETRIEVAL_K};
use domain::ports::Retriever;
use domain::prompt::{DOCUMENT_HEADER, LEGAL_CONTEXT_HEADER, QUESTION_HEADER};
use std::sync::Arc;
use tests::{
    ConstantEmbedder, EchoModel, FailingModel, FailingRetriever, RankedIndex, StubRetriever,
};

const AGREEMENT: &str = "Clause 12: The Promoter may delay handing over possession by up to \
60 months without any liability to pay interest or compensation to the Allottee.";
const QUESTION: &str = "Can the builder delay possession without paying me anything?";

#[tokio::test]
async fn contradicting_document_returns_model_output_unchanged() {
    let retriever = Arc::new(StubRetriever::new(&["RERA Section 5 requires X"]));
    let model = Arc::new(EchoModel::new(
        "Your document states X, which is unusual as the standard legal position is Y.",
    ));
    let service = RagService::new(retriever.clone(), model.clone());

    let answer = service.answer(AGREEMENT, QUESTION).await;

    assert_eq!(
        answer,
        "Your document states X, which is unusual as the standard legal position is Y."
    );
    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("RERA Section 5 requires X"));
    assert!(calls[0].prompt.contains(AGREEMENT));
}

#[tokio::test]
async fn model_failure_yields_fallback() {
    let model = Arc::new(FailingModel::default());
    let service = RagService::new(StubRetriever::new(&["Section 18"]), model.clone());

    let answer = service.answer(AGREEMENT, QUESTION).await;

    assert_eq!(answer, FALLBACK_ANSWER);
    assert_eq!(
        answer,
        "I encountered an error trying to find the answer. Please try rephrasing your question."
    );
    assert_eq!(model.attempts(), 1, "failures are not retried");
}

#[tokio::test]
async fn retrieval_failure_yields_fallback_without_calling_model() {
    let model = Arc::new(EchoModel::new("unused"));
    let service = RagService::new(FailingRetriever, model.clone());

    assert_eq!(service.answer(AGREEMENT, QUESTION).await, FALLBACK_ANSWER);
    assert!(model.calls().is_empty());
}

#[tokio::test]
async fn retrieval_is_driven_by_question_only() {
    let retriever = Arc::new(StubRetriever::new(&[]));
    let service = RagService::new(retriever.clone(), EchoModel::new("ok"));

    service.answer(AGREEMENT, QUESTION).await;

    assert_eq!(retriever.queries(), vec![QUESTION.to_string()]);
}

#[tokio::test]
async fn model_receives_temperature_and_retriever_uses_k_three() {
    let index = Arc::new(RankedIndex::new(&["s18", "s19", "s11", "s12", "s13"]));
    let model = Arc::new(EchoModel::new("ok"));
    let retriever = IndexRetriever::new(ConstantEmbedder, index.clone());
    let service = RagService::new(retriever, model.clone());

    service.answer(AGREEMENT, QUESTION).await;

    assert_eq!(index.requested_k(), vec![3]);
    assert_eq!(RETRIEVAL_K, 3);
    let calls = model.calls();
    assert_eq!(calls[0].temperature, 0.3);
    assert_eq!(calls[0].temperature, ANSWER_TEMPERATURE);
    assert!(calls[0].prompt.contains("s18\n\n---\n\ns19\n\n---\n\ns11"));
    assert!(!calls[0].prompt.contains("s12"));
}

#[tokio::test]
async fn retriever_preserves_index_ranking() {
    let retriever = IndexRetriever::new(
        ConstantEmbedder,
        RankedIndex::new(&["most similar", "second", "third", "fourth"]),
    );

    let chunks = retriever.retrieve(QUESTION).await.unwrap();

    assert_eq!(chunks, vec!["most similar", "second", "third"]);
}

#[tokio::test]
async fn prompt_sections_hold_each_field() {
    let model = Arc::new(EchoModel::new("ok"));
    let service = RagService::new(
        StubRetriever::new(&["Section 18: refund with interest"]),
        model.clone(),
    );

    service.answer(AGREEMENT, QUESTION).await;

    let prompt = &model.calls()[0].prompt;
    let section = |header: &str| {
        let start = prompt.find(header).unwrap() + header.len();
        let end = start + prompt[start..].find("\n---").unwrap();
        prompt[start..end].trim().to_string()
    };
    assert_eq!(section(DOCUMENT_HEADER), AGREEMENT);
    assert_eq!(section(LEGAL_CONTEXT_HEADER), "Section 18: refund with interest");
    assert_eq!(section(QUESTION_HEADER), QUESTION);
}

#[tokio::test]
async fn service_is_shareable_across_tasks() {
    let service = Arc::new(RagService::new(
        StubRetriever::new(&["Section 18"]),
        EchoModel::new("shared answer"),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.answer("doc", &format!("question {i}")).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), "shared answer");
    }
}
