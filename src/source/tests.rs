use std::io::Write;
use std::time::Duration;

use super::CandidateSource;
use super::error::SourceError;
use super::json::JsonFileSource;
use super::mock::MockSource;
use super::retry::RetryingSource;
use crate::document::Document;

fn docs(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| Document::new(format!("d{}", i), format!("Title {}", i), "Abstract"))
        .collect()
}

#[tokio::test]
async fn test_json_source_paginates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"[
            {{"id": "1", "title": "First", "abstract": "One", "year": 2021}},
            {{"id": "2", "title": "Second"}},
            {{"id": "3", "title": "Third", "abstract": "Three"}}
        ]"#
    )
    .expect("write");

    let source = JsonFileSource::open(file.path()).expect("valid file");
    assert_eq!(source.len(), 3);

    let first = source.fetch_page("q", 0, 2).await.expect("page");
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].abstract_text, "One");
    assert_eq!(first[0].year, Some(2021));
    assert_eq!(first[1].abstract_text, "");

    let second = source.fetch_page("q", 2, 2).await.expect("page");
    assert_eq!(second.len(), 1);
    assert!(source.fetch_page("q", 5, 2).await.expect("page").is_empty());
}

#[test]
fn test_json_source_errors() {
    assert!(matches!(
        JsonFileSource::open("/nonexistent/candidates.json"),
        Err(SourceError::Read { .. })
    ));

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{{\"not\": \"an array\"}}").expect("write");
    assert!(matches!(
        JsonFileSource::open(file.path()),
        Err(SourceError::Parse { .. })
    ));
}

#[tokio::test]
async fn test_retrying_source_recovers_from_transient_failures() {
    let source = RetryingSource::new(
        MockSource::new(docs(3)).failing_times(2),
        3,
        Duration::from_millis(1),
    );

    let page = source.fetch_page("q", 0, 10).await.expect("recovered");
    assert_eq!(page.len(), 3);
    assert_eq!(source.inner().fetch_count(), 3);
}

#[tokio::test]
async fn test_retrying_source_gives_up() {
    let source = RetryingSource::new(
        MockSource::new(docs(3)).failing_at(0),
        3,
        Duration::from_millis(1),
    );

    let result = source.fetch_page("q", 0, 10).await;
    assert!(matches!(result, Err(SourceError::Exhausted { attempts: 3, .. })));
    assert_eq!(source.inner().fetch_count(), 3);
}

#[tokio::test]
async fn test_mock_source_records_calls() {
    let source = MockSource::new(docs(5));
    let _ = source.fetch_page("graphene", 4, 2).await;

    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].query, "graphene");
    assert_eq!(calls[0].offset, 4);
}
