use std::fs;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tempfile::TempDir;

use syllabus_core::chunker::RecursiveSplitter;
use syllabus_core::config::Settings;
use syllabus_core::traits::{Generator, VectorIndex};
use syllabus_core::types::{Document, DocumentChunk, QueryResult, UpsertOutcome};
use syllabus_core::{Error, Result};
use syllabus_embed::FakeEmbedder;
use syllabus_rag::session::serve;
use syllabus_rag::{ingest_corpus, Pipeline, RagAssistant, NO_CONTEXT_PLACEHOLDER};
use syllabus_vector::LanceVectorIndex;

/// Returns the prompt it was given.
struct EchoGenerator;

impl Generator for EchoGenerator {
    fn generate(&self, prompt: &str) -> Result<String> { Ok(prompt.to_string()) }
}

#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
}

impl Generator for RecordingGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("recorded".into())
    }
}

struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Generation("API error (503): service unavailable".into()))
    }
}

#[derive(Default)]
struct CountingIndex {
    queries: AtomicUsize,
}

impl VectorIndex for CountingIndex {
    fn upsert(&self, _chunks: &[DocumentChunk]) -> Result<UpsertOutcome> { Ok(UpsertOutcome::Empty) }
    fn query(&self, _text: &str, _top_n: usize) -> Result<QueryResult> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
    fn count(&self) -> Result<usize> { Ok(0) }
    fn reset(&self) -> Result<()> { Ok(()) }
}

fn splitter() -> RecursiveSplitter {
    RecursiveSplitter::new(1000, 200).unwrap()
}

fn lance_index(tmp: &TempDir) -> LanceVectorIndex<FakeEmbedder> {
    LanceVectorIndex::open(&tmp.path().join("vector_db"), "rag_documents", FakeEmbedder::default()).unwrap()
}

#[test]
fn ingested_course_code_reaches_the_prompt() {
    let tmp = TempDir::new().unwrap();
    let assistant = RagAssistant::new(lance_index(&tmp), EchoGenerator, splitter());
    let doc = Document::new("UNIT 1: Machine Learning. Course Code: CS301. Credits: 4.", "data/ml.pdf");

    assert_eq!(assistant.add_documents(&[doc]).unwrap(), UpsertOutcome::Indexed { chunks: 1 });
    let prompt = assistant.answer("What is the course code for Machine Learning?").unwrap();

    let context = prompt.split("CONTEXT:\n").nth(1).unwrap().split("\n\nQUESTION:").next().unwrap();
    assert!(context.contains("CS301"));
    assert!(prompt.contains("QUESTION:\nWhat is the course code for Machine Learning?\n"));
}

#[test]
fn empty_collection_answers_with_placeholder_context() {
    let tmp = TempDir::new().unwrap();
    let assistant = RagAssistant::new(lance_index(&tmp), EchoGenerator, splitter());

    let prompt = assistant.answer("Which electives are offered in Sem 6?").unwrap();

    assert!(prompt.contains(&format!("CONTEXT:\n{NO_CONTEXT_PLACEHOLDER}\n")));
}

#[test]
fn blank_lines_issue_no_retrieval_or_generation() {
    let assistant = RagAssistant::new(CountingIndex::default(), RecordingGenerator::default(), splitter());
    let mut out = Vec::new();

    let stats = serve(&assistant, Cursor::new("\n   \n\t\nQUIT\nnever asked\n"), &mut out).unwrap();

    assert_eq!(stats.answered, 0);
    assert_eq!(assistant.index().queries.load(Ordering::SeqCst), 0);
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Goodbye!"));
    assert!(!printed.contains("Thinking..."));
}

#[test]
fn questions_are_answered_until_exit() {
    let assistant = RagAssistant::new(CountingIndex::default(), RecordingGenerator::default(), splitter());
    let mut out = Vec::new();

    let stats = serve(&assistant, Cursor::new("What is CS301?\n\nexit\n"), &mut out).unwrap();

    assert_eq!(stats.answered, 1);
    assert_eq!(assistant.index().queries.load(Ordering::SeqCst), 1);
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Enter a question or 'quit' to exit: "));
    assert!(printed.contains("Thinking...\n\nAnswer:\nrecorded\n"));
}

#[test]
fn generation_failure_is_reported_and_loop_continues() {
    let assistant = RagAssistant::new(CountingIndex::default(), FailingGenerator, splitter());
    let mut out = Vec::new();

    let stats = serve(&assistant, Cursor::new("first?\nsecond?\n"), &mut out).unwrap();

    assert_eq!(stats.failed, 2);
    assert_eq!(assistant.index().queries.load(Ordering::SeqCst), 2);
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Error: Generation failed: API error (503)").count(), 2);
}

#[test]
fn initialization_without_credential_fails() {
    let tmp = TempDir::new().unwrap();
    let settings = Settings::default();

    match Pipeline::initialize(&settings, tmp.path()) {
        Err(Error::InvalidConfig(msg)) => assert!(msg.contains("GROQ_API_KEY")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("initialized without a credential"),
    }
    assert!(!tmp.path().join("vector_db").exists(), "nothing is opened before the credential check");
}

#[test]
fn ingest_is_gated_unless_forced() {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("sem5.txt"), "Course Title: Compilers\nCourse Code: CS3008\nCredits: 3").unwrap();
    let assistant = RagAssistant::new(lance_index(&tmp), RecordingGenerator::default(), splitter());
    let mut pipeline = Pipeline::from_parts(assistant, data_dir, false);

    let first = pipeline.ingest().unwrap();
    assert_eq!(first.documents, 1);
    assert_eq!(first.outcome, Some(UpsertOutcome::Indexed { chunks: 1 }));

    let second = pipeline.ingest().unwrap();
    assert_eq!(second.outcome, Some(UpsertOutcome::Skipped { existing: 1 }));

    pipeline.set_force_reindex(true);
    let forced = pipeline.ingest().unwrap();
    assert_eq!(forced.outcome, Some(UpsertOutcome::Indexed { chunks: 1 }));
    assert_eq!(pipeline.assistant().index().count().unwrap(), 1);
}

#[test]
fn missing_corpus_is_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().join("data");
    let assistant = RagAssistant::new(lance_index(&tmp), RecordingGenerator::default(), splitter());
    let pipeline = Pipeline::from_parts(assistant, data_dir.clone(), false);

    let report = pipeline.ingest().unwrap();

    assert_eq!(report.documents, 0);
    assert_eq!(report.outcome, None);
    assert!(data_dir.is_dir());
}

#[test]
fn ingest_only_runs_without_credential() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("data")).unwrap();
    fs::write(tmp.path().join("data/ml.txt"), "UNIT 1: Machine Learning. Course Code: CS301. Credits: 4.").unwrap();
    let mut settings = Settings::default();
    settings.embedding.use_fake = true;

    let report = ingest_corpus(&settings, tmp.path()).unwrap();

    assert_eq!(report.outcome, Some(UpsertOutcome::Indexed { chunks: 1 }));
    assert!(tmp.path().join("vector_db").is_dir());
}
