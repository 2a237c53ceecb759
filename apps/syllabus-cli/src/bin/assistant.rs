use std::io;

use syllabus_rag::session::serve;
use syllabus_rag::Pipeline;

fn main() -> anyhow::Result<()> {
    syllabus_cli::init_tracing();
    let (settings, base) = syllabus_cli::load_settings()?;

    println!("=== KIIT Syllabus RAG Assistant ===");
    println!("Initializing RAG Assistant...");
    let pipeline = Pipeline::initialize(&settings, &base).map_err(|e| {
        eprintln!("Error running RAG assistant: {e}");
        e
    })?;

    println!("\nLoading documents...");
    let report = pipeline.ingest()?;
    println!("{}", syllabus_cli::ingest_summary(&report));

    println!("\nReady! Ask questions about the syllabus.");
    let stdin = io::stdin();
    let stats = serve(pipeline.assistant(), stdin.lock(), &mut io::stdout())?;
    tracing::info!(answered = stats.answered, failed = stats.failed, "session finished");
    Ok(())
}
