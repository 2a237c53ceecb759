use std::env;

use syllabus_core::types::UpsertOutcome;
use syllabus_rag::ingest_corpus;

fn main() -> anyhow::Result<()> {
    syllabus_cli::init_tracing();
    let (mut settings, base) = syllabus_cli::load_settings()?;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--force" | "-f" => settings.index.force_reindex = true,
            "--help" | "-h" => {
                println!("Usage: syllabus-ingest [--force] [DATA_DIR]");
                return Ok(());
            }
            _ if !arg.starts_with('-') => settings.data.data_dir = arg,
            other => {
                eprintln!("Error: unknown option {other}");
                std::process::exit(2);
            }
        }
    }

    println!("Syllabus Indexer\n================");
    println!("Data directory: {}", settings.data_dir(&base).display());
    println!("Collection: {} ({})", settings.index.collection, settings.db_dir(&base).display());
    let report = ingest_corpus(&settings, &base)?;

    match report.outcome {
        None => println!("No documents found to process."),
        Some(UpsertOutcome::Skipped { existing }) => {
            println!("Collection already holds {existing} chunks; nothing re-embedded (use --force to rebuild).")
        }
        Some(UpsertOutcome::Indexed { chunks }) => {
            println!("\nIndexed {chunks} chunks from {} documents", report.documents)
        }
        Some(UpsertOutcome::Empty) => println!("Documents produced no chunks."),
    }
    if report.skipped_files > 0 {
        println!("Skipped {} unreadable files", report.skipped_files);
    }
    Ok(())
}
