use std::env;

use syllabus_rag::Pipeline;

fn usage() -> ! {
    eprintln!("Usage: syllabus-ask [-n TOP_N] \"<question>\"");
    std::process::exit(1)
}

fn main() -> anyhow::Result<()> {
    syllabus_cli::init_tracing();
    let (settings, base) = syllabus_cli::load_settings()?;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut top_n = settings.retrieval.top_n;
    let mut question = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--top-n" => {
                top_n = match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    Some(n) if n > 0 => n,
                    _ => {
                        eprintln!("Error: -n requires a positive number");
                        usage()
                    }
                };
                i += 1;
            }
            "-h" | "--help" => usage(),
            other => question.push(other.to_string()),
        }
        i += 1;
    }
    let question = question.join(" ");
    if question.trim().is_empty() {
        usage();
    }

    let pipeline = Pipeline::initialize(&settings, &base)?;
    let answer = pipeline.assistant().answer_with(question.trim(), top_n)?;
    println!("{answer}");
    Ok(())
}
