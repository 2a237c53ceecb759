//! Line-oriented question loop.

use std::io::{BufRead, Write};

use tracing::error;

use syllabus_core::traits::{Generator, VectorIndex};

use crate::assistant::RagAssistant;

pub const INPUT_PROMPT: &str = "Enter a question or 'quit' to exit: ";
const RULE_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub answered: usize,
    pub failed: usize,
}

enum Input<'a> {
    Quit,
    Blank,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
        Input::Quit
    } else if trimmed.is_empty() {
        Input::Blank
    } else {
        Input::Question(trimmed)
    }
}

/// Answer questions read from `input` until `quit`, `exit` or end of input.
///
/// A failed answer is reported and the loop keeps going. Only I/O errors on
/// `input` or `out` end the session early.
pub fn serve<I, G, R, W>(assistant: &RagAssistant<I, G>, input: R, out: &mut W) -> std::io::Result<SessionStats>
where
    I: VectorIndex,
    G: Generator,
    R: BufRead,
    W: Write,
{
    let mut stats = SessionStats::default();
    let mut lines = input.lines();
    loop {
        writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
        write!(out, "{INPUT_PROMPT}")?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            writeln!(out)?;
            break;
        };
        match classify(&line) {
            Input::Quit => {
                writeln!(out, "Goodbye!")?;
                break;
            }
            Input::Blank => continue,
            Input::Question(question) => {
                writeln!(out, "Thinking...")?;
                match assistant.answer(question) {
                    Ok(answer) => {
                        stats.answered += 1;
                        writeln!(out, "\nAnswer:\n{answer}")?;
                    }
                    Err(e) => {
                        stats.failed += 1;
                        error!(error = %e, "failed to answer question");
                        writeln!(out, "Error: {e}")?;
                    }
                }
            }
        }
    }
    Ok(stats)
}
