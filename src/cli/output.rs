//! CLI output formatting utilities.

use crate::question::Question;
use crate::store::ChunkCount;
use console::{style, Style};
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a one-line video summary.
    pub fn video_info(title: &str, id: &str, language: &str, questions: u32) {
        println!(
            "  {} {} ({}, {}, {} questions)",
            style("*").cyan(),
            style(title).bold(),
            style(id).dim(),
            language,
            questions
        );
    }

    /// Print a full question with options, answer and provenance.
    pub fn question_block(question: &Question) {
        println!(
            "\n{} {}",
            style(format!("{}.", question.ordinal_index + 1)).bold(),
            style(&question.question).bold()
        );
        for option in &question.options {
            let marker = if option.label == question.correct_answer {
                style(format!("[{}]", option.label)).green().bold()
            } else {
                style(format!(" {} ", option.label)).dim()
            };
            println!("   {} {}", marker, option.text);
        }
        println!(
            "   {} {} | {} | chunk {} of {}",
            style("·").dim(),
            question.question_type.as_str(),
            question.difficulty.as_str(),
            question.chunk.chunk_index + 1,
            question.chunk.chunk_total
        );
        if !question.explanation.is_empty() {
            println!("   {} {}", style("·").dim(), style(&question.explanation).dim());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Style for titles.
    pub fn title_style() -> Style {
        Style::new().bold()
    }

    /// Style for dim text.
    pub fn dim_style() -> Style {
        Style::new().dim()
    }
}

/// Render chunk coverage as a compact bar like `[3|2|0|1]`.
pub fn coverage_bar(counts: &[ChunkCount], total_chunks: usize) -> String {
    let mut per_chunk = vec![0u32; total_chunks];
    for entry in counts {
        if (entry.chunk_index as usize) < per_chunk.len() {
            per_chunk[entry.chunk_index as usize] = entry.question_count;
        }
    }
    let cells: Vec<String> = per_chunk.iter().map(|c| c.to_string()).collect();
    format!("[{}]", cells.join("|"))
}
