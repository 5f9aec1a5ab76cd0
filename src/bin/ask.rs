//! One-shot command-line prompt answering.
//!
//! Reads the prompt from the first argument (or one line of stdin), sends it
//! to Gemini with a formatting system instruction, prints the answer.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Parser;
use study_buddy::config::AppConfig;
use study_buddy::gemini::{GeminiClient, GenerationOptions};
use study_buddy::logger;

const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are a friendly assistant. Answer clearly and politely.
Write plain text only: no asterisks, dashes or other markup characters.
Put each heading on its own line, followed by a line break and then the explanation.
Use numbers when listing points or examples.
If the question has several parts, answer each part separately.
If the message is feedback or a complaint, acknowledge it politely.
Do not describe yourself or your process; just answer the message.";

#[derive(Parser, Debug)]
#[command(name = "ask", about = "Answer one prompt with Gemini and print the result")]
struct AskCli {
    /// Prompt text; read from stdin when omitted
    prompt: Option<String>,

    /// Gemini model id; falls back to the configured default when unset
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Replace the built-in system instruction
    #[arg(long, conflicts_with = "no_system")]
    system: Option<String>,

    /// Send the prompt without any system instruction
    #[arg(long)]
    no_system: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = AskCli::parse();

    let mut config = AppConfig::from_env();
    // Quiet by default so stdout carries only the answer.
    logger::init("warn")?;

    if let Some(model) = cli.model.clone() {
        config.gemini.model = model;
    }

    let prompt = match cli.prompt.clone() {
        Some(prompt) => prompt,
        None => read_prompt()?,
    };
    let prompt = prompt.trim();
    if prompt.is_empty() {
        bail!("no prompt provided");
    }

    let client = GeminiClient::new(config.gemini);
    if !client.is_configured() {
        bail!("GEMINI_API_KEY is not set");
    }

    let options = GenerationOptions {
        system_instruction: system_instruction(&cli),
        temperature: Some(cli.temperature),
    };

    let answer = client
        .generate_with(prompt, &options)
        .await
        .context("Gemini request failed")?;

    println!("{answer}");
    Ok(())
}

fn system_instruction(cli: &AskCli) -> Option<String> {
    if cli.no_system {
        None
    } else {
        Some(
            cli.system
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
        )
    }
}

fn read_prompt() -> Result<String> {
    eprint!("enter your query: ");
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read prompt from stdin")?;
    Ok(line)
}
