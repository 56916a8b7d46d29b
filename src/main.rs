//! Interactive REPL for the research assistant.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use paper_scout::{
    ArxivClient, Config, CrossEncoderClient, OpenAiCompatClient, ResearchAssistant, Session,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paper_scout=info")),
        )
        .init();

    let config = Config::from_env();
    let mut llm = OpenAiCompatClient::new(&config.llm_url, &config.llm_model);
    if let Some(api_key) = &config.llm_api_key {
        llm = llm.with_api_key(api_key);
    }

    let assistant = ResearchAssistant::new(
        Arc::new(llm),
        Arc::new(ArxivClient::with_base_url(&config.arxiv_url)),
        Arc::new(CrossEncoderClient::with_base_url(&config.rerank_url)),
    );
    let mut session = Session::new();

    println!("paper-scout: ask a research question, or 'exit' to quit.");
    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let user_text = line.trim();
        if user_text.is_empty() {
            continue;
        }
        if user_text == "exit" || user_text == "quit" {
            break;
        }

        match assistant.respond(&mut session, user_text).await {
            Ok(reply) if reply.is_empty() => println!("(no action)"),
            Ok(reply) => println!("{reply}"),
            Err(err) => eprintln!("turn failed: {err}"),
        }
    }

    Ok(())
}
