//! `parley chat`: interactive or single-message chat mode.

use std::io::Write;

use parley_agent::{ChatEngine, build_engine};
use parley_config::AppConfig;
use parley_core::message::Turn;
use parley_gateway::MAX_TURNS;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    config: AppConfig,
    message: Option<String>,
    session: String,
) -> Result<(), Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PARLEY_API_KEY, OPENROUTER_API_KEY or OPENAI_API_KEY");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let engine = build_engine(&config).await?;

    if let Some(msg) = message {
        let reply = engine.chat_reply(&msg, &[], &session).await?;
        println!("{}", reply.response);
        if let Some(options) = reply.quick_replies {
            println!("  [{}]", options.join(" | "));
        }
        return Ok(());
    }

    println!();
    println!("  Parley interactive chat");
    println!();
    println!("  Model:     {} / {}", config.models.fast, config.models.pro);
    println!("  Language:  {}", config.language);
    println!("  Tools:     {}", engine.tool_names().join(", "));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/clear' to forget the conversation, 'exit' or Ctrl+D to quit.");
    println!();

    let mut history: Vec<Turn> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/clear" => {
                history.clear();
                println!("  (history cleared)");
            }
            _ => respond(&engine, input, &mut history, &session).await,
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

async fn respond(engine: &ChatEngine, input: &str, history: &mut Vec<Turn>, session: &str) {
    match engine.chat_reply(input, history, session).await {
        Ok(reply) => {
            println!();
            for line in reply.response.lines() {
                println!("  Parley > {line}");
            }
            if let Some(options) = &reply.quick_replies {
                println!("  [{}]", options.join(" | "));
            }
            println!();
            remember(history, input, &reply.response);
        }
        Err(e) => {
            eprintln!("  [Error] {e}");
            println!();
        }
    }
}

/// Append one exchange, keeping at most [`MAX_TURNS`] turns.
fn remember(history: &mut Vec<Turn>, user: &str, assistant: &str) {
    history.push(Turn::user(user));
    history.push(Turn::assistant(assistant));
    let excess = history.len().saturating_sub(MAX_TURNS);
    history.drain(..excess);
}
