//! The Fabula terminal front end.
//!
//! A thin rustyline REPL over the session state machine: it renders the
//! current [`Session`], forwards the player's commands, and holds no story
//! state of its own. Illustrations arrive as data URIs and are written to
//! the cache directory so any image viewer can open them.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use fabula_core::error::FabulaError;
use fabula_core::fetch::{IllustrationFetcher, SceneFetcher};
use fabula_core::prompts::PromptTemplates;
use fabula_core::session::{Game, Phase, Session};
use fabula_interaction::{GeminiConfig, GeminiTextClient, ImagenClient};

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// One parsed line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quit,
    Restart,
    Begin,
    Choice(usize),
    Invalid,
}

fn parse_command(input: &str, choice_count: usize) -> Command {
    match input.trim() {
        "quit" | "exit" => Command::Quit,
        "restart" => Command::Restart,
        "" => Command::Begin,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 && n <= choice_count => Command::Choice(n - 1),
            _ => Command::Invalid,
        },
    }
}

/// Builds the game from credentials and explicitly constructed clients.
///
/// Fails before any fetch is attempted when no key is configured or the
/// HTTP client cannot be built.
fn build_game() -> std::result::Result<Game, FabulaError> {
    let config = GeminiConfig::load()?;

    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| FabulaError::ClientInit(e.to_string()))?;

    let mut text = GeminiTextClient::new(http.clone(), &config.api_key);
    if let Some(model) = &config.model_name {
        text = text.with_model(model);
    }
    let mut images = ImagenClient::new(http, &config.api_key);
    if let Some(model) = &config.image_model_name {
        images = images.with_model(model);
    }

    Ok(Game::new(
        SceneFetcher::new(Arc::new(text), PromptTemplates::default()),
        IllustrationFetcher::new(Arc::new(images)),
    ))
}

/// Decodes a JPEG data URI into `~/.cache/fabula/scene-N.jpg`.
fn save_illustration(data_uri: &str, scene_number: usize) -> Result<PathBuf> {
    let encoded = data_uri.strip_prefix(DATA_URI_PREFIX).unwrap_or(data_uri);
    let bytes = BASE64_STANDARD
        .decode(encoded)
        .context("illustration payload is not valid base64")?;

    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("fabula");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("scene-{scene_number}.jpg"));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Renders the current session. Pure output: reads the session, prints it.
fn render(session: &Session, scene_number: &mut usize) {
    println!();
    for line in session.story.lines() {
        println!("{}", line.bright_blue());
    }

    if let Some(image) = &session.image {
        *scene_number += 1;
        match save_illustration(image, *scene_number) {
            Ok(path) => println!(
                "{}",
                format!("illustration saved to {}", path.display()).bright_black()
            ),
            Err(err) => tracing::warn!(error = %err, "failed to save illustration"),
        }
    }

    if let Some(error) = &session.error {
        println!("{}", error.red());
    }

    if session.choices.is_empty() {
        println!();
        println!("{}", "The story has reached its end.".bright_magenta());
        println!(
            "{}",
            "Type 'restart' to begin anew, or 'quit' to leave.".bright_black()
        );
    } else {
        println!();
        for (index, choice) in session.choices.iter().enumerate() {
            println!("{}", format!("  {}. {}", index + 1, choice).yellow());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("{}", "=== Fabula ===".bright_magenta().bold());

    let mut game = match build_game() {
        Ok(game) => game,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            eprintln!("{}", err.user_summary().red());
            std::process::exit(1);
        }
    };

    let mut rl = DefaultEditor::new()?;
    let mut scene_number = 0usize;

    println!(
        "{}",
        "Press Enter to begin. During play, pick a choice by number; 'restart' and 'quit' always work."
            .bright_black()
    );

    loop {
        let prompt = match game.session().phase {
            Phase::Initial => "press Enter to begin > ",
            Phase::Error => "'restart' or 'quit' > ",
            _ => ">> ",
        };

        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Input error: {err:?}").red());
                break;
            }
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(&line);
        }

        match parse_command(&line, game.session().choices.len()) {
            Command::Quit => break,
            Command::Restart => {
                game.restart();
                println!("{}", "The slate is wiped clean.".bright_black());
                continue;
            }
            Command::Begin => match game.session().phase {
                Phase::Initial => {
                    println!("{}", "Conjuring the opening scene...".bright_black());
                    game.start().await;
                    render_outcome(&mut game, &mut scene_number);
                }
                _ => println!(
                    "{}",
                    "Pick a choice by number, or type 'restart' or 'quit'.".bright_black()
                ),
            },
            Command::Choice(index) => match game.session().phase {
                Phase::Playing => {
                    let option = game.session().choices[index].clone();
                    println!("{}", format!("> {option}").green());
                    println!("{}", "Writing the next scene...".bright_black());
                    game.choose(&option).await;
                    render_outcome(&mut game, &mut scene_number);
                }
                _ => println!("{}", "There is nothing to choose right now.".bright_black()),
            },
            Command::Invalid => {
                println!("{}", "Unknown command".bright_black());
            }
        }
    }

    println!("{}", "Farewell, adventurer.".bright_green());
    Ok(())
}

/// Prints the session after a transition completed.
fn render_outcome(game: &mut Game, scene_number: &mut usize) {
    match game.session().phase {
        Phase::Error => {
            if let Some(error) = &game.session().error {
                println!("{}", error.red());
            }
        }
        _ => render(game.session(), scene_number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_choice_numbers_within_range() {
        assert_eq!(parse_command("1", 3), Command::Choice(0));
        assert_eq!(parse_command(" 3 ", 3), Command::Choice(2));
        assert_eq!(parse_command("4", 3), Command::Invalid);
        assert_eq!(parse_command("0", 3), Command::Invalid);
        assert_eq!(parse_command("2", 0), Command::Invalid);
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(parse_command("quit", 0), Command::Quit);
        assert_eq!(parse_command("exit", 2), Command::Quit);
        assert_eq!(parse_command("restart", 2), Command::Restart);
        assert_eq!(parse_command("", 2), Command::Begin);
        assert_eq!(parse_command("open the door", 2), Command::Invalid);
    }

    #[test]
    fn strips_only_the_data_uri_prefix_when_saving() {
        // Round-trip through the decoder without touching the filesystem.
        let encoded = BASE64_STANDARD.encode(b"jpeg bytes");
        let uri = format!("{DATA_URI_PREFIX}{encoded}");
        let stripped = uri.strip_prefix(DATA_URI_PREFIX).unwrap();
        assert_eq!(BASE64_STANDARD.decode(stripped).unwrap(), b"jpeg bytes");
    }
}
