use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use eduvox_application::ChatSession;
use eduvox_core::EduvoxError;
use eduvox_core::archive::DateKey;
use eduvox_core::backend::AudioClip;
use eduvox_core::secret::SecretService;
use eduvox_infrastructure::{
    ConfigService, EduvoxPaths, JsonArchiveRepository, SecretServiceImpl, VoiceArtifactStore,
};
use eduvox_interaction::{GeminiChatBackend, GoogleSpeechClient, TranslateTtsClient};

/// Sample rate assumed for clips without a readable WAV header.
const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/dates".to_string(),
                "/view".to_string(),
                "/delete".to_string(),
                "/speak".to_string(),
                "/player".to_string(),
                "/help".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// The main entry point for the EduVox console application.
///
/// This async function sets up a rustyline-based REPL that:
/// 1. Loads configuration and API keys, then wires the HTTP backends
/// 2. Restores the transcript archive and opens today's bucket
/// 3. Provides command completion for the slash commands
/// 4. Sends typed (or transcribed) questions through the chat session
/// 5. Displays colored output for user, AI, and system messages
#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so library output never garbles the prompt line
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // ===== Backend Initialization =====
    let config = ConfigService::new().get_config();

    let backend = GeminiChatBackend::try_from_env(&config.chat).await?;

    let secrets = SecretServiceImpl::default_location()
        .map_err(anyhow::Error::msg)?
        .load_secrets()
        .await
        .map_err(anyhow::Error::msg)?;
    let speech_key = secrets.speech.map(|s| s.api_key).unwrap_or_default();
    let transcriber = Arc::new(GoogleSpeechClient::new(speech_key, &config.recognition));

    let synthesizer = Arc::new(TranslateTtsClient::new(&config.voice));
    let voice_store = Arc::new(VoiceArtifactStore::new(
        EduvoxPaths::voiceovers_dir()?,
        synthesizer,
        &config.voice,
        config.storage.voiceover_cache_limit,
    ));

    let repository = Arc::new(JsonArchiveRepository::default_location(
        &config.storage.archive_file_name,
    )?);

    let mut session =
        ChatSession::start(repository, Arc::new(backend), voice_store, transcriber).await?;

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== EduVox Console ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask anything to get a simplified explanation. Type '/help' for commands or 'quit' to exit."
            .bright_black()
    );
    println!();

    if !session.list_dates().is_empty() {
        print_dates(&session);
        println!();
    }

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                // Handle quit command
                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                // Skip empty lines
                if trimmed.is_empty() {
                    continue;
                }

                // Add to history
                let _ = rl.add_history_entry(&line);

                if let Some(command) = trimmed.strip_prefix('/') {
                    run_command(&mut session, command).await;
                } else {
                    send_and_render(&mut session, trimmed).await;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}

/// Dispatches one slash command.
async fn run_command(session: &mut ChatSession, command: &str) {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    match name {
        "help" => print_help(),
        "dates" => print_dates(session),
        "view" => {
            if let Some(date) = arg {
                session.select_date(DateKey::from(date));
            }
            print_transcript(session);
        }
        "delete" => match arg {
            Some(date) => delete_date(session, date).await,
            None => println!("{}", "Usage: /delete <yyyy-mm-dd>".bright_black()),
        },
        "speak" => match arg {
            Some(path) => speak(session, path).await,
            None => println!("{}", "Usage: /speak <wav-file>".bright_black()),
        },
        "player" => export_player(session),
        _ => println!("{}", "Unknown command. '/help' lists the commands.".bright_black()),
    }
}

/// Sends one question through the session and prints the reply.
async fn send_and_render(session: &mut ChatSession, text: &str) {
    // Display user input in green
    println!("{}", format!("> {}", text).green());

    match session.send_message(text).await {
        Ok(turn) => {
            for line in turn.bot_response.lines() {
                println!("{}", line.bright_blue());
            }
            if turn.voiceover.is_some() {
                println!("{}", "[voiceover saved, '/player' exports it]".bright_black());
            }
        }
        Err(e) => println!("{}", e.user_message().red()),
    }
}

/// Transcribes a recorded clip and submits the recognized text.
///
/// The client bounds the recognition attempt with the configured listen
/// window; when it elapses the user gets the timeout warning instead of a
/// hung prompt.
async fn speak(session: &mut ChatSession, path: &str) {
    println!("{}", "Listening... Speak now.".yellow());

    let clip = match load_clip(path) {
        Ok(clip) => clip,
        Err(e) => {
            println!("{}", format!("Could not read {}: {}", path, e).red());
            return;
        }
    };

    match session.transcribe(&clip).await {
        Ok(text) => send_and_render(session, &text).await,
        Err(e) => {
            let message = e.user_message();
            match e {
                // Timeouts and unintelligible clips are warnings; the user
                // just tries again. A failed request is a real error.
                EduvoxError::RecognitionTimeout | EduvoxError::Unintelligible => {
                    println!("{}", message.yellow())
                }
                _ => println!("{}", message.red()),
            }
        }
    }
}

/// Deletes one archived day and reports the outcome.
async fn delete_date(session: &mut ChatSession, date: &str) {
    let date = DateKey::from(date);
    match session.delete_date(&date).await {
        Ok(true) => println!("{}", format!("Deleted chat history for {}", date).green()),
        Ok(false) => println!("{}", "No chat history available for this date.".bright_black()),
        Err(e) => println!("{}", e.user_message().red()),
    }
}

/// Writes the latest voiceover as a standalone HTML player.
fn export_player(session: &ChatSession) {
    let Some(turn) = session.latest_turn() else {
        println!("{}", "No voiceover to play yet.".bright_black());
        return;
    };

    let player = session.render_player(turn);
    if player.is_empty() {
        println!("{}", "No voiceover to play yet.".bright_black());
        return;
    }

    match write_player(&player) {
        Ok(path) => println!("{}", format!("Player written to {}", path.display()).green()),
        Err(e) => println!("{}", format!("Error: {}", e).red()),
    }
}

fn write_player(player: &str) -> Result<PathBuf> {
    let dir = EduvoxPaths::data_dir()?;
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("player.html");
    std::fs::write(&path, player)?;
    Ok(path)
}

fn print_help() {
    println!("{}", "Commands:".bright_black());
    println!("{}", "  /dates            list archived days, newest first".bright_black());
    println!("{}", "  /view [date]      show a day's transcript".bright_black());
    println!("{}", "  /delete <date>    delete a day's history".bright_black());
    println!("{}", "  /speak <wav-file> transcribe a recorded clip and send it".bright_black());
    println!("{}", "  /player           export the latest voiceover as an HTML player".bright_black());
    println!("{}", "  quit              exit".bright_black());
}

fn print_dates(session: &ChatSession) {
    let dates = session.list_dates();
    if dates.is_empty() {
        println!("{}", "No archived days yet.".bright_black());
        return;
    }

    println!("{}", "Chat History".bright_magenta());
    for date in dates {
        let marker = if &date == session.selected_date() { "*" } else { " " };
        println!("{} {}", marker.bright_magenta(), date.to_string().cyan());
    }
}

fn print_transcript(session: &ChatSession) {
    let turns = session.view();
    if turns.is_empty() {
        println!("{}", "No chat history available for this date.".bright_black());
        return;
    }

    println!("{}", format!("--- {} ---", session.selected_date()).bright_magenta());
    for turn in turns {
        println!("{}", format!("> {}", turn.inputs).green());
        for line in turn.bot_response.lines() {
            println!("{}", line.bright_blue());
        }
        if turn
            .voiceover
            .as_deref()
            .is_some_and(|p| Path::new(p).is_file())
        {
            println!("{}", "[voiceover on file]".bright_black());
        }
        println!();
    }
}

/// Reads a recorded clip, picking the sample rate out of the WAV header.
fn load_clip(path: &str) -> std::io::Result<AudioClip> {
    let data = std::fs::read(path)?;
    let sample_rate = wav_sample_rate(&data).unwrap_or(DEFAULT_SAMPLE_RATE);
    Ok(AudioClip::wav(data, sample_rate))
}

/// Sample rate field of a RIFF/WAVE header, if `data` carries one.
fn wav_sample_rate(data: &[u8]) -> Option<u32> {
    if data.len() < 28 || &data[..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return None;
    }
    let bytes: [u8; 4] = data[24..28].try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_sample_rate_is_read() {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF");
        data.extend_from_slice(&36u32.to_le_bytes());
        data.extend_from_slice(b"WAVE");
        data.extend_from_slice(b"fmt ");
        data.extend_from_slice(&16u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&44_100u32.to_le_bytes());

        assert_eq!(wav_sample_rate(&data), Some(44_100));
    }

    #[test]
    fn non_wav_bytes_fall_back_to_default() {
        assert_eq!(wav_sample_rate(b"not audio at all"), None);
        assert_eq!(wav_sample_rate(&[]), None);

        let header = b"RIFFxxxxWEBP";
        assert_eq!(wav_sample_rate(header), None);
    }

    #[test]
    fn completion_offers_matching_commands() {
        let helper = CliHelper::new();
        let history = rustyline::history::DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, candidates) = helper.complete("/d", 2, &ctx).unwrap();
        assert_eq!(start, 0);
        let names: Vec<&str> = candidates.iter().map(|p| p.display.as_str()).collect();
        assert_eq!(names, vec!["/dates", "/delete"]);

        let (_, none) = helper.complete("hello", 5, &ctx).unwrap();
        assert!(none.is_empty());
    }
}
