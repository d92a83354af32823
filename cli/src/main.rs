use std::io::Write;
use std::path::PathBuf;

use chatsound_cli::CliContext;
use chatsound_cli::commands::{self, parse_match_type};
use chatsound_cli::logging;
use chatsound_cli::readline;
use chatsound_core::context::{MatchType, NumberField, SoundCommand};
use clap::{Parser, Subcommand, ValueEnum};

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let ctx = CliContext::new();

    println!("Type chat messages to trigger sounds, /help for commands");

    loop {
        let Some(line) = readline()? else {
            commands::exit(&ctx).await?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Anything not starting with '/' is a chat message
        let Some(command) = line.strip_prefix('/') else {
            commands::say(&ctx, line);
            continue;
        };

        match respond(command, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "chatsound")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyAction {
    Down,
    Up,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a chat message
    Say { text: Vec<String> },
    /// Flip the global sound switch
    Toggle,
    Status,
    /// List sound commands in evaluation order
    Rules,
    /// Play counts, most played first
    Stats,
    ResetStats { name: Option<String> },
    /// Play a command now, ignoring its gates
    Preview { name: String },
    /// Send one raw key event
    Key {
        #[arg(value_enum)]
        action: KeyAction,
        key: String,
    },
    /// Press and release a combo, e.g. ctrl+shift+c
    Press { combo: String },
    /// Record a new toggle combo from the next key events
    Capture,
    CancelCapture,
    /// Add a sound command; NAME is a comma-separated alias list
    Add {
        name: String,
        #[arg(short, long, value_parser = parse_match_type)]
        match_type: Option<MatchType>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        chance: Option<f64>,
        #[arg(long)]
        volume: Option<f64>,
        #[arg(long)]
        cooldown: Option<f64>,
        /// Sound files inside the audio directory
        files: Vec<String>,
    },
    /// Copy a sound file into the audio directory
    Import {
        path: PathBuf,
        /// Also add the file to this command
        #[arg(short, long)]
        rule: Option<String>,
        #[arg(short, long, default_value_t = 1.0)]
        weight: f64,
    },
    Enable { name: String },
    Disable { name: String },
    Remove { name: String },
    /// Move a command to a new position in the evaluation order
    Move { name: String, index: usize },
    Save,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "chatsound".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Say { text }) => commands::say(ctx, &text.join(" ")),
        Some(Commands::Toggle) => commands::toggle(ctx),
        Some(Commands::Status) => commands::show_status(ctx).await,
        Some(Commands::Rules) => commands::list_rules(ctx),
        Some(Commands::Stats) => commands::show_stats(ctx),
        Some(Commands::ResetStats { name }) => commands::reset_stats(ctx, name.as_deref()),
        Some(Commands::Preview { name }) => commands::preview(ctx, &name),
        Some(Commands::Key { action, key }) => {
            commands::key(ctx, &key, matches!(action, KeyAction::Down))
        }
        Some(Commands::Press { combo }) => commands::press(ctx, &combo),
        Some(Commands::Capture) => commands::capture(ctx),
        Some(Commands::CancelCapture) => commands::cancel_capture(ctx),
        Some(Commands::Add {
            name,
            match_type,
            category,
            chance,
            volume,
            cooldown,
            files,
        }) => {
            let mut command = SoundCommand::new(name);
            if let Some(match_type) = match_type {
                command.match_type = match_type;
            }
            if let Some(category) = category {
                command.category = category;
            }
            if let Some(chance) = chance {
                command.play_chance = NumberField::Number(chance);
            }
            if let Some(volume) = volume {
                command.volume = NumberField::Number(volume);
            }
            if let Some(cooldown) = cooldown {
                command.cooldown_seconds = NumberField::Number(cooldown);
            }
            commands::add_rule(ctx, command, &files);
        }
        Some(Commands::Import { path, rule, weight }) => {
            commands::import(ctx, &path, rule.as_deref(), weight)
        }
        Some(Commands::Enable { name }) => commands::set_enabled(ctx, &name, true),
        Some(Commands::Disable { name }) => commands::set_enabled(ctx, &name, false),
        Some(Commands::Remove { name }) => commands::remove(ctx, &name),
        Some(Commands::Move { name, index }) => commands::move_rule(ctx, &name, index),
        Some(Commands::Save) => commands::save(ctx).await,
        Some(Commands::Exit) => {
            commands::exit(ctx).await?;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
