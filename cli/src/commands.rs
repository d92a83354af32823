use std::io::Write;
use std::path::Path;
use std::time::Instant;

use chatsound_core::context::{Key, MatchType, NumberField, SoundCommand, SoundFile};
use chatsound_core::hotkeys::{Combo, KeyEvent};

use crate::CliContext;

pub fn say(ctx: &CliContext, text: &str) {
    if !ctx.engine.chat(text) {
        println!("Message dropped (engine busy or stopped)");
    }
}

pub fn toggle(ctx: &CliContext) {
    ctx.engine.toggle_enabled();
}

pub async fn show_status(ctx: &CliContext) {
    let status = ctx.pool().status();
    let combo = Combo::from(ctx.config.read().await.hotkeys.enable_combo.as_slice());
    println!(
        "Sounds {}   (toggle: {})",
        if ctx.is_enabled() { "ON" } else { "OFF" },
        combo
    );
    println!(
        "Channels: {} busy, {} idle, {} queued",
        status.busy, status.idle, status.queued
    );
    println!("Chat messages waiting: {}", ctx.engine.pending_chat());
    println!("Commands: {}", ctx.rules.len());
    println!("Audio directory: {}", ctx.library.root().display());
}

pub fn list_rules(ctx: &CliContext) {
    let rules = ctx.rules.snapshot();
    if rules.is_empty() {
        println!("No sound commands configured");
        return;
    }

    println!(
        "{:<4} {:<32} {:<18} {:>6} {:>6} {:>8} {:>5}",
        "#", "Command", "Match", "Chance", "Volume", "Cooldown", "Files"
    );
    println!("{}", "-".repeat(86));

    for (index, rule) in rules.iter().enumerate() {
        let disabled = if rule.enabled() { "" } else { " (off)" };
        println!(
            "{:<4} {:<32} {:<18} {:>6.2} {:>6.2} {:>7.1}s {:>5}",
            index,
            format!("{}{}", rule.display_name(), disabled),
            rule.match_type().label(),
            rule.play_chance(),
            rule.volume(),
            rule.cooldown().as_secs_f64(),
            rule.clips().len()
        );
        for missing in ctx.library.missing_files(rule) {
            println!("       missing file: {missing}");
        }
    }
}

pub fn show_stats(ctx: &CliContext) {
    let stats = ctx.rules.stats();
    if stats.is_empty() {
        println!("No sound commands configured");
        return;
    }

    let now = Instant::now();
    println!("{:<40} {:>8} Last played", "Command", "Plays");
    println!("{}", "-".repeat(70));
    for entry in &stats {
        let last = entry
            .last_played
            .map(|t| format!("{:.0}s ago", now.saturating_duration_since(t).as_secs_f64()))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<40} {:>8} {}", entry.display_name, entry.times_played, last);
    }

    let total: u64 = stats.iter().map(|s| s.times_played).sum();
    println!("\nTotal plays: {total}");
}

pub fn reset_stats(ctx: &CliContext, name: Option<&str>) {
    match name {
        Some(name) => match ctx.rules.find(name) {
            Some(rule) => {
                ctx.rules.reset_stats(rule.id());
                println!("Reset play count for {}", rule.display_name());
            }
            None => println!("No sound command named '{name}'"),
        },
        None => {
            ctx.rules.reset_all_stats();
            println!("Reset all play counts");
        }
    }
}

pub fn preview(ctx: &CliContext, name: &str) {
    match ctx.rules.find(name) {
        Some(rule) => {
            ctx.engine.preview(rule.id());
        }
        None => println!("No sound command named '{name}'"),
    }
}

pub fn key(ctx: &CliContext, key: &str, pressed: bool) {
    match key.parse::<Key>() {
        Ok(key) => {
            ctx.engine.key(KeyEvent { key, pressed });
        }
        Err(e) => println!("{e}"),
    }
}

/// Press every key of the combo, then release them in reverse order
pub fn press(ctx: &CliContext, combo: &str) {
    let keys = match combo.split('+').map(str::parse::<Key>).collect::<Result<Vec<_>, _>>() {
        Ok(keys) => keys,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    for key in &keys {
        ctx.engine.key(KeyEvent::press(key.clone()));
    }
    for key in keys.into_iter().rev() {
        ctx.engine.key(KeyEvent::release(key));
    }
}

/// Start capturing the enable combo. The result arrives asynchronously once
/// the keys are sent with `key`/`press`.
pub fn capture(ctx: &CliContext) {
    let Some(rx) = ctx.engine.begin_capture() else {
        println!("Engine is not running");
        return;
    };
    println!("Press the new toggle combination (use /key or /press)");

    let config = ctx.config.clone();
    tokio::spawn(async move {
        match rx.await {
            Ok(combo) => {
                config.write().await.hotkeys.enable_combo = combo.to_keys();
                println!("\nToggle hotkey set to {combo} (use /save to keep it)");
            }
            Err(_) => println!("\nHotkey capture cancelled"),
        }
    });
}

pub fn cancel_capture(ctx: &CliContext) {
    ctx.engine.cancel_capture();
}

pub fn add_rule(ctx: &CliContext, mut command: SoundCommand, files: &[String]) {
    command.sound_files = files.iter().map(|f| SoundFile::new(f.as_str(), 1.0)).collect();
    let display = command.display_name();
    ctx.rules.push(command);
    println!("Added {display}");
}

pub fn import(ctx: &CliContext, path: &Path, rule: Option<&str>, weight: f64) {
    let stored = match ctx.library.import(path) {
        Ok(stored) => stored,
        Err(e) => {
            println!("Import failed: {e}");
            return;
        }
    };
    println!("Imported as {stored}");

    let Some(name) = rule else {
        return;
    };
    let Some(rule) = ctx.rules.find(name) else {
        println!("No sound command named '{name}'");
        return;
    };
    let mut command = rule.command().clone();
    command.sound_files.push(SoundFile {
        file_name: stored,
        weight: NumberField::Number(weight),
    });
    ctx.rules.update(rule.id(), command);
    println!("Added to {}", rule.display_name());
}

pub fn set_enabled(ctx: &CliContext, name: &str, enabled: bool) {
    match ctx.rules.find(name) {
        Some(rule) => {
            ctx.rules.set_enabled(rule.id(), enabled);
            println!(
                "{} {}",
                if enabled { "Enabled" } else { "Disabled" },
                rule.display_name()
            );
        }
        None => println!("No sound command named '{name}'"),
    }
}

pub fn remove(ctx: &CliContext, name: &str) {
    match ctx.rules.find(name) {
        Some(rule) => {
            ctx.rules.remove(rule.id());
            println!("Removed {}", rule.display_name());
        }
        None => println!("No sound command named '{name}'"),
    }
}

pub fn move_rule(ctx: &CliContext, name: &str, index: usize) {
    match ctx.rules.find(name) {
        Some(rule) => {
            ctx.rules.move_to(rule.id(), index);
        }
        None => println!("No sound command named '{name}'"),
    }
}

pub async fn save(ctx: &CliContext) {
    match ctx.save().await {
        Ok(()) => println!("Settings saved"),
        Err(e) => println!("Failed to save settings: {e}"),
    }
}

pub async fn exit(ctx: &CliContext) -> Result<(), String> {
    write!(std::io::stdout(), "quitting...").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    save(ctx).await;
    ctx.shutdown().await;
    Ok(())
}

/// Accepts `equals`, `starts-with`, `StartsWithWord`, `contains_word`, ...
pub fn parse_match_type(s: &str) -> Result<MatchType, String> {
    let wanted = normalize(s);
    MatchType::ALL
        .into_iter()
        .find(|m| normalize(m.label()) == wanted)
        .ok_or_else(|| format!("unknown match type '{s}'"))
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
