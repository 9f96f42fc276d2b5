use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mindful_journal_lib::models::{Mood, ANSWER_OPTIONS, MOOD_QUESTIONS};
use mindful_journal_lib::{default_data_dir, init_tracing, ImageUpdate, JournalService, DATA_DIR_ENV};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mindful-journal", about = "Local journal, mood and step tracker")]
struct Cli {
    /// Directory holding the database, logs and journal images.
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Journal(JournalCommand),
    #[command(subcommand)]
    Mood(MoodCommand),
    #[command(subcommand)]
    Steps(StepsCommand),
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum JournalCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    List {
        #[arg(long)]
        favorites: bool,
    },
    Show {
        id: i64,
    },
    Edit(EditEntry),
    Delete {
        id: i64,
    },
    Favorite {
        id: i64,
        #[arg(long)]
        off: bool,
    },
}

#[derive(Args)]
struct EditEntry {
    id: i64,
    #[arg(long)]
    content: String,
    #[arg(long, conflicts_with = "remove_image")]
    image: Option<PathBuf>,
    #[arg(long)]
    remove_image: bool,
}

#[derive(Subcommand)]
enum MoodCommand {
    Add {
        /// Emoji or name: great, good, neutral, sad, awful.
        #[arg(long, value_parser = parse_mood)]
        mood: Mood,
        #[arg(long, default_value = "")]
        note: String,
        /// One per question, in order. Repeat seven times.
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
    List {
        #[arg(long)]
        days: Option<i64>,
    },
    Summary,
    Questions,
}

#[derive(Subcommand)]
enum StepsCommand {
    /// Show the daily goal, or set it when a value is given.
    Goal { value: Option<i64> },
    /// Record the sensor's cumulative total and show today's progress.
    Today { total: i64 },
    History {
        #[arg(long, default_value_t = 7)]
        days: u64,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    /// Merge a JSON object into the stored settings.
    Set { patch: String },
}

fn parse_mood(raw: &str) -> Result<Mood, String> {
    Mood::parse(raw).ok_or_else(|| format!("unknown mood '{}'", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    if let Err(error) = init_tracing(&data_dir) {
        eprintln!("logging disabled: {}", error);
    }

    let service = JournalService::new(data_dir.clone())
        .with_context(|| format!("failed to open journal in {}", data_dir.display()))?;

    match cli.command {
        Commands::Journal(command) => run_journal(&service, command).await,
        Commands::Mood(command) => run_mood(&service, command).await,
        Commands::Steps(command) => run_steps(&service, command).await,
        Commands::Settings(command) => run_settings(&service, command).await,
    }
}

async fn run_journal(service: &JournalService, command: JournalCommand) -> Result<()> {
    match command {
        JournalCommand::Add { title, content, image } => {
            print_json(&service.add_journal_entry(title, content, image).await?)
        }
        JournalCommand::List { favorites } => print_json(&service.list_journal_entries(favorites).await?),
        JournalCommand::Show { id } => match service.journal_entry(id).await? {
            Some(entry) => print_json(&entry),
            None => anyhow::bail!("journal entry {} not found", id),
        },
        JournalCommand::Edit(edit) => {
            let image = match (edit.image, edit.remove_image) {
                (Some(path), _) => ImageUpdate::Replace(path),
                (None, true) => ImageUpdate::Remove,
                (None, false) => ImageUpdate::Keep,
            };
            print_json(&service.update_journal_entry(edit.id, edit.content, image).await?)
        }
        JournalCommand::Delete { id } => {
            if !service.delete_journal_entry(id).await? {
                anyhow::bail!("journal entry {} not found", id);
            }
            println!("deleted entry {}", id);
            Ok(())
        }
        JournalCommand::Favorite { id, off } => print_json(&service.set_journal_favorited(id, !off).await?),
    }
}

async fn run_mood(service: &JournalService, command: MoodCommand) -> Result<()> {
    match command {
        MoodCommand::Add { mood, note, answers } => {
            let id = service.record_mood(mood, note, answers).await?;
            println!("recorded mood {} as log {}", mood, id);
            Ok(())
        }
        MoodCommand::List { days } => print_json(&service.list_moods(days).await?),
        MoodCommand::Summary => print_json(&service.mood_summary().await?),
        MoodCommand::Questions => {
            for (index, question) in MOOD_QUESTIONS.iter().enumerate() {
                println!("{}. {}", index + 1, question);
            }
            println!("answers: {}", ANSWER_OPTIONS.join(", "));
            Ok(())
        }
    }
}

async fn run_steps(service: &JournalService, command: StepsCommand) -> Result<()> {
    match command {
        StepsCommand::Goal { value: Some(goal) } => {
            service.set_step_goal(goal).await?;
            println!("step goal set to {}", goal);
            Ok(())
        }
        StepsCommand::Goal { value: None } => {
            println!("{}", service.step_goal().await?);
            Ok(())
        }
        StepsCommand::Today { total } => {
            let summary = service.today_steps(total).await?;
            println!(
                "{} / {} steps ({:.0}%), {} kcal, {:.2} km",
                summary.steps,
                summary.goal,
                summary.progress * 100.0,
                summary.calories,
                summary.distance_km
            );
            Ok(())
        }
        StepsCommand::History { days } => print_json(&service.daily_steps(days).await?),
    }
}

async fn run_settings(service: &JournalService, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => print_json(&service.settings().await?),
        SettingsCommand::Set { patch } => {
            let patch: serde_json::Value = serde_json::from_str(&patch).context("settings patch must be JSON")?;
            print_json(&service.update_settings(patch).await?)
        }
    }
}
