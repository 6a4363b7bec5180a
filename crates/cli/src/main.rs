//! learnpath CLI - progress tracking and quizzes for the Python learning path.

mod interactive;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learnpath_core::{catalog, Achievement, LessonId, ModuleId, QuizDefinition};
use learnpath_progress::{
    Confirm, GlobalProgressBar, Preanswered, ProgressStore, ProgressSummary, ThemeManager,
};
use learnpath_quiz::{QuizSession, SubmitOutcome};
use learnpath_storage::JsonStorage;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "learnpath")]
#[command(about = "Progress tracker for the Python learning path", long_about = None)]
struct Cli {
    /// Directory holding progress data
    #[arg(long, env = "LEARNPATH_DATA_DIR", default_value = ".learnpath", global = true)]
    data_dir: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show overall and per-module progress
    Status,
    /// Mark a lesson complete
    Complete {
        /// Module number
        module: ModuleId,
        /// Lesson number
        lesson: LessonId,
    },
    /// Mark a lesson incomplete
    Uncomplete {
        /// Module number
        module: ModuleId,
        /// Lesson number
        lesson: LessonId,
    },
    /// Show the next lesson to take
    Next,
    /// List achievements
    Achievements,
    /// Show learning statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Take a module quiz
    Quiz {
        /// Quiz definition (JSON)
        file: PathBuf,
        /// Module the quiz belongs to
        #[arg(long)]
        module: ModuleId,
        /// Answers in question order, comma separated; leave a slot empty to skip it
        #[arg(long, value_delimiter = ',')]
        answers: Option<Vec<String>>,
        /// Submit without asking about unanswered questions
        #[arg(long)]
        yes: bool,
    },
    /// Reset all progress
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Export progress to a JSON file
    Export {
        /// Output file, defaults to a dated file name
        path: Option<PathBuf>,
    },
    /// Import progress from an exported file
    Import {
        /// Exported file
        path: PathBuf,
    },
    /// Show or toggle the color theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// List course modules
    Catalog,
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!("Using data directory {}", cli.data_dir.display());
    let storage = JsonStorage::new(&cli.data_dir)
        .await
        .with_context(|| format!("Failed to open data directory {}", cli.data_dir.display()))?;

    let mut themes = ThemeManager::open(storage.clone()).await?;
    let mut store = ProgressStore::open(storage)
        .await
        .context("Failed to load progress")?;
    let bar = GlobalProgressBar::new(store.subscribe());

    match cli.command {
        Commands::Status => {
            print!("{}", ProgressSummary::from_document(store.document()));
        }
        Commands::Complete { module, lesson } => {
            let newly = store.mark_lesson_complete(module, lesson).await?;
            if newly {
                println!("Completed module {} lesson {}", module, lesson);
            } else {
                println!("Module {} lesson {} was already complete", module, lesson);
            }
            if store.is_module_complete(module) {
                println!("Module {} complete!", module);
            }
            println!("{}", bar.text());
        }
        Commands::Uncomplete { module, lesson } => {
            let was_completed = store.mark_lesson_incomplete(module, lesson).await?;
            if was_completed {
                println!("Reopened module {} lesson {}", module, lesson);
            } else {
                println!("Module {} lesson {} was not complete", module, lesson);
            }
            println!("{}", bar.text());
        }
        Commands::Next => match store.next_incomplete_lesson() {
            Some((module, lesson)) => {
                let title = catalog::module(module).map(|m| m.title).unwrap_or_default();
                println!("Next: module {} lesson {} ({})", module, lesson, title);
            }
            None => println!("All lessons complete!"),
        },
        Commands::Achievements => {
            let unlocked = store.achievements();
            for achievement in Achievement::ALL {
                let mark = if unlocked.contains(&achievement) { "✔" } else { " " };
                println!(
                    "[{}] {} {} - {}",
                    mark,
                    achievement.icon(),
                    achievement.title(),
                    achievement.description()
                );
            }
        }
        Commands::Stats { json } => {
            let stats = store.statistics();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Lessons: {} of {} ({}%)", stats.completed_lessons, stats.total_lessons, stats.overall_percentage);
                println!("Modules completed: {}", stats.modules_completed);
                println!("Quizzes passed: {}", stats.quizzes_completed);
                println!("Perfect quizzes: {}", stats.perfect_quizzes);
                println!("Started: {}", stats.started_at.format("%Y-%m-%d"));
                println!("Last activity: {}", stats.last_updated.format("%Y-%m-%d %H:%M"));
                println!("Days active: {}", stats.days_active);
            }
        }
        Commands::Quiz { file, module, answers, yes } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read quiz {}", file.display()))?;
            let quiz = QuizDefinition::from_json(&raw)
                .with_context(|| format!("Invalid quiz definition {}", file.display()))?;
            let session = QuizSession::new(module, quiz)?;

            match answers {
                Some(answers) => {
                    run_scripted(&mut store, session, answers, yes).await?;
                }
                None => interactive::run(&mut store, session).await?,
            }
            println!("{}", bar.text());
        }
        Commands::Reset { yes } => {
            if store.reset(&*confirmer(yes)).await? {
                println!("Progress reset");
            } else {
                println!("Reset cancelled");
            }
        }
        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| {
                let today = chrono::Local::now().date_naive();
                PathBuf::from(ProgressStore::<JsonStorage>::export_file_name(today))
            });
            let data = store.export_snapshot()?;
            tokio::fs::write(&path, data)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported progress to {}", path.display());
        }
        Commands::Import { path } => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            store
                .import_snapshot(&data)
                .await
                .with_context(|| format!("Failed to import {}", path.display()))?;
            println!("Imported progress from {}", path.display());
            println!("{}", bar.text());
        }
        Commands::Catalog => {
            println!("{}", catalog::COURSE_TITLE);
            for info in catalog::MODULES.iter() {
                let id = ModuleId::new(info.id);
                let done = store.module_progress(id).map(|m| m.completed).unwrap_or(0);
                let quiz = match store.quiz_progress(id) {
                    Some(record) if record.attempts > 0 => format!("quiz best {}%", record.best_score),
                    _ => "quiz not taken".to_string(),
                };
                println!(
                    "{:>2}. {} {} ({}) - {}/{} lessons, {}",
                    info.id, info.icon, info.title, info.subtitle, done, info.lessons, quiz
                );
            }
        }
        Commands::Theme { action } => {
            if let Some(ThemeAction::Toggle) = action {
                themes.toggle().await?;
            }
            println!("Theme: {} (toggle: {})", themes.theme(), themes.icon());
        }
    }

    Ok(())
}

/// Submit answers given on the command line.
async fn run_scripted(
    store: &mut ProgressStore<JsonStorage>,
    mut session: QuizSession,
    answers: Vec<String>,
    yes: bool,
) -> Result<()> {
    let ids: Vec<_> = session.quiz().question_ids().collect();
    if answers.len() > ids.len() {
        anyhow::bail!("{} answers given for {} questions", answers.len(), ids.len());
    }
    for (id, answer) in ids.into_iter().zip(answers) {
        let answer = answer.trim();
        if !answer.is_empty() {
            session.record_answer(id, answer)?;
        }
    }

    match session.submit(store, &*confirmer(yes)).await? {
        SubmitOutcome::Submitted(result) => interactive::print_result(&session, &result),
        SubmitOutcome::Cancelled => println!("Quiz not submitted"),
    }
    Ok(())
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(Preanswered(true))
    } else {
        Box::new(ask_stdin)
    }
}

/// Blocking yes/no question on stdin. Anything but y/yes is a no.
fn ask_stdin(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(_) => is_yes(&line),
        Err(_) => false,
    }
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_quiz_answers() {
        let cli = Cli::try_parse_from([
            "learnpath", "quiz", "m3.json", "--module", "3", "--answers", "1,,true",
        ])
        .unwrap();
        let Commands::Quiz { module, answers, yes, .. } = cli.command else {
            panic!("expected quiz command");
        };
        assert_eq!(module, ModuleId::new(3));
        assert_eq!(answers.unwrap(), vec!["1", "", "true"]);
        assert!(!yes);
    }

    #[test]
    fn test_rejects_bad_ids() {
        assert!(Cli::try_parse_from(["learnpath", "complete", "x", "1"]).is_err());
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
