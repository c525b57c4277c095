use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use storage::repository::{NewQuestionRecord, Storage};
use storage::parse_question_file;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    file: PathBuf,
    replace: bool,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("MILLIONAIRE_DB_URL")
            .unwrap_or_else(|_| "sqlite:millionaire.sqlite3?mode=rwc".into());
        let mut file = std::env::var("MILLIONAIRE_QUESTIONS_FILE")
            .map_or_else(|_| PathBuf::from("data/questions.tsv"), PathBuf::from);
        let mut replace = false;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--file" => {
                    file = PathBuf::from(require_value(&mut args, "--file")?);
                }
                "--replace" => replace = true,
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            file,
            replace,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:millionaire.sqlite3?mode=rwc)");
    eprintln!("  --file <path>             Tab-separated question file (default: data/questions.tsv)");
    eprintln!("  --replace                 Delete all stored questions before importing");
    eprintln!("  --now <rfc3339>           Fixed creation time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  MILLIONAIRE_DB_URL, MILLIONAIRE_QUESTIONS_FILE, RUST_LOG");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let contents = std::fs::read_to_string(&args.file)?;
    let drafts = parse_question_file(&contents)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    if args.replace {
        let existing = storage.questions.list_questions().await?;
        for question in &existing {
            storage.questions.delete_question(question.id()).await?;
        }
        log::info!("removed {} existing questions", existing.len());
    }

    let mut inserted = 0_usize;
    for draft in drafts {
        let validated = match draft.clone().validate(now) {
            Ok(validated) => validated,
            Err(err) => {
                log::warn!("skipping question {:?}: {err}", draft.text);
                continue;
            }
        };
        storage
            .questions
            .insert_new_question(NewQuestionRecord::from_validated(&validated))
            .await?;
        inserted += 1;
    }

    let levels = storage.questions.count_by_level().await?;
    println!(
        "Seeded {inserted} questions across {} levels from {} into {}",
        levels.len(),
        args.file.display(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
