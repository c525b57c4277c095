use std::fmt;

use millionaire_core::model::{QuestionId, QuestionPatch};
use services::{AppServices, Clock, NewQuestion, QuizConfig};

mod admin;
mod play;

#[derive(Debug)]
pub(crate) enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  millionaire play      [--db <sqlite_url>] [--auto-start]");
    eprintln!("  millionaire questions list   [--db <sqlite_url>]");
    eprintln!("  millionaire questions levels [--db <sqlite_url>]");
    eprintln!("  millionaire questions search <text> [--db <sqlite_url>]");
    eprintln!("  millionaire questions add --level <n> --text <t> --correct <a> --wrong <a>... [--info <t>]");
    eprintln!("  millionaire questions update <id> [--level <n>] [--text <t>] [--correct <a>] [--wrong <a>...] [--info <t>]");
    eprintln!("  millionaire questions delete <id>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://millionaire.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MILLIONAIRE_DB_URL, MILLIONAIRE_AUTO_START, RUST_LOG");
}

/// What the binary was asked to do.
#[derive(Debug)]
enum Command {
    Play,
    Questions(AdminCommand),
}

#[derive(Debug)]
pub(crate) enum AdminCommand {
    List,
    Levels,
    Search(String),
    Add(NewQuestion),
    Update(QuestionId, QuestionPatch),
    Delete(QuestionId),
}

struct Args {
    db_url: String,
    config: QuizConfig,
    command: Command,
}

/// Flags shared by every subcommand plus question fields for add/update.
#[derive(Default)]
struct Flags {
    db_url: Option<String>,
    auto_start: bool,
    level: Option<u32>,
    text: Option<String>,
    correct: Option<String>,
    wrong: Vec<String>,
    info: Option<String>,
    positional: Vec<String>,
}

impl Flags {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut flags = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    flags.db_url = Some(value);
                }
                "--auto-start" => flags.auto_start = true,
                "--level" => {
                    flags.level = Some(parse_number(require_value(args, "--level")?, "--level")?);
                }
                "--text" => flags.text = Some(require_value(args, "--text")?),
                "--correct" => flags.correct = Some(require_value(args, "--correct")?),
                "--wrong" => flags.wrong.push(require_value(args, "--wrong")?),
                "--info" => flags.info = Some(require_value(args, "--info")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => flags.positional.push(arg),
            }
        }
        Ok(flags)
    }

    fn wrong_answers(&mut self) -> Option<Vec<String>> {
        if self.wrong.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.wrong))
        }
    }
}

impl Args {
    fn parse(mut argv: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let sub = argv
            .next()
            .ok_or(ArgsError::MissingArgument { what: "subcommand" })?;

        let command_word = if sub == "questions" {
            Some(
                argv.next()
                    .ok_or(ArgsError::MissingArgument { what: "questions action" })?,
            )
        } else {
            None
        };

        let mut flags = Flags::parse(&mut argv)?;
        let mut positional = std::mem::take(&mut flags.positional).into_iter();

        let command = match (sub.as_str(), command_word.as_deref()) {
            ("play", None) => Command::Play,
            ("questions", Some("list")) => Command::Questions(AdminCommand::List),
            ("questions", Some("levels")) => Command::Questions(AdminCommand::Levels),
            ("questions", Some("search")) => Command::Questions(AdminCommand::Search(
                positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "search text" })?,
            )),
            ("questions", Some("add")) => Command::Questions(AdminCommand::Add(NewQuestion {
                level: flags.level,
                text: flags.text.take(),
                correct_answer: flags.correct.take(),
                wrong_answers: flags.wrong_answers(),
                info: flags.info.take(),
            })),
            ("questions", Some("update")) => {
                let id = parse_id(positional.next())?;
                Command::Questions(AdminCommand::Update(
                    id,
                    QuestionPatch {
                        level: flags.level,
                        text: flags.text.take(),
                        correct_answer: flags.correct.take(),
                        wrong_answers: flags.wrong_answers(),
                        info: flags.info.take(),
                    },
                ))
            }
            ("questions", Some("delete")) => {
                Command::Questions(AdminCommand::Delete(parse_id(positional.next())?))
            }
            (_, Some(action)) => return Err(ArgsError::UnknownArg(action.to_string())),
            (other, None) => return Err(ArgsError::UnknownArg(other.to_string())),
        };

        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        let db_url = flags
            .db_url
            .or_else(|| std::env::var("MILLIONAIRE_DB_URL").ok())
            .map_or_else(|| "sqlite://millionaire.sqlite3".into(), normalize_sqlite_url);
        let auto_start = flags.auto_start
            || std::env::var("MILLIONAIRE_AUTO_START")
                .is_ok_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        Ok(Self {
            db_url,
            config: QuizConfig { auto_start },
            command,
        })
    }
}

fn parse_id(raw: Option<String>) -> Result<QuestionId, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument { what: "question id" })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag: "<id>", raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() || matches!(argv[0].as_str(), "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let args = Args::parse(argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Binary glue owns storage setup so services stay backend-agnostic.
    prepare_sqlite_file(&args.db_url)?;
    let app = AppServices::new_sqlite(&args.db_url, Clock::system(), args.config).await?;
    log::debug!("using {} (auto_start={})", args.db_url, args.config.auto_start);

    match args.command {
        Command::Play => play::run(&app).await,
        Command::Questions(command) => admin::run(&app, command).await,
    }
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn play_accepts_db_and_auto_start() {
        let args = parse(&["play", "--db", "sqlite::memory:", "--auto-start"]).unwrap();
        assert!(matches!(args.command, Command::Play));
        assert_eq!(args.db_url, "sqlite::memory:");
        assert!(args.config.auto_start);
    }

    #[test]
    fn add_collects_repeated_wrong_answers() {
        let args = parse(&[
            "questions", "add", "--level", "2", "--text", "Q?", "--correct", "A", "--wrong", "B",
            "--wrong", "C", "--db", "sqlite::memory:",
        ])
        .unwrap();
        let Command::Questions(AdminCommand::Add(input)) = args.command else {
            panic!("expected add");
        };
        assert_eq!(input.level, Some(2));
        assert_eq!(input.correct_answer.as_deref(), Some("A"));
        assert_eq!(input.wrong_answers, Some(vec!["B".to_string(), "C".to_string()]));
        assert_eq!(input.info, None);
    }

    #[test]
    fn update_requires_an_id() {
        let err = parse(&["questions", "update", "--text", "x"]).err().unwrap();
        assert!(matches!(err, ArgsError::MissingArgument { what: "question id" }));

        let args = parse(&["questions", "update", "7", "--level", "1", "--db", "sqlite::memory:"]).unwrap();
        let Command::Questions(AdminCommand::Update(id, patch)) = args.command else {
            panic!("expected update");
        };
        assert_eq!(id, QuestionId::new(7));
        assert_eq!(patch.level, Some(1));
        assert!(patch.wrong_answers.is_none());
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(
            parse(&["questions", "rename"]).err().unwrap(),
            ArgsError::UnknownArg(_)
        ));
        assert!(matches!(
            parse(&["play", "--level", "x"]).err().unwrap(),
            ArgsError::InvalidNumber { .. }
        ));
        assert!(matches!(
            parse(&["play", "extra"]).err().unwrap(),
            ArgsError::UnknownArg(_)
        ));
    }
}
