use millionaire_core::model::SessionState;
use services::{
    AnswerOutcome, AppServices, QuestionOutcome, QuizEngine, QuizError, parse_answer_index,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

type PlayResult<T> = Result<T, Box<dyn std::error::Error>>;

pub(crate) async fn run(app: &AppServices) -> PlayResult<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    play_game(app, stdin, &mut stdout).await
}

/// Run one game against the given terminal streams until win, loss or EOF.
async fn play_game<R, W>(app: &AppServices, input: R, out: &mut W) -> PlayResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let engine = app.engine();
    let sessions = app.sessions();
    let id = sessions.open();
    let result = match sessions.lock(id).await {
        Some(mut slot) => drive(&engine, &mut slot, input, out).await,
        None => Ok(()),
    };
    sessions.close(id);
    result
}

async fn drive<R, W>(
    engine: &QuizEngine,
    slot: &mut Option<SessionState>,
    input: R,
    out: &mut W,
) -> PlayResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    if !engine.config().auto_start {
        let started = engine.start(slot);
        say(out, &format!("New game at level {}.\n", started.level)).await?;
    }

    loop {
        let view = match engine.begin_or_continue(slot).await? {
            QuestionOutcome::Question(view) => view,
            QuestionOutcome::Win { score } => {
                say(out, &format!("No questions left. You win with {score} points!\n")).await?;
                return Ok(());
            }
        };

        let mut prompt = format!("\nLevel {}: {}\n", view.level, view.text);
        for (n, answer) in view.answers.iter().enumerate() {
            prompt.push_str(&format!("  {}) {answer}\n", n + 1));
        }
        say(out, &prompt).await?;

        let index = loop {
            say(out, "> ").await?;
            let Some(line) = lines.next_line().await? else {
                say(out, "\nBye.\n").await?;
                return Ok(());
            };
            if line.trim().eq_ignore_ascii_case("q") {
                say(out, "Bye.\n").await?;
                return Ok(());
            }
            match parse_answer_index(Some(&line)) {
                Ok(choice) => break choice.saturating_sub(1),
                Err(QuizError::InvalidInput(reason)) => {
                    say(out, &format!("Enter an answer number ({reason}).\n")).await?;
                }
                Err(other) => return Err(other.into()),
            }
        };

        let outcome = engine.submit_answer(slot, index)?;
        match &outcome {
            AnswerOutcome::Correct { level, score, .. } => {
                say(out, &format!("Correct! Level {level}, {score} points.\n")).await?;
            }
            AnswerOutcome::GameOver { final_score, .. } => {
                say(out, &format!("Wrong. Game over with {final_score} points.\n")).await?;
            }
        }
        if let Some(info) = outcome.info() {
            say(out, &format!("Did you know? {info}\n")).await?;
        }
        if !outcome.is_correct() {
            return Ok(());
        }
    }
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use millionaire_core::time::fixed_now;
    use services::{Clock, NewQuestion, QuizConfig};
    use storage::Storage;
    use tokio::io::AsyncReadExt;

    fn app(auto_start: bool) -> AppServices {
        AppServices::new(
            &Storage::in_memory(),
            Clock::fixed(fixed_now()),
            QuizConfig { auto_start },
        )
    }

    async fn add_question(app: &AppServices, level: u32) {
        app.questions()
            .create_question(NewQuestion {
                level: Some(level),
                text: Some("Capital of France?".into()),
                correct_answer: Some("Paris".into()),
                wrong_answers: Some(vec!["Lyon".into()]),
                info: Some("Paris has been the capital since 987.".into()),
            })
            .await
            .unwrap();
    }

    async fn transcript(app: &AppServices, input: &str) -> String {
        let mut out = Vec::new();
        play_game(app, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn empty_bank_is_an_immediate_win() {
        let app = app(false);
        let text = transcript(&app, "").await;
        assert!(text.contains("New game at level 0."));
        assert!(text.contains("You win with 0 points"));
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn correct_answer_on_last_level_wins_and_shows_info() {
        let app = app(true);
        add_question(&app, 0).await;

        let (mut player, game_input) = tokio::io::duplex(1024);
        let (game_output, screen) = tokio::io::duplex(1024);

        let game = async {
            let mut game_output = game_output;
            let result = play_game(&app, BufReader::new(game_input), &mut game_output).await;
            drop(game_output);
            result
        };
        let terminal = async {
            let mut screen = BufReader::new(screen);
            let mut seen = String::new();
            while !seen.ends_with("> ") {
                let mut buf = [0u8; 256];
                let n = screen.read(&mut buf).await.unwrap();
                assert!(n > 0, "game ended before prompting: {seen}");
                seen.push_str(std::str::from_utf8(&buf[..n]).unwrap());
            }
            let choice = seen
                .lines()
                .find_map(|line| line.trim().strip_suffix(") Paris"))
                .expect("Paris is listed")
                .to_string();
            player.write_all(format!("{choice}\n").as_bytes()).await.unwrap();
            screen.read_to_string(&mut seen).await.unwrap();
            seen
        };

        let (result, text) = tokio::join!(game, terminal);
        result.unwrap();

        assert!(!text.contains("New game"));
        assert!(text.contains("Level 0: Capital of France?"));
        assert!(text.contains("Correct! Level 1, 100 points."), "{text}");
        assert!(text.contains("Did you know? Paris has been the capital since 987."));
        assert!(text.contains("You win with 100 points"), "{text}");
        assert!(app.sessions().is_empty());
    }

    #[tokio::test]
    async fn wrong_answer_ends_the_game_with_zero() {
        let app = app(false);
        add_question(&app, 0).await;

        // Choice 0 maps to index -1, which is always wrong.
        let text = transcript(&app, "0\n").await;
        assert!(text.contains("Wrong. Game over with 0 points."), "{text}");
        assert!(text.contains("Did you know? Paris has been the capital since 987."));
    }

    #[tokio::test]
    async fn bad_input_reprompts_and_eof_quits() {
        let app = app(false);
        add_question(&app, 0).await;

        let text = transcript(&app, "abc\n\n").await;
        assert_eq!(text.matches("Enter an answer number").count(), 2);
        assert!(text.ends_with("Bye.\n"));
        assert!(app.sessions().is_empty());
    }
}
