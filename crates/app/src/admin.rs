use millionaire_core::model::Question;
use services::AppServices;

use crate::AdminCommand;

pub(crate) async fn run(
    app: &AppServices,
    command: AdminCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = app.questions();
    match command {
        AdminCommand::List => {
            let questions = service.list_questions().await?;
            for question in &questions {
                println!("{}", summary_line(question));
            }
            println!("{} question(s)", questions.len());
        }
        AdminCommand::Levels => {
            for count in service.level_counts().await? {
                println!("level {:>3}: {}", count.level, count.count);
            }
        }
        AdminCommand::Search(needle) => {
            for question in service.search_questions(&needle).await? {
                println!("{}", summary_line(&question));
            }
        }
        AdminCommand::Add(input) => {
            let created = service.create_question(input).await?;
            println!("{}", details(&created));
        }
        AdminCommand::Update(id, patch) => {
            let updated = service.update_question(id, patch).await?;
            println!("{}", details(&updated));
        }
        AdminCommand::Delete(id) => {
            service.delete_question(id).await?;
            println!("deleted question {id}");
        }
    }
    Ok(())
}

fn summary_line(question: &Question) -> String {
    format!(
        "#{:<5} L{:<3} {}  [{}]",
        question.id().value(),
        question.level(),
        question.text(),
        question.correct_answer()
    )
}

fn details(question: &Question) -> String {
    let mut out = format!(
        "#{} (level {})\n  {}\n  + {}\n",
        question.id(),
        question.level(),
        question.text(),
        question.correct_answer()
    );
    for wrong in question.wrong_answers() {
        out.push_str(&format!("  - {wrong}\n"));
    }
    if let Some(info) = question.info() {
        out.push_str(&format!("  i {info}\n"));
    }
    out
}
