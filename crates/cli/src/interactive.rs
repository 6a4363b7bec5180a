//! Terminal quiz runner.

use std::io::Write;

use anyhow::Result;
use learnpath_core::{QuestionId, QuestionType};
use learnpath_progress::{Preanswered, ProgressStore};
use learnpath_quiz::{
    unanswered_prompt, OptionMark, QuizResult, QuizSession, QuizTimer, ReviewStatus,
    SubmitOutcome, RETAKE_PROMPT,
};
use learnpath_storage::JsonStorage;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Stdin lines, read on a plain thread so a pending read never holds up
/// runtime shutdown.
struct Lines {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Lines {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }

    async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    async fn ask(&mut self, message: &str) -> bool {
        println!("{} [y/N]", message);
        self.next()
            .await
            .is_some_and(|line| matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// One line of quiz input. Commands carry a `:` prefix so that any other
/// text, including a bare `n` or `s`, can be given as an answer.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Next,
    Previous,
    Submit,
    Answer(String),
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | ":n" => Input::Next,
        ":p" => Input::Previous,
        ":s" => Input::Submit,
        answer => Input::Answer(answer.to_string()),
    }
}

/// Resolves when the timer fires; never when there is no timer.
async fn expiry(rx: &mut Option<oneshot::Receiver<()>>) {
    if let Some(rx) = rx {
        if rx.await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// Take a quiz on the terminal, with retakes until the learner stops.
pub async fn run(store: &mut ProgressStore<JsonStorage>, mut session: QuizSession) -> Result<()> {
    let mut lines = Lines::spawn();

    loop {
        let Some(result) = attempt(store, &mut session, &mut lines).await? else {
            println!("Quiz abandoned");
            return Ok(());
        };
        print_result(&session, &result);

        if lines.ask("Review your answers?").await {
            print_review(&session);
        }

        let again = lines.ask(RETAKE_PROMPT).await;
        match session.retake(&Preanswered(again)) {
            Some(fresh) => session = fresh,
            None => return Ok(()),
        }
    }
}

async fn attempt(
    store: &mut ProgressStore<JsonStorage>,
    session: &mut QuizSession,
    lines: &mut Lines,
) -> Result<Option<QuizResult>> {
    let quiz = session.quiz();
    println!("{}", quiz.title);
    if let Some(description) = &quiz.description {
        println!("{}", description);
    }
    if let Some(estimate) = &quiz.estimated_time {
        println!("Estimated time: {}", estimate);
    }

    let (tx, rx) = oneshot::channel();
    let mut timer = QuizTimer::for_quiz(quiz);
    if let Some(timer) = timer.as_mut() {
        timer.start(move || {
            let _ = tx.send(());
        });
    }
    let mut expired = timer.as_ref().map(|_| rx);

    loop {
        show_question(session, timer.as_ref());

        let line = tokio::select! {
            line = lines.next() => line,
            _ = expiry(&mut expired) => {
                println!("Time's up! The quiz will be submitted automatically.");
                return Ok(Some(session.auto_submit(store).await?));
            }
        };
        let Some(line) = line else {
            debug!("Input closed during quiz");
            return Ok(None);
        };

        let index = session.current_index();
        match parse_input(&line) {
            Input::Next => {
                if !session.advance(index) {
                    println!("That was the last question. Type :s to submit.");
                }
            }
            Input::Previous => {
                if !session.retreat(index) {
                    println!("This is the first question.");
                }
            }
            Input::Submit => {
                if let Some(timer) = timer.as_ref() {
                    timer.pause();
                }
                let unanswered = session.unanswered();
                let go = unanswered == 0 || lines.ask(&unanswered_prompt(unanswered)).await;
                if let Some(timer) = timer.as_ref() {
                    timer.resume();
                }
                if let SubmitOutcome::Submitted(result) =
                    session.submit(store, &Preanswered(go)).await?
                {
                    return Ok(Some(result));
                }
            }
            Input::Answer(answer) => {
                let id = QuestionId::from_index(index);
                session.record_answer(id, answer)?;
                session.advance(index);
            }
        }
    }
}

fn show_question(session: &QuizSession, timer: Option<&QuizTimer>) {
    let progress = session.progress();
    let index = session.current_index();
    let Some(question) = session.quiz().questions.get(index) else {
        return;
    };

    println!();
    match timer {
        Some(timer) if timer.is_warning() => {
            println!("Question {} of {}  [{}] hurry!", progress.current, progress.total, timer.display())
        }
        Some(timer) => println!("Question {} of {}  [{}]", progress.current, progress.total, timer.display()),
        None => println!("Question {} of {}", progress.current, progress.total),
    }
    println!("{}", question.question);
    if let Some(code) = &question.code {
        println!("    {}", code.replace('\n', "\n    "));
    }
    for value in question.option_values() {
        println!("  [{}] {}", value, question.option_label(&value));
    }
    if question.kind == QuestionType::CodeOutput {
        println!("  (type the exact output)");
    }

    let current = session.answer(QuestionId::from_index(index));
    match current {
        Some(answer) => print!("Answer [{}] (:n next, :p previous, :s submit): ", answer),
        None => print!("Answer (:n next, :p previous, :s submit): "),
    }
    let _ = std::io::stdout().flush();
}

/// Score summary with the feedback tier.
pub fn print_result(session: &QuizSession, result: &QuizResult) {
    println!();
    println!("{} {}", result.feedback.icon(), result.feedback.title());
    println!("{}", result.feedback.message());
    println!(
        "Score: {}% ({} correct, {} incorrect of {})",
        result.percentage,
        result.score,
        result.incorrect(),
        result.total
    );
    println!(
        "Module {} quiz: best {}% over {} attempt(s){}",
        session.module(),
        result.record.best_score,
        result.record.attempts,
        if result.record.completed { ", passed" } else { "" }
    );
}

fn print_review(session: &QuizSession) {
    for review in session.review_answers() {
        let status = match review.status {
            ReviewStatus::Correct => "correct",
            ReviewStatus::IncorrectSelected => "incorrect",
            ReviewStatus::Unselected => "not answered",
        };
        println!();
        println!("{}. {} ({})", review.id, review.question, status);
        for option in &review.options {
            let mark = match option.mark {
                OptionMark::Correct => "✔",
                OptionMark::Incorrect => "✘",
                OptionMark::Unmarked => " ",
            };
            println!("  {} {}", mark, option.label);
        }
        if review.options.is_empty() {
            if let Some(given) = &review.given {
                println!("  Your answer: {}", given);
            }
            println!("  Correct answer: {}", review.correct_answer);
        }
        if let Some(explanation) = &review.explanation {
            println!("  {}", explanation);
        }
    }
}
