//! Interactive game loop over stdin.

use color_eyre::eyre::{bail, Result};
use colored::Colorize;
use sp_core::client::HttpBackend;
use sp_core::game::{GameContent, GameError, GamePhase, GameSession, QuestionView};
use sp_core::render::BlueprintRenderer;
use sp_core::store::SessionStore;
use sp_protocol::config_models::ClientConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub async fn run(config: &ClientConfig, backend: Arc<HttpBackend>, store: Arc<SessionStore>) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::channel(64);
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            debug!(?event, "game event");
        }
    });

    let mut session = GameSession::load(
        backend.as_ref(),
        backend.clone(),
        store,
        config.game,
        events_tx,
    )
    .await?;

    print_intro(session.content());

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match session.phase() {
            GamePhase::Answering => answer_current(&mut session, &mut input).await?,
            GamePhase::Feedback { .. } => {
                session.auto_advance().await?;
            }
            GamePhase::Complete {
                score,
                total_questions,
            } => {
                println!(
                    "\n{} You scored {score} out of {total_questions}.",
                    "Game complete!".green().bold()
                );
                return Ok(());
            }
        }
    }
}

fn print_intro(content: &GameContent) {
    match content {
        GameContent::Blueprint(blueprint) => match BlueprintRenderer.render(blueprint) {
            Ok(tree) => println!("\n{tree}"),
            Err(e) => warn!(error = %e, "blueprint cannot be shown"),
        },
        GameContent::Legacy { story, .. } => {
            if let Some(title) = &story.story_title {
                println!("\n{}", title.bold());
            }
            if let Some(context) = &story.story_context {
                println!("{context}");
            }
        }
    }
}

async fn answer_current(session: &mut GameSession, input: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    let question = session.current_question().unwrap_or_else(|| QuestionView {
        number: session.question_number(),
        prompt: "Your answer?".to_string(),
        options: Vec::new(),
    });
    println!(
        "\n{} {}",
        format!("Question {}/{}:", session.question_index() + 1, session.total_questions()).cyan(),
        question.prompt
    );
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }

    let cancel = session.cancellation_token();
    let line = tokio::select! {
        _ = cancel.cancelled() => bail!("cancelled"),
        line = input.next_line() => line?,
    };
    let Some(line) = line else {
        bail!("input closed before the game finished");
    };
    let answer = pick_option(&question.options, line.trim());
    session.select_answer(answer)?;

    match session.submit_answer().await {
        Ok(record) => {
            let verdict = if record.is_correct {
                "Correct!".green().bold()
            } else {
                "Not quite.".red().bold()
            };
            println!("{verdict} Score: {}", session.score());
            Ok(())
        }
        Err(GameError::AnswerCheck(e)) => {
            println!("{} {e}. Try again.", "Could not check answer:".yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// A number picks the option at that position; anything else is the answer itself.
fn pick_option(options: &[String], input: &str) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_option() {
        let options = vec!["Faster".to_string(), "Slower".to_string()];
        assert_eq!(pick_option(&options, "2"), "Slower");
        assert_eq!(pick_option(&options, "Faster"), "Faster");
        assert_eq!(pick_option(&options, "0"), "0");
        assert_eq!(pick_option(&options, "3"), "3");
    }
}
