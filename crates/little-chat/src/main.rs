//! A terminal chat with a Groq-hosted model.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use little_chat::Config;
use little_chat::core::{ChatSession, ChatSessionBuilder, SessionState};
use little_chat::groq::GroqProvider;
use little_chat::view::{self, Scrollback};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Stdin};
use tokio::select;
use tokio::time::sleep;

const TITLE: &str = "My AI";
const QUIT_COMMAND: &str = "/quit";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("loaded config: {config:?}");

    let session = ChatSessionBuilder::with_model_provider(GroqProvider::new(
        config.groq_config(),
    ))
    .with_retry_policy(config.retry_policy())
    .build();

    let columns = config.columns();
    println!("{:^columns$}", TITLE.bold());
    println!(
        "{}",
        "End a line with \\ to keep typing, /quit to leave.".dimmed()
    );

    let mut stdin = BufReader::new(io::stdin());
    let mut scrollback = Scrollback::default();
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        let Some(input) = read_input(&mut stdin).await else {
            break;
        };
        if input.trim() == QUIT_COMMAND {
            break;
        }

        session.set_input(input);
        if !session.can_submit() {
            // Same as a disabled submit button.
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message(view::LOADING_TEXT);

        run_submission(&session, &mut scrollback, &progress_bar, columns).await;

        progress_bar.finish_and_clear();
        print_new_rows(&session.state(), &mut scrollback, columns);
    }
}

/// Submits the input, and keeps the screen in sync with the session until
/// the answer (or the error) arrives.
async fn run_submission(
    session: &ChatSession,
    scrollback: &mut Scrollback,
    progress_bar: &ProgressBar,
    columns: usize,
) {
    let mut state_rx = session.subscribe();
    let mut submit = pin!(session.submit_input());
    loop {
        select! {
            outcome = &mut submit => {
                trace!("submission finished: {outcome:?}");
                return;
            }
            Ok(()) = state_rx.changed() => {
                let state = state_rx.borrow_and_update().clone();
                progress_bar.suspend(|| {
                    print_new_rows(&state, scrollback, columns);
                });
            }
            _ = sleep(Duration::from_millis(100)) => {
                progress_bar.tick();
            }
        }
    }
}

fn print_new_rows(
    state: &SessionState,
    scrollback: &mut Scrollback,
    columns: usize,
) {
    let rows = scrollback.take_new_rows(state);
    if rows.is_empty() {
        return;
    }
    print!("{}", view::paint(&rows, columns));
    println!();
    std::io::stdout().flush().ok();
}

/// Reads one input, which spans several lines as long as each of them but
/// the last ends with a backslash.
async fn read_input(stdin: &mut BufReader<Stdin>) -> Option<String> {
    let mut input = String::new();
    let mut prompt = "> ";
    loop {
        print!("{prompt}");
        std::io::stdout().flush().ok();

        let line = read_line(stdin).await?;
        let line = line.trim_end_matches(['\r', '\n']);
        match line.strip_suffix('\\') {
            Some(line) => {
                input.push_str(line);
                input.push('\n');
                prompt = ". ";
            }
            None => {
                input.push_str(line);
                return Some(input);
            }
        }
    }
}

async fn read_line(stdin: &mut BufReader<Stdin>) -> Option<String> {
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
