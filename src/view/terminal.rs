use crate::{
    Result,
    config::ViewConfig,
    controller::{Controller, InputSurface, Outcome, Submission, ViewState},
};
use std::io::BufRead;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tracing::{debug, info, warn};

const LINE_BUFFER: usize = 16;

/// A terminal has no on-screen keyboard to hide.
pub struct TerminalSurface;

impl InputSurface for TerminalSurface {
    fn dismiss(&self) {
        debug!("Input surface dismissed");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Prompt(String),
    Cancel,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/quit" | "/exit" => Self::Quit,
            "/cancel" => Self::Cancel,
            _ => Self::Prompt(line.to_string()),
        }
    }
}

/// Renders the screen for one state snapshot.
pub fn render_frame(state: &ViewState, placeholder: &str) -> String {
    let mut frame = String::new();

    match &state.outcome {
        Outcome::Success(answer) => {
            frame.push_str(&format!(
                "[{}] {}\n",
                answer.received_at.format("%H:%M:%S"),
                answer.text
            ));
        }
        Outcome::Failed(message) => {
            frame.push_str(&format!("error: {}\n", message));
        }
        Outcome::Idle => {}
    }

    if state.loading {
        frame.push_str("... waiting for the model (/cancel to abort)\n");
    } else {
        frame.push_str(&format!("{} > ", placeholder));
    }

    frame
}

fn render_notice(submission: &Submission) -> Option<&'static str> {
    match submission {
        Submission::Rejected => Some("a request is already in flight\n"),
        Submission::Cancelled => Some("request cancelled\n"),
        _ => None,
    }
}

/// Drives `controller` from stdin until `/quit`, end of input or Ctrl-C,
/// then unmounts it.
pub async fn run(controller: Controller, config: &ViewConfig) -> Result<()> {
    let lines = spawn_stdin_reader()?;
    let mut stdout = tokio::io::stdout();

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Interrupted");
    };

    drive(controller, config, lines, &mut stdout, interrupted).await
}

/// Reads stdin on a plain thread so a pending read never holds up runtime
/// shutdown. The channel closes at end of input.
fn spawn_stdin_reader() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            debug!("Stdin reader finished");
        })?;

    Ok(rx)
}

/// Event loop behind [`run`]: one line per command from `lines`, frames to
/// `out`. Returns on `/quit`, when `lines` closes or when `shutdown`
/// resolves, with the controller unmounted.
pub async fn drive<W, S>(
    controller: Controller,
    config: &ViewConfig,
    mut lines: mpsc::Receiver<String>,
    out: &mut W,
    shutdown: S,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut updates = controller.subscribe();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Submission>();
    tokio::pin!(shutdown);

    out.write_all(render_frame(&controller.state(), &config.placeholder).as_bytes())
        .await?;
    out.flush().await?;

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("End of input");
                    break;
                };
                match Command::parse(&line) {
                    Command::Quit => break,
                    Command::Cancel => {
                        if !controller.cancel() {
                            out.write_all(b"nothing to cancel\n").await?;
                        }
                    }
                    Command::Prompt(text) => {
                        let controller = controller.clone();
                        let done_tx = done_tx.clone();
                        tokio::spawn(async move {
                            let submission = controller.submit(&text).await;
                            let _ = done_tx.send(submission);
                        });
                    }
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                out.write_all(render_frame(&state, &config.placeholder).as_bytes())
                    .await?;
            }
            Some(submission) = done_rx.recv() => {
                debug!("Submission finished: {:?}", submission);
                if let Some(notice) = render_notice(&submission) {
                    out.write_all(notice.as_bytes()).await?;
                }
            }
            _ = &mut shutdown => break,
        }
        out.flush().await?;
    }

    controller.unmount();
    out.write_all(b"\n").await?;
    out.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Answer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("  /cancel "), Command::Cancel);
        assert_eq!(
            Command::parse("今天想吃什么？"),
            Command::Prompt("今天想吃什么？".to_string())
        );
    }

    #[test]
    fn test_render_idle_frame_shows_placeholder() {
        let frame = render_frame(&ViewState::default(), "今天想吃什么？");
        assert_eq!(frame, "今天想吃什么？ > ");
    }

    #[test]
    fn test_render_loading_keeps_previous_answer() {
        let state = ViewState {
            input: "again".to_string(),
            loading: true,
            outcome: Outcome::Success(Answer::new("试试火锅")),
        };

        let frame = render_frame(&state, "?");
        assert!(frame.contains("试试火锅"));
        assert!(frame.contains("waiting for the model"));
        assert!(!frame.ends_with("? > "));
    }

    #[test]
    fn test_render_error_frame() {
        let state = ViewState {
            outcome: Outcome::Failed("API request failed: 500".to_string()),
            ..Default::default()
        };

        let frame = render_frame(&state, "?");
        assert!(frame.starts_with("error: API request failed: 500\n"));
    }

    #[test]
    fn test_notices() {
        assert!(render_notice(&Submission::Rejected).is_some());
        assert!(render_notice(&Submission::Answered("x".to_string())).is_none());
    }
}
