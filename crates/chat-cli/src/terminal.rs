//! Terminal presentation: stdin lines in, transcript out.

use std::io::{self, Write};

use anyhow::Result;
use chat_core::{LINE_SEPARATOR, SendOutcome, SessionState};
use chat_runtime::ChatHandle;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Writes each received message once, in arrival order.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    seen: u64,
}

impl TranscriptPrinter {
    /// Whether messages past what was already printed exist.
    pub fn behind(&self, version: u64) -> bool {
        version > self.seen
    }

    /// Last version printed; pass to [`ChatHandle::entries_since`].
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Print `fresh`, the entries received after [`Self::seen`].
    pub fn print<W: Write>(&mut self, fresh: &[String], out: &mut W) -> io::Result<()> {
        if fresh.is_empty() {
            return Ok(());
        }
        for entry in fresh {
            write!(out, "{entry}{LINE_SEPARATOR}")?;
        }
        out.flush()?;
        self.seen += fresh.len() as u64;
        Ok(())
    }
}

/// Status line for a state change.
fn state_banner(state: SessionState) -> String {
    format!("[{state}]")
}

/// Feedback for a send the transport refused. Every other outcome is silent.
fn outcome_notice(outcome: SendOutcome) -> Option<&'static str> {
    match outcome {
        SendOutcome::Rejected => Some("[send failed]"),
        SendOutcome::NotOpen => {
            debug!("input ignored, session not open");
            None
        }
        SendOutcome::Sent | SendOutcome::Blank => None,
    }
}

/// Drive the session from stdin until it reaches `Closed`.
///
/// End of input and Ctrl-C both request a graceful close.
pub async fn run(handle: ChatHandle) -> Result<()> {
    let mut views = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printer = TranscriptPrinter::default();
    let mut last_state = None;
    let mut input_open = true;

    loop {
        let (state, version) = {
            let view = views.borrow_and_update();
            (view.state, view.version)
        };
        if printer.behind(version) {
            let fresh = handle.entries_since(printer.seen()).await;
            printer.print(&fresh, &mut io::stdout().lock())?;
        }
        if last_state != Some(state) {
            eprintln!("{}", state_banner(state));
            last_state = Some(state);
        }
        if state.is_terminal() {
            break;
        }

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line(), if input_open => match line? {
                Some(line) => {
                    if let Some(notice) = outcome_notice(handle.submit(line).await) {
                        eprintln!("{notice}");
                    }
                }
                None => {
                    debug!("stdin closed");
                    input_open = false;
                    handle.close().await;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                debug!("interrupted");
                handle.close().await;
            }
        }
    }

    handle.join().await;
    Ok(())
}
