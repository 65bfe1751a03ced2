//! The interactive prompt loop
//!
//! A thin consumer of the engine's event stream: reads a line, forwards
//! every live delta to stdout as it arrives, and prints a token/cost
//! summary once the turn commits. Ctrl-C mid-stream cancels the turn;
//! the partial text stays on screen but is not part of the transcript.

use quill_engine::{Error, Session, SessionEngine, TurnEvent};
use std::io::{self, BufRead, IsTerminal, Write};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

const MULTILINE_MARKER: &str = "###";

/// First 8 bytes of the id for display; ids that are shorter or have a
/// char straddling the boundary are shown in full.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Read one user input. A line ending in `###` is sent with the marker
/// stripped; a lone `###` opens a block collected until the next `###`
/// line (or EOF). Returns `None` on EOF before any input.
fn read_input(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let first = line.trim();
    match first.strip_suffix(MULTILINE_MARKER) {
        None => return Ok(Some(first.to_string())),
        Some(rest) if !rest.trim().is_empty() => {
            return Ok(Some(rest.trim().to_string()));
        }
        Some(_) => {}
    }

    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim() == MULTILINE_MARKER {
            break;
        }
        lines.push(line.trim_end().to_string());
    }
    Ok(Some(lines.join("\n")))
}

pub async fn run(engine: &SessionEngine, mut session: Session) -> anyhow::Result<()> {
    if io::stderr().is_terminal() {
        eprintln!("quill ({}) session: {}", session.model, short_id(&session.id));
        eprintln!("Type 'exit' to quit. A lone '###' opens multi-line input, closed by '###'.");
        eprintln!();
    }

    // Show committed history when resuming, so uncommitted leftovers
    // from a previous run are clearly not part of it.
    for message in &session.messages {
        match message.role {
            quill_ai::Role::User => println!("you> {}", message.content),
            quill_ai::Role::Assistant => println!("{}\n", message.content),
        }
    }

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let input = match read_input(&mut io::stdin().lock())? {
            Some(input) => input,
            None => break, // EOF
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        let cancel = CancellationToken::new();
        let mut turn = match engine.submit_turn(&session, input, cancel.clone()) {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("error: {}", e);
                continue;
            }
        };

        println!();
        loop {
            let event = if cancel.is_cancelled() {
                turn.next().await
            } else {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        cancel.cancel();
                        continue;
                    }
                    event = turn.next() => event,
                }
            };

            let Some(event) = event else { break };
            match event {
                TurnEvent::Delta(delta) => {
                    print!("{}", delta);
                    io::stdout().flush()?;
                }
                TurnEvent::Completed {
                    session: committed,
                    usage,
                    cost,
                    persist_error,
                } => {
                    println!();
                    // Currency rounding happens here and only here.
                    println!(
                        "tokens: {} in / {} out | cost: ${:.4} | total: ${:.4}",
                        usage.input_tokens, usage.output_tokens, cost, committed.total_cost
                    );
                    println!();
                    if let Some(e) = persist_error {
                        eprintln!("warning: session was not saved: {}", e);
                    }
                    session = committed;
                    break;
                }
                TurnEvent::Failed(error) => {
                    println!();
                    match error {
                        Error::Cancelled => {
                            eprintln!("[cancelled; the partial reply above was not kept]");
                        }
                        other => {
                            eprintln!("error: {}", other);
                            eprintln!("[the turn was rolled back; type again to retry]");
                        }
                    }
                    println!();
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_short_id_truncates_long_ids() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
    }

    #[test]
    fn test_short_id_keeps_short_ids_whole() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn test_short_id_survives_char_straddling_the_boundary() {
        // 'é' occupies bytes 7..9, so byte index 8 is not a boundary.
        assert_eq!(short_id("abcdefgé"), "abcdefgé");
    }

    #[test]
    fn test_read_input_single_line() {
        let mut input = Cursor::new("hello\n");
        assert_eq!(read_input(&mut input).unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn test_read_input_eof_before_any_input() {
        let mut input = Cursor::new("");
        assert_eq!(read_input(&mut input).unwrap(), None);
    }

    #[test]
    fn test_read_input_trailing_marker_sends_the_line() {
        let mut input = Cursor::new("hello ###\n");
        assert_eq!(read_input(&mut input).unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn test_read_input_block_collects_until_marker() {
        let mut input = Cursor::new("###\nfirst line\nsecond line\n###\nafter\n");
        assert_eq!(
            read_input(&mut input).unwrap(),
            Some("first line\nsecond line".to_string())
        );
        // The terminator was consumed; the next read starts fresh.
        assert_eq!(read_input(&mut input).unwrap(), Some("after".to_string()));
    }

    #[test]
    fn test_read_input_block_ends_at_eof() {
        let mut input = Cursor::new("###\nonly\n");
        assert_eq!(read_input(&mut input).unwrap(), Some("only".to_string()));
    }
}
