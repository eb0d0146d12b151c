//! Out-of-band command input: a background listener turns text into
//! [`Command`]s and the main loop drains them once per frame.

use std::{
    io::{self, BufRead},
    thread,
};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{interaction::Command, types::RunFlag};

/// Yields transcripts or typed lines. `Ok(None)` means the source closed.
pub trait CommandSource: Send {
    fn next_text(&mut self) -> Result<Option<String>>;
}

/// Line-oriented source over any buffered reader.
pub struct LineSource<R> {
    reader: R,
}

impl<R: BufRead + Send> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl LineSource<io::BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(io::BufReader::new(io::stdin()))
    }
}

impl<R: BufRead + Send> CommandSource for LineSource<R> {
    fn next_text(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("failed to read command line")?;
        Ok((read > 0).then_some(line))
    }
}

/// Consumer side of the command queue, owned by the main loop.
pub struct CommandQueue {
    rx: Receiver<Command>,
}

impl CommandQueue {
    pub fn new() -> (Sender<Command>, Self) {
        let (tx, rx) = unbounded();
        (tx, Self { rx })
    }

    /// Everything queued so far, oldest first. Never blocks.
    pub fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}

/// Spawns a detached thread reading `source` until it closes or `running`
/// is cleared. The flag is checked between reads, so a source blocked in a
/// read only notices shutdown after its next line.
pub fn spawn_command_listener<S>(
    mut source: S,
    tx: Sender<Command>,
    running: RunFlag,
) -> Result<thread::JoinHandle<()>>
where
    S: CommandSource + 'static,
{
    thread::Builder::new()
        .name("command-listener".into())
        .spawn(move || {
            while running.is_running() {
                let text = match source.next_text() {
                    Ok(Some(text)) => text,
                    Ok(None) => {
                        log::info!("command source closed");
                        break;
                    }
                    Err(err) => {
                        log::error!("command source failed: {err:?}");
                        break;
                    }
                };
                match Command::from_input(&text) {
                    Some(command) => {
                        log::debug!("command {command:?} from {:?}", text.trim());
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    None if text.trim().is_empty() => {}
                    None => log::debug!("unrecognised command text {:?}", text.trim()),
                }
            }
        })
        .context("failed to spawn command listener")
}
