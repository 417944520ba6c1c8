use std::io::{self, Write};
use std::process::{Command, Stdio};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Something that can put text on the user's clipboard.
pub trait Clipboard {
    fn name(&self) -> &'static str;
    fn copy(&self, text: &str) -> io::Result<()>;
}

/// Pipes the text into a platform clipboard tool.
pub struct CommandClipboard {
    program: &'static str,
    args: &'static [&'static str],
}

impl Clipboard for CommandClipboard {
    fn name(&self) -> &'static str {
        self.program
    }

    fn copy(&self, text: &str) -> io::Result<()> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{} exited with {status}", self.program)))
        }
    }
}

/// OSC 52 escape understood by most modern terminals, including over ssh.
pub struct TerminalClipboard;

impl Clipboard for TerminalClipboard {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn copy(&self, text: &str) -> io::Result<()> {
        let mut out = io::stdout();
        out.write_all(osc52_sequence(text).as_bytes())?;
        out.flush()
    }
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

pub fn default_clipboards() -> Vec<Box<dyn Clipboard>> {
    const COMMANDS: [(&str, &[&str]); 4] = [
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("pbcopy", &[]),
        ("clip", &[]),
    ];
    let mut boards: Vec<Box<dyn Clipboard>> = COMMANDS
        .iter()
        .map(|&(program, args)| {
            Box::new(CommandClipboard {
                program,
                args,
            }) as Box<dyn Clipboard>
        })
        .collect();
    boards.push(Box::new(TerminalClipboard));
    boards
}

/// Tries each clipboard in order and reports which one took the text.
pub fn copy_invite(text: &str, clipboards: &[Box<dyn Clipboard>]) -> io::Result<&'static str> {
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "no clipboard available");
    for board in clipboards {
        match board.copy(text) {
            Ok(()) => return Ok(board.name()),
            Err(err) => last_err = err,
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct FakeClipboard {
        name: &'static str,
        works: bool,
        copied: RefCell<Vec<String>>,
    }

    impl Clipboard for FakeClipboard {
        fn name(&self) -> &'static str {
            self.name
        }

        fn copy(&self, text: &str) -> io::Result<()> {
            if !self.works {
                return Err(io::Error::other("unavailable"));
            }
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn fake(name: &'static str, works: bool) -> Box<dyn Clipboard> {
        Box::new(FakeClipboard {
            name,
            works,
            copied: RefCell::new(Vec::new()),
        })
    }

    #[test]
    fn falls_back_to_next_clipboard() {
        let boards = vec![fake("primary", false), fake("legacy", true)];
        assert_eq!(copy_invite("join us", &boards).unwrap(), "legacy");
    }

    #[test]
    fn reports_failure_when_nothing_works() {
        let boards = vec![fake("primary", false)];
        assert!(copy_invite("join us", &boards).is_err());
        assert!(copy_invite("join us", &[]).is_err());
    }

    #[test]
    fn osc52_payload_is_base64() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
    }
}
