//! Line protocol spoken with the remote-controlled decoder (mpg123 `-R`
//! style): one command per line in, two-token status lines out.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Pause,
    Stop,
    Quit,
}

impl Command {
    /// The command as sent on the wire, newline included.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Load(path) => write!(f, "LOAD {}", path.display()),
            Command::Pause => f.write_str("PAUSE"),
            Command::Stop => f.write_str("STOP"),
            Command::Quit => f.write_str("QUIT"),
        }
    }
}

/// Play-state code that marks the end of a track (or an acknowledged stop).
pub const PLAY_STATE_STOPPED: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Decoder accepts commands.
    Ready,
    /// A file was opened.
    Loaded,
    /// Playback reached the end or was stopped.
    Stopped,
    /// Paused/resumed; the decoder owns that state.
    PlayState(String),
    /// Decoder-reported problem, kept for the log.
    Error(String),
    Other(String),
}

impl Status {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let (class, detail) = match line.split_once(char::is_whitespace) {
            Some((class, detail)) => (class, detail.trim()),
            None => (line, ""),
        };
        match class {
            "@R" => Status::Ready,
            "@I" => Status::Loaded,
            "@P" => {
                let code = detail.split_whitespace().next().unwrap_or("");
                if code == PLAY_STATE_STOPPED {
                    Status::Stopped
                } else {
                    Status::PlayState(code.to_string())
                }
            }
            "@E" => Status::Error(detail.to_string()),
            _ => Status::Other(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_render_one_line_each() {
        assert_eq!(Command::Load(PathBuf::from("/music/a song.mp3")).to_line(), "LOAD /music/a song.mp3\n");
        assert_eq!(Command::Pause.to_line(), "PAUSE\n");
        assert_eq!(Command::Stop.to_line(), "STOP\n");
        assert_eq!(Command::Quit.to_line(), "QUIT\n");
    }

    #[test]
    fn status_lines_classify_by_leading_token() {
        assert_eq!(Status::parse("@R MPG123 (ThOr) v10\n"), Status::Ready);
        assert_eq!(Status::parse("@I ID3:title"), Status::Loaded);
        assert_eq!(Status::parse("@P 0"), Status::Stopped);
        assert_eq!(Status::parse("@P 1"), Status::PlayState("1".to_string()));
        assert_eq!(Status::parse("@E No stream opened"), Status::Error("No stream opened".to_string()));
        assert_eq!(Status::parse("@F 12 34 0.3 0.9"), Status::Other("@F 12 34 0.3 0.9".to_string()));
    }

    #[test]
    fn bare_tokens_and_crlf_are_tolerated() {
        assert_eq!(Status::parse("@R\r\n"), Status::Ready);
        assert_eq!(Status::parse("@P"), Status::PlayState(String::new()));
        assert_eq!(Status::parse(""), Status::Other(String::new()));
    }
}
