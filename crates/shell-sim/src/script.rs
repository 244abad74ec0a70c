//! Session scripts
//!
//! One command per line, `#` starts a comment:
//!
//! ```text
//! launch app://clock.local/manifest.webapp
//! wait 500
//! activity app://gallery.local app://gallery.local/pick.html
//! activity-done
//! home
//! ```

use std::path::Path;
use std::time::Duration;

use window_manager::{ActivityRequest, Inbound};

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: `{command}` expects {expected}")]
    BadArguments {
        line: usize,
        command: String,
        expected: &'static str,
    },

    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Send(Inbound),
    Wait(Duration),
}

pub fn load(path: &Path) -> Result<Vec<Step>, ScriptError> {
    parse(&std::fs::read_to_string(path)?)
}

pub fn parse(source: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let text = raw.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        let line = index + 1;
        let mut words = text.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let args: Vec<&str> = words.collect();
        let bad = |expected| ScriptError::BadArguments {
            line,
            command: command.to_string(),
            expected,
        };

        let step = match (command, args.as_slice()) {
            ("boot", []) => Step::Send(Inbound::Boot),
            ("launch", [manifest_url]) => Step::Send(Inbound::Launch {
                manifest_url: manifest_url.to_string(),
                url: None,
            }),
            ("launch", [manifest_url, url]) => Step::Send(Inbound::Launch {
                manifest_url: manifest_url.to_string(),
                url: Some(url.to_string()),
            }),
            ("launch", _) => return Err(bad("<manifest_url> [url]")),
            ("open" | "background", [manifest_url, url]) => Step::Send(Inbound::OpenAppMessage {
                manifest_url: manifest_url.to_string(),
                url: url.to_string(),
                background: command == "background",
            }),
            ("open" | "background", _) => return Err(bad("<manifest_url> <url>")),
            ("window", [url, name]) => Step::Send(Inbound::OpenNamedWindow {
                url: url.to_string(),
                name: name.to_string(),
                opener: None,
            }),
            ("window", _) => return Err(bad("<url> <name>")),
            ("display", [origin]) => Step::Send(Inbound::Display {
                origin: Some(origin.to_string()),
            }),
            ("display", _) => return Err(bad("<origin>")),
            ("home", []) => Step::Send(Inbound::HomePressed),
            ("kill", [origin]) => Step::Send(Inbound::Kill {
                origin: origin.to_string(),
            }),
            ("kill", _) => return Err(bad("<origin>")),
            ("uninstall", [manifest_url]) => Step::Send(Inbound::Uninstall {
                manifest_url: manifest_url.to_string(),
            }),
            ("uninstall", _) => return Err(bad("<manifest_url>")),
            ("activity", [origin, url]) => Step::Send(Inbound::StartInlineActivity(ActivityRequest {
                origin: origin.to_string(),
                manifest_url: format!("{origin}/manifest.webapp"),
                url: url.to_string(),
            })),
            ("activity", _) => return Err(bad("<origin> <url>")),
            ("activity-done", []) => Step::Send(Inbound::ActivityDone),
            ("lock", []) => Step::Send(Inbound::SetLocked(true)),
            ("unlock", []) => Step::Send(Inbound::SetLocked(false)),
            ("viewport", [width, height]) => {
                let (Ok(width), Ok(height)) = (width.parse(), height.parse()) else {
                    return Err(bad("<width> <height>"));
                };
                Step::Send(Inbound::SetViewport { width, height })
            }
            ("keyboard", [height]) => match height.parse() {
                Ok(height) => Step::Send(Inbound::SetKeyboardHeight(height)),
                Err(_) => return Err(bad("<height>")),
            },
            ("wait", [ms]) => match ms.parse() {
                Ok(ms) => Step::Wait(Duration::from_millis(ms)),
                Err(_) => return Err(bad("<milliseconds>")),
            },
            ("boot" | "home" | "activity-done" | "lock" | "unlock", _) => {
                return Err(bad("no arguments"));
            }
            ("viewport", _) => return Err(bad("<width> <height>")),
            ("keyboard", _) => return Err(bad("<height>")),
            ("wait", _) => return Err(bad("<milliseconds>")),
            _ => {
                return Err(ScriptError::UnknownCommand {
                    line,
                    command: command.to_string(),
                });
            }
        };
        steps.push(step);
    }

    Ok(steps)
}
