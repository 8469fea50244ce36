//! Line-oriented command language of the shell.

use lifeline_coordinator::BlogRef;
use lifeline_notifications::DeviceToken;
use lifeline_reachability::{ProbeError, ReachabilityFlags, TargetKind};
use serde_json::Value;

pub const HELP: &str = "\
commands:
  launch [json]              app launched, optionally from a push payload
  foreground | background    lifecycle transitions
  ui-ready                   UI finished initializing
  push <json>                push payload arrives
  token <hex>                push registration returned a device token
  alert <title>|<message>    request an alert
  dismiss                    dismiss the visible alert
  check                      request a session check
  auth accept|reject|fail    what the next session checks answer
  blog <id> <url> | blog none
  net internet|remote|blog wifi|cellular|down|error
  upload-begin | upload-end | expire
  wipe                       forget credentials
  status                     print the current snapshot
  quit";

/// What the next session checks should answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    Accept,
    Reject,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Launch(Option<Value>),
    Foreground,
    Background,
    UiReady,
    Push(Value),
    Token(DeviceToken),
    Alert { title: String, message: String },
    Dismiss,
    Check,
    Auth(AuthVerdict),
    Blog(Option<BlogRef>),
    Net {
        target: TargetKind,
        observation: Result<ReachabilityFlags, ProbeError>,
    },
    UploadBegin,
    UploadEnd,
    Expire,
    Wipe,
    Status,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        let command = match word {
            "launch" if rest.is_empty() => Command::Launch(None),
            "launch" => Command::Launch(Some(json(rest)?)),
            "foreground" | "fg" => Command::Foreground,
            "background" | "bg" => Command::Background,
            "ui-ready" => Command::UiReady,
            "push" => Command::Push(json(rest)?),
            "token" => Command::Token(
                DeviceToken::parse(rest).ok_or_else(|| format!("invalid device token: {rest}"))?,
            ),
            "alert" => {
                let (title, message) = rest.split_once('|').unwrap_or((rest, ""));
                if title.trim().is_empty() {
                    return Err("usage: alert <title>|<message>".to_string());
                }
                Command::Alert {
                    title: title.trim().to_string(),
                    message: message.trim().to_string(),
                }
            }
            "dismiss" => Command::Dismiss,
            "check" => Command::Check,
            "auth" => Command::Auth(match rest {
                "accept" => AuthVerdict::Accept,
                "reject" => AuthVerdict::Reject,
                "fail" => AuthVerdict::Fail,
                _ => return Err("usage: auth accept|reject|fail".to_string()),
            }),
            "blog" => Command::Blog(blog(rest)?),
            "net" => net(rest)?,
            "upload-begin" => Command::UploadBegin,
            "upload-end" => Command::UploadEnd,
            "expire" => Command::Expire,
            "wipe" => Command::Wipe,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(command)
    }
}

fn json(text: &str) -> Result<Value, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))
}

fn blog(rest: &str) -> Result<Option<BlogRef>, String> {
    if rest == "none" {
        return Ok(None);
    }
    let (id, url) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| "usage: blog <id> <url> | blog none".to_string())?;
    let id = id
        .parse::<u64>()
        .map_err(|_| format!("invalid blog id: {id}"))?;
    Ok(Some(BlogRef::new(id, url.trim())))
}

fn net(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "usage: net internet|remote|blog wifi|cellular|down|error";
    let mut parts = rest.split_whitespace();
    let target = match parts.next() {
        Some("internet") => TargetKind::Internet,
        Some("remote") => TargetKind::RemoteService,
        Some("blog") => TargetKind::CurrentBlog,
        _ => return Err(USAGE.to_string()),
    };
    let observation = match parts.next() {
        Some("wifi") => Ok(ReachabilityFlags::wifi()),
        Some("cellular") => Ok(ReachabilityFlags::cellular()),
        Some("down") => Ok(ReachabilityFlags::unreachable()),
        Some("error") => Err(ProbeError::Query("simulated failure".to_string())),
        _ => return Err(USAGE.to_string()),
    };
    Ok(Command::Net {
        target,
        observation,
    })
}
