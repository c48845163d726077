//! Line commands understood by the prompt

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { identifier: String, password: String },
    Logout,
    Reset { contact: String },
    Status,
    Path,
    Level(u32),
    Rewards,
    Redeem(String),
    History,
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  login <username|email> <password>   sign in
  logout                              sign out
  reset <mobile|email>                request a password reset
  status                              level, points and current theme
  path                                level path around the viewed level
  level <n>                           view a level you have reached
  rewards                             list rewards
  redeem <reward id>                  redeem an available reward
  history                             points history
  refresh                             reload rewards and themes
  help                                show this text
  quit                                exit";

impl Command {
    /// Parse a line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("login", [identifier, password]) => Command::Login {
                identifier: identifier.to_string(),
                password: password.to_string(),
            },
            ("login", _) => return Err("usage: login <username|email> <password>".into()),
            ("logout", []) => Command::Logout,
            ("reset", [contact]) => Command::Reset {
                contact: contact.to_string(),
            },
            ("reset", _) => return Err("usage: reset <mobile|email>".into()),
            ("status", []) => Command::Status,
            ("path", []) => Command::Path,
            ("level", [n]) => Command::Level(
                n.parse()
                    .map_err(|_| format!("'{}' is not a level number", n))?,
            ),
            ("level", _) => return Err("usage: level <n>".into()),
            ("rewards", []) => Command::Rewards,
            ("redeem", [id]) => Command::Redeem(id.to_string()),
            ("redeem", _) => return Err("usage: redeem <reward id>".into()),
            ("history", []) => Command::History,
            ("refresh", []) => Command::Refresh,
            ("help", _) | ("?", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            (other, _) => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}
