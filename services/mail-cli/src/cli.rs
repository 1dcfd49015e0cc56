//! Command-line parsing
//!
//! Flags (`--config <path>`, `--metrics`) may appear anywhere; the first
//! remaining word selects the command.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

pub const USAGE: &str = "\
usage: mail-cli [--config <path>] [--metrics] <command>

commands:
  login [username]          sign in (password from MAIL_PASSWORD or password_file)
  logout                    sign out and forget the stored session
  whoami                    show the signed-in user
  emails [page]             list the inbox
  email <id>                show one email
  download <id> <path>      save an attachment to a file
  aliases                   list your aliases
  help                      show this message";

/// Default page size for listings.
pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: Option<String> },
    Logout,
    Whoami,
    Emails { page: u32 },
    Email { id: u64 },
    Download { id: u64, output: PathBuf },
    Aliases,
    Help,
}

impl Command {
    /// Whether the command needs a signed-in session to be useful.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Help | Command::Logout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub config_path: Option<String>,
    pub print_metrics: bool,
    pub command: Command,
}

/// Parse arguments, excluding the program name.
pub fn parse<I, S>(args: I) -> Result<Invocation>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut config_path = None;
    let mut print_metrics = false;
    let mut help = false;
    let mut words = Vec::new();

    let mut args = args.into_iter().map(Into::into);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().context("--config requires a path")?;
                config_path = Some(value);
            }
            "--metrics" => print_metrics = true,
            "-h" | "--help" => help = true,
            other if other.starts_with("--") => bail!("unknown flag: {other}"),
            _ => words.push(arg),
        }
    }

    if help {
        return Ok(Invocation {
            config_path,
            print_metrics,
            command: Command::Help,
        });
    }

    let mut words = words.into_iter();
    let command = match words.next().as_deref() {
        None | Some("help") => Command::Help,
        Some("login") => Command::Login {
            username: words.next(),
        },
        Some("logout") => Command::Logout,
        Some("whoami") => Command::Whoami,
        Some("emails") => Command::Emails {
            page: match words.next() {
                Some(p) => p
                    .parse()
                    .with_context(|| format!("page must be a number, got: {p}"))?,
                None => 0,
            },
        },
        Some("email") => Command::Email {
            id: parse_id(words.next())?,
        },
        Some("download") => {
            let id = parse_id(words.next())?;
            let output = words
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("download requires an output path"))?;
            Command::Download { id, output }
        }
        Some("aliases") => Command::Aliases,
        Some(other) => bail!("unknown command: {other}"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument: {extra}");
    }

    Ok(Invocation {
        config_path,
        print_metrics,
        command,
    })
}

fn parse_id(word: Option<String>) -> Result<u64> {
    let word = word.ok_or_else(|| anyhow!("missing id"))?;
    word.parse()
        .with_context(|| format!("id must be a number, got: {word}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_is_help() {
        let invocation = parse(Vec::<String>::new()).unwrap();
        assert_eq!(invocation.command, Command::Help);
        assert!(invocation.config_path.is_none());
        assert!(!invocation.print_metrics);
    }

    #[test]
    fn flags_anywhere() {
        let invocation = parse(["emails", "--config", "/etc/mail.toml", "2", "--metrics"]).unwrap();
        assert_eq!(invocation.command, Command::Emails { page: 2 });
        assert_eq!(invocation.config_path.as_deref(), Some("/etc/mail.toml"));
        assert!(invocation.print_metrics);
    }

    #[test]
    fn login_with_and_without_username() {
        assert_eq!(
            parse(["login", "ann"]).unwrap().command,
            Command::Login {
                username: Some("ann".into())
            }
        );
        assert_eq!(
            parse(["login"]).unwrap().command,
            Command::Login { username: None }
        );
    }

    #[test]
    fn download_needs_id_and_path() {
        assert_eq!(
            parse(["download", "7", "out.pdf"]).unwrap().command,
            Command::Download {
                id: 7,
                output: PathBuf::from("out.pdf")
            }
        );
        let err = parse(["download", "7"]).unwrap_err();
        assert!(err.to_string().contains("output path"), "got: {err}");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(["email", "abc"]).is_err());
        assert!(parse(["email"]).is_err());
        assert!(parse(["emails", "-1"]).is_err());
        assert!(parse(["frobnicate"]).is_err());
        assert!(parse(["--verbose"]).is_err());
        assert!(parse(["--config"]).is_err());
        assert!(parse(["whoami", "extra"]).is_err());
    }

    #[test]
    fn help_flag_wins() {
        assert_eq!(parse(["emails", "--help"]).unwrap().command, Command::Help);
    }

    #[test]
    fn session_requirements() {
        assert!(!Command::Help.needs_session());
        assert!(!Command::Login { username: None }.needs_session());
        assert!(Command::Whoami.needs_session());
        assert!(Command::Email { id: 1 }.needs_session());
    }
}
