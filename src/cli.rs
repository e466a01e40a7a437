//! Minimal CLI parsing for the server binary.

use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// Run the HTTP server
    #[default]
    Serve,
    /// Print the assembled schema as SDL and exit
    PrintSchema,
    /// Create a superuser and print a session token for it
    CreateSuperuser {
        username: String,
        email: Option<String>,
    },
    Help,
}

#[derive(Debug, Default)]
pub struct CliOptions {
    pub command: Command,
}

pub const USAGE: &str = "\
Usage: superapp-graphql [COMMAND]

Commands:
  serve                               Run the HTTP server (default)
  print-schema                        Print the assembled GraphQL schema
  create-superuser <username> [email] Create a superuser and print a session token
";

impl CliOptions {
    pub fn from_args() -> Result<Self, String> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut args = args.into_iter();
        let command = match args.next().as_deref() {
            None | Some("serve") => Command::Serve,
            Some("print-schema") => Command::PrintSchema,
            Some("create-superuser") => {
                let username = args
                    .next()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or_else(|| "create-superuser requires a username".to_string())?;
                Command::CreateSuperuser {
                    username,
                    email: args.next(),
                }
            }
            Some("-h") | Some("--help") | Some("help") => Command::Help,
            Some(other) => return Err(format!("unknown command: {}", other)),
        };

        if let Some(extra) = args.next() {
            return Err(format!("unexpected argument: {}", extra));
        }

        Ok(Self { command })
    }
}
