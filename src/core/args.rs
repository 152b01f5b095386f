use clap::{Parser, Subcommand};
use log::kv::{ToValue, Value};

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    #[arg(short, long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Clone, Copy)]
pub enum Command {
    /// Serve the benchmark API over HTTP (default).
    Serve,
    /// Run the full matrix once and print the report as JSON.
    Run,
    /// Run every cell repeatedly and print timing statistics as JSON.
    Repeat,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = CliArgs::parse_from(["self", "--config", "foo"]);
        assert_eq!(
            args,
            CliArgs {
                config: Some("foo".to_string()),
                command: None,
            }
        );
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn test_subcommand_parsing() {
        let args = CliArgs::parse_from(["self", "repeat"]);
        assert_eq!(args.config, None);
        assert_eq!(args.command(), Command::Repeat);
    }
}
