//! Line-oriented command parsing for the interactive mode.
//!
//! Lines starting with `:` are commands; anything else is the new contents
//! of the search box.

use anyhow::{anyhow, bail, Context, Result};

use crate::app::Command;

pub fn parse_line(line: &str) -> Result<Command> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);

    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Input(line.trim().to_string()));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match name.as_str() {
        "page" | "p" => Command::Page(number(&name, &args)?),
        "next" | "n" => Command::NextPage,
        "prev" => Command::PrevPage,
        "open" | "o" => Command::Open(number(&name, &args)?),
        "back" | "b" => Command::Back,
        "save" | "unsave" | "s" => Command::ToggleBookmark(number(&name, &args)?),
        "saved" => Command::ShowBookmarks,
        "filter" | "f" => {
            if args.is_empty() {
                bail!("Usage: :filter key=value ... (type, status, rating, score)");
            }
            let pairs = args
                .iter()
                .map(|arg| {
                    arg.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .ok_or_else(|| anyhow!("Expected key=value, got {}", arg))
                })
                .collect::<Result<Vec<_>>>()?;
            Command::Filter(pairs)
        }
        "clear-filters" | "clear" => Command::ClearFilters,
        "dismiss" => Command::DismissError,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        "" => bail!("Missing command after ':'"),
        other => bail!("Unknown command :{} (try :help)", other),
    };

    Ok(command)
}

fn number(name: &str, args: &[&str]) -> Result<u32> {
    let arg = args
        .first()
        .ok_or_else(|| anyhow!("Usage: :{} N", name))?;
    arg.parse()
        .with_context(|| format!("Not a number: {}", arg))
}
