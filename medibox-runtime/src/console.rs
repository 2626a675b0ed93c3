//! Line-oriented console for the daemon.
//!
//! Each stdin line is parsed into a [`Command`] and executed against the
//! [`AppContext`]; the reply is plain text for stdout.

use std::fmt::Write as _;
use std::str::FromStr;

use medibox_core::{Medicine, NewReminder, ReminderId};
use medibox_data::error::LOAD_FAILED_MESSAGE;
use thiserror::Error;

use crate::context::AppContext;
use crate::session::SearchSession;

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  search <query>        search names and uses
  suggest <partial>     medicine name suggestions
  show <id>             medicine details
  add <HH:MM> <name>    daily reminder
  rm <reminder-id>      delete a reminder
  list                  reminders
  dismiss               hide the current notification
  help
  quit";

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Immediate search.
    Search(String),
    /// Name suggestions.
    Suggest(String),
    /// Medicine detail view.
    Show(u32),
    /// Create a reminder.
    Add {
        /// `HH:MM`.
        time: String,
        /// Free-text medicine name.
        name: String,
    },
    /// Delete a reminder.
    Remove(ReminderId),
    /// List reminders.
    List,
    /// Hide the visible notice.
    Dismiss,
    /// Print [`HELP`].
    Help,
    /// Leave the daemon.
    Quit,
}

/// Why a console line was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// First word is not a command.
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),
    /// Right command, wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "search" | "s" => Ok(Self::Search(rest.to_string())),
            "suggest" => Ok(Self::Suggest(rest.to_string())),
            "show" => rest
                .parse()
                .map(Self::Show)
                .map_err(|_| CommandError::Usage("show <id>")),
            "add" => {
                let (time, name) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Usage("add <HH:MM> <name>"))?;
                Ok(Self::Add {
                    time: time.to_string(),
                    name: name.trim().to_string(),
                })
            }
            "rm" | "remove" | "delete" => rest
                .parse()
                .map(|id| Self::Remove(ReminderId(id)))
                .map_err(|_| CommandError::Usage("rm <reminder-id>")),
            "list" | "ls" => Ok(Self::List),
            "dismiss" => Ok(Self::Dismiss),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Run `command` and render its reply.
///
/// `Quit` renders nothing; the caller decides to stop.
pub fn execute(context: &AppContext, session: &SearchSession, command: Command) -> String {
    match command {
        // Views that read the catalog are blocked when the dataset failed to load.
        Command::Search(_) | Command::Suggest(_) | Command::Show(_) if context.is_offline() => {
            LOAD_FAILED_MESSAGE.to_string()
        }
        Command::Search(query) => {
            let snapshot = session.search_now(query);
            if !snapshot.initiated {
                return format!(
                    "Type at least {} characters to search.",
                    context.config().search.min_query_chars
                );
            }
            if snapshot.results.is_empty() {
                return "No medicines found.".to_string();
            }
            render_list(&snapshot.results)
        }
        Command::Suggest(partial) => {
            let suggestions = session.suggestions(&partial);
            if suggestions.is_empty() {
                return "No suggestions.".to_string();
            }
            render_list(&suggestions)
        }
        Command::Show(id) => match context.catalog().get(id) {
            Some(medicine) => render_detail(medicine, context),
            None => format!("Medicine {id} not found."),
        },
        Command::Add { time, name } => {
            // Link the reminder to a catalog entry when the name is an exact match.
            let new = match context.catalog().find_by_name(&name) {
                Some(medicine) => NewReminder::for_medicine(medicine, time),
                None => NewReminder::new(name, time),
            };
            match context.add_reminder(new) {
                Ok(reminder) => format!(
                    "Reminder {} set for {} at {}.",
                    reminder.id, reminder.medicine_name, reminder.time
                ),
                Err(e) => e.to_string(),
            }
        }
        Command::Remove(id) => {
            if context.remove_reminder(id) {
                format!("Reminder {id} deleted.")
            } else {
                format!("Reminder {id} not found.")
            }
        }
        Command::List => {
            let reminders = context.list_reminders();
            if reminders.is_empty() {
                return "No reminders.".to_string();
            }
            let mut out = String::new();
            for reminder in reminders {
                let _ = writeln!(out, "{}\t{}\t{}", reminder.id, reminder.time, reminder.medicine_name);
            }
            out.trim_end().to_string()
        }
        Command::Dismiss => {
            context.notices().dismiss();
            String::new()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    }
}

fn render_list(medicines: &[Medicine]) -> String {
    let mut out = String::new();
    for medicine in medicines {
        let _ = writeln!(out, "{}\t{}\t{}", medicine.id, medicine.name, medicine.uses.join(", "));
    }
    out.trim_end().to_string()
}

fn render_detail(medicine: &Medicine, context: &AppContext) -> String {
    let substitutes: Vec<&str> = context
        .catalog()
        .substitutes_of(medicine.id)
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    let substitutes = if substitutes.is_empty() {
        medicine.substitutes.join(", ")
    } else {
        substitutes.join(", ")
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", medicine.name);
    let _ = writeln!(out, "  Uses:              {}", medicine.uses.join(", "));
    let _ = writeln!(out, "  Side effects:      {}", medicine.side_effects.join(", "));
    let _ = writeln!(out, "  Substitutes:       {substitutes}");
    let _ = writeln!(out, "  Chemical class:    {}", medicine.chemical_class);
    let _ = writeln!(
        out,
        "  Habit forming:     {}",
        if medicine.is_habit_forming() { "Yes" } else { "No" }
    );
    let _ = writeln!(out, "  Therapeutic class: {}", medicine.therapeutic_class);
    let _ = write!(out, "  Action class:      {}", medicine.action_class);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("search fever".parse::<Command>(), Ok(Command::Search("fever".into())));
        assert_eq!("  show 42 ".parse::<Command>(), Ok(Command::Show(42)));
        assert_eq!(
            "add 09:00 Vitamin D3".parse::<Command>(),
            Ok(Command::Add {
                time: "09:00".into(),
                name: "Vitamin D3".into()
            })
        );
        assert_eq!("rm 1717000000000".parse::<Command>(), Ok(Command::Remove(ReminderId(1_717_000_000_000))));
        assert_eq!("LIST".parse::<Command>(), Ok(Command::List));
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!("show abc".parse::<Command>(), Err(CommandError::Usage("show <id>")));
        assert_eq!("add 09:00".parse::<Command>(), Err(CommandError::Usage("add <HH:MM> <name>")));
        assert!(matches!("fly".parse::<Command>(), Err(CommandError::Unknown(_))));
    }
}
