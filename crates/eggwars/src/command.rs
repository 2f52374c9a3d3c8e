//! Chat command table.
//!
//! The registry only parses. It turns a raw line like `join islands` into
//! a [`Command`], and [`crate::GameManager`] runs it.
//!
//! ```text
//! "/join islands" ──► CommandRegistry::parse ──► Command::Join("islands")
//!                                                      │
//!                                  GameManager::dispatch ◄┘
//! ```

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Join(String),
    Leave,
    ListArenas,
    ShowStats,
    Help,
}

/// Why a command line couldn't be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    /// Right command, wrong arguments. Carries the usage line.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub description: &'static str,
    parse: fn(&[&str]) -> Option<Command>,
}

impl CommandEntry {
    fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }
}

const COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "join",
        aliases: &[],
        usage: "/join <arena>",
        description: "Join an arena",
        parse: |args| match args {
            [arena] => Some(Command::Join((*arena).to_string())),
            _ => None,
        },
    },
    CommandEntry {
        name: "leave",
        aliases: &[],
        usage: "/leave",
        description: "Leave your current arena",
        parse: |args| args.is_empty().then_some(Command::Leave),
    },
    CommandEntry {
        name: "arenas",
        aliases: &["list-arenas", "list"],
        usage: "/arenas",
        description: "List available arenas",
        parse: |args| args.is_empty().then_some(Command::ListArenas),
    },
    CommandEntry {
        name: "stats",
        aliases: &["show-stats", "ewstats"],
        usage: "/stats",
        description: "Show your statistics",
        parse: |args| args.is_empty().then_some(Command::ShowStats),
    },
    CommandEntry {
        name: "help",
        aliases: &["?"],
        usage: "/help",
        description: "Show this list",
        parse: |_| Some(Command::Help),
    },
];

/// The set of chat commands a player can run.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandEntry>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a chat line. A leading `/` is optional and the command word
    /// is case-insensitive.
    ///
    /// # Errors
    /// Returns [`CommandError`] for blank lines, unknown commands and
    /// wrong argument counts.
    pub fn parse(&self, line: &str) -> Result<Command, CommandError> {
        let line = line.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        let mut words = line.split_whitespace();
        let word = words.next().ok_or(CommandError::Empty)?.to_lowercase();
        let args: Vec<&str> = words.collect();

        let entry = self
            .commands
            .iter()
            .find(|entry| entry.matches(&word))
            .ok_or(CommandError::Unknown(word))?;
        (entry.parse)(&args).ok_or(CommandError::Usage(entry.usage))
    }

    pub fn commands(&self) -> &[CommandEntry] {
        &self.commands
    }

    /// One chat line per command, for `/help`.
    pub fn help_lines(&self) -> Vec<String> {
        let mut lines = vec!["§6§l━━━━━━ EggWars Commands ━━━━━━".to_string()];
        lines.extend(
            self.commands
                .iter()
                .map(|entry| format!("§e{} §7- {}", entry.usage, entry.description)),
        );
        lines
    }
}
