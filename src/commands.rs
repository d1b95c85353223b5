/// Command palette entries and autocomplete ranking

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Jobs,
  Invoices,
  Clients,
  Refresh,
  ClearCache,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  pub kind: CommandKind,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "jobs",
    aliases: &["j", "job"],
    description: "Service jobs",
    kind: CommandKind::Jobs,
  },
  Command {
    name: "invoices",
    aliases: &["i", "inv", "invoice"],
    description: "Invoices and balances",
    kind: CommandKind::Invoices,
  },
  Command {
    name: "clients",
    aliases: &["c", "client"],
    description: "Client accounts",
    kind: CommandKind::Clients,
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Refetch the current page",
    kind: CommandKind::Refresh,
  },
  Command {
    name: "clear-cache",
    aliases: &["cc", "purge"],
    description: "Drop every cached page",
    kind: CommandKind::ClearCache,
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit servedash",
    kind: CommandKind::Quit,
  },
];

/// Resolve a typed command by exact name or alias.
pub fn lookup(input: &str) -> Option<&'static Command> {
  let input = input.trim().to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == input || cmd.aliases.contains(&input.as_str()))
}

/// Lower is better; None means no match at all.
fn rank(cmd: &Command, input: &str) -> Option<u8> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();
  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u8)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input).map(|r| (cmd, r)))
    .collect();
  // Stable sort keeps declaration order within a rank
  matches.sort_by_key(|(_, r)| *r);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
