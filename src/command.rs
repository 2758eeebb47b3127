//! Commands reachable from the `:` palette.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Open the Quick Link picker.
    QuickLink,
    /// Replace the selection with `[[|selection]]`.
    AliasTemplate,
    Save,
    Quit,
    Help,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDef {
    pub id: &'static str,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub command: Command,
}

pub const COMMANDS: &[CommandDef] = &[
    CommandDef {
        id: "use-selected-word-as-alias",
        name: "Quick Link: insert an internal link",
        aliases: &["ql"],
        command: Command::QuickLink,
    },
    CommandDef {
        id: "insert-alias-template",
        name: "Quick Link: insert alias template",
        aliases: &[],
        command: Command::AliasTemplate,
    },
    CommandDef {
        id: "write",
        name: "Save",
        aliases: &["w"],
        command: Command::Save,
    },
    CommandDef {
        id: "quit",
        name: "Quit",
        aliases: &["q"],
        command: Command::Quit,
    },
    CommandDef {
        id: "help",
        name: "Help",
        aliases: &["h"],
        command: Command::Help,
    },
];

/// Look a command up by id, alias or display name (case-insensitive).
pub fn resolve(input: &str) -> Option<Command> {
    let wanted = unquote(input);
    if wanted.is_empty() {
        return None;
    }

    COMMANDS
        .iter()
        .find(|def| {
            def.id.eq_ignore_ascii_case(&wanted)
                || def.name.eq_ignore_ascii_case(&wanted)
                || def.aliases.iter().any(|a| a.eq_ignore_ascii_case(&wanted))
        })
        .map(|def| def.command)
}

pub fn help_lines() -> Vec<String> {
    let mut lines = vec!["commands:".to_string()];
    for def in COMMANDS {
        let mut line = format!("  {} ({})", def.id, def.name);
        if !def.aliases.is_empty() {
            line.push_str(&format!(" alias: {}", def.aliases.join(", ")));
        }
        lines.push(line);
    }
    lines
}

/// Strip one level of matching quotes and backslash escapes.
fn unquote(raw: &str) -> String {
    let input = raw.trim();
    let Some(first) = input.chars().next() else {
        return String::new();
    };

    if input.len() < 2 || (first != '"' && first != '\'') || !input.ends_with(first) {
        return input.to_string();
    }

    let inner = &input[1..input.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;

    for ch in inner.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }

    if escaped {
        out.push('\\');
    }

    out.trim().to_string()
}
