use std::borrow::Cow;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One slash-command line, kept verbatim from the body it was found in.
pub struct Command {
    text: String,
    cmd: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut tokens = text.split_whitespace().map(str::to_string);
        let cmd = tokens.next().unwrap_or_default();
        let args = tokens.collect();
        Self { text, cmd, args }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A command selected by a prefix query, with arguments recomputed from the
/// text that follows the prefix.
pub struct CommandMatch<'a> {
    pub command: &'a Command,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered commands extracted from one body, in line order.
pub struct CommandSet {
    commands: Vec<Command>,
}

impl CommandSet {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Tokenizes an optional body; a missing body yields an empty set.
    pub fn from_body(body: Option<&str>) -> Self {
        Self::new(tokenize_body(body.unwrap_or_default()))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Returns every command whose text starts with `prefix`, in order.
    ///
    /// Arguments are re-split from the remainder after the prefix so that
    /// multi-word prefixes such as `/needs triage` leave only what follows.
    pub fn prefix(&self, prefix: &str) -> Vec<CommandMatch<'_>> {
        self.commands
            .iter()
            .filter_map(|command| {
                let remainder = command.text.strip_prefix(prefix)?;
                Some(CommandMatch {
                    command,
                    args: split_args(remainder),
                })
            })
            .collect()
    }

    /// Like [`CommandSet::prefix`], but the prefix must end at a word
    /// boundary: `/triage` matches `/triage a` and `/triage`, never
    /// `/triage-remove a`.
    pub fn word_prefix(&self, prefix: &str) -> Vec<CommandMatch<'_>> {
        self.prefix(prefix)
            .into_iter()
            .filter(|matched| {
                matched.command.text[prefix.len()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
            })
            .collect()
    }

    /// Flattens the recomputed arguments of every `prefix` match.
    pub fn prefix_args(&self, prefix: &str) -> Vec<String> {
        self.prefix(prefix)
            .into_iter()
            .flat_map(|matched| matched.args)
            .collect()
    }
}

fn split_args(remainder: &str) -> Vec<String> {
    remainder.split_whitespace().map(str::to_string).collect()
}

/// Splits a body into lines, accepting LF, CRLF, and bare CR endings.
///
/// CRLF produces an extra empty line; callers skip blank lines anyway.
pub fn body_lines(body: &str) -> impl Iterator<Item = &str> {
    body.split(['\n', '\r'])
}

/// Removes the region from the first `<!--` through the first `-->` after it.
///
/// Only that single region is removed. Later comment blocks stay in the
/// body, so slash lines inside them are still seen as commands.
pub fn strip_first_comment_block(body: &str) -> Cow<'_, str> {
    let Some(start) = body.find(COMMENT_OPEN) else {
        return Cow::Borrowed(body);
    };
    let search_from = start + COMMENT_OPEN.len();
    let Some(end) = body[search_from..].find(COMMENT_CLOSE) else {
        return Cow::Borrowed(body);
    };
    let end = search_from + end + COMMENT_CLOSE.len();
    let mut stripped = String::with_capacity(body.len() - (end - start));
    stripped.push_str(&body[..start]);
    stripped.push_str(&body[end..]);
    Cow::Owned(stripped)
}

/// Extracts one [`Command`] per line that starts with `/` followed by at
/// least one character. Mid-line slashes are ignored.
pub fn tokenize_body(body: &str) -> Vec<Command> {
    let stripped = strip_first_comment_block(body);
    body_lines(&stripped)
        .filter(|line| is_command_line(line))
        .map(Command::new)
        .collect()
}

fn is_command_line(line: &str) -> bool {
    line.strip_prefix('/')
        .is_some_and(|rest| !rest.is_empty())
}
