use terminal_size::{terminal_size, Width};
use unicode_width::UnicodeWidthChar;

use crate::coerce::display_width;
use crate::constant::*;
use crate::model::{Kind, TypeHint};
use crate::parser::schema::Position;
use crate::parser::{OptionDescriptor, Schema, Target};

pub(crate) fn terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(width), _)| width as usize)
}

pub(crate) fn display_line(descriptor: &OptionDescriptor) -> String {
    format!("{}{}", columns(descriptor), tail(descriptor))
        .trim_end()
        .to_string()
}

// Everything before the help, padded to a fixed display width.
fn columns(descriptor: &OptionDescriptor) -> String {
    let hint = match descriptor.hint {
        TypeHint::None => String::default(),
        hint => hint.to_string(),
    };

    match descriptor.kind {
        Kind::Argument => {
            let argument = format!("{} [{}]", descriptor.name.to_uppercase(), descriptor.hint);
            format!("{MARGIN}{}", pad(&argument, ARGUMENT_WIDTH + 1))
        }
        Kind::Subcommand => format!("{MARGIN}{}", pad(&descriptor.name, ARGUMENT_WIDTH + 1)),
        Kind::Flip | Kind::Flag | Kind::Ignore => {
            let (short, short_hint) = match descriptor.short {
                Some(short) => (format!("-{short}"), hint.as_str()),
                None => (String::default(), ""),
            };
            let long = if hint.is_empty() {
                format!("--{}", descriptor.name)
            } else {
                format!("--{} {hint}", descriptor.name)
            };

            format!(
                "{MARGIN}{}{}{}",
                pad(&short, SHORT_WIDTH),
                pad(short_hint, HINT_WIDTH),
                pad(&long, LONG_WIDTH)
            )
        }
    }
}

fn tail(descriptor: &OptionDescriptor) -> String {
    let mut tail = descriptor.help.clone().unwrap_or_default();

    if !descriptor.choices.is_empty() {
        tail.push_str(&format!(" [{}]", descriptor.choices.join(" ")));
    }

    if let Some(default) = &descriptor.default_display {
        tail.push_str(&format!(" (default: {default})"));
    }

    tail.trim_start().to_string()
}

// Pad to `width` columns, always leaving at least one space.
fn pad(text: &str, width: usize) -> String {
    let used = display_width(text);
    let target = width.max(used + 1);
    format!("{text}{}", " ".repeat(target - used))
}

fn render(descriptor: &OptionDescriptor, terminal_width: Option<usize>) -> Vec<String> {
    let line = display_line(descriptor);

    let Some(terminal_width) = terminal_width else {
        return vec![line];
    };

    let columns = columns(descriptor);
    let indent = display_width(&columns);

    if display_width(&line) <= terminal_width || indent + MINIMUM_HELP_WIDTH > terminal_width {
        return vec![line];
    }

    let mut lines = Vec::default();

    for (index, chunk) in chunk(&tail(descriptor), terminal_width - indent)
        .into_iter()
        .enumerate()
    {
        if index == 0 {
            lines.push(format!("{columns}{chunk}"));
        } else {
            lines.push(format!("{}{chunk}", " ".repeat(indent)));
        }
    }

    lines
}

fn chunk(paragraph: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::default();
    let mut current = String::default();

    for word in paragraph.split(' ') {
        if !word.is_empty() {
            if current.is_empty() {
                hyphenate(width, &mut lines, &mut current, word);
            } else if display_width(&current) + display_width(word) < width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(current);
                current = String::default();
                hyphenate(width, &mut lines, &mut current, word);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn hyphenate(width: usize, lines: &mut Vec<String>, current: &mut String, word: &str) {
    let mut rest = word;

    while display_width(rest) > width {
        // One column is kept for the hyphen.
        let mut used = 0;
        let split = rest
            .char_indices()
            .find(|(_, c)| {
                used += c.width().unwrap_or(0);
                used > width - 1
            })
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let split = match split {
            0 => rest.chars().next().map(char::len_utf8).unwrap_or(rest.len()),
            split => split,
        };
        lines.push(format!("{}-", &rest[..split]));
        rest = &rest[split..];
    }

    current.push_str(rest);
}

impl<R: 'static> Schema<R> {
    pub(crate) fn usage_text(&self, program: &str, terminal_width: Option<usize>) -> String {
        let mut synopsis = format!("usage: {program}");

        if !self.flags.is_empty() {
            synopsis.push_str(" [OPTION]");
        }

        for slot in &self.positionals {
            synopsis.push(' ');
            synopsis.push_str(&slot.descriptor.label());
        }

        if !self.subcommands.is_empty() {
            synopsis.push_str(" [SUB]");
        }

        let mut lines = vec![synopsis];

        if let Some(help) = &self.help {
            lines.push(String::default());
            lines.push(help.clone());
        }

        if !self.flags.is_empty() {
            lines.push(String::default());
            lines.push("options:".to_string());

            for slot in &self.flags {
                lines.extend(render(&slot.descriptor, terminal_width));
            }
        }

        if !self.positionals.is_empty() || !self.subcommands.is_empty() {
            lines.push(String::default());
            lines.push("arguments:".to_string());

            for slot in self.positionals.iter().chain(self.subcommands.iter()) {
                lines.extend(render(&slot.descriptor, terminal_width));
            }
        }

        lines.join("\n")
    }

    /// The usage of the sub-command at `path`, or of this schema when the path is empty.
    pub(crate) fn scoped_usage(
        &self,
        program: &str,
        path: &[String],
        terminal_width: Option<usize>,
    ) -> String {
        if let Some((name, rest)) = path.split_first() {
            if let Some(Position::Subcommand(index)) = self.index.get(name) {
                if let Target::Subcommand(nest) = &self.subcommands[*index].target {
                    return nest.usage(&format!("{program} {name}"), rest, terminal_width);
                }
            }
        }

        self.usage_text(program, terminal_width)
    }
}
