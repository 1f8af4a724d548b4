use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use colored::Colorize;

/// Ordered output-noise threshold. A `line` call only emits when the
/// sink's configured verbosity is at least the requested level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
    Debug,
}

impl Verbosity {
    /// Parse a symbolic name (`quiet`, `normal`, `v`, `vv`, `vvv`) or a
    /// raw numeric level (`0`..`4`).
    pub fn parse(token: &str) -> Option<Verbosity> {
        match token {
            "quiet" | "0" => Some(Verbosity::Quiet),
            "normal" | "1" => Some(Verbosity::Normal),
            "v" | "verbose" | "2" => Some(Verbosity::Verbose),
            "vv" | "3" => Some(Verbosity::VeryVerbose),
            "vvv" | "debug" | "4" => Some(Verbosity::Debug),
            _ => None,
        }
    }

    /// Parse a symbolic or numeric level, falling back to `default` for
    /// unrecognized names instead of failing.
    pub fn parse_or(token: &str, default: Verbosity) -> Verbosity {
        Verbosity::parse(token).unwrap_or(default)
    }
}

/// Named style tag applied by the convenience output helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Info,
    Comment,
    Error,
    Question,
}

impl Style {
    fn apply(self, text: &str) -> String {
        match self {
            Style::Info => text.green().to_string(),
            Style::Comment => text.yellow().to_string(),
            Style::Error => text.red().to_string(),
            Style::Question => text.cyan().to_string(),
        }
    }
}

/// Border treatment for [`Output::table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// Boxed grid with `+---+` rules.
    Default,
    /// Column-aligned, no borders.
    Compact,
}

/// A write-once-per-line output sink with a configured verbosity.
pub struct Output {
    verbosity: Verbosity,
    writer: Box<dyn Write + Send>,
}

impl Output {
    pub fn stdout() -> Self {
        Output::with_writer(Verbosity::Normal, Box::new(io::stdout()))
    }

    /// A sink that discards everything, used by `call_silent`.
    pub fn null() -> Self {
        Output::with_writer(Verbosity::Normal, Box::new(io::sink()))
    }

    pub fn with_writer(verbosity: Verbosity, writer: Box<dyn Write + Send>) -> Self {
        Output { verbosity, writer }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    /// Write one line, optionally styled, gated on the requested level.
    pub fn line(&mut self, text: &str, style: Option<Style>, level: Verbosity) {
        if self.verbosity < level {
            return;
        }
        let rendered = match style {
            Some(style) => style.apply(text),
            None => text.to_string(),
        };
        let _ = writeln!(self.writer, "{rendered}");
    }

    /// Render a formatted grid to the sink at `Normal` level. Identical
    /// input renders identically.
    pub fn table(&mut self, headers: &[&str], rows: &[Vec<String>], style: TableStyle) {
        if self.verbosity < Verbosity::Normal {
            return;
        }
        let rendered = render_table(headers, rows, style);
        let _ = write!(self.writer, "{rendered}");
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("verbosity", &self.verbosity)
            .finish()
    }
}

/// Cloneable in-memory sink for capturing command output in tests and in
/// embedding applications.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        SharedBuffer::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Render a table as a string. Cells may contain embedded newlines; each
/// physical line is laid out within the column width.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], style: TableStyle) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            let cell_width = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            if cell_width > widths[i] {
                widths[i] = cell_width;
            }
        }
    }

    let mut out = String::new();
    match style {
        TableStyle::Default => {
            let rule = horizontal_rule(&widths);
            out.push_str(&rule);
            push_row(&mut out, headers, &widths, "| ", " | ", " |");
            out.push_str(&rule);
            for row in rows {
                let cells: Vec<&str> = row.iter().map(String::as_str).collect();
                push_row(&mut out, &cells, &widths, "| ", " | ", " |");
            }
            out.push_str(&rule);
        }
        TableStyle::Compact => {
            push_row(&mut out, headers, &widths, "", "  ", "");
            for row in rows {
                let cells: Vec<&str> = row.iter().map(String::as_str).collect();
                push_row(&mut out, &cells, &widths, "", "  ", "");
            }
        }
    }
    out
}

fn horizontal_rule(widths: &[usize]) -> String {
    let mut rule = String::from("+");
    for width in widths {
        rule.push_str(&"-".repeat(width + 2));
        rule.push('+');
    }
    rule.push('\n');
    rule
}

fn push_row(out: &mut String, cells: &[&str], widths: &[usize], left: &str, sep: &str, right: &str) {
    let height = cells
        .iter()
        .map(|c| c.lines().count().max(1))
        .max()
        .unwrap_or(1);
    for line_index in 0..height {
        out.push_str(left);
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            let line = cells
                .get(i)
                .and_then(|c| c.lines().nth(line_index))
                .unwrap_or("");
            out.push_str(line);
            out.push_str(&" ".repeat(width.saturating_sub(line.chars().count())));
        }
        out.push_str(right);
        // Trailing spaces on borderless rows are noise.
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }
}
