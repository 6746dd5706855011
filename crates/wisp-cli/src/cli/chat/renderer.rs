//! Terminal markdown rendering with syntax-highlighted code blocks.
//!
//! `ChatRenderer` combines `termimad` for prose and `syntect` for code block
//! syntax highlighting. Reasoning wrapped in the thinking-box markup is
//! shown as a dimmed block under a `思考过程` header. During streaming,
//! text is printed raw (with the wrapper markup swapped for plain
//! delimiters); once a reply completes it is rendered as formatted markdown.

use std::io::{self, Write};

use console::style;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;

use wisp_core::chat::reasoning::{WRAPPER_CLOSE, WRAPPER_OPEN};

/// Header shown above a reasoning block.
const REASONING_HEADER: &str = "思考过程";

/// A piece of assistant content.
#[derive(Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text inside a thinking box.
    Reasoning(&'a str),
    /// Everything else.
    Answer(&'a str),
}

/// Start of any div tag, the thinking box included.
const DIV_OPEN: &str = "<div";

/// A run of content, before blank filtering.
struct Block<'a> {
    text: &'a str,
    reasoning: bool,
    closed: bool,
}

/// Cut content into answer and reasoning runs.
///
/// A thinking box ends at the `</div>` that balances it, so divs quoted
/// inside the reasoning stay part of it.
fn blocks(content: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find(WRAPPER_OPEN) {
        blocks.push(Block { text: &rest[..open], reasoning: false, closed: true });
        let inner = &rest[open + WRAPPER_OPEN.len()..];
        match balancing_close(inner) {
            Some(close) => {
                blocks.push(Block { text: &inner[..close], reasoning: true, closed: true });
                rest = &inner[close + WRAPPER_CLOSE.len()..];
            }
            None => {
                blocks.push(Block { text: inner, reasoning: true, closed: false });
                rest = "";
            }
        }
    }
    blocks.push(Block { text: rest, reasoning: false, closed: true });

    blocks
}

/// Offset of the `</div>` closing an already opened div.
fn balancing_close(inner: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut pos = 0;
    loop {
        let rest = &inner[pos..];
        let close = rest.find(WRAPPER_CLOSE)?;
        match rest.find(DIV_OPEN) {
            Some(open) if open < close => {
                depth += 1;
                pos += open + DIV_OPEN.len();
            }
            _ if depth == 0 => return Some(pos + close),
            _ => {
                depth -= 1;
                pos += close + WRAPPER_CLOSE.len();
            }
        }
    }
}

/// Split assistant content at thinking-box markup.
///
/// An opened box without a closing tag runs to the end. Blank segments
/// are dropped.
pub fn split_reasoning(content: &str) -> Vec<Segment<'_>> {
    blocks(content)
        .into_iter()
        .filter(|b| !b.text.trim().is_empty())
        .map(|b| {
            if b.reasoning {
                Segment::Reasoning(b.text)
            } else {
                Segment::Answer(b.text)
            }
        })
        .collect()
}

/// Drop a trailing fragment that could still grow into wrapper markup.
fn hold_partial_tag(content: &str) -> &str {
    for tag in [WRAPPER_OPEN, WRAPPER_CLOSE] {
        for len in (1..tag.len()).rev() {
            if content.ends_with(&tag[..len]) {
                return &content[..content.len() - len];
            }
        }
    }
    content
}

/// Plain-text view of content for raw streaming.
///
/// Thinking-box markup becomes bracketed `思考过程` delimiters; any other
/// markup is left as written. Unless `complete`, a trailing partial tag is
/// held back so a later snapshot only ever extends the view.
pub fn stream_view(content: &str, complete: bool) -> String {
    let content = if complete { content } else { hold_partial_tag(content) };
    let mut view = String::with_capacity(content.len());
    for block in blocks(content) {
        if block.reasoning {
            view.push_str(&format!("\n[{REASONING_HEADER}]\n"));
            view.push_str(block.text);
            if block.closed {
                view.push_str(&format!("\n[/{REASONING_HEADER}]\n"));
            }
        } else {
            view.push_str(block.text);
        }
    }
    view
}

/// One-line preview of an entry for `/history`.
pub fn preview(content: &str, max_chars: usize) -> String {
    let answer: String = split_reasoning(content)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Answer(t) => Some(t.trim()),
            Segment::Reasoning(_) => None,
        })
        .collect::<Vec<_>>()
        .join(" ");
    let flat = answer.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

/// Terminal markdown renderer with syntax highlighting.
pub struct ChatRenderer {
    skin: MadSkin,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl ChatRenderer {
    pub fn new() -> Self {
        let mut skin = MadSkin::default_dark();
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);

        Self {
            skin,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Render complete assistant content: reasoning blocks dimmed, the rest
    /// as markdown.
    pub fn render_final(&self, content: &str) -> String {
        let mut output = String::new();
        for segment in split_reasoning(content) {
            match segment {
                Segment::Reasoning(text) => output.push_str(&self.render_reasoning(text)),
                Segment::Answer(text) => output.push_str(&self.render_markdown(text)),
            }
        }
        output
    }

    fn render_reasoning(&self, text: &str) -> String {
        let mut output = format!("  {}\n", style(format!("┌ {REASONING_HEADER}")).dim().bold());
        for line in text.trim().lines() {
            output.push_str(&format!("  {} {}\n", style("│").dim(), style(line).dim().italic()));
        }
        output.push_str(&format!("  {}\n", style("└").dim()));
        output
    }

    /// Render markdown, highlighting fenced code blocks via syntect.
    fn render_markdown(&self, markdown: &str) -> String {
        let mut output = String::new();
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_buf = String::new();

        for line in markdown.trim_matches('\n').lines() {
            if line.starts_with("```") && !in_code_block {
                in_code_block = true;
                code_lang = line.trim_start_matches('`').trim().to_string();
                code_buf.clear();
            } else if line.starts_with("```") && in_code_block {
                in_code_block = false;
                output.push_str(&self.highlight_code(&code_buf, &code_lang));
                output.push('\n');
            } else if in_code_block {
                code_buf.push_str(line);
                code_buf.push('\n');
            } else {
                output.push_str(&format!("{}", self.skin.term_text(line)));
            }
        }

        // Unclosed fence: highlight what arrived
        if in_code_block && !code_buf.is_empty() {
            output.push_str(&self.highlight_code(&code_buf, &code_lang));
        }

        output
    }

    /// Write the stats footer after a reply.
    ///
    /// Format: "| {chars} chars . {time}s . {model}"
    pub fn write_stats_footer(
        &self,
        out: &mut impl Write,
        chars: usize,
        response_ms: u64,
        model: &str,
    ) -> io::Result<()> {
        let seconds = response_ms as f64 / 1000.0;
        writeln!(
            out,
            "\n  {} {} chars {} {:.1}s {} {}",
            style("|").dim(),
            style(chars).dim(),
            style("\u{00b7}").dim(),
            style(seconds).dim(),
            style("\u{00b7}").dim(),
            style(model).dim(),
        )
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = if lang.is_empty() {
            self.syntax_set.find_syntax_plain_text()
        } else {
            self.syntax_set
                .find_syntax_by_token(lang)
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
        };

        let mut output = String::new();
        output.push_str(&format!("  {}\n", style(format!("--- {lang} ---")).dim()));

        let Some(theme) = self.theme_set.themes.get("base16-ocean.dark") else {
            for line in code.lines() {
                output.push_str(&format!("  {line}\n"));
            }
            return output;
        };
        let mut h = HighlightLines::new(syntax, theme);

        for line in code.lines() {
            let ranges: Vec<(Style, &str)> = h
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
            output.push_str(&format!("  {escaped}\x1b[0m\n"));
        }

        output
    }
}

impl Default for ChatRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(inner: &str) -> String {
        format!("{WRAPPER_OPEN}{inner}{WRAPPER_CLOSE}")
    }

    #[test]
    fn split_plain_answer() {
        assert_eq!(split_reasoning("Hi there"), vec![Segment::Answer("Hi there")]);
    }

    #[test]
    fn split_reasoning_then_answer() {
        let content = format!("{}answer", boxed("analysis"));
        assert_eq!(
            split_reasoning(&content),
            vec![Segment::Reasoning("analysis"), Segment::Answer("answer")]
        );
    }

    #[test]
    fn split_unclosed_box_runs_to_end() {
        let content = format!("pre {WRAPPER_OPEN}still going");
        assert_eq!(
            split_reasoning(&content),
            vec![Segment::Answer("pre "), Segment::Reasoning("still going")]
        );
    }

    #[test]
    fn split_drops_blank_segments() {
        let content = format!("\n{}\n\n", boxed("x"));
        assert_eq!(split_reasoning(&content), vec![Segment::Reasoning("x")]);
    }

    #[test]
    fn split_keeps_unrelated_div() {
        let content = "<div>not reasoning</div>";
        assert_eq!(split_reasoning(content), vec![Segment::Answer(content)]);
    }

    #[test]
    fn render_final_hides_markup() {
        let renderer = ChatRenderer::new();
        let out = renderer.render_final(&format!("{}The answer is 42.", boxed("step one\nstep two")));
        assert!(out.contains(REASONING_HEADER));
        assert!(out.contains("step two"));
        assert!(out.contains("42"));
        assert!(!out.contains("thinking-box"));
    }

    #[test]
    fn render_final_highlights_code_fence() {
        let renderer = ChatRenderer::new();
        let out = renderer.render_final("Here:\n```rust\nfn main() {}\n```\n");
        assert!(out.contains("--- rust ---"));
        assert!(out.contains("main"));
    }

    #[test]
    fn split_keeps_html_inside_reasoning() {
        let content = format!("{}answer", boxed("try <div>x</div> here"));
        assert_eq!(
            split_reasoning(&content),
            vec![
                Segment::Reasoning("try <div>x</div> here"),
                Segment::Answer("answer"),
            ]
        );
    }

    #[test]
    fn split_leaves_html_answer_alone() {
        let content = format!("{}```html\n<div>a</div>\n```", boxed("plan"));
        assert_eq!(
            split_reasoning(&content),
            vec![
                Segment::Reasoning("plan"),
                Segment::Answer("```html\n<div>a</div>\n```"),
            ]
        );
    }

    #[test]
    fn stream_view_replaces_wrappers() {
        let out = stream_view(&boxed("why"), true);
        assert_eq!(out, "\n[思考过程]\nwhy\n[/思考过程]\n");
        assert_eq!(stream_view("plain", false), "plain");
    }

    #[test]
    fn stream_view_keeps_answer_divs() {
        assert_eq!(stream_view("<div>hello</div>", true), "<div>hello</div>");
        assert_eq!(stream_view("<div>hello</div>", false), "<div>hello</div>");
    }

    #[test]
    fn stream_view_closes_box_on_balancing_div() {
        let content = format!("{}<p>ok</p>", boxed("see <div>b</div> then"));
        let out = stream_view(&content, true);
        assert!(out.contains("see <div>b</div> then\n[/思考过程]\n<p>ok</p>"));
        assert_eq!(out.matches("[/思考过程]").count(), 1);
    }

    #[test]
    fn stream_view_holds_back_partial_markup() {
        assert_eq!(stream_view("answer </di", false), "answer ");
        assert_eq!(stream_view("answer </di", true), "answer </di");
        let open_half = &WRAPPER_OPEN[..8];
        assert_eq!(stream_view(&format!("x{open_half}"), false), "x");
    }

    #[test]
    fn stream_view_grows_by_extension() {
        let full = format!("{}done", boxed("a <div>b</div> c"));
        let mut previous = String::new();
        for end in (0..=full.len()).filter(|i| full.is_char_boundary(*i)) {
            let view = stream_view(&full[..end], false);
            assert!(view.starts_with(&previous), "{previous:?} -> {view:?}");
            previous = view;
        }
    }

    #[test]
    fn preview_skips_reasoning_and_truncates() {
        let content = format!("{}{}", boxed("hidden"), "a ".repeat(80));
        let p = preview(&content, 20);
        assert!(!p.contains("hidden"));
        assert_eq!(p.chars().count(), 20);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn preview_counts_chars_not_bytes() {
        assert_eq!(preview("你好世界", 10), "你好世界");
    }

    #[test]
    fn stats_footer_mentions_model() {
        let renderer = ChatRenderer::new();
        let mut buf = Vec::new();
        renderer.write_stats_footer(&mut buf, 12, 1500, "gemini").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("gemini"));
        assert!(text.contains("1.5s"));
    }
}
