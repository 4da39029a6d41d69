//! Canned "AI" text templates keyed on instruction keywords.
//!
//! Rules are checked in order against the lowercased instruction; the first
//! match wins. Nothing here calls a model.

use chrono::{DateTime, Local};

/// What an instruction resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Clock,
    Date,
    Todo,
    Meeting,
    Header,
    Suggestion,
}

impl Mutation {
    /// Classify an instruction by keyword.
    pub fn classify(instruction: &str) -> Self {
        let lower = instruction.to_lowercase();
        let has = |keyword: &str| lower.contains(keyword);

        if has("clock") || has("time") {
            Mutation::Clock
        } else if has("date") {
            Mutation::Date
        } else if has("todo") || has("task") {
            Mutation::Todo
        } else if has("meeting") || has("agenda") {
            Mutation::Meeting
        } else if has("header") {
            Mutation::Header
        } else {
            Mutation::Suggestion
        }
    }
}

/// Apply `instruction` to `content`, stamping templates with `now`.
pub fn apply(instruction: &str, content: &str, now: DateTime<Local>) -> String {
    match Mutation::classify(instruction) {
        Mutation::Clock => format!("{}\n{}", clock_block(now), content),
        Mutation::Date => format!(
            "<p><strong>Date:</strong> {}</p>\n{}",
            now.format("%A, %B %-d, %Y"),
            content
        ),
        Mutation::Todo => format!("{}\n{}", todo_block(), content),
        Mutation::Meeting => format!("{}\n{}", meeting_block(now), content),
        Mutation::Header => make_header(content),
        Mutation::Suggestion => format!(
            "<p><em>AI Suggestion for \"{}\":</em></p>\n{}",
            instruction, content
        ),
    }
}

fn time_string(now: DateTime<Local>) -> String {
    now.format("%-I:%M:%S %p").to_string()
}

fn date_string(now: DateTime<Local>) -> String {
    now.format("%-m/%-d/%Y").to_string()
}

fn clock_block(now: DateTime<Local>) -> String {
    format!(
        r#"
<div class="clock-widget">
    <div class="clock-time" id="liveTime">{}</div>
    <div class="clock-date">{}</div>
</div>"#,
        time_string(now),
        date_string(now)
    )
}

fn todo_block() -> String {
    r#"
<div style="margin-bottom: 16px;">
    <h3 style="margin-bottom: 8px;">📝 Todo List</h3>
    <div style="margin-left: 16px;">
        ☐ Task 1<br>
        ☐ Task 2<br>
        ☐ Task 3<br>
    </div>
</div>"#
        .to_string()
}

fn meeting_block(now: DateTime<Local>) -> String {
    format!(
        r#"
<div style="margin-bottom: 16px;">
    <h2 style="margin-bottom: 8px;">📅 Meeting Agenda</h2>
    <p><strong>Date:</strong> {}</p>
    <p><strong>Time:</strong> {}</p>
    <br>
    <h3>Agenda Items:</h3>
    <ol style="margin-left: 20px;">
        <li>Item 1</li>
        <li>Item 2</li>
        <li>Item 3</li>
    </ol>
    <br>
    <h3>Notes:</h3>
</div>"#,
        date_string(now),
        time_string(now)
    )
}

/// Wrap the first line, stripped of markup, in `<h1>`.
fn make_header(content: &str) -> String {
    let mut lines = content.split('\n');
    let first = lines.next().unwrap_or_default();
    let header = format!("<h1>{}</h1>", strip_tags(first));
    std::iter::once(header)
        .chain(lines.map(str::to_string))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
