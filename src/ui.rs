use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use typometer::{stats::PerformanceRating, CharState, TestMode, TypingStats};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Typing => render_typing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let test = &app.test;

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let extra = test.input_len().saturating_sub(test.reference_len());
    let prompt_width = test.reference().width() + extra;
    let prompt_occupied_lines = if prompt_width <= max_chars_per_line as usize {
        1
    } else {
        ((prompt_width as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines + 2) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(stats_row(app), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let widget = Paragraph::new(Line::from(prompt_spans(app)))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false });
    widget.render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "(tab) restart / (ctrl-n) new / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

fn stats_row(app: &App) -> String {
    let test = &app.test;
    let live = test.live_stats();
    let time = match test.remaining() {
        Some(left) => format!("{}s left", left.as_secs_f64().ceil() as u64),
        None => format!("{}s", test.elapsed().as_secs()),
    };
    format!(
        "{} wpm   {}% acc   {} errors   {}",
        live.wpm, live.accuracy, live.errors, time
    )
}

/// Reference text coloured per character, with the cursor underlined and the
/// current word brightened.
fn prompt_spans(app: &App) -> Vec<Span<'static>> {
    let test = &app.test;
    let cursor = test.input_len();
    let current_word = test.current_word_index();

    let correct = bold().fg(Color::Green);
    let incorrect = bold().fg(Color::Red);
    let extra = bold().fg(Color::Red).bg(Color::DarkGray);
    let upcoming = dim_bold();
    let in_word = bold().fg(Color::White);

    let mut word = 0;
    let mut spans = Vec::with_capacity(test.statuses().len() + 1);
    for (idx, status) in test.statuses().iter().enumerate() {
        let style = match status.state {
            CharState::Correct => correct,
            CharState::Incorrect => incorrect,
            CharState::Extra => extra,
            CharState::Pending if word == current_word => in_word,
            CharState::Pending => upcoming,
        };
        let style = if idx == cursor {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        };
        let shown = match (status.state, status.ch) {
            (CharState::Incorrect | CharState::Extra, ' ') => '·',
            (_, c) => c,
        };
        spans.push(Span::styled(shown.to_string(), style));

        if status.state != CharState::Extra && status.ch == ' ' {
            word += 1;
        }
    }

    if cursor >= test.statuses().len() && !test.has_finished() {
        spans.push(Span::styled(
            " ",
            upcoming.add_modifier(Modifier::UNDERLINED),
        ));
    }

    spans
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let test = &app.test;
    let stats = test
        .result()
        .map(|r| r.stats)
        .unwrap_or_else(|| test.query_stats());
    let rating = PerformanceRating::for_stats(&stats);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2), // rating
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        rating.to_string(),
        bold().fg(rating_color(rating)),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!("{} wpm   {}% acc", stats.wpm, stats.accuracy),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled(detail_row(&stats), dim_bold()))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let config = test.config();
    let mode = match config.mode {
        TestMode::Timed { limit_secs } => format!("time {limit_secs}s"),
        TestMode::Words { count } => format!("words {count}"),
    };
    Paragraph::new(Span::styled(
        format!("{}   {}", config.difficulty, mode),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[6], buf);
}

fn detail_row(stats: &TypingStats) -> String {
    format!(
        "{} raw   {} errors   {}s   {}/{} chars",
        stats.raw_wpm, stats.errors, stats.time_taken_secs, stats.correct_chars, stats.total_chars
    )
}

fn rating_color(rating: PerformanceRating) -> Color {
    match rating {
        PerformanceRating::Outstanding => Color::Magenta,
        PerformanceRating::Excellent => Color::Green,
        PerformanceRating::Good => Color::Cyan,
        PerformanceRating::KeepPracticing => Color::Yellow,
        PerformanceRating::KeepGoing => Color::Red,
    }
}
