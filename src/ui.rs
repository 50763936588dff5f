use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, Tone},
    clock::Clock,
    history::HISTORY_CAPACITY,
    mood::Mood,
    round::RoundState,
    stats::{format_ms, Category},
    store::KeyValueStore,
};

const HORIZONTAL_MARGIN: u16 = 2;

const ACCENT: (f64, f64, f64) = (34.0, 197.0, 94.0);
const ERROR: (f64, f64, f64) = (239.0, 68.0, 68.0);
const MUTED: Color = Color::Rgb(148, 163, 184);

fn mix(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> (f64, f64, f64) {
    let t = t.clamp(0.0, 1.0);
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

/// Arena tint: fade from black toward green by glow, then toward red
pub fn mood_color(mood: Mood) -> Color {
    let glow = mix((0.0, 0.0, 0.0), ACCENT, mood.glow.max(0.35));
    let (r, g, b) = mix(glow, ERROR, mood.red * 0.9);
    Color::Rgb(r.round() as u8, g.round() as u8, b.round() as u8)
}

fn pill_color(state: RoundState) -> Color {
    match state {
        RoundState::Ready => Color::Green,
        RoundState::Waiting | RoundState::TooEarly => Color::Red,
        RoundState::Idle | RoundState::Result => MUTED,
    }
}

fn tone_style(tone: Tone) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match tone {
        Tone::Accent => bold.fg(Color::Green),
        Tone::Error => bold.fg(Color::Red),
        Tone::Neutral => bold,
    }
}

fn category_span(ms: Option<f64>) -> Span<'static> {
    match ms.and_then(Category::of) {
        Some(category) => {
            let color = match category {
                Category::Amazing => Color::Magenta,
                Category::VeryGood => Color::Green,
                Category::Good => Color::Cyan,
                Category::Average => Color::Yellow,
                Category::BelowAverage => Color::Red,
            };
            Span::styled(format!(" {category}"), Style::default().fg(color))
        }
        None => Span::raw(""),
    }
}

fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<14}"), Style::default().fg(MUTED)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

/// One chip per history slot, newest first, placeholders for empty slots
pub fn attempt_chips(attempts: &[f64]) -> Vec<String> {
    (0..HISTORY_CAPACITY)
        .map(|i| match attempts.get(i) {
            Some(ms) => format!("{}", ms.round()),
            None => "—".to_string(),
        })
        .collect()
}

impl<S: KeyValueStore, C: Clock> Widget for &App<S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title + state pill
                Constraint::Min(7),    // arena
                Constraint::Length(8), // stats
                Constraint::Length(3), // attempts
                Constraint::Length(1), // announcement
                Constraint::Length(1), // legend
            ])
            .split(area);

        let state = self.view.state;
        let title = Line::from(vec![
            Span::styled("reflex", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("[ {state} ]"),
                Style::default()
                    .fg(pill_color(state))
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        // arena, shaken sideways for a few frames after a false start
        let mood = self.mood.current();
        let mut arena_area = chunks[1];
        if mood.jitter > 0.2 && self.frame % 2 == 0 && arena_area.width > 2 {
            arena_area.x += 1;
            arena_area.width -= 1;
        }
        let arena = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(mood_color(mood)))
            .title(" arena ");
        let inner = arena.inner(arena_area);
        arena.render(arena_area, buf);

        let pad = inner.height.saturating_sub(5) / 2;
        let mut lines: Vec<Line> = (0..pad).map(|_| Line::raw("")).collect();
        lines.push(Line::styled(
            self.view.headline,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            self.view.readout.clone(),
            tone_style(self.view.tone),
        ));
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            self.view.help,
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        ));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(inner, buf);

        let stats = &self.stats;
        let consistency = match stats.std_dev {
            Some(sd) if stats.session_count > 1 => format!("± {} ms", sd.round()),
            _ => "—".to_string(),
        };
        let mut current = stat_line("Current", format_ms(stats.current));
        current.spans.push(category_span(stats.current));
        let mut last = stat_line("Last", format_ms(stats.most_recent));
        last.spans.push(category_span(stats.most_recent));
        Paragraph::new(vec![
            stat_line("Best", format_ms(stats.best)),
            stat_line("Average", format_ms(stats.average)),
            stat_line("Session best", format_ms(stats.fastest)),
            current,
            last,
            stat_line("Consistency", consistency),
        ])
        .block(Block::default().borders(Borders::ALL).title(" stats "))
        .render(chunks[2], buf);

        let chips: Vec<Span> = attempt_chips(&stats.attempts)
            .into_iter()
            .enumerate()
            .flat_map(|(i, chip)| {
                let style = if i < stats.attempts.len() {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                [Span::styled(format!("{chip:>6}"), style), Span::raw(" ")]
            })
            .collect();
        Paragraph::new(Line::from(chips))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Session: {} ", stats.session_count)),
            )
            .render(chunks[3], buf);

        if let Some(announcement) = &self.announcement {
            Paragraph::new(Span::styled(
                announcement.clone(),
                Style::default().fg(Color::Cyan),
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }

        Paragraph::new(Span::styled(
            "(space/enter/click) react / (r)eset session / (c)lear best / (esc)ape",
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[5], buf);
    }
}
