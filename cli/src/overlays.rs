//! Floating overlays: the chat sidebar and the challenge modal.
//!
//! Both are backed by controllers that live outside the state store, so their
//! updates neither trigger nor get torn down by full redraws; they are simply
//! painted last, over whatever the main pass produced.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use gitscope_core::challenge::{ChallengeFlow, SessionPhase};
use gitscope_core::chat::Role;
use gitscope_core::state::AppState;

use crate::app::App;

pub fn draw_chat(frame: &mut Frame, app: &App, state: &AppState) {
    if !app.chat.open {
        return;
    }

    let area = frame.area();
    let width = (area.width / 2).clamp(30, 46).min(area.width);
    let sidebar = Rect::new(area.right().saturating_sub(width), area.y, width, area.height);
    frame.render_widget(Clear, sidebar);

    let repo_name = state
        .current_repo
        .as_ref()
        .map(|r| r.full_name.clone())
        .unwrap_or_default();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" chat · {repo_name} "))
        .title_bottom(" enter send · esc close ");
    let inner = block.inner(sidebar);
    frame.render_widget(block, sidebar);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    // transcript: wrap manually so we can keep the tail in view
    let mut lines: Vec<Line> = Vec::new();
    let wrap_width = rows[0].width.saturating_sub(1).max(8) as usize;
    for message in app.chat.messages() {
        let (prefix, color) = match message.role {
            Role::User => ("you", Color::Green),
            Role::Assistant => ("ai", Color::Cyan),
        };
        lines.push(Line::from(Span::styled(
            format!("{prefix}:"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for wrapped in wrap_plain(&message.content, wrap_width) {
            lines.push(Line::from(wrapped));
        }
        lines.push(Line::from(""));
    }

    let visible = rows[0].height as usize;
    let skip = lines.len().saturating_sub(visible);
    let transcript = Paragraph::new(lines.split_off(skip.min(lines.len())));
    frame.render_widget(transcript, rows[0]);

    if app.chat.loading {
        frame.render_widget(
            Paragraph::new("assistant is thinking...")
                .style(Style::default().fg(Color::Yellow)),
            rows[1],
        );
    }

    let input = Paragraph::new(format!("> {}", app.view.chat_input));
    frame.render_widget(input, rows[2]);
    let cursor_x = (rows[2].x + 2 + app.view.chat_input.len() as u16)
        .min(rows[2].right().saturating_sub(1));
    frame.set_cursor_position((cursor_x, rows[2].y));
}

pub fn draw_challenge(frame: &mut Frame, app: &App) {
    if app.challenges.is_idle() {
        return;
    }

    let modal = centered_rect(frame.area(), 72, 18);
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" challenge ");
    let inner = block.inner(modal);
    frame.render_widget(block, modal);

    match &app.challenges {
        ChallengeFlow::Idle => {}
        ChallengeFlow::Loading { .. } => {
            frame.render_widget(
                Paragraph::new("generating challenges for this module...\n\nesc to cancel")
                    .style(Style::default().fg(Color::Yellow))
                    .alignment(Alignment::Center),
                inner,
            );
        }
        ChallengeFlow::Active { session, .. } => match session.phase() {
            SessionPhase::Question => draw_question(frame, app, inner),
            SessionPhase::Feedback => draw_feedback(frame, app, inner),
            SessionPhase::Results => draw_results(frame, app, inner),
        },
    }
}

fn draw_question(frame: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.challenges.session() else {
        return;
    };
    let Some(challenge) = session.current() else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "question {}/{} · {} pts · streak {}",
                session.index() + 1,
                session.len(),
                challenge.points,
                app.progress.current_streak,
            ),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];
    lines.push(Line::from(challenge.question.clone()));
    lines.push(Line::from(""));
    for (i, option) in challenge.options.iter().enumerate() {
        lines.push(Line::from(format!("  {}) {option}", i + 1)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "1-9 answer · s skip · esc quit",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_feedback(frame: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.challenges.session() else {
        return;
    };
    let (Some(challenge), Some(outcome)) = (session.current(), session.last_outcome()) else {
        return;
    };

    let verdict = if outcome.skipped {
        Line::from(Span::styled(
            "skipped",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
    } else if outcome.correct {
        Line::from(Span::styled(
            format!("correct! +{} xp", outcome.points_awarded),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            "incorrect — streak reset",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    };

    let mut lines = vec![verdict, Line::from("")];
    if !outcome.correct {
        lines.push(Line::from(format!("answer: {}", challenge.correct_answer)));
        lines.push(Line::from(""));
    }
    if !challenge.explanation.is_empty() {
        lines.push(Line::from(challenge.explanation.clone()));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "enter to continue",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_results(frame: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.challenges.session() else {
        return;
    };

    let lines = vec![
        Line::from(Span::styled(
            "module complete!",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "{}/{} correct · {} xp earned this set",
            session.correct_count(),
            session.len(),
            session.earned_points(),
        )),
        Line::from(format!(
            "total: {} xp · best streak {}",
            app.progress.total_xp, app.progress.longest_streak,
        )),
        Line::from(""),
        Line::from(Span::styled(
            "enter to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        area,
    );
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Greedy word wrap; long unbroken words are split hard.
fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            if !current.is_empty() && current.len() + 1 + word.len() > width {
                out.push(std::mem::take(&mut current));
            }
            if word.chars().count() > width {
                let mut rest = word;
                while rest.chars().count() > width {
                    let split = rest
                        .char_indices()
                        .nth(width)
                        .map(|(i, _)| i)
                        .unwrap_or(rest.len());
                    let (head, tail) = rest.split_at(split);
                    out.push(head.to_string());
                    rest = tail;
                }
                current = rest.to_string();
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
        out.push(current);
    }
    out
}
