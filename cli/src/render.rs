//! The render engine: one synchronous pass from a single state snapshot to
//! the full frame. The pass rebuilds every pane from scratch; the only things
//! that survive it are the externally-owned lifecycle objects (graph
//! simulation, chat session, challenge overlay), which live outside the
//! widgets being replaced.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use gitscope_core::ai::LearningPathResult;
use gitscope_core::state::{AppState, View};
use gitscope_core::tree::NodeKind;

use crate::app::App;
use crate::overlays;
use crate::view::{self, Focus, Tab};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    // one snapshot per pass; every branch below reads this, never the store
    let state = app.store.state();

    match state.view {
        View::Landing => draw_landing(frame, app, &state),
        View::Repo => draw_repo(frame, app, &state),
    }

    // overlays are independently owned and drawn on top of whatever the
    // main pass produced
    overlays::draw_chat(frame, app, &state);
    overlays::draw_challenge(frame, app);
}

// ---- landing ---------------------------------------------------------------

fn draw_landing(frame: &mut Frame, app: &App, state: &AppState) {
    let area = frame.area();
    let column = centered_column(area, 64);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(column);

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "gitscope",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from("explore any public repository with an AI guide"),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, rows[0]);

    let input_style = if state.loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let input = Paragraph::new(state.repo_url.as_str())
        .style(input_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" repository url "),
        );
    frame.render_widget(input, rows[1]);
    if !state.loading {
        let cursor_x =
            (rows[1].x + 1 + state.repo_url.len() as u16).min(rows[1].right().saturating_sub(2));
        frame.set_cursor_position((cursor_x, rows[1].y + 1));
    }

    if let Some(error) = &state.error {
        let banner = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, rows[2]);
    } else if state.loading {
        let loading = Paragraph::new("exploring repository...")
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(loading, rows[2]);
    }

    let history = app.cache.history();
    if !history.is_empty() {
        let items: Vec<ListItem> = history
            .iter()
            .map(|entry| ListItem::new(entry.full_name.as_str()))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" recently explored "),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("› ");
        let mut list_state = ListState::default();
        list_state.select(Some(app.view.history_cursor.min(history.len() - 1)));
        frame.render_stateful_widget(list, rows[3], &mut list_state);
    } else if !app.trending.is_empty() {
        let items: Vec<ListItem> = app
            .trending
            .iter()
            .map(|repo| {
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{}  ", repo.full_name)),
                    Span::styled(
                        format!("★ {}", repo.stars),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" popular right now "),
        );
        frame.render_widget(list, rows[3]);
    } else {
        let hint = Paragraph::new("try: octocat/Hello-World, rust-lang/mdBook, tokio-rs/axum")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(hint, rows[3]);
    }

    let help = Paragraph::new("enter explore · ↑/↓ history · esc quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, rows[4]);
}

// ---- repository view -------------------------------------------------------

fn draw_repo(frame: &mut Frame, app: &App, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, state, rows[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(rows[1]);

    match app.view.tab {
        Tab::Tree => draw_tree_pane(frame, app, state, panes[0]),
        Tab::Graph => draw_graph_pane(frame, app, state, panes[0]),
    }

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(panes[1]);

    draw_detail_pane(frame, app, state, right[0]);
    draw_learning_pane(frame, app, right[1]);
    draw_status_line(frame, app, rows[2]);
}

fn draw_header(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let Some(repo) = &state.current_repo else {
        frame.render_widget(
            Paragraph::new("loading repository...").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };

    let rate = app.rate_limit();
    let rate_display = match rate.remaining {
        Some(remaining) => format!("api quota: {remaining}"),
        None => String::new(),
    };

    let stats = format!(
        "★ {}  ⑂ {}  {}  default: {}   {}",
        repo.stars,
        repo.forks,
        repo.language.as_deref().unwrap_or("n/a"),
        repo.default_branch,
        rate_display,
    );

    let header = Paragraph::new(vec![
        Line::from(stats),
        Line::from(Span::styled(
            repo.description.clone().unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", repo.full_name)),
    );
    frame.render_widget(header, area);
}

fn explorer_block(app: &App) -> Block<'static> {
    let focused = app.view.focus == Focus::Explorer;
    let title = match app.view.tab {
        Tab::Tree => " [1] files   2  graph ",
        Tab::Graph => "  1  files  [2] graph ",
    };
    pane_block(title, focused)
}

fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title.to_string())
}

fn draw_tree_pane(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let block = explorer_block(app);

    let Some(tree) = &state.file_tree else {
        frame.render_widget(
            Paragraph::new("no files to show").block(block),
            area,
        );
        return;
    };

    let rows = view::visible_rows(tree, &app.view.expanded);
    let selected_path = state.selected_file.as_ref().map(|f| f.path.as_str());

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let marker = match row.node.kind {
                NodeKind::Folder if app.view.expanded.contains(row.node.path.as_str()) => "▾ ",
                NodeKind::Folder => "▸ ",
                NodeKind::File => "  ",
            };
            let style = if Some(row.node.path.as_str()) == selected_path {
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD)
            } else if row.node.is_folder() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(
                format!("{}{}{}", "  ".repeat(row.depth), marker, row.node.name),
                style,
            )))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default();
    if !rows.is_empty() {
        list_state.select(Some(app.view.tree_cursor.min(rows.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_graph_pane(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let block = explorer_block(app);

    let Some(sim) = app.viz.simulation() else {
        frame.render_widget(
            Paragraph::new("graph not active").block(block),
            area,
        );
        return;
    };

    let (cx, cy) = app.view.graph_pan;
    let half_w = 70.0 / app.view.graph_zoom;
    let half_h = 45.0 / app.view.graph_zoom;
    let focus = app.view.graph_focus;
    let selected_path = state.selected_file.as_ref().map(|f| f.path.clone());

    let canvas = Canvas::default()
        .block(block)
        .x_bounds([cx - half_w, cx + half_w])
        .y_bounds([cy - half_h, cy + half_h])
        .paint(move |ctx| {
            for edge in &sim.edges {
                let a = &sim.nodes[edge.from];
                let b = &sim.nodes[edge.to];
                ctx.draw(&CanvasLine {
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                    color: Color::DarkGray,
                });
            }
            for (i, node) in sim.nodes.iter().enumerate() {
                let (glyph, color) = if Some(&node.path) == selected_path.as_ref() {
                    ("●", Color::Magenta)
                } else if i == focus {
                    ("●", Color::White)
                } else if node.is_file {
                    ("·", Color::Cyan)
                } else {
                    ("■", Color::Yellow)
                };
                ctx.print(node.x, node.y, Span::styled(glyph, Style::default().fg(color)));
                if i == focus {
                    ctx.print(
                        node.x + 2.0,
                        node.y,
                        Span::styled(node.label.clone(), Style::default().fg(Color::White)),
                    );
                }
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_detail_pane(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let focused = app.view.focus == Focus::Detail;

    let Some(selected) = &state.selected_file else {
        // welcome panel: repository summary plus durable progress
        let p = &app.progress;
        let lines = vec![
            Line::from("select a file to inspect it"),
            Line::from(""),
            Line::from(format!(
                "progress: {} xp · streak {} (best {}) · {} challenge sets done",
                p.total_xp, p.current_streak, p.longest_streak, p.challenges_completed
            )),
            Line::from(""),
            Line::from(Span::styled(
                "e explain · g learning path · c chat",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(pane_block(" welcome ", focused)),
            area,
        );
        return;
    };

    let panel = &app.view.file_panel;
    let mut lines: Vec<Line> = Vec::new();

    let meta = format!(
        "{}{}",
        selected
            .size
            .map(|s| format!("{s} bytes"))
            .unwrap_or_else(|| "size unknown".to_string()),
        selected
            .extension
            .as_deref()
            .map(|e| format!(" · .{e}"))
            .unwrap_or_default(),
    );
    lines.push(Line::from(Span::styled(
        meta,
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));

    if panel.explain_loading {
        lines.push(Line::from(Span::styled(
            "asking the AI about this file...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &panel.explain_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(explanation) = &panel.explanation {
        for text_line in explanation.lines() {
            lines.push(Line::from(text_line.to_string()));
        }
        lines.push(Line::from(""));
    }

    if panel.content_loading {
        lines.push(Line::from(Span::styled(
            "loading file content...",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &panel.content_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(content) = &panel.content {
        lines.push(Line::from(Span::styled(
            "── content ──",
            Style::default().fg(Color::DarkGray),
        )));
        for text_line in content.lines().take(400) {
            lines.push(Line::from(text_line.to_string()));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(pane_block(&format!(" {} ", selected.path), focused))
        .wrap(Wrap { trim: false })
        .scroll((panel.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn draw_learning_pane(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.view.focus == Focus::Learning;
    let block = pane_block(" learning path ", focused);
    let learning = &app.view.learning;

    if learning.loading {
        frame.render_widget(
            Paragraph::new("building a learning path for this repository...")
                .style(Style::default().fg(Color::Yellow))
                .block(block),
            area,
        );
        return;
    }

    if let Some(error) = &learning.error {
        frame.render_widget(
            Paragraph::new(error.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(block),
            area,
        );
        return;
    }

    let Some(stored) = &learning.stored else {
        frame.render_widget(
            Paragraph::new("press g to generate a learning path")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    };

    match &stored.result {
        LearningPathResult::Raw(text) => {
            frame.render_widget(
                Paragraph::new(text.as_str())
                    .wrap(Wrap { trim: false })
                    .block(block),
                area,
            );
        }
        LearningPathResult::Structured(path) => {
            let mut items: Vec<ListItem> = Vec::new();
            for (i, module) in path.modules.iter().enumerate() {
                let done = stored.completed_modules.contains(&i);
                let marker = if done { "✓" } else { "○" };
                let est = module
                    .estimated_time
                    .as_deref()
                    .map(|t| format!(" ({t})"))
                    .unwrap_or_default();
                let style = if done {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                items.push(ListItem::new(Line::from(Span::styled(
                    format!("{marker} {}. {}{est}", i + 1, module.title),
                    style,
                ))));
            }

            let list = List::new(items)
                .block(block.title_bottom(" enter: complete module → quiz "))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let mut list_state = ListState::default();
            if !path.modules.is_empty() {
                list_state.select(Some(learning.cursor.min(path.modules.len() - 1)));
            }
            frame.render_stateful_widget(list, area, &mut list_state);
        }
    }
}

fn draw_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let keys = match (app.view.tab, app.view.focus) {
        (Tab::Graph, Focus::Explorer) => {
            "←/→ cycle · enter select · hjkl pan · +/- zoom · tab focus · esc back"
        }
        (Tab::Tree, Focus::Explorer) => "↑/↓ move · enter open/select · tab focus · esc back",
        (_, Focus::Detail) => "↑/↓ scroll · e explain · tab focus · esc back",
        (_, Focus::Learning) => "↑/↓ move · enter complete+quiz · tab focus · esc back",
    };
    let status = Paragraph::new(keys).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, area);
}

fn centered_column(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    let x = area.x + (area.width - width) / 2;
    let height = area.height.saturating_sub(area.height / 4);
    let y = area.y + area.height / 8;
    Rect::new(x, y, width, height)
}
