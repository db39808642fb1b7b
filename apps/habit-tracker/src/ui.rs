//! UI rendering for habit tracker.

use crate::app::{App, EditField, MessageType, View};
use habit_core::engine::week_containing;
use habit_core::summary::{self, DayProgress};
use habit_core::HabitRepository;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph,
        Row, Table, Wrap,
    },
    Frame,
};

/// Draw the application.
pub fn draw<R: HabitRepository>(f: &mut Frame, app: &App<R>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer/status
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    // Draw popups
    if app.show_help {
        draw_help_popup(f);
    }

    if let Some(dialog) = &app.confirm_dialog {
        draw_confirm_dialog(f, dialog);
    }

    if app.editing {
        draw_edit_dialog(f, app);
    }
}

fn draw_header<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let date_str = app.selected_date.format(&app.config.display.date_format);
    let title = format!(" {} - {} ", app.view_title(), date_str);

    // View tabs
    let tabs: Vec<Span> = vec![
        styled_tab("1:Habits", app.view == View::Habits),
        Span::raw(" "),
        styled_tab("2:Calendar", app.view == View::Calendar),
        Span::raw(" "),
        styled_tab("3:Dashboard", app.view == View::Dashboard),
    ];

    let header = Paragraph::new(Line::from(tabs))
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Center);

    f.render_widget(header, area);
}

fn styled_tab(label: &str, active: bool) -> Span<'static> {
    if active {
        Span::styled(
            format!("[{}]", label),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {} ", label), Style::default().fg(Color::Gray))
    }
}

fn draw_content<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    match app.view {
        View::Habits => draw_habits_view(f, app, area),
        View::Calendar => draw_calendar_view(f, app, area),
        View::Dashboard => draw_dashboard_view(f, app, area),
    }
}

fn draw_habits_view<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    draw_week_table(f, app, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(9),
        ])
        .split(chunks[1]);

    draw_daily_gauge(f, app, side[0]);
    draw_top_habits(f, app, side[1]);
    draw_weekly_progress(f, app, side[2]);
}

fn draw_week_table<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let week = week_containing(app.selected_date, app.config.display.week_start);
    let title = format!(" Daily Habits - week of {} ", week[0]);

    if app.habits().is_empty() {
        let msg = Paragraph::new("No habits yet. Press 'a' to add your first habit.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let mut header_cells = vec![Cell::from("#"), Cell::from("Habit"), Cell::from("Goal")];
    for day in week {
        let style = if day == app.selected_date {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if day == app.today {
            Style::default().add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };
        header_cells.push(Cell::from(Span::styled(day.format("%a %d"), style)));
    }
    header_cells.push(Cell::from("Streak"));
    header_cells.push(Cell::from("Best"));

    let header = Row::new(header_cells)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .habits()
        .iter()
        .enumerate()
        .map(|(i, habit)| {
            let color = hex_color(&habit.color);
            let selected_row = i == app.selected_index;

            let mut cells = vec![
                Cell::from((i + 1).to_string()),
                Cell::from(Line::from(vec![
                    Span::styled(habit.icon.clone(), Style::default().fg(color)),
                    Span::raw(" "),
                    Span::raw(habit.name.clone()),
                ])),
                Cell::from(habit.goal.to_string()),
            ];

            for day in week {
                let (mark, mut style) = if habit.is_completed_on(day) {
                    ("[x]", Style::default().fg(color).add_modifier(Modifier::BOLD))
                } else if day > app.today {
                    (" · ", Style::default().fg(Color::DarkGray))
                } else {
                    ("[ ]", Style::default().fg(Color::Gray))
                };
                if selected_row && day == app.selected_date {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                cells.push(Cell::from(Span::styled(mark, style)));
            }

            cells.push(Cell::from(Span::styled(
                format!("{}d", habit.streak()),
                Style::default().fg(Color::Magenta),
            )));
            cells.push(Cell::from(format!("{}d", habit.longest_streak())));

            let style = if selected_row {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(cells).style(style)
        })
        .collect();

    let mut widths = vec![
        Constraint::Length(3),
        Constraint::Min(14),
        Constraint::Length(4),
    ];
    widths.extend([Constraint::Length(6); 7]);
    widths.extend([Constraint::Length(6), Constraint::Length(5)]);

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn draw_daily_gauge<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let progress = app.selected_day_progress();
    let percentage = progress.percentage();

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Daily Progress "),
        )
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Rgb(251, 191, 36)))
        .ratio((percentage / 100.0).clamp(0.0, 1.0))
        .label(format!(
            "{}/{} completed ({:.1}%)",
            progress.completed, progress.total, percentage
        ));

    f.render_widget(gauge, area);
}

fn draw_top_habits<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let top = summary::top_habits(app.habits(), app.today, 10);

    let items: Vec<ListItem> = if top.is_empty() {
        vec![ListItem::new(Span::styled(
            "No habits to display",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        top.iter()
            .enumerate()
            .map(|(rank, ranked)| {
                let color = hex_color(&ranked.habit.color);
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:>2}. ", rank + 1)),
                    Span::raw(format!("{:<14} ", truncate(&ranked.habit.name, 14))),
                    Span::styled(progress_bar(ranked.rate as f64, 10), Style::default().fg(color)),
                    Span::raw(format!(" {:>3}%", ranked.rate)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Top 10 Habits "),
    );

    f.render_widget(list, area);
}

fn draw_weekly_progress<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let week = summary::weekly_progress(
        app.habits(),
        app.selected_date,
        app.config.display.week_start,
    );

    let lines: Vec<Line> = week
        .iter()
        .map(|p| {
            Line::from(vec![
                Span::raw(format!("{} ", p.day.format("%a %d"))),
                Span::styled(
                    progress_bar(p.percentage(), 12),
                    Style::default().fg(Color::Rgb(99, 102, 241)),
                ),
                Span::raw(format!(" {}/{}", p.completed, p.total)),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Weekly Progress "),
    );

    f.render_widget(widget, area);
}

fn draw_calendar_view<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let grid = summary::month_grid(
        app.habits(),
        app.selected_date.year(),
        app.selected_date.month(),
        app.config.display.week_start,
    );
    let weeks = grid.weeks();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(weeks.len() as u16 + 3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    const CELL_WIDTH: usize = 9;
    let mut lines: Vec<Line> = Vec::new();

    // Weekday labels in configured week order.
    let labels = week_containing(app.selected_date, app.config.display.week_start);
    lines.push(Line::from(
        labels
            .iter()
            .map(|d| {
                Span::styled(
                    format!("{:^width$}", d.format("%a"), width = CELL_WIDTH),
                    Style::default().add_modifier(Modifier::BOLD),
                )
            })
            .collect::<Vec<_>>(),
    ));

    for week in &weeks {
        let spans: Vec<Span> = week
            .iter()
            .map(|cell| match cell {
                None => Span::raw(" ".repeat(CELL_WIDTH)),
                Some(progress) => calendar_cell(app, progress, CELL_WIDTH),
            })
            .collect();
        lines.push(Line::from(spans));
    }

    let month_title = format!(" {} ", app.selected_date.format("%B %Y"));
    let calendar = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(month_title))
        .alignment(Alignment::Center);
    f.render_widget(calendar, chunks[0]);

    // Legend
    let legend = Paragraph::new(Line::from(vec![
        Span::styled(" dd ", Style::default().add_modifier(Modifier::UNDERLINED)),
        Span::raw("Today  "),
        Span::styled(" dd ", Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw("Selected   Less "),
        Span::styled("  ", Style::default().bg(rate_to_color(0.0))),
        Span::raw(" "),
        Span::styled("  ", Style::default().bg(rate_to_color(0.2))),
        Span::raw(" "),
        Span::styled("  ", Style::default().bg(rate_to_color(0.4))),
        Span::raw(" "),
        Span::styled("  ", Style::default().bg(rate_to_color(0.6))),
        Span::raw(" "),
        Span::styled("  ", Style::default().bg(rate_to_color(1.0))),
        Span::raw(" More"),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[1]);

    draw_day_habits(f, app, chunks[2]);
}

fn calendar_cell<R: HabitRepository>(
    app: &App<R>,
    progress: &DayProgress,
    width: usize,
) -> Span<'static> {
    let count = if progress.completed > 0 {
        format!("{}/{}", progress.completed, progress.total)
    } else {
        String::new()
    };
    let text = format!("{:>3} {:<5}", progress.day.day(), count);
    let text = format!("{:<width$}", text, width = width);

    let mut style = Style::default();
    if progress.completed > 0 {
        style = style
            .bg(rate_to_color(progress.percentage() as f32 / 100.0))
            .fg(Color::White);
    }
    if progress.day == app.today {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    if progress.day == app.selected_date {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(text, style)
}

fn draw_day_habits<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let day = app.selected_date;
    let title = format!(" Habits for {} ", day.format("%A, %B %d, %Y"));

    if app.habits().is_empty() {
        let msg = Paragraph::new("No habits yet. Add some habits to track!")
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let items: Vec<ListItem> = app
        .habits()
        .iter()
        .enumerate()
        .map(|(i, habit)| {
            let done = habit.is_completed_on(day);
            let color = hex_color(&habit.color);
            let line = Line::from(vec![
                Span::styled("▌", Style::default().fg(color)),
                Span::raw(format!("{} ", habit.icon)),
                Span::styled(
                    habit.name.clone(),
                    if done {
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT)
                    } else {
                        Style::default()
                    },
                ),
                Span::raw(" "),
                Span::styled(
                    if done { "✓" } else { "○" },
                    Style::default().fg(if done { Color::Green } else { Color::Gray }),
                ),
            ]);
            let style = if i == app.selected_index {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn draw_dashboard_view<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let stats = summary::dashboard(app.habits(), app.today);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(12),
            Constraint::Min(0),
        ])
        .split(area);

    // Stat cards
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(chunks[0]);
    let values = [
        ("Total Habits", stats.total_habits.to_string()),
        ("Total Completions", stats.total_completions.to_string()),
        ("Total Streak Days", stats.total_streak.to_string()),
        ("Avg Completion Rate", format!("{}%", stats.avg_completion_rate)),
    ];
    for ((label, value), area) in values.into_iter().zip(cards.iter()) {
        let card = Paragraph::new(vec![
            Line::from(Span::styled(
                value,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(label),
        ])
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(card, *area);
    }

    // Charts
    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let activity: Vec<Bar> = stats
        .last_7_days
        .iter()
        .map(|p| {
            Bar::default()
                .value(p.completed as u64)
                .label(Line::from(p.day.format("%a")))
        })
        .collect();
    let activity_chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Last 7 Days Activity "),
        )
        .data(BarGroup::default().bars(&activity))
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Rgb(99, 102, 241)));
    f.render_widget(activity_chart, charts[0]);

    let streaks: Vec<Bar> = app
        .habits()
        .iter()
        .map(|habit| {
            Bar::default()
                .value(habit.streak() as u64)
                .label(Line::from(truncate(&habit.name, 6)))
                .style(Style::default().fg(hex_color(&habit.color)))
        })
        .collect();
    let streak_chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Current Streaks "),
        )
        .data(BarGroup::default().bars(&streaks))
        .bar_width(6)
        .bar_gap(1);
    f.render_widget(streak_chart, charts[1]);

    draw_habit_table(f, app, chunks[2]);
}

fn draw_habit_table<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    if app.habits().is_empty() {
        let msg = Paragraph::new("No habits to display. Add some habits to see your statistics!")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(vec!["Habit", "Completions", "Current", "Best", "Rate", "Goal"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .habits()
        .iter()
        .enumerate()
        .map(|(i, habit)| {
            let style = if i == app.selected_index {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                format!("{} {}", habit.icon, habit.name),
                habit.total_completions().to_string(),
                format!("{} days", habit.streak()),
                format!("{} days", habit.longest_streak()),
                format!("{:.0}%", habit.completion_rate(app.today).min(100.0)),
                format!("{}/{}", habit.total_completions(), habit.goal),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Habit Statistics "));

    f.render_widget(table, area);
}

fn draw_footer<R: HabitRepository>(f: &mut Frame, app: &App<R>, area: Rect) {
    let (msg, style) = if let Some((ref message, msg_type)) = app.message {
        let color = match msg_type {
            MessageType::Info => Color::Blue,
            MessageType::Success => Color::Green,
            MessageType::Warning => Color::Yellow,
            MessageType::Error => Color::Red,
        };
        (message.clone(), Style::default().fg(color))
    } else {
        let help = match app.view {
            View::Habits => "j/k:Habit  h/l:Day  Space:Toggle  a:Add  e:Rename  g:Goal  d:Delete  ?:Help  q:Quit",
            View::Calendar => "h/l:Day  H/L:Week  [/]:Month  j/k:Habit  Space:Toggle  t:Today  ?:Help  q:Quit",
            View::Dashboard => "j/k:Habit  1:Habits  2:Calendar  x:Export  i:Import  ?:Help  q:Quit",
        };
        (help.to_string(), Style::default().fg(Color::DarkGray))
    };

    let footer = Paragraph::new(msg)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help_text = r#"
Habit Tracker Keybindings

Navigation:
  j/k, Up/Down    Select habit
  Home/End        First/last habit
  h/l, Left/Right Previous/next day
  H/L             Previous/next week
  [ / ]           Previous/next month
  t               Jump to today

Views:
  1               Habits
  2, c            Calendar
  3, s            Dashboard
  Tab             Next view

Actions:
  Space, Enter    Toggle completion on selected day
  a               Add new habit
  e               Rename habit
  g               Change goal
  d               Delete habit
  x               Export to JSON
  i               Import from JSON

General:
  ?               Show this help
  q               Quit

Press any key to close
"#;

    let popup = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });

    f.render_widget(popup, area);
}

fn draw_confirm_dialog(f: &mut Frame, dialog: &crate::app::ConfirmDialog) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let text = Paragraph::new(dialog.message.clone())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", dialog.title)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(text, area);
}

fn draw_edit_dialog<R: HabitRepository>(f: &mut Frame, app: &App<R>) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let title = match app.editing_field {
        EditField::HabitName => "Enter habit name".to_string(),
        EditField::NewHabitGoal => format!(
            "Goal in days for '{}'",
            app.pending_name.as_deref().unwrap_or_default()
        ),
        EditField::Goal => "Enter goal (days)".to_string(),
        EditField::Rename => "Rename habit".to_string(),
        EditField::None => String::new(),
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", title)),
        )
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(input, area);

    // Show cursor
    f.set_cursor_position((
        area.x + 1 + app.input_buffer.chars().count() as u16,
        area.y + 1,
    ));
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn rate_to_color(rate: f32) -> Color {
    if rate == 0.0 {
        Color::Rgb(22, 27, 34)
    } else if rate < 0.25 {
        Color::Rgb(14, 68, 41)
    } else if rate < 0.5 {
        Color::Rgb(0, 109, 50)
    } else if rate < 0.75 {
        Color::Rgb(38, 166, 65)
    } else {
        Color::Rgb(57, 211, 83)
    }
}

/// Parse a `#rrggbb` habit color.
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Color::Cyan;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Cyan,
    }
}

/// Text progress bar for a percentage in `[0, 100]`.
fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
