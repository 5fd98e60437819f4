use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use chrono::Local;
use crate::filter::{DateRange, SortOrder};
use crate::models::{Priority, TaskStatus};
use super::app::{App, InputMode, ViewMode};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Tasks => {
            let today = Local::now().date_naive();

            let rows: Vec<Row> = app
                .visible
                .iter()
                .map(|t| {
                    let time_left_str = match t.due_date {
                        Some(due) => {
                            let days_left = (due - today).num_days();
                            if days_left < 0 {
                                format!("{}d overdue", days_left.abs())
                            } else if days_left == 0 {
                                "Today".to_string()
                            } else {
                                format!("{}d", days_left)
                            }
                        }
                        None => "-".to_string(),
                    };

                    let style = if t.status == TaskStatus::Completed {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        match t.priority {
                            Priority::Urgent => Style::default().fg(Color::Red),
                            Priority::High => Style::default().fg(Color::Yellow),
                            Priority::Medium | Priority::Low => Style::default().fg(Color::Green),
                        }
                    };

                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(t.title.clone()),
                        Cell::from(t.status.to_string()),
                        Cell::from(t.priority.to_string()),
                        Cell::from(t.assignee_id.clone().unwrap_or_default()),
                        Cell::from(t.tags.join(",")),
                        Cell::from(t.due_date.map(|d| d.to_string()).unwrap_or_default()),
                        Cell::from(time_left_str),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(14),
                Constraint::Length(12),
                Constraint::Length(12),
            ];

            let order = match app.spec.sort_order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            let range = match app.spec.date_range {
                DateRange::All => "all",
                DateRange::Today => "today",
                DateRange::Week => "week",
                DateRange::Month => "month",
                DateRange::Overdue => "overdue",
                DateRange::Custom { .. } => "custom",
            };
            let title = format!(
                "Taskboard - Tasks [sort: {:?} {} | range: {} | search: '{}']",
                app.spec.sort_by, order, range, app.spec.query
            );

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Status", "Priority", "Assignee", "Tags", "Due", "Time Left"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.state);
        }
        ViewMode::Templates => {
            let rows: Vec<Row> = app
                .templates()
                .iter()
                .map(|t| {
                    let style = if t.is_active {
                        Style::default()
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(t.title.clone()),
                        Cell::from(t.schedule.to_string()),
                        Cell::from(t.time.format("%H:%M").to_string()),
                        Cell::from(t.priority.to_string()),
                        Cell::from(if t.is_active { "yes" } else { "no" }),
                        Cell::from(t.last_run.map(|r| r.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()),
                        Cell::from(t.next_run.format("%Y-%m-%d %H:%M").to_string()),
                    ]).style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(4),
                Constraint::Min(20),
                Constraint::Length(18),
                Constraint::Length(6),
                Constraint::Length(8),
                Constraint::Length(6),
                Constraint::Length(17),
                Constraint::Length(17),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["ID", "Title", "Schedule", "Time", "Priority", "Active", "Last Run", "Next Run"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Taskboard - Templates"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.template_state);
        }
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | /: Search | s: Sort | o: Order | r: Range | Space: Advance | d: Del | v: Templates",
            ViewMode::Templates => "q: Quit | Enter: Run Now | t: Toggle Active | d: Del | v: Tasks",
        },
        InputMode::Search => "Enter: Apply | Esc: Cancel",
    };
    let help_line = match &app.message {
        Some(msg) => format!("{}  ·  {}", msg, help_text),
        None => help_text.to_string(),
    };

    let help = Paragraph::new(help_line)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    if app.input_mode == InputMode::Search {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);
        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Search title/description"));
        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
