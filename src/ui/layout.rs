use {
    super::renderer::{format_avg_duration, format_indicators, format_maxs, format_same},
    crate::pipeline::DashboardView,
    ratatui::{
        layout::{Constraint, Direction, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph, Row, Table},
        Frame,
    },
};

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, view: &DashboardView<'_>, top_rows: usize) {
    let chunks = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Tables
            Constraint::Length(3), // Footer/Status
        ])
        .split(area);

    render_header(f, chunks[0], view);

    let columns = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_identifier_table(f, columns[0], view, top_rows);
    render_timing_table(f, columns[1], view, top_rows);
    render_footer(f, chunks[2], view);
}

fn render_header(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let clock = chrono::Local::now().format("%H:%M:%S").to_string();

    let text = vec![Line::from(vec![
        Span::styled(
            "CAN Bus data stats",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" - {} - {}", view.source, clock)),
        Span::raw("   q quit | p pause | 1-3 mode"),
    ])];

    let header = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_identifier_table(f: &mut Frame, area: Rect, view: &DashboardView<'_>, top_rows: usize) {
    let header = Row::new(vec!["repr", "id", "count", "same", "ranges"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .snapshot
        .rows
        .iter()
        .take(top_rows)
        .map(|row| {
            let color = if row.variant_name == "Generic" {
                Color::Gray
            } else {
                Color::Green
            };
            Row::new(vec![
                row.variant_name.to_string(),
                row.identifier.to_string(),
                row.count.to_string(),
                format_same(row.all_same),
                format_maxs(&row.maxs),
            ])
            .style(Style::default().fg(color))
        })
        .collect();

    let widths = [
        Constraint::Length(10), // repr
        Constraint::Length(6),  // id
        Constraint::Length(8),  // count
        Constraint::Length(5),  // same
        Constraint::Min(20),    // ranges
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Identifiers"));
    f.render_widget(table, area);
}

fn render_timing_table(f: &mut Frame, area: Rect, view: &DashboardView<'_>, top_rows: usize) {
    let header = Row::new(vec!["avg duration", "count", "last packet"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .snapshot
        .rows
        .iter()
        .take(top_rows)
        .map(|row| {
            Row::new(vec![
                format_avg_duration(row.avg_duration),
                row.count.to_string(),
                row.last.map(ToString::to_string).unwrap_or_default(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(13), // avg duration
        Constraint::Length(8),  // count
        Constraint::Min(30),    // last packet
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Timing"));
    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let state = if view.exhausted {
        Span::styled("Exhausted", Style::default().fg(Color::Red))
    } else if view.snapshot.streaming {
        Span::styled("Streaming", Style::default().fg(Color::Green))
    } else {
        Span::styled("Paused", Style::default().fg(Color::Yellow))
    };

    let text = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::Green)),
        state,
        Span::raw(" | "),
        Span::styled(
            format_indicators(view.indicators),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::raw(view.snapshot.summary()),
    ])];

    let footer = Block::default().borders(Borders::ALL).title("Status");
    f.render_widget(Paragraph::new(text).block(footer), area);
}
