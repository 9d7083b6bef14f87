//! Screen drawing.

use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::{
    events::{Confirm, Screen},
    input, layout,
    shortcuts::Shortcuts,
    validation::ValidationStatus,
};

use super::App;

/// Draw the current screen plus any popup.
pub fn draw(f: &mut Frame, app: &App) {
    let main_layout = layout::create_main_layout(f.area());
    let body_layout = layout::create_body_layout(main_layout.body);

    match app.ui.screen {
        Screen::Login => draw_login(f, app, body_layout.main),
        Screen::Home => draw_home(f, app, body_layout.main),
        Screen::Tasks => draw_tasks(f, app, body_layout.main),
        Screen::Capture | Screen::Scanner => draw_capture(f, app, body_layout.main),
    }

    let info = Paragraph::new(build_info_text(app))
        .block(Block::default().borders(Borders::ALL).title("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, body_layout.info);

    let help_bar = Paragraph::new(get_help_text(app.ui.screen, &app.shortcuts))
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
    if let Some(c) = app.ui.confirm {
        draw_confirm(f, c, &app.shortcuts);
    }
}

fn draw_login(f: &mut Frame, app: &App, area: Rect) {
    let masked = "*".repeat(app.login_cpf.chars().count());
    let text = format!(
        "Operator sign-in\n\nCPF:       {}\nMatricula: {}",
        or_dash(&masked),
        or_dash(&app.login_matricula),
    );
    let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("LOGIN"));
    f.render_widget(p, area);
}

fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    let who = app
        .session
        .current()
        .map(|s| format!("{} (site {})", s.operator_name, s.site_id))
        .unwrap_or_else(|| "-".into());
    let text = format!(
        "Operator: {who}\n\nPending tasks: {}",
        app.tasks.len()
    );
    let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("HOME"));
    f.render_widget(p, area);
}

fn draw_tasks(f: &mut Frame, app: &App, area: Rect) {
    let rows = app.tasks.iter().enumerate().map(|(i, t)| {
        Row::new(vec![
            format!("{}", i + 1),
            t.expected_identity.clone(),
            t.description.clone(),
            t.kind.clone(),
            t.created_day().to_string(),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(15),
            Constraint::Min(10),
            Constraint::Length(12),
            Constraint::Length(11),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title("PENDING TASKS"))
    .header(Row::new(vec!["#", "code", "description", "kind", "created"]).bold())
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(255, 140, 0))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    if !app.tasks.is_empty() {
        state.select(Some(app.ui.selected));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_capture(f: &mut Frame, app: &App, area: Rect) {
    let d = &app.draft;
    let title = match d.bound_task() {
        Some(t) => format!("RESOLVE TASK {}", t.id),
        None if d.identity_editable() => "MANUAL CAPTURE".into(),
        None => "CAPTURE".into(),
    };

    let quantity = match (d.quantity_unit(), d.quantity_locked()) {
        (Some(unit), true) => format!("{} {unit} (from label)", d.quantity()),
        (Some(unit), false) => format!("{} {unit}", d.quantity()),
        _ => d.quantity().to_string(),
    };

    let mut lines = vec![
        Line::from(format!("Code:        {}", or_dash(d.identity()))),
        Line::from(format!("Description: {}", or_dash(d.description()))),
        Line::from(format!("Quantity:    {}", or_dash(&quantity))),
        Line::from(format!("Validity:    {}", or_dash(d.validity_date()))),
        Line::from(format!("Created:     {}", d.creation_date())),
    ];

    if let Some(status) = d.validation() {
        lines.push(Line::from(""));
        let color = match status {
            ValidationStatus::Pending => Color::Yellow,
            ValidationStatus::Matched => Color::Green,
            ValidationStatus::Mismatch => Color::Red,
        };
        lines.push(Line::from(vec![
            Span::raw("Validation:  "),
            Span::styled(
                status.label(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]));
        if let Some(scanned) = d.last_scanned_identity() {
            lines.push(Line::from(format!("Last scan:   {scanned}")));
        }
    }

    if app.in_flight.is_some() {
        lines.push(Line::from(""));
        lines.push(Line::from("Submitting..."));
    } else if !d.submission_allowed() {
        lines.push(Line::from(""));
        lines.push(Line::from("Scan the product to enable submission."));
    }

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn draw_confirm(f: &mut Frame, c: Confirm, sc: &Shortcuts) {
    let question = match c {
        Confirm::LeaveCapture => "Discard the current capture?",
        Confirm::SignOut => "End the session?",
    };
    let area = centered(f.area(), 50, 5);
    f.render_widget(Clear, area);
    let p = Paragraph::new(format!(
        "{question}\n\n{}: yes | {}: no",
        format_keys(&sc.confirm.yes),
        format_keys(&sc.confirm.no)
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("CONFIRM"))
    .style(Style::default().bg(Color::DarkGray));
    f.render_widget(p, area);
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(rows[1])[1]
}

fn build_info_text(app: &App) -> String {
    let selected = match (app.ui.screen, app.tasks.get(app.ui.selected)) {
        (Screen::Tasks, Some(t)) => format!(
            "Task: {}\nCode: {}\nProduct: {}\n\n",
            t.id,
            t.expected_identity,
            t.product_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".into())
        ),
        _ => String::new(),
    };
    format!(
        "{selected}Server: {}\n\nLog:\n{}",
        app.cfg.api.base_url,
        app.ui
            .log
            .iter()
            .rev()
            .take(8)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn build_status_bar(app: &App) -> Paragraph<'static> {
    let screen_name = match app.ui.screen {
        Screen::Login => "Login",
        Screen::Home => "Home",
        Screen::Tasks => "Tasks",
        Screen::Capture => "Capture",
        Screen::Scanner => "Scan",
    };

    let status_text = match &app.ui.error {
        Some(err) => format!("[{screen_name}] ERROR: {err}"),
        None => format!("[{screen_name}] {}", app.ui.status),
    };

    let mut bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });
    if app.ui.error.is_some() {
        bar = bar.style(Style::default().fg(Color::Red));
    }
    bar
}

fn get_help_text(screen: Screen, sc: &Shortcuts) -> String {
    match screen {
        Screen::Login => format!(
            "{}: CPF | {}: matricula | {}: sign in | {}: quit",
            format_keys(&sc.login.cpf),
            format_keys(&sc.login.matricula),
            format_keys(&sc.login.sign_in),
            format_keys(&sc.login.quit)
        ),
        Screen::Home => format!(
            "{}: scan | {}: manual | {}: tasks | {}: refresh | {}: sign out | {}: quit",
            format_keys(&sc.home.new_capture),
            format_keys(&sc.home.manual_capture),
            format_keys(&sc.home.tasks),
            format_keys(&sc.home.refresh),
            format_keys(&sc.home.sign_out),
            format_keys(&sc.home.quit)
        ),
        Screen::Tasks => format!(
            "{}: resolve | {}/{}: navigate | {}: refresh | {}: back",
            format_keys(&sc.tasks.resolve),
            format_keys(&sc.tasks.up),
            format_keys(&sc.tasks.down),
            format_keys(&sc.tasks.refresh),
            format_keys(&sc.tasks.back)
        ),
        Screen::Capture | Screen::Scanner => format!(
            "{}: scan | {}: code | {}: quantity | {}: validity | {}: submit | {}: back",
            format_keys(&sc.capture.scan),
            format_keys(&sc.capture.identity),
            format_keys(&sc.capture.quantity),
            format_keys(&sc.capture.validity),
            format_keys(&sc.capture.submit),
            format_keys(&sc.capture.back)
        ),
    }
}

fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}
