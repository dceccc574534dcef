use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use name_picker::{
    CatalogResult, FilterEngine, InitialFilter, ResultLimit, UserId, YearWindow,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;

/// Year windows offered by y/Y, narrowest first
const WINDOW_STEPS: [u16; 6] = [1, 5, 10, 25, 50, 0];

/// Result limits offered by l/L (0 = all)
const LIMIT_STEPS: [usize; 5] = [0, 10, 25, 50, 100];

pub struct App {
    pub engine: FilterEngine,
    pub state: TableState,
    /// Names marked for the active user's next save, in marking order
    pub marked: Vec<String>,
    /// Marks a user left behind on Tab, saved or not
    stashed_marks: HashMap<UserId, Vec<String>>,
    pub awaiting_initial: bool,
    pub status: Option<String>,
}

impl App {
    pub fn new(engine: FilterEngine) -> Self {
        let mut app = Self {
            engine,
            state: TableState::default(),
            marked: Vec::new(),
            stashed_marks: HashMap::new(),
            awaiting_initial: false,
            status: None,
        };
        app.refresh();
        app
    }

    /// Re-run the query; a no-op inside the engine when nothing changed
    pub fn refresh(&mut self) {
        let len = self.engine.refresh().len();

        // Reset selection to first item
        if len == 0 {
            self.state.select(None);
        } else if self.state.selected().map_or(true, |i| i >= len) {
            self.state.select(Some(0));
        }
    }

    pub fn entries(&self) -> &[String] {
        self.engine.display_list()
    }

    fn selected_name(&self) -> Option<String> {
        self.state
            .selected()
            .and_then(|i| self.entries().get(i))
            .and_then(|entry| entry.split(' ').next())
            .map(str::to_string)
    }

    pub fn is_marked(&self, entry: &str) -> bool {
        entry
            .split(' ')
            .next()
            .map_or(false, |name| self.marked.iter().any(|m| m == name))
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    pub fn cycle_gender(&mut self) {
        let next = self.engine.params().gender.cycle();
        self.engine.set_gender(next);
        self.refresh();
    }

    pub fn cycle_sort(&mut self) {
        let next = self.engine.params().sort.cycle();
        self.engine.set_sort(next);
        self.refresh();
    }

    pub fn set_initial(&mut self, initial: InitialFilter) {
        self.engine.set_initial(initial);
        self.awaiting_initial = false;
        self.refresh();
    }

    /// Move along WINDOW_STEPS; `wider` goes toward "all years"
    pub fn step_window(&mut self, wider: bool) {
        let windows: Vec<YearWindow> = WINDOW_STEPS.iter().map(|n| YearWindow::last(*n)).collect();
        let current = self.engine.params().years;
        let pos = windows.iter().position(|w| *w == current).unwrap_or(windows.len() - 1);

        let next = if wider {
            (pos + 1).min(windows.len() - 1)
        } else {
            pos.saturating_sub(1)
        };

        self.engine.set_years(windows[next]);
        self.refresh();
    }

    pub fn step_limit(&mut self, forward: bool) {
        let limits: Vec<ResultLimit> = LIMIT_STEPS.iter().map(|n| ResultLimit::top(*n)).collect();
        let current = self.engine.params().limit;
        let pos = limits.iter().position(|l| *l == current).unwrap_or(0);

        let next = if forward {
            (pos + 1) % limits.len()
        } else {
            (pos + limits.len() - 1) % limits.len()
        };

        self.engine.set_limit(limits[next]);
        self.refresh();
    }

    pub fn reset(&mut self) {
        self.engine.reset_params();
        self.state.select(None);
        self.refresh();
    }

    // ========================================================================
    // SELECTIONS
    // ========================================================================

    pub fn toggle_mark(&mut self) {
        let Some(name) = self.selected_name() else {
            return;
        };

        if let Some(pos) = self.marked.iter().position(|m| *m == name) {
            self.marked.remove(pos);
        } else {
            self.marked.push(name);
        }
    }

    /// Store the marked names as the active user's selection
    pub fn save_selection(&mut self) -> CatalogResult<usize> {
        let ids = self.engine.resolve_display_entries(&self.marked)?;
        let count = ids.len();
        let user = self.engine.active_user().get();
        self.engine.set_selection(user, ids)?;

        self.status = Some(format!("Saved {} names for user {}", count, user));
        Ok(count)
    }

    /// Hand the picker to the other user.
    ///
    /// The outgoing user's marks are kept, unsaved ones included. The
    /// incoming user gets back whatever they left, or their saved list
    /// the first time round.
    pub fn switch_user(&mut self) -> CatalogResult<()> {
        let current = self.engine.active_user();
        let next = current.other();
        self.engine.set_active_user(next.get())?;

        let incoming = match self.stashed_marks.remove(&next) {
            Some(marks) => marks,
            None => self
                .engine
                .selection(next.get())?
                .iter()
                .map(|name| name.name().to_string())
                .collect(),
        };
        let outgoing = std::mem::replace(&mut self.marked, incoming);
        self.stashed_marks.insert(current, outgoing);

        self.status = Some(format!("User {} is picking", next));
        Ok(())
    }

    // ========================================================================
    // NAVIGATION
    // ========================================================================

    pub fn next(&mut self) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        if app.awaiting_initial {
            match key.code {
                KeyCode::Char(c) if c.is_alphabetic() => app.set_initial(InitialFilter::Letter(c)),
                _ => app.awaiting_initial = false,
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('g') => app.cycle_gender(),
            KeyCode::Char('s') => app.cycle_sort(),
            KeyCode::Char('/') => app.awaiting_initial = true,
            KeyCode::Char('0') => app.set_initial(InitialFilter::Any),
            KeyCode::Char('y') => app.step_window(true),
            KeyCode::Char('Y') => app.step_window(false),
            KeyCode::Char('l') => app.step_limit(true),
            KeyCode::Char('L') => app.step_limit(false),
            KeyCode::Char('r') => app.reset(),
            KeyCode::Char(' ') => app.toggle_mark(),
            KeyCode::Enter => {
                if let Err(err) = app.save_selection() {
                    app.status = Some(format!("Save failed: {}", err));
                }
            }
            KeyCode::Tab | KeyCode::BackTab => {
                if let Err(err) = app.switch_user() {
                    app.status = Some(format!("Switch failed: {}", err));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::Home => app.state.select(Some(0)),
            KeyCode::End => {
                let len = app.entries().len();
                if len > 0 {
                    app.state.select(Some(len - 1));
                }
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with parameters
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(65), // Result list
            Constraint::Percentage(35), // Active user's selection
        ])
        .split(chunks[1]);

    render_table(f, content_chunks[0], app);
    render_selection_panel(f, content_chunks[1], app);

    render_status_bar(f, chunks[2], app);
}

fn user_color(user: UserId) -> Color {
    if user == UserId::FIRST {
        Color::Magenta
    } else {
        Color::Blue
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let params = app.engine.params();
    let user = app.engine.active_user();
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let spans = vec![
        Span::styled(
            format!("User {}", user),
            Style::default().fg(user_color(user)).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ),
        Span::raw("  │  "),
        Span::styled("gender ", label),
        Span::styled(params.gender.to_string(), value),
        Span::raw("  "),
        Span::styled("sort ", label),
        Span::styled(params.sort.to_string(), value),
        Span::raw("  "),
        Span::styled("initial ", label),
        Span::styled(params.initial.to_string(), value),
        Span::raw("  "),
        Span::styled("years ", label),
        Span::styled(params.years.to_string(), value),
        Span::raw("  "),
        Span::styled("limit ", label),
        Span::styled(params.limit.to_string(), value),
        Span::raw("  │  "),
        Span::styled(
            format!("Catalog: {}", app.engine.len()),
            Style::default().fg(Color::White),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "#", "Name (popularity category)"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let marker_color = user_color(app.engine.active_user());
    let rows: Vec<Row> = app
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let color = if entry.ends_with(" F)") {
                Color::LightRed
            } else if entry.ends_with(" M)") {
                Color::LightCyan
            } else {
                Color::LightGreen
            };
            let marker = if app.is_marked(entry) { "★" } else { "" };

            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(marker_color)),
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(entry.clone()).style(Style::default().fg(color)),
            ])
            .height(1)
        })
        .collect();

    let title = format!(" Names ({}) ", rows.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(7),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_selection_panel(f: &mut Frame, area: Rect, app: &App) {
    let user = app.engine.active_user();
    let saved = app.engine.selection(user.get()).unwrap_or_default();

    let mut content = vec![
        Line::from(vec![Span::styled(
            "  MARKED",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
    ];

    if app.marked.is_empty() {
        content.push(Line::from(Span::styled(
            "  (Space marks a name)",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    for name in &app.marked {
        content.push(Line::from(format!("  ★ {}", name)));
    }

    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────"));
    content.push(Line::from(""));

    let saved_label = match app.engine.selection_saved_at(user.get()).ok().flatten() {
        Some(at) => format!("  SAVED ({})", at.format("%H:%M:%S")),
        None => "  SAVED (never)".to_string(),
    };
    content.push(Line::from(vec![Span::styled(
        saved_label,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )]));
    content.push(Line::from(""));

    for name in saved {
        content.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(name.name().to_string(), Style::default().fg(Color::Green)),
            Span::styled(
                format!("  {}", name.category().as_str()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(user_color(user)))
            .title(format!(" User {} Shortlist ", user)),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let text = if app.awaiting_initial {
        Line::from(Span::styled(
            "Type a starting letter (any other key cancels)",
            Style::default().fg(Color::Yellow),
        ))
    } else {
        let mut spans = vec![Span::styled(
            "g gender · s sort · / letter · 0 any · y/Y years · l/L limit · r reset · Space mark · Enter save · Tab user · q quit",
            Style::default().fg(Color::DarkGray),
        )];
        if let Some(status) = &app.status {
            spans.push(Span::raw("  │  "));
            spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
        }
        Line::from(spans)
    };

    let bar = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use name_picker::{GenderFilter, Sex, SortMode};

    fn test_app() -> App {
        let mut engine = FilterEngine::with_years(2000, 2001).unwrap();
        engine.add_record("Ada", Sex::Female, 2000, 30).unwrap();
        engine.add_record("Ben", Sex::Male, 2001, 20).unwrap();
        engine.add_record("Cal", Sex::Male, 2000, 10).unwrap();
        engine.finalize();
        App::new(engine)
    }

    #[test]
    fn test_new_app_shows_catalog() {
        let app = test_app();

        assert_eq!(app.entries().len(), 3);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_parameter_cycling() {
        let mut app = test_app();

        app.cycle_gender();
        assert_eq!(app.engine.params().gender, GenderFilter::Female);
        assert_eq!(app.entries(), &["Ada (30 F)"]);

        app.cycle_sort();
        assert_eq!(app.engine.params().sort, SortMode::PopularityDesc);

        app.step_window(false);
        assert_eq!(app.engine.params().years, YearWindow::last(50));

        app.step_limit(true);
        assert_eq!(app.engine.params().limit, ResultLimit::top(10));

        app.reset();
        assert_eq!(app.entries().len(), 3);
    }

    #[test]
    fn test_mark_save_and_switch_user() {
        let mut app = test_app();

        app.toggle_mark(); // Ada
        app.next();
        app.toggle_mark(); // Ben
        assert!(app.is_marked("Ben (20 M)"));

        assert_eq!(app.save_selection().unwrap(), 2);

        app.switch_user().unwrap();
        assert_eq!(app.engine.active_user(), UserId::SECOND);
        assert!(app.marked.is_empty(), "user 2 starts with nothing");

        app.switch_user().unwrap();
        assert_eq!(app.marked, vec!["Ada".to_string(), "Ben".to_string()]);
    }

    #[test]
    fn test_unsaved_marks_survive_user_switch() {
        let mut app = test_app();

        app.toggle_mark(); // Ada, never saved
        app.switch_user().unwrap();
        assert!(app.marked.is_empty());

        app.next();
        app.toggle_mark(); // Ben for user 2
        app.switch_user().unwrap();

        assert_eq!(app.engine.active_user(), UserId::FIRST);
        assert_eq!(app.marked, vec!["Ada".to_string()]);
        assert!(app.engine.selection(1).unwrap().is_empty(), "switching must not save");

        app.switch_user().unwrap();
        assert_eq!(app.marked, vec!["Ben".to_string()]);
    }
}
