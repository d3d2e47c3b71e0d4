use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, text::{Line, Span}, widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use bookshelf::{
    client::{api::BooksClient, form::{BookForm, FormField}},
    domain::{book::{Book, BookId, ReadingStatus}, validation::MAX_RATING},
};

/// Shown for every failed request; the cause is not surfaced to the reader.
const GENERIC_ERROR: &str = "Could not reach the book collection. Please try again later.";

#[tokio::main]
async fn main() -> Result<()> {
    let client = BooksClient::from_env();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Form, ConfirmDelete }

struct App {
    client: BooksClient,
    books: Vec<Book>,
    list_state: ListState,
    mode: Mode,
    form: BookForm,
    /// `None` while creating.
    editing: Option<BookId>,
    message: Option<String>,
}

impl App {
    async fn load(&mut self) {
        match self.client.list().await {
            Ok(books) => { self.books = books; self.message = None; }
            Err(_) => self.message = Some(GENERIC_ERROR.to_string()),
        }
        let len = self.books.len();
        let selected = match self.list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
    }

    fn selected(&self) -> Option<&Book> { self.list_state.selected().and_then(|i| self.books.get(i)) }

    fn move_selection(&mut self, down: bool) {
        let Some(i) = self.list_state.selected() else { return };
        let next = if down { (i + 1).min(self.books.len().saturating_sub(1)) } else { i.saturating_sub(1) };
        self.list_state.select(Some(next));
    }

    fn open_form(&mut self, book: Option<&Book>) {
        self.form = book.map(BookForm::from_book).unwrap_or_default();
        self.editing = book.map(|b| b.id);
        self.message = None;
        self.mode = Mode::Form;
    }

    async fn submit(&mut self) {
        if let Err(errors) = self.form.validate() {
            let (field, msg) = errors[0];
            self.form.focus = field;
            self.message = Some(msg.to_string());
            return;
        }
        let res = match self.editing {
            Some(id) => self.client.update(&id, &self.form.to_update_payload()).await,
            None => self.client.create(&self.form.to_create_payload()).await,
        };
        match res {
            Ok(_) => { self.mode = Mode::View; self.load().await; }
            Err(_) => self.message = Some(GENERIC_ERROR.to_string()),
        }
    }

    async fn delete_selected(&mut self) {
        self.mode = Mode::View;
        let Some(id) = self.selected().map(|b| b.id) else { return };
        match self.client.delete(&id).await {
            Ok(()) => self.load().await,
            Err(_) => self.message = Some(GENERIC_ERROR.to_string()),
        }
    }
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, client: BooksClient) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { client, books: vec![], list_state: ListState::default(), mode: Mode::View, form: BookForm::default(), editing: None, message: None };
    app.load().await;

    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        if !event::poll(tick_rate)? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }
        match app.mode {
            Mode::View => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up => app.move_selection(false),
                KeyCode::Down => app.move_selection(true),
                KeyCode::Char('r') => app.load().await,
                KeyCode::Char('n') => app.open_form(None),
                KeyCode::Char('e') | KeyCode::Enter => {
                    let book = app.selected().cloned();
                    if book.is_some() { app.open_form(book.as_ref()); }
                }
                KeyCode::Char('d') => { if app.selected().is_some() { app.mode = Mode::ConfirmDelete; } }
                _ => {}
            },
            Mode::Form => match key.code {
                KeyCode::Esc => { app.mode = Mode::View; app.message = None; }
                KeyCode::Enter => app.submit().await,
                KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
                KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
                KeyCode::Left if app.form.focus == FormField::Status => app.form.cycle_status(false),
                KeyCode::Right if app.form.focus == FormField::Status => app.form.cycle_status(true),
                KeyCode::Backspace => app.form.backspace(),
                KeyCode::Char(c) => app.form.input_char(c),
                _ => {}
            },
            Mode::ConfirmDelete => match key.code {
                KeyCode::Char('y') => app.delete_selected().await,
                KeyCode::Char('n') | KeyCode::Esc => app.mode = Mode::View,
                _ => {}
            },
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    let help = match app.mode {
        Mode::View => "Enter/e: edit, n: new, d: delete, r: reload, q: quit",
        Mode::Form => "Tab: next field, ←/→: status, 1-5: stars (0 clears), Enter: save, Esc: cancel",
        Mode::ConfirmDelete => "y: delete, n: keep",
    };
    let header = Paragraph::new(help).block(Block::default().borders(Borders::ALL).title("my books"));
    f.render_widget(header, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let items: Vec<ListItem> = app.books.iter().map(|b| {
        ListItem::new(format!("{} by {}  [{}]", b.title, b.author, b.status.label()))
    }).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("books [{}]", app.books.len())))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol(">> ");
    f.render_stateful_widget(list, middle[0], &mut app.list_state);

    let (title, right) = match app.mode {
        Mode::Form => (if app.editing.is_some() { "edit book" } else { "new book" }, form_lines(&app.form)),
        _ => ("details", app.selected().map(detail_lines).unwrap_or_default()),
    };
    let pane = Paragraph::new(right).wrap(Wrap { trim: false }).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(pane, middle[1]);

    let footer_text = match (&app.message, app.mode) {
        (Some(msg), _) => msg.clone(),
        (None, Mode::ConfirmDelete) => format!("Delete \"{}\"? (y/n)", app.selected().map(|b| b.title.as_str()).unwrap_or_default()),
        (None, _) => app.client.base_url().to_string(),
    };
    let style = if app.message.is_some() { Style::default().fg(Color::Red) } else { Style::default() };
    let footer = Paragraph::new(footer_text).style(style).block(Block::default().borders(Borders::ALL).title("info"));
    f.render_widget(footer, chunks[2]);
}

fn stars(rating: Option<u8>) -> String {
    let filled = rating.unwrap_or(0);
    (1..=MAX_RATING).map(|i| if i <= filled { '★' } else { '☆' }).collect()
}

fn detail_lines(book: &Book) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(book.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(format!("by {}", book.author)),
        Line::from(""),
        Line::from(format!("Status: {}", book.status.label())),
    ];
    if let Some(d) = book.start_date { lines.push(Line::from(format!("Started: {d}"))); }
    if book.status == ReadingStatus::Read {
        if let Some(d) = book.end_date { lines.push(Line::from(format!("Finished: {d}"))); }
        let rating = match book.rating {
            Some(_) => stars(book.rating),
            None => "not rated".to_string(),
        };
        lines.push(Line::from(format!("Rating: {rating}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Added {}", book.created_at.format("%Y-%m-%d %H:%M"))));
    lines.push(Line::from(format!("Updated {}", book.updated_at.format("%Y-%m-%d %H:%M"))));
    lines
}

fn form_lines(form: &BookForm) -> Vec<Line<'static>> {
    form.visible_fields().into_iter().map(|field| {
        let value = match field {
            FormField::Title => form.title.clone(),
            FormField::Author => form.author.clone(),
            FormField::Status => format!("< {} >", form.status.label()),
            FormField::StartDate => form.start_date.clone(),
            FormField::EndDate => form.end_date.clone(),
            FormField::Rating => stars(form.rating),
        };
        let marker = if form.is_required(field) { "*" } else { "" };
        let cursor = if form.focus == field && !matches!(field, FormField::Status | FormField::Rating) { "_" } else { "" };
        let style = if form.focus == field { Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD) } else { Style::default() };
        Line::from(vec![
            Span::styled(format!("{}{marker}: ", field.label()), style),
            Span::raw(format!("{value}{cursor}")),
        ])
    }).collect()
}
