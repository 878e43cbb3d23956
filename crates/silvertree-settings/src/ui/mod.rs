use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Widget, Wrap,
};

use crate::client::{ConfigService, HttpConfigService};
use crate::coerce::FieldKind;
use crate::config::ServiceSettings;
use crate::editor::Editor;
use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::text::sanitize_display;
use crate::view::{Action, FieldRef, LOGIN_FIELD, Screen, UiNode, View};

const MAX_CELL_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryKind {
    Label,
    Login,
    Button(Action),
    Section {
        id: NodeId,
        add: Option<Action>,
        delete: Option<Action>,
    },
    Row {
        table: NodeId,
        row: usize,
        key_editable: bool,
    },
    Save(NodeId),
    Wizard(NodeId),
}

/// One selectable line of the flattened view.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    depth: usize,
    text: String,
    kind: EntryKind,
}

#[derive(Debug, Clone)]
enum InputMode {
    Normal,
    EditField {
        target: FieldRef,
        label: String,
        masked: bool,
        buffer: String,
        then: Option<Action>,
    },
    ConfirmDelete {
        action: Action,
        label: String,
    },
}

struct App<S: ConfigService> {
    editor: Editor<S>,
    server: String,
    entries: Vec<Entry>,
    list: ListState,
    input: InputMode,
}

impl<S: ConfigService> App<S> {
    fn new(editor: Editor<S>, server: impl Into<String>) -> Self {
        let mut app = Self {
            editor,
            server: server.into(),
            entries: Vec::new(),
            list: ListState::default(),
            input: InputMode::Normal,
        };
        app.rebuild_entries();
        app
    }

    fn rebuild_entries(&mut self) {
        self.entries = flatten(self.editor.view());
        // Failures are already logged by the editor.
        self.editor.take_failures();
        if self.entries.is_empty() {
            self.list.select(None);
            return;
        }
        let idx = self
            .list
            .selected()
            .unwrap_or(0)
            .min(self.entries.len() - 1);
        self.list.select(Some(idx));
    }

    fn selected(&self) -> Option<&Entry> {
        self.list.selected().and_then(|i| self.entries.get(i))
    }

    fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let i = self.list.selected().unwrap_or(0);
        self.list.select(Some((i + 1).min(self.entries.len() - 1)));
    }

    fn select_prev(&mut self) {
        let i = self.list.selected().unwrap_or(0);
        self.list.select(Some(i.saturating_sub(1)));
    }

    fn dispatch(&mut self, action: Action) {
        self.editor.dispatch(action);
        self.rebuild_entries();
    }

    fn begin_edit(&mut self, target: FieldRef, label: String, then: Option<Action>) {
        let Some(field) = self.editor.view().field(target) else {
            return;
        };
        if field.read_only {
            return;
        }
        self.input = InputMode::EditField {
            target,
            label,
            masked: field.kind == FieldKind::Masked,
            buffer: field.text.clone(),
            then,
        };
    }

    fn apply_edit(&mut self) {
        let InputMode::EditField {
            target,
            buffer,
            then,
            ..
        } = std::mem::replace(&mut self.input, InputMode::Normal)
        else {
            return;
        };
        self.editor.set_field_text(target, &buffer);
        match then {
            Some(action) => self.dispatch(action),
            None => self.rebuild_entries(),
        }
    }

    fn activate_selected(&mut self) {
        let Some(entry) = self.selected().cloned() else {
            return;
        };
        match entry.kind {
            EntryKind::Label => {}
            EntryKind::Login => {
                self.begin_edit(FieldRef::Login, "Password".into(), Some(Action::Unlock));
            }
            EntryKind::Button(action) => self.dispatch(action),
            EntryKind::Section { id, .. } => self.dispatch(Action::ToggleSection(id)),
            EntryKind::Row { table, row, .. } => {
                self.begin_edit(FieldRef::RowValue { table, row }, entry.text, None);
            }
            EntryKind::Save(table) => self.dispatch(Action::SaveTable(table)),
            EntryKind::Wizard(id) => {
                self.begin_edit(
                    FieldRef::WizardName(id),
                    "New base name".into(),
                    Some(Action::ConfirmWizard(id)),
                );
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode, mods: KeyModifiers) -> Result<bool> {
        if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
            return Ok(true);
        }

        match &mut self.input {
            InputMode::EditField { buffer, .. } => {
                match code {
                    KeyCode::Esc => self.input = InputMode::Normal,
                    KeyCode::Enter => self.apply_edit(),
                    KeyCode::Backspace => {
                        buffer.pop();
                    }
                    KeyCode::Char(c) if c != '\n' && c != '\r' => buffer.push(c),
                    _ => {}
                }
                return Ok(false);
            }
            InputMode::ConfirmDelete { action, .. } => {
                match code {
                    KeyCode::Enter | KeyCode::Char('y') => {
                        let action = action.clone();
                        self.input = InputMode::Normal;
                        self.dispatch(action);
                    }
                    KeyCode::Esc | KeyCode::Char('n') => self.input = InputMode::Normal,
                    _ => {}
                }
                return Ok(false);
            }
            InputMode::Normal => {}
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_selected(),
            KeyCode::Char('a') => {
                if let Some(EntryKind::Section { add: Some(a), .. }) =
                    self.selected().map(|e| e.kind.clone())
                {
                    self.dispatch(a);
                }
            }
            KeyCode::Char('d') => {
                if let Some(Entry {
                    kind: EntryKind::Section {
                        delete: Some(action),
                        ..
                    },
                    text,
                    ..
                }) = self.selected().cloned()
                {
                    self.input = InputMode::ConfirmDelete {
                        action,
                        label: text,
                    };
                }
            }
            KeyCode::Char('K') => {
                if let Some(EntryKind::Row {
                    table,
                    row,
                    key_editable: true,
                }) = self.selected().map(|e| e.kind.clone())
                {
                    self.begin_edit(FieldRef::RowKey { table, row }, "Key".into(), None);
                }
            }
            KeyCode::Char('r') => {
                self.editor.refresh();
                self.rebuild_entries();
            }
            // Header title gesture.
            KeyCode::Char('t') => {
                self.editor.escalation_gesture();
                self.rebuild_entries();
            }
            _ => {}
        }
        Ok(false)
    }

    fn draw(&mut self, f: &mut ratatui::Frame) {
        let size = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(size);

        self.draw_header(f, chunks[0]);
        self.draw_main(f, chunks[1]);
        self.draw_footer(f, chunks[2]);

        self.draw_modal(f);
    }

    fn draw_header(&self, f: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let view = self.editor.view();
        let crumb = match view.screen {
            Screen::Login => "locked",
            Screen::Configuration => "configuration",
        };
        let mut spans = vec![
            Span::styled("Silvertree Settings", Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(self.server.clone(), Style::default().fg(Color::Gray)),
            Span::raw("  "),
            Span::styled(crumb, Style::default().fg(Color::LightBlue)),
        ];
        if view.admin_indicator {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                "ADMIN",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::raw("  "));
        spans.push(Span::styled(now, Style::default().fg(Color::Yellow)));
        let p = Paragraph::new(Text::from(Line::from(spans))).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_type(BorderType::Plain),
        );
        f.render_widget(p, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        let hint = match self.editor.view().screen {
            Screen::Login => "[Enter] Type password / Unlock  [j/k] Move  [q] Quit",
            Screen::Configuration => {
                "[j/k] Move  [Enter] Open/Edit/Save  [a] Add  [d] Delete  [K] Edit new key  [r] Reload  [q] Quit"
            }
        };
        let p = Paragraph::new(hint)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::TOP));
        f.render_widget(p, area);
    }

    fn draw_main(&mut self, f: &mut ratatui::Frame, area: ratatui::layout::Rect) {
        let items: Vec<ListItem> = self.entries.iter().map(entry_item).collect();
        let title = match self.editor.view().screen {
            Screen::Login => "Login",
            Screen::Configuration => "Configuration",
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(Color::LightYellow))
            .highlight_symbol("> ");
        f.render_stateful_widget(list, area, &mut self.list);
    }

    fn draw_modal(&self, f: &mut ratatui::Frame) {
        let (title, lines) = match &self.input {
            InputMode::Normal => return,
            InputMode::EditField {
                label,
                masked,
                buffer,
                ..
            } => {
                let shown = if *masked {
                    "*".repeat(buffer.chars().count())
                } else {
                    sanitize_display(buffer, MAX_CELL_CHARS)
                };
                (
                    "Edit",
                    vec![
                        Line::from(vec![
                            Span::styled("Edit: ", Style::default().fg(Color::Yellow)),
                            Span::raw(label.clone()),
                        ]),
                        Line::from("enter=apply  esc=cancel"),
                        Line::from(""),
                        Line::from(shown),
                    ],
                )
            }
            InputMode::ConfirmDelete { label, .. } => (
                "Delete",
                vec![
                    Line::from(vec![
                        Span::styled("Delete base: ", Style::default().fg(Color::LightRed)),
                        Span::raw(label.clone()),
                    ]),
                    Line::from(""),
                    Line::from("y/enter=delete  n/esc=keep"),
                ],
            ),
        };

        let area = centered_rect(70, 25, f.area());
        let shadow = shadow_rect(area, f.area());
        f.render_widget(
            Fill {
                style: Style::default()
                    .bg(Color::Black)
                    .add_modifier(Modifier::DIM),
            },
            shadow,
        );
        f.render_widget(Clear, area);
        let p = Paragraph::new(Text::from(lines))
            .style(Style::default().fg(Color::White).bg(Color::DarkGray))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double),
            );
        f.render_widget(p, area);
    }
}

fn entry_item(e: &Entry) -> ListItem<'static> {
    let pad = "  ".repeat(e.depth);
    let style = match &e.kind {
        EntryKind::Section { .. } => Style::default().fg(Color::Cyan),
        EntryKind::Save(_) | EntryKind::Button(_) => Style::default().fg(Color::LightGreen),
        EntryKind::Wizard(_) => Style::default().fg(Color::LightMagenta),
        _ => Style::default(),
    };
    ListItem::new(Line::from(vec![
        Span::raw(pad),
        Span::styled(e.text.clone(), style),
    ]))
}

fn flatten(view: &View) -> Vec<Entry> {
    let mut out = Vec::new();
    flatten_into(&view.nodes, 0, &mut out);
    out
}

fn flatten_into(nodes: &[UiNode], depth: usize, out: &mut Vec<Entry>) {
    for n in nodes {
        match n {
            UiNode::Label(text) => out.push(Entry {
                depth,
                text: sanitize_display(text, MAX_CELL_CHARS),
                kind: EntryKind::Label,
            }),
            UiNode::Field(field) if field.name == LOGIN_FIELD => {
                let shown = if field.text.is_empty() {
                    field.placeholder.to_string()
                } else {
                    field.shown_text()
                };
                out.push(Entry {
                    depth,
                    text: shown,
                    kind: EntryKind::Login,
                });
            }
            UiNode::Field(_) => {}
            UiNode::Button(b) => out.push(Entry {
                depth,
                text: format!("[{}]", b.label),
                kind: EntryKind::Button(b.action.clone()),
            }),
            UiNode::Section(s) => {
                let marker = if s.is_expanded() { "▾" } else { "▸" };
                let mut text = format!("{marker} {}", sanitize_display(&s.title, MAX_CELL_CHARS));
                if s.add.is_some() {
                    text.push_str(" [+]");
                }
                if s.delete.is_some() {
                    text.push_str(" [x]");
                }
                out.push(Entry {
                    depth,
                    text,
                    kind: EntryKind::Section {
                        id: s.id,
                        add: s.add.clone(),
                        delete: s.delete.clone(),
                    },
                });
                if s.is_expanded() {
                    flatten_into(&s.content, depth + 1, out);
                }
            }
            UiNode::Table(t) => {
                for (row, r) in t.rows.iter().enumerate() {
                    let key = if r.key.text.is_empty() {
                        format!("<{}>", r.key.placeholder)
                    } else {
                        sanitize_display(&r.key.text, MAX_CELL_CHARS)
                    };
                    let value = if r.value.text.is_empty() {
                        String::new()
                    } else {
                        sanitize_display(&r.value.shown_text(), MAX_CELL_CHARS)
                    };
                    out.push(Entry {
                        depth,
                        text: format!("{key} = {value}"),
                        kind: EntryKind::Row {
                            table: t.id,
                            row,
                            key_editable: !r.key.read_only,
                        },
                    });
                }
                out.push(Entry {
                    depth,
                    text: format!("[{}]", t.save.label),
                    kind: EntryKind::Save(t.id),
                });
            }
            UiNode::Wizard(w) => out.push(Entry {
                depth,
                text: format!(
                    "new {}: {}",
                    w.template,
                    if w.name.text.is_empty() {
                        w.name.placeholder.to_string()
                    } else {
                        sanitize_display(&w.name.text, MAX_CELL_CHARS)
                    }
                ),
                kind: EntryKind::Wizard(w.id),
            }),
        }
    }
}

pub fn run_tui(settings: &ServiceSettings) -> Result<()> {
    let service = HttpConfigService::new(settings)?;
    let app = App::new(Editor::new(service), settings.base_url.clone());

    let mut stdout = io::stdout();
    enable_raw_mode().map_err(|e| Error::msg(e.to_string()))?;
    execute!(stdout, EnterAlternateScreen, Hide).map_err(|e| Error::msg(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| Error::msg(e.to_string()))?;
    terminal
        .clear()
        .map_err(|e| Error::msg(format!("tui clear failed: {e}")))?;

    let result = run_loop(&mut terminal, app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show).ok();

    result
}

fn run_loop<S: ConfigService>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App<S>,
) -> Result<()> {
    // The header clock needs a redraw even without input.
    let tick = Duration::from_millis(250);
    loop {
        terminal
            .draw(|f| app.draw(f))
            .map_err(|e| Error::msg(format!("tui draw failed: {e}")))?;

        if event::poll(tick).map_err(|e| Error::msg(e.to_string()))? {
            match event::read().map_err(|e| Error::msg(e.to_string()))? {
                Event::Key(k) => {
                    if k.kind != KeyEventKind::Press {
                        continue;
                    }
                    if app.handle_key(k.code, k.modifiers)? {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }
    Ok(())
}

fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    r: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical)[1]
}

// Drop shadow offset by one cell, clipped to the frame.
fn shadow_rect(
    inner: ratatui::layout::Rect,
    bounds: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let max_x = bounds.x.saturating_add(bounds.width);
    let max_y = bounds.y.saturating_add(bounds.height);
    let x = inner.x.saturating_add(1).min(max_x.saturating_sub(1));
    let y = inner.y.saturating_add(1).min(max_y.saturating_sub(1));
    ratatui::layout::Rect {
        x,
        y,
        width: inner.width.min(max_x.saturating_sub(x)),
        height: inner.height.min(max_y.saturating_sub(y)),
    }
}

struct Fill {
    style: Style,
}

impl Widget for Fill {
    fn render(self, area: ratatui::layout::Rect, buf: &mut Buffer) {
        for y in area.y..area.y.saturating_add(area.height) {
            for x in area.x..area.x.saturating_add(area.width) {
                buf[(x, y)].set_char(' ').set_style(self.style);
            }
        }
    }
}
