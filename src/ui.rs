use crate::models::{DeviceRecord, DeviceStatus, DeviceType, InventoryStats};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatusFilter {
    All,
    OnlineOnly,
    OfflineOnly,
}

impl StatusFilter {
    fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::OnlineOnly,
            StatusFilter::OnlineOnly => StatusFilter::OfflineOnly,
            StatusFilter::OfflineOnly => StatusFilter::All,
        }
    }

    fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::OnlineOnly => "Online",
            StatusFilter::OfflineOnly => "Offline",
        }
    }

    fn accepts(self, device: &DeviceRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::OnlineOnly => device.status == DeviceStatus::Online,
            StatusFilter::OfflineOnly => device.status == DeviceStatus::Offline,
        }
    }
}

/// View state for the inventory table.
///
/// Rows keep their position in the full inventory so the `#` column stays stable while
/// filtering.
pub struct InventoryView {
    pub devices: Vec<DeviceRecord>,
    pub stats: InventoryStats,
    pub visible: Vec<usize>,
    pub table_state: TableState,
    pub filter: StatusFilter,
}

impl InventoryView {
    pub fn new(devices: Vec<DeviceRecord>, stats: InventoryStats) -> Self {
        let mut view = Self {
            devices,
            stats,
            visible: Vec::new(),
            table_state: TableState::default(),
            filter: StatusFilter::All,
        };
        view.apply_filter();
        view
    }

    fn apply_filter(&mut self) {
        self.visible = self
            .devices
            .iter()
            .enumerate()
            .filter(|(_, device)| self.filter.accepts(device))
            .map(|(index, _)| index)
            .collect();
        if self.visible.is_empty() {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(0));
        }
    }

    pub fn toggle_filter(&mut self) {
        self.filter = self.filter.next();
        self.apply_filter();
    }

    pub fn visible_devices(&self) -> impl Iterator<Item = (usize, &DeviceRecord)> {
        self.visible.iter().map(|&index| (index, &self.devices[index]))
    }

    pub fn next(&mut self) {
        if self.visible.is_empty() {
            self.table_state.select(None);
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.visible.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.visible.is_empty() {
            self.table_state.select(None);
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.visible.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_device(&self) -> Option<&DeviceRecord> {
        self.table_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .map(|&index| &self.devices[index])
    }
}

fn status_color(status: &DeviceStatus) -> Color {
    match status {
        DeviceStatus::Online => Color::Green,
        DeviceStatus::Offline => Color::Red,
        DeviceStatus::Other(_) => Color::Gray,
    }
}

fn render_stat_card(f: &mut Frame, area: Rect, title: &str, value: usize, color: Color) {
    let card = Paragraph::new(Line::from(Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).title(title.to_string()))
    .alignment(Alignment::Center);
    f.render_widget(card, area);
}

/// Render the inventory screen
pub fn render_inventory(f: &mut Frame, view: &InventoryView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Stat cards
            Constraint::Min(8),    // Device table
            Constraint::Length(3), // Instructions
        ])
        .split(f.area());

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(chunks[0]);
    render_stat_card(f, cards[0], "Total Devices", view.stats.total, Color::LightBlue);
    render_stat_card(f, cards[1], "Online", view.stats.online, Color::Green);
    render_stat_card(f, cards[2], "Sensors", view.stats.sensors, Color::Yellow);
    render_stat_card(f, cards[3], "Other Devices", view.stats.non_sensors, Color::Magenta);

    let header = Row::new(vec!["#", "Name", "Type", "IPv6 Address", "Status", "Registered"])
        .style(Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .visible_devices()
        .map(|(index, device)| {
            let type_style = match DeviceType::known(&device.device_type) {
                Some(_) => Style::default(),
                None => Style::default().fg(Color::Gray),
            };
            Row::new(vec![
                Cell::from((index + 1).to_string()),
                Cell::from(device.name.clone()),
                Cell::from(device.device_type.clone()).style(type_style),
                Cell::from(device.address.clone()),
                Cell::from(device.status.as_str())
                    .style(Style::default().fg(status_color(&device.status))),
                Cell::from(device.registered_at.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(20),
            Constraint::Length(11),
            Constraint::Percentage(35),
            Constraint::Length(8),
            Constraint::Min(22),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Campus Devices ({} shown, Filter: {})",
        view.visible.len(),
        view.filter.label()
    )))
    .row_highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    f.render_stateful_widget(table, chunks[1], &mut view.table_state.clone());

    let instructions = match view.selected_device() {
        Some(device) => format!(
            "{} | ↑↓: Navigate | 'f': Filter | 'q': Quit",
            device.address
        ),
        None => "↑↓: Navigate | 'f': Filter | 'q': Quit".to_string(),
    };
    let footer = Paragraph::new(instructions)
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);
    f.render_widget(footer, chunks[2]);
}

/// Applies one key press to the view. Returns `false` when the user asked to quit.
pub fn handle_key(view: &mut InventoryView, code: KeyCode) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Up => view.previous(),
        KeyCode::Down => view.next(),
        KeyCode::Char('f') => view.toggle_filter(),
        _ => {}
    }
    true
}

// Raw mode and the alternate screen are undone when this drops, whichever way the loop exits.
struct RawTerminalGuard {
    active: bool,
}

impl RawTerminalGuard {
    fn enter() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        let guard = Self { active: true };
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
        Ok(guard)
    }

    fn restore(mut self) -> io::Result<()> {
        self.active = false;
        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()
    }
}

impl Drop for RawTerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen);
            let _ = crossterm::terminal::disable_raw_mode();
        }
    }
}

/// Run the interactive inventory view until the user quits
pub fn run_inventory_view(
    devices: Vec<DeviceRecord>,
    stats: InventoryStats,
) -> Result<(), Box<dyn std::error::Error>> {
    let guard = RawTerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut view = InventoryView::new(devices, stats);

    loop {
        terminal.draw(|f| render_inventory(f, &view))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !handle_key(&mut view, key.code) {
                break;
            }
        }
    }

    guard.restore()?;
    Ok(())
}
