use {
    crate::pipeline::{Command, DashboardView, OperatingMode, Renderer},
    crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::{io::Stdout, time::Duration},
};

/// Crossterm/ratatui dashboard
///
/// Owns raw mode and the alternate screen for its lifetime; both are
/// restored on drop, so an early return out of the event loop still leaves
/// a usable terminal.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    top_rows: usize,
}

impl TerminalRenderer {
    pub fn new(top_rows: usize) -> std::io::Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;

        crossterm::terminal::enable_raw_mode()?;

        // Alternate screen keeps stderr logs from scribbling over the tables
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide
        )?;
        terminal.clear()?;

        Ok(Self { terminal, top_rows })
    }

    fn restore() -> std::io::Result<()> {
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;
        crossterm::terminal::disable_raw_mode()
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(e) = Self::restore() {
            log::error!("Failed to restore terminal: {}", e);
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &DashboardView<'_>) -> std::io::Result<()> {
        let area = self.terminal.size()?;
        let top_rows = self.top_rows;
        self.terminal.draw(|f| {
            crate::ui::layout::render_layout(f, area, view, top_rows);
        })?;
        Ok(())
    }

    fn poll_commands(&mut self) -> std::io::Result<Vec<Command>> {
        let mut commands = Vec::new();
        while crossterm::event::poll(Duration::ZERO)? {
            if let Event::Key(key) = crossterm::event::read()? {
                if let Some(command) = command_for_key(key) {
                    commands.push(command);
                }
            }
        }
        Ok(commands)
    }
}

/// Map a key press to an operator command
pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Command::Quit)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::TogglePause),
        KeyCode::Char(c @ '1'..='3') => c
            .to_digit(10)
            .and_then(|digit| OperatingMode::new(digit as u8).ok())
            .map(Command::SelectMode),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(command_for_key(press(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(command_for_key(press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(
            command_for_key(press(KeyCode::Char('P'))),
            Some(Command::TogglePause)
        );
        assert_eq!(
            command_for_key(press(KeyCode::Char('2'))),
            Some(Command::SelectMode(OperatingMode::new(2).unwrap()))
        );
        assert_eq!(command_for_key(press(KeyCode::Char('4'))), None);
        assert_eq!(command_for_key(press(KeyCode::Char('c'))), None);
        assert_eq!(
            command_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Command::Quit)
        );
    }

    #[test]
    fn test_key_release_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(command_for_key(key), None);
    }
}
