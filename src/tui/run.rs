//! TUI entry point and terminal setup.

use std::{io, path::Path};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::tui::app::App;

/// Initialise the terminal, run the app until the user quits, then restore it.
pub fn run_tui(db_path: &Path, config_path: &Path, config: Config) -> Result<()> {
    let mut app = App::new(db_path, config_path, config);
    info!(db = %db_path.display(), "starting TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
