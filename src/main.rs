mod app;
mod config;
mod error;
mod input;
mod logging;
mod members;
mod models;
mod network;
mod roster;
mod sort;
mod theme;
mod ui;
mod utils;

use std::{io, sync::Arc, time::{Duration, Instant}};

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::runtime::Runtime;

use crate::app::App;
use crate::config::Settings;
use crate::input::handle_key;
use crate::models::SortMode;
use crate::network::HttpBackend;
use crate::roster::GroupRoster;
use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server base URL, e.g. https://cloud.example.com
    #[arg(short, long)]
    server: Option<String>,
    /// Admin user name
    #[arg(short, long)]
    user: Option<String>,
    /// Password or app token
    #[arg(long, env = "GROUPROSTER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Initial group filter
    #[arg(short, long)]
    filter: Option<String>,
    /// Sort groups by member count (overrides the config)
    #[arg(long)]
    sort_by_count: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut settings = Settings::new()?;
    if let Some(server) = args.server {
        settings.server_url = server;
    }
    if let Some(user) = args.user {
        settings.username = user;
    }
    if let Some(password) = args.password {
        settings.password = password;
    }
    if args.sort_by_count {
        settings.sort_by_member_count = true;
    }

    let _log_guard = logging::init_logger(&settings.log_dir(), &settings.log_level)?;
    tracing::info!(server = %settings.server_url, user = %settings.username, "starting grouproster");

    let rt = Runtime::new()?;
    let backend = Arc::new(HttpBackend::new(&settings.server_url, &settings.username, &settings.password)?);
    let (mut roster, mut events) = GroupRoster::new(
        backend,
        rt.handle().clone(),
        SortMode::from_flag(settings.sort_by_member_count),
        settings.member_page_size,
    );
    if let Some(filter) = args.filter {
        roster.state.filter_text = filter;
    }
    roster.start();
    let mut app = App::new(roster, true);
    let theme = Theme::default();

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &mut events, &theme);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Leaving the app is the point of no return for soft deletes.
    let committed = rt.block_on(app.roster.commit_pending_deletes());
    if committed > 0 {
        tracing::info!(committed, "committed pending deletes on exit");
    }
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut tokio::sync::mpsc::UnboundedReceiver<roster::RosterEvent>,
    theme: &Theme,
) -> anyhow::Result<()> {
    loop {
        while let Ok(event) = events.try_recv() {
            app.roster.handle_event(event);
        }
        app.roster.tick(Instant::now());
        app.clamp_cursor();

        terminal.draw(|f| {
            ui::render(f, app, theme);
        })?;
        app.roster.after_render();

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && !handle_key(key_event.code, app)? {
                    return Ok(());
                }
            }
        }
    }
}
