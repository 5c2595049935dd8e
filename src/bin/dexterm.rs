// Native binary for dexterm - Terminal UI mode (or --headless JSON dump)

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::OpenOptions,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use dexterm::{
    app::{App, InputMode},
    classify::ErrorClassifier,
    client::{CatalogClient, HttpCatalogClient},
    config::{load, Config},
    connectivity::{ConnectivityProbe, StaticProbe, TcpProbe},
    constants::probe,
    paging::{Dispatch, PagingController},
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    let cfg = load().context("Failed to load configuration")?;
    init_logging(&cfg)?;
    log::info!(
        "dexterm starting: api={} limit={} headless={}",
        cfg.api_base_url,
        cfg.page_limit,
        cfg.headless
    );
    log::debug!("config: {cfg:?}");

    let client: Arc<dyn CatalogClient> = Arc::new(HttpCatalogClient::from_config(&cfg)?);
    let probe: Arc<dyn ConnectivityProbe> = if cfg.assume_online {
        Arc::new(StaticProbe::online())
    } else {
        Arc::new(TcpProbe::for_base_url(
            &cfg.api_base_url,
            Duration::from_millis(cfg.probe_timeout_ms),
            Duration::from_millis(probe::CACHE_MS),
        )?)
    };
    let classifier = ErrorClassifier::new(Arc::clone(&probe));
    let controller = PagingController::with_limit(
        Arc::clone(&client),
        Arc::clone(&probe),
        classifier.clone(),
        cfg.page_limit,
    );

    if cfg.headless {
        return run_headless(&cfg, controller).await;
    }

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(
        controller,
        client,
        probe,
        classifier,
        cfg.image_base_url.clone(),
        cfg.render_fps,
    );
    app.start(&cfg.default_search);

    // main loop; restore the terminal even when it fails
    let result = run_loop(&mut app, &mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// The TUI owns stdout, so logs go to a file there; headless logs to stderr
fn init_logging(cfg: &Config) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if !cfg.headless {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.log_file)
            .with_context(|| format!("Failed to open log file: {}", cfg.log_file.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Load `headless_pages` pages and print the projected display state as JSON
async fn run_headless(cfg: &Config, mut controller: PagingController) -> Result<()> {
    if !cfg.default_search.is_empty() {
        controller.set_search_query(cfg.default_search.as_str());
    }
    controller.start();
    controller.settle().await;

    for page in 1..cfg.headless_pages {
        match controller.load_more() {
            Dispatch::Issued(req) => {
                log::info!("[headless] page {} ({req})", page + 1);
                controller.settle().await;
            }
            other => {
                log::info!("[headless] stopping after {page} page(s): {other:?}");
                break;
            }
        }
    }

    let display = controller.display();
    println!("{}", serde_json::to_string_pretty(&display)?);
    Ok(())
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps()) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k);
                }
            }
        }

        if last_frame.elapsed() >= budget {
            app.tick();
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
        if app.quit_flag() {
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, k: KeyEvent) {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (k.code, k.modifiers) {
        app.quit();
        return;
    }

    // Search input mode
    if app.input_mode() == InputMode::Search {
        match k.code {
            KeyCode::Char(c) => app.search_add_char(c),
            KeyCode::Backspace => app.search_backspace(),
            KeyCode::Enter => app.search_commit(),
            KeyCode::Esc => app.search_cancel(),
            _ => {}
        }
        return;
    }

    // Detail overlay
    if app.detail().is_some() {
        match k.code {
            KeyCode::Esc | KeyCode::Backspace => app.close_detail(),
            KeyCode::Enter => app.open_detail(),
            KeyCode::Char('y') => app.copy_image_url(),
            KeyCode::Char('q') => app.quit(),
            _ => {}
        }
        return;
    }

    // Normal mode keys
    match k.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('/') => app.enter_search(),
        KeyCode::Esc => {
            if !app.search_query().is_empty() {
                app.search_cancel();
            }
        }
        KeyCode::Right | KeyCode::Char('l') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_down(),
        KeyCode::Up | KeyCode::Char('k') => app.select_up(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Enter => app.open_detail(),
        KeyCode::Char('r') => app.retry_or_refresh(),
        KeyCode::Char('y') => app.copy_image_url(),
        _ => {}
    }
}
