//! App state and main loop: input handling, frame receipt, reconnects, and drawing.

use std::io;
use std::time::Duration;

use crossterm::{
    cursor::Show,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::{Stream, StreamExt};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use crate::config::Settings;
use crate::connection::{ConnectionManager, Dialer, Step};
use crate::error::ConnectionError;
use crate::reconnect::Backoff;
use crate::ui::{charts::draw_charts, gpu::draw_gpu, header::draw_header, header::HeaderInfo};

const REDRAW_EVERY: Duration = Duration::from_millis(250);

pub struct App<D: Dialer> {
    conn: ConnectionManager<D>,
    settings: Settings,
    backoff: Backoff,
    // When the next connect attempt is due; None while connected or given up.
    retry_at: Option<Instant>,
    detail: Option<String>,
    should_quit: bool,
}

impl<D: Dialer> App<D> {
    pub fn new(conn: ConnectionManager<D>, settings: Settings) -> Self {
        let backoff = Backoff::new(settings.reconnect.clone());
        Self {
            conn,
            settings,
            backoff,
            retry_at: Some(Instant::now()),
            detail: None,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        // Terminal setup; the guard restores it on every exit path
        enable_raw_mode()?;
        let _restore = TerminalGuard;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        // Main loop
        let res = self.event_loop(&mut terminal).await;
        self.conn.shutdown().await;
        res
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> anyhow::Result<()> {
        let mut input = EventStream::new();
        let mut redraw = tokio::time::interval(REDRAW_EVERY);

        loop {
            terminal.draw(|f| self.draw(f))?;
            if self.should_quit {
                break;
            }

            let connected = self.conn.is_connected();
            let retry_at = self.retry_at;
            tokio::select! {
                step = self.conn.step(), if connected => self.on_step(step),
                _ = sleep_until(retry_at.unwrap_or_else(Instant::now)), if !connected && retry_at.is_some() => {
                    self.connect(&mut input).await?;
                }
                ev = input.next() => match ev {
                    Some(Ok(Event::Key(k))) => self.on_key(k),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => self.should_quit = true,
                },
                _ = redraw.tick() => {}
            }
        }
        Ok(())
    }

    /// One connect attempt. Input is still read while the dial is in flight
    /// so a quit key abandons it instead of waiting out the connect timeout.
    async fn connect<S>(&mut self, input: &mut S) -> anyhow::Result<()>
    where
        S: Stream<Item = io::Result<Event>> + Unpin,
    {
        self.retry_at = None;
        let endpoint = self.settings.endpoint.clone();
        let outcome = {
            let open = self.conn.open(&endpoint);
            tokio::pin!(open);
            loop {
                tokio::select! {
                    res = &mut open => break Some(res),
                    ev = input.next() => match ev {
                        Some(Ok(Event::Key(k))) if is_quit_key(&k) => break None,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => break None,
                    },
                }
            }
        };
        match outcome {
            None => self.should_quit = true,
            Some(Ok(())) => {
                self.backoff.reset();
                self.detail = None;
            }
            Some(Err(ConnectionError::Closed)) => self.should_quit = true,
            Some(Err(e)) => self.schedule_retry(e.to_string()),
        }
        Ok(())
    }

    fn on_step(&mut self, step: Step) {
        match step {
            Step::Applied(_) | Step::Rejected(_) | Step::Discarded => {}
            Step::Ended(Some(e)) => self.schedule_retry(e.to_string()),
            Step::Ended(None) if self.conn.close_handle().is_alive() => {
                self.schedule_retry("agent closed the connection".into())
            }
            Step::Ended(None) => self.should_quit = true,
        }
    }

    fn schedule_retry(&mut self, reason: String) {
        match self.backoff.next_delay() {
            Some(delay) => {
                info!(attempt = self.backoff.attempts(), ?delay, "scheduling reconnect");
                self.retry_at = Some(Instant::now() + delay);
                self.detail = Some(format!("{reason}; retrying in {:.1}s", delay.as_secs_f64()));
            }
            None => {
                warn!(%reason, "giving up on reconnecting");
                self.retry_at = None;
                self.detail = Some(format!("{reason}; gave up, press 'r' to retry"));
            }
        }
    }

    fn on_key(&mut self, k: KeyEvent) {
        if k.kind != KeyEventKind::Press {
            return;
        }
        if is_quit_key(&k) {
            self.should_quit = true;
            return;
        }
        match k.code {
            // Manual retry once the backoff budget is spent.
            KeyCode::Char('r') if !self.conn.is_connected() && self.retry_at.is_none() => {
                self.backoff.reset();
                self.retry_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let area = f.area();

        // Root rows: header, gauges, charts
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(6),
                Constraint::Min(9),
            ])
            .split(area);

        let sample = self.conn.snapshot();
        draw_header(
            f,
            rows[0],
            &HeaderInfo {
                endpoint: self.settings.endpoint.as_str(),
                state: self.conn.state(),
                sample,
                rejected: self.conn.rejected_frames(),
                detail: self.detail.as_deref(),
            },
        );
        draw_gpu(f, rows[1], sample);
        draw_charts(
            f,
            rows[2],
            &self.conn.window().series(),
            sample.memory_total_gib,
        );
    }
}

fn is_quit_key(k: &KeyEvent) -> bool {
    if k.kind != KeyEventKind::Press {
        return false;
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => k.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Leaves the alternate screen and raw mode when dropped.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}
