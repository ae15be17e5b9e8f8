//! Terminal Demo: scrolling comments over the whole terminal.
//!
//! Keys: space pauses and plays, `c` sends a centered banner, `b` starts a
//! batch, `q` or Escape quits. Point the mouse at a message to hold it.
//!
//! Set `DANMAKU_LOG` (for example `DANMAKU_LOG=debug`) to write scheduler
//! events to `danmaku.log`; stdout belongs to the renderer.

use crossbeam_channel::unbounded;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind,
};
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use danmaku::{
    BatchItem, Command, Danmaku, DanmakuActor, DanmakuConfig, ElementId, OutputBuffer, Rect, Rgb,
    TerminalStage,
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const CHATTER: &[&str] = &[
    "first!",
    "this part again lol",
    "23333",
    "who is here in 2026",
    "the drop at 1:24 though",
    "subtitles please",
    "錯覺嗎 好像變快了",
    "ok this is art",
    "the lanes never overlap, nice",
    "wwwwwwwwwwww",
    "🎉🎉🎉",
    "hello from the back row",
];

const HEADER: &str = " danmaku | space: pause/play  c: banner  b: batch  q: quit";

fn init_logging() -> io::Result<()> {
    let Ok(filter) = std::env::var("DANMAKU_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::create("danmaku.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn batch() -> Vec<BatchItem> {
    vec![
        BatchItem::Avatar {
            avatar: "🐱".into(),
            content: "batch says hi".into(),
            url: None,
        },
        BatchItem::Avatar {
            avatar: "📎".into(),
            content: "with a link".into(),
            url: Some("https://example.com".into()),
        },
        "plain batch item".into(),
    ]
}

fn main() -> io::Result<()> {
    init_logging()?;

    let (width, height) = terminal::size()?;
    let area = Rect::new(0, 1, width, height.saturating_sub(1));
    let config = DanmakuConfig::default()
        .with_line_count(usize::from(area.height.max(1)))
        .with_base_speed(6.0)
        .with_margin(4.0)
        .with_runtime(6.0)
        .with_colorize(true)
        .with_hover(true);
    let danmaku = Danmaku::new(
        TerminalStage::new(area).with_default_fg(Rgb::new(235, 235, 235)),
        config,
    )
    .map_err(io::Error::other)?;

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

    let result = run(danmaku);

    let _ = execute!(stdout, cursor::Show, DisableMouseCapture, LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    result
}

fn run(danmaku: Danmaku<TerminalStage>) -> io::Result<()> {
    let pointer: Arc<Mutex<Option<(u16, u16)>>> = Arc::new(Mutex::new(None));
    let (hover_tx, hover_rx) = unbounded();

    let frame_pointer = Arc::clone(&pointer);
    let mut out = OutputBuffer::new();
    let mut hovered: Option<ElementId> = None;
    let actor = DanmakuActor::spawn(danmaku, Duration::from_millis(16), move |danmaku| {
        let stage = danmaku.stage();
        let now = danmaku.now();

        out.clear();
        out.cursor_move(0, 0);
        out.set_fg(Rgb::new(150, 150, 150));
        out.write_str(HEADER);
        stage.render(now, &mut out);
        let mut stdout = io::stdout();
        let _ = out.flush_to(&mut stdout);
        let _ = stdout.flush();

        // Hover is resolved against what was just drawn.
        let at = frame_pointer.lock().ok().and_then(|position| *position);
        let under = at.and_then(|(column, row)| stage.element_at(now, column, row));
        if under != hovered {
            if let Some(id) = hovered {
                let _ = hover_tx.send(Command::PointerLeave(id));
            }
            if let Some(id) = under {
                let _ = hover_tx.send(Command::PointerEnter(id));
            }
            hovered = under;
        }
    });

    let mut playing = true;
    let mut sent = 0usize;
    let mut next_chatter = Instant::now();

    loop {
        while let Ok(command) = hover_rx.try_recv() {
            actor.send(command);
        }

        if event::poll(Duration::from_millis(10))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => {
                        playing = !playing;
                        actor.send(if playing { Command::Play } else { Command::Pause });
                    }
                    KeyCode::Char('c') => {
                        actor.send(Command::centered("★ welcome to the stream ★"));
                    }
                    KeyCode::Char('b') => {
                        actor.send(Command::Batch {
                            items: batch(),
                            class: None,
                        });
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => {
                    if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                        if let Ok(mut position) = pointer.lock() {
                            *position = Some((mouse.column, mouse.row));
                        }
                    }
                }
                _ => {}
            }
        }

        if Instant::now() >= next_chatter {
            actor.send(Command::send(CHATTER[sent % CHATTER.len()]));
            sent += 1;
            next_chatter += Duration::from_millis(350);
        }
    }

    if let Some(danmaku) = actor.join() {
        tracing::info!(sent, state = ?danmaku, "demo finished");
    }
    Ok(())
}
