//! Danmaku Actor: a dedicated thread that owns one scheduler.
//!
//! The thread maps wall-clock time onto the scheduler's clock, applies
//! commands as they arrive and calls a frame hook at a fixed interval.
//! Commands are applied in the order they were sent.

use super::messages::Command;
use crate::scheduler::Danmaku;
use crate::stage::Stage;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Actor that drives a [`Danmaku`] scheduler on its own thread.
pub struct DanmakuActor<S> {
    /// Handle to the scheduler thread.
    handle: Option<JoinHandle<Danmaku<S>>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Command sender.
    command_tx: Sender<Command>,
}

impl<S: Stage + Send + 'static> DanmakuActor<S> {
    /// Spawn the scheduler thread.
    ///
    /// `on_frame` runs every `frame_interval` after the clock has been
    /// advanced, typically to render the stage.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the thread.
    pub fn spawn<F>(danmaku: Danmaku<S>, frame_interval: Duration, on_frame: F) -> Self
    where
        F: FnMut(&Danmaku<S>) + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let (command_tx, command_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("danmaku-scheduler".to_string())
            .spawn(move || {
                Self::run_loop(danmaku, &command_rx, &shutdown_clone, frame_interval, on_frame)
            })
            .expect("Failed to spawn danmaku thread");

        Self {
            handle: Some(handle),
            shutdown,
            command_tx,
        }
    }

    /// A sender for commands; clone it freely.
    pub fn handle(&self) -> Sender<Command> {
        self.command_tx.clone()
    }

    /// Queue a command. Returns `false` if the thread has exited.
    pub fn send(&self, command: Command) -> bool {
        self.command_tx.send(command).is_ok()
    }

    /// Stop at the next loop iteration, dropping queued commands.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Apply every queued command, stop, and hand the scheduler back.
    ///
    /// Returns `None` if the thread panicked.
    pub fn join(mut self) -> Option<Danmaku<S>> {
        let _ = self.command_tx.send(Command::Shutdown);
        self.handle.take().and_then(|handle| handle.join().ok())
    }

    fn run_loop<F>(
        mut danmaku: Danmaku<S>,
        commands: &Receiver<Command>,
        shutdown: &Arc<AtomicBool>,
        frame_interval: Duration,
        mut on_frame: F,
    ) -> Danmaku<S>
    where
        F: FnMut(&Danmaku<S>),
    {
        let start = Instant::now();
        let origin = danmaku.now();
        let mut next_frame = start + frame_interval;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let timeout = next_frame.saturating_duration_since(Instant::now());
            match commands.recv_timeout(timeout) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => {
                    danmaku.advance_to(origin + start.elapsed());
                    Self::apply(&mut danmaku, command);
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            if now >= next_frame {
                danmaku.advance_to(origin + (now - start));
                on_frame(&danmaku);

                next_frame += frame_interval;
                // Behind schedule: skip frames rather than burst.
                if next_frame < now {
                    next_frame = now + frame_interval;
                }
            }
        }

        debug!(elapsed = ?start.elapsed(), "danmaku thread stopping");
        danmaku
    }

    fn apply(danmaku: &mut Danmaku<S>, command: Command) {
        match command {
            Command::Send {
                body,
                class,
                on_complete,
            } => {
                danmaku.send_with(&body, class.as_deref(), on_complete);
            }
            Command::Centered {
                body,
                class,
                duration,
                on_complete,
            } => {
                danmaku.centered_send_with(&body, class.as_deref(), duration, on_complete);
            }
            Command::Batch { items, class } => danmaku.batch_send(items, class.as_deref()),
            Command::StopBatch => danmaku.stop_batch(),
            Command::Play => danmaku.play(),
            Command::Pause => danmaku.pause(),
            Command::PointerEnter(id) => {
                danmaku.pointer_enter(id);
            }
            Command::PointerLeave(id) => {
                danmaku.pointer_leave(id);
            }
            Command::Shutdown => {}
        }
    }
}

impl<S> Drop for DanmakuActor<S> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
