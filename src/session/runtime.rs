use super::pipeline::Session;
use super::render::TerminalRenderer;
use crate::error::Result;
use crate::events::{SessionEvent, UserCommand};
use std::fmt;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot, Mutex};
use tracing::{info, warn};

/// Why the interactive loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    Error(String),
    UserRequest,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "signal {}", name),
            ShutdownReason::Error(message) => write!(f, "error: {}", message),
            ShutdownReason::UserRequest => write!(f, "user request"),
        }
    }
}

impl Session {
    /// Drive the session from bus commands and network completions until asked to stop.
    ///
    /// `events` should be subscribed before any producer starts publishing so
    /// that no command is lost.
    pub async fn run(
        &mut self,
        mut events: broadcast::Receiver<SessionEvent>,
        renderer: &mut TerminalRenderer,
    ) -> Result<ShutdownReason> {
        info!("Trash Sight session is running");

        let (shutdown_sender, mut shutdown_receiver) = oneshot::channel();
        setup_signal_handlers(shutdown_sender);

        let mut prompt: Option<String> = None;
        let mut status: Option<String> = None;
        renderer.draw(&self.view(), prompt.as_deref(), status.as_deref())?;

        let reason = loop {
            tokio::select! {
                reason = &mut shutdown_receiver => {
                    break reason.unwrap_or_else(|_| {
                        ShutdownReason::Error("Shutdown channel closed unexpectedly".to_string())
                    });
                }
                event = events.recv() => match event {
                    Ok(SessionEvent::Command { command, .. }) => {
                        status = None;
                        match self.handle_command(command).await {
                            Ok(Some(reason)) => break reason,
                            Ok(None) => {}
                            Err(e) => {
                                warn!("{}", e);
                                status = Some(e.to_string());
                            }
                        }
                    }
                    Ok(SessionEvent::PathEntry { buffer }) => prompt = buffer,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Session lagged behind the event bus by {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        break ShutdownReason::Error("Event bus closed".to_string());
                    }
                },
                Some(completion) = self.next_completion() => {
                    self.apply_completion(completion).await;
                }
            }

            renderer.draw(&self.view(), prompt.as_deref(), status.as_deref())?;
        };

        info!("Shutdown initiated: {:?}", reason);
        self.shutdown(&reason.to_string());

        Ok(reason)
    }

    /// Apply one user command; `Some` ends the loop
    pub async fn handle_command(&mut self, command: UserCommand) -> Result<Option<ShutdownReason>> {
        match command {
            UserCommand::OpenFile(path) => {
                self.open_file(&path).await?;
            }
            UserCommand::StartCamera => {
                // Failure is surfaced through the view's capture notice
                let _ = self.start_camera().await;
            }
            UserCommand::CaptureFrame => {
                self.capture_frame();
            }
            UserCommand::StopCamera => self.stop_camera(),
            UserCommand::Analyze => {
                let _ = self.submit();
            }
            UserCommand::Clear => self.clear(),
            UserCommand::Quit => return Ok(Some(ShutdownReason::UserRequest)),
        }

        Ok(None)
    }
}

fn setup_signal_handlers(shutdown_sender: oneshot::Sender<ShutdownReason>) {
    let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

    #[cfg(unix)]
    {
        let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to register SIGTERM handler: {}", e);
                    return;
                }
            };
            if sigterm.recv().await.is_some() {
                info!("Received SIGTERM signal");
                if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                }
            }
        });
    }

    let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
            }
        }
    });
}
