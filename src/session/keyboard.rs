use crate::error::Result;
use crate::events::{EventBus, SessionEvent, UserCommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Translates key presses into session events.
///
/// `o` opens a path prompt; while it is open keys edit the path until
/// Enter submits it or Esc abandons it.
#[derive(Debug, Default)]
pub struct KeyMapper {
    path: Option<String>,
}

impl KeyMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_entering_path(&self) -> bool {
        self.path.is_some()
    }

    pub fn handle(&mut self, key: KeyEvent) -> Vec<SessionEvent> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.path = None;
            return vec![SessionEvent::command(UserCommand::Quit)];
        }

        match self.path.take() {
            Some(buffer) => self.edit_path(buffer, key.code),
            None => Self::command_for(key.code)
                .map(|command| vec![SessionEvent::command(command)])
                .unwrap_or_else(|| {
                    if key.code == KeyCode::Char('o') {
                        self.path = Some(String::new());
                        vec![SessionEvent::PathEntry {
                            buffer: Some(String::new()),
                        }]
                    } else {
                        debug!("Key pressed: {:?}", key.code);
                        Vec::new()
                    }
                }),
        }
    }

    fn edit_path(&mut self, mut buffer: String, code: KeyCode) -> Vec<SessionEvent> {
        match code {
            KeyCode::Enter => {
                let path = buffer.trim().to_string();
                let mut events = vec![SessionEvent::PathEntry { buffer: None }];
                if !path.is_empty() {
                    events.push(SessionEvent::command(UserCommand::OpenFile(
                        PathBuf::from(path),
                    )));
                }
                events
            }
            KeyCode::Esc => vec![SessionEvent::PathEntry { buffer: None }],
            KeyCode::Backspace => {
                buffer.pop();
                self.path = Some(buffer.clone());
                vec![SessionEvent::PathEntry {
                    buffer: Some(buffer),
                }]
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                self.path = Some(buffer.clone());
                vec![SessionEvent::PathEntry {
                    buffer: Some(buffer),
                }]
            }
            _ => {
                self.path = Some(buffer);
                Vec::new()
            }
        }
    }

    fn command_for(code: KeyCode) -> Option<UserCommand> {
        match code {
            KeyCode::Char('c') => Some(UserCommand::StartCamera),
            KeyCode::Char(' ') => Some(UserCommand::CaptureFrame),
            KeyCode::Char('x') | KeyCode::Esc => Some(UserCommand::StopCamera),
            KeyCode::Char('a') | KeyCode::Enter => Some(UserCommand::Analyze),
            KeyCode::Char('d') => Some(UserCommand::Clear),
            KeyCode::Char('q') => Some(UserCommand::Quit),
            _ => None,
        }
    }
}

/// Reads the terminal in raw mode and publishes what the user asks for
pub struct KeyboardInputHandler {
    event_bus: Arc<EventBus>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            event_bus,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input handler");

        let event_bus = Arc::clone(&self.event_bus);
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            let mut mapper = KeyMapper::new();

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            for event in mapper.handle(key_event) {
                                let quit = matches!(
                                    event,
                                    SessionEvent::Command {
                                        command: UserCommand::Quit,
                                        ..
                                    }
                                );
                                event_bus.publish(event);
                                if quit {
                                    cancellation_token.cancel();
                                }
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the task leave raw mode itself
        tokio::time::sleep(Duration::from_millis(200)).await;

        let _ = disable_raw_mode();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn commands(events: Vec<SessionEvent>) -> Vec<UserCommand> {
        events
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Command { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_command_keys() {
        let mut mapper = KeyMapper::new();

        assert_eq!(
            commands(mapper.handle(press(KeyCode::Char('c')))),
            vec![UserCommand::StartCamera]
        );
        assert_eq!(
            commands(mapper.handle(press(KeyCode::Char(' ')))),
            vec![UserCommand::CaptureFrame]
        );
        assert_eq!(
            commands(mapper.handle(press(KeyCode::Esc))),
            vec![UserCommand::StopCamera]
        );
        assert_eq!(
            commands(mapper.handle(press(KeyCode::Enter))),
            vec![UserCommand::Analyze]
        );
        assert_eq!(
            commands(mapper.handle(press(KeyCode::Char('d')))),
            vec![UserCommand::Clear]
        );
        assert!(mapper.handle(press(KeyCode::Char('z'))).is_empty());
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut mapper = KeyMapper::new();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(commands(mapper.handle(key)), vec![UserCommand::Quit]);
    }

    #[test]
    fn test_path_entry() {
        let mut mapper = KeyMapper::new();

        mapper.handle(press(KeyCode::Char('o')));
        assert!(mapper.is_entering_path());

        // Command keys are text while the prompt is open
        for c in "a.jpgx".chars() {
            mapper.handle(press(KeyCode::Char(c)));
        }
        let events = mapper.handle(press(KeyCode::Backspace));
        assert!(matches!(
            &events[..],
            [SessionEvent::PathEntry { buffer: Some(buffer) }] if buffer == "a.jpg"
        ));

        let events = mapper.handle(press(KeyCode::Enter));
        assert_eq!(
            commands(events),
            vec![UserCommand::OpenFile(PathBuf::from("a.jpg"))]
        );
        assert!(!mapper.is_entering_path());
    }

    #[test]
    fn test_path_entry_cancelled() {
        let mut mapper = KeyMapper::new();

        mapper.handle(press(KeyCode::Char('o')));
        mapper.handle(press(KeyCode::Char('x')));
        let events = mapper.handle(press(KeyCode::Esc));

        assert!(commands(events).is_empty());
        assert!(!mapper.is_entering_path());
    }

    #[tokio::test]
    async fn test_keyboard_handler_stop() {
        let event_bus = Arc::new(EventBus::new(100));
        let handler = KeyboardInputHandler::new(event_bus);

        assert!(!handler.cancellation_token.is_cancelled());
        handler.stop().await.unwrap();
        assert!(handler.cancellation_token.is_cancelled());
    }
}
