//! Event handling utilities for the TUI.
//!
//! This module provides functions for handling different types of events:
//! - Core events (from vfm-core)
//! - Keyboard events (form input, modal answers, global shortcuts)

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use vfm_protocol::Event;
use vfm_protocol::Op;
use vfm_protocol::ProgressState;
use vfm_protocol::PromptKind;
use vfm_protocol::RunOutcome;
use vfm_protocol::WorkerStatus;

use crate::app::App;
use crate::widgets::LogKind;
use crate::widgets::ModalAction;
use crate::widgets::PromptModal;

fn prompt_label(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::Username => "username",
        PromptKind::Year => "year",
        PromptKind::Month => "month",
        PromptKind::SongCount => "number of songs",
        PromptKind::ManualUrlPreference => "manual URL preference",
        PromptKind::ManualUrl => "manual URL",
        PromptKind::ReplaceVideos => "replace videos",
        PromptKind::Overwrite => "overwrite",
        PromptKind::SongReplacement => "song number",
        PromptKind::ReplacementUrl => "replacement URL",
        PromptKind::NewApiKey => "new API key",
    }
}

fn end_run(app: &mut App) {
    app.running = false;
    app.run_id = None;
    app.modal = None;
}

/// Handle an event received from the core.
pub fn handle_core_event(app: &mut App, event: Event) {
    match event {
        Event::RunStarted { run_id } => {
            app.run_id = Some(run_id);
            app.running = true;
            app.progress = ProgressState::default();
            app.status = (LogKind::Info, "Running".to_string());
            app.log.push(LogKind::Info, "Starting videofm...");
        }
        Event::WorkerStatusUpdate { status, .. } => {
            if status == WorkerStatus::Exiting {
                app.status = (LogKind::Info, "Stopping...".to_string());
            }
        }
        Event::WorkerOutput { content, .. } => {
            app.log.push(LogKind::Output, &content);
        }
        Event::WorkerError { error, .. } => {
            app.log.push(LogKind::Error, &error);
        }
        Event::AutoAnswered { kind, .. } => {
            app.log
                .push(LogKind::Info, &format!("Answered {} from the form", prompt_label(kind)));
        }
        Event::PromptRaised { prompt, .. } => {
            // A newer prompt replaces whatever was showing.
            app.modal = Some(PromptModal::new(prompt));
        }
        Event::ProgressUpdate { progress, .. } => {
            app.progress = progress;
        }
        Event::VideoReady { filename, .. } => {
            let name = filename.unwrap_or_else(|| "video".to_string());
            app.log.push(LogKind::Success, &format!("Video ready: {name}"));
        }
        Event::RunFinished { outcome, .. } => {
            end_run(app);
            match outcome {
                RunOutcome::Succeeded { message, file_path } => {
                    let line = match file_path {
                        Some(path) => format!("✓ {message} {}", path.display()),
                        None => format!("✓ {message}"),
                    };
                    app.log.push(LogKind::Success, &line);
                    app.status = (LogKind::Success, line);
                }
                RunOutcome::Failed { error, .. } => {
                    app.log.push(LogKind::Error, &format!("❌ Error: {error}"));
                    app.status = (LogKind::Error, format!("✗ Failed: {error}"));
                }
            }
        }
        Event::RunStopped { .. } => {
            end_run(app);
            app.log.push(LogKind::Info, "Process stopped by user");
            app.status = (LogKind::Info, "Stopped".to_string());
        }
        Event::LaunchFailed { error } => {
            end_run(app);
            app.log.push(LogKind::Error, &format!("Failed to start: {error}"));
            app.status = (LogKind::Error, format!("✗ Failed: {error}"));
        }
        Event::CacheCleared { ok, message } => {
            let kind = if ok { LogKind::Success } else { LogKind::Error };
            app.log.push(kind, &message);
        }
        Event::ControlRejected { error } => {
            app.log.push(LogKind::Error, &error);
        }
    }
}

fn send(app: &App, op: Op) {
    if app.op_tx.send(op).is_err() {
        tracing::warn!("Core is gone; dropping operation");
    }
}

/// Handle a keyboard event from the user.
///
/// Returns `true` if the application should exit, `false` otherwise.
pub fn handle_keyboard_event(app: &mut App, key_event: KeyEvent) -> bool {
    if key_event.kind != KeyEventKind::Press {
        return false;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        match key_event.code {
            KeyCode::Char('c') | KeyCode::Char('q') => {
                send(app, Op::Shutdown);
                return true;
            }
            KeyCode::Char('x') => send(app, Op::StopRun),
            KeyCode::Char('k') => send(app, Op::ClearCache),
            KeyCode::Char('l') => app.show_log = !app.show_log,
            _ => {}
        }
        return false;
    }

    if let Some(modal) = app.modal.as_mut() {
        match modal.handle_key_event(key_event) {
            ModalAction::None => {}
            ModalAction::Dismiss => app.modal = None,
            ModalAction::Submit(op) => {
                if let Op::ProvideApiKey { key } = &op {
                    app.form.set_youtube_api_key(key);
                }
                app.modal = None;
                send(app, op);
            }
        }
        return false;
    }

    match key_event.code {
        KeyCode::PageUp => app.log.page_up(),
        KeyCode::PageDown => app.log.page_down(),
        KeyCode::End => app.log.scroll_to_bottom(),
        // The form is locked while a run is active.
        _ if app.running => {}
        KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
        KeyCode::Char(c) => app.form.insert_char(c),
        KeyCode::Backspace => app.form.delete_char(),
        KeyCode::Enter => submit_form(app),
        _ => {}
    }

    false
}

/// Pasted text goes to the modal input if one is open, else to the form.
pub fn handle_paste(app: &mut App, text: &str) {
    for c in text.chars().filter(|c| !c.is_control()) {
        match app.modal.as_mut() {
            Some(modal) => {
                modal.handle_key_event(KeyEvent::from(KeyCode::Char(c)));
            }
            None if !app.running => app.form.insert_char(c),
            None => {}
        }
    }
}

fn submit_form(app: &mut App) {
    match app.form.to_config() {
        Ok(config) => {
            app.running = true;
            app.status = (LogKind::Info, "Starting...".to_string());
            send(app, Op::StartRun { config });
        }
        Err(e) => {
            app.log.push(LogKind::Error, &e.to_string());
            app.status = (LogKind::Error, e.to_string());
        }
    }
}
