//! Event collection and assertion helpers.

use std::time::Duration;
use tokio::sync::mpsc;
use vfm_protocol::Event;
use vfm_protocol::PromptKind;
use vfm_protocol::PromptRequest;
use vfm_protocol::RunOutcome;

/// Collect events until `stop` accepts one (included) or `timeout` elapses.
pub async fn collect_until<F>(
    rx: &mut mpsc::Receiver<Event>,
    timeout: Duration,
    stop: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut events = Vec::new();
    let start = tokio::time::Instant::now();

    while start.elapsed() < timeout {
        match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Some(event)) => {
                let done = stop(&event);
                events.push(event);
                if done {
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => continue,
        }
    }

    events
}

pub fn is_run_finished(event: &Event) -> bool {
    matches!(event, Event::RunFinished { .. })
}

pub fn is_prompt(kind: PromptKind) -> impl Fn(&Event) -> bool {
    move |event| matches!(event, Event::PromptRaised { prompt, .. } if prompt.kind() == kind)
}

/// Concatenated primary output.
pub fn primary_text(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::WorkerOutput { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

pub fn auto_answered(events: &[Event]) -> Vec<PromptKind> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::AutoAnswered { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

pub fn raised_prompts(events: &[Event]) -> Vec<PromptRequest> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::PromptRaised { prompt, .. } => Some(prompt.clone()),
            _ => None,
        })
        .collect()
}

pub fn finished_outcome(events: &[Event]) -> Option<RunOutcome> {
    events.iter().find_map(|e| match e {
        Event::RunFinished { outcome, .. } => Some(outcome.clone()),
        _ => None,
    })
}

/// Dump events to stdout; shown only when a test fails.
pub fn print_events(label: &str, events: &[Event]) {
    println!("📊 {}: {} events", label, events.len());
    for (i, event) in events.iter().enumerate() {
        println!("  Event {}: {:?}", i + 1, event);
    }
}
