//! Run lifecycle tests against scripted `sh` workers.
//!
//! These cover the whole controller path: launch, demultiplexed output,
//! prompt routing with stdin replies, progress, outcome resolution, stop
//! and cleanup.

#![cfg(unix)]

mod common;

use common::assertions::*;
use common::fixtures::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use vfm_core::launcher::command::YOUTUBE_KEY_ENV;
use vfm_core::launcher::credentials;
use vfm_core::launcher::LaunchError;
use vfm_core::lifecycle::ControlError;
use vfm_protocol::Event;
use vfm_protocol::PromptAnswer;
use vfm_protocol::PromptKind;
use vfm_protocol::PromptRequest;
use vfm_protocol::RunOutcome;
use vfm_protocol::Stage;
use vfm_protocol::WorkerStatus;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Auto-answered prompts are written back in order and a clean exit with a
/// completion line resolves to the announced file.
#[tokio::test]
async fn test_auto_answers_and_success_outcome() {
    let script = r#"
printf 'Enter your Last.fm username: '
read u
printf 'Enter the target year (e.g., 2024): '
read y
printf 'Enter the target month (1-12): '
read m
printf 'Enter the number of top songs to fetch: '
read n
printf 'Do you want to manually input YouTube URLs? (yes/no): '
read p
echo "got user=$u year=$y month=$m songs=$n manual=$p"
echo "Processing your top $n songs"
echo "Final video saved as: foo.mp4"
exit 0
"#;
    let mut h = harness(script);

    let handle = h
        .manager
        .start(sample_config())
        .await
        .expect("start should succeed");
    let run_id = handle.run_id;
    assert!(h.manager.is_running());

    let events = collect_until(&mut h.events, TIMEOUT, is_run_finished).await;
    print_events("auto answers", &events);

    assert!(matches!(events[0], Event::RunStarted { run_id: id } if id == run_id));
    assert_eq!(
        auto_answered(&events),
        vec![
            PromptKind::Username,
            PromptKind::Year,
            PromptKind::Month,
            PromptKind::SongCount,
            PromptKind::ManualUrlPreference,
        ]
    );
    assert!(primary_text(&events).contains("got user=alice year=2024 month=3 songs=5 manual=no"));
    assert!(raised_prompts(&events).is_empty());
    assert!(events.iter().any(|e| matches!(
        e,
        Event::VideoReady { filename: Some(name), .. } if name == "foo.mp4"
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ProgressUpdate { progress, .. } if progress.stage == Stage::Complete
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::WorkerStatusUpdate { status: WorkerStatus::Exited, .. }
    )));

    let expected = RunOutcome::Succeeded {
        message: "Video created successfully!".to_string(),
        file_path: Some(h.paths.videos_dir().join("foo.mp4")),
    };
    assert_eq!(finished_outcome(&events), Some(expected.clone()));
    assert_eq!(handle.wait().await, Some(expected));
    assert!(!h.manager.is_running());
}

#[tokio::test]
async fn test_nonzero_exit_is_failure() {
    let mut h = harness("echo 'boom' >&2; exit 1");

    let handle = h.manager.start(sample_config()).await.expect("start");
    let events = collect_until(&mut h.events, TIMEOUT, is_run_finished).await;

    assert!(events.iter().any(|e| matches!(
        e,
        Event::WorkerError { error, .. } if error.contains("boom")
    )));
    let expected = RunOutcome::Failed {
        exit_code: Some(1),
        error: "Process exited with code 1".to_string(),
    };
    assert_eq!(finished_outcome(&events), Some(expected.clone()));
    assert_eq!(handle.wait().await, Some(expected));
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let h = harness("read x");

    let _handle = h.manager.start(sample_config()).await.expect("first start");
    let second = h.manager.start(sample_config()).await;
    assert!(matches!(second, Err(LaunchError::AlreadyRunning)));

    h.manager.stop().await;
}

#[tokio::test]
async fn test_stop_clears_handle_and_cleans_up() {
    let mut h = harness("read x");
    seed_artifacts(&h.paths);

    let handle = h.manager.start(sample_config()).await.expect("start");
    let run_id = handle.run_id;

    let report = h.manager.stop().await;
    assert!(report.had_process);
    assert_eq!(report.run_id, Some(run_id));
    assert!(report.cleanup.is_clean());
    assert!(!h.manager.is_running());
    assert!(!h.paths.clips_dir().exists());
    assert!(!h.paths.progress_file().exists());
    assert!(!h.paths.file_list().exists());

    let outcome = tokio::time::timeout(TIMEOUT, handle.wait())
        .await
        .expect("worker should exit after SIGTERM");
    assert_eq!(
        outcome,
        Some(RunOutcome::Failed {
            exit_code: None,
            error: "Process stopped by user".to_string(),
        })
    );

    let events = collect_until(&mut h.events, Duration::from_millis(500), |_| false).await;
    assert!(events.iter().any(|e| matches!(e, Event::RunStopped { run_id: id } if *id == run_id)));
    assert!(events.iter().any(|e| matches!(
        e,
        Event::WorkerStatusUpdate { status: WorkerStatus::Exiting, .. }
    )));
    assert!(finished_outcome(&events).is_none(), "stopped runs do not finish");

    // The slot is free again.
    let _next = h.manager.start(sample_config()).await.expect("restart");
    h.manager.shutdown().await;
}

#[tokio::test]
async fn test_stop_without_process_still_cleans_up() {
    let h = harness("true");
    seed_artifacts(&h.paths);

    let report = h.manager.stop().await;
    assert!(!report.had_process);
    assert_eq!(report.run_id, None);
    assert!(report.cleanup.removed > 0);
    assert!(!h.paths.clips_dir().exists());
}

#[tokio::test]
async fn test_operator_answer_is_written_to_stdin() {
    let script = r#"
printf 'Do you need to replace any videos? (yes/no): '
read a
echo "got:$a"
"#;
    let mut h = harness(script);
    let handle = h.manager.start(sample_config()).await.expect("start");

    let events = collect_until(&mut h.events, TIMEOUT, is_prompt(PromptKind::ReplaceVideos)).await;
    assert_eq!(raised_prompts(&events), vec![PromptRequest::ReplaceVideos]);

    h.manager
        .answer(PromptAnswer::ReplaceVideos(true))
        .expect("answer should be delivered");

    let events = collect_until(&mut h.events, TIMEOUT, is_run_finished).await;
    assert!(primary_text(&events).contains("got:yes"));
    assert!(handle.wait().await.is_some_and(|o| o.is_success()));
}

#[tokio::test]
async fn test_overwrite_prompt_on_stderr() {
    let script = r#"
printf "File 'Videos/foo.mp4' already exists. Overwrite? [y/N] " >&2
read a
echo "ow:$a"
"#;
    let mut h = harness(script);
    let _handle = h.manager.start(sample_config()).await.expect("start");

    let events = collect_until(&mut h.events, TIMEOUT, is_prompt(PromptKind::Overwrite)).await;
    assert_eq!(
        raised_prompts(&events),
        vec![PromptRequest::Overwrite {
            filename: Some("foo.mp4".to_string())
        }]
    );

    h.manager.answer(PromptAnswer::Overwrite(true)).expect("answer");
    let events = collect_until(&mut h.events, TIMEOUT, is_run_finished).await;
    assert!(primary_text(&events).contains("ow:y"));
}

#[tokio::test]
async fn test_provide_api_key_answers_and_persists() {
    let script = r#"
printf 'API quota exceeded. Try again tomorrow, or enter a new API key:\nEnter new API key: '
read k
echo "key:$k"
"#;
    let mut h = harness(script);
    credentials::write_credentials(h.paths.data_dir(), &sample_config()).expect("write .env");

    let _handle = h.manager.start(sample_config()).await.expect("start");
    collect_until(&mut h.events, TIMEOUT, is_prompt(PromptKind::NewApiKey)).await;

    h.manager
        .provide_api_key("yt-fresh".to_string())
        .expect("key should be delivered");

    let events = collect_until(&mut h.events, TIMEOUT, is_run_finished).await;
    assert!(primary_text(&events).contains("key:yt-fresh"));

    let env = std::fs::read_to_string(h.paths.env_file()).expect("read .env");
    assert_eq!(env, format!("LASTFM_API_KEY=lfm-key\n{}=yt-fresh", YOUTUBE_KEY_ENV));
}

#[tokio::test]
async fn test_answer_without_run_is_an_error() {
    let h = harness("true");
    assert_eq!(
        h.manager.answer(PromptAnswer::ManualUrl(None)),
        Err(ControlError::NoActiveProcess)
    );
    assert_eq!(
        h.manager.provide_api_key("k".to_string()),
        Err(ControlError::NoActiveProcess)
    );
}

#[tokio::test]
async fn test_launch_failure_frees_the_slot() {
    let mut h = harness("true");
    // A working directory that does not exist makes the spawn fail.
    let broken = std::sync::Arc::new(ScriptLauncher {
        script: "true".to_string(),
        cwd: h.dir.path().join("missing"),
    });
    let mut h2 = harness_with(
        tempfile::tempdir().expect("tempdir"),
        h.paths.clone(),
        broken,
    );

    let result = h2.manager.start(sample_config()).await;
    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    assert!(!h2.manager.is_running());

    let events = collect_until(&mut h2.events, Duration::from_secs(1), |e| {
        matches!(e, Event::LaunchFailed { .. })
    })
    .await;
    assert!(matches!(events.last(), Some(Event::LaunchFailed { .. })));

    // Nothing leaked into the first harness.
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let h = harness("read x");
    seed_artifacts(&h.paths);
    let handle = h.manager.start(sample_config()).await.expect("start");

    h.manager.shutdown().await;
    h.manager.shutdown().await;
    assert!(!h.manager.is_running());
    assert!(!h.paths.clips_dir().exists());

    let outcome = tokio::time::timeout(TIMEOUT, handle.wait())
        .await
        .expect("worker should be killed");
    assert!(!outcome.is_some_and(|o| o.is_success()));
}

/// A grandchild keeps the pipes open after the worker exits 0. A stop during
/// that drain must not signal the reaped pid or turn the run into a failure.
#[tokio::test]
async fn test_stop_after_exit_keeps_real_outcome() {
    let mut h = harness("sleep 3 & echo 'Final video saved as: foo.mp4'; exit 0");
    let handle = h.manager.start(sample_config()).await.expect("start");
    let run_id = handle.run_id;

    collect_until(&mut h.events, TIMEOUT, |e| {
        matches!(e, Event::WorkerStatusUpdate { status: WorkerStatus::Exited, .. })
    })
    .await;

    let report = h.manager.stop().await;
    assert!(!report.had_process);
    assert_eq!(report.run_id, Some(run_id));

    let expected = RunOutcome::Succeeded {
        message: "Video created successfully!".to_string(),
        file_path: Some(h.paths.videos_dir().join("foo.mp4")),
    };
    let outcome = tokio::time::timeout(TIMEOUT, handle.wait())
        .await
        .expect("session should finish after the drain");
    assert_eq!(outcome, Some(expected.clone()));

    let events = collect_until(&mut h.events, TIMEOUT, is_run_finished).await;
    assert_eq!(finished_outcome(&events), Some(expected));
    assert!(!events.iter().any(|e| matches!(e, Event::RunStopped { .. })));
    assert!(!h.manager.is_running());
}

#[tokio::test]
async fn test_stop_while_launching_cancels_start() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = vfm_core::config::AppPaths::new(dir.path());
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let launcher = GatedLauncher {
        inner: ScriptLauncher {
            script: "read x".to_string(),
            cwd: dir.path().to_path_buf(),
        },
        entered: entered.clone(),
        release: release.clone(),
    };
    let mut h = harness_with(dir, paths, Arc::new(launcher));

    let manager = h.manager.clone();
    let start = tokio::spawn(async move { manager.start(sample_config()).await });
    entered.notified().await;
    assert!(h.manager.is_running());

    let report = h.manager.stop().await;
    assert!(!report.had_process);
    assert!(report.run_id.is_some());

    release.notify_one();
    let result = start.await.expect("start task");
    assert!(matches!(result, Err(LaunchError::Cancelled)));
    assert!(!h.manager.is_running());

    let events = collect_until(&mut h.events, Duration::from_millis(300), |_| false).await;
    assert!(events.iter().any(|e| matches!(e, Event::RunStopped { .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::RunStarted { .. })));
    assert!(!events.iter().any(|e| matches!(e, Event::LaunchFailed { .. })));
}

/// SIGTERM is delivered but ignored. Stop still returns at once and frees
/// the slot; the session keeps the child until it is dropped.
#[tokio::test]
async fn test_stop_does_not_wait_for_worker_ignoring_sigterm() {
    let mut h = harness("trap '' TERM; echo ready; read x");
    let handle = h.manager.start(sample_config()).await.expect("start");
    collect_until(&mut h.events, TIMEOUT, |e| {
        matches!(e, Event::WorkerOutput { content, .. } if content.contains("ready"))
    })
    .await;

    let report = tokio::time::timeout(Duration::from_secs(1), h.manager.stop())
        .await
        .expect("stop must not wait for the worker");
    assert!(report.had_process);
    assert!(!h.manager.is_running());

    let mut handle = Box::pin(handle.wait());
    assert!(
        tokio::time::timeout(Duration::from_millis(300), &mut handle)
            .await
            .is_err(),
        "worker ignores SIGTERM and keeps running"
    );

    let _next = h.manager.start(sample_config()).await.expect("slot is free");
    h.manager.shutdown().await;
}

#[tokio::test]
async fn test_emergency_shutdown_kills_running_worker() {
    let h = harness("read x");
    seed_artifacts(&h.paths);
    let handle = h.manager.start(sample_config()).await.expect("start");

    let report = h.manager.emergency_shutdown_blocking();
    assert!(report.is_clean());
    assert!(!h.manager.is_running());
    assert!(!h.paths.clips_dir().exists());
    assert!(!h.paths.file_list().exists());

    let outcome = tokio::time::timeout(TIMEOUT, handle.wait())
        .await
        .expect("worker should be killed");
    assert_eq!(
        outcome,
        Some(RunOutcome::Failed {
            exit_code: None,
            error: "Process stopped by user".to_string(),
        })
    );
}
