//! Mapping a worker exit to the result shown to the operator.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use vfm_protocol::RunOutcome;

pub const SUCCESS_MESSAGE: &str = "Video created successfully!";

fn filename_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)Final video saved as: ([a-zA-Z0-9_.-]+\.mp4)",
            r"(?i)Video compilation complete! Saved as: ([a-zA-Z0-9_.-]+\.mp4)",
            r"(?i)Copied final video to current directory: ([a-zA-Z0-9_.-]+\.mp4)",
        ]
        .map(|pattern| Regex::new(pattern).expect("filename regex should compile"))
    })
}

/// Name of the generated video announced in `output`, if any. Patterns are
/// tried in order and the first hit wins.
pub fn extract_filename(output: &str) -> Option<String> {
    filename_res()
        .iter()
        .find_map(|re| re.captures(output))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Outcome for a worker that exited on its own.
pub fn resolve_outcome(exit_code: Option<i32>, output: &str, videos_dir: &Path) -> RunOutcome {
    match exit_code {
        Some(0) => RunOutcome::Succeeded {
            message: SUCCESS_MESSAGE.to_string(),
            file_path: extract_filename(output).map(|name| videos_dir.join(name)),
        },
        Some(code) => RunOutcome::Failed {
            exit_code: Some(code),
            error: format!("Process exited with code {}", code),
        },
        None => RunOutcome::Failed {
            exit_code: None,
            error: "Process exited with code null (terminated by signal)".to_string(),
        },
    }
}
