//! One-shot app execution via `meltano run <app>`.

use crate::env::AppEnv;
use crate::error::CoreError;
use crate::launcher::{exit_code, LaunchRequest, Launcher};

/// Outcome of a single app run.
///
/// Both outcomes carry the full interleaved stdout/stderr, split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// `true` iff the process exited with code 0.
    pub success: bool,
    pub output: Vec<String>,
}

/// Runs apps through the shared [`Launcher`].
#[derive(Debug, Clone)]
pub struct AppRunner {
    launcher: Launcher,
}

impl AppRunner {
    pub fn new(launcher: Launcher) -> Self {
        Self { launcher }
    }

    /// Run `app_name` once with `input` exposed as `TAP_PIXLET_APP_INPUT`.
    ///
    /// Suspends until the process exits and all of its output has been read.
    /// A non-zero exit is reported through [`RunResult::success`]; only a
    /// failure to start or supervise the process is an `Err`.
    pub async fn run(
        &self,
        app_name: &str,
        input: &str,
        env: &AppEnv,
    ) -> Result<RunResult, CoreError> {
        tracing::info!(app = %app_name, input = %input, "Running app '{app_name}'");

        let request = LaunchRequest::new(["run", app_name])
            .env(env.to_overlay(input))
            .merged_output();
        let process = self.launcher.spawn(request).inspect_err(|err| {
            tracing::error!(app = %app_name, error = %err, "Failed to launch app '{app_name}'");
        })?;
        let (status, bytes) = process.wait_with_output().await?;

        let text = String::from_utf8_lossy(&bytes);
        let output = split_lines(&text);

        if status.success() {
            tracing::info!(app = %app_name, "App '{app_name}' ran successfully");
        } else {
            tracing::warn!(
                app = %app_name,
                exit_code = exit_code(&status),
                output = %text,
                "App '{app_name}' failed",
            );
        }

        Ok(RunResult {
            success: status.success(),
            output,
        })
    }
}

/// Characters that end a line: the ASCII and Unicode line and paragraph
/// separators, including vertical tab, form feed and the file, group and
/// record separators.
const LINE_TERMINATORS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Split captured output into lines on any of `LINE_TERMINATORS`, with
/// `\r\n` counted as a single terminator.
///
/// Terminators are dropped and a trailing terminator does not produce an
/// empty final line.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(LINE_TERMINATORS) {
            Some(idx) => {
                lines.push(rest[..idx].to_string());
                let tail = &rest[idx..];
                let skip = if tail.starts_with("\r\n") {
                    2
                } else {
                    tail.chars().next().map_or(1, char::len_utf8)
                };
                rest = &tail[skip..];
            }
            None => {
                lines.push(rest.to_string());
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_handles_all_terminators() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn split_lines_handles_control_and_unicode_separators() {
        assert_eq!(
            split_lines("a\x0bb\x0cc\x1cd\x1de\x1ef\u{85}g\u{2028}h\u{2029}i"),
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "i"]
        );
        assert_eq!(split_lines("progress\x0c\u{2028}"), vec!["progress", ""]);
    }

    #[test]
    fn split_lines_drops_trailing_terminator() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\n"), vec!["a"]);
    }

    #[test]
    fn split_lines_keeps_blank_lines() {
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn split_lines_of_empty_text_is_empty() {
        assert!(split_lines("").is_empty());
    }

    #[cfg(unix)]
    mod process {
        use assert_matches::assert_matches;

        use super::super::*;
        use crate::test_helpers::sh_launcher;

        fn runner(script: &str, dir: &std::path::Path) -> AppRunner {
            AppRunner::new(sh_launcher(script, dir))
        }

        #[tokio::test]
        async fn success_returns_merged_lines_in_order() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = runner(
                r#"echo "starting $2"; echo "warning" >&2; echo done"#,
                dir.path(),
            );

            let result = runner
                .run("clock", "", &AppEnv::default())
                .await
                .expect("run");
            assert!(result.success);
            assert_eq!(result.output, vec!["starting clock", "warning", "done"]);
        }

        #[tokio::test]
        async fn non_zero_exit_is_failure_with_same_output() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = runner("echo partial; echo 'boom' >&2; exit 7", dir.path());

            let result = runner
                .run("clock", "", &AppEnv::default())
                .await
                .expect("run");
            assert!(!result.success);
            assert_eq!(result.output, vec!["partial", "boom"]);
        }

        #[tokio::test]
        async fn passes_run_and_app_name() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = runner(r#"echo "$1"; echo "$2""#, dir.path());

            let result = runner
                .run("crypto-ticker", "", &AppEnv::default())
                .await
                .expect("run");
            assert_eq!(result.output, vec!["run", "crypto-ticker"]);
        }

        #[tokio::test]
        async fn input_is_exposed_through_environment() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = runner(r#"printf '%s\n' "$TAP_PIXLET_APP_INPUT""#, dir.path());

            let result = runner
                .run("clock", r#"{"timezone": "UTC"}"#, &AppEnv::default())
                .await
                .expect("run");
            assert_eq!(result.output, vec![r#"{"timezone": "UTC"}"#]);
        }

        #[tokio::test]
        async fn app_env_overlay_reaches_child() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = runner(
                r#"echo "$TAP_PIXLET_INSTALLATION_ID"; echo "$TAP_PIXLET_BACKGROUND""#,
                dir.path(),
            );

            let result = runner
                .run("clock", "", &AppEnv::notification())
                .await
                .expect("run");
            assert_eq!(result.output, vec!["notification", "false"]);
        }

        #[tokio::test]
        async fn invalid_utf8_is_replaced() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = runner(r"printf 'ok\377\n'", dir.path());

            let result = runner
                .run("clock", "", &AppEnv::default())
                .await
                .expect("run");
            assert_eq!(result.output, vec!["ok\u{FFFD}"]);
        }

        #[tokio::test]
        async fn missing_cli_is_a_launch_error() {
            let dir = tempfile::tempdir().expect("tempdir");
            let runner = AppRunner::new(Launcher::new("pixbyt-definitely-not-installed", dir.path()));

            let result = runner.run("clock", "", &AppEnv::default()).await;
            assert_matches!(result, Err(CoreError::Launch { .. }));
        }

        #[test]
        fn slow_run_does_not_hold_back_other_output() {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .max_blocking_threads(1)
                .enable_all()
                .build()
                .expect("runtime");

            runtime.block_on(async {
                let dir = tempfile::tempdir().expect("tempdir");
                let slow = runner("sleep 10", dir.path());
                let chatty = runner(
                    r#"awk 'BEGIN { for (i = 0; i < 40000; i++) print "pixbyt" }'"#,
                    dir.path(),
                );

                let slow_run = tokio::spawn(async move {
                    slow.run("slow", "", &AppEnv::default()).await
                });
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;

                let result = tokio::time::timeout(
                    std::time::Duration::from_secs(5),
                    chatty.run("chatty", "", &AppEnv::default()),
                )
                .await
                .expect("chatty run was blocked by the slow one")
                .expect("run");

                assert!(result.success);
                assert_eq!(result.output.len(), 40000);
                slow_run.abort();
            });
        }
    }
}
