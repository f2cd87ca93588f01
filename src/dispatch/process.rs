//! External download manager processes (IDM, KGet, Persepolis)
//!
//! Each manager is invoked through a command template. The template is split
//! into arguments on whitespace, with double quotes grouping, and the link is
//! always passed as a single argument. Exit status is the only feedback these
//! programs give.

use crate::config::{DownloadManagerConfig, ManagerKind};
use crate::error::{DispatchError, ProcessFailure};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// IDM: `/n` suppresses questions, `/d` takes the URL
const IDM_TEMPLATE: &str = r#""{exe}" /n /d "{link}""#;
const KGET_TEMPLATE: &str = "{command} --hideMainWindow {link}";
const PERSEPOLIS_TEMPLATE: &str = r#"{command} "{link}""#;

/// A resolved command line for one manager invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerCommand {
    /// Which manager this launches
    pub manager: ManagerKind,
    /// Executable
    pub program: String,
    /// Arguments, the link among them
    pub args: Vec<String>,
}

impl ManagerCommand {
    /// Build the command line for `link`
    ///
    /// Returns `Ok(None)` for managers that are not process based.
    pub fn for_config(
        config: &DownloadManagerConfig,
        link: &str,
    ) -> Result<Option<Self>, DispatchError> {
        let (manager, template) = match config {
            DownloadManagerConfig::Idm { exe_path } => (
                ManagerKind::Idm,
                IDM_TEMPLATE.replace("{exe}", &exe_path.to_string_lossy()),
            ),
            DownloadManagerConfig::Kget { command } => {
                (ManagerKind::Kget, KGET_TEMPLATE.replace("{command}", command))
            }
            DownloadManagerConfig::Persepolis { command } => (
                ManagerKind::Persepolis,
                PERSEPOLIS_TEMPLATE.replace("{command}", command),
            ),
            DownloadManagerConfig::Builtin { .. }
            | DownloadManagerConfig::Aria2(_)
            | DownloadManagerConfig::Pyload(_) => return Ok(None),
        };

        let mut tokens = tokenize(&template)?
            .into_iter()
            .map(|token| token.replace("{link}", link));
        let program = tokens
            .next()
            .ok_or_else(|| DispatchError::InvalidCommand(template.clone()))?;

        Ok(Some(Self {
            manager,
            program,
            args: tokens.collect(),
        }))
    }

    /// Run the command to completion
    ///
    /// stdout and stderr are captured and logged together. With a timeout,
    /// the wait is abandoned once it elapses and the process is left running.
    pub async fn run(&self, timeout: Option<Duration>) -> Result<(), ProcessFailure> {
        let manager = self.manager.as_str();
        if is_bare_name(&self.program) && which::which(&self.program).is_err() {
            return Err(ProcessFailure::FailedToStart(format!(
                "{} not found in PATH",
                self.program
            )));
        }

        debug!(manager, program = %self.program, args = ?self.args, "launching download manager");
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessFailure::FailedToStart(e.to_string()))?;

        let wait = child.wait_with_output();
        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                ProcessFailure::TimedOut {
                    millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }
            })?,
            None => wait.await,
        }
        .map_err(|e| ProcessFailure::Io(e.to_string()))?;

        let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
        merged.push_str(&String::from_utf8_lossy(&output.stderr));
        if !merged.trim().is_empty() {
            debug!(manager, output = %merged.trim(), "download manager output");
        }

        match output.status.code() {
            Some(0) => {
                info!(manager, "download manager accepted link");
                Ok(())
            }
            Some(code) => {
                warn!(manager, code, "download manager exited with error");
                Err(ProcessFailure::ExitCode(code))
            }
            None => {
                let signal = termination_signal(&output.status);
                warn!(manager, signal = ?signal, "download manager crashed");
                Err(ProcessFailure::Crashed { signal })
            }
        }
    }
}

fn is_bare_name(program: &str) -> bool {
    !program.contains(['/', '\\'])
}

#[cfg(unix)]
fn termination_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Split a command template into arguments
///
/// Whitespace separates arguments; a double-quoted span is kept together
/// with the quotes removed.
pub fn tokenize(template: &str) -> Result<Vec<String>, DispatchError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for ch in template.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(DispatchError::InvalidCommand(format!(
            "unterminated quote in {template:?}"
        )));
    }
    if in_token {
        tokens.push(current);
    }
    if tokens.is_empty() {
        return Err(DispatchError::InvalidCommand("empty command".to_string()));
    }
    Ok(tokens)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const LINK: &str = "https://dl.example/My Show S01E01.mkv";

    #[test]
    fn tokenize_groups_double_quotes() {
        assert_eq!(
            tokenize(r#""C:\Program Files\IDM\IDMan.exe" /n /d "a b""#).unwrap(),
            vec![r"C:\Program Files\IDM\IDMan.exe", "/n", "/d", "a b"]
        );
        assert_eq!(tokenize("  kget   --x ").unwrap(), vec!["kget", "--x"]);
        assert!(matches!(
            tokenize(r#"kget "unterminated"#),
            Err(DispatchError::InvalidCommand(_))
        ));
        assert!(tokenize("   ").is_err());
    }

    #[test]
    fn idm_command_keeps_exe_path_and_link_whole() {
        let config = DownloadManagerConfig::Idm {
            exe_path: PathBuf::from(r"C:\Program Files (x86)\Internet Download Manager\IDMan.exe"),
        };
        let command = ManagerCommand::for_config(&config, LINK).unwrap().unwrap();
        assert_eq!(
            command.program,
            r"C:\Program Files (x86)\Internet Download Manager\IDMan.exe"
        );
        assert_eq!(command.args, vec!["/n", "/d", LINK]);
    }

    #[test]
    fn kget_and_persepolis_templates() {
        let kget = ManagerCommand::for_config(
            &DownloadManagerConfig::Kget {
                command: "flatpak run org.kde.kget".to_string(),
            },
            "https://dl.example/f.mkv",
        )
        .unwrap()
        .unwrap();
        assert_eq!(kget.program, "flatpak");
        assert_eq!(
            kget.args,
            vec!["run", "org.kde.kget", "--hideMainWindow", "https://dl.example/f.mkv"]
        );

        let persepolis = ManagerCommand::for_config(
            &DownloadManagerConfig::Persepolis {
                command: "persepolis".to_string(),
            },
            LINK,
        )
        .unwrap()
        .unwrap();
        assert_eq!(persepolis.args, vec![LINK]);
        assert_eq!(persepolis.manager, ManagerKind::Persepolis);
    }

    #[test]
    fn network_managers_have_no_command() {
        assert!(
            ManagerCommand::for_config(&DownloadManagerConfig::default(), LINK)
                .unwrap()
                .is_none()
        );
    }

    fn kget(command: &str) -> ManagerCommand {
        ManagerCommand::for_config(
            &DownloadManagerConfig::Kget {
                command: command.to_string(),
            },
            "https://dl.example/f.mkv",
        )
        .unwrap()
        .unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_is_success() {
        kget("true").run(None).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_exit_code_failure() {
        let err = kget(r#"sh -c "exit 3" sh"#).run(None).await.unwrap_err();
        assert_eq!(err, ProcessFailure::ExitCode(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn signal_termination_is_crash() {
        let err = kget(r#"sh -c "kill -9 $$" sh"#).run(None).await.unwrap_err();
        assert_eq!(err, ProcessFailure::Crashed { signal: Some(9) });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let err = kget(r#"sh -c "sleep 5" sh"#)
            .run(Some(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert_eq!(err, ProcessFailure::TimedOut { millis: 200 });
    }

    #[tokio::test]
    async fn missing_binary_fails_to_start() {
        let err = kget("tvlinker-no-such-manager-xyz")
            .run(None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessFailure::FailedToStart(_)));
    }
}
