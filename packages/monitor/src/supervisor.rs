//! Child-process supervision for the poller.
//!
//! Keeps exactly one poller process alive: spawns it with a UTF-8-forcing
//! environment, streams its merged output into this process's log, restarts
//! it on exit up to a bound, and guarantees no orphan survives shutdown.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::types::config::SupervisorConfig;

/// Restarts the poller child on unexpected exit, bounded.
///
/// The supervisor exclusively owns the child handle for its lifetime; the
/// shutdown path reaches the child through `run`, never through shared
/// state.
pub struct Supervisor {
    config: SupervisorConfig,
    restarts: u32,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            restarts: 0,
        }
    }

    /// Restarts performed so far.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Supervise until the child stops being restartable or shutdown is
    /// requested. Returns `true` when supervision ended because the restart
    /// budget ran out (the fatal stop), `false` on orderly shutdown.
    pub async fn run(&mut self, shutdown: CancellationToken) -> bool {
        info!(program = %self.config.program.display(), "supervisor starting");

        loop {
            if shutdown.is_cancelled() {
                info!("supervisor stopped before spawn");
                return false;
            }

            let mut child = match self.spawn() {
                Ok(child) => child,
                Err(e) => {
                    error!(error = %e, "failed to spawn child");
                    if !self.try_restart(&shutdown).await {
                        return self.finish(&shutdown);
                    }
                    continue;
                }
            };
            info!(pid = child.id().unwrap_or_default(), "child started");

            let pipes = self.drain_output(&mut child);

            // The wait future must be dropped before terminate can take the
            // child again, hence the two-step select.
            let exited = tokio::select! {
                status = child.wait() => Some(status),
                _ = shutdown.cancelled() => None,
            };
            let status = match exited {
                Some(status) => status,
                None => {
                    self.terminate(&mut child).await;
                    join_pipes(pipes).await;
                    info!("supervisor stopped");
                    return false;
                }
            };
            join_pipes(pipes).await;

            match status {
                Ok(status) => {
                    error!(code = status.code().unwrap_or(-1), "child exited")
                }
                Err(e) => error!(error = %e, "failed waiting for child"),
            }

            if !self.try_restart(&shutdown).await {
                return self.finish(&shutdown);
            }
        }
    }

    fn spawn(&self) -> std::io::Result<Child> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            // Force UTF-8 text I/O so the log relay never mangles output.
            .env("LANG", "C.UTF-8")
            .env("LC_ALL", "C.UTF-8")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command.spawn()
    }

    /// Relay both output streams line-by-line into our log, tagged with the
    /// child's component name.
    fn drain_output(&self, child: &mut Child) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            handles.push(relay_lines(stdout, self.config.child_name.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            handles.push(relay_lines(stderr, self.config.child_name.clone()));
        }
        handles
    }

    /// Decide whether another restart fits the budget; when it does, wait
    /// out the restart delay (cancellable).
    async fn try_restart(&mut self, shutdown: &CancellationToken) -> bool {
        if self.restarts >= self.config.max_restarts {
            return false;
        }
        self.restarts += 1;
        info!(
            restart = self.restarts,
            delay = ?self.config.restart_delay,
            "restarting child"
        );

        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.config.restart_delay) => true,
        }
    }

    /// `true` when the restart budget (not shutdown) ended supervision.
    fn finish(&self, shutdown: &CancellationToken) -> bool {
        if shutdown.is_cancelled() {
            info!("supervisor stopped");
            return false;
        }
        error!(
            restarts = self.restarts,
            "restart limit reached, giving up on the child"
        );
        true
    }

    /// Graceful terminate, bounded grace period, then kill.
    async fn terminate(&self, child: &mut Child) {
        info!("terminating child");
        signal_terminate(child);

        match tokio::time::timeout(self.config.kill_grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(code = status.code().unwrap_or(-1), "child exited after terminate")
            }
            Ok(Err(e)) => warn!(error = %e, "failed waiting for terminated child"),
            Err(_) => {
                warn!("child did not exit within grace period, killing");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill child");
                }
            }
        }
    }
}

fn relay_lines<R>(reader: R, name: String) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(child = %name, "{}", line);
        }
    })
}

async fn join_pipes(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(unix)]
fn signal_terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!(error = %e, "failed to signal child");
            }
        }
        None => warn!("child already gone before terminate"),
    }
}

#[cfg(not(unix))]
fn signal_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to kill child");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[cfg(unix)]
    #[tokio::test]
    async fn restart_budget_bounds_a_crash_loop() {
        let config = SupervisorConfig::new("/bin/true")
            .with_max_restarts(3)
            .with_restart_delay(Duration::from_millis(5));
        let mut supervisor = Supervisor::new(config);

        let fatal = supervisor.run(CancellationToken::new()).await;
        assert!(fatal);
        assert_eq!(supervisor.restarts(), 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shutdown_terminates_a_running_child() {
        let config = SupervisorConfig::new("/bin/sleep")
            .with_args(["60"])
            .with_kill_grace(Duration::from_secs(2));
        let mut supervisor = Supervisor::new(config);

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let fatal = tokio::time::timeout(Duration::from_secs(5), supervisor.run(shutdown))
            .await
            .expect("supervisor should stop promptly on shutdown");
        assert!(!fatal);
        assert_eq!(supervisor.restarts(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_failure_counts_against_the_budget() {
        let config = SupervisorConfig::new("/nonexistent/definitely-not-a-binary")
            .with_max_restarts(2)
            .with_restart_delay(Duration::from_millis(1));
        let mut supervisor = Supervisor::new(config);

        let fatal = supervisor.run(CancellationToken::new()).await;
        assert!(fatal);
        assert_eq!(supervisor.restarts(), 2);
    }
}
