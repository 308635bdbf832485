// Launches the vehicle backend as a child process and forwards its output
use crate::infrastructure::config::BackendSettings;
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to the running backend. Dropping it kills the child.
pub struct BackendProcess {
    shutdown: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<()>,
}

impl BackendProcess {
    /// Spawn the configured backend, or return `None` when none is configured.
    pub fn spawn(settings: &BackendSettings) -> Result<Option<Self>> {
        let Some(program) = settings.command.as_deref() else {
            return Ok(None);
        };

        let mut child = Command::new(program)
            .args(&settings.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start backend {}", program))?;

        tracing::info!("Started backend {} (pid {:?})", program, child.id());

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, program.to_string(), false));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, program.to_string(), true));
        }

        let (tx, rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(child, program.to_string(), rx));

        Ok(Some(Self {
            shutdown: Some(tx),
            supervisor,
        }))
    }

    /// Kill the backend and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.supervisor).await {
            tracing::warn!("Backend supervisor ended abnormally: {}", e);
        }
    }
}

async fn supervise(mut child: Child, program: String, shutdown: oneshot::Receiver<()>) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => tracing::info!("Backend {} exited with {}", program, status),
            Err(e) => tracing::error!("Failed waiting on backend {}: {}", program, e),
        },
        _ = shutdown => {
            tracing::info!("Terminating backend {}", program);
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill backend {}: {}", program, e);
            }
        }
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(input: R, program: String, is_stderr: bool) {
    let mut lines = BufReader::new(input).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if is_stderr => tracing::warn!(target: "backend", "[{}] {}", program, line),
            Ok(Some(line)) => tracing::info!(target: "backend", "[{}] {}", program, line),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped reading backend output: {}", e);
                break;
            }
        }
    }
}
