// src/pipeline/processors/command.rs

use std::io;
use std::process::{Output, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::debug;

use crate::errors::TransformError;
use crate::pipeline::asset::{Asset, StepOptions};
use crate::pipeline::registry::Processor;

/// `command`: pipe the asset through an external shell command.
///
/// `cmd` is required; `{path}` in it is replaced with the source path. Every
/// other option is exported as `ASSETDAG_OPT_<KEY>`. The asset contents go to
/// stdin and stdout becomes the new contents.
///
/// Runs on a blocking worker and drives the child on the Tokio runtime it
/// belongs to.
pub struct CommandStep;

fn env_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Feed `input` to the child's stdin while collecting its output.
async fn pipe_through(mut cmd: Command, input: Vec<u8>, cmd_line: &str) -> Result<Output, String> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("spawning `{cmd_line}`: {e}"))?;

    let stdin = child.stdin.take();
    let feed = async move {
        let Some(mut stdin) = stdin else {
            return Ok(());
        };
        match stdin.write_all(&input).await {
            // The child exited without reading all of its input.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output.map_err(|e| format!("waiting for `{cmd_line}`: {e}"))?;
    fed.map_err(|e| format!("writing stdin of `{cmd_line}`: {e}"))?;
    Ok(output)
}

impl Processor for CommandStep {
    fn name(&self) -> &'static str {
        "command"
    }

    fn process(&self, mut asset: Asset, options: &StepOptions) -> Result<Asset, TransformError> {
        let template = options
            .get_str("cmd")
            .map_err(|e| asset.fail(self.name(), e))?
            .ok_or_else(|| asset.fail(self.name(), "missing required option `cmd`"))?;
        let cmd_line = template.replace("{path}", &asset.source.display().to_string());

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd_line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&cmd_line);
            c
        };

        for (key, value) in options.iter().filter(|(k, _)| k.as_str() != "cmd") {
            cmd.env(format!("ASSETDAG_OPT_{}", key.to_ascii_uppercase()), env_value(value));
        }

        let handle = Handle::try_current()
            .map_err(|e| asset.fail(self.name(), format!("no Tokio runtime to run `{cmd_line}`: {e}")))?;

        debug!(cmd = %cmd_line, path = ?asset.source, "spawning command step");
        let input = std::mem::take(&mut asset.contents);
        let output = handle
            .block_on(pipe_through(cmd, input, &cmd_line))
            .map_err(|e| asset.fail(self.name(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(asset.fail(
                self.name(),
                format!("`{cmd_line}` exited with {code}: {}", stderr.trim()),
            ));
        }

        asset.contents = output.stdout;
        Ok(asset)
    }
}
