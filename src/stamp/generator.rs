use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{StampError, StampResult};
use crate::stamp::options::Options;

/// Narrow contract of the image→mesh converter.
pub trait StampGenerator {
    fn generate_from_bytes(&self, image: &[u8], options: &Options) -> StampResult<String>;
}

/// Runs an external converter executable.
///
/// The image is streamed to the child's stdin and the OBJ text is read back
/// from its stdout. The call blocks until the child exits.
pub struct CommandGenerator {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    #[cfg(test)]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    fn command(&self, options: &Options) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .args(options.to_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl StampGenerator for CommandGenerator {
    fn generate_from_bytes(&self, image: &[u8], options: &Options) -> StampResult<String> {
        let start = Instant::now();

        let mut child = self
            .command(options)
            .spawn()
            .map_err(|source| StampError::ConverterSpawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let output = thread::scope(|scope| {
            // Feed stdin from a separate thread so a chatty child can't
            // deadlock on a full stdout pipe.
            let writer = scope.spawn(move || -> std::io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(image)?;
                }
                Ok(())
            });

            let output = child.wait_with_output();
            if let Ok(Err(e)) = writer.join() {
                // The child may close stdin early once it has what it needs.
                warn!("converter stdin closed early: {}", e);
            }
            output
        })?;

        if !output.status.success() {
            return Err(StampError::ConverterFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout)?;
        debug!(
            bytes = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "converter finished"
        );
        Ok(text)
    }
}
