// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! External solver invocation
//!
//! The solver runs in the input file's directory. Its output is streamed
//! line by line to the log while the caller blocks; there is no timeout.

use fire_lite_model::{Error, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

/// Run `program input` and wait for it to exit
///
/// A non-zero exit is returned as [`Error::ExternalProcess`]; the input
/// file is left in place either way.
pub fn run_solver(program: impl AsRef<Path>, input: impl AsRef<Path>) -> Result<()> {
    let program = program.as_ref();
    let input = input.as_ref();
    let name = program.display().to_string();

    let mut command = Command::new(program);
    command
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = input.parent().filter(|d| !d.as_os_str().is_empty()) {
        command.current_dir(dir);
    }
    log::info!("running {} on {}", name, input.display());
    let mut child = command.spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    std::thread::scope(|scope| {
        if let Some(stderr) = stderr {
            scope.spawn(|| stream(&name, "stderr", stderr));
        }
        if let Some(stdout) = stdout {
            stream(&name, "stdout", stdout);
        }
    });
    let status = child.wait()?;

    if status.success() {
        log::info!("{} finished", name);
        Ok(())
    } else {
        Err(Error::ExternalProcess {
            program: name,
            code: status.code(),
        })
    }
}

fn stream(program: &str, channel: &str, pipe: impl Read) {
    for line in BufReader::new(pipe).lines() {
        match line {
            Ok(line) => log::info!("[{} {}] {}", program, channel, line),
            Err(err) => {
                log::warn!("[{} {}] unreadable output: {}", program, channel, err);
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use fire_lite_model::ErrorKind;

    #[test]
    fn test_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("solve.sh");
        std::fs::write(&script, "echo solving\necho warning >&2\n").unwrap();
        run_solver("sh", &script).unwrap();
    }

    #[test]
    fn test_failed_run() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("solve.sh");
        std::fs::write(&script, "echo diverged\nexit 3\n").unwrap();
        let err = run_solver("sh", &script).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalProcess);
        assert!(matches!(err, Error::ExternalProcess { code: Some(3), .. }));
        assert!(script.exists());
    }

    #[test]
    fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("no-such-solver");
        let err = run_solver(program, dir.path().join("model.IN")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
