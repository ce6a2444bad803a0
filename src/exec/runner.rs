/// Single-script process execution with live output streaming
///
/// The runner launches one script, forwards its merged stdout/stderr to the
/// controlling terminal byte for byte as it arrives (scripts redraw progress
/// bars with carriage returns, so output is never line-buffered or
/// re-encoded), and in parallel watches the same byte stream for the final
/// status one-liner. Every failure mode - unsupported script type, spawn
/// error, non-zero exit, user interrupt - degrades to a synthesized verdict;
/// the runner itself never fails the caller.
use crate::config::types::{
    ExecutionResult, ScriptDescriptor, ScriptKind, EXIT_CODE_INTERRUPTED,
};
use crate::verdict::status_line::extract_status_line;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::{FromRawFd, OwnedFd};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Read chunk size for the output pump. Small enough to keep progress-bar
/// redraws latency-free, large enough to not thrash on chatty scripts.
const READ_CHUNK: usize = 1024;

/// Poll interval while the pipe is drained but the child has not exited
const EXIT_POLL: Duration = Duration::from_millis(10);

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn sigint_handler(_sig: i32) {
    // ASYNC-SIGNAL SAFETY: an atomic store is the only thing allowed here.
    // The flag is observed by the pump loop; the in-flight script is failed
    // and the batch decides whether to carry on.
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT flag handler. Call once from the CLI entry before any
/// script runs; without it, Ctrl+C kills the whole tool instead of failing
/// the in-flight script.
pub fn install_interrupt_handler() {
    unsafe {
        libc::signal(libc::SIGINT, sigint_handler as usize);
    }
}

fn interrupt_pending() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Consume the interrupt flag, reporting whether it was set.
fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

/// Interpreter binaries used per script kind
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub python_bin: String,
    pub shell_bin: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            python_bin: "python3".to_string(),
            shell_bin: "zsh".to_string(),
        }
    }
}

/// Executes one script at a time against a working directory
pub struct ScriptRunner {
    config: RunnerConfig,
}

impl ScriptRunner {
    pub fn new(config: RunnerConfig) -> Self {
        ScriptRunner { config }
    }

    /// Run one script against a working directory, returning its exit code
    /// and the last output line matching the status grammar.
    ///
    /// Python scripts get the working directory as their sole argument;
    /// shell scripts get it as their process working directory.
    pub fn run(&self, script: &ScriptDescriptor, working_dir: &Path) -> ExecutionResult {
        self.run_with_sink(script, working_dir, &mut io::stdout())
    }

    fn run_with_sink(
        &self,
        script: &ScriptDescriptor,
        working_dir: &Path,
        sink: &mut dyn Write,
    ) -> ExecutionResult {
        let Some(kind) = script.kind else {
            return ExecutionResult {
                exit_code: 1,
                status_line: Some(format!("❌ Unsupported script type: {}", script.name)),
            };
        };

        match self.spawn_and_pump(script, kind, working_dir, sink) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("❌ Script runner error: {}", e);
                ExecutionResult {
                    exit_code: 1,
                    status_line: Some(format!("❌ {} runner error: {}", script.name, e)),
                }
            }
        }
    }

    fn command_for(&self, script: &ScriptDescriptor, kind: ScriptKind, working_dir: &Path) -> Command {
        match kind {
            ScriptKind::Python => {
                let mut cmd = Command::new(&self.config.python_bin);
                cmd.arg(&script.path).arg(working_dir);
                cmd
            }
            ScriptKind::Shell => {
                let mut cmd = Command::new(&self.config.shell_bin);
                cmd.arg(&script.path);
                cmd.current_dir(working_dir);
                cmd
            }
        }
    }

    fn spawn_and_pump(
        &self,
        script: &ScriptDescriptor,
        kind: ScriptKind,
        working_dir: &Path,
        sink: &mut dyn Write,
    ) -> io::Result<ExecutionResult> {
        let (read_end, write_end) = merged_output_pipe()?;

        let mut cmd = self.command_for(script, kind, working_dir);
        cmd.stdin(Stdio::inherit());
        // stdout and stderr share one pipe so the terminal sees the exact
        // interleaving the script produced.
        cmd.stdout(Stdio::from(write_end.try_clone()?));
        cmd.stderr(Stdio::from(write_end));

        let mut child = cmd.spawn()?;
        // The Command still holds the parent's copies of the write end;
        // drop it now or the read loop never sees EOF.
        drop(cmd);

        let reader = File::from(read_end);
        match self.pump(&mut child, reader, &script.name, sink) {
            Ok(result) => Ok(result),
            Err(e) => {
                // A pump failure must not leave the script running behind
                // the next one in the batch. Terminate and reap before
                // surfacing the error.
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    fn pump(
        &self,
        child: &mut Child,
        mut reader: File,
        script_name: &str,
        sink: &mut dyn Write,
    ) -> io::Result<ExecutionResult> {
        let mut chunk = [0u8; READ_CHUNK];
        let mut line_buf: Vec<u8> = Vec::new();
        let mut status_line: Option<String> = None;

        loop {
            if interrupt_pending() {
                return Ok(self.finish_interrupted(child, script_name));
            }

            match reader.read(&mut chunk) {
                Ok(0) => {
                    // Zero bytes only ends the stream once the child is
                    // actually gone; a still-running child may just have
                    // closed its own copies early.
                    if child.try_wait()?.is_some() {
                        break;
                    }
                    std::thread::sleep(EXIT_POLL);
                }
                Ok(n) => {
                    // Raw bytes straight through, flushed immediately, so
                    // '\r' progress redraws render in place.
                    sink.write_all(&chunk[..n])?;
                    sink.flush()?;

                    for &byte in &chunk[..n] {
                        line_buf.push(byte);
                        if byte == b'\n' {
                            scan_for_status(&line_buf, &mut status_line);
                            line_buf.clear();
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        // A final line with no trailing newline still counts.
        if !line_buf.is_empty() {
            scan_for_status(&line_buf, &mut status_line);
        }

        let status = child.wait()?;

        // Ctrl+C reaches the child through the foreground process group, so
        // the usual interrupt path is an EOF with the flag already set.
        if take_interrupt() {
            println!("\n🛑 Script interrupted by user (Ctrl+C)");
            return Ok(interrupted_result(script_name));
        }

        Ok(ExecutionResult {
            exit_code: exit_code_of(status),
            status_line,
        })
    }

    fn finish_interrupted(&self, child: &mut Child, script_name: &str) -> ExecutionResult {
        let _ = child.kill();
        let _ = child.wait();
        let _ = take_interrupt();
        println!("\n🛑 Script interrupted by user (Ctrl+C)");
        interrupted_result(script_name)
    }

    /// Run the script with `--help`, stdio inherited. Menu convenience only.
    pub fn show_help(&self, script: &ScriptDescriptor) {
        println!("\n=== Help for {} ===", script.name);
        match script.kind {
            Some(kind) => {
                let mut cmd = match kind {
                    ScriptKind::Python => Command::new(&self.config.python_bin),
                    ScriptKind::Shell => Command::new(&self.config.shell_bin),
                };
                cmd.arg(&script.path).arg("--help");
                if let Err(e) = cmd.status() {
                    println!("⚠️  Error showing help: {}", e);
                }
            }
            None => println!("⚠️  Unsupported script type: {}", script.name),
        }
        println!("===================================\n");
    }
}

fn interrupted_result(script_name: &str) -> ExecutionResult {
    ExecutionResult {
        exit_code: EXIT_CODE_INTERRUPTED,
        status_line: Some(format!("❌ {} interrupted (Ctrl+C)", script_name)),
    }
}

/// Decode one buffered line leniently and keep it if it matches the status
/// grammar. Later matches overwrite earlier ones: the last one wins.
fn scan_for_status(line_buf: &[u8], status_line: &mut Option<String>) {
    let line = String::from_utf8_lossy(line_buf);
    if let Some(matched) = extract_status_line(&line) {
        *status_line = Some(matched.to_string());
    }
}

/// One pipe shared by the child's stdout and stderr. O_CLOEXEC keeps the
/// read end out of the child; spawn re-dups the write end onto fds 1 and 2.
fn merged_output_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn sh_runner() -> ScriptRunner {
        ScriptRunner::new(RunnerConfig {
            python_bin: "python3".to_string(),
            shell_bin: "sh".to_string(),
        })
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("proofgate-runner-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> ScriptDescriptor {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        ScriptDescriptor::new(path)
    }

    #[test]
    fn unsupported_script_type_is_rejected_without_spawning() {
        let dir = scratch_dir("unsupported");
        let script = write_script(&dir, "notes.txt", "not runnable");
        let result = sh_runner().run(&script, &dir);
        assert_eq!(result.exit_code, 1);
        let line = result.status_line.unwrap();
        assert!(line.contains("Unsupported script type"));
        assert!(line.contains("notes.txt"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn spawn_failure_becomes_a_runner_error_verdict() {
        let dir = scratch_dir("spawnfail");
        let script = write_script(&dir, "check.sh", "true");
        let runner = ScriptRunner::new(RunnerConfig {
            python_bin: "python3".to_string(),
            shell_bin: "/nonexistent/proofgate-test-shell".to_string(),
        });
        let result = runner.run(&script, &dir);
        assert_eq!(result.exit_code, 1);
        assert!(result.status_line.unwrap().contains("runner error"));
        let _ = fs::remove_dir_all(&dir);
    }

    /// Stands in for a terminal whose reader has gone away: every write
    /// fails like a closed pipe.
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "broken pipe"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn output_write_failure_kills_and_reaps_the_child() {
        let dir = scratch_dir("brokensink");
        let script = write_script(
            &dir,
            "check.sh",
            "echo $$ > child.pid\nprintf 'started\\n'\nsleep 30\n",
        );

        let result = sh_runner().run_with_sink(&script, &dir, &mut BrokenSink);
        assert_eq!(result.exit_code, 1);
        assert!(result.status_line.unwrap().contains("runner error"));

        let pid: i32 = fs::read_to_string(dir.join("child.pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        // The runner must have terminated and reaped the script before
        // returning; its pid is no longer signallable.
        let rc = unsafe { libc::kill(pid, 0) };
        let err = io::Error::last_os_error();
        assert_eq!(rc, -1);
        assert_eq!(err.raw_os_error(), Some(libc::ESRCH));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clean_script_yields_its_status_line() {
        let dir = scratch_dir("clean");
        let script = write_script(&dir, "check.sh", "printf '✅ all clear\\n'\n");
        let result = sh_runner().run(&script, &dir);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.status_line.as_deref(), Some("✅ all clear"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn last_matching_line_wins() {
        let dir = scratch_dir("lastwins");
        let script = write_script(
            &dir,
            "check.sh",
            "printf '⚠️ midway warning\\n'\nprintf 'progress 2/2\\n'\nprintf '✅ finished fine\\n'\n",
        );
        let result = sh_runner().run(&script, &dir);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.status_line.as_deref(), Some("✅ finished fine"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn trailing_line_without_newline_is_still_scanned() {
        let dir = scratch_dir("nonewline");
        let script = write_script(&dir, "check.sh", "printf '✅ done'\n");
        let result = sh_runner().run(&script, &dir);
        assert_eq!(result.status_line.as_deref(), Some("✅ done"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stderr_is_part_of_the_observed_stream() {
        let dir = scratch_dir("stderr");
        let script = write_script(&dir, "check.sh", "printf '⚠️ emitted on stderr\\n' >&2\n");
        let result = sh_runner().run(&script, &dir);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.status_line.as_deref(), Some("⚠️ emitted on stderr"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn silent_nonzero_exit_preserves_the_code() {
        let dir = scratch_dir("exit3");
        let script = write_script(&dir, "check.sh", "exit 3\n");
        let result = sh_runner().run(&script, &dir);
        assert_eq!(result.exit_code, 3);
        assert!(result.status_line.is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn shell_scripts_run_in_the_working_directory() {
        let dir = scratch_dir("cwd");
        let book = dir.join("book");
        fs::create_dir_all(&book).unwrap();
        fs::write(book.join("marker"), "x").unwrap();
        let script = write_script(
            &dir,
            "check.sh",
            "if [ -f marker ]; then printf '✅ marker seen\\n'; else printf '❌ wrong cwd\\n'; fi\n",
        );
        let result = sh_runner().run(&script, &book);
        assert_eq!(result.status_line.as_deref(), Some("✅ marker seen"));
        let _ = fs::remove_dir_all(&dir);
    }
}
