use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway `invoke` program.
pub struct InvokeScript {
    // Keeps the directory alive for as long as the script is used.
    dir: TempDir,
    pub path: PathBuf,
}

impl InvokeScript {
    /// Writes an executable shell script running `body`.
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("invoke");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");

        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&path, permissions).expect("failed to make script executable");

        Self { dir, path }
    }

    pub fn program(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// File [`sink_script`] stores the event in.
    pub fn sink(&self) -> PathBuf {
        self.dir.path().join("sink")
    }
}

/// Echoes the event back on stdout and its arguments on stderr.
pub fn echo_script() -> InvokeScript {
    InvokeScript::new("cat\necho \"args: $*\" >&2")
}

/// Consumes the event, complains on stderr and fails with exit code 2.
pub fn failing_script() -> InvokeScript {
    InvokeScript::new("cat > /dev/null\necho \"handler crashed\" >&2\nexit 2")
}

/// Runs for a long time without reading its input.
pub fn slow_script() -> InvokeScript {
    InvokeScript::new("sleep 5\necho done")
}

/// Prints the value of `GREETING` on stdout.
pub fn env_script() -> InvokeScript {
    InvokeScript::new("cat > /dev/null\nprintf '%s' \"$GREETING\"")
}

/// Stores the event in [`InvokeScript::sink`] without printing anything.
pub fn sink_script() -> InvokeScript {
    InvokeScript::new("cat > \"$(dirname \"$0\")/sink\"")
}
