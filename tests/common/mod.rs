use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Scratch working directory with an optional stand-in docker executable.
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn write_env_file(&self, content: &str) -> PathBuf {
        let path = self.root.path().join(".env");
        fs::write(&path, content).unwrap();
        path
    }

    /// Path of the log written by the fake docker (one line per call).
    #[allow(dead_code)]
    pub fn docker_log(&self) -> PathBuf {
        self.root.path().join("docker-calls.log")
    }

    #[allow(dead_code)]
    pub fn docker_calls(&self) -> Vec<String> {
        fs::read_to_string(self.docker_log())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Shell script that records each call and fails `kill`/`rm` as if no
    /// container existed. `fail_action` makes that action exit with 1.
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn fake_docker(&self, fail_action: Option<&str>) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root.path().join("fake-docker");
        let fail = fail_action.unwrap_or("__none__");
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> \"{log}\"\n\
             case \"$1\" in\n\
               kill|rm) exit 1 ;;\n\
               {fail}) exit 1 ;;\n\
             esac\n\
             exit 0\n",
            log = self.docker_log().display(),
            fail = fail,
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// The binary under test, run inside the project with a clean environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cherry-docker"));
        cmd.current_dir(self.root.path())
            .env_remove("CHERRY_DOCKER_BIN")
            .env_remove("CHERRY_ENV_FILE")
            .env_remove("DOCKER_USERNAME")
            .env_remove("DOCKER_REGISTRY")
            .env_remove("WEB_MAPS_API_KEY")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}
