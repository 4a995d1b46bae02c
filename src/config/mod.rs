pub mod build_args;
pub mod env_file;
pub mod target;

pub use build_args::BuildArgs;
pub use target::Target;

use std::path::{Path, PathBuf};

use env_file::{EnvFileError, SkippedLine};

/// Every source that contributes build arguments, lowest precedence first.
#[derive(Debug, Default)]
pub struct ArgSources<'a> {
    pub target: Target,
    pub env_file: Option<&'a Path>,
    /// Values from dedicated flags such as `--base-href`
    pub flags: Vec<(String, String)>,
    /// Raw repeatable `--build-arg KEY=VALUE` strings
    pub build_args: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileStatus {
    NotRequested,
    Missing(PathBuf),
    Loaded { path: PathBuf, entries: usize, skipped: Vec<SkippedLine> },
}

#[derive(Debug)]
pub struct Resolved {
    pub args: BuildArgs,
    pub env_file: EnvFileStatus,
    /// `--build-arg` values that were not `KEY=VALUE`, unredacted
    pub rejected: Vec<String>,
}

/// Merge defaults, the env file, target overrides and command-line values.
pub fn resolve(sources: &ArgSources<'_>) -> Result<Resolved, EnvFileError> {
    let mut args = BuildArgs::new();
    args.merge(target::DEFAULT_BUILD_ARGS.iter().copied());

    let env_file = match sources.env_file {
        None => EnvFileStatus::NotRequested,
        Some(path) => match env_file::load(path)? {
            None => {
                tracing::info!("Env file {} not found, continuing without it", path.display());
                EnvFileStatus::Missing(path.to_path_buf())
            }
            Some(file) => {
                for skipped in &file.skipped {
                    tracing::warn!(
                        "Ignoring malformed line in {}: {}",
                        path.display(),
                        build_args::redact(&skipped.text)
                    );
                }
                let entries = file.entries.len();
                args.merge(file.entries);
                EnvFileStatus::Loaded {
                    path: path.to_path_buf(),
                    entries,
                    skipped: file.skipped,
                }
            }
        },
    };

    args.merge(sources.target.overrides().iter().copied());
    args.merge(sources.flags.iter().cloned());

    let rejected = args.apply_overrides(sources.build_args);

    Ok(Resolved {
        args,
        env_file,
        rejected,
    })
}
