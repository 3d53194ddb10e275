use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{
    path::{Component, Path, PathBuf},
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cmd::build::{add_build_args, run_build};
use crate::config::{WeaveConfig, load_watch_config};

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("watch"))
        .about("Build, then rebuild the whole site whenever a source file changes")
        .arg(
            Arg::new("debounce")
                .long("debounce")
                .value_name("MS")
                .help("Quiet period before rebuilding, in milliseconds [default: 300]")
                .value_parser(clap::value_parser!(u64)),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = load_watch_config(args)?;

    match run_build(&config) {
        Ok(report) => info!(pages = report.pages, "initial build finished"),
        Err(e) => error!("build failed: {e:#}"),
    }

    watch_source_files(config).await
}

async fn watch_source_files(config: WeaveConfig) -> Result<()> {
    let build_config = config.build_config();
    let source_dir = PathBuf::from(&build_config.source);
    let output_dir = PathBuf::from(&build_config.output);
    let config_file = PathBuf::from(&build_config.config);

    let (tx, mut rx) = mpsc::channel(100);
    let mut forwarder = ChangeForwarder::new(tx);

    let mut debouncer = new_debouncer(
        Duration::from_millis(build_config.debounce_ms),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    forwarder.forward(event.path);
                }
            }
            Err(e) => warn!("watch error: {e}"),
        },
    )?;

    // Watch source directory
    debouncer
        .watcher()
        .watch(&source_dir, RecursiveMode::Recursive)?;
    info!(path = %source_dir.display(), "watching source directory");

    let cwd = std::env::current_dir()?;
    let abs_source_dir = absolute(&source_dir, &cwd);
    let abs_output_dir = absolute(&output_dir, &cwd);
    let abs_config_file = absolute(&config_file, &cwd);

    // Watch config file if it lives outside the source directory
    if config_file.exists() && !abs_config_file.starts_with(&abs_source_dir) {
        debouncer
            .watcher()
            .watch(&config_file, RecursiveMode::NonRecursive)?;
        info!(path = %config_file.display(), "watching config file");
    }

    // Triggers queue up while a build runs; each batch is one full rebuild.
    while let Some(path) = rx.recv().await {
        let mut changed = vec![path];
        while let Ok(path) = rx.try_recv() {
            changed.push(path);
        }
        changed.retain(|path| is_source_change(path, &abs_output_dir, &cwd));

        let Some(first) = changed.first() else {
            continue;
        };
        info!(
            path = %first.display(),
            count = changed.len(),
            "source changed, rebuilding"
        );

        let build_config = config.clone();
        match tokio::task::spawn_blocking(move || run_build(&build_config)).await? {
            Ok(report) => info!(pages = report.pages, "site rebuilt"),
            Err(e) => error!("build failed: {e:#}"),
        }
    }

    Ok(())
}

/// Moves debounced paths onto the rebuild queue.
///
/// Once the watch loop is gone every further send would fail the same way,
/// so the first failure is logged and later events are dropped quietly.
struct ChangeForwarder {
    tx: mpsc::Sender<PathBuf>,
    open: bool,
}

impl ChangeForwarder {
    fn new(tx: mpsc::Sender<PathBuf>) -> Self {
        Self { tx, open: true }
    }

    fn forward(&mut self, path: PathBuf) {
        if !self.open {
            return;
        }
        if let Err(e) = self.tx.blocking_send(path) {
            debug!(path = %e.0.display(), "rebuild queue closed, dropping file events");
            self.open = false;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Absolute form of `path`, relative paths taken from `base`.
///
/// Works for paths that no longer exist: `.` and `..` are folded lexically
/// and only the deepest existing ancestor is canonicalized, so a deleted
/// `./dist/robots.txt` still lands under the canonical output directory.
fn absolute(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normal = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other),
        }
    }

    for ancestor in normal.ancestors() {
        let Ok(real) = ancestor.canonicalize() else {
            continue;
        };
        return match normal.strip_prefix(ancestor) {
            Ok(rest) if !rest.as_os_str().is_empty() => real.join(rest),
            _ => real,
        };
    }
    normal
}

/// Editor swap/backup files and anything we wrote ourselves.
///
/// `output_dir` must already be absolute; `path` may be relative to `base`.
fn is_source_change(path: &Path, output_dir: &Path, base: &Path) -> bool {
    if absolute(path, base).starts_with(output_dir) {
        return false;
    }

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let is_temp = matches!(ext, "bak" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.');

    !is_temp
}
