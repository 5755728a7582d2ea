//! Shared test helpers for git-stitch integration tests.
#![allow(dead_code)]
//!
//! Every [`TestRepo`] is a real git repository in its own temp dir, driven by
//! the git CLI. Commits get fixed identities and a per-repo clock, so object
//! ids are reproducible across runs.
//!
//! # Example
//!
//! ```rust,no_run
//! let alpha = TestRepo::origin(&[("a.txt", "1")]);
//! let beta = TestRepo::origin(&[("b.txt", "2")]);
//! let mono = TestRepo::composite(&[("alpha", &alpha), ("beta", &beta)]);
//! let hash = mono.init_and_checkout(&["alpha", "beta"]);
//! ```

use std::cell::Cell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use stitch_git::GixRepo;
use tempfile::TempDir;

/// Clock start for commits made by the helpers (2023-11-14T22:13:20Z).
pub const EPOCH: i64 = 1_700_000_000;

pub const AUTHOR_NAME: &str = "Ada Author";
pub const AUTHOR_EMAIL: &str = "ada@example.com";
pub const COMMITTER_NAME: &str = "Cy Committer";
pub const COMMITTER_EMAIL: &str = "cy@example.com";

/// Seconds between a helper commit's author and committer time.
pub const COMMIT_LAG: i64 = 30;

// ---------------------------------------------------------------------------
// TestRepo
// ---------------------------------------------------------------------------

/// A git repository with a working tree in a temporary directory.
pub struct TestRepo {
    /// Held to keep the directory alive.
    _dir: TempDir,
    root: PathBuf,
    clock: Cell<i64>,
}

impl TestRepo {
    /// An empty repository on `main`.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path().to_path_buf();
        git_ok(&root, &["init", "-q", "-b", "main"]);
        git_ok(&root, &["config", "user.name", AUTHOR_NAME]);
        git_ok(&root, &["config", "user.email", AUTHOR_EMAIL]);
        git_ok(&root, &["config", "commit.gpgsign", "false"]);
        Self {
            _dir: dir,
            root,
            clock: Cell::new(EPOCH),
        }
    }

    /// A repository with one commit holding `files`.
    #[must_use]
    pub fn origin(files: &[(&str, &str)]) -> Self {
        let repo = Self::new();
        for (path, contents) in files {
            repo.write(path, contents);
        }
        repo.commit("initial");
        repo
    }

    /// An empty repository with each origin added and fetched as a remote.
    #[must_use]
    pub fn composite(remotes: &[(&str, &Self)]) -> Self {
        let repo = Self::new();
        for (name, origin) in remotes {
            repo.add_remote(name, origin);
        }
        repo
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open through the adapter, the way the binary does.
    #[must_use]
    pub fn open(&self) -> GixRepo {
        GixRepo::open(&self.root).expect("failed to open repo")
    }

    // -----------------------------------------------------------------------
    // Working tree
    // -----------------------------------------------------------------------

    /// Write `contents` to `path`, creating parent directories.
    pub fn write(&self, path: &str, contents: &str) {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&full, contents).expect("failed to write file");
    }

    pub fn remove(&self, path: &str) {
        std::fs::remove_file(self.root.join(path)).expect("failed to remove file");
    }

    /// Remove an empty directory.
    pub fn remove_dir(&self, path: &str) {
        std::fs::remove_dir(self.root.join(path)).expect("failed to remove dir");
    }

    /// Create a symlink at `path` pointing to `target`.
    #[cfg(unix)]
    pub fn symlink(&self, path: &str, target: &str) {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::os::unix::fs::symlink(target, full).expect("failed to create symlink");
    }

    /// Set or clear the executable bits of `path`.
    #[cfg(unix)]
    pub fn set_executable(&self, path: &str, executable: bool) {
        use std::os::unix::fs::PermissionsExt;
        let mode = if executable { 0o755 } else { 0o644 };
        std::fs::set_permissions(self.root.join(path), std::fs::Permissions::from_mode(mode))
            .expect("failed to set permissions");
    }

    /// Stage everything and commit with the helper identities. Returns the
    /// new commit id.
    pub fn commit(&self, message: &str) -> String {
        self.commit_as(message, AUTHOR_NAME, AUTHOR_EMAIL)
    }

    /// Like [`Self::commit`] with a different author.
    pub fn commit_as(&self, message: &str, name: &str, email: &str) -> String {
        let t = self.clock.get() + 60;
        self.clock.set(t);

        git_ok(&self.root, &["add", "-A"]);
        let author_date = format!("@{t} +0000");
        let committer_date = format!("@{} +0000", t + COMMIT_LAG);
        let out = Command::new("git")
            .args(["commit", "-q", "--allow-empty", "-m", message])
            .current_dir(&self.root)
            .env("GIT_AUTHOR_NAME", name)
            .env("GIT_AUTHOR_EMAIL", email)
            .env("GIT_AUTHOR_DATE", &author_date)
            .env("GIT_COMMITTER_NAME", COMMITTER_NAME)
            .env("GIT_COMMITTER_EMAIL", COMMITTER_EMAIL)
            .env("GIT_COMMITTER_DATE", &committer_date)
            .output()
            .expect("failed to run git commit");
        assert!(
            out.status.success(),
            "git commit failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        self.rev("HEAD")
    }

    /// Stage everything and write a commit object by hand, with raw author
    /// bytes and an `encoding` header, then move `HEAD` to it. Returns the
    /// new commit id.
    pub fn commit_encoded(&self, author: &[u8], encoding: &str, message: &[u8]) -> String {
        let t = self.clock.get() + 60;
        self.clock.set(t);

        git_ok(&self.root, &["add", "-A"]);
        let tree = self.git(&["write-tree"]).trim().to_owned();
        let parent = self.rev("HEAD");
        let mut raw = format!("tree {tree}\nparent {parent}\nauthor ").into_bytes();
        raw.extend_from_slice(author);
        raw.extend_from_slice(
            format!(
                " <{AUTHOR_EMAIL}> {t} +0000\ncommitter {COMMITTER_NAME} <{COMMITTER_EMAIL}> {} +0000\nencoding {encoding}\n\n",
                t + COMMIT_LAG
            )
            .as_bytes(),
        );
        raw.extend_from_slice(message);

        let mut child = Command::new("git")
            .args(["hash-object", "-t", "commit", "-w", "--stdin"])
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("failed to run git hash-object");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(&raw)
            .expect("failed to write commit object");
        let out = child.wait_with_output().expect("git hash-object failed");
        assert!(out.status.success(), "git hash-object failed");
        let id = String::from_utf8_lossy(&out.stdout).trim().to_owned();
        self.git(&["update-ref", "HEAD", &id]);
        id
    }

    // -----------------------------------------------------------------------
    // Git queries
    // -----------------------------------------------------------------------

    pub fn git(&self, args: &[&str]) -> String {
        git_ok(&self.root, args)
    }

    pub fn rev(&self, spec: &str) -> String {
        self.git(&["rev-parse", spec]).trim().to_owned()
    }

    pub fn add_remote(&self, name: &str, origin: &Self) {
        let url = origin.root.to_str().expect("temp path is not UTF-8");
        self.git(&["remote", "add", name, url]);
        self.git(&["fetch", "-q", name]);
    }

    /// Contents of `path` at `rev`.
    pub fn show(&self, rev: &str, path: &str) -> String {
        self.git(&["show", &format!("{rev}:{path}")])
    }

    /// Whether `path` exists at `rev`.
    pub fn exists_at(&self, rev: &str, path: &str) -> bool {
        git_raw(&self.root, &["cat-file", "-e", &format!("{rev}:{path}")])
            .status
            .success()
    }

    /// Recursive file list of `rev`, sorted.
    pub fn files_at(&self, rev: &str) -> Vec<String> {
        self.git(&["ls-tree", "-r", "--name-only", rev])
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Tree id of `rev`, or of `rev:path` when `path` is non-empty.
    pub fn tree_of(&self, rev: &str, path: &str) -> String {
        if path.is_empty() {
            self.rev(&format!("{rev}^{{tree}}"))
        } else {
            self.rev(&format!("{rev}:{path}"))
        }
    }

    /// The raw commit object at `rev`.
    pub fn cat_commit(&self, rev: &str) -> Vec<u8> {
        let out = git_raw(&self.root, &["cat-file", "commit", rev]);
        assert!(out.status.success(), "git cat-file commit {rev} failed");
        out.stdout
    }

    /// Commit ids on `rev`, newest first.
    pub fn log(&self, rev: &str) -> Vec<String> {
        self.git(&["rev-list", rev])
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// `git log -1 --format=<format> <rev>`, trimmed.
    pub fn format(&self, rev: &str, format: &str) -> String {
        self.git(&["log", "-1", &format!("--format={format}"), rev])
            .trim()
            .to_owned()
    }

    /// Parent ids of `rev`, in recorded order.
    pub fn parents(&self, rev: &str) -> Vec<String> {
        self.format(rev, "%P")
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }

    pub fn branch_exists(&self, branch: &str) -> bool {
        git_raw(
            &self.root,
            &["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")],
        )
        .status
        .success()
    }

    // -----------------------------------------------------------------------
    // git-stitch CLI
    // -----------------------------------------------------------------------

    /// Run the `git-stitch` binary in this repository.
    pub fn stitch_raw(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_git-stitch"))
            .args(args)
            .current_dir(&self.root)
            .env_remove("GIT_STITCH_LOG")
            .env_remove("GIT_STITCH_LOG_FORMAT")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute git-stitch")
    }

    /// Run `git-stitch` and assert it succeeds. Returns stdout.
    pub fn stitch_ok(&self, args: &[&str]) -> String {
        let out = self.stitch_raw(args);
        let stdout = String::from_utf8_lossy(&out.stdout);
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(
            out.status.success(),
            "git-stitch {} failed:\nstdout: {stdout}\nstderr: {stderr}",
            args.join(" "),
        );
        stdout.to_string()
    }

    /// Run `git-stitch` and assert it fails. Returns stderr.
    pub fn stitch_fails(&self, args: &[&str]) -> String {
        let out = self.stitch_raw(args);
        assert!(
            !out.status.success(),
            "Expected git-stitch {} to fail, but it succeeded.\nstdout: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stdout),
        );
        String::from_utf8_lossy(&out.stderr).to_string()
    }

    /// `git-stitch init <remotes>` without fetching, then check out the
    /// composite commit on a `mono` branch. Returns the commit id.
    pub fn init_and_checkout(&self, remotes: &[&str]) -> String {
        let mut args = vec!["init", "--no-fetch"];
        args.extend_from_slice(remotes);
        let out = self.stitch_ok(&args);
        let hash = stitched_hash(&out);
        self.git(&["checkout", "-q", "-b", "mono", &hash]);
        hash
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// The commit id from the first line of `stitch`/`init` text output.
pub fn stitched_hash(stdout: &str) -> String {
    stdout
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().last())
        .unwrap_or_else(|| panic!("no hash in output: {stdout}"))
        .to_owned()
}

/// The alpha/beta fixture: two single-commit origins and a composite repo
/// checked out on `mono` at their first composite commit.
pub struct AlphaBeta {
    pub alpha: TestRepo,
    pub beta: TestRepo,
    pub mono: TestRepo,
    /// The composite commit.
    pub base: String,
}

impl AlphaBeta {
    #[must_use]
    pub fn new() -> Self {
        let alpha = TestRepo::origin(&[("a.txt", "1\n")]);
        let beta = TestRepo::origin(&[("b.txt", "2\n")]);
        let mono = TestRepo::composite(&[("alpha", &alpha), ("beta", &beta)]);
        let base = mono.init_and_checkout(&["alpha", "beta"]);
        Self {
            alpha,
            beta,
            mono,
            base,
        }
    }
}

impl Default for AlphaBeta {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Free-standing git helpers
// ---------------------------------------------------------------------------

/// Run a git command in `dir` and return stdout.
///
/// # Panics
/// Panics if the command fails.
pub fn git_ok(dir: &Path, args: &[&str]) -> String {
    let output = git_raw(dir, args);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "git {} failed in {}:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
        dir.display()
    );
    stdout.to_string()
}

/// Run a git command, returning the `Output` without asserting success.
pub fn git_raw(dir: &Path, args: &[&str]) -> Output {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {}: {e}", args.join(" ")))
}
