use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Create a bare repository seeded with two pushed commits on `main`.
///
/// The seed commits go through a scratch clone that is discarded; the
/// returned TempDir is the bare repository, usable as `origin` for any
/// number of working copies from [`clone_remote`].
pub(crate) fn create_bare_remote() -> TempDir {
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "--bare", "--initial-branch=main", "."]);

    let seed = TempDir::new().unwrap();
    git(seed.path(), &["init", "--initial-branch=main", "."]);
    configure_identity(seed.path());
    let url = remote.path().to_string_lossy().to_string();
    git(seed.path(), &["remote", "add", "origin", &url]);

    std::fs::write(seed.path().join("README.md"), "# Test Repository\n").unwrap();
    git(seed.path(), &["add", "README.md"]);
    git(seed.path(), &["commit", "-m", "Initial commit"]);

    // A second commit so shallow fetches have history to cut.
    std::fs::write(seed.path().join("NOTES.md"), "notes\n").unwrap();
    git(seed.path(), &["add", "NOTES.md"]);
    git(seed.path(), &["commit", "-m", "Add notes"]);

    git(seed.path(), &["push", "origin", "main"]);

    remote
}

/// Clone the bare remote into a fresh working copy with identity set.
pub(crate) fn clone_remote(remote: &Path) -> TempDir {
    let clone_dir = TempDir::new().unwrap();
    let url = remote.to_string_lossy().to_string();
    git(clone_dir.path(), &["clone", &url, "."]);
    configure_identity(clone_dir.path());
    clone_dir
}

/// Initialize a standalone repository with one commit and no remote.
pub(crate) fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--initial-branch=main", "."]);
    configure_identity(dir.path());

    std::fs::write(dir.path().join("README.md"), "# Test\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-m", "Initial commit"]);

    dir
}

pub(crate) fn configure_identity(repo_dir: &Path) {
    git(repo_dir, &["config", "user.email", "test@example.com"]);
    git(repo_dir, &["config", "user.name", "Test User"]);
}

/// Run git in a fixture repo, returning trimmed stdout.
pub(crate) fn git_stdout(repo_dir: &Path, args: &[&str]) -> String {
    let output = run(repo_dir, args);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Run git in a fixture repo, panicking on failure.
pub(crate) fn git(repo_dir: &Path, args: &[&str]) {
    run(repo_dir, args);
}

fn run(repo_dir: &Path, args: &[&str]) -> std::process::Output {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }

    output
}
