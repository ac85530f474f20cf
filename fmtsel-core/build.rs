//! Stamps two `env!`-visible build-time constants consumed by
//! `engine_version()`: the short git commit hash and the build date.

fn main() -> std::io::Result<()> {
    println!("cargo:rustc-env=GIT_HASH={}", short_commit_hash()?);
    println!(
        "cargo:rustc-env=BUILD_DATE={}",
        chrono::Utc::now().format("%F")
    );
    Ok(())
}

/// Empty string when `git` isn't on `PATH` or this isn't a git checkout
/// (e.g. a source tarball build); `engine_version` treats that as "no hash".
fn short_commit_hash() -> std::io::Result<String> {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
        }
        Ok(_) => Ok(String::new()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}
