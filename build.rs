use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=GIT_VERSION");

    println!("cargo:rustc-env=GIT_VERSION={}", resolve_version());
}

/// CI images pass `GIT_VERSION` explicitly; local builds ask git.
fn resolve_version() -> String {
    match std::env::var("GIT_VERSION") {
        Ok(version) if !version.is_empty() && version != "dev" => version,
        _ => describe_head().unwrap_or_else(|| "dev".to_string()),
    }
}

fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}
