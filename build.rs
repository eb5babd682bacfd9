// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=QRCAM_VERSION");

    // Packagers can pin the version string; otherwise append the commit hash
    let version = std::env::var("QRCAM_VERSION").unwrap_or_else(|_| {
        let pkg_version = env!("CARGO_PKG_VERSION");
        match short_commit_hash() {
            Some(hash) => format!("{}-{}", pkg_version, hash),
            None => pkg_version.to_string(),
        }
    });

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn short_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty())
}
