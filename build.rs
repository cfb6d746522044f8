// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=FRAMEFLOW_VERSION");

    // Packagers may pin the version string explicitly
    let version = std::env::var("FRAMEFLOW_VERSION").unwrap_or_else(|_| {
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

    if !output.status.success() {
        return None;
    }

    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!hash.is_empty()).then_some(hash)
}
