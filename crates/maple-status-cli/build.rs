use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=MAPLE_STATUS_BUILD_REV");

    // Release tarballs and container builds have no .git; let them pass the revision in.
    let revision = std::env::var("MAPLE_STATUS_BUILD_REV").ok().or_else(|| {
        Command::new("git")
            .args(["describe", "--always", "--dirty", "--abbrev=8"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| String::from_utf8(o.stdout).ok())
    });

    println!(
        "cargo:rustc-env=GIT_HASH={}",
        revision.map(|s| s.trim().to_string()).unwrap_or_default()
    );
    println!("cargo:rerun-if-changed=../../.git/HEAD");
}
