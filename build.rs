use std::process::Command;

fn main() {
    let git_sha = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let build_time =
        std::env::var("CHEFAGENT_BUILD_TIME_UTC").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rerun-if-env-changed=CHEFAGENT_BUILD_TIME_UTC");
    println!("cargo:rustc-env=CHEFAGENT_GIT_SHA={git_sha}");
    println!("cargo:rustc-env=CHEFAGENT_TARGET={target}");
    println!("cargo:rustc-env=CHEFAGENT_BUILD_TIME_UTC={build_time}");
}
