//! Build script for detecting system dependencies and providing installation guidance.
//!
//! Video tracking links against OpenCV. The check only runs when the `aruco`
//! feature is enabled; recorded input needs no system libraries.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_ARUCO").is_some() {
        check_pkg_config();
        check_opencv();
    }

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

/// Version reported by pkg-config for the first package it knows
fn pkg_config_version(packages: &[&str]) -> Option<String> {
    packages.iter().find_map(|package| {
        let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    })
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    match pkg_config_version(&["opencv4", "opencv"]) {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. The 'aruco' feature needs OpenCV with objdetect.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }
}

fn check_pkg_config() {
    let found = Command::new("pkg-config")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success());

    if !found {
        println!("cargo:warning=pkg-config not found. This is required to find OpenCV.");
        println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
        println!("cargo:warning=On macOS: brew install pkg-config");
    }
}
