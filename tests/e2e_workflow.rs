//! End-to-end workflow tests
//!
//! Builds a realistic generated iOS dependency layout (`.symlinks/plugins`
//! plus `Pods/Local Podspecs`) and runs the binary through the complete
//! locate -> patch -> re-run cycle.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Mirror of the tree `pod install` leaves behind for a Flutter app.
fn setup_app_tree() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let ios = dir.path().join("app/ios");

    let facebook_ios = ios.join(".symlinks/plugins/facebook_app_events/ios");
    fs::create_dir_all(&facebook_ios).unwrap();
    fs::write(
        facebook_ios.join("facebook_app_events.podspec"),
        r#"Pod::Spec.new do |s|
  s.name             = 'facebook_app_events'
  s.version          = '0.0.1'
  s.source_files     = 'Classes/**/*'
  s.dependency 'FBSDKCoreKit', '~> 12.2'
  s.dependency 'FBAudienceNetwork', '6.16'
end
"#,
    )
    .unwrap();

    let other_ios = ios.join(".symlinks/plugins/path_provider/ios");
    fs::create_dir_all(&other_ios).unwrap();
    fs::write(
        other_ios.join("path_provider.podspec"),
        "Pod::Spec.new do |s|\n  s.name = 'path_provider'\nend\n",
    )
    .unwrap();

    let root = ios.join(".symlinks/plugins");
    (dir, root)
}

fn run_patcher(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_full_cycle_patch_then_noop() {
    let (_dir, root) = setup_app_tree();
    let manifest = root.join("facebook_app_events/ios/facebook_app_events.podspec");

    // First run rewrites the pin.
    let first = run_patcher(&["--root", root.to_str().unwrap()]);
    assert!(first.status.success());
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.contains("manifest name pattern"));
    assert!(stdout.contains("Patched at least one podspec"));

    let contents = fs::read_to_string(&manifest).unwrap();
    assert!(contents.contains("s.dependency 'FBAudienceNetwork', '6.17.0'"));
    assert!(!contents.contains("'6.16'"));
    // Unrelated pins survive untouched.
    assert!(contents.contains("s.dependency 'FBSDKCoreKit', '~> 12.2'"));

    // Second run is a no-op with identical final content.
    let second = run_patcher(&["--root", root.to_str().unwrap()]);
    assert!(second.status.success());
    assert!(String::from_utf8_lossy(&second.stdout).contains("already has correct version"));
    assert_eq!(fs::read_to_string(&manifest).unwrap(), contents);

    // The sibling plugin was never a candidate.
    let sibling = fs::read_to_string(root.join("path_provider/ios/path_provider.podspec")).unwrap();
    assert!(sibling.contains("path_provider"));
}

#[test]
fn test_pessimistic_pin_rewritten_to_exact() {
    let (_dir, root) = setup_app_tree();
    let manifest = root.join("facebook_app_events/ios/facebook_app_events.podspec");
    fs::write(
        &manifest,
        "Pod::Spec.new do |s|\n  s.dependency 'FBAudienceNetwork', '~> 6.16'\nend\n",
    )
    .unwrap();

    let output = run_patcher(&["--root", root.to_str().unwrap()]);

    assert!(output.status.success());
    let contents = fs::read_to_string(&manifest).unwrap();
    assert!(contents.contains("s.dependency 'FBAudienceNetwork', '= 6.17.0'"));
    assert!(!contents.contains("~>"));
}

#[test]
fn test_local_specs_cache_is_last_resort() {
    let dir = TempDir::new().unwrap();
    let ios = dir.path().join("app/ios");

    // Plugins root exists but carries no podspec at all.
    let root = ios.join(".symlinks/plugins");
    fs::create_dir_all(root.join("path_provider/macos")).unwrap();
    fs::write(root.join("path_provider/macos/README.md"), "docs").unwrap();

    // The serialized spec lives in the generated local-specs cache.
    let cache = ios.join("Pods/Local Podspecs");
    fs::create_dir_all(&cache).unwrap();
    fs::write(
        cache.join("facebook_app_events.podspec.json"),
        r#"{"name": "facebook_app_events", "dependencies": {"FBAudienceNetwork": ["6.16"]}}"#,
    )
    .unwrap();

    let output = run_patcher(&["--root", root.to_str().unwrap()]);

    // The cache file is found (so the run completes), but none of the literal
    // pairs match JSON syntax; that downgrade is a warning, not a failure.
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("local specs cache"));
    assert!(stdout.contains("Found 1 candidate manifest(s)"));
    assert!(stdout.contains("Warning: no podspecs were patched"));
}
