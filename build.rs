fn main() {
    // Stamp the binary with its build time for the startup log line.
    let timestamp = chrono::Utc::now().to_rfc3339();
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", timestamp);
}
