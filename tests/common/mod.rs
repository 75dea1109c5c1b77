/// Harness-less tests honor libtest's `--ignored` / `--include-ignored` so a
/// plain `cargo test` skips the ones that need a display and a Vulkan driver.
pub fn ignored_requested() -> bool {
    std::env::args().any(|arg| arg == "--ignored" || arg == "--include-ignored")
}
