use std::path::PathBuf;
use std::sync::OnceLock;

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// Clang executable forced through `CALLSITE_WRAPPER_CLANG`.
pub fn clang_override() -> Option<PathBuf> {
    static CLANG: OnceLock<Option<PathBuf>> = OnceLock::new();
    CLANG
        .get_or_init(|| {
            std::env::var_os("CALLSITE_WRAPPER_CLANG")
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .clone()
}

/// Report call sites skipped for unresolvable source ranges as warnings instead of only
/// logging them.
pub fn report_skipped() -> bool {
    static REPORT: OnceLock<bool> = OnceLock::new();
    *REPORT.get_or_init(|| bool_from_env("CALLSITE_WRAPPER_REPORT_SKIPPED"))
}
