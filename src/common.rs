pub(crate) mod concurrent;
pub(crate) mod error;

#[cfg(feature = "logging")]
pub(crate) fn log_prefix(store_name: Option<&str>) -> String {
    store_name
        .map(|name| format!("[{name}] "))
        .unwrap_or_default()
}
