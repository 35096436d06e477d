pub(super) fn default_name() -> String {
    "Herald".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.herald".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_db_path() -> String {
    "~/.herald/data/herald.db".to_string()
}
pub(super) fn default_max_connections() -> u32 {
    4
}
pub(super) fn default_api_host() -> String {
    "127.0.0.1".to_string()
}
pub(super) fn default_api_port() -> u16 {
    3000
}
pub(super) fn default_webhook_timeout() -> u64 {
    30
}
pub(super) fn default_true() -> bool {
    true
}
pub(super) fn default_poll_interval() -> u64 {
    60
}
pub(super) fn default_max_attempts() -> u32 {
    5
}
