pub mod destination;
pub mod html;
pub mod ip;

pub use destination::validate_destination;
pub use html::escape_html;
pub use ip::client_address;

/// 标识符中不允许出现控制字符（换行会破坏一行一条记录的日志格式）
pub fn has_control_chars(value: &str) -> bool {
    value.chars().any(char::is_control)
}
