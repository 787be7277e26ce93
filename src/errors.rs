use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmartlinkerError {
    Validation(String),
    WriteFailure(String),
    ReadFailure(String),
    Config(String),
    Serialization(String),
    Server(String),
}

impl SmartlinkerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            SmartlinkerError::Validation(_) => "E001",
            SmartlinkerError::WriteFailure(_) => "E002",
            SmartlinkerError::ReadFailure(_) => "E003",
            SmartlinkerError::Config(_) => "E004",
            SmartlinkerError::Serialization(_) => "E005",
            SmartlinkerError::Server(_) => "E006",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            SmartlinkerError::Validation(_) => "Validation Error",
            SmartlinkerError::WriteFailure(_) => "Write Failure",
            SmartlinkerError::ReadFailure(_) => "Read Failure",
            SmartlinkerError::Config(_) => "Configuration Error",
            SmartlinkerError::Serialization(_) => "Serialization Error",
            SmartlinkerError::Server(_) => "Server Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            SmartlinkerError::Validation(msg)
            | SmartlinkerError::WriteFailure(msg)
            | SmartlinkerError::ReadFailure(msg)
            | SmartlinkerError::Config(msg)
            | SmartlinkerError::Serialization(msg)
            | SmartlinkerError::Server(msg) => msg,
        }
    }

    /// Caller supplied bad input; everything else is an environment problem.
    pub fn is_validation(&self) -> bool {
        matches!(self, SmartlinkerError::Validation(_))
    }

    /// 格式化为彩色输出（用于 Server 模式）
    #[cfg(feature = "server")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for SmartlinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for SmartlinkerError {}

// 便捷的构造函数
impl SmartlinkerError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        SmartlinkerError::Validation(msg.into())
    }

    pub fn write_failure<T: Into<String>>(msg: T) -> Self {
        SmartlinkerError::WriteFailure(msg.into())
    }

    pub fn read_failure<T: Into<String>>(msg: T) -> Self {
        SmartlinkerError::ReadFailure(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        SmartlinkerError::Config(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        SmartlinkerError::Serialization(msg.into())
    }

    pub fn server<T: Into<String>>(msg: T) -> Self {
        SmartlinkerError::Server(msg.into())
    }
}

impl From<csv::Error> for SmartlinkerError {
    fn from(err: csv::Error) -> Self {
        SmartlinkerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SmartlinkerError {
    fn from(err: serde_json::Error) -> Self {
        SmartlinkerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for SmartlinkerError {
    fn from(err: config::ConfigError) -> Self {
        SmartlinkerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SmartlinkerError>;
