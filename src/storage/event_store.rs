//! Append-only click log
//!
//! `EventStore` is the only component that writes the log file. Each append is
//! one `write_all` of one complete record on an append-mode handle, serialized
//! by an in-process mutex. Readers open their own handle per replay and never
//! look past the last complete line that existed when they opened the file, so
//! an append racing a replay is either fully visible or not visible at all.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tracing::{debug, error, info, trace, warn};

use super::layout::{LogLayout, SchemaVersion};
use super::models::{ClickEvent, parse_timestamp, stored_date};
use crate::config::StoreConfig;
use crate::errors::{Result, SmartlinkerError};

/// 反向扫描提交长度时的块大小
const TAIL_CHUNK: usize = 4096;

pub struct EventStore {
    path: PathBuf,
    schema: SchemaVersion,
    sync_on_append: bool,
    /// 串行化本进程内的追加写
    write_lock: Mutex<()>,
    /// 文件头只写一次，读到后缓存
    layout: RwLock<Option<LogLayout>>,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>, schema: SchemaVersion) -> Self {
        Self {
            path: path.into(),
            schema,
            sync_on_append: false,
            write_lock: Mutex::new(()),
            layout: RwLock::new(None),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.path, config.schema).with_sync_on_append(config.sync_on_append)
    }

    /// 每次追加后 fsync
    pub fn with_sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// 确保日志文件存在且带有有效文件头
    ///
    /// 已存在的文件保持不变（仅读取其文件头）。新文件先写入同目录下的临时文件，
    /// 再通过硬链接原子发布，并发初始化的进程只会看到完整的文件头。
    pub fn initialize(&self) -> Result<LogLayout> {
        if !self.path.exists() {
            self.create_with_header()?;
        }

        let layout = read_layout(&self.path)?;
        *self.layout.write() = Some(layout.clone());
        info!(
            "Click log ready: {} (columns: {})",
            self.path.display(),
            layout.columns().join(",")
        );
        Ok(layout)
    }

    /// 当前日志的列布局（首次调用时从磁盘读取）
    pub fn layout(&self) -> Result<LogLayout> {
        if let Some(layout) = self.layout.read().as_ref() {
            return Ok(layout.clone());
        }

        let layout = read_layout(&self.path)?;
        *self.layout.write() = Some(layout.clone());
        Ok(layout)
    }

    /// 追加一条记录
    pub fn append(&self, event: &ClickEvent) -> Result<()> {
        if event.template_id.trim().is_empty() {
            return Err(SmartlinkerError::validation(
                "Refusing to append a click without template_id",
            ));
        }

        let layout = self.layout().map_err(|e| {
            SmartlinkerError::write_failure(format!(
                "Cannot determine click log layout: {}",
                e.message()
            ))
        })?;

        if event.account_id.is_some() && !layout.has_account() {
            warn!(
                "Click log {} has no account_id column, dropping account for template {}",
                self.path.display(),
                event.template_id
            );
        }

        let fields = layout.encode(event);
        let record = encode_record(fields.iter().map(|f| f.as_bytes()))
            .map_err(|e| SmartlinkerError::write_failure(e.message()))?;

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                error!("Failed to open click log {}: {}", self.path.display(), e);
                SmartlinkerError::write_failure(format!(
                    "Failed to open click log {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        file.write_all(&record).map_err(|e| {
            error!("Failed to append to click log {}: {}", self.path.display(), e);
            SmartlinkerError::write_failure(format!("Failed to append click: {}", e))
        })?;

        if self.sync_on_append {
            file.sync_data().map_err(|e| {
                SmartlinkerError::write_failure(format!("Failed to sync click log: {}", e))
            })?;
        }

        trace!("Appended click for template {}", event.template_id);
        Ok(())
    }

    /// 从头顺序读取所有记录
    ///
    /// 每次调用都重新打开文件。格式错误的记录会被跳过并计数，
    /// 文件无法打开或文件头无效时返回 ReadFailure；扫描途中的 I/O 错误
    /// 通过 `EventReplay::finish` 报告。
    pub fn replay(&self) -> Result<EventReplay> {
        let mut file = File::open(&self.path).map_err(|e| {
            SmartlinkerError::read_failure(format!(
                "Failed to open click log {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let committed = committed_len(&mut file).map_err(|e| {
            SmartlinkerError::read_failure(format!(
                "Failed to inspect click log {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(
            "Replaying click log {} ({} committed bytes)",
            self.path.display(),
            committed
        );
        EventReplay::from_reader(file.take(committed))
    }

    fn create_with_header(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                SmartlinkerError::write_failure(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let layout = LogLayout::for_schema(self.schema);
        let header = encode_record(layout.columns().iter().map(|c| c.as_bytes()))?;

        let tmp = temp_sibling(&self.path);
        let staged = fs::write(&tmp, &header).and_then(|_| fs::hard_link(&tmp, &self.path));
        let _ = fs::remove_file(&tmp);

        match staged {
            Ok(()) => {
                info!(
                    "Created click log {} with schema {}",
                    self.path.display(),
                    self.schema
                );
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(
                    "Click log {} was created concurrently, keeping it",
                    self.path.display()
                );
                Ok(())
            }
            Err(e) => {
                // 部分文件系统不支持硬链接
                debug!("Hard link publish failed ({}), falling back to create_new", e);
                create_new_with(&self.path, &header)
            }
        }
    }
}

fn create_new_with(path: &Path, contents: &[u8]) -> Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => file.write_all(contents).map_err(|e| {
            SmartlinkerError::write_failure(format!(
                "Failed to write click log header {}: {}",
                path.display(),
                e
            ))
        }),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(SmartlinkerError::write_failure(format!(
            "Failed to create click log {}: {}",
            path.display(),
            e
        ))),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("click_log.csv");
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
}

fn read_layout(path: &Path) -> Result<LogLayout> {
    let file = File::open(path).map_err(|e| {
        SmartlinkerError::read_failure(format!(
            "Failed to open click log {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let header = reader.headers().map_err(|e| {
        SmartlinkerError::read_failure(format!("Failed to read click log header: {}", e))
    })?;
    LogLayout::from_header(header.iter())
}

/// 将一行字段编码为以 `\n` 结尾的完整 CSV 记录
fn encode_record<I, T>(fields: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::with_capacity(128));
    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| SmartlinkerError::serialization(format!("Failed to encode record: {}", e)))
}

/// 文件中最后一个换行符之后的字节属于尚未写完（或被截断）的记录
fn committed_len(file: &mut File) -> io::Result<u64> {
    let len = file.metadata()?.len();
    let mut buf = [0u8; TAIL_CHUNK];
    let mut end = len;

    let committed = loop {
        if end == 0 {
            break 0;
        }
        let start = end.saturating_sub(TAIL_CHUNK as u64);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            break start + pos as u64 + 1;
        }
        end = start;
    };

    file.seek(SeekFrom::Start(0))?;
    Ok(committed)
}

/// 磁盘上的一行（按列名解码）
#[derive(Debug, Deserialize)]
struct ClickRow {
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    template_id: String,
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
}

impl ClickRow {
    fn into_event(self) -> std::result::Result<ClickEvent, String> {
        if self.template_id.trim().is_empty() {
            return Err("empty template_id".to_string());
        }
        let timestamp = parse_timestamp(&self.timestamp)
            .ok_or_else(|| format!("invalid timestamp '{}'", self.timestamp))?;

        let date = stored_date(&self.timestamp).unwrap_or_else(|| timestamp.date_naive());

        Ok(ClickEvent {
            timestamp,
            date,
            template_id: self.template_id,
            account_id: self.account_id.filter(|a| !a.is_empty()),
            source_address: self.ip_address.filter(|a| !a.is_empty()),
        })
    }
}

/// 一次回放：按追加顺序惰性产出点击事件
///
/// 每条记录恰好占一个物理行，逐行独立解码：一行损坏（例如未闭合的引号）
/// 只会让这一行被跳过，不会吞掉后面的记录。
pub struct EventReplay {
    lines: Box<dyn BufRead + Send>,
    header: StringRecord,
    layout: LogLayout,
    buf: Vec<u8>,
    line_no: u64,
    skipped: usize,
    error: Option<SmartlinkerError>,
    finished: bool,
}

impl EventReplay {
    /// 读取文件头并准备逐行回放
    pub(crate) fn from_reader<R: Read + Send + 'static>(reader: R) -> Result<Self> {
        let mut lines = BufReader::new(reader);
        let mut buf = Vec::new();
        lines.read_until(b'\n', &mut buf).map_err(|e| {
            SmartlinkerError::read_failure(format!("Failed to read click log header: {}", e))
        })?;

        let header = decode_line(trim_line(&buf))
            .ok_or_else(|| SmartlinkerError::read_failure("Click log header is empty or unreadable"))?;
        let layout = LogLayout::from_header(header.iter())?;

        Ok(Self {
            lines: Box::new(lines),
            header,
            layout,
            buf,
            line_no: 1,
            skipped: 0,
            error: None,
            finished: false,
        })
    }

    /// 到目前为止跳过的格式错误记录数
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// 本次回放读到的文件头布局
    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    /// 回放结束后调用：扫描被 I/O 错误中断时返回 ReadFailure，
    /// 否则返回跳过的记录数
    pub fn finish(&self) -> Result<usize> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.skipped),
        }
    }

    fn decode_record(&self, line: &[u8]) -> std::result::Result<ClickEvent, String> {
        let record = decode_line(line).ok_or_else(|| "unreadable record".to_string())?;
        if record.len() != self.header.len() {
            return Err(format!(
                "expected {} fields, found {}",
                self.header.len(),
                record.len()
            ));
        }

        let row: ClickRow = record
            .deserialize(Some(&self.header))
            .map_err(|e| e.to_string())?;
        row.into_event()
    }
}

impl Iterator for EventReplay {
    type Item = ClickEvent;

    fn next(&mut self) -> Option<ClickEvent> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            match self.lines.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    if self.skipped > 0 {
                        warn!("Click log replay skipped {} malformed records", self.skipped);
                    }
                    return None;
                }
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    error!("Click log replay aborted by I/O error: {}", e);
                    self.error = Some(SmartlinkerError::read_failure(format!(
                        "Click log replay interrupted after line {}: {}",
                        self.line_no, e
                    )));
                    self.finished = true;
                    return None;
                }
            }

            let line = trim_line(&self.buf);
            if line.is_empty() {
                continue;
            }

            match self.decode_record(line) {
                Ok(event) => {
                    trace!("Decoded click at line {}", self.line_no);
                    return Some(event);
                }
                Err(reason) => {
                    self.skipped += 1;
                    warn!(
                        "Skipping malformed click record at line {}: {}",
                        self.line_no, reason
                    );
                }
            }
        }
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// 把一行解码为一条 CSV 记录；行内出现第二条记录（如裸 `\r`）视为无法解码
fn decode_line(line: &[u8]) -> Option<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line);

    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => {}
        _ => return None,
    }
    let mut extra = StringRecord::new();
    match reader.read_record(&mut extra) {
        Ok(false) => Some(record),
        _ => None,
    }
}
