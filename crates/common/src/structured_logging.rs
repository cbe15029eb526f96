use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{Level, Event, Subscriber};
use tracing::field::{Field, Visit};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    Layer, EnvFilter, Registry,
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use chrono::Utc;

/// Структурированная запись лога в JSON формате
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredLogEntry {
    /// Временная метка в ISO 8601 формате
    pub timestamp: String,
    /// Уровень логирования
    pub level: String,
    /// Целевой модуль/компонент
    pub target: String,
    /// Основное сообщение
    pub message: String,
    /// Ключ зависимости, к которой относится событие (поле `key`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Дополнительные поля
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
    /// Контекст выполнения
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ExecutionContext>,
}

/// Контекст выполнения для отслеживания
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Версия приложения
    pub app_version: String,
    /// ID процесса
    pub pid: u32,
    /// ID потока
    pub thread_id: String,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            pid: std::process::id(),
            thread_id: format!("{:?}", std::thread::current().id()),
        }
    }
}

/// Форматтер для JSON логов: одна строка `StructuredLogEntry` на событие.
///
/// По умолчанию пишет в stdout, writer заменяется через `with_writer`.
pub struct JsonFormatter<W = fn() -> io::Stdout> {
    include_context: bool,
    make_writer: W,
}

impl JsonFormatter {
    pub fn new(include_context: bool) -> Self {
        Self {
            include_context,
            make_writer: io::stdout,
        }
    }
}

impl<W> JsonFormatter<W> {
    pub fn with_writer<W2>(self, make_writer: W2) -> JsonFormatter<W2>
    where
        W2: for<'a> MakeWriter<'a> + 'static,
    {
        JsonFormatter {
            include_context: self.include_context,
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for JsonFormatter<W>
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let entry = self.build_entry(event);

        if let Ok(json) = serde_json::to_string(&entry) {
            let _ = writeln!(self.make_writer.make_writer(), "{}", json);
        }
    }
}

impl<W> JsonFormatter<W> {
    fn build_entry(&self, event: &Event<'_>) -> StructuredLogEntry {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let level = match *event.metadata().level() {
            Level::ERROR => "ERROR",
            Level::WARN => "WARN",
            Level::INFO => "INFO",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
        };

        let key = visitor
            .fields
            .remove("key")
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()));

        StructuredLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            level: level.to_string(),
            target: event.metadata().target().to_string(),
            message: visitor.message.unwrap_or_default(),
            key,
            fields: visitor.fields,
            context: self.include_context.then(ExecutionContext::default),
        }
    }
}

/// Визитор для извлечения полей из события
#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: HashMap<String, Value>,
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(
                field.name().to_string(),
                Value::String(format!("{:?}", value)),
            );
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(
                field.name().to_string(),
                Value::String(value.to_string()),
            );
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::Bool(value));
    }
}

/// Конфигурация для structured logging
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Минимальный уровень логирования
    pub level: Level,
    /// Вывод в JSON формате
    pub json_output: bool,
    /// Включить цветной вывод (только для non-JSON)
    pub color_output: bool,
    /// Включить контекст выполнения (только для JSON)
    pub include_context: bool,
    /// Включить номера строк
    pub include_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_output: false,
            color_output: true,
            include_context: true,
            include_line_numbers: cfg!(debug_assertions),
        }
    }
}

impl LoggingConfig {
    /// Production: JSON в stdout
    pub fn production() -> Self {
        Self {
            json_output: true,
            color_output: false,
            include_line_numbers: false,
            ..Self::default()
        }
    }
}

/// Инициализировать structured logging. `RUST_LOG` имеет приоритет над `config.level`.
pub fn init_structured_logging(config: LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    if config.json_output {
        // JSON формат для production
        let json_layer = JsonFormatter::new(config.include_context);

        let subscriber = Registry::default()
            .with(env_filter)
            .with(json_layer);

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        // Человекочитаемый формат для разработки
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(config.include_line_numbers)
            .with_ansi(config.color_output);

        let subscriber = Registry::default()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

/// Логирование для тестов: вывод через test writer, повторный вызов безопасен
pub fn init_test_logging() {
    let _ = fmt::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Буфер, в который `JsonFormatter` пишет строки вместо stdout
#[derive(Clone, Default)]
struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.lock() {
            Ok(mut bytes) => bytes.extend_from_slice(buf),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(buf),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CaptureBuffer {
    fn entries(&self) -> Vec<StructuredLogEntry> {
        let bytes = match self.0.lock() {
            Ok(bytes) => bytes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

/// Выполнить `f`, собирая события текущего потока как `StructuredLogEntry`.
///
/// Subscriber ставится только на время вызова (`with_default`), глобальный
/// не трогается. Пишутся все уровни, включая TRACE.
pub fn capture_structured_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<StructuredLogEntry>) {
    let buffer = CaptureBuffer::default();
    let layer = JsonFormatter::new(false).with_writer({
        let buffer = buffer.clone();
        move || buffer.clone()
    });

    let result = tracing::subscriber::with_default(Registry::default().with(layer), f);
    (result, buffer.entries())
}
