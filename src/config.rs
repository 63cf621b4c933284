//! Application configuration module / 应用配置模块
//!
//! Loads configuration from a JSON file (default `config.json`).
//! Creates an example config file on first run / 首次运行时创建示例配置文件
//!
//! Loading order / 加载顺序:
//! 1. parse JSON
//! 2. expand `$VAR` / `${VAR}` inside strings / 展开环境变量引用
//! 3. apply `PAPERWEIGHT_<KEY>` overrides to scalar leaves / 环境变量覆盖
//! 4. check required sections and keys / 检查必填项
//! 5. deserialize and validate / 反序列化并校验

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default config file name / 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Prefix for environment overrides / 环境变量覆盖前缀
const ENV_PREFIX: &str = "PAPERWEIGHT_";

const REQUIRED_SECTIONS: [&str; 5] = ["arxiv", "processor", "analyzer", "notifier", "logging"];

const REQUIRED_PROCESSOR_KEYS: [&str; 9] = [
    "keywords",
    "exclusion_keywords",
    "important_words",
    "title_keyword_weight",
    "abstract_keyword_weight",
    "content_keyword_weight",
    "exclusion_keyword_penalty",
    "important_words_weight",
    "min_score",
];

const REQUIRED_EMAIL_KEYS: [&str; 5] = ["to", "from", "password", "smtp_server", "smtp_port"];

static ENV_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").expect("valid env regex")
});

static CATEGORY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+\.[A-Z]{2,}$").expect("valid category regex"));

/// Environment lookup, injectable for tests / 环境变量读取函数
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read from the process environment / 读取进程环境变量
pub fn system_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Application configuration / 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// arXiv retrieval / arXiv 抓取配置
    pub arxiv: ArxivConfig,
    /// Relevance scoring / 相关性评分配置
    pub processor: ScoringConfig,
    /// Summaries / 摘要配置
    pub analyzer: AnalyzerConfig,
    /// Digest delivery / 通知配置
    pub notifier: NotifierConfig,
    /// Logging / 日志配置
    pub logging: LoggingConfig,
}

/// arXiv configuration / arXiv 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Categories such as `cs.AI` / 分类列表
    pub categories: Vec<String>,
    /// Per-category cap, 0 means unlimited / 每个分类的最大数量，0 表示不限
    #[serde(default)]
    pub max_results: u32,
}

impl ArxivConfig {
    pub fn max_results(&self) -> Option<usize> {
        (self.max_results > 0).then_some(self.max_results as usize)
    }
}

/// Scoring parameters, immutable per run / 评分参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Positive-signal terms, substring match / 关键词（子串匹配）
    pub keywords: Vec<String>,
    /// Negative-signal terms, matched in content only / 排除词
    pub exclusion_keywords: Vec<String>,
    /// Bonus terms, exact token match in content / 重要词（整词匹配）
    pub important_words: Vec<String>,
    pub title_keyword_weight: f64,
    pub abstract_keyword_weight: f64,
    pub content_keyword_weight: f64,
    pub exclusion_keyword_penalty: f64,
    pub important_words_weight: f64,
    /// Inclusion threshold on the unrounded score / 最低分数阈值
    pub min_score: f64,
}

impl ScoringConfig {
    /// Validate once before any item is scored / 评分前校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, weight) in [
            ("title_keyword_weight", self.title_keyword_weight),
            ("abstract_keyword_weight", self.abstract_keyword_weight),
            ("content_keyword_weight", self.content_keyword_weight),
            ("exclusion_keyword_penalty", self.exclusion_keyword_penalty),
            ("important_words_weight", self.important_words_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(format!(
                    "'{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        if !self.min_score.is_finite() {
            return Err(ConfigError::invalid("'min_score' must be a finite number"));
        }

        for (name, list) in [
            ("keywords", &self.keywords),
            ("exclusion_keywords", &self.exclusion_keywords),
            ("important_words", &self.important_words),
        ] {
            if list.iter().any(|term| term.trim().is_empty()) {
                return Err(ConfigError::invalid(format!("'{}' contains an empty entry", name)));
            }
        }

        Ok(())
    }
}

/// How the digest text for each paper is produced / 摘要方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Use the paper's own abstract / 使用原始摘要
    Abstract,
    /// Ask an LLM for a summary / 调用大模型生成摘要
    Summary,
}

/// Supported LLM providers / 支持的大模型提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Openai,
    Gemini,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Openai => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }

    /// Environment variable holding the API key / API 密钥环境变量名
    pub fn api_key_env(&self) -> String {
        format!("{}_API_KEY", self.as_str().to_uppercase())
    }
}

/// Analyzer configuration / 分析器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub llm_provider: Option<LlmProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Notifier configuration / 通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub email: EmailConfig,
}

/// SMTP settings / 邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub to: String,
    pub from: String,
    pub password: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Digest ordering / 邮件中论文排序方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Keep ranker order / 按相关性
    #[default]
    Relevance,
    /// By lower-cased title / 按标题
    Alphabetical,
    /// Newest first / 按发布时间
    PublicationTime,
}

/// Logging configuration / 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Optional log file / 日志文件路径
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    #[serde(rename = "DEBUG")]
    Debug,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter` / 过滤器指令
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            arxiv: ArxivConfig {
                categories: vec!["cs.AI".to_string(), "cs.CL".to_string()],
                max_results: 50,
            },
            processor: ScoringConfig {
                keywords: vec!["large language model".to_string(), "reasoning".to_string()],
                exclusion_keywords: vec!["survey".to_string()],
                important_words: vec!["benchmark".to_string(), "transformer".to_string()],
                title_keyword_weight: 3.0,
                abstract_keyword_weight: 2.0,
                content_keyword_weight: 1.0,
                exclusion_keyword_penalty: 5.0,
                important_words_weight: 0.5,
                min_score: 10.0,
            },
            analyzer: AnalyzerConfig {
                analysis_type: AnalysisType::Abstract,
                llm_provider: None,
                api_key: None,
            },
            notifier: NotifierConfig {
                email: EmailConfig {
                    to: "you@example.com".to_string(),
                    from: "paperweight@example.com".to_string(),
                    password: "$PAPERWEIGHT_SMTP_PASSWORD".to_string(),
                    smtp_server: "smtp.example.com".to_string(),
                    smtp_port: 587,
                    sort_order: SortOrder::Relevance,
                },
            },
            logging: LoggingConfig {
                level: LogLevel::Info,
                file: Some("paperweight.log".to_string()),
            },
        }
    }
}

impl AppConfig {
    /// Validate cross-field constraints / 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arxiv.categories.is_empty() {
            return Err(ConfigError::invalid("'arxiv.categories' must not be empty"));
        }
        let invalid: Vec<&str> = self
            .arxiv
            .categories
            .iter()
            .filter(|c| !is_valid_arxiv_category(c))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(ConfigError::invalid(format!("Invalid arXiv category: {}", invalid.join(", "))));
        }

        self.processor.validate()?;

        if self.analyzer.analysis_type == AnalysisType::Summary && self.analyzer.llm_provider.is_none() {
            return Err(ConfigError::invalid("LLM provider not specified for summary analyzer type"));
        }

        Ok(())
    }
}

/// Catch obviously invalid categories such as `AI` or `cs.ai` / 粗略校验分类格式
pub fn is_valid_arxiv_category(category: &str) -> bool {
    CATEGORY.is_match(category)
}

/// Get the default config file path / 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_CONFIG_FILE)
}

/// Load configuration from file / 加载配置文件
///
/// When the file does not exist an example is written there and
/// `ConfigError::Invalid` asks the user to fill it in.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        save_config(path, &AppConfig::default())?;
        tracing::info!("Created example configuration at {:?}", path);
        return Err(ConfigError::invalid(format!(
            "no configuration found, an example was written to {}; edit it and run again",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let config = parse_config(&content, &system_env)?;
    tracing::info!("Loaded configuration from {:?}", path);
    Ok(config)
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse, resolve and validate a configuration document / 解析并校验配置
pub fn parse_config(content: &str, env: EnvLookup) -> Result<AppConfig, ConfigError> {
    let mut value: Value = serde_json::from_str(content)?;
    if value.is_null() {
        return Err(ConfigError::invalid("Empty configuration file"));
    }
    if !value.is_object() {
        return Err(ConfigError::invalid("Configuration must be a JSON object"));
    }

    expand_env_vars(&mut value, env);
    override_with_env(&mut value, env)?;
    check_required_keys(&value)?;

    let mut config: AppConfig = serde_json::from_value(value)?;
    resolve_api_key(&mut config.analyzer, env)?;
    config.validate()?;
    Ok(config)
}

/// Replace `$VAR` and `${VAR}` in every string; unknown names stay as-is / 展开环境变量
fn expand_env_vars(value: &mut Value, env: EnvLookup) {
    match value {
        Value::String(s) => {
            if s.contains('$') {
                let expanded = ENV_REF.replace_all(s, |caps: &regex::Captures| {
                    let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
                    env(name).unwrap_or_else(|| caps[0].to_string())
                });
                *s = expanded.into_owned();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| expand_env_vars(v, env)),
        Value::Object(map) => map.values_mut().for_each(|v| expand_env_vars(v, env)),
        _ => {}
    }
}

/// Apply `PAPERWEIGHT_<KEY>` overrides, coerced to the existing value's type / 环境变量覆盖
fn override_with_env(value: &mut Value, env: EnvLookup) -> Result<(), ConfigError> {
    let Value::Object(map) = value else {
        return Ok(());
    };

    for (key, current) in map.iter_mut() {
        if current.is_object() {
            override_with_env(current, env)?;
            continue;
        }

        let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
        let Some(raw) = env(&var) else {
            continue;
        };

        *current = match &*current {
            Value::Bool(_) => Value::Bool(matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")),
            Value::Number(_) => parse_number(raw.trim())
                .ok_or_else(|| ConfigError::invalid(format!("{} must be a number, got '{}'", var, raw)))?,
            Value::Array(_) => Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
            _ => Value::String(raw),
        };
        tracing::debug!("Config key '{}' overridden by {}", key, var);
    }

    Ok(())
}

/// Integer when the text is one, float otherwise / 整数优先，否则按浮点数解析
fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::from(i));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn check_required_keys(value: &Value) -> Result<(), ConfigError> {
    for section in REQUIRED_SECTIONS {
        if value.get(section).is_none() {
            return Err(ConfigError::MissingKey(section.to_string()));
        }
    }

    if value["arxiv"].get("categories").is_none() {
        return Err(ConfigError::MissingKey("arxiv.categories".to_string()));
    }

    for key in REQUIRED_PROCESSOR_KEYS {
        if value["processor"].get(key).is_none() {
            return Err(ConfigError::MissingKey(format!("processor.{}", key)));
        }
    }

    if value["analyzer"].get("type").is_none() {
        return Err(ConfigError::MissingKey("analyzer.type".to_string()));
    }

    let Some(email) = value["notifier"].get("email") else {
        return Err(ConfigError::MissingKey("notifier.email".to_string()));
    };
    for key in REQUIRED_EMAIL_KEYS {
        if email.get(key).is_none() {
            return Err(ConfigError::MissingKey(format!("notifier.email.{}", key)));
        }
    }

    if value["logging"].get("level").is_none() {
        return Err(ConfigError::MissingKey("logging.level".to_string()));
    }

    Ok(())
}

/// Summary mode needs an API key, from config or `<PROVIDER>_API_KEY` / 解析 API 密钥
fn resolve_api_key(analyzer: &mut AnalyzerConfig, env: EnvLookup) -> Result<(), ConfigError> {
    if analyzer.analysis_type != AnalysisType::Summary {
        return Ok(());
    }

    let provider = analyzer
        .llm_provider
        .ok_or_else(|| ConfigError::invalid("LLM provider not specified for summary analyzer type"))?;

    let from_config = analyzer.api_key.clone().filter(|k| !k.trim().is_empty());
    match from_config.or_else(|| env(&provider.api_key_env())) {
        Some(key) => {
            analyzer.api_key = Some(key);
            Ok(())
        }
        None => Err(ConfigError::invalid(format!("Missing API key for {}", provider.as_str()))),
    }
}
