//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SCHOLAR__*` 覆盖（双下划线表示嵌套，如 `SCHOLAR__LLM__PROVIDER=openai`）。
//! 所有键都有默认值，空环境即可启动（Ollama + llama3.1）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
}

/// [app] 段：HTTP 监听地址与单请求超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub bind_addr: String,
    /// 包裹整个 run() 的超时（秒），循环内部不做取消
    pub request_timeout_secs: u64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            request_timeout_secs: 600,
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：ollama / openai / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// openai 后端的 API key；未配置时由客户端读 OPENAI_API_KEY
    pub api_key: Option<String>,
    /// 单次补全超时（秒），由后端自己执行
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: crate::llm::OLLAMA_DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// 迭代预算耗尽后的处理方式
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopping {
    /// 再调一次模型，要求基于已有步骤直接给出 Final Answer
    #[default]
    Generate,
    /// 不再调用模型，直接返回固定的停止提示
    Force,
}

/// [agent] 段：ReAct 循环参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_iterations: usize,
    pub early_stopping: EarlyStopping,
    /// 单条 Observation 最大字符数，超出截断并标记 truncated
    pub max_observation_chars: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            early_stopping: EarlyStopping::Generate,
            max_observation_chars: 4000,
        }
    }
}

/// [tools] 段：超时、UA 与各工具端点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 单次工具调用总超时（秒）
    pub tool_timeout_secs: u64,
    /// 单个 HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub wikipedia: WikipediaSection,
    pub duckduckgo: DuckDuckGoSection,
    pub arxiv: ArxivSection,
    pub pubmed: PubMedSection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
            http_timeout_secs: 10,
            user_agent: "scholar/0.1 (research assistant)".to_string(),
            wikipedia: WikipediaSection::default(),
            duckduckgo: DuckDuckGoSection::default(),
            arxiv: ArxivSection::default(),
            pubmed: PubMedSection::default(),
        }
    }
}

/// [tools.wikipedia]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikipediaSection {
    pub base_url: String,
    pub summary_chars: usize,
}

impl Default for WikipediaSection {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".to_string(),
            summary_chars: 500,
        }
    }
}

/// [tools.duckduckgo]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuckDuckGoSection {
    pub base_url: String,
    pub max_results: usize,
    pub snippet_chars: usize,
}

impl Default for DuckDuckGoSection {
    fn default() -> Self {
        Self {
            base_url: "https://html.duckduckgo.com".to_string(),
            max_results: 3,
            snippet_chars: 200,
        }
    }
}

/// [tools.arxiv]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArxivSection {
    pub base_url: String,
    pub max_results: usize,
    pub summary_chars: usize,
}

impl Default for ArxivSection {
    fn default() -> Self {
        Self {
            base_url: "http://export.arxiv.org".to_string(),
            max_results: 3,
            summary_chars: 200,
        }
    }
}

/// [tools.pubmed]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PubMedSection {
    pub base_url: String,
    pub max_results: usize,
    pub abstract_chars: usize,
}

impl Default for PubMedSection {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov".to_string(),
            max_results: 3,
            abstract_chars: 200,
        }
    }
}

/// 从 config 目录加载配置，环境变量 SCHOLAR__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SCHOLAR__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SCHOLAR")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
