//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::{ConfigSpec, FieldMeta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // API 配置
    #[serde(default)]
    pub tumblr_auth: String,
    #[serde(default = "default_api_root")]
    pub api_root: String,

    // 网络配置
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default)]
    pub user_agent: String,

    // 下载配置
    #[serde(default = "default_download_workers")]
    pub download_workers: usize,
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,

    // 保存配置
    #[serde(default)]
    pub save_path: String,
    #[serde(default = "default_false")]
    pub allow_overwrite_files: bool,
    #[serde(default = "default_true")]
    pub folder_prefix_host: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tumblr_auth: String::new(),
            api_root: default_api_root(),
            request_timeout: default_request_timeout(),
            page_delay_ms: default_page_delay_ms(),
            user_agent: String::new(),
            download_workers: default_download_workers(),
            download_timeout: default_download_timeout(),
            save_path: String::new(),
            allow_overwrite_files: default_false(),
            folder_prefix_host: default_true(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 10] = [
            FieldMeta {
                name: "tumblr_auth",
                description: "tumblr API key（必填，也可通过环境变量 TUMBLR_AUTH 提供）",
            },
            FieldMeta {
                name: "api_root",
                description: "tumblr API 根地址",
            },
            FieldMeta {
                name: "request_timeout",
                description: "请求超时时间（秒）",
            },
            FieldMeta {
                name: "page_delay_ms",
                description: "每页请求之间的间隔, 单位ms",
            },
            FieldMeta {
                name: "user_agent",
                description: "请求使用的 User-Agent（留空使用内置值）",
            },
            FieldMeta {
                name: "download_workers",
                description: "媒体下载并发线程数",
            },
            FieldMeta {
                name: "download_timeout",
                description: "单个媒体下载超时时间（秒）",
            },
            FieldMeta {
                name: "save_path",
                description: "保存路径（留空为当前目录）",
            },
            FieldMeta {
                name: "allow_overwrite_files",
                description: "是否覆盖已存在的文件",
            },
            FieldMeta {
                name: "folder_prefix_host",
                description: "下载目录名是否带 tumblr_ 前缀",
            },
        ];
        &FIELDS
    }
}

impl Config {
    pub fn default_save_dir(&self) -> PathBuf {
        if self.save_path.trim().is_empty() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            PathBuf::from(&self.save_path)
        }
    }
}

/// Make a string usable as a single file or folder name on every platform.
pub fn safe_fs_name(name: &str, replacement: &str, max_len: usize) -> String {
    let rep = replacement.chars().next().unwrap_or('_');
    let mut cleaned: String = name
        .chars()
        .map(|ch| match ch {
            ':' | '"' | '<' | '>' | '/' | '\\' | '|' | '?' | '*' => rep,
            c if (c as u32) < 32 => rep,
            _ => ch,
        })
        .collect();

    while cleaned.ends_with(' ') || cleaned.ends_with('.') {
        cleaned.pop();
    }

    if cleaned.is_empty() {
        cleaned.push_str("unnamed");
    }

    const RESERVED: [&str; 22] = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let upper = cleaned.to_uppercase();
    if RESERVED.contains(&upper.as_str()) {
        cleaned = format!("_{}", cleaned);
    }

    if cleaned.len() > max_len {
        let mut end = max_len;
        while end > 0 && !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
        while cleaned.ends_with(' ') || cleaned.ends_with('.') {
            cleaned.pop();
        }
        if cleaned.is_empty() {
            cleaned.push_str("unnamed");
        }
    }

    cleaned
}

fn default_false() -> bool {
    false
}

fn default_true() -> bool {
    true
}

fn default_api_root() -> String {
    "http://api.tumblr.com/v2".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_download_workers() -> usize {
    4
}

fn default_download_timeout() -> u64 {
    30
}
