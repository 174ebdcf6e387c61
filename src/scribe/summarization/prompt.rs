//! System prompt loading.
//!
//! The prompt file is re-read before every summary so edits take effect
//! without a restart. A built-in prompt is used when the file is unreadable.

use std::path::PathBuf;

use tracing::{debug, warn};

/// Built-in system prompt for meeting minutes.
pub const DEFAULT_SYSTEM_PROMPT: &str = r"你是一个专业的会议记录助手。你的任务是根据群聊消息生成简洁、结构化的会议纪要。

请按照以下格式输出：

## 会议纪要

### 📋 关键讨论点
- 列出主要讨论的话题和观点

### ✅ 决定事项
- 列出达成的决定或共识

### 📌 待办事项
- 列出需要跟进的行动项（如果有明确的负责人，请标注）

### 👥 主要参与者
- 列出活跃的发言人

### 💡 其他要点
- 其他值得记录的信息

注意：
1. 保持简洁，突出重点
2. 使用中文
3. 如果某个部分没有内容，可以省略
4. 保持客观，不要添加个人观点";

/// Source of the system prompt.
#[derive(Clone, Debug)]
pub struct PromptSource {
    path: PathBuf,
}

impl PromptSource {
    /// Create a prompt source backed by a file.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the current system prompt.
    pub async fn load(&self) -> String {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if !raw.trim().is_empty() => {
                let prompt = raw.trim().to_string();
                debug!(path = %self.path.display(), chars = prompt.len(), "System prompt loaded");
                prompt
            }
            Ok(_) => {
                warn!(path = %self.path.display(), "System prompt file is empty, using built-in prompt");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
            Err(err) => {
                debug!(path = %self.path.display(), %err, "System prompt file unreadable, using built-in prompt");
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }
}
