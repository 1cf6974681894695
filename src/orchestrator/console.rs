//! 交互式控制台 - 编排层
//!
//! 逐行读取命令，驱动同一个 `AnalysisSession`：
//!
//! ```text
//! analyze "Los 1" unterlagen/spec.pdf unterlagen/terms.docx
//! prompt eigene_anweisung.md
//! consolidate
//! save out/report.md
//! ```

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};

use crate::models::read_documents;
use crate::orchestrator::session::AnalysisSession;
use crate::services::ReportWriter;

const HELP: &str = r#"可用命令:
  analyze <名称> <文件>...   分析一个批次（名称或路径含空格时用双引号）
  prompt <文件>              从文件读取分析指令（后续批次使用）
  prompt                     恢复默认指令
  history                    列出历史结果
  show <n>                   显示第 n 个结果
  consolidate                汇总全部历史结果
  reset                      清空历史结果
  save <路径>                写入报告
  help                       显示本帮助
  quit                       退出"#;

/// 控制台命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze { label: String, files: Vec<PathBuf> },
    Prompt { file: Option<PathBuf> },
    History,
    Show { index: usize },
    Consolidate,
    Reset,
    Save { path: PathBuf },
    Help,
    Quit,
    Empty,
}

/// 按空白切分，双引号内的内容作为一个参数
///
/// 引号不成对时直接报错，不做猜测。
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    if line.matches('"').count() % 2 != 0 {
        bail!("引号不成对: {}", line.trim());
    }

    let re = Regex::new(r#""([^"]*)"|(\S+)"#)?;
    Ok(re
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect())
}

/// 解析一行输入
pub fn parse_command(line: &str) -> Result<Command> {
    let tokens = tokenize(line)?;
    let Some((head, args)) = tokens.split_first() else {
        return Ok(Command::Empty);
    };

    let command = match (head.to_ascii_lowercase().as_str(), args) {
        ("analyze", [label, files @ ..]) if !files.is_empty() => Command::Analyze {
            label: label.clone(),
            files: files.iter().map(PathBuf::from).collect(),
        },
        ("analyze", _) => bail!("用法: analyze <名称> <文件>..."),
        ("prompt", []) => Command::Prompt { file: None },
        ("prompt", [file]) => Command::Prompt {
            file: Some(PathBuf::from(file)),
        },
        ("history", []) => Command::History,
        ("show", [n]) => {
            let index: usize = n
                .parse()
                .with_context(|| format!("无效的序号: {}", n))?;
            if index == 0 {
                bail!("序号从 1 开始");
            }
            Command::Show { index }
        }
        ("consolidate", []) => Command::Consolidate,
        ("reset", []) => Command::Reset,
        ("save", [path]) => Command::Save {
            path: PathBuf::from(path),
        },
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("exit", _) => Command::Quit,
        (other, _) => bail!("未知命令或参数数量不对: {} (输入 help 查看帮助)", other),
    };

    Ok(command)
}

/// 交互式控制台
pub struct Console {
    session: AnalysisSession,
    /// `prompt` 命令设置的指令，None 表示使用默认指令
    instruction: Option<String>,
}

impl Console {
    pub fn new(session: AnalysisSession) -> Self {
        Self {
            session,
            instruction: None,
        }
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// 从标准输入读取命令直到 quit 或输入结束
    pub async fn run(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_with(stdin).await
    }

    /// 从任意输入源读取命令
    pub async fn run_with<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<()> {
        let mut lines = reader.lines();
        let mut stdout = tokio::io::stdout();

        println!("{}", HELP);

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let command = match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(Command::Empty) => continue,
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            debug!("执行命令: {:?}", command);
            match self.execute(command).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    error!("❌ {:#}", e);
                    println!("错误: {:#}", e);
                }
            }
        }

        Ok(())
    }

    /// 执行单个命令，返回要显示的文本
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Analyze { label, files } => self.analyze(&label, &files).await,
            Command::Prompt { file } => self.set_prompt(file.as_deref()).await,
            Command::History => Ok(self.render_history()),
            Command::Show { index } => match index.checked_sub(1).and_then(|i| self.session.history().get(i)) {
                Some(result) => Ok(format!(
                    "### {}\nQuellen: {}\n\n{}",
                    result.batch_label,
                    result.sources.join(", "),
                    result.text
                )),
                None => bail!(
                    "没有第 {} 个结果 (当前共 {} 个)",
                    index,
                    self.session.history().len()
                ),
            },
            Command::Consolidate => Ok(self.session.consolidate().await?),
            Command::Reset => {
                self.session.reset();
                Ok("历史结果已清空".to_string())
            }
            Command::Save { path } => self.save(&path).await,
            Command::Help => Ok(HELP.to_string()),
            Command::Quit | Command::Empty => Ok(String::new()),
        }
    }

    async fn analyze(&mut self, label: &str, files: &[PathBuf]) -> Result<String> {
        let documents = read_documents(files).await;

        let outcome = self
            .session
            .analyze(Some(label), &documents, self.instruction.as_deref())
            .await?;

        let mut output = outcome.result.text.clone();
        for warning in &outcome.warnings {
            output.push_str(&format!("\n⚠️ {}", warning));
        }
        Ok(output)
    }

    async fn set_prompt(&mut self, file: Option<&Path>) -> Result<String> {
        match file {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("无法读取指令文件: {}", path.display()))?;
                if text.trim().is_empty() {
                    bail!("指令文件为空: {}", path.display());
                }
                self.instruction = Some(text);
                Ok(format!("已使用 {} 中的指令", path.display()))
            }
            None => {
                self.instruction = None;
                Ok("已恢复默认指令".to_string())
            }
        }
    }

    fn render_history(&self) -> String {
        let history = self.session.history();
        if history.is_empty() {
            return "历史结果为空".to_string();
        }

        history
            .iter()
            .enumerate()
            .map(|(i, result)| {
                format!(
                    "{}. {} [{}] ({})",
                    i + 1,
                    result.batch_label,
                    result.sources.join(", "),
                    result.produced_at.format("%H:%M:%S")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn save(&self, path: &Path) -> Result<String> {
        let summary = self.session.summary_for_report().await?;
        let writer = ReportWriter::with_path(path);
        writer.write(summary.as_deref(), self.session.history())?;
        Ok(format!("报告已保存至: {}", writer.path().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize(r#"analyze "Los 1 Stadtwerke" "mein ordner/spec.pdf" terms.docx"#).unwrap(),
            vec!["analyze", "Los 1 Stadtwerke", "mein ordner/spec.pdf", "terms.docx"]
        );
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unbalanced_quote_is_rejected() {
        let err = tokenize(r#"analyze "Los 1 spec.pdf"#).unwrap_err();
        assert!(err.to_string().contains("引号不成对"));
        assert!(parse_command(r#"analyze "Los 1 spec.pdf"#).is_err());
        assert!(parse_command(r#"save "out/report.md"#).is_err());
    }

    #[test]
    fn test_parse_analyze() {
        let command = parse_command(r#"analyze "Los 1" spec.pdf terms.docx"#).unwrap();
        assert_eq!(
            command,
            Command::Analyze {
                label: "Los 1".to_string(),
                files: vec![PathBuf::from("spec.pdf"), PathBuf::from("terms.docx")],
            }
        );

        assert!(parse_command("analyze Los1").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("").unwrap(), Command::Empty);
        assert_eq!(parse_command("HISTORY").unwrap(), Command::History);
        assert_eq!(parse_command("show 2").unwrap(), Command::Show { index: 2 });
        assert_eq!(parse_command("prompt").unwrap(), Command::Prompt { file: None });
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
        assert_eq!(
            parse_command("save out/report.md").unwrap(),
            Command::Save {
                path: PathBuf::from("out/report.md")
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("show zero").is_err());
        assert!(parse_command("show 0").is_err());
        assert!(parse_command("reset now").is_err());
        assert!(parse_command("upload spec.pdf").is_err());
    }
}
