//! Prompt optimization through an external rewriter.
//!
//! The vault never depends on an optimizer being available. A failed call
//! leaves the stored prompt exactly as it was.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::entity::Prompt;
use crate::error::{Result, VaultError};
use crate::vault::{PromptUpdate, Vault};

/// Rewrites prompt text, e.g. by asking an LLM
pub trait PromptOptimizer {
    fn optimize(&self, content: &str) -> Result<String>;
}

/// Instruction text sent to the rewriter along with the prompt
pub fn build_optimization_request(content: &str) -> String {
    format!(
        "You are an expert Prompt Engineer.\n\
         Please rewrite and optimize the following prompt to be more effective, clear, and structured for LLMs.\n\
         Retain the original intent but improve clarity, context, and robustness.\n\
         Keep every {{{{variable}}}} placeholder exactly as written.\n\
         Do not add markdown backticks around the output, just return the raw improved text.\n\
         \n\
         Original Prompt:\n\
         {}",
        content
    )
}

/// Run `optimizer` on a stored prompt and save the result as a normal edit.
///
/// Blank content is not sent anywhere. A blank answer keeps the original
/// content.
pub fn optimize_prompt(
    vault: &mut Vault,
    id: &str,
    optimizer: &dyn PromptOptimizer,
) -> Result<Prompt> {
    let prompt = vault
        .get_prompt(id)
        .cloned()
        .ok_or_else(|| VaultError::PromptNotFound(id.to_string()))?;

    if prompt.content.trim().is_empty() {
        return Ok(prompt);
    }

    let optimized = match optimizer.optimize(&prompt.content) {
        Ok(text) => text,
        Err(e) => {
            warn!(id = %id, error = %e, "optimizer failed, prompt left unchanged");
            return Err(match e {
                VaultError::Optimizer(_) => e,
                other => VaultError::Optimizer(other.to_string()),
            });
        }
    };

    let optimized = optimized.trim();
    if optimized.is_empty() {
        return Ok(prompt);
    }

    vault.update_prompt(
        id,
        PromptUpdate {
            content: Some(optimized.to_string()),
            ..Default::default()
        },
    )
}

/// Optimizer that pipes the request into an external program and reads the
/// improved text from its stdout
#[derive(Debug, Clone)]
pub struct CommandOptimizer {
    program: String,
    args: Vec<String>,
}

impl CommandOptimizer {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Build from an argv list such as `["llm", "-m", "gpt-4o"]`
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            VaultError::Optimizer("optimizer command is empty".to_string())
        })?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }
}

impl PromptOptimizer for CommandOptimizer {
    fn optimize(&self, content: &str) -> Result<String> {
        debug!(program = %self.program, "running optimizer command");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VaultError::Optimizer(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(build_optimization_request(content).as_bytes())
                .map_err(|e| VaultError::Optimizer(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| VaultError::Optimizer(e.to_string()))?;

        if !output.status.success() {
            return Err(VaultError::Optimizer(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| VaultError::Optimizer("optimizer output is not UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::NewPrompt;

    struct Upper;

    impl PromptOptimizer for Upper {
        fn optimize(&self, content: &str) -> Result<String> {
            Ok(format!("  {}  \n", content.to_uppercase()))
        }
    }

    struct Failing;

    impl PromptOptimizer for Failing {
        fn optimize(&self, _content: &str) -> Result<String> {
            Err(VaultError::Optimizer("API key not found".to_string()))
        }
    }

    struct Blank;

    impl PromptOptimizer for Blank {
        fn optimize(&self, _content: &str) -> Result<String> {
            Ok("   ".to_string())
        }
    }

    struct Panicking;

    impl PromptOptimizer for Panicking {
        fn optimize(&self, _content: &str) -> Result<String> {
            panic!("optimizer must not be called");
        }
    }

    fn vault_with(content: &str) -> (Vault, String) {
        let mut vault = Vault::new();
        let id = if content.is_empty() {
            vault.create_default_prompt(None).unwrap().id
        } else {
            vault
                .create_prompt(NewPrompt {
                    title: "t".to_string(),
                    content: content.to_string(),
                    ..Default::default()
                })
                .unwrap()
                .id
        };
        (vault, id)
    }

    #[test]
    fn test_success_saves_trimmed_result_with_history() {
        let (mut vault, id) = vault_with("write a poem about {{topic}}");

        let prompt = optimize_prompt(&mut vault, &id, &Upper).unwrap();

        assert_eq!(prompt.content, "WRITE A POEM ABOUT {{TOPIC}}");
        assert_eq!(prompt.versions.len(), 1);
        assert_eq!(prompt.versions[0].content, "write a poem about {{topic}}");
    }

    #[test]
    fn test_failure_leaves_vault_untouched() {
        let (mut vault, id) = vault_with("original");
        let before = vault.clone();

        let err = optimize_prompt(&mut vault, &id, &Failing).unwrap_err();

        assert!(matches!(err, VaultError::Optimizer(_)));
        assert_eq!(vault, before);
    }

    #[test]
    fn test_blank_result_keeps_content() {
        let (mut vault, id) = vault_with("original");
        let prompt = optimize_prompt(&mut vault, &id, &Blank).unwrap();
        assert_eq!(prompt.content, "original");
        assert!(prompt.versions.is_empty());
    }

    #[test]
    fn test_blank_content_skips_optimizer() {
        let (mut vault, id) = vault_with("");
        let prompt = optimize_prompt(&mut vault, &id, &Panicking).unwrap();
        assert!(prompt.content.is_empty());
    }

    #[test]
    fn test_unknown_prompt() {
        let mut vault = Vault::new();
        assert!(matches!(
            optimize_prompt(&mut vault, "nope", &Upper),
            Err(VaultError::PromptNotFound(_))
        ));
    }

    #[test]
    fn test_request_contains_content() {
        let request = build_optimization_request("Summarize {{text}}");
        assert!(request.contains("Original Prompt:\nSummarize {{text}}"));
        assert!(request.contains("{{variable}}"));
    }

    #[test]
    fn test_from_argv_empty() {
        assert!(CommandOptimizer::from_argv(&[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_optimizer_round_trip() {
        let optimizer = CommandOptimizer::from_argv(&["cat".to_string()]).unwrap();
        let output = optimizer.optimize("hello").unwrap();
        assert!(output.ends_with("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_optimizer_failure() {
        let optimizer = CommandOptimizer::new("false".to_string(), vec![]);
        assert!(matches!(
            optimizer.optimize("hello"),
            Err(VaultError::Optimizer(_))
        ));
    }

    #[test]
    fn test_missing_program() {
        let optimizer = CommandOptimizer::new("promptvault-no-such-program".to_string(), vec![]);
        assert!(matches!(
            optimizer.optimize("hello"),
            Err(VaultError::Optimizer(_))
        ));
    }
}
