use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

use crate::utils::exec_policy;

#[derive(Clone, Debug)]
pub enum StdioSpec {
    Inherit,
    Null,
    Pipe,
}

impl StdioSpec {
    #[inline]
    fn to_stdio(&self) -> Stdio {
        match self {
            StdioSpec::Inherit => Stdio::inherit(),
            StdioSpec::Null => Stdio::null(),
            StdioSpec::Pipe => Stdio::piped(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CmdSpec {
    program: String,
    args: Vec<String>,
    stdout: StdioSpec,
    stderr: StdioSpec,
}

impl CmdSpec {
    #[must_use]
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdout: StdioSpec::Inherit,
            stderr: StdioSpec::Inherit,
        }
    }

    #[must_use]
    pub fn arg(mut self, a: impl Into<String>) -> Self {
        self.args.push(a.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, it: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(it.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn stdout(mut self, s: StdioSpec) -> Self {
        self.stdout = s;
        self
    }

    #[must_use]
    pub fn stderr(mut self, s: StdioSpec) -> Self {
        self.stderr = s;
        self
    }

    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(sh_quote(&self.program));
        parts.extend(self.args.iter().map(|a| sh_quote(a)));
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        cmd
    }
}

/// Captured result of a command whose exit status is left to the caller.
#[derive(Clone, Debug, Default)]
pub struct CmdOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

pub trait Runner: Send + Sync {
    /// Runs a mutating command. Honors the dry-run policy.
    fn run(&self, cmd: &CmdSpec) -> Result<()>;
    /// Runs a read-only command and returns stdout; non-zero exit is an error.
    fn run_capture(&self, cmd: &CmdSpec) -> Result<String>;
    /// Runs a read-only command and returns whatever it produced. Only
    /// streams set to `StdioSpec::Pipe` are captured.
    fn output(&self, cmd: &CmdSpec) -> Result<CmdOutput>;
}

#[derive(Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Runner for ProcessRunner {
    fn run(&self, cmd: &CmdSpec) -> Result<()> {
        if exec_policy::is_dry_run() {
            tracing::info!("[DRY-RUN] {}", cmd.render());
            return Ok(());
        }
        tracing::debug!("exec: {}", cmd.render());

        let status = cmd
            .to_command()
            .stdout(cmd.stdout.to_stdio())
            .stderr(cmd.stderr.to_stdio())
            .status()
            .with_context(|| format!("spawn {}", cmd.render()))?;
        if !status.success() {
            bail!("command failed: {} with {status}", cmd.render());
        }
        Ok(())
    }

    fn run_capture(&self, cmd: &CmdSpec) -> Result<String> {
        let out = self.output(cmd)?;
        if out.success {
            Ok(out.stdout)
        } else {
            bail!(
                "command failed: {} ({})",
                cmd.render(),
                out.stderr.trim()
            );
        }
    }

    fn output(&self, cmd: &CmdSpec) -> Result<CmdOutput> {
        tracing::debug!("exec(capture): {}", cmd.render());

        let out = cmd
            .to_command()
            .stdout(cmd.stdout.to_stdio())
            .stderr(cmd.stderr.to_stdio())
            .output()
            .with_context(|| format!("run {}", cmd.render()))?;
        Ok(CmdOutput {
            success: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

fn sh_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".into();
    }
    if !s
        .bytes()
        .any(|b| b == b' ' || b == b'\'' || b == b'"' || b == b'\\')
    {
        return s.to_string();
    }
    let mut out = String::from("'");
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
