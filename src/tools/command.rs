use std::path::Path;
use std::process::{Command, Stdio};

use crate::foundation::error::ToolError;
use crate::tools::traits::{Annotator, OutcomeStamper, RasterConverter, ToolResult};

/// An external program invoked with a templated argument list.
///
/// Arguments may contain `{name}` placeholders which are replaced per call:
///
/// - converter: `{input}`, `{output}`
/// - annotator: `{raster}`, `{white}`, `{black}`
/// - stamper: `{raster}`, `{outcome}`
///
/// A non-zero exit status is reported as [`ToolError::Failed`] with the captured stderr.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTool {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandTool {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
        }
    }

    /// Parse a whitespace-separated command line, e.g. `"rsvg-convert -o {output} {input}"`.
    ///
    /// No shell quoting is supported.
    pub fn parse(line: &str) -> Result<Self, ToolError> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ToolError::Other(anyhow::anyhow!("empty command line")))?;
        Ok(Self::new(program, parts))
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Headless inkscape SVG→PNG export.
    pub fn inkscape() -> Self {
        Self::new(
            "dbus-run-session",
            ["inkscape", "--export-filename={output}", "{input}"],
        )
        .env("GTK_BACKEND", "cairo")
    }

    /// Annotation script taking `<raster> <white> <black>`.
    pub fn annotate_script(path: impl Into<String>) -> Self {
        Self::new(path, ["{raster}", "{white}", "{black}"])
    }

    /// Outcome script taking `<raster> <outcome>`.
    pub fn stamp_script(path: impl Into<String>) -> Self {
        Self::new(path, ["{raster}", "{outcome}"])
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Expand placeholders in the argument template.
    pub fn expand_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{name}}}"), value)
                })
            })
            .collect()
    }

    pub fn run(&self, vars: &[(&str, &str)]) -> ToolResult {
        let args = self.expand_args(vars);
        tracing::trace!(program = %self.program, ?args, "running external tool");

        let out = Command::new(&self.program)
            .args(&args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !out.status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

impl RasterConverter for CommandTool {
    fn convert(&self, vector: &Path, dest: &Path) -> ToolResult {
        let (input, output) = (path_str(vector), path_str(dest));
        self.run(&[("input", input.as_str()), ("output", output.as_str())])?;
        if !dest.is_file() {
            return Err(ToolError::Other(anyhow::anyhow!(
                "'{}' exited successfully but did not write '{}'",
                self.program,
                dest.display()
            )));
        }
        Ok(())
    }
}

impl Annotator for CommandTool {
    fn annotate(&self, raster: &Path, white: &str, black: &str) -> ToolResult {
        let raster = path_str(raster);
        self.run(&[("raster", raster.as_str()), ("white", white), ("black", black)])
    }
}

impl OutcomeStamper for CommandTool {
    fn stamp(&self, raster: &Path, outcome: &str) -> ToolResult {
        let raster = path_str(raster);
        self.run(&[("raster", raster.as_str()), ("outcome", outcome)])
    }
}
