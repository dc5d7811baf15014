use std::path::PathBuf;

/// clap value parser for positional `KEY=VALUE` arguments.
pub(crate) fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("expected KEY=VALUE, got `{s}` (empty key)"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Settings passed on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InvocationArgs {
    /// Path of the JSON deploy config
    pub config: PathBuf,
    /// Portainer user; prompted for when absent
    pub username: Option<String>,
}

impl InvocationArgs {
    /// Later occurrences of a key win. Unknown keys are ignored with a warning.
    pub fn from_pairs(pairs: &[(String, String)]) -> anyhow::Result<Self> {
        let mut config = None;
        let mut username = None;

        for (key, value) in pairs {
            match key.as_str() {
                "config" => config = Some(PathBuf::from(value)),
                "username" => username = Some(value.clone()),
                other => tracing::warn!(key = other, "ignoring unknown argument"),
            }
        }

        let config = config
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument config=<path>"))?;

        Ok(Self { config, username })
    }
}
