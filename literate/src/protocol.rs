//! Classification of code blocks by the `file://` and `rmsm://` protocols of
//! their meta string.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static PROTOCOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(file|rmsm)://(\S+)(?:$|\s)").expect("protocol pattern compiles")
});

/// Reserved `rmsm://` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// The block is the project's startup shell script.
    Startup,
}

impl Directive {
    pub const ALL: &'static [Directive] = &[Directive::Startup];

    pub fn as_str(self) -> &'static str {
        match self {
            Directive::Startup => "startup",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directive {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Directive::ALL
            .iter()
            .copied()
            .find(|directive| directive.as_str() == value)
            .ok_or_else(|| ProtocolError::InvalidDirective(value.to_string()))
    }
}

/// What a code block turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// A file, at `path` when the meta string names one.
    File { path: Option<String> },
    Directive(Directive),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid rmsm protocol value: {0}")]
    InvalidDirective(String),
}

/// Classify a block from its meta string. Only the first protocol token
/// counts; unknown schemes are ordinary words.
pub fn resolve(meta: Option<&str>) -> Result<BlockKind, ProtocolError> {
    let Some(caps) = meta.and_then(|meta| PROTOCOL.captures(meta)) else {
        return Ok(BlockKind::File { path: None });
    };

    let value = &caps[2];
    match &caps[1] {
        "rmsm" => value.parse().map(BlockKind::Directive),
        _ => Ok(BlockKind::File {
            path: Some(value.to_string()),
        }),
    }
}
