use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Google,
    Amazon,
    Youtube,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Google, Source::Amazon, Source::Youtube];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Google => "google",
            Source::Amazon => "amazon",
            Source::Youtube => "youtube",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
