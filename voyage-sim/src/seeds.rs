use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use voyage_core::{ReplayMode, decode_replay, encode_replay};

/// A battle seed and, when it came from one, its replay code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub mode: Option<ReplayMode>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            mode: None,
        }
    }

    #[must_use]
    pub fn from_replay_code(seed: u64, mode: ReplayMode, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            mode: Some(mode),
        }
    }

    /// Replay code to show in reports; numeric seeds get a skirmish code.
    #[must_use]
    pub fn label(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| encode_replay(ReplayMode::Skirmish, self.seed))
    }
}

/// Resolve CLI seed tokens: integers, replay codes, or `all` for every
/// skirmish code of one word (`all:KRAKEN`).
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some(word) = token
            .strip_prefix("all:")
            .or_else(|| token.strip_prefix("ALL:"))
        {
            pending.extend(expand_word(word)?);
            continue;
        }

        if token.starts_with('-') && token.parse::<i64>().is_ok() {
            bail!("Negative seed not allowed: {token}");
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some((mode, seed)) = decode_replay(token) {
            pending.push(SeedInfo::from_replay_code(seed, mode, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(1337));
    }

    Ok(pending)
}

fn expand_word(word: &str) -> Result<Vec<SeedInfo>> {
    (0..100)
        .map(|suffix| {
            let code = format!("PV-{}{suffix:02}", word.to_ascii_uppercase());
            let (mode, seed) =
                decode_replay(&code).with_context(|| format!("unknown replay word in {code}"))?;
            Ok(SeedInfo::from_replay_code(seed, mode, code))
        })
        .collect()
}
