//! Replication checkpoints and the expected checkpoint view.

use std::collections::BTreeMap;

use crate::OracleError;
use crate::tree::ResponseTree;

/// One `(leader, channel, token)` checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    leader: String,
    channel: String,
    token: String,
}

impl Checkpoint {
    /// Fields must be non-empty and free of `:` and whitespace, which
    /// delimit the line encoding.
    pub fn new(
        leader: impl Into<String>,
        channel: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, OracleError> {
        let checkpoint = Self {
            leader: leader.into(),
            channel: channel.into(),
            token: token.into(),
        };
        for (what, field) in [
            ("leader", &checkpoint.leader),
            ("channel", &checkpoint.channel),
            ("token", &checkpoint.token),
        ] {
            if field.is_empty() || field.contains(|c: char| c == ':' || c.is_whitespace()) {
                return Err(OracleError::InvalidQuery(format!(
                    "checkpoint {what} '{field}' must be non-empty without ':' or whitespace"
                )));
            }
        }
        Ok(checkpoint)
    }

    pub fn leader(&self) -> &str {
        &self.leader
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `cp <leader>:<channel>:<token>\n`
    pub fn to_line(&self) -> String {
        format!("cp {}:{}:{}\n", self.leader, self.channel, self.token)
    }
}

/// Checkpoints sent so far; the last token per `(leader, channel)` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointLedger {
    leaders: BTreeMap<String, BTreeMap<String, String>>,
}

impl CheckpointLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, checkpoint: &Checkpoint) {
        self.leaders
            .entry(checkpoint.leader.clone())
            .or_default()
            .insert(checkpoint.channel.clone(), checkpoint.token.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.leaders.is_empty()
    }

    /// The response a correct backend gives for `get_checkpoint(leader)`:
    /// `[{"leader": l, "channels": [{"channel": c, "checkpoint": t}, ..]}, ..]`.
    ///
    /// Unknown leaders yield `[]`.
    pub fn expected(&self, leader: Option<&str>) -> ResponseTree {
        let entries = self
            .leaders
            .iter()
            .filter(|(name, _)| leader.is_none_or(|wanted| wanted == name.as_str()))
            .map(|(name, channels)| {
                let channels = channels
                    .iter()
                    .map(|(channel, token)| {
                        let mut entry = BTreeMap::new();
                        entry.insert("channel".to_string(), ResponseTree::from(channel.as_str()));
                        entry.insert("checkpoint".to_string(), ResponseTree::from(token.as_str()));
                        ResponseTree::Map(entry)
                    })
                    .collect();
                let mut entry = BTreeMap::new();
                entry.insert("leader".to_string(), ResponseTree::from(name.as_str()));
                entry.insert("channels".to_string(), ResponseTree::Seq(channels));
                ResponseTree::Map(entry)
            })
            .collect();
        ResponseTree::Seq(entries)
    }
}
