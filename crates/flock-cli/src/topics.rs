//! `flock topics` handlers.

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;

use flock_core::{load_topics, save_topics, TopicConfig};

#[derive(Debug, Subcommand)]
pub enum TopicsCommands {
    /// Print every topic with its keywords, then the stream track list
    Show,
    /// Add a topic, or extend an existing one with more keywords
    Add {
        label: String,

        /// Extra keyword phrases; quote multi-word phrases
        keywords: Vec<String>,
    },
}

pub(crate) fn run_topics(path: &Path, command: TopicsCommands) -> anyhow::Result<()> {
    match command {
        TopicsCommands::Show => {
            let topics = load_topics(path)?;
            print!("{}", render_topics(&topics));
        }
        TopicsCommands::Add { label, keywords } => {
            let current = if path.exists() {
                load_topics(path)?
            } else {
                tracing::info!(path = %path.display(), "topics file not found; starting a new one");
                TopicConfig::default()
            };
            let updated = current
                .with_topic(&label, &keywords)
                .with_context(|| format!("adding topic '{label}'"))?;
            save_topics(path, &updated)?;
            println!("saved {} topic(s) to {}", updated.len(), path.display());
        }
    }
    Ok(())
}

fn render_topics(topics: &TopicConfig) -> String {
    let mut out = String::new();
    for topic in topics {
        out.push_str(&format!("{}: {}\n", topic.label, topic.keywords.join(", ")));
    }
    out.push_str(&format!("track: {}\n", topics.tracks().join(", ")));
    out
}

#[cfg(test)]
mod tests {
    use flock_core::Topic;

    use super::*;

    #[test]
    fn render_lists_topics_then_tracks() {
        let topics = TopicConfig::new(vec![
            Topic::new("bitcoin", ["btc"]),
            Topic::new("crypto", ["bitcoin mining", "btc"]),
        ])
        .unwrap();

        assert_eq!(
            render_topics(&topics),
            "bitcoin: bitcoin, btc\ncrypto: crypto, bitcoin mining, btc\ntrack: bitcoin, btc, crypto, bitcoin mining\n"
        );
    }

    #[test]
    fn add_creates_then_extends_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.yaml");

        run_topics(
            &path,
            TopicsCommands::Add {
                label: "oracle".to_string(),
                keywords: vec!["OCI".to_string()],
            },
        )
        .unwrap();
        run_topics(
            &path,
            TopicsCommands::Add {
                label: "Oracle".to_string(),
                keywords: vec!["oracle cloud".to_string()],
            },
        )
        .unwrap();

        let topics = load_topics(&path).unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(
            topics.topics()[0].keywords,
            vec!["oracle", "oci", "oracle cloud"]
        );
    }

    #[test]
    fn add_rejects_reserved_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topics.yaml");

        let result = run_topics(
            &path,
            TopicsCommands::Add {
                label: "unclassified".to_string(),
                keywords: Vec::new(),
            },
        );
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
