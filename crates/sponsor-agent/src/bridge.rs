//! Line bridge: one JSON state per input line, one action id per output line

use crate::decision::{AgentState, DecisionMaker};
use sponsor_core::{Result, SponsorError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Counters reported when the input stream ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BridgeStats {
    pub decisions: u64,
    pub skipped: u64,
}

/// Parse one input line into a state.
///
/// Undecodable JSON is a `Serialization` error. Valid JSON that lacks the
/// observation or the legal actions is a `Protocol` error.
pub fn parse_state(line: &str) -> Result<AgentState> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let Some(fields) = value.as_object() else {
        return Err(SponsorError::Protocol("State is not a JSON object".into()));
    };

    let has_observation = fields.contains_key("observation") || fields.contains_key("obs");
    if !has_observation || !fields.contains_key("legal_actions") {
        return Err(SponsorError::Protocol(
            "State lacks observation or legal_actions".into(),
        ));
    }

    Ok(serde_json::from_value(value)?)
}

/// Run the bridge until the input reaches EOF
pub async fn run<R, W, D>(mut input: R, mut output: W, decider: &mut D) -> Result<BridgeStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    D: DecisionMaker,
{
    let mut stats = BridgeStats::default();
    let mut buf = Vec::new();

    info!("Agent is expecting state input");
    loop {
        buf.clear();
        let n = input
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| SponsorError::Transport(format!("Failed to read input: {}", e)))?;
        if n == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                error!("Skipping input line that is not UTF-8: {}", e);
                stats.skipped += 1;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let state = match parse_state(line) {
            Ok(state) => state,
            Err(SponsorError::Protocol(reason)) => {
                warn!("Skipping malformed state: {}", reason);
                stats.skipped += 1;
                continue;
            }
            Err(e) => {
                error!("Failed to decode state: {}", e);
                debug!(
                    "Offending line: {}",
                    line.chars().take(200).collect::<String>()
                );
                stats.skipped += 1;
                continue;
            }
        };

        let action = match decider.decide(&state) {
            Ok(action) => action,
            Err(e) => {
                error!("No decision for state: {}", e);
                stats.skipped += 1;
                continue;
            }
        };

        output
            .write_all(format!("{}\n", action).as_bytes())
            .await
            .map_err(|e| SponsorError::Transport(format!("Failed to write action: {}", e)))?;
        output
            .flush()
            .await
            .map_err(|e| SponsorError::Transport(format!("Failed to flush action: {}", e)))?;
        stats.decisions += 1;
        debug!("Decided action {}", action);
    }

    info!(
        "Input stream closed after {} decisions ({} skipped)",
        stats.decisions, stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::RandomAgent;

    /// Always picks the first legal action
    struct FirstLegal;

    impl DecisionMaker for FirstLegal {
        fn decide(&mut self, state: &AgentState) -> Result<i64> {
            state
                .legal_actions
                .ids()?
                .first()
                .copied()
                .ok_or_else(|| SponsorError::Decision("No legal actions".into()))
        }
    }

    #[test]
    fn test_parse_state_classifies_failures() {
        assert!(matches!(
            parse_state("{not json"),
            Err(SponsorError::Serialization(_))
        ));
        assert!(matches!(
            parse_state(r#"{"observation":[]}"#),
            Err(SponsorError::Protocol(_))
        ));
        assert!(matches!(
            parse_state(r#"[1,2]"#),
            Err(SponsorError::Protocol(_))
        ));
        assert!(parse_state(r#"{"obs":[],"legal_actions":[3]}"#).is_ok());
    }

    #[tokio::test]
    async fn test_one_action_per_state() {
        let input = b"{\"observation\":[0],\"legal_actions\":[2,5]}\n\
                      {\"obs\":[1],\"legal_actions\":{\"7\":null}}\n";
        let mut output = Vec::new();

        let stats = run(&input[..], &mut output, &mut FirstLegal).await.unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "2\n7\n");
        assert_eq!(stats, BridgeStats { decisions: 2, skipped: 0 });
    }

    #[tokio::test]
    async fn test_bad_lines_are_skipped() {
        let input = b"\n\
                      {\"legal_actions\":[1]}\n\
                      garbage\n\
                      \xff\xfe{\"observation\":{},\"legal_actions\":[2]}\n\
                      {\"observation\":{},\"legal_actions\":[]}\n\
                      {\"observation\":{},\"legal_actions\":[4]}\n";
        let mut output = Vec::new();

        let stats = run(&input[..], &mut output, &mut FirstLegal).await.unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "4\n");
        assert_eq!(stats, BridgeStats { decisions: 1, skipped: 4 });
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let input = b"{\"observation\":{},\"legal_actions\":[9]}";
        let mut output = Vec::new();

        run(&input[..], &mut output, &mut FirstLegal).await.unwrap();

        assert_eq!(output, b"9\n");
    }

    #[tokio::test]
    async fn test_random_agent_over_mock_io() {
        let input = tokio_test::io::Builder::new()
            .read(b"{\"observation\":[1,0,0],\"legal_actions\":[3]}\n")
            .read(b"{\"observation\":[0,1,0],\"legal_actions\":{\"1\":null}}\n")
            .build();
        let output = tokio_test::io::Builder::new()
            .write(b"3\n")
            .write(b"1\n")
            .build();

        let stats = run(
            tokio::io::BufReader::new(input),
            output,
            &mut RandomAgent::new(Some(7)),
        )
        .await
        .unwrap();

        assert_eq!(stats.decisions, 2);
    }

    #[tokio::test]
    async fn test_write_failure_stops_the_bridge() {
        let input = b"{\"observation\":{},\"legal_actions\":[1]}\n";
        let output = tokio_test::io::Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            .build();

        let result = run(&input[..], output, &mut FirstLegal).await;

        assert!(matches!(result, Err(SponsorError::Transport(_))));
    }
}
