// file: src/filter/mod.rs
// description: binary relevance gate backed by a fine-tuned classifier model
// reference: spam/threat pre-filter ahead of extraction cost

use crate::config::GateConfig;
use crate::error::Result;
use crate::llm::{ChatCapability, ChatRequest};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Threat,
    Spam,
}

/// Cost-control gate run once per candidate text before any extraction work.
/// A false negative is a silent miss, a false positive wastes extraction
/// cost; neither corrupts output, so the verdict parsing is deliberately
/// forgiving about casing and surrounding noise.
pub struct RelevanceGate<'a, C> {
    chat: &'a C,
    model: &'a str,
}

const GATE_INSTRUCTION: &str = "Classify as 'THREAT' or 'SPAM'.";

impl<'a, C: ChatCapability> RelevanceGate<'a, C> {
    pub fn new(chat: &'a C, config: &'a GateConfig) -> Self {
        Self {
            chat,
            model: &config.model,
        }
    }

    pub async fn classify(&self, text: &str) -> Result<Verdict> {
        let reply = self
            .chat
            .chat(ChatRequest::new(GATE_INSTRUCTION, text).with_model(self.model))
            .await?;

        let verdict = Self::parse_verdict(&reply);
        debug!("Relevance gate verdict: {:?} (raw: {:?})", verdict, reply.trim());
        Ok(verdict)
    }

    fn parse_verdict(reply: &str) -> Verdict {
        if reply.to_uppercase().contains("THREAT") {
            Verdict::Threat
        } else {
            Verdict::Spam
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OllamaClient;

    fn parse(reply: &str) -> Verdict {
        RelevanceGate::<'_, OllamaClient>::parse_verdict(reply)
    }

    #[test]
    fn test_threat_label_detected() {
        assert_eq!(parse("THREAT"), Verdict::Threat);
        assert_eq!(parse("  threat\n"), Verdict::Threat);
        assert_eq!(parse("Verdict: Threat."), Verdict::Threat);
    }

    #[test]
    fn test_spam_label_detected() {
        assert_eq!(parse("SPAM"), Verdict::Spam);
        assert_eq!(parse("this is spam"), Verdict::Spam);
    }

    #[test]
    fn test_unparseable_reply_defaults_to_spam() {
        assert_eq!(parse("no idea"), Verdict::Spam);
        assert_eq!(parse(""), Verdict::Spam);
    }

    #[test]
    fn test_classify_uses_gate_model() {
        struct FixedChat(&'static str);

        impl ChatCapability for FixedChat {
            fn chat(
                &self,
                request: ChatRequest<'_>,
            ) -> impl Future<Output = Result<String>> + Send {
                assert_eq!(request.model, Some("tiny-filter"));
                let reply = self.0;
                async move { Ok(reply.to_string()) }
            }
        }

        let config = GateConfig {
            enabled: true,
            model: "tiny-filter".to_string(),
        };
        let chat = FixedChat("THREAT");
        let gate = RelevanceGate::new(&chat, &config);

        let verdict = tokio_test::block_on(gate.classify("Warlock deployed")).unwrap();
        assert_eq!(verdict, Verdict::Threat);
    }
}
