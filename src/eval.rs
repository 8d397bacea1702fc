//! Second-pass scoring of finished transcripts.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::llm::ChatModel;
use crate::message::Message;
use crate::telemetry::TelemetryCollector;
use crate::transcript::Transcript;

/// Three independent judgments over one completed transcript, plus the
/// judge's free-text rationale. `parsed` is false when the judge ignored
/// the requested format and the raw text was kept as rationale instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationVerdict {
    pub tool_selection_correct: bool,
    pub response_quality: bool,
    pub overall_success: bool,
    pub rationale: String,
    pub parsed: bool,
}

impl EvaluationVerdict {
    /// Best-effort verdict for judge output that did not follow the
    /// requested format.
    pub fn unparseable(raw: impl Into<String>) -> Self {
        Self {
            tool_selection_correct: false,
            response_quality: false,
            overall_success: false,
            rationale: raw.into(),
            parsed: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerdictWire {
    tool_selection_correct: bool,
    response_quality: bool,
    overall_success: bool,
    #[serde(default)]
    rationale: String,
}

/// Scores a transcript with one plain-mode call to the judge model.
///
/// A malformed judge response degrades to an unparseable verdict; it never
/// fails the run. Only endpoint failures escape.
pub struct Evaluator<M: ChatModel> {
    model: Arc<M>,
    telemetry: Option<TelemetryCollector>,
}

impl<M: ChatModel> Evaluator<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            telemetry: None,
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub async fn evaluate(&self, transcript: &Transcript) -> Result<EvaluationVerdict> {
        let prompt = build_rubric_prompt(transcript);
        let raw = self.model.complete_plain(&prompt).await?;
        let verdict = parse_verdict(&raw);
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(
                "evaluation",
                json!({"parsed": verdict.parsed, "overall_success": verdict.overall_success}),
            );
            if !verdict.parsed {
                telemetry.record_failure("evaluator", "judge output did not parse");
            }
        }
        debug!(parsed = verdict.parsed, "transcript evaluated");
        Ok(verdict)
    }
}

fn build_rubric_prompt(transcript: &Transcript) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are reviewing a completed exchange between a user, an assistant, \
         and the assistant's tools.\n\n",
    );

    let _ = writeln!(
        prompt,
        "User request: {}\n",
        transcript.user_request().unwrap_or("(none)")
    );

    prompt.push_str("Tool activity, in order:\n");
    let mut any_tools = false;
    for message in transcript.iter() {
        match message {
            Message::Assistant { tool_calls, .. } => {
                for call in tool_calls {
                    any_tools = true;
                    let _ = writeln!(prompt, "- called {} with {}", call.name, call.arguments);
                }
            }
            Message::ToolResult { tool, output, .. } => {
                let _ = writeln!(prompt, "  -> {tool} returned: {output}");
            }
            Message::User { .. } => {}
        }
    }
    if !any_tools {
        prompt.push_str("- no tools were called\n");
    }

    let _ = writeln!(
        prompt,
        "\nFinal answer: {}\n",
        transcript.final_answer().unwrap_or("(no final answer)")
    );

    prompt.push_str(
        "Judge three criteria: did the assistant pick the right tools for the \
         request, is the final answer of good quality, and did the exchange \
         succeed overall.\n\
         Reply with ONLY a JSON object in this exact shape:\n\
         {\"tool_selection_correct\": bool, \"response_quality\": bool, \
         \"overall_success\": bool, \"rationale\": \"one or two sentences\"}\n",
    );
    prompt
}

/// Lenient parse: accept the raw text as-is, or the first `{...}` span
/// inside surrounding prose. Anything else becomes an unparseable verdict.
fn parse_verdict(raw: &str) -> EvaluationVerdict {
    let candidate = raw.trim();
    let attempt = serde_json::from_str::<VerdictWire>(candidate).ok().or_else(|| {
        let start = candidate.find('{')?;
        let end = candidate.rfind('}')?;
        serde_json::from_str::<VerdictWire>(&candidate[start..=end]).ok()
    });

    match attempt {
        Some(wire) => EvaluationVerdict {
            tool_selection_correct: wire.tool_selection_correct,
            response_quality: wire.response_quality,
            overall_success: wire.overall_success,
            rationale: wire.rationale,
            parsed: true,
        },
        None => EvaluationVerdict::unparseable(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::message::ToolCallRequest;

    fn sample_transcript() -> Transcript {
        let mut transcript = Transcript::default();
        transcript.push(Message::user("What's 12 multiplied by 7?"));
        transcript.push(Message::tool_calls(vec![ToolCallRequest::with_id(
            "call_0",
            "calculate",
            json!({"operation": "multiply", "a": 12, "b": 7}),
        )]));
        transcript.push(Message::tool_result(
            "call_0",
            "calculate",
            "The result of multiplying 12 by 7 is 84.",
        ));
        transcript.push(Message::assistant("12 multiplied by 7 is 84."));
        transcript
    }

    #[tokio::test]
    async fn parses_well_formed_verdicts() {
        let model = ScriptedModel::new([
            r#"{"tool_selection_correct": true, "response_quality": true, "overall_success": true, "rationale": "Correct tool, correct math."}"#,
        ]);
        let verdict = Evaluator::new(model)
            .evaluate(&sample_transcript())
            .await
            .unwrap();
        assert!(verdict.parsed);
        assert!(verdict.overall_success);
        assert_eq!(verdict.rationale, "Correct tool, correct math.");
    }

    #[tokio::test]
    async fn extracts_json_from_surrounding_prose() {
        let model = ScriptedModel::new([
            r#"Here is my judgment: {"tool_selection_correct": true, "response_quality": false, "overall_success": false, "rationale": "Answer too terse."} Hope that helps."#,
        ]);
        let verdict = Evaluator::new(model)
            .evaluate(&sample_transcript())
            .await
            .unwrap();
        assert!(verdict.parsed);
        assert!(verdict.tool_selection_correct);
        assert!(!verdict.response_quality);
    }

    #[tokio::test]
    async fn malformed_output_degrades_instead_of_failing() {
        let model = ScriptedModel::new(["I think it went pretty well overall!"]);
        let verdict = Evaluator::new(model)
            .evaluate(&sample_transcript())
            .await
            .unwrap();
        assert!(!verdict.parsed);
        assert!(!verdict.overall_success);
        assert_eq!(verdict.rationale, "I think it went pretty well overall!");
    }

    #[test]
    fn rubric_prompt_embeds_the_whole_exchange() {
        let prompt = build_rubric_prompt(&sample_transcript());
        assert!(prompt.contains("What's 12 multiplied by 7?"));
        assert!(prompt.contains("called calculate"));
        assert!(prompt.contains("returned: The result of multiplying 12 by 7 is 84."));
        assert!(prompt.contains("Final answer: 12 multiplied by 7 is 84."));
    }
}
