//! Submitted responses and the grades computed for them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ItemKind, SectionCode};
use crate::statistics::VerdictBand;

/// The test-taker's answer, shaped by the item's input type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Answer {
    /// Free-form numeric entry; decoration such as `%` is tolerated.
    Numeric { value: String },
    Choice { selected_index: usize },
    /// One selected option index per blank.
    MultiChoice { selected_indices: Vec<usize> },
    Sequence { values: Vec<String> },
    MultiPart { parts: Vec<String> },
    Text { text: String },
}

impl Answer {
    pub fn shape(&self) -> &'static str {
        match self {
            Answer::Numeric { .. } => "numeric",
            Answer::Choice { .. } => "choice",
            Answer::MultiChoice { .. } => "multi-choice",
            Answer::Sequence { .. } => "sequence",
            Answer::MultiPart { .. } => "multi-part",
            Answer::Text { .. } => "text",
        }
    }

    /// Raw text form used when an answer must be normalised and digested.
    pub fn as_text(&self) -> String {
        match self {
            Answer::Numeric { value } => value.clone(),
            Answer::Choice { selected_index } => selected_index.to_string(),
            Answer::MultiChoice { selected_indices } => selected_indices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Answer::Sequence { values } => values.join(","),
            Answer::MultiPart { parts } => parts.join(","),
            Answer::Text { text } => text.clone(),
        }
    }
}

/// One submission for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub item_id: String,
    #[serde(flatten)]
    pub answer: Answer,
    /// Time spent on the item, if the client tracked it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

impl Response {
    pub fn new(item_id: impl Into<String>, answer: Answer) -> Self {
        Self {
            item_id: item_id.into(),
            answer,
            time_ms: None,
        }
    }
}

/// All responses submitted against one plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub plan_id: Option<Uuid>,
    pub responses: Vec<Response>,
}

/// Score for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGrade {
    pub item_id: String,
    pub kind: ItemKind,
    /// Partial credit in `[0, 1]`.
    pub correctness: f64,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ItemGrade {
    pub fn is_correct(&self) -> bool {
        self.correctness >= 1.0
    }
}

/// Unweighted mean of a section's item grades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionGrade {
    pub code: SectionCode,
    pub overall: f64,
    pub items: Vec<ItemGrade>,
}

/// Grades for a whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanGrade {
    pub plan_id: Uuid,
    pub seed: String,
    pub sections: Vec<SectionGrade>,
    pub overall: f64,
    pub verdict: VerdictBand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_json_is_flat() {
        let json = r#"{"item_id":"A-0-abcd","type":"choice","selected_index":2,"time_ms":900}"#;
        let response: Response = serde_json::from_str(json).unwrap();
        assert_eq!(response.item_id, "A-0-abcd");
        assert_eq!(response.answer, Answer::Choice { selected_index: 2 });
        assert_eq!(response.time_ms, Some(900));

        let back = serde_json::to_value(&response).unwrap();
        assert_eq!(back["type"], "choice");
        assert_eq!(back["selected_index"], 2);
    }

    #[test]
    fn time_is_optional() {
        let json = r#"{"item_id":"x","type":"text","text":"hello"}"#;
        let response: Response = serde_json::from_str(json).unwrap();
        assert!(response.time_ms.is_none());
        assert_eq!(response.answer.as_text(), "hello");
    }

    #[test]
    fn unknown_answer_type_rejected() {
        let json = r#"{"item_id":"x","type":"telepathy"}"#;
        assert!(serde_json::from_str::<Response>(json).is_err());
    }

    #[test]
    fn multi_choice_text_form() {
        let answer = Answer::MultiChoice {
            selected_indices: vec![1, 0, 2],
        };
        assert_eq!(answer.as_text(), "1,0,2");
        assert_eq!(answer.shape(), "multi-choice");
    }
}
