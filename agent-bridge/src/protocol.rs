use battle_action::Action;
use serde::{
    Deserialize,
    Serialize,
};

/// A handshake message. Both directions use the same shape with a different `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Handshake {
    Ready,
    Ack,
}

/// Header frame of an agent request sent from the worker to the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequestHeader {
    #[serde(rename = "type")]
    pub kind: AgentRequestKind,
    pub battle: String,
    pub name: String,
    pub choices: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRequestKind {
    Agent,
}

/// The predictor's reply to an agent request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReplyHeader {
    pub battle: String,
    pub name: String,
    pub ranked_actions: Vec<Action>,
}

/// Sent once a battle terminates, to report the final transition for a model-controlled side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentFinalMessage {
    #[serde(rename = "type")]
    pub kind: AgentFinalKind,
    pub battle: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFinalKind {
    AgentFinal,
}

#[cfg(test)]
mod protocol_test {
    use battle_action::Action;

    use super::{
        AgentFinalKind,
        AgentFinalMessage,
        AgentRequestHeader,
        AgentRequestKind,
    };

    #[test]
    fn request_header_omits_absent_optional_fields() {
        let header = AgentRequestHeader {
            kind: AgentRequestKind::Agent,
            battle: "battle-1".to_owned(),
            name: "p1".to_owned(),
            choices: vec![Action::new("move 1")],
            last_action: None,
            reward: None,
        };
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(
            json,
            r#"{"type":"agent","battle":"battle-1","name":"p1","choices":["move 1"]}"#
        );
    }

    #[test]
    fn agent_final_tags_its_message_type() {
        let message = AgentFinalMessage {
            kind: AgentFinalKind::AgentFinal,
            battle: "battle-1".to_owned(),
            name: "p1".to_owned(),
            action: None,
            reward: Some(1.0),
            terminated: Some(true),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(
            json,
            r#"{"type":"agent_final","battle":"battle-1","name":"p1","reward":1.0,"terminated":true}"#
        );
    }
}
