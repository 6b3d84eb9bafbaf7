//! Call-control instructions returned to the gateway
//!
//! The gateway executes a JSON array of actions (an NCCO) for a leg. Only the
//! three actions this flow issues are modelled: `talk`, `input` and
//! `conversation`.

use serde::Serialize;

use crate::config::FlowConfig;

/// One call-control action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Instruction {
    Talk(Talk),
    Input(Input),
    Conversation(Conversation),
}

/// Text-to-speech
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Talk {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barge_in: Option<bool>,
    pub language: String,
    pub style: u32,
}

/// Collect caller input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub event_url: Vec<String>,
    #[serde(rename = "type")]
    pub input_types: Vec<String>,
    pub dtmf: DtmfSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DtmfSettings {
    pub max_digits: u8,
    /// Seconds of silence after the last digit before the result is submitted
    pub timeout: u8,
    pub submit_on_hash: bool,
}

/// Join a named conference room
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_hear: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on_enter: Option<bool>,
}

/// Ordered actions, serialized as a bare JSON array
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct InstructionSet(pub Vec<Instruction>);

impl InstructionSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(mut self, instruction: Instruction) -> Self {
        self.0.push(instruction);
        self
    }

    pub fn actions(&self) -> &[Instruction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name of the conference room this set joins, if any
    pub fn conversation_name(&self) -> Option<&str> {
        self.0.iter().find_map(|instruction| match instruction {
            Instruction::Conversation(conversation) => Some(conversation.name.as_str()),
            _ => None,
        })
    }

    /// Concatenated speech of every talk action
    pub fn spoken_text(&self) -> String {
        self.0
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Talk(talk) => Some(talk.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Instruction {
    /// Speech using the configured language and style
    pub fn talk(config: &FlowConfig, text: impl Into<String>) -> Self {
        Instruction::Talk(Talk {
            text: text.into(),
            barge_in: None,
            language: config.language.clone(),
            style: config.voice_style,
        })
    }

    /// Speech the caller can interrupt by keying digits
    pub fn prompt(config: &FlowConfig, text: impl Into<String>) -> Self {
        Instruction::Talk(Talk {
            text: text.into(),
            barge_in: Some(true),
            language: config.language.clone(),
            style: config.voice_style,
        })
    }

    /// DTMF collection reporting to `event_url`
    pub fn collect_digits(config: &FlowConfig, event_url: impl Into<String>) -> Self {
        Instruction::Input(Input {
            event_url: vec![event_url.into()],
            input_types: vec!["dtmf".to_string()],
            dtmf: DtmfSettings {
                max_digits: config.max_digits,
                timeout: config.digit_timeout_secs,
                submit_on_hash: config.submit_on_hash,
            },
        })
    }

    pub fn join_room(name: impl Into<String>) -> Self {
        Instruction::Conversation(Conversation {
            name: name.into(),
            can_hear: None,
            start_on_enter: None,
        })
    }

    /// Join `name` hearing only `peer`
    pub fn listen_in(name: impl Into<String>, peer: impl Into<String>) -> Self {
        Instruction::Conversation(Conversation {
            name: name.into(),
            can_hear: Some(vec![peer.into()]),
            start_on_enter: Some(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn digit_prompt_wire_format() {
        let config = FlowConfig::default();
        let set = InstructionSet::new()
            .push(Instruction::prompt(&config, "Enter a number"))
            .push(Instruction::collect_digits(&config, "https://host/dtmf"));

        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!([
                {
                    "action": "talk",
                    "text": "Enter a number",
                    "bargeIn": true,
                    "language": "en-US",
                    "style": 0
                },
                {
                    "action": "input",
                    "eventUrl": ["https://host/dtmf"],
                    "type": ["dtmf"],
                    "dtmf": { "maxDigits": 6, "timeout": 7, "submitOnHash": true }
                }
            ])
        );
    }

    #[test]
    fn listen_in_wire_format() {
        let set = InstructionSet::new().push(Instruction::listen_in("conf_77", "leg-1"));
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!([{
                "action": "conversation",
                "name": "conf_77",
                "canHear": ["leg-1"],
                "startOnEnter": true
            }])
        );
        assert_eq!(set.conversation_name(), Some("conf_77"));
    }

    #[test]
    fn plain_room_join_omits_optional_fields() {
        let value = serde_json::to_value(Instruction::join_room("conf_1")).unwrap();
        assert_eq!(value, json!({ "action": "conversation", "name": "conf_1" }));
    }
}
