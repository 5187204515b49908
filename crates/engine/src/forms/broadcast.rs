use super::{FieldError, FormChain, FormKind, FormSettings, Step, required};

/// Broadcast: a single message step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BroadcastForm {
    AwaitingMessage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastDraft {
    pub message: String,
}

impl FormChain for BroadcastForm {
    type Draft = BroadcastDraft;

    const KIND: FormKind = FormKind::Broadcast;
    const FIELDS: &'static [&'static str] = &["message"];

    fn first() -> Self {
        Self::AwaitingMessage
    }

    fn step(&self) -> usize {
        0
    }

    fn accept(
        &self,
        input: &str,
        _: &FormSettings,
    ) -> Result<Step<Self, BroadcastDraft>, FieldError> {
        Ok(Step::Complete(BroadcastDraft {
            message: required(input, "message")?,
        }))
    }
}
