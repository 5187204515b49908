use super::{FieldError, FormChain, FormKind, FormSettings, Step, parse_options, required};

/// Poll creation: question, then all options in one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollForm {
    AwaitingQuestion,
    AwaitingOptions { question: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollDraft {
    pub question: String,
    pub options: Vec<String>,
}

impl FormChain for PollForm {
    type Draft = PollDraft;

    const KIND: FormKind = FormKind::Poll;
    const FIELDS: &'static [&'static str] = &["question", "options"];

    fn first() -> Self {
        Self::AwaitingQuestion
    }

    fn step(&self) -> usize {
        match self {
            Self::AwaitingQuestion => 0,
            Self::AwaitingOptions { .. } => 1,
        }
    }

    fn accept(&self, input: &str, _: &FormSettings) -> Result<Step<Self, PollDraft>, FieldError> {
        Ok(match self {
            Self::AwaitingQuestion => Step::Next(Self::AwaitingOptions {
                question: required(input, "question")?,
            }),
            Self::AwaitingOptions { question } => Step::Complete(PollDraft {
                question: question.clone(),
                options: parse_options(input)?,
            }),
        })
    }
}
