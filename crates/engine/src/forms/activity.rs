use super::{FieldError, FormChain, FormKind, FormSettings, Step, parse_capacity, required};

/// Activity creation: name, description, schedule, capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivityForm {
    AwaitingName,
    AwaitingDescription {
        name: String,
    },
    AwaitingSchedule {
        name: String,
        description: String,
    },
    AwaitingCapacity {
        name: String,
        description: String,
        scheduled_at: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityDraft {
    pub name: String,
    pub description: String,
    pub scheduled_at: String,
    pub capacity: u32,
}

impl FormChain for ActivityForm {
    type Draft = ActivityDraft;

    const KIND: FormKind = FormKind::Activity;
    const FIELDS: &'static [&'static str] = &["name", "description", "scheduled_at", "capacity"];

    fn first() -> Self {
        Self::AwaitingName
    }

    fn step(&self) -> usize {
        match self {
            Self::AwaitingName => 0,
            Self::AwaitingDescription { .. } => 1,
            Self::AwaitingSchedule { .. } => 2,
            Self::AwaitingCapacity { .. } => 3,
        }
    }

    fn accept(
        &self,
        input: &str,
        settings: &FormSettings,
    ) -> Result<Step<Self, ActivityDraft>, FieldError> {
        Ok(match self {
            Self::AwaitingName => Step::Next(Self::AwaitingDescription {
                name: required(input, "name")?,
            }),
            Self::AwaitingDescription { name } => Step::Next(Self::AwaitingSchedule {
                name: name.clone(),
                description: required(input, "description")?,
            }),
            Self::AwaitingSchedule { name, description } => Step::Next(Self::AwaitingCapacity {
                name: name.clone(),
                description: description.clone(),
                scheduled_at: required(input, "scheduled_at")?,
            }),
            Self::AwaitingCapacity {
                name,
                description,
                scheduled_at,
            } => Step::Complete(ActivityDraft {
                name: name.clone(),
                description: description.clone(),
                scheduled_at: scheduled_at.clone(),
                capacity: parse_capacity(input, settings.default_capacity)?,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> FormSettings {
        FormSettings {
            default_capacity: 50,
            idle_timeout: None,
        }
    }

    fn walk(inputs: &[&str]) -> ActivityForm {
        inputs.iter().fold(ActivityForm::first(), |form, input| {
            match form.accept(input, &settings()).unwrap() {
                Step::Next(next) => next,
                Step::Complete(_) => panic!("completed too early"),
            }
        })
    }

    #[test]
    fn three_answers_reach_the_capacity_step() {
        let form = walk(&["Rust workshop", "Hands-on", "15 Nov, 14:00"]);
        assert_eq!(form.position().step, 4);
        assert_eq!(form.position().total, 4);
        assert_eq!(form.position().field, "capacity");
    }

    #[test]
    fn placeholder_uses_the_default_capacity() {
        let form = walk(&["Rust workshop", "Hands-on", "15 Nov, 14:00"]);
        let Step::Complete(draft) = form.accept(" - ", &settings()).unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(
            draft,
            ActivityDraft {
                name: "Rust workshop".to_string(),
                description: "Hands-on".to_string(),
                scheduled_at: "15 Nov, 14:00".to_string(),
                capacity: 50,
            }
        );
    }

    #[test]
    fn bad_capacity_keeps_collected_fields() {
        let form = walk(&["Rust workshop", "Hands-on", "15 Nov, 14:00"]);
        for input in ["abc", "0", "-3", "", "3000000000"] {
            assert!(form.accept(input, &settings()).is_err(), "{input:?}");
        }
        assert_eq!(form, walk(&["Rust workshop", "Hands-on", "15 Nov, 14:00"]));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            ActivityForm::first().accept("   ", &settings()),
            Err(FieldError::Empty { field: "name" })
        );
    }
}
