/*!
Actions: the named, invocable operations a service exposes, each with an ordered argument list.
*/

use crate::error::{invalid_argument, Error};
use crate::model::datatype::Value;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Clone, Debug)]
pub struct Argument {
    pub name: String,
    pub direction: Direction,
    pub return_value: bool,
    pub related_state_variable: String,
}

#[derive(Clone, Debug)]
pub struct Action {
    pub name: String,
    pub arguments: Vec<Argument>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Action {
    pub fn new(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Action {
            name: name.into(),
            arguments,
        }
    }

    pub fn in_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| a.direction == Direction::In)
    }

    pub fn out_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(|a| a.direction == Direction::Out)
    }

    /// The single argument flagged `retval`, if any. §4.5: at most one, and it must be the first
    /// out argument.
    pub fn return_value_argument(&self) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.return_value)
    }

    /// Checks that `provided` carries exactly the in-arguments this action declares, in any
    /// order, with nothing extra (§4.5, argument validation).
    pub fn check_in_arguments(&self, provided: &[(String, Value)]) -> Result<(), Error> {
        for expected in self.in_arguments() {
            if !provided.iter().any(|(name, _)| name == &expected.name) {
                return Err(invalid_argument(&expected.name, "missing required in-argument"));
            }
        }
        for (name, _) in provided {
            if !self.in_arguments().any(|a| &a.name == name) {
                return Err(invalid_argument(name, "not an in-argument of this action"));
            }
        }
        Ok(())
    }
}

impl Argument {
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        related_state_variable: impl Into<String>,
    ) -> Self {
        Argument {
            name: name.into(),
            direction,
            return_value: false,
            related_state_variable: related_state_variable.into(),
        }
    }

    pub fn new_return_value(name: impl Into<String>, related_state_variable: impl Into<String>) -> Self {
        Argument {
            name: name.into(),
            direction: Direction::Out,
            return_value: true,
            related_state_variable: related_state_variable.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_action() -> Action {
        Action::new(
            "SetTarget",
            vec![Argument::new("NewTargetValue", Direction::In, "Target")],
        )
    }

    #[test]
    fn rejects_missing_in_argument() {
        let action = sample_action();
        let err = action.check_in_arguments(&[]);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_unexpected_argument() {
        let action = sample_action();
        let err = action.check_in_arguments(&[
            ("NewTargetValue".to_string(), Value::Boolean(true)),
            ("Extra".to_string(), Value::Boolean(true)),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn accepts_exact_argument_set() {
        let action = sample_action();
        assert!(action
            .check_in_arguments(&[("NewTargetValue".to_string(), Value::Boolean(true))])
            .is_ok());
    }

    #[test]
    fn return_value_argument_is_found() {
        let action = Action::new(
            "GetTarget",
            vec![Argument::new_return_value("RetTargetValue", "Target")],
        );
        assert_eq!(action.return_value_argument().unwrap().name, "RetTargetValue");
    }
}
