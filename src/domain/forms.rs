// Generator configuration form state
use super::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three form groups that make up a generator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormGroup {
    /// Vehicle class mix; a probability distribution.
    Class,
    /// Approach mix; a probability distribution.
    Approach,
    /// Counts rate and downtime probability; not sum-constrained.
    Failure,
}

impl FormGroup {
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            FormGroup::Class => &["Car", "Motorcycle", "Pedestrian", "Bicycle"],
            FormGroup::Approach => &["NB", "SB", "WB", "EB"],
            FormGroup::Failure => &["CountsRate", "Downtime"],
        }
    }
}

impl fmt::Display for FormGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormGroup::Class => f.write_str("class"),
            FormGroup::Approach => f.write_str("approach"),
            FormGroup::Failure => f.write_str("failure"),
        }
    }
}

impl FromStr for FormGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(FormGroup::Class),
            "approach" => Ok(FormGroup::Approach),
            "failure" => Ok(FormGroup::Failure),
            other => Err(format!("unknown form group '{}'", other)),
        }
    }
}

/// Raw string inputs for one form group, kept in field declaration order.
///
/// Values are stored exactly as typed so partial input like `"0."` survives
/// until validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityFormState {
    group: FormGroup,
    fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub value: String,
}

impl ProbabilityFormState {
    pub fn new(group: FormGroup) -> Self {
        let fields = group
            .field_names()
            .iter()
            .map(|&name| FormField {
                name,
                value: String::new(),
            })
            .collect();
        Self { group, fields }
    }

    pub fn group(&self) -> FormGroup {
        self.group
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.value.as_str())
    }

    /// Updates a single field; other fields keep their values.
    pub fn set_field(&mut self, name: &str, raw: impl Into<String>) -> Result<(), ValidationError> {
        let group = self.group;
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| ValidationError::UnknownField {
                group,
                field: name.to_string(),
            })?;
        field.value = raw.into();
        Ok(())
    }

    /// True while every field is still at its empty initial value.
    pub fn is_pristine(&self) -> bool {
        self.fields.iter().all(|f| f.value.is_empty())
    }

    /// Replaces every field from `values`, given in field order.
    pub fn hydrate<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for (field, value) in self.fields.iter_mut().zip(values) {
            field.value = value.into();
        }
    }

    pub fn validate_non_empty(&self) -> Result<(), ValidationError> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.value.is_empty())
            .map(|f| f.name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields {
                group: self.group,
                fields: missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_keeps_other_fields() {
        let mut form = ProbabilityFormState::new(FormGroup::Class);
        form.set_field("Car", "0.5").unwrap();
        form.set_field("Bicycle", "0.").unwrap();

        assert_eq!(form.get("Car"), Some("0.5"));
        assert_eq!(form.get("Bicycle"), Some("0."));
        assert_eq!(form.get("Motorcycle"), Some(""));
    }

    #[test]
    fn test_set_unknown_field() {
        let mut form = ProbabilityFormState::new(FormGroup::Approach);
        let err = form.set_field("NE", "0.1").unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField { .. }));
    }

    #[test]
    fn test_validate_non_empty_lists_every_missing_field() {
        let mut form = ProbabilityFormState::new(FormGroup::Approach);
        form.set_field("SB", "0.25").unwrap();

        match form.validate_non_empty() {
            Err(ValidationError::MissingFields { group, fields }) => {
                assert_eq!(group, FormGroup::Approach);
                assert_eq!(fields, vec!["NB", "WB", "EB"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        form.hydrate(["0.25", "0.25", "0.25", "0.25"]);
        assert!(form.validate_non_empty().is_ok());
    }

    #[test]
    fn test_pristine() {
        let mut form = ProbabilityFormState::new(FormGroup::Failure);
        assert!(form.is_pristine());
        form.set_field("Downtime", "0.01").unwrap();
        assert!(!form.is_pristine());
    }
}
