// Generator controller - Form state, validation and start/stop orchestration
use crate::application::sensor_api::{ApiError, GeneratorApi};
use crate::domain::forms::{FormGroup, ProbabilityFormState};
use crate::domain::generator::{GeneratorConfig, GeneratorStatus, RunState};
use crate::domain::validation::{SumCheck, ValidationError, validate_generator_forms};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to {action} generator")]
    Api {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("cannot {action} generator while it is {state}")]
    InvalidTransition { action: &'static str, state: RunState },
}

#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    pub state: RunState,
    pub forms: Vec<ProbabilityFormState>,
    pub error_message: Option<String>,
    pub status: Option<GeneratorStatus>,
}

/// Drives the generator between `Stopped` and `Running`.
///
/// The local run state follows the server: every status fetch overwrites it
/// with `status.running`. Forms are hydrated from the server's running
/// configuration once, and only while the user has typed nothing.
pub struct GeneratorConfigController {
    api: Arc<dyn GeneratorApi>,
    sum_check: SumCheck,
    class_form: ProbabilityFormState,
    approach_form: ProbabilityFormState,
    failure_form: ProbabilityFormState,
    state: RunState,
    last_status: Option<GeneratorStatus>,
    error_message: Option<String>,
    // Set while error_message comes from a failed status fetch
    query_failed: bool,
}

impl GeneratorConfigController {
    pub fn new(api: Arc<dyn GeneratorApi>, sum_check: SumCheck) -> Self {
        Self {
            api,
            sum_check,
            class_form: ProbabilityFormState::new(FormGroup::Class),
            approach_form: ProbabilityFormState::new(FormGroup::Approach),
            failure_form: ProbabilityFormState::new(FormGroup::Failure),
            state: RunState::Stopped,
            last_status: None,
            error_message: None,
            query_failed: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn form(&self, group: FormGroup) -> &ProbabilityFormState {
        match group {
            FormGroup::Class => &self.class_form,
            FormGroup::Approach => &self.approach_form,
            FormGroup::Failure => &self.failure_form,
        }
    }

    fn form_mut(&mut self, group: FormGroup) -> &mut ProbabilityFormState {
        match group {
            FormGroup::Class => &mut self.class_form,
            FormGroup::Approach => &mut self.approach_form,
            FormGroup::Failure => &mut self.failure_form,
        }
    }

    pub fn set_field(&mut self, group: FormGroup, field: &str, raw: impl Into<String>) -> Result<(), ControllerError> {
        self.form_mut(group).set_field(field, raw)?;
        Ok(())
    }

    fn forms_pristine(&self) -> bool {
        self.class_form.is_pristine() && self.approach_form.is_pristine() && self.failure_form.is_pristine()
    }

    fn hydrate(&mut self, config: &GeneratorConfig) {
        self.class_form
            .hydrate(config.class_prob.values().iter().map(|p| p.to_string()));
        self.approach_form
            .hydrate(config.approach_prob.values().iter().map(|p| p.to_string()));
        self.failure_form.hydrate([
            config.counts_rate.to_string(),
            config.downtime_prob.to_string(),
        ]);
    }

    fn apply_status(&mut self, status: GeneratorStatus) {
        self.state = RunState::from_running(status.running);

        if self.forms_pristine() {
            if let Some(config) = &status.config {
                tracing::debug!("Hydrating generator forms from running configuration");
                self.hydrate(config);
            }
        }

        self.last_status = Some(status);
    }

    fn fail(&mut self, err: ControllerError) -> ControllerError {
        self.query_failed = matches!(err, ControllerError::Api { action: "query", .. });
        self.error_message = Some(err.to_string());
        err
    }

    fn clear_error(&mut self) {
        self.error_message = None;
        self.query_failed = false;
    }

    /// Fetches the generator status and reconciles local state with it.
    pub async fn refresh_status(&mut self) -> Result<RunState, ControllerError> {
        match self.api.status().await {
            Ok(status) => {
                // A recovered status fetch supersedes the earlier fetch error only
                if self.query_failed {
                    self.clear_error();
                }
                self.apply_status(status);
                Ok(self.state)
            }
            Err(source) => {
                tracing::warn!("Error fetching generator status: {}", source);
                Err(self.fail(ControllerError::Api {
                    action: "query",
                    source,
                }))
            }
        }
    }

    /// Validates the forms, then configures and starts the generator.
    pub async fn submit(&mut self) -> Result<GeneratorConfig, ControllerError> {
        if self.state == RunState::Running {
            return Err(self.fail(ControllerError::InvalidTransition {
                action: "start",
                state: self.state,
            }));
        }

        let config = match validate_generator_forms(
            &self.class_form,
            &self.approach_form,
            &self.failure_form,
            self.sum_check,
        ) {
            Ok(config) => config,
            Err(e) => return Err(self.fail(e.into())),
        };

        // Start must not be issued before configure has completed
        let started = match self.api.configure(&config).await {
            Ok(()) => self.api.start().await,
            Err(e) => Err(e),
        };

        match started {
            Ok(()) => {
                tracing::info!("Generator started with {:?}", config);
                self.state = RunState::Running;
                self.clear_error();
                Ok(config)
            }
            Err(source) => {
                tracing::error!("Failed to start generator: {}", source);
                Err(self.fail(ControllerError::Api {
                    action: "start",
                    source,
                }))
            }
        }
    }

    pub async fn stop(&mut self) -> Result<(), ControllerError> {
        if self.state == RunState::Stopped {
            return Err(self.fail(ControllerError::InvalidTransition {
                action: "stop",
                state: self.state,
            }));
        }

        match self.api.stop().await {
            Ok(()) => {
                tracing::info!("Generator stopped");
                self.state = RunState::Stopped;
                self.clear_error();
                Ok(())
            }
            Err(source) => {
                tracing::error!("Failed to stop generator: {}", source);
                Err(self.fail(ControllerError::Api {
                    action: "stop",
                    source,
                }))
            }
        }
    }

    pub fn view(&self) -> ControllerView {
        ControllerView {
            state: self.state(),
            forms: [FormGroup::Class, FormGroup::Approach, FormGroup::Failure]
                .into_iter()
                .map(|group| self.form(group).clone())
                .collect(),
            error_message: self.error_message().map(str::to_owned),
            status: self.last_status.clone(),
        }
    }
}
