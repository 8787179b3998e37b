use crate::auth::password::PasswordHasher;
use crate::event::{EventChannel, EventReceiver, UiEvent};
use crate::repository::UserRepository;
use crate::state::{update, InFlight, LoadingState};
use crate::FlowError;
use roster_repo::user_repo::User;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

pub const NIM_BLANK: &str = "NIM cannot be blank";
pub const NAME_BLANK: &str = "Name cannot be blank";
pub const PASSWORD_BLANK: &str = "Password cannot be blank";
pub const REGISTERED: &str = "User registered";
pub const REGISTER_FAILED: &str = "Failed to save user";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterUiState {
    pub nim: String,
    pub name: String,
    pub password: String,
    pub password_visible: bool,
    pub is_loading: bool,
    pub nim_error: Option<String>,
    pub name_error: Option<String>,
    pub password_error: Option<String>,
}

impl RegisterUiState {
    fn with_field_errors(&self) -> RegisterUiState {
        RegisterUiState {
            nim_error: blank_error(&self.nim, NIM_BLANK),
            name_error: blank_error(&self.name, NAME_BLANK),
            password_error: blank_error(&self.password, PASSWORD_BLANK),
            ..self.clone()
        }
    }

    fn has_errors(&self) -> bool {
        self.nim_error.is_some() || self.name_error.is_some() || self.password_error.is_some()
    }
}

impl LoadingState for RegisterUiState {
    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn with_loading(&self, is_loading: bool) -> Self {
        RegisterUiState {
            is_loading,
            ..self.clone()
        }
    }
}

fn blank_error(value: &str, message: &str) -> Option<String> {
    value.trim().is_empty().then(|| message.to_owned())
}

pub struct RegisterFlow {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    state: watch::Sender<RegisterUiState>,
    events: EventChannel,
}

impl RegisterFlow {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> RegisterFlow {
        let (state, _) = watch::channel(RegisterUiState::default());
        RegisterFlow {
            repository,
            hasher,
            state,
            events: EventChannel::new(),
        }
    }

    pub fn state(&self) -> watch::Receiver<RegisterUiState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn on_nim_changed(&self, nim: &str) {
        update(&self.state, |s| RegisterUiState {
            nim: nim.to_owned(),
            nim_error: None,
            ..s.clone()
        });
    }

    pub fn on_name_changed(&self, name: &str) {
        update(&self.state, |s| RegisterUiState {
            name: name.to_owned(),
            name_error: None,
            ..s.clone()
        });
    }

    pub fn on_password_changed(&self, password: &str) {
        update(&self.state, |s| RegisterUiState {
            password: password.to_owned(),
            password_error: None,
            ..s.clone()
        });
    }

    pub fn on_toggle_password_visibility(&self) {
        update(&self.state, |s| RegisterUiState {
            password_visible: !s.password_visible,
            ..s.clone()
        });
    }

    #[instrument(skip(self))]
    pub async fn on_register_clicked(&self) {
        let state = self.state.borrow().clone();
        if state.with_field_errors().has_errors() {
            debug!("Registration form invalid");
            update(&self.state, RegisterUiState::with_field_errors);
            return;
        }

        let Some(_in_flight) = InFlight::begin(&self.state) else {
            debug!("Registration already in progress");
            return;
        };

        match self.register(&state).await {
            Ok(()) => {
                info!(nim = %state.nim, "Registered user");
                self.events.emit(UiEvent::ShowMessage(REGISTERED.to_owned()));
                self.events.emit(UiEvent::NavigationSuccess);
            }
            Err(e) => {
                error!(nim = %state.nim, error = %e, "Unable to register user");
                self.events
                    .emit(UiEvent::ShowMessage(REGISTER_FAILED.to_owned()));
            }
        }
    }

    async fn register(&self, state: &RegisterUiState) -> Result<(), FlowError> {
        let password_hash = self.hasher.hash(&state.password)?;
        let user = User::new(state.nim.clone(), state.name.clone(), password_hash);
        self.repository.register(user).await?;
        Ok(())
    }
}
