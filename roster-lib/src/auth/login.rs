use crate::auth::password::PasswordHasher;
use crate::event::{EventChannel, EventReceiver, UiEvent};
use crate::repository::UserRepository;
use crate::state::{update, InFlight, LoadingState};
use crate::FlowError;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

pub const CREDENTIALS_BLANK: &str = "NIM and Password cannot be blank";
pub const INVALID_CREDENTIALS: &str = "Invalid NIM or Password";
pub const LOGIN_FAILED: &str = "Unable to log in, please try again";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginUiState {
    pub nim: String,
    pub password: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub password_visible: bool,
    pub remember_me: bool,
}

impl LoadingState for LoginUiState {
    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn with_loading(&self, is_loading: bool) -> Self {
        LoginUiState {
            is_loading,
            ..self.clone()
        }
    }
}

pub struct LoginFlow {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    state: watch::Sender<LoginUiState>,
    events: EventChannel,
}

impl LoginFlow {
    pub fn new(repository: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> LoginFlow {
        let (state, _) = watch::channel(LoginUiState::default());
        LoginFlow {
            repository,
            hasher,
            state,
            events: EventChannel::new(),
        }
    }

    pub fn state(&self) -> watch::Receiver<LoginUiState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn on_nim_changed(&self, nim: &str) {
        update(&self.state, |s| LoginUiState {
            nim: nim.to_owned(),
            error: None,
            ..s.clone()
        });
    }

    pub fn on_password_changed(&self, password: &str) {
        update(&self.state, |s| LoginUiState {
            password: password.to_owned(),
            error: None,
            ..s.clone()
        });
    }

    pub fn on_toggle_password_visibility(&self) {
        update(&self.state, |s| LoginUiState {
            password_visible: !s.password_visible,
            ..s.clone()
        });
    }

    pub fn on_remember_me_changed(&self, remember_me: bool) {
        update(&self.state, |s| LoginUiState {
            remember_me,
            ..s.clone()
        });
    }

    #[instrument(skip(self))]
    pub async fn on_login_clicked(&self) {
        let state = self.state.borrow().clone();
        if state.nim.trim().is_empty() || state.password.trim().is_empty() {
            update(&self.state, |s| LoginUiState {
                error: Some(CREDENTIALS_BLANK.to_owned()),
                ..s.clone()
            });
            return;
        }

        let Some(_in_flight) = InFlight::begin(&self.state) else {
            debug!("Login already in progress");
            return;
        };

        match self.authenticate(&state.nim, &state.password).await {
            Ok(true) => {
                info!(nim = %state.nim, "Logged in");
                self.events.emit(UiEvent::NavigationSuccess);
            }
            Ok(false) => {
                warn!(nim = %state.nim, "Invalid credentials");
                self.events
                    .emit(UiEvent::ShowMessage(INVALID_CREDENTIALS.to_owned()));
            }
            Err(e) => {
                error!(nim = %state.nim, error = %e, "Unable to log in");
                self.events.emit(UiEvent::ShowMessage(LOGIN_FAILED.to_owned()));
            }
        }
    }

    /// An unknown NIM and a wrong password both come out as `false`.
    async fn authenticate(&self, nim: &str, password: &str) -> Result<bool, FlowError> {
        let user = self.repository.get_user_with_nim(nim).await?;
        Ok(match user {
            Some(user) => self.hasher.verify(password, &user.password_hash),
            None => false,
        })
    }
}
