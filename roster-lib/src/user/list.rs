use crate::repository::UserRepository;
use crate::share::{SharingStatus, Subscription, WhileSubscribed};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use roster_repo::user_repo::User;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, info_span, instrument, Instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListUiState {
    pub users: Vec<User>,
    pub user_being_edited: Option<User>,
    pub edit_dialog_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct EditState {
    user_being_edited: Option<User>,
    edit_dialog_name: String,
}

enum Input {
    Users(Vec<User>),
    Edit(EditState),
}

pub struct UserListFlow {
    repository: Arc<dyn UserRepository>,
    edit: watch::Sender<EditState>,
    ui_state: WhileSubscribed<UserListUiState>,
}

impl UserListFlow {
    pub fn new(repository: Arc<dyn UserRepository>, grace_period: Duration) -> UserListFlow {
        let (edit, _) = watch::channel(EditState::default());
        let source_repository = repository.clone();
        let source_edit = edit.subscribe();
        let ui_state = WhileSubscribed::new(UserListUiState::default(), grace_period, move || {
            ui_state_source(source_repository.clone(), source_edit.clone())
        });
        UserListFlow {
            repository,
            edit,
            ui_state,
        }
    }

    /// Subscribes to the user list. Nothing is read from the store until the first
    /// subscription, and the store is released a grace period after the last one is dropped.
    pub fn ui_state(&self) -> Subscription<UserListUiState> {
        self.ui_state.subscribe()
    }

    pub fn sharing_status(&self) -> SharingStatus {
        self.ui_state.status()
    }

    /// Number of times the store has been subscribed to.
    pub fn upstream_starts(&self) -> usize {
        self.ui_state.starts()
    }

    /// Removes the user in the background. Observers learn about it through the list itself.
    pub fn delete_user(&self, user: User) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let span = info_span!("delete_user", nim = %user.nim);
        tokio::spawn(
            async move {
                match repository.delete_user(&user).await {
                    Ok(()) => info!("Deleted user"),
                    Err(e) => error!(error = %e, "Unable to delete user"),
                }
            }
            .instrument(span),
        )
    }

    pub fn on_update_user_clicked(&self, user: User) {
        self.edit.send_replace(EditState {
            edit_dialog_name: user.name.clone(),
            user_being_edited: Some(user),
        });
    }

    pub fn on_edit_dialog_name_changed(&self, name: &str) {
        self.edit.send_modify(|edit| {
            *edit = EditState {
                edit_dialog_name: name.to_owned(),
                ..edit.clone()
            }
        });
    }

    /// Saves the edited name. A blank name is not saved, and a failed save keeps the dialog open.
    #[instrument(skip(self))]
    pub async fn on_edit_dialog_confirm(&self) {
        let edit = self.edit.borrow().clone();
        let Some(user) = edit.user_being_edited else {
            return;
        };
        if edit.edit_dialog_name.trim().is_empty() {
            debug!("Not saving blank name");
            return;
        }

        let nim = user.nim.clone();
        let updated = User {
            name: edit.edit_dialog_name,
            ..user
        };
        match self.repository.update_user(updated).await {
            Ok(()) => {
                info!(%nim, "Renamed user");
                self.on_edit_dialog_dismiss();
            }
            Err(e) => error!(%nim, error = %e, "Unable to rename user"),
        }
    }

    pub fn on_edit_dialog_dismiss(&self) {
        self.edit.send_replace(EditState::default());
    }
}

fn ui_state_source(
    repository: Arc<dyn UserRepository>,
    edit: watch::Receiver<EditState>,
) -> BoxStream<'static, UserListUiState> {
    let users = repository.get_all_users().filter_map(|result| {
        future::ready(match result {
            Ok(users) => Some(Input::Users(users)),
            Err(e) => {
                error!(error = %e, "Unable to load users");
                None
            }
        })
    });
    let edits = WatchStream::new(edit).map(Input::Edit);

    // nothing is shown until the first user list arrives
    stream::select(users, edits)
        .scan(
            (None::<Vec<User>>, EditState::default()),
            |(users, edit), input| {
                match input {
                    Input::Users(latest) => *users = Some(latest),
                    Input::Edit(latest) => *edit = latest,
                }
                let state = users.as_ref().map(|users| UserListUiState {
                    users: users.clone(),
                    user_being_edited: edit.user_being_edited.clone(),
                    edit_dialog_name: edit.edit_dialog_name.clone(),
                });
                future::ready(Some(state))
            },
        )
        .filter_map(future::ready)
        .boxed()
}
