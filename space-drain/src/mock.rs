//! An in-memory control plane for testing.

use crate::{
    cloudcontroller::{
        AccessToken, AppLister, ClientError, Drain, DrainBinder, DrainCreator, DrainLister,
        TokenFetcher,
    },
    manager::{DesiredDrain, SpaceManager},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

/// A call, as recorded by the [`MockControlPlane`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    FetchToken,
    ListDrains {
        space_guid: String,
    },
    CreateDrain {
        name: String,
        url: String,
        space_guid: String,
        drain_type: String,
    },
    ListApps {
        space_guid: String,
    },
    BindDrain {
        app_guid: String,
        drain_guid: String,
    },
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    drains: Vec<Drain>,
    apps: Vec<String>,
    created: usize,
    fail_token: bool,
    fail_list_drains: bool,
    fail_create: bool,
    fail_list_apps: bool,
    fail_bind: HashSet<String>,
}

/// A mock control plane, implementing all client traits.
///
/// Created drains and bindings are stored, so that following calls observe them, like they
/// would with a real cloud controller.
#[derive(Clone, Debug, Default)]
pub struct MockControlPlane {
    state: Arc<Mutex<State>>,
}

fn api_error(body: &str) -> ClientError {
    ClientError::Api {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: body.into(),
    }
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn with_drain(self, drain: Drain) -> Self {
        self.state().drains.push(drain);
        self
    }

    pub fn with_apps<I, S>(self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_apps(apps);
        self
    }

    /// Replace the apps of the space.
    pub fn set_apps<I, S>(&self, apps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().apps = apps.into_iter().map(Into::into).collect();
    }

    pub fn fail_token(&self, fail: bool) {
        self.state().fail_token = fail;
    }

    pub fn fail_list_drains(&self, fail: bool) {
        self.state().fail_list_drains = fail;
    }

    pub fn fail_create(&self, fail: bool) {
        self.state().fail_create = fail;
    }

    pub fn fail_list_apps(&self, fail: bool) {
        self.state().fail_list_apps = fail;
    }

    /// Let binding this app fail, or succeed again.
    pub fn fail_bind<S: Into<String>>(&self, app_guid: S, fail: bool) {
        let app_guid = app_guid.into();
        let mut state = self.state();
        if fail {
            state.fail_bind.insert(app_guid);
        } else {
            state.fail_bind.remove(&app_guid);
        }
    }

    /// Get the calls recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Get and reset the recorded calls.
    pub fn retrieve(&self) -> Vec<Call> {
        std::mem::take(&mut self.state().calls)
    }

    /// Get the current drains.
    pub fn drains(&self) -> Vec<Drain> {
        self.state().drains.clone()
    }

    /// Create a manager, using this control plane for all its clients.
    pub fn manager<S: Into<String>>(&self, space_guid: S, drain: DesiredDrain) -> SpaceManager {
        let this = Arc::new(self.clone());
        SpaceManager {
            interval: Duration::from_millis(10),
            space_guid: space_guid.into(),
            drain,
            token_fetcher: this.clone(),
            drain_lister: this.clone(),
            drain_creator: this.clone(),
            app_lister: this.clone(),
            drain_binder: this,
        }
    }
}

#[async_trait]
impl TokenFetcher for MockControlPlane {
    async fn fetch_token(&self) -> Result<AccessToken, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::FetchToken);
        if state.fail_token {
            return Err(ClientError::auth("Bad credentials"));
        }
        Ok(AccessToken::new("mock-token"))
    }
}

#[async_trait]
impl DrainLister for MockControlPlane {
    async fn list_drains(
        &self,
        space_guid: &str,
        _: &AccessToken,
    ) -> Result<Vec<Drain>, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::ListDrains {
            space_guid: space_guid.into(),
        });
        if state.fail_list_drains {
            return Err(api_error("list drains failed"));
        }
        Ok(state
            .drains
            .iter()
            .filter(|drain| drain.space_guid == space_guid)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DrainCreator for MockControlPlane {
    async fn create_drain(
        &self,
        name: &str,
        url: &str,
        space_guid: &str,
        drain_type: &str,
        _: &AccessToken,
    ) -> Result<(), ClientError> {
        let mut state = self.state();
        state.calls.push(Call::CreateDrain {
            name: name.into(),
            url: url.into(),
            space_guid: space_guid.into(),
            drain_type: drain_type.into(),
        });
        if state.fail_create {
            return Err(api_error("create drain failed"));
        }

        state.created += 1;
        let guid = format!("created-{}", state.created);
        state.drains.push(Drain {
            guid,
            name: name.into(),
            url: url.into(),
            drain_type: drain_type.into(),
            space_guid: space_guid.into(),
            app_guids: vec![],
        });

        Ok(())
    }
}

#[async_trait]
impl AppLister for MockControlPlane {
    async fn list_apps(
        &self,
        space_guid: &str,
        _: &AccessToken,
    ) -> Result<Vec<String>, ClientError> {
        let mut state = self.state();
        state.calls.push(Call::ListApps {
            space_guid: space_guid.into(),
        });
        if state.fail_list_apps {
            return Err(api_error("list apps failed"));
        }
        Ok(state.apps.clone())
    }
}

#[async_trait]
impl DrainBinder for MockControlPlane {
    async fn bind_drain(
        &self,
        app_guid: &str,
        drain_guid: &str,
        _: &AccessToken,
    ) -> Result<(), ClientError> {
        let mut state = self.state();
        state.calls.push(Call::BindDrain {
            app_guid: app_guid.into(),
            drain_guid: drain_guid.into(),
        });
        if state.fail_bind.contains(app_guid) {
            return Err(api_error("bind failed"));
        }

        let drain = state
            .drains
            .iter_mut()
            .find(|drain| drain.guid == drain_guid)
            .ok_or_else(|| ClientError::Api {
                status: StatusCode::NOT_FOUND,
                body: format!("unknown drain: {}", drain_guid),
            })?;

        if drain.app_guids.iter().any(|app| app == app_guid) {
            return Err(ClientError::Api {
                status: StatusCode::BAD_REQUEST,
                body: "The app is already bound to the service".into(),
            });
        }

        drain.app_guids.push(app_guid.into());
        Ok(())
    }
}
