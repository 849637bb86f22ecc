use crate::api::ApiClient;
use crate::error::{FlowError, StoreError};
use crate::model::*;
use crate::session::{Session, SessionStore, USER};
use log::info;

pub async fn login<S>(
    api: &ApiClient,
    store: &S,
    credentials: &Credentials,
) -> Result<LoginResponse, FlowError>
where
    S: SessionStore<Error = StoreError>,
{
    let response = api.login(credentials).await?;
    Session::new(response.token.as_str(), response.user.username.as_str()).save(store)?;
    info!("Logged in as {}", response.user.username);
    Ok(response)
}

/// Registers and then logs in with the same credentials.
pub async fn register<S>(
    api: &ApiClient,
    store: &S,
    registration: &Registration,
) -> Result<User, FlowError>
where
    S: SessionStore<Error = StoreError>,
{
    let user = api.register(registration).await?;
    info!("Registered {}", registration.username);
    login(api, store, &registration.credentials()).await?;
    Ok(user)
}

pub fn logout<S>(store: &S) -> Result<(), FlowError>
where
    S: SessionStore<Error = StoreError>,
{
    Session::clear(store)?;
    info!("Logged out");
    Ok(())
}

pub async fn edit_profile<S>(
    api: &ApiClient,
    store: &S,
    session: &Session,
    update: &ProfileUpdate,
) -> Result<User, FlowError>
where
    S: SessionStore<Error = StoreError>,
{
    let user = api.edit_profile(session, update).await?;
    // The username is part of every user path, keep it in step with renames.
    if !user.username.is_empty() {
        store.set(USER, &user.username)?;
    }
    Ok(user)
}

pub async fn delete_profile<S>(
    api: &ApiClient,
    store: &S,
    session: &Session,
) -> Result<String, FlowError>
where
    S: SessionStore<Error = StoreError>,
{
    let message = api.delete_profile(session).await?;
    Session::clear(store)?;
    info!("Deleted account {}", session.username.as_deref().unwrap_or_default());
    Ok(message)
}
