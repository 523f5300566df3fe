//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};
use service::{
    command::{self, Command as _},
    domain::{access::Token, Caller},
};
use tokio::sync::OnceCell;

use crate::{define_error, AsError, Error, JuniperResponse, Service};

/// Application context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Error status code.
    error_status_code: AtomicU16,

    /// Parts of the HTTP request.
    parts: http::request::Parts,

    /// Authenticated [`Caller`].
    caller: OnceCell<Caller>,

    /// Last authentication [`Error`].
    auth_error: OnceCell<Error>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the error status code of this [`Context`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .expect("invalid status code")
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }

    /// Returns the authenticated [`Caller`] of this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authorized;
    /// - the provided access token is invalid.
    pub async fn caller(&self) -> Result<Caller, Error> {
        self.caller
            .get_or_try_init(|| async {
                match self
                    .auth_error
                    .get_or_try_init(|| async {
                        match self.do_authentication().await {
                            Ok(c) => Err(c),
                            Err(e) => Ok(e),
                        }
                    })
                    .await
                {
                    Ok(e) => Err(e),
                    Err(c) => Ok(c),
                }
            })
            .await
            .copied()
            .map_err(Clone::clone)
    }

    /// Authenticates the [`Caller`] by the access token of the HTTP request.
    ///
    /// # Errors
    ///
    /// Errors if the provided access token is missing or invalid.
    async fn do_authentication(&self) -> Result<Caller, Error> {
        let res = self
            .parts
            .clone()
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await;
        match res {
            Ok(TypedHeader(Authorization(bearer))) => {
                #[expect(unsafe_code, reason = "specified in correct header")]
                let token =
                    unsafe { Token::new_unchecked(bearer.token().to_owned()) };
                self.service
                    .execute(command::AuthorizeCaller { token })
                    .await
                    .map_err(AsError::into_error)
            }
            Err(e) => {
                if e.is_missing() {
                    Err(AuthError::AuthorizationRequired.into())
                } else {
                    Err(e.into_error())
                }
            }
        }
        .map_err(self.error())
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal(&"missing `Service` extension")
                                .into_field_error(),
                        ),
                    ),
                }
            })?;

        Ok(Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            parts: parts.clone(),
            caller: OnceCell::new(),
            auth_error: OnceCell::new(),
        })
    }
}

impl AsError for command::authorize_caller::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::JsonWebTokenDecodeError(_) | Self::UnknownRole(_) => {
                Some(AuthError::AuthorizationRequired.into())
            }
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,
    }
}
